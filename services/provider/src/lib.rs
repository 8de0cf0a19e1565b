//! CMC Cloud provider operations.
//!
//! Maps resource operations (Kubernetes clusters, Redis instances and
//! configurations, volume attachments) onto the CMC Cloud REST API. Every
//! mutation is followed by a convergence wait; worker pool changes go through
//! the ordered mutation planner so the node count never leaves its bounds.
//!
//! ## Layout
//!
//! - **client**: authenticated REST client, 404 mapped to `ApiError::NotFound`
//! - **api**: typed request/response models and endpoint methods
//! - **waiters**: `Fetcher` adapters, status extractors and wait specs
//! - **resources**: create/read/update/delete per resource kind

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod resources;
pub mod waiters;

pub use client::CmcClient;
pub use config::Config;
pub use error::{ApiError, ProviderError};
pub use resources::Provider;
