//! # cmccloud-id
//!
//! Typed identifiers for CMC Cloud resources.
//!
//! The remote API hands out bare UUIDs for every resource kind, so a cluster
//! id and a volume id are indistinguishable on the wire. Wrapping each kind in
//! its own type keeps them from being swapped when they travel through the
//! provider (e.g. resizing a node group needs both a cluster id and a node
//! group id).
//!
//! ## ID Format
//!
//! Canonical form is the lowercase hyphenated UUID:
//!
//! - `3f2504e0-4f89-11d3-9a0c-0305e82c3301`
//!
//! Parsing accepts any case and normalizes to lowercase.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
