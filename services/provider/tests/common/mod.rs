//! Shared helpers for provider integration tests.

#![allow(dead_code)]

use std::time::Duration;

use cmccloud_provider::config::{ApiConfig, OperationTimeouts, PollProfile, Polling, Timeouts};
use cmccloud_provider::{CmcClient, Provider};
use wiremock::{MockServer, Request};

pub const CLUSTER_ID: &str = "6f1c2a8e-3b0d-4c59-9e4a-1d2f3a4b5c6d";
pub const NODE_GROUP_ID: &str = "0b7e4f5a-8c2d-4e1f-9a3b-5c6d7e8f9a0b";
pub const INSTANCE_ID: &str = "9d8c7b6a-5f4e-4d3c-8b2a-1f0e9d8c7b6a";
pub const SECURITY_GROUP_ID: &str = "1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d";
pub const CONFIGURATION_ID: &str = "2b3c4d5e-6f7a-4b8c-9d0e-1f2a3b4c5d6e";
pub const ALTERNATE_CONFIGURATION_ID: &str = "3c4d5e6f-7a8b-4c9d-8e1f-2a3b4c5d6e7f";
pub const VOLUME_ID: &str = "4d5e6f7a-8b9c-4d0e-9f2a-3b4c5d6e7f8a";
pub const SERVER_ID: &str = "5e6f7a8b-9c0d-4e1f-8a3b-4c5d6e7f8a9b";

/// Provider against a mock server with fast polling.
pub fn provider(server: &MockServer) -> Provider {
    provider_with_timeout(server, Duration::from_secs(5))
}

/// Same as [`provider`], with every wait capped at `timeout`.
pub fn provider_with_timeout(server: &MockServer, timeout: Duration) -> Provider {
    let api = ApiConfig::new(server.uri(), "test-key", "project-1", "region-1");
    let client = CmcClient::new(&api).unwrap();
    let operations = OperationTimeouts::uniform(timeout);
    let timeouts = Timeouts {
        kubernetes: operations,
        redis_instance: operations,
        redis_configuration: operations,
        volume_attachment: operations,
        security_group_membership: timeout,
    };
    let polling = Polling::uniform(PollProfile::new(Duration::ZERO, Duration::from_millis(10)));
    Provider::with_client(client, timeouts, polling)
}

/// Method and path of every request the server saw, in order.
pub async fn calls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(describe)
        .collect()
}

/// Mutating requests only.
pub async fn mutations(server: &MockServer) -> Vec<String> {
    calls(server)
        .await
        .into_iter()
        .filter(|call| !call.starts_with("GET "))
        .collect()
}

fn describe(request: &Request) -> String {
    format!("{} {}", request.method.as_str(), request.url.path())
}

pub fn cluster_json(status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": CLUSTER_ID,
        "name": "prod",
        "status": status,
        "master_count": 3,
        "master_flavor_id": "m1.large",
        "master_billing_mode": "monthly",
        "node_count": 5,
        "node_flavor_id": "c1.medium",
        "node_billing_mode": "hourly",
        "labels": {"min_node_count": 1, "max_node_count": 3, "auto_scaling_enabled": true}
    })
}

pub fn node_groups_json(node_count: u32, min: u32, max: u32) -> serde_json::Value {
    serde_json::json!([
        {
            "id": "7c1d2e3f-4a5b-4c6d-8e7f-9a0b1c2d3e4f",
            "name": "default-master",
            "node_count": 3
        },
        {
            "id": NODE_GROUP_ID,
            "name": "default-worker",
            "node_count": node_count,
            "min_node_count": min,
            "max_node_count": max
        }
    ])
}

pub fn redis_json(status: &str, security_groups: &[&str]) -> serde_json::Value {
    let groups = serde_json::to_string(security_groups).unwrap();
    serde_json::json!({
        "id": INSTANCE_ID,
        "name": "cache",
        "status": status,
        "datastore_name": "Redis",
        "datastore_version": "7.0",
        "datastore_mode": "standalone",
        "security_client_ids": groups
    })
}
