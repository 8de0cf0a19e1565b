//! Redis instance and configuration operations against a mock API.

mod common;

use std::collections::BTreeMap;

use cmccloud_id::{RedisConfigurationId, RedisInstanceId, SecurityGroupId, SubnetId};
use cmccloud_provider::api::{BillingMode, CreateRedisInstanceRequest, DatastoreRef};
use cmccloud_provider::resources::{
    ConfigurationTarget, NewRedisConfiguration, RedisConfigurationUpdate, RedisInstanceUpdate,
    SecurityGroupChange,
};
use cmccloud_provider::ProviderError;
use common::*;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instance_id() -> RedisInstanceId {
    INSTANCE_ID.parse().unwrap()
}

fn group_id() -> SecurityGroupId {
    SECURITY_GROUP_ID.parse().unwrap()
}

fn instance_path() -> String {
    format!("/redis/instances/{INSTANCE_ID}")
}

async fn mount_instance(server: &MockServer, status: &str, groups: &[&str]) {
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(redis_json(status, groups)))
        .mount(server)
        .await;
}

async fn mount_instance_once(server: &MockServer, status: &str, groups: &[&str]) {
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(redis_json(status, groups)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

async fn mount_billing(server: &MockServer, mode: &str) {
    Mock::given(method("GET"))
        .and(path("/billing-mode"))
        .and(query_param("resource_id", INSTANCE_ID))
        .and(query_param("resource_type", "RDS"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"billing_mode": mode})),
        )
        .mount(server)
        .await;
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({}))
}

const OTHER_GROUP_ID: &str = "8b9c0d1e-2f3a-4b4c-8d5e-6f7a8b9c0d1e";

async fn mount_security_group(server: &MockServer, id: &str, stateful: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/security-groups/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": id,
            "name": "sg",
            "stateful": stateful
        })))
        .mount(server)
        .await;
}

fn create_request(groups: &[&str]) -> CreateRedisInstanceRequest {
    CreateRedisInstanceRequest {
        billing_mode: BillingMode::Hourly,
        name: "cache".to_string(),
        security_group_ids: groups.iter().map(|g| g.parse().unwrap()).collect(),
        flavor_id: "flavor-1".to_string(),
        password: "s3cret-Pass".to_string(),
        backup_id: None,
        volume_size: 20,
        group_configuration_id: None,
        network_id: "network-1".to_string(),
        subnet_id: SubnetId::new(),
        datastore: DatastoreRef {
            datastore_code: "redis".to_string(),
            datastore_version_id: "v-7".to_string(),
            datastore_mode_id: "m-ms".to_string(),
        },
        datastore_type: "master_slave".to_string(),
        request_metadata: "{}".to_string(),
        zones: None,
    }
}

async fn mount_create(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/redis/instances"))
        .and(body_partial_json(serde_json::json!({
            "securityGroupIds": format!("{SECURITY_GROUP_ID},{OTHER_GROUP_ID}")
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"instance_id": INSTANCE_ID}
        })))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn create_checks_groups_then_waits_for_job() {
    let server = MockServer::start().await;
    mount_security_group(&server, SECURITY_GROUP_ID, true).await;
    mount_security_group(&server, OTHER_GROUP_ID, true).await;
    mount_create(&server, 1).await;
    mount_instance_once(&server, "building", &[]).await;
    mount_instance(&server, "running", &[SECURITY_GROUP_ID, OTHER_GROUP_ID]).await;
    mount_billing(&server, "hourly").await;

    let state = provider(&server)
        .redis_instances()
        .create(&create_request(&[SECURITY_GROUP_ID, OTHER_GROUP_ID]))
        .await
        .unwrap();

    assert_eq!(state.instance.status, "running");
    assert_eq!(state.security_group_ids.len(), 2);
    let calls = calls(&server).await;
    let post = calls.iter().position(|c| c == "POST /redis/instances").unwrap();
    assert!(calls[..post].iter().all(|c| c.starts_with("GET /security-groups/")));
    assert_eq!(post, 2);
}

#[tokio::test]
async fn create_reports_job_error() {
    let server = MockServer::start().await;
    mount_security_group(&server, SECURITY_GROUP_ID, false).await;
    mount_security_group(&server, OTHER_GROUP_ID, false).await;
    mount_create(&server, 1).await;
    mount_instance(&server, "error", &[]).await;

    let err = provider(&server)
        .redis_instances()
        .create(&create_request(&[SECURITY_GROUP_ID, OTHER_GROUP_ID]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Wait { .. }));
    assert!(err.to_string().contains("entered error status 'ERROR'"));
}

#[tokio::test]
async fn create_rejects_mixed_statefulness_before_submitting() {
    let server = MockServer::start().await;
    mount_security_group(&server, SECURITY_GROUP_ID, true).await;
    mount_security_group(&server, OTHER_GROUP_ID, false).await;
    mount_create(&server, 0).await;

    let err = provider(&server)
        .redis_instances()
        .create(&create_request(&[SECURITY_GROUP_ID, OTHER_GROUP_ID]))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Invalid { .. }));
    assert!(err.to_string().contains("same stateful"));
}

#[tokio::test]
async fn read_decodes_security_groups_and_billing() {
    let server = MockServer::start().await;
    mount_instance(&server, "running", &[SECURITY_GROUP_ID]).await;
    mount_billing(&server, "monthly").await;

    let state = provider(&server)
        .redis_instances()
        .read(&instance_id())
        .await
        .unwrap();

    assert_eq!(state.security_group_ids, vec![group_id()]);
    assert_eq!(state.billing_mode, Some(BillingMode::Monthly));
}

#[tokio::test]
async fn read_tolerates_billing_lookup_failure() {
    let server = MockServer::start().await;
    mount_instance(&server, "running", &[]).await;
    Mock::given(method("GET"))
        .and(path("/billing-mode"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "code": "internal",
            "message": "billing unavailable"
        })))
        .mount(&server)
        .await;

    let state = provider(&server)
        .redis_instances()
        .read(&instance_id())
        .await
        .unwrap();

    assert_eq!(state.billing_mode, None);
    assert!(state.security_group_ids.is_empty());
}

#[tokio::test]
async fn read_rejects_malformed_security_group_list() {
    let server = MockServer::start().await;
    let mut body = redis_json("running", &[]);
    body["security_client_ids"] = serde_json::json!("not json");
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    mount_billing(&server, "hourly").await;

    let err = provider(&server)
        .redis_instances()
        .read(&instance_id())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("security_client_ids"));
}

#[tokio::test]
async fn attach_waits_for_membership() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}/security-groups/{SECURITY_GROUP_ID}", instance_path())))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    mount_instance_once(&server, "running", &[]).await;
    mount_instance_once(&server, "running", &[]).await;
    mount_instance(&server, "running", &[SECURITY_GROUP_ID]).await;

    provider(&server)
        .redis_instances()
        .attach_security_group(&instance_id(), &group_id())
        .await
        .unwrap();

    let polls = calls(&server)
        .await
        .into_iter()
        .filter(|call| call.starts_with("GET "))
        .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn detach_waits_until_group_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/security-groups/{SECURITY_GROUP_ID}", instance_path())))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    mount_instance_once(&server, "running", &[SECURITY_GROUP_ID]).await;
    mount_instance(&server, "running", &[]).await;

    provider(&server)
        .redis_instances()
        .detach_security_group(&instance_id(), &group_id())
        .await
        .unwrap();
}

#[tokio::test]
async fn update_runs_steps_in_order() {
    let server = MockServer::start().await;
    let configuration: RedisConfigurationId = CONFIGURATION_ID.parse().unwrap();
    Mock::given(method("PUT"))
        .and(path(instance_path()))
        .and(body_json(serde_json::json!({"name": "cache-2"})))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/billing-mode/redis/{INSTANCE_ID}")))
        .and(body_json(serde_json::json!({"billing_mode": "hourly"})))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/password", instance_path())))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/configuration", instance_path())))
        .and(body_json(serde_json::json!({"group_configuration_id": CONFIGURATION_ID})))
        .respond_with(ok())
        .mount(&server)
        .await;
    mount_instance_once(&server, "backup", &[]).await;
    mount_instance(&server, "running", &[]).await;
    mount_billing(&server, "hourly").await;

    let update = RedisInstanceUpdate {
        name: Some("cache-2".to_string()),
        billing_mode: Some(BillingMode::Hourly),
        password: Some("s3cret-Pass".to_string()),
        configuration: Some(ConfigurationTarget::Group(configuration)),
        security_groups: None,
    };
    let state = provider(&server)
        .redis_instances()
        .update(&instance_id(), &update)
        .await
        .unwrap();

    assert_eq!(state.billing_mode, Some(BillingMode::Hourly));
    assert_eq!(
        mutations(&server).await,
        vec![
            format!("PUT {}", instance_path()),
            format!("PUT /billing-mode/redis/{INSTANCE_ID}"),
            format!("PUT {}/password", instance_path()),
            format!("PUT {}/configuration", instance_path()),
        ]
    );
}

#[tokio::test]
async fn password_change_stops_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/password", instance_path())))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/configuration", instance_path())))
        .respond_with(ok())
        .expect(0)
        .mount(&server)
        .await;
    mount_instance(&server, "error", &[]).await;

    let update = RedisInstanceUpdate {
        password: Some("s3cret-Pass".to_string()),
        configuration: Some(ConfigurationTarget::Group(CONFIGURATION_ID.parse().unwrap())),
        ..Default::default()
    };
    let err = provider(&server)
        .redis_instances()
        .update(&instance_id(), &update)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Wait { .. }));
    assert!(err.to_string().contains("entered error status 'ERROR'"));
}

#[tokio::test]
async fn default_configuration_prefers_last_match_alternate_id() {
    let server = MockServer::start().await;
    mount_instance(&server, "running", &[]).await;
    mount_billing(&server, "monthly").await;
    Mock::given(method("GET"))
        .and(path("/redis/configurations"))
        .and(query_param("getDefault", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": "6a7b8c9d-0e1f-4a2b-8c3d-4e5f6a7b8c9d",
                "datastore_name": "Redis",
                "datastore_version": "7.0",
                "datastore_mode": "standalone"
            },
            {
                "id": CONFIGURATION_ID,
                "id2": ALTERNATE_CONFIGURATION_ID,
                "datastore_name": "Redis",
                "datastore_version": "7.0",
                "datastore_mode": "standalone"
            },
            {
                "id": "7b8c9d0e-1f2a-4b3c-9d4e-5f6a7b8c9d0e",
                "datastore_name": "Redis",
                "datastore_version": "6.2",
                "datastore_mode": "standalone"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/configuration", instance_path())))
        .and(body_json(serde_json::json!({
            "group_configuration_id": ALTERNATE_CONFIGURATION_ID
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let update = RedisInstanceUpdate {
        configuration: Some(ConfigurationTarget::Default),
        ..Default::default()
    };
    provider(&server)
        .redis_instances()
        .update(&instance_id(), &update)
        .await
        .unwrap();
}

#[tokio::test]
async fn mixed_statefulness_is_rejected_before_membership_calls() {
    let server = MockServer::start().await;
    let other = "8b9c0d1e-2f3a-4b4c-8d5e-6f7a8b9c0d1e";
    mount_instance(&server, "running", &[SECURITY_GROUP_ID]).await;
    Mock::given(method("GET"))
        .and(path(format!("/security-groups/{SECURITY_GROUP_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": SECURITY_GROUP_ID,
            "name": "web",
            "stateful": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/security-groups/{other}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": other,
            "name": "db",
            "stateful": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ok())
        .expect(0)
        .mount(&server)
        .await;

    let current = vec![group_id()];
    let desired = vec![group_id(), other.parse().unwrap()];
    let update = RedisInstanceUpdate {
        security_groups: Some(SecurityGroupChange::between(&current, &desired)),
        ..Default::default()
    };
    let err = provider(&server)
        .redis_instances()
        .update(&instance_id(), &update)
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Invalid { .. }));
}

#[tokio::test]
async fn delete_instance_waits_for_absence() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    mount_instance_once(&server, "shutdown", &[]).await;
    Mock::given(method("GET"))
        .and(path(instance_path()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    provider(&server)
        .redis_instances()
        .delete(&instance_id())
        .await
        .unwrap();
}

#[tokio::test]
async fn configuration_rename_keeps_current_description() {
    let server = MockServer::start().await;
    let id: RedisConfigurationId = CONFIGURATION_ID.parse().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/redis/configurations/{CONFIGURATION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": CONFIGURATION_ID,
            "name": "tuned",
            "description": "eviction tuned",
            "parameters": [{"name": "maxmemory-policy", "value": "allkeys-lru"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/redis/configurations/{CONFIGURATION_ID}")))
        .and(body_json(serde_json::json!({
            "name": "tuned-2",
            "description": "eviction tuned"
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/redis/configurations/{CONFIGURATION_ID}/parameters")))
        .and(body_json(serde_json::json!({"parameters": {"timeout": 300}})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let update = RedisConfigurationUpdate {
        name: Some("tuned-2".to_string()),
        description: None,
        parameters: Some(BTreeMap::from([("timeout".to_string(), serde_json::json!(300))])),
    };
    let configuration = provider(&server)
        .redis_configurations()
        .update(&id, &update)
        .await
        .unwrap();

    assert_eq!(
        configuration.parameter_map().get("maxmemory-policy"),
        Some(&serde_json::json!("allkeys-lru"))
    );
}

#[tokio::test]
async fn configuration_delete_waits_for_absence() {
    let server = MockServer::start().await;
    let id: RedisConfigurationId = CONFIGURATION_ID.parse().unwrap();
    let resource = format!("/redis/configurations/{CONFIGURATION_ID}");
    Mock::given(method("DELETE"))
        .and(path(resource.clone()))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource.clone()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": CONFIGURATION_ID})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(resource))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    provider(&server)
        .redis_configurations()
        .delete(&id)
        .await
        .unwrap();
}

async fn mount_datastores(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/redis/datastores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": "ds-1",
            "code": "redis",
            "name": "Redis",
            "versionInfos": [{
                "id": "v-7",
                "versionName": "7.0",
                "modeInfo": [
                    {"id": "m-ms", "name": "Master/Slave", "code": "ms"},
                    {"id": "m-cl", "name": "Redis Cluster", "code": "cluster"}
                ]
            }]
        }])))
        .mount(server)
        .await;
}

fn new_configuration(database_version: &str, database_type: &str) -> NewRedisConfiguration {
    NewRedisConfiguration {
        name: "tuned".to_string(),
        description: "eviction tuned".to_string(),
        database_version: database_version.to_string(),
        database_type: database_type.to_string(),
        parameters: BTreeMap::from([("timeout".to_string(), serde_json::json!(300))]),
    }
}

#[tokio::test]
async fn configuration_create_resolves_datastore_and_reads_back() {
    let server = MockServer::start().await;
    mount_datastores(&server).await;
    Mock::given(method("POST"))
        .and(path("/redis/configurations"))
        .and(body_json(serde_json::json!({
            "name": "tuned",
            "description": "eviction tuned",
            "datastoreModeId": "m-cl",
            "cacheEngine": "v-7",
            "overridesConfig": {"timeout": 300}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"id": CONFIGURATION_ID}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/redis/configurations/{CONFIGURATION_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": CONFIGURATION_ID,
            "name": "tuned",
            "description": "eviction tuned",
            "parameters": [{"name": "timeout", "value": 300}]
        })))
        .mount(&server)
        .await;

    let configuration = provider(&server)
        .redis_configurations()
        .create(&new_configuration("Redis 7.0", "Cluster"))
        .await
        .unwrap();

    assert_eq!(configuration.id.to_string(), CONFIGURATION_ID);
    assert_eq!(
        configuration.parameter_map().get("timeout"),
        Some(&serde_json::json!(300))
    );
}

#[tokio::test]
async fn configuration_create_rejects_unknown_datastore() {
    let server = MockServer::start().await;
    mount_datastores(&server).await;
    Mock::given(method("POST"))
        .and(path("/redis/configurations"))
        .respond_with(ok())
        .expect(0)
        .mount(&server)
        .await;
    let provider = provider(&server);
    let configurations = provider.redis_configurations();

    let err = configurations
        .create(&new_configuration("Redis 6.0", "Cluster"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Invalid { .. }));
    assert!(err.to_string().contains("not found database_version"));

    let err = configurations
        .create(&new_configuration("Redis 7.0", "Sentinel"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Invalid { .. }));
    assert!(err.to_string().contains("not found database_type"));
}
