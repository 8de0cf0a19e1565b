//! Volume attachment operations against a mock API.

mod common;

use std::time::Duration;

use cmccloud_id::{ServerId, VolumeId};
use common::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn volume_id() -> VolumeId {
    VOLUME_ID.parse().unwrap()
}

fn server_id() -> ServerId {
    SERVER_ID.parse().unwrap()
}

fn volume_json(attached: bool) -> serde_json::Value {
    let attachments = if attached {
        serde_json::json!([{"server_id": SERVER_ID, "device": "/dev/vdb"}])
    } else {
        serde_json::json!([])
    };
    serde_json::json!({
        "id": VOLUME_ID,
        "name": "data",
        "status": if attached { "in-use" } else { "available" },
        "attachments": attachments
    })
}

async fn mount_volume_sequence(server: &MockServer, first: bool, then: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/volumes/{VOLUME_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_json(first)))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/volumes/{VOLUME_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_json(then)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn attach_waits_then_reads_server_side_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/volumes/{VOLUME_ID}/attach")))
        .and(body_json(serde_json::json!({
            "server_id": SERVER_ID,
            "delete_on_termination": true
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    mount_volume_sequence(&server, false, true).await;
    Mock::given(method("GET"))
        .and(path(format!("/servers/{SERVER_ID}/volume-attachments/{VOLUME_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "server_id": SERVER_ID,
            "volume_id": VOLUME_ID,
            "delete_on_termination": true
        })))
        .mount(&server)
        .await;

    let detail = provider(&server)
        .volume_attachments()
        .attach(&volume_id(), &server_id(), true)
        .await
        .unwrap();

    assert_eq!(detail.volume_id, volume_id());
    assert!(detail.delete_on_termination);
}

#[tokio::test]
async fn detach_waits_until_server_is_gone() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/volumes/{VOLUME_ID}/detach")))
        .and(body_json(serde_json::json!({"server_id": SERVER_ID})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    mount_volume_sequence(&server, true, false).await;

    provider(&server)
        .volume_attachments()
        .detach(&volume_id(), &server_id())
        .await
        .unwrap();
}

#[tokio::test]
async fn attach_that_never_lands_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/volumes/{VOLUME_ID}/attach")))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    mount_volume_sequence(&server, false, false).await;

    let err = provider_with_timeout(&server, Duration::from_millis(400))
        .volume_attachments()
        .attach(&volume_id(), &server_id(), false)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with(&format!("failed to attach volume {VOLUME_ID}")));
    assert!(message.contains("last status: Detached"));
}

#[tokio::test]
async fn rejected_attach_skips_the_wait() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/volumes/{VOLUME_ID}/attach")))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "conflict",
            "message": "volume is in use"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(volume_json(false)))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider(&server)
        .volume_attachments()
        .attach(&volume_id(), &server_id(), false)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("volume is in use"));
}
