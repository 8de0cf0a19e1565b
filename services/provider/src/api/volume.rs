//! Volume attachment endpoints.

use cmccloud_id::{ServerId, VolumeId};
use serde::{Deserialize, Serialize};

use crate::client::CmcClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: VolumeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attachments: Vec<VolumeAttachment>,
}

impl Volume {
    pub fn is_attached_to(&self, server_id: &ServerId) -> bool {
        self.attachments.iter().any(|a| &a.server_id == server_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachment {
    pub server_id: ServerId,
    #[serde(default)]
    pub device: String,
}

/// Attachment as seen from the server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeAttachmentDetail {
    pub server_id: ServerId,
    pub volume_id: VolumeId,
    #[serde(default)]
    pub delete_on_termination: bool,
}

#[derive(Debug, Serialize)]
struct AttachRequest<'a> {
    server_id: &'a ServerId,
    delete_on_termination: bool,
}

#[derive(Debug, Serialize)]
struct DetachRequest<'a> {
    server_id: &'a ServerId,
}

impl CmcClient {
    pub async fn get_volume(&self, id: &VolumeId) -> Result<Volume, ApiError> {
        self.get(&format!("/volumes/{id}")).await
    }

    pub async fn attach_volume(
        &self,
        volume_id: &VolumeId,
        server_id: &ServerId,
        delete_on_termination: bool,
    ) -> Result<(), ApiError> {
        self.post_ack(
            &format!("/volumes/{volume_id}/attach"),
            &AttachRequest {
                server_id,
                delete_on_termination,
            },
        )
        .await
    }

    pub async fn detach_volume(
        &self,
        volume_id: &VolumeId,
        server_id: &ServerId,
    ) -> Result<(), ApiError> {
        self.post_ack(
            &format!("/volumes/{volume_id}/detach"),
            &DetachRequest { server_id },
        )
        .await
    }

    pub async fn get_volume_attachment(
        &self,
        server_id: &ServerId,
        volume_id: &VolumeId,
    ) -> Result<VolumeAttachmentDetail, ApiError> {
        self.get(&format!(
            "/servers/{server_id}/volume-attachments/{volume_id}"
        ))
        .await
    }
}
