//! Volume attachment operations.

use cmccloud_converge::ConvergencePoller;
use cmccloud_id::{ServerId, VolumeId};
use tracing::info;

use crate::api::VolumeAttachmentDetail;
use crate::error::ProviderError;
use crate::resources::Provider;
use crate::waiters::{self, VolumeFetcher};

const RESOURCE: &str = "volume";

/// Attach/detach operations.
pub struct VolumeAttachments<'a> {
    provider: &'a Provider,
}

impl<'a> VolumeAttachments<'a> {
    pub(crate) fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    fn poller(&self) -> ConvergencePoller<VolumeFetcher> {
        ConvergencePoller::new(VolumeFetcher::new(self.provider.client().clone()))
    }

    /// Attach a volume and wait until it lists the server.
    pub async fn attach(
        &self,
        volume_id: &VolumeId,
        server_id: &ServerId,
        delete_on_termination: bool,
    ) -> Result<VolumeAttachmentDetail, ProviderError> {
        self.provider
            .client()
            .attach_volume(volume_id, server_id, delete_on_termination)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, volume_id, "attach", e))?;
        info!(volume_id = %volume_id, server_id = %server_id, "Volume attach accepted");

        let spec = waiters::volume_attached(
            self.provider.polling(),
            self.provider.timeouts().volume_attachment.create,
        )?;
        self.poller()
            .await_state(volume_id, waiters::volume_attachment_status(*server_id), &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, volume_id, "attach", e))?;

        self.read(server_id, volume_id).await
    }

    pub async fn read(
        &self,
        server_id: &ServerId,
        volume_id: &VolumeId,
    ) -> Result<VolumeAttachmentDetail, ProviderError> {
        self.provider
            .client()
            .get_volume_attachment(server_id, volume_id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, volume_id, "read attachment of", e))
    }

    /// Detach a volume and wait until it no longer lists the server.
    pub async fn detach(
        &self,
        volume_id: &VolumeId,
        server_id: &ServerId,
    ) -> Result<(), ProviderError> {
        self.provider
            .client()
            .detach_volume(volume_id, server_id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, volume_id, "detach", e))?;
        info!(volume_id = %volume_id, server_id = %server_id, "Volume detach accepted");

        let spec = waiters::volume_detached(
            self.provider.polling(),
            self.provider.timeouts().volume_attachment.delete,
        )?;
        self.poller()
            .await_state(volume_id, waiters::volume_attachment_status(*server_id), &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, volume_id, "detach", e))?;
        Ok(())
    }
}
