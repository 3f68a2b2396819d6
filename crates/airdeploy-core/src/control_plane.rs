// ── Control-plane seam ──
//
// Everything the pipeline and the reconciler need from a controller.
// `ControlPlaneClient` is the production implementation; tests plug in
// an in-memory fake.

use std::future::Future;

use tracing::debug;

use airdeploy_api::ControlPlaneClient;
use airdeploy_api::types::NetworkCreateRequest;

use crate::convert::device_group_from_response;
use crate::error::CoreError;
use crate::model::{
    AssignmentState, DeviceGroup, DeviceGroupId, DeviceProfile, EntityId, NetworkDefinition,
    ProfileId, Site, SiteId,
};

/// A network entity freshly created on the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntity {
    pub id: EntityId,
    pub name: String,
}

/// Remote operations against a controller's control plane.
///
/// Every call is independent; implementations must tolerate many of them
/// in flight at once.
pub trait ControlPlane: Send + Sync {
    fn create_network_entity(
        &self,
        network: &NetworkDefinition,
    ) -> impl Future<Output = Result<NetworkEntity, CoreError>> + Send;

    fn list_sites(&self) -> impl Future<Output = Result<Vec<Site>, CoreError>> + Send;

    fn list_device_groups(
        &self,
        site_id: &SiteId,
    ) -> impl Future<Output = Result<Vec<DeviceGroup>, CoreError>> + Send;

    fn list_profiles(
        &self,
        group_id: &DeviceGroupId,
    ) -> impl Future<Output = Result<Vec<DeviceProfile>, CoreError>> + Send;

    /// `Ok(None)` when the profile no longer exists.
    fn get_profile(
        &self,
        profile_id: &ProfileId,
    ) -> impl Future<Output = Result<Option<DeviceProfile>, CoreError>> + Send;

    fn assign_entity_to_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn unassign_entity_from_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn get_assignment_state(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> impl Future<Output = Result<AssignmentState, CoreError>> + Send;

    /// Push pending configuration to several profiles in one request.
    fn sync_profiles(
        &self,
        profile_ids: &[ProfileId],
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn sync_profile(
        &self,
        profile_id: &ProfileId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl ControlPlane for ControlPlaneClient {
    async fn create_network_entity(
        &self,
        network: &NetworkDefinition,
    ) -> Result<NetworkEntity, CoreError> {
        let body = NetworkCreateRequest::from(network);
        let created = self.create_network(&body).await?;
        debug!(id = %created.id, name = %created.name, "network entity created");
        Ok(NetworkEntity {
            id: EntityId::from(created.id),
            name: created.name,
        })
    }

    async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        let sites = self.list_all_sites().await?;
        Ok(sites.into_iter().map(Site::from).collect())
    }

    async fn list_device_groups(&self, site_id: &SiteId) -> Result<Vec<DeviceGroup>, CoreError> {
        let groups = self.list_all_device_groups(site_id.as_str()).await?;
        Ok(groups
            .into_iter()
            .map(|g| device_group_from_response(g, site_id))
            .collect())
    }

    async fn list_profiles(&self, group_id: &DeviceGroupId) -> Result<Vec<DeviceProfile>, CoreError> {
        let profiles = self.list_all_profiles(group_id.as_str()).await?;
        Ok(profiles.into_iter().map(DeviceProfile::from).collect())
    }

    async fn get_profile(&self, profile_id: &ProfileId) -> Result<Option<DeviceProfile>, CoreError> {
        let profile = ControlPlaneClient::get_profile(self, profile_id.as_str()).await?;
        Ok(profile.map(DeviceProfile::from))
    }

    async fn assign_entity_to_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<(), CoreError> {
        self.assign_network(profile_id.as_str(), &entity_id.to_string())
            .await?;
        Ok(())
    }

    async fn unassign_entity_from_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<(), CoreError> {
        self.unassign_network(profile_id.as_str(), &entity_id.to_string())
            .await?;
        Ok(())
    }

    async fn get_assignment_state(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<AssignmentState, CoreError> {
        let assigned = self
            .is_network_assigned(profile_id.as_str(), &entity_id.to_string())
            .await?;
        Ok(if assigned {
            AssignmentState::Assigned
        } else {
            AssignmentState::NotAssigned
        })
    }

    async fn sync_profiles(&self, profile_ids: &[ProfileId]) -> Result<(), CoreError> {
        let ids: Vec<String> = profile_ids.iter().map(ToString::to_string).collect();
        ControlPlaneClient::sync_profiles(self, &ids).await?;
        Ok(())
    }

    async fn sync_profile(&self, profile_id: &ProfileId) -> Result<(), CoreError> {
        ControlPlaneClient::sync_profile(self, profile_id.as_str()).await?;
        Ok(())
    }
}
