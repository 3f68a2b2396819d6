// ── In-memory assignment store ──
//
// DashMap-backed, cheap to clone. Also the working set behind the JSON
// file store.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AssignmentStore;
use crate::error::CoreError;
use crate::model::{
    EntityId, ProfileAssignmentRecord, ProfileId, SiteAssignmentRecord, SiteId, SyncStatus,
};

/// Serializable image of a store's full contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub sites: Vec<SiteAssignmentRecord>,
    #[serde(default)]
    pub profiles: Vec<ProfileAssignmentRecord>,
}

#[derive(Default)]
struct StoreInner {
    sites: DashMap<(EntityId, SiteId), SiteAssignmentRecord>,
    profiles: DashMap<(EntityId, ProfileId), ProfileAssignmentRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryAssignmentStore {
    inner: Arc<StoreInner>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let store = Self::new();
        store.restore(snapshot);
        store
    }

    /// Full contents, sorted by key.
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut sites: Vec<_> = self.inner.sites.iter().map(|r| r.value().clone()).collect();
        sites.sort_by(|a, b| (&a.network_id, &a.site_id).cmp(&(&b.network_id, &b.site_id)));

        let mut profiles: Vec<_> = self
            .inner
            .profiles
            .iter()
            .map(|r| r.value().clone())
            .collect();
        profiles.sort_by(|a, b| {
            (&a.network_id, &a.profile_id).cmp(&(&b.network_id, &b.profile_id))
        });

        StoreSnapshot { sites, profiles }
    }

    /// Replace all contents with `snapshot`.
    pub fn restore(&self, snapshot: StoreSnapshot) {
        self.inner.sites.clear();
        self.inner.profiles.clear();
        for record in snapshot.sites {
            self.inner
                .sites
                .insert((record.network_id.clone(), record.site_id.clone()), record);
        }
        for record in snapshot.profiles {
            self.inner
                .profiles
                .insert((record.network_id.clone(), record.profile_id.clone()), record);
        }
    }

    pub(crate) fn upsert_site(&self, mut record: SiteAssignmentRecord) {
        let key = (record.network_id.clone(), record.site_id.clone());
        if let Some(existing) = self.inner.sites.get(&key) {
            record.created_at = existing.created_at;
        }
        self.inner.sites.insert(key, record);
    }

    pub(crate) fn upsert_profile(&self, mut record: ProfileAssignmentRecord) {
        let key = (record.network_id.clone(), record.profile_id.clone());
        if let Some(existing) = self.inner.profiles.get(&key) {
            record.created_at = existing.created_at;
        }
        self.inner.profiles.insert(key, record);
    }

    pub(crate) fn set_sync_status(
        &self,
        network_id: &EntityId,
        profile_id: &ProfileId,
        status: SyncStatus,
        error: Option<String>,
    ) -> bool {
        let key = (network_id.clone(), profile_id.clone());
        let Some(mut record) = self.inner.profiles.get_mut(&key) else {
            warn!(
                network = %network_id,
                profile = %profile_id,
                "sync status update for unknown assignment record"
            );
            return false;
        };
        record.sync_status = status;
        record.last_error = error;
        record.modified_at = Utc::now();
        true
    }

    pub(crate) fn sites_for(&self, network_id: &EntityId) -> Vec<SiteAssignmentRecord> {
        let mut sites: Vec<_> = self
            .inner
            .sites
            .iter()
            .filter(|r| &r.key().0 == network_id)
            .map(|r| r.value().clone())
            .collect();
        sites.sort_by(|a, b| a.site_id.cmp(&b.site_id));
        sites
    }

    pub(crate) fn profiles_for(&self, network_id: &EntityId) -> Vec<ProfileAssignmentRecord> {
        let mut profiles: Vec<_> = self
            .inner
            .profiles
            .iter()
            .filter(|r| &r.key().0 == network_id)
            .map(|r| r.value().clone())
            .collect();
        profiles.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        profiles
    }

    pub(crate) fn networks(&self) -> Vec<EntityId> {
        let ids: BTreeSet<EntityId> = self
            .inner
            .sites
            .iter()
            .map(|r| r.key().0.clone())
            .chain(self.inner.profiles.iter().map(|r| r.key().0.clone()))
            .collect();
        ids.into_iter().collect()
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    async fn save_site_assignment(&self, record: SiteAssignmentRecord) -> Result<(), CoreError> {
        self.upsert_site(record);
        Ok(())
    }

    async fn save_profile_assignment(&self, record: ProfileAssignmentRecord) -> Result<(), CoreError> {
        self.upsert_profile(record);
        Ok(())
    }

    async fn save_profile_assignments_batch(
        &self,
        records: Vec<ProfileAssignmentRecord>,
    ) -> Result<(), CoreError> {
        for record in records {
            self.upsert_profile(record);
        }
        Ok(())
    }

    async fn update_sync_status(
        &self,
        network_id: &EntityId,
        profile_id: &ProfileId,
        status: SyncStatus,
        error: Option<String>,
    ) -> Result<bool, CoreError> {
        Ok(self.set_sync_status(network_id, profile_id, status, error))
    }

    async fn list_site_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<SiteAssignmentRecord>, CoreError> {
        Ok(self.sites_for(network_id))
    }

    async fn list_profile_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<ProfileAssignmentRecord>, CoreError> {
        Ok(self.profiles_for(network_id))
    }

    async fn list_networks(&self) -> Result<Vec<EntityId>, CoreError> {
        Ok(self.networks())
    }
}
