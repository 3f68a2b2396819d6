// ── Assignment persistence ──
//
// The store holds what a deployment intended, keyed by network entity.
// Records are upserts: writing the same key twice keeps the original
// `created_at` and replaces everything else.

mod file;
pub(crate) mod memory;

use std::future::Future;

pub use file::JsonFileAssignmentStore;
pub use memory::{MemoryAssignmentStore, StoreSnapshot};

use crate::error::CoreError;
use crate::model::{EntityId, ProfileAssignmentRecord, ProfileId, SiteAssignmentRecord, SyncStatus};

pub trait AssignmentStore: Send + Sync {
    /// Upsert by `(network_id, site_id)`.
    fn save_site_assignment(
        &self,
        record: SiteAssignmentRecord,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Upsert by `(network_id, profile_id)`.
    fn save_profile_assignment(
        &self,
        record: ProfileAssignmentRecord,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn save_profile_assignments_batch(
        &self,
        records: Vec<ProfileAssignmentRecord>,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Record a sync outcome on an existing profile record. Returns
    /// `false`, changing nothing, when no such record exists.
    fn update_sync_status(
        &self,
        network_id: &EntityId,
        profile_id: &ProfileId,
        status: SyncStatus,
        error: Option<String>,
    ) -> impl Future<Output = Result<bool, CoreError>> + Send;

    fn list_site_assignments(
        &self,
        network_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<SiteAssignmentRecord>, CoreError>> + Send;

    fn list_profile_assignments(
        &self,
        network_id: &EntityId,
    ) -> impl Future<Output = Result<Vec<ProfileAssignmentRecord>, CoreError>> + Send;

    /// Every network entity with at least one record.
    fn list_networks(&self) -> impl Future<Output = Result<Vec<EntityId>, CoreError>> + Send;
}
