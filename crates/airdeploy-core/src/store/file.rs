// ── JSON file assignment store ──
//
// A MemoryAssignmentStore whose full contents are written to disk after
// every mutation. Writes go to a sibling temp file first and are renamed
// into place, so a crash never leaves a half-written state file. A failed
// write rolls the in-memory contents back, so memory never runs ahead of
// the file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::memory::{MemoryAssignmentStore, StoreSnapshot};
use super::AssignmentStore;
use crate::error::CoreError;
use crate::model::{EntityId, ProfileAssignmentRecord, ProfileId, SiteAssignmentRecord, SyncStatus};

pub struct JsonFileAssignmentStore {
    path: PathBuf,
    memory: MemoryAssignmentStore,
    /// Serializes mutate-then-flush so snapshots land in order.
    write_lock: Mutex<()>,
}

impl JsonFileAssignmentStore {
    /// Open the store at `path`. A missing file means an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<StoreSnapshot>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreSnapshot::default(),
            Err(e) => {
                return Err(CoreError::Store {
                    message: format!("cannot read {}: {e}", path.display()),
                });
            }
        };
        debug!(
            path = %path.display(),
            sites = snapshot.sites.len(),
            profiles = snapshot.profiles.len(),
            "assignment store opened"
        );

        Ok(Self {
            path,
            memory: MemoryAssignmentStore::from_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(&self.memory.snapshot())?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply `mutate` and flush, restoring the previous contents if the
    /// flush fails. `persist` decides from the mutation's result whether a
    /// flush is needed at all.
    async fn commit<R>(
        &self,
        mutate: impl FnOnce(&MemoryAssignmentStore) -> R,
        persist: impl FnOnce(&R) -> bool,
    ) -> Result<R, CoreError> {
        let _guard = self.write_lock.lock().await;
        let before = self.memory.snapshot();

        let outcome = mutate(&self.memory);
        if !persist(&outcome) {
            return Ok(outcome);
        }
        if let Err(e) = self.flush().await {
            warn!(path = %self.path.display(), error = %e, "state write failed, rolling back");
            self.memory.restore(before);
            return Err(e);
        }
        Ok(outcome)
    }
}

impl AssignmentStore for JsonFileAssignmentStore {
    async fn save_site_assignment(&self, record: SiteAssignmentRecord) -> Result<(), CoreError> {
        self.commit(|m| m.upsert_site(record), |_| true).await
    }

    async fn save_profile_assignment(&self, record: ProfileAssignmentRecord) -> Result<(), CoreError> {
        self.commit(|m| m.upsert_profile(record), |_| true).await
    }

    async fn save_profile_assignments_batch(
        &self,
        records: Vec<ProfileAssignmentRecord>,
    ) -> Result<(), CoreError> {
        self.commit(
            |m| {
                for record in records {
                    m.upsert_profile(record);
                }
            },
            |_| true,
        )
        .await
    }

    async fn update_sync_status(
        &self,
        network_id: &EntityId,
        profile_id: &ProfileId,
        status: SyncStatus,
        error: Option<String>,
    ) -> Result<bool, CoreError> {
        self.commit(
            |m| m.set_sync_status(network_id, profile_id, status, error),
            |updated: &bool| *updated,
        )
        .await
    }

    async fn list_site_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<SiteAssignmentRecord>, CoreError> {
        Ok(self.memory.sites_for(network_id))
    }

    async fn list_profile_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<ProfileAssignmentRecord>, CoreError> {
        Ok(self.memory.profiles_for(network_id))
    }

    async fn list_networks(&self) -> Result<Vec<EntityId>, CoreError> {
        Ok(self.memory.networks())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::memory::tests::{profile_record, site_record};
    use chrono::Utc;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileAssignmentStore::open(dir.path().join("state.json"))
            .await
            .unwrap();
        assert!(store.list_networks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn contents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let now = Utc::now();

        {
            let store = JsonFileAssignmentStore::open(&path).await.unwrap();
            store.save_site_assignment(site_record("net-1", "hq", now)).await.unwrap();
            store
                .save_profile_assignments_batch(vec![
                    profile_record("net-1", "p-1", now),
                    profile_record("net-1", "p-2", now),
                ])
                .await
                .unwrap();
            store
                .update_sync_status(&"net-1".into(), &"p-2".into(), SyncStatus::Synced, None)
                .await
                .unwrap();
        }

        let reopened = JsonFileAssignmentStore::open(&path).await.unwrap();
        let profiles = reopened
            .list_profile_assignments(&"net-1".into())
            .await
            .unwrap();
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[1].sync_status, SyncStatus::Synced);
        assert_eq!(
            reopened.list_site_assignments(&"net-1".into()).await.unwrap().len(),
            1
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_rolls_back_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let now = Utc::now();
        let store = JsonFileAssignmentStore::open(&path).await.unwrap();

        // A directory where the temp file should go makes the write fail.
        let tmp = dir.path().join("state.json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let result = store.save_site_assignment(site_record("net-1", "hq", now)).await;
        assert!(matches!(result, Err(CoreError::Store { .. })));
        assert!(store.list_networks().await.unwrap().is_empty());

        std::fs::remove_dir(&tmp).unwrap();
        store
            .save_profile_assignment(profile_record("net-2", "p-1", now))
            .await
            .unwrap();

        let reopened = JsonFileAssignmentStore::open(&path).await.unwrap();
        let networks = reopened.list_networks().await.unwrap();
        assert_eq!(networks, vec![EntityId::from("net-2")]);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileAssignmentStore::open(&path).await;
        assert!(matches!(result, Err(CoreError::Store { .. })));
    }
}
