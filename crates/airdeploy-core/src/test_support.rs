// ── In-memory control plane for tests ──

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::control_plane::{ControlPlane, NetworkEntity};
use crate::error::CoreError;
use crate::model::{
    AssignmentState, DeviceGroup, DeviceGroupId, DeviceProfile, EntityId, NetworkDefinition,
    ProfileAssignmentRecord, ProfileId, Site, SiteAssignmentRecord, SiteId, SyncStatus, WifiBand,
    WifiFeatures, WifiSecurity, WpaMode,
};
use crate::store::{AssignmentStore, MemoryAssignmentStore};

#[derive(Default)]
struct State {
    groups: Vec<DeviceGroup>,
    profiles: Vec<DeviceProfile>,
    assigned: HashSet<(EntityId, ProfileId)>,

    hidden: HashSet<ProfileId>,
    fail_groups: HashSet<SiteId>,
    fail_assign: HashSet<ProfileId>,
    fail_lookup: HashSet<ProfileId>,
    fail_state: HashSet<ProfileId>,
    fail_sync: HashSet<ProfileId>,
    fail_batch_sync: bool,
    fail_create: bool,

    created: Vec<String>,
    group_list_calls: usize,
    assign_calls: Vec<ProfileId>,
    unassign_calls: Vec<ProfileId>,
    batch_sync_calls: Vec<Vec<ProfileId>>,
    single_sync_calls: Vec<ProfileId>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeControlPlane {
    state: Arc<Mutex<State>>,
}

impl FakeControlPlane {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    // ── Builders ─────────────────────────────────────────────────────

    /// Add a device group at `site` holding `profiles`, named
    /// `"Profile <id>"`.
    pub(crate) fn with_group(self, site: &str, group: &str, profiles: &[&str]) -> Self {
        self.with_state(|s| {
            s.groups.push(DeviceGroup {
                id: group.into(),
                name: format!("Group {group}"),
                site_id: site.into(),
            });
            for id in profiles {
                s.profiles.push(DeviceProfile {
                    id: (*id).into(),
                    name: format!("Profile {id}"),
                    site_id: site.into(),
                    device_group_id: group.into(),
                });
            }
        });
        self
    }

    /// Keep the profile in listings but report it missing on lookup, as
    /// if it was deleted between discovery and assignment.
    pub(crate) fn hide_profile(self, profile: &str) -> Self {
        self.with_state(|s| s.hidden.insert(profile.into()));
        self
    }

    pub(crate) fn fail_groups_for(self, site: &str) -> Self {
        self.with_state(|s| s.fail_groups.insert(site.into()));
        self
    }

    pub(crate) fn fail_assign_for(self, profile: &str) -> Self {
        self.with_state(|s| s.fail_assign.insert(profile.into()));
        self
    }

    pub(crate) fn fail_lookup_for(self, profile: &str) -> Self {
        self.with_state(|s| s.fail_lookup.insert(profile.into()));
        self
    }

    pub(crate) fn fail_state_for(self, profile: &str) -> Self {
        self.with_state(|s| s.fail_state.insert(profile.into()));
        self
    }

    pub(crate) fn fail_sync_for(self, profile: &str) -> Self {
        self.with_state(|s| s.fail_sync.insert(profile.into()));
        self
    }

    pub(crate) fn fail_batch_sync(self) -> Self {
        self.with_state(|s| s.fail_batch_sync = true);
        self
    }

    pub(crate) fn fail_create(self) -> Self {
        self.with_state(|s| s.fail_create = true);
        self
    }

    // ── Mutations between runs ───────────────────────────────────────

    /// Make `get_profile` report the profile as gone, as if it was
    /// deleted after discovery.
    pub(crate) fn remove_profile(&self, profile: &str) {
        let id = ProfileId::from(profile);
        self.with_state(|s| s.profiles.retain(|p| p.id != id));
    }

    pub(crate) fn move_profile(&self, profile: &str, group: &str) {
        let id = ProfileId::from(profile);
        self.with_state(|s| {
            for p in s.profiles.iter_mut().filter(|p| p.id == id) {
                p.device_group_id = group.into();
            }
        });
    }

    pub(crate) fn set_assigned(&self, entity: &EntityId, profile: &str, assigned: bool) {
        let key = (entity.clone(), ProfileId::from(profile));
        self.with_state(|s| {
            if assigned {
                s.assigned.insert(key);
            } else {
                s.assigned.remove(&key);
            }
        });
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub(crate) fn created(&self) -> Vec<String> {
        self.with_state(|s| s.created.clone())
    }

    pub(crate) fn group_list_calls(&self) -> usize {
        self.with_state(|s| s.group_list_calls)
    }

    pub(crate) fn assign_calls(&self) -> Vec<ProfileId> {
        self.with_state(|s| s.assign_calls.clone())
    }

    pub(crate) fn unassign_calls(&self) -> Vec<ProfileId> {
        self.with_state(|s| s.unassign_calls.clone())
    }

    pub(crate) fn batch_sync_calls(&self) -> Vec<Vec<ProfileId>> {
        self.with_state(|s| s.batch_sync_calls.clone())
    }

    pub(crate) fn single_sync_calls(&self) -> Vec<ProfileId> {
        self.with_state(|s| s.single_sync_calls.clone())
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.with_state(|s| s.max_in_flight)
    }

    pub(crate) fn is_assigned(&self, entity: &EntityId, profile: &str) -> bool {
        let key = (entity.clone(), ProfileId::from(profile));
        self.with_state(|s| s.assigned.contains(&key))
    }
}

fn injected(what: &str) -> CoreError {
    CoreError::Api {
        message: format!("injected failure: {what}"),
        code: None,
        status: Some(500),
    }
}

impl ControlPlane for FakeControlPlane {
    async fn create_network_entity(
        &self,
        network: &NetworkDefinition,
    ) -> Result<NetworkEntity, CoreError> {
        self.with_state(|s| {
            if s.fail_create {
                return Err(injected("create"));
            }
            s.created.push(network.name.clone());
            Ok(NetworkEntity {
                id: EntityId::from(format!("net-{}", s.created.len())),
                name: network.name.clone(),
            })
        })
    }

    async fn list_sites(&self) -> Result<Vec<Site>, CoreError> {
        Ok(self.with_state(|s| {
            let mut ids: Vec<SiteId> = s.groups.iter().map(|g| g.site_id.clone()).collect();
            ids.sort();
            ids.dedup();
            ids.into_iter()
                .map(|id| Site {
                    name: format!("Site {id}"),
                    id,
                })
                .collect()
        }))
    }

    async fn list_device_groups(&self, site_id: &SiteId) -> Result<Vec<DeviceGroup>, CoreError> {
        self.with_state(|s| {
            s.group_list_calls += 1;
            if s.fail_groups.contains(site_id) {
                return Err(injected("list device groups"));
            }
            Ok(s.groups
                .iter()
                .filter(|g| &g.site_id == site_id)
                .cloned()
                .collect())
        })
    }

    async fn list_profiles(&self, group_id: &DeviceGroupId) -> Result<Vec<DeviceProfile>, CoreError> {
        Ok(self.with_state(|s| {
            s.profiles
                .iter()
                .filter(|p| &p.device_group_id == group_id)
                .cloned()
                .collect()
        }))
    }

    async fn get_profile(&self, profile_id: &ProfileId) -> Result<Option<DeviceProfile>, CoreError> {
        self.with_state(|s| {
            if s.fail_lookup.contains(profile_id) {
                return Err(injected("get profile"));
            }
            if s.hidden.contains(profile_id) {
                return Ok(None);
            }
            Ok(s.profiles.iter().find(|p| &p.id == profile_id).cloned())
        })
    }

    async fn assign_entity_to_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<(), CoreError> {
        self.with_state(|s| {
            s.assign_calls.push(profile_id.clone());
            s.in_flight += 1;
            s.max_in_flight = s.max_in_flight.max(s.in_flight);
        });
        tokio::task::yield_now().await;
        self.with_state(|s| {
            s.in_flight -= 1;
            if s.fail_assign.contains(profile_id) {
                return Err(injected("assign"));
            }
            s.assigned.insert((entity_id.clone(), profile_id.clone()));
            Ok(())
        })
    }

    async fn unassign_entity_from_profile(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<(), CoreError> {
        self.with_state(|s| {
            s.unassign_calls.push(profile_id.clone());
            s.assigned.remove(&(entity_id.clone(), profile_id.clone()));
        });
        Ok(())
    }

    async fn get_assignment_state(
        &self,
        entity_id: &EntityId,
        profile_id: &ProfileId,
    ) -> Result<AssignmentState, CoreError> {
        self.with_state(|s| {
            if s.fail_state.contains(profile_id) {
                return Err(injected("assignment state"));
            }
            Ok(
                if s.assigned.contains(&(entity_id.clone(), profile_id.clone())) {
                    AssignmentState::Assigned
                } else {
                    AssignmentState::NotAssigned
                },
            )
        })
    }

    async fn sync_profiles(&self, profile_ids: &[ProfileId]) -> Result<(), CoreError> {
        self.with_state(|s| {
            s.batch_sync_calls.push(profile_ids.to_vec());
            if s.fail_batch_sync || profile_ids.iter().any(|id| s.fail_sync.contains(id)) {
                return Err(injected("batch sync"));
            }
            Ok(())
        })
    }

    async fn sync_profile(&self, profile_id: &ProfileId) -> Result<(), CoreError> {
        self.with_state(|s| {
            s.single_sync_calls.push(profile_id.clone());
            if s.fail_sync.contains(profile_id) {
                return Err(injected("sync"));
            }
            Ok(())
        })
    }
}

/// A store whose every write fails.
#[derive(Clone, Default)]
pub(crate) struct FailingStore {
    reads: MemoryAssignmentStore,
}

fn store_down() -> CoreError {
    CoreError::Store {
        message: "store unavailable".into(),
    }
}

impl AssignmentStore for FailingStore {
    async fn save_site_assignment(&self, _record: SiteAssignmentRecord) -> Result<(), CoreError> {
        Err(store_down())
    }

    async fn save_profile_assignment(&self, _record: ProfileAssignmentRecord) -> Result<(), CoreError> {
        Err(store_down())
    }

    async fn save_profile_assignments_batch(
        &self,
        _records: Vec<ProfileAssignmentRecord>,
    ) -> Result<(), CoreError> {
        Err(store_down())
    }

    async fn update_sync_status(
        &self,
        _network_id: &EntityId,
        _profile_id: &ProfileId,
        _status: SyncStatus,
        _error: Option<String>,
    ) -> Result<bool, CoreError> {
        Err(store_down())
    }

    async fn list_site_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<SiteAssignmentRecord>, CoreError> {
        self.reads.list_site_assignments(network_id).await
    }

    async fn list_profile_assignments(
        &self,
        network_id: &EntityId,
    ) -> Result<Vec<ProfileAssignmentRecord>, CoreError> {
        self.reads.list_profile_assignments(network_id).await
    }

    async fn list_networks(&self) -> Result<Vec<EntityId>, CoreError> {
        self.reads.list_networks().await
    }
}

pub(crate) fn sample_network() -> NetworkDefinition {
    NetworkDefinition {
        name: "Corp".into(),
        ssid: "Corp-WiFi".into(),
        security: WifiSecurity::Psk {
            passphrase: "correct horse battery".to_owned().into(),
            wpa: WpaMode::Wpa2,
        },
        vlan: Some(10),
        band: WifiBand::Dual,
        features: WifiFeatures::default(),
    }
}
