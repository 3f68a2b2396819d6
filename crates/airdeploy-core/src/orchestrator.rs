// ── Deployment orchestrator ──
//
// validate → discover → resolve + merge → create entity → assign in
// batches → persist → sync → summarize.
//
// Only validation and entity creation can fail a run. Everything after
// entity creation is per item: a failing profile, store write, or sync
// is recorded in the summary and the run carries on.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::batch::in_batches;
use crate::control_plane::ControlPlane;
use crate::discovery::ProfileDiscovery;
use crate::effective_set::{
    calculate_multiple_effective_sets, merge_effective_sets, validate_site_assignment,
};
use crate::error::CoreError;
use crate::model::{
    AssignmentResult, AssignmentState, DeploymentRequest, DeploymentSummary, DeviceProfile,
    EffectiveProfileSet, EntityId, NetworkDefinition, ProfileAssignmentRecord, ProfileId,
    Provenance, SiteAssignmentRecord, SiteDeploymentConfig, SiteId, SyncResult, SyncStatus,
};
use crate::store::AssignmentStore;

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Maximum concurrent control-plane calls per batch.
    pub batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// What a deployment would target, without touching anything.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPreview {
    pub sets: Vec<EffectiveProfileSet>,
    pub targets: Vec<DeviceProfile>,
    pub device_groups_found: usize,
    pub errors: Vec<String>,
}

pub struct Orchestrator<C, S> {
    control_plane: C,
    store: S,
    config: OrchestratorConfig,
}

impl<C: ControlPlane, S: AssignmentStore> Orchestrator<C, S> {
    pub fn new(control_plane: C, store: S) -> Self {
        Self::with_config(control_plane, store, OrchestratorConfig::default())
    }

    pub fn with_config(control_plane: C, store: S, config: OrchestratorConfig) -> Self {
        Self {
            control_plane,
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one deployment.
    ///
    /// Returns `Err` only for [`CoreError::Validation`] (nothing was
    /// called) or [`CoreError::EntityCreation`] (nothing was assigned or
    /// persisted). Every other failure lands in the summary.
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentSummary, CoreError> {
        let DeploymentRequest {
            network,
            sites,
            options,
        } = request;

        validate_request(network, sites)?;
        info!(
            network = %network.name,
            security = %network.security.mode(),
            sites = sites.len(),
            dry_run = options.dry_run,
            "starting deployment"
        );

        let plan = self.plan(sites).await;
        let mut errors = plan.errors;
        let targets = plan.targets;
        let sites_processed = unique_sites(sites).len();

        if options.dry_run {
            info!(targets = targets.len(), "dry run, no changes made");
            return Ok(DeploymentSummary {
                entity_id: None,
                sites_processed,
                device_groups_found: plan.device_groups_found,
                profiles_assigned: targets.len(),
                assignments: targets.iter().map(AssignmentResult::dry_run).collect(),
                sync_results: None,
                success: true,
                errors,
            });
        }

        let entity = self
            .control_plane
            .create_network_entity(network)
            .await
            .map_err(|e| CoreError::EntityCreation {
                message: e.to_string(),
            })?;
        info!(entity = %entity.id, targets = targets.len(), "network entity created");

        let assignments = in_batches(&targets, self.config.batch_size, |profile| {
            self.assign_one(&entity.id, profile)
        })
        .await;
        for failed in assignments.iter().filter(|a| !a.success) {
            errors.push(
                CoreError::Assignment {
                    profile: failed.profile_id.to_string(),
                    message: failed.error.clone().unwrap_or_default(),
                }
                .to_string(),
            );
        }

        self.persist(&entity.id, sites, &targets, &assignments, &mut errors)
            .await;

        let sync_results = if options.skip_sync {
            None
        } else {
            Some(self.sync(&entity.id, &assignments, &mut errors).await)
        };

        let profiles_assigned = assignments.iter().filter(|a| a.success).count();
        let success = profiles_assigned == assignments.len();
        info!(
            entity = %entity.id,
            assigned = profiles_assigned,
            failed = assignments.len() - profiles_assigned,
            "deployment finished"
        );

        Ok(DeploymentSummary {
            entity_id: Some(entity.id),
            sites_processed,
            device_groups_found: plan.device_groups_found,
            profiles_assigned,
            assignments,
            sync_results,
            success,
            errors,
        })
    }

    /// Resolve site policies against live infrastructure without creating
    /// or assigning anything.
    pub async fn preview(&self, sites: &[SiteDeploymentConfig]) -> Result<DeploymentPreview, CoreError> {
        let errors: Vec<String> = sites
            .iter()
            .flat_map(|c| validate_site_assignment(c).errors)
            .collect();
        if !errors.is_empty() {
            return Err(CoreError::Validation { errors });
        }
        Ok(self.plan(sites).await)
    }

    async fn plan(&self, sites: &[SiteDeploymentConfig]) -> DeploymentPreview {
        let site_ids = unique_sites(sites);
        let discovery = ProfileDiscovery::new(&self.control_plane)
            .discover_profiles(&site_ids)
            .await;

        let sets = calculate_multiple_effective_sets(sites, &discovery);
        let targets = merge_effective_sets(&sets);
        debug!(
            discovered = discovery.profile_count(),
            targets = targets.len(),
            "effective sets resolved"
        );

        let mut failures: Vec<(SiteId, String)> = discovery.failures.into_iter().collect();
        failures.sort();

        DeploymentPreview {
            device_groups_found: discovery.device_groups.values().sum(),
            sets,
            targets,
            errors: failures.into_iter().map(|(_, msg)| msg).collect(),
        }
    }

    async fn assign_one(&self, entity_id: &EntityId, profile: &DeviceProfile) -> AssignmentResult {
        match self.control_plane.get_profile(&profile.id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(profile = %profile.id, "profile disappeared before assignment, skipping");
                return AssignmentResult::skipped(profile);
            }
            Err(e) => {
                warn!(profile = %profile.id, error = %e, "profile lookup failed");
                return AssignmentResult::failed(profile, e.to_string());
            }
        }

        match self
            .control_plane
            .assign_entity_to_profile(entity_id, &profile.id)
            .await
        {
            Ok(()) => {
                debug!(profile = %profile.id, "assigned");
                AssignmentResult::succeeded(profile)
            }
            Err(e) => {
                warn!(profile = %profile.id, error = %e, "assignment failed");
                AssignmentResult::failed(profile, e.to_string())
            }
        }
    }

    async fn persist(
        &self,
        entity_id: &EntityId,
        sites: &[SiteDeploymentConfig],
        targets: &[DeviceProfile],
        assignments: &[AssignmentResult],
        errors: &mut Vec<String>,
    ) {
        let now = Utc::now();

        for config in sites {
            let record = SiteAssignmentRecord::from_config(entity_id.clone(), config, now);
            if let Err(e) = self.store.save_site_assignment(record).await {
                warn!(site = %config.site_id, error = %e, "failed to persist site assignment");
                errors.push(e.to_string());
            }
        }

        let records = targets
            .iter()
            .zip(assignments)
            .map(|(profile, result)| {
                let explicit = sites
                    .iter()
                    .any(|c| c.site_id == profile.site_id && c.is_explicit(&profile.id));
                let (actual_state, sync_status) = if result.success {
                    (AssignmentState::Assigned, SyncStatus::Pending)
                } else {
                    (AssignmentState::NotAssigned, SyncStatus::Unknown)
                };
                ProfileAssignmentRecord {
                    network_id: entity_id.clone(),
                    profile_id: profile.id.clone(),
                    site_id: profile.site_id.clone(),
                    device_group_id: profile.device_group_id.clone(),
                    provenance: if explicit {
                        Provenance::Explicit
                    } else {
                        Provenance::SitePropagated
                    },
                    expected_state: AssignmentState::Assigned,
                    actual_state,
                    mismatch_reason: None,
                    sync_status,
                    last_error: result.error.clone(),
                    last_reconciled_at: None,
                    created_at: now,
                    modified_at: now,
                }
            })
            .collect();

        if let Err(e) = self.store.save_profile_assignments_batch(records).await {
            warn!(entity = %entity_id, error = %e, "failed to persist profile assignments");
            errors.push(e.to_string());
        }
    }

    async fn sync(
        &self,
        entity_id: &EntityId,
        assignments: &[AssignmentResult],
        errors: &mut Vec<String>,
    ) -> Vec<SyncResult> {
        let ids: Vec<ProfileId> = assignments
            .iter()
            .filter(|a| a.success)
            .map(|a| a.profile_id.clone())
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }

        let results = match self.control_plane.sync_profiles(&ids).await {
            Ok(()) => ids.into_iter().map(SyncResult::synced).collect(),
            Err(e) => {
                warn!(
                    error = %e,
                    profiles = ids.len(),
                    "batch sync failed, falling back to per-profile sync"
                );
                in_batches(&ids, self.config.batch_size, |id| async move {
                    match self.control_plane.sync_profile(id).await {
                        Ok(()) => SyncResult::synced(id.clone()),
                        Err(e) => SyncResult::failed(id.clone(), e.to_string()),
                    }
                })
                .await
            }
        };

        for result in &results {
            let status = if result.success {
                SyncStatus::Synced
            } else {
                let message = result.error.clone().unwrap_or_default();
                errors.push(
                    CoreError::Sync {
                        message: format!("{}: {message}", result.profile_id),
                    }
                    .to_string(),
                );
                SyncStatus::Failed
            };
            if let Err(e) = self
                .store
                .update_sync_status(entity_id, &result.profile_id, status, result.error.clone())
                .await
            {
                warn!(profile = %result.profile_id, error = %e, "failed to record sync status");
                errors.push(e.to_string());
            }
        }

        results
    }
}

fn validate_request(network: &NetworkDefinition, sites: &[SiteDeploymentConfig]) -> Result<(), CoreError> {
    let mut errors = network.validate();
    if sites.is_empty() {
        errors.push("at least one site is required".to_owned());
    }
    for config in sites {
        errors.extend(validate_site_assignment(config).errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation { errors })
    }
}

fn unique_sites(sites: &[SiteDeploymentConfig]) -> Vec<SiteId> {
    let mut ids: Vec<SiteId> = sites.iter().map(|c| c.site_id.clone()).collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{NOTE_DRY_RUN, RunOptions};
    use crate::store::MemoryAssignmentStore;
    use crate::test_support::{FailingStore, FakeControlPlane, sample_network};
    use pretty_assertions::assert_eq;

    fn request(sites: Vec<SiteDeploymentConfig>, options: RunOptions) -> DeploymentRequest {
        DeploymentRequest {
            network: sample_network(),
            sites,
            options,
        }
    }

    fn seven_profiles() -> FakeControlPlane {
        FakeControlPlane::new().with_group("hq", "dg-1", &["p1", "p2", "p3", "p4", "p5", "p6", "p7"])
    }

    #[tokio::test]
    async fn partial_assignment_failures_do_not_abort() {
        let cp = seven_profiles().fail_assign_for("p3").fail_assign_for("p5");
        let orch = Orchestrator::new(cp.clone(), MemoryAssignmentStore::new());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        assert!(summary.entity_id.is_some());
        assert_eq!(summary.assignments.len(), 7);
        assert_eq!(summary.profiles_assigned, 5);
        assert!(!summary.success);
        let failed: Vec<&str> = summary
            .failed_assignments()
            .map(|a| a.profile_id.as_str())
            .collect();
        assert_eq!(failed, vec!["p3", "p5"]);
        assert_eq!(summary.errors.len(), 2);
        assert_eq!(summary.sync_results.as_ref().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn batch_sync_failure_falls_back_per_profile() {
        let cp = FakeControlPlane::new()
            .with_group("hq", "dg-1", &["p1", "p2", "p3"])
            .fail_batch_sync();
        let store = MemoryAssignmentStore::new();
        let orch = Orchestrator::new(cp.clone(), store.clone());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        let sync = summary.sync_results.unwrap();
        assert_eq!(sync.len(), 3);
        assert!(sync.iter().all(|r| r.success));
        assert_eq!(cp.batch_sync_calls().len(), 1);
        assert_eq!(cp.single_sync_calls().len(), 3);

        let records = store
            .list_profile_assignments(summary.entity_id.as_ref().unwrap())
            .await
            .unwrap();
        assert!(records.iter().all(|r| r.sync_status == SyncStatus::Synced));
    }

    #[tokio::test]
    async fn per_profile_sync_failures_are_isolated() {
        let cp = FakeControlPlane::new()
            .with_group("hq", "dg-1", &["p1", "p2"])
            .fail_sync_for("p2");
        let store = MemoryAssignmentStore::new();
        let orch = Orchestrator::new(cp, store.clone());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        let sync = summary.sync_results.unwrap();
        assert!(sync[0].success);
        assert!(!sync[1].success);
        assert!(summary.success);

        let records = store
            .list_profile_assignments(summary.entity_id.as_ref().unwrap())
            .await
            .unwrap();
        assert_eq!(records[1].sync_status, SyncStatus::Failed);
        assert!(records[1].last_error.is_some());
    }

    #[tokio::test]
    async fn dry_run_makes_no_changes() {
        let cp = FakeControlPlane::new()
            .with_group("site-a", "dg-a", &["pa1", "pa2"])
            .with_group("site-b", "dg-b", &["pb1"]);
        let store = MemoryAssignmentStore::new();
        let orch = Orchestrator::new(cp.clone(), store.clone());

        let summary = orch
            .deploy(&request(
                vec![
                    SiteDeploymentConfig::all_profiles("site-a"),
                    SiteDeploymentConfig::all_profiles("site-b"),
                ],
                RunOptions {
                    dry_run: true,
                    skip_sync: false,
                },
            ))
            .await
            .unwrap();

        assert_eq!(summary.entity_id, None);
        assert_eq!(summary.sites_processed, 2);
        assert_eq!(summary.device_groups_found, 2);
        assert_eq!(summary.profiles_assigned, 3);
        assert!(summary.success);
        assert!(summary.sync_results.is_none());
        assert!(
            summary
                .assignments
                .iter()
                .all(|a| a.success && a.note.as_deref() == Some(NOTE_DRY_RUN))
        );
        assert!(cp.created().is_empty());
        assert!(cp.assign_calls().is_empty());
        assert!(store.list_networks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_request_fails_before_any_call() {
        let cp = seven_profiles();
        let orch = Orchestrator::new(cp.clone(), MemoryAssignmentStore::new());

        let result = orch
            .deploy(&request(
                vec![
                    SiteDeploymentConfig::all_profiles("hq"),
                    SiteDeploymentConfig::include_only("branch", Vec::<&str>::new()),
                ],
                RunOptions::default(),
            ))
            .await;

        let errors = match result {
            Err(CoreError::Validation { errors }) => errors,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("branch"));
        assert_eq!(cp.group_list_calls(), 0);
        assert!(cp.created().is_empty());
    }

    #[tokio::test]
    async fn empty_site_list_is_invalid() {
        let orch = Orchestrator::new(FakeControlPlane::new(), MemoryAssignmentStore::new());
        let result = orch.deploy(&request(Vec::new(), RunOptions::default())).await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));
    }

    #[tokio::test]
    async fn entity_creation_failure_is_fatal() {
        let cp = seven_profiles().fail_create();
        let store = MemoryAssignmentStore::new();
        let orch = Orchestrator::new(cp.clone(), store.clone());

        let result = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await;

        assert!(matches!(result, Err(CoreError::EntityCreation { .. })));
        assert!(cp.assign_calls().is_empty());
        assert!(store.list_networks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assignments_run_in_bounded_batches() {
        let ids: Vec<String> = (1..=12).map(|n| format!("p{n:02}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let cp = FakeControlPlane::new().with_group("hq", "dg-1", &refs);
        let orch = Orchestrator::with_config(
            cp.clone(),
            MemoryAssignmentStore::new(),
            OrchestratorConfig { batch_size: 5 },
        );

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        assert_eq!(summary.profiles_assigned, 12);
        assert_eq!(cp.assign_calls().len(), 12);
        assert_eq!(cp.max_in_flight(), 5);
    }

    #[tokio::test]
    async fn vanished_profile_is_skipped() {
        let cp = FakeControlPlane::new()
            .with_group("hq", "dg-1", &["p1", "p2"])
            .hide_profile("p2");
        let orch = Orchestrator::new(cp.clone(), MemoryAssignmentStore::new());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        let skipped = &summary.assignments[1];
        assert!(skipped.skipped);
        assert!(!skipped.success);
        assert!(!summary.success);
        assert_eq!(cp.assign_calls(), vec![ProfileId::from("p1")]);
    }

    #[tokio::test]
    async fn lookup_error_fails_only_that_profile() {
        let cp = FakeControlPlane::new()
            .with_group("hq", "dg-1", &["p1", "p2"])
            .fail_lookup_for("p1");
        let orch = Orchestrator::new(cp, MemoryAssignmentStore::new());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        assert!(!summary.assignments[0].success);
        assert!(!summary.assignments[0].skipped);
        assert!(summary.assignments[1].success);
    }

    #[tokio::test]
    async fn records_capture_intent_and_outcome() {
        let cp = FakeControlPlane::new()
            .with_group("hq", "dg-1", &["p1", "p2", "p3"])
            .fail_assign_for("p3");
        let store = MemoryAssignmentStore::new();
        let orch = Orchestrator::new(cp, store.clone());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::exclude_some("hq", ["p2"]).with_explicit(["p1"])],
                RunOptions {
                    dry_run: false,
                    skip_sync: true,
                },
            ))
            .await
            .unwrap();
        assert!(summary.sync_results.is_none());

        let entity = summary.entity_id.unwrap();
        let sites = store.list_site_assignments(&entity).await.unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].excluded_profiles, vec![ProfileId::from("p2")]);

        let records = store.list_profile_assignments(&entity).await.unwrap();
        assert_eq!(records.len(), 2);

        let p1 = &records[0];
        assert_eq!(p1.provenance, Provenance::Explicit);
        assert_eq!(p1.actual_state, AssignmentState::Assigned);
        assert_eq!(p1.sync_status, SyncStatus::Pending);

        let p3 = &records[1];
        assert_eq!(p3.provenance, Provenance::SitePropagated);
        assert_eq!(p3.expected_state, AssignmentState::Assigned);
        assert_eq!(p3.actual_state, AssignmentState::NotAssigned);
        assert_eq!(p3.sync_status, SyncStatus::Unknown);
        assert!(p3.last_error.is_some());
    }

    #[tokio::test]
    async fn store_failures_are_not_fatal() {
        let cp = FakeControlPlane::new().with_group("hq", "dg-1", &["p1"]);
        let orch = Orchestrator::new(cp, FailingStore::default());

        let summary = orch
            .deploy(&request(
                vec![SiteDeploymentConfig::all_profiles("hq")],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        assert!(summary.success);
        assert_eq!(summary.profiles_assigned, 1);
        // site record, profile batch, sync status update
        assert_eq!(summary.errors.len(), 3);
    }

    #[tokio::test]
    async fn one_failing_site_does_not_block_the_other() {
        let cp = FakeControlPlane::new()
            .with_group("site-a", "dg-a", &["pa1"])
            .with_group("site-b", "dg-b", &["pb1", "pb2"])
            .fail_groups_for("site-a");
        let orch = Orchestrator::new(cp, MemoryAssignmentStore::new());

        let summary = orch
            .deploy(&request(
                vec![
                    SiteDeploymentConfig::all_profiles("site-a"),
                    SiteDeploymentConfig::all_profiles("site-b"),
                ],
                RunOptions::default(),
            ))
            .await
            .unwrap();

        assert_eq!(summary.profiles_assigned, 2);
        assert!(summary.success);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("site-a"));
    }

    #[tokio::test]
    async fn preview_rejects_invalid_sites() {
        let orch = Orchestrator::new(seven_profiles(), MemoryAssignmentStore::new());
        let result = orch
            .preview(&[SiteDeploymentConfig::include_only("hq", Vec::<&str>::new())])
            .await;
        assert!(matches!(result, Err(CoreError::Validation { .. })));

        let preview = orch
            .preview(&[SiteDeploymentConfig::include_only("hq", ["p2", "p4"])])
            .await
            .unwrap();
        assert_eq!(preview.targets.len(), 2);
        assert_eq!(preview.sets[0].excluded.len(), 5);
    }
}
