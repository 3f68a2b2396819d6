// ── Reconciliation ──
//
// Compares persisted intent with what the controller reports, classifies
// every drift, and writes the observation back. Fixing drift is a
// separate, explicit step (`remediate`).

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::batch::in_batches;
use crate::control_plane::ControlPlane;
use crate::error::CoreError;
use crate::model::{
    AssignmentState, DeviceProfile, EntityId, MismatchReason, ProfileAssignmentRecord, ProfileId,
    ReconciliationResult, RemediationAction, SiteId, SyncStatus,
};
use crate::orchestrator::DEFAULT_BATCH_SIZE;
use crate::store::AssignmentStore;

/// What the controller reports for one recorded profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// `None` when the profile no longer exists.
    pub profile: Option<DeviceProfile>,
    pub state: AssignmentState,
}

/// Classify one record against its observation. First matching rule
/// wins; `None` means the record matches.
pub fn classify(
    record: &ProfileAssignmentRecord,
    observed: &Observation,
    site_recorded: bool,
) -> Option<MismatchReason> {
    let Some(profile) = &observed.profile else {
        return Some(MismatchReason::ProfileDeleted);
    };
    if profile.device_group_id != record.device_group_id {
        return Some(MismatchReason::ProfileMoved);
    }
    if !site_recorded {
        return Some(MismatchReason::SiteAssignmentMissing);
    }

    match (record.expected_state, observed.state) {
        (AssignmentState::Assigned, AssignmentState::NotAssigned) => {
            Some(MismatchReason::MissingAssignment)
        }
        (AssignmentState::NotAssigned, AssignmentState::Assigned) => {
            Some(MismatchReason::UnexpectedAssignment)
        }
        _ if record.actual_state == AssignmentState::Assigned
            && observed.state == AssignmentState::Assigned
            && record.sync_status == SyncStatus::Failed =>
        {
            Some(MismatchReason::SyncFailed)
        }
        _ => None,
    }
}

/// Result of applying one remediation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationOutcome {
    pub profile_id: ProfileId,
    pub action: RemediationAction,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Reconciler<C, S> {
    control_plane: C,
    store: S,
    batch_size: usize,
}

impl<C: ControlPlane, S: AssignmentStore> Reconciler<C, S> {
    pub fn new(control_plane: C, store: S) -> Self {
        Self {
            control_plane,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Observe and classify every profile record of `network_id`.
    ///
    /// Only store reads can fail the call. A profile that cannot be
    /// queried is left untouched and reported in `errors`.
    pub async fn reconcile(&self, network_id: &EntityId) -> Result<ReconciliationResult, CoreError> {
        let records = self.store.list_profile_assignments(network_id).await?;
        let recorded_sites: HashSet<SiteId> = self
            .store
            .list_site_assignments(network_id)
            .await?
            .into_iter()
            .map(|s| s.site_id)
            .collect();
        info!(network = %network_id, records = records.len(), "reconciling");

        let observations = in_batches(&records, self.batch_size, |record| {
            self.observe(network_id, &record.profile_id)
        })
        .await;

        let now = Utc::now();
        let expected_count = records
            .iter()
            .filter(|r| r.expected_state == AssignmentState::Assigned)
            .count();
        let mut actual_count = 0;
        let mut matched_count = 0;
        let mut mismatches = Vec::new();
        let mut errors = Vec::new();

        for (record, observation) in records.into_iter().zip(observations) {
            let observed = match observation {
                Ok(observed) => observed,
                Err(e) => {
                    warn!(profile = %record.profile_id, error = %e, "cannot observe profile");
                    errors.push(format!("{}: {e}", record.profile_id));
                    continue;
                }
            };

            let reason = classify(&record, &observed, recorded_sites.contains(&record.site_id));
            if observed.state == AssignmentState::Assigned {
                actual_count += 1;
            }

            let updated = ProfileAssignmentRecord {
                actual_state: observed.state,
                mismatch_reason: reason,
                last_reconciled_at: Some(now),
                modified_at: now,
                ..record
            };
            if let Err(e) = self.store.save_profile_assignment(updated.clone()).await {
                warn!(profile = %updated.profile_id, error = %e, "failed to record observation");
                errors.push(e.to_string());
            }

            match reason {
                Some(reason) => {
                    debug!(profile = %updated.profile_id, %reason, "mismatch");
                    mismatches.push(updated);
                }
                None => matched_count += 1,
            }
        }

        info!(
            network = %network_id,
            matched = matched_count,
            mismatched = mismatches.len(),
            "reconciliation finished"
        );

        Ok(ReconciliationResult {
            network_id: network_id.clone(),
            expected_count,
            actual_count,
            matched_count,
            mismatched_count: mismatches.len(),
            mismatches,
            errors,
            reconciled_at: now,
        })
    }

    /// Apply the deterministic fix for every mismatch that has one.
    /// Mismatches that need an operator are left alone.
    pub async fn remediate(&self, result: &ReconciliationResult) -> Vec<RemediationOutcome> {
        let actionable: Vec<(&ProfileAssignmentRecord, RemediationAction)> = result
            .mismatches
            .iter()
            .filter_map(|r| r.mismatch_reason?.remediation().map(|action| (r, action)))
            .collect();

        in_batches(&actionable, self.batch_size, |(record, action)| {
            self.apply(record, *action)
        })
        .await
    }

    async fn observe(&self, network_id: &EntityId, profile_id: &ProfileId) -> Result<Observation, CoreError> {
        let Some(profile) = self.control_plane.get_profile(profile_id).await? else {
            return Ok(Observation {
                profile: None,
                state: AssignmentState::NotAssigned,
            });
        };
        let state = self
            .control_plane
            .get_assignment_state(network_id, profile_id)
            .await?;
        Ok(Observation {
            profile: Some(profile),
            state,
        })
    }

    async fn apply(&self, record: &ProfileAssignmentRecord, action: RemediationAction) -> RemediationOutcome {
        let network_id = &record.network_id;
        let profile_id = &record.profile_id;
        let mut updated = record.clone();

        let outcome = match action {
            RemediationAction::AddAssignment => {
                match self
                    .control_plane
                    .assign_entity_to_profile(network_id, profile_id)
                    .await
                {
                    Ok(()) => {
                        updated.actual_state = AssignmentState::Assigned;
                        updated.mismatch_reason = None;
                        self.resync(&mut updated).await
                    }
                    Err(e) => Err(e),
                }
            }
            RemediationAction::RemoveAssignment => self
                .control_plane
                .unassign_entity_from_profile(network_id, profile_id)
                .await
                .map(|()| {
                    updated.actual_state = AssignmentState::NotAssigned;
                    updated.mismatch_reason = None;
                }),
            RemediationAction::ResyncProfile => {
                let synced = self.resync(&mut updated).await;
                if synced.is_ok() {
                    updated.mismatch_reason = None;
                }
                synced
            }
        };

        if updated != *record {
            updated.modified_at = Utc::now();
            if let Err(e) = self.store.save_profile_assignment(updated).await {
                warn!(profile = %profile_id, error = %e, "failed to record remediation");
            }
        }

        match outcome {
            Ok(()) => {
                info!(profile = %profile_id, %action, "remediated");
                RemediationOutcome {
                    profile_id: profile_id.clone(),
                    action,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(profile = %profile_id, %action, error = %e, "remediation failed");
                RemediationOutcome {
                    profile_id: profile_id.clone(),
                    action,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn resync(&self, record: &mut ProfileAssignmentRecord) -> Result<(), CoreError> {
        match self.control_plane.sync_profile(&record.profile_id).await {
            Ok(()) => {
                record.sync_status = SyncStatus::Synced;
                record.last_error = None;
                Ok(())
            }
            Err(e) => {
                record.sync_status = SyncStatus::Failed;
                record.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
