// ── Persisted assignment intent ──
//
// What the orchestrator recorded, what the reconciler observed, and how
// the two differ.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::deployment::{DeploymentMode, SiteDeploymentConfig};
use super::entity_id::{DeviceGroupId, EntityId, ProfileId, SiteId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentState {
    Assigned,
    NotAssigned,
}

/// Why a profile carries the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Selected by a site-level policy.
    SitePropagated,
    /// Targeted by hand in the deployment request.
    Explicit,
    ManualOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Pending,
    Synced,
    Failed,
    Unknown,
}

/// Drift between recorded intent and observed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MismatchReason {
    MissingAssignment,
    UnexpectedAssignment,
    ProfileDeleted,
    ProfileMoved,
    SyncFailed,
    SiteAssignmentMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediationAction {
    AddAssignment,
    RemoveAssignment,
    ResyncProfile,
}

impl MismatchReason {
    /// The deterministic fix for this mismatch, if one exists. `None`
    /// means an operator has to decide.
    pub fn remediation(self) -> Option<RemediationAction> {
        match self {
            Self::MissingAssignment => Some(RemediationAction::AddAssignment),
            Self::UnexpectedAssignment => Some(RemediationAction::RemoveAssignment),
            Self::SyncFailed => Some(RemediationAction::ResyncProfile),
            Self::ProfileDeleted | Self::ProfileMoved | Self::SiteAssignmentMissing => None,
        }
    }
}

/// One site policy persisted for one network entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAssignmentRecord {
    pub network_id: EntityId,
    pub site_id: SiteId,
    pub mode: DeploymentMode,
    #[serde(default)]
    pub included_profiles: Vec<ProfileId>,
    #[serde(default)]
    pub excluded_profiles: Vec<ProfileId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl SiteAssignmentRecord {
    pub fn from_config(network_id: EntityId, config: &SiteDeploymentConfig, now: DateTime<Utc>) -> Self {
        Self {
            network_id,
            site_id: config.site_id.clone(),
            mode: config.mode,
            included_profiles: config.included_profiles.clone(),
            excluded_profiles: config.excluded_profiles.clone(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// Intended and observed state of one network entity on one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAssignmentRecord {
    pub network_id: EntityId,
    pub profile_id: ProfileId,
    pub site_id: SiteId,
    /// Group the profile belonged to when the record was written.
    pub device_group_id: DeviceGroupId,
    pub provenance: Provenance,
    pub expected_state: AssignmentState,
    pub actual_state: AssignmentState,
    #[serde(default)]
    pub mismatch_reason: Option<MismatchReason>,
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub last_reconciled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ProfileAssignmentRecord {
    pub fn is_mismatched(&self) -> bool {
        self.mismatch_reason.is_some()
    }
}

/// Outcome of one reconciliation pass over a network entity.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResult {
    pub network_id: EntityId,
    /// Records whose intent is `Assigned`.
    pub expected_count: usize,
    /// Profiles observed carrying the network.
    pub actual_count: usize,
    pub matched_count: usize,
    pub mismatched_count: usize,
    pub mismatches: Vec<ProfileAssignmentRecord>,
    /// Profiles that could not be queried; left unclassified.
    pub errors: Vec<String>,
    pub reconciled_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_three_reasons_have_automatic_fixes() {
        assert_eq!(
            MismatchReason::MissingAssignment.remediation(),
            Some(RemediationAction::AddAssignment)
        );
        assert_eq!(
            MismatchReason::UnexpectedAssignment.remediation(),
            Some(RemediationAction::RemoveAssignment)
        );
        assert_eq!(
            MismatchReason::SyncFailed.remediation(),
            Some(RemediationAction::ResyncProfile)
        );
        assert_eq!(MismatchReason::ProfileDeleted.remediation(), None);
        assert_eq!(MismatchReason::ProfileMoved.remediation(), None);
        assert_eq!(MismatchReason::SiteAssignmentMissing.remediation(), None);
    }

    #[test]
    fn reason_display_is_screaming_snake() {
        assert_eq!(
            MismatchReason::SiteAssignmentMissing.to_string(),
            "SITE_ASSIGNMENT_MISSING"
        );
    }
}
