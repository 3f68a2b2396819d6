// ── Deployment policy and run results ──
//
// A deployment pairs one NetworkDefinition with per-site policies. Each
// policy resolves against discovered profiles into an EffectiveProfileSet;
// the merged targets produce one AssignmentResult each.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::entity_id::{EntityId, ProfileId, SiteId};
use super::network::NetworkDefinition;
use super::site::DeviceProfile;

pub const NOTE_DRY_RUN: &str = "Dry run — not executed";
pub const NOTE_PROFILE_NOT_FOUND: &str = "profile not found";

/// How a site's discovered profiles are narrowed to deployment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentMode {
    /// Every discovered profile at the site.
    AllProfilesAtSite,
    /// Only the listed profiles (must be non-empty).
    IncludeOnly,
    /// Everything except the listed profiles.
    ExcludeSome,
}

/// Per-site deployment policy as declared by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDeploymentConfig {
    pub site_id: SiteId,
    pub mode: DeploymentMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_profiles: Vec<ProfileId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_profiles: Vec<ProfileId>,
    /// Profiles the caller targets by hand. Affects recorded provenance
    /// only, never selection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explicit_profiles: Vec<ProfileId>,
}

impl SiteDeploymentConfig {
    pub fn all_profiles(site_id: impl Into<SiteId>) -> Self {
        Self {
            site_id: site_id.into(),
            mode: DeploymentMode::AllProfilesAtSite,
            included_profiles: Vec::new(),
            excluded_profiles: Vec::new(),
            explicit_profiles: Vec::new(),
        }
    }

    pub fn include_only<I, P>(site_id: impl Into<SiteId>, profiles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProfileId>,
    {
        Self {
            mode: DeploymentMode::IncludeOnly,
            included_profiles: profiles.into_iter().map(Into::into).collect(),
            ..Self::all_profiles(site_id)
        }
    }

    pub fn exclude_some<I, P>(site_id: impl Into<SiteId>, profiles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProfileId>,
    {
        Self {
            mode: DeploymentMode::ExcludeSome,
            excluded_profiles: profiles.into_iter().map(Into::into).collect(),
            ..Self::all_profiles(site_id)
        }
    }

    #[must_use]
    pub fn with_explicit<I, P>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ProfileId>,
    {
        self.explicit_profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_explicit(&self, profile_id: &ProfileId) -> bool {
        self.explicit_profiles.contains(profile_id)
    }
}

/// A site policy resolved against the profiles actually found there.
///
/// `selected` is always a subset of `discovered`, and never intersects
/// `excluded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveProfileSet {
    pub site_id: SiteId,
    pub mode: DeploymentMode,
    pub discovered: Vec<DeviceProfile>,
    pub selected: Vec<DeviceProfile>,
    pub excluded: Vec<DeviceProfile>,
}

/// Outcome of one profile assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub profile_id: ProfileId,
    pub profile_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The profile vanished between discovery and assignment.
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AssignmentResult {
    pub fn succeeded(profile: &DeviceProfile) -> Self {
        Self {
            profile_id: profile.id.clone(),
            profile_name: profile.name.clone(),
            success: true,
            error: None,
            skipped: false,
            note: None,
        }
    }

    pub fn failed(profile: &DeviceProfile, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::succeeded(profile)
        }
    }

    pub fn skipped(profile: &DeviceProfile) -> Self {
        Self {
            skipped: true,
            note: Some(NOTE_PROFILE_NOT_FOUND.into()),
            ..Self::failed(profile, NOTE_PROFILE_NOT_FOUND)
        }
    }

    pub fn dry_run(profile: &DeviceProfile) -> Self {
        Self {
            note: Some(NOTE_DRY_RUN.into()),
            ..Self::succeeded(profile)
        }
    }
}

/// Outcome of pushing configuration to one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub profile_id: ProfileId,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncResult {
    pub fn synced(profile_id: ProfileId) -> Self {
        Self {
            profile_id,
            success: true,
            error: None,
        }
    }

    pub fn failed(profile_id: ProfileId, error: impl Into<String>) -> Self {
        Self {
            profile_id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Compute the plan only. No mutation, persistence, or sync.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub skip_sync: bool,
}

/// Everything one deployment run needs.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub network: NetworkDefinition,
    pub sites: Vec<SiteDeploymentConfig>,
    pub options: RunOptions,
}

/// Result of a completed (or dry) deployment run.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    /// `None` for a dry run.
    pub entity_id: Option<EntityId>,
    pub sites_processed: usize,
    pub device_groups_found: usize,
    pub profiles_assigned: usize,
    pub assignments: Vec<AssignmentResult>,
    /// `None` when sync was skipped or the run was dry.
    pub sync_results: Option<Vec<SyncResult>>,
    pub success: bool,
    pub errors: Vec<String>,
}

impl DeploymentSummary {
    pub fn failed_assignments(&self) -> impl Iterator<Item = &AssignmentResult> {
        self.assignments.iter().filter(|a| !a.success)
    }
}
