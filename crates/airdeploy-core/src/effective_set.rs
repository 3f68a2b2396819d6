// ── Effective profile sets ──
//
// Pure functions: resolve a site policy against discovered profiles,
// then merge many sites' selections into one target list.

use std::collections::{BTreeMap, HashSet};

use crate::discovery::DiscoveryResult;
use crate::model::{
    DeploymentMode, DeviceProfile, EffectiveProfileSet, ProfileId, SiteDeploymentConfig, SiteId,
};

/// Structural validity of a site policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_site_assignment(config: &SiteDeploymentConfig) -> ValidationOutcome {
    let mut errors = Vec::new();

    if config.site_id.as_str().trim().is_empty() {
        errors.push("site id must not be empty".to_owned());
    }
    if config.mode == DeploymentMode::IncludeOnly && config.included_profiles.is_empty() {
        errors.push(format!(
            "site {}: INCLUDE_ONLY requires at least one included profile",
            config.site_id
        ));
    }

    ValidationOutcome {
        valid: errors.is_empty(),
        errors,
    }
}

/// Resolve one site policy. Discovery order is preserved in every list.
pub fn calculate_effective_set(
    config: &SiteDeploymentConfig,
    discovered: &[DeviceProfile],
) -> EffectiveProfileSet {
    let (selected, excluded): (Vec<DeviceProfile>, Vec<DeviceProfile>) = match config.mode {
        DeploymentMode::AllProfilesAtSite => (discovered.to_vec(), Vec::new()),
        DeploymentMode::IncludeOnly => {
            let included: HashSet<&ProfileId> = config.included_profiles.iter().collect();
            discovered
                .iter()
                .cloned()
                .partition(|p| included.contains(&p.id))
        }
        DeploymentMode::ExcludeSome => {
            let excluded: HashSet<&ProfileId> = config.excluded_profiles.iter().collect();
            let (dropped, kept): (Vec<_>, Vec<_>) = discovered
                .iter()
                .cloned()
                .partition(|p| excluded.contains(&p.id));
            (kept, dropped)
        }
    };

    EffectiveProfileSet {
        site_id: config.site_id.clone(),
        mode: config.mode,
        discovered: discovered.to_vec(),
        selected,
        excluded,
    }
}

pub fn calculate_multiple_effective_sets(
    configs: &[SiteDeploymentConfig],
    discovery: &DiscoveryResult,
) -> Vec<EffectiveProfileSet> {
    configs
        .iter()
        .map(|config| calculate_effective_set(config, discovery.profiles_for(&config.site_id)))
        .collect()
}

/// Union of every set's selection, one entry per profile id.
///
/// A profile selected by any set is targeted even when another set
/// excludes it. When several sets select the same profile, the copy
/// from the smallest site id wins. Output is ordered by (site id,
/// profile id), so input order never changes the result.
pub fn merge_effective_sets(sets: &[EffectiveProfileSet]) -> Vec<DeviceProfile> {
    let mut by_id: BTreeMap<&ProfileId, (&SiteId, &DeviceProfile)> = BTreeMap::new();

    for set in sets {
        for profile in &set.selected {
            by_id
                .entry(&profile.id)
                .and_modify(|current| {
                    if set.site_id < *current.0 {
                        *current = (&set.site_id, profile);
                    }
                })
                .or_insert((&set.site_id, profile));
        }
    }

    let mut merged: Vec<DeviceProfile> = by_id.into_values().map(|(_, p)| p.clone()).collect();
    merged.sort_by(|a, b| (&a.site_id, &a.id).cmp(&(&b.site_id, &b.id)));
    merged
}
