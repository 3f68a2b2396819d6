// ── Profile discovery ──
//
// Walks site → device group → profile for each requested site. Sites are
// isolated from each other: one site failing yields an empty list for
// that site and a recorded message, never an error for the caller.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use futures_util::future::{join_all, try_join_all};
use tracing::{debug, warn};

use crate::control_plane::ControlPlane;
use crate::error::CoreError;
use crate::model::{DeviceProfile, SiteId};

/// Profiles found per site, plus the bookkeeping a summary needs.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    pub profiles: HashMap<SiteId, Vec<DeviceProfile>>,
    pub device_groups: HashMap<SiteId, usize>,
    /// One message per site whose discovery failed.
    pub failures: HashMap<SiteId, String>,
}

impl DiscoveryResult {
    /// Profiles for `site_id`, empty if the site was not discovered or
    /// its discovery failed.
    pub fn profiles_for(&self, site_id: &SiteId) -> &[DeviceProfile] {
        self.profiles
            .get(site_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn device_group_count(&self) -> usize {
        self.device_groups.values().sum()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.values().map(Vec::len).sum()
    }
}

pub struct ProfileDiscovery<'a, C> {
    control_plane: &'a C,
}

impl<'a, C: ControlPlane> ProfileDiscovery<'a, C> {
    pub fn new(control_plane: &'a C) -> Self {
        Self { control_plane }
    }

    /// Discover every profile at each site. Duplicate site ids are
    /// discovered once.
    pub async fn discover_profiles(&self, site_ids: &[SiteId]) -> DiscoveryResult {
        let unique: BTreeSet<&SiteId> = site_ids.iter().collect();

        let futs = unique.into_iter().map(|site_id| async move {
            let outcome = self.discover_site(site_id).await;
            (site_id.clone(), outcome)
        });

        let mut result = DiscoveryResult::default();
        for (site_id, outcome) in join_all(futs).await {
            match outcome {
                Ok((group_count, profiles)) => {
                    debug!(
                        site = %site_id,
                        groups = group_count,
                        profiles = profiles.len(),
                        "site discovered"
                    );
                    result.device_groups.insert(site_id.clone(), group_count);
                    result.profiles.insert(site_id, profiles);
                }
                Err(e) => {
                    warn!(site = %site_id, error = %e, "profile discovery failed");
                    result.device_groups.insert(site_id.clone(), 0);
                    result.profiles.insert(site_id.clone(), Vec::new());
                    let message = CoreError::Discovery {
                        site: site_id.to_string(),
                        message: e.to_string(),
                    }
                    .to_string();
                    result.failures.insert(site_id, message);
                }
            }
        }
        result
    }

    /// All profiles at the given sites, de-duplicated by id and sorted by
    /// site, name, then id. A profile listed under several sites keeps the
    /// copy from the smallest site id.
    pub async fn preview_profiles(&self, site_ids: &[SiteId]) -> Vec<DeviceProfile> {
        let discovered = self.discover_profiles(site_ids).await;
        let by_site: BTreeMap<SiteId, Vec<DeviceProfile>> =
            discovered.profiles.into_iter().collect();

        let mut seen = HashSet::new();
        let mut profiles: Vec<DeviceProfile> = by_site
            .into_values()
            .flatten()
            .filter(|p| seen.insert(p.id.clone()))
            .collect();
        profiles.sort_by(|a, b| {
            (&a.site_id, &a.name, &a.id).cmp(&(&b.site_id, &b.name, &b.id))
        });
        profiles
    }

    async fn discover_site(&self, site_id: &SiteId) -> Result<(usize, Vec<DeviceProfile>), CoreError> {
        let groups = self.control_plane.list_device_groups(site_id).await?;

        let per_group = try_join_all(groups.iter().map(|group| async move {
            let profiles = self.control_plane.list_profiles(&group.id).await?;
            Ok::<_, CoreError>(
                profiles
                    .into_iter()
                    .map(|p| DeviceProfile {
                        site_id: site_id.clone(),
                        device_group_id: group.id.clone(),
                        ..p
                    })
                    .collect::<Vec<_>>(),
            )
        }))
        .await?;

        Ok((groups.len(), per_group.into_iter().flatten().collect()))
    }
}
