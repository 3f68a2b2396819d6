// ── Site topology types ──
//
// site → device group → device profile. Profiles are the unit a network
// entity is assigned to.

use serde::{Deserialize, Serialize};

use super::entity_id::{DeviceGroupId, ProfileId, SiteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    /// Human-friendly display name.
    pub name: String,
}

/// A grouping of devices at a site that share profile assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub id: DeviceGroupId,
    pub name: String,
    pub site_id: SiteId,
}

/// A configuration template applied to one or more devices at a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub id: ProfileId,
    pub name: String,
    /// Owning site.
    pub site_id: SiteId,
    /// Owning device group.
    pub device_group_id: DeviceGroupId,
}
