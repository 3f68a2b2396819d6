// ── API-to-domain type conversions ──
//
// Bridges raw `airdeploy_api` response types into canonical domain
// types, and renders a NetworkDefinition into its create request.

use secrecy::ExposeSecret;

use airdeploy_api::types::{
    DeviceGroupResponse, NetworkCreateRequest, ProfileResponse, SecurityConfiguration,
    SiteResponse,
};

use crate::model::{DeviceGroup, DeviceProfile, NetworkDefinition, Site, SiteId, WifiSecurity};

impl From<SiteResponse> for Site {
    fn from(s: SiteResponse) -> Self {
        Site {
            id: s.id.into(),
            name: s.name,
        }
    }
}

impl From<ProfileResponse> for DeviceProfile {
    fn from(p: ProfileResponse) -> Self {
        DeviceProfile {
            id: p.id.into(),
            name: p.name,
            site_id: p.site_id.into(),
            device_group_id: p.device_group_id.into(),
        }
    }
}

/// Device groups omit `siteId` on some controllers; the site that was
/// queried fills the gap.
pub(crate) fn device_group_from_response(g: DeviceGroupResponse, queried: &SiteId) -> DeviceGroup {
    DeviceGroup {
        id: g.id.into(),
        name: g.name,
        site_id: g.site_id.map_or_else(|| queried.clone(), SiteId::from),
    }
}

impl From<&WifiSecurity> for SecurityConfiguration {
    fn from(security: &WifiSecurity) -> Self {
        match security {
            WifiSecurity::Open => Self::Open,
            WifiSecurity::Owe => Self::Owe,
            WifiSecurity::Wep { key, key_index } => Self::Wep {
                key: key.expose_secret().to_owned(),
                key_index: *key_index,
            },
            WifiSecurity::Psk { passphrase, wpa } => Self::Psk {
                passphrase: passphrase.expose_secret().to_owned(),
                wpa_mode: wpa.to_string(),
            },
            WifiSecurity::Sae {
                passphrase,
                transition,
            } => Self::Sae {
                passphrase: passphrase.expose_secret().to_owned(),
                transition_mode: *transition,
            },
            WifiSecurity::Enterprise {
                radius_profile_id,
                wpa,
            } => Self::Enterprise {
                radius_profile_id: radius_profile_id.clone(),
                wpa_mode: wpa.to_string(),
            },
        }
    }
}

impl From<&NetworkDefinition> for NetworkCreateRequest {
    fn from(net: &NetworkDefinition) -> Self {
        NetworkCreateRequest {
            name: net.name.clone(),
            ssid: net.ssid.clone(),
            security_configuration: SecurityConfiguration::from(&net.security),
            vlan_id: net.vlan,
            band: net.band.to_string(),
            hidden: net.features.hidden,
            client_isolation: net.features.client_isolation,
            band_steering: net.features.band_steering,
            fast_roaming: net.features.fast_roaming,
            mlo_enabled: net.features.mlo,
        }
    }
}
