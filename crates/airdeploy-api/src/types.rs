//! Control-plane API request and response types.
//!
//! All types match the JSON bodies of the `/api/v1/` endpoints.
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.

use serde::{Deserialize, Serialize};

// ── Pagination ───────────────────────────────────────────────────────

/// Generic pagination wrapper returned by all list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub offset: i64,
    pub limit: i32,
    pub count: i32,
    pub total_count: i64,
    pub data: Vec<T>,
}

// ── Sites ────────────────────────────────────────────────────────────

/// Site overview from `GET /v1/sites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResponse {
    pub id: String,
    pub name: String,
}

// ── Device groups & profiles ─────────────────────────────────────────

/// Device group from `GET /v1/sites/{siteId}/device-groups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGroupResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub site_id: Option<String>,
}

/// Device profile from `GET /v1/device-groups/{groupId}/profiles`
/// and `GET /v1/profiles/{profileId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub site_id: String,
    pub device_group_id: String,
}

// ── Networks ─────────────────────────────────────────────────────────

/// Security section of a network create request.
///
/// `type` carries the variant; remaining fields are variant-specific.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum SecurityConfiguration {
    Open,
    Owe,
    Wep { key: String, key_index: u8 },
    Psk { passphrase: String, wpa_mode: String },
    Sae { passphrase: String, transition_mode: bool },
    Enterprise { radius_profile_id: String, wpa_mode: String },
}

/// Body of `POST /v1/networks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct NetworkCreateRequest {
    pub name: String,
    pub ssid: String,
    pub security_configuration: SecurityConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
    pub band: String,
    pub hidden: bool,
    pub client_isolation: bool,
    pub band_steering: bool,
    pub fast_roaming: bool,
    pub mlo_enabled: bool,
}

/// Created network entity, the response of `POST /v1/networks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub id: String,
    pub name: String,
}

// ── Sync ─────────────────────────────────────────────────────────────

/// Body of `POST /v1/profiles/sync`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfilesRequest<'a> {
    pub profile_ids: &'a [String],
}
