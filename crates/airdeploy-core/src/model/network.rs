// ── Wireless network definition ──
//
// The declared network a deployment pushes to device profiles. Security
// is a closed tagged union: each mode carries exactly the settings it
// needs, nothing else.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use strum::Display;

const SSID_MAX_BYTES: usize = 32;
const PASSPHRASE_MIN_CHARS: usize = 8;
const PASSPHRASE_MAX_CHARS: usize = 63;

/// WPA generation for passphrase and enterprise modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum WpaMode {
    #[default]
    #[strum(serialize = "WPA2")]
    Wpa2,
    #[strum(serialize = "WPA3")]
    Wpa3,
    #[strum(serialize = "WPA2_WPA3")]
    Wpa2Wpa3,
}

/// Security configuration, one variant per mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WifiSecurity {
    Open,
    /// Opportunistic Wireless Encryption (enhanced open).
    Owe,
    Wep {
        #[serde(deserialize_with = "deserialize_secret")]
        key: SecretString,
        #[serde(default = "default_wep_key_index")]
        key_index: u8,
    },
    Psk {
        #[serde(deserialize_with = "deserialize_secret")]
        passphrase: SecretString,
        #[serde(default)]
        wpa: WpaMode,
    },
    /// WPA3 personal. `transition` also admits WPA2 clients.
    Sae {
        #[serde(deserialize_with = "deserialize_secret")]
        passphrase: SecretString,
        #[serde(default)]
        transition: bool,
    },
    Enterprise {
        radius_profile_id: String,
        #[serde(default)]
        wpa: WpaMode,
    },
}

fn default_wep_key_index() -> u8 {
    1
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Discriminant of [`WifiSecurity`], for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityMode {
    Open,
    Owe,
    Wep,
    Psk,
    Sae,
    Enterprise,
}

impl WifiSecurity {
    pub fn mode(&self) -> SecurityMode {
        match self {
            Self::Open => SecurityMode::Open,
            Self::Owe => SecurityMode::Owe,
            Self::Wep { .. } => SecurityMode::Wep,
            Self::Psk { .. } => SecurityMode::Psk,
            Self::Sae { .. } => SecurityMode::Sae,
            Self::Enterprise { .. } => SecurityMode::Enterprise,
        }
    }

    fn validate(&self, errors: &mut Vec<String>) {
        match self {
            Self::Open | Self::Owe => {}
            Self::Wep { key, key_index } => {
                if !is_valid_wep_key(key.expose_secret()) {
                    errors.push(
                        "WEP key must be 5 or 13 ASCII characters, or 10 or 26 hex digits".into(),
                    );
                }
                if !(1..=4).contains(key_index) {
                    errors.push(format!("WEP key index must be 1-4, got {key_index}"));
                }
            }
            Self::Psk { passphrase, .. } | Self::Sae { passphrase, .. } => {
                let len = passphrase.expose_secret().chars().count();
                if !(PASSPHRASE_MIN_CHARS..=PASSPHRASE_MAX_CHARS).contains(&len) {
                    errors.push(format!(
                        "passphrase must be {PASSPHRASE_MIN_CHARS}-{PASSPHRASE_MAX_CHARS} characters, got {len}"
                    ));
                }
            }
            Self::Enterprise {
                radius_profile_id, ..
            } => {
                if radius_profile_id.trim().is_empty() {
                    errors.push("enterprise security requires a RADIUS profile id".into());
                }
            }
        }
    }
}

fn is_valid_wep_key(key: &str) -> bool {
    match key.len() {
        5 | 13 => key.is_ascii(),
        10 | 26 => key.chars().all(|c| c.is_ascii_hexdigit()),
        _ => false,
    }
}

/// Radio band(s) the network broadcasts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum WifiBand {
    #[serde(rename = "2.4ghz")]
    #[strum(serialize = "2_4GHZ")]
    Ghz2_4,
    #[serde(rename = "5ghz")]
    #[strum(serialize = "5GHZ")]
    Ghz5,
    #[serde(rename = "6ghz")]
    #[strum(serialize = "6GHZ")]
    Ghz6,
    #[default]
    #[serde(rename = "dual")]
    #[strum(serialize = "DUAL")]
    Dual,
    #[serde(rename = "all")]
    #[strum(serialize = "ALL")]
    All,
}

/// Feature toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct WifiFeatures {
    pub hidden: bool,
    pub client_isolation: bool,
    pub band_steering: bool,
    pub fast_roaming: bool,
    pub mlo: bool,
}

/// A declared wireless network.
///
/// Treated as immutable once handed to a deployment: the orchestrator
/// only ever borrows it.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDefinition {
    pub name: String,
    pub ssid: String,
    pub security: WifiSecurity,
    #[serde(default)]
    pub vlan: Option<u16>,
    #[serde(default)]
    pub band: WifiBand,
    #[serde(default)]
    pub features: WifiFeatures,
}

impl NetworkDefinition {
    /// Structural checks performed before anything is sent to a controller.
    /// Returns every problem found; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("network name must not be empty".into());
        }
        if self.ssid.is_empty() || self.ssid.len() > SSID_MAX_BYTES {
            errors.push(format!(
                "SSID must be 1-{SSID_MAX_BYTES} bytes, got {}",
                self.ssid.len()
            ));
        }
        if let Some(vlan) = self.vlan {
            if !(1..=4094).contains(&vlan) {
                errors.push(format!("VLAN must be 1-4094, got {vlan}"));
            }
        }
        self.security.validate(&mut errors);

        errors
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn psk_network(passphrase: &str) -> NetworkDefinition {
        NetworkDefinition {
            name: "Staff".into(),
            ssid: "Staff-WiFi".into(),
            security: WifiSecurity::Psk {
                passphrase: SecretString::from(passphrase.to_owned()),
                wpa: WpaMode::Wpa2,
            },
            vlan: Some(20),
            band: WifiBand::Dual,
            features: WifiFeatures::default(),
        }
    }

    #[test]
    fn valid_psk_network_passes() {
        assert!(psk_network("correct horse battery").validate().is_empty());
    }

    #[test]
    fn short_passphrase_is_rejected() {
        let errors = psk_network("short").validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("passphrase"));
    }

    #[test]
    fn bad_ssid_and_vlan_are_both_reported() {
        let mut net = psk_network("correct horse battery");
        net.ssid = "x".repeat(33);
        net.vlan = Some(4095);
        let errors = net.validate();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn wep_key_lengths() {
        assert!(is_valid_wep_key("abcde"));
        assert!(is_valid_wep_key("0123456789"));
        assert!(!is_valid_wep_key("0123456789z"));
        assert!(!is_valid_wep_key("zzzzzzzzzz"));
    }

    #[test]
    fn enterprise_requires_radius_profile() {
        let mut net = psk_network("unused-passphrase");
        net.security = WifiSecurity::Enterprise {
            radius_profile_id: " ".into(),
            wpa: WpaMode::Wpa3,
        };
        assert_eq!(net.validate().len(), 1);
    }

    #[test]
    fn deserializes_tagged_security_from_yaml() {
        let yaml = r"
name: Guest
ssid: Guest-WiFi
vlan: 30
band: 5ghz
security:
  mode: sae
  passphrase: correct-horse-battery
  transition: true
features:
  client_isolation: true
";
        let net: NetworkDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(net.security.mode(), SecurityMode::Sae);
        assert_eq!(net.band, WifiBand::Ghz5);
        assert!(net.features.client_isolation);
        assert!(!net.features.hidden);
        assert!(net.validate().is_empty());
    }

    #[test]
    fn band_display_matches_wire_format() {
        assert_eq!(WifiBand::Ghz2_4.to_string(), "2_4GHZ");
        assert_eq!(WpaMode::Wpa2Wpa3.to_string(), "WPA2_WPA3");
    }
}
