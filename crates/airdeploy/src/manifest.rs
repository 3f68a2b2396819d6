//! Deployment manifests: one network plus its per-site policies, read
//! from YAML or JSON by file extension.
//!
//! ```yaml
//! network:
//!   name: Staff
//!   ssid: Staff-WiFi
//!   security: { mode: psk, passphrase: correct-horse-battery }
//! sites:
//!   - site_id: hq
//!     mode: ALL_PROFILES_AT_SITE
//!   - site_id: branch-1
//!     mode: EXCLUDE_SOME
//!     excluded_profiles: [lab-ap]
//! ```

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use airdeploy_core::{NetworkDefinition, SiteDeploymentConfig};

use crate::error::CliError;

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub network: NetworkDefinition,
    pub sites: Vec<SiteDeploymentConfig>,
}

/// The `sites` half of a manifest, for previews that never create a
/// network.
#[derive(Debug, Deserialize)]
pub struct SitesManifest {
    pub sites: Vec<SiteDeploymentConfig>,
}

pub fn load(path: &Path) -> Result<Manifest, CliError> {
    read_document(path)
}

pub fn load_sites(path: &Path) -> Result<SitesManifest, CliError> {
    read_document(path)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parse_json = match ext.as_deref() {
        Some("json") => true,
        Some("yaml" | "yml") => false,
        _ => {
            return Err(CliError::Validation {
                field: "manifest".into(),
                reason: format!(
                    "{}: expected a .yaml, .yml, or .json file",
                    path.display()
                ),
            });
        }
    };

    let contents = std::fs::read_to_string(path)?;
    if parse_json {
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(serde_yaml::from_str(&contents)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use airdeploy_core::DeploymentMode;

    const YAML: &str = r"
network:
  name: Staff
  ssid: Staff-WiFi
  security:
    mode: psk
    passphrase: correct-horse-battery
sites:
  - site_id: hq
    mode: ALL_PROFILES_AT_SITE
  - site_id: branch-1
    mode: EXCLUDE_SOME
    excluded_profiles: [lab-ap]
";

    #[test]
    fn yaml_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staff.yaml");
        std::fs::write(&path, YAML).unwrap();

        let manifest = load(&path).unwrap();
        assert_eq!(manifest.network.ssid, "Staff-WiFi");
        assert_eq!(manifest.sites.len(), 2);
        assert_eq!(manifest.sites[1].mode, DeploymentMode::ExcludeSome);
        assert_eq!(manifest.sites[1].excluded_profiles[0].as_str(), "lab-ap");
    }

    #[test]
    fn json_sites_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.json");
        std::fs::write(
            &path,
            r#"{"sites":[{"site_id":"hq","mode":"INCLUDE_ONLY","included_profiles":["p-1"]}]}"#,
        )
        .unwrap();

        let sites = load_sites(&path).unwrap();
        assert_eq!(sites.sites[0].mode, DeploymentMode::IncludeOnly);
    }

    #[test]
    fn unknown_extension_is_a_usage_error() {
        let err = load(Path::new("manifest.txt")).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "network: [").unwrap();
        assert!(matches!(load(&path).unwrap_err(), CliError::Yaml(_)));
    }
}
