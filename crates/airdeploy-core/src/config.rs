// ── Runtime connection configuration ──
//
// These types describe *how* to reach a controller's control plane.
// They carry credential data and connection tuning, but never touch disk.
// The CLI constructs a `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use airdeploy_api::{ControlPlaneClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single controller.
///
/// Built by the CLI, passed to [`ControllerConfig::client`] -- core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller URL (e.g., `https://10.0.0.1:8443`).
    pub url: Url,
    /// Control-plane API key.
    pub api_key: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl ControllerConfig {
    /// Build an authenticated control-plane client. Performs no I/O.
    pub fn client(&self) -> Result<ControlPlaneClient, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        };
        Ok(ControlPlaneClient::from_api_key(
            self.url.as_str(),
            &self.api_key,
            &transport,
        )?)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn client_is_built_without_io() {
        let config = ControllerConfig {
            url: "https://10.0.0.1:8443".parse().unwrap(),
            api_key: SecretString::from("key".to_string()),
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(5),
        };
        let client = config.client().unwrap();
        assert_eq!(client.base_url().as_str(), "https://10.0.0.1:8443/api/");
    }
}
