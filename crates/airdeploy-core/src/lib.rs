//! Deployment orchestration between `airdeploy-api` and the CLI.
//!
//! This crate turns a declared wireless network plus per-site policies
//! into concrete device-profile assignments, and later checks that the
//! controller still agrees:
//!
//! - **[`Orchestrator`]**: The deployment pipeline: validate, discover,
//!   resolve and merge effective sets, create the network entity, assign in
//!   bounded batches, persist intent, sync, summarize. Per-profile failures
//!   are captured in the [`DeploymentSummary`]; only validation and entity
//!   creation abort a run.
//!
//! - **[`ProfileDiscovery`]**: Site → device group → profile walk with
//!   per-site failure isolation.
//!
//! - **[`effective_set`]**: Pure policy evaluation for the three
//!   [`DeploymentMode`]s and the deterministic multi-site merge.
//!
//! - **[`AssignmentStore`]**: Persisted intent, in memory
//!   ([`MemoryAssignmentStore`]) or as a JSON file
//!   ([`JsonFileAssignmentStore`]).
//!
//! - **[`Reconciler`]**: Intended vs. observed state, classified into
//!   [`MismatchReason`]s, with opt-in remediation.
//!
//! - **[`ControlPlane`]**: The seam to the controller, implemented for
//!   [`airdeploy_api::ControlPlaneClient`].

mod batch;
pub mod config;
pub mod control_plane;
pub mod convert;
pub mod discovery;
pub mod effective_set;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod reconcile;
pub mod store;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, TlsVerification};
pub use control_plane::{ControlPlane, NetworkEntity};
pub use discovery::{DiscoveryResult, ProfileDiscovery};
pub use effective_set::ValidationOutcome;
pub use error::CoreError;
pub use orchestrator::{DeploymentPreview, Orchestrator, OrchestratorConfig};
pub use reconcile::{Reconciler, RemediationOutcome};
pub use store::{AssignmentStore, JsonFileAssignmentStore, MemoryAssignmentStore};

pub use model::{
    AssignmentResult, AssignmentState, DeploymentMode, DeploymentRequest, DeploymentSummary,
    DeviceGroup, DeviceGroupId, DeviceProfile, EffectiveProfileSet, EntityId, MismatchReason,
    NetworkDefinition, ProfileAssignmentRecord, ProfileId, Provenance, ReconciliationResult,
    RemediationAction, RunOptions, Site, SiteAssignmentRecord, SiteDeploymentConfig, SiteId,
    SyncResult, SyncStatus, WifiSecurity,
};
