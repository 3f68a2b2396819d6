// ── Domain model ──

pub mod assignment;
pub mod deployment;
pub mod entity_id;
pub mod network;
pub mod site;

pub use assignment::{
    AssignmentState, MismatchReason, ProfileAssignmentRecord, Provenance, ReconciliationResult,
    RemediationAction, SiteAssignmentRecord, SyncStatus,
};
pub use deployment::{
    AssignmentResult, DeploymentMode, DeploymentRequest, DeploymentSummary, EffectiveProfileSet,
    NOTE_DRY_RUN, NOTE_PROFILE_NOT_FOUND, RunOptions, SiteDeploymentConfig, SyncResult,
};
pub use entity_id::{DeviceGroupId, EntityId, ProfileId, SiteId};
pub use network::{NetworkDefinition, SecurityMode, WifiBand, WifiFeatures, WifiSecurity, WpaMode};
pub use site::{DeviceGroup, DeviceProfile, Site};
