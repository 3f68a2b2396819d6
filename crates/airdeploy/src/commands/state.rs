//! `airdeploy state`: inspect recorded assignment intent. Reads the
//! state file only; never contacts a controller.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;

use airdeploy_core::{AssignmentStore, EntityId, JsonFileAssignmentStore, ProfileAssignmentRecord};

use crate::cli::{GlobalOpts, StateArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct NetworkOverview {
    network_id: EntityId,
    sites: usize,
    profiles: usize,
    mismatched: usize,
}

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "Network")]
    id: String,
    #[tabled(rename = "Sites")]
    sites: usize,
    #[tabled(rename = "Profiles")]
    profiles: usize,
    #[tabled(rename = "Mismatched")]
    mismatched: usize,
}

impl From<&NetworkOverview> for NetworkRow {
    fn from(n: &NetworkOverview) -> Self {
        Self {
            id: n.network_id.to_string(),
            sites: n.sites,
            profiles: n.profiles,
            mismatched: n.mismatched,
        }
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Provenance")]
    provenance: String,
    #[tabled(rename = "Actual")]
    actual: String,
    #[tabled(rename = "Sync")]
    sync: String,
    #[tabled(rename = "Mismatch")]
    mismatch: String,
    #[tabled(rename = "Reconciled")]
    reconciled: String,
}

impl From<&ProfileAssignmentRecord> for RecordRow {
    fn from(r: &ProfileAssignmentRecord) -> Self {
        Self {
            profile: r.profile_id.to_string(),
            site: r.site_id.to_string(),
            provenance: r.provenance.to_string(),
            actual: r.actual_state.to_string(),
            sync: r.sync_status.to_string(),
            mismatch: r.mismatch_reason.map(|m| m.to_string()).unwrap_or_default(),
            reconciled: r
                .last_reconciled_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".into()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: StateArgs, state_path: &Path, global: &GlobalOpts) -> Result<(), CliError> {
    let store = JsonFileAssignmentStore::open(state_path).await?;

    let out = match args.network_id {
        None => {
            let overview = overview(&store).await?;
            output::render_list(&global.output, &overview, |n| NetworkRow::from(n))?
        }
        Some(raw) => {
            let network_id = EntityId::from(raw);
            let records = store.list_profile_assignments(&network_id).await?;
            if records.is_empty() && store.list_site_assignments(&network_id).await?.is_empty() {
                return Err(CliError::NotFound {
                    resource_type: "network".into(),
                    identifier: network_id.to_string(),
                    list_command: "state".into(),
                });
            }
            output::render_list(&global.output, &records, |r| RecordRow::from(r))?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

async fn overview(store: &impl AssignmentStore) -> Result<Vec<NetworkOverview>, CliError> {
    let mut out = Vec::new();
    for network_id in store.list_networks().await? {
        let sites = store.list_site_assignments(&network_id).await?.len();
        let records = store.list_profile_assignments(&network_id).await?;
        out.push(NetworkOverview {
            sites,
            profiles: records.len(),
            mismatched: records.iter().filter(|r| r.is_mismatched()).count(),
            network_id,
        });
    }
    Ok(out)
}
