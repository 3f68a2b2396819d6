//! `airdeploy preview`: show what a deployment would target without
//! creating or assigning anything.

use std::fmt::Write;

use tabled::Tabled;

use airdeploy_core::{
    DeploymentPreview, DeviceProfile, EffectiveProfileSet, MemoryAssignmentStore, Orchestrator,
    OrchestratorConfig, ProfileDiscovery, SiteId,
};

use crate::cli::{GlobalOpts, PreviewArgs};
use crate::error::CliError;
use crate::manifest;
use crate::output;

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Profile")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Device Group")]
    group: String,
}

impl From<&DeviceProfile> for ProfileRow {
    fn from(p: &DeviceProfile) -> Self {
        Self {
            site: p.site_id.to_string(),
            id: p.id.to_string(),
            name: p.name.clone(),
            group: p.device_group_id.to_string(),
        }
    }
}

#[derive(Tabled)]
struct SetRow {
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Discovered")]
    discovered: usize,
    #[tabled(rename = "Selected")]
    selected: usize,
    #[tabled(rename = "Excluded")]
    excluded: usize,
}

impl From<&EffectiveProfileSet> for SetRow {
    fn from(s: &EffectiveProfileSet) -> Self {
        Self {
            site: s.site_id.to_string(),
            mode: s.mode.to_string(),
            discovered: s.discovered.len(),
            selected: s.selected.len(),
            excluded: s.excluded.len(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match args.manifest {
        Some(ref path) => {
            let sites = manifest::load_sites(path)?.sites;
            let orchestrator = Orchestrator::with_config(
                ctx.client.clone(),
                MemoryAssignmentStore::new(),
                OrchestratorConfig {
                    batch_size: ctx.batch_size,
                },
            );
            let preview = orchestrator.preview(&sites).await?;
            for err in &preview.errors {
                tracing::warn!("{err}");
            }
            output::render_single(&global.output, &preview, render_preview)?
        }
        None => {
            let site_ids: Vec<SiteId> = args.sites.iter().map(|s| SiteId::new(s.as_str())).collect();
            let profiles = ProfileDiscovery::new(&ctx.client)
                .preview_profiles(&site_ids)
                .await;
            output::render_list(&global.output, &profiles, |p| ProfileRow::from(p))?
        }
    };

    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_preview(report: &DeploymentPreview) -> String {
    let mut out = String::new();

    let sets: Vec<SetRow> = report.sets.iter().map(SetRow::from).collect();
    let _ = writeln!(out, "{}", output::render_table(&sets));

    let _ = writeln!(
        out,
        "\n{} across {} would receive the network",
        util::count(report.targets.len(), "profile"),
        util::count(report.device_groups_found, "device group"),
    );
    if !report.targets.is_empty() {
        let rows: Vec<ProfileRow> = report.targets.iter().map(ProfileRow::from).collect();
        let _ = writeln!(out, "\n{}", output::render_table(&rows));
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out, "\nSites that could not be read:");
        for err in &report.errors {
            let _ = writeln!(out, "  - {err}");
        }
    }

    out.trim_end().to_owned()
}
