//! `airdeploy deploy`: create a network and assign it to every targeted
//! profile.

use std::fmt::Write;

use tabled::Tabled;

use airdeploy_core::{
    AssignmentResult, DeploymentRequest, DeploymentSummary, Orchestrator, OrchestratorConfig,
    RunOptions, SyncResult,
};

use crate::cli::{DeployArgs, GlobalOpts};
use crate::error::CliError;
use crate::manifest;
use crate::output::{self, Status};

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "Profile")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl AssignmentRow {
    fn new(a: &AssignmentResult, color: bool) -> Self {
        let status = if a.skipped {
            Status::Skipped
        } else if !a.success {
            Status::Failed
        } else if a.note.is_some() {
            Status::DryRun
        } else {
            Status::Ok
        };
        Self {
            id: a.profile_id.to_string(),
            name: a.profile_name.clone(),
            status: status.paint(color),
            detail: a.error.clone().or_else(|| a.note.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct SyncRow {
    #[tabled(rename = "Profile")]
    id: String,
    #[tabled(rename = "Sync")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl SyncRow {
    fn new(s: &SyncResult, color: bool) -> Self {
        let status = if s.success { Status::Ok } else { Status::Failed };
        Self {
            id: s.profile_id.to_string(),
            status: status.paint(color),
            error: s.error.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: DeployArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let manifest = manifest::load(&args.manifest)?;
    let request = DeploymentRequest {
        network: manifest.network,
        sites: manifest.sites,
        options: RunOptions {
            dry_run: args.dry_run,
            skip_sync: args.skip_sync,
        },
    };

    if !request.options.dry_run {
        let prompt = format!(
            "Create network '{}' and assign it across {}?",
            request.network.name,
            util::count(request.sites.len(), "site")
        );
        if !util::confirm(&prompt, "deploy", global.yes)? {
            tracing::info!("deployment cancelled");
            return Ok(());
        }
    }

    let orchestrator = Orchestrator::with_config(
        ctx.client.clone(),
        ctx.open_store().await?,
        OrchestratorConfig {
            batch_size: ctx.batch_size,
        },
    );
    let summary = orchestrator.deploy(&request).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &summary, |s| render_summary(s, color))?;
    output::print_output(&out, global.quiet);

    if summary.success {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            failed: summary.failed_assignments().count(),
            total: summary.assignments.len(),
            network_id: summary
                .entity_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
    }
}

fn render_summary(summary: &DeploymentSummary, color: bool) -> String {
    let mut out = String::new();

    match summary.entity_id {
        Some(ref id) => {
            let _ = writeln!(out, "Network:       {id}");
        }
        None => {
            let _ = writeln!(out, "Network:       (dry run, not created)");
        }
    }
    let _ = writeln!(out, "Sites:         {}", summary.sites_processed);
    let _ = writeln!(out, "Device groups: {}", summary.device_groups_found);
    let _ = writeln!(
        out,
        "Assigned:      {} of {}",
        summary.profiles_assigned,
        summary.assignments.len()
    );

    if !summary.assignments.is_empty() {
        let rows: Vec<AssignmentRow> = summary
            .assignments
            .iter()
            .map(|a| AssignmentRow::new(a, color))
            .collect();
        let _ = writeln!(out, "\n{}", output::render_table(&rows));
    }

    if let Some(ref syncs) = summary.sync_results {
        if !syncs.is_empty() {
            let rows: Vec<SyncRow> = syncs.iter().map(|s| SyncRow::new(s, color)).collect();
            let _ = writeln!(out, "\n{}", output::render_table(&rows));
        }
    }

    if !summary.errors.is_empty() {
        let _ = writeln!(out, "\nErrors:");
        for err in &summary.errors {
            let _ = writeln!(out, "  - {err}");
        }
    }

    out.trim_end().to_owned()
}
