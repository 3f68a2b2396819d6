//! `airdeploy reconcile`: compare recorded assignments with what the
//! controller reports, and optionally fix the drift.

use std::fmt::Write;

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use airdeploy_core::{
    AssignmentStore, EntityId, MismatchReason, ProfileAssignmentRecord, ReconciliationResult, Reconciler,
    RemediationOutcome,
};

use crate::cli::{GlobalOpts, ReconcileArgs};
use crate::error::CliError;
use crate::output::{self, Status};

use super::{Context, util};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct MismatchRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Site")]
    site: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Fix")]
    fix: String,
}

impl From<&ProfileAssignmentRecord> for MismatchRow {
    fn from(r: &ProfileAssignmentRecord) -> Self {
        let reason = r.mismatch_reason;
        Self {
            profile: r.profile_id.to_string(),
            site: r.site_id.to_string(),
            reason: reason.map(|m| m.to_string()).unwrap_or_default(),
            fix: reason
                .and_then(MismatchReason::remediation)
                .map_or_else(|| "manual review".into(), |a| a.to_string()),
        }
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl OutcomeRow {
    fn new(o: &RemediationOutcome, color: bool) -> Self {
        let status = if o.success { Status::Ok } else { Status::Failed };
        Self {
            profile: o.profile_id.to_string(),
            action: o.action.to_string(),
            status: status.paint(color),
            error: o.error.clone().unwrap_or_default(),
        }
    }
}

/// Reconciliation plus whatever `--fix` did about it.
#[derive(Serialize)]
struct ReconcileReport {
    #[serde(flatten)]
    result: ReconciliationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    remediation: Option<Vec<RemediationOutcome>>,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: ReconcileArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let network_id = EntityId::from(args.network_id);
    let reconciler =
        Reconciler::new(ctx.client.clone(), ctx.open_store().await?).with_batch_size(ctx.batch_size);

    if !reconciler.store().list_networks().await?.contains(&network_id) {
        return Err(CliError::NotFound {
            resource_type: "network".into(),
            identifier: network_id.to_string(),
            list_command: "state".into(),
        });
    }

    let result = reconciler.reconcile(&network_id).await?;
    for err in &result.errors {
        tracing::warn!("{err}");
    }

    let fixable = result
        .mismatches
        .iter()
        .filter(|r| r.mismatch_reason.and_then(MismatchReason::remediation).is_some())
        .count();
    let remediation = if args.fix && fixable > 0 {
        let prompt = format!("Apply {}?", util::count(fixable, "fix"));
        if util::confirm(&prompt, "reconcile --fix", global.yes)? {
            Some(reconciler.remediate(&result).await)
        } else {
            None
        }
    } else {
        None
    };

    let report = ReconcileReport {
        result,
        remediation,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(&global.output, &report, |r| render_report(r, color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_report(report: &ReconcileReport, color: bool) -> String {
    let result = &report.result;
    let mut out = String::new();

    let _ = writeln!(out, "Network:    {}", result.network_id);
    let _ = writeln!(out, "Expected:   {}", result.expected_count);
    let _ = writeln!(out, "Observed:   {}", result.actual_count);
    let _ = writeln!(out, "Matched:    {}", result.matched_count);
    let mismatched = result.mismatched_count.to_string();
    let _ = writeln!(
        out,
        "Mismatched: {}",
        if color && result.mismatched_count > 0 {
            mismatched.yellow().to_string()
        } else {
            mismatched
        }
    );

    if !result.mismatches.is_empty() {
        let rows: Vec<MismatchRow> = result.mismatches.iter().map(MismatchRow::from).collect();
        let _ = writeln!(out, "\n{}", output::render_table(&rows));
    }

    if let Some(ref outcomes) = report.remediation {
        let rows: Vec<OutcomeRow> = outcomes.iter().map(|o| OutcomeRow::new(o, color)).collect();
        let _ = writeln!(out, "\n{}", output::render_table(&rows));
    }

    if !result.errors.is_empty() {
        let _ = writeln!(out, "\nCould not check:");
        for err in &result.errors {
            let _ = writeln!(out, "  - {err}");
        }
    }

    out.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use airdeploy_core::{AssignmentState, Provenance, SyncStatus};

    fn mismatch(reason: MismatchReason) -> ProfileAssignmentRecord {
        let now = Utc::now();
        ProfileAssignmentRecord {
            network_id: "net-1".into(),
            profile_id: "p-1".into(),
            site_id: "hq".into(),
            device_group_id: "dg-1".into(),
            provenance: Provenance::SitePropagated,
            expected_state: AssignmentState::Assigned,
            actual_state: AssignmentState::NotAssigned,
            mismatch_reason: Some(reason),
            sync_status: SyncStatus::Pending,
            last_error: None,
            last_reconciled_at: Some(now),
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn unfixable_mismatch_needs_review() {
        let row = MismatchRow::from(&mismatch(MismatchReason::ProfileDeleted));
        assert_eq!(row.reason, "PROFILE_DELETED");
        assert_eq!(row.fix, "manual review");

        let row = MismatchRow::from(&mismatch(MismatchReason::MissingAssignment));
        assert_eq!(row.fix, "ADD_ASSIGNMENT");
    }

    #[test]
    fn report_flattens_result() {
        let report = ReconcileReport {
            result: ReconciliationResult {
                network_id: "net-1".into(),
                expected_count: 1,
                actual_count: 0,
                matched_count: 0,
                mismatched_count: 1,
                mismatches: vec![mismatch(MismatchReason::MissingAssignment)],
                errors: Vec::new(),
                reconciled_at: Utc::now(),
            },
            remediation: None,
        };
        let value = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(value["mismatched_count"], 1);
        assert!(value.get("remediation").is_none());

        let text = render_report(&report, false);
        assert!(text.contains("Mismatched: 1"));
        assert!(text.contains("ADD_ASSIGNMENT"));
    }
}
