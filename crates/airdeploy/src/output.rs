//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats serialize the domain values directly via serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Outcome label for a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Failed,
    Skipped,
    DryRun,
}

impl Status {
    pub fn paint(self, color: bool) -> String {
        let label = match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::DryRun => "dry-run",
        };
        if !color {
            return label.to_owned();
        }
        match self {
            Self::Ok => label.green().to_string(),
            Self::Failed => label.red().bold().to_string(),
            Self::Skipped => label.yellow().to_string(),
            Self::DryRun => label.cyan().to_string(),
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// `to_row` builds the `Tabled` row for table output; structured formats
/// serialize `data` as-is.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        _ => render_structured(format, data),
    }
}

/// Render a single item. Table output comes from `detail_fn`, since
/// summaries and reports are not uniform rows.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        _ => render_structured(format, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(data)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        id: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "ID")]
        id: String,
    }

    fn row(item: &Item) -> ItemRow {
        ItemRow {
            id: item.id.to_owned(),
        }
    }

    #[test]
    fn table_uses_row_builder() {
        let out = render_list(&OutputFormat::Table, &[Item { id: "hq" }], row).unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains("hq"));
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &[Item { id: "a" }, Item { id: "b" }],
            row,
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":"a"},{"id":"b"}]"#);
    }

    #[test]
    fn yaml_single() {
        let out = render_single(&OutputFormat::Yaml, &Item { id: "a" }, |_| String::new()).unwrap();
        assert_eq!(out.trim(), "id: a");
    }

    #[test]
    fn status_without_color_is_plain() {
        assert_eq!(Status::Failed.paint(false), "failed");
        assert_eq!(Status::DryRun.paint(false), "dry-run");
    }
}
