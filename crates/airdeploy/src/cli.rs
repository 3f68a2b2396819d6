//! Clap derive structures for the `airdeploy` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airdeploy -- push a wireless network to device profiles across sites
#[derive(Debug, Parser)]
#[command(
    name = "airdeploy",
    version,
    about = "Deploy wireless networks to device profiles across controller sites",
    long_about = "Resolves per-site deployment policies against live controller state,\n\
        assigns a network to every targeted device profile in bounded batches,\n\
        records what was intended, and reconciles it against the controller later.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "AIRDEPLOY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "AIRDEPLOY_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Control-plane API key
    #[arg(long, env = "AIRDEPLOY_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRDEPLOY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "AIRDEPLOY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AIRDEPLOY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Concurrent control-plane calls per batch
    #[arg(long, env = "AIRDEPLOY_BATCH_SIZE", global = true)]
    pub batch_size: Option<usize>,

    /// Assignment state file
    #[arg(long, env = "AIRDEPLOY_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a network and assign it to every targeted profile
    Deploy(DeployArgs),

    /// Show which profiles a manifest or set of sites would target
    Preview(PreviewArgs),

    /// Compare recorded assignments with the controller
    #[command(alias = "rec")]
    Reconcile(ReconcileArgs),

    /// Show recorded assignments
    State(StateArgs),

    /// List controller sites
    Sites,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Deployment ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeployArgs {
    /// Deployment manifest (YAML or JSON)
    pub manifest: PathBuf,

    /// Resolve targets only; create, assign, and record nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not push configuration to profiles after assignment
    #[arg(long)]
    pub skip_sync: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Deployment manifest (YAML or JSON)
    #[arg(required_unless_present = "sites")]
    pub manifest: Option<PathBuf>,

    /// Preview every profile at these sites instead of a manifest
    #[arg(long = "site", short = 's', conflicts_with = "manifest")]
    pub sites: Vec<String>,
}

// ── Reconciliation & state ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Network entity ID returned by `deploy`
    pub network_id: String,

    /// Apply deterministic fixes (add, remove, resync)
    #[arg(long)]
    pub fix: bool,
}

#[derive(Debug, Args)]
pub struct StateArgs {
    /// Show profile records for one network (lists networks when omitted)
    pub network_id: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store the active profile's API key in the system keyring
    ///
    /// Uses --api-key when given, otherwise prompts.
    SetApiKey,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
