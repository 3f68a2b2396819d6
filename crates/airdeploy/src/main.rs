mod cli;
mod commands;
mod config;
mod error;
mod manifest;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::Context;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Logs go to stderr so structured output on stdout stays parseable.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local-only commands: no controller connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::State(args) => {
            let cfg = airdeploy_config::load_config_or_default();
            let state_path = config::state_path(&cli.global, &cfg);
            commands::state::handle(args, &state_path, &cli.global).await
        }

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "airdeploy", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = airdeploy_config::load_config_or_default();
            let controller = config::build_controller_config(&cli.global, &cfg)?;
            let ctx = Context {
                client: controller.client()?,
                batch_size: config::batch_size(&cli.global, &cfg)?,
                state_path: config::state_path(&cli.global, &cfg),
            };

            tracing::debug!(
                command = ?cmd,
                controller = %controller.url,
                state = %ctx.state_path.display(),
                "dispatching command"
            );
            commands::dispatch(cmd, &ctx, &cli.global).await
        }
    }
}
