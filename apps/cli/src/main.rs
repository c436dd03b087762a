//! Turnstile command-line interface
//!
//! Drives the validation service from a terminal: `show` runs a rotating
//! access-code display, `validate` submits a scanned code for a verdict,
//! `face` uploads a capture for verification.

mod commands;
mod settings;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::settings::ConnectionArgs;

/// Exit code when the service denies a code or rejects a face
const EXIT_DENIED: u8 = 1;
/// Exit code for operational failures, distinct from a denied verdict
const EXIT_ERROR: u8 = 2;

/// Operate a Turnstile entry-validation display from the terminal
#[derive(Debug, Parser)]
#[command(name = "turnstile", version, about, propagate_version = true)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rotate and display access codes for a subject until interrupted
    Show(commands::show::ShowArgs),
    /// Submit a scanned access code for a verdict
    Validate(commands::validate::ValidateArgs),
    /// Upload a face capture for verification
    Face(commands::face::FaceArgs),
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Command::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "turnstile", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let settings = settings::load(&cli.connection)?;
    match cli.command {
        Command::Show(args) => commands::show::run(&settings, args).await,
        Command::Validate(args) => commands::validate::run(&settings, args).await,
        Command::Face(args) => commands::face::run(&settings, args).await,
        // Handled before settings are loaded.
        Command::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Route logs to stderr so command output stays parseable on stdout
fn init_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
