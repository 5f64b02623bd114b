//! crm-sync CLI - provision B2C Commerce and Salesforce for CRM synchronisation.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crm_sync_b2c::StageError;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use commands::b2c::B2cCommand;
use commands::sf::SfCommand;
use commands::{Context, EnvironmentArgs};

#[derive(Parser)]
#[command(name = "crm-sync")]
#[command(about = "Deploy and configure B2C Commerce and Salesforce for CRM synchronisation")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to crm-sync.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log crm-sync activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    environment: EnvironmentArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved environment definition
    Env,

    /// B2C Commerce instance operations
    #[command(subcommand)]
    B2c(B2cCommand),

    /// Salesforce org operations
    #[command(subcommand)]
    Sf(SfCommand),
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::B2c(command) => command.name(),
            Self::Sf(command) => command.name(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,crm_sync=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.environment)?;
    execute(cli.command, &ctx).await
}

async fn execute(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Env => commands::env::run(ctx),
        Commands::B2c(command) => commands::b2c::run(command, ctx).await,
        Commands::Sf(command) => commands::sf::run(command, ctx).await,
    }
}

fn report(error: &anyhow::Error) {
    eprintln!("Error: {error}");
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }

    if let Some(stage_error) = error.downcast_ref::<StageError>() {
        eprintln!("Failed stage: {}", stage_error.stage());
        if let Some((status, body)) = stage_error.upstream() {
            eprintln!("Upstream response ({status}): {body}");
        }
    }
}

fn main() {
    // Before parsing, so `.env` values reach the `env = ...` flags.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start the async runtime: {e}");
            std::process::exit(1);
        }
    };

    let span = tracing::info_span!("command", name = cli.command.name());
    let result = runtime.block_on(run(cli).instrument(span));

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
}
