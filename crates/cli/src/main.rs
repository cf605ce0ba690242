//! Canary CLI: the main entry point.
//!
//! Commands:
//! - `render`  Trace a JSON-described execution context to stdout
//! - `config`  Show, locate or initialize the configuration file
//! - `sample`  Print a sample execution context as JSON

use canary_config::{CanaryConfig, LoggingConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, reload, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "canary",
    about = "Canary: execution context tracer",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an execution context as trace lines
    Render(RenderArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print a sample execution context (JSON)
    Sample,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Context file (JSON); reads stdin when omitted
    file: Option<PathBuf>,

    /// Trace flags applied over the config, e.g. "PARENTCONTEXT=true;MAXITEMLENGTH=500"
    #[arg(short, long, env = "CANARY_RENDER_OPTIONS")]
    options: Option<String>,

    /// Do not translate structured queries to FetchXML
    #[arg(long)]
    no_translator: bool,

    /// Wrap the output in "Trace enter" / "Trace exit" lines
    #[arg(long)]
    bracket: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file if none exists
    Init,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing before loading the config so its events are kept;
    // stdout is reserved for the trace itself
    let env_filter = EnvFilter::try_from_default_env().ok();
    let pinned = env_filter.is_some() || cli.verbose;
    let initial = env_filter.unwrap_or_else(|| {
        EnvFilter::new(if cli.verbose {
            "debug".to_string()
        } else {
            LoggingConfig::default().level
        })
    });
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let config = CanaryConfig::load();
    if let (Ok(config), false) = (&config, pinned) {
        let level = EnvFilter::new(&config.logging.level);
        if let Err(e) = filter_handle.modify(|filter| *filter = level) {
            tracing::warn!(error = %e, "Could not apply configured log level");
        }
    }

    match cli.command {
        Commands::Render(args) => commands::render::run(args, config?)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config?)?,
            ConfigAction::Path => commands::config_cmd::path()?,
            ConfigAction::Init => commands::config_cmd::init()?,
        },
        Commands::Sample => commands::sample::run()?,
    }

    Ok(())
}
