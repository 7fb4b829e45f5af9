mod commands;
mod output;
mod tui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repro_core::Config;

use crate::output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "repro")]
#[command(about = "Demonstrates stale reads after a shape sync reports completion")]
#[command(version)]
struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress human-friendly chatter
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the diagnostic sequence against the sync service
    Run,
    /// Interactive terminal UI over a live query
    Tui,
    /// Add a single item with a generated value
    Add,
    /// Delete all items
    Clear,
    /// List items in the local database
    List,
    /// Show data locations and item count
    Status,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set a configuration value and save it
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config subcommands run before the config file is required to parse
    if let Some(Commands::Config { command }) = &cli.command {
        return match command {
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
        };
    }

    let config = Config::load()?;

    // The TUI owns the terminal, so it logs to a file instead of stderr
    if let Some(Commands::Tui) = &cli.command {
        return tui::run(config).await;
    }

    init_logging(&config);

    match cli.command {
        Some(Commands::Add) => commands::items::add(config, &output).await,
        Some(Commands::Clear) => commands::items::clear(config, &output).await,
        Some(Commands::List) => commands::items::list(config, &output).await,
        Some(Commands::Status) => commands::status::show(&config, &output),
        Some(Commands::Run) | None => commands::run::run(config, &output).await,
        Some(Commands::Tui) | Some(Commands::Config { .. }) => unreachable!(),
    }
}

fn init_logging(config: &Config) {
    let filter = if config.client_debug {
        EnvFilter::new("repro_core=debug,repro=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("repro_core=info,repro=info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
