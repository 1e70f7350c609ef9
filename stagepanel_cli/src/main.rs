//! Stagepanel CLI - Render request tabs and manage widget settings
//!
//! Usage:
//!   stagepanel render <TRACE>           Render a request trace to HTML
//!   stagepanel settings ls              List widget settings
//!   stagepanel settings set <KEY> <V>   Change a threshold
//!   stagepanel match <METRICS>          Filter metric names by name and tags

mod commands;
mod config;
mod remote;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stagepanel")]
#[command(author = "Stagepanel Team")]
#[command(version)]
#[command(about = "Render the request tab of the monitoring dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a request trace (JSON) to a standalone HTML page
    Render {
        /// Path to the trace JSON file
        trace: PathBuf,

        /// Where to write the page (default: next to the trace, .html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch templates from a stagepanel server instead of the built-in ones
        #[arg(long, env = "STAGEPANEL_SERVER")]
        server: Option<String>,

        /// Open the page in the browser
        #[arg(long)]
        open: bool,
    },

    /// View or change widget settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Filter metric names by name and tags
    Match {
        /// JSON file with an array of {name, tags}
        metrics: PathBuf,

        /// Metric name to match
        #[arg(short, long)]
        name: Option<String>,

        /// Tag filter, KEY=VALUE ("*" matches any value)
        #[arg(short, long = "tag", value_parser = commands::matcher::parse_tag)]
        tags: Vec<(String, String)>,

        /// Value type appended to each match (e.g., mean, p95)
        #[arg(long, default_value = "value")]
        value_type: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// List all settings
    Ls,

    /// Print one setting
    Get {
        key: String,
    },

    /// Change a setting
    Set {
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{},stagepanel_cli=info,stagepanel_common={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    match cli.command {
        Commands::Render {
            trace,
            output,
            server,
            open,
        } => {
            let opts = commands::render::RenderOptions {
                trace,
                output,
                server,
                open,
            };
            commands::render::run(opts).await?;
        }

        Commands::Settings { action } => match action {
            SettingsAction::Ls => commands::settings::list()?,
            SettingsAction::Get { key } => commands::settings::get(&key)?,
            SettingsAction::Set { key, value } => commands::settings::set(&key, &value)?,
        },

        Commands::Match {
            metrics,
            name,
            tags,
            value_type,
        } => {
            commands::matcher::run(&metrics, name, tags, &value_type)?;
        }
    }

    Ok(())
}
