use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use greenprompt::{cli, config};

#[derive(Debug, Parser)]
#[command(name = "greenprompt")]
#[command(about = "Compress prompts to save tokens and energy")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check the compression service and show saved counters
    Health,
    /// Compress a prompt (reads stdin when no text is given)
    Compress {
        /// The prompt to compress
        text: Option<String>,
        /// Target compression ratio (default from config)
        #[arg(long)]
        ratio: Option<f64>,
    },
    /// Run a test compression with a sample prompt and update the counters
    Test,
    /// Show token savings statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of history
        #[arg(long)]
        days: Option<u32>,
    },
    /// Open the dashboard in a browser
    Dashboard,
    /// Show which inputs of a page description would get a compress trigger
    Scan {
        /// JSON page description
        page: PathBuf,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.greenprompt/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value, e.g. `detector.min_prompt_chars 80`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

/// Install the console subscriber.
///
/// The config that supplies the default level is itself loaded under a
/// temporary `warn` subscriber, so problems reading it still reach stderr.
fn init_tracing() {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_writer(std::io::stderr)
        .finish();
    let default_level = tracing::subscriber::with_default(bootstrap, config::load).logging.level;

    let filter = EnvFilter::try_from_env("GREENPROMPT_LOG")
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let app = App::parse();

    match app.command {
        Commands::Health => cli::run_health(),
        Commands::Compress { text, ratio } => cli::run_compress(text, ratio),
        Commands::Test => cli::run_test(),
        Commands::Stats { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt, days)
        }
        Commands::Dashboard => cli::run_dashboard(),
        Commands::Scan { page } => cli::run_scan(&page),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
