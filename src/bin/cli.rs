//! notice-watch CLI
//!
//! Long-running entry point. Configuration comes from a TOML file plus the
//! `NOTIFY_EMAIL` and `RESEND_API_KEY` environment variables.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notice_watch::{
    error::Result,
    models::{Config, Settings},
    pipeline::Monitor,
    scheduler::Scheduler,
    storage::{HistoryStore, LocalHistoryStore},
};

/// notice-watch - University Notice Monitor
#[derive(Parser, Debug)]
#[command(
    name = "notice-watch",
    version,
    about = "Emails an alert when new notices appear on a university notice page"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Log alerts instead of sending email
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the notice page on a fixed interval (default)
    Run,

    /// Run a single cycle and exit
    Once,

    /// Validate configuration and environment
    Validate,

    /// Show alerted notices from the history file
    History {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Ctrl-C received");
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let settings = startup_settings(config)?;
            let monitor = Monitor::from_settings(settings, cli.dry_run)?;
            Scheduler::from_monitor(monitor)
                .run(shutdown_signal())
                .await?;
        }

        Command::Once => {
            let settings = startup_settings(config)?;
            let monitor = Monitor::from_settings(settings, cli.dry_run)?;
            let outcome = monitor.run_cycle().await?;
            log::info!("Cycle finished: {}", outcome);
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            let settings = startup_settings(config)?;
            log::info!("✓ Source: {}", settings.config.source.url);
            log::info!("✓ Recipient: {}", settings.credentials.recipient);
            log::info!(
                "✓ History: {} (backup {})",
                settings.config.history.path.display(),
                settings.config.history.backup_path.display()
            );
            log::info!("All validations passed!");
        }

        Command::History { limit } => {
            let store = LocalHistoryStore::from_config(&config.history);
            let notices = store.load().await?;
            log::info!(
                "{} alerted notices in {}",
                notices.len(),
                store.path().display()
            );
            for notice in notices.iter().take(limit) {
                log::info!(
                    "{} [{}] p{} {}{} {}",
                    notice.timestamp.format("%Y-%m-%d %H:%M"),
                    notice.category,
                    notice.priority(),
                    notice.language(),
                    if notice.is_urgent { " URGENT" } else { "" },
                    notice.text
                );
            }
        }
    }

    Ok(())
}

/// Merge the environment into the file config; failures here end the process.
fn startup_settings(config: Config) -> Result<Settings> {
    Settings::from_env(config).inspect_err(|e| {
        log::error!("Startup configuration invalid: {}", e);
    })
}
