//! Liveboard CLI
//!
//! Runs the dashboard synchronizer headless against a live backend:
//! - Watch the dashboard, reconciling on every tick
//! - Take a one-off snapshot of both datasets
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use liveboard::{
    generate_default_config, logging, Config, CycleOutcome, HttpFetcher, MemoryPage, PageEvent,
    PollingController, SnapshotFetcher, Visibility,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

#[derive(Parser)]
#[command(name = "liveboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live dashboard synchronizer")]
#[command(
    long_about = "Liveboard polls a dashboard backend and keeps a rendered view of its\n\
                  statistics and activity lists in sync."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the backend and keep the page in sync.
    ///
    /// Reads commands from stdin: `hide`, `show`, `print`, `quit`.
    Watch {
        /// Print the page after every refresh
        #[arg(short, long)]
        print: bool,

        /// Refresh interval in milliseconds
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },

    /// Fetch both datasets once and print the rendered page
    Snapshot {
        /// Print the decoded snapshots as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {:?}", path))?;
                eprintln!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.base_url {
        config.source.base_url = url.clone();
    }
    if let Commands::Watch {
        interval_ms: Some(ms),
        ..
    } = &cli.command
    {
        config.polling.interval_ms = *ms;
    }
    config.validate()?;

    logging::init(&config.logging)?;
    tracing::info!("Liveboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Backend: {}", config.source.base_url);

    match cli.command {
        Commands::Watch { print, .. } => watch(config, print).await,
        Commands::Snapshot { json } => snapshot(config, json).await,
        Commands::Config { .. } => Ok(()),
    }
}

async fn watch(config: Config, print: bool) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(config.source.clone())?);
    let page = Arc::new(MemoryPage::dashboard());
    let controller = PollingController::from_config(fetcher, page.clone(), &config)?;

    let (events_tx, events_rx) = mpsc::channel(16);

    tokio::spawn(read_commands(events_tx.clone(), page.clone()));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            let _ = events_tx.send(PageEvent::Unload).await;
        }
    });

    if print {
        let mut reports = controller.subscribe();
        let page = page.clone();
        tokio::spawn(async move {
            loop {
                match reports.recv().await {
                    Ok(report) => {
                        if report.outcome != CycleOutcome::Skipped {
                            println!("{}", page.render_document());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Printer fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    controller.initialize().await?;
    controller.run_events(events_rx).await;

    tracing::info!("Liveboard stopped");
    Ok(())
}

/// Translate stdin lines into page events
async fn read_commands(events: mpsc::Sender<PageEvent>, page: Arc<MemoryPage>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let event = match line.trim() {
            "hide" => PageEvent::VisibilityChanged(Visibility::Hidden),
            "show" => PageEvent::VisibilityChanged(Visibility::Visible),
            "quit" | "exit" => PageEvent::Unload,
            "print" => {
                println!("{}", page.render_document());
                continue;
            }
            "" => continue,
            other => {
                tracing::warn!("Unknown command {:?} (expected hide, show, print, quit)", other);
                continue;
            }
        };

        if events.send(event).await.is_err() {
            break;
        }
    }
}

async fn snapshot(config: Config, json: bool) -> anyhow::Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(config.source.clone())?);

    if json {
        let stats = fetcher.fetch_stats().await?;
        let activity = fetcher.fetch_recent_activity().await?;
        let out = serde_json::json!({
            "stats": stats,
            "recent_activity": activity,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let page = Arc::new(MemoryPage::dashboard());
    let controller = PollingController::from_config(fetcher, page.clone(), &config)?;
    let report = controller.load_all().await;

    print!("{}", page.render_document());

    if report.stats != CycleOutcome::Applied || report.recent_activity != CycleOutcome::Applied {
        anyhow::bail!(
            "snapshot incomplete: stats {:?}, recent activity {:?}",
            report.stats,
            report.recent_activity
        );
    }
    Ok(())
}
