mod pipeline;
mod runner;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use cw_core::{Embedding, StatsSnapshot};
use cw_store::{Store, stats};

use runner::SessionConfig;

#[derive(Parser)]
#[command(name = "cw", about = "Classwatch attendance and attention tracker")]
struct Cli {
    /// Roster database path (default: CLASSWATCH_DB or ~/.classwatch/roster.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a session from frame events on stdin (or a file)
    Run {
        /// Replay frame events from a file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Grace allowance per absence streak, in seconds
        #[arg(long)]
        tolerance: Option<f64>,

        /// Identity match distance threshold
        #[arg(long)]
        threshold: Option<f32>,

        /// Stats document path (default: ATTENDANCE_STATS_PATH or /tmp/attendance_stats.json)
        #[arg(long)]
        stats_path: Option<PathBuf>,

        /// Minimum seconds between stats publications
        #[arg(long)]
        publish_interval: Option<f64>,
    },

    /// Poll and print the live stats document
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        #[arg(long)]
        stats_path: Option<PathBuf>,
    },

    /// Print the current stats document once
    Stats {
        #[arg(long)]
        stats_path: Option<PathBuf>,
    },

    /// Enroll a person from a JSON embedding file (array of 128 floats)
    Enroll {
        first_name: String,
        last_name: String,
        id: String,

        /// Path to the embedding JSON file
        #[arg(long)]
        embedding: PathBuf,
    },

    /// List enrolled people with presence and attention
    Roster,

    /// Clear presence and attention before a new session
    Reset,
}

fn default_db_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    home.join(".classwatch").join("roster.db")
}

fn open_store(cli: &Cli) -> Result<Store> {
    let path = cli
        .db
        .clone()
        .or_else(|| std::env::var("CLASSWATCH_DB").ok().map(PathBuf::from))
        .unwrap_or_else(default_db_path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Store::open(&path).with_context(|| format!("failed to open store at {}", path.display()))
}

fn resolve_stats_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf).unwrap_or_else(stats::stats_path)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Run {
            input,
            tolerance,
            threshold,
            stats_path,
            publish_interval,
        } => {
            let mut config = SessionConfig::new(resolve_stats_path(stats_path.as_deref()));
            if let Some(t) = tolerance {
                config.tolerance = *t;
            }
            if let Some(t) = threshold {
                config.threshold = *t;
            }
            if let Some(i) = publish_interval {
                config.publish_interval = *i;
            }
            cmd_run(&cli, input.as_deref(), config).await
        }
        Commands::Watch {
            interval_ms,
            stats_path,
        } => cmd_watch(resolve_stats_path(stats_path.as_deref()), *interval_ms).await,
        Commands::Stats { stats_path } => cmd_stats(resolve_stats_path(stats_path.as_deref())),
        Commands::Enroll {
            first_name,
            last_name,
            id,
            embedding,
        } => cmd_enroll(&cli, first_name, last_name, id, embedding),
        Commands::Roster => cmd_roster(&cli),
        Commands::Reset => cmd_reset(&cli),
    }
}

fn spawn_cancel_on_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!("failed to install SIGTERM handler: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn cmd_run(cli: &Cli, input: Option<&Path>, config: SessionConfig) -> Result<()> {
    let store = open_store(cli)?;

    let cancel = CancellationToken::new();
    spawn_cancel_on_signal(cancel.clone());

    match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            runner::run_session(&store, BufReader::new(file), &config, cancel).await
        }
        None => runner::run_session(&store, BufReader::new(tokio::io::stdin()), &config, cancel).await,
    }
}

fn format_snapshot(snap: &StatsSnapshot) -> String {
    format!(
        "attendance: {}%  (now: {} / peak: {})",
        snap.percent, snap.current, snap.max
    )
}

async fn cmd_watch(stats_path: PathBuf, interval_ms: u64) -> Result<()> {
    let cancel = CancellationToken::new();
    spawn_cancel_on_signal(cancel.clone());

    loop {
        match stats::read(&stats_path) {
            Some(snap) => println!("{}", format_snapshot(&snap)),
            None => println!("(no data yet)"),
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = tokio::time::sleep(Duration::from_millis(interval_ms)) => {}
        }
    }
}

fn cmd_stats(stats_path: PathBuf) -> Result<()> {
    match stats::read(&stats_path) {
        Some(snap) => println!("{}", format_snapshot(&snap)),
        None => println!("(no data yet)"),
    }
    Ok(())
}

fn cmd_enroll(
    cli: &Cli,
    first_name: &str,
    last_name: &str,
    id: &str,
    embedding_path: &Path,
) -> Result<()> {
    let content = std::fs::read_to_string(embedding_path)
        .with_context(|| format!("failed to read {}", embedding_path.display()))?;
    let values: Vec<f32> =
        serde_json::from_str(&content).context("embedding file must be a JSON array of floats")?;
    let embedding = Embedding::new(values)
        .map_err(|e| anyhow::anyhow!("invalid embedding: {e}"))?;

    let store = open_store(cli)?;
    store
        .enroll(first_name, last_name, id, &embedding)
        .context("failed to enroll")?;

    println!("enrolled {first_name} {last_name} ({id})");
    Ok(())
}

fn cmd_roster(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    let people = store.list_people().context("failed to list roster")?;

    if people.is_empty() {
        println!("(roster is empty)");
        return Ok(());
    }

    println!("{:<10} {:<24} {:<8} attention", "id", "name", "present");
    for p in &people {
        println!(
            "{:<10} {:<24} {:<8} {}% ({:.1}s)",
            p.id,
            format!("{} {}", p.first_name, p.last_name),
            if p.present { "yes" } else { "no" },
            p.attention_percent,
            p.attention_seconds,
        );
    }
    Ok(())
}

fn cmd_reset(cli: &Cli) -> Result<()> {
    let store = open_store(cli)?;
    store.reset_attendance().context("failed to reset")?;
    println!("attendance cleared");
    Ok(())
}
