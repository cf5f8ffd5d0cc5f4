use anyhow::Context;
use api_client::HttpStatsClient;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::Config;
use core_types::{Metric, ParticipantMeta, ParticipantStatus, Snapshot};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use registry::Registry;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

/// The main entry point for the SignalDesk registry tooling.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    let _log_guard = configuration::init_tracing(&config.logging);

    // Execute the appropriate command
    match cli.command {
        Commands::Serve => web_server::run_server(config).await,
        Commands::List(args) => handle_list(&open_registry(&config)?, args),
        Commands::Register(args) => handle_register(&open_registry(&config)?, args),
        Commands::Activate(args) => handle_activate(&open_registry(&config)?, args),
        Commands::Show(args) => handle_show(&open_registry(&config)?, &args.token),
        Commands::Sync(args) => handle_sync(&open_registry(&config)?, args).await,
        Commands::Leaderboard => handle_leaderboard(&open_registry(&config)?),
        Commands::RecordSnapshot(args) => handle_record_snapshot(&open_registry(&config)?, args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Participant registry and performance tracking for SignalDesk programs.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve,
    /// List stored participants.
    List(ListArgs),
    /// Register a new (pending) participant and print its token.
    Register(RegisterArgs),
    /// Activate a participant, optionally linking its stats-feed username.
    Activate(ActivateArgs),
    /// Show a participant with its recent snapshots.
    Show(TokenArgs),
    /// Refresh stats from the external feed.
    Sync(SyncArgs),
    /// Print the current leaderboard.
    Leaderboard,
    /// Append a snapshot (read from a JSON file) to a participant's history.
    RecordSnapshot(RecordSnapshotArgs),
}

#[derive(Parser)]
struct ListArgs {
    /// Only show participants in this status (PENDING or ACTIVE).
    #[arg(long)]
    status: Option<ParticipantStatus>,
}

#[derive(Parser)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    platform: Option<String>,
    #[arg(long)]
    broker: Option<String>,
    #[arg(long)]
    server: Option<String>,
    #[arg(long)]
    leverage: Option<String>,
    #[arg(long)]
    account_size: Option<String>,
    #[arg(long)]
    country: Option<String>,
}

#[derive(Parser)]
struct ActivateArgs {
    #[arg(long)]
    token: String,
    /// The participant's username on the stats feed.
    #[arg(long)]
    username: Option<String>,
}

#[derive(Parser)]
struct TokenArgs {
    #[arg(long)]
    token: String,
}

#[derive(Parser)]
struct SyncArgs {
    /// Sync a single participant.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    token: Option<String>,
    /// Sync every active participant that has a linked username.
    #[arg(long)]
    all: bool,
}

#[derive(Parser)]
struct RecordSnapshotArgs {
    #[arg(long)]
    token: String,
    /// A JSON file holding one snapshot object.
    #[arg(long)]
    file: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn open_registry(config: &Config) -> anyhow::Result<Registry> {
    let repo = database::open_repository(&config.storage);
    let history = Arc::new(database::open_snapshot_log(&config.storage));
    let source = Arc::new(HttpStatsClient::new(&config.stats_source)?);
    Ok(Registry::new(repo, history, source, config))
}

fn handle_list(registry: &Registry, args: ListArgs) -> anyhow::Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Token", "Name", "Email", "Status", "Username", "Created"]);

    for p in registry.repository().list() {
        if args.status.is_some_and(|status| status != p.status) {
            continue;
        }
        table.add_row(vec![
            p.token.clone(),
            p.display_name.clone(),
            p.email.clone(),
            p.status.to_string(),
            p.fx_username().unwrap_or("-").to_string(),
            p.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn handle_register(registry: &Registry, args: RegisterArgs) -> anyhow::Result<()> {
    let meta = ParticipantMeta {
        platform: args.platform,
        broker: args.broker,
        server: args.server,
        leverage: args.leverage.as_deref().map(Metric::from),
        account_size: args.account_size.as_deref().map(Metric::from),
        country: args.country,
    };
    let meta = (meta != ParticipantMeta::default()).then_some(meta);

    let participant = registry.repository().register(&args.name, &args.email, meta)?;
    println!("{}", participant.token);
    Ok(())
}

fn handle_activate(registry: &Registry, args: ActivateArgs) -> anyhow::Result<()> {
    if registry.repository().activate(&args.token, args.username.as_deref())? {
        println!("Activated {}", args.token);
    } else {
        println!("No participant with token {}", args.token);
    }
    Ok(())
}

fn handle_show(registry: &Registry, token: &str) -> anyhow::Result<()> {
    let details = registry.participant_details(token)?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

async fn handle_sync(registry: &Registry, args: SyncArgs) -> anyhow::Result<()> {
    if let Some(token) = args.token {
        let stats = registry.sync_stats(&token).await?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let tokens: Vec<String> = registry
        .repository()
        .list()
        .into_iter()
        .filter(|p| p.status.is_active() && p.fx_username().is_some())
        .map(|p| p.token)
        .collect();

    // Set up the progress bar
    let progress_bar = ProgressBar::new(tokens.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let tasks = tokens.iter().map(|token| {
        let pb = progress_bar.clone();
        async move {
            let result = registry.sync_stats(token).await;
            pb.inc(1);
            (token, result)
        }
    });
    let results = join_all(tasks).await;
    progress_bar.finish_with_message("Sync complete!");

    let mut failures = 0;
    for (token, result) in results {
        if let Err(e) = result {
            failures += 1;
            eprintln!("Sync failed for {}: {}", token, e);
        }
    }
    println!("Synced {} of {} participants.", tokens.len() - failures, tokens.len());
    Ok(())
}

fn handle_leaderboard(registry: &Registry) -> anyhow::Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "ROI %", "Win %", "PF", "Trades", "Equity"]);

    for (rank, entry) in registry.leaderboard().into_iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            entry.display_name,
            cell(entry.roi_pct),
            cell(entry.win_rate_pct),
            cell(entry.profit_factor),
            cell(entry.total_trades),
            cell(entry.equity),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn cell(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.round_dp(2).to_string())
}

fn handle_record_snapshot(registry: &Registry, args: RecordSnapshotArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.file.display()))?;
    registry.record_snapshot(&args.token, snapshot)?;
    println!("Recorded snapshot for {}", args.token);
    Ok(())
}
