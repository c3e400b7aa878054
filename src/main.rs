//! Craft Sync - Lost Ark craft price database
//!
//! One-shot CLI: each invocation runs a single job and exits. Scheduling is
//! left to whoever invokes it (cron, systemd timer, ...), one job at a time.

use clap::{Parser, Subcommand};
use craft_sync::database::{self, CatalogSeed};
use craft_sync::{
    extract_for_item, refresh_trade_counts, snapshot, sync_prices, Config, MarketClient,
    SnapshotKind, SnapshotStore,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lost Ark craft price sync - market prices to SQLite and JSON snapshots
#[derive(Parser, Debug)]
#[command(name = "craft_sync")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, env = "CRAFT_SYNC_DATABASE", default_value_os_t = default_path("craft.db"))]
    database: PathBuf,

    /// Full snapshot file (recipes + material prices)
    #[arg(long, env = "CRAFT_SYNC_SNAPSHOT_PATH", default_value_os_t = default_path("craft_data.json"))]
    snapshot_path: PathBuf,

    /// Life-material snapshot file
    #[arg(long, env = "CRAFT_SYNC_LIFE_SNAPSHOT_PATH", default_value_os_t = default_path("life_data.json"))]
    life_snapshot_path: PathBuf,

    /// Bearer token for market searches
    #[arg(long, env = "LOSTARK_MARKET_TOKEN", hide_env_values = true)]
    market_token: Option<String>,

    /// Bearer token for per-item trade stats
    #[arg(long, env = "LOSTARK_STATS_TOKEN", hide_env_values = true)]
    stats_token: Option<String>,

    /// Market API base URL
    #[arg(long, env = "LOSTARK_API_BASE_URL", default_value = craft_sync::market::DEFAULT_BASE_URL)]
    api_base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// IANA timezone for snapshot timestamps (default: server local time)
    #[arg(long, env = "CRAFT_SYNC_TIMEZONE")]
    timezone: Option<chrono_tz::Tz>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    Init,
    /// Load materials, items and recipes from a catalog seed JSON file
    Import { file: PathBuf },
    /// Fetch market prices for every category, then export snapshots
    SyncPrices,
    /// Refresh trade counts for every craft item
    RefreshTradeCounts,
    /// Rebuild both snapshots from the database
    Export,
    /// Print a stored snapshot
    Show {
        /// Print the life-material snapshot instead of the full one
        #[arg(long, conflicts_with = "item")]
        life: bool,
        /// Print only this craft item and the material prices it uses
        #[arg(long)]
        item: Option<i64>,
    },
}

/// Returns a default path under ~/.local/share/craft_sync/
fn default_path(file: &str) -> PathBuf {
    Config::default_data_dir().join(file)
}

impl Args {
    fn config(&self) -> Config {
        Config {
            database_path: self.database.clone(),
            snapshot_path: self.snapshot_path.clone(),
            life_snapshot_path: self.life_snapshot_path.clone(),
            market_token: self.market_token.clone(),
            stats_token: self.stats_token.clone(),
            api_base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            timezone: self.timezone,
        }
    }
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();

    if let Err(e) = run(&args.command, &config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: &Command, config: &Config) -> craft_sync::Result<()> {
    let store = SnapshotStore::new(&config.snapshot_path, &config.life_snapshot_path);

    match command {
        Command::Init => {
            open_database(&config.database_path)?;
        }
        Command::Import { file } => {
            let contents =
                std::fs::read_to_string(file).map_err(|e| craft_sync::CraftError::Io {
                    path: file.clone(),
                    source: e,
                })?;
            let seed: CatalogSeed = serde_json::from_str(&contents)?;
            let mut conn = open_database(&config.database_path)?;
            database::import_catalog(&mut conn, &seed)?;
        }
        Command::SyncPrices => {
            let client = MarketClient::new(config)?;
            let mut conn = open_database(&config.database_path)?;
            let summary = sync_prices(&mut conn, &client, &store, config.timezone)?;
            log::info!(
                "Sync completed at {}: {} listings from {} requests",
                summary.updated_at,
                summary.outcome.records,
                summary.requests
            );
        }
        Command::RefreshTradeCounts => {
            let client = MarketClient::new(config)?;
            let mut conn = open_database(&config.database_path)?;
            let outcome = refresh_trade_counts(&mut conn, &client)?;
            log::info!(
                "Trade counts refreshed: {} updated, {} without stats",
                outcome.updated,
                outcome.without_stats
            );
        }
        Command::Export => {
            let conn = open_database(&config.database_path)?;
            snapshot::export_snapshots(&conn, &store, config.timezone)?;
        }
        Command::Show { life, item } => {
            let kind = if *life {
                SnapshotKind::Life
            } else {
                SnapshotKind::Full
            };
            let raw = store.read_raw(kind)?;
            match item {
                Some(id) => {
                    let view = extract_for_item(&raw, *id)?;
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
                None => println!("{}", raw),
            }
        }
    }
    Ok(())
}

/// Open the database, creating its directory and schema when needed
fn open_database(path: &Path) -> craft_sync::Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| craft_sync::CraftError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
            log::info!("Created directory: {}", parent.display());
        }
    }

    let conn = Connection::open(path)?;
    log::info!("Opened database: {}", path.display());
    database::init_schema(&conn)?;
    Ok(conn)
}
