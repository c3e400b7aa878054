//! Craft Sync - Lost Ark craft price database
//!
//! Pulls market prices for craftable items and their materials into a
//! SQLite catalog, refreshes trade counts, and exports JSON snapshots for
//! downstream consumers.

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod market;
pub mod models;
pub mod reconcile;
pub mod snapshot;
pub mod sync;
pub mod trade_count;

pub use config::Config;
pub use error::{CraftError, ErrorKind, Result};
pub use market::MarketClient;
pub use reconcile::{reconcile_prices, ReconcileOutcome};
pub use snapshot::{extract_for_item, parse_generic, SnapshotKind, SnapshotStore};
pub use sync::{sync_prices, SyncSummary};
pub use trade_count::{refresh_trade_counts, RefreshOutcome};
