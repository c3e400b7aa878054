//! Price sync job: search every catalog category, reconcile, then export
//! snapshots.

use crate::catalog;
use crate::error::Result;
use crate::market::MarketClient;
use crate::reconcile::{reconcile_prices, ReconcileOutcome};
use crate::snapshot::{export_snapshots, SnapshotStore};
use chrono_tz::Tz;
use rusqlite::Connection;

/// Result of a completed price sync
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// Market searches issued
    pub requests: usize,
    pub outcome: ReconcileOutcome,
    /// Timestamp written into both snapshots
    pub updated_at: String,
}

/// Run one full price sync
///
/// All price writes share one transaction; the first failed search or
/// malformed payload aborts the run and leaves stored prices untouched.
/// Snapshots are exported after the commit.
pub fn sync_prices(
    conn: &mut Connection,
    client: &MarketClient,
    store: &SnapshotStore,
    timezone: Option<Tz>,
) -> Result<SyncSummary> {
    let tx = conn.transaction()?;
    let mut outcome = ReconcileOutcome::default();
    let mut requests = 0;

    for (code, filter) in catalog::search_plan() {
        log::info!(
            "Fetching market prices: {} ({}) {:?}",
            code,
            catalog::label(code),
            filter
        );
        let payload = client.search_items(code, &filter).map_err(|e| {
            log::error!("Market search failed for code {}: {}", code, e);
            e
        })?;
        requests += 1;

        let result = reconcile_prices(&tx, &payload, code)?;
        outcome.absorb(&result);
    }

    tx.commit()?;
    log::info!(
        "Price sync committed: {} requests, {} materials and {} items updated ({} materials, {} items not in catalog)",
        requests,
        outcome.materials_updated,
        outcome.items_updated,
        outcome.materials_missing,
        outcome.items_missing
    );

    let snapshots = export_snapshots(conn, store, timezone)?;

    Ok(SyncSummary {
        requests,
        outcome,
        updated_at: snapshots.full.updated_at,
    })
}
