//! Trade count refresh
//!
//! For every stored craft item, reads yesterday's trade count from the
//! market stats endpoint. The first failure stops the loop and rolls back
//! the counters written so far.

use crate::database::{find_all_items, update_trade_count};
use crate::error::{CraftError, Result};
use crate::market::MarketClient;
use rusqlite::Connection;
use serde_json::Value;

/// What one refresh run changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Item rows visited
    pub items: usize,
    pub updated: usize,
    /// Rows whose stats carried no usable trade count
    pub without_stats: usize,
}

/// Trade count from a stats payload: the second stats entry of the first period
///
/// `Ok(None)` when the payload has no period, fewer than two entries, or no
/// integer `TradeCount` on the second entry. Other fields and later periods
/// are not inspected.
pub fn parse_trade_count(payload: &str) -> serde_json::Result<Option<i64>> {
    let periods: Vec<Value> = serde_json::from_str(payload)?;

    Ok(periods
        .first()
        .and_then(|period| period.get("Stats"))
        .and_then(|stats| stats.get(1))
        .and_then(|stat| stat.get("TradeCount"))
        .and_then(Value::as_i64))
}

/// Refresh `trade_count` on every craft item row
///
/// Rows sharing a market id are fetched once per row.
pub fn refresh_trade_counts(conn: &mut Connection, client: &MarketClient) -> Result<RefreshOutcome> {
    let tx = conn.transaction()?;
    let items = find_all_items(&tx)?;
    let mut outcome = RefreshOutcome::default();

    log::info!("Refreshing trade counts for {} items", items.len());

    for item in &items {
        outcome.items += 1;
        log::info!("Refreshing trade count: {} ({})", item.market_name, item.market_id);

        let trade_count = client
            .item_stats(item.market_id)
            .and_then(|payload| {
                log::debug!("Stats response for {}: {}", item.market_id, payload);
                parse_trade_count(&payload).map_err(CraftError::from)
            })
            .map_err(|source| {
                log::error!("Trade count refresh failed at item {:?}: {}", item, source);
                CraftError::Refresh {
                    market_id: item.market_id,
                    source: Box::new(source),
                }
            })?;

        match trade_count {
            Some(count) => {
                update_trade_count(&tx, item.id, count)?;
                log::info!("Market id {}: trade count {}", item.market_id, count);
                outcome.updated += 1;
            }
            None => {
                log::warn!("No trade stats for item: {} ({})", item.market_name, item.market_id);
                outcome.without_stats += 1;
            }
        }
    }

    tx.commit()?;
    log::info!(
        "Trade count refresh done: {} of {} items updated",
        outcome.updated,
        outcome.items
    );
    Ok(outcome)
}
