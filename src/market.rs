//! Lost Ark market API client
//!
//! Blocking reqwest client; every call runs to completion before the next
//! one starts. Returns raw response bodies, interpretation is left to the
//! reconciler and the trade count refresher.

use crate::catalog::ItemFilter;
use crate::config::Config;
use crate::error::{CraftError, Result};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://developer-lostark.game.onstove.com";

/// Request body for `POST /markets/items`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketSearchRequest<'a> {
    pub sort: &'static str,
    pub category_code: u32,
    pub character_class: Option<&'a str>,
    pub item_tier: Option<u32>,
    pub item_grade: Option<&'a str>,
    pub item_name: Option<&'a str>,
    pub page_no: u32,
    pub sort_condition: &'static str,
}

impl<'a> MarketSearchRequest<'a> {
    /// First page of a category, sorted by grade ascending
    pub fn new(category_code: u32, filter: &ItemFilter) -> Self {
        Self {
            sort: "GRADE",
            category_code,
            character_class: None,
            item_tier: None,
            item_grade: None,
            item_name: filter.item_name(),
            page_no: 0,
            sort_condition: "ASC",
        }
    }
}

/// Structured error body the API sends with non-success statuses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketApiError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for the market listing and per-item stats endpoints
pub struct MarketClient {
    client: Client,
    base_url: String,
    market_token: Option<String>,
    stats_token: Option<String>,
}

impl MarketClient {
    /// Build a client from configuration
    ///
    /// Tokens are checked per call: searches need the market token, stats
    /// lookups the stats token.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("craft_sync/1.0")
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            market_token: config.market_token.clone(),
            stats_token: config.stats_token.clone(),
        })
    }

    /// Search one category with one item-name filter; returns the raw body
    pub fn search_items(&self, code: u32, filter: &ItemFilter) -> Result<String> {
        let token = self
            .market_token
            .as_deref()
            .ok_or(CraftError::MissingToken("market"))?;
        let url = format!("{}/markets/items", self.base_url);
        let body = MarketSearchRequest::new(code, filter);

        log::debug!("Searching market: code={} filter={:?}", code, filter);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("bearer {}", token))
            .header("Accept", "application/json")
            .json(&body)
            .send()?;

        read_body(response)
    }

    /// Recent trade statistics for one market id; returns the raw body
    pub fn item_stats(&self, market_id: i64) -> Result<String> {
        let token = self
            .stats_token
            .as_deref()
            .ok_or(CraftError::MissingToken("stats"))?;
        let url = format!("{}/markets/items/{}", self.base_url, market_id);

        log::debug!("Fetching item stats: {}", market_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("bearer {}", token))
            .header("Accept", "application/json")
            .send()?;

        read_body(response)
    }
}

/// Return the body on success; otherwise decode it as the API error payload
fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let text = response.text()?;

    if status.is_success() {
        return Ok(text);
    }

    let message = match serde_json::from_str::<MarketApiError>(&text) {
        Ok(MarketApiError {
            message: Some(message),
            ..
        }) => message,
        _ if text.is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        _ => text,
    };

    log::error!("Market API returned {}: {}", status, message);
    Err(CraftError::Api { status, message })
}

#[cfg(test)]
#[path = "market_tests.rs"]
mod tests;
