//! Domain types: stored catalog entities, market payloads and snapshot documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Market price triple, always written as a unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prices {
    pub current_min_price: f64,
    pub recent_price: f64,
    pub yday_avg_price: f64,
}

/// Raw crafting material, unique per market id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftMaterial {
    pub id: i64,
    pub market_id: i64,
    pub market_name: String,
    pub sub_code: u32,
    #[serde(flatten)]
    pub prices: Prices,
}

/// Crafted item; several rows may share one market id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftItem {
    pub id: i64,
    pub market_id: i64,
    pub market_name: String,
    #[serde(flatten)]
    pub prices: Prices,
    #[serde(default)]
    pub trade_count: i64,
}

/// A material consumed by a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeMaterial {
    pub material: CraftMaterial,
    pub quantity: i64,
}

/// Recipe with its linked item and materials, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct CraftRecipe {
    pub id: i64,
    pub item: CraftItem,
    pub materials: Vec<RecipeMaterial>,
}

// ── Market API payloads ────────────────────────────────────────────────────

/// One listing from `POST /markets/items`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketItem {
    pub id: i64,
    pub name: String,
    pub current_min_price: f64,
    pub recent_price: f64,
    #[serde(rename = "YDayAvgPrice")]
    pub yday_avg_price: f64,
}

impl MarketItem {
    pub fn prices(&self) -> Prices {
        Prices {
            current_min_price: self.current_min_price,
            recent_price: self.recent_price,
            yday_avg_price: self.yday_avg_price,
        }
    }
}

/// Market search envelope; `Items` may be absent on empty or error answers
#[derive(Debug, Deserialize)]
pub struct MarketSearchResponse {
    #[serde(rename = "Items", default)]
    pub items: Option<Vec<MarketItem>>,
}

// ── Snapshot documents ─────────────────────────────────────────────────────

/// Material price row as exported in snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPrice {
    pub market_id: i64,
    pub market_name: String,
    pub sub_code: u32,
    #[serde(flatten)]
    pub prices: Prices,
}

impl From<&CraftMaterial> for MaterialPrice {
    fn from(material: &CraftMaterial) -> Self {
        Self {
            market_id: material.market_id,
            market_name: material.market_name.clone(),
            sub_code: material.sub_code,
            prices: material.prices,
        }
    }
}

/// Recipe material as embedded in a recipe entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMaterialEntry {
    pub market_id: i64,
    pub market_name: String,
    pub sub_code: u32,
    pub quantity: i64,
    #[serde(flatten)]
    pub prices: Prices,
}

/// Craft item entry of the full snapshot; `id` is the craft item id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeEntry {
    pub id: i64,
    pub recipe_id: i64,
    pub market_id: i64,
    pub market_name: String,
    #[serde(flatten)]
    pub prices: Prices,
    pub trade_count: i64,
    pub craft_materials: Vec<RecipeMaterialEntry>,
}

impl From<&CraftRecipe> for RecipeEntry {
    fn from(recipe: &CraftRecipe) -> Self {
        Self {
            id: recipe.item.id,
            recipe_id: recipe.id,
            market_id: recipe.item.market_id,
            market_name: recipe.item.market_name.clone(),
            prices: recipe.item.prices,
            trade_count: recipe.item.trade_count,
            craft_materials: recipe
                .materials
                .iter()
                .map(|rm| RecipeMaterialEntry {
                    market_id: rm.material.market_id,
                    market_name: rm.material.market_name.clone(),
                    sub_code: rm.material.sub_code,
                    quantity: rm.quantity,
                    prices: rm.material.prices,
                })
                .collect(),
        }
    }
}

/// Subcode (as string key) → material prices
pub type MaterialsByCode = BTreeMap<String, Vec<MaterialPrice>>;

/// Full snapshot: every recipe plus material prices for all exported subcodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftSnapshot {
    #[serde(rename = "갱신시간")]
    pub updated_at: String,
    #[serde(rename = "craftItemList")]
    pub items: Vec<RecipeEntry>,
    #[serde(rename = "제작재료시세")]
    pub materials_by_code: MaterialsByCode,
}

/// Reduced snapshot with gathering material prices only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeSnapshot {
    #[serde(rename = "갱신시간")]
    pub updated_at: String,
    #[serde(rename = "생활재료 시세")]
    pub materials_by_code: MaterialsByCode,
}

/// Per-item view extracted from a full snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    #[serde(rename = "갱신시간")]
    pub updated_at: String,
    #[serde(rename = "제작아이템")]
    pub item: RecipeEntry,
    #[serde(rename = "제작재료시세")]
    pub materials_by_code: MaterialsByCode,
}
