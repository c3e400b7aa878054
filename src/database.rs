//! Database operations for the craft catalog
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Functions take a `&Connection` so they work the same inside a
//! `Transaction`, which derefs to one.

use crate::models::{CraftItem, CraftMaterial, CraftRecipe, Prices, RecipeMaterial};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `craft_materials`: raw materials, one row per market id
/// - `craft_items`: crafted goods, market id may repeat
/// - `craft_recipes` / `craft_recipe_materials`: item ↔ material links
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS craft_materials (
            id INTEGER PRIMARY KEY,
            market_id INTEGER NOT NULL UNIQUE,
            market_name TEXT NOT NULL,
            sub_code INTEGER NOT NULL,
            current_min_price REAL NOT NULL DEFAULT 0,
            recent_price REAL NOT NULL DEFAULT 0,
            yday_avg_price REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_craft_materials_sub_code ON craft_materials(sub_code);

        CREATE TABLE IF NOT EXISTS craft_items (
            id INTEGER PRIMARY KEY,
            market_id INTEGER NOT NULL,
            market_name TEXT NOT NULL,
            current_min_price REAL NOT NULL DEFAULT 0,
            recent_price REAL NOT NULL DEFAULT 0,
            yday_avg_price REAL NOT NULL DEFAULT 0,
            trade_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_craft_items_market_id ON craft_items(market_id);

        CREATE TABLE IF NOT EXISTS craft_recipes (
            id INTEGER PRIMARY KEY,
            craft_item_id INTEGER NOT NULL,
            FOREIGN KEY (craft_item_id) REFERENCES craft_items(id)
        );

        -- position keeps the material order of a recipe stable
        CREATE TABLE IF NOT EXISTS craft_recipe_materials (
            recipe_id INTEGER NOT NULL,
            material_id INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            position INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, position),
            FOREIGN KEY (recipe_id) REFERENCES craft_recipes(id),
            FOREIGN KEY (material_id) REFERENCES craft_materials(id)
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

const MATERIAL_COLUMNS: &str =
    "id, market_id, market_name, sub_code, current_min_price, recent_price, yday_avg_price";

const ITEM_COLUMNS: &str =
    "id, market_id, market_name, current_min_price, recent_price, yday_avg_price, trade_count";

fn material_from_row(row: &Row<'_>) -> DbResult<CraftMaterial> {
    Ok(CraftMaterial {
        id: row.get(0)?,
        market_id: row.get(1)?,
        market_name: row.get(2)?,
        sub_code: row.get(3)?,
        prices: Prices {
            current_min_price: row.get(4)?,
            recent_price: row.get(5)?,
            yday_avg_price: row.get(6)?,
        },
    })
}

fn item_from_row(row: &Row<'_>) -> DbResult<CraftItem> {
    Ok(CraftItem {
        id: row.get(0)?,
        market_id: row.get(1)?,
        market_name: row.get(2)?,
        prices: Prices {
            current_min_price: row.get(3)?,
            recent_price: row.get(4)?,
            yday_avg_price: row.get(5)?,
        },
        trade_count: row.get(6)?,
    })
}

// ── Lookups ────────────────────────────────────────────────────────────────

/// Find the material with this market id (market ids are unique for materials)
pub fn find_material_by_market_id(
    conn: &Connection,
    market_id: i64,
) -> DbResult<Option<CraftMaterial>> {
    let sql = format!("SELECT {MATERIAL_COLUMNS} FROM craft_materials WHERE market_id = ?1");
    conn.query_row(&sql, params![market_id], material_from_row)
        .optional()
}

/// All materials of one subcode, ordered by id
pub fn find_materials_by_sub_code(conn: &Connection, sub_code: u32) -> DbResult<Vec<CraftMaterial>> {
    let sql =
        format!("SELECT {MATERIAL_COLUMNS} FROM craft_materials WHERE sub_code = ?1 ORDER BY id");
    let mut stmt = conn.prepare_cached(&sql)?;
    let results: DbResult<Vec<CraftMaterial>> = stmt
        .query_map(params![sub_code], material_from_row)?
        .collect();
    results
}

/// Every craft item row sharing this market id
pub fn find_items_by_market_id(conn: &Connection, market_id: i64) -> DbResult<Vec<CraftItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM craft_items WHERE market_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare_cached(&sql)?;
    let results: DbResult<Vec<CraftItem>> =
        stmt.query_map(params![market_id], item_from_row)?.collect();
    results
}

/// Every craft item row, ordered by id
pub fn find_all_items(conn: &Connection) -> DbResult<Vec<CraftItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM craft_items ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let results: DbResult<Vec<CraftItem>> = stmt.query_map([], item_from_row)?.collect();
    results
}

/// Every recipe with its linked item and materials
pub fn find_all_recipes(conn: &Connection) -> DbResult<Vec<CraftRecipe>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, i.id, i.market_id, i.market_name, i.current_min_price,
                i.recent_price, i.yday_avg_price, i.trade_count
         FROM craft_recipes r
         JOIN craft_items i ON i.id = r.craft_item_id
         ORDER BY r.id",
    )?;

    let heads: DbResult<Vec<(i64, CraftItem)>> = stmt
        .query_map([], |row| {
            let recipe_id: i64 = row.get(0)?;
            let item = CraftItem {
                id: row.get(1)?,
                market_id: row.get(2)?,
                market_name: row.get(3)?,
                prices: Prices {
                    current_min_price: row.get(4)?,
                    recent_price: row.get(5)?,
                    yday_avg_price: row.get(6)?,
                },
                trade_count: row.get(7)?,
            };
            Ok((recipe_id, item))
        })?
        .collect();

    let mut materials_stmt = conn.prepare_cached(
        "SELECT m.id, m.market_id, m.market_name, m.sub_code, m.current_min_price,
                m.recent_price, m.yday_avg_price, rm.quantity
         FROM craft_recipe_materials rm
         JOIN craft_materials m ON m.id = rm.material_id
         WHERE rm.recipe_id = ?1
         ORDER BY rm.position",
    )?;

    let mut recipes = Vec::new();
    for (id, item) in heads? {
        let materials: DbResult<Vec<RecipeMaterial>> = materials_stmt
            .query_map(params![id], |row| {
                Ok(RecipeMaterial {
                    material: material_from_row(row)?,
                    quantity: row.get(7)?,
                })
            })?
            .collect();
        recipes.push(CraftRecipe {
            id,
            item,
            materials: materials?,
        });
    }
    Ok(recipes)
}

// ── Updates ────────────────────────────────────────────────────────────────

/// Overwrite the price triple of one material; returns rows changed
pub fn update_material_prices(conn: &Connection, material_id: i64, prices: &Prices) -> DbResult<usize> {
    conn.execute(
        "UPDATE craft_materials
         SET current_min_price = ?2, recent_price = ?3, yday_avg_price = ?4,
             updated_at = datetime('now')
         WHERE id = ?1",
        params![
            material_id,
            prices.current_min_price,
            prices.recent_price,
            prices.yday_avg_price
        ],
    )
}

/// Overwrite the price triple of one craft item row; returns rows changed
pub fn update_item_prices(conn: &Connection, item_id: i64, prices: &Prices) -> DbResult<usize> {
    conn.execute(
        "UPDATE craft_items
         SET current_min_price = ?2, recent_price = ?3, yday_avg_price = ?4,
             updated_at = datetime('now')
         WHERE id = ?1",
        params![
            item_id,
            prices.current_min_price,
            prices.recent_price,
            prices.yday_avg_price
        ],
    )
}

/// Overwrite the trade counter of one craft item row
pub fn update_trade_count(conn: &Connection, item_id: i64, trade_count: i64) -> DbResult<usize> {
    conn.execute(
        "UPDATE craft_items SET trade_count = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![item_id, trade_count],
    )
}

// ── Seeding ────────────────────────────────────────────────────────────────

/// Insert a material row, or update the row with the same id
///
/// A market id already held by another row is a constraint error.
pub fn insert_material(conn: &Connection, material: &CraftMaterial) -> DbResult<()> {
    conn.execute(
        "INSERT INTO craft_materials
         (id, market_id, market_name, sub_code, current_min_price, recent_price, yday_avg_price)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            market_id = excluded.market_id,
            market_name = excluded.market_name,
            sub_code = excluded.sub_code,
            current_min_price = excluded.current_min_price,
            recent_price = excluded.recent_price,
            yday_avg_price = excluded.yday_avg_price",
        params![
            material.id,
            material.market_id,
            &material.market_name,
            material.sub_code,
            material.prices.current_min_price,
            material.prices.recent_price,
            material.prices.yday_avg_price,
        ],
    )?;
    Ok(())
}

/// Insert a craft item row, or update the row with the same id
pub fn insert_item(conn: &Connection, item: &CraftItem) -> DbResult<()> {
    conn.execute(
        "INSERT INTO craft_items
         (id, market_id, market_name, current_min_price, recent_price, yday_avg_price, trade_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            market_id = excluded.market_id,
            market_name = excluded.market_name,
            current_min_price = excluded.current_min_price,
            recent_price = excluded.recent_price,
            yday_avg_price = excluded.yday_avg_price,
            trade_count = excluded.trade_count",
        params![
            item.id,
            item.market_id,
            &item.market_name,
            item.prices.current_min_price,
            item.prices.recent_price,
            item.prices.yday_avg_price,
            item.trade_count,
        ],
    )?;
    Ok(())
}

/// Recipe as written in a catalog seed file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSeed {
    pub id: i64,
    pub craft_item_id: i64,
    pub materials: Vec<RecipeMaterialSeed>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeMaterialSeed {
    pub material_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Insert or replace a recipe and its material links (links keep seed order)
pub fn insert_recipe(conn: &Connection, recipe: &RecipeSeed) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO craft_recipes (id, craft_item_id) VALUES (?1, ?2)",
        params![recipe.id, recipe.craft_item_id],
    )?;
    conn.execute(
        "DELETE FROM craft_recipe_materials WHERE recipe_id = ?1",
        params![recipe.id],
    )?;

    let mut stmt = conn.prepare_cached(
        "INSERT INTO craft_recipe_materials (recipe_id, material_id, quantity, position)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, link) in recipe.materials.iter().enumerate() {
        stmt.execute(params![
            recipe.id,
            link.material_id,
            link.quantity,
            position as i64
        ])?;
    }
    Ok(())
}

/// Catalog seed document: materials, items and recipes to load
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub materials: Vec<CraftMaterial>,
    pub items: Vec<CraftItem>,
    pub recipes: Vec<RecipeSeed>,
}

/// Counts of rows written by [`import_catalog`]
#[derive(Debug, PartialEq, Eq)]
pub struct ImportResult {
    pub materials: usize,
    pub items: usize,
    pub recipes: usize,
}

/// Load a catalog seed in one transaction
pub fn import_catalog(conn: &mut Connection, seed: &CatalogSeed) -> DbResult<ImportResult> {
    let tx = conn.transaction()?;
    for material in &seed.materials {
        insert_material(&tx, material)?;
    }
    for item in &seed.items {
        insert_item(&tx, item)?;
    }
    for recipe in &seed.recipes {
        insert_recipe(&tx, recipe)?;
    }
    tx.commit()?;

    let result = ImportResult {
        materials: seed.materials.len(),
        items: seed.items.len(),
        recipes: seed.recipes.len(),
    };
    log::info!(
        "Imported {} materials, {} items, {} recipes",
        result.materials,
        result.items,
        result.recipes
    );
    Ok(result)
}

/// Get total count of craft item rows
pub fn get_item_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM craft_items", [], |row| row.get(0))
}

/// Get total count of material rows
pub fn get_material_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM craft_materials", [], |row| row.get(0))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Create an in-memory database for testing
    pub fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    pub fn make_material(id: i64, market_id: i64, name: &str, sub_code: u32) -> CraftMaterial {
        CraftMaterial {
            id,
            market_id,
            market_name: name.to_string(),
            sub_code,
            prices: Prices::default(),
        }
    }

    pub fn make_item(id: i64, market_id: i64, name: &str) -> CraftItem {
        CraftItem {
            id,
            market_id,
            market_name: name.to_string(),
            prices: Prices::default(),
            trade_count: 0,
        }
    }

    pub fn make_recipe(id: i64, craft_item_id: i64, materials: &[(i64, i64)]) -> RecipeSeed {
        RecipeSeed {
            id,
            craft_item_id,
            materials: materials
                .iter()
                .map(|&(material_id, quantity)| RecipeMaterialSeed {
                    material_id,
                    quantity,
                })
                .collect(),
        }
    }
}
