//! Snapshot export and read-back
//!
//! Builds the full craft snapshot and the life-material snapshot from the
//! database, writes them to their configured files, and extracts per-item
//! views from a stored full snapshot.

use crate::catalog::{FULL_SNAPSHOT_SUBCODES, LIFE_SNAPSHOT_SUBCODES};
use crate::database::{find_all_recipes, find_materials_by_sub_code};
use crate::error::{CraftError, Result};
use crate::models::{
    CraftSnapshot, ItemSnapshot, LifeSnapshot, MaterialPrice, MaterialsByCode, RecipeEntry,
};
use chrono::{Local, Utc};
use chrono_tz::Tz;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

/// Timestamp format used in snapshot documents
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which stored snapshot to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Full,
    Life,
}

/// Both documents produced by one export
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshots {
    pub full: CraftSnapshot,
    pub life: LifeSnapshot,
}

/// Current time as a snapshot timestamp, local or in the given zone
pub fn current_timestamp(timezone: Option<Tz>) -> String {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string(),
        None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Material prices for each subcode; every subcode gets a key even when empty
pub fn materials_by_code(conn: &Connection, sub_codes: &[u32]) -> Result<MaterialsByCode> {
    let mut map = MaterialsByCode::new();
    for &sub_code in sub_codes {
        let prices: Vec<MaterialPrice> = find_materials_by_sub_code(conn, sub_code)?
            .iter()
            .map(MaterialPrice::from)
            .collect();
        map.insert(sub_code.to_string(), prices);
    }
    Ok(map)
}

/// Assemble both snapshot documents from the current database state
pub fn build_snapshots(conn: &Connection, updated_at: &str) -> Result<Snapshots> {
    let items: Vec<RecipeEntry> = find_all_recipes(conn)?
        .iter()
        .map(RecipeEntry::from)
        .collect();

    let full = CraftSnapshot {
        updated_at: updated_at.to_string(),
        items,
        materials_by_code: materials_by_code(conn, &FULL_SNAPSHOT_SUBCODES)?,
    };
    let life = LifeSnapshot {
        updated_at: updated_at.to_string(),
        materials_by_code: materials_by_code(conn, &LIFE_SNAPSHOT_SUBCODES)?,
    };

    Ok(Snapshots { full, life })
}

/// Build both snapshots and write them to the store
pub fn export_snapshots(
    conn: &Connection,
    store: &SnapshotStore,
    timezone: Option<Tz>,
) -> Result<Snapshots> {
    let updated_at = current_timestamp(timezone);
    let snapshots = build_snapshots(conn, &updated_at)?;

    store.write_raw(
        SnapshotKind::Full,
        &serde_json::to_string_pretty(&snapshots.full)?,
    )?;
    store.write_raw(
        SnapshotKind::Life,
        &serde_json::to_string_pretty(&snapshots.life)?,
    )?;

    log::info!(
        "Exported snapshots at {} ({} recipes)",
        updated_at,
        snapshots.full.items.len()
    );
    Ok(snapshots)
}

/// The two snapshot files
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    full_path: PathBuf,
    life_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(full_path: impl Into<PathBuf>, life_path: impl Into<PathBuf>) -> Self {
        Self {
            full_path: full_path.into(),
            life_path: life_path.into(),
        }
    }

    pub fn path(&self, kind: SnapshotKind) -> &Path {
        match kind {
            SnapshotKind::Full => &self.full_path,
            SnapshotKind::Life => &self.life_path,
        }
    }

    /// Raw stored document
    pub fn read_raw(&self, kind: SnapshotKind) -> Result<String> {
        let path = self.path(kind);
        fs::read_to_string(path).map_err(|e| CraftError::io(path, e))
    }

    /// Replace the stored document
    ///
    /// Writes a sibling temp file and renames it over the target, so readers
    /// see either the old or the new document.
    pub fn write_raw(&self, kind: SnapshotKind, contents: &str) -> Result<()> {
        let path = self.path(kind);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| CraftError::io(parent, e))?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, contents).map_err(|e| CraftError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| CraftError::io(path, e))?;

        log::debug!("Wrote {:?} snapshot to {}", kind, path.display());
        Ok(())
    }
}

/// Parse a snapshot without schema validation
pub fn parse_generic(doc: &str) -> Result<serde_json::Value> {
    Ok(serde_json::from_str(doc)?)
}

/// Reduce a full snapshot to one craft item and the material subcodes it uses
pub fn extract_for_item(doc: &str, craft_item_id: i64) -> Result<ItemSnapshot> {
    let snapshot: CraftSnapshot = serde_json::from_str(doc)?;

    let item = snapshot
        .items
        .into_iter()
        .find(|entry| entry.id == craft_item_id)
        .ok_or(CraftError::ItemNotFound(craft_item_id))?;

    let mut sub_codes: Vec<u32> = Vec::new();
    for material in &item.craft_materials {
        if !sub_codes.contains(&material.sub_code) {
            sub_codes.push(material.sub_code);
        }
    }

    let mut table = snapshot.materials_by_code;
    let materials_by_code = sub_codes
        .iter()
        .map(|code| {
            let key = code.to_string();
            let prices = table.remove(&key).unwrap_or_default();
            (key, prices)
        })
        .collect();

    Ok(ItemSnapshot {
        updated_at: snapshot.updated_at,
        item,
        materials_by_code,
    })
}
