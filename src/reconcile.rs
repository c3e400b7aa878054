//! Price reconciliation
//!
//! Decides which stored materials and craft items a market listing updates.
//! Material matching is an explicit rule table so each rule can be tested on
//! its own; item matching depends on the category code alone.

use crate::catalog::{self, GATHERING_CODE_FLOOR};
use crate::database::{
    find_items_by_market_id, find_material_by_market_id, update_item_prices,
    update_material_prices,
};
use crate::error::{CraftError, Result};
use crate::models::{MarketItem, MarketSearchResponse};
use rusqlite::Connection;

/// Crystal marker; gathering listings carrying it are not materials
pub const CRYSTAL_MARKER: &str = "결정";
/// Shining marker; upgraded battle items are not materials
pub const SHINING_MARKER: &str = "빛나는";
/// The only recovery battle item tracked as a material
pub const PINNED_RECOVERY_MARKET_ID: i64 = 101063;

const UTILITY_MATERIALS: [&str; 3] = ["신호탄", "만능 물약", "성스러운 부적"];
const PHEROMONE_ESSENCE: &str = "페로몬 정수";
const BUFF_MATERIALS: [&str; 2] = ["신속 로브", "진군의 깃발"];

/// Which category codes a rule is evaluated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeScope {
    /// Every code, including ones outside the catalog
    Any,
    Exact(u32),
    /// Strictly greater than the bound
    Above(u32),
}

impl CodeScope {
    pub fn contains(&self, code: u32) -> bool {
        match *self {
            CodeScope::Any => true,
            CodeScope::Exact(c) => code == c,
            CodeScope::Above(floor) => code > floor,
        }
    }
}

/// One material inclusion rule
pub struct MaterialRule {
    pub name: &'static str,
    pub scope: CodeScope,
    pub accepts: fn(market_id: i64, market_name: &str) -> bool,
}

/// Material inclusion rules; a listing is a material if any rule holds.
///
/// The pheromone rule has no code restriction. The production condition
/// grouped `name == "페로몬 정수" && !shining` as its own disjunct, so it
/// holds for every category.
// TODO: confirm with the data owners whether pheromone essence should be limited to 60400.
pub const MATERIAL_RULES: &[MaterialRule] = &[
    MaterialRule {
        name: "gathering loot without crystals",
        scope: CodeScope::Above(GATHERING_CODE_FLOOR),
        accepts: |_, name| !name.contains(CRYSTAL_MARKER),
    },
    MaterialRule {
        name: "attack item, not shining",
        scope: CodeScope::Exact(60300),
        accepts: |_, name| !name.contains(SHINING_MARKER),
    },
    MaterialRule {
        name: "pinned recovery item",
        scope: CodeScope::Exact(60200),
        accepts: |market_id, _| market_id == PINNED_RECOVERY_MARKET_ID,
    },
    MaterialRule {
        name: "named utility item",
        scope: CodeScope::Exact(60400),
        accepts: |_, name| UTILITY_MATERIALS.contains(&name),
    },
    MaterialRule {
        name: "pheromone essence, not shining",
        scope: CodeScope::Any,
        accepts: |_, name| name == PHEROMONE_ESSENCE && !name.contains(SHINING_MARKER),
    },
    MaterialRule {
        name: "named buff item, not shining",
        scope: CodeScope::Exact(60500),
        accepts: |_, name| BUFF_MATERIALS.contains(&name) && !name.contains(SHINING_MARKER),
    },
];

/// First material rule matching the listing, if any
pub fn matching_material_rule(
    code: u32,
    market_id: i64,
    market_name: &str,
) -> Option<&'static MaterialRule> {
    MATERIAL_RULES
        .iter()
        .find(|rule| rule.scope.contains(code) && (rule.accepts)(market_id, market_name))
}

/// Whether a listing from category `code` updates a material
pub fn is_material_listing(code: u32, market_id: i64, market_name: &str) -> bool {
    matching_material_rule(code, market_id, market_name).is_some()
}

/// Whether listings from category `code` update craft items
pub fn is_item_category(code: u32) -> bool {
    code < GATHERING_CODE_FLOOR
}

/// What one reconcile call changed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Listings in the payload
    pub records: usize,
    pub materials_updated: usize,
    /// Craft item rows updated (several per listing when market ids repeat)
    pub items_updated: usize,
    pub materials_missing: usize,
    pub items_missing: usize,
}

impl ReconcileOutcome {
    pub fn absorb(&mut self, other: &ReconcileOutcome) {
        self.records += other.records;
        self.materials_updated += other.materials_updated;
        self.items_updated += other.items_updated;
        self.materials_missing += other.materials_missing;
        self.items_missing += other.items_missing;
    }
}

/// Apply one market search payload for category `code` to the store
///
/// A malformed payload fails the whole call. Listings with no stored
/// counterpart are logged and skipped.
pub fn reconcile_prices(conn: &Connection, payload: &str, code: u32) -> Result<ReconcileOutcome> {
    let malformed = |source: serde_json::Error| {
        log::error!("Failed to parse market payload for code {}: {}", code, payload);
        CraftError::MalformedPayload {
            code,
            payload: payload.to_string(),
            source,
        }
    };

    // Top-level arrays are rejected here, not read as a missing Items key
    let envelope: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(payload).map_err(&malformed)?;
    let response: MarketSearchResponse =
        serde_json::from_value(serde_json::Value::Object(envelope)).map_err(&malformed)?;

    let mut outcome = ReconcileOutcome::default();

    let Some(items) = response.items else {
        log::warn!("No Items in market response for code {} ({})", code, catalog::label(code));
        return Ok(outcome);
    };

    if items.is_empty() {
        log::warn!("Market response Items is empty for code {} ({})", code, catalog::label(code));
    }

    for item in &items {
        outcome.records += 1;
        apply_listing(conn, item, code, &mut outcome)?;
    }

    log::info!(
        "Reconciled code {}: {} listings, {} materials and {} items updated",
        code,
        outcome.records,
        outcome.materials_updated,
        outcome.items_updated
    );
    Ok(outcome)
}

fn apply_listing(
    conn: &Connection,
    item: &MarketItem,
    code: u32,
    outcome: &mut ReconcileOutcome,
) -> Result<()> {
    let prices = item.prices();

    if let Some(rule) = matching_material_rule(code, item.id, &item.name) {
        log::debug!("{} ({}) matched material rule: {}", item.name, item.id, rule.name);
        match find_material_by_market_id(conn, item.id)? {
            Some(material) => {
                update_material_prices(conn, material.id, &prices)?;
                outcome.materials_updated += 1;
            }
            None => {
                log::warn!(
                    "Material not found in catalog, skipping listing: {} ({})",
                    item.name,
                    item.id
                );
                outcome.materials_missing += 1;
                return Ok(());
            }
        }
    }

    if is_item_category(code) {
        let rows = find_items_by_market_id(conn, item.id)?;
        if rows.is_empty() {
            log::warn!(
                "Craft item not found in catalog, skipping listing: {} ({})",
                item.name,
                item.id
            );
            outcome.items_missing += 1;
            return Ok(());
        }
        for row in &rows {
            update_item_prices(conn, row.id, &prices)?;
        }
        outcome.items_updated += rows.len();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::*;
    use crate::database::{find_all_items, insert_item, insert_material};
    use crate::models::Prices;

    fn listing(id: i64, name: &str, prices: (f64, f64, f64)) -> serde_json::Value {
        serde_json::json!({
            "Id": id,
            "Name": name,
            "CurrentMinPrice": prices.0,
            "RecentPrice": prices.1,
            "YDayAvgPrice": prices.2,
        })
    }

    fn payload(items: Vec<serde_json::Value>) -> String {
        serde_json::json!({ "PageNo": 0, "TotalCount": items.len(), "Items": items }).to_string()
    }

    // ── material rules ────────────────────────────────────────────────────

    #[test]
    fn gathering_codes_match_unless_crystal() {
        for code in [90200, 90300, 90400, 90500, 90600, 90700, 90001] {
            assert!(is_material_listing(code, 1, "들꽃"));
            assert!(!is_material_listing(code, 1, "생명의 결정"));
        }
        assert!(!is_material_listing(90000, 1, "들꽃"));
    }

    #[test]
    fn attack_items_match_unless_shining() {
        assert!(is_material_listing(60300, 1, "화염 수류탄"));
        assert!(!is_material_listing(60300, 1, "빛나는 화염 수류탄"));
    }

    #[test]
    fn recovery_items_match_only_pinned_id() {
        assert!(is_material_listing(60200, PINNED_RECOVERY_MARKET_ID, "아무 이름"));
        assert!(is_material_listing(60200, PINNED_RECOVERY_MARKET_ID, "빛나는 회복약"));
        assert!(!is_material_listing(60200, 101062, "정령의 회복약"));
    }

    #[test]
    fn utility_items_match_named_set() {
        for name in UTILITY_MATERIALS {
            assert!(is_material_listing(60400, 1, name));
        }
        assert!(!is_material_listing(60400, 1, "시간 정지 물약"));
        assert!(!is_material_listing(60300, 1, "빛나는 신호탄"));
    }

    #[test]
    fn pheromone_rule_applies_to_every_code() {
        assert!(is_material_listing(60400, 1, PHEROMONE_ESSENCE));
        assert!(is_material_listing(70000, 1, PHEROMONE_ESSENCE));
        assert!(is_material_listing(50010, 1, PHEROMONE_ESSENCE));
        assert_eq!(
            matching_material_rule(70000, 1, PHEROMONE_ESSENCE).unwrap().scope,
            CodeScope::Any
        );
    }

    #[test]
    fn buff_items_match_named_set() {
        assert!(is_material_listing(60500, 1, "신속 로브"));
        assert!(is_material_listing(60500, 1, "진군의 깃발"));
        assert!(!is_material_listing(60500, 1, "각성 물약"));
        assert!(!is_material_listing(60400, 1, "신속 로브"));
    }

    #[test]
    fn other_codes_never_match() {
        assert!(!is_material_listing(50010, 1, "융화 재료"));
        assert!(!is_material_listing(70000, PINNED_RECOVERY_MARKET_ID, "거장의 특제 스튜"));
    }

    #[test]
    fn item_category_is_below_gathering_floor() {
        assert!(is_item_category(60200));
        assert!(is_item_category(70000));
        assert!(!is_item_category(90000));
        assert!(!is_item_category(90200));
    }

    // ── reconcile_prices ──────────────────────────────────────────────────

    #[test]
    fn pinned_recovery_listing_updates_material() {
        let conn = test_db();
        insert_material(&conn, &make_material(1, 101063, "정령의 회복약", 60200)).unwrap();
        insert_material(&conn, &make_material(2, 101062, "고급 회복약", 60200)).unwrap();

        let body = r#"{"Items":[{"Id":101063,"Name":"foo","CurrentMinPrice":10,"RecentPrice":12,"YDayAvgPrice":11}]}"#;
        reconcile_prices(&conn, body, 60200).unwrap();

        let pinned = find_material_by_market_id(&conn, 101063).unwrap().unwrap();
        assert_eq!(
            pinned.prices,
            Prices {
                current_min_price: 10.0,
                recent_price: 12.0,
                yday_avg_price: 11.0,
            }
        );
        let other = find_material_by_market_id(&conn, 101062).unwrap().unwrap();
        assert_eq!(other.prices, Prices::default());
    }

    #[test]
    fn item_listing_updates_every_row_with_market_id() {
        let conn = test_db();
        insert_item(&conn, &make_item(1, 555, "거장의 특제 스튜")).unwrap();
        insert_item(&conn, &make_item(2, 555, "거장의 특제 스튜")).unwrap();
        insert_item(&conn, &make_item(3, 556, "명인의 쫄깃한 꼬치구이")).unwrap();

        let body = payload(vec![listing(555, "거장의 특제 스튜", (40.0, 41.0, 42.0))]);
        let outcome = reconcile_prices(&conn, &body, 70000).unwrap();

        assert_eq!(outcome.items_updated, 2);
        let items = find_all_items(&conn).unwrap();
        assert_eq!(items[0].prices, items[1].prices);
        assert_eq!(items[0].prices.recent_price, 41.0);
        assert_eq!(items[2].prices, Prices::default());
    }

    #[test]
    fn listing_can_update_material_and_items() {
        let conn = test_db();
        insert_material(&conn, &make_material(1, 777, "화염 수류탄", 60300)).unwrap();
        insert_item(&conn, &make_item(1, 777, "화염 수류탄")).unwrap();

        let body = payload(vec![listing(777, "화염 수류탄", (3.0, 4.0, 5.0))]);
        let outcome = reconcile_prices(&conn, &body, 60300).unwrap();

        assert_eq!(outcome.materials_updated, 1);
        assert_eq!(outcome.items_updated, 1);
    }

    #[test]
    fn gathering_listing_never_updates_items() {
        let conn = test_db();
        insert_material(&conn, &make_material(1, 6882101, "들꽃", 90200)).unwrap();
        insert_item(&conn, &make_item(1, 6882101, "들꽃")).unwrap();

        let body = payload(vec![listing(6882101, "들꽃", (1.0, 1.0, 1.0))]);
        let outcome = reconcile_prices(&conn, &body, 90200).unwrap();

        assert_eq!(outcome.materials_updated, 1);
        assert_eq!(outcome.items_updated, 0);
        assert_eq!(find_all_items(&conn).unwrap()[0].prices, Prices::default());
    }

    #[test]
    fn missing_entities_are_skipped_not_fatal() {
        let conn = test_db();
        insert_material(&conn, &make_material(1, 2, "목재", 90300)).unwrap();

        let body = payload(vec![
            listing(1, "없는 재료", (1.0, 1.0, 1.0)),
            listing(2, "목재", (7.0, 8.0, 9.0)),
        ]);
        let outcome = reconcile_prices(&conn, &body, 90300).unwrap();

        assert_eq!(outcome.records, 2);
        assert_eq!(outcome.materials_missing, 1);
        assert_eq!(outcome.materials_updated, 1);
        let wood = find_material_by_market_id(&conn, 2).unwrap().unwrap();
        assert_eq!(wood.prices.current_min_price, 7.0);
    }

    #[test]
    fn missing_material_skips_item_update_for_that_listing() {
        let conn = test_db();
        insert_item(&conn, &make_item(1, 777, "화염 수류탄")).unwrap();

        let body = payload(vec![listing(777, "화염 수류탄", (3.0, 4.0, 5.0))]);
        let outcome = reconcile_prices(&conn, &body, 60300).unwrap();

        assert_eq!(outcome.materials_missing, 1);
        assert_eq!(outcome.items_updated, 0);
    }

    #[test]
    fn craft_item_missing_is_counted() {
        let conn = test_db();
        let body = payload(vec![listing(555, "거장의 특제 스튜", (1.0, 1.0, 1.0))]);
        let outcome = reconcile_prices(&conn, &body, 70000).unwrap();
        assert_eq!(outcome.items_missing, 1);
    }

    #[test]
    fn empty_items_writes_nothing() {
        let conn = test_db();
        insert_material(&conn, &make_material(1, 2, "목재", 90300)).unwrap();

        let outcome = reconcile_prices(&conn, r#"{"Items":[]}"#, 90300).unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
    }

    #[test]
    fn missing_items_key_writes_nothing() {
        let conn = test_db();
        let outcome =
            reconcile_prices(&conn, r#"{"Code":1,"Message":"limit"}"#, 90300).unwrap();
        assert_eq!(outcome, ReconcileOutcome::default());
    }

    #[test]
    fn malformed_payload_is_data_error() {
        let conn = test_db();

        for body in [
            "<html>Too Many Requests</html>",
            r#"{"Items":[{"Id":1,"Name":"x"}]}"#,
            r#"{"Items":{"Id":1}}"#,
            "[]",
            "[null]",
            "[[]]",
            "null",
        ] {
            match reconcile_prices(&conn, body, 90200) {
                Err(CraftError::MalformedPayload { code, payload, .. }) => {
                    assert_eq!(code, 90200);
                    assert_eq!(payload, body);
                }
                other => panic!("Expected MalformedPayload for {body}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn outcome_absorb_sums_counts() {
        let mut total = ReconcileOutcome::default();
        let one = ReconcileOutcome {
            records: 2,
            materials_updated: 1,
            items_updated: 3,
            materials_missing: 1,
            items_missing: 0,
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.records, 4);
        assert_eq!(total.items_updated, 6);
    }
}
