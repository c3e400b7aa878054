//! Market category catalog
//!
//! Which Lost Ark market categories are queried, and with which item-name
//! filters. The table is fixed configuration; it is never mutated at runtime.

/// Item-name constraint sent with a market search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    /// Query the whole category (`ItemName: null`)
    All,
    /// Query only items whose name matches this string
    Named(&'static str),
}

impl ItemFilter {
    /// Value for the request's `ItemName` field
    pub fn item_name(&self) -> Option<&'static str> {
        match self {
            ItemFilter::All => None,
            ItemFilter::Named(name) => Some(name),
        }
    }
}

/// One market category and the searches issued for it
#[derive(Debug)]
pub struct Category {
    pub code: u32,
    pub label: &'static str,
    pub filters: &'static [ItemFilter],
}

use ItemFilter::{All, Named};

/// Every category searched during a price sync, ascending by code
pub const CATEGORIES: &[Category] = &[
    Category {
        code: 50010,
        label: "융화 재료",
        filters: &[Named("융화 재료")],
    },
    Category {
        code: 60200,
        label: "회복형 배틀 아이템",
        filters: &[All],
    },
    Category {
        code: 60300,
        label: "공격형 배틀 아이템",
        filters: &[
            Named("점토"),
            Named("화염"),
            Named("암흑"),
            Named("회오리"),
            Named("폭탄"),
        ],
    },
    Category {
        code: 60400,
        label: "기능형 배틀 아이템",
        filters: &[Named("만능"), Named("시간"), Named("성스러운")],
    },
    Category {
        code: 60500,
        label: "버프형 배틀 아이템",
        filters: &[
            Named("신속 로브"),
            Named("진군"),
            Named("각성"),
            Named("아드로핀"),
        ],
    },
    Category {
        code: 70000,
        label: "요리",
        filters: &[
            Named("거장의 채끝 스테이크 정식"),
            Named("대가의 안심 스테이크 정식"),
            Named("명인의 허브 스테이크 정식"),
            Named("거장의 특제 스튜"),
            Named("명인의 쫄깃한 꼬치구이"),
        ],
    },
    Category {
        code: 90200,
        label: "식물채집 전리품",
        filters: &[All],
    },
    Category {
        code: 90300,
        label: "벌목 전리품",
        filters: &[All],
    },
    Category {
        code: 90400,
        label: "채광 전리품",
        filters: &[All],
    },
    Category {
        code: 90500,
        label: "수렵 전리품",
        filters: &[All],
    },
    Category {
        code: 90600,
        label: "낚시 전리품",
        filters: &[All],
    },
    Category {
        code: 90700,
        label: "고고학 전리품",
        filters: &[All],
    },
];

/// Material subcodes exported in the full snapshot
pub const FULL_SNAPSHOT_SUBCODES: [u32; 10] = [
    60200, 60300, 60400, 60500, 90200, 90300, 90400, 90500, 90600, 90700,
];

/// Gathering ("life") subcodes exported in the reduced snapshot
pub const LIFE_SNAPSHOT_SUBCODES: [u32; 6] = [90200, 90300, 90400, 90500, 90600, 90700];

/// Codes above this belong to the gathering family
pub const GATHERING_CODE_FLOOR: u32 = 90000;

/// Look up a category by its market code
pub fn category(code: u32) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.code == code)
}

/// Human-readable label for log lines
pub fn label(code: u32) -> &'static str {
    category(code).map(|c| c.label).unwrap_or("알 수 없는 분류")
}

/// Every (code, filter) pair in request order
pub fn search_plan() -> impl Iterator<Item = (u32, ItemFilter)> {
    CATEGORIES
        .iter()
        .flat_map(|c| c.filters.iter().map(move |f| (c.code, *f)))
}
