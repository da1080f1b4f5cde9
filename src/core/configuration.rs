//! Hardware configuration detected from part membership, and the part-list
//! edits that depend on it. Every dispatch is an ordered table; the first
//! matching row wins.

use crate::domain::model::{Category, ClassifiedParts, PartEntry};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LadderFoot {
    TerrainMaster,
    SwivelFoot,
    SwivelNoIcePick,
    SwivelGrabBar,
    RubberFoot,
    RubberNorthPower,
    #[default]
    Unset,
}

impl LadderFoot {
    pub fn code(self) -> &'static str {
        match self {
            LadderFoot::TerrainMaster => "TM",
            LadderFoot::SwivelFoot => "SF",
            LadderFoot::SwivelNoIcePick => "SN",
            LadderFoot::SwivelGrabBar => "SG",
            LadderFoot::RubberFoot => "RF",
            LadderFoot::RubberNorthPower => "RN",
            LadderFoot::Unset => "",
        }
    }

    pub fn is_swivel(self) -> bool {
        matches!(
            self,
            LadderFoot::SwivelFoot | LadderFoot::SwivelNoIcePick | LadderFoot::SwivelGrabBar
        )
    }
}

impl fmt::Display for LadderFoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LadderFoot::Unset => f.write_str("unset"),
            other => f.write_str(other.code()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatchType {
    Branach,
    Conventional,
    #[default]
    Unset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Configuration {
    pub ladder_foot: LadderFoot,
    pub latch: LatchType,
    pub is_utility: bool,
}

pub const TERRAIN_MASTER_COMPONENTS: &[&str] = &["BP-LEV-8609-01", "BP-LEV-8700-01", "BP-LEV-8606-01"];

// 腳座判斷只看 Base 的零件；目前沒有 grab-bar 腳座的零件編號
const LADDER_FOOT_RULES: &[(LadderFoot, &[&str])] = &[
    (LadderFoot::TerrainMaster, TERRAIN_MASTER_COMPONENTS),
    (
        LadderFoot::SwivelFoot,
        &["BP-EXF-8090-01", "BP-EXF-0094-01", "BP-EXF-8091-01"],
    ),
    (LadderFoot::SwivelNoIcePick, &["BP-EXF-8009-01"]),
    (LadderFoot::SwivelGrabBar, &[]),
    (LadderFoot::RubberFoot, &["BP-EXF-0161-03"]),
    (LadderFoot::RubberNorthPower, &["BK-EXF-9044-01"]),
];

const LATCH_RULES: &[(LatchType, &[&str])] = &[
    (LatchType::Branach, &["BP-EXF-8101-03"]),
    (LatchType::Conventional, &["BP-EXF-8011-01"]),
];

/// 止動支架：實例依 terrain master 與是否為 9.8 梯段改寫
pub const STOPPER_BRACKET: &str = "BP-EXF-8161-01";
pub const STOPPER_SPECIAL_ITEM: &str = "S-LAD FED BASE 9.8";

// (有 terrain master, 為 9.8 梯段) -> 實例 ID
const STOPPER_BRACKET_RULES: &[((bool, bool), i64)] = &[
    ((true, true), 202),
    ((true, false), 201),
    ((false, true), 197),
    ((false, false), 134),
];

const T3_COMPONENTS: &[&str] = &["BP-TOP-0001-01", "BP-TOP-8001-01", "BK-EXF-9510-01"];
/// 有 T3 頂件時由 T3 涵蓋的 Fly 零件
pub const T3_COVERED_PART: &str = "BP-EXF-0110-02";

/// Utility 梯不裝的 Base 零件
pub const UTILITY_EXCLUDED_PARTS: &[&str] = &["BP-FCL-0023-01", "BP-FCL-0041-01"];

fn contains_any(entries: &[PartEntry], set: &[&str]) -> bool {
    entries.iter().any(|e| set.contains(&e.part_id.as_str()))
}

fn first_match<T: Copy>(rules: &[(T, &[&str])], entries: &[PartEntry]) -> Option<T> {
    rules
        .iter()
        .find(|(_, set)| contains_any(entries, set))
        .map(|(value, _)| *value)
}

pub fn is_utility_product(product_display_name: &str) -> bool {
    product_display_name.trim().to_lowercase().ends_with("utility")
}

#[derive(Debug, Default)]
pub struct ConfigurationResolver;

impl ConfigurationResolver {
    pub fn new() -> Self {
        Self
    }

    /// 依該類別的零件更新設定：腳座只由 Base 決定，鎖扣找不到時沿用前一個類別的結果
    pub fn detect(&self, config: &mut Configuration, entries: &[PartEntry], category: Category) {
        if category == Category::Base {
            if let Some(foot) = first_match(LADDER_FOOT_RULES, entries) {
                config.ladder_foot = foot;
            }
        }
        if let Some(latch) = first_match(LATCH_RULES, entries) {
            config.latch = latch;
        }
        tracing::debug!(
            "Configuration after {}: foot={}, latch={:?}",
            category,
            config.ladder_foot,
            config.latch
        );
    }

    /// 依偵測到的硬體就地修改該類別的零件清單
    pub fn apply_part_edits(
        &self,
        config: &mut Configuration,
        parts: &mut ClassifiedParts,
        category: Category,
        section_item: &str,
        product_display_name: &str,
    ) {
        let entries = parts.get_mut(category);
        let has_terrain_master = contains_any(entries, TERRAIN_MASTER_COMPONENTS);
        let has_t3 = contains_any(entries, T3_COMPONENTS);
        let is_special_item = section_item == STOPPER_SPECIAL_ITEM;

        for entry in entries.iter_mut().filter(|e| e.part_id == STOPPER_BRACKET) {
            if let Some((_, instance)) = STOPPER_BRACKET_RULES
                .iter()
                .find(|(key, _)| *key == (has_terrain_master, is_special_item))
            {
                tracing::debug!("Stopper bracket instance set to {}", instance);
                entry.instances = vec![*instance];
            }
        }

        if has_t3 {
            let before = entries.len();
            entries.retain(|e| e.part_id != T3_COVERED_PART);
            if entries.len() != before {
                tracing::info!("Removed {} because a T3 top part is present", T3_COVERED_PART);
            }
        }

        config.is_utility = is_utility_product(product_display_name);
        if config.is_utility && category == Category::Base {
            entries.retain(|e| !UTILITY_EXCLUDED_PARTS.contains(&e.part_id.as_str()));
            tracing::info!("Utility ladder: removed utility-excluded base parts");
        }
    }
}
