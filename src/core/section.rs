use crate::core::classifier::is_section_end;
use crate::core::configuration::{Configuration, LadderFoot, LatchType};
use crate::core::constants::{lookup_section, regional_first_rung, WorkingConstants, REGIONAL_PITCH};
use crate::domain::model::{Category, PartEntry};
use crate::domain::ports::ReferenceCatalog;
use crate::utils::error::{RecipeError, Result};
use regex::Regex;
use std::sync::OnceLock;

// 梯段描述中的歐規標記
const REGIONAL_MARKER: &str = "FEU";

/// 解析出的梯段
#[derive(Debug, Clone, PartialEq)]
pub struct SectionInfo {
    /// 目錄中的梯段描述，例如 "S-LAD FED BASE 6.3"
    pub item: String,
    pub length: f64,
    pub regional: bool,
}

fn length_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\d+\.\d+\b").unwrap())
}

/// 描述中第一個小數即為梯段標稱長度
pub fn extract_length(description: &str) -> Option<f64> {
    length_pattern()
        .find(description)
        .and_then(|m| m.as_str().parse().ok())
}

fn describes_category(description: &str, category: Category) -> bool {
    match category {
        Category::Base => description.contains("BASE"),
        Category::Fly => description.contains("FLY"),
    }
}

pub struct SectionResolver<'a, C: ReferenceCatalog> {
    catalog: &'a C,
}

impl<'a, C: ReferenceCatalog> SectionResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// 由梯柱零件找出梯段規格並寫入本次執行的常數；找不到時整個類別無法繼續
    pub fn resolve(
        &self,
        entries: &[PartEntry],
        category: Category,
        config: &Configuration,
        constants: &mut WorkingConstants,
    ) -> Result<SectionInfo> {
        let mut resolved = None;
        let mut last_item = None;

        for entry in entries.iter().filter(|e| is_section_end(&e.part_id)) {
            let Some(section) = self.catalog.find_section(&entry.part_id)? else {
                tracing::warn!("No section row in catalog for {}", entry.part_id);
                continue;
            };
            let description = section.description;
            if !describes_category(&description, category) {
                continue;
            }
            last_item = Some(description.clone());

            let Some(spec) = extract_length(&description).and_then(|len| lookup_section(len, category))
            else {
                tracing::warn!("Section info not found / implemented for '{}'", description);
                continue;
            };

            constants.stile_length = spec.stile_length;
            constants.rung_count = spec.rung_count;
            let regional = description.contains(REGIONAL_MARKER);
            if regional {
                constants.pitch = REGIONAL_PITCH;
                constants.dist_end_to_first_rung = regional_first_rung(category);
            }

            resolved = Some(SectionInfo {
                item: description,
                length: spec.length,
                regional,
            });
        }

        let info = resolved.ok_or_else(|| RecipeError::SectionNotFound {
            category: category.to_string(),
            detail: match last_item {
                Some(item) => format!("'{}' has no entry in the section table", item),
                None => "stile not found on B.O.M".to_string(),
            },
        })?;

        // Fly 搭配 Branach 鎖扣與 terrain master 時少一個橫檔間距
        if category == Category::Fly
            && config.latch == LatchType::Branach
            && config.ladder_foot == LadderFoot::TerrainMaster
        {
            constants.stile_length -= constants.stile_length - constants.pitch;
            constants.rung_count = constants.rung_count.saturating_sub(1);
            tracing::info!(
                "Fly shortened for Branach latch with terrain master: {} rungs",
                constants.rung_count
            );
        }

        tracing::info!(
            "Section {}: '{}' stile={} rungs={} pitch={}",
            category,
            info.item,
            constants.stile_length,
            constants.rung_count,
            constants.pitch
        );
        Ok(info)
    }
}
