use crate::domain::model::{Category, ClassifiedParts, PartEntry};
use crate::domain::ports::ReferenceCatalog;
use crate::utils::error::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// 梯柱 (section end piece) 零件編號中的標記
pub const SECTION_END_MARKER: &str = "EXL";

/// Fly 對接用的虛擬零件，每次都會加入
pub const FLY_DOCKING_SENTINEL: &str = "BP-EXF-0110-02-TEMP";

// 鉚釘與標籤沒有孔
const HOLELESS_MARKERS: [&str; 2] = ["RIV", "LBL"];

const DENYLIST: [&str; 3] = ["BP-EXF-0094-01111", "BP-FCL-0016-01", "BP-EXF-0010-02"];

const BUILD_PREFIX: &str = "Build";
const BUILD_PREFIX_LEN: usize = 7;

/// 部分零件在目錄中以其他（或多個）零件編號表示；帶 "-remove" 的編號在目錄中不存在
const SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("BP-EXF-8090-01", &["BP-EXF-0094-01"]),
    ("BP-EXF-8091-01", &["BP-EXF-0094-01"]),
    ("BP-FCL-8030-01", &["BP-FCL-8002-01", "BP-FCL-0016-01-remove"]),
    ("BP-EXF-0231-01", &["BP-EXF-0010-02-remove"]),
    ("BP-TOP-8000-02", &["BP-TOP-0001-01"]),
    ("BP-TOP-8000-01", &["BP-TOP-0001-01"]),
    ("BK-EXF-9087-01", &["BP-TOP-0001-01"]),
];

pub fn is_section_end(part_id: &str) -> bool {
    part_id.contains(SECTION_END_MARKER)
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(.*?)\]").unwrap())
}

/// 取出原始 BOM 文字中所有方括號內的零件編號
pub fn extract_part_ids(raw_text: &str) -> Vec<String> {
    bracket_pattern()
        .captures_iter(raw_text)
        .map(|caps| {
            let id = &caps[1];
            if id.split_whitespace().next() == Some(BUILD_PREFIX) {
                id.chars().skip(BUILD_PREFIX_LEN).collect()
            } else {
                id.to_string()
            }
        })
        // 空括號會以前綴比對命中整個目錄
        .filter(|id: &String| !id.trim().is_empty())
        .collect()
}

/// 加入對接虛擬零件、移除黑名單、套用替代表，再去掉無孔耗材與重複
pub fn normalize_part_ids(mut ids: Vec<String>) -> Vec<String> {
    ids.push(FLY_DOCKING_SENTINEL.to_string());

    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !DENYLIST.contains(&id.as_str()))
        .flat_map(|id| {
            match SUBSTITUTIONS.iter().find(|(from, _)| *from == id) {
                Some((_, replacements)) => replacements.iter().map(|r| r.to_string()).collect(),
                None => vec![id],
            }
        })
        .filter(|id| !HOLELESS_MARKERS.iter().any(|marker| id.contains(marker)))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

pub struct PartClassifier<'a, C: ReferenceCatalog> {
    catalog: &'a C,
}

impl<'a, C: ReferenceCatalog> PartClassifier<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// 依目錄的 B/F 定位資料把零件分到 Base 與 Fly；目錄中找不到的零件不計入該類別
    pub fn classify(&self, raw_text: &str) -> Result<ClassifiedParts> {
        let ids = normalize_part_ids(extract_part_ids(raw_text));
        tracing::debug!("Classifying {} part IDs", ids.len());

        let mut parts = ClassifiedParts::default();

        // 梯柱橫跨兩段，先在兩個類別都放一筆
        for id in ids.iter().filter(|id| is_section_end(id)) {
            parts.fly.push(PartEntry::new(id.clone(), Vec::new()));
            parts.base.push(PartEntry::new(id.clone(), Vec::new()));
        }

        for id in &ids {
            for category in [Category::Fly, Category::Base] {
                let positions = self.catalog.find_positions(id, category)?;
                if positions.is_empty() {
                    continue;
                }
                let instances = positions.iter().map(|p| p.id).collect();
                parts.get_mut(category).push(PartEntry::new(id.clone(), instances));
            }
        }

        tracing::debug!(
            "Classified {} base entries and {} fly entries",
            parts.base.len(),
            parts.fly.len()
        );
        Ok(parts)
    }
}
