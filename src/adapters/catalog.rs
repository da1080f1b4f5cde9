use crate::domain::model::{Category, HoleRecord, PositionRecord, SectionDescriptor};
use crate::domain::ports::ReferenceCatalog;
use crate::utils::error::{RecipeError, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

pub const POSITIONS_FILE: &str = "positions.csv";
pub const HOLES_FILE: &str = "holes.csv";
pub const SECTIONS_FILE: &str = "sections.csv";

/// 載入記憶體的唯讀參考目錄
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    positions: Vec<PositionRecord>,
    holes: HashMap<i64, Vec<HoleRecord>>,
    sections: Vec<SectionDescriptor>,
}

impl InMemoryCatalog {
    pub fn builder() -> InMemoryCatalogBuilder {
        InMemoryCatalogBuilder::default()
    }

    /// 從目錄讀取 positions.csv、holes.csv 與 sections.csv
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let positions: Vec<PositionRecord> = read_csv(&dir.join(POSITIONS_FILE))?;
        let holes: Vec<HoleRecord> = read_csv(&dir.join(HOLES_FILE))?;
        let sections: Vec<SectionDescriptor> = read_csv(&dir.join(SECTIONS_FILE))?;

        tracing::info!(
            "Loaded catalog from {}: {} positions, {} holes, {} sections",
            dir.display(),
            positions.len(),
            holes.len(),
            sections.len()
        );

        Ok(InMemoryCatalogBuilder {
            positions,
            holes,
            sections,
        }
        .build())
    }
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.is_file() {
        return Err(RecipeError::ExternalSourceUnavailable {
            source_name: "catalog".to_string(),
            message: format!("{} not found", path.display()),
        });
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    tracing::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

impl ReferenceCatalog for InMemoryCatalog {
    fn find_positions(&self, part_prefix: &str, category: Category) -> Result<Vec<PositionRecord>> {
        Ok(self
            .positions
            .iter()
            .filter(|p| p.category == category && p.part_no.starts_with(part_prefix))
            .cloned()
            .collect())
    }

    fn holes_for_instance(&self, instance: i64) -> Result<Vec<HoleRecord>> {
        Ok(self.holes.get(&instance).cloned().unwrap_or_default())
    }

    fn position_for_instance(&self, instance: i64) -> Result<Option<PositionRecord>> {
        Ok(self.positions.iter().find(|p| p.id == instance).cloned())
    }

    fn find_section(&self, id_prefix: &str) -> Result<Option<SectionDescriptor>> {
        Ok(self.sections.iter().find(|s| s.id.starts_with(id_prefix)).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalogBuilder {
    positions: Vec<PositionRecord>,
    holes: Vec<HoleRecord>,
    sections: Vec<SectionDescriptor>,
}

impl InMemoryCatalogBuilder {
    pub fn position(mut self, position: PositionRecord) -> Self {
        self.positions.push(position);
        self
    }

    pub fn hole(mut self, hole: HoleRecord) -> Self {
        self.holes.push(hole);
        self
    }

    pub fn section(mut self, section: SectionDescriptor) -> Self {
        self.sections.push(section);
        self
    }

    pub fn build(self) -> InMemoryCatalog {
        let mut holes: HashMap<i64, Vec<HoleRecord>> = HashMap::new();
        for hole in self.holes {
            holes.entry(hole.link_id).or_default().push(hole);
        }
        InMemoryCatalog {
            positions: self.positions,
            holes,
            sections: self.sections,
        }
    }
}
