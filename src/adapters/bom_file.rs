use crate::domain::model::{BomDocument, Category};
use crate::domain::ports::BomSource;
use crate::utils::error::{RecipeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

/// 快照檔可以是單一工單，或多張工單（成套梯需要換母工單時使用）
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Snapshot {
    Many(Vec<BomDocument>),
    One(Box<BomDocument>),
}

/// 以先前從 ERP 匯出的 JSON 快照取代線上查詢
#[derive(Debug, Clone)]
pub struct BomFileSource {
    path: PathBuf,
}

impl BomFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RecipeError::ExternalSourceUnavailable {
                source_name: "bom-file".to_string(),
                message: format!("{}: {}", self.path.display(), e),
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl BomSource for BomFileSource {
    async fn fetch(&self, parent_ref: &str, child_ref: &str) -> Result<BomDocument> {
        let mut document = match self.load().await? {
            Snapshot::One(document) => {
                if document.parent_ref != parent_ref {
                    tracing::warn!(
                        "Snapshot is for {}, not {}; using it anyway",
                        document.parent_ref,
                        parent_ref
                    );
                }
                *document
            }
            Snapshot::Many(documents) => documents
                .into_iter()
                .find(|d| d.parent_ref == parent_ref)
                .ok_or_else(|| RecipeError::ExternalSourceUnavailable {
                    source_name: "bom-file".to_string(),
                    message: format!("No manufacturing order found with the name {}", parent_ref),
                })?,
        };

        // 子工單為 B/F 時以參數為準，否則沿用快照記錄的類別
        if let Some(category) = Category::from_code(child_ref) {
            document.child_category = category;
        }

        tracing::info!(
            "Loaded {} BOM lines for {} from {}",
            document.lines.len(),
            document.parent_ref,
            self.path.display()
        );
        Ok(document)
    }
}
