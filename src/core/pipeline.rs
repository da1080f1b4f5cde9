use crate::core::bom;
use crate::core::engine::RecipeEngine;
use crate::core::filters::ReachLimits;
use crate::domain::model::{BomDocument, RecipeSet};
use crate::domain::ports::{BomSource, ConfigProvider, Pipeline, ReferenceCatalog, Storage};
use crate::utils::error::Result;
use std::path::Path;

pub const FINAL_RECIPE_FILE: &str = "testFinal.txt";

pub fn recipe_file_name(category_code: &str) -> String {
    format!("test{}.txt", category_code)
}

/// 取 BOM、產生配方、寫出配方檔
pub struct RecipePipeline<S: Storage, B: BomSource, C: ReferenceCatalog, P: ConfigProvider> {
    storage: S,
    source: B,
    engine: RecipeEngine<C>,
    config: P,
}

impl<S: Storage, B: BomSource, C: ReferenceCatalog, P: ConfigProvider> RecipePipeline<S, B, C, P> {
    pub fn new(storage: S, source: B, catalog: C, config: P) -> Self {
        let limits = ReachLimits {
            rung_clearance: config.rung_clearance_mm(),
            z_threshold: config.z_threshold_mm(),
        };
        Self {
            storage,
            source,
            engine: RecipeEngine::new(catalog).with_limits(limits),
            config,
        }
    }

    /// 成套梯換成對應尺寸的母工單重新取 BOM；找不到對應時沿用原工單
    async fn swap_kitted_parent(&self, document: BomDocument) -> Result<BomDocument> {
        if !bom::is_kitted(&document) {
            return Ok(document);
        }
        let Some(size) = bom::ladder_size(&document.product_display_name) else {
            tracing::warn!("Kitted ladder '{}' has no size in its name", document.product_display_name);
            return Ok(document);
        };
        let Some(parent) = self.config.kit_parent_for(size) else {
            tracing::warn!("No kit parent configured for {}m ladders", size);
            return Ok(document);
        };

        tracing::info!("Detected kitted ladder ({}m), swapping parent MO to {}", size, parent);
        self.source.fetch(parent, self.config.child_ref()).await
    }

    fn output_location(&self, file_name: &str) -> String {
        Path::new(self.config.output_path())
            .join(file_name)
            .display()
            .to_string()
    }
}

#[async_trait::async_trait]
impl<S: Storage, B: BomSource, C: ReferenceCatalog, P: ConfigProvider> Pipeline for RecipePipeline<S, B, C, P> {
    async fn extract(&self) -> Result<BomDocument> {
        tracing::info!(
            "Starting recipe generation for parent '{}' and child '{}'",
            self.config.parent_ref(),
            self.config.child_ref()
        );
        let document = self
            .source
            .fetch(self.config.parent_ref(), self.config.child_ref())
            .await?;
        let document = self.swap_kitted_parent(document).await?;

        tracing::info!(
            "Fetched {} components for {}",
            document.lines.len(),
            document.product_display_name
        );
        Ok(document)
    }

    async fn transform(&self, bom: BomDocument) -> Result<RecipeSet> {
        let raw_text = bom::format_components(&bom.lines);
        tracing::debug!("Formatted BOM:\n{}", raw_text);

        self.engine
            .generate(&raw_text, &bom.product_display_name, bom.child_category)
    }

    async fn load(&self, recipes: RecipeSet) -> Result<Vec<String>> {
        let mut written = Vec::new();

        for recipe in &recipes.recipes {
            let file_name = recipe_file_name(recipe.category().code());
            self.storage.write_file(&file_name, recipe.text.as_bytes()).await?;
            written.push(self.output_location(&file_name));
        }

        if let Some(requested) = recipes.requested_recipe() {
            self.storage
                .write_file(FINAL_RECIPE_FILE, requested.text.as_bytes())
                .await?;
            written.push(self.output_location(FINAL_RECIPE_FILE));
        }

        if recipes.requested_needs_docking {
            tracing::info!("Section {} requires docking", recipes.requested);
        } else {
            tracing::info!("Section {} does not require docking", recipes.requested);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::InMemoryCatalog;
    use crate::domain::model::{BomLine, Category, SectionDescriptor};
    use crate::utils::error::RecipeError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files.get(path).map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                RecipeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct MockSource {
        documents: HashMap<String, BomDocument>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl MockSource {
        fn with(mut self, document: BomDocument) -> Self {
            self.documents.insert(document.parent_ref.clone(), document);
            self
        }
    }

    #[async_trait]
    impl BomSource for MockSource {
        async fn fetch(&self, parent_ref: &str, _child_ref: &str) -> Result<BomDocument> {
            self.calls.lock().await.push(parent_ref.to_string());
            self.documents
                .get(parent_ref)
                .cloned()
                .ok_or_else(|| RecipeError::ExternalSourceUnavailable {
                    source_name: "erp".to_string(),
                    message: format!("No manufacturing order found with the name {}", parent_ref),
                })
        }
    }

    struct MockConfig {
        parent_ref: String,
        child_ref: String,
        kits: HashMap<String, String>,
    }

    impl MockConfig {
        fn new(parent_ref: &str, child_ref: &str) -> Self {
            Self {
                parent_ref: parent_ref.to_string(),
                child_ref: child_ref.to_string(),
                kits: HashMap::from([("6.3".to_string(), "BM/MO/2510362-001".to_string())]),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn parent_ref(&self) -> &str {
            &self.parent_ref
        }

        fn child_ref(&self) -> &str {
            &self.child_ref
        }

        fn output_path(&self) -> &str {
            "cam"
        }

        fn rung_clearance_mm(&self) -> f64 {
            120.0
        }

        fn z_threshold_mm(&self) -> f64 {
            -10.0
        }

        fn kit_parent_for(&self, size: &str) -> Option<&str> {
            self.kits.get(size).map(String::as_str)
        }
    }

    fn document(parent_ref: &str, display_name: &str, child: Category) -> BomDocument {
        BomDocument {
            parent_ref: parent_ref.to_string(),
            bom_name: parent_ref.to_string(),
            product_display_name: display_name.to_string(),
            child_category: child,
            lines: vec![
                BomLine {
                    product: "[BP-EXL-0063-01] S-LAD FED BASE 6.3".to_string(),
                    quantity: 1.0,
                    unit: "Units".to_string(),
                },
                BomLine {
                    product: "[BP-EXL-0063-02] S-LAD FED FLY 6.3".to_string(),
                    quantity: 1.0,
                    unit: "Units".to_string(),
                },
            ],
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::builder()
            .section(SectionDescriptor {
                id: "BP-EXL-0063-01".to_string(),
                description: "S-LAD FED BASE 6.3".to_string(),
            })
            .section(SectionDescriptor {
                id: "BP-EXL-0063-02".to_string(),
                description: "S-LAD FED FLY 6.3".to_string(),
            })
            .build()
    }

    #[tokio::test]
    async fn test_full_run_writes_category_and_final_files() {
        let storage = MockStorage::new();
        let source = MockSource::default().with(document("BM/MO/0001", "F-LAD FED 6.3", Category::Fly));
        let pipeline = RecipePipeline::new(
            storage.clone(),
            source,
            catalog(),
            MockConfig::new("BM/MO/0001", "F"),
        );

        let bom = pipeline.extract().await.unwrap();
        let recipes = pipeline.transform(bom).await.unwrap();
        let written = pipeline.load(recipes).await.unwrap();

        assert_eq!(written.len(), 3);
        assert!(written[2].ends_with(FINAL_RECIPE_FILE));

        let base = storage.get_file("testB.txt").await.unwrap();
        let fly = storage.get_file("testF.txt").await.unwrap();
        let final_recipe = storage.get_file(FINAL_RECIPE_FILE).await.unwrap();
        assert!(base.contains("FBDESIGNATION:B"));
        assert!(base.contains("RUNGNO:10"));
        assert!(fly.contains("FBDESIGNATION:F"));
        assert_eq!(final_recipe, fly);
    }

    #[tokio::test]
    async fn test_kitted_ladder_swaps_parent() {
        let source = MockSource::default()
            .with(document("BM/MO/KIT", "F-LAD FED 6.3 KIT", Category::Base))
            .with(document("BM/MO/2510362-001", "F-LAD FED 6.3", Category::Base));
        let calls = source.calls.clone();
        let pipeline = RecipePipeline::new(
            MockStorage::new(),
            source,
            catalog(),
            MockConfig::new("BM/MO/KIT", "B"),
        );

        let bom = pipeline.extract().await.unwrap();

        assert_eq!(bom.parent_ref, "BM/MO/2510362-001");
        assert_eq!(*calls.lock().await, vec!["BM/MO/KIT", "BM/MO/2510362-001"]);
    }

    #[tokio::test]
    async fn test_kitted_ladder_without_mapping_keeps_parent() {
        let source = MockSource::default().with(document("BM/MO/KIT", "F-LAD FED 7.5 kit", Category::Base));
        let pipeline = RecipePipeline::new(
            MockStorage::new(),
            source,
            catalog(),
            MockConfig::new("BM/MO/KIT", "B"),
        );

        let bom = pipeline.extract().await.unwrap();
        assert_eq!(bom.parent_ref, "BM/MO/KIT");
    }

    #[tokio::test]
    async fn test_unknown_parent_propagates() {
        let pipeline = RecipePipeline::new(
            MockStorage::new(),
            MockSource::default(),
            catalog(),
            MockConfig::new("BM/MO/404", "B"),
        );

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, RecipeError::ExternalSourceUnavailable { .. }));
    }
}
