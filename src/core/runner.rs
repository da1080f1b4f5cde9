use crate::domain::model::RecipeSet;
use crate::domain::ports::Pipeline;
use crate::utils::error::{RecipeError, Result};
use std::time::Duration;

pub struct RecipeRunner<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RecipeRunner<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 只產生配方，不寫檔（dry run）
    pub async fn preview(&self) -> Result<RecipeSet> {
        let bom = self.pipeline.extract().await?;
        self.pipeline.transform(bom).await
    }

    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("Extracting BOM...");
        let bom = self.pipeline.extract().await?;
        tracing::info!("Extracted {} BOM lines", bom.lines.len());

        tracing::info!("Generating recipes...");
        let recipes = self.pipeline.transform(bom).await?;
        tracing::info!("Generated {} recipes", recipes.recipes.len());

        tracing::info!("Writing recipe files...");
        let written = self.pipeline.load(recipes).await?;
        for path in &written {
            tracing::info!("Output saved to: {}", path);
        }

        Ok(written)
    }
}

impl<P: Pipeline + 'static> RecipeRunner<P> {
    /// 在背景任務執行；逾時視為失敗，不採用任何部分輸出，也不中斷進行中的查詢
    pub async fn run_with_timeout(self, seconds: u64) -> Result<Vec<String>> {
        let handle = tokio::spawn(async move { self.run().await });

        match tokio::time::timeout(Duration::from_secs(seconds), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(RecipeError::IoError(std::io::Error::other(format!(
                "recipe task failed: {}",
                join_error
            )))),
            Err(_) => {
                tracing::error!("Recipe run timed out after {}s", seconds);
                Err(RecipeError::Timeout { seconds })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BomDocument, Category};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubPipeline {
        delay: Duration,
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<BomDocument> {
            tokio::time::sleep(self.delay).await;
            Ok(BomDocument {
                parent_ref: "BM/MO/1".to_string(),
                bom_name: "BM/MO/1".to_string(),
                product_display_name: "F-LAD FED 6.3".to_string(),
                child_category: Category::Base,
                lines: vec![],
            })
        }

        async fn transform(&self, bom: BomDocument) -> Result<RecipeSet> {
            Ok(RecipeSet {
                recipes: vec![],
                requested: bom.child_category,
                requested_needs_docking: false,
            })
        }

        async fn load(&self, _recipes: RecipeSet) -> Result<Vec<String>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["out/testFinal.txt".to_string()])
        }
    }

    #[tokio::test]
    async fn test_run_completes_within_timeout() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runner = RecipeRunner::new(StubPipeline {
            delay: Duration::from_millis(0),
            loads: loads.clone(),
        });

        let written = runner.run_with_timeout(5).await.unwrap();
        assert_eq!(written, vec!["out/testFinal.txt"]);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let runner = RecipeRunner::new(StubPipeline {
            delay: Duration::from_secs(60),
            loads: Arc::new(AtomicUsize::new(0)),
        });

        let err = runner.run_with_timeout(20).await.unwrap_err();
        assert!(matches!(err, RecipeError::Timeout { seconds: 20 }));
    }

    #[tokio::test]
    async fn test_preview_skips_load() {
        let loads = Arc::new(AtomicUsize::new(0));
        let runner = RecipeRunner::new(StubPipeline {
            delay: Duration::from_millis(0),
            loads: loads.clone(),
        });

        let recipes = runner.preview().await.unwrap();
        assert_eq!(recipes.requested, Category::Base);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }
}
