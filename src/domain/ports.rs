use crate::domain::model::{
    BomDocument, Category, HoleRecord, PositionRecord, RecipeSet, SectionDescriptor,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn parent_ref(&self) -> &str;
    fn child_ref(&self) -> &str;
    fn output_path(&self) -> &str;
    fn rung_clearance_mm(&self) -> f64;
    fn z_threshold_mm(&self) -> f64;
    /// 套件梯 (kit) 的尺寸對應替代母工單
    fn kit_parent_for(&self, size: &str) -> Option<&str>;
}

/// ERP 來源：給定母工單與子工單（或直接 B/F）取回 BOM
#[async_trait]
pub trait BomSource: Send + Sync {
    async fn fetch(&self, parent_ref: &str, child_ref: &str) -> Result<BomDocument>;
}

/// 唯讀的幾何參考目錄
pub trait ReferenceCatalog: Send + Sync {
    fn find_positions(&self, part_prefix: &str, category: Category) -> Result<Vec<PositionRecord>>;
    fn holes_for_instance(&self, instance: i64) -> Result<Vec<HoleRecord>>;
    fn position_for_instance(&self, instance: i64) -> Result<Option<PositionRecord>>;
    fn find_section(&self, id_prefix: &str) -> Result<Option<SectionDescriptor>>;
}

impl<T: ReferenceCatalog + ?Sized> ReferenceCatalog for std::sync::Arc<T> {
    fn find_positions(&self, part_prefix: &str, category: Category) -> Result<Vec<PositionRecord>> {
        (**self).find_positions(part_prefix, category)
    }

    fn holes_for_instance(&self, instance: i64) -> Result<Vec<HoleRecord>> {
        (**self).holes_for_instance(instance)
    }

    fn position_for_instance(&self, instance: i64) -> Result<Option<PositionRecord>> {
        (**self).position_for_instance(instance)
    }

    fn find_section(&self, id_prefix: &str) -> Result<Option<SectionDescriptor>> {
        (**self).find_section(id_prefix)
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<BomDocument>;
    async fn transform(&self, bom: BomDocument) -> Result<RecipeSet>;
    async fn load(&self, recipes: RecipeSet) -> Result<Vec<String>>;
}
