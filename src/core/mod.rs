// 配方產生引擎：BOM 文字 -> 分類 -> 梯段常數 -> 孔座標 -> 驗證與過濾 -> 配方文字

pub mod bom;
pub mod classifier;
pub mod configuration;
pub mod constants;
pub mod coordinates;
pub mod engine;
pub mod filters;
pub mod formula;
pub mod geometry;
pub mod pipeline;
pub mod runner;
pub mod section;
pub mod serializer;

pub use crate::domain::ports::{BomSource, ConfigProvider, Pipeline, ReferenceCatalog, Storage};
pub use crate::utils::error::Result;
pub use engine::RecipeEngine;
pub use pipeline::RecipePipeline;
pub use runner::RecipeRunner;
