pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{RunConfig, TomlConfig};

pub use adapters::{BomFileSource, InMemoryCatalog, LocalStorage, OdooClient};
pub use core::{RecipeEngine, RecipePipeline, RecipeRunner};
pub use utils::error::{RecipeError, Result};
