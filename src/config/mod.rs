#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};

/// 一次執行的完整設定：設定檔加上本次的工單參數與覆蓋值
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings: TomlConfig,
    pub parent_ref: String,
    pub child_ref: String,
    pub bom_file: Option<String>,
}

impl RunConfig {
    pub fn new(settings: TomlConfig, parent_ref: impl Into<String>, child_ref: impl Into<String>) -> Self {
        Self {
            settings,
            parent_ref: parent_ref.into(),
            child_ref: child_ref.into(),
            bom_file: None,
        }
    }

    pub fn with_bom_file(mut self, bom_file: Option<String>) -> Self {
        self.bom_file = bom_file;
        self
    }

    pub fn with_output_override(mut self, output: Option<String>) -> Self {
        if let Some(path) = output {
            tracing::info!("Output path overridden to: {}", path);
            self.settings.output.path = path;
        }
        self
    }

    pub fn with_timeout_override(mut self, timeout: Option<u64>) -> Self {
        if let Some(seconds) = timeout {
            tracing::info!("Run timeout overridden to: {}s", seconds);
            self.settings.run.timeout_seconds = seconds;
        }
        self
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.settings.timeout_seconds()
    }
}

impl ConfigProvider for RunConfig {
    fn parent_ref(&self) -> &str {
        &self.parent_ref
    }

    fn child_ref(&self) -> &str {
        &self.child_ref
    }

    fn output_path(&self) -> &str {
        self.settings.output_path()
    }

    fn rung_clearance_mm(&self) -> f64 {
        self.settings.filters.rung_clearance_mm
    }

    fn z_threshold_mm(&self) -> f64 {
        self.settings.filters.z_threshold_mm
    }

    fn kit_parent_for(&self, size: &str) -> Option<&str> {
        self.settings.kit_parent_for(size)
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        validation::validate_non_empty_string("parent", &self.parent_ref)?;
        validation::validate_child_reference("child", &self.child_ref)?;

        match &self.bom_file {
            Some(path) => validation::validate_path("bom_file", path)?,
            None => {
                validation::validate_required_field("erp", &self.settings.erp)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::RecipeError;

    fn settings(with_erp: bool) -> TomlConfig {
        let erp = if with_erp {
            "[erp]\nurl = \"https://erp.example.com\"\ndatabase = \"db\"\nusername = \"u\"\npassword = \"p\"\n\n"
        } else {
            ""
        };
        TomlConfig::from_toml_str(&format!(
            "{}[catalog]\npath = \"./catalog\"\n\n[output]\npath = \"./output\"\n",
            erp
        ))
        .unwrap()
    }

    #[test]
    fn test_overrides_apply() {
        let config = RunConfig::new(settings(true), "BM/MO/1", "B")
            .with_output_override(Some("/mnt/cam".to_string()))
            .with_timeout_override(Some(45));

        assert_eq!(config.output_path(), "/mnt/cam");
        assert_eq!(config.timeout_seconds(), 45);
        assert_eq!(config.rung_clearance_mm(), 120.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_erp_required_without_bom_file() {
        let config = RunConfig::new(settings(false), "BM/MO/1", "F");
        assert!(matches!(
            config.validate(),
            Err(RecipeError::MissingConfigError { ref field }) if field == "erp"
        ));

        let config = config.with_bom_file(Some("bom.json".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_child_reference_checked() {
        let config = RunConfig::new(settings(true), "BM/MO/1", "X");
        assert!(config.validate().is_err());
        let config = RunConfig::new(settings(true), " ", "B");
        assert!(config.validate().is_err());
    }
}
