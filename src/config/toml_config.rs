use crate::utils::error::{RecipeError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

pub const DEFAULT_CONFIG_FILE: &str = "ladder-recipe.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// 使用 --bom-file 時可省略
    pub erp: Option<ErpConfig>,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub filters: FilterConfig,
    /// 成套梯尺寸 -> 替代母工單
    #[serde(default = "default_kits")]
    pub kits: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpConfig {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 放 positions.csv、holes.csv、sections.csv 的目錄
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default = "default_run_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_run_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_rung_clearance")]
    pub rung_clearance_mm: f64,
    #[serde(default = "default_z_threshold")]
    pub z_threshold_mm: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rung_clearance_mm: default_rung_clearance(),
            z_threshold_mm: default_z_threshold(),
        }
    }
}

fn default_language() -> String {
    "en_AU".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_run_timeout() -> u64 {
    20
}

fn default_rung_clearance() -> f64 {
    120.0
}

fn default_z_threshold() -> f64 {
    -10.0
}

fn default_kits() -> BTreeMap<String, String> {
    [
        ("3.9", "BM/MO/2511385-025"),
        ("5.1", "BM/MO/2511386-008"),
        ("6.3", "BM/MO/2510362-001"),
        ("8.7", "BM/MO/2508284-001"),
        ("9.6", "Brana/MO/00071"),
    ]
    .into_iter()
    .map(|(size, parent)| (size.to_string(), parent.to_string()))
    .collect()
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").unwrap())
}

fn kit_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+$").unwrap())
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RecipeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RecipeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ERP_PASSWORD})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        env_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn catalog_path(&self) -> &str {
        &self.catalog.path
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.run.timeout_seconds
    }

    pub fn kit_parent_for(&self, size: &str) -> Option<&str> {
        self.kits.get(size).map(String::as_str)
    }
}

impl Validate for ErpConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("erp.url", &self.url)?;
        validation::validate_non_empty_string("erp.database", &self.database)?;
        validation::validate_non_empty_string("erp.username", &self.username)?;
        validation::validate_non_empty_string("erp.language", &self.language)?;
        validation::validate_range("erp.request_timeout_seconds", self.request_timeout_seconds, 1, 600)?;
        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(erp) = &self.erp {
            erp.validate()?;
        }

        validation::validate_path("catalog.path", &self.catalog.path)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_range("run.timeout_seconds", self.run.timeout_seconds, 1, 600)?;

        let clearance = self.filters.rung_clearance_mm;
        if clearance.is_nan() || clearance <= 0.0 {
            return Err(RecipeError::InvalidConfigValueError {
                field: "filters.rung_clearance_mm".to_string(),
                value: clearance.to_string(),
                reason: "Clearance must be positive".to_string(),
            });
        }
        let threshold = self.filters.z_threshold_mm;
        if threshold.is_nan() || threshold > 0.0 {
            return Err(RecipeError::InvalidConfigValueError {
                field: "filters.z_threshold_mm".to_string(),
                value: threshold.to_string(),
                reason: "Threshold must not be positive".to_string(),
            });
        }

        for (size, parent) in &self.kits {
            if !kit_size_pattern().is_match(size) {
                return Err(RecipeError::InvalidConfigValueError {
                    field: "kits".to_string(),
                    value: size.clone(),
                    reason: "Kit size must look like 6.3".to_string(),
                });
            }
            validation::validate_non_empty_string(&format!("kits.\"{}\"", size), parent)?;
        }

        Ok(())
    }
}
