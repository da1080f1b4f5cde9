use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Section not found for category {category}: {detail}")]
    SectionNotFound { category: String, detail: String },

    #[error("Missing catalog row for instance {instance}")]
    MissingCatalogRow { instance: i64 },

    #[error("External source unavailable ({source_name}): {message}")]
    ExternalSourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Run timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    External,
    Configuration,
    System,
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RecipeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RecipeError::InvalidFormula { .. }
            | RecipeError::SectionNotFound { .. }
            | RecipeError::MissingCatalogRow { .. } => ErrorCategory::Data,
            RecipeError::ExternalSourceUnavailable { .. } | RecipeError::CsvError(_) => {
                ErrorCategory::External
            }
            RecipeError::ConfigError { .. }
            | RecipeError::ConfigValidationError { .. }
            | RecipeError::InvalidConfigValueError { .. }
            | RecipeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            RecipeError::Timeout { .. }
            | RecipeError::IoError(_)
            | RecipeError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 非致命：呼叫端略過該貢獻後繼續
            RecipeError::InvalidFormula { .. } | RecipeError::MissingCatalogRow { .. } => {
                ErrorSeverity::Low
            }
            RecipeError::ExternalSourceUnavailable { .. } | RecipeError::Timeout { .. } => {
                ErrorSeverity::Medium
            }
            RecipeError::SectionNotFound { .. }
            | RecipeError::CsvError(_)
            | RecipeError::ConfigError { .. }
            | RecipeError::ConfigValidationError { .. }
            | RecipeError::InvalidConfigValueError { .. }
            | RecipeError::MissingConfigError { .. } => ErrorSeverity::High,
            RecipeError::IoError(_) | RecipeError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 致命錯誤會中止該次執行
    pub fn is_fatal(&self) -> bool {
        self.severity() > ErrorSeverity::Low
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RecipeError::InvalidFormula { .. } => {
                "Check the formula cells in positions.csv; only + - * / ( ) numbers and section constants are allowed"
            }
            RecipeError::SectionNotFound { .. } => {
                "Make sure the BOM contains a stile (EXL) part whose section length is in the section table"
            }
            RecipeError::MissingCatalogRow { .. } => {
                "Add the missing position/hole rows to the reference catalog"
            }
            RecipeError::ExternalSourceUnavailable { .. } => {
                "Check the ERP connection settings and that the order references exist, then run again"
            }
            RecipeError::Timeout { .. } => {
                "The run did not finish in time; discard any output and run again"
            }
            RecipeError::CsvError(_) => "Check that the catalog CSV files have the expected headers",
            RecipeError::IoError(_) => "Check file permissions and that the output directory exists",
            RecipeError::SerializationError(_) => "Check that the BOM snapshot is valid JSON",
            RecipeError::ConfigError { .. }
            | RecipeError::ConfigValidationError { .. }
            | RecipeError::InvalidConfigValueError { .. }
            | RecipeError::MissingConfigError { .. } => {
                "Fix the configuration file or command line arguments"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RecipeError::SectionNotFound { category, .. } => format!(
                "No ladder section could be matched for the {} section of this order",
                category
            ),
            RecipeError::ExternalSourceUnavailable { source_name, message } => {
                format!("Could not reach {}: {}", source_name, message)
            }
            RecipeError::Timeout { seconds } => {
                format!("Run failed (timeout after {} seconds)", seconds)
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for RecipeError {
    fn from(err: reqwest::Error) -> Self {
        RecipeError::ExternalSourceUnavailable {
            source_name: "erp".to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RecipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_and_missing_rows_are_not_fatal() {
        let err = RecipeError::InvalidFormula {
            formula: "Pitch*x".to_string(),
            reason: "unknown identifier".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.category(), ErrorCategory::Data);

        let err = RecipeError::MissingCatalogRow { instance: 12 };
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_section_not_found_is_fatal() {
        let err = RecipeError::SectionNotFound {
            category: "B".to_string(),
            detail: "length 1.2".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("B section"));
    }

    #[test]
    fn test_external_source_message_is_verbatim() {
        let err = RecipeError::ExternalSourceUnavailable {
            source_name: "erp".to_string(),
            message: "Access Denied".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::External);
        assert_eq!(err.user_friendly_message(), "Could not reach erp: Access Denied");
    }
}
