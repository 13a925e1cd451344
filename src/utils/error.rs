use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Dataset <{dataset}> has no eligible records")]
    EmptyDatasetError { dataset: String },

    #[error("Column <{column}> not found")]
    ColumnNotFoundError { column: String },

    #[error("Data type of column <{column}> must be numeric")]
    ColumnTypeError { column: String },

    #[error("Column <{column}> contains no numeric data")]
    NoNumericDataError { column: String },

    #[error("Unknown color request '{name}'")]
    UnknownRampError { name: String },

    #[error("Color table '{ramp}' is not supported: {reason}")]
    RampUnsupportedForTypeError { ramp: String, reason: String },

    #[error("Unable to parse color rules (line {line}): {message}")]
    RuleFileParseError { line: usize, message: String },

    #[error("Duplicate color rule for value {value}")]
    DuplicateBreakpointError { value: String },

    #[error("Logarithmic scaling needs a non-negative range, got [{min}, {max}]")]
    InvalidDomainForLogScaleError { min: f64, max: f64 },

    #[error("{feature} is not implemented without a histogram source")]
    NotImplementedError { feature: String },

    #[error("Options {options} are mutually exclusive")]
    MutuallyExclusiveOptionsError { options: String },

    #[error("Missing required option: {option}")]
    MissingOptionError { option: String },

    #[error("Donor color table <{name}> not found")]
    DonorNotFoundError { name: String },

    #[error("Color table for <{dataset}> exists")]
    TableExistsError { dataset: String },

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Style,
    Transform,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ColorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ColorError::EmptyDatasetError { .. }
            | ColorError::ColumnNotFoundError { .. }
            | ColorError::ColumnTypeError { .. }
            | ColorError::NoNumericDataError { .. }
            | ColorError::CsvError(_) => ErrorCategory::Input,
            ColorError::UnknownRampError { .. }
            | ColorError::RampUnsupportedForTypeError { .. }
            | ColorError::RuleFileParseError { .. }
            | ColorError::DuplicateBreakpointError { .. }
            | ColorError::DonorNotFoundError { .. } => ErrorCategory::Style,
            ColorError::InvalidDomainForLogScaleError { .. }
            | ColorError::NotImplementedError { .. } => ErrorCategory::Transform,
            ColorError::MutuallyExclusiveOptionsError { .. }
            | ColorError::MissingOptionError { .. }
            | ColorError::InvalidConfigValueError { .. }
            | ColorError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ColorError::IoError(_)
            | ColorError::SerializationError(_)
            | ColorError::TableExistsError { .. } => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // -w 模式下已有色表不算失敗
            ColorError::TableExistsError { .. } => ErrorSeverity::Low,
            ColorError::IoError(_) | ColorError::SerializationError(_) => ErrorSeverity::Critical,
            ColorError::MutuallyExclusiveOptionsError { .. }
            | ColorError::MissingOptionError { .. }
            | ColorError::InvalidConfigValueError { .. }
            | ColorError::ConfigValidationError { .. } => ErrorSeverity::Medium,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ColorError::EmptyDatasetError { .. } => {
                "Check that the dataset contains records for the selected layer".to_string()
            }
            ColorError::ColumnNotFoundError { column } => {
                format!("Check the spelling of column '{}' against the dataset header", column)
            }
            ColorError::ColumnTypeError { .. } => {
                "Pick a column holding integer or floating point values".to_string()
            }
            ColorError::NoNumericDataError { .. } => {
                "Every value in the column is null; pick another column".to_string()
            }
            ColorError::UnknownRampError { .. } => {
                "Run with -l to list the available color tables".to_string()
            }
            ColorError::RampUnsupportedForTypeError { .. } => {
                "Use an interpolated color table for floating point data".to_string()
            }
            ColorError::RuleFileParseError { line, .. } => {
                format!("Fix rule line {} (expected '<value|N%|nv|default> <color>')", line)
            }
            ColorError::DuplicateBreakpointError { .. } => {
                "Remove one of the rules sharing the same value".to_string()
            }
            ColorError::InvalidDomainForLogScaleError { .. } => {
                "Use -a (absolute logarithmic scaling) for ranges crossing zero".to_string()
            }
            ColorError::NotImplementedError { .. } => {
                "Provide a histogram source or drop histogram equalization".to_string()
            }
            ColorError::MutuallyExclusiveOptionsError { .. } => {
                "Specify only one of the conflicting options".to_string()
            }
            ColorError::MissingOptionError { option } => format!("Specify {}", option),
            ColorError::DonorNotFoundError { .. } => {
                "Make sure the donor dataset has a saved color table".to_string()
            }
            ColorError::TableExistsError { .. } => {
                "Drop -w to overwrite the existing color table".to_string()
            }
            ColorError::InvalidConfigValueError { field, .. }
            | ColorError::ConfigValidationError { field, .. } => {
                format!("Review the '{}' setting", field)
            }
            ColorError::CsvError(_) => "Check the dataset is a well-formed CSV file".to_string(),
            ColorError::IoError(_) => "Check file paths and permissions".to_string(),
            ColorError::SerializationError(_) => {
                "The stored color table is corrupt; remove it with -r".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Dataset problem: {}", self),
            ErrorCategory::Style => format!("Color style problem: {}", self),
            ErrorCategory::Transform => format!("Color transform problem: {}", self),
            ErrorCategory::Configuration => format!("Invalid options: {}", self),
            ErrorCategory::Storage => format!("Color table storage problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ColorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_table_is_low_severity() {
        let err = ColorError::TableExistsError {
            dataset: "roads".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_user_friendly_message_contains_cause() {
        let err = ColorError::UnknownRampError {
            name: "nope".to_string(),
        };
        let msg = err.user_friendly_message();
        assert!(msg.starts_with("Color style problem"));
        assert!(msg.contains("nope"));
    }
}
