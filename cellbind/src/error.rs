//! Error types for the cellbind pipeline.
//!
//! - [`ConfigError`] - Build-time configuration errors (fatal, abort mapping setup)
//! - [`TypeMismatch`] - A stage received a value of the wrong runtime type
//! - [`ProcessError`] - What a single stage or chain execution can return
//! - [`MappingError`] - Row-level errors surfaced by the record mapper
//! - [`CsvError`] - Row source / row sink errors
//! - [`PipelineError`] - Whole-file read and write runs
//!
//! Per-cell validation failures are not errors of their own: they live in
//! [`crate::validation::ValidationFailure`] and are collected per row.
//! Conversion between layers is automatic via `From`, so `?` works across
//! boundaries.

use thiserror::Error;

use crate::validation::ValidationFailure;

// =============================================================================
// Build-time configuration errors
// =============================================================================

/// Errors raised while building processing chains.
///
/// These are never retried and never resolved into end-user messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max < min` for a range constraint.
    #[error("field '{field}': max ({max}) should not be less than min ({min})")]
    InvalidRange {
        field: String,
        min: String,
        max: String,
    },

    /// Range bounds of different value families.
    #[error("field '{field}': bounds '{min}' and '{max}' are not comparable")]
    IncomparableBounds {
        field: String,
        min: String,
        max: String,
    },

    /// A raw configuration value could not be parsed with the field's format.
    #[error("field '{field}': {attribute} value '{value}' cannot be parsed: {reason}")]
    InvalidValue {
        field: String,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    /// A constraint was declared on a value type that does not support it.
    #[error("field '{field}': constraint '{constraint}' is not supported for {value_type} values")]
    UnsupportedConstraint {
        field: String,
        constraint: &'static str,
        value_type: &'static str,
    },

    #[error("field '{field}': invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("field '{field}': unknown locale '{locale}'")]
    InvalidLocale { field: String, locale: String },

    #[error("field '{field}': unknown timezone '{timezone}'")]
    InvalidTimezone { field: String, timezone: String },

    /// The empty-string sentinel used for a non-text field.
    #[error("field '{field}': the empty sentinel can only be used as default for text fields")]
    EmptySentinelNotText { field: String },

    /// A declared constraint conflicts with a custom chain override.
    #[error("field '{field}': constraint '{constraint}' conflicts with chain override '{builder}'")]
    ConflictingOverride {
        field: String,
        builder: String,
        constraint: &'static str,
    },

    #[error("field '{field}': unknown chain override '{builder}'")]
    UnknownOverride { field: String, builder: String },

    /// Two fields claim the same column.
    #[error("column position {position} is used by both '{first}' and '{second}'")]
    DuplicatePosition {
        position: usize,
        first: String,
        second: String,
    },

    #[error("field '{field}': column positions start at 1")]
    InvalidPosition { field: String },

    #[error("enum field '{field}' declares no variants")]
    MissingVariants { field: String },

    /// Invalid JSON mapping document.
    #[error("invalid mapping document: {0}")]
    Document(String),

    /// An environment setting holds an unusable value.
    #[error("setting {name}: invalid value '{value}'")]
    InvalidSetting { name: &'static str, value: String },

    /// Malformed properties text for a message bundle.
    #[error("message bundle line {line}: {reason}")]
    MessageBundle { line: usize, reason: String },
}

// =============================================================================
// Runtime errors
// =============================================================================

/// A stage received a value of an unexpected runtime type.
///
/// This is a programming or configuration defect, not a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("processor '{processor}' expected {expected} but received {actual}")]
pub struct TypeMismatch {
    pub processor: &'static str,
    pub expected: &'static str,
    pub actual: &'static str,
}

impl TypeMismatch {
    pub fn new(processor: &'static str, expected: &'static str, actual: &'static str) -> Self {
        Self {
            processor,
            expected,
            actual,
        }
    }
}

/// Outcome of a failed stage or chain execution.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// Recoverable at row level, resolvable into a user message.
    #[error("validation failed: {0}")]
    Validation(Box<ValidationFailure>),

    #[error(transparent)]
    TypeMismatch(#[from] TypeMismatch),
}

impl From<ValidationFailure> for ProcessError {
    fn from(failure: ValidationFailure) -> Self {
        ProcessError::Validation(Box::new(failure))
    }
}

/// Errors returned by the record mapper.
#[derive(Debug, Error)]
pub enum MappingError {
    /// Chain construction failed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A stage received a value of the wrong type while processing a row.
    #[error("row {row}, column {column}: {source}")]
    TypeMismatch {
        row: usize,
        column: usize,
        #[source]
        source: TypeMismatch,
    },

    /// Strict width is enabled and the row carries more cells than fields.
    #[error("row {row}: {actual} cells found, at most {expected} expected")]
    RowTooWide {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A value was rejected while writing (writers fail fast).
    #[error("write rejected: {0}")]
    Validation(Box<ValidationFailure>),

    /// A record could not be converted from or to JSON.
    #[error("record conversion failed: {0}")]
    Record(#[from] serde_json::Error),

    /// A JSON value cannot be represented by the field's value type.
    #[error("field '{field}': JSON value {value} cannot be converted to {expected}")]
    Conversion {
        field: String,
        expected: &'static str,
        value: String,
    },
}

// =============================================================================
// Row source / sink errors
// =============================================================================

/// Errors reading or writing CSV rows.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to decode input as {0}")]
    Encoding(String),

    #[error("CSV input is empty")]
    EmptyInput,
}

// =============================================================================
// Pipeline errors
// =============================================================================

/// Errors ending a whole-file read or write run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for chain construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for stage execution.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Result type for record mapping.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for row source / sink operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for whole-file runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_into_mapping_error() {
        let err = ConfigError::InvalidRange {
            field: "amount".into(),
            min: "10".into(),
            max: "1".into(),
        };
        let mapping_err: MappingError = err.into();
        let msg = mapping_err.to_string();
        assert!(msg.contains("amount"));
        assert!(msg.contains("max (1)"));
    }

    #[test]
    fn test_type_mismatch_format() {
        let err = TypeMismatch::new("Min", "integer", "text");
        let process_err: ProcessError = err.into();
        assert_eq!(
            process_err.to_string(),
            "processor 'Min' expected integer but received text"
        );
    }

    #[test]
    fn test_csv_error_into_pipeline_error() {
        let err: PipelineError = CsvError::EmptyInput.into();
        assert!(matches!(err, PipelineError::Csv(CsvError::EmptyInput)));
        assert_eq!(err.to_string(), "CSV input is empty");
    }

    #[test]
    fn test_row_too_wide_format() {
        let err = MappingError::RowTooWide {
            row: 3,
            expected: 2,
            actual: 4,
        };
        assert!(err.to_string().contains("row 3"));
    }
}
