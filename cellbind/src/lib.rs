//! # Cellbind - declarative CSV cell conversion and validation
//!
//! Each mapped field declares its type, format and constraints once.
//! Cellbind turns that declaration into a read chain (raw text to typed
//! value) and a write chain (typed value to text), runs every cell of a
//! row through them and reports positioned, localized failures.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   CSV File   │────▶│    Parser    │────▶│ RecordMapper │────▶│   Records    │
//! │ (any encod.) │     │  (RawRow)    │     │ (chains/row) │     │    (JSON)    │
//! └──────────────┘     └──────────────┘     └──────┬───────┘     └──────────────┘
//!                                                  │ failures
//!                                                  ▼
//!                                           ┌──────────────┐
//!                                           │   Message    │
//!                                           │   Resolver   │
//!                                           └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cellbind::{MappingConfig, RecordMapper, RawRow, MessageResolver};
//!
//! let mapping = MappingConfig::from_json(&std::fs::read_to_string("mapping.json")?)?;
//! let mut mapper = RecordMapper::from_config(&mapping)?;
//! let outcome = mapper.read_row(&RawRow::new(2, 2, vec!["1".into(), "Alice".into()]))?;
//! for message in MessageResolver::default().resolve_all(&outcome.failures) {
//!     eprintln!("{}", message.message);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error hierarchy
//! - [`models`] - Cells, raw rows and typed records
//! - [`locale`] - Locale tags, parents and formatting symbols
//! - [`format`] - Per-type formatters and the parse/format stages
//! - [`processor`] - Transform and constraint stages, processing chains
//! - [`mapping`] - Field configuration, chain builder, record mapper
//! - [`validation`] - Failures, message bundles, message resolution
//! - [`parser`] - CSV row source and sink
//! - [`pipeline`] - Whole-file read and write runs
//! - [`config`] - Environment settings
//! - [`logs`] - Logging helpers

// Core modules
pub mod error;
pub mod locale;
pub mod logs;
pub mod models;

// Conversion
pub mod format;
pub mod processor;

// Mapping
pub mod mapping;

// Validation
pub mod validation;

// Input / output
pub mod config;
pub mod parser;
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, CsvError, CsvResult, MappingError, MappingResult, PipelineError,
    PipelineResult, ProcessError, ProcessResult, TypeMismatch,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use locale::Locale;
pub use models::{Cell, CellValue, FieldValue, RawRow, Record};

// =============================================================================
// Re-exports - Chains
// =============================================================================

pub use format::{CellFormatter, ParseMessage};
pub use processor::{CustomProcessor, Direction, ProcessingChain, Processor};

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use mapping::{
    example_mapping, BuildOptions, ChainBuilder, ChainOverride, ConstraintKind, FieldConfig,
    FormatConfig, MappingConfig, RecordMapper, RowOutcome, ValueType, EMPTY_SENTINEL,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    CellContext, FailureKind, MessageBundle, MessageResolver, MessageStore, ResolvedMessage,
    ValidationFailure,
};

// =============================================================================
// Re-exports - I/O
// =============================================================================

pub use config::Settings;
pub use parser::{CsvRowSink, CsvRowSource};
pub use pipeline::{CsvInfo, Pipeline, ReadReport};
