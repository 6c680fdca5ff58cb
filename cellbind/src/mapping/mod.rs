//! Column mappings: field configuration, chain construction and the
//! record mapper driving rows through the chains.

pub mod builder;
pub mod field;
pub mod mapper;

pub use builder::{BuildOptions, ChainBuilder, ChainOverride};
pub use field::{
    example_mapping, ConstraintKind, FieldConfig, FormatConfig, MappingConfig, ValueType,
    EMPTY_SENTINEL,
};
pub use mapper::{RecordMapper, RowOutcome};
