//! Record mapping
//!
//! A [`RecordMapper`] owns the read and write chains of every mapped field
//! and drives whole rows through them:
//!
//! - reading aggregates every failure of the row, field by field, in
//!   column order
//! - writing stops at the first rejected value

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use super::builder::ChainBuilder;
use super::field::{FieldConfig, MappingConfig, ValueType};
use crate::error::{ConfigError, ConfigResult, MappingError, MappingResult, ProcessError};
use crate::format::CellFormatter;
use crate::logs::{log_debug, log_warning_indent};
use crate::models::{Cell, CellValue, RawRow, Record};
use crate::processor::ProcessingChain;
use crate::validation::{CellContext, ValidationFailure};

/// A mapped field with its chains.
#[derive(Debug)]
struct FieldBinding {
    config: FieldConfig,
    formatter: Arc<CellFormatter>,
    read: ProcessingChain,
    write: ProcessingChain,
}

/// Result of reading one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    /// Every field in column order; rejected fields are `None`.
    pub record: Record,
    pub failures: Vec<ValidationFailure>,
}

impl RowOutcome {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Maps raw rows to typed records and back.
#[derive(Debug)]
pub struct RecordMapper {
    fields: Vec<FieldBinding>,
    strict_width: bool,
    width: usize,
}

impl RecordMapper {
    /// Build every chain of a mapping.
    ///
    /// Positions must be at least 1 and unique.
    pub fn new(mapping: &MappingConfig, builder: &ChainBuilder) -> ConfigResult<Self> {
        let mut by_position: HashMap<usize, &str> = HashMap::new();
        for field in &mapping.fields {
            if field.position == 0 {
                return Err(ConfigError::InvalidPosition {
                    field: field.name.clone(),
                });
            }
            if let Some(first) = by_position.insert(field.position, &field.name) {
                return Err(ConfigError::DuplicatePosition {
                    position: field.position,
                    first: first.to_string(),
                    second: field.name.clone(),
                });
            }
        }

        let fields = mapping
            .sorted_fields()
            .into_iter()
            .map(|config| {
                Ok(FieldBinding {
                    formatter: builder.formatter(config)?,
                    read: builder.build_read(config)?,
                    write: builder.build_write(config)?,
                    config: config.clone(),
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        let width = fields.iter().map(|f| f.config.position).max().unwrap_or(0);
        Ok(Self {
            fields,
            strict_width: mapping.strict_width,
            width,
        })
    }

    /// Build with default options and no chain overrides.
    pub fn from_config(mapping: &MappingConfig) -> ConfigResult<Self> {
        Self::new(mapping, &ChainBuilder::default())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Highest mapped column position.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter().map(|f| &f.config)
    }

    /// `(field, read chain, write chain)` in column order.
    pub fn chains(&self) -> impl Iterator<Item = (&FieldConfig, &ProcessingChain, &ProcessingChain)> {
        self.fields.iter().map(|f| (&f.config, &f.read, &f.write))
    }

    /// Read one row into a record, collecting every failure of the row.
    ///
    /// Missing trailing cells are absent. Extra cells are ignored unless
    /// the mapping is strict about width.
    pub fn read_row(&mut self, row: &RawRow) -> MappingResult<RowOutcome> {
        if row.cells.len() > self.width {
            if self.strict_width {
                return Err(MappingError::RowTooWide {
                    row: row.row_number,
                    expected: self.width,
                    actual: row.cells.len(),
                });
            }
            log_debug(format!(
                "Row {}: ignoring {} extra cell(s)",
                row.row_number,
                row.cells.len() - self.width
            ));
        }

        let mut record = Record::new();
        let mut failures = Vec::new();

        for field in &mut self.fields {
            let position = field.config.position;
            let context = CellContext::new(
                row.line_number,
                row.row_number,
                position,
                field.config.label(),
            );
            let cell = Cell::from_raw(row.cell(position));

            let value = match field.read.execute(cell, &context) {
                Ok(cell) => cell.into_value(),
                Err(ProcessError::Validation(failure)) => {
                    failures.push(*failure);
                    None
                }
                Err(ProcessError::TypeMismatch(source)) => {
                    return Err(MappingError::TypeMismatch {
                        row: row.row_number,
                        column: position,
                        source,
                    });
                }
            };
            record.push(field.config.name.clone(), position, value);
        }

        if !failures.is_empty() {
            log_warning_indent(
                format!("Row {}: {} invalid cell(s)", row.row_number, failures.len()),
                1,
            );
        }
        Ok(RowOutcome { record, failures })
    }

    /// Write a record as one optional cell per field, in column order.
    pub fn write_record(
        &mut self,
        record: &Record,
        row_number: usize,
    ) -> MappingResult<Vec<Option<String>>> {
        let mut cells = Vec::with_capacity(self.fields.len());
        for field in &mut self.fields {
            let position = field.config.position;
            let context = CellContext::new(row_number, row_number, position, field.config.label());
            let cell = Cell::from_value(record.get(&field.config.name).cloned());

            match field.write.execute(cell, &context) {
                Ok(cell) => cells.push(cell.into_raw()),
                Err(ProcessError::Validation(failure)) => {
                    return Err(MappingError::Validation(failure));
                }
                Err(ProcessError::TypeMismatch(source)) => {
                    return Err(MappingError::TypeMismatch {
                        row: row_number,
                        column: position,
                        source,
                    });
                }
            }
        }
        Ok(cells)
    }

    /// Build a record from a JSON object keyed by field name.
    ///
    /// Accepts the same representation [`Record::to_json`] produces.
    pub fn record_from_json(&self, value: &Value) -> MappingResult<Record> {
        let object = value.as_object().ok_or_else(|| MappingError::Conversion {
            field: String::new(),
            expected: "object",
            value: value.to_string(),
        })?;

        let mut record = Record::new();
        for field in &self.fields {
            let json = object.get(&field.config.name).unwrap_or(&Value::Null);
            let typed = json_to_value(field, json)?;
            record.push(field.config.name.clone(), field.config.position, typed);
        }
        Ok(record)
    }

    /// Build a record from any serializable struct.
    pub fn record_from<T: Serialize>(&self, value: &T) -> MappingResult<Record> {
        let json = serde_json::to_value(value)?;
        self.record_from_json(&json)
    }

    /// Forget values seen by unique constraints, in both directions.
    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.read.reset();
            field.write.reset();
        }
    }
}

fn json_to_value(field: &FieldBinding, json: &Value) -> MappingResult<Option<CellValue>> {
    let value_type = field.config.value_type;
    let conversion = || MappingError::Conversion {
        field: field.config.name.clone(),
        expected: value_type.name(),
        value: json.to_string(),
    };

    if json.is_null() {
        return Ok(None);
    }

    let value = match (value_type, json) {
        (ValueType::Text, Value::String(s)) => CellValue::Text(s.clone()),
        (ValueType::Boolean, Value::Bool(b)) => CellValue::Boolean(*b),
        (ValueType::Integer, Value::Number(n)) => {
            CellValue::Integer(n.as_i64().ok_or_else(conversion)?)
        }
        (ValueType::Decimal, Value::String(s)) => {
            CellValue::Decimal(Decimal::from_str_exact(s).map_err(|_| conversion())?)
        }
        (ValueType::Decimal, Value::Number(n)) => {
            CellValue::Decimal(Decimal::from_str(&n.to_string()).map_err(|_| conversion())?)
        }
        (ValueType::Date, Value::String(s)) => {
            CellValue::Date(NaiveDate::from_str(s).map_err(|_| conversion())?)
        }
        (ValueType::Time, Value::String(s)) => {
            CellValue::Time(NaiveTime::from_str(s).map_err(|_| conversion())?)
        }
        (ValueType::DateTime, Value::String(s)) => {
            CellValue::DateTime(NaiveDateTime::from_str(s).map_err(|_| conversion())?)
        }
        (ValueType::Timestamp, Value::String(s)) => CellValue::Timestamp(
            DateTime::parse_from_rfc3339(s)
                .map_err(|_| conversion())?
                .with_timezone(&Utc),
        ),
        (ValueType::Enum, Value::String(s)) => match field.formatter.as_ref() {
            CellFormatter::Enum(e) if e.contains(s) => CellValue::Enum(s.clone()),
            _ => return Err(conversion()),
        },
        _ => return Err(conversion()),
    };
    Ok(Some(value))
}
