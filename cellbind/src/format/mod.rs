//! Format processors: bidirectional string <-> typed value conversion.
//!
//! A [`CellFormatter`] is built once per field from its value type and
//! format sub-configuration. It is shared (via `Arc`) by the field's
//! [`ParseProcessor`], [`FormatProcessor`] and by every constraint stage,
//! which use it to render values in messages.

pub mod choice;
pub mod number;
pub mod temporal;

use chrono::FixedOffset;
use rust_decimal::Decimal;
use std::sync::Arc;

pub use choice::{BooleanFormat, EnumFormat};
pub use number::NumberFormat;
pub use temporal::{parse_zone, TemporalFormat, TemporalKind};

use crate::error::{ProcessResult, TypeMismatch};
use crate::locale::Locale;
use crate::logs::log_debug;
use crate::mapping::{FormatConfig, ValueType};
use crate::models::{Cell, CellValue};
use crate::validation::{FailureKind, MessageArg, MessageVariables, RejectedValue, ValidationFailure};

/// Converter for one value family.
#[derive(Debug, Clone)]
pub enum CellFormatter {
    Text,
    Boolean(BooleanFormat),
    Integer(NumberFormat),
    Decimal(NumberFormat),
    Temporal(TemporalFormat),
    Enum(EnumFormat),
}

impl CellFormatter {
    /// Build the formatter of a value type.
    ///
    /// Locale and zone are already resolved by the caller.
    pub fn build(
        value_type: ValueType,
        format: Option<&FormatConfig>,
        locale: &Locale,
        zone: FixedOffset,
    ) -> Result<Self, String> {
        let pattern = format.and_then(|f| f.pattern.as_deref());
        let lenient = format.is_some_and(|f| f.lenient);

        let formatter = match value_type {
            ValueType::Text => CellFormatter::Text,
            ValueType::Boolean => CellFormatter::Boolean(BooleanFormat::new(
                format.and_then(|f| f.true_values.as_deref()),
                format.and_then(|f| f.false_values.as_deref()),
                format.and_then(|f| f.ignore_case).unwrap_or(true),
                lenient,
            )?),
            ValueType::Integer => {
                CellFormatter::Integer(NumberFormat::compile(pattern, locale, lenient)?)
            }
            ValueType::Decimal => {
                CellFormatter::Decimal(NumberFormat::compile(pattern, locale, lenient)?)
            }
            ValueType::Date | ValueType::Time | ValueType::DateTime | ValueType::Timestamp => {
                let kind = match value_type {
                    ValueType::Date => TemporalKind::Date,
                    ValueType::Time => TemporalKind::Time,
                    ValueType::DateTime => TemporalKind::DateTime,
                    _ => TemporalKind::Timestamp,
                };
                CellFormatter::Temporal(TemporalFormat::new(
                    kind,
                    pattern,
                    locale.clone(),
                    zone,
                    lenient,
                )?)
            }
            ValueType::Enum => CellFormatter::Enum(EnumFormat::new(
                format.map(|f| f.variants.as_slice()).unwrap_or_default(),
                format.and_then(|f| f.ignore_case).unwrap_or(false),
            )?),
        };
        Ok(formatter)
    }

    /// Family segment of the `cellbind.format.<family>.message` key.
    pub fn family(&self) -> &'static str {
        match self {
            CellFormatter::Text => "text",
            CellFormatter::Boolean(_) => "boolean",
            CellFormatter::Integer(_) | CellFormatter::Decimal(_) => "number",
            CellFormatter::Temporal(_) => "datetime",
            CellFormatter::Enum(_) => "enum",
        }
    }

    /// Name of the value type produced by `parse`.
    pub fn expected(&self) -> &'static str {
        match self {
            CellFormatter::Text => "text",
            CellFormatter::Boolean(_) => "boolean",
            CellFormatter::Integer(_) => "integer",
            CellFormatter::Decimal(_) => "decimal",
            CellFormatter::Temporal(t) => t.kind().type_name(),
            CellFormatter::Enum(_) => "enum",
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            CellFormatter::Integer(n) | CellFormatter::Decimal(n) => n.pattern(),
            CellFormatter::Temporal(t) => Some(t.pattern()),
            _ => None,
        }
    }

    /// Parse a non-empty raw string.
    pub fn parse(&self, raw: &str) -> Result<CellValue, String> {
        match self {
            CellFormatter::Text => Ok(CellValue::Text(raw.to_string())),
            CellFormatter::Boolean(b) => b.parse(raw).map(CellValue::Boolean),
            CellFormatter::Integer(n) => n.parse_integer(raw).map(CellValue::Integer),
            CellFormatter::Decimal(n) => n.parse_decimal(raw).map(CellValue::Decimal),
            CellFormatter::Temporal(t) => t.parse(raw),
            CellFormatter::Enum(e) => e.parse(raw).map(CellValue::Enum),
        }
    }

    /// Render a value of this formatter's type.
    pub fn format(&self, value: &CellValue) -> Result<String, TypeMismatch> {
        let rendered = match (self, value) {
            (CellFormatter::Text, CellValue::Text(s)) => Some(s.clone()),
            (CellFormatter::Boolean(b), CellValue::Boolean(v)) => Some(b.format(*v).to_string()),
            (CellFormatter::Integer(n), CellValue::Integer(i)) => Some(n.format_integer(*i)),
            (CellFormatter::Decimal(n), CellValue::Decimal(d)) => Some(n.format_decimal(d)),
            (CellFormatter::Decimal(n), CellValue::Integer(i)) => {
                Some(n.format_decimal(&Decimal::from(*i)))
            }
            (CellFormatter::Temporal(t), v) => t.format(v),
            (CellFormatter::Enum(_), CellValue::Enum(name)) => Some(name.clone()),
            _ => None,
        };
        rendered.ok_or_else(|| TypeMismatch::new("Format", self.expected(), value.type_name()))
    }

    /// Display form for messages; falls back to the value's own rendering.
    pub fn display(&self, value: &CellValue) -> String {
        self.format(value).unwrap_or_else(|_| value.to_string())
    }

    /// Variables describing the expected format, attached to parse failures.
    pub fn message_variables(&self) -> MessageVariables {
        let mut vars = MessageVariables::new();
        if let Some(pattern) = self.pattern() {
            vars.insert("pattern".to_string(), MessageArg::text(pattern));
        }
        match self {
            CellFormatter::Boolean(b) => {
                vars.insert("trueValues".to_string(), list_arg(b.true_values()));
                vars.insert("falseValues".to_string(), list_arg(b.false_values()));
            }
            CellFormatter::Enum(e) => {
                vars.insert("enums".to_string(), list_arg(e.variants()));
            }
            _ => {}
        }
        vars
    }
}

fn list_arg(values: &[String]) -> MessageArg {
    MessageArg::new(
        serde_json::Value::from(values.to_vec()),
        values.join(", "),
    )
}

// =============================================================================
// Stages
// =============================================================================

/// Which template a parse failure uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseMessage {
    /// No format sub-configuration.
    Generic,
    /// Format sub-configuration without a message.
    Family,
    /// Field-level template.
    Custom(String),
}

impl ParseMessage {
    /// An explicitly empty message falls back to the generic key.
    pub fn for_format(format: Option<&FormatConfig>) -> Self {
        match format.map(|f| f.message.as_deref()) {
            None | Some(Some("")) => ParseMessage::Generic,
            Some(None) => ParseMessage::Family,
            Some(Some(message)) => ParseMessage::Custom(message.to_string()),
        }
    }
}

/// Read stage turning raw text into a typed value.
#[derive(Debug, Clone)]
pub struct ParseProcessor {
    formatter: Arc<CellFormatter>,
    message: ParseMessage,
}

impl ParseProcessor {
    pub const MESSAGE_KEY: &'static str = "cellbind.ParseProcessor.violated";

    pub fn new(formatter: Arc<CellFormatter>, message: ParseMessage) -> Self {
        Self { formatter, message }
    }

    pub fn formatter(&self) -> &CellFormatter {
        &self.formatter
    }

    /// Key looked up in the message store.
    pub fn message_key(&self) -> String {
        match self.message {
            ParseMessage::Family => format!("cellbind.format.{}.message", self.formatter.family()),
            _ => Self::MESSAGE_KEY.to_string(),
        }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        match cell {
            Cell::Absent => Ok(Cell::Absent),
            Cell::Raw(raw) if raw.is_empty() => Ok(Cell::Absent),
            Cell::Raw(raw) => match self.formatter.parse(&raw) {
                Ok(value) => Ok(Cell::Typed(value)),
                Err(reason) => {
                    log_debug(format!("Parse failed: {}", reason));
                    let mut failure = ValidationFailure::new(
                        FailureKind::Parse,
                        self.message_key(),
                        RejectedValue::Raw(raw),
                    )
                    .with_variables(self.formatter.message_variables());
                    if let ParseMessage::Custom(template) = &self.message {
                        failure = failure.with_template(template.clone());
                    }
                    Err(failure.into())
                }
            },
            // An `@empty` default on a text field arrives already typed.
            Cell::Typed(CellValue::Text(s)) if matches!(*self.formatter, CellFormatter::Text) => {
                Ok(Cell::Typed(CellValue::Text(s)))
            }
            Cell::Typed(value) => {
                Err(TypeMismatch::new("Parse", "raw text", value.type_name()).into())
            }
        }
    }
}

/// Write stage turning a typed value into text.
#[derive(Debug, Clone)]
pub struct FormatProcessor {
    formatter: Arc<CellFormatter>,
}

impl FormatProcessor {
    pub fn new(formatter: Arc<CellFormatter>) -> Self {
        Self { formatter }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        match cell {
            Cell::Absent => Ok(Cell::Absent),
            Cell::Typed(value) => Ok(Cell::Raw(self.formatter.format(&value)?)),
            Cell::Raw(_) => Err(TypeMismatch::new("Format", self.formatter.expected(), "raw").into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use chrono::NaiveDate;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn formatter(value_type: ValueType, format: Option<&FormatConfig>) -> Arc<CellFormatter> {
        Arc::new(CellFormatter::build(value_type, format, &Locale::root(), utc()).unwrap())
    }

    fn parse_failure(stage: &ParseProcessor, raw: &str) -> ValidationFailure {
        match stage.execute(Cell::Raw(raw.to_string())) {
            Err(ProcessError::Validation(f)) => *f,
            other => panic!("expected a validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_datetime_default_pattern() {
        let stage = ParseProcessor::new(formatter(ValueType::DateTime, None), ParseMessage::Generic);
        let cell = stage.execute(Cell::Raw("2016-02-29 07:12:01".into())).unwrap();
        let expected = NaiveDate::from_ymd_opt(2016, 2, 29)
            .unwrap()
            .and_hms_opt(7, 12, 1)
            .unwrap();
        assert_eq!(cell, Cell::Typed(CellValue::DateTime(expected)));
    }

    #[test]
    fn test_generic_parse_failure() {
        let stage = ParseProcessor::new(formatter(ValueType::DateTime, None), ParseMessage::Generic);
        let failure = parse_failure(&stage, "abc");
        assert!(failure.is_parse_error());
        assert_eq!(failure.message_key(), "cellbind.ParseProcessor.violated");
        assert_eq!(failure.variable("pattern"), Some(&json!("yyyy-MM-dd HH:mm:ss")));
        assert_eq!(failure.validated_value, "abc");
    }

    #[test]
    fn test_family_and_custom_messages() {
        let format = FormatConfig::default().with_pattern("yy/M/d H:m:s");
        let message = ParseMessage::for_format(Some(&format));
        let stage = ParseProcessor::new(formatter(ValueType::DateTime, Some(&format)), message);
        assert_eq!(
            parse_failure(&stage, "abc").message_key(),
            "cellbind.format.datetime.message"
        );

        let format = format.with_message("bad date {validatedValue}");
        let message = ParseMessage::for_format(Some(&format));
        assert_eq!(message, ParseMessage::Custom("bad date {validatedValue}".into()));
        let stage = ParseProcessor::new(formatter(ValueType::DateTime, Some(&format)), message);
        assert_eq!(
            parse_failure(&stage, "abc").message_key(),
            "bad date {validatedValue}"
        );

        let empty = FormatConfig::default().with_message("");
        assert_eq!(ParseMessage::for_format(Some(&empty)), ParseMessage::Generic);
        assert_eq!(
            ParseMessage::for_format(Some(&FormatConfig::default())),
            ParseMessage::Family
        );
    }

    #[test]
    fn test_empty_and_absent_pass_through() {
        let stage = ParseProcessor::new(formatter(ValueType::Integer, None), ParseMessage::Generic);
        assert_eq!(stage.execute(Cell::Absent).unwrap(), Cell::Absent);
        assert_eq!(stage.execute(Cell::Raw(String::new())).unwrap(), Cell::Absent);
    }

    #[test]
    fn test_parse_rejects_typed_non_text() {
        let stage = ParseProcessor::new(formatter(ValueType::Integer, None), ParseMessage::Generic);
        let result = stage.execute(Cell::Typed(CellValue::Integer(1)));
        assert!(matches!(result, Err(ProcessError::TypeMismatch(_))));

        let text = ParseProcessor::new(formatter(ValueType::Text, None), ParseMessage::Generic);
        let empty = Cell::Typed(CellValue::Text(String::new()));
        assert_eq!(text.execute(empty.clone()).unwrap(), empty);
    }

    #[test]
    fn test_format_stage() {
        let format = FormatConfig::default().with_pattern("#,###");
        let stage = FormatProcessor::new(formatter(ValueType::Integer, Some(&format)));
        assert_eq!(
            stage.execute(Cell::Typed(CellValue::Integer(1000))).unwrap(),
            Cell::Raw("1,000".into())
        );
        assert_eq!(stage.execute(Cell::Absent).unwrap(), Cell::Absent);

        let mismatch = stage.execute(Cell::Typed(CellValue::Text("x".into())));
        assert!(matches!(mismatch, Err(ProcessError::TypeMismatch(_))));
    }

    #[test]
    fn test_boolean_and_enum_variables() {
        let boolean = formatter(ValueType::Boolean, None);
        let vars = boolean.message_variables();
        assert_eq!(vars["trueValues"].display, "true, 1, yes, on, y, t");

        let format = FormatConfig::default().with_variants(&["Red", "Green"]);
        let colors = formatter(ValueType::Enum, Some(&format));
        assert_eq!(colors.message_variables()["enums"].display, "Red, Green");
        assert_eq!(colors.family(), "enum");
    }

    #[test]
    fn test_build_errors() {
        let bad = FormatConfig::default().with_pattern("yyyy-qq");
        assert!(CellFormatter::build(ValueType::Date, Some(&bad), &Locale::root(), utc()).is_err());
        assert!(CellFormatter::build(ValueType::Enum, None, &Locale::root(), utc()).is_err());
    }
}
