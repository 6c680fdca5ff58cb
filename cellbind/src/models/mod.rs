//! Domain models shared by every stage of the pipeline.
//!
//! - [`CellValue`] - A typed value produced by parsing a cell
//! - [`Cell`] - The value flowing between the stages of one chain
//! - [`RawRow`] - One row handed over by a row source
//! - [`Record`] - The typed result of reading one row

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Typed values
// =============================================================================

/// A typed cell value.
///
/// Every variant is `Eq + Hash` so values can be tracked by the unique
/// constraint without lossy keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Text(String),
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    /// An instant, normalized to UTC.
    Timestamp(DateTime<Utc>),
    /// Canonical name of an enumerated variant.
    Enum(String),
}

impl CellValue {
    /// Short name of the value family, used in type mismatch reports.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Text(_) => "text",
            CellValue::Boolean(_) => "boolean",
            CellValue::Integer(_) => "integer",
            CellValue::Decimal(_) => "decimal",
            CellValue::Date(_) => "date",
            CellValue::Time(_) => "time",
            CellValue::DateTime(_) => "datetime",
            CellValue::Timestamp(_) => "timestamp",
            CellValue::Enum(_) => "enum",
        }
    }

    /// Compare two values of the same family.
    ///
    /// Returns `None` when the families differ or the family has no order.
    pub fn compare(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => Some(a.cmp(b)),
            (CellValue::Decimal(a), CellValue::Decimal(b)) => Some(a.cmp(b)),
            (CellValue::Integer(a), CellValue::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
            (CellValue::Decimal(a), CellValue::Integer(b)) => Some(a.cmp(&Decimal::from(*b))),
            (CellValue::Date(a), CellValue::Date(b)) => Some(a.cmp(b)),
            (CellValue::Time(a), CellValue::Time(b)) => Some(a.cmp(b)),
            (CellValue::DateTime(a), CellValue::DateTime(b)) => Some(a.cmp(b)),
            (CellValue::Timestamp(a), CellValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert to JSON for record output and message variables.
    ///
    /// Decimals are emitted as strings to keep their exact scale.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Text(s) | CellValue::Enum(s) => Value::String(s.clone()),
            CellValue::Boolean(b) => Value::Bool(*b),
            CellValue::Integer(i) => Value::Number((*i).into()),
            CellValue::Decimal(d) => Value::String(d.to_string()),
            CellValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            CellValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            CellValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            CellValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) | CellValue::Enum(s) => f.write_str(s),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Decimal(d) => write!(f, "{}", d),
            CellValue::Date(d) => write!(f, "{}", d),
            CellValue::Time(t) => write!(f, "{}", t),
            CellValue::DateTime(dt) => write!(f, "{}", dt),
            CellValue::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

// =============================================================================
// Chain values
// =============================================================================

/// The value passed from one stage of a processing chain to the next.
///
/// Read chains start from `Raw`/`Absent` and end with `Typed`/`Absent`;
/// write chains go the other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Absent,
    Raw(String),
    Typed(CellValue),
}

impl Cell {
    /// Wrap an optional raw cell as handed over by a row source.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) => Cell::Raw(s.to_string()),
            None => Cell::Absent,
        }
    }

    /// Wrap an optional typed value as handed over by a caller writing a record.
    pub fn from_value(value: Option<CellValue>) -> Self {
        match value {
            Some(v) => Cell::Typed(v),
            None => Cell::Absent,
        }
    }

    /// `Absent` or an empty raw string.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Absent => true,
            Cell::Raw(s) => s.is_empty(),
            Cell::Typed(_) => false,
        }
    }

    /// Terminal value of a read chain.
    ///
    /// A raw string that was never parsed (custom chains) is kept as text.
    pub fn into_value(self) -> Option<CellValue> {
        match self {
            Cell::Absent => None,
            Cell::Raw(s) => Some(CellValue::Text(s)),
            Cell::Typed(v) => Some(v),
        }
    }

    /// Terminal value of a write chain.
    pub fn into_raw(self) -> Option<String> {
        match self {
            Cell::Absent => None,
            Cell::Raw(s) => Some(s),
            Cell::Typed(v) => Some(v.to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Cell::Absent => "absent",
            Cell::Raw(_) => "raw",
            Cell::Typed(v) => v.type_name(),
        }
    }
}

// =============================================================================
// Rows and records
// =============================================================================

/// One row as produced by a row source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Physical line where the record starts (1-based).
    pub line_number: usize,
    /// Logical record number, header included (1-based).
    pub row_number: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    pub fn new(line_number: usize, row_number: usize, cells: Vec<String>) -> Self {
        Self {
            line_number,
            row_number,
            cells,
        }
    }

    /// Cell at a 1-based column position, `None` when the row is too short.
    pub fn cell(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
    }
}

/// A named, typed value inside a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub name: String,
    pub position: usize,
    pub value: Option<CellValue>,
}

/// The typed result of reading one row, fields in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub fields: Vec<FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, position: usize, value: Option<CellValue>) {
        self.fields.push(FieldValue {
            name: name.into(),
            position,
            value,
        });
    }

    /// Value of a field by name.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_ref())
    }

    /// JSON object keyed by field name, absent values as `null`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                let v = f.value.as_ref().map(CellValue::to_json).unwrap_or(Value::Null);
                (f.name.clone(), v)
            })
            .collect();
        Value::Object(map)
    }

    /// Deserialize into a caller-defined struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_same_family() {
        let a = CellValue::Integer(1);
        let b = CellValue::Integer(2);
        assert_eq!(a.compare(&b), Some(Ordering::Less));
        assert_eq!(
            CellValue::Decimal(Decimal::new(15, 1)).compare(&CellValue::Integer(1)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_mixed_family_is_none() {
        let a = CellValue::Integer(1);
        let b = CellValue::Text("1".to_string());
        assert_eq!(a.compare(&b), None);
        assert_eq!(CellValue::Boolean(true).compare(&CellValue::Boolean(false)), None);
    }

    #[test]
    fn test_cell_missing() {
        assert!(Cell::Absent.is_missing());
        assert!(Cell::Raw(String::new()).is_missing());
        assert!(!Cell::Raw(" ".to_string()).is_missing());
        assert!(!Cell::Typed(CellValue::Text(String::new())).is_missing());
    }

    #[test]
    fn test_row_cell_positions() {
        let row = RawRow::new(1, 2, vec!["a".into(), "b".into()]);
        assert_eq!(row.cell(1), Some("a"));
        assert_eq!(row.cell(2), Some("b"));
        assert_eq!(row.cell(3), None);
        assert_eq!(row.cell(0), None);
    }

    #[test]
    fn test_record_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Item {
            id: i64,
            name: Option<String>,
            born: NaiveDate,
        }

        let mut record = Record::new();
        record.push("id", 1, Some(CellValue::Integer(7)));
        record.push("name", 2, None);
        record.push(
            "born",
            3,
            Some(CellValue::Date(NaiveDate::from_ymd_opt(2016, 2, 29).unwrap())),
        );

        assert_eq!(
            record.to_json(),
            json!({ "id": 7, "name": null, "born": "2016-02-29" })
        );

        let item: Item = record.deserialize().unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.name, None);
        assert_eq!(item.born, NaiveDate::from_ymd_opt(2016, 2, 29).unwrap());
    }
}
