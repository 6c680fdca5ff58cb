//! Raw string stages: trimming and default substitution.

use crate::error::{ProcessResult, TypeMismatch};
use crate::mapping::EMPTY_SENTINEL;
use crate::models::{Cell, CellValue};

/// Strips leading and trailing whitespace from raw text.
#[derive(Debug, Clone, Default)]
pub struct Trim;

impl Trim {
    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        match cell {
            Cell::Raw(s) => Ok(Cell::Raw(s.trim().to_string())),
            Cell::Typed(CellValue::Text(s)) => Ok(Cell::Typed(CellValue::Text(s))),
            Cell::Absent => Ok(Cell::Absent),
            Cell::Typed(value) => {
                Err(TypeMismatch::new("Trim", "raw text", value.type_name()).into())
            }
        }
    }
}

/// What a default substitutes for a missing cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSubstitute {
    /// The `@empty` sentinel: a true empty string.
    Empty,
    Text(String),
}

impl DefaultSubstitute {
    pub fn from_config(value: &str) -> Self {
        if value == EMPTY_SENTINEL {
            DefaultSubstitute::Empty
        } else {
            DefaultSubstitute::Text(value.to_string())
        }
    }
}

/// Replaces a missing cell by a configured value.
///
/// When reading, a text default goes on to be parsed like any cell and the
/// empty sentinel becomes an already typed empty text. When writing, both
/// become raw output.
#[derive(Debug, Clone)]
pub struct DefaultValue {
    substitute: DefaultSubstitute,
    read: bool,
}

impl DefaultValue {
    pub fn for_read(substitute: DefaultSubstitute) -> Self {
        Self {
            substitute,
            read: true,
        }
    }

    pub fn for_write(substitute: DefaultSubstitute) -> Self {
        Self {
            substitute,
            read: false,
        }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        let missing = if self.read {
            cell.is_missing()
        } else {
            cell == Cell::Absent
        };
        if !missing {
            return Ok(cell);
        }

        Ok(match (&self.substitute, self.read) {
            (DefaultSubstitute::Empty, true) => Cell::Typed(CellValue::Text(String::new())),
            (DefaultSubstitute::Empty, false) => Cell::Raw(String::new()),
            (DefaultSubstitute::Text(text), _) => Cell::Raw(text.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        let trim = Trim;
        assert_eq!(trim.execute(Cell::Raw("  a b \t".into())).unwrap(), Cell::Raw("a b".into()));
        assert_eq!(trim.execute(Cell::Absent).unwrap(), Cell::Absent);
        assert!(trim.execute(Cell::Typed(CellValue::Integer(1))).is_err());
    }

    #[test]
    fn test_read_default() {
        let stage = DefaultValue::for_read(DefaultSubstitute::from_config("42"));
        assert_eq!(stage.execute(Cell::Absent).unwrap(), Cell::Raw("42".into()));
        assert_eq!(stage.execute(Cell::Raw(String::new())).unwrap(), Cell::Raw("42".into()));
        assert_eq!(stage.execute(Cell::Raw("7".into())).unwrap(), Cell::Raw("7".into()));
    }

    #[test]
    fn test_empty_sentinel() {
        assert_eq!(DefaultSubstitute::from_config("@empty"), DefaultSubstitute::Empty);

        let read = DefaultValue::for_read(DefaultSubstitute::Empty);
        assert_eq!(
            read.execute(Cell::Absent).unwrap(),
            Cell::Typed(CellValue::Text(String::new()))
        );

        let write = DefaultValue::for_write(DefaultSubstitute::Empty);
        assert_eq!(write.execute(Cell::Absent).unwrap(), Cell::Raw(String::new()));
    }

    #[test]
    fn test_write_default_only_for_absent() {
        let stage = DefaultValue::for_write(DefaultSubstitute::from_config("n/a"));
        assert_eq!(stage.execute(Cell::Absent).unwrap(), Cell::Raw("n/a".into()));
        assert_eq!(stage.execute(Cell::Raw(String::new())).unwrap(), Cell::Raw(String::new()));
    }
}
