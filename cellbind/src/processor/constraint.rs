//! Constraint stages.
//!
//! Every constraint lets an absent cell through untouched, rejects raw
//! (unparsed) input as a type mismatch, and renders its parameters with the
//! field's formatter when building message variables.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use super::Direction;
use crate::error::{ConfigError, ConfigResult, ProcessResult, TypeMismatch};
use crate::format::CellFormatter;
use crate::models::{Cell, CellValue};
use crate::validation::{FailureKind, MessageArg, RejectedValue, ValidationFailure};

/// Typed value of a cell, `None` when absent.
fn typed<'a>(processor: &'static str, cell: &'a Cell) -> ProcessResult<Option<&'a CellValue>> {
    match cell {
        Cell::Absent => Ok(None),
        Cell::Typed(value) => Ok(Some(value)),
        Cell::Raw(_) => Err(TypeMismatch::new(processor, "typed value", "raw text").into()),
    }
}

fn compare(
    processor: &'static str,
    value: &CellValue,
    bound: &CellValue,
) -> ProcessResult<Ordering> {
    value
        .compare(bound)
        .ok_or_else(|| TypeMismatch::new(processor, bound.type_name(), value.type_name()).into())
}

fn rejection(key: &str, value: &CellValue, printer: &CellFormatter) -> ValidationFailure {
    ValidationFailure::new(
        FailureKind::Constraint,
        key,
        RejectedValue::Typed(value.clone()),
    )
    .with_validated_value(printer.display(value))
}

fn bound_arg(bound: &CellValue, printer: &CellFormatter) -> MessageArg {
    MessageArg::cell(bound, printer.display(bound))
}

// =============================================================================
// Bounds
// =============================================================================

/// Inclusive lower bound.
#[derive(Debug, Clone)]
pub struct Min {
    min: CellValue,
    printer: Arc<CellFormatter>,
}

impl Min {
    pub const MESSAGE_KEY: &'static str = "cellbind.Min.violated";

    pub fn new(min: CellValue, printer: Arc<CellFormatter>) -> Self {
        Self { min, printer }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        if let Some(value) = typed("Min", &cell)? {
            if compare("Min", value, &self.min)? == Ordering::Less {
                return Err(rejection(Self::MESSAGE_KEY, value, &self.printer)
                    .with_var("min", bound_arg(&self.min, &self.printer))
                    .into());
            }
        }
        Ok(cell)
    }
}

/// Inclusive upper bound.
#[derive(Debug, Clone)]
pub struct Max {
    max: CellValue,
    printer: Arc<CellFormatter>,
}

impl Max {
    pub const MESSAGE_KEY: &'static str = "cellbind.Max.violated";

    pub fn new(max: CellValue, printer: Arc<CellFormatter>) -> Self {
        Self { max, printer }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        if let Some(value) = typed("Max", &cell)? {
            if compare("Max", value, &self.max)? == Ordering::Greater {
                return Err(rejection(Self::MESSAGE_KEY, value, &self.printer)
                    .with_var("max", bound_arg(&self.max, &self.printer))
                    .into());
            }
        }
        Ok(cell)
    }
}

/// Both bounds, inclusive or exclusive together.
#[derive(Debug, Clone)]
pub struct NumberRange {
    min: CellValue,
    max: CellValue,
    inclusive: bool,
    printer: Arc<CellFormatter>,
}

impl NumberRange {
    pub const MESSAGE_KEY: &'static str = "cellbind.NumberRange.violated";

    /// Fails when the bounds are not comparable or `max < min`.
    pub fn new(
        field: &str,
        min: CellValue,
        max: CellValue,
        inclusive: bool,
        printer: Arc<CellFormatter>,
    ) -> ConfigResult<Self> {
        match min.compare(&max) {
            None => Err(ConfigError::IncomparableBounds {
                field: field.to_string(),
                min: printer.display(&min),
                max: printer.display(&max),
            }),
            Some(Ordering::Greater) => Err(ConfigError::InvalidRange {
                field: field.to_string(),
                min: printer.display(&min),
                max: printer.display(&max),
            }),
            Some(_) => Ok(Self {
                min,
                max,
                inclusive,
                printer,
            }),
        }
    }

    pub fn min(&self) -> &CellValue {
        &self.min
    }

    pub fn max(&self) -> &CellValue {
        &self.max
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        if let Some(value) = typed("NumberRange", &cell)? {
            let above_min = compare("NumberRange", value, &self.min)?;
            let below_max = compare("NumberRange", value, &self.max)?;
            let in_range = if self.inclusive {
                above_min != Ordering::Less && below_max != Ordering::Greater
            } else {
                above_min == Ordering::Greater && below_max == Ordering::Less
            };
            if !in_range {
                return Err(rejection(Self::MESSAGE_KEY, value, &self.printer)
                    .with_var("min", bound_arg(&self.min, &self.printer))
                    .with_var("max", bound_arg(&self.max, &self.printer))
                    .with_var("inclusive", MessageArg::flag(self.inclusive))
                    .into());
            }
        }
        Ok(cell)
    }
}

// =============================================================================
// Equality and uniqueness
// =============================================================================

#[derive(Debug, Clone)]
pub struct Equals {
    expected: CellValue,
    printer: Arc<CellFormatter>,
}

impl Equals {
    pub const MESSAGE_KEY: &'static str = "cellbind.Equals.violated";

    pub fn new(expected: CellValue, printer: Arc<CellFormatter>) -> Self {
        Self { expected, printer }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        if let Some(value) = typed("Equals", &cell)? {
            if value.type_name() != self.expected.type_name() {
                return Err(TypeMismatch::new(
                    "Equals",
                    self.expected.type_name(),
                    value.type_name(),
                )
                .into());
            }
            if *value != self.expected {
                return Err(rejection(Self::MESSAGE_KEY, value, &self.printer)
                    .with_var("equalsValue", bound_arg(&self.expected, &self.printer))
                    .into());
            }
        }
        Ok(cell)
    }
}

/// Rejects a value already seen by this stage instance.
///
/// Remembers the row each value was first seen at until [`Unique::reset`].
#[derive(Debug, Clone)]
pub struct Unique {
    seen: HashMap<CellValue, usize>,
    printer: Arc<CellFormatter>,
}

impl Unique {
    pub const MESSAGE_KEY: &'static str = "cellbind.Unique.violated";

    pub fn new(printer: Arc<CellFormatter>) -> Self {
        Self {
            seen: HashMap::new(),
            printer,
        }
    }

    pub fn execute(&mut self, cell: Cell, row_number: usize) -> ProcessResult<Cell> {
        if let Some(value) = typed("Unique", &cell)? {
            if let Some(first_row) = self.seen.get(value) {
                return Err(rejection(Self::MESSAGE_KEY, value, &self.printer)
                    .with_var("duplicatedRowNumber", MessageArg::count(*first_row))
                    .into());
            }
            self.seen.insert(value.clone(), row_number);
        }
        Ok(cell)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }
}

// =============================================================================
// Presence
// =============================================================================

/// Fails when a required cell is missing.
///
/// Reading treats an empty raw string as missing; writing only the
/// absence of a value, so an `@empty` default can be written.
#[derive(Debug, Clone)]
pub struct Required {
    direction: Direction,
}

impl Required {
    pub const MESSAGE_KEY: &'static str = "cellbind.RequiredProcessor.violated";

    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn execute(&self, cell: Cell) -> ProcessResult<Cell> {
        let missing = match self.direction {
            Direction::Read => cell.is_missing(),
            Direction::Write => cell == Cell::Absent,
        };
        if missing {
            return Err(ValidationFailure::new(
                FailureKind::Required,
                Self::MESSAGE_KEY,
                RejectedValue::Missing,
            )
            .into());
        }
        Ok(cell)
    }
}
