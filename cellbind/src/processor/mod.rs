//! Processing chains
//!
//! A chain is the ordered list of stages one field goes through in one
//! direction. Each stage consumes the previous stage's output and either
//! passes a value on or halts the chain with an error.
//!
//! ```text
//! read:   DefaultValue → Trim → Required → Parse → Equals → Min|Max|Range → Unique
//! write:  Equals → Min|Max|Range → Unique → Format → Trim → DefaultValue → Required
//! ```

pub mod constraint;
pub mod transform;

use std::fmt;

pub use constraint::{Equals, Max, Min, NumberRange, Required, Unique};
pub use transform::{DefaultSubstitute, DefaultValue, Trim};

use crate::error::{ProcessError, ProcessResult};
use crate::format::{FormatProcessor, ParseProcessor};
use crate::logs::log_debug;
use crate::models::Cell;
use crate::validation::CellContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Raw text to typed value
    Read,
    /// Typed value to raw text
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("read"),
            Direction::Write => f.write_str("write"),
        }
    }
}

/// A user supplied stage, used by chain overrides.
pub trait CustomProcessor: fmt::Debug + Send {
    fn name(&self) -> &str;

    fn execute(&mut self, cell: Cell, context: &CellContext) -> ProcessResult<Cell>;

    /// Clear any per-pass state.
    fn reset(&mut self) {}
}

/// One stage of a chain.
#[derive(Debug)]
pub enum Processor {
    DefaultValue(DefaultValue),
    Trim(Trim),
    Required(Required),
    Parse(ParseProcessor),
    Format(FormatProcessor),
    Equals(Equals),
    Min(Min),
    Max(Max),
    NumberRange(NumberRange),
    Unique(Unique),
    Custom(Box<dyn CustomProcessor>),
}

impl Processor {
    pub fn name(&self) -> &str {
        match self {
            Processor::DefaultValue(_) => "DefaultValue",
            Processor::Trim(_) => "Trim",
            Processor::Required(_) => "Required",
            Processor::Parse(_) => "Parse",
            Processor::Format(_) => "Format",
            Processor::Equals(_) => "Equals",
            Processor::Min(_) => "Min",
            Processor::Max(_) => "Max",
            Processor::NumberRange(_) => "NumberRange",
            Processor::Unique(_) => "Unique",
            Processor::Custom(custom) => custom.name(),
        }
    }

    pub fn execute(&mut self, cell: Cell, context: &CellContext) -> ProcessResult<Cell> {
        match self {
            Processor::DefaultValue(p) => p.execute(cell),
            Processor::Trim(p) => p.execute(cell),
            Processor::Required(p) => p.execute(cell),
            Processor::Parse(p) => p.execute(cell),
            Processor::Format(p) => p.execute(cell),
            Processor::Equals(p) => p.execute(cell),
            Processor::Min(p) => p.execute(cell),
            Processor::Max(p) => p.execute(cell),
            Processor::NumberRange(p) => p.execute(cell),
            Processor::Unique(p) => p.execute(cell, context.row_number),
            Processor::Custom(p) => p.execute(cell, context),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Processor::Unique(p) => p.reset(),
            Processor::Custom(p) => p.reset(),
            _ => {}
        }
    }
}

/// The stages of one field in one direction.
///
/// Built once and reused for every row. Execution takes `&mut self` because
/// a `Unique` stage remembers the values it has seen.
#[derive(Debug)]
pub struct ProcessingChain {
    label: String,
    position: usize,
    direction: Direction,
    stages: Vec<Processor>,
}

impl ProcessingChain {
    pub fn new(label: impl Into<String>, position: usize, direction: Direction) -> Self {
        Self {
            label: label.into(),
            position,
            direction,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: Processor) {
        self.stages.push(stage);
    }

    pub fn with_stage(mut self, stage: Processor) -> Self {
        self.push(stage);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn stages(&self) -> &[Processor] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(Processor::name).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run a cell through every stage.
    ///
    /// A validation failure leaves with `context` attached; the first
    /// failing stage stops the chain.
    pub fn execute(&mut self, cell: Cell, context: &CellContext) -> ProcessResult<Cell> {
        let mut current = cell;
        for stage in &mut self.stages {
            current = stage.execute(current, context).map_err(|e| match e {
                ProcessError::Validation(mut failure) => {
                    failure.context = Some(context.clone());
                    ProcessError::Validation(failure)
                }
                other => other,
            })?;
        }
        Ok(current)
    }

    /// Forget the values seen by stateful stages.
    pub fn reset(&mut self) {
        log_debug(format!("Resetting {} chain of '{}'", self.direction, self.label));
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}
