//! Positioned validation failures produced by chain stages.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::CellValue;

/// Why a cell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The field is required and the cell was missing after default substitution.
    Required,
    /// The raw text did not match the field's format.
    Parse,
    /// A constraint stage rejected a typed value.
    Constraint,
}

/// Where the message for a failure comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    /// A template key looked up in the message store.
    Key(String),
    /// A template configured on the field itself.
    Template(String),
}

/// A named message variable: its value plus the string embedded in messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageArg {
    pub value: Value,
    pub display: String,
}

impl MessageArg {
    pub fn new(value: Value, display: impl Into<String>) -> Self {
        Self {
            value,
            display: display.into(),
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            value: Value::String(s.clone()),
            display: s,
        }
    }

    pub fn flag(b: bool) -> Self {
        Self {
            value: Value::Bool(b),
            display: b.to_string(),
        }
    }

    pub fn count(n: usize) -> Self {
        Self {
            value: Value::from(n),
            display: n.to_string(),
        }
    }

    /// A typed value rendered with the owning stage's display formatter.
    pub fn cell(value: &CellValue, display: impl Into<String>) -> Self {
        Self {
            value: value.to_json(),
            display: display.into(),
        }
    }
}

/// Named message variables, ordered for stable output.
pub type MessageVariables = BTreeMap<String, MessageArg>;

/// The rejected value, tagged with the stage of the chain it was seen at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectedValue {
    Missing,
    /// Before parsing.
    Raw(String),
    /// After parsing.
    Typed(CellValue),
}

/// Position of a cell, supplied by whoever executes the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellContext {
    pub line_number: usize,
    pub row_number: usize,
    pub column_number: usize,
    pub label: String,
}

impl CellContext {
    pub fn new(
        line_number: usize,
        row_number: usize,
        column_number: usize,
        label: impl Into<String>,
    ) -> Self {
        Self {
            line_number,
            row_number,
            column_number,
            label: label.into(),
        }
    }

    /// Context for running a chain outside of any row.
    pub fn anonymous() -> Self {
        Self::new(0, 0, 0, "")
    }
}

/// One rejected cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub message: MessageSource,
    pub variables: MessageVariables,
    pub rejected: RejectedValue,
    /// Display form of the rejected value (`validatedValue`).
    pub validated_value: String,
    /// Attached by the chain executor, never by the stage.
    pub context: Option<CellContext>,
}

impl ValidationFailure {
    pub fn new(kind: FailureKind, key: impl Into<String>, rejected: RejectedValue) -> Self {
        let validated_value = match &rejected {
            RejectedValue::Missing => String::new(),
            RejectedValue::Raw(s) => s.clone(),
            RejectedValue::Typed(v) => v.to_string(),
        };
        Self {
            kind,
            message: MessageSource::Key(key.into()),
            variables: MessageVariables::new(),
            rejected,
            validated_value,
            context: None,
        }
    }

    /// Add a message variable.
    pub fn with_var(mut self, name: &str, arg: MessageArg) -> Self {
        self.variables.insert(name.to_string(), arg);
        self
    }

    pub fn with_variables(mut self, vars: MessageVariables) -> Self {
        self.variables.extend(vars);
        self
    }

    /// Override the display form of the rejected value.
    pub fn with_validated_value(mut self, display: impl Into<String>) -> Self {
        self.validated_value = display.into();
        self
    }

    /// Replace the stage key with a field-level template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.message = MessageSource::Template(template.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.message = MessageSource::Key(key.into());
        self
    }

    pub fn with_context(mut self, context: CellContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The template key, or the custom template when one is configured.
    pub fn message_key(&self) -> &str {
        match &self.message {
            MessageSource::Key(k) | MessageSource::Template(k) => k,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).map(|a| &a.value)
    }

    pub fn is_parse_error(&self) -> bool {
        self.kind == FailureKind::Parse
    }

    pub fn is_required_missing(&self) -> bool {
        self.kind == FailureKind::Required
    }

    /// `(row, column)` ordering key, unpositioned failures first.
    pub fn position(&self) -> (usize, usize) {
        self.context
            .as_ref()
            .map(|c| (c.row_number, c.column_number))
            .unwrap_or((0, 0))
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(
                f,
                "row {}, column {} ('{}'): {} (value '{}')",
                ctx.row_number,
                ctx.column_number,
                ctx.label,
                self.message_key(),
                self.validated_value
            ),
            None => write!(f, "{} (value '{}')", self.message_key(), self.validated_value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_builders() {
        let failure = ValidationFailure::new(
            FailureKind::Constraint,
            "cellbind.Min.violated",
            RejectedValue::Typed(CellValue::Integer(3)),
        )
        .with_var("min", MessageArg::new(json!(5), "5"))
        .with_context(CellContext::new(4, 5, 2, "count"));

        assert_eq!(failure.message_key(), "cellbind.Min.violated");
        assert_eq!(failure.variable("min"), Some(&json!(5)));
        assert_eq!(failure.validated_value, "3");
        assert_eq!(failure.position(), (5, 2));
        assert!(!failure.is_parse_error());
    }

    #[test]
    fn test_template_replaces_key() {
        let failure = ValidationFailure::new(
            FailureKind::Parse,
            "cellbind.ParseProcessor.violated",
            RejectedValue::Raw("abc".into()),
        )
        .with_template("bad value {validatedValue}");
        assert_eq!(failure.message_key(), "bad value {validatedValue}");
        assert!(matches!(failure.message, MessageSource::Template(_)));
    }

    #[test]
    fn test_display_with_context() {
        let failure = ValidationFailure::new(
            FailureKind::Required,
            "cellbind.RequiredProcessor.violated",
            RejectedValue::Missing,
        )
        .with_context(CellContext::new(2, 2, 1, "id"));
        assert!(failure.to_string().starts_with("row 2, column 1 ('id')"));
    }
}
