//! Field configuration
//!
//! A mapping declares, per CSV column, how to convert and validate the
//! cell. Everything here is plain data, deserialized from JSON.

use serde::{Deserialize, Serialize};

/// Default value meaning "an empty string", as opposed to "no default".
pub const EMPTY_SENTINEL: &str = "@empty";

/// Value family of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Boolean,
    Integer,
    Decimal,
    Date,
    Time,
    DateTime,
    Timestamp,
    Enum,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Decimal => "decimal",
            ValueType::Date => "date",
            ValueType::Time => "time",
            ValueType::DateTime => "datetime",
            ValueType::Timestamp => "timestamp",
            ValueType::Enum => "enum",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Decimal)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ValueType::Date | ValueType::Time | ValueType::DateTime | ValueType::Timestamp
        )
    }

    /// Min, max and range constraints need an ordered family.
    pub fn is_ordered(self) -> bool {
        self.is_numeric() || self.is_temporal()
    }
}

/// Constraints a field can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    Equals,
    Min,
    Max,
    Range,
    Unique,
}

impl ConstraintKind {
    pub fn name(self) -> &'static str {
        match self {
            ConstraintKind::Equals => "equals",
            ConstraintKind::Min => "min",
            ConstraintKind::Max => "max",
            ConstraintKind::Range => "range",
            ConstraintKind::Unique => "unique",
        }
    }
}

/// Format sub-configuration of a field.
///
/// Its presence alone changes the parse failure key from the generic one
/// to the family one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatConfig {
    /// Number or date/time pattern
    #[serde(default)]
    pub pattern: Option<String>,

    /// Locale tag such as `ja_JP_JP`; the mapping default when absent
    #[serde(default)]
    pub locale: Option<String>,

    /// Fixed offset zone (`UTC`, `+09:00`, ...) for timestamps
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub lenient: bool,

    /// Lower bound, parsed with the field's format
    #[serde(default)]
    pub min: Option<String>,

    /// Upper bound, parsed with the field's format
    #[serde(default)]
    pub max: Option<String>,

    /// Whether range bounds are accepted (applies to both)
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,

    /// Custom parse failure template; empty selects the generic key
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub true_values: Option<Vec<String>>,

    #[serde(default)]
    pub false_values: Option<Vec<String>>,

    /// Enum variants, canonical names
    #[serde(default)]
    pub variants: Vec<String>,

    /// Defaults to true for booleans, false for enums
    #[serde(default)]
    pub ignore_case: Option<bool>,
}

fn default_inclusive() -> bool {
    true
}

impl FormatConfig {
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = Some(timezone.to_string());
        self
    }

    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub fn with_range(mut self, min: Option<&str>, max: Option<&str>, inclusive: bool) -> Self {
        self.min = min.map(str::to_string);
        self.max = max.map(str::to_string);
        self.inclusive = inclusive;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_variants(mut self, variants: &[&str]) -> Self {
        self.variants = variants.iter().map(|v| v.to_string()).collect();
        self
    }
}

/// Configuration of one mapped column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// 1-based column position, unique within a mapping
    pub position: usize,

    /// Record key
    pub name: String,

    /// Name used in messages (defaults to `name`)
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default, rename = "type")]
    pub value_type: ValueType,

    /// A missing cell is accepted instead of failing as required
    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub trim: bool,

    /// Substituted for a missing cell when reading
    #[serde(default)]
    pub input_default: Option<String>,

    /// Substituted for a missing value when writing
    #[serde(default)]
    pub output_default: Option<String>,

    #[serde(default)]
    pub unique: bool,

    /// The only accepted value, parsed with the field's format
    #[serde(default)]
    pub equals: Option<String>,

    #[serde(default)]
    pub format: Option<FormatConfig>,

    /// Constraints not checked when writing
    #[serde(default)]
    pub skip_on_write: Vec<ConstraintKind>,

    /// Name of a registered chain override
    #[serde(default)]
    pub chain: Option<String>,
}

impl FieldConfig {
    pub fn new(position: usize, name: &str, value_type: ValueType) -> Self {
        Self {
            position,
            name: name.to_string(),
            label: None,
            value_type,
            optional: false,
            trim: false,
            input_default: None,
            output_default: None,
            unique: false,
            equals: None,
            format: None,
            skip_on_write: Vec::new(),
            chain: None,
        }
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_input_default(mut self, value: &str) -> Self {
        self.input_default = Some(value.to_string());
        self
    }

    pub fn with_output_default(mut self, value: &str) -> Self {
        self.output_default = Some(value.to_string());
        self
    }

    pub fn with_equals(mut self, value: &str) -> Self {
        self.equals = Some(value.to_string());
        self
    }

    pub fn with_format(mut self, format: FormatConfig) -> Self {
        self.format = Some(format);
        self
    }

    pub fn skip_on_write(mut self, constraint: ConstraintKind) -> Self {
        self.skip_on_write.push(constraint);
        self
    }

    pub fn with_chain(mut self, name: &str) -> Self {
        self.chain = Some(name.to_string());
        self
    }

    /// Constraints declared by this field, in chain order.
    pub fn declared_constraints(&self) -> Vec<ConstraintKind> {
        let mut declared = Vec::new();
        if self.equals.is_some() {
            declared.push(ConstraintKind::Equals);
        }
        if let Some(format) = &self.format {
            match (&format.min, &format.max) {
                (Some(_), Some(_)) => declared.push(ConstraintKind::Range),
                (Some(_), None) => declared.push(ConstraintKind::Min),
                (None, Some(_)) => declared.push(ConstraintKind::Max),
                (None, None) => {}
            }
        }
        if self.unique {
            declared.push(ConstraintKind::Unique);
        }
        declared
    }

    pub fn skips_on_write(&self, constraint: ConstraintKind) -> bool {
        self.skip_on_write.contains(&constraint)
    }
}

/// A complete column mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    #[serde(default)]
    pub description: String,

    pub fields: Vec<FieldConfig>,

    /// Reject rows with more cells than mapped fields
    #[serde(default)]
    pub strict_width: bool,

    #[serde(default = "default_has_headers")]
    pub has_headers: bool,

    /// Detected from the input when absent
    #[serde(default)]
    pub delimiter: Option<char>,
}

fn default_has_headers() -> bool {
    true
}

impl MappingConfig {
    pub fn new(fields: Vec<FieldConfig>) -> Self {
        Self {
            description: String::new(),
            fields,
            strict_width: false,
            has_headers: default_has_headers(),
            delimiter: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn strict(mut self) -> Self {
        self.strict_width = true;
        self
    }

    /// Fields sorted by column position.
    pub fn sorted_fields(&self) -> Vec<&FieldConfig> {
        let mut fields: Vec<&FieldConfig> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.position);
        fields
    }

    /// Header row in column order, labels of the mapped fields.
    pub fn header(&self) -> Vec<String> {
        self.sorted_fields()
            .iter()
            .map(|f| f.label().to_string())
            .collect()
    }
}

/// Example mapping, printed by `cellbind example-mapping`.
pub fn example_mapping() -> MappingConfig {
    let fields = vec![
        FieldConfig::new(1, "id", ValueType::Integer).unique(),
        FieldConfig::new(2, "name", ValueType::Text)
            .with_label("Name")
            .trimmed(),
        FieldConfig::new(3, "birthday", ValueType::Date)
            .with_label("Birthday")
            .optional()
            .with_format(
                FormatConfig::default()
                    .with_pattern("yyyy/MM/dd")
                    .with_range(Some("1900/01/01"), None, true),
            ),
        FieldConfig::new(4, "amount", ValueType::Decimal)
            .with_label("Amount")
            .with_input_default("0")
            .with_format(
                FormatConfig::default()
                    .with_pattern("#,##0.00")
                    .with_range(Some("0"), Some("1,000,000"), true),
            ),
        FieldConfig::new(5, "status", ValueType::Enum)
            .with_label("Status")
            .with_format(
                FormatConfig::default()
                    .with_variants(&["Active", "Suspended", "Closed"])
                    .with_message("{label} must be Active, Suspended or Closed, not '{validatedValue}'"),
            ),
        FieldConfig::new(6, "subscribed", ValueType::Boolean)
            .with_label("Subscribed")
            .optional()
            .with_output_default("false"),
    ];

    MappingConfig {
        description: "Example customer list".to_string(),
        ..MappingConfig::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mapping_serialization() {
        let mapping = example_mapping();
        let json = mapping.to_json().unwrap();
        let parsed = MappingConfig::from_json(&json).unwrap();
        assert_eq!(parsed, mapping);
    }

    #[test]
    fn test_field_defaults_from_json() {
        let value = json!({
            "fields": [
                { "position": 1, "name": "id", "type": "integer" },
                { "position": 2, "name": "born", "type": "datetime",
                  "format": { "pattern": "yy/M/d H:m:s", "max": "30/1/1 0:0:0" } }
            ]
        });
        let mapping: MappingConfig = serde_json::from_value(value).unwrap();
        assert!(mapping.has_headers);
        assert!(!mapping.strict_width);

        let id = &mapping.fields[0];
        assert_eq!(id.label(), "id");
        assert!(!id.optional);
        assert!(id.format.is_none());

        let born = &mapping.fields[1];
        assert_eq!(born.value_type, ValueType::DateTime);
        let format = born.format.as_ref().unwrap();
        assert!(format.inclusive);
        assert_eq!(born.declared_constraints(), vec![ConstraintKind::Max]);
    }

    #[test]
    fn test_declared_constraints_order() {
        let field = FieldConfig::new(1, "n", ValueType::Integer)
            .unique()
            .with_equals("3")
            .with_format(FormatConfig::default().with_range(Some("1"), Some("5"), false));
        assert_eq!(
            field.declared_constraints(),
            vec![ConstraintKind::Equals, ConstraintKind::Range, ConstraintKind::Unique]
        );
    }

    #[test]
    fn test_header_in_position_order() {
        let mapping = MappingConfig::new(vec![
            FieldConfig::new(2, "b", ValueType::Text).with_label("B"),
            FieldConfig::new(1, "a", ValueType::Text),
        ]);
        assert_eq!(mapping.header(), vec!["a", "B"]);
    }
}
