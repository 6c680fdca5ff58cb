//! Chain construction
//!
//! Turns a [`FieldConfig`] into its read and write [`ProcessingChain`]s, in
//! a fixed order, and rejects every configuration problem up front so that
//! execution only ever sees validation failures.

use chrono::{FixedOffset, Offset, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use super::field::{ConstraintKind, FieldConfig, ValueType, EMPTY_SENTINEL};
use crate::error::{ConfigError, ConfigResult};
use crate::format::{parse_zone, CellFormatter, FormatProcessor, ParseMessage, ParseProcessor};
use crate::locale::Locale;
use crate::logs::log_debug;
use crate::models::CellValue;
use crate::processor::{
    DefaultSubstitute, DefaultValue, Direction, Equals, Max, Min, NumberRange, ProcessingChain,
    Processor, Required, Trim, Unique,
};

/// Defaults applied to fields that do not set their own locale or zone.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub locale: Locale,
    pub timezone: FixedOffset,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            locale: Locale::root(),
            timezone: Utc.fix(),
        }
    }
}

/// A named replacement for the generated chains of a field.
///
/// The override owns both chains entirely. A field naming an override may
/// only declare the constraints the override accepts.
pub trait ChainOverride: Send + Sync {
    /// Name fields use to select this override.
    fn name(&self) -> &str;

    /// Whether the chains built by this override honor `constraint`.
    fn accepts(&self, _constraint: ConstraintKind) -> bool {
        false
    }

    fn build_read(
        &self,
        field: &FieldConfig,
        formatter: Arc<CellFormatter>,
    ) -> ConfigResult<ProcessingChain>;

    fn build_write(
        &self,
        field: &FieldConfig,
        formatter: Arc<CellFormatter>,
    ) -> ConfigResult<ProcessingChain>;
}

/// Bound constraint of a field, at most one per field.
enum Bound {
    Min(CellValue),
    Max(CellValue),
    Range(NumberRange),
}

/// Constraint values parsed once per chain.
struct Constraints {
    equals: Option<CellValue>,
    bound: Option<Bound>,
    unique: bool,
}

/// Builds processing chains from field configurations.
#[derive(Default)]
pub struct ChainBuilder {
    options: BuildOptions,
    overrides: HashMap<String, Arc<dyn ChainOverride>>,
}

impl ChainBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            overrides: HashMap::new(),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Register a chain override under its name.
    pub fn register(&mut self, chain_override: impl ChainOverride + 'static) {
        self.overrides
            .insert(chain_override.name().to_string(), Arc::new(chain_override));
    }

    pub fn with_override(mut self, chain_override: impl ChainOverride + 'static) -> Self {
        self.register(chain_override);
        self
    }

    /// Resolve the field's locale, zone and format into a formatter.
    pub fn formatter(&self, field: &FieldConfig) -> ConfigResult<Arc<CellFormatter>> {
        let format = field.format.as_ref();

        let locale = match format.and_then(|f| f.locale.as_deref()) {
            Some(tag) => Locale::parse(tag).ok_or_else(|| ConfigError::InvalidLocale {
                field: field.name.clone(),
                locale: tag.to_string(),
            })?,
            None => self.options.locale.clone(),
        };

        let zone = match format.and_then(|f| f.timezone.as_deref()) {
            Some(id) => parse_zone(id).ok_or_else(|| ConfigError::InvalidTimezone {
                field: field.name.clone(),
                timezone: id.to_string(),
            })?,
            None => self.options.timezone,
        };

        if field.value_type == ValueType::Enum && format.map_or(true, |f| f.variants.is_empty()) {
            return Err(ConfigError::MissingVariants {
                field: field.name.clone(),
            });
        }

        CellFormatter::build(field.value_type, format, &locale, zone)
            .map(Arc::new)
            .map_err(|reason| ConfigError::InvalidPattern {
                field: field.name.clone(),
                pattern: format
                    .and_then(|f| f.pattern.clone())
                    .unwrap_or_default(),
                reason,
            })
    }

    pub fn build_read(&self, field: &FieldConfig) -> ConfigResult<ProcessingChain> {
        let formatter = self.formatter(field)?;
        self.check_defaults(field, &formatter)?;

        if let Some(chain_override) = self.override_for(field)? {
            let chain = chain_override.build_read(field, formatter)?;
            log_chain(&chain);
            return Ok(chain);
        }

        let constraints = self.constraints(field, &formatter)?;
        let mut chain = ProcessingChain::new(field.label(), field.position, Direction::Read);

        if let Some(default) = &field.input_default {
            chain.push(Processor::DefaultValue(DefaultValue::for_read(
                DefaultSubstitute::from_config(default),
            )));
        }
        if field.trim {
            chain.push(Processor::Trim(Trim));
        }
        if !field.optional {
            chain.push(Processor::Required(Required::new(Direction::Read)));
        }
        chain.push(Processor::Parse(ParseProcessor::new(
            formatter.clone(),
            ParseMessage::for_format(field.format.as_ref()),
        )));
        push_constraints(&mut chain, constraints, &formatter, |_| true);

        log_chain(&chain);
        Ok(chain)
    }

    pub fn build_write(&self, field: &FieldConfig) -> ConfigResult<ProcessingChain> {
        let formatter = self.formatter(field)?;
        self.check_defaults(field, &formatter)?;

        if let Some(chain_override) = self.override_for(field)? {
            let chain = chain_override.build_write(field, formatter)?;
            log_chain(&chain);
            return Ok(chain);
        }

        let constraints = self.constraints(field, &formatter)?;
        let mut chain = ProcessingChain::new(field.label(), field.position, Direction::Write);

        push_constraints(&mut chain, constraints, &formatter, |kind| {
            !field.skips_on_write(kind)
        });
        chain.push(Processor::Format(FormatProcessor::new(formatter)));
        if field.trim {
            chain.push(Processor::Trim(Trim));
        }
        if let Some(default) = &field.output_default {
            chain.push(Processor::DefaultValue(DefaultValue::for_write(
                DefaultSubstitute::from_config(default),
            )));
        }
        if !field.optional {
            chain.push(Processor::Required(Required::new(Direction::Write)));
        }

        log_chain(&chain);
        Ok(chain)
    }

    fn override_for(&self, field: &FieldConfig) -> ConfigResult<Option<Arc<dyn ChainOverride>>> {
        let Some(name) = &field.chain else {
            return Ok(None);
        };
        let chain_override =
            self.overrides
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownOverride {
                    field: field.name.clone(),
                    builder: name.clone(),
                })?;

        if let Some(rejected) = field
            .declared_constraints()
            .into_iter()
            .find(|c| !chain_override.accepts(*c))
        {
            return Err(ConfigError::ConflictingOverride {
                field: field.name.clone(),
                builder: name.clone(),
                constraint: rejected.name(),
            });
        }
        Ok(Some(chain_override))
    }

    fn check_defaults(&self, field: &FieldConfig, formatter: &CellFormatter) -> ConfigResult<()> {
        let defaults = [
            ("inputDefault", field.input_default.as_deref()),
            ("outputDefault", field.output_default.as_deref()),
        ];
        for (attribute, value) in defaults {
            match value {
                None => {}
                Some(EMPTY_SENTINEL) if field.value_type != ValueType::Text => {
                    return Err(ConfigError::EmptySentinelNotText {
                        field: field.name.clone(),
                    });
                }
                Some(EMPTY_SENTINEL) => {}
                Some(raw) => {
                    parse_value(field, formatter, attribute, raw)?;
                }
            }
        }
        Ok(())
    }

    fn constraints(
        &self,
        field: &FieldConfig,
        formatter: &Arc<CellFormatter>,
    ) -> ConfigResult<Constraints> {
        let equals = field
            .equals
            .as_deref()
            .map(|raw| parse_value(field, formatter, "equals", raw))
            .transpose()?;

        let (min, max, inclusive) = match &field.format {
            Some(f) => (f.min.as_deref(), f.max.as_deref(), f.inclusive),
            None => (None, None, true),
        };

        let bound = match (min, max) {
            (None, None) => None,
            _ if !field.value_type.is_ordered() => {
                let constraint = match (min, max) {
                    (Some(_), Some(_)) => ConstraintKind::Range,
                    (Some(_), None) => ConstraintKind::Min,
                    _ => ConstraintKind::Max,
                };
                return Err(ConfigError::UnsupportedConstraint {
                    field: field.name.clone(),
                    constraint: constraint.name(),
                    value_type: field.value_type.name(),
                });
            }
            (Some(min), None) => Some(Bound::Min(parse_value(field, formatter, "min", min)?)),
            (None, Some(max)) => Some(Bound::Max(parse_value(field, formatter, "max", max)?)),
            (Some(min), Some(max)) => Some(Bound::Range(NumberRange::new(
                &field.name,
                parse_value(field, formatter, "min", min)?,
                parse_value(field, formatter, "max", max)?,
                inclusive,
                formatter.clone(),
            )?)),
        };

        Ok(Constraints {
            equals,
            bound,
            unique: field.unique,
        })
    }
}

fn parse_value(
    field: &FieldConfig,
    formatter: &CellFormatter,
    attribute: &'static str,
    raw: &str,
) -> ConfigResult<CellValue> {
    formatter
        .parse(raw)
        .map_err(|reason| ConfigError::InvalidValue {
            field: field.name.clone(),
            attribute,
            value: raw.to_string(),
            reason,
        })
}

/// Append Equals, the bound and Unique, keeping those `include` selects.
fn push_constraints(
    chain: &mut ProcessingChain,
    constraints: Constraints,
    formatter: &Arc<CellFormatter>,
    include: impl Fn(ConstraintKind) -> bool,
) {
    if let Some(expected) = constraints.equals {
        if include(ConstraintKind::Equals) {
            chain.push(Processor::Equals(Equals::new(expected, formatter.clone())));
        }
    }
    match constraints.bound {
        Some(Bound::Min(min)) if include(ConstraintKind::Min) => {
            chain.push(Processor::Min(Min::new(min, formatter.clone())));
        }
        Some(Bound::Max(max)) if include(ConstraintKind::Max) => {
            chain.push(Processor::Max(Max::new(max, formatter.clone())));
        }
        Some(Bound::Range(range)) if include(ConstraintKind::Range) => {
            chain.push(Processor::NumberRange(range));
        }
        _ => {}
    }
    if constraints.unique && include(ConstraintKind::Unique) {
        chain.push(Processor::Unique(Unique::new(formatter.clone())));
    }
}

fn log_chain(chain: &ProcessingChain) {
    log_debug(format!(
        "Built {} chain for '{}' (column {}): {}",
        chain.direction(),
        chain.label(),
        chain.position(),
        chain.stage_names().join(" → ")
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProcessError, ProcessResult};
    use crate::mapping::FormatConfig;
    use crate::models::Cell;
    use crate::processor::CustomProcessor;
    use crate::validation::CellContext;
    use chrono::NaiveDate;

    fn builder() -> ChainBuilder {
        ChainBuilder::new(BuildOptions::default())
    }

    fn ctx() -> CellContext {
        CellContext::new(2, 2, 1, "field")
    }

    #[test]
    fn test_read_order() {
        let field = FieldConfig::new(1, "n", ValueType::Integer)
            .trimmed()
            .unique()
            .with_input_default("5")
            .with_equals("5")
            .with_format(FormatConfig::default().with_range(Some("1"), Some("9"), true));
        let chain = builder().build_read(&field).unwrap();
        assert_eq!(
            chain.stage_names(),
            vec!["DefaultValue", "Trim", "Required", "Parse", "Equals", "NumberRange", "Unique"]
        );
    }

    #[test]
    fn test_write_order_and_skip() {
        let field = FieldConfig::new(1, "n", ValueType::Integer)
            .trimmed()
            .unique()
            .with_output_default("0")
            .with_format(FormatConfig::default().with_range(Some("1"), None, true))
            .skip_on_write(ConstraintKind::Unique);
        let chain = builder().build_write(&field).unwrap();
        assert_eq!(
            chain.stage_names(),
            vec!["Min", "Format", "Trim", "DefaultValue", "Required"]
        );
    }

    #[test]
    fn test_optional_field_minimal_chain() {
        let field = FieldConfig::new(1, "s", ValueType::Text).optional();
        let mut chain = builder().build_read(&field).unwrap();
        assert_eq!(chain.stage_names(), vec!["Parse"]);
        assert_eq!(chain.execute(Cell::Absent, &ctx()).unwrap(), Cell::Absent);
    }

    #[test]
    fn test_invalid_range_is_config_error() {
        let field = FieldConfig::new(1, "n", ValueType::Integer)
            .with_format(FormatConfig::default().with_range(Some("10"), Some("1"), true));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_unparsable_bounds_and_defaults() {
        let field = FieldConfig::new(1, "d", ValueType::Date)
            .with_format(FormatConfig::default().with_range(Some("yesterday"), None, true));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidValue { attribute: "min", .. })
        ));

        let field = FieldConfig::new(1, "n", ValueType::Integer).with_input_default("many");
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidValue { attribute: "inputDefault", .. })
        ));
    }

    #[test]
    fn test_range_on_text_is_rejected() {
        let field = FieldConfig::new(1, "s", ValueType::Text)
            .with_format(FormatConfig::default().with_range(Some("a"), None, true));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::UnsupportedConstraint { constraint: "min", .. })
        ));
    }

    #[test]
    fn test_empty_sentinel_only_for_text() {
        let field = FieldConfig::new(1, "n", ValueType::Integer).with_input_default("@empty");
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::EmptySentinelNotText { .. })
        ));

        let field = FieldConfig::new(1, "s", ValueType::Text).with_input_default("@empty");
        let mut chain = builder().build_read(&field).unwrap();
        assert_eq!(
            chain.execute(Cell::Absent, &ctx()).unwrap(),
            Cell::Typed(CellValue::Text(String::new()))
        );
    }

    #[test]
    fn test_bad_locale_timezone_pattern() {
        let field = FieldConfig::new(1, "d", ValueType::Date)
            .with_format(FormatConfig::default().with_locale("not a locale"));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidLocale { .. })
        ));

        let field = FieldConfig::new(1, "t", ValueType::Timestamp)
            .with_format(FormatConfig::default().with_timezone("Mars/Olympus"));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidTimezone { .. })
        ));

        let field = FieldConfig::new(1, "d", ValueType::Date)
            .with_format(FormatConfig::default().with_pattern("yyyy-QQ"));
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::InvalidPattern { .. })
        ));

        let field = FieldConfig::new(1, "e", ValueType::Enum);
        assert!(matches!(
            builder().build_read(&field),
            Err(ConfigError::MissingVariants { .. })
        ));
    }

    #[test]
    fn test_default_options_apply() {
        let options = BuildOptions {
            locale: Locale::parse("ja_JP_JP").unwrap(),
            timezone: parse_zone("+09:00").unwrap(),
        };
        let field = FieldConfig::new(1, "d", ValueType::Date)
            .with_format(FormatConfig::default().with_pattern("GGGGy年M月d日"));
        let mut chain = ChainBuilder::new(options).build_read(&field).unwrap();
        assert_eq!(
            chain.execute(Cell::Raw("平成28年2月29日".into()), &ctx()).unwrap(),
            Cell::Typed(CellValue::Date(NaiveDate::from_ymd_opt(2016, 2, 29).unwrap()))
        );
    }

    #[derive(Debug)]
    struct Digits;

    impl CustomProcessor for Digits {
        fn name(&self) -> &str {
            "Digits"
        }

        fn execute(&mut self, cell: Cell, _context: &CellContext) -> ProcessResult<Cell> {
            Ok(match cell {
                Cell::Raw(s) => Cell::Raw(s.chars().filter(char::is_ascii_digit).collect()),
                other => other,
            })
        }
    }

    struct DigitsOverride;

    impl ChainOverride for DigitsOverride {
        fn name(&self) -> &str {
            "digits"
        }

        fn accepts(&self, constraint: ConstraintKind) -> bool {
            constraint == ConstraintKind::Unique
        }

        fn build_read(
            &self,
            field: &FieldConfig,
            formatter: Arc<CellFormatter>,
        ) -> ConfigResult<ProcessingChain> {
            Ok(
                ProcessingChain::new(field.label(), field.position, Direction::Read)
                    .with_stage(Processor::Custom(Box::new(Digits)))
                    .with_stage(Processor::Parse(ParseProcessor::new(
                        formatter.clone(),
                        ParseMessage::Generic,
                    )))
                    .with_stage(Processor::Unique(Unique::new(formatter))),
            )
        }

        fn build_write(
            &self,
            field: &FieldConfig,
            formatter: Arc<CellFormatter>,
        ) -> ConfigResult<ProcessingChain> {
            Ok(
                ProcessingChain::new(field.label(), field.position, Direction::Write)
                    .with_stage(Processor::Format(FormatProcessor::new(formatter))),
            )
        }
    }

    #[test]
    fn test_override_owns_chain() {
        let builder = builder().with_override(DigitsOverride);
        let field = FieldConfig::new(1, "phone", ValueType::Integer)
            .unique()
            .with_chain("digits");
        let mut chain = builder.build_read(&field).unwrap();
        assert_eq!(chain.stage_names(), vec!["Digits", "Parse", "Unique"]);
        assert_eq!(
            chain.execute(Cell::Raw("12-34".into()), &ctx()).unwrap(),
            Cell::Typed(CellValue::Integer(1234))
        );
        assert!(matches!(
            chain.execute(Cell::Raw("1234".into()), &ctx()),
            Err(ProcessError::Validation(_))
        ));
    }

    #[test]
    fn test_override_conflicts_and_unknown() {
        let builder = builder().with_override(DigitsOverride);
        let field = FieldConfig::new(1, "phone", ValueType::Integer)
            .with_equals("1")
            .with_chain("digits");
        assert!(matches!(
            builder.build_read(&field),
            Err(ConfigError::ConflictingOverride { constraint: "equals", .. })
        ));

        let field = FieldConfig::new(1, "phone", ValueType::Integer).with_chain("nope");
        assert!(matches!(
            builder.build_write(&field),
            Err(ConfigError::UnknownOverride { .. })
        ));
    }
}
