//! Boolean tokens and enumerated variants.

/// Tokens accepted as `true` when none are configured.
pub const DEFAULT_TRUE_VALUES: [&str; 6] = ["true", "1", "yes", "on", "y", "t"];

/// Tokens accepted as `false` when none are configured.
pub const DEFAULT_FALSE_VALUES: [&str; 6] = ["false", "0", "no", "off", "n", "f"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanFormat {
    true_values: Vec<String>,
    false_values: Vec<String>,
    ignore_case: bool,
    lenient: bool,
}

impl BooleanFormat {
    pub fn new(
        true_values: Option<&[String]>,
        false_values: Option<&[String]>,
        ignore_case: bool,
        lenient: bool,
    ) -> Result<Self, String> {
        let collect = |given: Option<&[String]>, defaults: &[&str]| -> Vec<String> {
            match given {
                Some(values) => values.to_vec(),
                None => defaults.iter().map(|s| s.to_string()).collect(),
            }
        };
        let format = Self {
            true_values: collect(true_values, &DEFAULT_TRUE_VALUES[..]),
            false_values: collect(false_values, &DEFAULT_FALSE_VALUES[..]),
            ignore_case,
            lenient,
        };

        if format.true_values.is_empty() || format.false_values.is_empty() {
            return Err("boolean token lists must not be empty".to_string());
        }
        if let Some(token) = format
            .true_values
            .iter()
            .find(|t| format.matches(&format.false_values, t))
        {
            return Err(format!("token '{}' is both true and false", token));
        }
        Ok(format)
    }

    pub fn true_values(&self) -> &[String] {
        &self.true_values
    }

    pub fn false_values(&self) -> &[String] {
        &self.false_values
    }

    pub fn parse(&self, input: &str) -> Result<bool, String> {
        if self.matches(&self.true_values, input) {
            Ok(true)
        } else if self.matches(&self.false_values, input) || self.lenient {
            Ok(false)
        } else {
            Err(format!("'{}' is not a boolean token", input))
        }
    }

    /// First token of the matching list.
    pub fn format(&self, value: bool) -> &str {
        if value {
            &self.true_values[0]
        } else {
            &self.false_values[0]
        }
    }

    fn matches(&self, tokens: &[String], input: &str) -> bool {
        tokens.iter().any(|t| {
            if self.ignore_case {
                t.to_lowercase() == input.to_lowercase()
            } else {
                t == input
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumFormat {
    variants: Vec<String>,
    ignore_case: bool,
}

impl EnumFormat {
    pub fn new(variants: &[String], ignore_case: bool) -> Result<Self, String> {
        if variants.is_empty() {
            return Err("no variants declared".to_string());
        }
        Ok(Self {
            variants: variants.to_vec(),
            ignore_case,
        })
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Canonical variant name for the input.
    pub fn parse(&self, input: &str) -> Result<String, String> {
        self.variants
            .iter()
            .find(|v| *v == input)
            .or_else(|| {
                self.ignore_case
                    .then(|| self.variants.iter().find(|v| v.to_lowercase() == input.to_lowercase()))
                    .flatten()
            })
            .cloned()
            .ok_or_else(|| format!("'{}' is not one of {}", input, self.variants.join(", ")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_tokens() {
        let fmt = BooleanFormat::new(None, None, true, false).unwrap();
        assert!(fmt.parse("YES").unwrap());
        assert!(fmt.parse("1").unwrap());
        assert!(!fmt.parse("Off").unwrap());
        assert!(fmt.parse("maybe").is_err());
        assert_eq!(fmt.format(true), "true");
        assert_eq!(fmt.format(false), "false");
    }

    #[test]
    fn test_custom_tokens_case_sensitive() {
        let yes = strings(&["○"]);
        let no = strings(&["×", "-"]);
        let fmt = BooleanFormat::new(Some(yes.as_slice()), Some(no.as_slice()), false, false).unwrap();
        assert!(fmt.parse("○").unwrap());
        assert!(!fmt.parse("-").unwrap());
        assert!(fmt.parse("true").is_err());
        assert_eq!(fmt.format(false), "×");
    }

    #[test]
    fn test_lenient_unknown_is_false() {
        let fmt = BooleanFormat::new(None, None, true, true).unwrap();
        assert!(!fmt.parse("maybe").unwrap());
    }

    #[test]
    fn test_overlapping_tokens_rejected() {
        let yes = strings(&["x"]);
        let no = strings(&["X"]);
        assert!(BooleanFormat::new(Some(yes.as_slice()), Some(no.as_slice()), true, false).is_err());
        assert!(BooleanFormat::new(Some(yes.as_slice()), Some(no.as_slice()), false, false).is_ok());
        assert!(BooleanFormat::new(Some(&[][..]), None, true, false).is_err());
    }

    #[test]
    fn test_enum_variants() {
        let variants = strings(&["Red", "Green"]);
        let strict = EnumFormat::new(&variants, false).unwrap();
        assert_eq!(strict.parse("Red").unwrap(), "Red");
        assert!(strict.parse("red").is_err());

        let relaxed = EnumFormat::new(&variants, true).unwrap();
        assert_eq!(relaxed.parse("green").unwrap(), "Green");
        assert!(relaxed.parse("blue").is_err());
        assert!(EnumFormat::new(&[], false).is_err());
    }
}
