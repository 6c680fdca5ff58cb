//! Number patterns: a subset of the familiar `#,##0.00` notation.
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | `0` | mandatory digit |
//! | `#` | optional digit |
//! | `,` | grouping separator (groups of three) |
//! | `.` | decimal separator |
//!
//! Separators are rendered with the locale's symbols.

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;

use crate::locale::Locale;

/// A compiled number pattern bound to a locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pattern: Option<String>,
    grouping: bool,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    /// `None` keeps every fraction digit.
    max_fraction_digits: Option<usize>,
    decimal_separator: char,
    grouping_separator: char,
    lenient: bool,
}

impl NumberFormat {
    /// Compile a pattern; `None` means plain digits without grouping.
    pub fn compile(pattern: Option<&str>, locale: &Locale, lenient: bool) -> Result<Self, String> {
        let symbols = locale.symbols();
        let mut format = Self {
            pattern: pattern.map(str::to_string),
            grouping: false,
            min_integer_digits: 1,
            min_fraction_digits: 0,
            max_fraction_digits: None,
            decimal_separator: symbols.decimal_separator,
            grouping_separator: symbols.grouping_separator,
            lenient,
        };

        let Some(pattern) = pattern else {
            return Ok(format);
        };

        if pattern.is_empty() {
            return Err("empty number pattern".to_string());
        }
        if let Some(c) = pattern.chars().find(|c| !matches!(c, '#' | '0' | ',' | '.')) {
            return Err(format!("unsupported character '{}' in number pattern", c));
        }
        if pattern.matches('.').count() > 1 {
            return Err("multiple decimal separators".to_string());
        }

        let (integer, fraction) = match pattern.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (pattern, None),
        };
        if fraction.is_some_and(|f| f.contains(',')) {
            return Err("grouping separator in fraction part".to_string());
        }

        format.grouping = integer.contains(',');
        format.min_integer_digits = integer.chars().filter(|c| *c == '0').count();
        format.min_fraction_digits = fraction.map_or(0, |f| f.chars().filter(|c| *c == '0').count());
        format.max_fraction_digits = Some(fraction.map_or(0, str::len));
        Ok(format)
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Parse an integer. When the pattern has a fraction part, a fraction
    /// of zeros is accepted (`1,000.00`); any other fraction is rejected
    /// unless lenient, which drops it.
    pub fn parse_integer(&self, input: &str) -> Result<i64, String> {
        let declares_fraction = self.max_fraction_digits.is_some_and(|max| max > 0);
        let normalized = self.scan(input, declares_fraction)?;
        let (integer, fraction) = normalized.split_once('.').unwrap_or((normalized.as_str(), ""));
        if !self.lenient && fraction.chars().any(|c| c != '0') {
            return Err(format!("'{}' is not a whole number", input));
        }
        integer
            .parse::<i64>()
            .map_err(|e| format!("'{}' is not a valid integer: {}", input, e))
    }

    pub fn parse_decimal(&self, input: &str) -> Result<Decimal, String> {
        let normalized = self.scan(input, true)?;
        Decimal::from_str_exact(&normalized)
            .map_err(|e| format!("'{}' is not a valid decimal: {}", input, e))
    }

    pub fn format_integer(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let mut out = String::new();
        if value < 0 {
            out.push('-');
        }
        out.push_str(&self.render_integer_part(&digits));
        if self.min_fraction_digits > 0 {
            out.push(self.decimal_separator);
            out.push_str(&"0".repeat(self.min_fraction_digits));
        }
        out
    }

    pub fn format_decimal(&self, value: &Decimal) -> String {
        let rounded = match self.max_fraction_digits {
            Some(max) => {
                value.round_dp_with_strategy(max as u32, RoundingStrategy::MidpointNearestEven)
            }
            None => *value,
        };

        let text = rounded.abs().to_string();
        let (integer, fraction) = match text.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (text, String::new()),
        };

        let mut fraction = fraction;
        if self.max_fraction_digits.is_some() {
            while fraction.len() > self.min_fraction_digits && fraction.ends_with('0') {
                fraction.pop();
            }
        }
        while fraction.len() < self.min_fraction_digits {
            fraction.push('0');
        }

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&self.render_integer_part(&integer));
        if !fraction.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(&fraction);
        }
        out
    }

    fn render_integer_part(&self, digits: &str) -> String {
        let digits = digits.trim_start_matches('0');
        let width = self.min_integer_digits.max(1);
        let padded = if digits.len() < width {
            format!("{}{}", "0".repeat(width - digits.len()), digits)
        } else {
            digits.to_string()
        };

        if !self.grouping {
            return padded;
        }

        let mut grouped = String::new();
        let len = padded.len();
        for (i, c) in padded.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                grouped.push(self.grouping_separator);
            }
            grouped.push(c);
        }
        grouped
    }

    /// Normalize localized input to `-123.45` form.
    ///
    /// Strict mode requires the whole input to be consumed; lenient mode
    /// accepts any valid numeric prefix.
    fn scan(&self, input: &str, allow_fraction: bool) -> Result<String, String> {
        let chars: Vec<char> = input.chars().collect();
        let mut out = String::new();
        let mut i = 0;

        if let Some(&c) = chars.first() {
            if c == '-' || c == '+' {
                if c == '-' {
                    out.push('-');
                }
                i += 1;
            }
        }

        let mut integer_digits = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() {
                out.push(c);
                integer_digits += 1;
                i += 1;
            } else if self.grouping
                && c == self.grouping_separator
                && integer_digits > 0
                && chars.get(i + 1).is_some_and(char::is_ascii_digit)
            {
                i += 1;
            } else {
                break;
            }
        }

        if integer_digits == 0 {
            return Err(format!("'{}' does not start with a number", input));
        }

        if allow_fraction
            && chars.get(i) == Some(&self.decimal_separator)
            && chars.get(i + 1).is_some_and(char::is_ascii_digit)
        {
            out.push('.');
            i += 1;
            while i < chars.len() && chars[i].is_ascii_digit() {
                out.push(chars[i]);
                i += 1;
            }
        }

        if i < chars.len() && !self.lenient {
            return Err(format!("unexpected trailing characters in '{}'", input));
        }

        Ok(out)
    }
}
