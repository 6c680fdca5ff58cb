//! Environment settings.
//!
//! Read from the process environment. Loading a `.env` file is left to the
//! binary.
//!
//! | Variable                  | Default | Meaning                                   |
//! |---------------------------|---------|-------------------------------------------|
//! | `CELLBIND_LOCALE`         | root    | Formatting locale for fields without one  |
//! | `CELLBIND_TIMEZONE`       | `UTC`   | Zone for fields without one               |
//! | `CELLBIND_MESSAGE_LOCALE` | locale  | Locale used to resolve failure messages   |

use chrono::{FixedOffset, Offset, Utc};
use std::env;

use crate::error::{ConfigError, ConfigResult};
use crate::format::parse_zone;
use crate::locale::Locale;
use crate::mapping::BuildOptions;

pub const LOCALE_VAR: &str = "CELLBIND_LOCALE";
pub const TIMEZONE_VAR: &str = "CELLBIND_TIMEZONE";
pub const MESSAGE_LOCALE_VAR: &str = "CELLBIND_MESSAGE_LOCALE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub locale: Locale,
    pub timezone: FixedOffset,
    pub message_locale: Locale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: Locale::root(),
            timezone: Utc.fix(),
            message_locale: Locale::root(),
        }
    }
}

impl Settings {
    /// Read the settings from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let locale = match get(LOCALE_VAR) {
            Some(tag) => parse_locale(LOCALE_VAR, &tag)?,
            None => Locale::root(),
        };

        let timezone = match get(TIMEZONE_VAR) {
            Some(zone) => parse_zone(&zone).ok_or(ConfigError::InvalidSetting {
                name: TIMEZONE_VAR,
                value: zone,
            })?,
            None => Utc.fix(),
        };

        let message_locale = match get(MESSAGE_LOCALE_VAR) {
            Some(tag) => parse_locale(MESSAGE_LOCALE_VAR, &tag)?,
            None => locale.clone(),
        };

        Ok(Self {
            locale,
            timezone,
            message_locale,
        })
    }

    /// Chain build defaults derived from these settings.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            locale: self.locale.clone(),
            timezone: self.timezone,
        }
    }
}

fn parse_locale(name: &'static str, tag: &str) -> ConfigResult<Locale> {
    Locale::parse(tag).ok_or_else(|| ConfigError::InvalidSetting {
        name,
        value: tag.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> ConfigResult<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.build_options().timezone, Utc.fix());
    }

    #[test]
    fn test_message_locale_follows_locale() {
        let s = settings(&[(LOCALE_VAR, "ja_JP"), (TIMEZONE_VAR, "+09:00")]).unwrap();
        assert_eq!(s.locale.tag(), "ja_JP");
        assert_eq!(s.message_locale.tag(), "ja_JP");
        assert_eq!(s.timezone, FixedOffset::east_opt(9 * 3600).unwrap());
        assert_eq!(s.build_options().locale.tag(), "ja_JP");
    }

    #[test]
    fn test_explicit_message_locale() {
        let s = settings(&[(LOCALE_VAR, "fr_FR"), (MESSAGE_LOCALE_VAR, "ja")]).unwrap();
        assert_eq!(s.message_locale.tag(), "ja");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let s = settings(&[(LOCALE_VAR, "  "), (TIMEZONE_VAR, "")]).unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_from_env_reads_process_environment_only() {
        let expected = Settings::from_lookup(|name| env::var(name).ok()).ok();
        assert_eq!(Settings::from_env().ok(), expected);
    }

    #[test]
    fn test_invalid_values() {
        let err = settings(&[(TIMEZONE_VAR, "Mars/Olympus")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { name: TIMEZONE_VAR, .. }));

        let err = settings(&[(LOCALE_VAR, "not a locale")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { name: LOCALE_VAR, .. }));
    }
}
