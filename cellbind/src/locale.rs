//! Locales: identifiers, parent chains and the symbols used by formatters.
//!
//! Locale tags follow the `language_COUNTRY_VARIANT` form (`-` is accepted
//! as separator too). The empty tag is the root locale.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// A locale identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    country: String,
    variant: String,
}

impl Locale {
    /// The root locale (no language).
    pub fn root() -> Self {
        Self::default()
    }

    /// A locale with only a language, e.g. `ja`.
    pub fn from_language(language: &str) -> Self {
        Self {
            language: language.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Parse a tag such as `ja_JP_JP`, `en-US` or `fr`.
    ///
    /// Returns `None` for malformed tags.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Some(Self::root());
        }

        let mut parts = tag.split(['_', '-']);
        let language = parts.next().unwrap_or_default();
        if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }

        let country = parts.next().unwrap_or_default();
        let country_ok = country.is_empty()
            || (country.len() == 2 && country.chars().all(|c| c.is_ascii_alphabetic()))
            || (country.len() == 3 && country.chars().all(|c| c.is_ascii_digit()));
        if !country_ok {
            return None;
        }

        let variant: Vec<&str> = parts.collect();
        let variant = variant.join("_");
        if !variant.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        if !variant.is_empty() && country.is_empty() {
            return None;
        }

        Some(Self {
            language: language.to_ascii_lowercase(),
            country: country.to_ascii_uppercase(),
            variant,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty()
    }

    /// Canonical tag, empty for the root locale.
    pub fn tag(&self) -> String {
        let mut tag = self.language.clone();
        if !self.country.is_empty() {
            tag.push('_');
            tag.push_str(&self.country);
        }
        if !self.variant.is_empty() {
            tag.push('_');
            tag.push_str(&self.variant);
        }
        tag
    }

    /// Derived parent: `ja_JP_JP -> ja_JP -> ja -> root`.
    pub fn parent(&self) -> Option<Locale> {
        if !self.variant.is_empty() {
            Some(Self {
                variant: String::new(),
                ..self.clone()
            })
        } else if !self.country.is_empty() {
            Some(Self {
                language: self.language.clone(),
                ..Self::default()
            })
        } else if !self.language.is_empty() {
            Some(Self::root())
        } else {
            None
        }
    }

    /// Formatting symbols for this locale's language (English when unknown).
    pub fn symbols(&self) -> &'static LocaleSymbols {
        match self.language.as_str() {
            "fr" => &FRENCH,
            "de" => &GERMAN,
            "ja" => &JAPANESE,
            _ => &ENGLISH,
        }
    }

    /// `ja_JP_JP` counts years in Japanese imperial eras.
    pub fn uses_imperial_calendar(&self) -> bool {
        self.language == "ja" && self.country == "JP" && self.variant == "JP"
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s).ok_or_else(|| format!("invalid locale tag '{}'", s))
    }
}

// =============================================================================
// Symbols
// =============================================================================

/// Locale-dependent names and separators.
#[derive(Debug)]
pub struct LocaleSymbols {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub months: [&'static str; 12],
    pub short_months: [&'static str; 12],
    /// Monday first.
    pub weekdays: [&'static str; 7],
    pub short_weekdays: [&'static str; 7],
    pub am_pm: [&'static str; 2],
    /// Before and after the common era.
    pub eras: [&'static str; 2],
}

static ENGLISH: LocaleSymbols = LocaleSymbols {
    decimal_separator: '.',
    grouping_separator: ',',
    months: [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ],
    short_months: [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ],
    weekdays: [
        "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
    ],
    short_weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    am_pm: ["AM", "PM"],
    eras: ["BC", "AD"],
};

static FRENCH: LocaleSymbols = LocaleSymbols {
    decimal_separator: ',',
    grouping_separator: '\u{a0}',
    months: [
        "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
        "octobre", "novembre", "décembre",
    ],
    short_months: [
        "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
        "déc.",
    ],
    weekdays: [
        "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
    ],
    short_weekdays: ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."],
    am_pm: ["AM", "PM"],
    eras: ["av. J.-C.", "ap. J.-C."],
};

static GERMAN: LocaleSymbols = LocaleSymbols {
    decimal_separator: ',',
    grouping_separator: '.',
    months: [
        "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
        "Oktober", "November", "Dezember",
    ],
    short_months: [
        "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sep.", "Okt.", "Nov.",
        "Dez.",
    ],
    weekdays: [
        "Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag",
    ],
    short_weekdays: ["Mo.", "Di.", "Mi.", "Do.", "Fr.", "Sa.", "So."],
    am_pm: ["AM", "PM"],
    eras: ["v. Chr.", "n. Chr."],
};

static JAPANESE: LocaleSymbols = LocaleSymbols {
    decimal_separator: '.',
    grouping_separator: ',',
    months: [
        "1月", "2月", "3月", "4月", "5月", "6月", "7月", "8月", "9月", "10月", "11月", "12月",
    ],
    short_months: [
        "1月", "2月", "3月", "4月", "5月", "6月", "7月", "8月", "9月", "10月", "11月", "12月",
    ],
    weekdays: [
        "月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日", "日曜日",
    ],
    short_weekdays: ["月", "火", "水", "木", "金", "土", "日"],
    am_pm: ["午前", "午後"],
    eras: ["紀元前", "西暦"],
};

// =============================================================================
// Japanese imperial calendar
// =============================================================================

/// An era of the Japanese imperial calendar.
#[derive(Debug, Clone, Copy)]
pub struct ImperialEra {
    pub name: &'static str,
    pub abbreviation: &'static str,
    /// First day of the era (proleptic Gregorian).
    pub since: (i32, u32, u32),
}

impl ImperialEra {
    pub fn start(&self) -> Option<NaiveDate> {
        let (y, m, d) = self.since;
        NaiveDate::from_ymd_opt(y, m, d)
    }

    /// Gregorian year of the given year-of-era.
    pub fn gregorian_year(&self, year_of_era: i32) -> i32 {
        self.since.0 + year_of_era - 1
    }
}

/// Eras in chronological order.
pub const IMPERIAL_ERAS: [ImperialEra; 5] = [
    ImperialEra { name: "明治", abbreviation: "M", since: (1868, 1, 1) },
    ImperialEra { name: "大正", abbreviation: "T", since: (1912, 7, 30) },
    ImperialEra { name: "昭和", abbreviation: "S", since: (1926, 12, 25) },
    ImperialEra { name: "平成", abbreviation: "H", since: (1989, 1, 8) },
    ImperialEra { name: "令和", abbreviation: "R", since: (2019, 5, 1) },
];

/// The era a date belongs to, `None` before Meiji.
pub fn imperial_era_of(date: NaiveDate) -> Option<&'static ImperialEra> {
    IMPERIAL_ERAS
        .iter()
        .rev()
        .find(|era| era.start().is_some_and(|start| date >= start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let locale = Locale::parse("ja_JP_JP").unwrap();
        assert_eq!(locale.language(), "ja");
        assert_eq!(locale.country(), "JP");
        assert_eq!(locale.variant(), "JP");
        assert!(locale.uses_imperial_calendar());

        assert_eq!(Locale::parse("en-us").unwrap().tag(), "en_US");
        assert!(Locale::parse("").unwrap().is_root());
        assert!(Locale::parse("english").is_none());
        assert!(Locale::parse("en_U$").is_none());
    }

    #[test]
    fn test_parent_chain() {
        let mut chain = Vec::new();
        let mut current = Some(Locale::parse("ja_JP_JP").unwrap());
        while let Some(locale) = current {
            chain.push(locale.tag());
            current = locale.parent();
        }
        assert_eq!(chain, vec!["ja_JP_JP", "ja_JP", "ja", ""]);
    }

    #[test]
    fn test_symbols_by_language() {
        assert_eq!(Locale::parse("de_DE").unwrap().symbols().decimal_separator, ',');
        assert_eq!(Locale::root().symbols().months[1], "February");
        assert_eq!(Locale::parse("ja").unwrap().symbols().am_pm[0], "午前");
    }

    #[test]
    fn test_imperial_era_of() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 29).unwrap();
        let era = imperial_era_of(date).unwrap();
        assert_eq!(era.name, "平成");
        assert_eq!(era.gregorian_year(28), 2016);

        let before = NaiveDate::from_ymd_opt(1989, 1, 7).unwrap();
        assert_eq!(imperial_era_of(before).unwrap().name, "昭和");
        assert!(imperial_era_of(NaiveDate::from_ymd_opt(1800, 1, 1).unwrap()).is_none());
    }
}
