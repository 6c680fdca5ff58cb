//! Date and time patterns.
//!
//! Pattern letters (repeat a letter to widen the field):
//!
//! | Letter | Field | Notes |
//! |--------|-------|-------|
//! | `G` | era | imperial era under `ja_JP_JP` |
//! | `y`, `u` | year | `yy` reads `16` as 2016 |
//! | `M`, `L` | month | `MMM` short name, `MMMM` full name |
//! | `d` | day of month | |
//! | `H` | hour (0-23) | |
//! | `h` | hour (1-12) | combined with `a` |
//! | `m` | minute | |
//! | `s` | second | |
//! | `S` | fraction of second | |
//! | `a` | am/pm marker | |
//! | `E` | day of week | `EEEE` full name |
//! | `X`, `x` | offset | `Z` for UTC with `X` |
//! | `Z` | offset | always numeric |
//!
//! Text in single quotes is literal, `''` is a quote. Any other
//! non-letter character is literal.
//!
//! A numeric field directly followed by another numeric field is read with
//! its exact pattern width (`yyyyMMdd`); otherwise it takes every digit.

use chrono::{
    Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::locale::{imperial_era_of, Locale, IMPERIAL_ERAS};
use crate::models::CellValue;

/// Which temporal value a pattern produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
    /// An instant; the zone resolves inputs without an offset.
    Timestamp,
}

impl TemporalKind {
    pub fn default_pattern(self) -> &'static str {
        match self {
            TemporalKind::Date => "yyyy-MM-dd",
            TemporalKind::Time => "HH:mm:ss",
            TemporalKind::DateTime | TemporalKind::Timestamp => "yyyy-MM-dd HH:mm:ss",
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            TemporalKind::Date => "date",
            TemporalKind::Time => "time",
            TemporalKind::DateTime => "datetime",
            TemporalKind::Timestamp => "timestamp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Letter {
    Era,
    Year,
    Month,
    Day,
    Hour24,
    Hour12,
    Minute,
    Second,
    Fraction,
    AmPm,
    Weekday,
    /// `X`: `Z` for a zero offset.
    OffsetZulu,
    /// `Z`, `x`: always numeric.
    Offset,
}

impl Letter {
    fn from_char(c: char) -> Option<Self> {
        let letter = match c {
            'G' => Letter::Era,
            'y' | 'u' => Letter::Year,
            'M' | 'L' => Letter::Month,
            'd' => Letter::Day,
            'H' => Letter::Hour24,
            'h' => Letter::Hour12,
            'm' => Letter::Minute,
            's' => Letter::Second,
            'S' => Letter::Fraction,
            'a' => Letter::AmPm,
            'E' => Letter::Weekday,
            'X' => Letter::OffsetZulu,
            'Z' | 'x' => Letter::Offset,
            _ => return None,
        };
        Some(letter)
    }

    fn is_numeric(self, width: usize) -> bool {
        match self {
            Letter::Year
            | Letter::Day
            | Letter::Hour24
            | Letter::Hour12
            | Letter::Minute
            | Letter::Second
            | Letter::Fraction => true,
            Letter::Month => width <= 2,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field(Letter, usize),
}

fn compile(pattern: &str) -> Result<Vec<Token>, String> {
    fn push_literal(tokens: &mut Vec<Token>, c: char) {
        if let Some(Token::Literal(s)) = tokens.last_mut() {
            s.push(c);
        } else {
            tokens.push(Token::Literal(c.to_string()));
        }
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                push_literal(&mut tokens, '\'');
                i += 2;
                continue;
            }
            let close = chars[i + 1..]
                .iter()
                .position(|&q| q == '\'')
                .ok_or_else(|| "unterminated quote".to_string())?;
            for &q in &chars[i + 1..i + 1 + close] {
                push_literal(&mut tokens, q);
            }
            i += close + 2;
        } else if c.is_ascii_alphabetic() {
            let letter =
                Letter::from_char(c).ok_or_else(|| format!("unknown pattern letter '{}'", c))?;
            let width = chars[i..].iter().take_while(|&&x| x == c).count();
            tokens.push(Token::Field(letter, width));
            i += width;
        } else {
            push_literal(&mut tokens, c);
            i += 1;
        }
    }

    if tokens.is_empty() {
        return Err("empty pattern".to_string());
    }
    Ok(tokens)
}

static OFFSET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})?").expect("valid offset regex"));

static ZONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:UTC|GMT|Z)?(?:([+-])(\d{1,2})(?::?(\d{2}))?)?$").expect("valid zone regex")
});

/// Parse a zone id into a fixed offset.
///
/// Accepts `UTC`, `GMT`, `Z`, `+09:00`, `-0530`, `GMT+9` and `UTC-03:30`.
/// Region ids are not supported.
pub fn parse_zone(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if zone.is_empty() {
        return None;
    }
    let caps = ZONE_RE.captures(zone)?;
    let Some(sign) = caps.get(1) else {
        return FixedOffset::east_opt(0);
    };
    let hours: i32 = caps.get(2)?.as_str().parse().ok()?;
    let minutes: i32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    FixedOffset::east_opt(if sign.as_str() == "-" { -seconds } else { seconds })
}

/// Values collected while reading a pattern, resolved afterwards.
#[derive(Debug, Default)]
struct Fields {
    imperial_era: Option<usize>,
    before_common_era: bool,
    year: Option<i64>,
    two_digit_year: bool,
    month: Option<i64>,
    day: Option<i64>,
    hour24: Option<i64>,
    hour12: Option<i64>,
    pm: Option<bool>,
    minute: Option<i64>,
    second: Option<i64>,
    nanos: Option<i64>,
    offset: Option<FixedOffset>,
}

/// A compiled date/time pattern.
#[derive(Debug, Clone)]
pub struct TemporalFormat {
    kind: TemporalKind,
    pattern: String,
    tokens: Vec<Token>,
    locale: Locale,
    zone: FixedOffset,
    lenient: bool,
}

impl TemporalFormat {
    pub fn new(
        kind: TemporalKind,
        pattern: Option<&str>,
        locale: Locale,
        zone: FixedOffset,
        lenient: bool,
    ) -> Result<Self, String> {
        let pattern = pattern.unwrap_or_else(|| kind.default_pattern());
        Ok(Self {
            kind,
            pattern: pattern.to_string(),
            tokens: compile(pattern)?,
            locale,
            zone,
            lenient,
        })
    }

    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn parse(&self, input: &str) -> Result<CellValue, String> {
        let fields = self.read_fields(input)?;
        let offset = fields.offset;
        let datetime = self.resolve(fields)?;

        Ok(match self.kind {
            TemporalKind::Date => CellValue::Date(datetime.date()),
            TemporalKind::Time => CellValue::Time(datetime.time()),
            TemporalKind::DateTime => CellValue::DateTime(datetime),
            TemporalKind::Timestamp => {
                let zone = offset.unwrap_or(self.zone);
                let instant = zone
                    .from_local_datetime(&datetime)
                    .single()
                    .ok_or_else(|| format!("'{}' is not a valid local time", input))?;
                CellValue::Timestamp(instant.with_timezone(&Utc))
            }
        })
    }

    /// Render a value of this format's kind; `None` for any other value.
    pub fn format(&self, value: &CellValue) -> Option<String> {
        let (datetime, offset) = match (self.kind, value) {
            (TemporalKind::Date, CellValue::Date(d)) => (d.and_time(NaiveTime::MIN), self.zone),
            (TemporalKind::Time, CellValue::Time(t)) => (epoch_date().and_time(*t), self.zone),
            (TemporalKind::DateTime, CellValue::DateTime(dt)) => (*dt, self.zone),
            (TemporalKind::Timestamp, CellValue::Timestamp(ts)) => {
                (ts.with_timezone(&self.zone).naive_local(), self.zone)
            }
            _ => return None,
        };
        Some(self.render(datetime, offset))
    }

    fn read_fields(&self, input: &str) -> Result<Fields, String> {
        let symbols = self.locale.symbols();
        let imperial = self.locale.uses_imperial_calendar();
        let mut fields = Fields::default();
        let mut rest = input;

        for (idx, token) in self.tokens.iter().enumerate() {
            let mismatch = || format!("'{}' does not match pattern '{}'", input, self.pattern);

            let (letter, width) = match token {
                Token::Literal(lit) => {
                    rest = rest.strip_prefix(lit.as_str()).ok_or_else(mismatch)?;
                    continue;
                }
                Token::Field(letter, width) => (*letter, *width),
            };

            let fixed = match self.tokens.get(idx + 1) {
                Some(Token::Field(next, next_width)) => {
                    letter.is_numeric(width) && next.is_numeric(*next_width)
                }
                _ => false,
            };
            let max_digits = if fixed { Some(width) } else { None };

            match letter {
                Letter::Era if imperial => {
                    let names: Vec<&str> = IMPERIAL_ERAS.iter().map(|e| e.name).collect();
                    let abbreviations: Vec<&str> =
                        IMPERIAL_ERAS.iter().map(|e| e.abbreviation).collect();
                    let (i, r) = match_name(rest, &names)
                        .or_else(|| match_name(rest, &abbreviations))
                        .ok_or_else(mismatch)?;
                    fields.imperial_era = Some(i);
                    rest = r;
                }
                Letter::Era => {
                    let (i, r) = match_name(rest, &symbols.eras).ok_or_else(mismatch)?;
                    fields.before_common_era = i == 0;
                    rest = r;
                }
                Letter::Year => {
                    let (value, digits, r) = take_digits(rest, max_digits).ok_or_else(mismatch)?;
                    fields.year = Some(value);
                    fields.two_digit_year = width == 2 && digits <= 2 && !imperial;
                    rest = r;
                }
                Letter::Month if width >= 3 => {
                    let (i, r) = match_name(rest, &symbols.months)
                        .or_else(|| match_name(rest, &symbols.short_months))
                        .ok_or_else(mismatch)?;
                    fields.month = Some(i as i64 + 1);
                    rest = r;
                }
                Letter::Weekday => {
                    // Matched but not checked against the resolved date.
                    let (_, r) = match_name(rest, &symbols.weekdays)
                        .or_else(|| match_name(rest, &symbols.short_weekdays))
                        .ok_or_else(mismatch)?;
                    rest = r;
                }
                Letter::AmPm => {
                    let (i, r) = match_name(rest, &symbols.am_pm).ok_or_else(mismatch)?;
                    fields.pm = Some(i == 1);
                    rest = r;
                }
                Letter::OffsetZulu | Letter::Offset => {
                    if letter == Letter::OffsetZulu && rest.starts_with('Z') {
                        fields.offset = FixedOffset::east_opt(0);
                        rest = &rest[1..];
                    } else {
                        let caps = OFFSET_RE.captures(rest).ok_or_else(mismatch)?;
                        let whole = caps.get(0).ok_or_else(mismatch)?;
                        fields.offset = parse_zone(whole.as_str());
                        if fields.offset.is_none() {
                            return Err(mismatch());
                        }
                        rest = &rest[whole.end()..];
                    }
                }
                Letter::Fraction => {
                    let (value, digits, r) = take_digits(rest, max_digits).ok_or_else(mismatch)?;
                    let nanos = if digits >= 9 {
                        value / 10_i64.pow((digits - 9) as u32)
                    } else {
                        value * 10_i64.pow((9 - digits) as u32)
                    };
                    fields.nanos = Some(nanos);
                    rest = r;
                }
                Letter::Month
                | Letter::Day
                | Letter::Hour24
                | Letter::Hour12
                | Letter::Minute
                | Letter::Second => {
                    let (value, _, r) = take_digits(rest, max_digits).ok_or_else(mismatch)?;
                    let slot = match letter {
                        Letter::Month => &mut fields.month,
                        Letter::Day => &mut fields.day,
                        Letter::Hour24 => &mut fields.hour24,
                        Letter::Hour12 => &mut fields.hour12,
                        Letter::Minute => &mut fields.minute,
                        _ => &mut fields.second,
                    };
                    *slot = Some(value);
                    rest = r;
                }
            }
        }

        if !rest.is_empty() {
            return Err(format!(
                "unexpected trailing text '{}' for pattern '{}'",
                rest, self.pattern
            ));
        }
        Ok(fields)
    }

    fn resolve(&self, fields: Fields) -> Result<NaiveDateTime, String> {
        let out_of_range = |what: &str, value: i64| format!("{} {} is out of range", what, value);

        let mut year = fields.year.unwrap_or(1970);
        if let Some(era) = fields.imperial_era {
            year = i64::from(IMPERIAL_ERAS[era].gregorian_year(0))
                .checked_add(year)
                .ok_or_else(|| out_of_range("year", year))?;
        } else if fields.two_digit_year {
            year += 2000;
        } else if fields.before_common_era {
            year = 1 - year;
        }
        let month = fields.month.unwrap_or(1);
        let day = fields.day.unwrap_or(1);

        let hour = match fields.hour12 {
            Some(h) => {
                if !self.lenient && !(1..=12).contains(&h) {
                    return Err(out_of_range("hour", h));
                }
                h % 12 + if fields.pm == Some(true) { 12 } else { 0 }
            }
            None => fields.hour24.unwrap_or(0),
        };
        let minute = fields.minute.unwrap_or(0);
        let second = fields.second.unwrap_or(0);
        let nanos = fields.nanos.unwrap_or(0);

        let year_i32 = i32::try_from(year).map_err(|_| out_of_range("year", year))?;

        let datetime = if self.lenient {
            let months = i64::from(year_i32)
                .checked_mul(12)
                .and_then(|m| m.checked_add(month - 1))
                .ok_or_else(|| out_of_range("month", month))?;
            let base = NaiveDate::from_ymd_opt(
                i32::try_from(months.div_euclid(12)).map_err(|_| out_of_range("month", month))?,
                (months.rem_euclid(12) + 1) as u32,
                1,
            )
            .ok_or_else(|| out_of_range("year", year))?;

            let shift = |dt: NaiveDateTime, delta: Option<TimeDelta>| {
                delta.and_then(|delta| dt.checked_add_signed(delta))
            };
            let start = base.and_time(NaiveTime::MIN);
            shift(start, TimeDelta::try_days(day - 1))
                .and_then(|dt| shift(dt, TimeDelta::try_hours(hour)))
                .and_then(|dt| shift(dt, TimeDelta::try_minutes(minute)))
                .and_then(|dt| shift(dt, TimeDelta::try_seconds(second)))
                .and_then(|dt| shift(dt, Some(TimeDelta::nanoseconds(nanos))))
                .ok_or_else(|| "date overflow".to_string())?
        } else {
            let month_u32 = u32::try_from(month).map_err(|_| out_of_range("month", month))?;
            let day_u32 = u32::try_from(day).map_err(|_| out_of_range("day", day))?;
            let date = NaiveDate::from_ymd_opt(year_i32, month_u32, day_u32).ok_or_else(|| {
                format!("{:04}-{:02}-{:02} is not a valid date", year, month, day)
            })?;
            let time = u32::try_from(hour)
                .ok()
                .zip(u32::try_from(minute).ok())
                .zip(u32::try_from(second).ok())
                .and_then(|((h, m), s)| {
                    NaiveTime::from_hms_nano_opt(h, m, s, u32::try_from(nanos).ok()?)
                })
                .ok_or_else(|| {
                    format!("{:02}:{:02}:{:02} is not a valid time", hour, minute, second)
                })?;

            if let Some(era) = fields.imperial_era {
                let actual = imperial_era_of(date).map(|e| e.name);
                if actual != Some(IMPERIAL_ERAS[era].name) {
                    return Err(format!(
                        "{} does not belong to era {}",
                        date, IMPERIAL_ERAS[era].name
                    ));
                }
            }
            date.and_time(time)
        };

        Ok(datetime)
    }

    fn render(&self, datetime: NaiveDateTime, offset: FixedOffset) -> String {
        let symbols = self.locale.symbols();
        let imperial = self.locale.uses_imperial_calendar();
        let era = if imperial {
            imperial_era_of(datetime.date())
        } else {
            None
        };
        let mut out = String::new();

        for token in &self.tokens {
            let (letter, width) = match token {
                Token::Literal(lit) => {
                    out.push_str(lit);
                    continue;
                }
                Token::Field(letter, width) => (*letter, *width),
            };

            match letter {
                Letter::Era => match era {
                    Some(e) if width >= 4 => out.push_str(e.name),
                    Some(e) => out.push_str(e.abbreviation),
                    None => {
                        let idx = usize::from(datetime.year() > 0);
                        out.push_str(symbols.eras[idx]);
                    }
                },
                Letter::Year => {
                    let year = match era {
                        Some(e) => datetime.year() - e.since.0 + 1,
                        None if datetime.year() <= 0 => 1 - datetime.year(),
                        None => datetime.year(),
                    };
                    if width == 2 && era.is_none() {
                        out.push_str(&format!("{:02}", year % 100));
                    } else {
                        out.push_str(&pad(i64::from(year), width));
                    }
                }
                Letter::Month if width >= 4 => {
                    out.push_str(symbols.months[datetime.month0() as usize])
                }
                Letter::Month if width == 3 => {
                    out.push_str(symbols.short_months[datetime.month0() as usize])
                }
                Letter::Month => out.push_str(&pad(i64::from(datetime.month()), width)),
                Letter::Day => out.push_str(&pad(i64::from(datetime.day()), width)),
                Letter::Hour24 => out.push_str(&pad(i64::from(datetime.hour()), width)),
                Letter::Hour12 => {
                    let h = match datetime.hour() % 12 {
                        0 => 12,
                        h => h,
                    };
                    out.push_str(&pad(i64::from(h), width));
                }
                Letter::Minute => out.push_str(&pad(i64::from(datetime.minute()), width)),
                Letter::Second => out.push_str(&pad(i64::from(datetime.second()), width)),
                Letter::Fraction => {
                    let nanos = format!("{:09}", datetime.nanosecond() % 1_000_000_000);
                    let mut fraction: String = nanos.chars().take(width).collect();
                    while fraction.len() < width {
                        fraction.push('0');
                    }
                    out.push_str(&fraction);
                }
                Letter::AmPm => out.push_str(symbols.am_pm[usize::from(datetime.hour() >= 12)]),
                Letter::Weekday => {
                    let idx = datetime.weekday().num_days_from_monday() as usize;
                    if width >= 4 {
                        out.push_str(symbols.weekdays[idx]);
                    } else {
                        out.push_str(symbols.short_weekdays[idx]);
                    }
                }
                Letter::OffsetZulu | Letter::Offset => {
                    let seconds = offset.local_minus_utc();
                    if seconds == 0 && letter == Letter::OffsetZulu {
                        out.push('Z');
                    } else {
                        let sign = if seconds < 0 { '-' } else { '+' };
                        let abs = seconds.abs();
                        let (h, m) = (abs / 3600, (abs % 3600) / 60);
                        if width >= 3 {
                            out.push_str(&format!("{}{:02}:{:02}", sign, h, m));
                        } else {
                            out.push_str(&format!("{}{:02}{:02}", sign, h, m));
                        }
                    }
                }
            }
        }
        out
    }
}

/// 1970-01-01, carrier date for time-only values.
fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

fn pad(value: i64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Read up to `max` ASCII digits (all of them when `None`).
fn take_digits(input: &str, max: Option<usize>) -> Option<(i64, usize, &str)> {
    let available = input.bytes().take_while(u8::is_ascii_digit).count();
    let count = max.map_or(available, |m| available.min(m));
    if count == 0 {
        return None;
    }
    let value = input[..count].parse().ok()?;
    Some((value, count, &input[count..]))
}

/// Longest name matching the start of `input`, ignoring ASCII case.
fn match_name<'a>(input: &'a str, names: &[&str]) -> Option<(usize, &'a str)> {
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .filter(|(_, name)| {
            input
                .get(..name.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
        })
        .max_by_key(|(_, name)| name.len())
        .map(|(i, name)| (i, &input[name.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn datetime(pattern: Option<&str>, lenient: bool) -> TemporalFormat {
        TemporalFormat::new(TemporalKind::DateTime, pattern, Locale::root(), utc(), lenient)
            .unwrap()
    }

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> CellValue {
        CellValue::DateTime(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[test]
    fn test_default_pattern_round_trip() {
        let fmt = datetime(None, false);
        let value = fmt.parse("2016-02-29 07:12:01").unwrap();
        assert_eq!(value, ymd_hms(2016, 2, 29, 7, 12, 1));
        assert_eq!(fmt.format(&value).unwrap(), "2016-02-29 07:12:01");
    }

    #[test]
    fn test_strict_rejects_invalid_day() {
        let fmt = datetime(None, false);
        assert!(fmt.parse("2016-01-60 07:12:01").is_err());
        assert!(fmt.parse("2015-02-29 07:12:01").is_err());
        assert!(fmt.parse("abc").is_err());
    }

    #[test]
    fn test_lenient_rolls_over() {
        let fmt = datetime(None, true);
        assert_eq!(
            fmt.parse("2016-01-60 07:12:01").unwrap(),
            ymd_hms(2016, 2, 29, 7, 12, 1)
        );
        assert_eq!(
            fmt.parse("2016-13-01 24:00:00").unwrap(),
            ymd_hms(2017, 1, 2, 0, 0, 0)
        );
    }

    #[test]
    fn test_lenient_overflow_is_a_parse_error() {
        let date = TemporalFormat::new(TemporalKind::Date, None, Locale::root(), utc(), true)
            .unwrap();
        assert_eq!(
            date.parse("2016-9223372036854775807-01").unwrap_err(),
            "month 9223372036854775807 is out of range"
        );
        assert!(date.parse("2016-99999999999999-01").is_err());

        let fmt = datetime(None, true);
        assert!(fmt.parse("2016-01-9999999999999999 00:00:00").is_err());
        assert!(fmt.parse("2016-01-01 9223372036854775807:00:00").is_err());
        assert!(fmt.parse("2016-01-01 00:9223372036854775807:00").is_err());
        assert!(fmt.parse("2016-01-01 00:00:9223372036854775807").is_err());
        assert!(fmt.parse("2016-01-01 00:00:99999999999999").is_err());
    }

    #[test]
    fn test_short_pattern() {
        let fmt = datetime(Some("yy/M/d H:m:s"), false);
        let value = fmt.parse("16/2/29 7:12:1").unwrap();
        assert_eq!(value, ymd_hms(2016, 2, 29, 7, 12, 1));
        assert_eq!(fmt.format(&value).unwrap(), "16/2/29 7:12:1");
    }

    #[test]
    fn test_adjacent_numeric_fields_use_fixed_width() {
        let fmt = TemporalFormat::new(
            TemporalKind::Date,
            Some("yyyyMMdd"),
            Locale::root(),
            utc(),
            false,
        )
        .unwrap();
        assert_eq!(
            fmt.parse("20160229").unwrap(),
            CellValue::Date(NaiveDate::from_ymd_opt(2016, 2, 29).unwrap())
        );
    }

    #[test]
    fn test_imperial_calendar() {
        let locale = Locale::parse("ja_JP_JP").unwrap();
        let fmt = TemporalFormat::new(
            TemporalKind::DateTime,
            Some("GGGGy年M月d日 aaaH時m分s秒"),
            locale,
            utc(),
            false,
        )
        .unwrap();
        let value = fmt.parse("平成28年2月29日 午前7時12分1秒").unwrap();
        assert_eq!(value, ymd_hms(2016, 2, 29, 7, 12, 1));
        assert_eq!(
            fmt.format(&value).unwrap(),
            "平成28年2月29日 午前7時12分1秒"
        );
        assert!(fmt.parse("平成32年2月29日 午前7時12分1秒").is_err());
    }

    #[test]
    fn test_month_names_and_twelve_hour_clock() {
        let fmt = datetime(Some("d MMM yyyy h:mm a"), false);
        let value = fmt.parse("29 feb 2016 7:12 PM").unwrap();
        assert_eq!(value, ymd_hms(2016, 2, 29, 19, 12, 0));
        assert_eq!(fmt.format(&value).unwrap(), "29 Feb 2016 7:12 PM");
    }

    #[test]
    fn test_quoted_literals() {
        let fmt = datetime(Some("yyyy-MM-dd'T'HH:mm:ss"), false);
        let value = fmt.parse("2016-02-29T07:12:01").unwrap();
        assert_eq!(fmt.format(&value).unwrap(), "2016-02-29T07:12:01");
        assert!(compile("yyyy'T").is_err());
        assert!(compile("yyyy-qq").is_err());
    }

    #[test]
    fn test_timestamp_uses_zone_and_offset() {
        let tokyo = parse_zone("+09:00").unwrap();
        let fmt = TemporalFormat::new(
            TemporalKind::Timestamp,
            None,
            Locale::root(),
            tokyo,
            false,
        )
        .unwrap();
        let value = fmt.parse("2016-02-29 09:00:00").unwrap();
        let expected = Utc.with_ymd_and_hms(2016, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(value, CellValue::Timestamp(expected));
        assert_eq!(fmt.format(&value).unwrap(), "2016-02-29 09:00:00");

        let with_offset = TemporalFormat::new(
            TemporalKind::Timestamp,
            Some("yyyy-MM-dd HH:mm:ssXXX"),
            Locale::root(),
            tokyo,
            false,
        )
        .unwrap();
        let value = with_offset.parse("2016-02-29 00:00:00Z").unwrap();
        assert_eq!(value, CellValue::Timestamp(expected));
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(parse_zone("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_zone("GMT").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_zone("GMT+9").unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(parse_zone("-05:30").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert!(parse_zone("Asia/Tokyo").is_none());
        assert!(parse_zone("+25:00").is_none());
    }

    #[test]
    fn test_format_rejects_other_kinds() {
        let fmt = datetime(None, false);
        assert!(fmt.format(&CellValue::Integer(1)).is_none());
    }
}
