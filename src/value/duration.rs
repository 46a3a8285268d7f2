//! Duration expressions.
//!
//! A duration is either a bare decimal number of seconds (`1.5`) or a sum of signed
//! terms, each a decimal number followed by a unit: `ms`, `s`, `m`, `h`, `d`, `w`,
//! `M` (31 days) or `y` (365 days). A sign applies to every following unsigned term,
//! so `2h-5m` is 1h55m and `-2h5m` is minus 2h5m.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;
use crate::value::{Settable, SettableVisitor};

pub const MSECS_PER_SECOND: i64 = 1_000;
pub const MSECS_PER_MINUTE: i64 = 60 * MSECS_PER_SECOND;
pub const MSECS_PER_HOUR: i64 = 60 * MSECS_PER_MINUTE;
pub const MSECS_PER_DAY: i64 = 24 * MSECS_PER_HOUR;
pub const MSECS_PER_WEEK: i64 = 7 * MSECS_PER_DAY;
pub const MSECS_PER_MONTH: i64 = 31 * MSECS_PER_DAY;
pub const MSECS_PER_YEAR: i64 = 365 * MSECS_PER_DAY;

/// A non-negative duration with millisecond precision.
///
/// The value remembers the exact text it was set from and renders it back unchanged.
#[derive(Debug, Clone, Default)]
pub struct Duration {
    msecs: i64,
    text: String,
}

impl Duration {
    /// Build a duration without source text; it renders through [`format_msecs`].
    /// Negative values clamp to zero.
    pub fn from_msecs(msecs: i64) -> Self {
        Self {
            msecs: msecs.max(0),
            text: String::new(),
        }
    }

    pub fn msecs(&self) -> i64 {
        self.msecs
    }

    pub fn as_std(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.msecs.max(0) as u64)
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.msecs == other.msecs
    }
}

impl Eq for Duration {}

impl Settable for Duration {
    fn set(&mut self, raw: &str) -> Result<(), ValueError> {
        let msecs = match raw.parse::<f64>() {
            Ok(secs) if secs.is_finite() => {
                if secs < 0.0 {
                    return Err(ValueError::NegativeDuration(raw.to_string()));
                }
                secs_to_msecs(secs, raw)?
            }
            _ => parse_positive_msecs(raw)?,
        };
        self.msecs = msecs;
        self.text = raw.to_string();
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.msecs == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            f.write_str(&format_msecs(self.msecs))
        } else {
            f.write_str(&self.text)
        }
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SettableVisitor::new())
    }
}

/// Parse `s` into milliseconds, rejecting negative results.
pub fn parse_positive_msecs(s: &str) -> Result<i64, ValueError> {
    let msecs = parse_msecs(s)?;
    if msecs < 0 {
        return Err(ValueError::NegativeDuration(s.to_string()));
    }
    Ok(msecs)
}

/// Parse `s` into milliseconds. The result may be negative.
pub fn parse_msecs(s: &str) -> Result<i64, ValueError> {
    if s.is_empty() {
        return Err(ValueError::EmptyDuration);
    }
    if s.ends_with(|c: char| c.is_ascii_digit() || c == '.') {
        if let Ok(secs) = s.parse::<f64>() {
            return secs_to_msecs(secs, s);
        }
    }

    let mut rest = s;
    let mut negative = false;
    let mut total = 0i64;
    while !rest.is_empty() {
        let n = scan_term(rest).ok_or_else(|| ValueError::InvalidDuration(s.to_string()))?;
        let (term, tail) = rest.split_at(n);
        rest = tail;

        let body = if let Some(body) = term.strip_prefix('-') {
            negative = true;
            body
        } else if let Some(body) = term.strip_prefix('+') {
            negative = false;
            body
        } else {
            term
        };
        let value = term_msecs(body, s)?;
        total = if negative {
            total.checked_sub(value)
        } else {
            total.checked_add(value)
        }
        .ok_or_else(|| ValueError::DurationOverflow(s.to_string()))?;
    }
    Ok(total)
}

/// 2^63, the first magnitude an `i64` cannot hold.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn float_msecs(msecs: f64, s: &str) -> Result<i64, ValueError> {
    if !msecs.is_finite() || msecs >= I64_BOUND || msecs < -I64_BOUND {
        return Err(ValueError::DurationOverflow(s.to_string()));
    }
    Ok(msecs as i64)
}

fn secs_to_msecs(secs: f64, s: &str) -> Result<i64, ValueError> {
    if let Ok(whole) = s.parse::<i64>() {
        return whole
            .checked_mul(MSECS_PER_SECOND)
            .ok_or_else(|| ValueError::DurationOverflow(s.to_string()));
    }
    float_msecs(secs * MSECS_PER_SECOND as f64, s)
}

/// Length in bytes of the leading `[sign]digits[.digits]unit` term, if there is one.
fn scan_term(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'-' | b'+')) {
        i += 1;
    }
    let digits = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits || i == b.len() {
        return None;
    }
    if b[i] == b'.' {
        i += 1;
        let fraction = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == fraction || i == b.len() {
            return None;
        }
    }
    match b[i] {
        b'm' if b.get(i + 1) == Some(&b's') => Some(i + 2),
        b'm' | b's' | b'h' | b'd' | b'w' | b'M' | b'y' => Some(i + 1),
        _ => None,
    }
}

fn term_msecs(term: &str, s: &str) -> Result<i64, ValueError> {
    let (number, unit) = match term.strip_suffix("ms") {
        Some(number) => (number, "ms"),
        None => term.split_at(term.len() - 1),
    };
    let per_unit = match unit {
        "ms" => 1,
        "s" => MSECS_PER_SECOND,
        "m" => MSECS_PER_MINUTE,
        "h" => MSECS_PER_HOUR,
        "d" => MSECS_PER_DAY,
        "w" => MSECS_PER_WEEK,
        "M" => MSECS_PER_MONTH,
        "y" => MSECS_PER_YEAR,
        _ => return Err(ValueError::InvalidDurationSuffix(term.to_string())),
    };
    let overflow = || ValueError::DurationOverflow(s.to_string());
    if !number.contains('.') {
        // Digits only, so a failed parse means the count itself overflowed.
        return number
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_mul(per_unit))
            .ok_or_else(overflow);
    }
    let value: f64 = number
        .parse()
        .map_err(|_| ValueError::InvalidDuration(term.to_string()))?;
    float_msecs(value * per_unit as f64, s)
}

/// Render milliseconds as `[-]XdXhXmXsXms`, omitting zero terms. Zero is `0s`.
pub fn format_msecs(msecs: i64) -> String {
    if msecs == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if msecs < 0 {
        out.push('-');
    }
    let mut rest = msecs.unsigned_abs();
    let units = [
        ("d", MSECS_PER_DAY as u64),
        ("h", MSECS_PER_HOUR as u64),
        ("m", MSECS_PER_MINUTE as u64),
        ("s", MSECS_PER_SECOND as u64),
        ("ms", 1),
    ];
    for (unit, size) in units {
        let count = rest / size;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push_str(unit);
            rest %= size;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duration(s: &str) -> Result<Duration, ValueError> {
        let mut d = Duration::default();
        d.set(s)?;
        Ok(d)
    }

    #[test]
    fn test_signed_terms() {
        assert_eq!(parse_msecs("2h-5m"), Ok(2 * MSECS_PER_HOUR - 5 * MSECS_PER_MINUTE));
        assert_eq!(parse_msecs("-2h5m"), Ok(-(2 * MSECS_PER_HOUR + 5 * MSECS_PER_MINUTE)));
        assert_eq!(parse_msecs("-1h+10m"), Ok(-MSECS_PER_HOUR + 10 * MSECS_PER_MINUTE));
    }

    #[test]
    fn test_bare_numbers_are_seconds() {
        assert_eq!(duration("1.5s").unwrap().msecs(), 1500);
        assert_eq!(duration("1.5").unwrap().msecs(), 1500);
        assert_eq!(duration("30").unwrap().msecs(), 30_000);
        assert_eq!(
            duration("-1"),
            Err(ValueError::NegativeDuration("-1".into()))
        );
    }

    #[test]
    fn test_terms_commute() {
        assert_eq!(parse_msecs("1h30m"), parse_msecs("30m1h"));
        assert_eq!(parse_msecs("1h30m"), Ok(90 * MSECS_PER_MINUTE));
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_msecs("250ms"), Ok(250));
        assert_eq!(parse_msecs("1d"), Ok(MSECS_PER_DAY));
        assert_eq!(parse_msecs("2w"), Ok(2 * MSECS_PER_WEEK));
        assert_eq!(parse_msecs("1M"), Ok(31 * MSECS_PER_DAY));
        assert_eq!(parse_msecs("1y"), Ok(365 * MSECS_PER_DAY));
        assert_eq!(parse_msecs("0.5m"), Ok(30_000));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse_msecs(""), Err(ValueError::EmptyDuration));
        for s in ["5x", "h", "1.h", "1h5", "5MB", "--1h"] {
            assert!(parse_msecs(s).is_err(), "{s:?} should not parse");
        }
        assert_eq!(
            parse_msecs("1000000000000y"),
            Err(ValueError::DurationOverflow("1000000000000y".into()))
        );
        assert_eq!(
            duration("1h-2h"),
            Err(ValueError::NegativeDuration("1h-2h".into()))
        );
    }

    #[test]
    fn test_overflow_at_i64_boundary() {
        assert_eq!(parse_msecs("9223372036854775807ms"), Ok(i64::MAX));
        for s in [
            "9223372036854775808ms",
            "9223372036854775.808s",
            "9223372036854775807ms1ms",
            "9223372036854775807",
        ] {
            assert_eq!(
                parse_msecs(s),
                Err(ValueError::DurationOverflow(s.into())),
                "{s:?}"
            );
        }
    }

    #[test]
    fn test_text_is_preserved() {
        let d = duration("1h30m").unwrap();
        assert_eq!(d.to_string(), "1h30m");
        assert_eq!(d, duration("90m").unwrap());
    }

    #[test]
    fn test_formatter_round_trips() {
        for msecs in [0, 1, 999, 61_000, 90_061_001, -7_500_000] {
            let rendered = format_msecs(msecs);
            assert_eq!(parse_msecs(&rendered), Ok(msecs), "rendered {rendered:?}");
        }
        assert_eq!(format_msecs(90_061_001), "1d1h1m1s1ms");
    }

    #[test]
    fn test_built_durations_survive_serde() {
        let negative = Duration::from_msecs(-5);
        assert_eq!(negative.msecs(), 0);

        for d in [negative, Duration::from_msecs(90_061_001)] {
            let json = serde_json::to_string(&d).unwrap();
            let back: Duration = serde_json::from_str(&json).unwrap();
            assert_eq!(back, d, "{json}");
        }
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        let from_number: Duration = serde_json::from_str("30").unwrap();
        let from_text: Duration = serde_json::from_str(r#""30s""#).unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), r#""30s""#);
    }
}
