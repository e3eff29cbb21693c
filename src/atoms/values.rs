//! Value-space representations of the temporal and duration types
//!
//! Calendar values keep every field the lexical form can carry; which ones
//! are present depends on the native type (a `gMonthDay` has a month and a
//! day, a `dateTime` has all of them). Day-of-month checks go through
//! chrono using a proxy year of the same leap-ness, so years far outside
//! chrono's range still validate correctly.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::validators::builtins::NativeType;

const TZ: &str = r"(Z|[+-]\d{2}:\d{2})?";

static DATE_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}})T(\d{{2}}):(\d{{2}}):(\d{{2}}(?:\.\d+)?){}$",
        TZ
    ))
    .expect("dateTime pattern")
});
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(-?\d{{4,}})-(\d{{2}})-(\d{{2}}){}$", TZ)).expect("date pattern")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(\d{{2}}):(\d{{2}}):(\d{{2}}(?:\.\d+)?){}$", TZ)).expect("time pattern")
});
static G_YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(-?\d{{4,}})-(\d{{2}}){}$", TZ)).expect("gYearMonth pattern")
});
static G_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(-?\d{{4,}}){}$", TZ)).expect("gYear pattern"));
static G_MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^--(\d{{2}})-(\d{{2}}){}$", TZ)).expect("gMonthDay pattern")
});
static G_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^---(\d{{2}}){}$", TZ)).expect("gDay pattern"));
static G_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^--(\d{{2}}){}$", TZ)).expect("gMonth pattern"));
static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .expect("duration pattern")
});

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeOfDay {
    /// Hour, 0..=23 after normalization
    pub hour: u32,
    /// Minute
    pub minute: u32,
    /// Seconds including the fractional part
    pub second: Decimal,
}

/// A calendar value of the dateTime family
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Temporal {
    /// Year (no year zero)
    pub year: Option<i64>,
    /// Month 1..=12
    pub month: Option<u32>,
    /// Day of month
    pub day: Option<u32>,
    /// Time of day
    pub time: Option<TimeOfDay>,
    /// Timezone offset in minutes east of UTC
    pub timezone: Option<i32>,
}

fn days_in_month(year: i64, month: u32) -> u32 {
    let proxy = 2000 + year.rem_euclid(400) as i32;
    let (next_year, next_month) = if month == 12 {
        (proxy + 1, 1)
    } else {
        (proxy, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

fn parse_year(s: &str) -> Option<i64> {
    let digits = s.trim_start_matches('-');
    if digits.len() > 4 && digits.starts_with('0') {
        return None;
    }
    let year: i64 = s.parse().ok()?;
    (year != 0).then_some(year)
}

fn parse_two(s: &str) -> Option<u32> {
    s.parse().ok()
}

fn parse_timezone(tz: Option<regex::Match<'_>>) -> Result<Option<i32>, String> {
    let Some(tz) = tz else { return Ok(None) };
    let tz = tz.as_str();
    if tz == "Z" {
        return Ok(Some(0));
    }
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let hours: i32 = tz[1..3].parse().map_err(|_| "bad timezone hour".to_string())?;
    let minutes: i32 = tz[4..6].parse().map_err(|_| "bad timezone minute".to_string())?;
    if minutes > 59 || hours > 14 || (hours == 14 && minutes > 0) {
        return Err(format!("timezone '{}' out of range", tz));
    }
    Ok(Some(sign * (hours * 60 + minutes)))
}

fn parse_time(h: &str, m: &str, s: &str) -> Result<TimeOfDay, String> {
    let hour = parse_two(h).ok_or("bad hour")?;
    let minute = parse_two(m).ok_or("bad minute")?;
    let second: Decimal = s.parse().map_err(|_| "bad seconds".to_string())?;
    if minute > 59 || second >= Decimal::from(60) {
        return Err("time field out of range".to_string());
    }
    if hour > 24 || (hour == 24 && (minute != 0 || !second.is_zero())) {
        return Err("hour out of range".to_string());
    }
    Ok(TimeOfDay {
        hour,
        minute,
        second,
    })
}

impl Temporal {
    fn empty() -> Self {
        Self {
            year: None,
            month: None,
            day: None,
            time: None,
            timezone: None,
        }
    }

    /// Parse a (whitespace-collapsed) lexical form of the given native type
    pub fn parse(native: NativeType, s: &str) -> Result<Self, String> {
        let mut value = Self::empty();
        let caps = match native {
            NativeType::DateTime => DATE_TIME_RE.captures(s),
            NativeType::Date => DATE_RE.captures(s),
            NativeType::Time => TIME_RE.captures(s),
            NativeType::GYearMonth => G_YEAR_MONTH_RE.captures(s),
            NativeType::GYear => G_YEAR_RE.captures(s),
            NativeType::GMonthDay => G_MONTH_DAY_RE.captures(s),
            NativeType::GDay => G_DAY_RE.captures(s),
            NativeType::GMonth => G_MONTH_RE.captures(s),
            other => return Err(format!("{} is not a calendar type", other)),
        }
        .ok_or_else(|| format!("'{}' is not a valid lexical form", s))?;

        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        let last = caps.len() - 1;
        value.timezone = parse_timezone(caps.get(last))?;

        match native {
            NativeType::DateTime | NativeType::Date => {
                value.year = Some(parse_year(group(1)).ok_or("bad year")?);
                value.month = parse_two(group(2));
                value.day = parse_two(group(3));
                if native == NativeType::DateTime {
                    value.time = Some(parse_time(group(4), group(5), group(6))?);
                }
            }
            NativeType::Time => value.time = Some(parse_time(group(1), group(2), group(3))?),
            NativeType::GYearMonth => {
                value.year = Some(parse_year(group(1)).ok_or("bad year")?);
                value.month = parse_two(group(2));
            }
            NativeType::GYear => value.year = Some(parse_year(group(1)).ok_or("bad year")?),
            NativeType::GMonthDay => {
                value.month = parse_two(group(1));
                value.day = parse_two(group(2));
            }
            NativeType::GDay => value.day = parse_two(group(1)),
            _ => value.month = parse_two(group(1)),
        }

        if let Some(month) = value.month {
            if !(1..=12).contains(&month) {
                return Err(format!("month {} out of range", month));
            }
        }
        if let Some(day) = value.day {
            // gMonthDay accepts --02-29, so a leap proxy year is used
            let limit = match (value.year, value.month) {
                (Some(y), Some(m)) => days_in_month(y, m),
                (None, Some(m)) => days_in_month(2000, m),
                _ => 31,
            };
            if day == 0 || day > limit {
                return Err(format!("day {} out of range", day));
            }
        }
        value.normalize_midnight();
        Ok(value)
    }

    /// 24:00:00 is the first instant of the following day
    fn normalize_midnight(&mut self) {
        let Some(time) = self.time.as_mut() else { return };
        if time.hour != 24 {
            return;
        }
        time.hour = 0;
        if let (Some(year), Some(month), Some(day)) = (self.year, self.month, self.day) {
            let (y, m, d) = next_day(year, month, day);
            self.year = Some(y);
            self.month = Some(m);
            self.day = Some(d);
        }
    }

    /// The same instant expressed in UTC (values without timezone are unchanged)
    pub fn to_utc(&self) -> Temporal {
        let (Some(offset), Some(time)) = (self.timezone, self.time) else {
            return self.clone();
        };
        if offset == 0 {
            return self.clone();
        }
        let year = self.year.unwrap_or(1972);
        let proxy = 2000 + year.rem_euclid(400) as i32;
        let date = NaiveDate::from_ymd_opt(proxy, self.month.unwrap_or(1), self.day.unwrap_or(1));
        let clock = NaiveTime::from_hms_opt(time.hour, time.minute, 0);
        let (Some(date), Some(clock)) = (date, clock) else {
            return self.clone();
        };
        let shifted: NaiveDateTime =
            NaiveDateTime::new(date, clock) - chrono::Duration::minutes(i64::from(offset));
        let mut utc = self.clone();
        utc.timezone = Some(0);
        utc.time = Some(TimeOfDay {
            hour: shifted.hour(),
            minute: shifted.minute(),
            second: time.second,
        });
        if self.day.is_some() {
            let mut new_year = year + i64::from(shifted.year() - proxy);
            if year > 0 && new_year <= 0 {
                new_year -= 1;
            } else if year < 0 && new_year >= 0 {
                new_year += 1;
            }
            utc.year = self.year.map(|_| new_year);
            utc.month = Some(shifted.month());
            utc.day = Some(shifted.day());
        }
        utc
    }

    fn sort_key(&self) -> (i64, u32, u32, u32, u32, Decimal) {
        let time = self.time.unwrap_or(TimeOfDay {
            hour: 0,
            minute: 0,
            second: Decimal::ZERO,
        });
        (
            self.year.unwrap_or(0),
            self.month.unwrap_or(0),
            self.day.unwrap_or(0),
            time.hour,
            time.minute,
            time.second,
        )
    }

    /// Order in the value space; values with and without timezone are incomparable
    pub fn compare(&self, other: &Temporal) -> Option<Ordering> {
        match (self.timezone, other.timezone) {
            (Some(_), Some(_)) => Some(self.to_utc().sort_key().cmp(&other.to_utc().sort_key())),
            (None, None) => Some(self.sort_key().cmp(&other.sort_key())),
            _ => None,
        }
    }

    /// Lexical form for the native type; `canonical` normalizes to UTC
    pub fn format(&self, native: NativeType, canonical: bool) -> String {
        let value = if canonical && matches!(native, NativeType::DateTime | NativeType::Time) {
            self.to_utc()
        } else {
            self.clone()
        };
        let mut out = String::new();
        let year = |out: &mut String| {
            if let Some(y) = value.year {
                if y < 0 {
                    out.push('-');
                }
                let _ = write!(out, "{:04}", y.unsigned_abs());
            }
        };
        match native {
            NativeType::DateTime | NativeType::Date => {
                year(&mut out);
                let _ = write!(
                    out,
                    "-{:02}-{:02}",
                    value.month.unwrap_or(1),
                    value.day.unwrap_or(1)
                );
                if native == NativeType::DateTime {
                    out.push('T');
                    format_time(&mut out, value.time);
                }
            }
            NativeType::Time => format_time(&mut out, value.time),
            NativeType::GYearMonth => {
                year(&mut out);
                let _ = write!(out, "-{:02}", value.month.unwrap_or(1));
            }
            NativeType::GYear => year(&mut out),
            NativeType::GMonthDay => {
                let _ = write!(
                    out,
                    "--{:02}-{:02}",
                    value.month.unwrap_or(1),
                    value.day.unwrap_or(1)
                );
            }
            NativeType::GDay => {
                let _ = write!(out, "---{:02}", value.day.unwrap_or(1));
            }
            _ => {
                let _ = write!(out, "--{:02}", value.month.unwrap_or(1));
            }
        }
        match value.timezone {
            Some(0) => out.push('Z'),
            Some(tz) => {
                let sign = if tz < 0 { '-' } else { '+' };
                let _ = write!(out, "{}{:02}:{:02}", sign, tz.abs() / 60, tz.abs() % 60);
            }
            None => {}
        }
        out
    }

    /// Keep only the fields a target calendar type carries
    pub fn project(&self, target: NativeType) -> Temporal {
        let mut out = self.clone();
        let (year, month, day, time) = match target {
            NativeType::DateTime => (true, true, true, true),
            NativeType::Date => (true, true, true, false),
            NativeType::Time => (false, false, false, true),
            NativeType::GYearMonth => (true, true, false, false),
            NativeType::GYear => (true, false, false, false),
            NativeType::GMonthDay => (false, true, true, false),
            NativeType::GDay => (false, false, true, false),
            _ => (false, true, false, false),
        };
        if !year {
            out.year = None;
        }
        if !month {
            out.month = None;
        }
        if !day {
            out.day = None;
        }
        if !time {
            out.time = None;
        } else if out.time.is_none() {
            out.time = Some(TimeOfDay {
                hour: 0,
                minute: 0,
                second: Decimal::ZERO,
            });
        }
        out
    }
}

fn next_day(year: i64, month: u32, day: u32) -> (i64, u32, u32) {
    if day < days_in_month(year, month) {
        (year, month, day + 1)
    } else if month < 12 {
        (year, month + 1, 1)
    } else {
        let next = if year == -1 { 1 } else { year + 1 };
        (next, 1, 1)
    }
}

fn format_seconds(out: &mut String, second: Decimal) {
    let normalized = second.normalize();
    if normalized < Decimal::from(10) {
        out.push('0');
    }
    let _ = write!(out, "{}", normalized);
}

fn format_time(out: &mut String, time: Option<TimeOfDay>) {
    let time = time.unwrap_or(TimeOfDay {
        hour: 0,
        minute: 0,
        second: Decimal::ZERO,
    });
    let _ = write!(out, "{:02}:{:02}:", time.hour, time.minute);
    format_seconds(out, time.second);
}

/// A duration split into its two incommensurable components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    /// Total months (years * 12 + months), signed
    pub months: i64,
    /// Total seconds (days, hours, minutes, seconds), signed
    pub seconds: Decimal,
}

impl Duration {
    /// Create a duration; both components must share a sign
    pub fn new(months: i64, seconds: Decimal) -> Self {
        Self { months, seconds }
    }

    /// Parse a duration lexical form, restricted to the fields `native` admits
    pub fn parse(native: NativeType, s: &str) -> Result<Self, String> {
        let caps = DURATION_RE
            .captures(s)
            .ok_or_else(|| format!("'{}' is not a valid duration", s))?;
        if s.ends_with('P') || s.ends_with('T') {
            return Err(format!("'{}' has no duration fields", s));
        }
        let has = |i: usize| caps.get(i).is_some();
        match native {
            NativeType::DayTimeDuration if has(2) || has(3) => {
                return Err("dayTimeDuration cannot contain years or months".to_string())
            }
            NativeType::YearMonthDuration if has(4) || has(5) || has(6) || has(7) => {
                return Err("yearMonthDuration cannot contain days or time".to_string())
            }
            _ => {}
        }

        let int = |i: usize| -> Result<i64, String> {
            caps.get(i)
                .map(|m| m.as_str().parse::<i64>())
                .transpose()
                .map(|v| v.unwrap_or(0))
                .map_err(|_| "duration field too large".to_string())
        };
        let dec = |i: usize| -> Result<Decimal, String> {
            caps.get(i)
                .map(|m| m.as_str().parse::<Decimal>())
                .transpose()
                .map(|v| v.unwrap_or(Decimal::ZERO))
                .map_err(|_| "duration field too large".to_string())
        };
        let overflow = || "duration too large".to_string();

        let months = int(2)?
            .checked_mul(12)
            .and_then(|m| m.checked_add(int(3).ok()?))
            .ok_or_else(overflow)?;
        let seconds = dec(4)?
            .checked_mul(Decimal::from(86_400))
            .and_then(|s| s.checked_add(dec(5).ok()?.checked_mul(Decimal::from(3600))?))
            .and_then(|s| s.checked_add(dec(6).ok()?.checked_mul(Decimal::from(60))?))
            .and_then(|s| s.checked_add(dec(7).ok()?))
            .ok_or_else(overflow)?;

        let negative = caps.get(1).is_some();
        Ok(if negative {
            Self::new(-months, -seconds)
        } else {
            Self::new(months, seconds)
        })
    }

    /// Whether both components are zero
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.seconds.is_zero()
    }

    /// Partial order: durations are comparable when the components agree
    pub fn compare(&self, other: &Duration) -> Option<Ordering> {
        let by_months = self.months.cmp(&other.months);
        let by_seconds = self.seconds.cmp(&other.seconds);
        match (by_months, by_seconds) {
            (a, b) if a == b => Some(a),
            (Ordering::Equal, b) => Some(b),
            (a, Ordering::Equal) => Some(a),
            _ => None,
        }
    }

    /// Canonical lexical form; zero renders per the subtype
    pub fn format(&self, native: NativeType) -> String {
        if self.is_zero() {
            return match native {
                NativeType::YearMonthDuration => "P0M".to_string(),
                _ => "PT0S".to_string(),
            };
        }
        let mut out = String::new();
        if self.months < 0 || self.seconds.is_sign_negative() && !self.seconds.is_zero() {
            out.push('-');
        }
        out.push('P');
        let months = self.months.unsigned_abs();
        if months / 12 > 0 {
            let _ = write!(out, "{}Y", months / 12);
        }
        if months % 12 > 0 {
            let _ = write!(out, "{}M", months % 12);
        }

        let total = self.seconds.abs();
        let day = Decimal::from(86_400);
        let days = (total / day).trunc();
        let rest = total - days * day;
        let hours = (rest / Decimal::from(3600)).trunc();
        let rest = rest - hours * Decimal::from(3600);
        let minutes = (rest / Decimal::from(60)).trunc();
        let seconds = (rest - minutes * Decimal::from(60)).normalize();

        if !days.is_zero() {
            let _ = write!(out, "{}D", days.to_u64().unwrap_or_default());
        }
        if !(hours.is_zero() && minutes.is_zero() && seconds.is_zero()) {
            out.push('T');
            if !hours.is_zero() {
                let _ = write!(out, "{}H", hours.to_u64().unwrap_or_default());
            }
            if !minutes.is_zero() {
                let _ = write!(out, "{}M", minutes.to_u64().unwrap_or_default());
            }
            if !seconds.is_zero() {
                let _ = write!(out, "{}S", seconds);
            }
        }
        out
    }
}
