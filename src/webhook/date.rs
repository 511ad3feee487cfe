//! `createdAt` date parsing
//!
//! Accepts the timestamp shapes producers actually send: the interchange
//! subset of ISO 8601 (`YYYY[-MM[-DD]][THH:mm[:ss[.sss]][Z|±HH:mm]]`, with
//! six-digit signed years), RFC 2822, the `Date` display layout
//! `Mon Feb 10 2025 09:20:29 GMT+0900 (Japan Standard Time)`, the
//! automation-service form `February 10, 2025 at 09:20AM`, and epoch
//! milliseconds as JSON numbers. Values carrying an offset are normalised to
//! UTC; naive values are kept as wall-clock time.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use serde_json::Value;

/// Largest magnitude (in ms) a timestamp may have to count as an instant
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

/// Layout of `Date.prototype.toString` once the zone name is stripped
const DISPLAY_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// Naive date-time layouts tried after the structured parsers
const DATE_TIME_FORMATS: &[&str] = &["%B %d, %Y at %I:%M%p", "%B %d, %Y at %I:%M %p"];

/// Date-only layouts, resolved to midnight
const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%B %d, %Y", "%a %b %d %Y"];

/// Parse a `createdAt` JSON value into an instant.
///
/// Returns `None` when the value does not denote a real calendar instant.
pub fn parse_created_at(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_str(s),
        Value::Number(n) => n.as_f64().and_then(from_epoch_millis),
        Value::Bool(true) => from_epoch_millis(1.0),
        // A single-element array stringifies to its element
        Value::Array(items) => match items.as_slice() {
            [Value::String(s)] => parse_str(s),
            _ => None,
        },
        _ => None,
    }
}

fn parse_str(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    parse_iso(s)
        .or_else(|| DateTime::parse_from_rfc2822(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| parse_display(s))
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        // chrono models second 60 as a leap second; it is not a valid instant here
        .filter(|dt| dt.nanosecond() < 1_000_000_000)
        .filter(|dt| in_range(dt))
}

/// `YYYY[-MM[-DD]]` optionally followed by `T` (or a space) and a clock
fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match s.split_once(|c: char| c == 'T' || c == ' ') {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };
    let date = parse_iso_date(date_part)?;
    let Some(time_part) = time_part else {
        return date.and_hms_opt(0, 0, 0);
    };

    let (clock, offset) = split_offset(time_part)?;
    let naive = parse_iso_clock(date, clock)?;
    match offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.naive_utc()),
        None => Some(naive),
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let (year, rest) = match s.as_bytes().first()? {
        b'+' | b'-' => {
            let year = i32::try_from(digits(s.get(1..7)?, 6)?).ok()?;
            let negative = s.starts_with('-');
            // -000000 has no meaning
            if negative && year == 0 {
                return None;
            }
            (if negative { -year } else { year }, &s[7..])
        }
        _ => (i32::try_from(digits(s.get(..4)?, 4)?).ok()?, &s[4..]),
    };

    let (month, day) = if rest.is_empty() {
        (1, 1)
    } else {
        let rest = rest.strip_prefix('-')?;
        match rest.split_once('-') {
            Some((month, day)) => (digits(month, 2)?, digits(day, 2)?),
            None => (digits(rest, 2)?, 1),
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split a trailing `Z` or `±HH:mm` off the clock
fn split_offset(time: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = time.strip_suffix('Z') {
        return Some((clock, FixedOffset::east_opt(0)));
    }
    let Some(idx) = time.rfind(|c: char| c == '+' || c == '-') else {
        return Some((time, None));
    };

    let (clock, offset) = time.split_at(idx);
    let (hours, minutes) = offset[1..].split_once(':')?;
    let (hours, minutes) = (digits(hours, 2)?, digits(minutes, 2)?);
    if hours > 23 || minutes > 59 {
        return None;
    }
    let seconds = i32::try_from(hours * 3600 + minutes * 60).ok()?;
    let seconds = if offset.starts_with('-') { -seconds } else { seconds };
    Some((clock, Some(FixedOffset::east_opt(seconds)?)))
}

/// `HH:mm[:ss[.sss]]`, where `24:00` is the next midnight
fn parse_iso_clock(date: NaiveDate, clock: &str) -> Option<NaiveDateTime> {
    let mut fields = clock.splitn(3, ':');
    let hour = digits(fields.next()?, 2)?;
    let minute = digits(fields.next()?, 2)?;
    let (second, nanos) = match fields.next() {
        None => (0, 0),
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => (digits(whole, 2)?, fraction_nanos(frac)?),
            None => (digits(sec, 2)?, 0),
        },
    };

    if hour == 24 {
        if minute != 0 || second != 0 || nanos != 0 {
            return None;
        }
        return date.succ_opt()?.and_hms_opt(0, 0, 0);
    }
    date.and_hms_nano_opt(hour, minute, second, nanos)
}

/// `Mon Feb 10 2025 09:20:29 GMT+0900`, with or without a trailing `(Zone Name)`
fn parse_display(s: &str) -> Option<NaiveDateTime> {
    let s = s
        .strip_suffix(')')
        .and_then(|rest| rest.rsplit_once(" ("))
        .map_or(s, |(head, _)| head);
    DateTime::parse_from_str(s, DISPLAY_FORMAT)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Exactly `len` ASCII digits
fn digits(s: &str, len: usize) -> Option<u32> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fractional seconds of any precision, truncated to nanoseconds
fn fraction_nanos(frac: &str) -> Option<u32> {
    if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kept = &frac[..frac.len().min(9)];
    let scale = 10_u32.pow(9 - u32::try_from(kept.len()).ok()?);
    kept.parse::<u32>().ok().map(|n| n * scale)
}

#[allow(clippy::cast_precision_loss)]
fn in_range(dt: &NaiveDateTime) -> bool {
    (dt.and_utc().timestamp_millis() as f64).abs() <= MAX_EPOCH_MILLIS
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() || ms.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64).map(|dt| dt.naive_utc())
}
