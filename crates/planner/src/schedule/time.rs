//! Day and time-of-day normalization.
//!
//! Upstream meeting records arrive in several shapes (numeric weekdays, full or
//! abbreviated names, minute offsets, formatted clock strings). Everything here
//! degrades to a pass-through or `None` instead of failing, so a parsing gap can
//! never drop a class from consideration.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

use super::types::RawMeeting;

/// Minutes in a single preferred time slot.
pub const SLOT_MINUTES: u32 = 60;

/// Duration assumed when only a start time can be parsed.
pub const DEFAULT_MEETING_MINUTES: u32 = 60;

static CLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*([AaPp][Mm])?").unwrap());

/// A day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// Maps the 1 = Monday ... 7 = Sunday convention used by the sections service.
    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        }
    }

    /// Case-insensitive lookup of full and abbreviated English names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" | "mo" => Some(Weekday::Mon),
            "tue" | "tues" | "tuesday" | "tu" => Some(Weekday::Tue),
            "wed" | "wednesday" | "we" => Some(Weekday::Wed),
            "thu" | "thur" | "thurs" | "thursday" | "th" => Some(Weekday::Thu),
            "fri" | "friday" | "fr" => Some(Weekday::Fri),
            "sat" | "saturday" | "sa" => Some(Weekday::Sat),
            "sun" | "sunday" | "su" => Some(Weekday::Sun),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

/// Canonical day token.
///
/// Unrecognized input is carried verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayToken {
    Known(Weekday),
    Unrecognized(String),
}

impl fmt::Display for DayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayToken::Known(day) => f.write_str(day.as_str()),
            DayToken::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for DayToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single day value as it may appear on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawDayScalar {
    Number(i64),
    Name(String),
}

impl RawDayScalar {
    pub(crate) fn normalize(&self) -> DayToken {
        match self {
            RawDayScalar::Number(n) => normalize_day_number(*n),
            RawDayScalar::Name(name) => normalize_day(name),
        }
    }
}

impl<'de> Deserialize<'de> for DayToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(RawDayScalar::deserialize(deserializer)?.normalize())
    }
}

/// Normalizes a textual day.
///
/// Accepts canonical tokens, full or abbreviated names in any case and numeric
/// strings `"1"` to `"7"`. Anything else is echoed back unchanged.
pub fn normalize_day(input: &str) -> DayToken {
    if let Some(day) = Weekday::from_name(input) {
        return DayToken::Known(day);
    }

    if let Some(day) = input.trim().parse::<i64>().ok().and_then(Weekday::from_number) {
        return DayToken::Known(day);
    }

    DayToken::Unrecognized(input.to_string())
}

/// Normalizes a numeric weekday (1 = Mon ... 7 = Sun).
pub fn normalize_day_number(n: i64) -> DayToken {
    match Weekday::from_number(n) {
        Some(day) => DayToken::Known(day),
        None => DayToken::Unrecognized(n.to_string()),
    }
}

/// A half-open `[start, end)` window in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: u32,
    pub end: u32,
}

impl TimeWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Zero-length and inverted windows carry no usable time.
    pub fn is_positive(&self) -> bool {
        self.end > self.start
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        !(self.end <= other.start || self.start >= other.end)
    }

    /// Formats the window as `HH:MM-HH:MM`.
    pub fn display(&self) -> String {
        format!("{}-{}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Formats minutes since midnight as a 24-hour `HH:MM` string.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parses the first `H:MM` (optionally followed by AM/PM) clock reading.
///
/// Signed readings such as `"-1:59"` are not clock times and are skipped.
pub fn parse_clock(text: &str) -> Option<u32> {
    clock_readings(text).next().flatten()
}

/// Every unsigned clock reading in `text`, in order. `None` marks a reading
/// that matched the pattern but is out of range.
fn clock_readings(text: &str) -> impl Iterator<Item = Option<u32>> + '_ {
    CLOCK_REGEX
        .captures_iter(text)
        .filter(move |caps| caps.get(0).is_some_and(|m| !is_signed(text, m.start())))
        .map(|caps| clock_from_captures(&caps))
}

/// True if the reading starting at `start` continues a longer number or carries
/// a leading minus sign. A `-` right after a word or digit is a range separator.
fn is_signed(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev();
    match before.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-') => !before.next().is_some_and(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

fn clock_from_captures(caps: &regex::Captures<'_>) -> Option<u32> {
    let hours: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    let hours = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if hours == 0 || hours > 12 {
                return None;
            }
            // 12 AM is midnight, 12 PM stays noon
            let base = hours % 12;
            if meridiem == "pm" {
                base + 12
            } else {
                base
            }
        }
        None if hours < 24 => hours,
        None => return None,
    };

    Some(hours * 60 + minutes)
}

/// Parses a formatted range such as `"8:00 AM-9:15 AM"` or `"13:00-14:00"`.
///
/// When only a start reading is present the window is assumed to last
/// [`DEFAULT_MEETING_MINUTES`].
pub fn parse_clock_range(text: &str) -> Option<TimeWindow> {
    let mut readings = clock_readings(text);

    let start = readings.next()??;
    let end = match readings.next() {
        Some(Some(end)) => end,
        _ => start + DEFAULT_MEETING_MINUTES,
    };

    Some(TimeWindow::new(start, end))
}

/// Parses a preferred slot token (`"HH:MM"`) into its one-hour window.
pub fn parse_slot(token: &str) -> Option<TimeWindow> {
    parse_clock(token).map(|start| TimeWindow::new(start, start + SLOT_MINUTES))
}

/// A time value as it may appear on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTime {
    Minutes(i64),
    Fractional(f64),
    Text(String),
}

impl RawTime {
    fn as_minutes(&self) -> Option<u32> {
        match self {
            RawTime::Minutes(m) if (0..24 * 60).contains(m) => u32::try_from(*m).ok(),
            RawTime::Fractional(m) if (0.0..(24.0 * 60.0)).contains(m) => Some(*m as u32),
            _ => None,
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            RawTime::Text(text) => Some(text),
            _ => None,
        }
    }
}

fn minute_pair(start: Option<&RawTime>, end: Option<&RawTime>) -> Option<TimeWindow> {
    let start = start?.as_minutes()?;
    let end = end?.as_minutes()?;
    Some(TimeWindow::new(start, end)).filter(TimeWindow::is_positive)
}

/// Resolves a raw meeting to its minute window.
///
/// Resolution order: explicit `start`/`end` minutes, then `start_min`/`end_min`,
/// then a formatted string (`time`, or textual `start`/`end`). A source that
/// yields an empty or inverted window is skipped. `None` means the window is
/// unknown and must not block scheduling.
pub(crate) fn resolve_window(meeting: &RawMeeting) -> Option<TimeWindow> {
    if let Some(window) = minute_pair(meeting.start.as_ref(), meeting.end.as_ref()) {
        return Some(window);
    }

    if let Some(window) = minute_pair(meeting.start_min.as_ref(), meeting.end_min.as_ref()) {
        return Some(window);
    }

    if let Some(window) = meeting
        .time
        .as_deref()
        .and_then(parse_clock_range)
        .filter(TimeWindow::is_positive)
    {
        return Some(window);
    }

    let start_text = meeting
        .start
        .as_ref()
        .or(meeting.start_min.as_ref())
        .and_then(RawTime::as_text)?;
    let end_text = meeting
        .end
        .as_ref()
        .or(meeting.end_min.as_ref())
        .and_then(RawTime::as_text);

    let window = match end_text {
        Some(end_text) => parse_clock_range(&format!("{start_text}-{end_text}")),
        None => parse_clock_range(start_text),
    };
    window.filter(TimeWindow::is_positive)
}
