/// Types for class sections, preferences and generated schedules
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::time::{self, DayToken, RawDayScalar, RawTime, TimeWindow};

/// Units assumed for a section that does not state its credit load.
pub const DEFAULT_UNITS: u32 = 3;

fn default_units() -> u32 {
    DEFAULT_UNITS
}

/// One offering of a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSection {
    pub course_id: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,

    #[serde(default = "default_units", deserialize_with = "lenient::units")]
    pub units: u32,

    #[serde(default, deserialize_with = "lenient::string")]
    pub section: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub crn: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::optional_string"
    )]
    pub professor: Option<String>,

    /// An empty list means the section is TBA
    #[serde(default, deserialize_with = "lenient::meetings")]
    pub meetings: Vec<MeetingPattern>,
}

impl ClassSection {
    /// Subject portion of the course id (e.g. "CPSC" for "CPSC 131")
    pub fn subject(&self) -> &str {
        self.course_id.split_whitespace().next().unwrap_or("")
    }

    /// Course number portion of the course id (e.g. "131" for "CPSC 131")
    pub fn course_number(&self) -> &str {
        self.course_id.split_whitespace().nth(1).unwrap_or("")
    }

    pub fn is_tba(&self) -> bool {
        self.meetings.is_empty()
    }
}

/// Day field of a raw meeting: one value or several
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawDays {
    One(RawDayScalar),
    Many(Vec<RawDayScalar>),
}

impl RawDays {
    fn normalize(&self) -> Vec<DayToken> {
        match self {
            RawDays::One(day) => vec![day.normalize()],
            RawDays::Many(days) => days.iter().map(RawDayScalar::normalize).collect(),
        }
    }
}

/// A meeting record in any of the shapes the sections service produces
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMeeting {
    #[serde(default)]
    pub day: Option<RawDays>,
    #[serde(default)]
    pub days: Option<RawDays>,
    #[serde(default)]
    pub day_of_week: Option<RawDays>,
    #[serde(default)]
    pub start: Option<RawTime>,
    #[serde(default)]
    pub end: Option<RawTime>,
    #[serde(default)]
    pub start_min: Option<RawTime>,
    #[serde(default)]
    pub end_min: Option<RawTime>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub room: Option<String>,
}

/// A weekly meeting, normalized once on ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMeeting")]
pub struct MeetingPattern {
    /// Canonical days; empty when the record named no day
    pub days: Vec<DayToken>,

    /// `None` when the time is unknown or TBA
    #[serde(flatten)]
    pub window: Option<TimeWindow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl MeetingPattern {
    pub fn new(days: Vec<DayToken>, window: Option<TimeWindow>) -> Self {
        Self {
            days,
            window,
            room: None,
        }
    }
}

impl From<RawMeeting> for MeetingPattern {
    fn from(raw: RawMeeting) -> Self {
        let days = raw
            .day
            .as_ref()
            .or(raw.days.as_ref())
            .or(raw.day_of_week.as_ref())
            .map(RawDays::normalize)
            .unwrap_or_default();
        let window = time::resolve_window(&raw);

        Self {
            days,
            window,
            room: raw.room,
        }
    }
}

/// User preferences for a single scheduling run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Target and maximum total units
    #[serde(default)]
    pub preferred_units: u32,

    /// Empty means no day restriction
    #[serde(default)]
    pub preferred_days: BTreeSet<DayToken>,

    /// Day to one-hour slot starts ("HH:MM")
    #[serde(default)]
    pub preferred_times_by_day: BTreeMap<DayToken, Vec<String>>,

    /// Overrides the configured priority subjects when present and non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_subjects: Option<BTreeSet<String>>,
}

impl Preferences {
    pub fn with_units(preferred_units: u32) -> Self {
        Self {
            preferred_units,
            ..Self::default()
        }
    }
}

/// Display summary of where and when a planned course meets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub days: Vec<DayToken>,
    pub time: String,
}

impl MeetingSummary {
    pub fn from_meetings(meetings: &[MeetingPattern]) -> Self {
        let mut days: Vec<DayToken> = Vec::new();
        for day in meetings.iter().flat_map(|m| &m.days) {
            if !days.contains(day) {
                days.push(day.clone());
            }
        }

        let time = meetings
            .iter()
            .find_map(|m| m.window)
            .map(|w| w.display())
            .unwrap_or_else(|| "TBA".to_string());

        Self { days, time }
    }
}

/// A section chosen for the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCourse {
    #[serde(flatten)]
    pub section: ClassSection,
    pub meeting: MeetingSummary,
}

impl From<ClassSection> for PlannedCourse {
    fn from(section: ClassSection) -> Self {
        let meeting = MeetingSummary::from_meetings(&section.meetings);
        Self { section, meeting }
    }
}

impl PlannedCourse {
    pub fn course_id(&self) -> &str {
        &self.section.course_id
    }

    pub fn units(&self) -> u32 {
        self.section.units
    }
}

/// Outcome of a generation run, later edited by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub planned_courses: Vec<PlannedCourse>,
    pub planned_units: u32,
    /// Course ids found in the filtered pool but not placed
    pub remaining_needed: Vec<String>,
}

impl ScheduleResult {
    /// Recomputes `planned_units` from the planned courses, saturating at `u32::MAX`.
    pub fn recompute_units(&mut self) {
        self.planned_units = self
            .planned_courses
            .iter()
            .map(PlannedCourse::units)
            .fold(0, u32::saturating_add);
    }

    pub fn is_planned(&self, course_id: &str) -> bool {
        self.planned_courses
            .iter()
            .any(|p| p.course_id() == course_id)
    }

    pub fn planned_course_ids(&self) -> impl Iterator<Item = &str> {
        self.planned_courses.iter().map(PlannedCourse::course_id)
    }
}

/// Deserializers that accept the loosely typed values upstream services emit.
mod lenient {
    use super::*;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(value_to_string(Value::deserialize(deserializer)?).filter(|s| !s.trim().is_empty()))
    }

    pub fn units<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let units = match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as u64),
            _ => None,
        };
        Ok(units
            .and_then(|u| u32::try_from(u).ok())
            .unwrap_or(DEFAULT_UNITS))
    }

    pub fn meetings<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<MeetingPattern>, D::Error> {
        Ok(Option::<Vec<MeetingPattern>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
