//! Day and time preference filtering of candidate sections.

use std::collections::{BTreeMap, BTreeSet};

use super::time::{parse_slot, DayToken, TimeWindow};
use super::types::{ClassSection, MeetingPattern, Preferences};

/// Returns true if the meetings fall on at least one preferred day.
///
/// TBA sections and an empty preference always match.
pub fn matches_preferred_days(
    meetings: &[MeetingPattern],
    preferred_days: &BTreeSet<DayToken>,
) -> bool {
    if meetings.is_empty() || preferred_days.is_empty() {
        return true;
    }

    meetings
        .iter()
        .flat_map(|m| &m.days)
        .any(|day| preferred_days.contains(day))
}

/// Returns true if at least one meeting is compatible with the preferred slots.
///
/// Filtering is only active when some day has a non-empty slot list. A meeting
/// is compatible when it has an unknown window, falls on a day without
/// preferences, or overlaps one of that day's one-hour slots.
pub fn matches_preferred_times(
    meetings: &[MeetingPattern],
    preferred_times: &BTreeMap<DayToken, Vec<String>>,
) -> bool {
    let active = preferred_times.values().any(|slots| !slots.is_empty());
    if !active || meetings.is_empty() {
        return true;
    }

    meetings
        .iter()
        .any(|meeting| meeting_matches_times(meeting, preferred_times))
}

fn meeting_matches_times(
    meeting: &MeetingPattern,
    preferred_times: &BTreeMap<DayToken, Vec<String>>,
) -> bool {
    let Some(window) = meeting.window else {
        return true;
    };

    if meeting.days.is_empty() {
        return true;
    }

    meeting.days.iter().any(|day| {
        let slots = slots_for(day, preferred_times);
        slots.is_empty() || slots.iter().any(|slot| slot.overlaps(&window))
    })
}

/// Parsed slots for a day. Unparsable slot tokens are ignored, so a day whose
/// tokens are all unparsable behaves like a day without preferences.
fn slots_for(day: &DayToken, preferred_times: &BTreeMap<DayToken, Vec<String>>) -> Vec<TimeWindow> {
    preferred_times
        .get(day)
        .map(|tokens| tokens.iter().filter_map(|t| parse_slot(t)).collect())
        .unwrap_or_default()
}

/// Returns true if the section passes both the day and the time filter.
pub fn passes_preferences(section: &ClassSection, prefs: &Preferences) -> bool {
    matches_preferred_days(&section.meetings, &prefs.preferred_days)
        && matches_preferred_times(&section.meetings, &prefs.preferred_times_by_day)
}
