//! Meeting-time conflict detection.

use super::types::{ClassSection, MeetingPattern, PlannedCourse};

/// Returns true if two meetings share a day and their windows overlap.
///
/// A meeting with no day or no resolvable window is unknown and never conflicts.
pub fn meetings_overlap(a: &MeetingPattern, b: &MeetingPattern) -> bool {
    let (Some(wa), Some(wb)) = (a.window, b.window) else {
        return false;
    };

    wa.overlaps(&wb) && a.days.iter().any(|day| b.days.contains(day))
}

/// Returns true if any meeting in `new` overlaps any meeting in `existing`.
pub fn meetings_conflict(new: &[MeetingPattern], existing: &[MeetingPattern]) -> bool {
    new.iter()
        .any(|n| existing.iter().any(|e| meetings_overlap(n, e)))
}

/// Returns true if `candidate` overlaps any already-planned section.
///
/// TBA sections (no meetings) never conflict.
pub fn has_conflict(candidate: &ClassSection, planned: &[PlannedCourse]) -> bool {
    if candidate.meetings.is_empty() {
        return false;
    }

    planned
        .iter()
        .any(|p| meetings_conflict(&candidate.meetings, &p.section.meetings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::time::{normalize_day, TimeWindow};

    fn meeting(day: &str, start: u32, end: u32) -> MeetingPattern {
        MeetingPattern::new(vec![normalize_day(day)], Some(TimeWindow::new(start, end)))
    }

    fn section(course_id: &str, meetings: Vec<MeetingPattern>) -> ClassSection {
        ClassSection {
            course_id: course_id.to_string(),
            title: String::new(),
            units: 3,
            section: "01".to_string(),
            crn: String::new(),
            professor: None,
            meetings,
        }
    }

    #[test]
    fn test_overlap_on_same_day() {
        assert!(meetings_overlap(
            &meeting("Mon", 480, 540),
            &meeting("monday", 500, 560)
        ));
    }

    #[test]
    fn test_no_overlap_on_different_days() {
        assert!(!meetings_overlap(
            &meeting("Mon", 480, 540),
            &meeting("Tue", 480, 540)
        ));
    }

    #[test]
    fn test_touching_windows_do_not_conflict() {
        assert!(!meetings_overlap(
            &meeting("Wed", 540, 600),
            &meeting("Wed", 600, 660)
        ));
    }

    #[test]
    fn test_unknown_window_or_day_never_conflicts() {
        let tba_time = MeetingPattern::new(vec![normalize_day("Mon")], None);
        let no_day = MeetingPattern::new(Vec::new(), Some(TimeWindow::new(480, 540)));

        assert!(!meetings_overlap(&tba_time, &meeting("Mon", 480, 540)));
        assert!(!meetings_overlap(&no_day, &meeting("Mon", 480, 540)));
    }

    #[test]
    fn test_multi_day_meeting() {
        let mwf = MeetingPattern::new(
            vec![normalize_day("Mon"), normalize_day("Wed"), normalize_day("Fri")],
            Some(TimeWindow::new(600, 650)),
        );
        assert!(meetings_overlap(&mwf, &meeting("Fri", 620, 700)));
        assert!(!meetings_overlap(&mwf, &meeting("Thu", 620, 700)));
    }

    #[test]
    fn test_has_conflict_against_planned() {
        let planned = vec![PlannedCourse::from(section(
            "CPSC 131",
            vec![meeting("Mon", 480, 540)],
        ))];

        assert!(has_conflict(
            &section("MATH 150A", vec![meeting("Mon", 500, 560)]),
            &planned
        ));
        assert!(!has_conflict(
            &section("MATH 150A", vec![meeting("Mon", 540, 600)]),
            &planned
        ));
        assert!(!has_conflict(&section("MATH 150A", Vec::new()), &planned));
    }
}
