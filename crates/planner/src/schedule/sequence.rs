//! Curricular sequence detection.
//!
//! Two courses are treated as sequence-mates (e.g. a course and its direct
//! follow-up) when their ids are numerically adjacent within a subject. This is
//! a heuristic and also flags unrelated courses that happen to be adjacent.

use regex::Regex;
use std::sync::LazyLock;

use super::types::PlannedCourse;

static COURSE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z]+)\s+(\d+)([A-Za-z]*)\s*$").unwrap());

/// A parsed course id such as "MATH 150A".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseId {
    pub subject: String,
    pub number: u32,
    pub suffix: String,
}

impl CourseId {
    pub fn is_parsed(&self) -> bool {
        !self.subject.is_empty()
    }

    fn digit_len(&self) -> usize {
        self.number.to_string().len()
    }
}

/// Parses `SUBJECT NUMBER[SUFFIX]`.
///
/// Unparsable ids yield an empty subject and number 0.
pub fn parse_course_id(id: &str) -> CourseId {
    COURSE_ID_REGEX
        .captures(id)
        .and_then(|caps| {
            let number = caps.get(2)?.as_str().parse().ok()?;
            Some(CourseId {
                subject: caps.get(1)?.as_str().to_ascii_uppercase(),
                number,
                suffix: caps
                    .get(3)
                    .map(|m| m.as_str().to_ascii_uppercase())
                    .unwrap_or_default(),
            })
        })
        .unwrap_or_default()
}

/// Returns true if the two courses belong to the same numbering sequence.
pub fn are_in_sequence(a: &str, b: &str) -> bool {
    let a = parse_course_id(a);
    let b = parse_course_id(b);

    if !a.is_parsed() || !b.is_parsed() || a.subject != b.subject {
        return false;
    }

    // co-listed variants: 122A / 122B
    if a.number == b.number
        && !a.suffix.is_empty()
        && !b.suffix.is_empty()
        && a.suffix != b.suffix
    {
        return true;
    }

    // simple sequence: 122 / 123
    if a.suffix.is_empty() && b.suffix.is_empty() && a.number.abs_diff(b.number) == 1 {
        return true;
    }

    // same prefix, adjacent last digit: 120 / 121
    a.number >= 100
        && b.number >= 100
        && a.digit_len() == b.digit_len()
        && a.number / 10 == b.number / 10
        && (a.number % 10).abs_diff(b.number % 10) == 1
}

/// Returns true if `course_id` is a sequence-mate of any planned course.
pub fn has_sequence_conflict(course_id: &str, planned: &[PlannedCourse]) -> bool {
    planned
        .iter()
        .any(|p| are_in_sequence(course_id, p.course_id()))
}
