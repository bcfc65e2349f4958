//! Manual edits to a generated schedule.
//!
//! Manual additions are user-intentional: only the one-section-per-course rule
//! is enforced. Unit cap, time and sequence problems are reported back in
//! [`AddOutcome`] so the caller can warn, but never block the edit.

use serde::Serialize;

use super::conflict::has_conflict;
use super::error::AdjustError;
use super::sequence::has_sequence_conflict;
use super::types::{ClassSection, PlannedCourse, ScheduleResult};

/// Advisory information about a manual addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    /// The section overlaps an already planned meeting
    pub time_conflict: bool,
    /// The course is a sequence-mate of a planned course
    pub sequence_conflict: bool,
    pub planned_units: u32,
}

impl AddOutcome {
    pub fn exceeds_cap(&self, preferred_units: u32) -> bool {
        self.planned_units > preferred_units
    }
}

impl ScheduleResult {
    /// Appends a section chosen by the user.
    pub fn add_section(&mut self, section: ClassSection) -> Result<AddOutcome, AdjustError> {
        if self.is_planned(&section.course_id) {
            return Err(AdjustError::DuplicateCourse {
                course_id: section.course_id,
            });
        }

        let time_conflict = has_conflict(&section, &self.planned_courses);
        let sequence_conflict = has_sequence_conflict(&section.course_id, &self.planned_courses);

        self.remaining_needed.retain(|id| *id != section.course_id);
        self.planned_courses.push(PlannedCourse::from(section));
        self.recompute_units();

        Ok(AddOutcome {
            time_conflict,
            sequence_conflict,
            planned_units: self.planned_units,
        })
    }

    /// Removes the planned course at `index` and returns it.
    ///
    /// The course goes back into `remaining_needed`.
    pub fn remove_section(&mut self, index: usize) -> Result<PlannedCourse, AdjustError> {
        if index >= self.planned_courses.len() {
            return Err(AdjustError::IndexOutOfRange {
                index,
                len: self.planned_courses.len(),
            });
        }

        let removed = self.planned_courses.remove(index);
        self.recompute_units();

        if !self.remaining_needed.iter().any(|id| id == removed.course_id()) {
            self.remaining_needed.push(removed.course_id().to_string());
        }

        Ok(removed)
    }
}
