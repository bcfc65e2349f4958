//! Error types for manual schedule edits.

use thiserror::Error;

/// Errors returned when the user edits a generated schedule.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdjustError {
    /// A section of this course is already planned
    #[error("{course_id} is already in the schedule")]
    DuplicateCourse { course_id: String },

    /// No planned course at the given position
    #[error("No planned course at position {index} (schedule has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
