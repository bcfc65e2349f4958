/// Types for structured degree audit data
use serde::{Deserialize, Serialize};

use crate::schedule::ClassSection;

/// A degree audit, already extracted from the student's report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DegreeAudit {
    #[serde(default)]
    pub student_info: StudentInfo,
    #[serde(default)]
    pub completed_courses: Vec<CompletedCourse>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentInfo {
    pub name: Option<String>,
    pub id: Option<String>,
    pub catalog_year: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedCourse {
    pub term: Option<String>,
    pub subject: String,
    pub number: String,
    pub title: Option<String>,
    pub units: Option<f32>,
    pub grade: Option<String>,
    #[serde(default)]
    pub status: CourseStatus,
}

impl CompletedCourse {
    /// Course id in the sections service's format ("CPSC 131")
    pub fn course_id(&self) -> String {
        format!("{} {}", self.subject.trim(), self.number.trim()).to_ascii_uppercase()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    #[default]
    Completed,
    InProgress,
}

/// One requirement block of the audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub requirement_id: Option<String>,
    pub name: Option<String>,
    /// "GE", "Major", "Support" or "Elective"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub total_units_required: Option<f32>,
    pub total_units_completed: Option<f32>,
    #[serde(default)]
    pub courses_allowed: Vec<String>,
}

impl Requirement {
    /// True when the audit reports enough completed units.
    pub fn is_satisfied(&self) -> bool {
        match (self.total_units_required, self.total_units_completed) {
            (Some(required), Some(completed)) => required > 0.0 && completed >= required,
            _ => false,
        }
    }
}

/// A requirement together with the open sections that could fulfil it
#[derive(Debug, Clone, Serialize)]
pub struct RequirementPlan {
    pub requirement_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub total_units_required: Option<f32>,
    pub total_units_completed: Option<f32>,
    pub courses_allowed: Vec<String>,
    pub open_sections: Vec<ClassSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub remaining_requirements: usize,
}

/// Requirements matched against the open-sections list
#[derive(Debug, Clone, Serialize)]
pub struct AuditPlan {
    pub student_info: StudentInfo,
    pub summary: PlanSummary,
    pub requirements: Vec<RequirementPlan>,
}

/// Grade validation helper
#[derive(Debug, Clone)]
pub struct GradeValidator;

impl GradeValidator {
    /// Checks if a grade is C- or higher, or a passing credit grade
    pub fn is_passing_grade(grade: &str) -> bool {
        matches!(
            grade.trim().to_ascii_uppercase().as_str(),
            "A+" | "A" | "A-" | "B+" | "B" | "B-" | "C+" | "C" | "C-" | "P" | "CR" | "TP"
        )
    }
}
