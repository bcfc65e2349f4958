/// Matching of degree audit requirements against open sections
mod types;

pub use types::*;

use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::lookup::normalize_course_id;
use crate::schedule::ClassSection;

/// Course ids the student no longer needs to take: completed with a passing
/// grade (or no grade recorded), or currently in progress.
pub fn taken_course_ids(audit: &DegreeAudit) -> HashSet<String> {
    audit
        .completed_courses
        .iter()
        .filter(|course| match course.status {
            CourseStatus::InProgress => true,
            CourseStatus::Completed => course
                .grade
                .as_deref()
                .map(GradeValidator::is_passing_grade)
                .unwrap_or(true),
        })
        .map(CompletedCourse::course_id)
        .collect()
}

fn sections_by_course(open_sections: &[ClassSection]) -> HashMap<String, Vec<&ClassSection>> {
    let mut by_course: HashMap<String, Vec<&ClassSection>> = HashMap::new();
    for section in open_sections {
        let code = normalize_course_id(&section.course_id);
        if code.is_empty() {
            continue;
        }
        by_course.entry(code).or_default().push(section);
    }
    by_course
}

/// Pairs every requirement with the open sections of its allowed courses.
pub fn build_plan(audit: &DegreeAudit, open_sections: &[ClassSection]) -> AuditPlan {
    let by_course = sections_by_course(open_sections);

    let requirements: Vec<RequirementPlan> = audit
        .requirements
        .iter()
        .map(|req| {
            let open_sections = req
                .courses_allowed
                .iter()
                .filter_map(|code| by_course.get(&normalize_course_id(code)))
                .flatten()
                .map(|section| (*section).clone())
                .collect();

            RequirementPlan {
                requirement_id: req.requirement_id.clone(),
                name: req.name.clone(),
                kind: req.kind.clone(),
                total_units_required: req.total_units_required,
                total_units_completed: req.total_units_completed,
                courses_allowed: req.courses_allowed.clone(),
                open_sections,
            }
        })
        .collect();

    AuditPlan {
        student_info: audit.student_info.clone(),
        summary: PlanSummary {
            remaining_requirements: requirements.len(),
        },
        requirements,
    }
}

/// Flattens the audit plan into a candidate pool for the schedule builder.
///
/// Satisfied requirements and courses already taken are skipped. A section that
/// fulfils several requirements appears once, in the order first encountered.
pub fn candidate_pool(audit: &DegreeAudit, open_sections: &[ClassSection]) -> Vec<ClassSection> {
    let taken = taken_course_ids(audit);
    let plan = build_plan(audit, open_sections);

    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut pool = Vec::new();

    let needed = audit
        .requirements
        .iter()
        .zip(plan.requirements)
        .filter(|(req, _)| !req.is_satisfied())
        .flat_map(|(_, matched)| matched.open_sections);

    for section in needed {
        let course_id = normalize_course_id(&section.course_id);
        if taken.contains(&course_id) {
            continue;
        }

        let identity = if section.crn.is_empty() {
            (course_id, section.section.clone(), String::new())
        } else {
            (String::new(), String::new(), section.crn.clone())
        };
        if seen.insert(identity) {
            pool.push(section);
        }
    }

    info!(
        requirements = audit.requirements.len(),
        open_sections = open_sections.len(),
        taken = taken.len(),
        candidates = pool.len(),
        "Built candidate pool from degree audit"
    );

    pool
}
