/// Greedy schedule construction
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use super::conflict::has_conflict;
use super::filter::passes_preferences;
use super::sequence::has_sequence_conflict;
use super::types::{ClassSection, PlannedCourse, Preferences, ScheduleResult};

/// Subjects scheduled ahead of everything else unless configured otherwise.
pub const DEFAULT_PRIORITY_SUBJECTS: [&str; 2] = ["CPSC", "CS"];

/// Options that stay fixed across scheduling runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub priority_subjects: BTreeSet<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::with_priority_subjects(DEFAULT_PRIORITY_SUBJECTS)
    }
}

impl BuildOptions {
    pub fn with_priority_subjects<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            priority_subjects: subjects
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// A course id together with its offerings, in encounter order.
struct CourseGroup<'a> {
    course_id: &'a str,
    offerings: Vec<&'a ClassSection>,
}

/// Builds schedules with a single greedy first-fit pass.
///
/// The pass never backtracks: a course that cannot be placed when its turn
/// comes is left in `remaining_needed`, even if a different ordering would
/// have fit it.
pub struct ScheduleBuilder {
    options: BuildOptions,
}

impl ScheduleBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Selects at most one section per course from `pool`.
    ///
    /// Sections failing the day/time preferences are discarded before grouping
    /// and therefore never appear in `remaining_needed`.
    pub fn build(&self, pool: &[ClassSection], prefs: &Preferences) -> ScheduleResult {
        let candidates: Vec<&ClassSection> = pool
            .iter()
            .filter(|section| passes_preferences(section, prefs))
            .collect();

        let groups = group_by_course(&candidates);
        let order = self.order_courses(groups, prefs);

        let cap = prefs.preferred_units;
        let mut result = ScheduleResult::default();
        let mut placed: HashSet<&str> = HashSet::new();

        for group in &order {
            if result.planned_units >= cap {
                break;
            }

            if placed.contains(group.course_id) {
                continue;
            }

            let selected = group.offerings.iter().find(|offering| {
                let within_cap = result
                    .planned_units
                    .checked_add(offering.units)
                    .is_some_and(|total| total <= cap);
                if !within_cap {
                    debug!(course_id = %offering.course_id, crn = %offering.crn, "Skipping offering, exceeds unit cap");
                    return false;
                }
                if has_conflict(offering, &result.planned_courses) {
                    debug!(course_id = %offering.course_id, crn = %offering.crn, "Skipping offering, time conflict");
                    return false;
                }
                if has_sequence_conflict(&offering.course_id, &result.planned_courses) {
                    debug!(course_id = %offering.course_id, crn = %offering.crn, "Skipping offering, sequence conflict");
                    return false;
                }
                true
            });

            if let Some(offering) = selected {
                result.planned_courses.push(PlannedCourse::from((*offering).clone()));
                result.planned_units = result.planned_units.saturating_add(offering.units);
                placed.insert(group.course_id);
            }
        }

        result.remaining_needed = order
            .iter()
            .filter(|group| !placed.contains(group.course_id))
            .map(|group| group.course_id.to_string())
            .collect();

        info!(
            pool = pool.len(),
            candidates = candidates.len(),
            courses = order.len(),
            planned = result.planned_courses.len(),
            planned_units = result.planned_units,
            preferred_units = cap,
            "Generated schedule"
        );

        result
    }

    /// Priority-subject courses first, then the rest; each partition ascending by
    /// the first offering's units. The sort is stable so ties keep encounter order.
    fn order_courses<'a>(
        &self,
        groups: Vec<CourseGroup<'a>>,
        prefs: &Preferences,
    ) -> Vec<CourseGroup<'a>> {
        let priority = match &prefs.preferred_subjects {
            Some(subjects) if !subjects.is_empty() => {
                BuildOptions::with_priority_subjects(subjects).priority_subjects
            }
            _ => self.options.priority_subjects.clone(),
        };

        let (mut first, mut rest): (Vec<_>, Vec<_>) = groups.into_iter().partition(|group| {
            group
                .offerings
                .first()
                .map(|o| priority.contains(&o.subject().to_ascii_uppercase()))
                .unwrap_or(false)
        });

        let first_units = |group: &CourseGroup<'_>| group.offerings.first().map(|o| o.units);
        first.sort_by_key(first_units);
        rest.sort_by_key(first_units);

        first.extend(rest);
        first
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

fn group_by_course<'a>(candidates: &[&'a ClassSection]) -> Vec<CourseGroup<'a>> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<CourseGroup<'a>> = Vec::new();

    for &section in candidates {
        let course_id = section.course_id.as_str();
        match index.get(course_id) {
            Some(&i) => groups[i].offerings.push(section),
            None => {
                index.insert(course_id, groups.len());
                groups.push(CourseGroup {
                    course_id,
                    offerings: vec![section],
                });
            }
        }
    }

    groups
}

/// Generates a schedule with the default priority subjects.
pub fn generate(pool: &[ClassSection], prefs: &Preferences) -> ScheduleResult {
    ScheduleBuilder::default().build(pool, prefs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::conflict::meetings_conflict;
    use crate::schedule::sequence::are_in_sequence;
    use serde_json::json;

    fn pool(value: serde_json::Value) -> Vec<ClassSection> {
        serde_json::from_value(value).unwrap()
    }

    fn planned_ids(result: &ScheduleResult) -> Vec<&str> {
        result.planned_course_ids().collect()
    }

    fn assert_invariants(pool: &[ClassSection], prefs: &Preferences, result: &ScheduleResult) {
        let sum: u32 = result.planned_courses.iter().map(|p| p.units()).sum();
        assert_eq!(result.planned_units, sum);
        assert!(result.planned_units <= prefs.preferred_units);

        for (i, a) in result.planned_courses.iter().enumerate() {
            for b in &result.planned_courses[i + 1..] {
                assert_ne!(a.course_id(), b.course_id());
                assert!(!meetings_conflict(&a.section.meetings, &b.section.meetings));
                assert!(!are_in_sequence(a.course_id(), b.course_id()));
            }
        }

        let mut filtered: Vec<&str> = Vec::new();
        for section in pool.iter().filter(|s| passes_preferences(s, prefs)) {
            if !filtered.contains(&section.course_id.as_str()) {
                filtered.push(&section.course_id);
            }
        }
        for id in &result.remaining_needed {
            assert!(!result.is_planned(id), "{id} both planned and remaining");
        }
        let mut union: Vec<&str> = planned_ids(result);
        union.extend(result.remaining_needed.iter().map(String::as_str));
        union.sort_unstable();
        filtered.sort_unstable();
        assert_eq!(union, filtered);
    }

    #[test]
    fn test_time_conflict_keeps_one() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "units": 3, "meetings": [{ "day": "Mon", "start": 480, "end": 540 }] },
            { "course_id": "MATH 150", "units": 4, "meetings": [{ "day": "Mon", "start": 500, "end": 560 }] }
        ]));
        let prefs = Preferences::with_units(10);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CPSC 131"]);
        assert_eq!(result.remaining_needed, vec!["MATH 150".to_string()]);
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_sequence_mates_not_coscheduled() {
        let pool = pool(json!([
            { "course_id": "CHEM 122", "units": 4, "meetings": [] },
            { "course_id": "CHEM 123", "units": 4, "meetings": [] }
        ]));
        let prefs = Preferences::with_units(15);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CHEM 122"]);
        assert_eq!(result.remaining_needed, vec!["CHEM 123".to_string()]);
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_day_filtered_course_is_dropped_not_deferred() {
        // Current behavior: a course whose only offerings fail the filter is
        // absent from both planned_courses and remaining_needed.
        let pool = pool(json!([
            { "course_id": "CPSC 131", "meetings": [{ "day": "Mon", "start": 480, "end": 540 }] },
            { "course_id": "MATH 270A", "meetings": [{ "day": "Tue", "start": 480, "end": 540 }] }
        ]));
        let prefs: Preferences = serde_json::from_value(json!({
            "preferredUnits": 15,
            "preferredDays": ["Tue"]
        }))
        .unwrap();
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["MATH 270A"]);
        assert!(result.remaining_needed.is_empty());
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_first_fit_over_offerings() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "section": "01", "meetings": [{ "day": "Mon", "start": 480, "end": 540 }] },
            { "course_id": "MATH 270A", "section": "01", "meetings": [{ "day": "Mon", "start": 510, "end": 570 }] },
            { "course_id": "MATH 270A", "section": "02", "meetings": [{ "day": "Mon", "start": 540, "end": 600 }] },
            { "course_id": "MATH 270A", "section": "03", "meetings": [{ "day": "Tue", "start": 480, "end": 540 }] }
        ]));
        let prefs = Preferences::with_units(15);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CPSC 131", "MATH 270A"]);
        assert_eq!(result.planned_courses[1].section.section, "02");
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_zero_unit_cap_plans_nothing() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "meetings": [] },
            { "course_id": "MATH 270A", "meetings": [] },
            { "course_id": "CPSC 131", "meetings": [] }
        ]));
        let prefs = Preferences::with_units(0);
        let result = generate(&pool, &prefs);

        assert!(result.planned_courses.is_empty());
        assert_eq!(result.planned_units, 0);
        assert_eq!(
            result.remaining_needed,
            vec!["CPSC 131".to_string(), "MATH 270A".to_string()]
        );
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_empty_pool() {
        let result = generate(&[], &Preferences::with_units(15));
        assert_eq!(result, ScheduleResult::default());
    }

    #[test]
    fn test_priority_subjects_then_units_order() {
        let pool = pool(json!([
            { "course_id": "HIST 180", "units": 3 },
            { "course_id": "MATH 270A", "units": 2 },
            { "course_id": "CPSC 362", "units": 4 },
            { "course_id": "CPSC 240", "units": 3 },
            { "course_id": "CS 50", "units": 3 }
        ]));
        let prefs = Preferences::with_units(30);
        let result = generate(&pool, &prefs);

        assert_eq!(
            planned_ids(&result),
            vec!["CPSC 240", "CS 50", "CPSC 362", "MATH 270A", "HIST 180"]
        );
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_preferred_subjects_override() {
        let pool = pool(json!([
            { "course_id": "CPSC 240", "units": 3 },
            { "course_id": "MATH 270A", "units": 3 }
        ]));
        let mut prefs = Preferences::with_units(3);
        prefs.preferred_subjects = Some(["math".to_string()].into_iter().collect());
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["MATH 270A"]);
        assert_eq!(result.remaining_needed, vec!["CPSC 240".to_string()]);
    }

    #[test]
    fn test_unit_cap_skips_oversized_offering() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "units": 3 },
            { "course_id": "MATH 270A", "units": 4 },
            { "course_id": "HIST 180", "units": 3 }
        ]));
        let prefs = Preferences::with_units(6);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CPSC 131", "HIST 180"]);
        assert_eq!(result.planned_units, 6);
        assert_eq!(result.remaining_needed, vec!["MATH 270A".to_string()]);
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_huge_unit_count_exceeds_cap() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "units": 3 },
            { "course_id": "HIST 180", "units": 4294967295u64 }
        ]));
        let prefs = Preferences::with_units(10);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CPSC 131"]);
        assert_eq!(result.planned_units, 3);
        assert_eq!(result.remaining_needed, vec!["HIST 180".to_string()]);
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_greedy_can_strand_capacity() {
        // 4 + 4 would fill the cap exactly, but the 3-unit course goes first.
        let pool = pool(json!([
            { "course_id": "HIST 180", "units": 3 },
            { "course_id": "MATH 270A", "units": 4 },
            { "course_id": "PHYS 225", "units": 4 }
        ]));
        let prefs = Preferences::with_units(8);
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["HIST 180", "MATH 270A"]);
        assert_eq!(result.planned_units, 7);
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_time_preferences_filter_pool() {
        let pool = pool(json!([
            { "course_id": "CPSC 131", "meetings": [{ "day": 1, "start_min": 1140, "end_min": 1290 }] },
            { "course_id": "CPSC 121", "meetings": [{ "day": 1, "start_min": 540, "end_min": 590 }] },
            { "course_id": "MATH 270A", "meetings": [{ "day": "Tue", "time": "7:00 PM-8:15 PM" }] }
        ]));
        let prefs: Preferences = serde_json::from_value(json!({
            "preferredUnits": 15,
            "preferredTimesByDay": { "Mon": ["09:00"] }
        }))
        .unwrap();
        let result = generate(&pool, &prefs);

        assert_eq!(planned_ids(&result), vec!["CPSC 121", "MATH 270A"]);
        assert!(result.remaining_needed.is_empty());
        assert_invariants(&pool, &prefs, &result);
    }

    #[test]
    fn test_invariants_on_mixed_pool() {
        let pool = pool(json!([
            { "course_id": "CPSC 120", "units": 3, "meetings": [{ "day": ["Mon", "Wed"], "start": 480, "end": 555 }] },
            { "course_id": "CPSC 121", "units": 3, "meetings": [{ "day": ["Mon", "Wed"], "start": 600, "end": 675 }] },
            { "course_id": "CPSC 131", "units": 3, "meetings": [{ "day": ["Mon", "Wed"], "start": 540, "end": 615 }] },
            { "course_id": "CPSC 131", "units": 3, "meetings": [{ "day": ["Tue", "Thu"], "start": 540, "end": 615 }] },
            { "course_id": "MATH 150A", "units": 4, "meetings": [{ "day": "Tue", "time": "10:00 AM-11:50 AM" }] },
            { "course_id": "MATH 150B", "units": 4, "meetings": [{ "day": "Fri", "start": 480, "end": 600 }] },
            { "course_id": "ENGL 101", "units": 3, "meetings": [] },
            { "course_id": "Independent Study", "units": 1, "meetings": [{ "day": "TBA" }] }
        ]));
        let prefs = Preferences::with_units(15);
        let result = generate(&pool, &prefs);

        assert_invariants(&pool, &prefs, &result);
        assert_eq!(result.planned_units, 14);
    }
}
