use super::domain::{AssessmentCriterion, LearningOutcome, QualificationUnit};

/// Keeps the units that match `query` at any level of the hierarchy.
///
/// Matching is a case-insensitive substring test checked bottom-up: a criterion's text or
/// reference, then the learning outcome text, then the unit title or code. Retained units
/// are returned whole. A blank query returns every unit.
pub fn filter_units(units: &[QualificationUnit], query: &str) -> Vec<QualificationUnit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return units.to_vec();
    }

    units
        .iter()
        .filter(|unit| unit_matches(unit, &needle))
        .cloned()
        .collect()
}

fn unit_matches(unit: &QualificationUnit, needle: &str) -> bool {
    unit.learning_outcomes
        .iter()
        .any(|outcome| outcome_matches(outcome, needle))
        || contains(&unit.title, needle)
        || contains(&unit.unit_code, needle)
}

fn outcome_matches(outcome: &LearningOutcome, needle: &str) -> bool {
    outcome
        .criteria
        .iter()
        .any(|criterion| criterion_matches(criterion, needle))
        || contains(&outcome.text, needle)
}

fn criterion_matches(criterion: &AssessmentCriterion, needle: &str) -> bool {
    contains(&criterion.text, needle) || contains(&criterion.full_ref, needle)
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
