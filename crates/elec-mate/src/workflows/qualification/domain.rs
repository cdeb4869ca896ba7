use serde::{Deserialize, Serialize};

/// Qualification header as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub code: String,
    pub title: String,
    pub level: String,
    pub awarding_body: String,
}

/// A unit of a qualification, e.g. "ELTK 04".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationUnit {
    pub unit_code: String,
    pub title: String,
    pub learning_outcomes: Vec<LearningOutcome>,
}

impl QualificationUnit {
    pub fn criteria_count(&self) -> usize {
        self.learning_outcomes
            .iter()
            .map(|outcome| outcome.criteria.len())
            .sum()
    }

    pub fn criteria(&self) -> impl Iterator<Item = &AssessmentCriterion> {
        self.learning_outcomes
            .iter()
            .flat_map(|outcome| outcome.criteria.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningOutcome {
    pub number: String,
    pub text: String,
    pub criteria: Vec<AssessmentCriterion>,
}

/// Atomic requirement of a qualification. `full_ref` (e.g. "2.3a") is unique across the
/// whole system and is what completion and selection sets refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentCriterion {
    pub full_ref: String,
    pub text: String,
}

/// Flat backend row; one per assessment criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentCriterionRow {
    pub unit_code: String,
    pub unit_title: String,
    pub lo_number: String,
    pub lo_text: String,
    pub ac_full_ref: String,
    pub ac_text: String,
}
