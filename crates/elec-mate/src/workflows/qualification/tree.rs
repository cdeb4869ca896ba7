use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::domain::{AssessmentCriterion, AssessmentCriterionRow, LearningOutcome, QualificationUnit};

/// Sum of assessment criteria across every unit and learning outcome.
pub fn total_acs(units: &[QualificationUnit]) -> usize {
    units.iter().map(QualificationUnit::criteria_count).sum()
}

/// Unit → learning outcome → criteria hierarchy for one qualification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualificationTree {
    pub units: Vec<QualificationUnit>,
}

impl QualificationTree {
    /// Groups flat rows by unit, then learning outcome, keeping first-seen order. A criterion
    /// reference that appears twice is kept only the first time.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = AssessmentCriterionRow>,
    {
        let mut units: Vec<QualificationUnit> = Vec::new();
        let mut unit_index: HashMap<String, usize> = HashMap::new();
        let mut seen_refs: HashSet<String> = HashSet::new();

        for row in rows {
            let full_ref = row.ac_full_ref.trim().to_string();
            if full_ref.is_empty() || !seen_refs.insert(full_ref.clone()) {
                continue;
            }

            let position = *unit_index.entry(row.unit_code.clone()).or_insert_with(|| {
                units.push(QualificationUnit {
                    unit_code: row.unit_code.clone(),
                    title: row.unit_title.clone(),
                    learning_outcomes: Vec::new(),
                });
                units.len() - 1
            });
            let unit = &mut units[position];

            let outcome = match unit
                .learning_outcomes
                .iter()
                .position(|outcome| outcome.number == row.lo_number)
            {
                Some(index) => &mut unit.learning_outcomes[index],
                None => {
                    unit.learning_outcomes.push(LearningOutcome {
                        number: row.lo_number.clone(),
                        text: row.lo_text.clone(),
                        criteria: Vec::new(),
                    });
                    let last = unit.learning_outcomes.len() - 1;
                    &mut unit.learning_outcomes[last]
                }
            };

            outcome.criteria.push(AssessmentCriterion {
                full_ref,
                text: row.ac_text,
            });
        }

        Self { units }
    }

    pub fn total_acs(&self) -> usize {
        total_acs(&self.units)
    }

    pub fn contains(&self, full_ref: &str) -> bool {
        self.units
            .iter()
            .flat_map(QualificationUnit::criteria)
            .any(|criterion| criterion.full_ref == full_ref)
    }

    pub fn into_units(self) -> Vec<QualificationUnit> {
        self.units
    }

    /// Flattens back into backend rows, one per criterion.
    pub fn to_rows(&self) -> Vec<AssessmentCriterionRow> {
        let mut rows = Vec::with_capacity(self.total_acs());
        for unit in &self.units {
            for outcome in &unit.learning_outcomes {
                for criterion in &outcome.criteria {
                    rows.push(AssessmentCriterionRow {
                        unit_code: unit.unit_code.clone(),
                        unit_title: unit.title.clone(),
                        lo_number: outcome.number.clone(),
                        lo_text: outcome.text.clone(),
                        ac_full_ref: criterion.full_ref.clone(),
                        ac_text: criterion.text.clone(),
                    });
                }
            }
        }
        rows
    }
}

#[cfg(test)]
pub(crate) fn row(unit: &str, lo: &str, full_ref: &str, text: &str) -> AssessmentCriterionRow {
    AssessmentCriterionRow {
        unit_code: unit.to_string(),
        unit_title: format!("Unit {unit}"),
        lo_number: lo.to_string(),
        lo_text: format!("Learning outcome {lo}"),
        ac_full_ref: full_ref.to_string(),
        ac_text: text.to_string(),
    }
}
