use std::collections::HashSet;

use serde::Serialize;

use super::domain::QualificationUnit;

/// Percentage of criteria evidenced, rounded half up. Zero when there is nothing to evidence.
pub fn progress_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    let completed = completed as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u32
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitProgress {
    pub unit_code: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

/// Evidenced-criteria progress for a whole qualification and for each unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
    pub label: String,
    pub units: Vec<UnitProgress>,
}

impl ProgressSummary {
    /// Only references present in `units` count, each once.
    pub fn for_units<I>(units: &[QualificationUnit], completed_refs: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let completed_set: HashSet<String> = completed_refs
            .into_iter()
            .map(|reference| reference.as_ref().trim().to_string())
            .collect();

        let units: Vec<UnitProgress> = units
            .iter()
            .map(|unit| {
                let total = unit.criteria_count();
                let completed = unit
                    .criteria()
                    .filter(|criterion| completed_set.contains(&criterion.full_ref))
                    .count();
                UnitProgress {
                    unit_code: unit.unit_code.clone(),
                    completed,
                    total,
                    percent: progress_percent(completed, total),
                }
            })
            .collect();

        let completed = units.iter().map(|unit| unit.completed).sum();
        let total = units.iter().map(|unit| unit.total).sum();

        Self {
            completed,
            total,
            percent: progress_percent(completed, total),
            label: format!("{completed} of {total} criteria evidenced"),
            units,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}
