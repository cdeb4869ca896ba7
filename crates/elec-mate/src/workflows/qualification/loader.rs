use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::domain::{Qualification, QualificationUnit};
use super::repository::{QualificationRepository, RepositoryError};
use super::tree::QualificationTree;

#[derive(Debug, thiserror::Error)]
pub enum QualificationError {
    #[error("unknown qualification '{0}'")]
    UnknownQualification(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Resolved (or pending) qualification hierarchy as handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualificationTreeView {
    pub qualification: Option<Qualification>,
    pub units: Vec<QualificationUnit>,
    pub total_acs: usize,
    pub is_loading: bool,
}

impl QualificationTreeView {
    /// Nothing selected: a valid state, not a failure.
    pub fn empty() -> Self {
        Self {
            qualification: None,
            units: Vec::new(),
            total_acs: 0,
            is_loading: false,
        }
    }

    /// Placeholder for callers rendering before the fetch resolves.
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::empty()
        }
    }

    fn resolved(qualification: Qualification, tree: QualificationTree) -> Self {
        let total_acs = tree.total_acs();
        Self {
            qualification: Some(qualification),
            units: tree.into_units(),
            total_acs,
            is_loading: false,
        }
    }
}

pub struct QualificationTreeLoader<R> {
    repository: Arc<R>,
}

impl<R> QualificationTreeLoader<R>
where
    R: QualificationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn load(&self, code: Option<&str>) -> Result<QualificationTreeView, QualificationError> {
        let code = match code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => code,
            None => return Ok(QualificationTreeView::empty()),
        };

        let qualification = self
            .repository
            .fetch_qualification(code)?
            .ok_or_else(|| QualificationError::UnknownQualification(code.to_string()))?;

        let rows = self.repository.fetch_criteria(code)?;
        let tree = QualificationTree::from_rows(rows);
        debug!(
            qualification = code,
            units = tree.units.len(),
            total_acs = tree.total_acs(),
            "qualification tree loaded"
        );

        Ok(QualificationTreeView::resolved(qualification, tree))
    }
}
