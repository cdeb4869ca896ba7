//! Qualification trees (unit → learning outcome → assessment criteria), free-text search over
//! them, and evidenced-progress aggregation.

pub mod domain;
mod import;
pub mod loader;
pub mod progress;
pub mod repository;
pub mod router;
pub mod search;
mod tree;

pub use domain::{
    AssessmentCriterion, AssessmentCriterionRow, LearningOutcome, Qualification, QualificationUnit,
};
pub use import::{parse_tree_csv, TreeImportError};
pub use loader::{QualificationError, QualificationTreeLoader, QualificationTreeView};
pub use progress::{progress_percent, ProgressSummary, UnitProgress};
pub use repository::{QualificationRepository, RepositoryError};
pub use router::qualification_router;
pub use search::filter_units;
pub use tree::{total_acs, QualificationTree};
