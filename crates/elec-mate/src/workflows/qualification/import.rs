use std::io::Read;

use serde::Deserialize;

use super::domain::AssessmentCriterionRow;
use super::tree::QualificationTree;

#[derive(Debug, thiserror::Error)]
pub enum TreeImportError {
    #[error("failed to read qualification export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid qualification CSV data: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct TreeCsvRow {
    unit_code: String,
    unit_title: String,
    lo_number: String,
    lo_text: String,
    ac_full_ref: String,
    ac_text: String,
}

/// Reads a `unit_code,unit_title,lo_number,lo_text,ac_full_ref,ac_text` export.
pub fn parse_tree_csv<R: Read>(reader: R) -> Result<QualificationTree, TreeImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<TreeCsvRow>() {
        let row = record?;
        rows.push(AssessmentCriterionRow {
            unit_code: row.unit_code,
            unit_title: row.unit_title,
            lo_number: row.lo_number,
            lo_text: row.lo_text,
            ac_full_ref: row.ac_full_ref,
            ac_text: row.ac_text,
        });
    }

    Ok(QualificationTree::from_rows(rows))
}
