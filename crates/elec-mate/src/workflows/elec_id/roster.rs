use std::io::Read;

use serde::Deserialize;

use super::domain::Employee;

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse roster: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster row {row} has no employee_id")]
    MissingEmployeeId { row: usize },
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    employee_id: String,
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    email: Option<String>,
}

/// Parses an `employee_id,name,role,email` roster. Later rows win for repeated ids.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<Employee>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut employees: Vec<Employee> = Vec::new();
    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record?;
        if row.employee_id.is_empty() {
            return Err(RosterImportError::MissingEmployeeId { row: index + 1 });
        }
        let employee = Employee {
            id: row.employee_id,
            name: row.name,
            role: row.role,
            email: row.email.filter(|email| !email.is_empty()),
        };
        match employees.iter_mut().find(|existing| existing.id == employee.id) {
            Some(existing) => *existing = employee,
            None => employees.push(employee),
        }
    }
    Ok(employees)
}
