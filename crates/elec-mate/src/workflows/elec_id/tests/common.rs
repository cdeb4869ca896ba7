use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::elec_id::{
    ElecIdProfile, ElecIdRepository, ElecIdService, Employee, RepositoryError, StatusThresholds,
};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub(super) fn employee(id: &str, name: &str) -> Employee {
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        role: "Electrician".to_string(),
        email: None,
    }
}

pub(super) fn roster() -> Vec<Employee> {
    vec![
        employee("emp-1", "James Wilson"),
        employee("emp-2", "Sarah Mitchell"),
        employee("emp-3", "Tom Davies"),
    ]
}

#[derive(Clone, Default)]
pub(super) struct MemoryRepository {
    employees: Arc<Mutex<BTreeMap<String, Employee>>>,
    profiles: Arc<Mutex<BTreeMap<String, ElecIdProfile>>>,
    failing_inserts: Arc<Mutex<HashSet<String>>>,
    fail_updates: Arc<Mutex<bool>>,
}

impl MemoryRepository {
    pub(super) fn with_employees(employees: Vec<Employee>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository
                .employees
                .lock()
                .expect("employee mutex poisoned");
            for employee in employees {
                guard.insert(employee.id.clone(), employee);
            }
        }
        repository
    }

    pub(super) fn fail_insert_for(&self, employee_id: &str) {
        self.failing_inserts
            .lock()
            .expect("failure mutex poisoned")
            .insert(employee_id.to_string());
    }

    pub(super) fn recover(&self, employee_id: &str) {
        self.failing_inserts
            .lock()
            .expect("failure mutex poisoned")
            .remove(employee_id);
    }

    pub(super) fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().expect("failure mutex poisoned") = fail;
    }

    pub(super) fn stored(&self, employee_id: &str) -> Option<ElecIdProfile> {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .get(employee_id)
            .cloned()
    }
}

impl ElecIdRepository for MemoryRepository {
    fn employees(&self) -> Result<Vec<Employee>, RepositoryError> {
        let guard = self.employees.lock().expect("employee mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn employee(&self, employee_id: &str) -> Result<Option<Employee>, RepositoryError> {
        let guard = self.employees.lock().expect("employee mutex poisoned");
        Ok(guard.get(employee_id).cloned())
    }

    fn upsert_employee(&self, employee: Employee) -> Result<(), RepositoryError> {
        let mut guard = self.employees.lock().expect("employee mutex poisoned");
        guard.insert(employee.id.clone(), employee);
        Ok(())
    }

    fn profiles(&self) -> Result<Vec<ElecIdProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn profile_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Option<ElecIdProfile>, RepositoryError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(employee_id).cloned())
    }

    fn insert_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, RepositoryError> {
        if self
            .failing_inserts
            .lock()
            .expect("failure mutex poisoned")
            .contains(&profile.employee_id)
        {
            return Err(RepositoryError::Unavailable("insert timed out".to_string()));
        }
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        let number_taken = guard
            .values()
            .any(|existing| existing.elec_id_number == profile.elec_id_number);
        if guard.contains_key(&profile.employee_id) || number_taken {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(profile.employee_id.clone(), profile.clone());
        Ok(profile)
    }

    fn update_profile(&self, profile: ElecIdProfile) -> Result<ElecIdProfile, RepositoryError> {
        if *self.fail_updates.lock().expect("failure mutex poisoned") {
            return Err(RepositoryError::Unavailable("update rejected".to_string()));
        }
        let mut guard = self.profiles.lock().expect("profile mutex poisoned");
        match guard.get_mut(&profile.employee_id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(profile)
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

pub(super) fn build_service() -> (Arc<ElecIdService<MemoryRepository>>, MemoryRepository) {
    let repository = MemoryRepository::with_employees(roster());
    let service = ElecIdService::new(Arc::new(repository.clone()), StatusThresholds::default());
    (Arc::new(service), repository)
}
