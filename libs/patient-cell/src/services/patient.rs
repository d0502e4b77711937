use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::models::{CreatePatientRequest, Patient, PatientError};

/// Patients known to the clinic, keyed by identifier.
#[derive(Debug, Default, Clone)]
pub struct PatientDirectory {
    patients: BTreeMap<String, Patient>,
}

impl PatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<Patient>) -> Result<Self, PatientError> {
        let mut directory = Self::new();
        for patient in records {
            directory.insert(patient)?;
        }
        Ok(directory)
    }

    pub fn validate(request: &CreatePatientRequest) -> Result<(), PatientError> {
        if request.first_name.trim().is_empty() {
            return Err(PatientError::ValidationError("First name is required".to_string()));
        }
        if request.last_name.trim().is_empty() {
            return Err(PatientError::ValidationError("Last name is required".to_string()));
        }
        Ok(())
    }

    /// Register a validated request under an identifier issued by the caller.
    pub fn register(&mut self, id: String, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        Self::validate(&request)?;
        let patient = Patient {
            id,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
        };
        self.insert(patient.clone())?;
        info!("Registered patient {}", patient.id);
        Ok(patient)
    }

    fn insert(&mut self, patient: Patient) -> Result<(), PatientError> {
        if self.patients.contains_key(&patient.id) {
            return Err(PatientError::AlreadyExists(patient.id));
        }
        debug!("Indexing patient {}", patient.id);
        self.patients.insert(patient.id.clone(), patient);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Patient, PatientError> {
        self.patients.get(id).ok_or_else(|| PatientError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.patients.contains_key(id)
    }

    pub fn list(&self) -> Vec<Patient> {
        self.patients.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(first: &str, last: &str) -> CreatePatientRequest {
        CreatePatientRequest {
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut directory = PatientDirectory::new();
        let patient = directory.register("P001".into(), request(" Ada ", "Lovelace")).unwrap();
        assert_eq!(patient.full_name(), "Ada Lovelace");
        assert_eq!(directory.get("P001").unwrap(), &patient);
        assert_matches!(directory.get("P002"), Err(PatientError::NotFound(id)) if id == "P002");
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut directory = PatientDirectory::new();
        assert_matches!(
            directory.register("P001".into(), request("  ", "Lovelace")),
            Err(PatientError::ValidationError(_))
        );
        assert!(directory.is_empty());
    }

    #[test]
    fn duplicate_records_are_rejected_on_load() {
        let patient = Patient {
            id: "P001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        assert_matches!(
            PatientDirectory::from_records(vec![patient.clone(), patient]),
            Err(PatientError::AlreadyExists(_))
        );
    }
}
