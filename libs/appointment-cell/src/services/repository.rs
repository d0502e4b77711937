use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use doctor_cell::models::{CreateDoctorRequest, Doctor, Interval};
use patient_cell::models::{CreatePatientRequest, Patient};
use patient_cell::services::PatientDirectory;
use shared_config::AppConfig;
use shared_database::{EntityStore, EntityStoreExt};
use shared_models::EntityKind;
use shared_utils::IdSequence;

use crate::models::{Appointment, AppointmentError, AppointmentOwner, AppointmentStatus};
use crate::services::registry::AppointmentRegistry;

/// Everything that must change together for one doctor.
#[derive(Debug, Clone)]
pub struct DoctorLedger {
    pub doctor: Doctor,
    pub appointments: AppointmentRegistry,
}

impl DoctorLedger {
    fn new(doctor: Doctor) -> Self {
        Self {
            doctor,
            appointments: AppointmentRegistry::new(),
        }
    }
}

/// Last persisted state of every ledger; whole collections are written from it.
#[derive(Default)]
struct PersistedCollections {
    doctors: BTreeMap<String, Doctor>,
    appointments: BTreeMap<String, Vec<Appointment>>,
}

/// Clinic records shared by the scheduling services.
///
/// Lock order: roster or index lookups are released before a ledger is
/// locked, and a ledger may be held while the persisted-collections lock is
/// taken, never the other way round.
pub struct ClinicRepository {
    store: Arc<dyn EntityStore>,
    doctors: RwLock<BTreeMap<String, Arc<Mutex<DoctorLedger>>>>,
    patients: RwLock<PatientDirectory>,
    appointment_index: RwLock<HashMap<String, String>>,
    persisted: Mutex<PersistedCollections>,
    doctor_ids: IdSequence,
    patient_ids: IdSequence,
    appointment_ids: IdSequence,
}

impl std::fmt::Debug for ClinicRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClinicRepository").finish_non_exhaustive()
    }
}

impl ClinicRepository {
    pub fn new(store: Arc<dyn EntityStore>, config: &AppConfig) -> Self {
        Self {
            store,
            doctors: RwLock::new(BTreeMap::new()),
            patients: RwLock::new(PatientDirectory::new()),
            appointment_index: RwLock::new(HashMap::new()),
            persisted: Mutex::new(PersistedCollections::default()),
            doctor_ids: IdSequence::new(EntityKind::Doctor, config.id_width),
            patient_ids: IdSequence::new(EntityKind::Patient, config.id_width),
            appointment_ids: IdSequence::new(EntityKind::Appointment, config.id_width),
        }
    }

    /// Rebuild the repository from every collection in the store.
    pub fn load(store: Arc<dyn EntityStore>, config: &AppConfig) -> Result<Self, AppointmentError> {
        let doctors: Vec<Doctor> = store.load_all(EntityKind::Doctor).map_err(persistence)?;
        let patients: Vec<Patient> = store.load_all(EntityKind::Patient).map_err(persistence)?;
        let appointments: Vec<Appointment> = store.load_all(EntityKind::Appointment).map_err(persistence)?;

        let repository = Self::new(store, config);

        for patient in &patients {
            repository.patient_ids.observe(&patient.id);
        }
        *repository.patients.write() = PatientDirectory::from_records(patients)?;

        let mut ledgers: BTreeMap<String, DoctorLedger> = BTreeMap::new();
        for doctor in doctors {
            repository.doctor_ids.observe(&doctor.id);
            if ledgers.contains_key(&doctor.id) {
                return Err(AppointmentError::PersistenceError(format!("Duplicate doctor record {}", doctor.id)));
            }
            ledgers.insert(doctor.id.clone(), DoctorLedger::new(doctor));
        }

        let mut index = HashMap::new();
        for appointment in appointments {
            repository.appointment_ids.observe(&appointment.id);
            let ledger = ledgers.get_mut(&appointment.doctor_id).ok_or_else(|| {
                AppointmentError::PersistenceError(format!(
                    "Appointment {} references unknown doctor {}",
                    appointment.id, appointment.doctor_id
                ))
            })?;
            if index.insert(appointment.id.clone(), appointment.doctor_id.clone()).is_some() {
                return Err(AppointmentError::PersistenceError(format!(
                    "Duplicate appointment record {}",
                    appointment.id
                )));
            }
            ledger.appointments.insert(appointment)?;
        }

        {
            let mut persisted = repository.persisted.lock();
            for (id, ledger) in &ledgers {
                persisted.doctors.insert(id.clone(), ledger.doctor.clone());
                persisted
                    .appointments
                    .insert(id.clone(), ledger.appointments.iter().cloned().collect());
            }
        }

        info!(
            "Loaded {} doctors, {} patients and {} appointments",
            ledgers.len(),
            repository.patients.read().len(),
            index.len()
        );

        *repository.appointment_index.write() = index;
        *repository.doctors.write() = ledgers
            .into_iter()
            .map(|(id, ledger)| (id, Arc::new(Mutex::new(ledger))))
            .collect();

        Ok(repository)
    }

    // ==============================================================================
    // DOCTORS
    // ==============================================================================

    pub fn register_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, AppointmentError> {
        if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
            return Err(AppointmentError::ValidationError("Doctor first and last name are required".to_string()));
        }

        let doctor = Doctor::new(
            self.doctor_ids.next_id(),
            request.first_name.trim().to_string(),
            request.last_name.trim().to_string(),
            request.specializations,
        );
        let handle = Arc::new(Mutex::new(DoctorLedger::new(doctor.clone())));
        let ledger = handle.lock();

        self.doctors.write().insert(doctor.id.clone(), Arc::clone(&handle));
        info!("Registered doctor {} ({})", doctor.id, doctor.full_name());

        self.persist_ledger(&ledger)?;
        Ok(doctor)
    }

    pub fn get_doctor(&self, doctor_id: &str) -> Result<Doctor, AppointmentError> {
        let handle = self.ledger(doctor_id)?;
        let ledger = handle.lock();
        Ok(ledger.doctor.clone())
    }

    pub fn list_doctors(&self) -> Vec<Doctor> {
        self.ledgers()
            .into_iter()
            .map(|handle| {
                let ledger = handle.lock();
                ledger.doctor.clone()
            })
            .collect()
    }

    pub fn add_availability(&self, doctor_id: &str, interval: Interval) -> Result<Doctor, AppointmentError> {
        debug!("Adding availability {} for doctor {}", interval, doctor_id);
        let handle = self.ledger(doctor_id)?;
        let mut ledger = handle.lock();
        reject_committed_overlap(&ledger, &[interval])?;
        ledger.doctor.availability.add(interval)?;
        self.persist_ledger(&ledger)?;
        Ok(ledger.doctor.clone())
    }

    pub fn remove_availability(
        &self,
        doctor_id: &str,
        interval: &Interval,
        confirmed: bool,
    ) -> Result<Doctor, AppointmentError> {
        if !confirmed {
            return Err(AppointmentError::ValidationError(format!(
                "Removing availability {} requires explicit confirmation",
                interval
            )));
        }
        let handle = self.ledger(doctor_id)?;
        let mut ledger = handle.lock();
        ledger.doctor.availability.remove(interval)?;
        info!("Removed availability {} for doctor {}", interval, doctor_id);
        self.persist_ledger(&ledger)?;
        Ok(ledger.doctor.clone())
    }

    pub fn replace_availability(&self, doctor_id: &str, intervals: Vec<Interval>) -> Result<Doctor, AppointmentError> {
        let handle = self.ledger(doctor_id)?;
        let mut ledger = handle.lock();
        reject_committed_overlap(&ledger, &intervals)?;
        ledger.doctor.availability.replace(intervals)?;
        info!(
            "Replaced availability for doctor {} ({} intervals)",
            doctor_id,
            ledger.doctor.availability.len()
        );
        self.persist_ledger(&ledger)?;
        Ok(ledger.doctor.clone())
    }

    // ==============================================================================
    // PATIENTS
    // ==============================================================================

    pub fn register_patient(&self, request: CreatePatientRequest) -> Result<Patient, AppointmentError> {
        PatientDirectory::validate(&request)?;
        let mut directory = self.patients.write();
        let patient = directory.register(self.patient_ids.next_id(), request)?;
        self.store
            .save_all(EntityKind::Patient, &directory.list())
            .map_err(persistence)?;
        Ok(patient)
    }

    pub fn get_patient(&self, patient_id: &str) -> Result<Patient, AppointmentError> {
        Ok(self.patients.read().get(patient_id)?.clone())
    }

    pub fn list_patients(&self) -> Vec<Patient> {
        self.patients.read().list()
    }

    pub fn ensure_patient(&self, patient_id: &str) -> Result<(), AppointmentError> {
        if self.patients.read().contains(patient_id) {
            Ok(())
        } else {
            Err(AppointmentError::PatientNotFound(patient_id.to_string()))
        }
    }

    // ==============================================================================
    // APPOINTMENTS
    // ==============================================================================

    pub fn next_appointment_id(&self) -> String {
        self.appointment_ids.next_id()
    }

    pub(crate) fn index_appointment(&self, appointment_id: &str, doctor_id: &str) {
        self.appointment_index
            .write()
            .insert(appointment_id.to_string(), doctor_id.to_string());
    }

    pub fn list_appointments(
        &self,
        owner: &AppointmentOwner,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut appointments = match owner {
            AppointmentOwner::Doctor(doctor_id) => {
                let handle = self.ledger(doctor_id)?;
                let ledger = handle.lock();
                ledger.appointments.filtered(status)
            }
            AppointmentOwner::Patient(patient_id) => {
                self.ensure_patient(patient_id)?;
                self.ledgers()
                    .into_iter()
                    .flat_map(|handle| {
                        let ledger = handle.lock();
                        let matching: Vec<Appointment> = ledger
                            .appointments
                            .filtered(status)
                            .into_iter()
                            .filter(|appointment| &appointment.patient_id == patient_id)
                            .collect();
                        matching
                    })
                    .collect()
            }
        };
        appointments.sort_by(|a, b| a.start().cmp(&b.start()).then_with(|| a.id.cmp(&b.id)));
        Ok(appointments)
    }

    // ==============================================================================
    // LEDGER ACCESS
    // ==============================================================================

    pub(crate) fn ledger(&self, doctor_id: &str) -> Result<Arc<Mutex<DoctorLedger>>, AppointmentError> {
        self.doctors
            .read()
            .get(doctor_id)
            .cloned()
            .ok_or_else(|| AppointmentError::DoctorNotFound(doctor_id.to_string()))
    }

    pub(crate) fn ledger_for_appointment(
        &self,
        appointment_id: &str,
    ) -> Result<Arc<Mutex<DoctorLedger>>, AppointmentError> {
        let doctor_id = self
            .appointment_index
            .read()
            .get(appointment_id)
            .cloned()
            .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))?;
        self.ledger(&doctor_id)
    }

    fn ledgers(&self) -> Vec<Arc<Mutex<DoctorLedger>>> {
        self.doctors.read().values().cloned().collect()
    }

    /// Record `ledger` as current and write the doctor and appointment
    /// collections in full. Call with the ledger still locked.
    ///
    /// A failed write is reported but the in-memory change stays applied.
    pub(crate) fn persist_ledger(&self, ledger: &DoctorLedger) -> Result<(), AppointmentError> {
        let doctor_id = ledger.doctor.id.clone();
        let mut persisted = self.persisted.lock();
        persisted.doctors.insert(doctor_id.clone(), ledger.doctor.clone());
        persisted
            .appointments
            .insert(doctor_id.clone(), ledger.appointments.iter().cloned().collect());

        let doctors: Vec<&Doctor> = persisted.doctors.values().collect();
        let mut appointments: Vec<&Appointment> = persisted.appointments.values().flatten().collect();
        appointments.sort_by(|a, b| a.id.cmp(&b.id));

        // Doctors go first: a partial write never leaves committed time in availability.
        let result = self
            .store
            .save_all(EntityKind::Doctor, &doctors)
            .and_then(|_| self.store.save_all(EntityKind::Appointment, &appointments));

        match result {
            Ok(()) => {
                debug!("Persisted ledger for doctor {}", doctor_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to persist ledger for doctor {}: {}", doctor_id, e);
                warn!("In-memory state for doctor {} is ahead of the store", doctor_id);
                Err(persistence(e))
            }
        }
    }
}

/// Time already carved out by an accepted appointment may not return to
/// availability.
fn reject_committed_overlap(ledger: &DoctorLedger, intervals: &[Interval]) -> Result<(), AppointmentError> {
    let conflicting: Vec<String> = ledger
        .appointments
        .iter()
        .filter(|appointment| {
            matches!(appointment.status, AppointmentStatus::Confirmed | AppointmentStatus::Completed)
        })
        .filter(|appointment| intervals.iter().any(|interval| interval.overlaps(&appointment.scheduled)))
        .map(|appointment| appointment.id.clone())
        .collect();

    if conflicting.is_empty() {
        return Ok(());
    }
    warn!(
        "Availability for doctor {} would overlap committed appointments {}",
        ledger.doctor.id,
        conflicting.join(", ")
    );
    Err(AppointmentError::ConflictDetected { conflicting })
}

fn persistence(error: anyhow::Error) -> AppointmentError {
    AppointmentError::PersistenceError(error.to_string())
}
