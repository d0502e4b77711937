// libs/appointment-cell/tests/lifecycle_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;

use appointment_cell::models::*;
use appointment_cell::services::{AppointmentLifecycle, ClinicRepository};
use doctor_cell::models::{CreateDoctorRequest, DoctorError, Interval, Specialization};
use patient_cell::models::CreatePatientRequest;
use shared_database::MemoryStore;
use shared_models::EntityKind;
use shared_utils::test_utils::{at, TestConfig};

// ==============================================================================
// TEST FIXTURES
// ==============================================================================

struct Clinic {
    store: Arc<MemoryStore>,
    lifecycle: AppointmentLifecycle,
    doctor_id: String,
    patient_id: String,
}

fn iv(start: (u32, u32), end: (u32, u32)) -> Interval {
    Interval::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
}

fn clinic_with_availability(intervals: &[Interval]) -> Clinic {
    let store = Arc::new(MemoryStore::new());
    let repository = Arc::new(ClinicRepository::new(store.clone(), &TestConfig::in_memory()));

    let doctor = repository
        .register_doctor(CreateDoctorRequest {
            first_name: "Gregory".to_string(),
            last_name: "House".to_string(),
            specializations: vec![Specialization("Diagnostics".to_string())],
        })
        .unwrap();
    for interval in intervals {
        repository.add_availability(&doctor.id, *interval).unwrap();
    }
    let patient = repository
        .register_patient(CreatePatientRequest {
            first_name: "Lisa".to_string(),
            last_name: "Cuddy".to_string(),
        })
        .unwrap();

    Clinic {
        store,
        lifecycle: AppointmentLifecycle::new(repository),
        doctor_id: doctor.id,
        patient_id: patient.id,
    }
}

impl Clinic {
    fn book(&self, start: (u32, u32), end: (u32, u32)) -> Result<Appointment, AppointmentError> {
        self.lifecycle.create(BookAppointmentRequest {
            patient_id: self.patient_id.clone(),
            doctor_id: self.doctor_id.clone(),
            start: at(start.0, start.1),
            end: at(end.0, end.1),
        })
    }

    fn availability(&self) -> Vec<Interval> {
        let doctor = self.lifecycle.repository().get_doctor(&self.doctor_id).unwrap();
        doctor.availability.intervals().to_vec()
    }

    fn status_of(&self, appointment_id: &str) -> AppointmentStatus {
        self.lifecycle.get_appointment(appointment_id).unwrap().status
    }
}

fn outcome() -> AppointmentOutcome {
    AppointmentOutcome {
        summary: "Follow-up in two weeks".to_string(),
    }
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[test]
fn overlapping_booking_is_rejected_and_adjacent_one_accepted() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);

    let first = clinic.book((9, 0), (10, 0)).unwrap();
    assert_eq!(first.id, "A001");
    assert_eq!(first.status, AppointmentStatus::Pending);

    let overlapping = clinic.book((9, 30), (10, 30));
    assert_matches!(
        overlapping,
        Err(AppointmentError::ConflictDetected { ref conflicting }) if conflicting == &vec!["A001".to_string()]
    );
    assert_eq!(overlapping.unwrap_err().kind(), ErrorKind::Conflict);

    let adjacent = clinic.book((10, 0), (11, 0)).unwrap();
    assert_eq!(adjacent.id, "A002");
}

#[test]
fn booking_outside_availability_is_a_validation_error() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);

    let result = clinic.book((11, 30), (12, 30));
    assert_matches!(result, Err(AppointmentError::OutsideAvailability { .. }));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn inverted_range_is_a_validation_error() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);

    let result = clinic.book((10, 0), (9, 0));
    assert_matches!(
        result,
        Err(AppointmentError::Schedule(DoctorError::InvalidInterval { .. }))
    );
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Validation);

    assert_matches!(
        clinic.book((10, 0), (10, 0)),
        Err(AppointmentError::Schedule(DoctorError::InvalidInterval { .. }))
    );
}

#[test]
fn unknown_doctor_and_patient_are_not_found() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);

    let unknown_doctor = clinic.lifecycle.create(BookAppointmentRequest {
        patient_id: clinic.patient_id.clone(),
        doctor_id: "D999".to_string(),
        start: at(9, 0),
        end: at(10, 0),
    });
    assert_matches!(unknown_doctor, Err(AppointmentError::DoctorNotFound(ref id)) if id == "D999");

    let unknown_patient = clinic.lifecycle.create(BookAppointmentRequest {
        patient_id: "P999".to_string(),
        doctor_id: clinic.doctor_id.clone(),
        start: at(9, 0),
        end: at(10, 0),
    });
    assert_matches!(unknown_patient, Err(AppointmentError::PatientNotFound(ref id)) if id == "P999");
    assert_eq!(unknown_patient.unwrap_err().kind(), ErrorKind::NotFound);

    assert_matches!(
        clinic.lifecycle.get_appointment("A404"),
        Err(AppointmentError::NotFound(_))
    );
}

// ==============================================================================
// ACCEPT
// ==============================================================================

#[test]
fn accept_carves_booking_out_of_availability() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let first = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.book((10, 0), (11, 0)).unwrap();

    let accepted = clinic.lifecycle.accept(&first.id).unwrap();
    assert_eq!(accepted.status, AppointmentStatus::Confirmed);
    assert_eq!(clinic.availability(), vec![iv((10, 0), (12, 0))]);

    let slots = clinic.lifecycle.free_slots(&clinic.doctor_id).unwrap();
    assert_eq!(slots, vec![iv((11, 0), (12, 0))]);
    assert!(slots.iter().all(|slot| !slot.overlaps(&iv((9, 0), (10, 0)))));

    // Confirmed time still blocks new bookings.
    assert_matches!(
        clinic.book((9, 0), (9, 30)),
        Err(AppointmentError::ConflictDetected { .. })
    );
}

#[test]
fn accept_in_middle_of_interval_leaves_both_remainders() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((10, 0), (10, 30)).unwrap();

    clinic.lifecycle.accept(&appointment.id).unwrap();
    assert_eq!(
        clinic.availability(),
        vec![iv((9, 0), (10, 0)), iv((10, 30), (12, 0))]
    );
}

#[test]
fn accept_spanning_fragmented_availability_changes_nothing() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((10, 0), (11, 0)).unwrap();

    let fragmented = vec![iv((9, 0), (10, 30)), iv((10, 30), (12, 0))];
    clinic
        .lifecycle
        .repository()
        .replace_availability(&clinic.doctor_id, fragmented.clone())
        .unwrap();

    let result = clinic.lifecycle.accept(&appointment.id);
    assert_matches!(result, Err(AppointmentError::SlotNotAvailable(ref id)) if id == &appointment.id);
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
    assert_eq!(clinic.status_of(&appointment.id), AppointmentStatus::Pending);
    assert_eq!(clinic.availability(), fragmented);
}

#[test]
fn accept_twice_is_a_state_error() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.lifecycle.accept(&appointment.id).unwrap();

    let result = clinic.lifecycle.accept(&appointment.id);
    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            status: AppointmentStatus::Confirmed,
            operation: LifecycleOperation::Accept,
            ..
        })
    );
    assert_eq!(result.unwrap_err().kind(), ErrorKind::State);
    assert_eq!(clinic.availability(), vec![iv((10, 0), (12, 0))]);
}

// ==============================================================================
// CANCEL AND DECLINE
// ==============================================================================

#[test]
fn cancelling_pending_booking_frees_its_range() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    let cancelled = clinic.lifecycle.cancel(&appointment.id, true).unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(clinic.availability(), vec![iv((9, 0), (12, 0))]);

    let rebooked = clinic.book((9, 0), (10, 0)).unwrap();
    assert_eq!(rebooked.status, AppointmentStatus::Pending);
    assert_ne!(rebooked.id, appointment.id);
}

#[test]
fn cancel_without_confirmation_changes_nothing() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    let result = clinic.lifecycle.cancel(&appointment.id, false);
    assert_matches!(result, Err(AppointmentError::ConfirmationRequired(_)));
    assert_eq!(clinic.status_of(&appointment.id), AppointmentStatus::Pending);
}

#[test]
fn cancel_after_accept_is_a_state_error() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.lifecycle.accept(&appointment.id).unwrap();

    assert_matches!(
        clinic.lifecycle.cancel(&appointment.id, true),
        Err(AppointmentError::InvalidStatusTransition { operation: LifecycleOperation::Cancel, .. })
    );
    assert_eq!(clinic.status_of(&appointment.id), AppointmentStatus::Confirmed);
}

#[test]
fn decline_leaves_availability_untouched() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    let declined = clinic.lifecycle.decline(&appointment.id).unwrap();
    assert_eq!(declined.status, AppointmentStatus::Cancelled);
    assert_eq!(clinic.availability(), vec![iv((9, 0), (12, 0))]);

    assert_matches!(
        clinic.lifecycle.decline(&appointment.id),
        Err(AppointmentError::InvalidStatusTransition { status: AppointmentStatus::Cancelled, .. })
    );
}

// ==============================================================================
// RESCHEDULE
// ==============================================================================

#[test]
fn reschedule_ignores_its_own_booking() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    let moved = clinic
        .lifecycle
        .reschedule(&appointment.id, at(9, 30), at(10, 30))
        .unwrap();
    assert_eq!(moved.scheduled, iv((9, 30), (10, 30)));
    assert_eq!(moved.status, AppointmentStatus::Pending);
    assert_eq!(moved.id, appointment.id);
}

#[test]
fn reschedule_into_other_booking_conflicts() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let first = clinic.book((9, 0), (10, 0)).unwrap();
    let second = clinic.book((10, 0), (11, 0)).unwrap();

    assert_matches!(
        clinic.lifecycle.reschedule(&second.id, at(9, 30), at(10, 30)),
        Err(AppointmentError::ConflictDetected { ref conflicting }) if conflicting == &vec![first.id.clone()]
    );
    assert_eq!(
        clinic.lifecycle.get_appointment(&second.id).unwrap().scheduled,
        iv((10, 0), (11, 0))
    );
}

#[test]
fn reschedule_requires_pending_and_availability() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    assert_matches!(
        clinic.lifecycle.reschedule(&appointment.id, at(13, 0), at(14, 0)),
        Err(AppointmentError::OutsideAvailability { .. })
    );

    clinic.lifecycle.accept(&appointment.id).unwrap();
    assert_matches!(
        clinic.lifecycle.reschedule(&appointment.id, at(11, 0), at(12, 0)),
        Err(AppointmentError::InvalidStatusTransition { operation: LifecycleOperation::Reschedule, .. })
    );
}

// ==============================================================================
// COMPLETE
// ==============================================================================

#[test]
fn complete_requires_confirmation_and_outcome() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();

    assert_matches!(
        clinic.lifecycle.complete(&appointment.id, Some(&outcome())),
        Err(AppointmentError::InvalidStatusTransition { status: AppointmentStatus::Pending, .. })
    );

    clinic.lifecycle.accept(&appointment.id).unwrap();
    let missing = clinic.lifecycle.complete(&appointment.id, None);
    assert_matches!(missing, Err(AppointmentError::OutcomeRequired(_)));
    assert_eq!(missing.unwrap_err().kind(), ErrorKind::State);
    assert_eq!(clinic.status_of(&appointment.id), AppointmentStatus::Confirmed);

    let completed = clinic.lifecycle.complete(&appointment.id, Some(&outcome())).unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert!(completed.status.is_terminal());
    assert!(AppointmentLifecycle::valid_transitions(completed.status).is_empty());
}

// ==============================================================================
// QUERIES
// ==============================================================================

#[test]
fn free_slots_excluding_ignores_named_booking() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let first = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.book((11, 0), (12, 0)).unwrap();

    assert_eq!(
        clinic.lifecycle.free_slots(&clinic.doctor_id).unwrap(),
        vec![iv((10, 0), (11, 0))]
    );
    assert_eq!(
        clinic.lifecycle.free_slots_excluding(&clinic.doctor_id, &first.id).unwrap(),
        vec![iv((9, 0), (11, 0))]
    );
    assert_matches!(
        clinic.lifecycle.free_slots_excluding(&clinic.doctor_id, "A404"),
        Err(AppointmentError::NotFound(_))
    );
}

#[test]
fn listings_filter_by_owner_and_status() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let late = clinic.book((11, 0), (12, 0)).unwrap();
    let early = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.lifecycle.accept(&late.id).unwrap();

    let all = clinic
        .lifecycle
        .list_appointments(&AppointmentOwner::Doctor(clinic.doctor_id.clone()), None)
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|appointment| appointment.id.as_str()).collect();
    assert_eq!(ids, vec![early.id.as_str(), late.id.as_str()]);

    let pending = clinic
        .lifecycle
        .list_appointments(
            &AppointmentOwner::Patient(clinic.patient_id.clone()),
            Some(AppointmentStatus::Pending),
        )
        .unwrap();
    assert_eq!(pending, vec![early]);

    assert_matches!(
        clinic
            .lifecycle
            .list_appointments(&AppointmentOwner::Patient("P404".to_string()), None),
        Err(AppointmentError::PatientNotFound(_))
    );
}

// ==============================================================================
// PERSISTENCE
// ==============================================================================

#[test]
fn successful_mutations_write_full_collections() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();
    clinic.lifecycle.accept(&appointment.id).unwrap();

    let appointments = clinic.store.snapshot(EntityKind::Appointment);
    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0]["id"], "A001");
    assert_eq!(appointments[0]["status"], "confirmed");

    let doctors = clinic.store.snapshot(EntityKind::Doctor);
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0]["availability"].as_array().map(Vec::len), Some(1));
    assert_eq!(clinic.store.snapshot(EntityKind::Patient).len(), 1);
}

#[test]
fn failed_write_is_reported_without_rollback() {
    let clinic = clinic_with_availability(&[iv((9, 0), (12, 0))]);
    let appointment = clinic.book((9, 0), (10, 0)).unwrap();
    let writes_before = clinic.store.write_count();

    clinic.store.set_fail_writes(true);
    let result = clinic.lifecycle.accept(&appointment.id);
    assert_matches!(result, Err(AppointmentError::PersistenceError(_)));
    assert_eq!(result.unwrap_err().kind(), ErrorKind::Persistence);

    assert_eq!(clinic.status_of(&appointment.id), AppointmentStatus::Confirmed);
    assert_eq!(clinic.availability(), vec![iv((10, 0), (12, 0))]);
    assert_eq!(clinic.store.write_count(), writes_before);
    assert_eq!(clinic.store.snapshot(EntityKind::Appointment)[0]["status"], "pending");

    clinic.store.set_fail_writes(false);
    clinic.book((10, 0), (11, 0)).unwrap();
    assert_eq!(clinic.store.snapshot(EntityKind::Appointment)[0]["status"], "confirmed");
}
