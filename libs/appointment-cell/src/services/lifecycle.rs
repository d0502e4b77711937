// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use doctor_cell::models::Interval;
use doctor_cell::services::SlotCalculator;

use crate::models::{
    Appointment, AppointmentError, AppointmentOutcome, AppointmentOwner, AppointmentStatus,
    BookAppointmentRequest, LifecycleOperation,
};
use crate::services::conflict::ConflictDetector;
use crate::services::repository::{ClinicRepository, DoctorLedger};

/// Drives appointments through `pending -> confirmed -> completed` and
/// `pending -> cancelled`, keeping each doctor's availability in step.
///
/// Every guarded operation either applies completely or leaves the
/// appointment and the doctor's availability exactly as they were.
pub struct AppointmentLifecycle {
    repository: Arc<ClinicRepository>,
    conflicts: ConflictDetector,
    slots: SlotCalculator,
}

impl AppointmentLifecycle {
    pub fn new(repository: Arc<ClinicRepository>) -> Self {
        Self {
            repository,
            conflicts: ConflictDetector::new(),
            slots: SlotCalculator::new(),
        }
    }

    pub fn repository(&self) -> &Arc<ClinicRepository> {
        &self.repository
    }

    /// All valid next statuses for a given current status
    pub fn valid_transitions(current_status: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current_status {
            AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => &[AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    pub fn create(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        debug!(
            "Booking appointment for patient {} with doctor {} from {} to {}",
            request.patient_id, request.doctor_id, request.start, request.end
        );

        let requested = Interval::new(request.start, request.end)?;
        self.repository.ensure_patient(&request.patient_id)?;

        let handle = self.repository.ledger(&request.doctor_id)?;
        let mut ledger = handle.lock();
        self.check_bookable(&ledger, &requested, None)?;

        let appointment = Appointment {
            id: self.repository.next_appointment_id(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            scheduled: requested,
            status: AppointmentStatus::Pending,
        };
        ledger.appointments.insert(appointment.clone())?;
        self.repository.index_appointment(&appointment.id, &appointment.doctor_id);
        info!(
            "Appointment {} booked with doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled
        );

        self.repository.persist_ledger(&ledger)?;
        Ok(appointment)
    }

    pub fn reschedule(
        &self,
        appointment_id: &str,
        new_start: NaiveDateTime,
        new_end: NaiveDateTime,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {} to {} - {}", appointment_id, new_start, new_end);

        let requested = Interval::new(new_start, new_end)?;
        let handle = self.repository.ledger_for_appointment(appointment_id)?;
        let mut ledger = handle.lock();

        let current = find(&ledger, appointment_id)?;
        require_status(current, AppointmentStatus::Pending, LifecycleOperation::Reschedule)?;
        self.check_bookable(&ledger, &requested, Some(appointment_id))?;

        let updated = {
            let appointment = find_mut(&mut ledger, appointment_id)?;
            appointment.scheduled = requested;
            appointment.clone()
        };
        info!("Appointment {} rescheduled to {}", appointment_id, requested);

        self.repository.persist_ledger(&ledger)?;
        Ok(updated)
    }

    // ==============================================================================
    // STATUS TRANSITIONS
    // ==============================================================================

    /// Cancel a pending appointment. `confirmed` is the caller's explicit
    /// go-ahead; without it nothing changes.
    pub fn cancel(&self, appointment_id: &str, confirmed: bool) -> Result<Appointment, AppointmentError> {
        if !confirmed {
            warn!("Cancellation of appointment {} not confirmed", appointment_id);
            return Err(AppointmentError::ConfirmationRequired(appointment_id.to_string()));
        }
        self.transition(appointment_id, LifecycleOperation::Cancel, AppointmentStatus::Cancelled, |_| Ok(()))
    }

    /// Doctor-side refusal. The time was never committed, so availability is
    /// left alone.
    pub fn decline(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, LifecycleOperation::Decline, AppointmentStatus::Cancelled, |_| Ok(()))
    }

    /// Confirm a pending appointment and carve its time out of the doctor's
    /// availability.
    pub fn accept(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, LifecycleOperation::Accept, AppointmentStatus::Confirmed, |ledger| {
            let appointment = find(ledger, appointment_id)?;
            let booking = appointment.scheduled;

            let free = self.slots.compute_free_slots(
                ledger.doctor.availability.intervals(),
                &ledger.appointments.pending_by_start(),
                Some(appointment_id),
            );
            if !free.iter().any(|slot| slot.contains(&booking)) {
                warn!("Appointment {} no longer fits a free slot", appointment_id);
                return Err(AppointmentError::SlotNotAvailable(appointment_id.to_string()));
            }

            if !ledger.doctor.availability.commit_booking(&booking) {
                return Err(AppointmentError::SlotNotAvailable(appointment_id.to_string()));
            }
            Ok(())
        })
    }

    /// Close a confirmed appointment once its outcome has been recorded.
    pub fn complete(
        &self,
        appointment_id: &str,
        outcome: Option<&AppointmentOutcome>,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, LifecycleOperation::Complete, AppointmentStatus::Completed, |_| match outcome {
            Some(_) => Ok(()),
            None => Err(AppointmentError::OutcomeRequired(appointment_id.to_string())),
        })
    }

    // ==============================================================================
    // QUERIES
    // ==============================================================================

    pub fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, AppointmentError> {
        let handle = self.repository.ledger_for_appointment(appointment_id)?;
        let ledger = handle.lock();
        let appointment = find(&ledger, appointment_id)?.clone();
        Ok(appointment)
    }

    pub fn free_slots(&self, doctor_id: &str) -> Result<Vec<Interval>, AppointmentError> {
        let handle = self.repository.ledger(doctor_id)?;
        let ledger = handle.lock();
        let pending = ledger.appointments.pending_by_start();
        let slots = self
            .slots
            .compute_free_slots(ledger.doctor.availability.intervals(), &pending, None);
        Ok(slots)
    }

    /// Free slots as they would be if `appointment_id` did not exist.
    pub fn free_slots_excluding(&self, doctor_id: &str, appointment_id: &str) -> Result<Vec<Interval>, AppointmentError> {
        let handle = self.repository.ledger(doctor_id)?;
        let ledger = handle.lock();
        if !ledger.appointments.contains(appointment_id) {
            return Err(AppointmentError::NotFound(appointment_id.to_string()));
        }
        let pending = ledger.appointments.pending_by_start();
        let slots = self.slots.compute_free_slots(
            ledger.doctor.availability.intervals(),
            &pending,
            Some(appointment_id),
        );
        Ok(slots)
    }

    pub fn list_appointments(
        &self,
        owner: &AppointmentOwner,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.repository.list_appointments(owner, status)
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    /// Guards shared by create and reschedule.
    fn check_bookable(
        &self,
        ledger: &DoctorLedger,
        requested: &Interval,
        exclude_id: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let conflicting = self
            .conflicts
            .find_conflicts(&ledger.doctor.id, requested, ledger.appointments.iter(), exclude_id);
        if !conflicting.is_empty() {
            return Err(AppointmentError::ConflictDetected {
                conflicting: conflicting.iter().map(|appointment| appointment.id.clone()).collect(),
            });
        }

        if ledger.doctor.availability.containing(requested).is_none() {
            warn!("Requested {} is outside doctor {}'s availability", requested, ledger.doctor.id);
            return Err(AppointmentError::OutsideAvailability {
                doctor_id: ledger.doctor.id.clone(),
                requested: *requested,
            });
        }
        Ok(())
    }

    /// Move an appointment to `target` under the doctor's lock. `effect` runs
    /// after the status guard and before the status is written; if it fails
    /// nothing is changed.
    fn transition<F>(
        &self,
        appointment_id: &str,
        operation: LifecycleOperation,
        target: AppointmentStatus,
        effect: F,
    ) -> Result<Appointment, AppointmentError>
    where
        F: FnOnce(&mut DoctorLedger) -> Result<(), AppointmentError>,
    {
        debug!("Attempting to {} appointment {}", operation, appointment_id);

        let handle = self.repository.ledger_for_appointment(appointment_id)?;
        let mut ledger = handle.lock();

        let current = find(&ledger, appointment_id)?;
        if !Self::valid_transitions(current.status).contains(&target) {
            warn!(
                "Cannot {} appointment {} in status {}",
                operation, current.id, current.status
            );
            return Err(invalid_transition(current, operation));
        }

        // Staged on a copy; the ledger is only replaced once every step succeeded.
        let mut staged = ledger.clone();
        effect(&mut staged)?;
        find_mut(&mut staged, appointment_id)?.status = target;
        *ledger = staged;

        let updated = find(&ledger, appointment_id)?.clone();
        info!("Appointment {} is now {} ({})", appointment_id, target, operation);

        self.repository.persist_ledger(&ledger)?;
        Ok(updated)
    }
}

fn find<'a>(ledger: &'a DoctorLedger, appointment_id: &str) -> Result<&'a Appointment, AppointmentError> {
    ledger
        .appointments
        .get(appointment_id)
        .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))
}

fn find_mut<'a>(ledger: &'a mut DoctorLedger, appointment_id: &str) -> Result<&'a mut Appointment, AppointmentError> {
    ledger
        .appointments
        .get_mut(appointment_id)
        .ok_or_else(|| AppointmentError::NotFound(appointment_id.to_string()))
}

fn require_status(
    appointment: &Appointment,
    required: AppointmentStatus,
    operation: LifecycleOperation,
) -> Result<(), AppointmentError> {
    if appointment.status != required {
        warn!(
            "Cannot {} appointment {} in status {}",
            operation, appointment.id, appointment.status
        );
        return Err(invalid_transition(appointment, operation));
    }
    Ok(())
}

fn invalid_transition(appointment: &Appointment, operation: LifecycleOperation) -> AppointmentError {
    AppointmentError::InvalidStatusTransition {
        appointment_id: appointment.id.clone(),
        status: appointment.status,
        operation,
    }
}
