use tracing::{debug, warn};

use doctor_cell::models::Interval;

use crate::models::Appointment;

/// Pure overlap check against a doctor's non-cancelled appointments.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Appointments of `doctor_id` that collide with `requested`.
    pub fn find_conflicts<'a, I>(
        &self,
        doctor_id: &str,
        requested: &Interval,
        appointments: I,
        exclude_id: Option<&str>,
    ) -> Vec<&'a Appointment>
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        debug!("Checking conflicts for doctor {} over {}", doctor_id, requested);

        let conflicting: Vec<&Appointment> = appointments
            .into_iter()
            .filter(|appointment| appointment.doctor_id == doctor_id)
            .filter(|appointment| appointment.status.blocks_calendar())
            .filter(|appointment| exclude_id != Some(appointment.id.as_str()))
            .filter(|appointment| appointment.scheduled.overlaps(requested))
            .collect();

        if !conflicting.is_empty() {
            warn!(
                "Conflict detected for doctor {} - {} conflicting appointments",
                doctor_id,
                conflicting.len()
            );
        }
        conflicting
    }

    pub fn has_conflict<'a, I>(
        &self,
        doctor_id: &str,
        requested: &Interval,
        appointments: I,
        exclude_id: Option<&str>,
    ) -> bool
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        !self.find_conflicts(doctor_id, requested, appointments, exclude_id).is_empty()
    }
}
