use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// One doctor's appointments keyed by identifier. Records are never removed.
#[derive(Debug, Default, Clone)]
pub struct AppointmentRegistry {
    appointments: BTreeMap<String, Appointment>,
}

impl AppointmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, appointment: Appointment) -> Result<(), AppointmentError> {
        if self.appointments.contains_key(&appointment.id) {
            return Err(AppointmentError::ValidationError(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }
        debug!("Registering appointment {} ({})", appointment.id, appointment.status);
        self.appointments.insert(appointment.id.clone(), appointment);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Appointment> {
        self.appointments.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.appointments.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    /// All records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    /// Pending appointments ordered by start, ties broken by identifier.
    pub fn pending_by_start(&self) -> Vec<&Appointment> {
        let mut pending: Vec<&Appointment> = self
            .iter()
            .filter(|appointment| appointment.status == AppointmentStatus::Pending)
            .collect();
        pending.sort_by(|a, b| a.start().cmp(&b.start()).then_with(|| a.id.cmp(&b.id)));
        pending
    }

    pub fn filtered(&self, status: Option<AppointmentStatus>) -> Vec<Appointment> {
        self.iter()
            .filter(|appointment| status.map_or(true, |wanted| appointment.status == wanted))
            .cloned()
            .collect()
    }
}
