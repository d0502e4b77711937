// libs/appointment-cell/src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use doctor_cell::models::{DoctorError, Interval};
use doctor_cell::services::Booking;
use patient_cell::models::PatientError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub scheduled: Interval,
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn start(&self) -> NaiveDateTime {
        self.scheduled.start()
    }

    pub fn end(&self) -> NaiveDateTime {
        self.scheduled.end()
    }
}

impl Booking for Appointment {
    fn booking_id(&self) -> &str {
        &self.id
    }

    fn interval(&self) -> Interval {
        self.scheduled
    }

    // Confirmed time has already been split out of the doctor's availability.
    fn holds_uncommitted_time(&self) -> bool {
        self.status == AppointmentStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Whether an appointment in this status still occupies the doctor's time.
    pub fn blocks_calendar(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle operations that act on an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOperation {
    Reschedule,
    Cancel,
    Decline,
    Accept,
    Complete,
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleOperation::Reschedule => write!(f, "reschedule"),
            LifecycleOperation::Cancel => write!(f, "cancel"),
            LifecycleOperation::Decline => write!(f, "decline"),
            LifecycleOperation::Accept => write!(f, "accept"),
            LifecycleOperation::Complete => write!(f, "complete"),
        }
    }
}

/// Result of the consultation, produced outside the scheduling core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentOutcome {
    pub summary: String,
}

/// Whose appointments a listing is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppointmentOwner {
    Doctor(String),
    Patient(String),
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: String,
    pub doctor_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_start: NaiveDateTime,
    pub new_end: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub outcome: Option<AppointmentOutcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    State,
    Persistence,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Schedule(#[from] DoctorError),

    #[error("Requested time {requested} is outside doctor {doctor_id}'s availability")]
    OutsideAvailability { doctor_id: String, requested: Interval },

    #[error("Appointment conflicts with existing booking(s): {}", conflicting.join(", "))]
    ConflictDetected { conflicting: Vec<String> },

    #[error("No single availability interval can host appointment {0}")]
    SlotNotAvailable(String),

    #[error("Appointment {0} not found")]
    NotFound(String),

    #[error("Doctor {0} not found")]
    DoctorNotFound(String),

    #[error("Patient {0} not found")]
    PatientNotFound(String),

    #[error("Cannot {operation} appointment {appointment_id} while it is {status}")]
    InvalidStatusTransition {
        appointment_id: String,
        status: AppointmentStatus,
        operation: LifecycleOperation,
    },

    #[error("Appointment {0} cannot be completed without an outcome")]
    OutcomeRequired(String),

    #[error("Cancelling appointment {0} requires explicit confirmation")]
    ConfirmationRequired(String),

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl AppointmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::ValidationError(_)
            | AppointmentError::OutsideAvailability { .. }
            | AppointmentError::ConfirmationRequired(_) => ErrorKind::Validation,
            AppointmentError::Schedule(inner) => match inner {
                DoctorError::OverlappingAvailability { .. } => ErrorKind::Conflict,
                DoctorError::AvailabilityNotFound(_) => ErrorKind::NotFound,
                DoctorError::InvalidInterval { .. } | DoctorError::ValidationError(_) => ErrorKind::Validation,
            },
            AppointmentError::ConflictDetected { .. } | AppointmentError::SlotNotAvailable(_) => ErrorKind::Conflict,
            AppointmentError::NotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::PatientNotFound(_) => ErrorKind::NotFound,
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::OutcomeRequired(_) => {
                ErrorKind::State
            }
            AppointmentError::PersistenceError(_) => ErrorKind::Persistence,
        }
    }
}

impl From<PatientError> for AppointmentError {
    fn from(error: PatientError) -> Self {
        match error {
            PatientError::NotFound(id) => AppointmentError::PatientNotFound(id),
            other => AppointmentError::ValidationError(other.to_string()),
        }
    }
}
