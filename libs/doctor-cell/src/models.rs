use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::schedule::ScheduleStore;

// ==============================================================================
// TIME RANGES
// ==============================================================================

/// Half-open time range `[start, end)`. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "IntervalBounds")]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

/// Unvalidated wire shape of an [`Interval`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntervalBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, DoctorError> {
        if start >= end {
            return Err(DoctorError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Caller guarantees `start < end`.
    pub(crate) fn from_ordered(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start < end, "inverted interval {} .. {}", start, end);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Shared endpoints do not count: `[9,10)` and `[10,11)` are disjoint.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl TryFrom<IntervalBounds> for Interval {
    type Error = DoctorError;

    fn try_from(bounds: IntervalBounds) -> Result<Self, Self::Error> {
        Interval::new(bounds.start, bounds.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

/// Specialization label; the scheduling core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Specialization(pub String);

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
    #[serde(default)]
    pub availability: ScheduleStore,
}

impl Doctor {
    pub fn new(id: String, first_name: String, last_name: String, specializations: Vec<Specialization>) -> Self {
        Self {
            id,
            first_name,
            last_name,
            specializations,
            availability: ScheduleStore::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveAvailabilityRequest {
    pub interval: Interval,
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeSlotsResponse {
    pub doctor_id: String,
    pub excluding: Option<String>,
    pub slots: Vec<Interval>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DoctorError {
    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidInterval { start: NaiveDateTime, end: NaiveDateTime },

    #[error("Availability {requested} overlaps existing availability {existing}")]
    OverlappingAvailability { requested: Interval, existing: Interval },

    #[error("Availability {0} not found")]
    AvailabilityNotFound(Interval),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
