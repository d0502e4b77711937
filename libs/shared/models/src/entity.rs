use serde::{Deserialize, Serialize};
use std::fmt;

/// Record collections the clinic persists, one document per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Doctor,
    Patient,
    Appointment,
}

impl EntityKind {
    /// Single-letter prefix used in generated identifiers, e.g. `A007`.
    pub fn id_prefix(&self) -> char {
        match self {
            EntityKind::Doctor => 'D',
            EntityKind::Patient => 'P',
            EntityKind::Appointment => 'A',
        }
    }

    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityKind::Doctor => "doctors",
            EntityKind::Patient => "patients",
            EntityKind::Appointment => "appointments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Doctor => write!(f, "doctor"),
            EntityKind::Patient => write!(f, "patient"),
            EntityKind::Appointment => write!(f, "appointment"),
        }
    }
}
