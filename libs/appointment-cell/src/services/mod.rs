pub mod conflict;
pub mod lifecycle;
pub mod registry;
pub mod repository;

pub use conflict::ConflictDetector;
pub use lifecycle::AppointmentLifecycle;
pub use registry::AppointmentRegistry;
pub use repository::{ClinicRepository, DoctorLedger};
