// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::services::{AppointmentLifecycle, ClinicRepository};

/// Shared handler state: the repository and the lifecycle driving it.
pub struct ClinicState {
    pub repository: Arc<ClinicRepository>,
    pub lifecycle: AppointmentLifecycle,
}

impl ClinicState {
    pub fn new(repository: Arc<ClinicRepository>) -> Self {
        let lifecycle = AppointmentLifecycle::new(Arc::clone(&repository));
        Self {
            repository,
            lifecycle,
        }
    }
}

pub fn clinic_routes(state: Arc<ClinicState>) -> Router {
    let doctor_routes = Router::new()
        .route("/", post(handlers::register_doctor).get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route(
            "/{doctor_id}/availability",
            post(handlers::add_availability)
                .put(handlers::replace_availability)
                .delete(handlers::remove_availability),
        )
        .route("/{doctor_id}/free-slots", get(handlers::get_free_slots))
        .route("/{doctor_id}/appointments", get(handlers::get_doctor_appointments));

    let patient_routes = Router::new()
        .route("/", post(handlers::register_patient).get(handlers::list_patients))
        .route("/{patient_id}", get(handlers::get_patient))
        .route("/{patient_id}/appointments", get(handlers::get_patient_appointments));

    let appointment_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/schedule", put(handlers::reschedule_appointment))
        .route("/{appointment_id}/accept", post(handlers::accept_appointment))
        .route("/{appointment_id}/decline", post(handlers::decline_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment));

    Router::new()
        .nest("/doctors", doctor_routes)
        .nest("/patients", patient_routes)
        .nest("/appointments", appointment_routes)
        .with_state(state)
}
