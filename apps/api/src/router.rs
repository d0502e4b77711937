use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{clinic_routes, ClinicState};

pub fn create_router(state: Arc<ClinicState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .merge(clinic_routes(state))
}
