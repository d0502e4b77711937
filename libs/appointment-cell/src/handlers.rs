// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use doctor_cell::models::{
    CreateDoctorRequest, FreeSlotsResponse, Interval, RemoveAvailabilityRequest, ReplaceAvailabilityRequest,
};
use patient_cell::models::CreatePatientRequest;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentOwner, AppointmentSearchQuery, BookAppointmentRequest,
    CancelAppointmentRequest, CompleteAppointmentRequest, ErrorKind, RescheduleAppointmentRequest,
};
use crate::router::ClinicState;

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        let message = error.to_string();
        match error.kind() {
            ErrorKind::Validation => AppError::ValidationError(message),
            ErrorKind::Conflict | ErrorKind::State => AppError::Conflict(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::Persistence => AppError::Database(message),
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct FreeSlotsQuery {
    pub exclude: Option<String>,
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<ClinicState>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = state.repository.register_doctor(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "doctor": doctor }))))
}

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<ClinicState>>) -> Result<Json<Value>, AppError> {
    let doctors = state.repository.list_doctors();
    Ok(Json(json!({ "doctors": doctors, "total": doctors.len() })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.repository.get_doctor(&doctor_id)?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn add_availability(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
    Json(interval): Json<Interval>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = state.repository.add_availability(&doctor_id, interval)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "availability": doctor.availability })),
    ))
}

#[axum::debug_handler]
pub async fn replace_availability(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
    Json(request): Json<ReplaceAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.repository.replace_availability(&doctor_id, request.intervals)?;
    Ok(Json(json!({ "success": true, "availability": doctor.availability })))
}

#[axum::debug_handler]
pub async fn remove_availability(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
    Json(request): Json<RemoveAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = state
        .repository
        .remove_availability(&doctor_id, &request.interval, request.confirmed)?;
    Ok(Json(json!({ "success": true, "availability": doctor.availability })))
}

#[axum::debug_handler]
pub async fn get_free_slots(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<FreeSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = match &query.exclude {
        Some(appointment_id) => state.lifecycle.free_slots_excluding(&doctor_id, appointment_id)?,
        None => state.lifecycle.free_slots(&doctor_id)?,
    };
    Ok(Json(json!(FreeSlotsResponse {
        doctor_id,
        excluding: query.exclude,
        slots,
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<ClinicState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .lifecycle
        .list_appointments(&AppointmentOwner::Doctor(doctor_id), query.status)?;
    Ok(Json(json!({ "appointments": appointments, "total": appointments.len() })))
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<ClinicState>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient = state.repository.register_patient(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "patient": patient }))))
}

#[axum::debug_handler]
pub async fn list_patients(State(state): State<Arc<ClinicState>>) -> Result<Json<Value>, AppError> {
    let patients = state.repository.list_patients();
    Ok(Json(json!({ "patients": patients, "total": patients.len() })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<ClinicState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient = state.repository.get_patient(&patient_id)?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<ClinicState>>,
    Path(patient_id): Path<String>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = state
        .lifecycle
        .list_appointments(&AppointmentOwner::Patient(patient_id), query.status)?;
    Ok(Json(json!({ "appointments": appointments, "total": appointments.len() })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ClinicState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.lifecycle.create(request)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "appointment": appointment })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.get_appointment(&appointment_id)?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .reschedule(&appointment_id, request.new_start, request.new_end)?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.accept(&appointment_id)?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn decline_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.decline(&appointment_id)?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.cancel(&appointment_id, request.confirmed)?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<ClinicState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .complete(&appointment_id, request.outcome.as_ref())?;
    Ok(Json(json!({ "success": true, "appointment": appointment })))
}
