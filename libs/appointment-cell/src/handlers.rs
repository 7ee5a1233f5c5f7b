// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use doctor_cell::{DoctorId, SaveAvailabilityRequest};
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookingRequest, PatientId, Transition};
use crate::router::AppointmentState;

// ==============================================================================
// REQUEST / QUERY STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor_id: Option<DoctorId>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub horizon: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApprovePaymentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectPaymentRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let code = err.code();
        let message = err.to_string();

        match err {
            AppointmentError::NotFound(_) => AppError::NotFound { code, message },
            AppointmentError::AlreadyBooked | AppointmentError::InvalidState(_) => {
                AppError::Conflict { code, message }
            }
            AppointmentError::ValidationError(_) => AppError::ValidationError { code, message },
            AppointmentError::CollaboratorUnavailable(_) => AppError::ExternalService { code, message },
        }
    }
}

fn transition_body<T: Serialize>(transition: &Transition<T>) -> Value {
    json!({
        "success": true,
        "changed": transition.is_applied(),
        "warning": transition.warning(),
        "record": transition.record(),
    })
}

// ==============================================================================
// SCHEDULE HANDLERS
// ==============================================================================

/// Save the doctor's weekly rule and generate its slots
#[axum::debug_handler]
pub async fn save_schedule(
    State(state): State<Arc<AppointmentState>>,
    Path(doctor_id): Path<DoctorId>,
    Json(request): Json<SaveAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let report = state.schedules.save_rule(doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "rule": report.rule,
        "generation": report.generation,
    })))
}

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppointmentState>>,
    Path(doctor_id): Path<DoctorId>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<Value>, AppError> {
    let report = state.schedules.regenerate(doctor_id, query.horizon).await?;

    Ok(Json(json!({
        "success": true,
        "generation": report,
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state.booking.available_slots(query.doctor_id).await?;

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len(),
    })))
}

#[axum::debug_handler]
pub async fn book_slot(
    State(state): State<Arc<AppointmentState>>,
    Path(slot_id): Path<Uuid>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, AppError> {
    let result = state.booking.book(slot_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": result.appointment,
        "remote_session": result.remote_session,
        "message": "Appointment booked successfully",
    })))
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let transition = state.lifecycle.cancel(appointment_id).await?;
    Ok(Json(transition_body(&transition)))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AppointmentState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let transition = state.lifecycle.complete(appointment_id).await?;
    Ok(Json(transition_body(&transition)))
}

#[axum::debug_handler]
pub async fn approve_payment(
    State(state): State<Arc<AppointmentState>>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<ApprovePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let transition = state
        .lifecycle
        .approve_payment(payment_id, request.transaction_id)
        .await?;
    Ok(Json(transition_body(&transition)))
}

#[axum::debug_handler]
pub async fn reject_payment(
    State(state): State<Arc<AppointmentState>>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<RejectPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let transition = state.lifecycle.reject_payment(payment_id, request.reason).await?;
    Ok(Json(transition_body(&transition)))
}

// ==============================================================================
// PATIENT VIEW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_upcoming_appointments(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.lifecycle.upcoming(patient_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_history(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.lifecycle.history(patient_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len(),
    })))
}

#[axum::debug_handler]
pub async fn get_payment_history(
    State(state): State<Arc<AppointmentState>>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Value>, AppError> {
    let history = state.lifecycle.payment_history(patient_id).await?;

    Ok(Json(json!({
        "payments": history.payments,
        "summary": history.summary,
    })))
}
