// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use notification_cell::services::realtime::RealtimeChannelRegistry;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, RespondToAppointmentRequest};
use crate::services::booking::AppointmentBookingService;
use crate::services::response::AppointmentResponseService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found.".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found.".to_string()),
        AppointmentError::Unauthorized(msg) => AppError::Auth(msg),
        AppointmentError::ValidationError(msg) => AppError::Validation(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Book an appointment (only pet owners can book).
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);

    let appointment = booking_service
        .book_appointment(&user, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

/// Doctor or admin accepts/rejects/cancels an appointment; the owner is
/// notified out of band (persisted notification, push, email).
#[axum::debug_handler]
pub async fn respond_to_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Extension(realtime): Extension<RealtimeChannelRegistry>,
    Json(request): Json<RespondToAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let response_service = AppointmentResponseService::new(&state, realtime);

    let appointment = response_service
        .respond(&user, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Appointment has been {} successfully.",
            appointment.status.to_string().to_lowercase()
        ),
        "appointment": appointment
    })))
}

/// Appointments of the logged-in pet owner.
#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_pet_owner() {
        return Err(AppError::Auth(
            "Only pet owners can view their appointments.".to_string(),
        ));
    }
    let owner_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::BadRequest("Invalid user ID format".to_string()))?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .list_for_owner(owner_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

/// Appointments assigned to the logged-in doctor.
#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_doctor() {
        return Err(AppError::Auth(
            "Access denied. Only doctors can view their appointments.".to_string(),
        ));
    }
    let doctor_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::BadRequest("Invalid user ID format".to_string()))?;

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .list_for_doctor(doctor_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

/// Every appointment in the clinic (admin only).
#[axum::debug_handler]
pub async fn get_all_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth("Access denied. Admin required.".to_string()));
    }

    let booking_service = AppointmentBookingService::new(&state);
    let appointments = booking_service
        .list_all(auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}
