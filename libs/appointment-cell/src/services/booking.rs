// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::models::DoctorError;
use doctor_cell::services::directory::DoctorDirectoryService;
use doctor_cell::services::schedule::is_within_schedule;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest};

/// Validates and persists new appointment requests from pet owners, and
/// serves the owner/doctor/admin listings. Only ever creates records; the
/// response service owns every later mutation.
pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    directory: DoctorDirectoryService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            directory: DoctorDirectoryService::new(config),
        }
    }

    pub async fn book_appointment(
        &self,
        user: &User,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        if !user.is_pet_owner() {
            return Err(AppointmentError::Unauthorized(
                "Only pet owners can book appointments.".to_string(),
            ));
        }

        let (Some(pet_id), Some(doctor_id), Some(raw_date)) = (
            request.pet_id,
            request.doctor_id,
            request.appointment_date.as_deref(),
        ) else {
            return Err(AppointmentError::ValidationError(
                "Please provide petId, doctorId, and appointmentDate.".to_string(),
            ));
        };

        let owner_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppointmentError::ValidationError("Invalid user ID format.".to_string()))?;

        let doctor = self
            .directory
            .get_doctor(doctor_id, auth_token)
            .await
            .map_err(|e| match e {
                DoctorError::NotFound => AppointmentError::DoctorNotFound,
                DoctorError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            })?;

        let appointment_date = parse_appointment_date(raw_date).ok_or_else(|| {
            AppointmentError::ValidationError("Invalid appointment date.".to_string())
        })?;

        // Doctors without a structured schedule accept any time (legacy rows).
        if doctor.has_schedule() && !is_within_schedule(appointment_date.naive_utc(), &doctor.schedule)
        {
            warn!(
                "Booking for doctor {} rejected: {} outside published schedule",
                doctor_id, appointment_date
            );
            return Err(AppointmentError::ValidationError(format!(
                "Dr. {} is not available on {} at {}. Please choose a time inside the doctor's availability.",
                doctor.name,
                appointment_date.format("%A"),
                appointment_date.format("%H:%M"),
            )));
        }

        let appointment = self
            .create_appointment_record(owner_id, pet_id, doctor_id, appointment_date, request.query, auth_token)
            .await?;

        info!(
            "Appointment {} booked by owner {} with doctor {}",
            appointment.id, owner_id, doctor_id
        );
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_where(&format!("pet_owner_id=eq.{}", owner_id), auth_token).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_where(&format!("doctor_id=eq.{}", doctor_id), auth_token).await
    }

    pub async fn list_all(&self, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_where("", auth_token).await
    }

    // Private helpers

    async fn list_where(
        &self,
        filter: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = "/rest/v1/appointments?".to_string();
        if !filter.is_empty() {
            path.push_str(filter);
            path.push('&');
        }
        path.push_str("order=appointment_date.desc");

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn create_appointment_record(
        &self,
        owner_id: Uuid,
        pet_id: Uuid,
        doctor_id: Uuid,
        appointment_date: DateTime<Utc>,
        query: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let now = Utc::now();
        let appointment_data = json!({
            "pet_owner_id": owner_id,
            "pet_id": pet_id,
            "doctor_id": doctor_id,
            "appointment_date": appointment_date.to_rfc3339(),
            "query": query,
            "status": AppointmentStatus::Pending.to_string(),
            "acted_by": null,
            "rejection_reason": null,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse created appointment: {}", e)))
    }
}

/// Accepts RFC 3339 as sent by the booking form, with naive fallbacks for the
/// datetime-local strings older clients submit.
pub fn parse_appointment_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    None
}
