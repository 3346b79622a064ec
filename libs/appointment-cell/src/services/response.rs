// libs/appointment-cell/src/services/response.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::directory::DoctorDirectoryService;
use notification_cell::models::{ResponseEvent, ResponseOutcome};
use notification_cell::services::fanout::NotificationFanoutService;
use notification_cell::services::realtime::RealtimeChannelRegistry;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Appointment, AppointmentError, RespondToAppointmentRequest};

/// Applies a doctor's (or admin's) decision to an appointment. This is the
/// only mutator of appointment state after creation: Pending flows to exactly
/// one of Accepted / Rejected / Cancelled, and the persisted transition is
/// authoritative regardless of what happens to the notification fan-out.
pub struct AppointmentResponseService {
    supabase: Arc<SupabaseClient>,
    directory: DoctorDirectoryService,
    fanout: NotificationFanoutService,
}

impl AppointmentResponseService {
    pub fn new(config: &AppConfig, realtime: RealtimeChannelRegistry) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            directory: DoctorDirectoryService::new(config),
            fanout: NotificationFanoutService::new(config, realtime),
        }
    }

    pub async fn respond(
        &self,
        user: &User,
        request: RespondToAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let Some(appointment_id) = request.appointment_id else {
            return Err(AppointmentError::ValidationError(
                "Please provide appointmentId.".to_string(),
            ));
        };

        let outcome = request
            .response
            .as_deref()
            .and_then(parse_response)
            .ok_or_else(|| {
                AppointmentError::ValidationError(
                    "Response must be 'Accepted', 'Rejected' or 'Cancelled'.".to_string(),
                )
            })?;

        if !user.is_doctor() && !user.is_admin() {
            return Err(AppointmentError::Unauthorized(
                "Access denied. Doctor or Admin required.".to_string(),
            ));
        }

        let appointment = self.get_appointment(appointment_id, auth_token).await?;

        let acted_by = if user.is_doctor() {
            let doctor_id = Uuid::parse_str(&user.id).map_err(|_| {
                AppointmentError::ValidationError("Invalid user ID format.".to_string())
            })?;
            if appointment.doctor_id != doctor_id {
                return Err(AppointmentError::Unauthorized(
                    "You are not authorized to respond to this appointment.".to_string(),
                ));
            }
            // The display name is cosmetic; a failed lookup must not block
            // the transition.
            self.directory
                .get_doctor(doctor_id, auth_token)
                .await
                .map(|doctor| doctor.name)
                .unwrap_or_else(|_| "the doctor".to_string())
        } else {
            "Admin".to_string()
        };

        if appointment.status.is_terminal() {
            warn!(
                "Appointment {} already {}, overwriting with {} (administrative correction by {})",
                appointment.id, appointment.status, outcome, acted_by
            );
        }

        let updated = self
            .update_status(
                &appointment,
                outcome,
                &acted_by,
                request.rejection_reason.as_deref(),
                auth_token,
            )
            .await?;

        info!(
            "Appointment {} marked {} by {}",
            updated.id, updated.status, acted_by
        );

        // Fan-out runs detached: the new status is already persisted, and
        // notification/email/push failures must not surface to the caller.
        let event = self.build_response_event(&updated, outcome, &acted_by, auth_token).await;
        let fanout = self.fanout.clone();
        let token = auth_token.to_string();
        tokio::spawn(async move {
            fanout.dispatch(&event, &token).await;
        });

        Ok(updated)
    }

    // Private helpers

    async fn get_appointment(
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

    async fn update_status(
        &self,
        appointment: &Appointment,
        outcome: ResponseOutcome,
        acted_by: &str,
        rejection_reason: Option<&str>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let mut update_data = serde_json::Map::new();
        update_data.insert("status".to_string(), json!(outcome.to_string()));
        update_data.insert("acted_by".to_string(), json!(acted_by));
        if let Some(reason) = rejection_reason {
            update_data.insert("rejection_reason".to_string(), json!(reason));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(Value::Object(update_data)),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to update appointment".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse updated appointment: {}", e)))
    }

    /// The event reads from the already-updated record, so everything the
    /// fan-out renders carries the persisted status. Name lookups are
    /// tolerant; a missing row degrades to a generic label.
    async fn build_response_event(
        &self,
        updated: &Appointment,
        outcome: ResponseOutcome,
        acted_by: &str,
        auth_token: &str,
    ) -> ResponseEvent {
        let doctor_name = self
            .directory
            .get_doctor(updated.doctor_id, auth_token)
            .await
            .map(|doctor| doctor.name)
            .unwrap_or_else(|_| "the doctor".to_string());

        let pet_name = self
            .pet_name(updated.pet_id, auth_token)
            .await
            .unwrap_or_else(|| "your pet".to_string());

        ResponseEvent {
            appointment_id: updated.id,
            new_status: outcome,
            acted_by: acted_by.to_string(),
            owner_id: updated.pet_owner_id,
            doctor_name,
            pet_name,
            appointment_date: updated.appointment_date,
            rejection_reason: updated.rejection_reason.clone(),
        }
    }

    async fn pet_name(&self, pet_id: Uuid, auth_token: &str) -> Option<String> {
        let path = format!("/rest/v1/pets?id=eq.{}&select=id,name", pet_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .ok()?;

        let name = result.first()?.get("name")?.as_str()?.to_string();
        debug!("Resolved pet {} to {}", pet_id, name);
        Some(name)
    }
}

/// The only accepted decisions; anything else is a validation error.
pub fn parse_response(raw: &str) -> Option<ResponseOutcome> {
    match raw {
        "Accepted" => Some(ResponseOutcome::Accepted),
        "Rejected" => Some(ResponseOutcome::Rejected),
        "Cancelled" => Some(ResponseOutcome::Cancelled),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_terminal_decisions_parse() {
        assert_eq!(parse_response("Accepted"), Some(ResponseOutcome::Accepted));
        assert_eq!(parse_response("Rejected"), Some(ResponseOutcome::Rejected));
        assert_eq!(parse_response("Cancelled"), Some(ResponseOutcome::Cancelled));

        assert_eq!(parse_response("Pending"), None);
        assert_eq!(parse_response("accepted"), None);
        assert_eq!(parse_response(""), None);
    }
}
