// libs/notification-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// NOTIFICATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// The pet owner this notification belongs to.
    pub recipient_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub appointment_id: Option<Uuid>,
    pub read: bool,
    /// Name of the doctor who acted, or "Admin".
    #[serde(default)]
    pub acted_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AppointmentAccepted,
    AppointmentRejected,
    AppointmentCancelled,
    AppointmentReminder,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::AppointmentAccepted => write!(f, "appointment_accepted"),
            NotificationType::AppointmentRejected => write!(f, "appointment_rejected"),
            NotificationType::AppointmentCancelled => write!(f, "appointment_cancelled"),
            NotificationType::AppointmentReminder => write!(f, "appointment_reminder"),
        }
    }
}

// ==============================================================================
// RESPONSE EVENT (fan-out contract)
// ==============================================================================

/// The terminal decision a doctor (or admin) recorded on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    Accepted,
    Rejected,
    Cancelled,
}

impl ResponseOutcome {
    /// Lower-case form used inside rendered notification and email text.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ResponseOutcome::Accepted => "accepted",
            ResponseOutcome::Rejected => "rejected",
            ResponseOutcome::Cancelled => "cancelled",
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            ResponseOutcome::Accepted => NotificationType::AppointmentAccepted,
            ResponseOutcome::Rejected => NotificationType::AppointmentRejected,
            ResponseOutcome::Cancelled => NotificationType::AppointmentCancelled,
        }
    }

    pub fn notification_title(&self) -> &'static str {
        match self {
            ResponseOutcome::Accepted => "Appointment Accepted",
            ResponseOutcome::Rejected => "Appointment Rejected",
            ResponseOutcome::Cancelled => "Appointment Cancelled",
        }
    }
}

impl fmt::Display for ResponseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseOutcome::Accepted => write!(f, "Accepted"),
            ResponseOutcome::Rejected => write!(f, "Rejected"),
            ResponseOutcome::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Emitted by the response service once the new appointment status has been
/// persisted; everything the fan-out needs to render owner-facing text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub appointment_id: Uuid,
    pub new_status: ResponseOutcome,
    pub acted_by: String,
    pub owner_id: Uuid,
    pub doctor_name: String,
    pub pet_name: String,
    pub appointment_date: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl ResponseEvent {
    /// Rendered body for the persisted notification and the push payload.
    pub fn render_message(&self) -> String {
        let mut message = format!(
            "Your appointment with Dr. {} for {} has been {} by {}.",
            self.doctor_name,
            self.pet_name,
            self.new_status.past_tense(),
            self.acted_by
        );
        if let Some(reason) = &self.rejection_reason {
            if !reason.is_empty() {
                message.push_str(&format!(" Reason: {}", reason));
            }
        }
        message
    }
}

/// Payload delivered over the owner's live channel, never broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentPushEvent {
    pub appointment_id: Uuid,
    pub status: ResponseOutcome,
    pub title: String,
    pub message: String,
    pub acted_by: String,
}

// ==============================================================================
// FAN-OUT RESULTS
// ==============================================================================

/// Soft result of an email attempt; a failed send is reported, never thrown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub sent: bool,
    pub error: Option<String>,
}

impl EmailOutcome {
    pub fn delivered() -> Self {
        Self { sent: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { sent: false, error: Some(error.into()) }
    }
}

/// Per-effect outcome of one fan-out dispatch. Effects are attempted exactly
/// once each and are failure-isolated from one another.
#[derive(Debug, Clone)]
pub struct FanoutReport {
    pub notification_persisted: bool,
    pub push_delivered: bool,
    pub email: EmailOutcome,
}

// ==============================================================================
// REQUEST MODELS / LOOKUPS
// ==============================================================================

/// Admin-triggered custom email to a pet owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub owner_id: Uuid,
    pub subject: Option<String>,
    pub html_body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PetOwnerContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
