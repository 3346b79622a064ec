// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub pet_owner_id: Uuid,
    pub pet_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    /// Free-text note from the owner describing the problem.
    pub query: Option<String>,
    pub status: AppointmentStatus,
    /// Who recorded the decision: the doctor's name, or "Admin".
    pub acted_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment lifecycle: `Pending` at creation, then exactly one terminal
/// decision recorded by the response service. Never reverts to Pending.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Pending)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "Pending"),
            AppointmentStatus::Accepted => write!(f, "Accepted"),
            AppointmentStatus::Rejected => write!(f, "Rejected"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking request as submitted by the owner UI; presence of the required
/// fields is validated by the booking service, not by deserialization, so
/// the caller gets a specific message back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub pet_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    /// Raw timestamp string; parsed and validated against the doctor's
    /// schedule by the booking service.
    pub appointment_date: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToAppointmentRequest {
    pub appointment_id: Option<Uuid>,
    /// "Accepted", "Rejected", or "Cancelled".
    pub response: Option<String>,
    pub rejection_reason: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found.")]
    NotFound,

    #[error("Doctor not found.")]
    DoctorNotFound,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
