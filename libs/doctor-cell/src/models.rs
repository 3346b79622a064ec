use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recurring weekly availability window. Times are 24h "HH:mm" strings on
/// the local clock; a missing bound means the window is open on that side.
/// Legacy doctors may carry no slots at all, which means unconstrained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: i32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialization: String,
    pub contact_number: String,
    pub profile_image: Option<String>,
    pub notes: Option<String>,
    /// Human-readable summary shown on the doctor's profile, display only.
    pub availability: Option<String>,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn has_schedule(&self) -> bool {
        !self.schedule.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
