// libs/notification-cell/src/services/store.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Notification, NotificationError, NotificationType, PetOwnerContact};

/// Persisted notification records plus the read-state toggling owned by the
/// owner-facing notification screen.
pub struct NotificationStoreService {
    supabase: Arc<SupabaseClient>,
}

impl NotificationStoreService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create_notification(
        &self,
        recipient_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        appointment_id: Option<Uuid>,
        acted_by: &str,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        debug!("Creating {} notification for owner {}", notification_type, recipient_id);

        let now = Utc::now();
        let notification_data = json!({
            "recipient_id": recipient_id,
            "notification_type": notification_type.to_string(),
            "title": title,
            "message": message,
            "appointment_id": appointment_id,
            "read": false,
            "acted_by": acted_by,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/notifications",
                Some(auth_token),
                Some(notification_data),
                Some(headers),
            )
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(NotificationError::DatabaseError(
                "Failed to create notification".to_string(),
            ));
        }

        let notification: Notification = serde_json::from_value(result[0].clone())
            .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))?;

        Ok(notification)
    }

    /// Newest-first, capped at 50 like the owner-facing notification screen.
    pub async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Notification>, NotificationError> {
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&order=created_at.desc&limit=50",
            recipient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        let notifications: Vec<Notification> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Notification>, _>>()
            .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notifications: {}", e)))?;

        Ok(notifications)
    }

    pub async fn unread_count(
        &self,
        recipient_id: Uuid,
        auth_token: &str,
    ) -> Result<usize, NotificationError> {
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&read=eq.false&select=id",
            recipient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        Ok(result.len())
    }

    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
        auth_token: &str,
    ) -> Result<Notification, NotificationError> {
        debug!("Marking notification {} read for owner {}", notification_id, recipient_id);

        let path = format!(
            "/rest/v1/notifications?id=eq.{}&recipient_id=eq.{}",
            notification_id, recipient_id
        );
        let update = json!({
            "read": true,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(NotificationError::NotFound);
        }

        let notification: Notification = serde_json::from_value(result[0].clone())
            .map_err(|e| NotificationError::DatabaseError(format!("Failed to parse notification: {}", e)))?;

        Ok(notification)
    }

    pub async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        auth_token: &str,
    ) -> Result<(), NotificationError> {
        let path = format!(
            "/rest/v1/notifications?recipient_id=eq.{}&read=eq.false",
            recipient_id
        );
        let update = json!({
            "read": true,
            "updated_at": Utc::now().to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update), Some(headers))
            .await
            .map_err(|e| NotificationError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Tolerant owner lookup used for email delivery; a missing row is `None`,
    /// never an error.
    pub async fn pet_owner_contact(&self, owner_id: Uuid, auth_token: &str) -> Option<PetOwnerContact> {
        let path = format!("/rest/v1/pet_owners?id=eq.{}&select=id,name,email", owner_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .ok()?;

        result
            .into_iter()
            .next()
            .and_then(|row| serde_json::from_value(row).ok())
    }
}

impl Clone for NotificationStoreService {
    fn clone(&self) -> Self {
        Self {
            supabase: Arc::clone(&self.supabase),
        }
    }
}
