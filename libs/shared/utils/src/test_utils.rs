use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    /// SMTP settings are intentionally left blank so tests exercise the
    /// unconfigured-transport path of the email service.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            email_from: "PetsCare Admin <noreply@petscare.example>".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "petOwner".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: Uuid, email: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn pet_owner(email: &str) -> Self {
        Self::new(email, "petOwner")
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Builders for the PostgREST rows that wiremock-backed tests serve.
pub struct MockRows;

impl MockRows {
    pub fn doctor(id: &str, name: &str, specialization: &str) -> serde_json::Value {
        Self::doctor_with_schedule(id, name, specialization, json!([]))
    }

    pub fn doctor_with_schedule(
        id: &str,
        name: &str,
        specialization: &str,
        schedule: serde_json::Value,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": format!("{}@petscare.example", name.to_lowercase().replace(' ', ".")),
            "specialization": specialization,
            "contact_number": "555-0100",
            "profile_image": "/images/default-image.jpg",
            "notes": null,
            "availability": null,
            "schedule": schedule,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn schedule_slot(day_of_week: i32, start: &str, end: &str) -> serde_json::Value {
        json!({
            "day_of_week": day_of_week,
            "start_time": start,
            "end_time": end
        })
    }

    pub fn appointment(
        id: &str,
        owner_id: &str,
        pet_id: &str,
        doctor_id: &str,
        appointment_date: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "pet_owner_id": owner_id,
            "pet_id": pet_id,
            "doctor_id": doctor_id,
            "appointment_date": appointment_date,
            "query": null,
            "status": status,
            "acted_by": null,
            "rejection_reason": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn notification(
        id: &str,
        recipient_id: &str,
        notification_type: &str,
        title: &str,
        read: bool,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "recipient_id": recipient_id,
            "notification_type": notification_type,
            "title": title,
            "message": "test message",
            "appointment_id": Uuid::new_v4().to_string(),
            "read": read,
            "acted_by": "Admin",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn pet(id: &str, name: &str, breed: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "breed": breed
        })
    }

    pub fn pet_owner(id: &str, name: &str, email: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": email
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(!app_config.is_email_configured());
    }

    #[test]
    fn test_user_roles() {
        let owner = TestUser::pet_owner("owner@example.com");
        assert_eq!(owner.role, "petOwner");
        assert!(owner.to_user().is_pet_owner());

        let doctor = TestUser::doctor("doc@example.com");
        assert!(doctor.to_user().is_doctor());

        let admin = TestUser::admin("admin@example.com");
        assert!(admin.to_user().is_admin());
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
