// libs/notification-cell/src/services/fanout.rs
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{AppointmentPushEvent, EmailOutcome, FanoutReport, ResponseEvent};
use crate::services::email::EmailService;
use crate::services::realtime::RealtimeChannelRegistry;
use crate::services::store::NotificationStoreService;

/// Turns one response event into its three side effects: a persisted
/// notification, a real-time push, and an email. Each effect has its own
/// error boundary; one failing never stops the others, and nothing here can
/// fail the state transition that triggered it.
#[derive(Clone)]
pub struct NotificationFanoutService {
    store: NotificationStoreService,
    realtime: RealtimeChannelRegistry,
    email: EmailService,
}

impl NotificationFanoutService {
    pub fn new(config: &AppConfig, realtime: RealtimeChannelRegistry) -> Self {
        Self {
            store: NotificationStoreService::new(config),
            realtime,
            email: EmailService::from_config(config),
        }
    }

    /// All three effects are attempted exactly once, in no required order,
    /// and none is retried. Failures are logged and tagged in the report.
    pub async fn dispatch(&self, event: &ResponseEvent, auth_token: &str) -> FanoutReport {
        debug!(
            "Dispatching fan-out for appointment {} ({})",
            event.appointment_id, event.new_status
        );

        let title = event.new_status.notification_title();
        let message = event.render_message();

        let notification_persisted = self.persist_notification(event, title, &message, auth_token).await;
        let push_delivered = self.push_to_owner(event, title, &message).await;
        let email = self.email_owner(event, auth_token).await;

        info!(
            "Fan-out for appointment {}: notification={} push={} email={}",
            event.appointment_id, notification_persisted, push_delivered, email.sent
        );

        FanoutReport {
            notification_persisted,
            push_delivered,
            email,
        }
    }

    async fn persist_notification(
        &self,
        event: &ResponseEvent,
        title: &str,
        message: &str,
        auth_token: &str,
    ) -> bool {
        let result = self
            .store
            .create_notification(
                event.owner_id,
                event.new_status.notification_type(),
                title,
                message,
                Some(event.appointment_id),
                &event.acted_by,
                auth_token,
            )
            .await;

        match result {
            Ok(notification) => {
                debug!("Notification {} persisted for owner {}", notification.id, event.owner_id);
                true
            }
            Err(e) => {
                error!(
                    "Failed to persist notification for appointment {}: {}",
                    event.appointment_id, e
                );
                false
            }
        }
    }

    async fn push_to_owner(&self, event: &ResponseEvent, title: &str, message: &str) -> bool {
        let payload = AppointmentPushEvent {
            appointment_id: event.appointment_id,
            status: event.new_status,
            title: title.to_string(),
            message: message.to_string(),
            acted_by: event.acted_by.clone(),
        };

        let payload = match serde_json::to_string(&payload) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize push event: {}", e);
                return false;
            }
        };

        self.realtime.send_to_owner(event.owner_id, payload).await
    }

    async fn email_owner(&self, event: &ResponseEvent, auth_token: &str) -> EmailOutcome {
        let Some(contact) = self.store.pet_owner_contact(event.owner_id, auth_token).await else {
            info!("Owner {} has no registered email address, skipping email", event.owner_id);
            return EmailOutcome::failed("Pet owner has no registered email address");
        };

        self.email
            .send_appointment_status_email(&contact.email, &contact.name, event)
            .await
    }
}
