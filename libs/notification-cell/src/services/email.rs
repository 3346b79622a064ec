// libs/notification-cell/src/services/email.rs
use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use shared_config::AppConfig;

use crate::models::{EmailOutcome, ResponseEvent, ResponseOutcome};

/// Sends are bounded so a slow relay can never hold up the doctor's response.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// SMTP mail dispatch. Missing configuration degrades every send to a soft
/// `{sent: false, error}` outcome instead of an error.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    pub fn from_config(config: &AppConfig) -> Self {
        let from = config.email_from.clone();

        if !config.is_email_configured() {
            warn!("Email: SMTP settings not set, status emails will be skipped");
            return Self { transport: None, from };
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map(|builder| {
                builder
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build()
            });

        match transport {
            Ok(transport) => Self { transport: Some(transport), from },
            Err(e) => {
                warn!("Email: failed to build SMTP transport: {}", e);
                Self { transport: None, from }
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Status email to the pet owner when a doctor accepts, rejects, or
    /// cancels the appointment.
    pub async fn send_appointment_status_email(
        &self,
        to_email: &str,
        owner_name: &str,
        event: &ResponseEvent,
    ) -> EmailOutcome {
        let subject = format!("PetsCare – Your appointment has been {}", event.new_status);
        let accent = match event.new_status {
            ResponseOutcome::Accepted => "#059669",
            ResponseOutcome::Rejected | ResponseOutcome::Cancelled => "#dc2626",
        };
        let follow_up = match event.new_status {
            ResponseOutcome::Accepted => {
                "<p>Please visit the clinic on the scheduled date. Contact us if you need to reschedule.</p>"
            }
            _ => {
                "<p>If you have questions or wish to book another slot, please log in to PetsCare or contact us.</p>"
            }
        };
        let reason_line = match &event.rejection_reason {
            Some(reason) if !reason.is_empty() => format!("<p>Reason: {}</p>", reason),
            _ => String::new(),
        };

        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto;">
      <h2 style="color: {accent};">Appointment {status}</h2>
      <p>Hello {owner_name},</p>
      <p>
        Your appointment with <strong>Dr. {doctor}</strong> for <strong>{pet}</strong>
        scheduled on <strong>{date}</strong> has been <strong>{status_lower}</strong>
        by {acted_by}.
      </p>
      {reason_line}
      {follow_up}
      <br/>
      <p style="color: #6b7280; font-size: 14px;">
        This is an automated message from <strong>PetsCare</strong>. Please do not reply directly to this email.
      </p>
    </div>"#,
            accent = accent,
            status = event.new_status,
            owner_name = owner_name,
            doctor = event.doctor_name,
            pet = event.pet_name,
            date = event.appointment_date.format("%B %d, %Y at %H:%M"),
            status_lower = event.new_status.past_tense(),
            acted_by = event.acted_by,
            reason_line = reason_line,
            follow_up = follow_up,
        );

        self.send_html(to_email, &subject, &html).await
    }

    /// Custom email from the admin dashboard to a pet owner. The caller gets
    /// the outcome back synchronously.
    pub async fn send_admin_message_email(
        &self,
        to_email: &str,
        owner_name: &str,
        subject: Option<&str>,
        html_body: Option<&str>,
    ) -> EmailOutcome {
        let html = match html_body {
            Some(body) if !body.is_empty() => body.to_string(),
            _ => format!(
                r#"<div style="font-family: Arial, sans-serif; max-width: 500px; margin: 0 auto;">
      <h2 style="color: #059669;">Message from PetsCare</h2>
      <p>Hello {owner_name},</p>
      <p>You have a message from the PetsCare team regarding your appointment.</p>
      <p>Please log in to your account for details or contact us if you have questions.</p>
      <br/>
      <p style="color: #6b7280; font-size: 14px;">
        This message was sent from <strong>PetsCare</strong>. Please do not reply directly to this email.
      </p>
    </div>"#,
            ),
        };

        self.send_html(
            to_email,
            subject.unwrap_or("PetsCare – Message from Admin"),
            &html,
        )
        .await
    }

    async fn send_html(&self, to_email: &str, subject: &str, html: &str) -> EmailOutcome {
        let Some(transport) = &self.transport else {
            info!("Email not configured, skipping send to {}", to_email);
            return EmailOutcome::failed("Email not configured");
        };

        let from = match self.from.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                error!("Invalid sender address {}: {}", self.from, e);
                return EmailOutcome::failed(format!("Invalid sender address: {}", e));
            }
        };
        let to = match to_email.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                error!("Invalid recipient address {}: {}", to_email, e);
                return EmailOutcome::failed(format!("Invalid recipient address: {}", e));
            }
        };

        let email = match Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
        {
            Ok(email) => email,
            Err(e) => {
                error!("Failed to build email: {}", e);
                return EmailOutcome::failed(format!("Failed to build email: {}", e));
            }
        };

        match tokio::time::timeout(SEND_TIMEOUT, transport.send(email)).await {
            Ok(Ok(_)) => {
                info!("Email sent to {}: {}", to_email, subject);
                EmailOutcome::delivered()
            }
            Ok(Err(e)) => {
                error!("Failed to send email to {}: {}", to_email, e);
                EmailOutcome::failed(e.to_string())
            }
            Err(_) => {
                error!("Email send to {} timed out after {:?}", to_email, SEND_TIMEOUT);
                EmailOutcome::failed("Email send timed out")
            }
        }
    }
}
