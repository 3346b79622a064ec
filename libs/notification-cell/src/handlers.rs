// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Extension, Path, State},
    response::Response,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{NotificationError, SendEmailRequest};
use crate::services::email::EmailService;
use crate::services::realtime::RealtimeChannelRegistry;
use crate::services::store::NotificationStoreService;

fn owner_uuid(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::BadRequest("Invalid user ID format".to_string()))
}

/// Notifications for the logged-in pet owner, newest first, with the unread
/// badge count the header polls for.
#[axum::debug_handler]
pub async fn get_my_notifications(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let recipient_id = owner_uuid(&user)?;
    let store = NotificationStoreService::new(&state);

    let notifications = store
        .list_for_recipient(recipient_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let unread_count = store
        .unread_count(recipient_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "notifications": notifications,
        "unread_count": unread_count
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<AppConfig>>,
    Path(notification_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let recipient_id = owner_uuid(&user)?;
    let store = NotificationStoreService::new(&state);

    let notification = store
        .mark_read(notification_id, recipient_id, auth.token())
        .await
        .map_err(|e| match e {
            NotificationError::NotFound => AppError::NotFound("Notification not found".to_string()),
            NotificationError::DatabaseError(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read",
        "notification": notification
    })))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let recipient_id = owner_uuid(&user)?;
    let store = NotificationStoreService::new(&state);

    store
        .mark_all_read(recipient_id, auth.token())
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read"
    })))
}

/// Admin-triggered custom email to a pet owner. Delivery problems come back
/// as `{sent: false, error}` in a 200 body, matching the dashboard contract.
#[axum::debug_handler]
pub async fn send_admin_email(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        return Err(AppError::Auth("Access denied. Admin required.".to_string()));
    }

    let store = NotificationStoreService::new(&state);
    let Some(contact) = store.pet_owner_contact(request.owner_id, auth.token()).await else {
        return Err(AppError::NotFound("Pet owner not found".to_string()));
    };

    let email = EmailService::from_config(&state);
    let outcome = email
        .send_admin_message_email(
            &contact.email,
            &contact.name,
            request.subject.as_deref(),
            request.html_body.as_deref(),
        )
        .await;

    info!(
        "Admin email to owner {} ({}): sent={}",
        request.owner_id, contact.email, outcome.sent
    );

    Ok(Json(json!({
        "success": true,
        "sent": outcome.sent,
        "error": outcome.error
    })))
}

/// Live notification channel for the logged-in owner. Each open session
/// registers against the owner's channel; events arrive as JSON text frames.
#[axum::debug_handler]
pub async fn notifications_ws(
    ws: WebSocketUpgrade,
    Extension(user): Extension<User>,
    Extension(realtime): Extension<RealtimeChannelRegistry>,
) -> Result<Response, AppError> {
    let owner_id = owner_uuid(&user)?;

    Ok(ws.on_upgrade(move |socket| stream_owner_events(socket, owner_id, realtime)))
}

async fn stream_owner_events(
    mut socket: WebSocket,
    owner_id: Uuid,
    realtime: RealtimeChannelRegistry,
) {
    let mut events = realtime.register(owner_id).await;
    debug!("Websocket session opened for owner {}", owner_id);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(payload) => {
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Owner {} websocket lagged, skipped {} events", owner_id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // Client frames are ignored; the channel is push-only.
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }

    realtime.release(owner_id).await;
    debug!("Websocket session closed for owner {}", owner_id);
}
