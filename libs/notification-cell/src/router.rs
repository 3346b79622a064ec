// libs/notification-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Extension, Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::realtime::RealtimeChannelRegistry;

pub fn notification_routes(state: Arc<AppConfig>, realtime: RealtimeChannelRegistry) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::get_my_notifications))
        .route("/{notification_id}/read", patch(handlers::mark_notification_read))
        .route("/read-all", patch(handlers::mark_all_notifications_read))
        .route("/email", post(handlers::send_admin_email))
        .route("/ws", get(handlers::notifications_ws))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(Extension(realtime));

    Router::new().merge(protected_routes).with_state(state)
}
