use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use doctor_cell::router::doctor_routes;
use notification_cell::router::notification_routes;
use notification_cell::RealtimeChannelRegistry;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>, realtime: RealtimeChannelRegistry) -> Router {
    Router::new()
        .route("/", get(|| async { "PetsCare API is running" }))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone(), realtime.clone()))
        .nest("/notifications", notification_routes(state, realtime))
}
