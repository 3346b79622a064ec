// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Router,
};

use notification_cell::services::realtime::RealtimeChannelRegistry;
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>, realtime: RealtimeChannelRegistry) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/respond", put(handlers::respond_to_appointment))
        .route("/mine", get(handlers::get_my_appointments))
        .route("/assigned", get(handlers::get_doctor_appointments))
        .route("/all", get(handlers::get_all_appointments))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(Extension(realtime));

    Router::new().merge(protected_routes).with_state(state)
}
