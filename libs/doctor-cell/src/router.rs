// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::get_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(state)
}
