//! HTTP API 层

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::app_state::AppState;

pub mod handlers;
pub mod identity_api;
pub mod response; // 统一响应格式

/// 构建完整路由
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/v1/metrics-lite", get(handlers::metrics_lite))
        .route("/api/v1/identity/state", get(identity_api::get_state))
        .route("/api/v1/identity/register", post(identity_api::register))
        .route("/api/v1/identity/rearm", post(identity_api::rearm))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
