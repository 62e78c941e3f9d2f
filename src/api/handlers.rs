//! 基础运维端点：健康检查 + 轻量指标

use axum::Json;

use crate::{
    api::response::{success_response, ApiResponse},
    error::AppError,
    metrics,
};

/// GET /healthz - 存活检查
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /api/v1/metrics-lite - 进程内计数器快照
pub async fn metrics_lite() -> Result<Json<ApiResponse<metrics::MetricsSnapshot>>, AppError> {
    success_response(metrics::snapshot())
}
