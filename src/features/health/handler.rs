use axum::{Router, http::StatusCode, response::Json, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// 人类可读的状态说明
    #[schema(example = "Image processing API is running")]
    pub message: &'static str,
    /// 当前版本（Cargo package version）
    #[schema(example = "0.1.0")]
    pub version: &'static str,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回固定的服务状态与版本信息。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            message: "Image processing API is running",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub fn create_health_router() -> Router<AppState> {
    Router::<AppState>::new().route("/health", get(health_check))
}
