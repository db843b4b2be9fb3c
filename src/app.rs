use std::any::Any;

use axum::{Router, extract::DefaultBodyLimit, response::IntoResponse, response::Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::error::AppError;
use crate::features::{coloring, health, styles};
use crate::openapi::ApiDoc;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 只压缩 JSON/文本；zip 与图片本身已压缩，再压一次只浪费 CPU。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
        .and(NotForContentType::const_new("application/zip"))
}

/// handler 内 panic 统一降级为 500 JSON
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    AppError::Internal(format!("handler panic: {detail}")).into_response()
}

/// 组装完整路由：业务接口挂在 `config.api.prefix` 下，另挂载 Swagger UI。
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let api_router = Router::<AppState>::new()
        .merge(coloring::create_coloring_router())
        .merge(styles::create_styles_router())
        .merge(health::create_health_router())
        .layer(DefaultBodyLimit::max(config.upload.max_body_bytes));

    let mut app = Router::<AppState>::new()
        .nest(&config.api.prefix, api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response));

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    app.layer(axum::middleware::from_fn(
        crate::request_id::request_id_middleware,
    ))
    .layer(CompressionLayer::new().compress_when(compression_predicate()))
}
