use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// 为 Swagger UI 提供正确的接口前缀 Servers 配置。
///
/// 业务接口默认挂载在 `/api` 下（对应 `config.api.prefix` / `APP_API__PREFIX`），
/// OpenAPI 的 paths 不包含该前缀。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("接口前缀：对应 config.api.prefix")),
            )
            .build();

        openapi.servers = Some(vec![api]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::coloring::handler::process_images,
        crate::features::styles::handler::get_prompts,
        crate::features::health::handler::health_check,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::features::styles::StyleInfo,
        crate::features::health::HealthResponse,
        crate::features::coloring::handler::ProcessImagesForm,
    )),
    modifiers(&ApiServers),
    tags(
        (name = "Coloring", description = "照片转填色线稿：上传图片，返回 zip。"),
        (name = "Styles", description = "风格目录。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Coloring Book API",
        version = env!("CARGO_PKG_VERSION"),
        description = "将照片通过外部图像生成服务转换为填色线稿（Axum + utoipa）。"
    )
)]
pub struct ApiDoc;
