use axum::{Router, response::Json, routing::get};

use crate::state::AppState;

use super::PromptCatalog;

#[utoipa::path(
    get,
    path = "/prompts",
    summary = "列出可用风格",
    description = "返回全部线稿风格：键为风格标识符（即 /process-images 的 prompt 字段取值），值为展示名与描述。",
    responses(
        (status = 200, description = "风格目录（值结构见 StyleInfo）", body = serde_json::Value)
    ),
    tag = "Styles"
)]
pub async fn get_prompts() -> Json<PromptCatalog> {
    Json(PromptCatalog)
}

pub fn create_styles_router() -> Router<AppState> {
    Router::<AppState>::new().route("/prompts", get(get_prompts))
}
