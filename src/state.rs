use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::coloring::ImageGenerationClient;

/// 聚合的应用共享状态（请求间只读）
#[derive(Clone)]
pub struct AppState {
    /// 外部图像生成服务客户端，凭证在构造时注入
    pub generator: Arc<ImageGenerationClient>,
    /// 单请求内同时处理的图片数
    pub max_parallel: usize,
    /// 单请求最多图片数（0=不限制）
    pub max_images: usize,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            generator: Arc::new(ImageGenerationClient::new(&config.openai)?),
            max_parallel: config.processing.max_parallel.max(1),
            max_images: config.upload.max_images,
        })
    }
}
