use futures_util::{StreamExt, future, stream};

use crate::features::styles::Style;

use super::client::ImageGenerationClient;
use super::models::{GeneratedImage, UploadedImage};

/// 对一批上传图片逐张生成线稿。
///
/// 最多 `max_parallel` 张同时在途；输出顺序与输入一致。
/// 单张失败只记录日志并跳过，不影响其余图片，也不重试。
pub async fn process_batch(
    client: &ImageGenerationClient,
    api_key: &str,
    style: Style,
    images: Vec<UploadedImage>,
    max_parallel: usize,
) -> Vec<GeneratedImage> {
    let total = images.len();

    stream::iter(images)
        .map(|image| async move {
            let filename = image.output_name(style);
            match client.render(api_key, style.prompt(), &image).await {
                Ok(data) => {
                    tracing::info!(
                        index = image.index,
                        total,
                        output = %filename,
                        bytes = data.len(),
                        "图片生成成功"
                    );
                    Some(GeneratedImage { filename, data })
                }
                Err(e) => {
                    tracing::warn!(
                        index = image.index,
                        total,
                        original = %image.filename,
                        error = %e,
                        "图片生成失败，已跳过"
                    );
                    None
                }
            }
        })
        .buffered(max_parallel.max(1))
        .filter_map(future::ready)
        .collect()
        .await
}
