use axum::body::Bytes;

use crate::features::styles::Style;

use super::filename::sanitized_stem;

/// 上传图片的声明格式，决定 data URL 中的子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// 按 Content-Type 推断格式；忽略大小写与参数，无法识别时回退为 JPEG。
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let essence = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match essence.as_str() {
            "image/png" => ImageFormat::Png,
            "image/webp" => ImageFormat::Webp,
            _ => ImageFormat::Jpeg,
        }
    }

    pub const fn subtype(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
        }
    }
}

/// 单次请求内的上传图片
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// 在本次上传中的序号（从 1 开始）
    pub index: usize,
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_content_type(self.content_type.as_deref())
    }

    /// 压缩包内条目名：`{style}_{sanitized-stem}_{index}.png`
    pub fn output_name(&self, style: Style) -> String {
        format!(
            "{}_{}_{}.png",
            style.id(),
            sanitized_stem(&self.filename),
            self.index
        )
    }
}

/// 生成成功的单张结果
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub filename: String,
    pub data: Bytes,
}
