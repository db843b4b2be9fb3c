//! 线稿生成 API 处理模块（features/coloring）
use axum::{
    Router,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};

use crate::error::AppError;
use crate::features::styles::Style;
use crate::state::AppState;

use super::models::UploadedImage;
use super::{archive, pipeline};

/// OpenAPI 展示用的表单结构（实际解析见 [`read_form`]）
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct ProcessImagesForm {
    /// 风格标识符：comic-book / sketch / childrens-cartoon / basic-outline / caricature
    #[schema(example = "sketch")]
    prompt: String,
    /// 一个或多个图片文件（字段名重复）
    #[schema(value_type = Vec<String>)]
    images: Vec<Vec<u8>>,
}

/// 解析后的表单内容
#[derive(Debug, Default)]
struct ImageForm {
    prompt: Option<String>,
    images: Vec<UploadedImage>,
}

#[utoipa::path(
    post,
    path = "/process-images",
    summary = "将照片转为填色线稿",
    description = "multipart 表单：`prompt` 为风格标识符，`images` 为一个或多个图片文件。逐张调用外部生成服务，失败的图片会被跳过；至少一张成功时返回包含全部结果的 zip。",
    request_body(content = ProcessImagesForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "zip 压缩包（附件下载）", content_type = "application/zip", body = Vec<u8>),
        (status = 400, description = "缺少或非法的 prompt / 未上传图片", body = crate::error::ErrorBody),
        (status = 413, description = "请求体超出上传上限", body = crate::error::ErrorBody),
        (status = 500, description = "未配置凭证，或全部图片处理失败", body = crate::error::ErrorBody)
    ),
    tag = "Coloring"
)]
pub async fn process_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    // 凭证检查先于一切解析与外呼
    let api_key = state.generator.api_key()?;

    let multipart = multipart.map_err(|rejection| {
        tracing::debug!("multipart 提取失败: {}", rejection.body_text());
        AppError::Validation("Content-Type must be multipart/form-data".to_string())
    })?;

    let form = read_form(multipart).await?;
    let style = validate_style(form.prompt.as_deref())?;
    let images = validate_images(form.images, state.max_images)?;

    let received = images.len();
    tracing::info!(style = %style, received, "开始处理图片批次");

    let results =
        pipeline::process_batch(&state.generator, api_key, style, images, state.max_parallel)
            .await;

    if results.is_empty() {
        tracing::warn!(style = %style, received, "全部图片处理失败");
        return Err(AppError::Processing(
            "No images could be processed successfully".to_string(),
        ));
    }

    let succeeded = results.len();
    let zip = tokio::task::spawn_blocking(move || archive::build_zip(&results)).await??;
    tracing::info!(
        style = %style,
        received,
        succeeded,
        zip_bytes = zip.len(),
        "图片批次处理完成"
    );

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        style.archive_filename()
    ))
    .map_err(|e| AppError::Internal(format!("构造 Content-Disposition 失败: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/zip"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        zip,
    )
        .into_response())
}

/// 读取全部表单字段。
///
/// 未知字段被忽略；`prompt` 重复时取第一个。没有文件名的 `images` 部分视为未选择文件，
/// 但仍占用序号，因此输出名中的序号是该部分在全部 `images` 部分中的位置。
async fn read_form(mut multipart: Multipart) -> Result<ImageForm, AppError> {
    let mut form = ImageForm::default();
    let mut position = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("prompt") if form.prompt.is_none() => {
                form.prompt = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("images") => {
                position += 1;
                let Some(filename) = field.file_name().filter(|n| !n.is_empty()) else {
                    continue;
                };
                let filename = filename.to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                form.images.push(UploadedImage {
                    index: position,
                    filename,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the upload limit".to_string())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

fn validate_style(prompt: Option<&str>) -> Result<Style, AppError> {
    match prompt {
        None | Some("") => Err(AppError::Validation(format!(
            "No prompt selected. Please choose one of: {}",
            Style::options_list()
        ))),
        Some(raw) => raw.parse::<Style>().map_err(|_| {
            AppError::Validation(format!(
                "Invalid prompt selected. Available options: {}",
                Style::options_list()
            ))
        }),
    }
}

fn validate_images(
    images: Vec<UploadedImage>,
    max_images: usize,
) -> Result<Vec<UploadedImage>, AppError> {
    if images.is_empty() {
        return Err(AppError::Validation("No images provided".to_string()));
    }
    if max_images > 0 && images.len() > max_images {
        return Err(AppError::Validation(format!(
            "Too many images: {} uploaded, at most {} allowed",
            images.len(),
            max_images
        )));
    }
    Ok(images)
}

pub fn create_coloring_router() -> Router<AppState> {
    Router::<AppState>::new().route("/process-images", post(process_images))
}
