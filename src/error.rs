use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 服务端配置缺失（如外部服务凭证）
    #[error("{0}")]
    Configuration(String),

    /// 请求参数校验错误
    #[error("{0}")]
    Validation(String),

    /// 请求体超出上传上限
    #[error("{0}")]
    PayloadTooLarge(String),

    /// 批次内所有图片均处理失败
    #[error("{0}")]
    Processing(String),

    /// 内部服务器错误
    #[error("{0}")]
    Internal(String),
}

/// 单张图片在外部服务链路上的失败原因；只用于日志，不会直接返回给调用方。
#[derive(Error, Debug)]
pub enum GenerationError {
    /// 网络请求错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 上游请求超时（包含 connect/read 等阶段）
    #[error("请求超时")]
    Timeout,

    /// 生成接口返回非成功状态
    #[error("生成接口返回 {status}: {body}")]
    Upstream { status: u16, body: String },

    /// 生成接口响应结构不符合预期
    #[error("无效的响应: {0}")]
    InvalidResponse(String),

    /// 结果图片下载失败
    #[error("结果下载失败: {0}")]
    Download(String),
}

/// 错误响应体：`error` 字段承载面向用户的信息。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// 人类可读的错误信息
    #[schema(example = "No images provided")]
    pub error: String,

    /// 稳定的错误码，用于程序化处理
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Processing(_) => "PROCESSING_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 内部错误细节只进日志
        let message = match &self {
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "内部错误");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: message,
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(body).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else if err.is_decode() {
            GenerationError::InvalidResponse(err.to_string())
        } else {
            GenerationError::Network(err.to_string())
        }
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Internal(format!("打包 zip 失败: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("后台任务失败: {err}"))
    }
}
