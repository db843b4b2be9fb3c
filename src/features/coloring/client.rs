use axum::body::Bytes;
use base64::{Engine as _, engine::general_purpose};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::{API_KEY_ENV, OpenAiConfig};
use crate::error::{AppError, GenerationError};

use super::models::UploadedImage;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 上游错误响应写入日志时的最大字符数
const UPSTREAM_BODY_LOG_CHARS: usize = 512;

/// 读取上游错误响应体的字节上限（UTF-8 下足够覆盖日志字符数）
const UPSTREAM_BODY_READ_BYTES: usize = UPSTREAM_BODY_LOG_CHARS * 4;

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    image: String,
    size: &'a str,
    quality: &'a str,
    response_format: &'static str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedItem>,
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    #[serde(default)]
    url: Option<String>,
}

/// 外部图像生成服务客户端（OpenAI images API 兼容）。
///
/// 生成与下载分别使用独立超时的 `reqwest::Client`；两者都可跨请求复用。
#[derive(Clone)]
pub struct ImageGenerationClient {
    generate_client: reqwest::Client,
    fetch_client: reqwest::Client,
    generations_url: String,
    api_key: Option<String>,
    model: String,
    size: String,
    quality: String,
    max_download_bytes: usize,
}

impl ImageGenerationClient {
    pub fn new(cfg: &OpenAiConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let generate_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(cfg.generate_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("初始化生成 HTTP Client 失败: {e}")))?;
        let fetch_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(cfg.fetch_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("初始化下载 HTTP Client 失败: {e}")))?;

        Ok(Self {
            generate_client,
            fetch_client,
            generations_url: format!(
                "{}/v1/images/generations",
                cfg.base_url.trim_end_matches('/')
            ),
            // 空白凭证与缺失等价，不能带着空 Bearer 外呼
            api_key: cfg
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            model: cfg.model.clone(),
            size: cfg.size.clone(),
            quality: cfg.quality.clone(),
            max_download_bytes: cfg.max_download_bytes,
        })
    }

    /// 返回凭证；缺失时为配置错误（调用方应在任何外呼之前检查）。
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("{} 未配置，拒绝处理图片请求", API_KEY_ENV);
            AppError::Configuration("OpenAI API key not configured".to_string())
        })
    }

    /// 单张图片的完整链路：生成 -> 下载结果。
    pub async fn render(
        &self,
        api_key: &str,
        prompt: &str,
        image: &UploadedImage,
    ) -> Result<Bytes, GenerationError> {
        let url = self.generate(api_key, prompt, image).await?;
        self.download(&url).await
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        image: &UploadedImage,
    ) -> Result<String, GenerationError> {
        let payload = GenerationRequest {
            model: &self.model,
            prompt,
            image: data_url(image),
            size: &self.size,
            quality: &self.quality,
            response_format: "url",
            n: 1,
        };

        let response = self
            .generate_client
            .post(&self.generations_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_prefix(response, UPSTREAM_BODY_READ_BYTES).await;
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(UPSTREAM_BODY_LOG_CHARS)
                    .collect(),
            });
        }

        let parsed: GenerationResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .and_then(|item| item.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| GenerationError::InvalidResponse("响应中缺少 data[0].url".to_string()))
    }

    async fn download(&self, url: &str) -> Result<Bytes, GenerationError> {
        let response = self.fetch_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Download(format!("HTTP {status}")));
        }

        let max_bytes = self.max_download_bytes;
        // 先按 Content-Length 快速拒绝（缺失或不可信时仍由流式累计兜底）
        if let Some(content_len) = response.content_length()
            && content_len > max_bytes as u64
        {
            return Err(GenerationError::Download(format!(
                "结果过大: content-length={content_len} 超过上限 {max_bytes}"
            )));
        }

        let mut stream = response.bytes_stream();
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if out.len().saturating_add(chunk.len()) > max_bytes {
                return Err(GenerationError::Download(format!(
                    "结果过大: 超过上限 {max_bytes} 字节"
                )));
            }
            out.extend_from_slice(&chunk);
        }

        if out.is_empty() {
            return Err(GenerationError::Download("结果为空".to_string()));
        }
        Ok(Bytes::from(out))
    }
}

/// 读取响应体的前 `limit` 字节；读取出错时返回已读部分。
async fn read_prefix(response: reqwest::Response, limit: usize) -> Vec<u8> {
    let mut stream = response.bytes_stream();
    let mut out = Vec::new();
    while out.len() < limit {
        match stream.next().await {
            Some(Ok(chunk)) => {
                let take = chunk.len().min(limit - out.len());
                out.extend_from_slice(&chunk[..take]);
            }
            _ => break,
        }
    }
    out
}

/// `data:image/{subtype};base64,{payload}`
fn data_url(image: &UploadedImage) -> String {
    format!(
        "data:image/{};base64,{}",
        image.format().subtype(),
        general_purpose::STANDARD.encode(&image.data)
    )
}
