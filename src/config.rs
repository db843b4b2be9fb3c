use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 凭证所在的环境变量名
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 默认日志过滤（`RUST_LOG` 存在时以其为准）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "coloring_book_backend=info,tower_http=info".to_string(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API 路由前缀
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_origins")]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_methods")]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_headers")]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表
    #[serde(default = "CorsConfig::default_expose_headers")]
    pub expose_headers: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    fn default_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    fn default_methods() -> Vec<String> {
        ["GET", "POST", "OPTIONS"].map(String::from).to_vec()
    }

    fn default_headers() -> Vec<String> {
        vec!["Content-Type".to_string()]
    }

    fn default_expose_headers() -> Vec<String> {
        // 前端需要读取下载文件名
        vec!["Content-Disposition".to_string()]
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: Self::default_origins(),
            allowed_methods: Self::default_methods(),
            allowed_headers: Self::default_headers(),
            expose_headers: Self::default_expose_headers(),
            max_age_secs: None,
        }
    }
}

/// 外部图像生成服务配置（OpenAI 兼容接口）
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// 接口基地址（不含 `/v1/...`）
    #[serde(default = "OpenAiConfig::default_base_url")]
    pub base_url: String,
    /// API 凭证；缺省时读取 `OPENAI_API_KEY`
    #[serde(default = "OpenAiConfig::default_api_key", skip_serializing)]
    pub api_key: Option<String>,
    /// 生成模型
    #[serde(default = "OpenAiConfig::default_model")]
    pub model: String,
    /// 输出分辨率
    #[serde(default = "OpenAiConfig::default_size")]
    pub size: String,
    /// 输出质量
    #[serde(default = "OpenAiConfig::default_quality")]
    pub quality: String,
    /// 生成请求超时（秒）
    #[serde(default = "OpenAiConfig::default_generate_timeout")]
    pub generate_timeout_secs: u64,
    /// 结果下载超时（秒）
    #[serde(default = "OpenAiConfig::default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// 单张结果图片下载上限（字节）
    #[serde(default = "OpenAiConfig::default_max_download_bytes")]
    pub max_download_bytes: usize,
}

impl OpenAiConfig {
    fn default_base_url() -> String {
        "https://api.openai.com".to_string()
    }
    fn default_api_key() -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
    fn default_model() -> String {
        "gpt-image-1".to_string()
    }
    fn default_size() -> String {
        "1024x1024".to_string()
    }
    fn default_quality() -> String {
        "standard".to_string()
    }
    fn default_generate_timeout() -> u64 {
        60
    }
    fn default_fetch_timeout() -> u64 {
        30
    }
    fn default_max_download_bytes() -> usize {
        64 * 1024 * 1024
    }

    /// 生成请求超时
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    /// 结果下载超时
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: Self::default_api_key(),
            model: Self::default_model(),
            size: Self::default_size(),
            quality: Self::default_quality(),
            generate_timeout_secs: Self::default_generate_timeout(),
            fetch_timeout_secs: Self::default_fetch_timeout(),
            max_download_bytes: Self::default_max_download_bytes(),
        }
    }
}

// 手写 Debug，避免凭证进入日志
impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("size", &self.size)
            .field("quality", &self.quality)
            .field("generate_timeout_secs", &self.generate_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("max_download_bytes", &self.max_download_bytes)
            .finish()
    }
}

/// 上传限制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 单次请求体上限（字节）
    #[serde(default = "UploadConfig::default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// 单次请求最多图片数（0=不限制）
    #[serde(default = "UploadConfig::default_max_images")]
    pub max_images: usize,
}

impl UploadConfig {
    fn default_max_body_bytes() -> usize {
        64 * 1024 * 1024
    }
    fn default_max_images() -> usize {
        20
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: Self::default_max_body_bytes(),
            max_images: Self::default_max_images(),
        }
    }
}

/// 批处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// 单请求内同时处理的图片数（1=严格串行）
    #[serde(default = "ProcessingConfig::default_max_parallel")]
    pub max_parallel: usize,
}

impl ProcessingConfig {
    fn default_max_parallel() -> usize {
        4
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_parallel: Self::default_max_parallel(),
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        // 需覆盖一次完整的生成 + 下载
        95
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 外部图像生成服务配置
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// 上传限制
    #[serde(default)]
    pub upload: UploadConfig,
    /// 批处理配置
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可缺省），支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path).required(false))
            // 环境变量覆盖，例如：APP_SERVER__PORT、APP_OPENAI__BASE_URL
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 日志初始化后输出关键配置（不含凭证）
    pub fn log_summary(&self) {
        tracing::info!(
            config_file = ?Self::get_config_path(),
            base_url = %self.openai.base_url,
            model = %self.openai.model,
            max_parallel = self.processing.max_parallel,
            max_images = self.upload.max_images,
            "配置加载完成"
        );
        if self.openai.api_key.is_none() {
            tracing::warn!(
                "未配置 {}，/process-images 将返回配置错误",
                API_KEY_ENV
            );
        }
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<&'static AppConfig, ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(Self::global())
    }

    /// 获取配置文件路径（`APP_CONFIG_FILE` 可覆盖）
    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_generation_contract() {
        let cfg = OpenAiConfig::default();
        assert_eq!(cfg.model, "gpt-image-1");
        assert_eq!(cfg.size, "1024x1024");
        assert_eq!(cfg.quality, "standard");
        assert_eq!(cfg.generate_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.max_download_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn debug_output_masks_api_key() {
        let cfg = OpenAiConfig {
            api_key: Some("sk-secret-value".to_string()),
            ..OpenAiConfig::default()
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("sk-secret-value"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn partial_toml_falls_back_to_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [openai]
            base_url = "http://127.0.0.1:9999"
            api_key = "sk-test"
        "#;
        let cfg: AppConfig = ConfigBuilder::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("deserialize config");

        assert_eq!(cfg.server_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.openai.base_url, "http://127.0.0.1:9999");
        assert_eq!(cfg.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.openai.model, "gpt-image-1");
        assert_eq!(cfg.api.prefix, "/api");
        assert!(cfg.cors.enabled);
        assert_eq!(cfg.cors.allowed_origins, vec!["*".to_string()]);
        assert_eq!(cfg.processing.max_parallel, 4);
    }
}
