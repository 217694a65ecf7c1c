use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "grade_portal.toml";

/// 程序配置
///
/// 进程启动时解析一次，之后只读。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// 评分服务 API 基础地址；为空表示"未配置"
    pub api_base_url: String,
    /// 令牌在持久化存储中的键名
    pub auth_storage_key: String,
    /// 令牌存储文件路径
    pub token_store_path: String,
    /// 单次请求超时（秒），0 表示不限制
    pub request_timeout_secs: u64,
    /// 日志过滤规则（`RUST_LOG` 优先）
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            auth_storage_key: "authToken".to_string(),
            token_store_path: ".grade_portal_storage.json".to_string(),
            request_timeout_secs: 300,
            log_filter: "info".to_string(),
        }
    }
}

/// TOML 配置文件中的字段，全部可选
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    auth_storage_key: Option<String>,
    token_store_path: Option<String>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

impl Config {
    /// 从环境变量解析配置
    pub fn from_env() -> Self {
        Self::default().overlay_vars(|name| std::env::var(name).ok()).finish()
    }

    /// 加载配置：先读 TOML 文件（`GRADE_CONFIG_FILE` 或默认文件，存在时），再用环境变量覆盖
    pub fn load() -> Result<Self> {
        let path = std::env::var("GRADE_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        if !Path::new(&path).exists() {
            debug!("配置文件 {} 不存在，使用默认值", path);
            return Ok(Self::from_env());
        }
        let base = Self::from_toml_file(&path)?;
        Ok(base.overlay_vars(|name| std::env::var(name).ok()).finish())
    }

    /// 从 TOML 文件读取配置（未出现的字段取默认值）
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("无法读取配置文件: {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("无法解析配置文件: {}", path))
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            auth_storage_key: file.auth_storage_key.unwrap_or(default.auth_storage_key),
            token_store_path: file.token_store_path.unwrap_or(default.token_store_path),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(default.request_timeout_secs),
            log_filter: file.log_filter.unwrap_or(default.log_filter),
        })
    }

    /// 用变量表覆盖当前配置
    pub fn overlay_vars<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_base_url: lookup("GRADE_API_BASE_URL").unwrap_or(self.api_base_url),
            auth_storage_key: lookup("GRADE_AUTH_STORAGE_KEY")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(self.auth_storage_key),
            token_store_path: lookup("GRADE_TOKEN_STORE_PATH").unwrap_or(self.token_store_path),
            request_timeout_secs: lookup("GRADE_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.request_timeout_secs),
            log_filter: lookup("GRADE_LOG_FILTER").unwrap_or(self.log_filter),
        }
    }

    /// 规范化：去掉基础地址首尾空白和末尾斜杠
    pub fn finish(mut self) -> Self {
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        self
    }

    /// 未配置基础地址时输出告警（非致命）
    ///
    /// 需在日志初始化之后调用；返回是否发出了告警。
    pub fn warn_if_unconfigured(&self) -> bool {
        if self.is_configured() {
            return false;
        }
        warn!("GRADE_API_BASE_URL 未设置，所有 API 请求将失败，直到完成配置");
        true
    }

    /// 是否已配置 API 基础地址
    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }
}
