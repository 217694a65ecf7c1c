use serde_json::Value as JsonValue;
use thiserror::Error;

/// 客户端错误类型
///
/// 区分五类失败：配置缺失、HTTP 状态错误、网络失败、请求被取消、本地校验失败。
/// 调用方应当静默忽略 `Cancelled`。
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// 配置错误（例如未设置 API 基础地址）
    #[error("配置错误: {0}")]
    Configuration(String),
    /// 服务端返回非 2xx 响应
    #[error(transparent)]
    Api(#[from] ApiError),
    /// 网络层失败（连接失败、超时等）
    #[error("请求失败: {0}")]
    Transport(String),
    /// 请求被新的请求取代，或所属作用域已销毁
    #[error("请求已取消")]
    Cancelled,
    /// 本地校验失败，未发出任何网络请求
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// 请求体编码失败，或 2xx 响应体与期望类型不符
    #[error("序列化失败: {0}")]
    Serialization(String),
}

impl ClientError {
    /// 是否为取消（调用方应忽略，不作为失败展示）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }

    /// HTTP 状态码（仅 `Api` 错误有）
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// 面向用户的提示文本
    ///
    /// 取消返回 `None`，界面不应展示。
    pub fn user_message(&self) -> Option<String> {
        match self {
            ClientError::Configuration(msg) => Some(msg.clone()),
            ClientError::Api(e) => Some(e.message.clone()),
            ClientError::Transport(_) => Some("Request failed. Check your connection and try again.".to_string()),
            ClientError::Cancelled => None,
            ClientError::Validation(e) => Some(e.to_string()),
            ClientError::Serialization(_) => Some("The server returned an unexpected response.".to_string()),
        }
    }
}

/// 响应体
///
/// JSON 响应解析为 `Json`，其余（含空响应）保留为原始文本。
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(JsonValue),
    Text(String),
}

impl ResponseBody {
    /// 取 JSON 中字符串类型的 `detail` 字段
    pub fn detail(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(value) => value.get("detail").and_then(|v| v.as_str()),
            ResponseBody::Text(_) => None,
        }
    }

    /// 转换为 JSON 值（文本体转换为 JSON 字符串）
    pub fn into_json(self) -> JsonValue {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => JsonValue::String(text),
        }
    }
}

/// API 调用错误（非 2xx 响应）
#[derive(Debug, Clone, Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    /// 错误信息：优先 `detail` 字段，其次原始文本，最后状态短语
    pub message: String,
    /// HTTP 状态码
    pub status: u16,
    /// 完整响应体，供调用方检查
    pub payload: Option<ResponseBody>,
}

impl ApiError {
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// 本地校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 仓库链接为空
    #[error("Repository link is required.")]
    EmptyRepositoryLink,
    /// 评分标准不是合法 JSON
    #[error("Rubric is not valid JSON: {0}")]
    InvalidRubric(String),
    /// 评分标准是合法 JSON，但不是对象
    #[error("Rubric must be a JSON object.")]
    RubricNotObject,
}

/// 持久化存储错误
///
/// 只在 `infrastructure::storage` 与 `TokenStore` 之间流动，不会传播给调用方。
#[derive(Debug, Error)]
pub enum StorageError {
    /// 存储不可用（被禁用、沙箱限制等）
    #[error("存储不可用: {0}")]
    Unavailable(String),
    /// 读写失败
    #[error("存储读写失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 存储内容损坏
    #[error("存储内容无法解析 ({path}): {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 客户端结果类型
pub type ClientResult<T> = Result<T, ClientError>;
