//! HTTP 传输层 - 基础设施层
//!
//! 持有唯一的 `reqwest::Client`，只暴露"发送一个请求"的能力：
//! 不认识 token、不解析 JSON、不判断状态码。

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// 待发送的请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// 收到的原始响应
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    /// `Content-Type` 头（如有）
    pub content_type: Option<String>,
    /// 原始响应文本
    pub body: String,
}

impl TransportResponse {
    /// 响应是否声明为 JSON
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false)
    }
}

/// 传输能力
///
/// 网络失败返回 `ClientError::Transport`；任何状态码的响应都算发送成功。
pub trait Transport: Send + Sync {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, ClientResult<TransportResponse>>;
}

/// 基于 reqwest 的传输实现
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// 创建传输层；`timeout` 为 `None` 时不限制单次请求时长
    pub fn new(timeout: Option<Duration>) -> ClientResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Configuration(format!("无法创建 HTTP 客户端: {}", e)))?;
        Ok(Self { client })
    }

    /// 使用已有的 reqwest 客户端
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, ClientResult<TransportResponse>> {
        Box::pin(async move {
            debug!("{} {}", request.method, request.url);

            let mut builder = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            debug!("响应状态: {}，长度: {} 字节", status, body.len());

            Ok(TransportResponse {
                status,
                content_type,
                body,
            })
        })
    }
}
