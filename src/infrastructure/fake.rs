//! 测试用的脚本化传输层

use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{Transport, TransportRequest, TransportResponse};
use crate::error::{ClientError, ClientResult};

/// 按顺序返回预设响应，并记录收到的请求
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<(Duration, ClientResult<TransportResponse>)>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, content_type: Option<&str>, body: &str) -> Self {
        self.reply_after(Duration::ZERO, status, content_type, body)
    }

    pub fn reply_json(self, status: u16, body: serde_json::Value) -> Self {
        self.reply(status, Some("application/json"), &body.to_string())
    }

    pub fn reply_after(self, delay: Duration, status: u16, content_type: Option<&str>, body: &str) -> Self {
        let response = TransportResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        };
        self.replies.lock().unwrap().push_back((delay, Ok(response)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back((Duration::ZERO, Err(ClientError::Transport(message.to_string()))));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request was sent")
    }

    pub fn header(request: &TransportRequest, name: &str) -> Option<String> {
        request
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn has_content_type(request: &TransportRequest) -> bool {
        request.headers.contains_key(CONTENT_TYPE)
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: TransportRequest) -> BoxFuture<'_, ClientResult<TransportResponse>> {
        self.requests.lock().unwrap().push(request);
        let (delay, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| (Duration::ZERO, Err(ClientError::Transport("no scripted reply".to_string()))));
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply
        })
    }
}
