//! 评分服务：`POST /grade`

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

use crate::clients::{HttpClient, RequestOptions};
use crate::error::ClientResult;
use crate::infrastructure::AbortSignal;
use crate::models::GradeRequest;
use crate::normalize::{normalize_value, GradeView};

/// 评分服务
#[derive(Clone)]
pub struct GradingService {
    client: Arc<HttpClient>,
}

impl GradingService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// 提交评分，返回原始 JSON 响应
    ///
    /// 响应形状由后端决定，不在这里做类型约束。
    pub async fn grade(&self, request: &GradeRequest, signal: AbortSignal) -> ClientResult<JsonValue> {
        info!("📤 提交评分: {}", request.github_link);
        self.client.post("/grade", request, RequestOptions::new().signal(signal)).await
    }

    /// 提交评分并归一化为展示模型
    pub async fn grade_view(&self, request: &GradeRequest, signal: AbortSignal) -> ClientResult<GradeView> {
        let raw = self.grade(request, signal).await?;
        Ok(normalize_value(&raw))
    }
}
