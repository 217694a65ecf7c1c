//! 评分请求与原始评分响应
//!
//! 评分服务返回的 `analysis` 形状不固定（字符串 / 对象 / 数组），
//! 在这里一次性收敛为 `Analysis` 三种情形，之后的代码只做穷尽匹配。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ValidationError;

/// 提交给 `POST /grade` 的请求体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeRequest {
    pub github_link: String,
    /// 评分标准，原样转发给评分服务
    pub rubric: Map<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_results: Option<String>,
}

/// 提交表单的原始输入
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradeForm {
    pub github_link: String,
    /// 用户输入的评分标准文本（应为 JSON 对象）
    pub rubric_text: String,
    pub test_results: Option<String>,
}

impl GradeForm {
    pub fn new(github_link: impl Into<String>, rubric_text: impl Into<String>) -> Self {
        Self {
            github_link: github_link.into(),
            rubric_text: rubric_text.into(),
            test_results: None,
        }
    }

    pub fn with_test_results(mut self, test_results: impl Into<String>) -> Self {
        self.test_results = Some(test_results.into());
        self
    }

    /// 本地校验，通过后生成请求体
    ///
    /// 在发出任何网络请求之前调用。
    pub fn validate(&self) -> Result<GradeRequest, ValidationError> {
        let github_link = self.github_link.trim();
        if github_link.is_empty() {
            return Err(ValidationError::EmptyRepositoryLink);
        }

        let rubric = match serde_json::from_str::<JsonValue>(&self.rubric_text) {
            Ok(JsonValue::Object(map)) => map,
            Ok(_) => return Err(ValidationError::RubricNotObject),
            Err(e) => return Err(ValidationError::InvalidRubric(e.to_string())),
        };

        let test_results = self
            .test_results
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(GradeRequest {
            github_link: github_link.to_string(),
            rubric,
            test_results,
        })
    }
}

/// `analysis` 字段的三种形状（外加缺失）
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// 缺失或为 `null`
    Absent,
    /// 纯文本
    Text(String),
    /// 单个对象
    Single(Map<String, JsonValue>),
    /// 按批次的数组，元素为字符串或对象
    Batches(Vec<JsonValue>),
}

impl Analysis {
    /// 从任意 JSON 值识别形状，不会失败
    ///
    /// 数字和布尔值按文本处理。
    pub fn from_value(value: Option<&JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => Analysis::Absent,
            Some(JsonValue::String(text)) => Analysis::Text(text.clone()),
            Some(JsonValue::Array(items)) => Analysis::Batches(items.clone()),
            Some(JsonValue::Object(map)) => Analysis::Single(map.clone()),
            Some(other @ (JsonValue::Bool(_) | JsonValue::Number(_))) => Analysis::Text(other.to_string()),
        }
    }
}

/// 原始评分响应
#[derive(Debug, Clone, PartialEq)]
pub struct GradeResponse {
    pub success: bool,
    pub error: Option<String>,
    pub analysis: Analysis,
}

impl GradeResponse {
    /// 宽松解析评分响应
    ///
    /// - 对象：读取 `success` / `error` / `analysis`；缺少 `success` 时以是否有 `error` 推断
    /// - 其它形状：整体当作 `analysis`，视为成功
    pub fn from_value(value: &JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => {
                let error = map
                    .get("error")
                    .and_then(|v| v.as_str())
                    .filter(|e| !e.is_empty())
                    .map(str::to_string);
                let success = map
                    .get("success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(error.is_none());
                Self {
                    success,
                    error,
                    analysis: Analysis::from_value(map.get("analysis")),
                }
            }
            other => Self {
                success: true,
                error: None,
                analysis: Analysis::from_value(Some(other)),
            },
        }
    }
}
