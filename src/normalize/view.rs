//! 评分结果 → 展示模型
//!
//! 纯函数，无 I/O；对任何 JSON 输入都不会失败。

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::fields::{extract, mean, round2, BatchFields};
use super::markdown::{render_batches, render_single, NO_ANALYSIS_PLACEHOLDER};
use crate::models::grade::{Analysis, GradeResponse};

/// 单个批次的规范化结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// 从 1 开始的批次序号
    pub index: usize,
    pub file_names: Vec<String>,
    pub rubric_score_text: Option<String>,
    pub hundred_point_score: Option<f64>,
    pub review_text: Option<String>,
    /// 非保留键，原样展示
    pub extra_fields: Map<String, JsonValue>,
}

impl BatchResult {
    fn empty(index: usize) -> Self {
        Self::from_fields(index, BatchFields::default())
    }

    fn from_text(index: usize, text: &str) -> Self {
        Self {
            review_text: Some(text.to_string()),
            ..Self::empty(index)
        }
    }

    fn from_fields(index: usize, fields: BatchFields) -> Self {
        Self {
            index,
            file_names: fields.file_names,
            rubric_score_text: fields.rubric_score_text,
            hundred_point_score: fields.hundred_point_score,
            review_text: fields.review_text,
            extra_fields: fields.extra_fields,
        }
    }
}

/// 评分结果展示模型
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeView {
    pub status_text: String,
    pub is_success: bool,
    pub error_message: Option<String>,
    pub batches: Vec<BatchResult>,
    /// 至少一个批次给出有效分数时才存在；为这些分数的平均值（两位小数）
    pub aggregate_score: Option<f64>,
    pub rendered_markdown: String,
}

impl GradeView {
    /// 参与平均分计算的批次数
    pub fn scored_batch_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.hundred_point_score.is_some())
            .count()
    }
}

/// 从原始 JSON 响应生成展示模型
pub fn normalize_value(raw: &JsonValue) -> GradeView {
    normalize(&GradeResponse::from_value(raw))
}

/// 从原始评分响应生成展示模型
pub fn normalize(response: &GradeResponse) -> GradeView {
    let (batches, aggregate_score, rendered_markdown) = match &response.analysis {
        Analysis::Absent => (Vec::new(), None, NO_ANALYSIS_PLACEHOLDER.to_string()),
        Analysis::Text(text) => (vec![BatchResult::from_text(1, text)], None, text.clone()),
        Analysis::Single(map) => {
            let batch = BatchResult::from_fields(1, extract(map));
            let aggregate = batch.hundred_point_score.map(round2);
            let markdown = render_single(&batch);
            (vec![batch], aggregate, markdown)
        }
        Analysis::Batches(items) => normalize_batches(items),
    };

    debug!(
        "评分结果规范化完成: {} 个批次, 总分 {:?}",
        batches.len(),
        aggregate_score
    );

    GradeView {
        status_text: status_text(response.success).to_string(),
        is_success: response.success,
        error_message: response.error.clone(),
        batches,
        aggregate_score,
        rendered_markdown,
    }
}

fn normalize_batches(items: &[JsonValue]) -> (Vec<BatchResult>, Option<f64>, String) {
    if items.is_empty() {
        return (Vec::new(), None, NO_ANALYSIS_PLACEHOLDER.to_string());
    }

    let batches: Vec<BatchResult> = items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            JsonValue::String(text) => BatchResult::from_text(i + 1, text),
            JsonValue::Object(map) => BatchResult::from_fields(i + 1, extract(map)),
            _ => BatchResult::empty(i + 1),
        })
        .collect();

    let scores: Vec<f64> = batches.iter().filter_map(|b| b.hundred_point_score).collect();
    let final_score = mean(&scores).map(|m| (round2(m), scores.len()));

    let markdown = render_batches(&batches, final_score);
    (batches, final_score.map(|(mean, _)| mean), markdown)
}

fn status_text(success: bool) -> &'static str {
    if success {
        "Grading complete"
    } else {
        "Grading failed"
    }
}
