//! 单个批次对象的字段提取
//!
//! 缺失或类型不对的字段一律当作不存在，绝不报错。

use phf::phf_set;
use serde_json::{Map, Value as JsonValue};

/// 不进入 `extra_fields` 的保留键
pub static RESERVED_KEYS: phf::Set<&'static str> = phf_set! {
    "rubric_score",
    "hundred_point_score",
    "review",
    "file_name",
    "batch_number",
    "files_analyzed",
    "success",
};

/// 从批次对象中提取出的字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchFields {
    pub file_names: Vec<String>,
    pub rubric_score_text: Option<String>,
    pub hundred_point_score: Option<f64>,
    pub review_text: Option<String>,
    pub extra_fields: Map<String, JsonValue>,
}

/// 提取已知字段，其余非保留键原样保留
pub fn extract(map: &Map<String, JsonValue>) -> BatchFields {
    let file_names = map
        .get("file_name")
        .map(string_list)
        .filter(|names| !names.is_empty())
        .or_else(|| map.get("files_analyzed").map(string_list))
        .unwrap_or_default();

    let rubric_score_text = map.get("rubric_score").and_then(|v| match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let extra_fields = map
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    BatchFields {
        file_names,
        rubric_score_text,
        hundred_point_score: map.get("hundred_point_score").and_then(coerce_score),
        review_text: map.get("review").and_then(|v| v.as_str()).map(str::to_string),
        extra_fields,
    }
}

/// 把分数字段转换为有限浮点数
///
/// 接受数字和可解析为数字的字符串（如 `"85"`）；`"N/A"`、布尔值、NaN/无穷等返回 `None`。
pub fn coerce_score(value: &JsonValue) -> Option<f64> {
    let score = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    score.is_finite().then_some(score)
}

/// 四舍五入到两位小数
///
/// 放大后溢出的极大值原样返回。
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        value
    }
}

/// 有限值的算术平均；总和溢出时逐项先除再加
pub fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let count = scores.len() as f64;
    let total: f64 = scores.iter().sum();
    if total.is_finite() {
        Some(total / count)
    } else {
        Some(scores.iter().map(|s| s / count).sum())
    }
}

/// 字符串或字符串数组；数组中的非字符串元素被跳过
fn string_list(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::String(s) => vec![s.clone()],
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
