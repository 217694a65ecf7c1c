//! 评分结果的 Markdown 渲染

use serde_json::Value as JsonValue;

use super::view::BatchResult;

/// 没有 analysis 时的占位文本
pub const NO_ANALYSIS_PLACEHOLDER: &str = "_No analysis was returned by the grading service._";

/// 批次之间的分隔线
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// 渲染多批次结果；`final_score` 为 (平均分, 参与批次数)
pub fn render_batches(batches: &[BatchResult], final_score: Option<(f64, usize)>) -> String {
    let mut sections: Vec<String> = batches
        .iter()
        .map(|batch| {
            let mut parts = vec![batch_heading(batch)];
            parts.extend(field_lines(batch));
            parts.join("\n\n")
        })
        .collect();

    if let Some((mean, count)) = final_score {
        let noun = if count == 1 { "batch" } else { "batches" };
        sections.push(format!(
            "## Final Score\n\n**{:.2}/100** (average of {} {})",
            mean, count, noun
        ));
    }

    sections.join(SECTION_SEPARATOR)
}

/// 渲染单个对象结果（无批次标题）
pub fn render_single(batch: &BatchResult) -> String {
    let mut parts = field_lines(batch);
    if let Some(score) = batch.hundred_point_score {
        parts.push(format!("## Final Score\n\n**{:.2}/100**", score));
    }
    if parts.is_empty() {
        NO_ANALYSIS_PLACEHOLDER.to_string()
    } else {
        parts.join("\n\n")
    }
}

fn batch_heading(batch: &BatchResult) -> String {
    if batch.file_names.is_empty() {
        format!("## Batch {}", batch.index)
    } else {
        format!("## Batch {}: {}", batch.index, batch.file_names.join(", "))
    }
}

/// 分数行、得分行、评语段、额外字段
fn field_lines(batch: &BatchResult) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(rubric_score) = &batch.rubric_score_text {
        lines.push(format!("**Rubric Score:** {}", rubric_score));
    }
    if let Some(points) = batch.hundred_point_score {
        lines.push(format!("**Points:** {}/100", format_points(points)));
    }
    if let Some(review) = &batch.review_text {
        lines.push(format!("### Review\n\n{}", review));
    }
    for (key, value) in &batch.extra_fields {
        lines.push(format!("**{}:** {}", humanize(key), display_value(value)));
    }

    lines
}

fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        points.to_string()
    }
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `overall_score` -> `Overall Score`
fn humanize(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
