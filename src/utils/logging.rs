/// 日志工具模块
///
/// 负责初始化 tracing 订阅器，并提供会话横幅等输出辅助函数
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::normalize::GradeView;

/// 初始化全局日志
///
/// `RUST_LOG` 优先，其次使用传入的过滤规则；规则非法时退回 `info`。
/// 重复调用是安全的，只有第一次生效。
///
/// # 返回
/// 本次调用是否完成了初始化
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt = fmt::layer().without_time().with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt)
        .try_init()
        .is_ok()
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 grade_portal 启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    if config.is_configured() {
        info!("🌐 API 地址: {}", config.api_base_url);
    } else {
        info!("🌐 API 地址: (未配置)");
        config.warn_if_unconfigured();
    }
    info!("🔑 令牌存储: {} [{}]", config.token_store_path, config.auth_storage_key);
    info!("{}", "=".repeat(60));
}

/// 记录评分结果摘要
pub fn log_grade_summary(view: &GradeView) {
    info!("\n{}", "─".repeat(60));
    info!("📊 {}", view.status_text);
    if let Some(error) = &view.error_message {
        info!("❌ 错误: {}", error);
    }
    for batch in &view.batches {
        let files = if batch.file_names.is_empty() {
            "-".to_string()
        } else {
            batch.file_names.join(", ")
        };
        let score = batch
            .hundred_point_score
            .map(|s| format!("{}/100", s))
            .unwrap_or_else(|| "无分数".to_string());
        info!("  📦 批次 {} [{}] {}", batch.index, truncate_text(&files, 40), score);
    }
    if let Some(score) = view.aggregate_score {
        info!("✅ 平均分: {:.2}/100 (共 {} 个批次)", score, view.scored_batch_count());
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
