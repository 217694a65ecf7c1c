//! 评分提交流程 - 流程层
//!
//! 流程顺序：
//! 1. 本地校验表单（失败则不发任何请求）
//! 2. 通过评分 hook 提交（新提交会取消上一次未完成的提交）
//! 3. 归一化为 `GradeView`

use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};
use crate::hooks::{ApiHook, HookOptions, HookState};
use crate::infrastructure::AbortSignal;
use crate::models::{GradeForm, GradeRequest};
use crate::normalize::GradeView;
use crate::services::GradingService;

/// 评分提交流程
///
/// - 只依赖业务能力（`GradingService`）
/// - 持有一个手动触发的 hook，最近一次提交的结果留在 hook 状态里
pub struct SubmissionFlow {
    hook: ApiHook<GradeRequest, GradeView>,
}

impl SubmissionFlow {
    pub fn new(grading: GradingService) -> Self {
        let hook = ApiHook::new(
            GradeRequest::default(),
            HookOptions::manual(),
            move |request: GradeRequest, signal: AbortSignal| {
                let grading = grading.clone();
                async move { grading.grade_view(&request, signal).await }
            },
        );
        Self { hook }
    }

    /// 提交表单
    ///
    /// # 返回
    /// - 校验失败：`ClientError::Validation`，不产生网络请求
    /// - 被更新的提交取代：`ClientError::Cancelled`
    pub async fn submit(&self, form: &GradeForm) -> ClientResult<GradeView> {
        let request = form.validate().map_err(|e| {
            warn!("⚠️ 表单校验失败: {}", e);
            ClientError::Validation(e)
        })?;

        let view = self.hook.execute(request).await?;
        info!(
            "✓ {}，{} 个批次，平均分 {}",
            view.status_text,
            view.batches.len(),
            view.aggregate_score
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "无".to_string())
        );
        Ok(view)
    }

    /// 最近一次提交的状态
    pub fn state(&self) -> HookState<GradeView> {
        self.hook.state()
    }

    /// 取消进行中的提交，并停止接收结果
    pub fn dispose(&self) {
        self.hook.dispose();
    }
}
