//! 评分结果规范化
//!
//! 把评分服务返回的多形态 `analysis` 转换为统一的 `GradeView`。

pub mod fields;
pub mod markdown;
pub mod view;

pub use view::{normalize, normalize_value, BatchResult, GradeView};
