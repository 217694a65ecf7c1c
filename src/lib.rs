//! # Grade Portal
//!
//! 评分服务客户端：提交仓库链接与评分标准，把评分结果归一化为展示模型
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（网络连接、持久化存储），只暴露能力
//! - `Transport` - 唯一的网络出口，`ReqwestTransport` 为默认实现
//! - `KeyValueStorage` - 令牌的持久化后端
//! - `AbortSignal` / `RequestSlot` - 显式取消信号
//!
//! ### ② 客户端层（Clients）
//! - `TokenStore` - 进程内唯一的令牌持有者
//! - `HttpClient` - 拼接地址、附加鉴权、解析响应、统一错误
//!
//! ### ③ 业务能力层（Services）
//! - `UsersService` / `AuthService` / `GradingService` - 类型化的接口定义
//!
//! ### ④ 状态与流程层（Hooks / Workflow）
//! - `ApiHook` - `{data, error, loading}` 状态容器，新请求取代旧请求
//! - `UsersHook` - 用户列表 + 乐观插入
//! - `SubmissionFlow` - 校验 → 提交 → 归一化
//!
//! ### ⑤ 归一化（Normalize）
//! - `normalize` - 把多形态的 `analysis` 转换为 `GradeView`
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod hooks;
pub mod infrastructure;
pub mod models;
pub mod normalize;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::{App, Command};
pub use clients::{HttpClient, RequestOptions, TokenStore};
pub use config::Config;
pub use error::{ApiError, ClientError, ClientResult, ResponseBody, ValidationError};
pub use hooks::{ApiHook, HookOptions, HookState, UsersHook};
pub use infrastructure::{AbortSignal, ReqwestTransport, Transport};
pub use models::{GradeForm, GradeRequest, GradeResponse, User};
pub use normalize::{normalize, normalize_value, BatchResult, GradeView};
pub use services::{AuthService, GradingService, UsersService};
pub use workflow::SubmissionFlow;
