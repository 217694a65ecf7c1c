//! 异步请求 Hook 层
//!
//! 把任意 service 调用包装成可观察的 `{data, error, loading}` 状态，
//! 并保证同一实例上只有最新的请求结果能落地。

pub mod api_hook;
pub mod users_hook;

pub use api_hook::{ApiHook, HookListener, HookOperation, HookOptions, HookState};
pub use users_hook::UsersHook;
