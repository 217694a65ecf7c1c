//! 取消信号
//!
//! 每次请求携带一个显式的 `AbortSignal`，从 service 一路传到 transport，
//! 在 transport 边界检查。`RequestSlot` 实现"新请求取代旧请求"的策略。

use futures::future::{AbortHandle, AbortRegistration, Abortable, Aborted};
use std::future::Future;
use std::sync::Mutex;

/// 取消信号（一次性）
///
/// 由 `AbortHandle` 控制；`none()` 表示不可取消。
#[derive(Debug, Default)]
pub struct AbortSignal {
    registration: Option<AbortRegistration>,
}

impl AbortSignal {
    /// 不可取消的信号
    pub fn none() -> Self {
        Self { registration: None }
    }

    /// 创建一对控制句柄和信号
    pub fn new_pair() -> (AbortHandle, Self) {
        let (handle, registration) = AbortHandle::new_pair();
        (
            handle,
            Self {
                registration: Some(registration),
            },
        )
    }

    /// 是否可被取消
    pub fn is_abortable(&self) -> bool {
        self.registration.is_some()
    }

    /// 在信号控制下运行 future
    ///
    /// 若句柄在 future 首次轮询前已被 abort，则 future 根本不会执行。
    pub async fn run<F: Future>(self, fut: F) -> Result<F::Output, Aborted> {
        match self.registration {
            Some(registration) => Abortable::new(fut, registration).await,
            None => Ok(fut.await),
        }
    }
}

/// 请求槽：同一调用点上只允许一个存活请求
#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Mutex<Option<AbortHandle>>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消槽内旧请求，并为新请求签发信号
    pub fn supersede(&self) -> AbortSignal {
        let (handle, signal) = AbortSignal::new_pair();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        signal
    }

    /// 取消槽内请求（如果有）
    pub fn abort(&self) {
        let current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = current {
            handle.abort();
        }
    }
}
