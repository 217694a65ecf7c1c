//! 通用异步请求 Hook
//!
//! 把一个异步操作包装成可观察的 `{data, error, loading}` 状态：
//! - 同一个 hook 实例上只允许一个存活请求，新的 `execute` 会先取消旧请求
//! - 被取代或已销毁的请求永远不会写入状态，只返回 `ClientError::Cancelled`
//! - 状态锁只在同步片段内持有，不跨越 await

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::infrastructure::{AbortSignal, RequestSlot};

/// 被包装的异步操作：接收参数和取消信号
pub type HookOperation<A, T> = Arc<dyn Fn(A, AbortSignal) -> BoxFuture<'static, ClientResult<T>> + Send + Sync>;

/// 状态监听器
pub type HookListener<T> = Arc<dyn Fn(&HookState<T>) + Send + Sync>;

/// Hook 的可观察状态
#[derive(Debug, Clone)]
pub struct HookState<T> {
    pub data: Option<T>,
    pub error: Option<ClientError>,
    pub loading: bool,
}

/// Hook 选项
#[derive(Debug, Clone, Copy, Default)]
pub struct HookOptions {
    /// 首次 `mount()` 时自动执行一次
    pub immediate: bool,
}

impl HookOptions {
    pub fn immediate() -> Self {
        Self { immediate: true }
    }

    pub fn manual() -> Self {
        Self { immediate: false }
    }
}

struct HookInner<T> {
    state: HookState<T>,
    /// 每次 execute 递增；结果只在代数未变时落地
    generation: u64,
    mounted: bool,
    disposed: bool,
    listeners: Vec<HookListener<T>>,
}

/// 异步请求 Hook
pub struct ApiHook<A, T> {
    operation: HookOperation<A, T>,
    default_args: A,
    options: HookOptions,
    slot: RequestSlot,
    inner: Mutex<HookInner<T>>,
}

impl<A, T> ApiHook<A, T>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// 创建 hook
    ///
    /// # 参数
    /// - `default_args`: `execute_default()` / 立即模式使用的参数
    /// - `options`: 是否立即执行
    /// - `operation`: 被包装的异步操作
    pub fn new<F, Fut>(default_args: A, options: HookOptions, operation: F) -> Self
    where
        F: Fn(A, AbortSignal) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<T>> + Send + 'static,
    {
        let operation: HookOperation<A, T> = Arc::new(move |args, signal| operation(args, signal).boxed());
        Self {
            operation,
            default_args,
            options,
            slot: RequestSlot::new(),
            inner: Mutex::new(HookInner {
                state: HookState {
                    data: None,
                    error: None,
                    loading: options.immediate,
                },
                generation: 0,
                mounted: false,
                disposed: false,
                listeners: Vec::new(),
            }),
        }
    }

    /// 当前状态快照
    pub fn state(&self) -> HookState<T> {
        self.lock().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock().state.data.clone()
    }

    pub fn error(&self) -> Option<ClientError> {
        self.lock().state.error.clone()
    }

    pub fn loading(&self) -> bool {
        self.lock().state.loading
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// 订阅状态变化
    ///
    /// 监听器在锁外调用，可以安全地读取 hook。
    pub fn subscribe<L>(&self, listener: L)
    where
        L: Fn(&HookState<T>) + Send + Sync + 'static,
    {
        self.lock().listeners.push(Arc::new(listener));
    }

    /// 首次激活：立即模式下执行一次，之后的调用什么也不做
    pub async fn mount(&self) -> Option<ClientResult<T>> {
        let should_run = {
            let mut inner = self.lock();
            let first = !inner.mounted;
            inner.mounted = true;
            first && self.options.immediate && !inner.disposed
        };

        if should_run {
            Some(self.execute_default().await)
        } else {
            None
        }
    }

    /// 使用默认参数执行
    pub async fn execute_default(&self) -> ClientResult<T> {
        self.execute(self.default_args.clone()).await
    }

    /// 执行操作
    ///
    /// 先取消本 hook 上仍在进行的请求，再用新的取消信号发起请求。
    /// 成功返回数据，失败返回错误（同时写入状态）；被取代时返回 `Cancelled` 且不改状态。
    pub async fn execute(&self, args: A) -> ClientResult<T> {
        let (generation, signal) = {
            let mut inner = self.lock();
            if inner.disposed {
                return Err(ClientError::Cancelled);
            }
            inner.generation += 1;
            inner.state.loading = true;
            inner.state.error = None;
            // 在同一把锁内签发，保证代数与取消句柄一一对应
            let signal = self.slot.supersede();
            let generation = inner.generation;
            self.notify(inner);
            (generation, signal)
        };

        let result = (self.operation)(args, signal).await;

        let mut inner = self.lock();
        if inner.disposed || inner.generation != generation {
            debug!("请求已被取代或 hook 已销毁，丢弃结果 (第 {} 代)", generation);
            return Err(ClientError::Cancelled);
        }

        inner.state.loading = false;
        match result {
            Ok(data) => {
                inner.state.data = Some(data.clone());
                self.notify(inner);
                Ok(data)
            }
            Err(ClientError::Cancelled) => {
                self.notify(inner);
                Err(ClientError::Cancelled)
            }
            Err(e) => {
                debug!("请求失败: {}", e);
                inner.state.error = Some(e.clone());
                self.notify(inner);
                Err(e)
            }
        }
    }

    /// 直接替换数据（用于乐观更新）
    pub fn set_data(&self, data: Option<T>) {
        let mut inner = self.lock();
        inner.state.data = data;
        self.notify(inner);
    }

    /// 在已有数据上原地修改；没有数据时不做任何事并返回 `false`
    pub fn update_data<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut inner = self.lock();
        match inner.state.data.as_mut() {
            Some(data) => {
                update(data);
                self.notify(inner);
                true
            }
            None => false,
        }
    }

    /// 销毁：取消进行中的请求，此后任何结果都不再写入状态
    pub fn dispose(&self) {
        self.lock().disposed = true;
        self.slot.abort();
    }

    fn lock(&self) -> MutexGuard<'_, HookInner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 释放锁后通知监听器
    fn notify(&self, inner: MutexGuard<'_, HookInner<T>>) {
        if inner.listeners.is_empty() {
            return;
        }
        let snapshot = inner.state.clone();
        let listeners = inner.listeners.clone();
        drop(inner);
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl<A, T> Drop for ApiHook<A, T> {
    fn drop(&mut self) {
        self.slot.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    type Args = (u64, &'static str);

    /// 延迟后返回文本；遵守取消信号
    fn cooperative_hook() -> ApiHook<Args, String> {
        ApiHook::new((0, "default"), HookOptions::manual(), |(delay, value): Args, signal: AbortSignal| async move {
            let work = async move {
                sleep(Duration::from_millis(delay)).await;
                Ok(value.to_string())
            };
            match signal.run(work).await {
                Ok(result) => result,
                Err(_) => Err(ClientError::Cancelled),
            }
        })
    }

    /// 延迟后返回文本；忽略取消信号
    fn stubborn_hook() -> ApiHook<Args, String> {
        ApiHook::new((0, "default"), HookOptions::manual(), |(delay, value): Args, _signal: AbortSignal| async move {
            sleep(Duration::from_millis(delay)).await;
            Ok(value.to_string())
        })
    }

    fn count_settled(hook: &ApiHook<Args, String>) -> Arc<AtomicUsize> {
        let settled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&settled);
        hook.subscribe(move |state| {
            if !state.loading {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        settled
    }

    async fn run_slow_then_fast(hook: &ApiHook<Args, String>) -> (ClientResult<String>, ClientResult<String>) {
        tokio::join!(hook.execute((200, "slow")), async {
            sleep(Duration::from_millis(20)).await;
            hook.execute((0, "fast")).await
        })
    }

    #[tokio::test]
    async fn test_second_execute_supersedes_first() {
        let hook = cooperative_hook();
        let settled = count_settled(&hook);

        let (first, second) = run_slow_then_fast(&hook).await;

        assert!(first.unwrap_err().is_cancelled());
        assert_eq!(second.unwrap(), "fast");
        let state = hook.state();
        assert_eq!(state.data.as_deref(), Some("fast"));
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_result_is_discarded_even_if_operation_ignores_signal() {
        let hook = stubborn_hook();
        let settled = count_settled(&hook);

        let (first, second) = run_slow_then_fast(&hook).await;

        assert!(first.unwrap_err().is_cancelled());
        assert_eq!(second.unwrap(), "fast");
        assert_eq!(hook.data().as_deref(), Some("fast"));
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_is_stored_and_cleared_on_next_execute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook: ApiHook<(), String> = ApiHook::new((), HookOptions::manual(), move |_, _signal| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ClientError::Api(ApiError {
                        message: "grader crashed".to_string(),
                        status: 500,
                        payload: None,
                    }))
                } else {
                    Ok("recovered".to_string())
                }
            }
        });

        let err = hook.execute(()).await.unwrap_err();
        assert_eq!(err.http_status(), Some(500));
        assert_eq!(hook.error().and_then(|e| e.http_status()), Some(500));
        assert!(!hook.loading());

        assert_eq!(hook.execute(()).await.unwrap(), "recovered");
        assert!(hook.error().is_none());
    }

    #[tokio::test]
    async fn test_immediate_mount_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook: ApiHook<u32, u32> = ApiHook::new(7, HookOptions::immediate(), move |n, _signal| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(n * 2) }
        });

        assert!(hook.loading());
        assert_eq!(hook.mount().await.map(|r| r.unwrap()), Some(14));
        assert!(hook.mount().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hook.data(), Some(14));
    }

    #[tokio::test]
    async fn test_manual_mount_does_nothing() {
        let hook = cooperative_hook();
        assert!(!hook.loading());
        assert!(hook.mount().await.is_none());
        assert_eq!(hook.data(), None);
    }

    #[tokio::test]
    async fn test_dispose_cancels_in_flight_request() {
        let hook = cooperative_hook();

        let (result, ()) = tokio::join!(hook.execute((200, "late")), async {
            sleep(Duration::from_millis(20)).await;
            hook.dispose();
        });

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(hook.data(), None);
        assert!(hook.is_disposed());
        assert!(hook.execute((0, "after")).await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_set_and_update_data() {
        let hook: ApiHook<(), Vec<u32>> = ApiHook::new((), HookOptions::manual(), |_, _signal| async { Ok(vec![2, 3]) });

        assert!(!hook.update_data(|items| items.insert(0, 1)));

        hook.execute(()).await.unwrap();
        assert!(hook.update_data(|items| items.insert(0, 1)));
        assert_eq!(hook.data(), Some(vec![1, 2, 3]));

        hook.set_data(None);
        assert_eq!(hook.data(), None);
    }
}
