//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（HTTP 连接池、持久化存储），只暴露能力，不认识业务。

pub mod cancel;
pub mod storage;
pub mod transport;

pub use cancel::{AbortSignal, RequestSlot};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

#[cfg(test)]
pub(crate) mod fake;
