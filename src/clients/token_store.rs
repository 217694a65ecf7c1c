//! 令牌存储
//!
//! 进程内唯一的 bearer token 持有者。HTTP 客户端每次鉴权请求都会读它，
//! 只有登录/登出会写它。底层存储失败一律降级为"没有 token"。

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::{FileStorage, KeyValueStorage};

/// 令牌存储
pub struct TokenStore {
    key: String,
    storage: Arc<dyn KeyValueStorage>,
}

impl TokenStore {
    pub fn new(key: impl Into<String>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            key: key.into(),
            storage,
        }
    }

    /// 按配置创建文件存储支持的令牌存储
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.auth_storage_key.clone(),
            Arc::new(FileStorage::new(&config.token_store_path)),
        )
    }

    /// 存储键名
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 读取 token；空字符串视为没有
    pub fn get(&self) -> Option<String> {
        match self.storage.get_item(&self.key) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("读取令牌失败，按未登录处理: {}", e);
                None
            }
        }
    }

    /// 写入 token（整体替换）
    pub fn set(&self, token: &str) {
        match self.storage.set_item(&self.key, token) {
            Ok(()) => debug!("令牌已保存"),
            Err(e) => warn!("保存令牌失败: {}", e),
        }
    }

    /// 清除 token
    pub fn clear(&self) {
        match self.storage.remove_item(&self.key) {
            Ok(()) => debug!("令牌已清除"),
            Err(e) => warn!("清除令牌失败: {}", e),
        }
    }
}
