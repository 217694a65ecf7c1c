//! 用户列表 Hook
//!
//! 首次挂载时自动拉取列表；创建成功后把新用户插到缓存列表最前面，不重新拉取。

use tracing::debug;

use super::api_hook::{ApiHook, HookOptions};
use crate::error::ClientResult;
use crate::infrastructure::AbortSignal;
use crate::models::{CreateUserInput, User};
use crate::services::UsersService;

pub struct UsersHook {
    service: UsersService,
    list: ApiHook<(), Vec<User>>,
}

impl UsersHook {
    pub fn new(service: UsersService) -> Self {
        let lister = service.clone();
        let list = ApiHook::new((), HookOptions::immediate(), move |(), signal: AbortSignal| {
            let lister = lister.clone();
            async move { lister.list(signal).await }
        });
        Self { service, list }
    }

    /// 底层列表 hook（状态、订阅）
    pub fn list(&self) -> &ApiHook<(), Vec<User>> {
        &self.list
    }

    /// 当前缓存的用户列表
    pub fn users(&self) -> Option<Vec<User>> {
        self.list.data()
    }

    pub async fn mount(&self) -> Option<ClientResult<Vec<User>>> {
        self.list.mount().await
    }

    pub async fn refresh(&self) -> ClientResult<Vec<User>> {
        self.list.execute_default().await
    }

    /// 创建用户；列表已加载时插到最前面
    pub async fn create(&self, input: &CreateUserInput) -> ClientResult<User> {
        let user = self.service.create(input, AbortSignal::none()).await?;
        let inserted = self.list.update_data(|users| users.insert(0, user.clone()));
        debug!("新用户 {} 已创建，缓存列表已更新: {}", user.id, inserted);
        Ok(user)
    }

    pub fn dispose(&self) {
        self.list.dispose();
    }
}
