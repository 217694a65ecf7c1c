//! 用户资源服务
//!
//! `GET/POST /users`，`GET/PUT/DELETE /users/{id}`

use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

use crate::clients::{HttpClient, RequestOptions};
use crate::error::ClientResult;
use crate::infrastructure::AbortSignal;
use crate::models::{CreateUserInput, UpdateUserInput, User};

/// 用户服务
#[derive(Clone)]
pub struct UsersService {
    client: Arc<HttpClient>,
}

impl UsersService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// 列出全部用户
    pub async fn list(&self, signal: AbortSignal) -> ClientResult<Vec<User>> {
        self.client.get("/users", RequestOptions::new().signal(signal)).await
    }

    pub async fn get_by_id(&self, id: &str, signal: AbortSignal) -> ClientResult<User> {
        self.client.get(&user_path(id), RequestOptions::new().signal(signal)).await
    }

    pub async fn create(&self, input: &CreateUserInput, signal: AbortSignal) -> ClientResult<User> {
        debug!("创建用户: {}", input.email);
        self.client.post("/users", input, RequestOptions::new().signal(signal)).await
    }

    pub async fn update(&self, id: &str, input: &UpdateUserInput, signal: AbortSignal) -> ClientResult<User> {
        self.client.put(&user_path(id), input, RequestOptions::new().signal(signal)).await
    }

    /// 删除用户，忽略响应体
    pub async fn remove(&self, id: &str, signal: AbortSignal) -> ClientResult<()> {
        let options = RequestOptions::new().method(Method::DELETE).signal(signal);
        self.client.request_body(&user_path(id), options).await?;
        Ok(())
    }
}

fn user_path(id: &str) -> String {
    format!("/users/{}", id)
}
