//! 登录与令牌生命周期

use std::sync::Arc;
use tracing::info;

use crate::clients::{HttpClient, RequestOptions, TokenStore};
use crate::error::ClientResult;
use crate::infrastructure::AbortSignal;
use crate::models::{LoginInput, LoginResponse};

/// 鉴权服务
#[derive(Clone)]
pub struct AuthService {
    client: Arc<HttpClient>,
}

impl AuthService {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    fn tokens(&self) -> &Arc<TokenStore> {
        self.client.tokens()
    }

    /// 登录：`POST /auth/login`，不带旧令牌；成功后保存 `access_token`
    pub async fn login(&self, input: &LoginInput, signal: AbortSignal) -> ClientResult<LoginResponse> {
        let response: LoginResponse = self
            .client
            .post("/auth/login", input, RequestOptions::new().without_auth().signal(signal))
            .await?;
        self.tokens().set(&response.access_token);
        info!("✓ 登录成功: {}", input.username);
        Ok(response)
    }

    /// 登出：只清除本地令牌
    pub fn logout(&self) {
        self.tokens().clear();
        info!("已登出");
    }

    pub fn token(&self) -> Option<String> {
        self.tokens().get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}
