use serde::{Deserialize, Serialize};

/// 用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

/// 创建用户的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub name: String,
    /// 后端可自动生成密码时可省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// 更新用户的请求体，只发送出现的字段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
