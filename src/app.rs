use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::{HttpClient, TokenStore};
use crate::config::Config;
use crate::error::ClientError;
use crate::hooks::UsersHook;
use crate::infrastructure::AbortSignal;
use crate::models::{GradeForm, LoginInput};
use crate::services::{AuthService, GradingService, UsersService};
use crate::utils::logging::{log_grade_summary, log_startup};
use crate::workflow::SubmissionFlow;

/// 命令行命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 提交评分：仓库链接、评分标准文件、可选的测试结果文件
    Grade {
        github_link: String,
        rubric_path: String,
        test_results_path: Option<String>,
    },
    Login { username: String, password: String },
    Logout,
    /// 列出用户
    Users,
    /// 显示配置与登录状态
    Status,
}

/// 应用主结构
pub struct App {
    config: Config,
    auth: AuthService,
    users: UsersService,
    grading: GradingService,
}

impl App {
    /// 初始化应用：令牌存储 → HTTP 客户端 → 各 service
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let tokens = Arc::new(TokenStore::from_config(&config));
        let client = HttpClient::from_config(&config, tokens).map_err(into_anyhow)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// 使用现成的客户端组装应用
    pub fn with_client(config: Config, client: Arc<HttpClient>) -> Self {
        Self {
            config,
            auth: AuthService::new(Arc::clone(&client)),
            users: UsersService::new(Arc::clone(&client)),
            grading: GradingService::new(client),
        }
    }

    /// 执行一条命令，返回要打印到标准输出的内容
    pub async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Grade {
                github_link,
                rubric_path,
                test_results_path,
            } => self.grade(github_link, &rubric_path, test_results_path.as_deref()).await,
            Command::Login { username, password } => {
                let input = LoginInput { username, password };
                let response = self.auth.login(&input, AbortSignal::none()).await.map_err(into_anyhow)?;
                Ok(format!("Logged in ({} token stored)", display_token_type(&response.token_type)))
            }
            Command::Logout => {
                self.auth.logout();
                Ok("Logged out".to_string())
            }
            Command::Users => self.list_users().await,
            Command::Status => Ok(self.status()),
        }
    }

    async fn grade(&self, github_link: String, rubric_path: &str, test_results_path: Option<&str>) -> Result<String> {
        let rubric_text = fs::read_to_string(rubric_path).with_context(|| format!("无法读取评分标准: {}", rubric_path))?;
        let mut form = GradeForm::new(github_link, rubric_text);
        if let Some(path) = test_results_path {
            let test_results = fs::read_to_string(path).with_context(|| format!("无法读取测试结果: {}", path))?;
            form = form.with_test_results(test_results);
        }

        let flow = SubmissionFlow::new(self.grading.clone());
        let view = flow.submit(&form).await.map_err(into_anyhow)?;
        log_grade_summary(&view);

        if !view.is_success {
            warn!("⚠️ 评分服务报告失败");
        }
        Ok(view.rendered_markdown)
    }

    async fn list_users(&self) -> Result<String> {
        let hook = UsersHook::new(self.users.clone());
        let users = match hook.mount().await {
            Some(result) => result.map_err(into_anyhow)?,
            None => bail!("用户列表未加载"),
        };
        info!("✓ 共 {} 个用户", users.len());

        Ok(users
            .iter()
            .map(|u| format!("{}\t{}\t{}\t{}", u.id, u.name, u.email, u.created_at))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn status(&self) -> String {
        let base = if self.config.is_configured() {
            self.config.api_base_url.as_str()
        } else {
            "(not configured)"
        };
        let auth = if self.auth.is_authenticated() {
            "logged in"
        } else {
            "not logged in"
        };
        format!("API base URL: {}\nAuth: {}", base, auth)
    }
}

fn display_token_type(token_type: &str) -> &str {
    if token_type.is_empty() {
        "bearer"
    } else {
        token_type
    }
}

/// 把客户端错误转换为面向用户的 anyhow 错误
fn into_anyhow(err: ClientError) -> anyhow::Error {
    if err.is_cancelled() {
        debug!("请求已取消");
    } else {
        error!("❌ {}", err);
    }
    match err.user_message() {
        Some(message) => anyhow!(message),
        None => anyhow!(err),
    }
}
