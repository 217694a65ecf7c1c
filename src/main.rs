use anyhow::Result;
use bpaf::*;
use dotenvy::dotenv;
use grade_portal::{utils::logging, App, Command, Config};
use tracing::error;

/// 解析命令行参数
fn options() -> Command {
    let grade = {
        let github_link = positional::<String>("REPO_URL").help("GitHub repository link to grade");
        let rubric_path = positional::<String>("RUBRIC").help("Path to a JSON rubric file");
        let test_results_path = long("tests")
            .short('t')
            .help("Path to a file with test results to forward")
            .argument::<String>("FILE")
            .optional();
        construct!(Command::Grade {
            test_results_path,
            github_link,
            rubric_path,
        })
        .to_options()
        .command("grade")
        .help("Submit a repository for grading and print the report")
    };

    let login = {
        let username = positional::<String>("USERNAME");
        let password = long("password")
            .short('p')
            .env("GRADE_PASSWORD")
            .help("Account password")
            .argument::<String>("PASSWORD");
        construct!(Command::Login { password, username })
            .to_options()
            .command("login")
            .help("Log in and store the access token")
    };

    let logout = pure(Command::Logout)
        .to_options()
        .command("logout")
        .help("Forget the stored access token");

    let users = pure(Command::Users)
        .to_options()
        .command("users")
        .help("List users");

    let status = pure(Command::Status)
        .to_options()
        .command("status")
        .help("Show configuration and login status");

    construct!([grade, login, logout, users, status])
        .to_options()
        .descr("Command-line client for the grading service")
        .run()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config.log_filter);

    let command = options();

    // 初始化并运行应用
    let app = App::initialize(config)?;
    match app.run(command).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(e) => {
            error!("❌ 执行失败: {:#}", e);
            Err(e)
        }
    }
}
