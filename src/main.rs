use approval_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载 .env (可选)
    let _ = dotenv::dotenv();

    // 2. 加载配置并确保工作目录存在
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    // 3. 初始化日志 (生产环境写文件，开发环境输出终端)
    let log_level = std::env::var("LOG_LEVEL").ok();
    if config.is_production() {
        init_logger_with_file(log_level.as_deref(), Some(&config.logs_dir()));
    } else {
        init_logger_with_file(log_level.as_deref(), None);
    }

    // 打印横幅
    print_banner();

    tracing::info!("Approval server starting...");

    // 4. 初始化服务器状态
    let state = ServerState::initialize(&config).await?;

    // 5. 启动 HTTP 服务器
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
