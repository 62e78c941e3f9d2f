//! IdentiCore 主入口
//! 链上身份注册工作流后端

use std::sync::Arc;

use anyhow::Result;
use identicore::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // ✅ 1. 加载环境变量
    dotenvy::dotenv().ok();

    // ✅ 2. 加载配置（CONFIG_PATH 指向TOML时配置文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;
    let config = Arc::new(config);

    // ✅ 3. 初始化日志
    logging::init_logging(&config.logging);
    tracing::info!("🚀 Starting IdentiCore identity registration service");

    // ✅ 4. 初始化应用状态（钱包提供者、存储客户端、合约产物）
    let state = Arc::new(AppState::new(config.clone()).await?);
    tracing::info!("✅ Application state initialized");

    // ✅ 5. 后台启动注册工作流：连接钱包并解析合约
    // 启动失败不拉垮进程；状态机进入Failed，由 /api/v1/identity/state 可见
    let workflow = state.workflow.clone();
    tokio::spawn(async move {
        let mut workflow = workflow.lock().await;
        match workflow.start().await {
            Ok(()) => tracing::info!("✅ Registration workflow ready"),
            Err(e) => tracing::error!("⚠️ Registration workflow failed to start: {}", e),
        }
    });

    // ✅ 6. 构建API路由并启动服务器
    let app = api::routes(state.clone());
    let bind_addr = config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("🎉 Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
