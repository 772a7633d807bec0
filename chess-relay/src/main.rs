use std::path::PathBuf;

use anyhow::{Context, Result};
use chess_relay::{RelayConfig, RelayService};
use protocol::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("chess_relay=debug".parse()?))
        .init();

    // 第一个参数为可选的配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RelayConfig::from_optional_path(config_path.as_deref())?;

    info!("国际象棋中继服务端启动中...");
    info!("最大连接数: {}", config.max_connections);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let service = RelayService::new(&config);

    tokio::select! {
        result = service.serve(listener) => result?,
        _ = tokio::signal::ctrl_c() => info!("收到退出信号，服务端关闭"),
    }

    Ok(())
}
