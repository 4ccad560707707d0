use anyhow::Context;
use produtos_api::{
    app::produtos::MySqlProductStore,
    infrastructure::{DatabaseManager, Logger},
    router, AppState, Config,
};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("加载配置失败")?;
    Logger::init(&config.logging)?;

    info!("启动 produtos-api v{}", env!("CARGO_PKG_VERSION"));

    // 数据库不可用时不接受任何请求
    let database = DatabaseManager::connect(&config.database)
        .await
        .map_err(|e| {
            error!("Erro ao conectar ao banco de dados: {}", e);
            e
        })
        .with_context(|| format!("无法连接数据库 {}", config.database.display_url()))?;

    let store = MySqlProductStore::new(
        database.get_pool().clone(),
        &config.database.table,
        &config.database.id_column,
    );
    let state = AppState::new(store).with_query_timeout(config.server.query_timeout());
    let app = router(state);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("无法绑定到 {addr}"))?;

    info!("🚀 服务运行在 http://{}", listener.local_addr()?);
    info!("   GET    /api/produtos      - 获取所有产品");
    info!("   GET    /api/produtos/:id  - 按 ID 获取产品");
    info!("   GET    /health            - 健康检查");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("无法监听 Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到停止信号，等待进行中的请求完成");
}
