use coloring_book_backend::{AppConfig, AppState, build_app, shutdown};

#[tokio::main]
async fn main() {
    // 日志过滤来自配置，因此配置错误只能直接写 stderr
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG 优先于 logging.level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();
    config.log_summary();

    let state = match AppState::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("App state init failed: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_app(state, config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}{}/health", addr, config.api.prefix);
    tracing::info!("Process API: http://{}{}/process-images", addr, config.api.prefix);

    let shutdown_timeout = config.shutdown.timeout_duration();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    // 收到信号后通知 axum 停止接收新连接，并开始计时
    let signal_task = tokio::spawn(async move {
        shutdown::wait_for_signal().await;
        tracing::info!("开始优雅关闭HTTP服务器，超时 {}秒", shutdown_timeout.as_secs());
        let _ = stop_tx.send(());
        tokio::time::sleep(shutdown_timeout).await;
        tracing::warn!("优雅退出超时，强制退出");
        std::process::exit(1);
    });

    let graceful = axum::serve(listener, app).with_graceful_shutdown(async {
        let _ = stop_rx.await;
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    signal_task.abort();
    tracing::info!("服务器已优雅关闭");
}
