//! 优雅退出信号
//!
//! Linux/macOS 监听 SIGINT、SIGTERM，Windows 监听 Ctrl+C。

use tracing::{error, info};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
}

/// 等待第一个退出信号并返回其原因。
///
/// 信号处理器注册失败时只记录错误并继续等待其它信号；
/// 全部失败时该 future 永不完成，服务保持运行。
pub async fn wait_for_signal() -> ShutdownReason {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("监听Ctrl+C信号失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("SIGTERM 处理器注册失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = tokio::select! {
        _ = interrupt => ShutdownReason::Interrupt,
        _ = terminate => ShutdownReason::Terminate,
    };
    info!("接收到退出信号: {:?}", reason);
    reason
}
