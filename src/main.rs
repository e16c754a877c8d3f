use anyhow::Result;
use todo_server::{create_app, init_tracing, App, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();

    let config = AppConfig::from_env()?;
    let App { router, sampler } = create_app(&config)?;

    let endpoint = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&endpoint).await?;
    let addr = listener.local_addr()?;

    info!("Starting todo-server v{}...", env!("CARGO_PKG_VERSION"));
    info!("Server is running on http://{addr}");
    info!("Metrics available on http://{addr}/metrics");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sampler.stop().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    // ---
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
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
    info!("Signal received, starting graceful shutdown");
}
