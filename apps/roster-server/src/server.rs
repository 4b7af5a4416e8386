//! HTTP server with graceful shutdown

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use roster_api::{create_router, AppState};

pub struct Server {
    address: String,
    state: AppState,
}

impl Server {
    pub fn new(address: String, state: AppState) -> Self {
        Self { address, state }
    }

    pub async fn run(self) -> Result<()> {
        let app = create_router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", self.address))?;

        info!("HTTP server listening on {}", self.address);

        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
