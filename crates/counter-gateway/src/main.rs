//! Counter gateway.
//!
//! - Any request increments the counter and answers `counter: <N>`
//! - Store address from `REDIS_ADDR` (default `:6379`)
//! - Optional YAML config from `COUNTER_CONFIG`

use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use counter_core::error::{report, CounterError};
use counter_gateway::{app_state::AppState, config, router, store, transport};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %report(&err), "counter server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CounterError> {
    let cfg = config::resolve()?;
    let listen = cfg.server.listen_addr()?;

    let store = store::connect(&cfg.store);
    if let Err(err) = store.ping().await {
        // dialed lazily per request; a store that comes up later is fine
        tracing::warn!(addr = %cfg.store.dial_addr(), error = %report(&err), "store not reachable yet");
    }

    let state = AppState::new(&cfg, store);
    let app = router::build_router(state);

    let listener = TcpListener::bind(listen).await.map_err(|source| CounterError::Serve {
        op: "open TCP port for listening",
        source,
    })?;

    tracing::info!(
        %listen,
        backend = cfg.store.backend.as_str(),
        store = %cfg.store.dial_addr(),
        "ready"
    );

    transport::serve::serve_with_shutdown(listener, app, cfg.server.read_header_timeout(), shutdown_signal())
        .await
        .map_err(|source| CounterError::Serve {
            op: "run counter server",
            source,
        })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, shutting down");
}
