use std::future::IntoFuture;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api::{self, AppState};
use crate::clients::ClientPool;
use crate::config::LarkMsgConfig;
use crate::error::ServerError;
use crate::store_factory::create_bot_store;

/// Build the application state described by `config`.
pub async fn build_state(config: &LarkMsgConfig) -> Result<AppState, ServerError> {
    let store = create_bot_store(&config.registry).await?;
    let clients = ClientPool::new(config.lark.client_config())?;

    let api_key = config.server.api_key();
    if api_key.is_none() {
        warn!("no API key configured, /api routes are unauthenticated");
    }

    Ok(AppState::new(store, clients).with_api_key(api_key))
}

/// Run the HTTP server until SIGINT or SIGTERM.
///
/// In-flight requests get `shutdown_timeout_seconds` to finish once the
/// signal arrives; remaining connections are then dropped.
pub async fn run(config: LarkMsgConfig) -> Result<(), ServerError> {
    let state = build_state(&config).await?;
    let app = api::router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, base_url = %config.lark.base_url, "larkmsg server listening");

    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let deadline = async move {
        if signalled_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(timeout).await;
    };

    tokio::select! {
        result = server => result?,
        () = deadline => {
            warn!(timeout_secs = timeout.as_secs(), "shutdown timeout elapsed, dropping open connections");
        }
    }

    info!("larkmsg server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
