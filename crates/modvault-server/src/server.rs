//! Server startup and shutdown.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use modvault_store::FileRegistry;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::handlers::router;
use crate::settings::ServerSettings;

/// Open the configured storage and serve the registry until ctrl-c or SIGTERM.
pub async fn serve(settings: &ServerSettings) -> Result<(), ServerError> {
    let registry = FileRegistry::open(&settings.store_config())?;
    let app = router(Arc::new(registry), settings.max_upload_bytes);

    let addr = settings.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(
        %addr,
        storage = %settings.storage.display(),
        "registry listening"
    );

    run(listener, app, shutdown_signal()).await
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn run<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;
    info!("registry stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown requested");
}
