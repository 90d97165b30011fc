//! Server lifecycle.

use crate::router::AppState;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Serve `router` until `shutdown` resolves.
///
/// On shutdown the listener stops accepting, open live streams are told to
/// end, and in-flight requests are drained before this returns.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!(address = %local_addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown requested, closing live streams");
            state.trigger_shutdown();
        })
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
