// Server module entry point
// Accept loop, connection handling and shutdown

pub mod connection;
pub mod listener;

pub use connection::accept_connection;
pub use listener::create_reusable_listener;

use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;

/// Accept connections until Ctrl-C.
///
/// Must run inside a `tokio::task::LocalSet`.
pub async fn serve(listener: TcpListener, state: Rc<AppState>) {
    serve_until(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await;
}

/// Accept connections until `shutdown` resolves.
///
/// Connections already being served keep running on the `LocalSet`.
pub async fn serve_until(
    listener: TcpListener,
    state: Rc<AppState>,
    shutdown: impl Future<Output = ()>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accept_result = listener.accept() => match accept_result {
                Ok((stream, peer_addr)) => {
                    accept_connection(stream, peer_addr, &state, &active_connections);
                }
                Err(e) => tracing::error!(error = %e, "failed to accept connection"),
            },
            () = &mut shutdown => {
                tracing::info!("shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}
