// Connection handling module
// Accepts a TCP connection and serves HTTP/1.1 on it as a local task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;

/// Accept a connection unless the configured limit is reached.
///
/// Returns `false` when the connection was rejected.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Rc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) -> bool {
    // Increment first, then check, so the count never under-reports
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(%peer_addr, max_conn, "max connections reached, connection rejected");
            drop(stream);
            return false;
        }
    }

    tracing::debug!(%peer_addr, active = prev_count + 1, "connection accepted");
    handle_connection(
        stream,
        peer_addr,
        Rc::clone(state),
        Arc::clone(conn_counter),
    );
    true
}

/// Serve one connection on the current `LocalSet`.
///
/// The whole connection, keep-alive included, is bounded by the larger of
/// the read and write timeouts.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Rc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let timeout = Duration::from_secs(performance.read_timeout.max(performance.write_timeout));
        let mut builder = http1::Builder::new();
        builder.keep_alive(performance.keep_alive_timeout > 0);

        let service_state = Rc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Rc::clone(&service_state), peer_addr)),
        );

        match tokio::time::timeout(timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::debug!(%peer_addr, error = %err, "connection error"),
            Err(_) => {
                tracing::debug!(%peer_addr, secs = timeout.as_secs(), "connection timed out");
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
