//! Server module
//!
//! Listener setup, the accept loop and per-connection serving. The server
//! is plumbing only: every request goes to the one configured endpoint.

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::AppState;
use crate::handler::Endpoint;
use crate::logger;

pub use connection::{accept_connection, handle_request};
pub use listener::create_reusable_listener;
pub use signal::shutdown_signal;

const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept connections until `shutdown` resolves, then wait for in-flight
/// connections (at most `server.request_timeout` seconds)
pub async fn run<E, F>(
    listener: TcpListener,
    state: Arc<AppState>,
    endpoint: Arc<E>,
    shutdown: F,
) -> std::io::Result<()>
where
    E: Endpoint + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &endpoint);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = &mut shutdown => break,
        }
    }

    drop(listener);
    drain_connections(&state).await;
    Ok(())
}

async fn drain_connections(state: &AppState) {
    let deadline = Duration::from_secs(state.config.server.request_timeout);
    let waited = tokio::time::timeout(deadline, async {
        while state.active_connections.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    })
    .await;

    if waited.is_err() {
        logger::log_warning(&format!(
            "{} connection(s) still open after {}s, exiting anyway",
            state.active_connections.load(Ordering::SeqCst),
            deadline.as_secs()
        ));
    }
}
