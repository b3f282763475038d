// Signal handling module
//
// SIGINT (Ctrl+C) and SIGTERM both request a graceful shutdown: the accept
// loop stops and in-flight connections are given time to finish.

use crate::logger;

/// Resolve once a shutdown signal arrives
///
/// If a handler cannot be registered the corresponding branch never fires,
/// so the server keeps running rather than exiting at startup.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => logger::log_server_stop("SIGINT received"),
        () = terminate => logger::log_server_stop("SIGTERM received"),
    }
}
