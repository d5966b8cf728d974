// Accept loop module
// Runs the listener until a shutdown signal arrives, then drains
// in-flight connections for a bounded grace period.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// How long shutdown waits for in-flight connections
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

/// Accept connections until shutdown is requested.
pub async fn run_until_shutdown(
    listener: TcpListener,
    state: Arc<AppState>,
    signals: Arc<SignalHandler>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Shutdown may have been requested while an accept was in flight
        if signals.shutdown_requested.load(Ordering::SeqCst) {
            break;
        }

        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = signals.shutdown.notified() => {
                break;
            }
        }
    }

    // Stop accepting immediately, let in-flight requests finish
    drop(listener);
    drain_connections(&active_connections).await;

    Ok(())
}

/// Wait for active connections to finish, up to `DRAIN_TIMEOUT`.
///
/// Connections still open after the deadline are abandoned; their tasks
/// die with the process.
async fn drain_connections(active_connections: &Arc<AtomicUsize>) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    while active_connections.load(Ordering::SeqCst) > 0 {
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown drain timed out with {} connection(s) still active",
                active_connections.load(Ordering::SeqCst)
            ));
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
