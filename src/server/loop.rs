// Server loop module
// Accepts connections forever and hands each to its own task

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::handle_connection;
use crate::handler::DirectoryHandler;
use crate::logger;

const MIN_ACCEPT_BACKOFF: Duration = Duration::from_millis(5);
const MAX_ACCEPT_BACKOFF: Duration = Duration::from_secs(1);

/// Delay before retrying after consecutive accept failures (e.g. too many open files)
///
/// Starts at 5ms and doubles up to 1s.
pub fn next_backoff(previous: Duration) -> Duration {
    if previous.is_zero() {
        MIN_ACCEPT_BACKOFF
    } else {
        (previous * 2).min(MAX_ACCEPT_BACKOFF)
    }
}

/// Accept connections until the process is terminated
///
/// Accept errors are logged and retried after a backoff; they never end the loop.
pub async fn serve(listener: TcpListener, dir_handler: Arc<DirectoryHandler>, keep_alive: bool) {
    let mut backoff = Duration::ZERO;

    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                backoff = Duration::ZERO;
                handle_connection(stream, peer_addr, Arc::clone(&dir_handler), keep_alive);
            }
            Err(e) => {
                backoff = next_backoff(backoff);
                logger::log_error(&format!(
                    "Failed to accept connection: {e}; retrying in {}ms",
                    backoff.as_millis()
                ));
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
