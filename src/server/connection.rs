// Connection handling module
// Serves one accepted TCP connection in its own task

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::handler::{self, DirectoryHandler};
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures the HTTP/1.1 connection (keep-alive)
/// 3. Serves every request on it with the directory handler
/// 4. Logs connection-level failures, which never reach other connections
///
/// No read or write timeout is applied; a stalled client holds only its own task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address, for logging
/// * `dir_handler` - Shared, read-only directory handler
/// * `keep_alive` - Whether persistent connections are allowed
pub fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    dir_handler: Arc<DirectoryHandler>,
    keep_alive: bool,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&dir_handler))),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&peer_addr, &err);
        }
    });
}
