//! Development server with live reload support.

pub mod encoding;
pub mod intercept;
mod lifecycle;
mod path;
mod response;
mod tasks;

use crate::{config::cfg, debug, log};
use anyhow::Result;
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// Default WebSocket port for the reload channel
pub const DEFAULT_WS_PORT: u16 = 35729;

/// Actual WebSocket port (may differ from DEFAULT_WS_PORT if port was in use)
/// Updated by the coordinator after the WebSocket server binds successfully
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(DEFAULT_WS_PORT);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

/// Get the actual WebSocket port
fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    debug!("serve"; "serving {}", config.serve_root().display());

    Ok(BoundServer {
        server,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the watcher actors and the request loop (blocking).
    pub fn run(self) -> Result<()> {
        let actor_handle = lifecycle::spawn_actors(DEFAULT_WS_PORT, self.shutdown_rx);
        crate::core::set_serving();
        run_request_loop(&self.server);
        lifecycle::wait_for_shutdown(actor_handle);
        Ok(())
    }
}

fn run_request_loop(server: &Server) {
    // Use thread pool to handle requests concurrently so a slow client
    // cannot stall the others
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        pool.spawn(move || {
            if let Err(e) = handle_request(request) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request) -> Result<()> {
    // Early exit if shutdown requested
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let config = cfg();

    // Serve the client bootstrap script from memory
    let ws_port = get_actual_ws_port();
    if request.url() == config.client.script_url() {
        return response::respond_client_js(request, ws_port);
    }

    let serve_root = config.serve_root();
    if let Some(path) = path::resolve_path(request.url(), &serve_root) {
        return response::respond_file(request, &path);
    }

    response::respond_not_found(request, &serve_root)
}
