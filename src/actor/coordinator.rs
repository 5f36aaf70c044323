//! Actor Coordinator - Wires up the Reload Actor System
//!
//! # Responsibility
//!
//! The Coordinator is a **thin orchestrator** that:
//! - Creates communication channels
//! - Starts the WebSocket listener
//! - Wires up actors and runs them concurrently
//!
//! It does NOT contain business logic - that lives in `reload/`.
//!
//! # Architecture
//!
//! ```text
//! FsActor --> ReloadActor --> WsActor
//!    |             |            ^
//!    |             |            |
//!    +--- config --+    client messages
//! ```

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::{ReloadMsg, WsMsg};
use super::reload::ReloadActor;
use super::ws::WsActor;

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system
pub struct Coordinator {
    ws_port: u16,
    /// Optional shutdown signal receiver
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create with the WebSocket base port
    pub fn new(ws_port: u16) -> Self {
        Self {
            ws_port,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    ///
    /// Watcher or WebSocket listener startup failure is fatal and
    /// propagates to the caller; nothing is retried.
    pub async fn run(mut self) -> Result<()> {
        // Create channels
        let (reload_tx, reload_rx) = mpsc::channel::<ReloadMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        // Start WebSocket listener
        let actual_port = crate::reload::server::start_ws_server(self.ws_port, ws_tx.clone())?;
        crate::cli::serve::set_actual_ws_port(actual_port);
        crate::debug!("ws"; "listening on ws://localhost:{}", actual_port);

        // Create actors
        let fs_actor =
            FsActor::new(reload_tx.clone()).map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
        let reload_actor = ReloadActor::new(reload_rx, ws_tx.clone());
        let ws_actor = WsActor::new(ws_rx, reload_tx.clone());

        crate::debug!("actor"; "start");
        let shutdown_rx = self.shutdown_rx.take();
        run_actors(fs_actor, reload_actor, ws_actor, reload_tx, ws_tx, shutdown_rx).await;
        crate::debug!("actor"; "stopped");

        Ok(())
    }
}

/// Run all actors concurrently until shutdown
async fn run_actors(
    fs: FsActor,
    reload: ReloadActor,
    ws: WsActor,
    reload_tx: mpsc::Sender<ReloadMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let fs_handle = tokio::spawn(async move { fs.run().await });
    let reload_handle = tokio::spawn(async move { reload.run().await });
    let ws_handle = tokio::spawn(async move { ws.run().await });

    // Wait for shutdown signal (poll-based since crossbeam channel)
    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    } else {
        tokio::select! {
            _ = fs_handle => {}
            _ = reload_handle => {}
            _ = ws_handle => {}
        }
        return;
    }

    // Orderly teardown: stop classification, then close client sockets
    let _ = reload_tx.send(ReloadMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    let _ = tokio::time::timeout(std::time::Duration::from_millis(500), ws_handle).await;
}
