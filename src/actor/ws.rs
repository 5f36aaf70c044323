//! WebSocket Actor - Bidirectional Communication
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting protocol commands to all connected clients
//! - Receiving client messages (registration, dependency reports, sync
//!   requests) and forwarding them to the ReloadActor
//!
//! Delivery is send-and-forget: clients connecting after a command was
//! pushed do not receive it retroactively.

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::messages::{ReloadMsg, WsMsg};
use super::reload::init_command;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Channel back to the ReloadActor (client-reported state)
    reload_tx: mpsc::Sender<ReloadMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::Receiver<WsMsg>, reload_tx: mpsc::Sender<ReloadMsg>) -> Self {
        Self {
            rx,
            reload_tx,
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        // Background task polling client messages
        let clients_for_reader = Arc::clone(&self.clients);
        let reload_tx = self.reload_tx.clone();
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, reload_tx);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Command(command) => {
                    self.broadcast(Message::Text(command.to_json().into()));
                }

                WsMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut client in clients.drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Add a new client connection
    fn add_client(&self, stream: TcpStream) {
        // Keep blocking mode during handshake, switch to non-blocking after
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                // Now set non-blocking for polling reads
                let _ = ws.get_ref().set_nonblocking(true);

                // Every new client starts from an init command
                let init = init_command();
                if let Err(e) = ws.send(Message::Text(init.to_json().into())) {
                    crate::log!("ws"; "failed to send init: {}", e);
                    return;
                }

                let mut clients = self.clients.lock();
                crate::log!("ws"; "client connected (total: {})", clients.len() + 1);
                clients.push(ws);
            }
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
            }
        }
    }

    /// Background thread to read client messages (non-blocking poll)
    fn client_reader_loop(
        clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
        reload_tx: mpsc::Sender<ReloadMsg>,
    ) {
        loop {
            std::thread::sleep(std::time::Duration::from_millis(100));

            let mut clients_guard = clients.lock();
            let mut disconnected = Vec::new();

            for (i, client) in clients_guard.iter_mut().enumerate() {
                match client.read() {
                    Ok(Message::Text(text)) => {
                        if let Some(msg) = Self::parse_client_message(&text)
                            && reload_tx.blocking_send(msg).is_err()
                        {
                            return; // ReloadActor gone
                        }
                    }
                    Ok(Message::Close(_)) => {
                        disconnected.push(i);
                    }
                    Err(tungstenite::Error::Io(ref e))
                        if e.kind() == std::io::ErrorKind::WouldBlock =>
                    {
                        // No data available, continue
                    }
                    Err(_) => {
                        disconnected.push(i);
                    }
                    _ => {}
                }
            }

            for i in disconnected.into_iter().rev() {
                clients_guard.remove(i);
                crate::log!("ws"; "client disconnected (total: {})", clients_guard.len());
            }
        }
    }

    /// Parse a client-sent JSON message into a ReloadMsg, if it carries one.
    fn parse_client_message(text: &str) -> Option<ReloadMsg> {
        let json = serde_json::from_str::<serde_json::Value>(text).ok()?;
        let string_list = |value: Option<&serde_json::Value>| -> Vec<String> {
            value
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };

        match json.get("type").and_then(|t| t.as_str())? {
            "register" => {
                let name = json.get("name").and_then(|n| n.as_str()).unwrap_or("?");
                crate::log!("ws"; "client info: {}", name);
                None
            }
            "registerDeps" => {
                let path = json.get("path").and_then(|p| p.as_str())?.to_string();
                let deps = string_list(json.get("deps"));
                Some(ReloadMsg::RegisterDeps { path, deps })
            }
            "syncModule" => Some(ReloadMsg::Sync {
                modules: string_list(json.get("modules")),
                resources: string_list(json.get("resources")),
            }),
            other => {
                crate::debug!("ws"; "unknown client message: {}", other);
                None
            }
        }
    }

    /// Broadcast a message to all connected clients
    fn broadcast(&self, msg: Message) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match client.send(msg.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!("ws"; "client dropped: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", count);
    }
}

// =============================================================================
// Tests
// =============================================================================
