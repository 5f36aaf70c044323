//! Reload Actor - Change Classification
//!
//! Consumes the watcher's change events, resolves them through the
//! dependency registry and livereload mapping, and produces protocol
//! commands for the WsActor to push.
//!
//! Owns the registry and mapping: both are constructed at server start and
//! reset when the watcher config reloads, never shared as ambient state.

use tokio::sync::mpsc;

use super::messages::{ReloadMsg, WsMsg};
use crate::config::{build_mapping, cfg};
use crate::core::FileInfo;
use crate::reload::{Classifier, DependencyRegistry, LiveReloadMapping, ProtocolCommand};

/// Build the init command clients receive on connect and reconfiguration.
pub fn init_command() -> ProtocolCommand {
    let config = cfg();
    ProtocolCommand::Init {
        log_level: config.client.log_level.clone(),
        hmr: config.hmr.enable,
    }
}

/// Reload Actor - classifies changes into commands
pub struct ReloadActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<ReloadMsg>,
    /// Channel to the WsActor
    ws_tx: mpsc::Sender<WsMsg>,
    /// Resource dependency edges (client-reported)
    registry: DependencyRegistry,
    /// Configured livereload mapping rules
    mapping: LiveReloadMapping,
}

impl ReloadActor {
    /// Create a new ReloadActor with state built from the current config
    pub fn new(rx: mpsc::Receiver<ReloadMsg>, ws_tx: mpsc::Sender<WsMsg>) -> Self {
        let mapping = build_mapping(&cfg().livereload);
        Self {
            rx,
            ws_tx,
            registry: DependencyRegistry::new(),
            mapping,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ReloadMsg::Changes(events) => {
                    let commands = self.classify_all(&events);
                    for command in commands {
                        if self.push(command).await.is_err() {
                            return;
                        }
                    }
                }

                ReloadMsg::ConfigReloaded => {
                    // Fresh lifecycle for registry and mapping
                    self.registry.clear();
                    self.mapping = build_mapping(&cfg().livereload);
                    crate::debug!("reload"; "state reset after config reload");

                    if self.push(init_command()).await.is_err() {
                        return;
                    }
                }

                ReloadMsg::RegisterDeps { path, deps } => {
                    crate::debug!("reload"; "deps for {}: {} entries", path, deps.len());
                    self.registry.add_dependencies(&path, deps);
                }

                ReloadMsg::Sync { modules, resources } => {
                    let command = self.sync_command(modules, resources);
                    if self.push(command).await.is_err() {
                        return;
                    }
                }

                ReloadMsg::Shutdown => {
                    crate::debug!("reload"; "shutting down");
                    break;
                }
            }
        }
    }

    fn classify_all(&self, events: &[crate::reload::FileChangeEvent]) -> Vec<ProtocolCommand> {
        let config = cfg();
        let classifier = Classifier {
            registry: &self.registry,
            mapping: &self.mapping,
            types: &config.types,
            root: &config.root,
            hmr: config.hmr.enable,
        };

        events
            .iter()
            .flat_map(|event| classifier.classify(event))
            .collect()
    }

    /// Answer a client sync request with fresh metadata for each path.
    fn sync_command(&self, modules: Vec<String>, resources: Vec<String>) -> ProtocolCommand {
        let config = cfg();
        let probe = |path: &String| FileInfo::probe(path, &config.root, &config.types);

        ProtocolCommand::SyncModules {
            modules: modules.iter().map(probe).collect(),
            resources: resources.iter().map(probe).collect(),
        }
    }

    async fn push(&self, command: ProtocolCommand) -> Result<(), ()> {
        crate::debug!("reload"; "push: {}", command.to_json());
        self.ws_tx
            .send(WsMsg::Command(command))
            .await
            .map_err(|_| ())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::{ChangeKind, FileChangeEvent};

    fn channels() -> (
        mpsc::Sender<ReloadMsg>,
        mpsc::Receiver<WsMsg>,
        tokio::task::JoinHandle<()>,
    ) {
        let (reload_tx, reload_rx) = mpsc::channel(8);
        let (ws_tx, ws_rx) = mpsc::channel(8);
        let actor = ReloadActor::new(reload_rx, ws_tx);
        let handle = tokio::spawn(actor.run());
        (reload_tx, ws_rx, handle)
    }

    #[tokio::test]
    async fn test_change_produces_command() {
        let (tx, mut rx, handle) = channels();

        let event = FileChangeEvent {
            kind: ChangeKind::Changed,
            path: "index.html".into(),
            info: crate::core::FileInfo::removed("index.html", &crate::core::TypeTable::default()),
        };
        tx.send(ReloadMsg::Changes(vec![event])).await.unwrap();

        match rx.recv().await.unwrap() {
            WsMsg::Command(cmd) => assert!(cmd.to_json().contains("reloadPage")),
            _ => panic!("expected command"),
        }

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_registered_deps_redirect_changes() {
        let (tx, mut rx, handle) = channels();

        tx.send(ReloadMsg::RegisterDeps {
            path: "app.js".into(),
            deps: vec!["lib/util.js".into()],
        })
        .await
        .unwrap();

        let event = FileChangeEvent {
            kind: ChangeKind::Changed,
            path: "lib/util.js".into(),
            info: crate::core::FileInfo::removed("lib/util.js", &crate::core::TypeTable::default()),
        };
        tx.send(ReloadMsg::Changes(vec![event])).await.unwrap();

        match rx.recv().await.unwrap() {
            WsMsg::Command(cmd) => assert_eq!(cmd.path(), Some("app.js")),
            _ => panic!("expected command"),
        }

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_answers_with_file_info() {
        let (tx, mut rx, handle) = channels();

        tx.send(ReloadMsg::Sync {
            modules: vec!["a.js".into(), "b.js".into()],
            resources: vec![],
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            WsMsg::Command(ProtocolCommand::SyncModules { modules, resources }) => {
                assert_eq!(modules.len(), 2);
                assert!(resources.is_empty());
            }
            _ => panic!("expected syncModule"),
        }

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_config_reload_reannounces_init() {
        let (tx, mut rx, handle) = channels();

        tx.send(ReloadMsg::ConfigReloaded).await.unwrap();

        match rx.recv().await.unwrap() {
            WsMsg::Command(cmd) => assert!(cmd.to_json().contains(r#""type":"init""#)),
            _ => panic!("expected init"),
        }

        tx.send(ReloadMsg::Shutdown).await.unwrap();
        handle.await.unwrap();
    }
}
