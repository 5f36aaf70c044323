//! Change Classification Pipeline
//!
//! Pure functions mapping a file-change event to the reload commands it
//! should produce. No actor machinery, no side effects beyond logging and
//! the metadata re-probe for redirected targets.
//!
//! Resolution order for a changed path:
//! 1. livereload mapping (first regex rule wins)
//! 2. dependency registry (single-hop dependents)
//! 3. the changed path itself

use std::path::Path;

use crate::core::{FileInfo, FileType, TypeTable};

use super::command::ProtocolCommand;
use super::registry::{DependencyRegistry, LiveReloadMapping};

// =============================================================================
// Change events
// =============================================================================

/// What happened to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Deleted,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

/// A single file change reported by the watcher.
///
/// `path` is project-relative and slash-normalized; `info` was probed when
/// the event fired. Consumed once, never mutated.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    pub kind: ChangeKind,
    pub path: String,
    pub info: FileInfo,
}

// =============================================================================
// Command table
// =============================================================================

/// Which command family a classified change produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ReloadPage,
    ReloadStyle,
    ReloadImage,
    AddModule,
    UpdateModule,
    RemoveModule,
}

/// Map (file type, event kind, HMR flag) to a command kind.
///
/// Styles and images reload in place for every event kind; scripts get
/// granular module commands only when HMR is on; everything else (markup,
/// unknown types, scripts without HMR) falls back to a full page reload.
pub fn command_kind(file_type: Option<FileType>, kind: ChangeKind, hmr: bool) -> CommandKind {
    match (file_type, kind, hmr) {
        (Some(FileType::Script), ChangeKind::Added, true) => CommandKind::AddModule,
        (Some(FileType::Script), ChangeKind::Changed, true) => CommandKind::UpdateModule,
        (Some(FileType::Script), ChangeKind::Deleted, true) => CommandKind::RemoveModule,
        (Some(FileType::Style), _, _) => CommandKind::ReloadStyle,
        (Some(FileType::Image), _, _) => CommandKind::ReloadImage,
        (Some(FileType::Script), _, false) | (Some(FileType::Markup), _, _) | (None, _, _) => {
            CommandKind::ReloadPage
        }
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifies change events against the registry and mapping state.
///
/// Borrowed by the reload actor per event; holds no state of its own.
pub struct Classifier<'a> {
    pub registry: &'a DependencyRegistry,
    pub mapping: &'a LiveReloadMapping,
    pub types: &'a TypeTable,
    pub root: &'a Path,
    pub hmr: bool,
}

impl Classifier<'_> {
    /// Classify one event into the commands to push.
    ///
    /// One command per resolved target. A target that vanished between the
    /// event and the re-probe degrades to delete semantics; never an error.
    pub fn classify(&self, event: &FileChangeEvent) -> Vec<ProtocolCommand> {
        let targets = self.resolve_targets(&event.path);
        let redirected = !(targets.len() == 1 && targets[0] == event.path);

        targets
            .into_iter()
            .map(|target| {
                if redirected {
                    // The target file itself was not touched: re-derive its
                    // metadata fresh and treat it as changed, whatever the
                    // original event kind was.
                    let info = FileInfo::probe(&target, self.root, self.types);
                    let kind = if info.removed {
                        crate::log!("reload"; "target vanished during resolution: {}", target);
                        ChangeKind::Deleted
                    } else {
                        ChangeKind::Changed
                    };
                    self.build_command(target, kind, info)
                } else {
                    let kind = if event.info.removed && event.kind != ChangeKind::Deleted {
                        crate::log!("reload"; "file vanished before probe: {}", event.path);
                        ChangeKind::Deleted
                    } else {
                        event.kind
                    };
                    self.build_command(target, kind, event.info.clone())
                }
            })
            .collect()
    }

    /// Resolution order: livereload mapping, then dependents, then self.
    fn resolve_targets(&self, changed_path: &str) -> Vec<String> {
        if let Some(targets) = self.mapping.resolve(changed_path) {
            return targets.to_vec();
        }
        if let Some(dependents) = self.registry.find_dependents(changed_path) {
            return dependents;
        }
        vec![changed_path.to_string()]
    }

    fn build_command(&self, path: String, kind: ChangeKind, info: FileInfo) -> ProtocolCommand {
        match command_kind(info.file_type, kind, self.hmr) {
            CommandKind::ReloadPage => ProtocolCommand::ReloadPage { path },
            CommandKind::ReloadStyle => ProtocolCommand::ReloadStyle { path, info },
            CommandKind::ReloadImage => ProtocolCommand::ReloadImage { path, info },
            CommandKind::AddModule => ProtocolCommand::AddModule { path },
            CommandKind::UpdateModule => ProtocolCommand::UpdateModule { path, info },
            CommandKind::RemoveModule => ProtocolCommand::RemoveModule { path },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
