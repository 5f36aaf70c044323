//! Resource dependency tracking and livereload path mapping.
//!
//! Two independent lookup structures feed target resolution:
//!
//! - [`DependencyRegistry`]: which resources depend on a changed path.
//!   A forward-only map from resource to its dependency set; reverse lookup
//!   is a single-hop linear scan (no transitive resolution).
//! - [`LiveReloadMapping`]: ordered regex rules redirecting a changed path
//!   to one or more configured target resources; first match wins.
//!
//! Both are owned by the reload actor: constructed at server start, reset
//! on watcher-config reload, never touched from request handling.

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::utils::path::normalize_slashes;

// =============================================================================
// Dependency Registry
// =============================================================================

/// Forward map: resource path -> set of paths it depends on.
///
/// # Invariants
/// - Keys and set members are normalized (slash-separated) strings
/// - Dependency sets are duplicate-free (enforced by the set type)
/// - Reverse lookup is single-hop: chains of dependents are not followed
///
/// `remove()` deletes only the named resource's own entry. Other entries
/// that still list it as a dependency keep those edges; they are rewritten
/// wholesale the next time their owner reports its dependencies, and until
/// then they only make the removed path resolve back to its dependents,
/// which is the desired behavior if the file reappears.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    deps: FxHashMap<String, FxHashSet<String>>,
}

impl DependencyRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full dependency set for `resource`.
    pub fn set_dependencies(
        &mut self,
        resource: &str,
        deps: impl IntoIterator<Item = impl AsRef<str>>,
    ) {
        let resource = normalize_slashes(resource);
        let set: FxHashSet<String> = deps
            .into_iter()
            .map(|d| normalize_slashes(d.as_ref()))
            .collect();
        self.deps.insert(resource, set);
    }

    /// Union `deps` into the existing set for `resource`, creating the
    /// entry if absent.
    pub fn add_dependencies(
        &mut self,
        resource: &str,
        deps: impl IntoIterator<Item = impl AsRef<str>>,
    ) {
        let resource = normalize_slashes(resource);
        let set = self.deps.entry(resource).or_default();
        for dep in deps {
            set.insert(normalize_slashes(dep.as_ref()));
        }
    }

    /// Delete the entry for `resource` entirely.
    pub fn remove(&mut self, resource: &str) {
        self.deps.remove(&normalize_slashes(resource));
    }

    /// Resources whose dependency set contains `changed_path`.
    ///
    /// Single-hop linear scan over all entries. Returns `None` when no
    /// resource depends on the path.
    pub fn find_dependents(&self, changed_path: &str) -> Option<Vec<String>> {
        let changed = normalize_slashes(changed_path);
        let dependents: Vec<String> = self
            .deps
            .iter()
            .filter(|(_, deps)| deps.contains(&changed))
            .map(|(resource, _)| resource.clone())
            .collect();

        (!dependents.is_empty()).then_some(dependents)
    }

    /// Drop all entries (watcher-config reload).
    pub fn clear(&mut self) {
        self.deps.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

// =============================================================================
// LiveReload Mapping
// =============================================================================

/// Ordered `(pattern, targets)` rules from `[[livereload]]` config entries.
///
/// Each pattern is a regular expression tested against the changed path in
/// declaration order; the first match wins. Independent of the dependency
/// registry.
#[derive(Debug, Default)]
pub struct LiveReloadMapping {
    rules: Vec<(Regex, Vec<String>)>,
}

impl LiveReloadMapping {
    /// Build from `(pattern, targets)` pairs, skipping (and logging)
    /// patterns that fail to compile.
    pub fn new(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut rules = Vec::new();
        for (pattern, targets) in entries {
            match Regex::new(&pattern) {
                Ok(regex) => {
                    let targets = targets.iter().map(|t| normalize_slashes(t)).collect();
                    rules.push((regex, targets));
                }
                Err(e) => {
                    crate::log!("reload"; "invalid livereload pattern '{}': {}", pattern, e);
                }
            }
        }
        Self { rules }
    }

    /// Resolve a changed path to its configured reload targets.
    ///
    /// Returns the first matching rule's targets, or `None`.
    pub fn resolve(&self, changed_path: &str) -> Option<&[String]> {
        let changed = normalize_slashes(changed_path);
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(&changed))
            .map(|(_, targets)| targets.as_slice())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
