//! `[[livereload]]` mapping rules.
//!
//! Ordered rules redirecting a changed path to the logical resource that
//! should actually reload. TOML arrays of tables are ordered, so rule
//! order in the file is evaluation order; the first match wins.
//!
//! # Example
//!
//! ```toml
//! [[livereload]]
//! pattern = "^css/.*"
//! target = "bundle.css"
//!
//! [[livereload]]
//! pattern = "^theme/.*"
//! target = ["light.css", "dark.css"]
//! ```

use serde::{Deserialize, Serialize};

use crate::reload::LiveReloadMapping;

/// One mapping rule: regex pattern to target resource(s).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveReloadRule {
    /// Regular expression tested against the changed (project-relative) path.
    pub pattern: String,

    /// Resource(s) to reload instead; scalar or list.
    pub target: TargetList,
}

/// Scalar-or-list target form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetList {
    One(String),
    Many(Vec<String>),
}

impl TargetList {
    /// Normalize to a list.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(target) => vec![target.clone()],
            Self::Many(targets) => targets.clone(),
        }
    }
}

/// Compile config rules into the runtime mapping.
pub fn build_mapping(rules: &[LiveReloadRule]) -> LiveReloadMapping {
    LiveReloadMapping::new(
        rules
            .iter()
            .map(|rule| (rule.pattern.clone(), rule.target.to_vec())),
    )
}
