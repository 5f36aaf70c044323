//! Injection task list.
//!
//! Built once when the first response needs it, read-only afterwards.
//! Without HMR there is a single task appending the client bootstrap
//! script; with HMR the task instead swaps the page's module loader for
//! the HMR-capable one and puts the bootstrap script in front of it.

use std::sync::OnceLock;

use super::intercept::InjectionTask;
use crate::config::{HmrConfig, cfg};
use crate::html::{self, Placement, SnippetKind, TagKind, TagMatch};

static TASKS: OnceLock<Vec<InjectionTask>> = OnceLock::new();

/// The server-lifetime injection task list.
pub fn injection_tasks() -> &'static [InjectionTask] {
    TASKS.get_or_init(build_tasks)
}

fn build_tasks() -> Vec<InjectionTask> {
    let config = cfg();
    let client_url = config.client.script_url();

    if config.hmr.enable {
        let hmr = config.hmr.clone();
        let loader_url = format!("/{}", hmr.loader_path);
        vec![InjectionTask::new(move |content, _req| {
            replace_loader(content, &hmr, &client_url, &loader_url)
        })]
    } else {
        vec![InjectionTask::new(move |content, _req| {
            html::inject(content, SnippetKind::Script, &client_url, Placement::Append)
        })]
    }
}

/// Swap a recognized module-loader `src` for the HMR loader URL, with the
/// client bootstrap script inserted right before it.
fn replace_loader(content: &str, hmr: &HmrConfig, client_url: &str, loader_url: &str) -> String {
    let client_tag = format!(r#"<script src="{client_url}"></script>"#);
    let mut swap = |tag: &TagMatch| {
        let src = tag.url.as_deref()?;
        if tag.kind == TagKind::ExternalScript && hmr.is_loader(src) {
            let swapped = tag.matched.replace(src, loader_url);
            Some(format!("{client_tag}{swapped}"))
        } else {
            None
        }
    };

    html::inject(
        content,
        SnippetKind::Script,
        loader_url,
        Placement::Replace(&mut swap),
    )
}
