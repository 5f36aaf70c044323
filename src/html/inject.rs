//! Snippet injection into HTML documents.
//!
//! Inserts (or swaps in) a script/style snippet at a configured placement.
//! Injection is idempotent: a document that already contains the snippet
//! text is returned unchanged.

use super::scanner::{self, TagMatch};

/// What kind of snippet is being injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    Script,
    Style,
}

/// Where the snippet goes.
pub enum Placement<'a> {
    /// Immediately before the final `</body>` (script) or `</head>` (style).
    /// When the document has no such closing tag the snippet is appended to
    /// the end of the document; browsers handle this gracefully.
    Append,
    /// Immediately before the first element the scanner reports; scanning
    /// stops after the first match.
    Prepend,
    /// Custom per-element replacement. Receives each scanned element and
    /// returns `Some(replacement)` to rewrite it, targeting a specific
    /// existing tag instead of inserting a new one.
    Replace(&'a mut dyn FnMut(&TagMatch) -> Option<String>),
}

/// Inject `snippet` into `html`.
///
/// `snippet` is either a bare URL (wrapped into a canonical tag for `kind`)
/// or a literal tag string starting with `<script`/`<style`/`<link` (used
/// verbatim).
pub fn inject(html: &str, kind: SnippetKind, snippet: &str, placement: Placement) -> String {
    let snippet = canonical_snippet(kind, snippet);
    if html.contains(&*snippet) {
        return html.to_string();
    }

    match placement {
        Placement::Append => {
            let close = match kind {
                SnippetKind::Script => "body",
                SnippetKind::Style => "head",
            };
            match scanner::last_closing_tag(html, close) {
                Some(pos) => {
                    let mut out = String::with_capacity(html.len() + snippet.len());
                    out.push_str(&html[..pos]);
                    out.push_str(&snippet);
                    out.push_str(&html[pos..]);
                    out
                }
                None => {
                    let mut out = String::with_capacity(html.len() + snippet.len());
                    out.push_str(html);
                    out.push_str(&snippet);
                    out
                }
            }
        }
        Placement::Prepend => {
            let mut done = false;
            let mut prepend = |tag: &TagMatch| {
                if done {
                    return None;
                }
                done = true;
                Some(format!("{snippet}{}", tag.matched))
            };
            scan(html, kind, &mut prepend)
        }
        Placement::Replace(replacer) => scan(html, kind, replacer),
    }
}

fn scan(
    html: &str,
    kind: SnippetKind,
    rewrite: &mut dyn FnMut(&TagMatch) -> Option<String>,
) -> String {
    match kind {
        SnippetKind::Script => scanner::scan_scripts(html, rewrite),
        SnippetKind::Style => scanner::scan_styles(html, rewrite),
    }
}

/// Wrap a bare URL into a canonical tag; literal tags pass through.
fn canonical_snippet(kind: SnippetKind, snippet: &str) -> std::borrow::Cow<'_, str> {
    let trimmed = snippet.trim_start();
    match kind {
        SnippetKind::Script if !trimmed.starts_with("<script") => {
            format!(r#"<script src="{snippet}"></script>"#).into()
        }
        SnippetKind::Style if !trimmed.starts_with("<style") && !trimmed.starts_with("<link") => {
            format!(r#"<link href="{snippet}" rel="stylesheet" />"#).into()
        }
        _ => snippet.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::scanner::TagKind;

    const PAGE: &str = "<html><head><title>t</title></head>\
                        <body><script src=\"app.js\"></script></body></html>";

    #[test]
    fn test_append_script_before_last_body_close() {
        let out = inject(PAGE, SnippetKind::Script, "reload.js", Placement::Append);
        let expected = r#"<script src="reload.js"></script></body></html>"#;
        assert!(out.ends_with(expected));
    }

    #[test]
    fn test_append_is_idempotent() {
        let once = inject(PAGE, SnippetKind::Script, "reload.js", Placement::Append);
        let twice = inject(&once, SnippetKind::Script, "reload.js", Placement::Append);
        assert_eq!(once, twice);
        assert_eq!(once.matches("reload.js").count(), 1);
    }

    #[test]
    fn test_append_targets_final_body_close() {
        let html = "<body>inner</body><body>outer</body>";
        let out = inject(html, SnippetKind::Script, "r.js", Placement::Append);
        assert!(out.starts_with("<body>inner</body><body>outer"));
        assert!(out.ends_with("<script src=\"r.js\"></script></body>"));
    }

    #[test]
    fn test_append_without_closing_tag_appends_to_end() {
        let html = "<p>fragment only</p>";
        let out = inject(html, SnippetKind::Script, "r.js", Placement::Append);
        assert_eq!(out, "<p>fragment only</p><script src=\"r.js\"></script>");
    }

    #[test]
    fn test_append_style_goes_to_head() {
        let out = inject(PAGE, SnippetKind::Style, "overlay.css", Placement::Append);
        assert!(out.contains(
            r#"<link href="overlay.css" rel="stylesheet" /></head>"#
        ));
    }

    #[test]
    fn test_literal_tag_used_verbatim() {
        let tag = r#"<script data-x="1" src="r.js"></script>"#;
        let out = inject(PAGE, SnippetKind::Script, tag, Placement::Append);
        assert!(out.contains(tag));
    }

    #[test]
    fn test_prepend_only_first_element() {
        let html = r#"<script src="a.js"></script><script src="b.js"></script>"#;
        let out = inject(html, SnippetKind::Script, "r.js", Placement::Prepend);
        assert_eq!(out.matches("r.js").count(), 1);
        let r_pos = out.find("r.js").unwrap();
        assert!(r_pos < out.find("a.js").unwrap());
    }

    #[test]
    fn test_replace_targets_specific_src() {
        let html = r#"<script src="loader.js"></script><script src="app.js"></script>"#;
        let mut swap = |tag: &TagMatch| {
            if tag.kind == TagKind::ExternalScript && tag.url.as_deref() == Some("loader.js") {
                Some(tag.matched.replace("loader.js", "hot-loader.js"))
            } else {
                None
            }
        };
        let out = inject(
            html,
            SnippetKind::Script,
            "hot-loader.js",
            Placement::Replace(&mut swap),
        );
        assert!(out.contains("hot-loader.js"));
        assert!(out.contains("app.js"));
        assert!(!out.contains(r#"src="loader.js""#));
    }

    #[test]
    fn test_snippet_already_present_unchanged() {
        let html = r#"<body><script src="r.js"></script></body>"#;
        let out = inject(html, SnippetKind::Script, "r.js", Placement::Append);
        assert_eq!(out, html);
    }
}
