//! HTML tag scanning.
//!
//! Single-pass scanners over HTML text that locate `<script>` elements (or,
//! in the style variant, `<link>`/`<style>` elements) and hand each to a
//! caller-supplied rewrite callback. A single combined regular expression
//! matches comments first so commented-out tags are never rewritten.
//!
//! The scanners are lexical, not a parser: malformed or unterminated tags
//! simply don't match and are left byte-identical in the output. Scanning
//! never fails.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Comments first (never rewritten), then whole script elements.
static SCRIPT_ELEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--(.*?)(?:-->|$)|(\s*<script([^>]*)>(.*?)</script>\n?)")
        .expect("script element regex")
});

/// Comments, then void `<link>` elements, then `<style>` elements.
static LINK_STYLE_ELEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--(.*?)(?:-->|$)|(?:\s*(<link([^>]*?)/?>)|(<style([^>]*)>(.*?)</style>))\n?")
        .expect("link/style element regex")
});

static TYPE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)type=(?:"([^"]*)"|'([^']*)')"#).expect("type attr regex"));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s*src=(?:"([^"]+)"|'([^']+)')"#).expect("src attr regex"));
static HREF_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s*href=(?:"([^"]+)"|'([^']+)')"#).expect("href attr regex")
});
static REL_STYLESHEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)rel=(?:"stylesheet"|'stylesheet')"#).expect("rel attr regex")
});

/// MIME types treated as executable script when a `type` attribute is present.
const SCRIPT_TYPES: [&str; 2] = ["text/javascript", "application/javascript"];

/// Classification of a scanned element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<script src="...">` with an empty body
    ExternalScript,
    /// `<script>` with inline executable content
    InlineScript,
    /// `<script type="...">` carrying a non-executable payload (templates, JSON)
    OpaqueScript,
    /// `<link rel="stylesheet" href="...">`
    ExternalStylesheet,
    /// `<style>` element
    InlineStyle,
    /// `<link>` that is not a stylesheet
    OtherLink,
}

/// Descriptor handed to the rewrite callback for each scanned element.
#[derive(Debug, Clone)]
pub struct TagMatch<'a> {
    /// The original matched text, exactly as it appears in the document
    pub matched: &'a str,
    pub kind: TagKind,
    /// Extracted `src`/`href` for external references
    pub url: Option<String>,
    /// Remaining attribute text (with `src`/`href` removed for external refs)
    pub attrs: String,
    /// Trimmed inline content
    pub body: String,
}

/// Rewrite callback: return `Some(replacement)` to rewrite the element,
/// `None` to leave it unchanged.
pub type TagRewriter<'r> = dyn FnMut(&TagMatch) -> Option<String> + 'r;

/// Scan `<script>` elements, invoking `rewrite` for each one found.
///
/// HTML comments are passed through unmodified and never reported.
pub fn scan_scripts(html: &str, rewrite: &mut TagRewriter) -> String {
    SCRIPT_ELEM
        .replace_all(html, |caps: &Captures| {
            let all = &caps[0];
            if caps.get(1).is_some() {
                return all.to_string();
            }

            let attrs = caps.get(3).map_or("", |m| m.as_str());
            let body = caps.get(4).map_or("", |m| m.as_str()).trim();

            let tag = if body.is_empty()
                && let Some(src) = first_group(&SRC_ATTR, attrs)
            {
                TagMatch {
                    matched: all,
                    kind: TagKind::ExternalScript,
                    url: Some(src),
                    attrs: strip_attr(&SRC_ATTR, attrs),
                    body: String::new(),
                }
            } else if is_executable_type(attrs) {
                TagMatch {
                    matched: all,
                    kind: TagKind::InlineScript,
                    url: None,
                    attrs: attrs.to_string(),
                    body: body.to_string(),
                }
            } else {
                TagMatch {
                    matched: all,
                    kind: TagKind::OpaqueScript,
                    url: None,
                    attrs: attrs.to_string(),
                    body: body.to_string(),
                }
            };

            rewrite(&tag).unwrap_or_else(|| all.to_string())
        })
        .into_owned()
}

/// Scan `<link>` and `<style>` elements, invoking `rewrite` for each.
pub fn scan_styles(html: &str, rewrite: &mut TagRewriter) -> String {
    LINK_STYLE_ELEM
        .replace_all(html, |caps: &Captures| {
            let all = &caps[0];
            if caps.get(1).is_some() {
                return all.to_string();
            }

            let tag = if let Some(link_attrs) = caps.get(3) {
                let attrs = link_attrs.as_str();
                if REL_STYLESHEET.is_match(attrs)
                    && let Some(href) = first_group(&HREF_ATTR, attrs)
                {
                    TagMatch {
                        matched: all,
                        kind: TagKind::ExternalStylesheet,
                        url: Some(href),
                        attrs: strip_attr(&HREF_ATTR, attrs),
                        body: String::new(),
                    }
                } else {
                    TagMatch {
                        matched: all,
                        kind: TagKind::OtherLink,
                        url: None,
                        attrs: attrs.to_string(),
                        body: String::new(),
                    }
                }
            } else {
                let attrs = caps.get(5).map_or("", |m| m.as_str());
                let body = caps.get(6).map_or("", |m| m.as_str()).trim();
                TagMatch {
                    matched: all,
                    kind: TagKind::InlineStyle,
                    url: None,
                    attrs: attrs.to_string(),
                    body: body.to_string(),
                }
            };

            rewrite(&tag).unwrap_or_else(|| all.to_string())
        })
        .into_owned()
}

/// Locate the final closing tag (`</body>`, `</head>`) in a document.
///
/// Returns the byte offset of the match start, tolerating whitespace and
/// mixed case inside the tag.
pub fn last_closing_tag(html: &str, tag: &str) -> Option<usize> {
    let pattern = format!(r"(?i)<\s*/\s*{tag}\s*>");
    let regex = Regex::new(&pattern).ok()?;
    regex.find_iter(html).last().map(|m| m.start())
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// No `type` attribute, or one carrying a known JavaScript MIME type.
fn is_executable_type(attrs: &str) -> bool {
    match first_group(&TYPE_ATTR, attrs) {
        None => true,
        Some(value) => SCRIPT_TYPES.contains(&value.to_ascii_lowercase().as_str()),
    }
}

/// First non-empty capture group of a double/single-quoted attribute match.
fn first_group(regex: &Regex, attrs: &str) -> Option<String> {
    let caps = regex.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Remove an attribute from the attribute text, trimming trailing space.
fn strip_attr(regex: &Regex, attrs: &str) -> String {
    regex.replace(attrs, "").trim_end().to_string()
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
