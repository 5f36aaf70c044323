//! HTTP response interception and rewriting.
//!
//! Wraps a response sink with a decorator that buffers qualifying HTML
//! bodies, runs the configured injection tasks over them, and finalizes
//! headers so compression and content-length survive the rewrite.
//!
//! The wrapper implements the same capability surface as the sink it
//! decorates ([`ResponseSink`]): header set, head write, body write, end.
//! One interceptor is constructed per response and composed in front of
//! the real sink; nothing is shared between responses.
//!
//! State machine: `Idle → Buffering → Finalizing → Done`. A response body
//! is injected at most once no matter how many writes occurred.

use super::encoding::{self, BodyEncoding};
use crate::utils::mime;

// =============================================================================
// Response capability surface
// =============================================================================

/// Minimal header/body lifecycle of an HTTP response object.
pub trait ResponseSink {
    fn get_header(&self, name: &str) -> Option<String>;
    fn set_header(&mut self, name: &str, value: &str);
    fn write_head(&mut self, status: u16);
    fn write(&mut self, chunk: &[u8]);
    fn end(&mut self, chunk: Option<&[u8]>);
}

// =============================================================================
// Injection tasks
// =============================================================================

/// Request data available to task guards.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub url: String,
}

type ApplyFn = Box<dyn Fn(&str, &RequestContext) -> String + Send + Sync>;
type GuardFn = Box<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// One content-rewrite step applied to qualifying responses.
///
/// The task list is configured once at server startup and read-only during
/// request handling. A task without a guard runs whenever the response
/// qualified as HTML; a task with a guard runs whenever its guard passes.
pub struct InjectionTask {
    apply: ApplyFn,
    guard: Option<GuardFn>,
}

impl InjectionTask {
    pub fn new(apply: impl Fn(&str, &RequestContext) -> String + Send + Sync + 'static) -> Self {
        Self {
            apply: Box::new(apply),
            guard: None,
        }
    }

    pub fn with_guard(mut self, guard: impl Fn(&RequestContext) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }
}

// =============================================================================
// Interceptor
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Buffering,
    Finalizing,
    Done,
}

/// Per-response interception state, composed in front of a [`ResponseSink`].
pub struct ResponseInterceptor<'t, S: ResponseSink> {
    inner: S,
    tasks: &'t [InjectionTask],
    request: RequestContext,
    state: State,
    /// Content-type verdict: `None` until a content-type header arrives
    qualified: Option<bool>,
    buffer: Vec<u8>,
    /// Content-length set by the application, held back until finalize
    saved_content_length: Option<String>,
}

impl<'t, S: ResponseSink> ResponseInterceptor<'t, S> {
    pub fn new(inner: S, tasks: &'t [InjectionTask], request: RequestContext) -> Self {
        Self {
            inner,
            tasks,
            request,
            state: State::Idle,
            qualified: None,
            buffer: Vec::new(),
            saved_content_length: None,
        }
    }

    /// Tear down the wrapper and return the underlying sink.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Whether body writes should be captured.
    ///
    /// True once the content-type qualified as HTML; before any
    /// content-type is known, only a passing task guard captures.
    fn interception_active(&self) -> bool {
        match self.qualified {
            Some(verdict) => verdict,
            None => self
                .tasks
                .iter()
                .any(|task| task.guard.as_ref().is_some_and(|g| g(&self.request))),
        }
    }

    /// Whether one task should run during finalize.
    fn task_applies(&self, task: &InjectionTask) -> bool {
        match &task.guard {
            Some(guard) => guard(&self.request),
            None => self.qualified == Some(true),
        }
    }

    /// Hand the held-back content-length to the sink unchanged.
    fn restore_content_length(&mut self) {
        if let Some(value) = self.saved_content_length.take() {
            self.inner.set_header("content-length", &value);
        }
    }

    /// Run the injection pipeline over the complete buffered body.
    fn finalize(&mut self) {
        self.state = State::Finalizing;
        let body = std::mem::take(&mut self.buffer);

        let declared = self.inner.get_header("content-encoding");
        let body_encoding = BodyEncoding::parse(declared.as_deref());

        let out = if body_encoding.round_trippable() {
            match encoding::decompress(&body, body_encoding) {
                Ok(decoded) => match String::from_utf8(decoded) {
                    Ok(mut content) => {
                        for task in self.tasks {
                            if self.task_applies(task) {
                                content = (task.apply)(&content, &self.request);
                            }
                        }
                        encoding::compress(content.as_bytes(), body_encoding)
                    }
                    // Not text after all: leave the original bytes alone
                    Err(_) => body,
                },
                Err(e) => {
                    crate::debug!("serve"; "decode failed, skipping injection: {}", e);
                    body
                }
            }
        } else {
            // Unknown compression: pass the body through untouched
            crate::debug!("serve"; "unsupported content-encoding, skipping injection");
            body
        };

        // Only responses that declared a length get one back
        if self.saved_content_length.take().is_some() {
            self.inner.set_header("content-length", &out.len().to_string());
        }

        self.inner.end(Some(&out));
        self.state = State::Done;
    }
}

impl<S: ResponseSink> ResponseSink for ResponseInterceptor<'_, S> {
    fn get_header(&self, name: &str) -> Option<String> {
        self.inner.get_header(name)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if self.qualified == Some(false) {
            self.inner.set_header(name, value);
            return;
        }

        if name.eq_ignore_ascii_case("content-length") {
            // The final length changes after injection - hold it back
            self.saved_content_length = Some(value.to_string());
            return;
        }

        if name.eq_ignore_ascii_case("content-type") {
            let verdict = mime::is_html(value);
            self.qualified = Some(verdict);
            if !verdict {
                // Not HTML: interception is over for this response
                self.restore_content_length();
            }
        }

        self.inner.set_header(name, value);
    }

    fn write_head(&mut self, status: u16) {
        self.inner.write_head(status);
    }

    fn write(&mut self, chunk: &[u8]) {
        if self.state == State::Done {
            return;
        }
        if self.interception_active() {
            self.state = State::Buffering;
            self.buffer.extend_from_slice(chunk);
        } else {
            self.inner.write(chunk);
        }
    }

    fn end(&mut self, chunk: Option<&[u8]>) {
        if self.state == State::Done {
            return;
        }

        if !self.interception_active() {
            // Never engaged: make sure a held-back length still goes out
            self.restore_content_length();
            self.inner.end(chunk);
            self.state = State::Done;
            return;
        }

        if let Some(chunk) = chunk {
            self.state = State::Buffering;
            self.buffer.extend_from_slice(chunk);
        }

        self.finalize();
    }
}

// =============================================================================
// Collected sink (tiny_http bridge)
// =============================================================================

/// Response sink that collects status, headers, and body into memory so a
/// `tiny_http::Response` can be built from the final state.
#[derive(Debug, Default)]
pub struct CollectedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub ended: bool,
}

impl CollectedResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            ..Self::default()
        }
    }
}

impl ResponseSink for CollectedResponse {
    fn get_header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn set_header(&mut self, name: &str, value: &str) {
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            entry.1 = value.to_string();
        } else {
            self.headers.push((name.to_lowercase(), value.to_string()));
        }
    }

    fn write_head(&mut self, status: u16) {
        self.status = status;
    }

    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    fn end(&mut self, chunk: Option<&[u8]>) {
        if let Some(chunk) = chunk {
            self.body.extend_from_slice(chunk);
        }
        self.ended = true;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn append_task(snippet: &'static str) -> InjectionTask {
        InjectionTask::new(move |content, _req| {
            crate::html::inject(
                content,
                crate::html::SnippetKind::Script,
                snippet,
                crate::html::Placement::Append,
            )
        })
    }

    fn request() -> RequestContext {
        RequestContext {
            url: "/index.html".into(),
        }
    }

    fn run_response(
        tasks: &[InjectionTask],
        content_type: &str,
        content_length: bool,
        encoding_header: Option<&str>,
        chunks: &[&[u8]],
    ) -> CollectedResponse {
        let mut res = ResponseInterceptor::new(CollectedResponse::new(), tasks, request());
        res.set_header("content-type", content_type);
        if let Some(enc) = encoding_header {
            res.set_header("content-encoding", enc);
        }
        if content_length {
            let total: usize = chunks.iter().map(|c| c.len()).sum();
            res.set_header("content-length", &total.to_string());
        }
        res.write_head(200);
        for chunk in chunks {
            res.write(chunk);
        }
        res.end(None);
        res.into_inner()
    }

    #[test]
    fn test_html_body_injected() {
        let tasks = vec![append_task("/hotline.js")];
        let out = run_response(
            &tasks,
            "text/html",
            true,
            None,
            &[b"<html><body>hi</body></html>"],
        );

        let body = String::from_utf8(out.body.clone()).unwrap();
        assert!(body.contains(r#"<script src="/hotline.js"></script>"#));
        assert!(out.ended);
        assert_eq!(
            out.get_header("content-length").unwrap(),
            out.body.len().to_string()
        );
    }

    #[test]
    fn test_injected_at_most_once_across_chunked_writes() {
        let tasks = vec![append_task("/hotline.js")];
        let out = run_response(
            &tasks,
            "text/html",
            false,
            None,
            &[b"<html><body>", b"part one", b"part two", b"</body></html>"],
        );

        let body = String::from_utf8(out.body).unwrap();
        assert_eq!(body.matches("/hotline.js").count(), 1);
    }

    #[test]
    fn test_plain_text_passes_through_with_original_length() {
        // Non-HTML: interception disabled at header time, content-length
        // restored verbatim, writes go straight through
        let tasks = vec![append_task("/hotline.js")];
        let payload: &[u8] = b"just some text";
        let out = run_response(&tasks, "text/plain", true, None, &[payload]);

        assert_eq!(out.body, payload);
        assert_eq!(
            out.get_header("content-length").unwrap(),
            payload.len().to_string()
        );
        assert!(!String::from_utf8(out.body.clone()).unwrap().contains("hotline"));
    }

    #[test]
    fn test_gzip_body_round_trips_with_injection() {
        let tasks = vec![append_task("/hotline.js")];
        let html = b"<html><body>compressed</body></html>";
        let packed = encoding::compress(html, BodyEncoding::Gzip);

        let out = run_response(&tasks, "text/html", true, Some("gzip"), &[&packed]);

        let unpacked = encoding::decompress(&out.body, BodyEncoding::Gzip).unwrap();
        let body = String::from_utf8(unpacked).unwrap();
        assert!(body.contains("/hotline.js"));
        assert!(body.contains("compressed"));
        assert_eq!(
            out.get_header("content-length").unwrap(),
            out.body.len().to_string()
        );
    }

    #[test]
    fn test_unsupported_encoding_passes_buffered_bytes_verbatim() {
        // A body claiming brotli: buffered, but sent through untouched
        let tasks = vec![append_task("/hotline.js")];
        let fake_br: &[u8] = b"\x0b\x02\x80brotli-ish bytes";
        let out = run_response(&tasks, "text/html", true, Some("br"), &[fake_br]);

        assert_eq!(out.body, fake_br);
        assert_eq!(
            out.get_header("content-length").unwrap(),
            fake_br.len().to_string()
        );
    }

    #[test]
    fn test_no_content_length_none_added() {
        let tasks = vec![append_task("/hotline.js")];
        let out = run_response(&tasks, "text/html", false, None, &[b"<body></body>"]);

        assert!(out.get_header("content-length").is_none());
        assert!(String::from_utf8(out.body).unwrap().contains("hotline"));
    }

    #[test]
    fn test_guarded_task_runs_without_content_type() {
        // No content-type header ever set: only the guarded task captures
        let tasks = vec![
            InjectionTask::new(|content, _| format!("{content}<!-- guarded -->"))
                .with_guard(|req| req.url.ends_with(".html")),
        ];

        let mut res = ResponseInterceptor::new(CollectedResponse::new(), &tasks, request());
        res.write_head(200);
        res.write(b"<body></body>");
        res.end(None);
        let out = res.into_inner();

        assert!(String::from_utf8(out.body).unwrap().contains("guarded"));
    }

    #[test]
    fn test_guarded_task_skipped_when_guard_fails() {
        let tasks = vec![
            InjectionTask::new(|content, _| format!("{content}<!-- guarded -->"))
                .with_guard(|req| req.url.ends_with(".xhtml")),
        ];
        let out = run_response(&tasks, "text/html", false, None, &[b"<body></body>"]);

        // HTML qualified, body buffered, but the guard says no
        assert!(!String::from_utf8(out.body).unwrap().contains("guarded"));
    }

    #[test]
    fn test_end_with_final_chunk() {
        let tasks = vec![append_task("/hotline.js")];
        let mut res = ResponseInterceptor::new(CollectedResponse::new(), &tasks, request());
        res.set_header("content-type", "text/html");
        res.write(b"<html><body>");
        res.end(Some(b"</body></html>"));
        let out = res.into_inner();

        let body = String::from_utf8(out.body).unwrap();
        assert!(body.starts_with("<html><body>"));
        assert_eq!(body.matches("/hotline.js").count(), 1);
    }

    #[test]
    fn test_calls_after_end_are_ignored() {
        let tasks = vec![append_task("/hotline.js")];
        let mut res = ResponseInterceptor::new(CollectedResponse::new(), &tasks, request());
        res.set_header("content-type", "text/html");
        res.write(b"<body></body>");
        res.end(None);
        let len_after_end = {
            res.write(b"late write");
            res.end(Some(b"late end"));
            res.into_inner().body.len()
        };

        let mut reference = ResponseInterceptor::new(CollectedResponse::new(), &tasks, request());
        reference.set_header("content-type", "text/html");
        reference.write(b"<body></body>");
        reference.end(None);
        assert_eq!(len_after_end, reference.into_inner().body.len());
    }

    #[test]
    fn test_binary_body_mislabeled_as_html_left_alone() {
        let tasks = vec![append_task("/hotline.js")];
        let binary: &[u8] = &[0xff, 0xfe, 0x00, 0x80, 0x81];
        let out = run_response(&tasks, "text/html", true, None, &[binary]);
        assert_eq!(out.body, binary);
    }
}
