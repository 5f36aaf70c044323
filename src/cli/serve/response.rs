//! HTTP response handlers.

use super::intercept::{CollectedResponse, RequestContext, ResponseInterceptor, ResponseSink};
use super::tasks::injection_tasks;
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file through the injection pipeline.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    // Range requests (video/audio seeking) bypass interception - media is
    // never injection-qualified anyway
    if let Some(range) = get_range_header(&request) {
        return respond_range(request, path, content_type, &range);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    respond_intercepted(request, 200, content_type, body)
}

/// Run a response through the per-request interceptor and send the result.
fn respond_intercepted(
    request: Request,
    status: u16,
    content_type: &str,
    body: Vec<u8>,
) -> Result<()> {
    let ctx = RequestContext {
        url: request.url().to_string(),
    };
    let mut res = ResponseInterceptor::new(CollectedResponse::new(), injection_tasks(), ctx);

    res.set_header("content-type", content_type);
    res.set_header("content-length", &body.len().to_string());
    res.write_head(status);
    res.write(&body);
    res.end(None);

    send_collected(request, res.into_inner())
}

/// Build a tiny_http response from the finalized sink state.
fn send_collected(request: Request, collected: CollectedResponse) -> Result<()> {
    let mut response =
        Response::from_data(collected.body).with_status_code(StatusCode(collected.status));

    for (name, value) in &collected.headers {
        // tiny_http derives content-length from the body it is given
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            response = response.with_header(header);
        }
    }

    request.respond(response)?;
    Ok(())
}

/// Handle Range request for media files (video/audio seeking).
fn respond_range(
    request: Request,
    path: &Path,
    content_type: &'static str,
    range: &str,
) -> Result<()> {
    use std::io::{Read, Seek, SeekFrom};

    let file_size = fs::metadata(path)?.len();

    // Parse "bytes=start-end" format
    let range = range.strip_prefix("bytes=").unwrap_or(range);
    let (start, end) = parse_range(range, file_size)?;

    let length = end - start + 1;

    // Stream the requested range - no memory allocation for large ranges
    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(start))?;
    let reader = file.take(length);

    let content_range = format!("bytes {}-{}/{}", start, end, file_size);
    let response = Response::new(
        StatusCode(206),
        vec![
            Header::from_bytes("Content-Type", content_type).unwrap(),
            Header::from_bytes("Content-Range", content_range.as_bytes()).unwrap(),
            Header::from_bytes("Accept-Ranges", "bytes").unwrap(),
        ],
        reader,
        Some(length as usize),
        None,
    );

    request.respond(response)?;
    Ok(())
}

/// Parse Range header value "start-end" into (start, end) bytes.
fn parse_range(range: &str, file_size: u64) -> Result<(u64, u64)> {
    let range = range.trim();
    let parts: Vec<&str> = range.split('-').collect();

    let (start, end) = match parts.as_slice() {
        // "0-499" - specific range
        [s, e] if !s.is_empty() && !e.is_empty() => {
            let start: u64 = s.trim().parse().unwrap_or(0);
            let end: u64 = e.trim().parse().unwrap_or(file_size - 1);
            (start, end.min(file_size - 1))
        }
        // "0-" - from start to end
        [s, ""] if !s.is_empty() => {
            let start: u64 = s.trim().parse().unwrap_or(0);
            (start, file_size - 1)
        }
        // "-500" - last 500 bytes
        ["", e] if !e.is_empty() => {
            let suffix: u64 = e.trim().parse().unwrap_or(0);
            let start = file_size.saturating_sub(suffix);
            (start, file_size - 1)
        }
        _ => (0, file_size - 1),
    };

    Ok((start, end))
}

/// Extract Range header from request.
fn get_range_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case("range"))
        .map(|h| h.value.to_string())
}

/// Respond with 404 (custom 404.html through the injector, or plain text).
pub fn respond_not_found(request: Request, serve_root: &Path) -> Result<()> {
    use crate::utils::mime::types::{HTML, PLAIN};

    let custom_404 = serve_root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom
        && let Ok(body) = fs::read(&custom_404)
    {
        return respond_intercepted(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use crate::utils::mime::types::PLAIN;
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with the client bootstrap script from memory.
pub fn respond_client_js(request: Request, ws_port: u16) -> Result<()> {
    use crate::embed::serve::{CLIENT_JS, ClientVars};
    use crate::utils::mime::types::JAVASCRIPT;

    let body = CLIENT_JS.render(&ClientVars { ws_port });
    send_body(request, 200, JAVASCRIPT, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_specific() {
        assert_eq!(parse_range("0-499", 1000).unwrap(), (0, 499));
        assert_eq!(parse_range("500-1999", 1000).unwrap(), (500, 999));
    }

    #[test]
    fn test_parse_range_open_ended() {
        assert_eq!(parse_range("200-", 1000).unwrap(), (200, 999));
    }

    #[test]
    fn test_parse_range_suffix() {
        assert_eq!(parse_range("-300", 1000).unwrap(), (700, 999));
    }
}
