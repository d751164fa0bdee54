//! Writing router responses onto the transport.

use may_minihttp::Response as RawResponse;
use tracing::debug;

use crate::context::Response;

/// Reason phrase for `status`, `"Unknown"` for unregistered codes.
pub(crate) fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// Static `Content-Type` header line for the content types the router and the
/// static file handler produce.
pub(crate) fn content_type_header(content_type: &str) -> &'static str {
    match content_type {
        "text/plain; charset=utf-8" | "text/plain" => "Content-Type: text/plain; charset=utf-8",
        "text/html; charset=utf-8" | "text/html" => "Content-Type: text/html; charset=utf-8",
        "text/css; charset=utf-8" | "text/css" => "Content-Type: text/css; charset=utf-8",
        "application/json" => "Content-Type: application/json",
        "application/javascript" => "Content-Type: application/javascript",
        "application/xml" => "Content-Type: application/xml",
        "application/wasm" => "Content-Type: application/wasm",
        "image/svg+xml" => "Content-Type: image/svg+xml",
        "image/png" => "Content-Type: image/png",
        "image/jpeg" => "Content-Type: image/jpeg",
        "image/gif" => "Content-Type: image/gif",
        "image/x-icon" => "Content-Type: image/x-icon",
        _ => "Content-Type: application/octet-stream",
    }
}

/// Copy status, content type and body of `response` onto `res`.
///
/// The transport only accepts `'static` header lines, so headers other than
/// `Content-Type` are not forwarded.
pub fn write_response(res: &mut RawResponse, response: Response) {
    let status = response.status();
    res.status_code(status as usize, status_reason(status));
    if let Some(content_type) = response.content_type() {
        res.header(content_type_header(content_type));
    }
    let dropped = response
        .headers()
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("content-type"))
        .count();
    if dropped > 0 {
        debug!(status, dropped, "Response headers not forwarded by transport");
    }
    res.body_vec(response.into_body());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(418), "I'm a teapot");
        assert_eq!(status_reason(599), "Unknown");
    }

    #[test]
    fn test_content_type_header() {
        assert_eq!(
            content_type_header("application/json"),
            "Content-Type: application/json"
        );
        assert_eq!(
            content_type_header("text/plain"),
            "Content-Type: text/plain; charset=utf-8"
        );
        assert_eq!(
            content_type_header("application/x-custom"),
            "Content-Type: application/octet-stream"
        );
    }
}
