//! Parsed HTTP request and the head parser feeding it.

use crate::{errors::ErrorKind, http::types::Version, limits::ReqLimits};
use memchr::memchr;

/// A parsed HTTP request.
///
/// The request carries its method and path as verbatim strings: the method
/// token is whatever the client sent, compared by exact equality during
/// routing, and the path is never normalized.
///
/// # Routing view
///
/// [`path()`](Request::path) returns the *routing view* of the path. Prefix
/// delegation advances an internal offset instead of rewriting the stored
/// string, so after a request passes through a delegate the view shrinks by
/// the matched prefix while [`target()`](Request::target) keeps returning
/// the original path. Nested delegation compounds: `/a/b/c` routed through
/// delegates at `/a` and then `/b` is seen by the innermost handler as `/c`.
#[derive(Debug)]
pub struct Request {
    method: String,
    target: String,
    query: Option<String>,
    route_offset: usize,
    version: Version,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    pub(crate) content_length: Option<usize>,
}

impl Request {
    /// Creates a request from a method and a path, for dispatching outside
    /// a network connection (embedding, tests). No headers, no body,
    /// HTTP/1.1.
    ///
    /// Requests arriving over a [`Server`](crate::Server) connection are
    /// built by the head parser instead.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: path.into(),
            query: None,
            route_offset: 0,
            version: Version::Http11,
            headers: Vec::new(),
            body: Vec::new(),
            content_length: None,
        }
    }

    /// Returns the request method, verbatim as sent.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the routing view of the path: the original path minus every
    /// delegate prefix already stripped while routing this request.
    #[inline]
    pub fn path(&self) -> &str {
        &self.target[self.route_offset..]
    }

    /// Returns the original request path, unaffected by delegation.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the query string without the leading `?`, if one was present.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the protocol version.
    #[inline]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns the value of the first header with the given name.
    /// Names compare ASCII case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns all headers in arrival order.
    #[inline]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the request body.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    // Advances the routing view past a matched delegate prefix. Only the
    // dispatcher's delegate stage calls this.
    #[inline]
    pub(crate) fn strip_route_prefix(&mut self, len: usize) {
        debug_assert!(self.route_offset + len <= self.target.len());
        self.route_offset += len;
    }

    #[inline]
    pub(crate) fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }
}

// PARSER

/// Parses a complete request head (request line plus header lines, without
/// the terminating blank line) into a [`Request`] with an empty body.
///
/// The head is validated as UTF-8 once up front; afterwards all scanning
/// works on `&str` slices. The method token is accepted verbatim.
pub(crate) fn parse_head(head: &[u8], limits: &ReqLimits) -> Result<Request, ErrorKind> {
    let head = simdutf8::basic::from_utf8(head).map_err(|_| ErrorKind::InvalidEncoding)?;

    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(ErrorKind::InvalidRequestLine)?;
    let (method, target, version) = parse_request_line(request_line)?;

    let (target, query) = match memchr(b'?', target.as_bytes()) {
        Some(at) => (&target[..at], Some(target[at + 1..].to_owned())),
        None => (target, None),
    };

    let mut headers = Vec::new();
    let mut content_length = None;

    for line in lines {
        if headers.len() == limits.header_count {
            return Err(ErrorKind::TooManyHeaders);
        }

        let colon = memchr(b':', line.as_bytes()).ok_or(ErrorKind::InvalidHeader)?;
        let name = &line[..colon];
        let value = line[colon + 1..].trim();

        if name.is_empty() || name.contains(' ') {
            return Err(ErrorKind::InvalidHeader);
        }

        if name.eq_ignore_ascii_case("content-length") {
            let length = value
                .parse::<usize>()
                .map_err(|_| ErrorKind::InvalidContentLength)?;
            content_length = Some(length);
        }

        headers.push((name.to_owned(), value.to_owned()));
    }

    Ok(Request {
        method: method.to_owned(),
        target: target.to_owned(),
        query,
        route_offset: 0,
        version,
        headers,
        body: Vec::new(),
        content_length,
    })
}

// Splits `METHOD SP target SP version` without constraining the method
// token to any known set.
fn parse_request_line(line: &str) -> Result<(&str, &str, Version), ErrorKind> {
    let bytes = line.as_bytes();

    let first = memchr(b' ', bytes).ok_or(ErrorKind::InvalidRequestLine)?;
    let rest = &line[first + 1..];
    let second = memchr(b' ', rest.as_bytes()).ok_or(ErrorKind::InvalidRequestLine)?;

    let method = &line[..first];
    let target = &rest[..second];
    let version_token = &rest[second + 1..];

    if method.is_empty() || target.is_empty() {
        return Err(ErrorKind::InvalidRequestLine);
    }

    Ok((method, target, Version::from_token(version_token)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(head: &str) -> Result<Request, ErrorKind> {
        parse_head(head.as_bytes(), &ReqLimits::default())
    }

    #[test]
    fn request_line() {
        let req = parse("GET /api/users HTTP/1.1\r\nhost: localhost").unwrap();

        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/api/users");
        assert_eq!(req.query(), None);
        assert_eq!(req.version(), Version::Http11);
        assert_eq!(req.header("Host"), Some("localhost"));
    }

    #[test]
    fn any_method_token_is_accepted() {
        let req = parse("FROBNICATE /x HTTP/1.0").unwrap();

        assert_eq!(req.method(), "FROBNICATE");
        assert_eq!(req.version(), Version::Http10);
    }

    #[test]
    fn query_is_split_off_the_path() {
        let req = parse("GET /search?q=rust&page=2 HTTP/1.1").unwrap();

        assert_eq!(req.path(), "/search");
        assert_eq!(req.query(), Some("q=rust&page=2"));
        assert_eq!(req.target(), "/search");
    }

    #[test]
    fn header_values_are_trimmed_and_names_case_insensitive() {
        let req = parse("GET / HTTP/1.1\r\nContent-Type:  text/plain  \r\nX-Tag: a").unwrap();

        assert_eq!(req.header("content-type"), Some("text/plain"));
        assert_eq!(req.header("X-TAG"), Some("a"));
        assert_eq!(req.header("missing"), None);
        assert_eq!(req.headers().len(), 2);
    }

    #[test]
    fn content_length_is_validated() {
        let req = parse("POST / HTTP/1.1\r\ncontent-length: 42").unwrap();
        assert_eq!(req.content_length, Some(42));

        assert!(matches!(
            parse("POST / HTTP/1.1\r\ncontent-length: 4x2"),
            Err(ErrorKind::InvalidContentLength)
        ));
    }

    #[test]
    fn malformed_heads_are_rejected() {
        assert!(matches!(parse("GET/x"), Err(ErrorKind::InvalidRequestLine)));
        assert!(matches!(
            parse("GET /x"),
            Err(ErrorKind::InvalidRequestLine)
        ));
        assert!(matches!(
            parse(" /x HTTP/1.1"),
            Err(ErrorKind::InvalidRequestLine)
        ));
        assert!(matches!(
            parse("GET /x HTTP/3.0"),
            Err(ErrorKind::UnsupportedVersion)
        ));
        assert!(matches!(
            parse("GET / HTTP/1.1\r\nno-colon-here"),
            Err(ErrorKind::InvalidHeader)
        ));
        assert!(matches!(
            parse("GET / HTTP/1.1\r\nbad name: x"),
            Err(ErrorKind::InvalidHeader)
        ));

        let raw = b"GET /\xff\xfe HTTP/1.1";
        assert!(matches!(
            parse_head(raw, &ReqLimits::default()),
            Err(ErrorKind::InvalidEncoding)
        ));
    }

    #[test]
    fn header_count_limit() {
        let limits = ReqLimits {
            header_count: 2,
            ..ReqLimits::default()
        };
        let head = "GET / HTTP/1.1\r\na: 1\r\nb: 2\r\nc: 3";

        assert!(matches!(
            parse_head(head.as_bytes(), &limits),
            Err(ErrorKind::TooManyHeaders)
        ));
    }

    #[test]
    fn route_view_shrinks_without_touching_the_target() {
        let mut req = Request::new("GET", "/a/b/c");

        req.strip_route_prefix(2);
        assert_eq!(req.path(), "/b/c");
        assert_eq!(req.target(), "/a/b/c");

        req.strip_route_prefix(2);
        assert_eq!(req.path(), "/c");
        assert_eq!(req.target(), "/a/b/c");
    }
}
