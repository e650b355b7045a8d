//! HTTP response builder handed to handlers.

use crate::{
    http::types::{StatusCode, Version},
    limits::RespLimits,
};

/// Proof that a handler finalized its response.
///
/// The only way to obtain a `Handled` is to call a finalizing method such
/// as [`Response::body`], so a handler signature returning `Handled`
/// guarantees at the type level that exactly one complete response was
/// produced.
pub struct Handled(());

#[derive(Debug, Clone, Copy, PartialEq)]
enum ResponseState {
    Clean,
    Headers,
    Complete,
}

/// HTTP response builder.
///
/// Built by chaining methods in strict order:
/// [`status()`](Response::status) -> [`header()`](Response::header) (any
/// number) -> [`body()`](Response::body). The `content-length` and
/// `connection` headers are emitted automatically when the response is
/// serialized.
///
/// Instances are created by the serving layer and passed to
/// [`Handler::handle`](crate::Handler::handle); one instance is reused
/// across the keep-alive requests of a connection.
///
/// # Examples
/// ```
/// use strata_web::{Handled, Request, Response, StatusCode};
///
/// fn greet(_req: &mut Request, resp: &mut Response) -> Handled {
///     resp.status(StatusCode::Ok)
///         .header("content-type", "text/plain")
///         .body("Hello!")
/// }
/// ```
///
/// # Panics
/// Ordering violations panic in `debug` builds and are unchecked in
/// `release` builds.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    buffer: Vec<u8>,
    pub(crate) version: Version,
    pub(crate) keep_alive: bool,
    state: ResponseState,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Creates an empty response with default buffer limits, for
    /// dispatching outside a [`Server`](crate::Server) connection
    /// (embedding, tests).
    pub fn new() -> Self {
        Self::with_limits(&RespLimits::default())
    }

    pub(crate) fn with_limits(limits: &RespLimits) -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Vec::new(),
            body: Vec::new(),
            buffer: Vec::with_capacity(limits.default_capacity),
            version: Version::Http11,
            keep_alive: true,
            state: ResponseState::Clean,
        }
    }

    pub(crate) fn reset(&mut self, limits: &RespLimits) {
        if self.buffer.capacity() > limits.max_capacity {
            self.buffer = Vec::with_capacity(limits.default_capacity);
        } else {
            self.buffer.clear();
        }

        self.status = StatusCode::Ok;
        self.headers.clear();
        self.body.clear();
        self.version = Version::Http11;
        self.keep_alive = true;
        self.state = ResponseState::Clean;
    }

    // Serializes the finalized response into the reused buffer.
    pub(crate) fn to_bytes(&mut self) -> &[u8] {
        debug_assert!(
            self.state == ResponseState::Complete,
            "serializing a response no handler finalized",
        );

        self.buffer.clear();
        self.buffer
            .extend_from_slice(self.status.status_line(self.version).as_bytes());

        for (name, value) in &self.headers {
            self.buffer.extend_from_slice(name.as_bytes());
            self.buffer.extend_from_slice(b": ");
            self.buffer.extend_from_slice(value.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }

        self.buffer
            .extend_from_slice(format!("content-length: {}\r\n", self.body.len()).as_bytes());
        match self.keep_alive {
            true => self.buffer.extend_from_slice(b"connection: keep-alive\r\n"),
            false => self.buffer.extend_from_slice(b"connection: close\r\n"),
        }

        self.buffer.extend_from_slice(b"\r\n");
        self.buffer.extend_from_slice(&self.body);
        &self.buffer
    }
}

// Public API
impl Response {
    /// Sets the HTTP status code. Must be the first builder call.
    ///
    /// # Panics
    /// Panics in `debug` mode when called twice or after a finalizing
    /// method.
    #[inline]
    #[track_caller]
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Clean,
            "`status` must be the first builder call",
        );

        self.status = status;
        self.state = ResponseState::Headers;
        self
    }

    /// Appends a response header.
    ///
    /// `content-length` and `connection` are managed by the serving layer
    /// and must not be set here.
    ///
    /// # Panics
    /// Panics in `debug` mode when called before [`status`](Self::status)
    /// or after [`body`](Self::body).
    #[inline]
    #[track_caller]
    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        debug_assert!(
            self.state == ResponseState::Headers,
            "`header` must be called between `status` and `body`",
        );
        debug_assert!(
            !name.eq_ignore_ascii_case("content-length") && !name.eq_ignore_ascii_case("connection"),
            "`content-length` and `connection` are emitted automatically",
        );

        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Forces the connection to close after this response.
    #[inline]
    #[track_caller]
    pub fn close(&mut self) -> &mut Self {
        debug_assert!(
            self.state != ResponseState::Complete,
            "must be called before any finalizing method",
        );

        self.keep_alive = false;
        self
    }

    /// Sets the response body and finalizes the response.
    ///
    /// # Panics
    /// Panics in `debug` mode when called before [`status`](Self::status)
    /// or twice.
    #[inline]
    #[track_caller]
    pub fn body(&mut self, body: impl AsRef<[u8]>) -> Handled {
        debug_assert!(
            self.state == ResponseState::Headers,
            "`body` must follow `status`",
        );

        self.body.clear();
        self.body.extend_from_slice(body.as_ref());
        self.state = ResponseState::Complete;
        Handled(())
    }

    /// Returns the status code set so far.
    #[inline]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Returns the body written so far.
    #[inline]
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response() -> Response {
        Response::new()
    }

    #[test]
    fn fluent_build() {
        let mut resp = response();
        let _handled = resp
            .status(StatusCode::Created)
            .header("content-type", "text/plain")
            .body("made");

        assert_eq!(resp.status_code(), StatusCode::Created);
        assert_eq!(resp.body_bytes(), b"made");
        assert_eq!(
            std::str::from_utf8(resp.to_bytes()).unwrap(),
            "HTTP/1.1 201 Created\r\n\
             content-type: text/plain\r\n\
             content-length: 4\r\n\
             connection: keep-alive\r\n\
             \r\n\
             made",
        );
    }

    #[test]
    fn close_emits_connection_close() {
        let mut resp = response();
        let _handled = resp.status(StatusCode::Ok).close().body("");

        let raw = String::from_utf8(resp.to_bytes().to_vec()).unwrap();
        assert!(raw.contains("connection: close\r\n"));
        assert!(raw.contains("content-length: 0\r\n"));
    }

    #[test]
    fn http10_status_line() {
        let mut resp = response();
        resp.version = Version::Http10;
        let _handled = resp.status(StatusCode::NotFound).body("Not found");

        let raw = String::from_utf8(resp.to_bytes().to_vec()).unwrap();
        assert!(raw.starts_with("HTTP/1.0 404 Not Found\r\n"));
    }

    #[test]
    fn reset_recycles_the_instance() {
        let limits = RespLimits::default();
        let mut resp = Response::with_limits(&limits);
        let _handled = resp.status(StatusCode::Ok).header("x-a", "1").body("first");

        resp.reset(&limits);
        assert_eq!(resp.body_bytes(), b"");
        let _handled = resp.status(StatusCode::Accepted).body("second");

        let raw = String::from_utf8(resp.to_bytes().to_vec()).unwrap();
        assert!(raw.starts_with("HTTP/1.1 202 Accepted\r\n"));
        assert!(!raw.contains("x-a"));
        assert!(raw.ends_with("\r\n\r\nsecond"));
    }
}
