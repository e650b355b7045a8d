//! Per-connection request loop.

use crate::{
    errors::ErrorKind,
    http::{request, response::Response},
    limits::{ConnLimits, ReqLimits, RespLimits},
    router::handler::Handler,
    server::server_impl::AllLimits,
};
use memchr::memmem;
use std::{io, sync::Arc};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite},
    time::timeout,
};

/// Serves the requests of one accepted connection through a mounted
/// handler. The response object is reused across the connection's
/// keep-alive requests.
pub(crate) struct HttpConnection<H: Handler> {
    handler: Arc<H>,
    response: Response,

    // Bytes received past the end of the previous request.
    pending: Vec<u8>,

    conn_limits: ConnLimits,
    req_limits: ReqLimits,
    resp_limits: RespLimits,
}

impl<H: Handler> HttpConnection<H> {
    pub(crate) fn new(handler: Arc<H>, limits: &AllLimits) -> Self {
        Self {
            handler,
            response: Response::with_limits(&limits.3),
            pending: Vec::new(),
            conn_limits: limits.1.clone(),
            req_limits: limits.2.clone(),
            resp_limits: limits.3.clone(),
        }
    }

    /// Runs the connection to completion: requests are served until the
    /// peer closes, keep-alive ends, or the per-connection request cap is
    /// reached. A malformed request gets a canned error response and
    /// closes the connection.
    pub(crate) async fn run<S>(&mut self, stream: &mut S) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let cap = self.conn_limits.max_requests_per_connection;

        for served in 1..=cap {
            match self.one_request(stream, served == cap).await {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(ErrorKind::Io(err)) => return Err(err.0),
                Err(err) => {
                    let version = self.response.version;
                    return writer::send_error(
                        stream,
                        &err,
                        version,
                        self.conn_limits.socket_write_timeout,
                    )
                    .await;
                }
            }
        }

        Ok(())
    }

    // Serves one request. Returns whether the connection stays open.
    async fn one_request<S>(&mut self, stream: &mut S, force_close: bool) -> Result<bool, ErrorKind>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        self.response.reset(&self.resp_limits);

        let head = match self.read_head(stream).await? {
            Some(head) => head,
            // Peer closed between requests.
            None => return Ok(false),
        };

        let mut request = request::parse_head(&head, &self.req_limits)?;
        self.response.version = request.version();
        self.response.keep_alive = !force_close && wants_keep_alive(&request);

        if let Some(length) = request.content_length {
            let body = self.read_body(stream, length).await?;
            request.set_body(body);
        }

        self.handler.handle(&mut request, &mut self.response).await;

        let keep_alive = self.response.keep_alive;
        let deadline = self.conn_limits.socket_write_timeout;
        writer::write_bytes(stream, self.response.to_bytes(), deadline).await?;
        Ok(keep_alive)
    }

    // Reads up to and including the head terminator, starting from any
    // bytes left over by the previous request. Returns the head without
    // the terminator, or `None` on a clean close before the first byte;
    // body bytes already received stay in `pending`.
    async fn read_head<S>(&mut self, stream: &mut S) -> Result<Option<Vec<u8>>, ErrorKind>
    where
        S: AsyncRead + Unpin + Send,
    {
        let mut buf = std::mem::take(&mut self.pending);
        let mut chunk = [0u8; 4096];

        loop {
            if let Some(at) = memmem::find(&buf, b"\r\n\r\n") {
                self.pending = buf.split_off(at + 4);
                buf.truncate(at);
                return Ok(Some(buf));
            }
            if buf.len() > self.req_limits.head_size {
                return Err(ErrorKind::HeadTooLarge);
            }

            let n = self.timed_read(stream, &mut chunk).await?;
            if n == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    // Completes the body to `length` bytes, consuming `pending` first;
    // bytes past `length` stay pending for the next request.
    async fn read_body<S>(&mut self, stream: &mut S, length: usize) -> Result<Vec<u8>, ErrorKind>
    where
        S: AsyncRead + Unpin + Send,
    {
        if length > self.req_limits.body_size {
            return Err(ErrorKind::BodyTooLarge);
        }

        if self.pending.len() >= length {
            let rest = self.pending.split_off(length);
            return Ok(std::mem::replace(&mut self.pending, rest));
        }

        let mut body = std::mem::take(&mut self.pending);
        let mut chunk = [0u8; 4096];

        while body.len() < length {
            let n = self.timed_read(stream, &mut chunk).await?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }

            let needed = (length - body.len()).min(n);
            body.extend_from_slice(&chunk[..needed]);
            self.pending.extend_from_slice(&chunk[needed..n]);
        }

        Ok(body)
    }

    async fn timed_read<S>(&self, stream: &mut S, chunk: &mut [u8]) -> Result<usize, ErrorKind>
    where
        S: AsyncRead + Unpin + Send,
    {
        match timeout(self.conn_limits.socket_read_timeout, stream.read(chunk)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(io::Error::from(io::ErrorKind::TimedOut).into()),
        }
    }
}

fn wants_keep_alive(request: &crate::Request) -> bool {
    match request.header("connection") {
        Some(value) if value.eq_ignore_ascii_case("close") => false,
        Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
        _ => request.version().keep_alive_default(),
    }
}

pub(crate) mod writer {
    use crate::{errors::ErrorKind, http::types::Version};
    use std::{io, time::Duration};
    use tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        time::timeout,
    };

    pub(crate) async fn write_bytes<S>(
        stream: &mut S,
        bytes: &[u8],
        deadline: Duration,
    ) -> io::Result<()>
    where
        S: AsyncWrite + Unpin + Send,
    {
        match timeout(deadline, stream.write_all(bytes)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::from(io::ErrorKind::TimedOut)),
        }
    }

    pub(crate) async fn send_error<S>(
        stream: &mut S,
        err: &ErrorKind,
        version: Version,
        deadline: Duration,
    ) -> io::Result<()>
    where
        S: AsyncWrite + Unpin + Send,
    {
        write_bytes(stream, err.as_http(version), deadline).await
    }
}
