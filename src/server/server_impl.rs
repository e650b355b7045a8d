//! Server front end: accept loop, worker pool, builder.

use crate::{
    errors::ErrorKind,
    http::types::Version,
    limits::{ConnLimits, ReqLimits, RespLimits, ServerLimits, WaitStrategy},
    router::handler::Handler,
    server::connection::{writer, HttpConnection},
};
use crossbeam::queue::SegQueue;
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    task::yield_now,
    time::sleep as tokio_sleep,
};

/// An HTTP server that feeds accepted connections to a mounted [`Handler`],
/// typically a [`Dispatcher`](crate::Dispatcher).
///
/// Connections are accepted on one loop and served by a pre-spawned pool
/// of workers; connections arriving while the pending queue is full are
/// answered with a canned `503` (or dropped, per
/// [`ServerLimits::count_503_handlers`]).
///
/// # Examples
///
/// ```no_run
/// use strata_web::{Dispatcher, HandlerFn, Request, Response, Server, StatusCode};
/// use tokio::net::TcpListener;
///
/// #[tokio::main]
/// async fn main() {
///     let mut routes = Dispatcher::new();
///     routes
///         .register_path(
///             HandlerFn(|_req: &mut Request, resp: &mut Response| {
///                 resp.status(StatusCode::Ok).body("Hello, world!")
///             }),
///             "/",
///         )
///         .unwrap();
///
///     Server::builder()
///         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
///         .handler(routes)
///         .build()
///         .launch()
///         .await;
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    stream_queue: TcpQueue,
    error_queue: TcpQueue,
    server_limits: ServerLimits,
}

impl Server {
    /// Creates a new builder for configuring the server instance.
    #[inline]
    pub fn builder<H>() -> ServerBuilder<H>
    where
        H: Handler + 'static,
    {
        ServerBuilder {
            listener: None,
            handler: None,

            server_limits: None,
            connection_limits: None,
            request_limits: None,
            response_limits: None,
        }
    }

    /// Starts accepting connections. Runs forever.
    #[inline]
    pub async fn launch(self) {
        loop {
            let Ok(value) = self.listener.accept().await else {
                continue;
            };

            match self.stream_queue.len() < self.server_limits.max_pending_connections {
                true => self.stream_queue.push(value),
                false => self.error_queue.push(value),
            }
        }
    }

    #[inline]
    async fn get_stream(queue: &TcpQueue, wait: &WaitStrategy) -> (TcpStream, SocketAddr) {
        loop {
            if let Some(value) = queue.pop() {
                return value;
            }

            match wait {
                WaitStrategy::Yield => yield_now().await,
                WaitStrategy::Sleep(time) => tokio_sleep(*time).await,
            }
        }
    }
}

/// Builder for configuring and creating [`Server`] instances.
///
/// [`listener`](Self::listener) and [`handler`](Self::handler) are
/// required; every limits struct falls back to its `Default`.
pub struct ServerBuilder<H>
where
    H: Handler + 'static,
{
    listener: Option<TcpListener>,
    handler: Option<Arc<H>>,

    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
    request_limits: Option<ReqLimits>,
    response_limits: Option<RespLimits>,
}

impl<H> ServerBuilder<H>
where
    H: Handler + 'static,
{
    /// Sets the TCP listener the server accepts connections on.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Mounts the handler every request is dispatched through. Routing
    /// applications pass a configured [`Dispatcher`](crate::Dispatcher)
    /// here; registration is finished before this point, so the serving
    /// phase only ever reads it.
    ///
    /// **This is a required component.**
    #[inline(always)]
    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Configures accept-loop and worker-pool limits.
    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    /// Configures per-connection I/O limits.
    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Configures request parsing limits.
    #[inline(always)]
    pub fn request_limits(mut self, limits: ReqLimits) -> Self {
        self.request_limits = Some(limits);
        self
    }

    /// Configures response buffer limits.
    #[inline(always)]
    pub fn response_limits(mut self, limits: RespLimits) -> Self {
        self.response_limits = Some(limits);
        self
    }

    /// Finalizes the builder, spawns the worker pool and constructs a
    /// [`Server`].
    ///
    /// # Panics
    ///
    /// Panics when [`listener`](Self::listener) or
    /// [`handler`](Self::handler) was not called.
    #[inline]
    #[track_caller]
    pub fn build(self) -> Server {
        let (listener, handler, limits) = self.get_all_parts();

        let stream_queue = Arc::new(SegQueue::new());
        let error_queue = Arc::new(SegQueue::new());

        for _ in 0..limits.0.max_connections {
            Self::spawn_worker(&stream_queue, &limits, &handler);
        }
        if limits.0.count_503_handlers != 0 {
            for _ in 0..limits.0.count_503_handlers {
                Self::spawn_alarmist(&error_queue, &limits);
            }
        } else {
            Self::spawn_quiet_alarmist(&error_queue, &limits);
        }

        Server {
            listener,
            stream_queue,
            error_queue,
            server_limits: limits.0,
        }
    }

    #[inline]
    fn spawn_worker(queue: &TcpQueue, limits: &AllLimits, handler: &Arc<H>) {
        let queue = queue.clone();
        let wait = limits.0.wait_strategy.clone();
        let mut conn = HttpConnection::new(handler.clone(), limits);

        tokio::spawn(async move {
            loop {
                let (mut stream, _addr) = Server::get_stream(&queue, &wait).await;

                let _ = conn.run(&mut stream).await;
            }
        });
    }

    // Answers over-capacity connections with a canned 503.
    #[inline]
    fn spawn_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let wait = limits.0.wait_strategy.clone();
        let write_timeout = limits.1.socket_write_timeout;

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = Server::get_stream(&queue, &wait).await;

                let _ = writer::send_error(
                    &mut stream,
                    &ErrorKind::ServiceUnavailable,
                    Version::Http11,
                    write_timeout,
                )
                .await;
            }
        });
    }

    // Drops over-capacity connections without a reply.
    #[inline]
    fn spawn_quiet_alarmist(queue: &TcpQueue, limits: &AllLimits) {
        let queue = queue.clone();
        let wait = limits.0.wait_strategy.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = Server::get_stream(&queue, &wait).await;

                drop(stream);
            }
        });
    }

    #[inline]
    #[track_caller]
    fn get_all_parts(self) -> (TcpListener, Arc<H>, AllLimits) {
        (
            self.listener
                .expect("The `listener` method must be called to create"),
            self.handler
                .expect("The `handler` method must be called to create"),
            (
                self.server_limits.unwrap_or_default(),
                self.connection_limits.unwrap_or_default(),
                self.request_limits.unwrap_or_default(),
                self.response_limits.unwrap_or_default(),
            ),
        )
    }
}

type TcpQueue = Arc<SegQueue<(TcpStream, SocketAddr)>>;
pub(crate) type AllLimits = (ServerLimits, ConnLimits, ReqLimits, RespLimits);
