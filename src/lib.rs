//! strata_web - Layered HTTP request dispatcher
//!
//! A small routing library built around one component: the
//! [`Dispatcher`]. Incoming requests resolve through a fixed four-stage
//! pipeline (exact method+path match, exact path-only match,
//! longest-prefix delegation, then a fallback) and invoke exactly one
//! [`Handler`]. A bundled tokio [`Server`] mounts the dispatcher on TCP,
//! but any runtime that can produce a [`Request`] and accept a
//! [`Response`] can drive it.
//!
//! # Routing model
//!
//! - **Method-scoped exact routes** let `POST /x` differ from a catch-all
//!   `/x`. Method strings are matched verbatim, with no whitelist.
//! - **Method-agnostic exact routes** answer a path under any method.
//! - **Prefix delegates** hand a whole subtree to another handler. The
//!   matched prefix is stripped before forwarding, so independently built
//!   dispatchers nest: a [`Dispatcher`] is itself a [`Handler`].
//! - **The fallback** catches everything else; without one, the built-in
//!   `404` / `Not found` response is produced.
//!
//! # Quick start
//!
//! ```no_run
//! use strata_web::{Dispatcher, HandlerFn, Request, Response, Server, StatusCode};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut routes = Dispatcher::new();
//!     routes
//!         .register_path_method(
//!             HandlerFn(|_req: &mut Request, resp: &mut Response| {
//!                 resp.status(StatusCode::Ok).body("Hello, world!")
//!             }),
//!             "/hello",
//!             &["GET"],
//!         )
//!         .unwrap();
//!
//!     Server::builder()
//!         .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
//!         .handler(routes)
//!         .build()
//!         .launch()
//!         .await;
//! }
//! ```
//!
//! # Composing dispatchers
//!
//! ```
//! use strata_web::{Dispatcher, HandlerFn, Request, Response, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut api = Dispatcher::new();
//!     api.register_path(
//!         HandlerFn(|_req: &mut Request, resp: &mut Response| {
//!             resp.status(StatusCode::Ok).body("v2")
//!         }),
//!         "/version",
//!     )
//!     .unwrap();
//!
//!     let mut root = Dispatcher::new();
//!     root.delegate(api, "/api").unwrap();
//!
//!     // The sub-dispatcher sees `/version`: the `/api` prefix is
//!     // stripped during delegation.
//!     let mut req = Request::new("GET", "/api/version");
//!     let mut resp = Response::new();
//!     root.dispatch(&mut req, &mut resp).await;
//!
//!     assert_eq!(resp.status_code(), StatusCode::Ok);
//!     assert_eq!(resp.body_bytes(), b"v2");
//! }
//! ```
//!
//! # Concurrency
//!
//! Registration takes `&mut self` and happens during setup; dispatch takes
//! `&self`. Share a finished dispatcher behind an [`std::sync::Arc`] and
//! dispatch concurrently from as many tasks as needed: the registries
//! are only ever read while serving, and the borrow checker rules out
//! re-registration once the dispatcher is shared.

pub(crate) mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod router {
    pub(crate) mod dispatcher;
    pub(crate) mod handler;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod server_impl;
}
pub(crate) mod errors;
pub mod limits;

pub use crate::{
    errors::RegistrationError,
    http::{
        request::Request,
        response::{Handled, Response},
        types::{StatusCode, Version},
    },
    router::{
        dispatcher::Dispatcher,
        handler::{Handler, HandlerFn},
    },
    server::server_impl::{Server, ServerBuilder},
};
