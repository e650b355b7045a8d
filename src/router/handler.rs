//! The handler capability the dispatcher stores and invokes.

use crate::http::{
    request::Request,
    response::{Handled, Response},
};
use async_trait::async_trait;
use std::sync::Arc;

/// A capability that takes a request and produces a response.
///
/// Implemented by closure adapters ([`HandlerFn`]), by application logic,
/// and by [`Dispatcher`](crate::Dispatcher) itself. The last one is what
/// makes routing trees composable: anything that handles requests can be
/// bound to an exact route, mounted as a prefix delegate, or installed as
/// the fallback.
///
/// The request is taken as `&mut` because the delegate stage advances the
/// request's routing view before forwarding it; exclusive access keeps that
/// rewrite request-scoped.
///
/// # Examples
///
/// ```
/// use strata_web::{Handled, Handler, Request, Response, StatusCode};
/// use async_trait::async_trait;
///
/// struct Greeter;
///
/// #[async_trait]
/// impl Handler for Greeter {
///     async fn handle(&self, _req: &mut Request, resp: &mut Response) -> Handled {
///         resp.status(StatusCode::Ok).body("hello")
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles one request, finalizing exactly one response.
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Handled;
}

// A shared handler is a handler, so one instance can back several routes
// and an `Arc<Dispatcher>` can be mounted as a delegate.
#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Handled {
        (**self).handle(request, response).await
    }
}

/// Adapts a plain function or closure into a [`Handler`].
///
/// # Examples
///
/// ```
/// use strata_web::{Dispatcher, HandlerFn, Request, Response, StatusCode};
///
/// let mut routes = Dispatcher::new();
/// routes
///     .register_path(
///         HandlerFn(|_req: &mut Request, resp: &mut Response| {
///             resp.status(StatusCode::Ok).body("pong")
///         }),
///         "/ping",
///     )
///     .unwrap();
/// ```
pub struct HandlerFn<F>(pub F);

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Request, &mut Response) -> Handled + Send + Sync,
{
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Handled {
        (self.0)(request, response)
    }
}
