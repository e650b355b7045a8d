//! The layered request dispatcher.

use crate::{
    errors::RegistrationError,
    http::{
        request::Request,
        response::{Handled, Response},
        types::StatusCode,
    },
    router::handler::Handler,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

/// Maps an incoming request to a registered [`Handler`] through a layered
/// lookup: exact method+path match, exact path-only match, longest-prefix
/// delegation, then the fallback.
///
/// # Resolution order
///
/// [`dispatch`](Dispatcher::dispatch) runs a fixed four-stage pipeline and
/// invokes exactly one handler:
///
/// 1. **Method-scoped**: the handler registered via
///    [`register_path_method`](Dispatcher::register_path_method) for this
///    exact method string and exact path.
/// 2. **Method-agnostic**: the handler registered via
///    [`register_path`](Dispatcher::register_path) for this exact path,
///    whatever the method.
/// 3. **Delegate**: among the prefixes registered via
///    [`delegate`](Dispatcher::delegate) that literally prefix the path,
///    the longest one. The matched prefix is stripped from the request's
///    routing view before the delegate runs, so a mounted sub-dispatcher
///    sees only the path suffix.
/// 4. **Fallback**: the handler installed via
///    [`register`](Dispatcher::register), with the path untouched; absent
///    that, the built-in `404` / `Not found` response.
///
/// Method-specific routes shadow catch-all ones, exact routes shadow a
/// delegate owning the surrounding subtree, and delegation composes
/// independently built dispatchers into a tree: a `Dispatcher` implements
/// [`Handler`], so it mounts inside another `Dispatcher` like any handler.
///
/// # Matching semantics
///
/// Paths and methods are matched as verbatim strings: no normalization, no
/// trailing-slash canonicalization, no method whitelist, no path
/// parameters. Prefix matching is byte-wise, not segment-aware: a delegate
/// at `/foo` also claims `/foobar`. Registering twice under the same key
/// silently replaces the earlier handler.
///
/// # Setup, then serve
///
/// Registration needs `&mut self`; dispatch needs `&self`. Populate the
/// dispatcher first, then share it (typically behind [`Arc`]) with the
/// serving runtime. Once shared, the registries are immutable and
/// concurrent dispatch is plain shared reads.
///
/// # Examples
///
/// ```
/// use strata_web::{Dispatcher, HandlerFn, Request, Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() {
///     let mut users = Dispatcher::new();
///     users
///         .register_path_method(
///             HandlerFn(|_req: &mut Request, resp: &mut Response| {
///                 resp.status(StatusCode::Ok).body("alice, bob")
///             }),
///             "/list",
///             &["GET"],
///         )
///         .unwrap();
///
///     let mut root = Dispatcher::new();
///     root.delegate(users, "/api").unwrap();
///
///     let mut req = Request::new("GET", "/api/list");
///     let mut resp = Response::new();
///     root.dispatch(&mut req, &mut resp).await;
///
///     assert_eq!(resp.status_code(), StatusCode::Ok);
///     assert_eq!(resp.body_bytes(), b"alice, bob");
/// }
/// ```
#[derive(Default)]
pub struct Dispatcher {
    method_routes: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
    path_routes: HashMap<String, Arc<dyn Handler>>,
    delegates: HashMap<String, Arc<dyn Handler>>,
    fallback: Option<Arc<dyn Handler>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher: no routes, no delegates, no fallback.
    /// Until something is registered, every dispatch resolves to the
    /// built-in `404` / `Not found` response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to an exact `path` for each method string in
    /// `methods`.
    ///
    /// Method strings are stored verbatim and compared by exact equality
    /// at dispatch time; nothing restricts them to the standard HTTP
    /// method set. A later registration for the same (method, path) pair
    /// replaces the earlier one.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::NoMethods`] when `methods` is empty: there
    /// would be nothing to bind.
    pub fn register_path_method<H>(
        &mut self,
        handler: H,
        path: impl Into<String>,
        methods: &[&str],
    ) -> Result<(), RegistrationError>
    where
        H: Handler + 'static,
    {
        if methods.is_empty() {
            return Err(RegistrationError::NoMethods);
        }

        let handler: Arc<dyn Handler> = Arc::new(handler);
        let path = path.into();
        for method in methods {
            self.method_routes
                .entry((*method).to_owned())
                .or_default()
                .insert(path.clone(), handler.clone());
        }
        Ok(())
    }

    /// Binds `handler` to an exact `path`, regardless of method.
    ///
    /// A later registration for the same path replaces the earlier one.
    /// Infallible under correct use; the `Result` keeps the registration
    /// surface uniform.
    pub fn register_path<H>(
        &mut self,
        handler: H,
        path: impl Into<String>,
    ) -> Result<(), RegistrationError>
    where
        H: Handler + 'static,
    {
        self.path_routes.insert(path.into(), Arc::new(handler));
        Ok(())
    }

    /// Mounts `handler` as the delegate for every path starting with
    /// `prefix`.
    ///
    /// When the delegate fires, the matched prefix is stripped from the
    /// request's routing view, so a mounted sub-dispatcher resolves
    /// against the remaining suffix. The match is byte-wise: a delegate at
    /// `/foo` also claims `/foobar`. When several registered prefixes
    /// match, the longest fires. A later registration for the same prefix
    /// replaces the earlier one.
    pub fn delegate<H>(
        &mut self,
        handler: H,
        prefix: impl Into<String>,
    ) -> Result<(), RegistrationError>
    where
        H: Handler + 'static,
    {
        self.delegates.insert(prefix.into(), Arc::new(handler));
        Ok(())
    }

    /// Installs `handler` as the fallback for requests no other stage
    /// matches, replacing any previous fallback. The fallback sees the
    /// request path unmodified.
    pub fn register<H>(&mut self, handler: H)
    where
        H: Handler + 'static,
    {
        self.fallback = Some(Arc::new(handler));
    }

    /// Resolves `request` through the four-stage pipeline and invokes
    /// exactly one handler; with nothing matched and no fallback, writes
    /// the built-in `404` / `Not found` response.
    pub async fn dispatch(&self, request: &mut Request, response: &mut Response) -> Handled {
        if let Some(routes) = self.method_routes.get(request.method()) {
            if let Some(handler) = routes.get(request.path()) {
                return handler.handle(request, response).await;
            }
        }

        if let Some(handler) = self.path_routes.get(request.path()) {
            return handler.handle(request, response).await;
        }

        let matched = self
            .delegates
            .iter()
            .filter(|(prefix, _)| request.path().starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        if let Some((prefix, handler)) = matched {
            request.strip_route_prefix(prefix.len());
            return handler.handle(request, response).await;
        }

        match &self.fallback {
            Some(handler) => handler.handle(request, response).await,
            None => response.status(StatusCode::NotFound).body("Not found"),
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn handle(&self, request: &mut Request, response: &mut Response) -> Handled {
        self.dispatch(request, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::handler::HandlerFn;
    use std::sync::Mutex;

    fn fixed(
        status: StatusCode,
        body: &'static str,
    ) -> HandlerFn<impl Fn(&mut Request, &mut Response) -> Handled + Send + Sync> {
        HandlerFn(move |_req: &mut Request, resp: &mut Response| resp.status(status).body(body))
    }

    // Records the path it was invoked with, then answers 200.
    fn recording(
        seen: Arc<Mutex<Vec<String>>>,
    ) -> HandlerFn<impl Fn(&mut Request, &mut Response) -> Handled + Send + Sync> {
        HandlerFn(move |req: &mut Request, resp: &mut Response| {
            seen.lock().unwrap().push(req.path().to_owned());
            resp.status(StatusCode::Ok).body("ok")
        })
    }

    async fn dispatch(dispatcher: &Dispatcher, method: &str, path: &str) -> (u16, String) {
        let mut req = Request::new(method, path);
        let mut resp = Response::new();
        dispatcher.dispatch(&mut req, &mut resp).await;
        (
            resp.status_code().as_u16(),
            String::from_utf8(resp.body_bytes().to_vec()).unwrap(),
        )
    }

    #[tokio::test]
    async fn empty_dispatcher_is_always_not_found() {
        let dispatcher = Dispatcher::new();

        for _ in 0..3 {
            let (status, body) = dispatch(&dispatcher, "GET", "/anywhere").await;
            assert_eq!(status, 404);
            assert_eq!(body, "Not found");
        }
    }

    #[tokio::test]
    async fn method_scoped_route_matches() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "Found"), "/somewhere", &["POST"])
            .unwrap();

        assert_eq!(
            dispatch(&dispatcher, "POST", "/somewhere").await,
            (200, "Found".to_owned())
        );
        // Same path, different method: not a method-scoped hit.
        assert_eq!(dispatch(&dispatcher, "GET", "/somewhere").await.0, 404);
        // Same method, different path.
        assert_eq!(dispatch(&dispatcher, "POST", "/elsewhere").await.0, 404);
    }

    #[tokio::test]
    async fn one_registration_covers_several_methods() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "Found"), "/x", &["GET", "POST"])
            .unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/x").await.0, 200);
        assert_eq!(dispatch(&dispatcher, "POST", "/x").await.0, 200);
        assert_eq!(dispatch(&dispatcher, "DELETE", "/x").await.0, 404);
    }

    #[tokio::test]
    async fn path_route_matches_any_method() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "Found"), "/somewhere")
            .unwrap();

        for method in ["GET", "POST", "BREW"] {
            assert_eq!(
                dispatch(&dispatcher, method, "/somewhere").await,
                (200, "Found".to_owned())
            );
        }
    }

    #[tokio::test]
    async fn method_scoped_beats_path_route() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "method"), "/x", &["GET"])
            .unwrap();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "path"), "/x")
            .unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/x").await.1, "method");
        // The method tier knows nothing about POST, so the path tier wins.
        assert_eq!(dispatch(&dispatcher, "POST", "/x").await.1, "path");
    }

    #[tokio::test]
    async fn registered_method_missing_path_falls_through() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "method"), "/other", &["GET"])
            .unwrap();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "path"), "/y")
            .unwrap();

        // GET has a route table, but not for /y: stage 2 must still fire.
        assert_eq!(dispatch(&dispatcher, "GET", "/y").await.1, "path");
    }

    #[tokio::test]
    async fn exact_route_beats_delegate() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "exact"), "/foo")
            .unwrap();
        dispatcher
            .delegate(fixed(StatusCode::Ok, "delegated"), "/foo")
            .unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/foo").await.1, "exact");
        // Longer paths under the prefix still reach the delegate.
        assert_eq!(dispatch(&dispatcher, "GET", "/foo/bar").await.1, "delegated");
    }

    #[tokio::test]
    async fn delegate_strips_prefix_for_sub_dispatcher() {
        let mut sub = Dispatcher::new();
        sub.register_path_method(fixed(StatusCode::Ok, "Found"), "/bar/baz", &["GET"])
            .unwrap();

        let mut root = Dispatcher::new();
        root.delegate(sub, "/foo").unwrap();

        assert_eq!(
            dispatch(&root, "GET", "/foo/bar/baz").await,
            (200, "Found".to_owned())
        );
    }

    #[tokio::test]
    async fn nested_delegation_compounds() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut inner = Dispatcher::new();
        inner.register(recording(seen.clone()));

        let mut middle = Dispatcher::new();
        middle.delegate(inner, "/b").unwrap();

        let mut root = Dispatcher::new();
        root.delegate(middle, "/a").unwrap();

        assert_eq!(dispatch(&root, "GET", "/a/b/c").await.0, 200);
        assert_eq!(seen.lock().unwrap().as_slice(), ["/c"]);
    }

    #[tokio::test]
    async fn prefix_match_is_byte_wise_not_segment_aware() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher.delegate(recording(seen.clone()), "/foo").unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/foobar").await.0, 200);
        assert_eq!(seen.lock().unwrap().as_slice(), ["bar"]);
    }

    #[tokio::test]
    async fn longest_matching_prefix_wins() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .delegate(fixed(StatusCode::Ok, "short"), "/foo")
            .unwrap();
        dispatcher
            .delegate(recording(seen.clone()), "/foobar")
            .unwrap();

        let (_, body) = dispatch(&dispatcher, "GET", "/foobarbaz").await;
        assert_eq!(body, "ok");
        assert_eq!(seen.lock().unwrap().as_slice(), ["baz"]);

        // Paths only the shorter prefix covers still reach it.
        assert_eq!(dispatch(&dispatcher, "GET", "/foo/x").await.1, "short");
    }

    #[tokio::test]
    async fn later_registration_overwrites_earlier() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "first"), "/x", &["GET"])
            .unwrap();
        dispatcher
            .register_path_method(fixed(StatusCode::Ok, "second"), "/x", &["GET"])
            .unwrap();

        dispatcher
            .register_path(fixed(StatusCode::Ok, "first"), "/y")
            .unwrap();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "second"), "/y")
            .unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/x").await.1, "second");
        assert_eq!(dispatch(&dispatcher, "GET", "/y").await.1, "second");
    }

    #[tokio::test]
    async fn fallback_fires_last_with_unmodified_path() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register_path(fixed(StatusCode::Ok, "exact"), "/here")
            .unwrap();
        dispatcher
            .delegate(fixed(StatusCode::Ok, "delegated"), "/api")
            .unwrap();
        dispatcher.register(recording(seen.clone()));

        // Matched stages win over the fallback.
        assert_eq!(dispatch(&dispatcher, "GET", "/here").await.1, "exact");
        assert_eq!(dispatch(&dispatcher, "GET", "/api/x").await.1, "delegated");

        // Nothing matches: the fallback sees the path with no stripping.
        assert_eq!(dispatch(&dispatcher, "GET", "/nope/deep").await.1, "ok");
        assert_eq!(seen.lock().unwrap().as_slice(), ["/nope/deep"]);
    }

    #[tokio::test]
    async fn replacing_the_fallback() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(fixed(StatusCode::ImaTeapot, "first"));
        dispatcher.register(fixed(StatusCode::Ok, "second"));

        assert_eq!(
            dispatch(&dispatcher, "GET", "/x").await,
            (200, "second".to_owned())
        );
    }

    #[tokio::test]
    async fn empty_method_list_is_rejected() {
        let mut dispatcher = Dispatcher::new();
        let result = dispatcher.register_path_method(fixed(StatusCode::Ok, ""), "/x", &[]);

        assert_eq!(result, Err(RegistrationError::NoMethods));
        // The rejected registration left no trace.
        assert_eq!(dispatch(&dispatcher, "GET", "/x").await.0, 404);
    }

    #[tokio::test]
    async fn shared_handler_backs_several_routes() {
        let shared: Arc<dyn Handler> = Arc::new(fixed(StatusCode::Ok, "shared"));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register_path(shared.clone(), "/a").unwrap();
        dispatcher.register_path(shared, "/b").unwrap();

        assert_eq!(dispatch(&dispatcher, "GET", "/a").await.1, "shared");
        assert_eq!(dispatch(&dispatcher, "GET", "/b").await.1, "shared");
    }

    #[tokio::test]
    async fn shared_dispatcher_mounts_as_delegate() {
        let mut sub = Dispatcher::new();
        sub.register_path(fixed(StatusCode::Ok, "sub"), "/leaf").unwrap();
        let sub = Arc::new(sub);

        let mut root = Dispatcher::new();
        root.delegate(sub.clone(), "/v1").unwrap();
        root.delegate(sub, "/v2").unwrap();

        assert_eq!(dispatch(&root, "GET", "/v1/leaf").await.1, "sub");
        assert_eq!(dispatch(&root, "GET", "/v2/leaf").await.1, "sub");
    }
}
