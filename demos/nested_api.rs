//! Two independently built dispatchers composed through a prefix
//! delegate: `GET /api/users/list` reaches the users dispatcher as
//! `GET /list`.

use strata_web::{Dispatcher, HandlerFn, Request, Response, Server, StatusCode};
use tokio::net::TcpListener;

fn users() -> Dispatcher {
    let mut routes = Dispatcher::new();
    routes
        .register_path_method(
            HandlerFn(|_req: &mut Request, resp: &mut Response| {
                resp.status(StatusCode::Ok).body("alice, bob")
            }),
            "/list",
            &["GET"],
        )
        .unwrap();
    routes
        .register_path_method(
            HandlerFn(|req: &mut Request, resp: &mut Response| {
                resp.status(StatusCode::Created).body(req.body().to_vec())
            }),
            "/create",
            &["POST"],
        )
        .unwrap();
    routes
}

#[tokio::main]
async fn main() {
    let mut api = Dispatcher::new();
    api.delegate(users(), "/users").unwrap();
    api.register_path(
        HandlerFn(|_req: &mut Request, resp: &mut Response| {
            resp.status(StatusCode::Ok).body("v2")
        }),
        "/version",
    )
    .unwrap();

    let mut root = Dispatcher::new();
    root.delegate(api, "/api").unwrap();

    Server::builder()
        .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
        .handler(root)
        .build()
        .launch()
        .await;
}
