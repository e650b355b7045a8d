use strata_web::{Dispatcher, HandlerFn, Request, Response, Server, StatusCode};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let mut routes = Dispatcher::new();
    routes
        .register_path_method(
            HandlerFn(|_req: &mut Request, resp: &mut Response| {
                resp.status(StatusCode::Ok)
                    .header("content-type", "text/plain")
                    .body("Hello, world!")
            }),
            "/hello",
            &["GET"],
        )
        .unwrap();
    routes.register(HandlerFn(|req: &mut Request, resp: &mut Response| {
        resp.status(StatusCode::NotFound)
            .body(format!("nothing at {}", req.path()))
    }));

    Server::builder()
        .listener(TcpListener::bind("127.0.0.1:8080").await.unwrap())
        .handler(routes)
        .build()
        .launch()
        .await;
}
