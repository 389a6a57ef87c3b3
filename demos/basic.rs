//! Minimal corso example — a content-plugin style orders API.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/v1/orders
//!   # take the x-request-token header from the response, then:
//!   curl -X POST http://localhost:3000/v1/orders \
//!        -H 'x-request-token: <token>' \
//!        -d '{"sku":"book"}'
//!   # a POST without the token is refused with 403

use corso::{
    App, Controller, Dispatcher, Hook, Request, RequestTokenGuard, Response, RouteTable, Server,
};
use http::StatusCode;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut table = RouteTable::new();
    table.draw(|routes| {
        routes.namespace("v1", |v1| {
            v1.get("orders", "Orders", "list");
            v1.get("orders/:id", "Orders", "show");
            v1.post("orders", "Orders", "create");
            v1.scope("admin", |admin| {
                admin.any("pages", "Pages", None);
            });
        });
    });

    print_route_listing(&table);

    let dispatcher = Dispatcher::new(RequestTokenGuard::new())
        .controller(
            Controller::new("Orders")
                .action("list", list_orders)
                .action("show", show_order)
                .action("create", create_order)
                .hook(
                    Hook::new("audit", |req| {
                        tracing::info!(path = req.path(), "mutating orders");
                    })
                    .only(["create"]),
                ),
        )
        .controller(Controller::new("Pages").action("index", pages_index));

    let app = App::new(table, dispatcher);

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// Operator-style table printout, sorted by path.
fn print_route_listing(table: &RouteTable) {
    let mut routes: Vec<_> = table.routes().collect();
    routes.sort_by_key(|route| route.path().to_owned());
    for route in routes {
        println!(
            "{:6} {:24} {}#{} -> {}",
            route.method().map_or("ANY", |v| v.as_str()),
            route.path(),
            route.handler(),
            route.action(),
            route.template_path(),
        );
    }
}

async fn list_orders(_req: Request) -> Response {
    Response::json(br#"[{"id":1,"sku":"book"}]"#.to_vec())
}

// Note: ":id" is inert at this layer — this action only runs when the
// client literally requests /v1/orders/:id. The host layer that binds
// parameters would rewrite the route before exposing it publicly.
async fn show_order(_req: Request) -> Response {
    Response::json(br#"{"id":1,"sku":"book"}"#.to_vec())
}

async fn create_order(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/v1/orders/2")
        .json(br#"{"id":2}"#.to_vec())
}

async fn pages_index(_req: Request) -> Response {
    Response::html("<h1>admin pages</h1>")
}
