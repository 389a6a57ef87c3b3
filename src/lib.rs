//! # corso
//!
//! The routing and dispatch core of a content-management host: a route
//! registry, a nestable declaration DSL, literal-segment path matching,
//! and a dispatcher that gates mutating requests behind single-use
//! anti-CSRF tokens. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The host framework owns the outer request lifecycle — cookies, body
//! parsing, template rendering, retries. corso owns the part in between:
//! given a method and a path, decide *whether* this layer handles the
//! request, *which* controller action runs, and whether a mutating request
//! carries a valid token. A request corso does not recognise is handed
//! straight back (`None` from [`App::handle`]) so the host chain continues;
//! a request it does recognise comes back as a full response.
//!
//! What corso deliberately does not do:
//!
//! - **Path-parameter binding** — `:name` tokens in registered paths are
//!   inert here; the downstream host layer binds them
//! - **Cookie / session management** — the host's collaborator
//! - **Templating** — the derived template path is handed to the renderer,
//!   never interpreted
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use corso::{App, Controller, Dispatcher, Request, RequestTokenGuard, Response, RouteTable, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut table = RouteTable::new();
//!     table.draw(|routes| {
//!         routes.namespace("v1", |v1| {
//!             v1.get("orders", "Orders", "list");
//!             v1.post("orders", "Orders", "create");
//!         });
//!     });
//!
//!     let dispatcher = Dispatcher::new(RequestTokenGuard::new()).controller(
//!         Controller::new("Orders")
//!             .action("list", list_orders)
//!             .action("create", create_order),
//!     );
//!
//!     let app = App::new(table, dispatcher);
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn list_orders(_req: Request) -> Response {
//!     Response::json(br#"[]"#.to_vec())
//! }
//!
//! async fn create_order(req: Request) -> Response {
//!     # let _ = req.body();
//!     Response::json(br#"{"id":1}"#.to_vec())
//! }
//! ```
//!
//! The route table is built once at bootstrap and read-only afterwards;
//! share it freely across concurrent requests.

mod app;
mod builder;
mod controller;
mod dispatch;
mod error;
mod matcher;
mod request;
mod response;
mod server;
mod table;
mod token;
mod verb;

pub use app::App;
pub use builder::RouteBuilder;
pub use controller::{Action, Controller, Hook};
pub use dispatch::{DispatchError, Dispatcher};
pub use error::Error;
pub use matcher::PathMatcher;
pub use request::{Request, TOKEN_HEADER};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use server::Server;
pub use table::{DEFAULT_ACTION, Route, RouteTable};
pub use token::{DEFAULT_TOKEN_TTL, RequestToken, RequestTokenGuard, TokenError};
pub use verb::Verb;
