//! Request dispatch and the CSRF gate around it.
//!
//! Dispatch order for a resolved route:
//!
//! 1. POST only: validate the echoed request token (terminal failure, no
//!    action runs). Per long-observed host behaviour the gate covers POST
//!    and not PUT/PATCH/DELETE — the asymmetry is documented, not hidden.
//! 2. Issue a fresh token for the *next* request. This runs on every
//!    dispatch, so the anti-replay secret rotates each cycle.
//! 3. Run the controller's pre-action hooks that admit the current action.
//! 4. Look the action up in the controller's operation map; a miss is a
//!    registration bug, not a client error.
//! 5. Invoke the action; attach the fresh token to its response.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::controller::Controller;
use crate::request::{Request, TOKEN_HEADER};
use crate::response::Response;
use crate::table::Route;
use crate::token::{RequestTokenGuard, TokenError};

// ── DispatchError ─────────────────────────────────────────────────────────────

/// Terminal dispatch failures. Routing misses are not errors — they never
/// reach the dispatcher.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    /// Mutating request without a usable token. 4xx territory.
    TokenMissing,
    /// Mutating request with a token that failed verification. 4xx territory.
    TokenNonVerifiable,
    /// The route resolved but no such controller action is registered.
    /// A deployment bug: 5xx territory.
    ActionNotFound { handler: String, action: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenMissing => f.write_str("request token missing"),
            Self::TokenNonVerifiable => f.write_str("request token not verifiable"),
            Self::ActionNotFound { handler, action } => {
                write!(f, "no action `{action}` registered on controller `{handler}`")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<TokenError> for DispatchError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => Self::TokenMissing,
            TokenError::NonVerifiable => Self::TokenNonVerifiable,
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Invokes resolved routes against registered controllers.
pub struct Dispatcher {
    controllers: HashMap<String, Controller>,
    guard: RequestTokenGuard,
}

impl Dispatcher {
    pub fn new(guard: RequestTokenGuard) -> Self {
        Self { controllers: HashMap::new(), guard }
    }

    /// Registers a controller under its own name.
    pub fn controller(mut self, controller: Controller) -> Self {
        self.controllers.insert(controller.name().to_owned(), controller);
        self
    }

    /// The token guard, for collaborators that embed tokens outside the
    /// dispatch cycle (login forms, rendered templates).
    pub fn guard(&self) -> &RequestTokenGuard {
        &self.guard
    }

    /// Dispatches `req` to the action named by `route`.
    pub async fn dispatch(&self, req: Request, route: &Route) -> Result<Response, DispatchError> {
        if req.method().eq_ignore_ascii_case("POST") {
            self.guard.validate(req.token(), route.handler())?;
        }

        // Always after validation: rotates the secret for the next cycle.
        let token = self.guard.issue(route.handler());

        let controller = self.controllers.get(route.handler()).ok_or_else(|| {
            DispatchError::ActionNotFound {
                handler: route.handler().to_owned(),
                action: route.action().to_owned(),
            }
        })?;

        for hook in controller.hooks().iter().filter(|h| h.applies_to(route.action())) {
            debug!(hook = hook.name(), action = route.action(), "running pre-action hook");
            hook.run(&req);
        }

        let action = controller.find_action(route.action()).ok_or_else(|| {
            DispatchError::ActionNotFound {
                handler: route.handler().to_owned(),
                action: route.action().to_owned(),
            }
        })?;

        let response = action.call(req).await;
        Ok(response.with_header(TOKEN_HEADER, token.signed()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::controller::Hook;
    use crate::table::RouteTable;
    use crate::verb::Verb;

    fn counting_controller(name: &str, hits: Arc<AtomicUsize>) -> Controller {
        Controller::new(name).action("create", move |_req: Request| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Response::text("created")
            }
        })
    }

    fn route_for(table: &RouteTable, path: &str, verb: Verb) -> Route {
        table.resolve(path, Some(verb)).expect("route registered").clone()
    }

    fn post(path: &str, token: Option<&str>) -> Request {
        let headers = token
            .map(|t| vec![(TOKEN_HEADER.to_owned(), t.to_owned())])
            .unwrap_or_default();
        Request::new("POST", path, headers, Vec::new())
    }

    #[tokio::test]
    async fn post_without_a_token_never_reaches_the_action() {
        let hits = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(RequestTokenGuard::new())
            .controller(counting_controller("Orders", Arc::clone(&hits)));

        let mut table = RouteTable::new();
        table.draw(|r| r.post("orders", "Orders", "create"));
        let route = route_for(&table, "orders", Verb::Post);

        let err = dispatcher.dispatch(post("/orders", None), &route).await.unwrap_err();
        assert_eq!(err, DispatchError::TokenMissing);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn post_with_a_valid_token_runs_and_rotates() {
        let hits = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(RequestTokenGuard::new())
            .controller(counting_controller("Orders", Arc::clone(&hits)));

        let mut table = RouteTable::new();
        table.draw(|r| r.post("orders", "Orders", "create"));
        let route = route_for(&table, "orders", Verb::Post);

        let issued = dispatcher.guard().issue("Orders");
        let res = dispatcher
            .dispatch(post("/orders", Some(issued.signed())), &route)
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The response carries a fresh token, not the consumed one.
        let fresh = res.header(TOKEN_HEADER).expect("token attached");
        assert_ne!(fresh, issued.signed());

        // The consumed token is dead; the fresh one works.
        let replay = dispatcher
            .dispatch(post("/orders", Some(issued.signed())), &route)
            .await
            .unwrap_err();
        assert_eq!(replay, DispatchError::TokenNonVerifiable);
        let fresh = fresh.to_owned();
        dispatcher.dispatch(post("/orders", Some(&fresh)), &route).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_post_mutating_verbs_are_not_gated() {
        // Observed host behaviour: only POST is gated.
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let dispatcher = Dispatcher::new(RequestTokenGuard::new()).controller(
            Controller::new("Orders").action("destroy", move |_req: Request| {
                let hits = Arc::clone(&hits_clone);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Response::text("gone")
                }
            }),
        );

        let mut table = RouteTable::new();
        table.draw(|r| r.delete("orders", "Orders", "destroy"));
        let route = route_for(&table, "orders", Verb::Delete);

        let req = Request::new("DELETE", "/orders", Vec::new(), Vec::new());
        dispatcher.dispatch(req, &route).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_dispatch_issues_a_token() {
        let dispatcher = Dispatcher::new(RequestTokenGuard::new())
            .controller(Controller::new("Pages").action("view", |_req: Request| async {
                Response::text("page")
            }));

        let mut table = RouteTable::new();
        table.draw(|r| r.get("pages", "Pages", "view"));
        let route = route_for(&table, "pages", Verb::Get);

        let req = Request::new("GET", "/pages", Vec::new(), Vec::new());
        let res = dispatcher.dispatch(req, &route).await.unwrap();
        let token = res.header(TOKEN_HEADER).expect("token attached");
        assert_eq!(dispatcher.guard().validate(Some(token), "Pages"), Ok(()));
    }

    #[tokio::test]
    async fn hooks_run_in_order_and_respect_filters() {
        let trail: Arc<std::sync::Mutex<Vec<&'static str>>> = Arc::default();
        let (first, second, skipped) = (Arc::clone(&trail), Arc::clone(&trail), Arc::clone(&trail));

        let dispatcher = Dispatcher::new(RequestTokenGuard::new()).controller(
            Controller::new("Orders")
                .action("list", |_req: Request| async { Response::text("[]") })
                .hook(Hook::new("first", move |_| first.lock().unwrap().push("first")))
                .hook(
                    Hook::new("second", move |_| second.lock().unwrap().push("second"))
                        .only(["list"]),
                )
                .hook(
                    Hook::new("skipped", move |_| skipped.lock().unwrap().push("skipped"))
                        .except(["list"]),
                ),
        );

        let mut table = RouteTable::new();
        table.draw(|r| r.get("orders", "Orders", "list"));
        let route = route_for(&table, "orders", Verb::Get);

        let req = Request::new("GET", "/orders", Vec::new(), Vec::new());
        dispatcher.dispatch(req, &route).await.unwrap();
        assert_eq!(*trail.lock().unwrap(), ["first", "second"]);
    }

    #[tokio::test]
    async fn unknown_actions_and_controllers_fail_explicitly() {
        let dispatcher = Dispatcher::new(RequestTokenGuard::new())
            .controller(Controller::new("Orders").action("list", |_req: Request| async {
                Response::text("[]")
            }));

        let mut table = RouteTable::new();
        table.draw(|r| {
            r.get("orders/export", "Orders", "export");
            r.get("pages", "Pages", None);
        });

        let route = route_for(&table, "orders/export", Verb::Get);
        let req = Request::new("GET", "/orders/export", Vec::new(), Vec::new());
        let err = dispatcher.dispatch(req, &route).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::ActionNotFound { handler: "Orders".into(), action: "export".into() },
        );

        let route = route_for(&table, "pages", Verb::Get);
        let req = Request::new("GET", "/pages", Vec::new(), Vec::new());
        let err = dispatcher.dispatch(req, &route).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::ActionNotFound { handler: "Pages".into(), action: "index".into() },
        );
    }
}
