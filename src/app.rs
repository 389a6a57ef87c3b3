//! Application composition root.
//!
//! [`App`] owns the single shared route table and the dispatcher, and is
//! the seam the host pipeline talks to: hand it a request, get back either
//! a response or "not handled". Build it once at bootstrap; everything
//! downstream borrows it.

use http::StatusCode;
use tracing::{debug, error, warn};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::matcher::PathMatcher;
use crate::request::Request;
use crate::response::Response;
use crate::table::RouteTable;

/// The composed routing core: route table + dispatcher.
pub struct App {
    table: RouteTable,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(table: RouteTable, dispatcher: Dispatcher) -> Self {
        Self { table, dispatcher }
    }

    /// The shared route table, for introspection tooling.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one request. `None` means "not handled" — the host passes
    /// the request on to the next stage of its chain. Malformed paths and
    /// routing misses are indistinguishable here, by design: fail closed,
    /// disclose nothing.
    ///
    /// Terminal dispatch failures are handled, not passed through: a
    /// refused token yields 403 and a missing action 500.
    pub async fn handle(&self, req: Request) -> Option<Response> {
        let mut matcher = PathMatcher::new(&self.table);
        if !matcher.matches(req.path(), req.method()) {
            debug!(path = req.path(), "no route, passing through");
            return None;
        }
        let route = matcher.route()?;

        match self.dispatcher.dispatch(req, route).await {
            Ok(response) => Some(response),
            Err(err @ (DispatchError::TokenMissing | DispatchError::TokenNonVerifiable)) => {
                warn!(%err, path = route.path(), "refusing mutating request");
                Some(
                    Response::builder()
                        .status(StatusCode::FORBIDDEN)
                        .text(err.to_string()),
                )
            }
            Err(err @ DispatchError::ActionNotFound { .. }) => {
                error!(%err, path = route.path(), "route points at an unregistered action");
                Some(Response::status(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }
}
