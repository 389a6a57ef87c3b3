//! Per-request path matching.
//!
//! A [`PathMatcher`] is a short-lived value created for one inbound request.
//! It validates the raw path before anything touches the registry: every
//! segment must consist of `[A-Za-z0-9_-]` only, so traversal sequences
//! (`..`), separators (`;`), and markup characters (`<`) never reach
//! resolution. A rejected path is a silent non-match, indistinguishable
//! from an unregistered one — the caller passes the request on to the next
//! stage of its chain either way.
//!
//! Placeholder tokens (`:name`) in registered paths are inert here: `:` is
//! not a permitted segment character, so a placeholder route only matches
//! its own literal spelling. Parameter binding belongs to the downstream
//! host layer, not this one.

use crate::table::{Route, RouteTable};
use crate::verb::Verb;

/// Matches one raw request path against a route table, caching the result.
///
/// Accessors return `None` until [`matches`](PathMatcher::matches) has
/// succeeded — check the boolean first.
pub struct PathMatcher<'t> {
    table: &'t RouteTable,
    path: Option<String>,
    route: Option<&'t Route>,
}

impl<'t> PathMatcher<'t> {
    pub fn new(table: &'t RouteTable) -> Self {
        Self { table, path: None, route: None }
    }

    /// Normalizes and validates `raw_path`, resolves it against the table,
    /// and caches the outcome. Returns whether a route matched.
    pub fn matches(&mut self, raw_path: &str, http_method: &str) -> bool {
        self.path = None;
        self.route = None;

        let trimmed = raw_path.trim_matches('/');
        if trimmed.is_empty() {
            return false;
        }
        if !trimmed.split('/').all(valid_segment) {
            return false;
        }

        let normalized = trimmed.to_ascii_lowercase();
        let verb = http_method.to_ascii_uppercase().parse::<Verb>().ok();
        self.route = self.table.resolve(&normalized, verb);
        self.path = Some(normalized);
        self.route.is_some()
    }

    /// The normalized path of the last [`matches`](PathMatcher::matches)
    /// call, if it passed segment validation.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The resolved route, if the last call matched.
    pub fn route(&self) -> Option<&'t Route> {
        self.route
    }

    pub fn handler(&self) -> Option<&str> {
        self.route.map(Route::handler)
    }

    pub fn action(&self) -> Option<&str> {
        self.route.map(Route::action)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.route.map(Route::namespace)
    }

    pub fn template_path(&self) -> Option<&str> {
        self.route.map(Route::template_path)
    }
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table.draw(|routes| {
            routes.namespace("v1", |v1| {
                v1.get("orders", "Orders", "list");
                v1.any("pages", "Pages", None);
            });
        });
        table
    }

    #[test]
    fn matches_a_registered_verb_route() {
        let table = table();
        let mut matcher = PathMatcher::new(&table);
        assert!(matcher.matches("/v1/orders/", "get"));
        assert_eq!(matcher.handler(), Some("Orders"));
        assert_eq!(matcher.action(), Some("list"));
        assert_eq!(matcher.namespace(), Some("v1"));
        assert_eq!(matcher.template_path(), Some("V1/Orders/List"));
    }

    #[test]
    fn catch_all_serves_verbs_without_a_specific_route() {
        let table = table();
        let mut matcher = PathMatcher::new(&table);
        assert!(matcher.matches("/v1/pages", "DELETE"));
        assert_eq!(matcher.handler(), Some("Pages"));
    }

    #[test]
    fn unknown_methods_only_reach_catch_alls() {
        let table = table();
        let mut matcher = PathMatcher::new(&table);
        assert!(!matcher.matches("/v1/orders", "OPTIONS"));
        assert!(matcher.matches("/v1/pages", "OPTIONS"));
    }

    #[test]
    fn placeholder_routes_do_not_bind_parameters() {
        let mut table = RouteTable::new();
        table.draw(|routes| routes.get("orders/:id", "Orders", "show"));
        let mut matcher = PathMatcher::new(&table);
        assert!(!matcher.matches("/orders/5", "GET"));
    }

    #[test]
    fn hostile_segments_never_match() {
        let mut table = RouteTable::new();
        table.draw(|routes| routes.any("orders", "Orders", None));
        let mut matcher = PathMatcher::new(&table);
        for path in ["/orders/../secret", "/orders;drop", "/<script>", "/orders/%2e%2e", "//"] {
            assert!(!matcher.matches(path, "GET"), "{path} should not match");
        }
        // Empty inner segments are rejected too.
        assert!(!matcher.matches("/orders//list", "GET"));
    }

    #[test]
    fn empty_path_never_matches() {
        let table = table();
        let mut matcher = PathMatcher::new(&table);
        assert!(!matcher.matches("/", "GET"));
        assert!(!matcher.matches("", "GET"));
    }

    #[test]
    fn accessors_are_empty_before_and_after_a_miss() {
        let table = table();
        let mut matcher = PathMatcher::new(&table);
        assert_eq!(matcher.handler(), None);

        assert!(matcher.matches("/v1/orders", "GET"));
        assert!(matcher.route().is_some());

        assert!(!matcher.matches("/nope", "GET"));
        assert_eq!(matcher.handler(), None);
        assert_eq!(matcher.template_path(), None);
    }
}
