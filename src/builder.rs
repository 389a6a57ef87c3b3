//! Fluent route declaration DSL.
//!
//! Extension authors declare their routes at bootstrap through nested
//! callbacks:
//!
//! ```rust
//! use corso::{RouteTable, Verb};
//!
//! let mut table = RouteTable::new();
//! table.draw(|routes| {
//!     routes.namespace("v1", |v1| {
//!         v1.get("orders/:id", "Orders", "show");
//!         v1.post("orders", "Orders", "create");
//!         v1.scope("admin", |admin| {
//!             admin.delete("orders/:id", "Orders", "destroy");
//!         });
//!     });
//! });
//!
//! assert!(table.resolve("v1/orders", Some(Verb::Post)).is_some());
//! assert!(table.resolve("v1/admin/orders/:id", Some(Verb::Delete)).is_some());
//! ```
//!
//! `scope` extends the matching path only. `namespace` extends both the
//! matching path and the namespace the template path is derived from. Each
//! nesting call hands the callback a fresh child builder with extended
//! copies of the prefix stacks — sibling branches never observe each
//! other's prefixes.

use crate::table::RouteTable;
use crate::verb::Verb;

impl RouteTable {
    /// Entry point of the DSL: builds a root [`RouteBuilder`] over this
    /// table and runs the declaration callback.
    pub fn draw(&mut self, declare: impl FnOnce(&mut RouteBuilder<'_>)) {
        let mut root = RouteBuilder {
            table: self,
            scope_prefixes: Vec::new(),
            namespace_prefixes: Vec::new(),
        };
        declare(&mut root);
    }
}

/// Ephemeral declaration context threaded through nested callbacks.
///
/// Holds the prefix stacks accumulated by enclosing `scope`/`namespace`
/// calls; dropped when the defining callback returns.
pub struct RouteBuilder<'t> {
    table: &'t mut RouteTable,
    scope_prefixes: Vec<String>,
    namespace_prefixes: Vec<String>,
}

impl RouteBuilder<'_> {
    pub fn get<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(Some(Verb::Get), path, handler, action.into());
    }

    pub fn post<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(Some(Verb::Post), path, handler, action.into());
    }

    pub fn put<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(Some(Verb::Put), path, handler, action.into());
    }

    pub fn patch<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(Some(Verb::Patch), path, handler, action.into());
    }

    pub fn delete<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(Some(Verb::Delete), path, handler, action.into());
    }

    /// Registers a catch-all route: matches its path under any verb for
    /// which no verb-specific route exists.
    pub fn any<'a>(&mut self, path: &str, handler: &str, action: impl Into<Option<&'a str>>) {
        self.add_route(None, path, handler, action.into());
    }

    /// Runs `declare` with a child builder whose matching-path prefix stack
    /// is extended by `prefix`. Template naming is unaffected.
    pub fn scope(&mut self, prefix: &str, declare: impl FnOnce(&mut RouteBuilder<'_>)) {
        let mut child = RouteBuilder {
            scope_prefixes: extended(&self.scope_prefixes, prefix),
            namespace_prefixes: self.namespace_prefixes.clone(),
            table: &mut *self.table,
        };
        declare(&mut child);
    }

    /// Runs `declare` with a child builder whose matching-path *and*
    /// namespace prefix stacks are both extended by `prefix`.
    pub fn namespace(&mut self, prefix: &str, declare: impl FnOnce(&mut RouteBuilder<'_>)) {
        let mut child = RouteBuilder {
            scope_prefixes: extended(&self.scope_prefixes, prefix),
            namespace_prefixes: extended(&self.namespace_prefixes, prefix),
            table: &mut *self.table,
        };
        declare(&mut child);
    }

    fn add_route(&mut self, method: Option<Verb>, path: &str, handler: &str, action: Option<&str>) {
        let full_path = join_segments(&self.scope_prefixes, Some(path));
        let namespace = join_segments(&self.namespace_prefixes, None);
        self.table.register(method, &full_path, handler, action, &namespace);
    }
}

fn extended(stack: &[String], prefix: &str) -> Vec<String> {
    let mut next = stack.to_vec();
    next.push(prefix.to_owned());
    next
}

fn join_segments(stack: &[String], leaf: Option<&str>) -> String {
    stack
        .iter()
        .map(String::as_str)
        .chain(leaf)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_scopes_concatenate_prefixes() {
        let mut table = RouteTable::new();
        table.draw(|routes| {
            routes.scope("a", |a| {
                a.scope("b", |b| {
                    b.get("c", "Widgets", None);
                });
            });
        });
        assert!(table.resolve("a/b/c", Some(Verb::Get)).is_some());
        assert!(table.resolve("c", Some(Verb::Get)).is_none());
    }

    #[test]
    fn sibling_branches_do_not_share_prefixes() {
        let mut table = RouteTable::new();
        table.draw(|routes| {
            routes.scope("a", |a| {
                a.get("first", "Widgets", None);
                a.scope("b", |b| {
                    b.get("second", "Widgets", None);
                });
                // Declared after descending into `b` — must not see it.
                a.get("third", "Widgets", None);
            });
        });
        assert!(table.resolve("a/first", Some(Verb::Get)).is_some());
        assert!(table.resolve("a/b/second", Some(Verb::Get)).is_some());
        assert!(table.resolve("a/third", Some(Verb::Get)).is_some());
        assert!(table.resolve("a/b/third", Some(Verb::Get)).is_none());
    }

    #[test]
    fn namespace_feeds_the_template_path() {
        let mut table = RouteTable::new();
        table.draw(|routes| {
            routes.namespace("v1", |v1| {
                v1.get("x", "Widgets", None);
            });
        });
        let route = table.resolve("v1/x", Some(Verb::Get)).unwrap();
        assert_eq!(route.namespace(), "v1");
        assert_eq!(route.template_path(), "V1/Widgets/Index");
    }

    #[test]
    fn scope_leaves_the_namespace_empty() {
        let mut table = RouteTable::new();
        table.draw(|routes| {
            routes.scope("v1", |v1| {
                v1.get("x", "Widgets", "show");
            });
        });
        let route = table.resolve("v1/x", Some(Verb::Get)).unwrap();
        assert_eq!(route.namespace(), "");
        assert_eq!(route.template_path(), "Widgets/Show");
    }

    #[test]
    fn omitted_action_falls_back_to_the_default() {
        let mut table = RouteTable::new();
        table.draw(|routes| routes.get("orders", "Orders", None));
        assert_eq!(table.resolve("orders", Some(Verb::Get)).unwrap().action(), "index");
    }

    #[test]
    fn any_registers_a_catch_all() {
        let mut table = RouteTable::new();
        table.draw(|routes| routes.any("orders", "Orders", "fallback"));
        for verb in [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete] {
            assert_eq!(table.resolve("orders", Some(verb)).unwrap().action(), "fallback");
        }
    }
}
