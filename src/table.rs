//! Route registry.
//!
//! A flat map from lookup key to [`Route`]. Verb-constrained routes live
//! under `"{VERB}:{path}"` keys; catch-all routes under the bare path. The
//! two-tier scheme keeps a GET and a POST registration for the same path
//! from overwriting each other while still letting a single catch-all act
//! as the fallback for every verb — one map level instead of a nested
//! path → verb → handler structure.
//!
//! Build the table once at startup, then share it read-only. Registration
//! is last-write-wins: re-registering a `(verb, path)` pair silently
//! replaces the earlier entry. Route tables are declared in one place at
//! bootstrap, so an overwrite is a deliberate override, not a conflict.

use std::collections::HashMap;

use crate::verb::Verb;

/// Action invoked when a registration names none.
pub const DEFAULT_ACTION: &str = "index";

/// A registered route: where a `(verb, path)` pair lands.
#[derive(Clone, Debug)]
pub struct Route {
    method: Option<Verb>,
    path: String,
    handler: String,
    action: String,
    namespace: String,
    template_path: String,
}

impl Route {
    /// The verb constraint, or `None` for a catch-all registration.
    pub fn method(&self) -> Option<Verb> {
        self.method
    }

    /// Normalized matching path: lowercase, no surrounding slashes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identifier of the controller that owns the action.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Name of the operation to invoke on the controller.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Namespace prefix, used only for template-path derivation.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Derived `Namespace/Handler/Action` path in PascalCase segments,
    /// consumed by the rendering collaborator to locate a view resource.
    /// Plays no part in matching.
    pub fn template_path(&self) -> &str {
        &self.template_path
    }

    fn key(&self) -> String {
        lookup_key(self.method, &self.path)
    }
}

/// The route registry.
///
/// Owned by the composition root and passed by reference to the matcher
/// and dispatcher — no global instance. Populated single-threaded at
/// startup, read-only afterwards, so concurrent resolution needs no lock.
pub struct RouteTable {
    entries: HashMap<String, Route>,
    order: Vec<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), order: Vec::new() }
    }

    /// Registers a route. `method: None` registers a catch-all for the path.
    ///
    /// `path` is normalized (surrounding slashes trimmed, lowercased) before
    /// the lookup key is computed. An existing entry under the same key is
    /// silently replaced.
    pub fn register(
        &mut self,
        method: Option<Verb>,
        path: &str,
        handler: &str,
        action: Option<&str>,
        namespace: &str,
    ) {
        let path = normalize_path(path);
        let action = action.unwrap_or(DEFAULT_ACTION);
        let route = Route {
            method,
            template_path: template_path(namespace, handler, action),
            path,
            handler: handler.to_owned(),
            action: action.to_owned(),
            namespace: namespace.to_owned(),
        };
        let key = route.key();
        if self.entries.insert(key.clone(), route).is_none() {
            self.order.push(key);
        }
    }

    /// Looks up the route for a normalized-on-entry path.
    ///
    /// With a verb, the verb-specific key is probed first and the bare-path
    /// (catch-all) key second, so a catch-all serves as the default even
    /// when verb-specific routes exist for other verbs. Without a verb only
    /// the catch-all key space is probed.
    pub fn resolve(&self, path: &str, method: Option<Verb>) -> Option<&Route> {
        let path = normalize_path(path);
        if let Some(verb) = method {
            if let Some(route) = self.entries.get(&lookup_key(Some(verb), &path)) {
                return Some(route);
            }
        }
        self.entries.get(&path)
    }

    /// All registered routes in insertion order. Introspection only — the
    /// operator tooling that prints route listings sorts this itself.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_key(method: Option<Verb>, path: &str) -> String {
    match method {
        Some(verb) => format!("{}:{path}", verb.as_str()),
        None => path.to_owned(),
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_ascii_lowercase()
}

fn template_path(namespace: &str, handler: &str, action: &str) -> String {
    namespace
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(pascal)
        .chain([pascal(handler), pascal(action)])
        .collect::<Vec<_>>()
        .join("/")
}

/// `"order_items"` → `"OrderItems"`, `"v1"` → `"V1"`.
fn pascal(segment: &str) -> String {
    segment
        .split(['_', '-'])
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let mut chars = chunk.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
