//! Controllers, actions, and the type erasure that stores them.
//!
//! # How async actions are stored
//!
//! A controller holds actions of *different* concrete types in one
//! `HashMap<String, BoxedAction>`. Rust collections hold a single type, so
//! actions hide behind a trait object (`dyn ErasedAction`) with a common
//! interface.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn show(req: Request) -> Response { … }    ← user writes this
//!        ↓ Controller::new("Orders").action("show", show)
//! show.into_boxed_action()                         ← Action blanket impl
//!        ↓
//! Arc::new(FnAction(show))                         ← heap-allocated wrapper
//!        ↓  stored as BoxedAction = Arc<dyn ErasedAction>
//! action.call(req)  at dispatch time               ← one vtable dispatch
//! ```
//!
//! The action map is built at construction time, so "does this action
//! exist" is a map lookup at dispatch — no name-based reflection, and an
//! unknown action name is an explicit miss branch.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Action` trait's `into_boxed_action` method.
#[doc(hidden)]
pub trait ErasedAction {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A heap-allocated, type-erased action shared across concurrent requests.
#[doc(hidden)]
pub type BoxedAction = Arc<dyn ErasedAction + Send + Sync + 'static>;

// ── Public Action trait ───────────────────────────────────────────────────────

/// Implemented for every valid controller action.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Action: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_action(self) -> BoxedAction;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Action for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_action(self) -> BoxedAction {
        Arc::new(FnAction(self))
    }
}

/// Newtype wrapper bridging a concrete action `F` to the trait-object world.
struct FnAction<F>(F);

impl<F, Fut, R> ErasedAction for FnAction<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// A named pre-action hook with `only`/`except` action filters.
///
/// Hooks are attached to a controller at construction and run in attachment
/// order before the action, for every action the filters admit: the `only`
/// list must be empty or contain the action, and the `except` list must be
/// empty or not contain it.
pub struct Hook {
    name: String,
    only: Vec<String>,
    except: Vec<String>,
    callback: Arc<dyn Fn(&Request) + Send + Sync>,
}

impl Hook {
    pub fn new(name: impl Into<String>, callback: impl Fn(&Request) + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            only: Vec::new(),
            except: Vec::new(),
            callback: Arc::new(callback),
        }
    }

    /// Restricts the hook to the listed actions.
    pub fn only<S: Into<String>>(mut self, actions: impl IntoIterator<Item = S>) -> Self {
        self.only = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Excludes the hook from the listed actions.
    pub fn except<S: Into<String>>(mut self, actions: impl IntoIterator<Item = S>) -> Self {
        self.except = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn applies_to(&self, action: &str) -> bool {
        let included = self.only.is_empty() || self.only.iter().any(|a| a == action);
        let excluded = !self.except.is_empty() && self.except.iter().any(|a| a == action);
        included && !excluded
    }

    pub(crate) fn run(&self, req: &Request) {
        (self.callback)(req);
    }
}

// ── Controller ────────────────────────────────────────────────────────────────

/// A named unit of request-handling logic: a map of named actions plus the
/// hooks that run before them.
///
/// ```rust,no_run
/// # use corso::{Controller, Hook, Request, Response};
/// # async fn list(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> Response { Response::text("") }
/// let orders = Controller::new("Orders")
///     .action("list", list)
///     .action("create", create)
///     .hook(Hook::new("audit", |req| { let _ = req.path(); }).only(["create"]));
/// ```
pub struct Controller {
    name: String,
    actions: HashMap<String, BoxedAction>,
    hooks: Vec<Hook>,
}

impl Controller {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), actions: HashMap::new(), hooks: Vec::new() }
    }

    /// Registers a named action. Re-registering a name replaces the
    /// earlier action, like the route table itself.
    pub fn action(mut self, name: &str, action: impl Action) -> Self {
        self.actions.insert(name.to_owned(), action.into_boxed_action());
        self
    }

    /// Attaches a pre-action hook. Hooks run in attachment order.
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn find_action(&self, name: &str) -> Option<&BoxedAction> {
        self.actions.get(name)
    }

    pub(crate) fn hooks(&self) -> &[Hook] {
        &self.hooks
    }
}
