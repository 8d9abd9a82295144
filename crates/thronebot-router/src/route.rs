//! The command route tree.
//!
//! A [`Route`] is one node of a prefix tree keyed by whole command words.
//! The root has an empty name; every other node is reached by walking child
//! names from the root. Nodes either carry a handler or are namespaces that
//! only group children.
//!
//! Middleware is composed when a handler is attached. A node's effective
//! handler is the chain of its ancestors' middleware (as registered at that
//! moment), then its own middleware, then the handler:
//!
//! ```text
//! root mw ∘ … ∘ parent mw ∘ own mw ∘ handler
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let mut router = Route::new();
//! router.on("ping", || async { "pong" }).desc("Replies with pong");
//! router.namespace("weekly").layer(ElevatedUser::new(owners)).group(|r| {
//!     r.on("ban", ban_handler);
//!     r.on("enable", enable_handler);
//! });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::context::RouteInfo;
use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::middleware::{BoxedMiddleware, Middleware, compose};

/// What a route invokes when it is resolved.
#[derive(Clone)]
pub enum Endpoint {
    /// The route only groups children and can never be invoked itself.
    Namespace,
    /// The route invokes this handler.
    Handler(BoxedHandler),
}

impl Endpoint {
    pub fn handler<H, T>(handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Endpoint::Handler(into_handler(handler))
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Namespace => f.write_str("Namespace"),
            Endpoint::Handler(_) => f.write_str("Handler"),
        }
    }
}

/// Conversion into an [`Endpoint`].
///
/// Implemented for [`Endpoint`] itself and for every [`Handler`]. The `M`
/// parameter only keeps the two implementations apart.
pub trait IntoEndpoint<M> {
    fn into_endpoint(self) -> Endpoint;
}

impl IntoEndpoint<()> for Endpoint {
    fn into_endpoint(self) -> Endpoint {
        self
    }
}

impl<H, T> IntoEndpoint<(T,)> for H
where
    H: Handler<T>,
    T: 'static,
{
    fn into_endpoint(self) -> Endpoint {
        Endpoint::handler(self)
    }
}

/// A handler together with the ancestor middleware captured when it was
/// attached.
#[derive(Clone)]
struct Attached {
    raw: BoxedHandler,
    ancestors: Vec<BoxedMiddleware>,
    composed: BoxedHandler,
}

impl Attached {
    fn new(raw: BoxedHandler, ancestors: Vec<BoxedMiddleware>, own: &[BoxedMiddleware]) -> Self {
        let mut attached = Self {
            composed: Arc::clone(&raw),
            raw,
            ancestors,
        };
        attached.recompose(own);
        attached
    }

    fn recompose(&mut self, own: &[BoxedMiddleware]) {
        let chain: Vec<BoxedMiddleware> = self.ancestors.iter().chain(own).cloned().collect();
        self.composed = compose(Arc::clone(&self.raw), &chain);
    }
}

/// A node of the command tree.
#[derive(Default)]
pub struct Route {
    info: Arc<RouteInfo>,
    handler: Option<Attached>,
    default: Option<Attached>,
    /// Middleware of all ancestors, root first.
    inherited: Vec<BoxedMiddleware>,
    middleware: Vec<BoxedMiddleware>,
    children: HashMap<String, Route>,
}

impl Route {
    /// Creates an empty root.
    pub fn new() -> Self {
        Self::default()
    }

    fn child_of(parent_path: &str, name: &str) -> Self {
        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{parent_path} {name}")
        };
        Self {
            info: Arc::new(RouteInfo {
                name: name.to_string(),
                path,
                description: None,
            }),
            ..Self::default()
        }
    }

    fn chain_for_children(&self) -> Vec<BoxedMiddleware> {
        self.inherited
            .iter()
            .chain(&self.middleware)
            .cloned()
            .collect()
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Registers `endpoint` under `name` and returns the child.
    ///
    /// Registering an existing name returns the same node. A handler replaces
    /// the previous one; [`Endpoint::Namespace`] leaves an existing handler
    /// untouched.
    pub fn on<M>(&mut self, name: impl Into<String>, endpoint: impl IntoEndpoint<M>) -> &mut Route {
        self.on_endpoint(name, endpoint.into_endpoint())
    }

    /// Registers a child that only groups other routes.
    pub fn namespace(&mut self, name: impl Into<String>) -> &mut Route {
        self.on_endpoint(name, Endpoint::Namespace)
    }

    pub fn on_endpoint(&mut self, name: impl Into<String>, endpoint: Endpoint) -> &mut Route {
        let name = name.into();
        let inherited = self.chain_for_children();
        let parent_path = &self.info.path;
        let child = self
            .children
            .entry(name)
            .or_insert_with_key(|name| Route::child_of(parent_path, name));
        child.inherited = inherited;

        if let Endpoint::Handler(raw) = endpoint {
            if child.handler.is_some() {
                warn!(route = %child.info.path, "Replacing existing handler");
            }
            child.handler = Some(Attached::new(raw, child.inherited.clone(), &child.middleware));
        }
        child
    }

    /// Calls `f` with this route so several children can be registered in one
    /// block.
    pub fn group(&mut self, f: impl FnOnce(&mut Route)) -> &mut Self {
        f(self);
        self
    }

    /// Appends a middleware to this route.
    ///
    /// It wraps this route's own handler and every handler registered on a
    /// descendant afterwards. Middleware added first runs first.
    pub fn layer<L: Middleware>(&mut self, middleware: L) -> &mut Self {
        self.layer_boxed(Arc::new(middleware))
    }

    pub fn layer_boxed(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.middleware.push(middleware);
        if let Some(handler) = self.handler.as_mut() {
            handler.recompose(&self.middleware);
        }
        if let Some(default) = self.default.as_mut() {
            default.recompose(&self.middleware);
        }
        self
    }

    /// Sets the human readable description.
    pub fn desc(&mut self, description: impl Into<String>) -> &mut Self {
        Arc::make_mut(&mut self.info).description = Some(description.into());
        self
    }

    /// Sets the handler invoked when the bot is addressed by a bare mention.
    pub fn default_handler<H, T>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.default = Some(Attached::new(
            into_handler(handler),
            self.inherited.clone(),
            &self.middleware,
        ));
        self
    }

    // ─── Lookup ───────────────────────────────────────────────────────────────

    /// Walks the tree along `tokens` as far as child names match.
    ///
    /// Returns the deepest node reached and the number of tokens consumed.
    /// A depth of 0 means not even the first token matched and the node is
    /// `self`.
    pub fn find<S: AsRef<str>>(&self, tokens: &[S]) -> (&Route, usize) {
        let mut node = self;
        let mut depth = 0;
        for token in tokens {
            match node.children.get(token.as_ref()) {
                Some(child) => {
                    node = child;
                    depth += 1;
                }
                None => break,
            }
        }
        (node, depth)
    }

    /// Like [`find`](Self::find), but only succeeds when at least one token
    /// was consumed and the node reached can be invoked.
    pub fn find_full<S: AsRef<str>>(&self, tokens: &[S]) -> Option<(&Route, usize)> {
        match self.find(tokens) {
            (node, depth) if depth > 0 && node.is_invocable() => Some((node, depth)),
            _ => None,
        }
    }

    // ─── Inspection ───────────────────────────────────────────────────────────

    pub fn info(&self) -> &RouteInfo {
        &self.info
    }

    pub(crate) fn info_arc(&self) -> Arc<RouteInfo> {
        Arc::clone(&self.info)
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn path(&self) -> &str {
        &self.info.path
    }

    pub fn description(&self) -> Option<&str> {
        self.info.description.as_deref()
    }

    pub fn child(&self, name: &str) -> Option<&Route> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &Route> {
        self.children.values()
    }

    /// Whether this route has a handler, as opposed to being a namespace.
    pub fn is_invocable(&self) -> bool {
        self.handler.is_some()
    }

    /// The effective handler with all middleware applied.
    pub fn handler(&self) -> Option<&BoxedHandler> {
        self.handler.as_ref().map(|h| &h.composed)
    }

    /// The bare-mention handler with all middleware applied.
    pub fn get_default(&self) -> Option<&BoxedHandler> {
        self.default.as_ref().map(|h| &h.composed)
    }

    /// Lists `(path, description)` of every invocable descendant, sorted by
    /// path.
    pub fn commands(&self) -> Vec<(&str, Option<&str>)> {
        let mut out = Vec::new();
        self.collect_commands(&mut out);
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    fn collect_commands<'a>(&'a self, out: &mut Vec<(&'a str, Option<&'a str>)>) {
        for child in self.children.values() {
            if child.is_invocable() {
                out.push((child.path(), child.description()));
            }
            child.collect_commands(out);
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.info.path)
            .field("invocable", &self.is_invocable())
            .field("middleware", &self.middleware.len())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CommandContext;
    use crate::middleware::{Next, from_fn};
    use crate::testing::{MockSession, context_for};

    fn tag(label: &'static str) -> BoxedMiddleware {
        Arc::new(from_fn(move |ctx: Arc<CommandContext>, next: Next| async move {
            ctx.reply(label).await;
            next.run(ctx).await;
        }))
    }

    async fn run(route: &Route, session: &Arc<MockSession>) {
        let handler = route.handler().expect("route has a handler");
        handler(context_for("u1", Arc::clone(session))).await;
    }

    #[test]
    fn test_registering_twice_returns_same_node() {
        let mut router = Route::new();
        router.namespace("weekly").on("ban", || async {});
        router.namespace("weekly").desc("Weekly challenge");

        let weekly = router.child("weekly").unwrap();
        assert_eq!(router.children().count(), 1);
        assert_eq!(weekly.description(), Some("Weekly challenge"));
        assert!(weekly.child("ban").is_some());
    }

    #[test]
    fn test_namespace_never_clears_handler() {
        let mut router = Route::new();
        router.on("config", || async {});
        router.namespace("config").on("set", || async {});

        let config = router.child("config").unwrap();
        assert!(config.is_invocable());
        assert!(config.child("set").unwrap().is_invocable());
    }

    #[test]
    fn test_paths_are_space_joined() {
        let mut router = Route::new();
        router.namespace("weekly").namespace("ban").on("add", || async {});

        let (node, depth) = router.find(&["weekly", "ban", "add", "crown"]);
        assert_eq!(depth, 3);
        assert_eq!(node.name(), "add");
        assert_eq!(node.path(), "weekly ban add");
        assert_eq!(router.path(), "");
    }

    #[test]
    fn test_find_full_misses_on_namespace() {
        let mut router = Route::new();
        router.namespace("weekly").on("ban", || async {});

        let (node, depth) = router.find(&["weekly", "unknown"]);
        assert_eq!((node.path(), depth), ("weekly", 1));
        assert!(router.find_full(&["weekly", "unknown"]).is_none());

        let (node, depth) = router.find_full(&["weekly", "ban", "x"]).unwrap();
        assert_eq!((node.path(), depth), ("weekly ban", 2));
    }

    #[test]
    fn test_find_without_match_stays_at_root() {
        let mut router = Route::new();
        router.on("ping", || async {});

        let (node, depth) = router.find(&["pong"]);
        assert_eq!(depth, 0);
        assert_eq!(node.path(), "");
        assert!(router.find_full(&["pong"]).is_none());
        assert!(router.find_full::<&str>(&[]).is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let mut router = Route::new();
        router.on("ping", || async {});
        assert!(router.find_full(&["Ping"]).is_none());
    }

    #[tokio::test]
    async fn test_layer_is_scoped_to_subtree() {
        let mut router = Route::new();
        router.namespace("weekly").layer_boxed(tag("weekly-mw")).group(|r| {
            r.on("ban", || async { "ban" });
        });
        router.namespace("config").on("set", || async { "set" });

        let session = Arc::new(MockSession::default());
        let (set, _) = router.find_full(&["config", "set", "x"]).unwrap();
        run(set, &session).await;
        assert_eq!(session.texts(), vec!["set"]);

        let session = Arc::new(MockSession::default());
        let (ban, _) = router.find_full(&["weekly", "ban"]).unwrap();
        run(ban, &session).await;
        assert_eq!(session.texts(), vec!["weekly-mw", "ban"]);
    }

    #[tokio::test]
    async fn test_ancestor_middleware_runs_first() {
        let mut router = Route::new();
        router.layer_boxed(tag("root"));
        router
            .namespace("weekly")
            .layer_boxed(tag("weekly-1"))
            .layer_boxed(tag("weekly-2"))
            .on("ban", || async { "ban" })
            .layer_boxed(tag("ban"));

        let session = Arc::new(MockSession::default());
        run(router.find(&["weekly", "ban"]).0, &session).await;
        assert_eq!(session.texts(), vec![
            "root", "weekly-1", "weekly-2", "ban", "ban"
        ]);
    }

    #[tokio::test]
    async fn test_layer_wraps_own_existing_handler() {
        let mut router = Route::new();
        router.on("ping", || async { "pong" }).layer_boxed(tag("late"));

        let session = Arc::new(MockSession::default());
        run(router.child("ping").unwrap(), &session).await;
        assert_eq!(session.texts(), vec!["late", "pong"]);
    }

    #[tokio::test]
    async fn test_reregistration_replaces_handler() {
        let mut router = Route::new();
        router.on("ping", || async { "first" });
        router.on("ping", || async { "second" });

        let session = Arc::new(MockSession::default());
        run(router.child("ping").unwrap(), &session).await;
        assert_eq!(session.texts(), vec!["second"]);
    }

    #[test]
    fn test_commands_lists_invocable_routes() {
        let mut router = Route::new();
        router.on("ping", || async {}).desc("Replies with pong");
        router.namespace("weekly").group(|r| {
            r.on("suggest", || async {});
            r.on("banned", || async {});
        });

        assert_eq!(router.commands(), vec![
            ("ping", Some("Replies with pong")),
            ("weekly banned", None),
            ("weekly suggest", None),
        ]);
    }
}
