//! Query execution backends.

use std::sync::Arc;

use inlay_tree::{Expr, Registry, Value};
use tracing::debug;

use crate::eval::Evaluator;
use crate::Result;

/// Executes a query tree and produces its result.
///
/// Backends translate flat trees only; see [`crate::Expandable`] for the
/// decorator that flattens trees first.
pub trait Backend: Send + Sync {
    fn execute(&self, tree: &Expr) -> Result<Value>;

    /// Whether this backend already rewrites trees before executing them.
    fn is_expanding(&self) -> bool {
        false
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn execute(&self, tree: &Expr) -> Result<Value> {
        (**self).execute(tree)
    }

    fn is_expanding(&self) -> bool {
        (**self).is_expanding()
    }
}

/// Runs queries over in-memory values with [`Evaluator`].
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    registry: Arc<Registry>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(Registry::empty()))
    }

    /// Use `registry` for computed instance members.
    pub fn with_registry(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryBackend {
    fn execute(&self, tree: &Expr) -> Result<Value> {
        debug!(tree = %tree, "executing query");
        Evaluator::new(&self.registry).evaluate(tree)
    }
}
