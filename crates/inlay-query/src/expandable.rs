//! The expanding backend decorator.

use std::sync::Arc;

use inlay_rewrite::{RewriteConfig, Rewriter};
use inlay_tree::{Expr, Registry, Value};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::{QueryError, Result};

/// Wraps a backend so every tree is flattened before it is executed.
///
/// Static fragments are read from the registry given at construction, or
/// from [`Registry::global`] when none was given.
#[derive(Debug, Clone)]
pub struct Expandable<B> {
    inner: B,
    registry: Option<Arc<Registry>>,
    config: RewriteConfig,
}

impl<B> Expandable<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            registry: None,
            config: RewriteConfig::default(),
        }
    }

    pub fn with_registry(inner: B, registry: Arc<Registry>) -> Self {
        Self {
            inner,
            registry: Some(registry),
            config: RewriteConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RewriteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn registry(&self) -> &Registry {
        match &self.registry {
            Some(registry) => registry,
            None => Registry::global(),
        }
    }

    /// Flatten `tree` the way [`Backend::execute`] will.
    pub fn expand(&self, tree: &Expr) -> Result<Expr> {
        Rewriter::with_config(self.registry(), self.config)
            .rewrite(tree)
            .map_err(|err| {
                warn!(error = %err, "query rewrite failed");
                QueryError::from(err)
            })
    }
}

impl<B: Backend> Backend for Expandable<B> {
    fn execute(&self, tree: &Expr) -> Result<Value> {
        let flat = self.expand(tree)?;
        debug!(flat = %flat, "expanded query tree");
        self.inner.execute(&flat)
    }

    fn is_expanding(&self) -> bool {
        true
    }
}

/// Wrap `backend` in [`Expandable`] unless it already expands.
pub fn expandable(backend: Arc<dyn Backend>) -> Arc<dyn Backend> {
    if backend.is_expanding() {
        return backend;
    }
    Arc::new(Expandable::new(backend))
}

/// Like [`expandable`], reading static fragments from `registry`.
pub fn expandable_with(backend: Arc<dyn Backend>, registry: Arc<Registry>) -> Arc<dyn Backend> {
    if backend.is_expanding() {
        return backend;
    }
    Arc::new(Expandable::with_registry(backend, registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBackend;
    use inlay_tree::{BinOp, Param, Type};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrapping_is_idempotent() {
        let base: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let once = expandable(base);
        let twice = expandable(Arc::clone(&once));
        assert!(Arc::ptr_eq(&once, &twice));
        assert!(twice.is_expanding());
    }

    #[test]
    fn test_invocation_executes_after_expansion() {
        let x = Param::new("x", Type::Int);
        let inc = Expr::lambda(
            vec![x.clone()],
            Expr::binary(BinOp::Add, x.to_expr(), Expr::int(1)),
        );
        let tree = Expr::invoke(inc, vec![Expr::int(41)]);
        let backend = Expandable::new(InMemoryBackend::new());
        assert_eq!(backend.execute(&tree).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_rewrite_failure_surfaces() {
        let tree = Expr::invoke(Expr::int(3), vec![]);
        let backend = Expandable::with_registry(InMemoryBackend::new(), Arc::new(Registry::empty()));
        assert!(matches!(
            backend.execute(&tree),
            Err(QueryError::Rewrite(_))
        ));
    }
}
