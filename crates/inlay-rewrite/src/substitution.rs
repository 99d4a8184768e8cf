//! Parameter substitution environments.

use std::sync::Arc;

use inlay_tree::{Expr, Param, ParamId};
use rustc_hash::FxHashMap;

use crate::InliningFault;

/// Maps parameter identities to the expressions that replace them.
///
/// An environment is frozen once built. Inlining a nested invocation
/// creates a child that sees every binding of its parent, so sibling
/// inlinings never observe each other's bindings.
#[derive(Debug, Default)]
pub struct Substitution {
    /// Bindings introduced by this scope
    bindings: FxHashMap<ParamId, Expr>,

    /// Enclosing scope
    parent: Option<Arc<Substitution>>,
}

impl Substitution {
    /// Create an empty root environment.
    pub fn new() -> Self {
        Substitution {
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    /// Build a child of `parent` binding each parameter to its argument,
    /// in declaration order.
    ///
    /// A binding shadows any inherited binding for the same parameter.
    /// Fails if a parameter appears twice in `pairs`.
    pub fn extend<'p>(
        parent: &Arc<Substitution>,
        pairs: impl IntoIterator<Item = (&'p Param, Expr)>,
    ) -> Result<Arc<Substitution>, InliningFault> {
        let mut child = Substitution {
            bindings: FxHashMap::default(),
            parent: Some(Arc::clone(parent)),
        };
        for (param, expr) in pairs {
            if child.bindings.contains_key(&param.id) {
                return Err(InliningFault::Recursive {
                    param: param.name.clone(),
                });
            }
            child.bindings.insert(param.id, expr);
        }
        Ok(Arc::new(child))
    }

    /// Look up a parameter, searching enclosing scopes.
    pub fn get(&self, id: ParamId) -> Option<&Expr> {
        if let Some(expr) = self.bindings.get(&id) {
            Some(expr)
        } else if let Some(parent) = &self.parent {
            parent.get(id)
        } else {
            None
        }
    }

    pub fn contains(&self, id: ParamId) -> bool {
        self.get(id).is_some()
    }

    /// Number of bindings in this scope and its ancestors.
    pub fn len(&self) -> usize {
        self.bindings.len() + self.parent.as_ref().map_or(0, |p| p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
