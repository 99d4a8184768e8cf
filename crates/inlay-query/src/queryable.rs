//! Composable queries bound to a backend.

use std::fmt;
use std::sync::Arc;

use inlay_tree::{Expr, Registry, Type, Value};

use crate::backend::Backend;
use crate::expandable::{expandable, expandable_with};
use crate::operator::Operator;
use crate::{QueryError, Result};

/// A query tree over elements of one type, plus the backend that runs it.
///
/// Operators only extend the tree; nothing executes until the query is
/// enumerated with [`to_vec`](Self::to_vec), [`count`](Self::count) or
/// [`any`](Self::any).
#[derive(Clone)]
pub struct Queryable {
    tree: Expr,
    elem: Type,
    backend: Arc<dyn Backend>,
}

impl Queryable {
    /// A query over a fixed in-memory sequence.
    pub fn new(items: Vec<Value>, elem: Type, backend: Arc<dyn Backend>) -> Self {
        let tree = Expr::constant(Value::seq(items), Type::sequence(elem.clone()));
        Self::from_tree(tree, elem, backend)
    }

    pub fn from_tree(tree: Expr, elem: Type, backend: Arc<dyn Backend>) -> Self {
        Self { tree, elem, backend }
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    pub fn elem_type(&self) -> &Type {
        &self.elem
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// `Where(source, predicate)`
    pub fn filter(self, predicate: Expr) -> Self {
        let op = Operator::Where.method(Type::sequence(self.elem.clone()));
        Self {
            tree: Expr::call_static(op, vec![self.tree, predicate]),
            ..self
        }
    }

    /// `Select(source, projection)`; the element type becomes the
    /// projection's result type.
    pub fn select(self, projection: Expr) -> Self {
        let elem = projection.ty().function_result().cloned().unwrap_or(Type::Object);
        let op = Operator::Select.method(Type::sequence(elem.clone()));
        Self {
            tree: Expr::call_static(op, vec![self.tree, projection]),
            elem,
            backend: self.backend,
        }
    }

    /// Route execution through an expanding backend reading static
    /// fragments from [`Registry::global`]. A query that already expands
    /// is returned as is.
    pub fn as_expandable(self) -> Self {
        if self.backend.is_expanding() {
            return self;
        }
        let backend = expandable(Arc::clone(&self.backend));
        self.mark(backend)
    }

    /// Like [`as_expandable`](Self::as_expandable), reading static
    /// fragments from `registry`.
    pub fn as_expandable_with(self, registry: Arc<Registry>) -> Self {
        if self.backend.is_expanding() {
            return self;
        }
        let backend = expandable_with(Arc::clone(&self.backend), registry);
        self.mark(backend)
    }

    // The marker keeps the expansion visible when this query is embedded
    // in another query's tree; rewriting erases it.
    fn mark(self, backend: Arc<dyn Backend>) -> Self {
        Self {
            tree: Expr::expand_marker(self.tree),
            elem: self.elem,
            backend,
        }
    }

    /// Execute the query and collect its elements.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        match self.backend.execute(&self.tree)? {
            Value::Seq(items) => Ok(items.as_ref().clone()),
            other => Err(QueryError::Type {
                message: format!("query produced {} instead of a sequence", other.type_name()),
            }),
        }
    }

    pub fn count(&self) -> Result<usize> {
        let tree = Expr::call_static(Operator::Count.method(Type::Int), vec![self.tree.clone()]);
        match self.backend.execute(&tree)? {
            Value::Int(n) if n >= 0 => Ok(n as usize),
            other => Err(QueryError::Type {
                message: format!("Count produced {}", other),
            }),
        }
    }

    /// Whether any element satisfies `predicate`.
    pub fn any(&self, predicate: Expr) -> Result<bool> {
        let tree = Expr::call_static(
            Operator::Any.method(Type::Bool),
            vec![self.tree.clone(), predicate],
        );
        let value = self.backend.execute(&tree)?;
        value.as_bool().ok_or_else(|| QueryError::Type {
            message: format!("Any produced {}", value),
        })
    }
}

impl fmt::Debug for Queryable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("tree", &self.tree.to_string())
            .field("elem", &self.elem)
            .field("expanding", &self.backend.is_expanding())
            .finish()
    }
}
