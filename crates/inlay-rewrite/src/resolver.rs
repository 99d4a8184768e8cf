//! Resolution of member reads that denote stored or captured expressions.
//!
//! A local holding a prebuilt fragment shows up in a composed tree as a
//! member read off a closure carrier; a static fragment shows up as a
//! static member read. Neither means anything to a translator outside the
//! program, so the resolver reads the value out and hands the stored tree
//! back to the rewriter.

use std::sync::Arc;

use inlay_tree::{Carrier, Expr, Member, Registry, Value};
use tracing::trace;

/// Maps member accesses to the stored expression they denote.
#[derive(Debug, Clone, Copy)]
pub struct ClosureResolver<'r> {
    registry: &'r Registry,
}

impl<'r> ClosureResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve a `Member` node.
    ///
    /// Returns the stored tree, not yet rewritten, or `None` when the
    /// access is an ordinary value read that must stay in place.
    pub fn resolve(&self, access: &Expr) -> Option<Expr> {
        let Expr::Member { target, member } = access else {
            return None;
        };

        if !member.holds_expression() {
            return None;
        }

        // Captured local: read the field straight off the carrier instance.
        if member.owned_by_carrier() {
            if let Some(instance) = target.as_deref().and_then(|t| self.captured_instance(t)) {
                if instance.ty() == member.owner {
                    trace!(carrier = %instance.name, member = %member.name, "reading captured expression");
                    return match instance.fields.get(&member.name) {
                        Some(Value::Expr(tree)) => Some(Expr::clone(tree)),
                        _ => None,
                    };
                }
            }
        }

        // Stored fragment: read the member against its already-available target.
        let value = match target {
            None => Value::Expr(self.registry.load_static(member)?),
            Some(target) => {
                let instance = self.evaluate(target)?;
                self.registry.read_instance(&instance, member)?
            }
        };
        match value {
            Value::Expr(tree) => {
                trace!(owner = %member.owner, member = %member.name, "reading stored expression");
                Some(Expr::clone(&tree))
            }
            _ => None,
        }
    }

    /// The carrier instance `target` denotes, following captured carriers
    /// nested inside other carriers.
    fn captured_instance(&self, target: &Expr) -> Option<Arc<Carrier>> {
        match target {
            Expr::Constant {
                value: Value::Carrier(carrier),
                ..
            } => Some(Arc::clone(carrier)),
            Expr::Member {
                target: Some(inner),
                member,
            } if member.owned_by_carrier() => {
                let outer = self.captured_instance(inner)?;
                match outer.fields.get(&member.name)? {
                    Value::Carrier(carrier) => Some(Arc::clone(carrier)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Statically evaluate a member-read chain rooted at a constant or a
    /// static member. Anything else (parameters, calls, arithmetic) is not
    /// available before the query runs.
    fn evaluate(&self, target: &Expr) -> Option<Value> {
        match target {
            Expr::Constant { value, .. } => Some(value.clone()),
            Expr::Member {
                target: Some(inner),
                member,
            } => {
                let instance = self.evaluate(inner)?;
                self.read(&instance, member)
            }
            Expr::Member {
                target: None,
                member,
            } => self.registry.load_static(member).map(Value::Expr),
            _ => None,
        }
    }

    fn read(&self, instance: &Value, member: &Member) -> Option<Value> {
        self.registry.read_instance(instance, member)
    }
}
