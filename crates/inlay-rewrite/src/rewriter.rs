//! The inlining rewriter.
//!
//! One recursive descent per top-level call. The substitution environment
//! is threaded through the call stack as a frozen value; the rewriter
//! itself holds no per-call state.

use std::sync::Arc;

use inlay_tree::{Expr, KnownMethod, Lambda, Method, Registry, Value};
use tracing::{debug, trace};

use crate::config::RewriteConfig;
use crate::resolver::ClosureResolver;
use crate::substitution::Substitution;
use crate::{InliningFault, Result, RewriteError};

/// Flattens invocations, stored-expression reads and marker calls.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'r> {
    resolver: ClosureResolver<'r>,
    config: RewriteConfig,
}

impl<'r> Rewriter<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_config(registry, RewriteConfig::default())
    }

    pub fn with_config(registry: &'r Registry, config: RewriteConfig) -> Self {
        Self {
            resolver: ClosureResolver::new(registry),
            config,
        }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite `expr` into an equivalent tree with no `Invoke` nodes,
    /// special call forms or stored-expression member reads.
    pub fn rewrite(&self, expr: &Expr) -> Result<Expr> {
        let root = Arc::new(Substitution::new());
        self.visit(expr, &root, 0)
    }

    fn visit(&self, expr: &Expr, env: &Arc<Substitution>, depth: usize) -> Result<Expr> {
        match expr {
            Expr::Parameter(param) => match env.get(param.id) {
                Some(bound) => {
                    trace!(param = %param.name, replacement = %bound, "substituting parameter");
                    Ok(bound.clone())
                }
                None => Ok(expr.clone()),
            },
            Expr::Invoke { callee, args } => self.inline_invocation(callee, args, env, depth),
            Expr::Member { .. } => self.visit_member(expr, env, depth),
            Expr::Call {
                target,
                method,
                args,
            } => self.visit_call(expr, target.as_deref(), method, args, env, depth),
            _ => self.visit_children(expr, env, depth),
        }
    }

    fn visit_children(&self, expr: &Expr, env: &Arc<Substitution>, depth: usize) -> Result<Expr> {
        expr.try_map_children(|child| self.visit(child, env, depth))
    }

    fn visit_member(&self, access: &Expr, env: &Arc<Substitution>, depth: usize) -> Result<Expr> {
        match self.resolver.resolve(access) {
            Some(stored) => {
                debug!(access = %access, "inlining stored expression");
                let depth = self.enter(depth)?;
                self.visit(&stored, env, depth)
            }
            None => self.visit_children(access, env, depth),
        }
    }

    fn visit_call(
        &self,
        call: &Expr,
        target: Option<&Expr>,
        method: &Method,
        args: &[Expr],
        env: &Arc<Substitution>,
        depth: usize,
    ) -> Result<Expr> {
        match KnownMethod::classify(method) {
            // Inlay.Invoke(f, a, b) and the instance spelling f.Invoke(a, b)
            Some(KnownMethod::InvokeHelper) => match (target, args.split_first()) {
                (Some(callee), _) => self.inline_invocation(callee, args, env, depth),
                (None, Some((callee, rest))) => self.inline_invocation(callee, rest, env, depth),
                (None, None) => self.visit_children(call, env, depth),
            },
            Some(KnownMethod::Compile) => {
                if let Some(access) = target.filter(|t| matches!(t, Expr::Member { .. })) {
                    if let Some(stored) = self.resolver.resolve(access) {
                        debug!(access = %access, "inlining compiled expression");
                        let depth = self.enter(depth)?;
                        return self.visit(&stored, env, depth);
                    }
                }
                self.visit_children(call, env, depth)
            }
            Some(KnownMethod::ExpandMarker) if target.is_none() && args.len() == 1 => {
                self.visit(&args[0], env, depth)
            }
            _ => self.visit_children(call, env, depth),
        }
    }

    /// Replace `callee(args)` with the callee's body under an environment
    /// binding each parameter to its (already rewritten) argument.
    fn inline_invocation(
        &self,
        callee: &Expr,
        args: &[Expr],
        env: &Arc<Substitution>,
        depth: usize,
    ) -> Result<Expr> {
        let lambda = self.resolve_callee(callee, env, depth)?;
        if lambda.params.len() != args.len() {
            return Err(InliningFault::ArityMismatch {
                expected: lambda.params.len(),
                got: args.len(),
            }
            .into());
        }

        let args = args
            .iter()
            .map(|arg| self.visit(arg, env, depth))
            .collect::<Result<Vec<_>>>()?;
        let scope = Substitution::extend(env, lambda.params.iter().zip(args))?;

        debug!(callee = %callee, params = lambda.params.len(), "inlining invocation");
        let depth = self.enter(depth)?;
        self.visit(&lambda.body, &scope, depth)
    }

    /// Find the lambda an invocation applies.
    fn resolve_callee(&self, callee: &Expr, env: &Arc<Substitution>, depth: usize) -> Result<Lambda> {
        let next = match callee {
            Expr::Lambda(lambda) => return Ok(lambda.clone()),
            Expr::Constant {
                value: Value::Expr(tree),
                ..
            } => Some(Expr::clone(tree)),
            Expr::Member { .. } => self.resolver.resolve(callee),
            Expr::Call {
                target: Some(target),
                method,
                ..
            } if KnownMethod::classify(method) == Some(KnownMethod::Compile) => {
                self.resolver.resolve(target)
            }
            Expr::Call {
                target: None,
                method,
                args,
            } if KnownMethod::classify(method) == Some(KnownMethod::ExpandMarker)
                && args.len() == 1 =>
            {
                Some(args[0].clone())
            }
            Expr::Parameter(param) => env.get(param.id).cloned(),
            Expr::Invoke { .. } => Some(self.visit(callee, env, depth)?),
            _ => None,
        };

        match next {
            Some(next) => self.resolve_callee(&next, env, self.enter(depth)?),
            None => Err(RewriteError::UnresolvableCallee {
                callee: callee.to_string(),
            }),
        }
    }

    fn enter(&self, depth: usize) -> Result<usize> {
        if depth >= self.config.max_inline_depth {
            return Err(InliningFault::DepthExceeded {
                limit: self.config.max_inline_depth,
            }
            .into());
        }
        Ok(depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_tree::{BinOp, Carrier, Member, Param, Type};
    use pretty_assertions::assert_eq;

    fn rewrite(expr: &Expr) -> Result<Expr> {
        let registry = Registry::empty();
        Rewriter::new(&registry).rewrite(expr)
    }

    fn add_one() -> (Param, Expr) {
        let x = Param::new("x", Type::Int);
        let lambda = Expr::lambda(
            vec![x.clone()],
            Expr::binary(BinOp::Add, x.to_expr(), Expr::int(1)),
        );
        (x, lambda)
    }

    #[test]
    fn test_invoke_lambda_literal() {
        let (_, inc) = add_one();
        let tree = Expr::invoke(inc, vec![Expr::int(41)]);
        assert_eq!(
            rewrite(&tree).unwrap(),
            Expr::binary(BinOp::Add, Expr::int(41), Expr::int(1))
        );
    }

    #[test]
    fn test_arguments_rewritten_under_caller_scope() {
        let (_, inc) = add_one();
        let y = Param::new("y", Type::Int);
        // (y => inc(inc(y)))(5)
        let outer = Expr::lambda(
            vec![y.clone()],
            Expr::invoke(inc.clone(), vec![Expr::invoke(inc, vec![y.to_expr()])]),
        );
        let tree = Expr::invoke(outer, vec![Expr::int(5)]);

        let expected = Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Add, Expr::int(5), Expr::int(1)),
            Expr::int(1),
        );
        assert_eq!(rewrite(&tree).unwrap(), expected);
    }

    #[test]
    fn test_unbound_parameter_untouched() {
        let z = Param::new("z", Type::Int);
        assert_eq!(rewrite(&z.to_expr()).unwrap(), z.to_expr());
    }

    #[test]
    fn test_arity_mismatch() {
        let (_, inc) = add_one();
        let tree = Expr::invoke(inc, vec![Expr::int(1), Expr::int(2)]);
        assert_eq!(
            rewrite(&tree).unwrap_err(),
            RewriteError::InvalidInlining(InliningFault::ArityMismatch {
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn test_unresolvable_callee() {
        let tree = Expr::invoke(Expr::int(3), vec![]);
        assert!(matches!(
            rewrite(&tree),
            Err(RewriteError::UnresolvableCallee { .. })
        ));
    }

    #[test]
    fn test_quoted_callee_is_unwrapped() {
        let (_, inc) = add_one();
        let tree = Expr::invoke(Expr::quote(inc), vec![Expr::int(2)]);
        assert_eq!(
            rewrite(&tree).unwrap(),
            Expr::binary(BinOp::Add, Expr::int(2), Expr::int(1))
        );
    }

    #[test]
    fn test_captured_callee_via_helper() {
        let (_, inc) = add_one();
        let scope = Carrier::new("Scope").with("inc", Value::expr(inc));
        let ty = scope.ty();
        let access = Expr::member(
            Expr::constant(Value::carrier(scope), ty.clone()),
            Member::field(ty, "inc", Type::expression_of(vec![Type::Int], Type::Int)),
        );
        let tree = Expr::invoke_helper(access, vec![Expr::int(9)]);
        assert_eq!(
            rewrite(&tree).unwrap(),
            Expr::binary(BinOp::Add, Expr::int(9), Expr::int(1))
        );
    }

    #[test]
    fn test_bound_parameter_callee() {
        // (f => f(3))(x => x + 1)
        let (_, inc) = add_one();
        let f = Param::new("f", Type::function(vec![Type::Int], Type::Int));
        let apply = Expr::lambda(vec![f.clone()], Expr::invoke(f.to_expr(), vec![Expr::int(3)]));
        let tree = Expr::invoke(apply, vec![inc]);
        assert_eq!(
            rewrite(&tree).unwrap(),
            Expr::binary(BinOp::Add, Expr::int(3), Expr::int(1))
        );
    }

    #[test]
    fn test_marker_is_erased() {
        let (_, inc) = add_one();
        let tree = Expr::expand_marker(inc.clone());
        assert_eq!(rewrite(&tree).unwrap(), inc);
    }

    #[test]
    fn test_depth_limit() {
        let (_, inc) = add_one();
        let mut tree = Expr::int(0);
        for _ in 0..5 {
            tree = Expr::invoke(inc.clone(), vec![tree]);
        }
        let registry = Registry::empty();
        let shallow = Rewriter::with_config(&registry, RewriteConfig::default().with_max_inline_depth(0));
        assert_eq!(
            shallow.rewrite(&tree).unwrap_err(),
            RewriteError::InvalidInlining(InliningFault::DepthExceeded { limit: 0 })
        );
        // Sibling-nested arguments do not accumulate depth.
        let roomy = Rewriter::with_config(&registry, RewriteConfig::default().with_max_inline_depth(1));
        assert!(roomy.rewrite(&tree).is_ok());
    }

    #[test]
    fn test_opaque_nodes_rebuilt() {
        let (_, inc) = add_one();
        let tree = Expr::conditional(
            Expr::bool(true),
            Expr::list(Type::Int, vec![Expr::invoke(inc.clone(), vec![Expr::int(1)])]),
            Expr::new_object(Type::named("Box"), vec![Expr::invoke(inc, vec![Expr::int(2)])]),
        );
        let expected = Expr::conditional(
            Expr::bool(true),
            Expr::list(
                Type::Int,
                vec![Expr::binary(BinOp::Add, Expr::int(1), Expr::int(1))],
            ),
            Expr::new_object(
                Type::named("Box"),
                vec![Expr::binary(BinOp::Add, Expr::int(2), Expr::int(1))],
            ),
        );
        assert_eq!(rewrite(&tree).unwrap(), expected);
    }
}
