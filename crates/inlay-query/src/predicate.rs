//! Building predicates up from smaller ones.
//!
//! Combined predicates apply their operands through `Invoke` nodes, so
//! they are only usable against an expanding backend. After expansion the
//! operand bodies sit inline under the first operand's parameters.

use inlay_tree::{Expr, Param, Type};

use crate::{QueryError, Result};

/// Constructors for composable boolean lambdas.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateBuilder;

impl PredicateBuilder {
    /// `x => true` over elements of type `ty`.
    pub fn truth(ty: Type) -> Expr {
        Self::constant(ty, true)
    }

    /// `x => false` over elements of type `ty`.
    pub fn falsity(ty: Type) -> Expr {
        Self::constant(ty, false)
    }

    /// `(params) => a.body || b(params)`
    pub fn or(a: Expr, b: Expr) -> Result<Expr> {
        combine(a, b, Expr::or)
    }

    /// `(params) => a.body && b(params)`
    pub fn and(a: Expr, b: Expr) -> Result<Expr> {
        combine(a, b, Expr::and)
    }

    /// `(params) => !a.body`
    pub fn not(a: Expr) -> Result<Expr> {
        let (params, body) = open(a)?;
        Ok(Expr::lambda(params, Expr::logical_not(body)))
    }

    fn constant(ty: Type, value: bool) -> Expr {
        Expr::lambda(vec![Param::new("x", ty)], Expr::bool(value))
    }
}

fn combine(a: Expr, b: Expr, join: fn(Expr, Expr) -> Expr) -> Result<Expr> {
    let (params, body) = open(a)?;
    let args = params.iter().map(Param::to_expr).collect();
    Ok(Expr::lambda(params, join(body, Expr::invoke(b, args))))
}

/// Split a predicate into parameters and body. Anything other than a
/// lambda literal (a captured fragment, say) is applied to fresh
/// parameters of its declared function type.
fn open(pred: Expr) -> Result<(Vec<Param>, Expr)> {
    let pred = match pred {
        Expr::Lambda(lambda) => return Ok((lambda.params, *lambda.body)),
        other => other,
    };

    let ty = pred.ty();
    let param_types = match &ty {
        Type::Function(params, _) => params,
        Type::Expression(inner) => match inner.as_ref() {
            Type::Function(params, _) => params,
            _ => return Err(not_a_predicate(&ty)),
        },
        _ => return Err(not_a_predicate(&ty)),
    };
    let params: Vec<Param> = param_types
        .iter()
        .enumerate()
        .map(|(i, t)| Param::new(format!("p{}", i), t.clone()))
        .collect();
    let args = params.iter().map(Param::to_expr).collect();
    Ok((params, Expr::invoke(pred, args)))
}

fn not_a_predicate(ty: &Type) -> QueryError {
    QueryError::Type {
        message: format!("expected a predicate, got {}", ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_tree::BinOp;
    use pretty_assertions::assert_eq;

    fn positive() -> Expr {
        let n = Param::new("n", Type::Int);
        Expr::lambda(vec![n.clone()], Expr::binary(BinOp::Gt, n.to_expr(), Expr::int(0)))
    }

    #[test]
    fn test_constants() {
        assert_eq!(PredicateBuilder::truth(Type::Int).to_string(), "x => true");
        assert_eq!(PredicateBuilder::falsity(Type::Int).to_string(), "x => false");
    }

    #[test]
    fn test_or_reuses_first_operand_params() {
        let combined = PredicateBuilder::or(positive(), PredicateBuilder::truth(Type::Int)).unwrap();
        assert_eq!(combined.to_string(), "n => ((n > 0) || (x => true)(n))");
    }

    #[test]
    fn test_not() {
        let negated = PredicateBuilder::not(positive()).unwrap();
        assert_eq!(negated.to_string(), "n => !(n > 0)");
    }

    #[test]
    fn test_non_function_rejected() {
        let err = PredicateBuilder::not(Expr::int(1)).unwrap_err();
        assert_eq!(
            err,
            QueryError::Type {
                message: "expected a predicate, got Int".into()
            }
        );
    }
}
