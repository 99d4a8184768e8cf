//! Expression tree model for inlay.
//!
//! Defines the immutable node types that client code composes into query
//! expressions, the type and member descriptors the rewriter classifies,
//! the runtime values embedded in constants (including closure-carrier
//! instances) and the named-expression registry.
//!
//! Nodes carry attributes only. Rewriting lives in `inlay-rewrite`.

pub mod expr;
pub mod known;
mod pretty;
pub mod registry;
pub mod types;
pub mod value;

pub use expr::{BinOp, Expr, Lambda, Param, ParamId, UnOp};
pub use known::KnownMethod;
pub use registry::{Registry, RegistryBuilder, Stored};
pub use types::{Member, MemberKind, Method, Type};
pub use value::{Carrier, Record, Value};

pub use smol_str::SmolStr;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_round_trips_through_json() {
        let scope = Carrier::new("Scope").with("limit", Value::Int(3));
        let x = Param::new("x", Type::Int);
        let member = Member::field(scope.ty(), "limit", Type::Int);
        let tree = Expr::lambda(
            vec![x.clone()],
            Expr::binary(
                BinOp::Lt,
                x.to_expr(),
                Expr::member(Expr::constant(Value::carrier(scope.clone()), scope.ty()), member),
            ),
        );

        let json = serde_json::to_string(&tree).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_model_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expr>();
        assert_send_sync::<Value>();
    }
}
