//! Fixed method descriptors with special meaning to the rewriter.
//!
//! Recognition is by (owner, name) only; return types vary per use site.

use crate::types::{Method, Type};

/// Owner of the helper methods (`Invoke`, `Expand`).
pub const HELPER_OWNER: &str = "Inlay";
/// Owner of the stored-expression `Compile` accessor.
pub const EXPRESSION_OWNER: &str = "Expression";

pub const INVOKE: &str = "Invoke";
pub const COMPILE: &str = "Compile";
pub const EXPAND: &str = "Expand";

/// `Inlay.Invoke(expr, args..)`
pub fn invoke_helper(ret: Type) -> Method {
    Method::new(HELPER_OWNER, INVOKE, ret)
}

/// `expr.Compile()`, returning the delegate type.
pub fn compile(delegate: Type) -> Method {
    Method::new(EXPRESSION_OWNER, COMPILE, delegate)
}

/// `Inlay.Expand(expr)`
pub fn expand_marker(ty: Type) -> Method {
    Method::new(HELPER_OWNER, EXPAND, ty)
}

/// The special call forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownMethod {
    InvokeHelper,
    Compile,
    ExpandMarker,
}

impl KnownMethod {
    pub fn classify(method: &Method) -> Option<Self> {
        match (method.owner.as_str(), method.name.as_str()) {
            (HELPER_OWNER, INVOKE) => Some(KnownMethod::InvokeHelper),
            (EXPRESSION_OWNER, COMPILE) => Some(KnownMethod::Compile),
            (HELPER_OWNER, EXPAND) => Some(KnownMethod::ExpandMarker),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ignores_return_type() {
        assert_eq!(
            KnownMethod::classify(&invoke_helper(Type::Bool)),
            Some(KnownMethod::InvokeHelper)
        );
        assert_eq!(
            KnownMethod::classify(&invoke_helper(Type::Int)),
            Some(KnownMethod::InvokeHelper)
        );
        assert_eq!(
            KnownMethod::classify(&compile(Type::Object)),
            Some(KnownMethod::Compile)
        );
        assert_eq!(
            KnownMethod::classify(&expand_marker(Type::Unit)),
            Some(KnownMethod::ExpandMarker)
        );
    }

    #[test]
    fn test_lookalikes_are_not_special() {
        let other_owner = Method::new("Strings", INVOKE, Type::Bool);
        assert_eq!(KnownMethod::classify(&other_owner), None);

        let other_name = Method::new(HELPER_OWNER, "Compile", Type::Bool);
        assert_eq!(KnownMethod::classify(&other_name), None);
    }
}
