//! Declared types and member/method descriptors.
//!
//! Types here are purely descriptive: the rewriter never checks them, it
//! only asks two questions of a member descriptor: does the member hold a
//! stored expression, and is its owner a closure carrier.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A declared type attached to constants, parameters and members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Unit,
    Bool,
    Int,
    Float,
    String,
    /// Top type; used when nothing more precise is known.
    Object,
    /// An ordinary user type (record, service, static holder).
    Named(SmolStr),
    /// A type that only exists to hold variables captured from an
    /// enclosing lexical scope.
    Carrier(SmolStr),
    /// A delegate type: parameter types and a return type.
    Function(Vec<Type>, Box<Type>),
    /// The expression-tree representation of a (usually function) type.
    Expression(Box<Type>),
    /// A homogeneous sequence.
    Sequence(Box<Type>),
}

impl Type {
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Type::Named(name.into())
    }

    pub fn carrier(name: impl Into<SmolStr>) -> Self {
        Type::Carrier(name.into())
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(params, Box::new(ret))
    }

    /// Expression-tree type of a function `params -> ret`.
    pub fn expression_of(params: Vec<Type>, ret: Type) -> Self {
        Type::Expression(Box::new(Type::function(params, ret)))
    }

    pub fn sequence(elem: Type) -> Self {
        Type::Sequence(Box::new(elem))
    }

    /// True when a value of this type is itself an expression tree.
    pub fn is_expression(&self) -> bool {
        matches!(self, Type::Expression(_))
    }

    /// True for closure-carrier types.
    pub fn is_carrier(&self) -> bool {
        matches!(self, Type::Carrier(_))
    }

    /// Return type of a function, or of an expression wrapping a function.
    pub fn function_result(&self) -> Option<&Type> {
        match self {
            Type::Function(_, ret) => Some(ret),
            Type::Expression(inner) => inner.function_result(),
            _ => None,
        }
    }

    /// Name of a named or carrier type.
    pub fn name(&self) -> Option<&SmolStr> {
        match self {
            Type::Named(name) | Type::Carrier(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "Unit"),
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::String => write!(f, "String"),
            Type::Object => write!(f, "Object"),
            Type::Named(name) => write!(f, "{}", name),
            Type::Carrier(name) => write!(f, "<{}>", name),
            Type::Function(params, ret) => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Expression(inner) => write!(f, "Expr<{}>", inner),
            Type::Sequence(elem) => write!(f, "[{}]", elem),
        }
    }
}

/// Whether a member is read once and cached or recomputed on each access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemberKind {
    #[default]
    Field,
    Property,
}

/// Describes a field or property: its name, declared value type and
/// owning type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: SmolStr,
    pub value_type: Type,
    pub owner: Type,
    #[serde(default)]
    pub kind: MemberKind,
}

impl Member {
    pub fn field(owner: Type, name: impl Into<SmolStr>, value_type: Type) -> Self {
        Self {
            name: name.into(),
            value_type,
            owner,
            kind: MemberKind::Field,
        }
    }

    pub fn property(owner: Type, name: impl Into<SmolStr>, value_type: Type) -> Self {
        Self {
            name: name.into(),
            value_type,
            owner,
            kind: MemberKind::Property,
        }
    }

    /// The member's value is a stored expression tree.
    pub fn holds_expression(&self) -> bool {
        self.value_type.is_expression()
    }

    /// The member belongs to a closure-carrier type.
    pub fn owned_by_carrier(&self) -> bool {
        self.owner.is_carrier()
    }
}

/// Describes a method: owning type, name and declared return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub owner: SmolStr,
    pub name: SmolStr,
    pub return_type: Type,
}

impl Method {
    pub fn new(owner: impl Into<SmolStr>, name: impl Into<SmolStr>, return_type: Type) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            return_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_and_carrier_are_independent() {
        let holder = Type::carrier("Closure0");
        let pred = Type::expression_of(vec![Type::String], Type::Bool);

        let captured = Member::field(holder.clone(), "filter", pred.clone());
        assert!(captured.holds_expression());
        assert!(captured.owned_by_carrier());

        let plain = Member::field(holder, "name", Type::String);
        assert!(!plain.holds_expression());
        assert!(plain.owned_by_carrier());

        let stored = Member::property(Type::named("Filters"), "IsActive", pred);
        assert!(stored.holds_expression());
        assert!(!stored.owned_by_carrier());
    }

    #[test]
    fn test_function_result() {
        let pred = Type::expression_of(vec![Type::Int], Type::Bool);
        assert_eq!(pred.function_result(), Some(&Type::Bool));
        assert_eq!(Type::Int.function_result(), None);
    }

    #[test]
    fn test_type_display() {
        let ty = Type::expression_of(vec![Type::String, Type::Int], Type::Bool);
        assert_eq!(ty.to_string(), "Expr<fn(String, Int) -> Bool>");
        assert_eq!(Type::carrier("Scope").to_string(), "<Scope>");
    }
}
