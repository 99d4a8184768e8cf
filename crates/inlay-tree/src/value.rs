//! Runtime values carried by `Constant` nodes.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::expr::Expr;
use crate::types::Type;

/// A value embedded in an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(SmolStr),
    /// A stored expression tree instance.
    Expr(Arc<Expr>),
    /// An instance of a closure-carrier type.
    Carrier(Arc<Carrier>),
    /// An instance of an ordinary record type.
    Record(Arc<Record>),
    Seq(Arc<Vec<Value>>),
}

/// Holds the variables captured from one lexical scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: SmolStr,
    pub fields: IndexMap<SmolStr, Value>,
}

/// An instance of an ordinary record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub name: SmolStr,
    pub fields: IndexMap<SmolStr, Value>,
}

impl Carrier {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a captured variable.
    pub fn with(mut self, field: impl Into<SmolStr>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn ty(&self) -> Type {
        Type::Carrier(self.name.clone())
    }
}

impl Record {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<SmolStr>, value: Value) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn ty(&self) -> Type {
        Type::Named(self.name.clone())
    }
}

impl Value {
    pub fn string(s: impl Into<SmolStr>) -> Self {
        Value::String(s.into())
    }

    pub fn expr(expr: Expr) -> Self {
        Value::Expr(Arc::new(expr))
    }

    pub fn carrier(carrier: Carrier) -> Self {
        Value::Carrier(Arc::new(carrier))
    }

    pub fn record(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }

    pub fn seq(items: Vec<Value>) -> Self {
        Value::Seq(Arc::new(items))
    }

    /// Get the type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Expr(_) => "Expr",
            Value::Carrier(c) => &c.name,
            Value::Record(r) => &r.name,
            Value::Seq(_) => "Seq",
        }
    }

    /// Read a named field off a carrier or record instance.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Carrier(c) => c.fields.get(name),
            Value::Record(r) => r.fields.get(name),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_expr(&self) -> Option<&Arc<Expr>> {
        match self {
            Value::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_carrier(&self) -> Option<&Arc<Carrier>> {
        match self {
            Value::Carrier(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::Expr(e) => write!(f, "expr({})", e),
            Value::Carrier(c) => write!(f, "value(<{}>)", c.name),
            Value::Record(r) => write!(f, "value({})", r.name),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let scope = Value::carrier(Carrier::new("Scope").with("limit", Value::Int(3)));
        assert_eq!(scope.field("limit"), Some(&Value::Int(3)));
        assert_eq!(scope.field("missing"), None);
        assert_eq!(Value::Int(1).field("limit"), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::string("abc").to_string(), "\"abc\"");
        assert_eq!(
            Value::seq(vec![Value::Int(1), Value::Bool(false)]).to_string(),
            "[1, false]"
        );
        assert_eq!(Value::carrier(Carrier::new("Scope")).to_string(), "value(<Scope>)");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::record(Record::new("Customer")).type_name(), "Customer");
        assert_eq!(Value::Float(1.5).type_name(), "Float");
    }
}
