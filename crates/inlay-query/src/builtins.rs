//! String methods the in-memory backend understands.

use inlay_tree::Value;

use crate::{QueryError, Result};

pub(crate) type BuiltinFn = fn(&str, &[Value]) -> Result<Value>;

/// A method callable on a `String` receiver.
pub(crate) struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    pub func: BuiltinFn,
}

const STRING_METHODS: &[Builtin] = &[
    Builtin { name: "ToLower", arity: 0, func: to_lower },
    Builtin { name: "ToUpper", arity: 0, func: to_upper },
    Builtin { name: "Trim", arity: 0, func: trim },
    Builtin { name: "Length", arity: 0, func: length },
    Builtin { name: "Contains", arity: 1, func: contains },
    Builtin { name: "StartsWith", arity: 1, func: starts_with },
    Builtin { name: "EndsWith", arity: 1, func: ends_with },
];

/// Look up a builtin by receiver type and method name.
pub(crate) fn lookup(owner: &str, name: &str) -> Option<&'static Builtin> {
    match owner {
        "String" => STRING_METHODS.iter().find(|b| b.name == name),
        _ => None,
    }
}

fn string_arg<'a>(method: &str, args: &'a [Value]) -> Result<&'a str> {
    args[0].as_str().ok_or_else(|| QueryError::Type {
        message: format!("{} expects a String argument, got {}", method, args[0].type_name()),
    })
}

fn to_lower(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::string(s.to_lowercase()))
}

fn to_upper(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::string(s.to_uppercase()))
}

fn trim(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::string(s.trim()))
}

fn length(s: &str, _args: &[Value]) -> Result<Value> {
    Ok(Value::Int(s.chars().count() as i64))
}

fn contains(s: &str, args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(s.contains(string_arg("Contains", args)?)))
}

fn starts_with(s: &str, args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(s.starts_with(string_arg("StartsWith", args)?)))
}

fn ends_with(s: &str, args: &[Value]) -> Result<Value> {
    Ok(Value::Bool(s.ends_with(string_arg("EndsWith", args)?)))
}
