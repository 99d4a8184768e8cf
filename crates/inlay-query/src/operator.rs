//! Query operators recognised by backends.

use inlay_tree::{Method, Type};

/// Static owner of every query operator method.
pub const OWNER: &str = "Queryable";

/// A sequence operator appearing as `Queryable.<Op>(source, ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Where,
    Select,
    Count,
    Any,
}

impl Operator {
    pub fn name(self) -> &'static str {
        match self {
            Operator::Where => "Where",
            Operator::Select => "Select",
            Operator::Count => "Count",
            Operator::Any => "Any",
        }
    }

    /// Method descriptor for this operator returning `result`.
    pub fn method(self, result: Type) -> Method {
        Method::new(OWNER, self.name(), result)
    }

    pub fn classify(method: &Method) -> Option<Self> {
        if method.owner.as_str() != OWNER {
            return None;
        }
        match method.name.as_str() {
            "Where" => Some(Operator::Where),
            "Select" => Some(Operator::Select),
            "Count" => Some(Operator::Count),
            "Any" => Some(Operator::Any),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_round_trips() {
        for op in [Operator::Where, Operator::Select, Operator::Count, Operator::Any] {
            assert_eq!(Operator::classify(&op.method(Type::Int)), Some(op));
        }
    }

    #[test]
    fn test_other_owners_ignored() {
        let method = Method::new("Enumerable", "Where", Type::Int);
        assert_eq!(Operator::classify(&method), None);
    }
}
