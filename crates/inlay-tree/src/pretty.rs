//! Compact single-line rendering of expression trees.
//!
//! Used for logging, the CLI and test assertions. Parameters print by
//! name only, so two distinct parameters sharing a name render alike.

use std::fmt::{self, Display, Write};

use crate::expr::{Expr, Lambda, UnOp};

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant { value, .. } => write!(f, "{}", value),
            Expr::Parameter(p) => write!(f, "{}", p.name),
            Expr::Member { target, member } => match target {
                Some(target) => write!(f, "{}.{}", target, member.name),
                None => write!(f, "{}.{}", member.owner, member.name),
            },
            Expr::Invoke { callee, args } => {
                write!(f, "({})(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Call {
                target,
                method,
                args,
            } => {
                match target {
                    Some(target) => write!(f, "{}.{}(", target, method.name)?,
                    None => write!(f, "{}.{}(", method.owner, method.name)?,
                }
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Lambda(lambda) => write!(f, "{}", lambda),
            Expr::Unary { op, operand } => match op {
                UnOp::Not => write!(f, "!{}", operand),
                UnOp::Neg => write!(f, "-{}", operand),
            },
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", test, then, otherwise),
            Expr::New { ty, args } => {
                write!(f, "new {}(", ty)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::List { items, .. } => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
        }
    }
}

impl Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.params.as_slice() {
            [single] => write!(f, "{} => {}", single.name, self.body),
            params => {
                f.write_char('(')?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&p.name)?;
                }
                write!(f, ") => {}", self.body)
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
