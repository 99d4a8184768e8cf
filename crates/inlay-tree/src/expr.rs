//! Expression tree nodes.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::known;
use crate::types::{Member, Method, Type};
use crate::value::Value;

static NEXT_PARAM: AtomicU32 = AtomicU32::new(1);

/// Stable identity of a lambda parameter. Names are for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamId(pub u32);

impl ParamId {
    /// Allocate a process-unique identity.
    pub fn fresh() -> Self {
        ParamId(NEXT_PARAM.fetch_add(1, Ordering::Relaxed))
    }
}

/// A lambda parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    pub id: ParamId,
    pub name: SmolStr,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<SmolStr>, ty: Type) -> Self {
        Self {
            id: ParamId::fresh(),
            name: name.into(),
            ty,
        }
    }

    /// A reference to this parameter.
    pub fn to_expr(&self) -> Expr {
        Expr::Parameter(self.clone())
    }
}

/// A parameterized function value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Box<Expr>,
}

impl Lambda {
    pub fn ty(&self) -> Type {
        Type::function(
            self.params.iter().map(|p| p.ty.clone()).collect(),
            self.body.ty(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// An immutable expression tree node.
///
/// `Invoke`, `Call`, `Member` and `Lambda` are the shapes the rewriter
/// inspects; every other kind is rebuilt with its children rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Constant {
        value: Value,
        ty: Type,
    },
    Parameter(Param),
    /// Field or property read. `target` is `None` for static members.
    Member {
        target: Option<Box<Expr>>,
        member: Member,
    },
    /// Apply a lambda value to arguments.
    Invoke {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Method call. `target` is `None` for static methods.
    Call {
        target: Option<Box<Expr>>,
        method: Method,
        args: Vec<Expr>,
    },
    Lambda(Lambda),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Object construction.
    New {
        ty: Type,
        args: Vec<Expr>,
    },
    /// Collection construction.
    List {
        elem: Type,
        items: Vec<Expr>,
    },
}

// ============================================================================
// Construction
// ============================================================================

impl Expr {
    pub fn constant(value: Value, ty: Type) -> Self {
        Expr::Constant { value, ty }
    }

    pub fn null() -> Self {
        Expr::constant(Value::Null, Type::Object)
    }

    pub fn bool(b: bool) -> Self {
        Expr::constant(Value::Bool(b), Type::Bool)
    }

    pub fn int(n: i64) -> Self {
        Expr::constant(Value::Int(n), Type::Int)
    }

    pub fn float(n: f64) -> Self {
        Expr::constant(Value::Float(n), Type::Float)
    }

    pub fn string(s: impl Into<SmolStr>) -> Self {
        Expr::constant(Value::String(s.into()), Type::String)
    }

    /// A constant holding a stored expression tree.
    pub fn quote(expr: Expr) -> Self {
        let ty = Type::Expression(Box::new(expr.ty()));
        Expr::constant(Value::expr(expr), ty)
    }

    pub fn param(param: &Param) -> Self {
        param.to_expr()
    }

    pub fn member(target: Expr, member: Member) -> Self {
        Expr::Member {
            target: Some(Box::new(target)),
            member,
        }
    }

    pub fn static_member(member: Member) -> Self {
        Expr::Member {
            target: None,
            member,
        }
    }

    pub fn invoke(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Invoke {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn call(target: Option<Expr>, method: Method, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: target.map(Box::new),
            method,
            args,
        }
    }

    /// Instance method call.
    pub fn method(target: Expr, method: Method, args: Vec<Expr>) -> Self {
        Expr::call(Some(target), method, args)
    }

    /// Static method call.
    pub fn call_static(method: Method, args: Vec<Expr>) -> Self {
        Expr::call(None, method, args)
    }

    pub fn lambda(params: Vec<Param>, body: Expr) -> Self {
        Expr::Lambda(Lambda {
            params,
            body: Box::new(body),
        })
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn logical_not(operand: Expr) -> Self {
        Expr::unary(UnOp::Not, operand)
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Expr::binary(BinOp::Eq, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::binary(BinOp::And, left, right)
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::binary(BinOp::Or, left, right)
    }

    pub fn conditional(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn new_object(ty: Type, args: Vec<Expr>) -> Self {
        Expr::New { ty, args }
    }

    pub fn list(elem: Type, items: Vec<Expr>) -> Self {
        Expr::List { elem, items }
    }

    /// `Inlay.Invoke(expr, args..)`: the helper-call spelling of an invocation.
    pub fn invoke_helper(expr: Expr, args: Vec<Expr>) -> Self {
        let ret = expr.ty().function_result().cloned().unwrap_or(Type::Object);
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(expr);
        all.extend(args);
        Expr::call_static(known::invoke_helper(ret), all)
    }

    /// `target.Compile()` on a stored expression.
    pub fn compile(target: Expr) -> Self {
        let delegate = match target.ty() {
            Type::Expression(inner) => *inner,
            other => other,
        };
        Expr::method(target, known::compile(delegate), Vec::new())
    }

    /// `Inlay.Expand(expr)`: marks a tree as expandable.
    pub fn expand_marker(expr: Expr) -> Self {
        let ty = expr.ty();
        Expr::call_static(known::expand_marker(ty), vec![expr])
    }
}

// ============================================================================
// Inspection
// ============================================================================

impl Expr {
    /// Declared result type of this node.
    pub fn ty(&self) -> Type {
        match self {
            Expr::Constant { ty, .. } => ty.clone(),
            Expr::Parameter(p) => p.ty.clone(),
            Expr::Member { member, .. } => member.value_type.clone(),
            Expr::Invoke { callee, .. } => callee
                .ty()
                .function_result()
                .cloned()
                .unwrap_or(Type::Object),
            Expr::Call { method, .. } => method.return_type.clone(),
            Expr::Lambda(lambda) => lambda.ty(),
            Expr::Unary { op: UnOp::Not, .. } => Type::Bool,
            Expr::Unary { operand, .. } => operand.ty(),
            Expr::Binary { op, left, .. } => {
                if op.is_comparison() || op.is_logical() {
                    Type::Bool
                } else {
                    left.ty()
                }
            }
            Expr::Conditional { then, .. } => then.ty(),
            Expr::New { ty, .. } => ty.clone(),
            Expr::List { elem, .. } => Type::sequence(elem.clone()),
        }
    }

    pub fn as_lambda(&self) -> Option<&Lambda> {
        match self {
            Expr::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Constant { .. } => "Constant",
            Expr::Parameter(_) => "Parameter",
            Expr::Member { .. } => "Member",
            Expr::Invoke { .. } => "Invoke",
            Expr::Call { .. } => "Call",
            Expr::Lambda(_) => "Lambda",
            Expr::Unary { .. } => "Unary",
            Expr::Binary { .. } => "Binary",
            Expr::Conditional { .. } => "Conditional",
            Expr::New { .. } => "New",
            Expr::List { .. } => "List",
        }
    }

    /// Direct children, in evaluation order. Lambda parameters are not
    /// children; only the body is.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Constant { .. } | Expr::Parameter(_) => Vec::new(),
            Expr::Member { target, .. } => target.iter().map(|t| t.as_ref()).collect(),
            Expr::Invoke { callee, args } => {
                let mut out = vec![callee.as_ref()];
                out.extend(args.iter());
                out
            }
            Expr::Call { target, args, .. } => {
                let mut out: Vec<&Expr> = target.iter().map(|t| t.as_ref()).collect();
                out.extend(args.iter());
                out
            }
            Expr::Lambda(lambda) => vec![lambda.body.as_ref()],
            Expr::Unary { operand, .. } => vec![operand.as_ref()],
            Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => vec![test.as_ref(), then.as_ref(), otherwise.as_ref()],
            Expr::New { args, .. } => args.iter().collect(),
            Expr::List { items, .. } => items.iter().collect(),
        }
    }

    /// True if `pred` holds for this node or any descendant.
    pub fn any(&self, pred: &mut impl FnMut(&Expr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        self.children().into_iter().any(|child| child.any(pred))
    }

    /// Number of nodes in the tree for which `pred` holds.
    pub fn count(&self, pred: &mut impl FnMut(&Expr) -> bool) -> usize {
        let own = usize::from(pred(self));
        own + self
            .children()
            .into_iter()
            .map(|child| child.count(pred))
            .sum::<usize>()
    }

    /// Rebuild this node with every child passed through `f`.
    ///
    /// The node kind and all non-child attributes are preserved. Lambda
    /// parameter lists are kept as-is.
    pub fn try_map_children<E>(
        &self,
        mut f: impl FnMut(&Expr) -> Result<Expr, E>,
    ) -> Result<Expr, E> {
        Ok(match self {
            Expr::Constant { .. } | Expr::Parameter(_) => self.clone(),
            Expr::Member { target, member } => Expr::Member {
                target: match target {
                    Some(t) => Some(Box::new(f(t)?)),
                    None => None,
                },
                member: member.clone(),
            },
            Expr::Invoke { callee, args } => {
                let callee = f(callee)?;
                let args = args.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
                Expr::Invoke {
                    callee: Box::new(callee),
                    args,
                }
            }
            Expr::Call {
                target,
                method,
                args,
            } => {
                let target = match target {
                    Some(t) => Some(Box::new(f(t)?)),
                    None => None,
                };
                let args = args.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
                Expr::Call {
                    target,
                    method: method.clone(),
                    args,
                }
            }
            Expr::Lambda(lambda) => Expr::Lambda(Lambda {
                params: lambda.params.clone(),
                body: Box::new(f(&lambda.body)?),
            }),
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: Box::new(f(operand)?),
            },
            Expr::Binary { op, left, right } => {
                let left = f(left)?;
                let right = f(right)?;
                Expr::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                let test = f(test)?;
                let then = f(then)?;
                let otherwise = f(otherwise)?;
                Expr::Conditional {
                    test: Box::new(test),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                }
            }
            Expr::New { ty, args } => Expr::New {
                ty: ty.clone(),
                args: args.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?,
            },
            Expr::List { elem, items } => Expr::List {
                elem: elem.clone(),
                items: items.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?,
            },
        })
    }
}

impl From<Lambda> for Expr {
    fn from(lambda: Lambda) -> Self {
        Expr::Lambda(lambda)
    }
}
