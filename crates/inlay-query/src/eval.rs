//! Tree-walking evaluation of flat query trees.
//!
//! The evaluator plays the part of a query translator: it understands
//! ordinary operators, member reads, the string builtins and the query
//! operators, and nothing else. Invocations, helper calls and reads of
//! stored expressions are reported as untranslatable.

use std::sync::Arc;

use inlay_tree::{BinOp, Expr, KnownMethod, Lambda, Member, Method, ParamId, Record, Registry, UnOp, Value};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::builtins;
use crate::operator::Operator;
use crate::{QueryError, Result};

/// Values bound to lambda parameters while an operator applies them.
type Bindings = FxHashMap<ParamId, Value>;

/// Evaluates flat expression trees against in-memory values.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r Registry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Evaluate a closed tree.
    pub fn evaluate(&self, expr: &Expr) -> Result<Value> {
        self.eval(expr, &Bindings::default())
    }

    /// Apply a lambda to already evaluated arguments.
    pub fn apply(&self, lambda: &Lambda, args: Vec<Value>) -> Result<Value> {
        self.apply_in(lambda, args, &Bindings::default())
    }

    fn eval(&self, expr: &Expr, env: &Bindings) -> Result<Value> {
        match expr {
            Expr::Constant {
                value: Value::Expr(_),
                ..
            } => Err(untranslatable(expr, "embedded expression tree")),
            Expr::Constant { value, .. } => Ok(value.clone()),

            Expr::Parameter(param) => {
                env.get(&param.id)
                    .cloned()
                    .ok_or_else(|| QueryError::UnboundParameter {
                        name: param.name.clone(),
                    })
            }

            Expr::Member { target, member } => self.eval_member(expr, target.as_deref(), member, env),

            Expr::Invoke { .. } => Err(untranslatable(expr, "invocation of a lambda value")),

            Expr::Call {
                target,
                method,
                args,
            } => self.eval_call(expr, target.as_deref(), method, args, env),

            Expr::Lambda(_) => Err(untranslatable(expr, "lambda outside a query operator")),

            Expr::Unary { op, operand } => self.eval_unary(*op, operand, env),

            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, env),

            Expr::Conditional {
                test,
                then,
                otherwise,
            } => {
                if self.eval_bool(test, env)? {
                    self.eval(then, env)
                } else {
                    self.eval(otherwise, env)
                }
            }

            Expr::New { ty, args } => {
                let name = ty.name().cloned().unwrap_or_else(|| SmolStr::new("Object"));
                let mut record = Record::new(name);
                for (i, arg) in args.iter().enumerate() {
                    record = record.with(format!("Item{}", i + 1), self.eval(arg, env)?);
                }
                Ok(Value::record(record))
            }

            Expr::List { items, .. } => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, env))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::seq(values))
            }
        }
    }

    fn eval_member(
        &self,
        access: &Expr,
        target: Option<&Expr>,
        member: &Member,
        env: &Bindings,
    ) -> Result<Value> {
        if member.holds_expression() {
            return Err(untranslatable(access, "read of a stored expression"));
        }
        let Some(target) = target else {
            return Err(untranslatable(access, "static member read"));
        };
        let instance = self.eval(target, env)?;
        self.registry
            .read_instance(&instance, member)
            .ok_or_else(|| QueryError::Type {
                message: format!("{} has no member `{}`", instance.type_name(), member.name),
            })
    }

    fn eval_call(
        &self,
        call: &Expr,
        target: Option<&Expr>,
        method: &Method,
        args: &[Expr],
        env: &Bindings,
    ) -> Result<Value> {
        if KnownMethod::classify(method).is_some() {
            return Err(untranslatable(call, "unexpanded helper call"));
        }
        if let Some(op) = Operator::classify(method) {
            return self.eval_operator(op, args, env);
        }

        let unknown = || QueryError::UnknownMethod {
            owner: method.owner.clone(),
            name: method.name.clone(),
        };
        let target = target.ok_or_else(unknown)?;
        let builtin = builtins::lookup(&method.owner, &method.name).ok_or_else(unknown)?;

        let receiver = self.eval(target, env)?;
        let receiver = receiver.as_str().ok_or_else(|| QueryError::Type {
            message: format!("{} called on {}", method.name, receiver.type_name()),
        })?;
        if args.len() != builtin.arity {
            return Err(QueryError::Type {
                message: format!(
                    "{} takes {} argument(s) but {} were supplied",
                    builtin.name,
                    builtin.arity,
                    args.len()
                ),
            });
        }
        let args = args
            .iter()
            .map(|arg| self.eval(arg, env))
            .collect::<Result<Vec<_>>>()?;
        (builtin.func)(receiver, &args)
    }

    fn eval_operator(&self, op: Operator, args: &[Expr], env: &Bindings) -> Result<Value> {
        trace!(operator = op.name(), "evaluating query operator");
        match (op, args) {
            (Operator::Where, [source, predicate]) => {
                let predicate = operator_lambda(predicate)?;
                let mut kept = Vec::new();
                for item in self.eval_sequence(source, env)?.iter() {
                    if expect_bool(self.apply_in(predicate, vec![item.clone()], env)?)? {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::seq(kept))
            }
            (Operator::Select, [source, projection]) => {
                let projection = operator_lambda(projection)?;
                let projected = self
                    .eval_sequence(source, env)?
                    .iter()
                    .map(|item| self.apply_in(projection, vec![item.clone()], env))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::seq(projected))
            }
            (Operator::Count, [source]) => {
                Ok(Value::Int(self.eval_sequence(source, env)?.len() as i64))
            }
            (Operator::Any, [source]) => Ok(Value::Bool(!self.eval_sequence(source, env)?.is_empty())),
            (Operator::Any, [source, predicate]) => {
                let predicate = operator_lambda(predicate)?;
                for item in self.eval_sequence(source, env)?.iter() {
                    if expect_bool(self.apply_in(predicate, vec![item.clone()], env)?)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            (op, args) => Err(QueryError::Type {
                message: format!("{} does not take {} argument(s)", op.name(), args.len()),
            }),
        }
    }

    fn apply_in(&self, lambda: &Lambda, args: Vec<Value>, env: &Bindings) -> Result<Value> {
        if lambda.params.len() != args.len() {
            return Err(QueryError::Type {
                message: format!(
                    "lambda takes {} argument(s) but {} were supplied",
                    lambda.params.len(),
                    args.len()
                ),
            });
        }
        let mut scope = env.clone();
        for (param, arg) in lambda.params.iter().zip(args) {
            scope.insert(param.id, arg);
        }
        self.eval(&lambda.body, &scope)
    }

    fn eval_sequence(&self, expr: &Expr, env: &Bindings) -> Result<Arc<Vec<Value>>> {
        match self.eval(expr, env)? {
            Value::Seq(items) => Ok(items),
            other => Err(QueryError::Type {
                message: format!("expected a sequence, got {}", other.type_name()),
            }),
        }
    }

    fn eval_bool(&self, expr: &Expr, env: &Bindings) -> Result<bool> {
        expect_bool(self.eval(expr, env)?)
    }

    fn eval_unary(&self, op: UnOp, operand: &Expr, env: &Bindings) -> Result<Value> {
        match (op, self.eval(operand, env)?) {
            (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnOp::Neg, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| QueryError::Type {
                message: format!("integer overflow negating {}", n),
            }),
            (UnOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
            (op, value) => Err(QueryError::Type {
                message: format!("cannot apply {:?} to {}", op, value.type_name()),
            }),
        }
    }

    fn eval_binary(&self, op: BinOp, left: &Expr, right: &Expr, env: &Bindings) -> Result<Value> {
        // Short-circuit for logical operators
        match op {
            BinOp::And => {
                return Ok(Value::Bool(self.eval_bool(left, env)? && self.eval_bool(right, env)?));
            }
            BinOp::Or => {
                return Ok(Value::Bool(self.eval_bool(left, env)? || self.eval_bool(right, env)?));
            }
            _ => {}
        }

        let lhs = self.eval(left, env)?;
        let rhs = self.eval(right, env)?;

        match op {
            BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
            BinOp::Lt => compare(lhs, rhs, |o| o.is_lt()),
            BinOp::Le => compare(lhs, rhs, |o| o.is_le()),
            BinOp::Gt => compare(lhs, rhs, |o| o.is_gt()),
            BinOp::Ge => compare(lhs, rhs, |o| o.is_ge()),
            BinOp::Add => match (lhs, rhs) {
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{}{}", a, b))),
                (lhs, rhs) => arithmetic(lhs, rhs, "+", i64::checked_add, |a, b| a + b),
            },
            BinOp::Sub => arithmetic(lhs, rhs, "-", i64::checked_sub, |a, b| a - b),
            BinOp::Mul => arithmetic(lhs, rhs, "*", i64::checked_mul, |a, b| a * b),
            BinOp::Div => arithmetic(lhs, rhs, "/", i64::checked_div, |a, b| a / b),
            BinOp::Rem => arithmetic(lhs, rhs, "%", i64::checked_rem, |a, b| a % b),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }
}

/// Query operators take their lambdas as literal arguments.
fn operator_lambda(arg: &Expr) -> Result<&Lambda> {
    arg.as_lambda()
        .ok_or_else(|| untranslatable(arg, "operator argument is not a lambda literal"))
}

fn untranslatable(expr: &Expr, reason: &'static str) -> QueryError {
    QueryError::Untranslatable {
        node: expr.to_string(),
        reason,
    }
}

fn expect_bool(value: Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| QueryError::Type {
        message: format!("expected Bool, got {}", value.type_name()),
    })
}

fn compare(lhs: Value, rhs: Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value> {
    let ordering = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    ordering.map(|o| Value::Bool(test(o))).ok_or_else(|| QueryError::Type {
        message: format!("cannot compare {} and {}", lhs.type_name(), rhs.type_name()),
    })
}

fn arithmetic(
    lhs: Value,
    rhs: Value,
    symbol: &str,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).ok_or_else(|| QueryError::Type {
            message: format!("integer overflow or division by zero in {} {} {}", a, symbol, b),
        }),
        _ => match (lhs.as_float(), rhs.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
            _ => Err(QueryError::Type {
                message: format!(
                    "cannot apply {} to {} and {}",
                    symbol,
                    lhs.type_name(),
                    rhs.type_name()
                ),
            }),
        },
    }
}
