//! Built-in demonstration queries.
//!
//! Each scenario composes a tree the way client code would and prints it
//! before and after rewriting. The last one runs a filter over in-memory
//! customers through an expanding backend.

use std::sync::Arc;

use anyhow::Context;
use inlay_query::{Backend, InMemoryBackend, PredicateBuilder, Queryable};
use inlay_rewrite::Rewriter;
use inlay_tree::{Carrier, Expr, Member, Method, Param, Record, Registry, Type, Value};
use tracing::{info, warn};

struct Scenario {
    title: &'static str,
    tree: Expr,
}

fn customer() -> Type {
    Type::named("Customer")
}

fn string_pred() -> Type {
    Type::expression_of(vec![Type::String], Type::Bool)
}

fn name_of(target: Expr) -> Expr {
    Expr::member(target, Member::property(customer(), "Name", Type::String))
}

fn to_lower(target: Expr) -> Expr {
    Expr::method(target, Method::new("String", "ToLower", Type::String), vec![])
}

/// `s => s.ToLower() == "abc"`
fn is_abc() -> Expr {
    let s = Param::new("s", Type::String);
    Expr::lambda(
        vec![s.clone()],
        Expr::equals(to_lower(s.to_expr()), Expr::string("abc")),
    )
}

/// A local captured by a closure: a field read off a carrier instance.
fn captured(field: &str, value: Expr) -> Expr {
    let ty = Type::Expression(Box::new(value.ty()));
    let carrier = Carrier::new("DemoScope").with(field, Value::expr(value));
    let carrier_ty = carrier.ty();
    Expr::member(
        Expr::constant(Value::carrier(carrier), carrier_ty.clone()),
        Member::field(carrier_ty, field, ty),
    )
}

fn static_field(name: &str) -> Expr {
    Expr::static_member(Member::field(Type::named("Filters"), name, string_pred()))
}

fn static_property(name: &str) -> Expr {
    Expr::static_member(Member::property(Type::named("Filters"), name, string_pred()))
}

fn demo_registry() -> Registry {
    Registry::builder()
        .field("Filters", "IsAbc", is_abc())
        .property("Filters", "IsAbcProperty", is_abc)
        .build()
}

fn scenarios() -> Vec<Scenario> {
    let t = Param::new("t", Type::String);
    let c = Param::new("c", customer());
    let s = Param::new("s", Type::String);
    let u = Param::new("u", Type::String);
    let lower = Expr::lambda(vec![u.clone()], to_lower(u.to_expr()));

    vec![
        Scenario {
            title: "captured fragment via Invoke helper",
            tree: Expr::lambda(
                vec![t.clone()],
                Expr::invoke_helper(captured("isAbc", is_abc()), vec![t.to_expr()]),
            ),
        },
        Scenario {
            title: "compile-and-call of a captured fragment",
            tree: Expr::lambda(
                vec![t.clone()],
                Expr::invoke(Expr::compile(captured("isAbc", is_abc())), vec![t.to_expr()]),
            ),
        },
        Scenario {
            title: "static field fragment",
            tree: Expr::lambda(
                vec![c.clone()],
                Expr::invoke_helper(static_field("IsAbc"), vec![name_of(c.to_expr())]),
            ),
        },
        Scenario {
            title: "static property fragment",
            tree: Expr::lambda(
                vec![c.clone()],
                Expr::invoke_helper(
                    static_property("IsAbcProperty"),
                    vec![name_of(c.to_expr())],
                ),
            ),
        },
        Scenario {
            title: "parameter used directly and through a fragment",
            tree: Expr::lambda(
                vec![s.clone()],
                Expr::new_object(
                    Type::named("Pair"),
                    vec![
                        s.to_expr(),
                        Expr::invoke_helper(captured("lower", lower), vec![s.to_expr()]),
                    ],
                ),
            ),
        },
        Scenario {
            title: "nested expand markers",
            tree: Expr::expand_marker(Expr::expand_marker(Expr::lambda(
                vec![t.clone()],
                Expr::invoke_helper(captured("isAbc", is_abc()), vec![t.to_expr()]),
            ))),
        },
    ]
}

pub fn run() -> anyhow::Result<()> {
    if Registry::install_global(demo_registry()).is_err() {
        warn!("global registry already installed; using it as is");
    }
    let registry = Registry::global();
    let rewriter = Rewriter::new(registry);

    for scenario in scenarios() {
        let flat = rewriter
            .rewrite(&scenario.tree)
            .with_context(|| format!("scenario `{}` failed", scenario.title))?;
        println!("# {}", scenario.title);
        println!("  before: {}", scenario.tree);
        println!("  after:  {}", flat);
    }

    run_query()
}

fn run_query() -> anyhow::Result<()> {
    let customers: Vec<Value> = ["abc", "XYZ123", "ABC"]
        .iter()
        .map(|n| Value::record(Record::new("Customer").with("Name", Value::string(*n))))
        .collect();

    let c = Param::new("c", customer());
    let matches_abc = Expr::lambda(
        vec![c.clone()],
        Expr::invoke_helper(static_field("IsAbc"), vec![name_of(c.to_expr())]),
    );
    let not_abc = PredicateBuilder::not(matches_abc.clone())?;

    let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
    let query = Queryable::new(customers, customer(), backend).as_expandable();

    let hits = query.clone().filter(matches_abc).to_vec()?;
    let misses = query.filter(not_abc).count()?;
    info!(hits = hits.len(), misses, "demo query finished");

    println!("# query over customers");
    for hit in &hits {
        let name = hit.field("Name").map(ToString::to_string).unwrap_or_default();
        println!("  match: {}", name);
    }
    println!("  non-matching: {}", misses);
    Ok(())
}
