//! Rewrite Performance Benchmarks
//!
//! - Nested invocation chains (inlining depth)
//! - Wide trees of sibling invocations
//! - Stored-fragment resolution through the registry
//! - Query execution through the expanding backend

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use inlay_query::{Backend, InMemoryBackend, Queryable};
use inlay_rewrite::Rewriter;
use inlay_tree::{BinOp, Expr, Member, Param, Registry, Type, Value};

fn inc() -> Expr {
    let x = Param::new("x", Type::Int);
    Expr::lambda(
        vec![x.clone()],
        Expr::binary(BinOp::Add, x.to_expr(), Expr::int(1)),
    )
}

/// `inc(inc(...inc(0)))`, `depth` levels deep.
fn chain(depth: usize) -> Expr {
    let f = inc();
    (0..depth).fold(Expr::int(0), |acc, _| Expr::invoke(f.clone(), vec![acc]))
}

/// `inc(0) + inc(1) + ...`, `width` sibling invocations.
fn wide(width: usize) -> Expr {
    let f = inc();
    (0..width)
        .map(|i| Expr::invoke(f.clone(), vec![Expr::int(i as i64)]))
        .reduce(|acc, call| Expr::binary(BinOp::Add, acc, call))
        .unwrap_or_else(|| Expr::int(0))
}

fn static_inc() -> Expr {
    Expr::static_member(Member::field(
        Type::named("Math"),
        "Inc",
        Type::expression_of(vec![Type::Int], Type::Int),
    ))
}

// ============================================================================
// Rewriter Benchmarks
// ============================================================================

fn bench_nested_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_chain");
    let registry = Registry::empty();
    let rewriter = Rewriter::new(&registry);

    for depth in [8, 64, 200] {
        let tree = chain(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("rewrite", depth), &tree, |b, tree| {
            b.iter(|| black_box(rewriter.rewrite(black_box(tree))))
        });
    }

    group.finish();
}

fn bench_wide_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_tree");
    let registry = Registry::empty();
    let rewriter = Rewriter::new(&registry);

    for width in [16, 256, 1024] {
        let tree = wide(width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("rewrite", width), &tree, |b, tree| {
            b.iter(|| black_box(rewriter.rewrite(black_box(tree))))
        });
    }

    group.finish();
}

fn bench_static_fragments(c: &mut Criterion) {
    let registry = Registry::builder()
        .field("Math", "Inc", inc())
        .build();
    let rewriter = Rewriter::new(&registry);
    let n = Param::new("n", Type::Int);
    let tree = Expr::lambda(
        vec![n.clone()],
        Expr::invoke_helper(static_inc(), vec![n.to_expr()]),
    );

    c.bench_function("static_field_fragment", |b| {
        b.iter(|| black_box(rewriter.rewrite(black_box(&tree))))
    });
}

// ============================================================================
// Query Benchmarks
// ============================================================================

fn bench_expanding_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("expanding_query");
    let registry = Arc::new(Registry::builder().field("Math", "Inc", inc()).build());

    for size in [100, 10_000] {
        let items: Vec<Value> = (0..size).map(Value::Int).collect();
        let backend: Arc<dyn Backend> = Arc::new(InMemoryBackend::new());
        let n = Param::new("n", Type::Int);
        let pred = Expr::lambda(
            vec![n.clone()],
            Expr::binary(
                BinOp::Gt,
                Expr::invoke_helper(static_inc(), vec![n.to_expr()]),
                Expr::int(size / 2),
            ),
        );
        let query = Queryable::new(items, Type::Int, backend)
            .as_expandable_with(Arc::clone(&registry))
            .filter(pred);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("count", size), &query, |b, query| {
            b.iter(|| black_box(query.count()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_nested_chain,
    bench_wide_tree,
    bench_static_fragments,
    bench_expanding_query
);
criterion_main!(benches);
