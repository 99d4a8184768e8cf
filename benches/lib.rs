//! Inlay Benchmarks
//!
//! Rewrite and query-execution benchmarks.
//! Run with: cargo bench -p inlay-benchmarks

// This file exists only to satisfy Cargo's requirement for a lib target.
// The benchmarks live in benches/rewrite_benchmarks.rs.
