//! Expression-tree inlining for inlay.
//!
//! Client code composes queries out of reusable named fragments: static
//! fields and properties holding lambdas, locals captured by a closure,
//! and explicit `Invoke` applications. A translator downstream only
//! understands flat trees, so every such indirection has to be replaced
//! by the literal tree it denotes before the query leaves the program.
//!
//! # Architecture
//!
//! ```text
//! composed tree → [Rewriter::rewrite] → flat tree → backend
//!                      │
//!                      ├── Substitution   (parameter → argument, per inlining)
//!                      └── ClosureResolver (captured / stored member reads)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use inlay_rewrite::expand;
//! use inlay_tree::Registry;
//!
//! let flat = expand(&query, &Registry::empty())?;
//! ```

use inlay_tree::{Expr, Registry};
use smol_str::SmolStr;
use thiserror::Error;

mod config;
mod resolver;
mod rewriter;
mod substitution;

pub use config::RewriteConfig;
pub use resolver::ClosureResolver;
pub use rewriter::Rewriter;
pub use substitution::Substitution;

/// Errors that abort a rewrite. None of them are recoverable: the
/// composed query is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("invalid inlining: {0}")]
    InvalidInlining(#[from] InliningFault),

    #[error("invocation callee does not resolve to a lambda value: {callee}")]
    UnresolvableCallee { callee: String },
}

/// Why an inlining step was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InliningFault {
    #[error(
        "invoke cannot be applied recursively (parameter `{param}` is already bound); \
         introduce an intermediate named binding"
    )]
    Recursive { param: SmolStr },

    #[error("lambda takes {expected} argument(s) but {got} were supplied")]
    ArityMismatch { expected: usize, got: usize },

    #[error("nested inlining exceeded the configured depth of {limit}")]
    DepthExceeded { limit: usize },
}

/// Result type for rewrite operations.
pub type Result<T> = std::result::Result<T, RewriteError>;

/// Rewrite `expr` with the default configuration.
pub fn expand(expr: &Expr, registry: &Registry) -> Result<Expr> {
    Rewriter::new(registry).rewrite(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recursive_message_names_param() {
        let err = RewriteError::from(InliningFault::Recursive { param: "x".into() });
        let msg = err.to_string();
        assert!(msg.contains("recursively"));
        assert!(msg.contains("`x`"));
        assert!(msg.contains("intermediate named binding"));
    }

    #[test]
    fn test_arity_message() {
        let err = RewriteError::from(InliningFault::ArityMismatch { expected: 2, got: 1 });
        assert_eq!(
            err.to_string(),
            "invalid inlining: lambda takes 2 argument(s) but 1 were supplied"
        );
    }

    #[test]
    fn test_unresolvable_message() {
        let err = RewriteError::UnresolvableCallee {
            callee: "f".to_string(),
        };
        assert!(err.to_string().contains("does not resolve to a lambda"));
    }
}
