//! Query sources over inlay expression trees.
//!
//! A [`Queryable`] accumulates a tree of operator calls (`Where`, `Select`,
//! ...) and hands it to a [`Backend`] when enumerated. Backends translate
//! flat trees only; wrapping one in [`Expandable`] rewrites each tree with
//! `inlay_rewrite` first, so queries may freely reuse named fragments.
//!
//! ```text
//! Queryable ──tree──▶ Expandable ──rewrite──▶ flat tree ──▶ Backend
//! ```

pub mod backend;
mod builtins;
pub mod eval;
pub mod expandable;
pub mod operator;
pub mod predicate;
pub mod queryable;

pub use backend::{Backend, InMemoryBackend};
pub use eval::Evaluator;
pub use expandable::{expandable, expandable_with, Expandable};
pub use operator::Operator;
pub use predicate::PredicateBuilder;
pub use queryable::Queryable;

use inlay_rewrite::RewriteError;
use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while building or executing a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error("backend cannot translate `{node}`: {reason}")]
    Untranslatable { node: String, reason: &'static str },

    #[error("type error: {message}")]
    Type { message: String },

    #[error("unknown method `{owner}.{name}`")]
    UnknownMethod { owner: SmolStr, name: SmolStr },

    #[error("unbound parameter `{name}`")]
    UnboundParameter { name: SmolStr },
}

pub type Result<T> = std::result::Result<T, QueryError>;
