//! Rewrite configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::Rewriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Maximum number of nested inlinings (invocation expansions plus
    /// stored-member resolutions) along one path of the tree.
    pub max_inline_depth: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: 256,
        }
    }
}

impl RewriteConfig {
    pub fn with_max_inline_depth(mut self, limit: usize) -> Self {
        self.max_inline_depth = limit;
        self
    }
}
