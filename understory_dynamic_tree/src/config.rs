// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tuning knobs for [`DynamicTree`](crate::DynamicTree).

/// Tuning parameters for a [`DynamicTree`](crate::DynamicTree).
///
/// None of these affect correctness; they trade tree churn against query tightness.
///
/// ```rust
/// use understory_dynamic_tree::{DynamicTree, TreeConfig};
///
/// let config = TreeConfig::default()
///     .with_aabb_extension(2.0)
///     .with_initial_capacity(256);
/// let tree: DynamicTree<u32> = DynamicTree::with_config(config);
/// assert_eq!(tree.capacity(), 256);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// Margin added on every side of a proxy's tight box to form its fat box.
    pub aabb_extension: f64,
    /// Scale applied to a move's displacement hint before stretching the fat box along it.
    pub aabb_multiplier: f64,
    /// Multiple of `aabb_extension` used to grow the new fat box when deciding whether the
    /// stored box has become too large. A stored box that still contains the object but is
    /// not contained by this grown box gets shrunk through a reinsert.
    pub huge_aabb_factor: f64,
    /// Number of node slots allocated up front. Clamped to at least one.
    pub initial_capacity: usize,
}

impl TreeConfig {
    /// Default fattening margin.
    pub const DEFAULT_AABB_EXTENSION: f64 = 0.1;
    /// Default displacement prediction multiplier.
    pub const DEFAULT_AABB_MULTIPLIER: f64 = 4.0;
    /// Default shrink-avoidance factor.
    pub const DEFAULT_HUGE_AABB_FACTOR: f64 = 4.0;
    /// Default number of preallocated node slots.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

    /// Set the fattening margin.
    #[must_use]
    pub const fn with_aabb_extension(mut self, extension: f64) -> Self {
        self.aabb_extension = extension;
        self
    }

    /// Set the displacement prediction multiplier.
    #[must_use]
    pub const fn with_aabb_multiplier(mut self, multiplier: f64) -> Self {
        self.aabb_multiplier = multiplier;
        self
    }

    /// Set the shrink-avoidance factor.
    #[must_use]
    pub const fn with_huge_aabb_factor(mut self, factor: f64) -> Self {
        self.huge_aabb_factor = factor;
        self
    }

    /// Set the number of preallocated node slots.
    #[must_use]
    pub const fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            aabb_extension: Self::DEFAULT_AABB_EXTENSION,
            aabb_multiplier: Self::DEFAULT_AABB_MULTIPLIER,
            huge_aabb_factor: Self::DEFAULT_HUGE_AABB_FACTOR,
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
        }
    }
}
