// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback traits driving region and ray queries.

use core::ops::ControlFlow;

use kurbo::Point;

use crate::node::ProxyId;

/// Receives proxies whose fat box overlaps a region query.
///
/// Implemented for any `FnMut(ProxyId) -> ControlFlow<()>`.
pub trait QueryCallback {
    /// Called once per overlapping proxy. Return [`ControlFlow::Break`] to end the query.
    fn query(&mut self, proxy: ProxyId) -> ControlFlow<()>;
}

impl<F: FnMut(ProxyId) -> ControlFlow<()>> QueryCallback for F {
    fn query(&mut self, proxy: ProxyId) -> ControlFlow<()> {
        self(proxy)
    }
}

/// A ray segment from `p1` towards `p2`.
///
/// The ray covers `p1 + t * (p2 - p1)` for `t` in `0..=max_fraction`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayCastInput {
    /// Start of the ray.
    pub p1: Point,
    /// Point reached at fraction `1.0`.
    pub p2: Point,
    /// Fraction of `p1 -> p2` that is searched.
    pub max_fraction: f64,
}

impl RayCastInput {
    /// A ray covering the whole segment `p1 -> p2`.
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }

    /// Limit the searched portion of the segment.
    #[must_use]
    pub const fn with_max_fraction(mut self, max_fraction: f64) -> Self {
        self.max_fraction = max_fraction;
        self
    }

    /// The point at `fraction` along `p1 -> p2`.
    pub fn point_at(&self, fraction: f64) -> Point {
        self.p1 + fraction * (self.p2 - self.p1)
    }
}

/// Receives proxies whose fat box may be hit by a ray.
///
/// The returned value steers the rest of the cast:
///
/// - `0.0` ends the cast immediately.
/// - A positive value becomes the new `max_fraction`; only nearer proxies are visited
///   afterwards. Return the exact hit fraction to find the closest hit.
/// - A negative value ignores this proxy and keeps the current segment.
///
/// Returning `input.max_fraction` keeps searching the full remaining segment.
///
/// Implemented for any `FnMut(&RayCastInput, ProxyId) -> f64`.
pub trait RayCastCallback {
    /// Called once per candidate proxy with the segment as currently clipped.
    fn ray_cast(&mut self, input: &RayCastInput, proxy: ProxyId) -> f64;
}

impl<F: FnMut(&RayCastInput, ProxyId) -> f64> RayCastCallback for F {
    fn ray_cast(&mut self, input: &RayCastInput, proxy: ProxyId) -> f64 {
        self(input, proxy)
    }
}
