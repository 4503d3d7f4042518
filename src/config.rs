//! Tolerances and construction defaults threaded through elements and
//! contours.

use crate::geometry::elem::{Color, LineStyle};
use crate::math::IDENT_DIST;

/// Tolerance configuration for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Points closer than this are the same point.
    pub ident_dist: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            ident_dist: IDENT_DIST,
        }
    }
}

impl Tolerance {
    /// Returns `true` if the XY distance between `a` and `b` is within `ident_dist`.
    #[must_use]
    pub fn same_point_xy(&self, a: &crate::math::Point3, b: &crate::math::Point3) -> bool {
        crate::math::dist_sq_xy(a, b) <= self.ident_dist * self.ident_dist
    }
}

/// Attribute defaults applied to every element a contour creates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElemDefaults {
    pub color: Color,
    pub line_style: LineStyle,
}

/// Budgets for the per-range partition of a contour's spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectListParams {
    /// Maximum number of elements per range (at least 1).
    pub max_elems: usize,
    /// Maximum XY area of a range's aggregate rectangle.
    pub max_area: f64,
}

impl Default for RectListParams {
    fn default() -> Self {
        Self {
            max_elems: 16,
            max_area: f64::INFINITY,
        }
    }
}
