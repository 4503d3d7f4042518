pub mod arc_2d;
pub mod distance_2d;
pub mod intersect_2d;
pub mod rect;

pub use rect::RectAx;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which two points are the same point for chaining and closure.
pub const IDENT_DIST: f64 = 1e-6;

/// Relative floor below which lengths and ratios are numerically degenerate.
pub const ACCURACY: f64 = 1e-12;

/// Squared distance between two points, ignoring Z.
#[must_use]
pub fn dist_sq_xy(a: &Point3, b: &Point3) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

/// Distance between two points, ignoring Z.
#[must_use]
pub fn dist_xy(a: &Point3, b: &Point3) -> f64 {
    dist_sq_xy(a, b).sqrt()
}

/// Z component of the cross product of two XY vectors.
#[must_use]
pub fn cross_xy(a: &Vector3, b: &Vector3) -> f64 {
    a.x * b.y - a.y * b.x
}
