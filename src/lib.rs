//! Contour geometry engine: line/arc elements, chaining of unordered
//! fragments, range-partitioned spatial queries, closed contours, nesting
//! and inertial properties.

pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod persist;
pub mod topology;

pub use error::{GeocontError, Result};
