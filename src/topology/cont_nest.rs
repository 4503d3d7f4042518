use crate::error::TopologyError;
use crate::math::{Point3, RectAx};

use super::ContClsd;

/// One outer boundary with the holes cut out of it.
///
/// The outer boundary runs counter-clockwise and every hole clockwise, so
/// the region is always on the left of the direction of travel.
#[derive(Debug, Clone)]
pub struct ContNest {
    outer: ContClsd,
    holes: Vec<ContClsd>,
}

impl ContNest {
    #[must_use]
    pub fn new(mut outer: ContClsd) -> Self {
        outer.make_ccw();
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Adds a hole, reoriented clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidNesting`] if `hole` is not inside the
    /// outer boundary.
    pub fn add_hole(&mut self, mut hole: ContClsd) -> Result<(), TopologyError> {
        if !self.outer.encloses(&hole) {
            return Err(TopologyError::InvalidNesting("hole lies outside its outer boundary".into()));
        }
        hole.make_cw();
        self.holes.push(hole);
        Ok(())
    }

    #[must_use]
    pub fn outer(&self) -> &ContClsd {
        &self.outer
    }

    #[must_use]
    pub fn holes(&self) -> &[ContClsd] {
        &self.holes
    }

    /// Outer boundary first, then the holes.
    pub fn contours(&self) -> impl Iterator<Item = &ContClsd> + '_ {
        std::iter::once(&self.outer).chain(&self.holes)
    }

    /// Area of the outer boundary less its holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(ContClsd::area).sum::<f64>()
    }

    #[must_use]
    pub fn contains_point_xy(&self, p: &Point3) -> bool {
        self.outer.contains_point_xy(p) && !self.holes.iter().any(|h| h.contains_point_xy(p))
    }

    #[must_use]
    pub fn rect(&self) -> RectAx {
        self.outer.rect()
    }
}
