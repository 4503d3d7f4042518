use crate::config::Tolerance;
use crate::error::TopologyError;
use crate::math::{Point3, RectAx};

use super::{ContInert, Contour};

/// A contour known to be closed, with its cached direction of travel.
#[derive(Debug, Clone)]
pub struct ContClsd {
    contour: Contour,
    ccw: bool,
}

impl ContClsd {
    /// Wraps `contour`, closing it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ContourNotClosed`] if the ends are further
    /// apart than `tol`, or [`TopologyError::NotContiguous`] if it is empty.
    pub fn new(mut contour: Contour, tol: f64) -> Result<Self, TopologyError> {
        if !contour.is_closed() {
            contour.close(tol)?;
        }
        let ccw = contour.signed_area() > 0.0;
        Ok(Self { contour, ccw })
    }

    #[must_use]
    pub fn contour(&self) -> &Contour {
        &self.contour
    }

    #[must_use]
    pub fn into_contour(self) -> Contour {
        self.contour
    }

    #[must_use]
    pub fn is_ccw(&self) -> bool {
        self.ccw
    }

    /// Reverses the contour unless it already runs counter-clockwise.
    pub fn make_ccw(&mut self) {
        self.set_ccw(true);
    }

    /// Reverses the contour unless it already runs clockwise.
    pub fn make_cw(&mut self) {
        self.set_ccw(false);
    }

    fn set_ccw(&mut self, ccw: bool) {
        if self.ccw != ccw {
            self.contour.reverse();
            self.ccw = ccw;
        }
    }

    /// Unsigned enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.contour.signed_area().abs()
    }

    #[must_use]
    pub fn inertia(&self) -> &ContInert {
        self.contour.inertia()
    }

    #[must_use]
    pub fn contains_point_xy(&self, p: &Point3) -> bool {
        self.contour.contains_point_xy(p)
    }

    #[must_use]
    pub fn rect(&self) -> RectAx {
        self.contour.rect()
    }

    /// `true` if `other` lies inside this contour, judged by a point on
    /// its first element.
    #[must_use]
    pub fn encloses(&self, other: &ContClsd) -> bool {
        let Some(sample) = other.sample_point() else {
            return false;
        };
        self.rect().point_inside_xy(&sample, 0.0) && self.contains_point_xy(&sample)
    }

    fn sample_point(&self) -> Option<Point3> {
        let elems = self.contour.elems();
        elems.first().and_then(|k| elems.get(k)).map(crate::geometry::Elem::mid_point)
    }
}

impl TryFrom<Contour> for ContClsd {
    type Error = TopologyError;

    fn try_from(contour: Contour) -> Result<Self, Self::Error> {
        Self::new(contour, Tolerance::default().ident_dist)
    }
}
