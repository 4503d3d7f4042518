use std::f64::consts::TAU;

use crate::math::arc_2d::CircularArc;
use crate::math::{dist_sq_xy, Point2, Point3, RectAx, Vector3, ACCURACY, IDENT_DIST};

/// Largest relative radius change a checked endpoint stretch may cause.
const MAX_STRETCH_RADIUS_CHANGE: f64 = 0.01;

/// A circular arc parallel to the XY plane, optionally helical in Z.
///
/// Endpoints are stored exactly alongside the center/angle form so that
/// chaining compares the points the caller supplied. Z varies linearly
/// from `p1.z` to `p2.z` along the sweep. A full turn (`|a2 - a1| = 2π`)
/// is a circle.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcSeg {
    p1: Point3,
    p2: Point3,
    center: Point2,
    radius: f64,
    a1: f64,
    a2: f64,
    ccw: bool,
}

impl ArcSeg {
    /// Creates an arc from center, radius, start angle and signed sweep.
    ///
    /// The arc starts at `center.z` and ends at `z_end`.
    #[must_use]
    pub fn from_angles(center: Point3, radius: f64, start_angle: f64, sweep: f64, z_end: f64) -> Self {
        let a2 = start_angle + sweep;
        let p1 = Point3::new(
            center.x + radius * start_angle.cos(),
            center.y + radius * start_angle.sin(),
            center.z,
        );
        let p2 = if sweep.abs() >= TAU - ACCURACY {
            Point3::new(p1.x, p1.y, z_end)
        } else {
            Point3::new(center.x + radius * a2.cos(), center.y + radius * a2.sin(), z_end)
        };
        Self {
            p1,
            p2,
            center: Point2::new(center.x, center.y),
            radius,
            a1: start_angle,
            a2,
            ccw: sweep > 0.0,
        }
    }

    /// Creates an arc through two endpoints around `center` in the given direction.
    ///
    /// Coincident endpoints give a full circle.
    #[must_use]
    pub fn from_points(p1: Point3, p2: Point3, center: &Point3, ccw: bool) -> Self {
        let circ = CircularArc::from_center(&p1, &p2, center, ccw);
        Self::from_circular(p1, p2, &circ)
    }

    /// Creates an arc from two endpoints and a bulge (`tan(sweep / 4)`).
    ///
    /// Returns `None` for a zero bulge or coincident endpoints.
    #[must_use]
    pub fn from_bulge(p1: Point3, p2: Point3, bulge: f64) -> Option<Self> {
        let circ = CircularArc::from_bulge(&p1, &p2, bulge)?;
        Some(Self::from_circular(p1, p2, &circ))
    }

    /// Creates a full CCW circle starting and ending at angle zero.
    #[must_use]
    pub fn circle(center: Point3, radius: f64) -> Self {
        Self::from_angles(center, radius, 0.0, TAU, center.z)
    }

    fn from_circular(p1: Point3, p2: Point3, circ: &CircularArc) -> Self {
        Self {
            p1,
            p2,
            center: Point2::new(circ.cx, circ.cy),
            radius: circ.radius,
            a1: circ.start_angle,
            a2: circ.start_angle + circ.sweep,
            ccw: circ.sweep > 0.0,
        }
    }

    #[must_use]
    pub fn p1(&self) -> &Point3 {
        &self.p1
    }

    #[must_use]
    pub fn p2(&self) -> &Point3 {
        &self.p2
    }

    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn start_angle(&self) -> f64 {
        self.a1
    }

    #[must_use]
    pub fn end_angle(&self) -> f64 {
        self.a2
    }

    #[must_use]
    pub fn is_ccw(&self) -> bool {
        self.ccw
    }

    /// Signed sweep, positive for counter-clockwise.
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.a2 - self.a1
    }

    #[must_use]
    pub fn is_full_circle(&self) -> bool {
        self.sweep().abs() >= TAU - ACCURACY
    }

    /// Center/angle form of the XY projection.
    #[must_use]
    pub fn circular(&self) -> CircularArc {
        CircularArc {
            cx: self.center.x,
            cy: self.center.y,
            radius: self.radius,
            start_angle: self.a1,
            sweep: self.sweep(),
        }
    }

    fn center3(&self) -> Point3 {
        Point3::new(self.center.x, self.center.y, self.p1.z)
    }

    pub(super) fn len_xy(&self) -> f64 {
        self.radius * self.sweep().abs()
    }

    pub(super) fn len(&self) -> f64 {
        self.len_xy().hypot(self.p2.z - self.p1.z)
    }

    pub(super) fn rect(&self) -> RectAx {
        RectAx::around_arc(&self.p1, &self.p2, &self.center3(), self.ccw)
    }

    /// Point at fraction `t` of the sweep; exact endpoints at 0 and 1.
    pub(super) fn point_at(&self, t: f64) -> Point3 {
        if t == 0.0 {
            return self.p1;
        }
        if t == 1.0 {
            return self.p2;
        }
        let (x, y) = self.circular().point_at(t);
        Point3::new(x, y, self.p1.z + (self.p2.z - self.p1.z) * t)
    }

    pub(super) fn tangent_at(&self, t: f64) -> Vector3 {
        self.circular().tangent_at(t)
    }

    pub(super) fn reverse(&mut self) {
        std::mem::swap(&mut self.p1, &mut self.p2);
        std::mem::swap(&mut self.a1, &mut self.a2);
        self.ccw = !self.ccw;
    }

    /// Fraction of the sweep at the XY projection of `p`.
    ///
    /// Outside the angular range the nearer endpoint is taken, unless
    /// `strict` rejects points more than `tol` beyond an end.
    pub(super) fn project_param_xy(&self, p: &Point3, tol: f64, strict: bool) -> Option<f64> {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        if dx.hypot(dy) < ACCURACY {
            return Some(0.0);
        }
        let circ = self.circular();
        let eps = if strict { tol / self.radius.max(ACCURACY) } else { 0.0 };
        if let Some(t) = circ.param_of_angle(dy.atan2(dx), eps) {
            return Some(t);
        }
        if strict {
            return None;
        }
        if dist_sq_xy(p, &self.p1) <= dist_sq_xy(p, &self.p2) {
            Some(0.0)
        } else {
            Some(1.0)
        }
    }

    pub(super) fn carrier_dist_xy(&self, p: &Point3) -> f64 {
        ((p.x - self.center.x).hypot(p.y - self.center.y) - self.radius).abs()
    }

    /// Moves one end to `(x, y)` keeping its Z and the arc's sweep.
    ///
    /// The center and radius follow from the new chord. With `check`, refuses
    /// chords below `IDENT_DIST` and radius changes beyond one percent. A full
    /// circle cannot be stretched at one end.
    pub(super) fn stretched(&self, at_start: bool, x: f64, y: f64, check: bool) -> Option<Self> {
        let (mut p1, mut p2) = (self.p1, self.p2);
        let end = if at_start { &mut p1 } else { &mut p2 };
        end.x = x;
        end.y = y;

        if self.is_full_circle() {
            let unchanged = dist_sq_xy(&p1, &self.p1) + dist_sq_xy(&p2, &self.p2)
                <= IDENT_DIST * IDENT_DIST;
            return unchanged.then(|| self.clone());
        }

        let circ = CircularArc::from_bulge(&p1, &p2, self.circular().bulge())?;
        if check {
            let chord_sq = dist_sq_xy(&p1, &p2);
            let change = (circ.radius - self.radius).abs() / self.radius.max(ACCURACY);
            if chord_sq < IDENT_DIST * IDENT_DIST || change > MAX_STRETCH_RADIUS_CHANGE {
                return None;
            }
        }
        Some(Self::from_circular(p1, p2, &circ))
    }

    /// Reassembles an arc from stored fields; the direction follows the sweep sign.
    pub(crate) fn from_parts(p1: Point3, p2: Point3, center: Point2, radius: f64, a1: f64, a2: f64) -> Self {
        Self {
            p1,
            p2,
            center,
            radius,
            a1,
            a2,
            ccw: a2 > a1,
        }
    }
}
