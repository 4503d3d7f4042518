//! Chain elements: lines and arcs carrying a running parameter offset.
//!
//! An [`Elem`] is addressed by the chain parameter: `bpar` is where the
//! element starts within its chain and `plen` (equal to the 3D length) is
//! how much parameter it covers.

mod arc;
mod info;
mod line;

pub use arc::ArcSeg;
pub use info::ElemInfo;
pub use line::{LineSeg, LineStyle};

use crate::config::ElemDefaults;
use crate::math::arc_2d::subdivision_count;
use crate::math::distance_2d::{arc_subtended_angle, subtended_angle};
use crate::math::intersect_2d::{arc_arc, segment_arc, segment_segment, Hit};
use crate::math::{cross_xy, dist_sq_xy, dist_xy, Point3, RectAx, Vector3, ACCURACY, IDENT_DIST};

/// Packed RGB display colour, passthrough only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Self = Self(0x00FF_FFFF);
    pub const BLACK: Self = Self(0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Identifiers and flags consumed by downstream machining code.
///
/// The geometry code never interprets these; they are copied, cloned and
/// persisted unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElemTags {
    pub el_id: i32,
    pub cnt_id: i32,
    pub p_cnt_id: i32,
    pub cam_inf: i32,
    pub color: Color,
    pub ins_arc: bool,
}

/// Concrete curve of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemGeom {
    Line(LineSeg),
    Arc(ArcSeg),
}

impl ElemGeom {
    fn p1(&self) -> &Point3 {
        match self {
            Self::Line(l) => l.p1(),
            Self::Arc(a) => a.p1(),
        }
    }

    fn p2(&self) -> &Point3 {
        match self {
            Self::Line(l) => l.p2(),
            Self::Arc(a) => a.p2(),
        }
    }

    fn point_at(&self, t: f64) -> Point3 {
        match self {
            Self::Line(l) => l.point_at(t),
            Self::Arc(a) => a.point_at(t),
        }
    }

    fn dir_at(&self, t: f64) -> Option<Vector3> {
        match self {
            Self::Line(l) => l.dir_xy(),
            Self::Arc(a) => (a.radius() >= ACCURACY).then(|| a.tangent_at(t)),
        }
    }

    fn stretched(&self, at_start: bool, x: f64, y: f64, check: bool) -> Option<Self> {
        match self {
            Self::Line(l) => l.stretched(at_start, x, y, check).map(Self::Line),
            Self::Arc(a) => a.stretched(at_start, x, y, check).map(Self::Arc),
        }
    }
}

/// Result of projecting a point onto an element or chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElemProjection {
    /// Nearest point on the curve.
    pub point: Point3,
    /// Chain parameter of `point`.
    pub par: f64,
    /// XY distance to `point`, positive when the query lies left of the
    /// direction of travel.
    pub dist: f64,
}

/// An XY crossing between two elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElemHit {
    /// Crossing point, with the Z of the first element.
    pub point: Point3,
    /// Chain parameter on the first element.
    pub par_a: f64,
    /// Chain parameter on the second element.
    pub par_b: f64,
}

/// A line or arc with cached lengths and bounding box.
#[derive(Debug, Clone)]
pub struct Elem {
    geom: ElemGeom,
    bpar: f64,
    len: f64,
    len_xy: f64,
    rect: RectAx,
    tags: ElemTags,
    info: Option<ElemInfo>,
}

impl Elem {
    /// Wraps a curve with default tags and `bpar = 0`.
    #[must_use]
    pub fn new(geom: ElemGeom) -> Self {
        let mut elem = Self {
            geom,
            bpar: 0.0,
            len: 0.0,
            len_xy: 0.0,
            rect: RectAx::empty(),
            tags: ElemTags::default(),
            info: None,
        };
        elem.update();
        elem
    }

    #[must_use]
    pub fn line(p1: Point3, p2: Point3) -> Self {
        Self::new(ElemGeom::Line(LineSeg::new(p1, p2)))
    }

    #[must_use]
    pub fn arc(arc: ArcSeg) -> Self {
        Self::new(ElemGeom::Arc(arc))
    }

    /// Arc from center, radius, start angle and signed sweep, rising to `z_end`.
    #[must_use]
    pub fn arc_from_angles(center: Point3, radius: f64, start_angle: f64, sweep: f64, z_end: f64) -> Self {
        Self::arc(ArcSeg::from_angles(center, radius, start_angle, sweep, z_end))
    }

    /// Arc from endpoints, center and direction.
    #[must_use]
    pub fn arc_from_points(p1: Point3, p2: Point3, center: &Point3, ccw: bool) -> Self {
        Self::arc(ArcSeg::from_points(p1, p2, center, ccw))
    }

    /// Polyline vertex pair with bulge; a zero bulge gives a line.
    #[must_use]
    pub fn from_bulge(p1: Point3, p2: Point3, bulge: f64) -> Self {
        match ArcSeg::from_bulge(p1, p2, bulge) {
            Some(arc) => Self::arc(arc),
            None => Self::line(p1, p2),
        }
    }

    #[must_use]
    pub fn circle(center: Point3, radius: f64) -> Self {
        Self::arc(ArcSeg::circle(center, radius))
    }

    /// Applies colour and, for lines, line style.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &ElemDefaults) -> Self {
        self.tags.color = defaults.color;
        if let ElemGeom::Line(l) = &mut self.geom {
            l.set_style(defaults.line_style);
        }
        self
    }

    /// Copies the element; `keep_info = false` leaves the copy without payload.
    #[must_use]
    pub fn clone_elem(&self, keep_info: bool) -> Self {
        Self {
            geom: self.geom.clone(),
            bpar: self.bpar,
            len: self.len,
            len_xy: self.len_xy,
            rect: self.rect,
            tags: self.tags,
            info: if keep_info { self.info.clone() } else { None },
        }
    }

    fn update(&mut self) {
        let (len, len_xy, rect) = match &self.geom {
            ElemGeom::Line(l) => (l.len(), l.len_xy(), l.rect()),
            ElemGeom::Arc(a) => (a.len(), a.len_xy(), a.rect()),
        };
        self.len = len;
        self.len_xy = len_xy;
        self.rect = rect;
    }

    #[must_use]
    pub fn geom(&self) -> &ElemGeom {
        &self.geom
    }

    /// Replaces the curve and recomputes the cached lengths and box.
    pub fn set_geom(&mut self, geom: ElemGeom) {
        self.geom = geom;
        self.update();
    }

    #[must_use]
    pub fn as_line(&self) -> Option<&LineSeg> {
        match &self.geom {
            ElemGeom::Line(l) => Some(l),
            ElemGeom::Arc(_) => None,
        }
    }

    #[must_use]
    pub fn as_arc(&self) -> Option<&ArcSeg> {
        match &self.geom {
            ElemGeom::Arc(a) => Some(a),
            ElemGeom::Line(_) => None,
        }
    }

    #[must_use]
    pub fn is_full_circle(&self) -> bool {
        self.as_arc().is_some_and(ArcSeg::is_full_circle)
    }

    /// `true` when the element starts and ends at the same XY point.
    #[must_use]
    pub fn is_closed_xy(&self) -> bool {
        self.is_full_circle() || dist_sq_xy(self.p1(), self.p2()) <= IDENT_DIST * IDENT_DIST
    }

    #[must_use]
    pub fn p1(&self) -> &Point3 {
        self.geom.p1()
    }

    #[must_use]
    pub fn p2(&self) -> &Point3 {
        self.geom.p2()
    }

    /// 3D length.
    #[must_use]
    pub fn len(&self) -> f64 {
        self.len
    }

    /// Length of the XY projection.
    #[must_use]
    pub fn len_xy(&self) -> f64 {
        self.len_xy
    }

    /// Parameter span covered by this element.
    #[must_use]
    pub fn plen(&self) -> f64 {
        self.len
    }

    #[must_use]
    pub fn bpar(&self) -> f64 {
        self.bpar
    }

    pub fn set_bpar(&mut self, bpar: f64) {
        self.bpar = bpar;
    }

    #[must_use]
    pub fn begin_par(&self) -> f64 {
        self.bpar
    }

    #[must_use]
    pub fn end_par(&self) -> f64 {
        self.bpar + self.plen()
    }

    #[must_use]
    pub fn rect(&self) -> &RectAx {
        &self.rect
    }

    #[must_use]
    pub fn tags(&self) -> &ElemTags {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut ElemTags {
        &mut self.tags
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.tags.color
    }

    #[must_use]
    pub fn info(&self) -> Option<&ElemInfo> {
        self.info.as_ref()
    }

    pub fn info_mut(&mut self) -> Option<&mut ElemInfo> {
        self.info.as_mut()
    }

    /// Attaches a payload, dropping any previous one.
    pub fn set_info(&mut self, info: Option<ElemInfo>) {
        self.info = info;
    }

    pub fn take_info(&mut self) -> Option<ElemInfo> {
        self.info.take()
    }

    fn local_t(&self, par: f64) -> f64 {
        let plen = self.plen();
        if plen < ACCURACY {
            0.0
        } else {
            (par - self.bpar) / plen
        }
    }

    /// Point at chain parameter `par`.
    #[must_use]
    pub fn at_par(&self, par: f64) -> Point3 {
        self.geom.point_at(self.local_t(par))
    }

    /// `true` if `par` falls on this element, within `IDENT_DIST` of either end.
    #[must_use]
    pub fn par_valid(&self, par: f64) -> bool {
        let local = par - self.bpar;
        local >= -IDENT_DIST && local <= self.plen() + IDENT_DIST
    }

    #[must_use]
    pub fn mid_par(&self) -> f64 {
        self.bpar + self.plen() * 0.5
    }

    fn xy_ratio_ok(&self) -> bool {
        self.len_xy >= ACCURACY && self.len_xy >= ACCURACY * self.len
    }

    /// Chain parameter reached after travelling `xy_dist` in XY from the start.
    ///
    /// `None` when the XY projection is degenerate (e.g. a vertical line).
    #[must_use]
    pub fn par_from_xy(&self, xy_dist: f64) -> Option<f64> {
        self.xy_ratio_ok()
            .then(|| self.bpar + xy_dist * self.plen() / self.len_xy)
    }

    /// XY distance from the start to chain parameter `par`.
    #[must_use]
    pub fn xy_from_par(&self, par: f64) -> Option<f64> {
        self.xy_ratio_ok()
            .then(|| (par - self.bpar) * self.len_xy / self.plen())
    }

    /// Chain parameter of the XY midpoint.
    #[must_use]
    pub fn mid_par_xy(&self) -> Option<f64> {
        self.par_from_xy(self.len_xy * 0.5)
    }

    #[must_use]
    pub fn mid_point(&self) -> Point3 {
        self.geom.point_at(0.5)
    }

    /// Unit XY direction of travel at the start.
    #[must_use]
    pub fn start_dir_xy(&self) -> Option<Vector3> {
        self.geom.dir_at(0.0)
    }

    /// Unit XY direction of travel at the end.
    #[must_use]
    pub fn end_dir_xy(&self) -> Option<Vector3> {
        self.geom.dir_at(1.0)
    }

    /// Nearest point on the element to `p` in XY.
    ///
    /// The non-strict form clamps to the nearer end. The strict form returns
    /// `None` when the foot falls more than `tol` beyond either end.
    #[must_use]
    pub fn project_pnt_xy(&self, p: &Point3, tol: f64, strict: bool) -> Option<ElemProjection> {
        let t = match &self.geom {
            ElemGeom::Line(l) => l.project_param_xy(p, tol, strict)?,
            ElemGeom::Arc(a) => a.project_param_xy(p, tol, strict)?,
        };
        let point = self.geom.point_at(t);
        let mut dist = dist_xy(p, &point);
        if let Some(dir) = self.geom.dir_at(t) {
            let side = cross_xy(&dir, &Vector3::new(p.x - point.x, p.y - point.y, 0.0));
            if side < 0.0 {
                dist = -dist;
            }
        }
        Some(ElemProjection {
            point,
            par: self.bpar + t * self.plen(),
            dist,
        })
    }

    /// Unsigned XY distance from `p` to the infinite carrier (line or full circle).
    #[must_use]
    pub fn dist_to_carrier_xy(&self, p: &Point3) -> f64 {
        match &self.geom {
            ElemGeom::Line(l) => l.carrier_dist_xy(p),
            ElemGeom::Arc(a) => a.carrier_dist_xy(p),
        }
    }

    /// Signed angle this element subtends at `p`; sums to `2π · winding` over a loop.
    #[must_use]
    pub fn winding_angle_xy(&self, p: &Point3) -> f64 {
        match &self.geom {
            ElemGeom::Line(l) => subtended_angle(p, l.p1(), l.p2()),
            ElemGeom::Arc(a) => arc_subtended_angle(p, a.p1(), a.p2(), &a.circular()),
        }
    }

    /// Vertices approximating the element within chord error `tol`, both ends included.
    #[must_use]
    pub fn to_points(&self, tol: f64) -> Vec<Point3> {
        match &self.geom {
            ElemGeom::Line(l) => vec![*l.p1(), *l.p2()],
            ElemGeom::Arc(a) => {
                let n = subdivision_count(a.radius(), a.sweep().abs(), tol);
                (0..=n)
                    .map(|i| self.geom.point_at(f64::from(i) / f64::from(n)))
                    .collect()
            }
        }
    }

    /// XY crossings with `other`, touching within `eps` included.
    #[must_use]
    pub fn intersect_xy(&self, other: &Elem, eps: f64) -> Vec<ElemHit> {
        if !self.rect.intersects_xy(&other.rect, eps) {
            return Vec::new();
        }
        let hits: Vec<Hit> = match (&self.geom, &other.geom) {
            (ElemGeom::Line(a), ElemGeom::Line(b)) => {
                segment_segment(a.p1(), a.p2(), b.p1(), b.p2(), eps).into_iter().collect()
            }
            (ElemGeom::Line(a), ElemGeom::Arc(b)) => segment_arc(a.p1(), a.p2(), &b.circular(), eps),
            (ElemGeom::Arc(a), ElemGeom::Line(b)) => segment_arc(b.p1(), b.p2(), &a.circular(), eps)
                .into_iter()
                .map(Hit::swapped)
                .collect(),
            (ElemGeom::Arc(a), ElemGeom::Arc(b)) => arc_arc(&a.circular(), &b.circular(), eps),
        };
        hits.into_iter()
            .map(|h| {
                let z = self.geom.point_at(h.t_a).z;
                ElemHit {
                    point: Point3::new(h.x, h.y, z),
                    par_a: self.bpar + h.t_a * self.plen(),
                    par_b: other.bpar + h.t_b * other.plen(),
                }
            })
            .collect()
    }

    /// Swaps the ends and flips the direction. Applying it twice restores
    /// the element exactly.
    pub fn reverse(&mut self) {
        match &mut self.geom {
            ElemGeom::Line(l) => l.reverse(),
            ElemGeom::Arc(a) => a.reverse(),
        }
    }

    /// Moves the start to the XY of `pt`, keeping its Z. Returns `false`
    /// and leaves the element untouched if `check` rejects the result.
    pub fn stretch_p1_xy(&mut self, pt: &Point3, check: bool) -> bool {
        self.stretch(true, pt, check)
    }

    /// Moves the end to the XY of `pt`, keeping its Z.
    pub fn stretch_p2_xy(&mut self, pt: &Point3, check: bool) -> bool {
        self.stretch(false, pt, check)
    }

    fn stretch(&mut self, at_start: bool, pt: &Point3, check: bool) -> bool {
        match self.geom.stretched(at_start, pt.x, pt.y, check) {
            Some(geom) => {
                self.set_geom(geom);
                true
            }
            None => false,
        }
    }

    /// Makes this element's end and `next`'s start meet at a common XY point.
    ///
    /// The meeting point is the length-weighted blend of the two ends, so
    /// the longer element moves less. Neither element changes unless both
    /// stretches succeed.
    pub fn join_to_xy(&mut self, next: &mut Elem, check: bool) -> bool {
        let (a, b) = (*self.p2(), *next.p1());
        let (w1, w2) = (self.len_xy, next.len_xy);
        let (x, y) = if w1 + w2 < ACCURACY {
            ((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
        } else {
            ((a.x * w1 + b.x * w2) / (w1 + w2), (a.y * w1 + b.y * w2) / (w1 + w2))
        };
        let Some(g1) = self.geom.stretched(false, x, y, check) else {
            return false;
        };
        let Some(g2) = next.geom.stretched(true, x, y, check) else {
            return false;
        };
        self.set_geom(g1);
        next.set_geom(g2);
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn line_caches() {
        let e = Elem::line(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 12.0));
        assert_abs_diff_eq!(e.len(), 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.len_xy(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.rect().ur().z, 12.0);
    }

    #[test]
    fn at_par_uses_chain_offset() {
        let mut e = Elem::line(p(0.0, 0.0), p(10.0, 0.0));
        e.set_bpar(5.0);
        let q = e.at_par(7.5);
        assert_abs_diff_eq!(q.x, 2.5, epsilon = 1e-12);
        assert!(e.par_valid(5.0));
        assert!(e.par_valid(15.0 + 0.5 * IDENT_DIST));
        assert!(!e.par_valid(4.9));
        assert_abs_diff_eq!(e.mid_par(), 10.0);
    }

    #[test]
    fn pure_z_line_has_no_xy_parameter() {
        let e = Elem::line(Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 1.0, 5.0));
        assert_abs_diff_eq!(e.len_xy(), 0.0);
        assert!(e.par_from_xy(0.0).is_none());
        assert!(e.xy_from_par(1.0).is_none());
        assert!(e.mid_par_xy().is_none());
    }

    #[test]
    fn inclined_line_xy_parameter() {
        let e = Elem::line(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 12.0));
        assert_abs_diff_eq!(e.par_from_xy(5.0).unwrap(), 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.xy_from_par(6.5).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(e.mid_par_xy().unwrap(), e.mid_par(), epsilon = 1e-12);
    }

    #[test]
    fn reverse_twice_is_identity() {
        let line = Elem::line(Point3::new(0.1, 0.2, 0.3), Point3::new(1.7, -2.9, 0.0));
        let arc = Elem::arc_from_angles(Point3::new(1.0, 2.0, 0.5), 3.3, 0.7, -2.1, 1.5);
        for orig in [line, arc] {
            let mut e = orig.clone();
            e.reverse();
            assert_ne!(e.geom(), orig.geom());
            e.reverse();
            assert_eq!(e.geom(), orig.geom());
        }
    }

    #[test]
    fn reversed_arc_runs_the_other_way() {
        let mut e = Elem::arc_from_angles(Point3::origin(), 1.0, 0.0, FRAC_PI_2, 0.0);
        e.reverse();
        let a = e.as_arc().unwrap();
        assert!(!a.is_ccw());
        assert_abs_diff_eq!(e.p1().y, 1.0, epsilon = 1e-12);
        let mid = e.mid_point();
        assert_abs_diff_eq!(mid.x, (PI / 4.0).cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(e.len(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn project_onto_line() {
        let e = Elem::line(p(0.0, 0.0), p(10.0, 0.0));
        let pr = e.project_pnt_xy(&p(5.0, 3.0), IDENT_DIST, false).unwrap();
        assert_abs_diff_eq!(pr.point.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pr.point.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pr.dist, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pr.par, 5.0, epsilon = 1e-12);

        let right = e.project_pnt_xy(&p(2.0, -1.0), IDENT_DIST, false).unwrap();
        assert_abs_diff_eq!(right.dist, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn strict_projection_rejects_beyond_ends() {
        let e = Elem::line(p(0.0, 0.0), p(10.0, 0.0));
        let clamped = e.project_pnt_xy(&p(12.0, 0.0), 0.1, false).unwrap();
        assert_abs_diff_eq!(clamped.par, 10.0, epsilon = 1e-12);
        assert!(e.project_pnt_xy(&p(12.0, 0.0), 0.1, true).is_none());
        assert!(e.project_pnt_xy(&p(10.05, 0.0), 0.1, true).is_some());
    }

    #[test]
    fn project_onto_arc() {
        let e = Elem::arc_from_angles(Point3::origin(), 2.0, 0.0, PI, 0.0);
        let pr = e.project_pnt_xy(&p(0.0, 3.0), IDENT_DIST, false).unwrap();
        assert_abs_diff_eq!(pr.point.y, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pr.par, PI, epsilon = 1e-12);
        // Outside a CCW arc is on the right of travel.
        assert_abs_diff_eq!(pr.dist, -1.0, epsilon = 1e-12);

        let below = e.project_pnt_xy(&p(1.5, -1.0), IDENT_DIST, false).unwrap();
        assert_abs_diff_eq!(below.par, 0.0, epsilon = 1e-12);
        assert!(e.project_pnt_xy(&p(1.5, -1.0), IDENT_DIST, true).is_none());
    }

    #[test]
    fn circle_is_closed() {
        let c = Elem::circle(Point3::new(1.0, 1.0, 0.0), 2.0);
        assert!(c.is_full_circle());
        assert!(c.is_closed_xy());
        assert_abs_diff_eq!(c.len(), 2.0 * TAU, epsilon = 1e-12);
        assert_abs_diff_eq!(c.rect().ll().x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.rect().ur().y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn bulge_zero_is_a_line() {
        let e = Elem::from_bulge(p(0.0, 0.0), p(1.0, 0.0), 0.0);
        assert!(e.as_line().is_some());
        let a = Elem::from_bulge(p(0.0, 0.0), p(2.0, 0.0), 1.0);
        assert_abs_diff_eq!(a.len(), PI, epsilon = 1e-12);
    }

    #[test]
    fn helical_arc_lengths() {
        let e = Elem::arc_from_angles(Point3::origin(), 1.0, 0.0, TAU, 2.0);
        assert_abs_diff_eq!(e.len_xy(), TAU, epsilon = 1e-12);
        assert_abs_diff_eq!(e.len(), TAU.hypot(2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(e.at_par(e.mid_par()).z, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.rect().ur().z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn helical_arc_xy_parameter_ratio() {
        let mut e = Elem::arc_from_angles(Point3::origin(), 1.0, 0.0, PI, 3.0);
        e.set_bpar(2.0);
        let len = PI.hypot(3.0);
        assert_abs_diff_eq!(e.len_xy(), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(e.len(), len, epsilon = 1e-12);
        let par = e.par_from_xy(FRAC_PI_2).unwrap();
        assert_abs_diff_eq!(par, 2.0 + len / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(e.xy_from_par(2.0 + len).unwrap(), PI, epsilon = 1e-12);
        let q = e.at_par(par);
        assert_abs_diff_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q.z, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(e.mid_par_xy().unwrap(), par, epsilon = 1e-12);
    }

    #[test]
    fn clone_without_info() {
        let mut e = Elem::line(p(0.0, 0.0), p(1.0, 0.0));
        e.set_info(Some(ElemInfo::new(42_u32)));
        e.tags_mut().el_id = 7;
        let kept = e.clone_elem(true);
        let dropped = e.clone_elem(false);
        assert_eq!(kept.info().unwrap().downcast_ref::<u32>(), Some(&42));
        assert!(dropped.info().is_none());
        assert_eq!(dropped.tags().el_id, 7);
    }

    #[test]
    fn line_directions() {
        let e = Elem::line(p(0.0, 0.0), p(0.0, 2.0));
        let d = e.start_dir_xy().unwrap();
        assert_abs_diff_eq!(d.y, 1.0, epsilon = 1e-12);
        let vertical = Elem::line(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0));
        assert!(vertical.end_dir_xy().is_none());
    }

    #[test]
    fn arc_end_direction() {
        let e = Elem::arc_from_angles(Point3::origin(), 1.0, 0.0, FRAC_PI_2, 0.0);
        let d = e.end_dir_xy().unwrap();
        assert_abs_diff_eq!(d.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(d.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn stretch_line_checked() {
        let mut e = Elem::line(p(0.0, 0.0), p(1.0, 0.0));
        assert!(e.stretch_p2_xy(&p(2.0, 0.0), true));
        assert_abs_diff_eq!(e.len(), 2.0, epsilon = 1e-12);
        assert!(!e.stretch_p2_xy(&p(-1.0, 0.0), true));
        assert_abs_diff_eq!(e.p2().x, 2.0);
        assert!(e.stretch_p2_xy(&p(-1.0, 0.0), false));
        assert_abs_diff_eq!(e.p2().x, -1.0);
    }

    #[test]
    fn stretch_keeps_z() {
        let mut e = Elem::line(Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 2.0));
        assert!(e.stretch_p1_xy(&Point3::new(-1.0, 0.0, 9.0), true));
        assert_abs_diff_eq!(e.p1().z, 1.0);
        assert_abs_diff_eq!(e.p1().x, -1.0);
    }

    #[test]
    fn stretch_arc_keeps_sweep() {
        let mut e = Elem::arc_from_angles(Point3::origin(), 10.0, 0.0, FRAC_PI_2, 0.0);
        assert!(e.stretch_p2_xy(&p(0.001, 10.0), true));
        let a = e.as_arc().unwrap();
        assert_abs_diff_eq!(a.sweep(), FRAC_PI_2, epsilon = 1e-9);
        assert_abs_diff_eq!(e.p2().x, 0.001);
        assert!(!e.stretch_p2_xy(&p(0.0, 5.0), true));
    }

    #[test]
    fn join_blends_by_length() {
        let mut a = Elem::line(p(0.0, 0.0), p(3.0, 0.0));
        let mut b = Elem::line(p(3.0, 1.0), p(3.0, 2.0));
        assert!(a.join_to_xy(&mut b, true));
        assert_abs_diff_eq!(a.p2().x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.p2().y, 0.25, epsilon = 1e-12);
        assert_eq!(a.p2(), b.p1());
    }

    #[test]
    fn join_refused_leaves_both() {
        let mut a = Elem::line(p(0.0, 0.0), p(1.0, 0.0));
        let mut b = Elem::line(p(-5.0, 0.0), p(-4.0, 0.0));
        let (a0, b0) = (a.clone(), b.clone());
        assert!(!a.join_to_xy(&mut b, true));
        assert_eq!(a.geom(), a0.geom());
        assert_eq!(b.geom(), b0.geom());
    }

    #[test]
    fn winding_of_square() {
        let sq = [
            Elem::line(p(0.0, 0.0), p(1.0, 0.0)),
            Elem::line(p(1.0, 0.0), p(1.0, 1.0)),
            Elem::line(p(1.0, 1.0), p(0.0, 1.0)),
            Elem::line(p(0.0, 1.0), p(0.0, 0.0)),
        ];
        let w: f64 = sq.iter().map(|e| e.winding_angle_xy(&p(0.5, 0.5))).sum();
        assert_abs_diff_eq!(w, TAU, epsilon = 1e-12);
    }

    #[test]
    fn tessellate_arc() {
        let e = Elem::arc_from_angles(Point3::origin(), 1.0, 0.0, PI, 0.0);
        let pts = e.to_points(0.01);
        assert!(pts.len() > 3);
        assert_eq!(pts.first(), Some(e.p1()));
        assert_eq!(pts.last(), Some(e.p2()));
        for q in &pts {
            assert_abs_diff_eq!(q.coords.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn intersections_report_chain_params() {
        let mut a = Elem::line(p(0.0, 0.0), p(2.0, 0.0));
        a.set_bpar(10.0);
        let b = Elem::line(p(1.0, -1.0), p(1.0, 1.0));
        let hits = a.intersect_xy(&b, 1e-9);
        assert_eq!(hits.len(), 1);
        assert_abs_diff_eq!(hits[0].par_a, 11.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hits[0].par_b, 1.0, epsilon = 1e-12);

        let c = Elem::circle(p(1.0, 0.0), 0.5);
        let hits = c.intersect_xy(&a, 1e-9);
        assert_eq!(hits.len(), 2);
        for h in &hits {
            assert!(a.par_valid(h.par_b));
            assert_abs_diff_eq!(h.point.y, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn defaults_apply_color_and_style() {
        let defaults = ElemDefaults {
            color: Color(0x00FF_0000),
            line_style: LineStyle::Dashed,
        };
        let e = Elem::line(p(0.0, 0.0), p(1.0, 0.0)).with_defaults(&defaults);
        assert_eq!(e.color(), Color(0x00FF_0000));
        assert_eq!(e.as_line().unwrap().style(), LineStyle::Dashed);
    }
}
