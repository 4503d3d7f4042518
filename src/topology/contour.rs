use std::cell::OnceCell;

use tracing::debug;

use crate::config::{ElemDefaults, RectListParams, Tolerance};
use crate::error::{GeometryError, TopologyError};
use crate::geometry::{ArcSeg, Elem};
use crate::math::distance_2d::subtended_angle;
use crate::math::{dist_xy, Point3, RectAx, IDENT_DIST};
use crate::operations::chain::{is_contiguous, remove_short_elems, ElemSort};
use crate::operations::query::{intersect_chains, ChainHit, ChainProjection, ElemRectList};

use super::{ContInert, ElemKey, ElemList};

/// An ordered chain of elements with cached lengths, a spatial index and
/// inertial properties.
///
/// Element parameters run from zero along the chain. Every mutation through
/// the contour renumbers them and drops the caches, so cached values always
/// describe the current elements.
#[derive(Debug, Clone, Default)]
pub struct Contour {
    elems: ElemList,
    closed: bool,
    defaults: ElemDefaults,
    params: RectListParams,
    lengths: OnceCell<(f64, f64)>,
    rect_list: OnceCell<ElemRectList>,
    inert: OnceCell<ContInert>,
}

impl Contour {
    /// Creates an empty open contour.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty contour whose created elements take `defaults`.
    #[must_use]
    pub fn with_defaults(defaults: ElemDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Takes ownership of an already ordered chain.
    #[must_use]
    pub fn from_list(elems: ElemList, closed: bool) -> Self {
        let mut c = Self {
            elems,
            closed,
            ..Self::default()
        };
        c.changed();
        c
    }

    /// Chains `elems` with [`ElemSort`] and returns every resulting contour,
    /// closed loops first.
    #[must_use]
    pub fn build_all(elems: impl IntoIterator<Item = Elem>, tol: f64) -> Vec<Contour> {
        let contours: Vec<Contour> = ElemSort::new(elems, tol)
            .map(|chain| Contour::from_list(chain.elems, chain.closed))
            .collect();
        debug!(count = contours.len(), "built contours");
        contours
    }

    /// Sets the range budgets used when the spatial index is built.
    pub fn set_rect_list_params(&mut self, params: RectListParams) {
        self.params = params;
        self.rect_list.take();
    }

    #[must_use]
    pub fn rect_list_params(&self) -> &RectListParams {
        &self.params
    }

    #[must_use]
    pub fn defaults(&self) -> &ElemDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: ElemDefaults) {
        self.defaults = defaults;
    }

    #[must_use]
    pub fn elems(&self) -> &ElemList {
        &self.elems
    }

    /// Releases the element chain.
    #[must_use]
    pub fn into_elems(self) -> ElemList {
        self.elems
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn start_point(&self) -> Option<&Point3> {
        self.elems.first().and_then(|k| self.elems.get(k)).map(Elem::p1)
    }

    #[must_use]
    pub fn end_point(&self) -> Option<&Point3> {
        self.elems.last().and_then(|k| self.elems.get(k)).map(Elem::p2)
    }

    // --- Mutation ---

    fn changed(&mut self) {
        self.elems.renumber(0.0);
        self.lengths.take();
        self.rect_list.take();
        self.inert.take();
    }

    /// Appends `elem` as is.
    pub fn push_back(&mut self, elem: Elem) -> ElemKey {
        let key = self.elems.push_back(elem);
        self.changed();
        key
    }

    /// Prepends `elem` as is.
    pub fn push_front(&mut self, elem: Elem) -> ElemKey {
        let key = self.elems.push_front(elem);
        self.changed();
        key
    }

    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `at` is not in this contour.
    pub fn insert_after(&mut self, at: ElemKey, elem: Elem) -> Result<ElemKey, TopologyError> {
        let key = self.elems.insert_after(at, elem)?;
        self.changed();
        Ok(key)
    }

    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `at` is not in this contour.
    pub fn insert_before(&mut self, at: ElemKey, elem: Elem) -> Result<ElemKey, TopologyError> {
        let key = self.elems.insert_before(at, elem)?;
        self.changed();
        Ok(key)
    }

    pub fn remove(&mut self, key: ElemKey) -> Option<Elem> {
        let elem = self.elems.remove(key)?;
        if self.elems.is_empty() {
            self.closed = false;
        }
        self.changed();
        Some(elem)
    }

    /// Edits one element in place.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::ElemNotFound`] if `key` is not in this contour.
    pub fn modify<R>(&mut self, key: ElemKey, f: impl FnOnce(&mut Elem) -> R) -> Result<R, TopologyError> {
        let r = f(self.elems.elem_mut(key)?);
        self.changed();
        Ok(r)
    }

    /// Appends a line from `p1` to `p2` carrying the contour's defaults.
    pub fn add_line(&mut self, p1: Point3, p2: Point3) -> ElemKey {
        self.push_back(Elem::line(p1, p2).with_defaults(&self.defaults))
    }

    /// Appends an arc carrying the contour's defaults.
    pub fn add_arc(&mut self, arc: ArcSeg) -> ElemKey {
        self.push_back(Elem::arc(arc).with_defaults(&self.defaults))
    }

    /// Appends a line from the current end point to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the contour is empty.
    pub fn line_to(&mut self, p: Point3) -> Result<ElemKey, GeometryError> {
        let from = self.require_end()?;
        Ok(self.add_line(from, p))
    }

    /// Appends an arc around `center` from the current end point to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the contour is empty.
    pub fn arc_to(&mut self, p: Point3, center: &Point3, ccw: bool) -> Result<ElemKey, GeometryError> {
        let from = self.require_end()?;
        Ok(self.add_arc(ArcSeg::from_points(from, p, center, ccw)))
    }

    /// Appends a bulge segment from the current end point to `p`; a zero
    /// bulge gives a line.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] if the contour is empty.
    pub fn bulge_to(&mut self, p: Point3, bulge: f64) -> Result<ElemKey, GeometryError> {
        let from = self.require_end()?;
        Ok(self.push_back(Elem::from_bulge(from, p, bulge).with_defaults(&self.defaults)))
    }

    fn require_end(&self) -> Result<Point3, GeometryError> {
        self.end_point()
            .copied()
            .ok_or_else(|| GeometryError::Degenerate("contour has no end point".into()))
    }

    /// Reverses the direction of travel.
    pub fn reverse(&mut self) {
        self.elems.reverse();
        self.changed();
    }

    /// Marks the contour closed after checking that its ends meet.
    ///
    /// A gap up to `tol` is removed by joining the last element to the first;
    /// ends already within `IDENT_DIST` are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotContiguous`] for an empty contour and
    /// [`TopologyError::ContourNotClosed`] if the gap exceeds `tol` or the
    /// seam cannot be joined.
    pub fn close(&mut self, tol: f64) -> Result<(), TopologyError> {
        let (Some(first), Some(last)) = (self.elems.first(), self.elems.last()) else {
            return Err(TopologyError::NotContiguous);
        };
        let gap = dist_xy(self.elems.elem(last)?.p2(), self.elems.elem(first)?.p1());
        if gap > tol {
            return Err(TopologyError::ContourNotClosed { gap });
        }
        let seam_apart = !Tolerance::default().same_point_xy(self.elems.elem(last)?.p2(), self.elems.elem(first)?.p1());
        if seam_apart && first != last {
            let joined = self
                .elems
                .pair_mut(last, first)
                .is_some_and(|(l, f)| l.join_to_xy(f, true));
            if !joined {
                return Err(TopologyError::ContourNotClosed { gap });
            }
        }
        self.closed = true;
        self.changed();
        Ok(())
    }

    /// Joins every pair of consecutive elements, and the seam of a closed
    /// contour, at a common XY point.
    ///
    /// Returns `false` if any joint was refused; the others are still joined.
    pub fn join_all_xy(&mut self, check: bool) -> bool {
        let keys: Vec<ElemKey> = self.elems.keys().collect();
        let mut pairs: Vec<(ElemKey, ElemKey)> = keys.windows(2).map(|w| (w[0], w[1])).collect();
        if self.closed && keys.len() > 1 {
            if let (Some(&l), Some(&f)) = (keys.last(), keys.first()) {
                pairs.push((l, f));
            }
        }
        let mut all = true;
        for (a, b) in pairs {
            all &= self.elems.pair_mut(a, b).is_some_and(|(ea, eb)| ea.join_to_xy(eb, check));
        }
        self.changed();
        all
    }

    /// Removes short elements that continue a neighbour; see
    /// [`remove_short_elems`].
    pub fn remove_short_elems(&mut self, max_len: f64, max_dist: f64) -> bool {
        let removed = remove_short_elems(&mut self.elems, self.closed, max_len, max_dist);
        if removed {
            self.changed();
        }
        removed
    }

    // --- Queries ---

    /// Checks that the elements touch end to start, and close up if the
    /// contour is marked closed.
    #[must_use]
    pub fn is_contiguous(&self, tol: f64) -> bool {
        is_contiguous(&self.elems, self.closed, tol)
    }

    fn lengths(&self) -> (f64, f64) {
        *self.lengths.get_or_init(|| self.elems.lengths())
    }

    /// Total 3D length, also the parameter at the chain end.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.lengths().0
    }

    #[must_use]
    pub fn length_xy(&self) -> f64 {
        self.lengths().1
    }

    /// Spatial index over the current elements, built on first use.
    #[must_use]
    pub fn rect_list(&self) -> &ElemRectList {
        self.rect_list
            .get_or_init(|| ElemRectList::with_params(&self.elems, &self.params))
    }

    #[must_use]
    pub fn rect(&self) -> RectAx {
        self.rect_list()
            .ranges()
            .iter()
            .fold(RectAx::empty(), |r, s| r.united(s.rect()))
    }

    /// Area, centroid and moments in XY, computed on first use.
    ///
    /// An open contour is treated as closed by a straight chord.
    #[must_use]
    pub fn inertia(&self) -> &ContInert {
        self.inert.get_or_init(|| ContInert::from_elems(self.elems.elems()))
    }

    /// Signed XY area; positive for counter-clockwise travel.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        self.inertia().area
    }

    // The index is dropped on every mutation, so it always matches `elems`
    // and its stale-list errors cannot occur here.

    /// Element whose parameter span contains `par`.
    #[must_use]
    pub fn find_elem_at_par(&self, par: f64) -> Option<ElemKey> {
        self.rect_list().find_elem_at_par(&self.elems, par).ok().flatten()
    }

    /// Point at chain parameter `par`.
    #[must_use]
    pub fn at_par(&self, par: f64) -> Option<Point3> {
        let key = self.find_elem_at_par(par)?;
        self.elems.get(key).map(|e| e.at_par(par))
    }

    /// Nearest point on the contour to `p` in XY.
    #[must_use]
    pub fn project_pnt_xy(&self, p: &Point3, tol: f64) -> Option<ChainProjection> {
        self.rect_list().project_pnt_xy(&self.elems, p, tol).ok().flatten()
    }

    /// Nearest point to `p` within the parameter window `[begin_par, end_par]`.
    #[must_use]
    pub fn project_pnt_xy_in(&self, p: &Point3, tol: f64, begin_par: f64, end_par: f64) -> Option<ChainProjection> {
        self.rect_list()
            .project_pnt_xy_in(&self.elems, p, tol, begin_par, end_par)
            .ok()
            .flatten()
    }

    /// XY crossings with `other`, ordered along this contour.
    #[must_use]
    pub fn intersect_xy(&self, other: &Contour, eps: f64) -> Vec<ChainHit> {
        intersect_chains(&self.elems, self.rect_list(), &other.elems, other.rect_list(), eps)
    }

    /// Number of turns the contour makes around `p`; an open contour is
    /// closed by a straight chord.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn winding_number_xy(&self, p: &Point3) -> i32 {
        let mut angle: f64 = self.elems.elems().map(|e| e.winding_angle_xy(p)).sum();
        if let (Some(s), Some(e)) = (self.start_point(), self.end_point()) {
            angle += subtended_angle(p, e, s);
        }
        (angle / std::f64::consts::TAU).round() as i32
    }

    /// `true` if `p` is enclosed by this closed contour.
    #[must_use]
    pub fn contains_point_xy(&self, p: &Point3) -> bool {
        self.closed && self.rect().point_inside_xy(p, IDENT_DIST) && self.winding_number_xy(p) != 0
    }

    /// Vertices approximating the whole contour within chord error `tol`.
    ///
    /// Shared joints appear once.
    #[must_use]
    pub fn to_points(&self, tol: f64) -> Vec<Point3> {
        let mut points: Vec<Point3> = Vec::new();
        for e in self.elems.elems() {
            let mut pts = e.to_points(tol).into_iter();
            if points.last().is_some_and(|last| (last - e.p1()).norm() < IDENT_DIST) {
                pts.next();
            }
            points.extend(pts);
        }
        points
    }
}

impl FromIterator<Elem> for Contour {
    fn from_iter<I: IntoIterator<Item = Elem>>(iter: I) -> Self {
        Self::from_list(iter.into_iter().collect(), false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square(size: f64) -> Contour {
        let mut c = Contour::new();
        c.add_line(p(0.0, 0.0), p(size, 0.0));
        c.line_to(p(size, size)).unwrap();
        c.line_to(p(0.0, size)).unwrap();
        c.line_to(p(0.0, 0.0)).unwrap();
        c.close(IDENT_DIST).unwrap();
        c
    }

    #[test]
    fn square_lengths_and_area() {
        let c = square(2.0);
        assert!(c.is_closed());
        assert_eq!(c.len(), 4);
        assert_abs_diff_eq!(c.length(), 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.length_xy(), 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.signed_area(), 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.inertia().centroid.x, 1.0, epsilon = 1e-12);
        let r = c.rect();
        assert_abs_diff_eq!(r.ur().x, 2.0);
        assert_abs_diff_eq!(r.ll().y, 0.0);
    }

    #[test]
    fn bpar_runs_along_chain() {
        let c = square(1.0);
        let bpars: Vec<f64> = c.elems().elems().map(Elem::bpar).collect();
        assert_eq!(bpars, vec![0.0, 1.0, 2.0, 3.0]);
        let k = c.find_elem_at_par(2.5).unwrap();
        assert_abs_diff_eq!(c.elems().get(k).unwrap().bpar(), 2.0);
        let pt = c.at_par(2.5).unwrap();
        assert_abs_diff_eq!(pt.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(pt.y, 1.0, epsilon = 1e-12);
        assert!(c.find_elem_at_par(4.5).is_none());
    }

    #[test]
    fn reverse_flips_area_and_renumbers() {
        let mut c = square(1.0);
        let _ = c.signed_area();
        c.reverse();
        assert_abs_diff_eq!(c.signed_area(), -1.0, epsilon = 1e-12);
        assert_eq!(c.start_point(), Some(&p(0.0, 0.0)));
        let first = c.elems().get(c.elems().first().unwrap()).unwrap();
        assert_abs_diff_eq!(first.bpar(), 0.0);
        assert_eq!(first.p2(), &p(0.0, 1.0));
    }

    #[test]
    fn modify_drops_caches() {
        let mut c = square(1.0);
        assert_abs_diff_eq!(c.length(), 4.0, epsilon = 1e-12);
        let k = c.elems().first().unwrap();
        c.modify(k, |e| *e = Elem::line(p(0.0, 0.0), p(2.0, 0.0))).unwrap();
        assert_abs_diff_eq!(c.length(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn close_rejects_wide_gap() {
        let mut c = Contour::new();
        c.add_line(p(0.0, 0.0), p(1.0, 0.0));
        c.line_to(p(1.0, 1.0)).unwrap();
        c.line_to(p(0.0, 0.1)).unwrap();
        match c.close(0.01) {
            Err(TopologyError::ContourNotClosed { gap }) => assert_abs_diff_eq!(gap, 0.1, epsilon = 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        assert!(!c.is_closed());
    }

    #[test]
    fn close_joins_small_gap() {
        let mut c = Contour::new();
        c.add_line(p(0.0, 0.0), p(1.0, 0.0));
        c.line_to(p(1.0, 1.0)).unwrap();
        c.line_to(p(0.0, 0.001)).unwrap();
        c.close(0.01).unwrap();
        assert!(c.is_contiguous(1e-12));
    }

    #[test]
    fn empty_contour_cannot_close() {
        let mut c = Contour::new();
        assert!(matches!(c.close(1.0), Err(TopologyError::NotContiguous)));
        assert!(c.line_to(p(1.0, 0.0)).is_err());
    }

    #[test]
    fn defaults_apply_to_created_elements() {
        let mut c = Contour::with_defaults(ElemDefaults {
            color: Color::BLACK,
            ..ElemDefaults::default()
        });
        let k = c.add_line(p(0.0, 0.0), p(1.0, 0.0));
        assert_eq!(c.elems().get(k).unwrap().color(), Color::BLACK);
        let pushed = c.push_back(Elem::line(p(1.0, 0.0), p(2.0, 0.0)));
        assert_eq!(c.elems().get(pushed).unwrap().color(), Color::default());
    }

    #[test]
    fn containment_by_winding() {
        let c = square(2.0);
        assert!(c.contains_point_xy(&p(1.0, 1.0)));
        assert!(!c.contains_point_xy(&p(3.0, 1.0)));
        assert_eq!(c.winding_number_xy(&p(1.0, 1.0)), 1);

        let mut cw = c.clone();
        cw.reverse();
        assert_eq!(cw.winding_number_xy(&p(1.0, 1.0)), -1);
        assert!(cw.contains_point_xy(&p(1.0, 1.0)));
    }

    #[test]
    fn arc_contour_containment() {
        // Half disc: arc over the top, diameter back.
        let mut c = Contour::new();
        c.add_arc(ArcSeg::from_points(p(1.0, 0.0), p(-1.0, 0.0), &p(0.0, 0.0), true));
        c.line_to(p(1.0, 0.0)).unwrap();
        c.close(IDENT_DIST).unwrap();
        assert_abs_diff_eq!(c.signed_area(), PI / 2.0, epsilon = 1e-12);
        assert!(c.contains_point_xy(&p(0.0, 0.9)));
        assert!(!c.contains_point_xy(&p(0.0, -0.1)));
        assert!(!c.contains_point_xy(&p(0.9, 0.9)));
    }

    #[test]
    fn projection_and_window() {
        let c = square(2.0);
        let hit = c.project_pnt_xy(&p(1.0, -0.5), 1e-9).unwrap();
        assert_abs_diff_eq!(hit.proj.point.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.proj.par, 1.0, epsilon = 1e-12);

        let far = c.project_pnt_xy_in(&p(1.0, -0.5), 1e-9, 2.0, 6.0).unwrap();
        assert!(far.proj.par >= 2.0 - 1e-9);
        assert!(far.proj.dist.abs() > 0.5);
    }

    #[test]
    fn crossing_contours() {
        let a = square(2.0);
        let mut b = Contour::new();
        b.add_line(p(1.0, -1.0), p(1.0, 3.0));
        let hits = a.intersect_xy(&b, 1e-9);
        assert_eq!(hits.len(), 2);
        assert_abs_diff_eq!(hits[0].hit.point.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hits[1].hit.point.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn build_all_from_shuffled_elems() {
        let elems = vec![
            Elem::line(p(1.0, 1.0), p(0.0, 1.0)),
            Elem::line(p(5.0, 0.0), p(6.0, 0.0)),
            Elem::line(p(0.0, 0.0), p(1.0, 0.0)),
            Elem::line(p(0.0, 1.0), p(0.0, 0.0)),
            Elem::line(p(1.0, 0.0), p(1.0, 1.0)),
        ];
        let contours = Contour::build_all(elems, 1e-6);
        assert_eq!(contours.len(), 2);
        let closed: Vec<&Contour> = contours.iter().filter(|c| c.is_closed()).collect();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].len(), 4);
        assert_abs_diff_eq!(closed[0].signed_area().abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn join_all_snaps_joints() {
        let mut c: Contour = [
            Elem::line(p(0.0, 0.0), p(1.0, 0.0)),
            Elem::line(p(1.0, 0.0001), p(1.0, 1.0)),
        ]
        .into_iter()
        .collect();
        assert!(!c.is_contiguous(1e-9));
        assert!(c.join_all_xy(true));
        assert!(c.is_contiguous(1e-12));
    }

    #[test]
    fn to_points_shares_joints() {
        let c = square(1.0);
        let pts = c.to_points(0.01);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], pts[4]);
    }

    #[test]
    fn remove_drops_closed_flag_when_empty() {
        let mut c = Contour::new();
        let k = c.push_back(Elem::circle(p(0.0, 0.0), 1.0));
        c.close(0.0).unwrap();
        assert!(c.remove(k).is_some());
        assert!(!c.is_closed());
        assert!(c.is_empty());
    }
}
