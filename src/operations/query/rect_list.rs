use tracing::{debug, instrument};

use crate::config::RectListParams;
use crate::error::QueryError;
use crate::geometry::ElemProjection;
use crate::math::{Point3, RectAx, IDENT_DIST};
use crate::topology::{ElemKey, ElemList};

/// One range of consecutive elements and the union of their boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRect {
    rect: RectAx,
    first: ElemKey,
    end: Option<ElemKey>,
    count: usize,
}

impl SubRect {
    #[must_use]
    pub fn rect(&self) -> &RectAx {
        &self.rect
    }

    #[must_use]
    pub fn first(&self) -> ElemKey {
        self.first
    }

    /// First element after this range, `None` for the last range.
    #[must_use]
    pub fn end(&self) -> Option<ElemKey> {
        self.end
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Keys of the range's elements in chain order.
    pub fn keys<'a>(&self, list: &'a ElemList) -> impl Iterator<Item = ElemKey> + 'a {
        list.keys_from(self.first).take(self.count)
    }

    /// Chain parameter span covered by the range.
    fn par_span(&self, list: &ElemList) -> Option<(f64, f64)> {
        let begin = list.get(self.first)?.begin_par();
        let end = match self.end {
            Some(k) => list.get(k)?.begin_par(),
            None => list.get(list.last()?)?.end_par(),
        };
        Some((begin, end))
    }
}

/// Nearest point found by [`ElemRectList::project_pnt_xy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainProjection {
    pub key: ElemKey,
    pub proj: ElemProjection,
}

/// Partition of an ordered element chain into bounded ranges.
///
/// The index does not own the chain; queries take the list it was built
/// from and reject a list that has changed length since.
#[derive(Debug, Clone, Default)]
pub struct ElemRectList {
    ranges: Vec<SubRect>,
    elems: usize,
}

impl ElemRectList {
    /// Partitions `list` greedily into ranges of at most `max_elems`
    /// elements whose union box has an XY area of at most `max_area`.
    ///
    /// An element that alone exceeds `max_area` gets a range of its own.
    #[must_use]
    #[instrument(skip(list), level = "debug", fields(len = list.len()))]
    pub fn build(list: &ElemList, max_elems: usize, max_area: f64) -> Self {
        let max_elems = max_elems.max(1);
        let mut ranges = Vec::new();
        let mut current: Option<SubRect> = None;

        for (key, elem) in list {
            let Some(mut cur) = current.take() else {
                current = Some(SubRect {
                    rect: *elem.rect(),
                    first: key,
                    end: None,
                    count: 1,
                });
                continue;
            };
            let united = cur.rect.united(elem.rect());
            if cur.count + 1 > max_elems || united.area_xy() > max_area {
                cur.end = Some(key);
                ranges.push(cur);
                current = Some(SubRect {
                    rect: *elem.rect(),
                    first: key,
                    end: None,
                    count: 1,
                });
            } else {
                cur.rect = united;
                cur.count += 1;
                current = Some(cur);
            }
        }
        ranges.extend(current);

        debug!(ranges = ranges.len(), "built range index");
        Self {
            ranges,
            elems: list.len(),
        }
    }

    #[must_use]
    pub fn with_params(list: &ElemList, params: &RectListParams) -> Self {
        Self::build(list, params.max_elems, params.max_area)
    }

    #[must_use]
    pub fn ranges(&self) -> &[SubRect] {
        &self.ranges
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    fn check(&self, list: &ElemList) -> Result<(), QueryError> {
        let fresh = list.len() == self.elems && self.ranges.iter().all(|r| list.contains(r.first));
        if fresh {
            Ok(())
        } else {
            Err(QueryError::StaleIndex)
        }
    }

    /// Element whose parameter span contains `par`.
    ///
    /// Whole ranges are skipped while the element after them still starts
    /// at or before `par`; the remaining range is then scanned. Returns
    /// `None` when `par` lies outside the chain by more than `IDENT_DIST`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StaleIndex`] if `list` is not the list the
    /// index was built from.
    pub fn find_elem_at_par(&self, list: &ElemList, par: f64) -> Result<Option<ElemKey>, QueryError> {
        self.check(list)?;
        let mut ri = 0;
        while let Some(range) = self.ranges.get(ri) {
            match range.end.and_then(|k| list.get(k)) {
                Some(next) if next.begin_par() <= par && ri + 1 < self.ranges.len() => ri += 1,
                _ => break,
            }
        }
        let Some(range) = self.ranges.get(ri) else {
            return Ok(None);
        };

        let mut key = range.first;
        loop {
            let Some(elem) = list.get(key) else {
                return Err(QueryError::StaleIndex);
            };
            if elem.end_par() > par {
                break;
            }
            match list.next(key) {
                Some(next) => key = next,
                None => break,
            }
        }
        Ok(list.get(key).filter(|e| e.par_valid(par)).map(|_| key))
    }

    /// Range whose box is nearest to `p` in XY, and its first element.
    ///
    /// Ties go to the earlier range.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyIndex`] if the index has no ranges.
    pub fn nearest_rect_to(&self, p: &Point3) -> Result<(usize, ElemKey), QueryError> {
        let mut best: Option<(usize, ElemKey, f64)> = None;
        for (i, r) in self.ranges.iter().enumerate() {
            let d = r.rect.distance_to_xy(p);
            if best.is_none_or(|(_, _, bd)| d < bd) {
                best = Some((i, r.first, d));
            }
        }
        best.map(|(i, k, _)| (i, k)).ok_or(QueryError::EmptyIndex)
    }

    /// Nearest point on the chain to `p` in XY.
    ///
    /// Ranges are visited circularly starting from the nearest one. A range
    /// whose box is already farther than the best hit is skipped. Returns
    /// `None` for an empty chain.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StaleIndex`] if `list` is not the list the
    /// index was built from.
    pub fn project_pnt_xy(
        &self,
        list: &ElemList,
        p: &Point3,
        tol: f64,
    ) -> Result<Option<ChainProjection>, QueryError> {
        self.project(list, p, tol, None)
    }

    /// Like [`project_pnt_xy`](Self::project_pnt_xy), restricted to the
    /// parameter window `[begin_par, end_par]`.
    ///
    /// Ranges and elements outside the window are skipped and elements are
    /// projected strictly, so a hit never lies beyond an element end.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::StaleIndex`] if `list` is not the list the
    /// index was built from.
    pub fn project_pnt_xy_in(
        &self,
        list: &ElemList,
        p: &Point3,
        tol: f64,
        begin_par: f64,
        end_par: f64,
    ) -> Result<Option<ChainProjection>, QueryError> {
        self.project(list, p, tol, Some((begin_par, end_par)))
    }

    fn project(
        &self,
        list: &ElemList,
        p: &Point3,
        tol: f64,
        window: Option<(f64, f64)>,
    ) -> Result<Option<ChainProjection>, QueryError> {
        if self.ranges.is_empty() {
            return Ok(None);
        }
        self.check(list)?;
        let (start, _) = self.nearest_rect_to(p)?;
        let n = self.ranges.len();
        let overlaps = |b: f64, e: f64| window.is_none_or(|(wb, we)| e >= wb - IDENT_DIST && b <= we + IDENT_DIST);

        let mut best: Option<ChainProjection> = None;
        for step in 0..n {
            let range = &self.ranges[(start + step) % n];
            if step > 0 {
                if let Some(b) = &best {
                    if range.rect.distance_to_xy(p) > b.proj.dist.abs() + IDENT_DIST {
                        continue;
                    }
                }
            }
            if window.is_some() {
                let Some((b, e)) = range.par_span(list) else {
                    return Err(QueryError::StaleIndex);
                };
                if !overlaps(b, e) {
                    continue;
                }
            }

            for key in range.keys(list) {
                let Some(elem) = list.get(key) else {
                    return Err(QueryError::StaleIndex);
                };
                if !overlaps(elem.begin_par(), elem.end_par()) {
                    continue;
                }
                let Some(proj) = elem.project_pnt_xy(p, tol, window.is_some()) else {
                    continue;
                };
                if !overlaps(proj.par, proj.par) {
                    continue;
                }
                if best.is_none_or(|b| proj.dist.abs() < b.proj.dist.abs()) {
                    best = Some(ChainProjection { key, proj });
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::Elem;
    use approx::assert_abs_diff_eq;

    fn l(x0: f64, y0: f64, x1: f64, y1: f64) -> Elem {
        Elem::line(Point3::new(x0, y0, 0.0), Point3::new(x1, y1, 0.0))
    }

    fn staircase(n: i32) -> ElemList {
        let mut list: ElemList = (0..n)
            .map(|i| {
                let x = f64::from(i);
                l(x, x, x + 1.0, x + 1.0)
            })
            .collect();
        list.renumber(0.0);
        list
    }

    fn unit_steps(n: i32) -> ElemList {
        let mut list: ElemList = (0..n).map(|i| l(f64::from(i), 0.0, f64::from(i + 1), 0.0)).collect();
        list.renumber(0.0);
        list
    }

    #[test]
    fn max_elems_two_over_five() {
        let list = staircase(5);
        let idx = ElemRectList::build(&list, 2, f64::INFINITY);
        let sizes: Vec<usize> = idx.ranges().iter().map(SubRect::count).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let keys: Vec<ElemKey> = list.keys().collect();
        let mut offset = 0;
        for r in idx.ranges() {
            let mut expect = RectAx::empty();
            for k in &keys[offset..offset + r.count()] {
                expect.union(list.get(*k).unwrap().rect());
            }
            assert_eq!(*r.rect(), expect);
            assert_eq!(r.first(), keys[offset]);
            offset += r.count();
            assert_eq!(r.end(), keys.get(offset).copied());
        }
    }

    #[test]
    fn area_budget_seals_ranges() {
        let list = staircase(4);
        // Each step covers area 1; two steps united cover 4.
        let idx = ElemRectList::build(&list, 100, 2.0);
        assert_eq!(idx.len(), 4);
        let oversize = ElemRectList::build(&list, 100, 0.5);
        assert_eq!(oversize.len(), 4);
        let all = ElemRectList::build(&list, 100, 16.0);
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn find_elem_at_known_params() {
        let list = unit_steps(3);
        let keys: Vec<ElemKey> = list.keys().collect();
        for max_elems in [1, 2, 3] {
            let idx = ElemRectList::build(&list, max_elems, f64::INFINITY);
            for (par, want) in [(0.5, 0), (1.5, 1), (2.5, 2), (2.999, 2)] {
                assert_eq!(idx.find_elem_at_par(&list, par).unwrap(), Some(keys[want]), "par={par}");
            }
            assert_eq!(idx.find_elem_at_par(&list, 3.0).unwrap(), Some(keys[2]));
            assert_eq!(idx.find_elem_at_par(&list, 3.5).unwrap(), None);
            assert_eq!(idx.find_elem_at_par(&list, -0.5).unwrap(), None);
        }
    }

    #[test]
    fn nearest_rect_ties_go_first() {
        let list = unit_steps(4);
        let idx = ElemRectList::build(&list, 1, f64::INFINITY);
        let (i, _) = idx.nearest_rect_to(&Point3::new(2.0, 5.0, 0.0)).unwrap();
        assert_eq!(i, 1);
        let (i, k) = idx.nearest_rect_to(&Point3::new(3.5, -1.0, 0.0)).unwrap();
        assert_eq!(i, 3);
        assert_eq!(k, list.last().unwrap());
    }

    #[test]
    fn nearest_rect_on_empty_index_fails() {
        let idx = ElemRectList::build(&ElemList::new(), 4, f64::INFINITY);
        assert!(matches!(
            idx.nearest_rect_to(&Point3::origin()),
            Err(QueryError::EmptyIndex)
        ));
        assert!(idx.project_pnt_xy(&ElemList::new(), &Point3::origin(), 1e-6).unwrap().is_none());
    }

    #[test]
    fn project_single_line() {
        let list: ElemList = std::iter::once(l(0.0, 0.0, 10.0, 0.0)).collect();
        let idx = ElemRectList::build(&list, 16, f64::INFINITY);
        let hit = idx
            .project_pnt_xy(&list, &Point3::new(5.0, 3.0, 0.0), IDENT_DIST)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(hit.proj.point.x, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.proj.point.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.proj.dist.abs(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(hit.proj.par, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn project_matches_brute_force() {
        // A zigzag long enough to need several ranges.
        let mut list: ElemList = (0..40)
            .map(|i| {
                let x = f64::from(i);
                let y = if i % 2 == 0 { 0.0 } else { 1.0 };
                let y2 = if i % 2 == 0 { 1.0 } else { 0.0 };
                l(x, y, x + 1.0, y2)
            })
            .collect();
        list.renumber(0.0);
        let idx = ElemRectList::build(&list, 3, f64::INFINITY);
        for q in [Point3::new(17.3, 4.0, 0.0), Point3::new(-2.0, 0.5, 0.0), Point3::new(39.9, -3.0, 0.0)] {
            let hit = idx.project_pnt_xy(&list, &q, IDENT_DIST).unwrap().unwrap();
            let brute = list
                .elems()
                .filter_map(|e| e.project_pnt_xy(&q, IDENT_DIST, false))
                .map(|pr| pr.dist.abs())
                .fold(f64::INFINITY, f64::min);
            assert_abs_diff_eq!(hit.proj.dist.abs(), brute, epsilon = 1e-12);
        }
    }

    #[test]
    fn project_within_window() {
        // U shape: bottom (par 0..4), right side (4..6), top back (6..10).
        let mut list: ElemList = [l(0.0, 0.0, 4.0, 0.0), l(4.0, 0.0, 4.0, 2.0), l(4.0, 2.0, 0.0, 2.0)]
            .into_iter()
            .collect();
        list.renumber(0.0);
        let idx = ElemRectList::build(&list, 1, f64::INFINITY);
        let q = Point3::new(2.0, 0.5, 0.0);

        let free = idx.project_pnt_xy(&list, &q, IDENT_DIST).unwrap().unwrap();
        assert_abs_diff_eq!(free.proj.par, 2.0, epsilon = 1e-12);

        let top = idx.project_pnt_xy_in(&list, &q, IDENT_DIST, 6.0, 10.0).unwrap().unwrap();
        assert_abs_diff_eq!(top.proj.par, 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(top.proj.dist.abs(), 1.5, epsilon = 1e-12);

        let side = idx.project_pnt_xy_in(&list, &q, IDENT_DIST, 4.5, 5.5).unwrap().unwrap();
        assert_abs_diff_eq!(side.proj.par, 4.5, epsilon = 1e-12);

        assert!(idx.project_pnt_xy_in(&list, &q, IDENT_DIST, 5.0, 6.0).unwrap().is_none());
    }

    #[test]
    fn stale_index_detected() {
        let mut list = unit_steps(3);
        let idx = ElemRectList::build(&list, 2, f64::INFINITY);
        list.pop_back();
        assert!(matches!(idx.find_elem_at_par(&list, 0.5), Err(QueryError::StaleIndex)));
        assert!(matches!(
            idx.project_pnt_xy(&list, &Point3::origin(), IDENT_DIST),
            Err(QueryError::StaleIndex)
        ));
    }
}
