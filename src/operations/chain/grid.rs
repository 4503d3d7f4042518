use tracing::{debug, instrument, trace, warn};

use crate::geometry::Elem;
use crate::math::{dist_xy, Point3, IDENT_DIST};
use crate::topology::{ElemKey, ElemList};

/// Default number of grid cells per axis.
pub const ELEM_SEARCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Start,
    End,
}

/// One axis of the bucket grid.
#[derive(Debug, Clone, Copy)]
struct Axis {
    base: f64,
    delta: f64,
    count: usize,
}

impl Axis {
    /// Splits `[lo, hi]` into `cells` cells, halving the count while a cell
    /// would be narrower than `tol`.
    fn new(lo: f64, hi: f64, cells: usize, tol: f64) -> Self {
        let extent = hi - lo;
        let mut count = cells.max(1);
        #[allow(clippy::cast_precision_loss)]
        while count > 1 && extent / (count as f64) < tol {
            count /= 2;
        }
        #[allow(clippy::cast_precision_loss)]
        let delta = extent / count as f64;
        Self { base: lo, delta, count }
    }

    #[allow(clippy::cast_precision_loss)]
    fn edge(&self, i: usize) -> f64 {
        self.base + i as f64 * self.delta
    }

    /// Cell containing `value`, clamped to the grid.
    fn find_index(&self, value: f64) -> usize {
        if self.delta <= 0.0 {
            return 0;
        }
        let (mut lo, mut hi) = (0, self.count);
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if self.edge(mid) <= value {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Cells to search around `value`: its own, widened by one on each side
    /// whose edge lies within `tol`.
    fn find_range(&self, value: f64, tol: f64) -> (usize, usize) {
        let i = self.find_index(value);
        let lo = if i > 0 && value - self.edge(i) <= tol { i - 1 } else { i };
        let hi = if i + 1 < self.count && self.edge(i + 1) - value <= tol {
            i + 1
        } else {
            i
        };
        (lo, hi)
    }
}

#[derive(Debug)]
struct Grid {
    x: Axis,
    y: Axis,
    cells: Vec<Vec<(ElemKey, End)>>,
}

impl Grid {
    fn cell(&self, p: &Point3) -> usize {
        self.y.find_index(p.y) * self.x.count + self.x.find_index(p.x)
    }

    fn insert(&mut self, key: ElemKey, elem: &Elem) {
        let c1 = self.cell(elem.p1());
        let c2 = self.cell(elem.p2());
        if let Some(bucket) = self.cells.get_mut(c1) {
            bucket.push((key, End::Start));
        }
        if let Some(bucket) = self.cells.get_mut(c2) {
            bucket.push((key, End::End));
        }
    }

    fn remove(&mut self, key: ElemKey, elem: &Elem) {
        for c in [self.cell(elem.p1()), self.cell(elem.p2())] {
            if let Some(bucket) = self.cells.get_mut(c) {
                bucket.retain(|(k, _)| *k != key);
            }
        }
    }
}

/// A chain extracted by [`ElemSort::next_chain`].
#[derive(Debug, Clone)]
pub struct SortedChain {
    pub elems: ElemList,
    pub closed: bool,
}

/// Grid-bucketed chaining of unordered elements.
///
/// Every element is registered in the grid cells of both of its ends.
/// [`next_chain`](Self::next_chain) then extracts one maximal chain per call, always
/// continuing with the nearest free end within tolerance.
#[derive(Debug)]
pub struct ElemSort {
    work: ElemList,
    grid: Option<Grid>,
    tol: f64,
}

impl ElemSort {
    /// Prepares `elems` for chaining with matching tolerance `tol`.
    ///
    /// Closed single-element loops come first; those shorter than
    /// `IDENT_DIST` are dropped.
    #[must_use]
    pub fn new(elems: impl IntoIterator<Item = Elem>, tol: f64) -> Self {
        Self::with_grid_size(elems, tol, ELEM_SEARCH_SIZE)
    }

    /// Like [`new`](Self::new) with `cells` grid cells per axis.
    #[must_use]
    #[instrument(skip(elems), level = "debug")]
    pub fn with_grid_size(elems: impl IntoIterator<Item = Elem>, tol: f64, cells: usize) -> Self {
        let mut loops = Vec::new();
        let mut rest = Vec::new();
        let mut dropped = 0_usize;
        for e in elems {
            if e.is_closed_xy() {
                if e.len() < IDENT_DIST {
                    dropped += 1;
                } else {
                    loops.push(e);
                }
            } else {
                rest.push(e);
            }
        }
        if dropped > 0 {
            warn!(dropped, "dropped degenerate closed elements");
        }

        let work: ElemList = loops.into_iter().chain(rest).collect();
        let rect = work.rect();
        let grid = rect.is_valid().then(|| {
            let x = Axis::new(rect.ll().x, rect.ur().x, cells, tol);
            let y = Axis::new(rect.ll().y, rect.ur().y, cells, tol);
            let mut grid = Grid {
                x,
                y,
                cells: vec![Vec::new(); x.count * y.count],
            };
            for (k, e) in &work {
                grid.insert(k, e);
            }
            debug!(nx = x.count, ny = y.count, elems = work.len(), "built chaining grid");
            grid
        });

        Self { work, grid, tol }
    }

    /// Number of elements not yet chained.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.work.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.work.is_empty()
    }

    /// Free element end nearest to `p` within tolerance.
    fn best_match(&self, p: &Point3) -> Option<(ElemKey, End, f64)> {
        let grid = self.grid.as_ref()?;
        let (x0, x1) = grid.x.find_range(p.x, self.tol);
        let (y0, y1) = grid.y.find_range(p.y, self.tol);
        let mut best: Option<(ElemKey, End, f64)> = None;
        for iy in y0..=y1 {
            for ix in x0..=x1 {
                let Some(bucket) = grid.cells.get(iy * grid.x.count + ix) else {
                    continue;
                };
                for &(key, end) in bucket {
                    let Some(e) = self.work.get(key) else {
                        continue;
                    };
                    let q = match end {
                        End::Start => e.p1(),
                        End::End => e.p2(),
                    };
                    let d = dist_xy(p, q);
                    if d <= self.tol && best.is_none_or(|(_, _, bd)| d < bd) {
                        best = Some((key, end, d));
                    }
                }
            }
        }
        best
    }

    fn take(&mut self, key: ElemKey) -> Option<Elem> {
        let elem = self.work.remove(key)?;
        if let Some(grid) = self.grid.as_mut() {
            grid.remove(key, &elem);
        }
        Some(elem)
    }

    /// Extracts the next chain, or `None` once every element is used.
    ///
    /// The chain is grown forward from the first remaining element and then
    /// backward from its start. Growth stops at a closure: the open end is
    /// within tolerance of the start and no farther from it than from the
    /// best continuation. Ties close the loop.
    #[instrument(skip(self), level = "trace", fields(remaining = self.work.len()))]
    pub fn next_chain(&mut self) -> Option<SortedChain> {
        let seed_key = self.work.first()?;
        let seed = self.take(seed_key)?;
        let start = *seed.p1();
        let mut elems = ElemList::new();
        elems.push_back(seed);
        let mut closed = false;

        loop {
            let Some(tail) = elems.last().and_then(|k| elems.get(k)).map(|e| *e.p2()) else {
                break;
            };
            let close_d = dist_xy(&tail, &start);
            let best = self.best_match(&tail);
            if close_d <= self.tol && best.is_none_or(|(_, _, d)| close_d <= d) {
                closed = true;
                break;
            }
            let Some((key, end, _)) = best else {
                break;
            };
            let Some(mut e) = self.take(key) else {
                break;
            };
            if end == End::End {
                e.reverse();
            }
            elems.push_back(e);
        }

        if !closed {
            loop {
                let Some(head) = elems.first().and_then(|k| elems.get(k)).map(|e| *e.p1()) else {
                    break;
                };
                let Some((key, end, _)) = self.best_match(&head) else {
                    break;
                };
                let Some(mut e) = self.take(key) else {
                    break;
                };
                if end == End::Start {
                    e.reverse();
                }
                elems.push_front(e);
            }
        }

        trace!(len = elems.len(), closed, "extracted chain");
        Some(SortedChain { elems, closed })
    }
}

impl Iterator for ElemSort {
    type Item = SortedChain;

    fn next(&mut self) -> Option<SortedChain> {
        self.next_chain()
    }
}
