use crate::geometry::Elem;
use crate::math::dist_sq_xy;
use crate::topology::ElemList;

/// Checks that each element ends where the next one starts, within `tol` in XY.
///
/// With `must_be_closed`, the last element must also end at the first
/// element's start. A lone full circle is closed. An empty list is only
/// accepted as an open chain.
#[must_use]
pub fn is_contiguous(list: &ElemList, must_be_closed: bool, tol: f64) -> bool {
    let tol_sq = tol * tol;
    let (Some(first), Some(last)) = (list.first(), list.last()) else {
        return !must_be_closed;
    };
    if list.len() == 1 && list.get(first).is_some_and(Elem::is_full_circle) {
        return true;
    }

    let mut prev: Option<&Elem> = None;
    for e in list.elems() {
        if let Some(p) = prev {
            if dist_sq_xy(p.p2(), e.p1()) > tol_sq {
                return false;
            }
        }
        prev = Some(e);
    }

    if must_be_closed {
        let (Some(f), Some(l)) = (list.get(first), list.get(last)) else {
            return false;
        };
        return dist_sq_xy(l.p2(), f.p1()) <= tol_sq;
    }
    true
}
