use tracing::{debug, instrument};

use crate::geometry::Elem;
use crate::topology::{ElemKey, ElemList};

#[derive(Debug, Clone, Copy)]
enum Pass {
    Forward,
    Backward,
}

/// Removes short elements that merely continue a longer neighbour.
///
/// An element is removed when its XY length is below both `max_len` and the
/// length of the neighbour it is compared against (the next one on the
/// forward pass, the previous one on the backward pass), and its midpoint
/// and outer end lie within `max_dist` of that neighbour's carrier. The two
/// surviving neighbours are stretched to meet at the removed element's
/// midpoint; if either stretch is refused the element stays. Only elements
/// with both neighbours are candidates, so the ends of an open chain are
/// kept. Passes repeat until nothing changes.
///
/// Returns `true` if any element was removed.
#[instrument(skip(list), level = "debug", fields(len = list.len()))]
pub fn remove_short_elems(list: &mut ElemList, closed: bool, max_len: f64, max_dist: f64) -> bool {
    let start_par = list.first().and_then(|k| list.get(k)).map_or(0.0, Elem::bpar);
    let mut removed = 0_usize;
    loop {
        let n = run_pass(list, closed, max_len, max_dist, Pass::Forward)
            + run_pass(list, closed, max_len, max_dist, Pass::Backward);
        if n == 0 {
            break;
        }
        removed += n;
    }
    if removed > 0 {
        list.renumber(start_par);
        debug!(removed, "removed short elements");
    }
    removed > 0
}

fn neighbours(list: &ElemList, key: ElemKey, closed: bool) -> Option<(ElemKey, ElemKey)> {
    let prev = list.prev(key).or_else(|| if closed { list.last() } else { None })?;
    let next = list.next(key).or_else(|| if closed { list.first() } else { None })?;
    (prev != key && next != key && prev != next).then_some((prev, next))
}

fn run_pass(list: &mut ElemList, closed: bool, max_len: f64, max_dist: f64, pass: Pass) -> usize {
    let keys: Vec<ElemKey> = match pass {
        Pass::Forward => list.keys().collect(),
        Pass::Backward => list.keys().rev().collect(),
    };
    let mut removed = 0;
    for key in keys {
        if list.len() < 3 {
            break;
        }
        let Some((prev_key, next_key)) = neighbours(list, key, closed) else {
            continue;
        };
        let (Some(cur), Some(prev), Some(next)) = (list.get(key), list.get(prev_key), list.get(next_key)) else {
            continue;
        };

        let (guide, outer) = match pass {
            Pass::Forward => (next, cur.p1()),
            Pass::Backward => (prev, cur.p2()),
        };
        let mid = cur.mid_point();
        let short = cur.len_xy() < max_len && cur.len_xy() < guide.len_xy();
        if !short || guide.dist_to_carrier_xy(&mid) > max_dist || guide.dist_to_carrier_xy(outer) > max_dist {
            continue;
        }

        let mut new_prev = prev.clone();
        let mut new_next = next.clone();
        if !new_prev.stretch_p2_xy(&mid, true) || !new_next.stretch_p1_xy(&mid, true) {
            continue;
        }
        if let Some((p, n)) = list.pair_mut(prev_key, next_key) {
            *p = new_prev;
            *n = new_next;
        }
        list.remove(key);
        removed += 1;
    }
    removed
}
