use crate::geometry::ElemHit;
use crate::topology::{ElemKey, ElemList};

use super::ElemRectList;

/// A crossing between two chains, with the elements involved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainHit {
    pub key_a: ElemKey,
    pub key_b: ElemKey,
    pub hit: ElemHit,
}

/// XY crossings between chains `a` and `b`, using their range indexes to
/// skip pairs of ranges whose boxes are apart.
///
/// Hits are ordered by parameter along `a`. Crossings found twice at a
/// shared element end (within `eps` on both chains) are reported once.
#[must_use]
pub fn intersect_chains(a: &ElemList, ia: &ElemRectList, b: &ElemList, ib: &ElemRectList, eps: f64) -> Vec<ChainHit> {
    let mut hits = Vec::new();
    for ra in ia.ranges() {
        for rb in ib.ranges() {
            if !ra.rect().intersects_xy(rb.rect(), eps) {
                continue;
            }
            for ka in a.keys_from(ra.first()).take(ra.count()) {
                let Some(ea) = a.get(ka) else {
                    continue;
                };
                for kb in b.keys_from(rb.first()).take(rb.count()) {
                    let Some(eb) = b.get(kb) else {
                        continue;
                    };
                    hits.extend(ea.intersect_xy(eb, eps).into_iter().map(|hit| ChainHit {
                        key_a: ka,
                        key_b: kb,
                        hit,
                    }));
                }
            }
        }
    }
    hits.sort_by(|x, y| x.hit.par_a.total_cmp(&y.hit.par_a));
    hits.dedup_by(|x, y| (x.hit.par_a - y.hit.par_a).abs() <= eps && (x.hit.par_b - y.hit.par_b).abs() <= eps);
    hits
}
