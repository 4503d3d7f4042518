use std::collections::VecDeque;

use tracing::debug;

use crate::geometry::Elem;
use crate::math::{dist_sq_xy, Point3};
use crate::topology::ElemList;

/// Where a candidate attaches to the chain being grown.
enum Attach {
    Back { reverse: bool },
    Front { reverse: bool },
}

/// Reorders `list` in place into contiguous runs, first-fit.
///
/// Each run grows from the first remaining element. For every remaining
/// element in scan order, its ends are compared with the open ends of the
/// run; the first element with an end within `tol` is attached, reversed
/// when only its far end matches. No attempt is made to pick the closest
/// candidate. A run is sealed once nothing attaches or it closes on itself.
/// Full circles are never chained and are moved to the end, one run each.
///
/// Returns the number of elements in each run, in order.
pub fn sort_first_fit(list: &mut ElemList, tol: f64) -> Vec<usize> {
    let tol_sq = tol * tol;
    let mut pool: Vec<Elem> = Vec::with_capacity(list.len());
    let mut circles: Vec<Elem> = Vec::new();
    while let Some(e) = list.pop_front() {
        if e.is_full_circle() {
            circles.push(e);
        } else {
            pool.push(e);
        }
    }

    let near = |a: &Point3, b: &Point3| dist_sq_xy(a, b) <= tol_sq;
    let mut runs = Vec::new();

    while !pool.is_empty() {
        let mut run = VecDeque::from([pool.remove(0)]);
        loop {
            let (Some(front), Some(back)) = (run.front(), run.back()) else {
                break;
            };
            let (head, tail) = (*front.p1(), *back.p2());
            if near(&head, &tail) {
                break;
            }

            let found = pool.iter().enumerate().find_map(|(i, e)| {
                let attach = if near(e.p1(), &tail) {
                    Attach::Back { reverse: false }
                } else if near(e.p2(), &tail) {
                    Attach::Back { reverse: true }
                } else if near(e.p2(), &head) {
                    Attach::Front { reverse: false }
                } else if near(e.p1(), &head) {
                    Attach::Front { reverse: true }
                } else {
                    return None;
                };
                Some((i, attach))
            });

            let Some((i, attach)) = found else {
                break;
            };
            let mut e = pool.remove(i);
            match attach {
                Attach::Back { reverse } => {
                    if reverse {
                        e.reverse();
                    }
                    run.push_back(e);
                }
                Attach::Front { reverse } => {
                    if reverse {
                        e.reverse();
                    }
                    run.push_front(e);
                }
            }
        }
        runs.push(run.len());
        list.extend(run);
    }

    for c in circles {
        runs.push(1);
        list.push_back(c);
    }
    debug!(runs = runs.len(), elems = list.len(), "first-fit sort finished");
    runs
}
