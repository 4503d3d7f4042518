//! Property-based tests for element, chaining and index invariants.

use std::f64::consts::TAU;

use proptest::prelude::*;

use geocont::geometry::Elem;
use geocont::math::{Point3, RectAx};
use geocont::operations::chain::{is_contiguous, ElemSort};
use geocont::operations::query::ElemRectList;
use geocont::topology::{ContClsd, Contour, ElemList};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_point() -> impl Strategy<Value = Point3> {
    (-1000.0f64..1000.0, -1000.0f64..1000.0, -100.0f64..100.0).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

fn arb_rect() -> impl Strategy<Value = RectAx> {
    (arb_point(), arb_point()).prop_map(|(a, b)| RectAx::new(a, b))
}

/// Line or arc through two random points.
fn arb_elem() -> impl Strategy<Value = Elem> {
    (arb_point(), arb_point(), 0.05f64..2.0, any::<bool>(), any::<bool>()).prop_map(|(a, b, bulge, cw, line)| {
        if line {
            Elem::line(a, b)
        } else {
            Elem::from_bulge(a, b, if cw { -bulge } else { bulge })
        }
    })
}

/// Polyline vertices strictly increasing in X, so no two vertices are close.
fn arb_polyline() -> impl Strategy<Value = Vec<Point3>> {
    prop::collection::vec((1.0f64..5.0, -10.0f64..10.0), 2..12).prop_map(|steps| {
        let mut x = 0.0;
        let mut pts = vec![Point3::new(0.0, 0.0, 0.0)];
        for (dx, y) in steps {
            x += dx;
            pts.push(Point3::new(x, y, 0.0));
        }
        pts
    })
}

/// Lines joining `pts`, each end nudged by up to `jitter`, shuffled and with
/// random directions.
fn scrambled(
    pts: Vec<Point3>,
    closed: bool,
    jitter: f64,
) -> impl Strategy<Value = Vec<Elem>> {
    let n = if closed { pts.len() } else { pts.len() - 1 };
    (
        Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
        prop::collection::vec(any::<bool>(), n),
        prop::collection::vec((-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0), n),
    )
        .prop_map(move |(order, flips, nudges)| {
            order
                .iter()
                .map(|&i| {
                    let a = pts[i];
                    let b = pts[(i + 1) % pts.len()];
                    let (ax, ay, bx, by) = nudges[i];
                    let mut e = Elem::line(
                        Point3::new(a.x + ax * jitter, a.y + ay * jitter, a.z),
                        Point3::new(b.x + bx * jitter, b.y + by * jitter, b.z),
                    );
                    if flips[i] {
                        e.reverse();
                    }
                    e
                })
                .collect()
        })
}

const TOL: f64 = 1e-3;

// ---------------------------------------------------------------------------
// RectAx
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn union_is_idempotent(r in arb_rect()) {
        let mut u = r;
        u.union(&r);
        prop_assert_eq!(u, r);
    }

    #[test]
    fn union_point_contains_point(r in arb_rect(), p in arb_point()) {
        let mut u = r;
        u.union_point(&p);
        prop_assert!(u.point_inside(&p, 0.0));
        prop_assert!(u.point_inside(r.ll(), 0.0));
        prop_assert!(u.point_inside(r.ur(), 0.0));
    }
}

// ---------------------------------------------------------------------------
// Elem
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reverse_is_involution(e in arb_elem()) {
        let mut r = e.clone();
        r.reverse();
        prop_assert_eq!(r.p1(), e.p2());
        prop_assert_eq!(r.p2(), e.p1());
        r.reverse();
        prop_assert_eq!(r.geom(), e.geom());
        prop_assert!((r.len() - e.len()).abs() <= 1e-9 * (1.0 + e.len()));
    }

    #[test]
    fn rect_covers_samples(e in arb_elem()) {
        let mut rect = *e.rect();
        rect.expand(1e-6 * (1.0 + e.len()));
        for i in 0..=16 {
            let par = e.begin_par() + e.plen() * f64::from(i) / 16.0;
            prop_assert!(rect.point_inside(&e.at_par(par), 0.0));
        }
    }
}

// ---------------------------------------------------------------------------
// Chaining
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn scrambled_polyline_chains_back(
        elems in arb_polyline().prop_flat_map(|pts| scrambled(pts, false, TOL / 4.0)),
        cells in 1usize..40,
    ) {
        init_tracing();
        let n = elems.len();
        let chains: Vec<_> = ElemSort::with_grid_size(elems, TOL, cells).collect();
        prop_assert_eq!(chains.len(), 1);
        prop_assert!(!chains[0].closed);
        prop_assert_eq!(chains[0].elems.len(), n);
        prop_assert!(is_contiguous(&chains[0].elems, false, TOL));
    }

    #[test]
    fn scrambled_polygon_closes(
        elems in (3usize..12, 1.0f64..100.0).prop_flat_map(|(n, r)| {
            let pts = (0..n)
                .map(|i| {
                    #[allow(clippy::cast_precision_loss)]
                    let a = TAU * i as f64 / n as f64;
                    Point3::new(r * a.cos(), r * a.sin(), 0.0)
                })
                .collect();
            scrambled(pts, true, TOL / 4.0)
        })
    ) {
        let n = elems.len();
        let contours = Contour::build_all(elems, TOL);
        prop_assert_eq!(contours.len(), 1);
        prop_assert!(contours[0].is_closed());
        prop_assert_eq!(contours[0].len(), n);
        prop_assert!(contours[0].is_contiguous(TOL));

        let c = ContClsd::new(contours[0].clone(), TOL).unwrap();
        let r = contours[0].start_point().map_or(0.0, |p| p.coords.xy().norm());
        #[allow(clippy::cast_precision_loss)]
        let expected = 0.5 * n as f64 * r * r * (TAU / n as f64).sin();
        prop_assert!((c.area() - expected).abs() <= 0.01 * r * n as f64 + 1e-9);
    }
}

// ---------------------------------------------------------------------------
// Range index
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn find_elem_at_par_brackets(pts in arb_polyline(), max_elems in 1usize..6, t in 0.0f64..1.0) {
        let mut list: ElemList = pts.windows(2).map(|w| Elem::line(w[0], w[1])).collect();
        let total = list.renumber(0.0);
        let idx = ElemRectList::build(&list, max_elems, f64::INFINITY);
        let par = total * t;
        let key = idx.find_elem_at_par(&list, par).unwrap();
        prop_assert!(key.is_some());
        let e = list.get(key.unwrap()).unwrap();
        prop_assert!(e.begin_par() <= par + 1e-9);
        prop_assert!(par <= e.end_par() + 1e-9);
    }

    #[test]
    fn ranges_partition_list(pts in arb_polyline(), max_elems in 1usize..6) {
        let mut list: ElemList = pts.windows(2).map(|w| Elem::line(w[0], w[1])).collect();
        list.renumber(0.0);
        let idx = ElemRectList::build(&list, max_elems, f64::INFINITY);
        let covered: usize = idx.ranges().iter().map(|r| r.count()).sum();
        prop_assert_eq!(covered, list.len());
        for r in idx.ranges() {
            prop_assert!(r.count() <= max_elems);
            let mut expect = RectAx::empty();
            for k in r.keys(&list) {
                expect.union(list.get(k).unwrap().rect());
            }
            prop_assert_eq!(&expect, r.rect());
        }
    }

    #[test]
    fn reversed_contour_negates_area(pts in arb_polyline()) {
        let mut c: Contour = pts.windows(2).map(|w| Elem::line(w[0], w[1])).collect();
        let before = c.signed_area();
        c.reverse();
        prop_assert!((c.signed_area() + before).abs() <= 1e-9 * (1.0 + before.abs()));
    }
}
