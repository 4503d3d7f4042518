use crate::geometry::{ArcSeg, Elem, ElemGeom};
use crate::math::{Point2, Point3, ACCURACY};

/// Area integrals of a closed boundary, accumulated edge by edge with
/// Green's theorem.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    /// ∬ 1
    a: f64,
    /// ∬ x
    sx: f64,
    /// ∬ y
    sy: f64,
    /// ∬ y²
    ixx: f64,
    /// ∬ x²
    iyy: f64,
    /// ∬ xy
    ixy: f64,
}

impl Moments {
    fn add_line(&mut self, p0: &Point3, p1: &Point3) {
        let (x0, y0, x1, y1) = (p0.x, p0.y, p1.x, p1.y);
        let (dx, dy) = (x1 - x0, y1 - y0);
        self.a += 0.5 * (x0 * y1 - x1 * y0);
        self.sx += dy * (x0 * x0 + x0 * x1 + x1 * x1) / 6.0;
        self.sy -= dx * (y0 * y0 + y0 * y1 + y1 * y1) / 6.0;
        self.iyy += dy * (x0 * x0 * x0 + x0 * x0 * x1 + x0 * x1 * x1 + x1 * x1 * x1) / 12.0;
        self.ixx -= dx * (y0 * y0 * y0 + y0 * y0 * y1 + y0 * y1 * y1 + y1 * y1 * y1) / 12.0;
        // ∮ x²y/2 dy along x = x0 + t·dx, y = y0 + t·dy.
        let poly = x0 * x0 * y0
            + (x0 * x0 * dy + 2.0 * x0 * dx * y0) / 2.0
            + (2.0 * x0 * dx * dy + dx * dx * y0) / 3.0
            + dx * dx * dy / 4.0;
        self.ixy += 0.5 * dy * poly;
    }

    fn add_arc(&mut self, arc: &ArcSeg) {
        let (cx, cy, r) = (arc.center().x, arc.center().y, arc.radius());
        let f0 = Trig::at(arc.start_angle());
        let f1 = Trig::at(arc.end_angle());
        let d = |f: fn(&Trig) -> f64| f(&f1) - f(&f0);

        let (u, v) = (d(Trig::u), d(Trig::v));
        let (uu, vv) = (d(Trig::uu), d(Trig::vv));
        let (uuu, vvv) = (d(Trig::uuu), d(Trig::vvv));
        let (uuuu, vvvv) = (d(Trig::uuuu), d(Trig::vvvv));
        let (uv, uuv, uuuv) = (d(Trig::uv), d(Trig::uuv), d(Trig::uuuv));
        let theta = arc.sweep();

        self.a += 0.5 * (r * cx * u + r * cy * v + r * r * theta);
        self.sx += 0.5 * r * (cx * cx * u + 2.0 * cx * r * uu + r * r * uuu);
        self.sy += 0.5 * r * (cy * cy * v + 2.0 * cy * r * vv + r * r * vvv);
        self.iyy += r / 3.0 * (cx.powi(3) * u + 3.0 * cx * cx * r * uu + 3.0 * cx * r * r * uuu + r.powi(3) * uuuu);
        self.ixx += r / 3.0 * (cy.powi(3) * v + 3.0 * cy * cy * r * vv + 3.0 * cy * r * r * vvv + r.powi(3) * vvvv);
        self.ixy += 0.5
            * r
            * (cx * cx * cy * u
                + cx * cx * r * uv
                + 2.0 * cx * cy * r * uu
                + 2.0 * cx * r * r * uuv
                + cy * r * r * uuu
                + r.powi(3) * uuuv);
    }
}

/// Antiderivatives over θ of the powers of `u = cos θ` and `v = sin θ`
/// that appear in the arc integrals.
struct Trig {
    t: f64,
    s: f64,
    c: f64,
}

impl Trig {
    fn at(t: f64) -> Self {
        Self {
            t,
            s: t.sin(),
            c: t.cos(),
        }
    }

    fn u(&self) -> f64 {
        self.s
    }

    fn v(&self) -> f64 {
        -self.c
    }

    fn uu(&self) -> f64 {
        self.t / 2.0 + self.s * self.c / 2.0
    }

    fn vv(&self) -> f64 {
        self.t / 2.0 - self.s * self.c / 2.0
    }

    fn uuu(&self) -> f64 {
        self.s - self.s.powi(3) / 3.0
    }

    fn vvv(&self) -> f64 {
        -self.c + self.c.powi(3) / 3.0
    }

    fn uuuu(&self) -> f64 {
        3.0 * self.t / 8.0 + (2.0 * self.t).sin() / 4.0 + (4.0 * self.t).sin() / 32.0
    }

    fn vvvv(&self) -> f64 {
        3.0 * self.t / 8.0 - (2.0 * self.t).sin() / 4.0 + (4.0 * self.t).sin() / 32.0
    }

    fn uv(&self) -> f64 {
        self.s * self.s / 2.0
    }

    fn uuv(&self) -> f64 {
        -self.c.powi(3) / 3.0
    }

    fn uuuv(&self) -> f64 {
        -self.c.powi(4) / 4.0
    }
}

/// Area, centroid and second moments of a closed contour in XY.
///
/// Values are signed: a clockwise boundary yields negative area and
/// moments. `ixx = ∬y²`, `iyy = ∬x²`, `ixy = ∬xy`; the `_c` variants are
/// taken about the centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContInert {
    pub area: f64,
    pub centroid: Point2,
    pub ixx: f64,
    pub iyy: f64,
    pub ixy: f64,
    pub ixx_c: f64,
    pub iyy_c: f64,
    pub ixy_c: f64,
}

impl ContInert {
    /// Integrates over the boundary formed by `elems`, closed by a straight
    /// chord when the last end does not meet the first start.
    pub fn from_elems<'a>(elems: impl IntoIterator<Item = &'a Elem>) -> Self {
        let mut m = Moments::default();
        let mut first: Option<Point3> = None;
        let mut last: Option<Point3> = None;
        for e in elems {
            first.get_or_insert(*e.p1());
            last = Some(*e.p2());
            match e.geom() {
                ElemGeom::Line(l) => m.add_line(l.p1(), l.p2()),
                ElemGeom::Arc(a) => m.add_arc(a),
            }
        }
        if let (Some(f), Some(l)) = (first, last) {
            m.add_line(&l, &f);
        }
        Self::from_moments(&m)
    }

    fn from_moments(m: &Moments) -> Self {
        let centroid = if m.a.abs() < ACCURACY {
            Point2::origin()
        } else {
            Point2::new(m.sx / m.a, m.sy / m.a)
        };
        Self {
            area: m.a,
            centroid,
            ixx: m.ixx,
            iyy: m.iyy,
            ixy: m.ixy,
            ixx_c: m.ixx - m.a * centroid.y * centroid.y,
            iyy_c: m.iyy - m.a * centroid.x * centroid.x,
            ixy_c: m.ixy - m.a * centroid.x * centroid.y,
        }
    }
}
