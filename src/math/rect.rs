use super::Point3;

/// An axis-aligned box with an explicit validity flag.
///
/// An invalid box is the empty box: it becomes a copy of whatever is
/// unioned into it. `ll()`/`ur()` must only be read from a valid box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectAx {
    ll: Point3,
    ur: Point3,
    valid: bool,
}

impl Default for RectAx {
    fn default() -> Self {
        Self::empty()
    }
}

/// Axis quadrant of a point relative to a circle center, numbered CCW from +X/+Y.
fn quadrant(p: &Point3, center: &Point3) -> usize {
    match (p.x >= center.x, p.y >= center.y) {
        (true, true) => 0,
        (false, true) => 1,
        (false, false) => 2,
        (true, false) => 3,
    }
}

impl RectAx {
    /// Returns the empty (invalid) box.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ll: Point3::origin(),
            ur: Point3::origin(),
            valid: false,
        }
    }

    /// Creates a valid box spanning two corner points in any order.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        let mut r = Self {
            ll: a,
            ur: b,
            valid: true,
        };
        r.order();
        r
    }

    /// Creates a zero-size box around a single point.
    #[must_use]
    pub fn from_point(p: Point3) -> Self {
        Self {
            ll: p,
            ur: p,
            valid: true,
        }
    }

    /// Creates the tightest box around a point sequence, empty for no points.
    #[must_use]
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut r = Self::empty();
        for p in points {
            r.union_point(p);
        }
        r
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Lower-left corner. Only meaningful on a valid box.
    #[must_use]
    pub fn ll(&self) -> &Point3 {
        debug_assert!(self.valid, "ll() on an invalid RectAx");
        &self.ll
    }

    /// Upper-right corner. Only meaningful on a valid box.
    #[must_use]
    pub fn ur(&self) -> &Point3 {
        debug_assert!(self.valid, "ur() on an invalid RectAx");
        &self.ur
    }

    /// Swaps bounds per axis so that `ll <= ur` holds.
    pub fn order(&mut self) {
        if self.ll.x > self.ur.x {
            std::mem::swap(&mut self.ll.x, &mut self.ur.x);
        }
        if self.ll.y > self.ur.y {
            std::mem::swap(&mut self.ll.y, &mut self.ur.y);
        }
        if self.ll.z > self.ur.z {
            std::mem::swap(&mut self.ll.z, &mut self.ur.z);
        }
    }

    /// Grows this box to cover `other`. An invalid `self` becomes a copy of `other`.
    pub fn union(&mut self, other: &RectAx) {
        if !other.valid {
            return;
        }
        if !self.valid {
            *self = *other;
            return;
        }
        self.ll.x = self.ll.x.min(other.ll.x);
        self.ll.y = self.ll.y.min(other.ll.y);
        self.ll.z = self.ll.z.min(other.ll.z);
        self.ur.x = self.ur.x.max(other.ur.x);
        self.ur.y = self.ur.y.max(other.ur.y);
        self.ur.z = self.ur.z.max(other.ur.z);
    }

    /// Returns the union of two boxes without modifying either.
    #[must_use]
    pub fn united(&self, other: &RectAx) -> RectAx {
        let mut r = *self;
        r.union(other);
        r
    }

    /// Grows this box to cover a point.
    pub fn union_point(&mut self, p: &Point3) {
        self.union(&Self::from_point(*p));
    }

    /// Pads every side by `extra`.
    pub fn expand(&mut self, extra: f64) {
        if !self.valid {
            return;
        }
        self.ll.x -= extra;
        self.ll.y -= extra;
        self.ll.z -= extra;
        self.ur.x += extra;
        self.ur.y += extra;
        self.ur.z += extra;
        self.order();
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        if self.valid {
            self.ur.x - self.ll.x
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        if self.valid {
            self.ur.y - self.ll.y
        } else {
            0.0
        }
    }

    /// Area of the XY footprint; zero for an invalid box.
    #[must_use]
    pub fn area_xy(&self) -> f64 {
        self.width() * self.height()
    }

    /// Separating-axis overlap test in XY.
    ///
    /// `extra_edge` pads each side of both boxes, so two boxes up to
    /// `2 * extra_edge` apart still intersect.
    #[must_use]
    pub fn intersects_xy(&self, other: &RectAx, extra_edge: f64) -> bool {
        if !self.valid || !other.valid {
            return false;
        }
        let slack = 2.0 * extra_edge;
        !(self.ll.x - slack > other.ur.x
            || self.ur.x + slack < other.ll.x
            || self.ll.y - slack > other.ur.y
            || self.ur.y + slack < other.ll.y)
    }

    /// Separating-axis overlap test in all three axes, padded like [`Self::intersects_xy`].
    #[must_use]
    pub fn intersects(&self, other: &RectAx, extra_edge: f64) -> bool {
        if !self.intersects_xy(other, extra_edge) {
            return false;
        }
        let slack = 2.0 * extra_edge;
        !(self.ll.z - slack > other.ur.z || self.ur.z + slack < other.ll.z)
    }

    /// Tests whether `p` lies within the XY bounds padded by `extra_edge`.
    #[must_use]
    pub fn point_inside_xy(&self, p: &Point3, extra_edge: f64) -> bool {
        self.valid
            && p.x >= self.ll.x - extra_edge
            && p.x <= self.ur.x + extra_edge
            && p.y >= self.ll.y - extra_edge
            && p.y <= self.ur.y + extra_edge
    }

    /// Tests whether `p` lies within the bounds padded by `extra_edge` in all axes.
    #[must_use]
    pub fn point_inside(&self, p: &Point3, extra_edge: f64) -> bool {
        self.point_inside_xy(p, extra_edge)
            && p.z >= self.ll.z - extra_edge
            && p.z <= self.ur.z + extra_edge
    }

    /// XY distance from `p` to the box: zero inside, otherwise distance to
    /// the nearest edge or corner. Infinite for an invalid box.
    #[must_use]
    pub fn distance_to_xy(&self, p: &Point3) -> f64 {
        if !self.valid {
            return f64::INFINITY;
        }
        let dx = (self.ll.x - p.x).max(0.0).max(p.x - self.ur.x);
        let dy = (self.ll.y - p.y).max(0.0).max(p.y - self.ur.y);
        dx.hypot(dy)
    }

    /// Tight bounding box of a circular arc given by its endpoints and center.
    ///
    /// The arc is swept CCW from `start` to `end` (the endpoints are swapped
    /// for clockwise arcs). The quadrants of both endpoints select which axis
    /// extremes of the circle the arc passes; only those extremes are added
    /// to the endpoints. Coincident endpoints are taken as a full circle.
    /// Z spans the two endpoint heights.
    #[must_use]
    pub fn around_arc(start: &Point3, end: &Point3, center: &Point3, is_ccw: bool) -> RectAx {
        let (s, e) = if is_ccw { (start, end) } else { (end, start) };
        let radius = (s.x - center.x).hypot(s.y - center.y);

        let mut r = RectAx::new(*s, *e);

        // Extreme crossed when leaving quadrant i in CCW order: +Y, -X, -Y, +X.
        let extremes = [
            (center.x, center.y + radius),
            (center.x - radius, center.y),
            (center.x, center.y - radius),
            (center.x + radius, center.y),
        ];

        let qs = quadrant(s, center);
        let qe = quadrant(e, center);
        let crossings = if qs == qe {
            let vs = s - center;
            let ve = e - center;
            let cross = vs.x * ve.y - vs.y * ve.x;
            let coincident = super::dist_sq_xy(s, e) <= super::IDENT_DIST * super::IDENT_DIST;
            if coincident || cross < 0.0 {
                4
            } else {
                0
            }
        } else {
            (qe + 4 - qs) % 4
        };

        for k in 0..crossings {
            let (x, y) = extremes[(qs + k) % 4];
            r.ll.x = r.ll.x.min(x);
            r.ll.y = r.ll.y.min(y);
            r.ur.x = r.ur.x.max(x);
            r.ur.y = r.ur.y.max(y);
        }
        r
    }
}
