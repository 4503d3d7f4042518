use crate::math::distance_2d::{line_signed_dist, segment_foot_param};
use crate::math::{dist_xy, Point3, RectAx, Vector3, ACCURACY, IDENT_DIST};

/// Drawing style carried by line elements. Passthrough data only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

impl LineStyle {
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Solid => 0,
            Self::Dashed => 1,
            Self::Dotted => 2,
            Self::DashDot => 3,
        }
    }

    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Solid),
            1 => Some(Self::Dashed),
            2 => Some(Self::Dotted),
            3 => Some(Self::DashDot),
            _ => None,
        }
    }
}

/// A straight segment between two 3D points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeg {
    p1: Point3,
    p2: Point3,
    reversed: bool,
    style: LineStyle,
}

impl LineSeg {
    #[must_use]
    pub fn new(p1: Point3, p2: Point3) -> Self {
        Self {
            p1,
            p2,
            reversed: false,
            style: LineStyle::default(),
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn p1(&self) -> &Point3 {
        &self.p1
    }

    #[must_use]
    pub fn p2(&self) -> &Point3 {
        &self.p2
    }

    /// `true` when the segment runs opposite to the direction it was created with.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    #[must_use]
    pub fn style(&self) -> LineStyle {
        self.style
    }

    pub fn set_style(&mut self, style: LineStyle) {
        self.style = style;
    }

    pub(crate) fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    pub(super) fn len(&self) -> f64 {
        (self.p2 - self.p1).norm()
    }

    pub(super) fn len_xy(&self) -> f64 {
        dist_xy(&self.p1, &self.p2)
    }

    pub(super) fn rect(&self) -> RectAx {
        RectAx::new(self.p1, self.p2)
    }

    /// Point at fraction `t` along the segment; values outside `[0, 1]` extend it.
    pub(super) fn point_at(&self, t: f64) -> Point3 {
        self.p1 + (self.p2 - self.p1) * t
    }

    pub(super) fn dir_xy(&self) -> Option<Vector3> {
        let d = Vector3::new(self.p2.x - self.p1.x, self.p2.y - self.p1.y, 0.0);
        let n = d.norm();
        (n >= ACCURACY).then(|| d / n)
    }

    pub(super) fn reverse(&mut self) {
        std::mem::swap(&mut self.p1, &mut self.p2);
        self.reversed = !self.reversed;
    }

    /// Fraction of the XY foot of `p`, clamped to the segment unless `strict`
    /// rejects it for falling more than `tol` beyond an end.
    pub(super) fn project_param_xy(&self, p: &Point3, tol: f64, strict: bool) -> Option<f64> {
        let Some(t) = segment_foot_param(p, &self.p1, &self.p2) else {
            return Some(0.0);
        };
        if strict {
            let t_tol = tol / self.len_xy().max(ACCURACY);
            if t < -t_tol || t > 1.0 + t_tol {
                return None;
            }
        }
        Some(t.clamp(0.0, 1.0))
    }

    pub(super) fn carrier_dist_xy(&self, p: &Point3) -> f64 {
        line_signed_dist(p, &self.p1, &self.p2).abs()
    }

    /// Moves one end to `(x, y)`, keeping its Z.
    ///
    /// With `check`, refuses to collapse the segment in XY or flip its direction.
    pub(super) fn stretched(&self, at_start: bool, x: f64, y: f64, check: bool) -> Option<Self> {
        let mut out = self.clone();
        let end = if at_start { &mut out.p1 } else { &mut out.p2 };
        end.x = x;
        end.y = y;
        if check && self.len_xy() >= IDENT_DIST {
            let (Some(old), Some(new)) = (self.dir_xy(), out.dir_xy()) else {
                return None;
            };
            if out.len_xy() < IDENT_DIST || old.dot(&new) <= 0.0 {
                return None;
            }
        }
        Some(out)
    }
}
