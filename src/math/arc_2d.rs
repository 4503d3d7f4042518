/// 2D circular-arc math.
///
/// Bulge convention: `bulge = tan(sweep_angle / 4)`.
/// - `bulge > 0`: counter-clockwise arc
/// - `bulge < 0`: clockwise arc
/// - `|bulge| = 1`: semicircle
use std::f64::consts::{PI, TAU};

use super::{Point3, Vector3, ACCURACY, TOLERANCE};

/// A circular arc in the XY plane in center/angle form.
///
/// `sweep` is signed: positive for counter-clockwise. The arc covers
/// angles `start_angle ..= start_angle + sweep`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularArc {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

impl CircularArc {
    /// Converts a bulge-defined arc from `p0` to `p1` to center/angle form.
    ///
    /// Returns `None` for a zero-length chord or a zero bulge (straight segment).
    #[must_use]
    pub fn from_bulge(p0: &Point3, p1: &Point3, bulge: f64) -> Option<Self> {
        let dx = p1.x - p0.x;
        let dy = p1.y - p0.y;
        let chord = dx.hypot(dy);
        if chord < ACCURACY || bulge.abs() < ACCURACY {
            return None;
        }

        // Offset of the center from the chord midpoint, along the left normal.
        let sagitta_ratio = (1.0 - bulge * bulge) / (2.0 * bulge);
        let half = chord * 0.5;
        let cx = (p0.x + p1.x) * 0.5 - sagitta_ratio * half * dy / chord;
        let cy = (p0.y + p1.y) * 0.5 + sagitta_ratio * half * dx / chord;

        let radius = half * (1.0 + bulge * bulge) / (2.0 * bulge.abs());
        let start_angle = (p0.y - cy).atan2(p0.x - cx);

        Some(Self {
            cx,
            cy,
            radius,
            start_angle,
            sweep: 4.0 * bulge.atan(),
        })
    }

    /// Builds an arc from its endpoints and center, sweeping in the given direction.
    ///
    /// Coincident endpoints give a full turn.
    #[must_use]
    pub fn from_center(p0: &Point3, p1: &Point3, center: &Point3, ccw: bool) -> Self {
        let a0 = (p0.y - center.y).atan2(p0.x - center.x);
        let a1 = (p1.y - center.y).atan2(p1.x - center.x);
        let full = super::dist_sq_xy(p0, p1) <= super::IDENT_DIST * super::IDENT_DIST;
        let sweep = if full {
            if ccw {
                TAU
            } else {
                -TAU
            }
        } else {
            sweep_between(a0, a1, ccw)
        };
        Self {
            cx: center.x,
            cy: center.y,
            radius: (p0.x - center.x).hypot(p0.y - center.y),
            start_angle: a0,
            sweep,
        }
    }

    #[must_use]
    pub fn is_ccw(&self) -> bool {
        self.sweep > 0.0
    }

    #[must_use]
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }

    /// Bulge of this arc.
    #[must_use]
    pub fn bulge(&self) -> f64 {
        (self.sweep / 4.0).tan()
    }

    /// Point at fraction `t` in `[0, 1]` of the sweep.
    #[must_use]
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let angle = self.start_angle + self.sweep * t;
        (
            self.cx + self.radius * angle.cos(),
            self.cy + self.radius * angle.sin(),
        )
    }

    /// Unit tangent at fraction `t`, pointing in the direction of travel.
    #[must_use]
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        let angle = self.start_angle + self.sweep * t;
        let sign = if self.sweep >= 0.0 { 1.0 } else { -1.0 };
        Vector3::new(-sign * angle.sin(), sign * angle.cos(), 0.0)
    }

    /// Fraction in `[0, 1]` of the sweep at which the ray from the center at
    /// `angle` meets the arc, or `None` if the angle falls outside the arc
    /// by more than `eps` radians.
    #[must_use]
    pub fn param_of_angle(&self, angle: f64, eps: f64) -> Option<f64> {
        if self.sweep.abs() < ACCURACY {
            return None;
        }
        let mut delta = angle - self.start_angle;
        if self.sweep > 0.0 {
            while delta < -eps {
                delta += TAU;
            }
            while delta > TAU + eps {
                delta -= TAU;
            }
        } else {
            while delta > eps {
                delta -= TAU;
            }
            while delta < -TAU - eps {
                delta += TAU;
            }
        }
        let t = delta / self.sweep;
        let t_eps = eps / self.sweep.abs();
        if t >= -t_eps && t <= 1.0 + t_eps {
            Some(t.clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// Signed sweep from angle `a0` to `a1` travelling in the given direction,
/// in `(0, 2π]` for CCW and `[-2π, 0)` for CW. Equal angles give a full turn.
#[must_use]
pub fn sweep_between(a0: f64, a1: f64, ccw: bool) -> f64 {
    let mut sweep = (a1 - a0) % TAU;
    if ccw {
        if sweep <= TOLERANCE {
            sweep += TAU;
        }
    } else if sweep >= -TOLERANCE {
        sweep -= TAU;
    }
    sweep
}

/// Number of chords needed to approximate an arc within `tolerance`.
///
/// Derived from the sagitta `s = r * (1 - cos(θ/2))`.
#[must_use]
pub fn subdivision_count(radius: f64, abs_sweep: f64, tolerance: f64) -> u32 {
    if radius < ACCURACY || abs_sweep < ACCURACY || tolerance <= 0.0 {
        return 1;
    }
    let max_angle = if tolerance >= radius {
        PI
    } else {
        2.0 * (1.0 - tolerance / radius).acos()
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = (abs_sweep / max_angle).ceil() as u32;
    n.max(1)
}
