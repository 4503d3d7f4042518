use std::f64::consts::TAU;

use super::arc_2d::CircularArc;
use super::{cross_xy, Point3, Vector3, ACCURACY};

/// Unclamped parameter of the foot of the perpendicular from `p` onto the
/// line through `a` and `b` (0 at `a`, 1 at `b`), in XY.
///
/// Returns `None` for a zero-length segment.
#[must_use]
pub fn segment_foot_param(p: &Point3, a: &Point3, b: &Point3) -> Option<f64> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < ACCURACY * ACCURACY {
        return None;
    }
    Some(((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq)
}

/// Minimum XY distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let Some(t) = segment_foot_param(p, a, b) else {
        return super::dist_xy(p, a);
    };
    let t = t.clamp(0.0, 1.0);
    let fx = a.x + t * (b.x - a.x);
    let fy = a.y + t * (b.y - a.y);
    (p.x - fx).hypot(p.y - fy)
}

/// Signed XY distance from `p` to the infinite line through `a` and `b`,
/// positive on the left of the direction `a -> b`.
#[must_use]
pub fn line_signed_dist(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let d = Vector3::new(b.x - a.x, b.y - a.y, 0.0);
    let len = d.x.hypot(d.y);
    if len < ACCURACY {
        return super::dist_xy(p, a);
    }
    cross_xy(&d, &Vector3::new(p.x - a.x, p.y - a.y, 0.0)) / len
}

/// Signed angle subtended at `p` by the straight segment `a -> b`.
///
/// Summing this over a closed polygon gives `2π` times its winding number
/// around `p`.
#[must_use]
pub fn subtended_angle(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let va = Vector3::new(a.x - p.x, a.y - p.y, 0.0);
    let vb = Vector3::new(b.x - p.x, b.y - p.y, 0.0);
    cross_xy(&va, &vb).atan2(va.x * vb.x + va.y * vb.y)
}

/// Signed angle subtended at `p` by a circular arc running from `a` to `b`.
///
/// Equals the chord's subtended angle, corrected by a full turn when `p`
/// lies in the circular segment between the chord and the arc.
#[must_use]
pub fn arc_subtended_angle(p: &Point3, a: &Point3, b: &Point3, arc: &CircularArc) -> f64 {
    let dc = (p.x - arc.cx).hypot(p.y - arc.cy);
    let turn = if arc.sweep > 0.0 { TAU } else { -TAU };
    if arc.sweep.abs() >= TAU - ACCURACY {
        return if dc < arc.radius { turn } else { 0.0 };
    }

    let chord = subtended_angle(p, a, b);
    if dc >= arc.radius {
        return chord;
    }
    // Arc side of the chord: right for CCW travel, left for CW.
    let side = cross_xy(
        &Vector3::new(b.x - a.x, b.y - a.y, 0.0),
        &Vector3::new(p.x - a.x, p.y - a.y, 0.0),
    );
    let on_arc_side = if arc.sweep > 0.0 { side < 0.0 } else { side > 0.0 };
    if on_arc_side {
        chord + turn
    } else {
        chord
    }
}
