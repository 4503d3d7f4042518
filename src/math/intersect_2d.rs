use super::arc_2d::CircularArc;
use super::{Point3, TOLERANCE};

/// An XY intersection between two bounded curves.
///
/// `t_a` and `t_b` are the fractions `[0, 1]` along the first and second
/// curve respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub x: f64,
    pub y: f64,
    pub t_a: f64,
    pub t_b: f64,
}

impl Hit {
    /// Returns the same hit with the roles of the two curves exchanged.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            t_a: self.t_b,
            t_b: self.t_a,
            ..self
        }
    }
}

/// Bounded segment-segment intersection in XY.
///
/// Parallel and collinear segments report no intersection.
#[must_use]
pub fn segment_segment(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3, eps: f64) -> Option<Hit> {
    let (dax, day) = (a1.x - a0.x, a1.y - a0.y);
    let (dbx, dby) = (b1.x - b0.x, b1.y - b0.y);

    let cross = dax * dby - day * dbx;
    if cross.abs() < TOLERANCE {
        return None;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * dby - dy * dbx) / cross;
    let u = (dx * day - dy * dax) / cross;

    let ta_eps = eps / dax.hypot(day).max(TOLERANCE);
    let tb_eps = eps / dbx.hypot(dby).max(TOLERANCE);
    if t < -ta_eps || t > 1.0 + ta_eps || u < -tb_eps || u > 1.0 + tb_eps {
        return None;
    }
    let t = t.clamp(0.0, 1.0);
    Some(Hit {
        x: a0.x + dax * t,
        y: a0.y + day * t,
        t_a: t,
        t_b: u.clamp(0.0, 1.0),
    })
}

/// Intersections of the segment `a0`-`a1` with a circular arc in XY.
///
/// `t_a` is the fraction along the segment, `t_b` the fraction of the arc sweep.
#[must_use]
pub fn segment_arc(a0: &Point3, a1: &Point3, arc: &CircularArc, eps: f64) -> Vec<Hit> {
    let mut results = Vec::new();
    if arc.radius < TOLERANCE || arc.sweep.abs() < TOLERANCE {
        return results;
    }

    let dx = a1.x - a0.x;
    let dy = a1.y - a0.y;
    let seg_len_sq = dx * dx + dy * dy;
    if seg_len_sq < TOLERANCE * TOLERANCE {
        return results;
    }

    // (a0 + t*d - c)^2 = r^2
    let fx = a0.x - arc.cx;
    let fy = a0.y - arc.cy;
    let a = seg_len_sq;
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - arc.radius * arc.radius;
    let discriminant = b * b - 4.0 * a * c;

    let seg_len = seg_len_sq.sqrt();
    // A near miss by up to `eps` still counts as a touch.
    let touch = 4.0 * a * (2.0 * arc.radius * eps + eps * eps);
    if discriminant < -touch {
        return results;
    }
    let disc_sqrt = discriminant.max(0.0).sqrt();

    let roots = if disc_sqrt < TOLERANCE * 100.0 {
        vec![-b / (2.0 * a)]
    } else {
        vec![(-b - disc_sqrt) / (2.0 * a), (-b + disc_sqrt) / (2.0 * a)]
    };

    let t_eps = eps / seg_len;
    let angle_eps = eps / arc.radius;
    for t in roots {
        if t < -t_eps || t > 1.0 + t_eps {
            continue;
        }
        let t = t.clamp(0.0, 1.0);
        let px = a0.x + t * dx;
        let py = a0.y + t * dy;
        let angle = (py - arc.cy).atan2(px - arc.cx);
        if let Some(t_arc) = arc.param_of_angle(angle, angle_eps) {
            results.push(Hit {
                x: px,
                y: py,
                t_a: t,
                t_b: t_arc,
            });
        }
    }

    results
}

/// Intersections of two circular arcs in XY.
///
/// Concentric arcs report no intersections.
#[must_use]
pub fn arc_arc(a: &CircularArc, b: &CircularArc, eps: f64) -> Vec<Hit> {
    let mut results = Vec::new();
    if a.radius < TOLERANCE || b.radius < TOLERANCE {
        return results;
    }

    let dx = b.cx - a.cx;
    let dy = b.cy - a.cy;
    let dist_sq = dx * dx + dy * dy;
    let dist = dist_sq.sqrt();
    if dist < TOLERANCE {
        return results;
    }

    let sum = a.radius + b.radius;
    let diff = (a.radius - b.radius).abs();
    if dist > sum + eps || dist < diff - eps {
        return results;
    }

    // Distance from a's center along the center line to the radical line.
    let along = (a.radius * a.radius - b.radius * b.radius + dist_sq) / (2.0 * dist);
    let h = (a.radius * a.radius - along * along).max(0.0).sqrt();

    let mx = a.cx + along * dx / dist;
    let my = a.cy + along * dy / dist;
    let px = -dy / dist;
    let py = dx / dist;

    let candidates = if h < TOLERANCE * 100.0 {
        vec![(mx, my)]
    } else {
        vec![(mx + h * px, my + h * py), (mx - h * px, my - h * py)]
    };

    for (ix, iy) in candidates {
        let ta = a.param_of_angle((iy - a.cy).atan2(ix - a.cx), eps / a.radius);
        let tb = b.param_of_angle((iy - b.cy).atan2(ix - b.cx), eps / b.radius);
        if let (Some(t_a), Some(t_b)) = (ta, tb) {
            results.push(Hit { x: ix, y: iy, t_a, t_b });
        }
    }

    results
}
