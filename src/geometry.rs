//! Curve analysis primitives used by the stroke converter: evaluation,
//! chopping, and max-curvature solving for quadratic and cubic beziers.

use strokevg_core::math::{Point, Vector};

pub(crate) const NEARLY_ZERO: f32 = 1.0 / (1 << 12) as f32;

#[inline]
fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

/// Evaluates a quadratic bezier at `t`.
pub fn eval_quad(src: &[Point; 3], t: f32) -> Point {
    let ab = lerp(src[0], src[1], t);
    let bc = lerp(src[1], src[2], t);
    lerp(ab, bc, t)
}

/// Evaluates a cubic bezier at `t`.
pub fn eval_cubic(src: &[Point; 4], t: f32) -> Point {
    let ab = lerp(src[0], src[1], t);
    let bc = lerp(src[1], src[2], t);
    let cd = lerp(src[2], src[3], t);
    let abc = lerp(ab, bc, t);
    let bcd = lerp(bc, cd, t);
    lerp(abc, bcd, t)
}

/// Splits a quadratic bezier at `t` into two quadratics covering the same
/// points.
pub fn chop_quad_at(src: &[Point; 3], t: f32) -> ([Point; 3], [Point; 3]) {
    let ab = lerp(src[0], src[1], t);
    let bc = lerp(src[1], src[2], t);
    let mid = lerp(ab, bc, t);

    ([src[0], ab, mid], [mid, bc, src[2]])
}

/// Splits a cubic bezier at `t` into two cubics covering the same points.
pub fn chop_cubic_at(src: &[Point; 4], t: f32) -> ([Point; 4], [Point; 4]) {
    let ab = lerp(src[0], src[1], t);
    let bc = lerp(src[1], src[2], t);
    let cd = lerp(src[2], src[3], t);
    let abc = lerp(ab, bc, t);
    let bcd = lerp(bc, cd, t);
    let abcd = lerp(abc, bcd, t);

    ([src[0], ab, abc, abcd], [abcd, bcd, cd, src[3]])
}

fn valid_unit_divide(mut numer: f32, mut denom: f32) -> Option<f32> {
    if numer < 0.0 {
        numer = -numer;
        denom = -denom;
    }

    if denom == 0.0 || numer == 0.0 || numer >= denom {
        return None;
    }

    let r = numer / denom;
    if r.is_nan() || r == 0.0 {
        return None;
    }

    Some(r)
}

/// Returns the parameter of maximum curvature of a quadratic bezier,
/// in `[0, 1]`.
pub fn find_quad_max_curvature(src: &[Point; 3]) -> f32 {
    let ax = src[1].x - src[0].x;
    let ay = src[1].y - src[0].y;
    let bx = src[0].x - src[1].x - src[1].x + src[2].x;
    let by = src[0].y - src[1].y - src[1].y + src[2].y;

    // Curvature of a quadratic peaks where the first derivative is
    // perpendicular to the second: t = -dot(a, b) / |b|^2.
    let numer = -(ax * bx + ay * by);
    let denom = bx * bx + by * by;
    if numer <= 0.0 || denom == 0.0 {
        return 0.0;
    }
    if numer >= denom {
        return 1.0;
    }

    numer / denom
}

/// Finds the parameters of maximum curvature of a cubic bezier.
///
/// Writes up to three values in `[0, 1]` into `t_values`, sorted and
/// deduplicated, and returns how many were found.
pub fn find_cubic_max_curvature(src: &[Point; 4], t_values: &mut [f32; 3]) -> usize {
    let mut coeff = [0.0f32; 4];
    for axis in 0..2 {
        let (p0, p1, p2, p3) = if axis == 0 {
            (src[0].x, src[1].x, src[2].x, src[3].x)
        } else {
            (src[0].y, src[1].y, src[2].y, src[3].y)
        };

        let a = p1 - p0;
        let b = p2 - 2.0 * p1 + p0;
        let c = p3 + 3.0 * (p1 - p2) - p0;

        coeff[0] += c * c;
        coeff[1] += 3.0 * b * c;
        coeff[2] += 2.0 * b * b + c * a;
        coeff[3] += a * b;
    }

    solve_cubic_poly(&coeff, t_values)
}

/// Solves `coeff[0]*t^3 + coeff[1]*t^2 + coeff[2]*t + coeff[3] = 0`,
/// pinning roots into `[0, 1]`. Returns the number of roots, sorted and
/// deduplicated.
fn solve_cubic_poly(coeff: &[f32; 4], t_values: &mut [f32; 3]) -> usize {
    if coeff[0].abs() <= NEARLY_ZERO {
        let mut roots = [0.0f32; 2];
        let count = find_unit_quad_roots(coeff[1], coeff[2], coeff[3], &mut roots);
        t_values[..count].copy_from_slice(&roots[..count]);
        return count;
    }

    let inva = coeff[0].recip();
    let a = coeff[1] * inva;
    let b = coeff[2] * inva;
    let c = coeff[3] * inva;

    let q = (a * a - b * 3.0) / 9.0;
    let r = (2.0 * a * a * a - 9.0 * a * b + 27.0 * c) / 54.0;

    let q3 = q * q * q;
    let r2_minus_q3 = r * r - q3;
    let adiv3 = a / 3.0;

    if r2_minus_q3 < 0.0 {
        // Three real roots. The divide/root can, due to finite precision,
        // be slightly outside of -1..1.
        let theta = (r / q3.sqrt()).clamp(-1.0, 1.0).acos();
        let neg2_root_q = -2.0 * q.sqrt();

        use std::f32::consts::PI;
        t_values[0] = (neg2_root_q * (theta / 3.0).cos() - adiv3).clamp(0.0, 1.0);
        t_values[1] = (neg2_root_q * ((theta + 2.0 * PI) / 3.0).cos() - adiv3).clamp(0.0, 1.0);
        t_values[2] = (neg2_root_q * ((theta - 2.0 * PI) / 3.0).cos() - adiv3).clamp(0.0, 1.0);

        t_values.sort_by(|x, y| x.partial_cmp(y).unwrap());
        let mut count = 3;
        let mut i = 0;
        while i + 1 < count {
            if t_values[i] == t_values[i + 1] {
                t_values.copy_within(i + 1.., i);
                count -= 1;
            } else {
                i += 1;
            }
        }
        count
    } else {
        // One real root.
        let mut big_a = r.abs() + r2_minus_q3.sqrt();
        big_a = big_a.cbrt();
        if r > 0.0 {
            big_a = -big_a;
        }
        if big_a != 0.0 {
            big_a += q / big_a;
        }
        t_values[0] = (big_a - adiv3).clamp(0.0, 1.0);
        1
    }
}

/// Numerically stable quadratic solver; roots outside `(0, 1)` are
/// discarded.
fn find_unit_quad_roots(a: f32, b: f32, c: f32, roots: &mut [f32; 2]) -> usize {
    if a == 0.0 {
        return match valid_unit_divide(-c, b) {
            Some(r) => {
                roots[0] = r;
                1
            }
            None => 0,
        };
    }

    // Use doubles so we don't overflow computing the discriminant.
    let dr = f64::from(b) * f64::from(b) - 4.0 * f64::from(a) * f64::from(c);
    if dr < 0.0 {
        return 0;
    }
    let dr = dr.sqrt() as f32;
    if !dr.is_finite() {
        return 0;
    }

    let q = if b < 0.0 { -(b - dr) / 2.0 } else { -(b + dr) / 2.0 };
    let mut count = 0;
    if let Some(r) = valid_unit_divide(q, a) {
        roots[count] = r;
        count += 1;
    }
    if let Some(r) = valid_unit_divide(c, q) {
        roots[count] = r;
        count += 1;
    }

    if count == 2 {
        if roots[0] > roots[1] {
            roots.swap(0, 1);
        } else if roots[0] == roots[1] {
            count = 1;
        }
    }
    count
}

/// Normalizes `v`, or returns `None` for (nearly) zero-length vectors.
pub fn unit_vector(v: Vector) -> Option<Vector> {
    let d = v.length();
    if d > NEARLY_ZERO {
        Some(v / d)
    } else {
        None
    }
}

/// First non-degenerate direction of a control polygon, pointing forward
/// along the curve.
pub fn leading_tangent(pts: &[Point]) -> Option<Vector> {
    let first = pts[0];
    pts[1..]
        .iter()
        .map(|p| *p - first)
        .find_map(unit_vector)
}

/// Last non-degenerate direction of a control polygon, pointing forward
/// along the curve.
pub fn trailing_tangent(pts: &[Point]) -> Option<Vector> {
    let last = *pts.last().unwrap();
    pts[..pts.len() - 1]
        .iter()
        .rev()
        .map(|p| last - *p)
        .find_map(unit_vector)
}

/// Unsigned angle in radians between two directions, in `[0, π]`.
pub fn rotation_between(a: Vector, b: Vector) -> f32 {
    let len = (a.square_length() * b.square_length()).sqrt();
    if len <= NEARLY_ZERO * NEARLY_ZERO {
        return 0.0;
    }
    (a.dot(b) / len).clamp(-1.0, 1.0).acos()
}

/// Whether every control point sits on the chord, i.e. the curve reduces
/// to a line between its endpoints.
pub fn is_nearly_linear(pts: &[Point]) -> bool {
    let first = pts[0];
    let last = *pts.last().unwrap();
    let chord = last - first;
    let len2 = chord.square_length();

    if len2 <= NEARLY_ZERO * NEARLY_ZERO {
        // Zero-length chord; linear only if the control points collapse too.
        return pts[1..pts.len() - 1]
            .iter()
            .all(|p| (*p - first).square_length() <= NEARLY_ZERO * NEARLY_ZERO);
    }

    let tolerance = NEARLY_ZERO * len2.sqrt();
    pts[1..pts.len() - 1]
        .iter()
        .all(|p| (chord.cross(*p - first) / len2.sqrt()).abs() <= tolerance)
}
