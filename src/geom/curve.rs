use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::core::{Point3, Tolerance, Vec3};

/// A parametric space curve `r(t)`.
///
/// Only `point_at` is required. Derivatives default to central differences over
/// the domain; the built-in curves override them analytically.
pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::DERIVATIVE.relative_to(span);
        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    #[must_use]
    fn second_derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::SECOND_DERIVATIVE.relative_to(span);
        let t0 = (t - h).max(a);
        let t2 = (t + h).min(b);
        let tm = 0.5 * (t0 + t2);
        let dt = tm - t0;
        if dt == 0.0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(tm);
        let p2 = self.point_at(t2);
        second_difference(p0, p1, p2).mul_scalar(1.0 / (dt * dt))
    }

    #[must_use]
    fn third_derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = span / 256.0;
        let t_plus = (t + h).min(b);
        let t_minus = (t - h).max(a);
        let dt = t_plus - t_minus;
        if dt.abs() < Tolerance::ZERO_LENGTH.eps {
            return Vec3::ZERO;
        }

        self.second_derivative_at(t_plus)
            .sub(self.second_derivative_at(t_minus))
            .mul_scalar(1.0 / dt)
    }

    /// `|r'' × r'| / |r'|³`, or 0 where the derivative vanishes.
    #[must_use]
    fn curvature_at(&self, t: f64) -> f64 {
        let d1 = self.derivative_at(t);
        let d2 = self.second_derivative_at(t);
        let speed = d1.length();
        if speed <= Tolerance::ZERO_LENGTH.eps || !speed.is_finite() {
            return 0.0;
        }
        let k = d2.cross(d1).length() / (speed * speed * speed);
        if k.is_finite() { k } else { 0.0 }
    }

    /// `(r' × r'') · r''' / |r' × r''|²`, or 0 on straight stretches.
    #[must_use]
    fn torsion_at(&self, t: f64) -> f64 {
        let d1 = self.derivative_at(t);
        let d2 = self.second_derivative_at(t);
        let d3 = self.third_derivative_at(t);

        let cross12 = d1.cross(d2);
        let denominator = cross12.length_squared();
        if denominator < 1e-18 {
            return 0.0;
        }

        let tau = cross12.dot(d3) / denominator;
        if tau.is_finite() { tau } else { 0.0 }
    }
}

// ─── Cubic Bezier ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier3 {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
}

impl CubicBezier3 {
    #[must_use]
    pub const fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Control points as a slice-friendly array.
    #[must_use]
    pub const fn control_points(&self) -> [Point3; 4] {
        [self.p0, self.p1, self.p2, self.p3]
    }
}

impl Default for CubicBezier3 {
    fn default() -> Self {
        Self::new(
            Point3::new(-3.0, 0.0, 0.0),
            Point3::new(-1.0, 3.0, 1.0),
            Point3::new(1.0, -3.0, -1.0),
            Point3::new(3.0, 0.0, 0.0),
        )
    }
}

impl Curve3 for CubicBezier3 {
    fn point_at(&self, t: f64) -> Point3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let u2 = u * u;
        let t2 = t * t;
        point_weighted_sum4(
            self.p0,
            u2 * u,
            self.p1,
            3.0 * u2 * t,
            self.p2,
            3.0 * u * t2,
            self.p3,
            t2 * t,
        )
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = self.p1.sub_point(self.p0);
        let b = self.p2.sub_point(self.p1);
        let c = self.p3.sub_point(self.p2);
        a.mul_scalar(3.0 * u * u)
            .add(b.mul_scalar(6.0 * u * t))
            .add(c.mul_scalar(3.0 * t * t))
    }

    fn second_derivative_at(&self, t: f64) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = second_difference(self.p0, self.p1, self.p2);
        let b = second_difference(self.p1, self.p2, self.p3);
        a.mul_scalar(6.0 * u).add(b.mul_scalar(6.0 * t))
    }

    fn third_derivative_at(&self, _t: f64) -> Vec3 {
        let a = second_difference(self.p0, self.p1, self.p2);
        let b = second_difference(self.p1, self.p2, self.p3);
        b.sub(a).mul_scalar(6.0)
    }
}

// ─── Torus knot ─────────────────────────────────────────────────────────────

/// `(p, q)` torus knot wound on a torus of radii `major_radius` / `minor_radius`:
/// `((R + r cos qt) cos pt, (R + r cos qt) sin pt, r sin qt)` for `t ∈ [0, 2π]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusKnot3 {
    pub major_radius: f64,
    pub minor_radius: f64,
    pub p: f64,
    pub q: f64,
}

impl TorusKnot3 {
    #[must_use]
    pub const fn new(major_radius: f64, minor_radius: f64, p: f64, q: f64) -> Self {
        Self {
            major_radius,
            minor_radius,
            p,
            q,
        }
    }

    /// Distance from the Z axis, `ρ = R + r cos qt`, and its first three derivatives.
    fn rho(&self, t: f64) -> [f64; 4] {
        let r = self.minor_radius;
        let q = self.q;
        let (s, c) = (q * t).sin_cos();
        [
            self.major_radius + r * c,
            -r * q * s,
            -r * q * q * c,
            r * q * q * q * s,
        ]
    }
}

impl Curve3 for TorusKnot3 {
    fn domain(&self) -> (f64, f64) {
        (0.0, TAU)
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn point_at(&self, t: f64) -> Point3 {
        let [rho, ..] = self.rho(t);
        let (s, c) = (self.p * t).sin_cos();
        let z = self.minor_radius * (self.q * t).sin();
        Point3::new(rho * c, rho * s, z)
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let [rho, rho1, ..] = self.rho(t);
        let p = self.p;
        let (s, c) = (p * t).sin_cos();
        Vec3::new(
            rho1 * c - p * rho * s,
            rho1 * s + p * rho * c,
            self.minor_radius * self.q * (self.q * t).cos(),
        )
    }

    fn second_derivative_at(&self, t: f64) -> Vec3 {
        let [rho, rho1, rho2, _] = self.rho(t);
        let p = self.p;
        let (s, c) = (p * t).sin_cos();
        Vec3::new(
            rho2 * c - 2.0 * p * rho1 * s - p * p * rho * c,
            rho2 * s + 2.0 * p * rho1 * c - p * p * rho * s,
            -self.minor_radius * self.q * self.q * (self.q * t).sin(),
        )
    }

    fn third_derivative_at(&self, t: f64) -> Vec3 {
        let [rho, rho1, rho2, rho3] = self.rho(t);
        let p = self.p;
        let p2 = p * p;
        let p3 = p2 * p;
        let (s, c) = (p * t).sin_cos();
        let q = self.q;
        Vec3::new(
            rho3 * c - 3.0 * p * rho2 * s - 3.0 * p2 * rho1 * c + p3 * rho * s,
            rho3 * s + 3.0 * p * rho2 * c - 3.0 * p2 * rho1 * s - p3 * rho * c,
            -self.minor_radius * q * q * q * (q * t).cos(),
        )
    }
}

// ─── Helix ──────────────────────────────────────────────────────────────────

/// Helix on a cylinder of `radius` around Z rising `pitch` per turn until it
/// reaches `length`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Helix3 {
    pub radius: f64,
    pub pitch: f64,
    pub length: f64,
}

impl Helix3 {
    #[must_use]
    pub const fn new(radius: f64, pitch: f64, length: f64) -> Self {
        Self {
            radius,
            pitch,
            length,
        }
    }

    /// Rise per radian.
    fn rise(&self) -> f64 {
        self.pitch / TAU
    }
}

impl Curve3 for Helix3 {
    fn domain(&self) -> (f64, f64) {
        (0.0, TAU * self.length / self.pitch)
    }

    fn point_at(&self, t: f64) -> Point3 {
        let (s, c) = t.sin_cos();
        Point3::new(self.radius * c, self.radius * s, self.rise() * t)
    }

    fn derivative_at(&self, t: f64) -> Vec3 {
        let (s, c) = t.sin_cos();
        Vec3::new(-self.radius * s, self.radius * c, self.rise())
    }

    fn second_derivative_at(&self, t: f64) -> Vec3 {
        let (s, c) = t.sin_cos();
        Vec3::new(-self.radius * c, -self.radius * s, 0.0)
    }

    fn third_derivative_at(&self, t: f64) -> Vec3 {
        let (s, c) = t.sin_cos();
        Vec3::new(self.radius * s, -self.radius * c, 0.0)
    }
}

// ─── Interpolation ──────────────────────────────────────────────────────────

/// Builds a C2-continuous chain of cubic Bezier segments passing through
/// every knot, one segment per consecutive pair.
///
/// Returns `None` for fewer than two knots or non-finite input.
#[must_use]
pub fn interpolate_bezier(knots: &[Point3]) -> Option<Vec<CubicBezier3>> {
    if knots.len() < 2 || knots.iter().any(|p| !p.is_finite()) {
        return None;
    }

    let n = knots.len() - 1;
    let k: Vec<Vec3> = knots.iter().map(|p| p.to_vec3()).collect();

    if n == 1 {
        let d = k[1].sub(k[0]);
        return Some(vec![CubicBezier3::new(
            knots[0],
            Point3::from(k[0].add(d.mul_scalar(1.0 / 3.0))),
            Point3::from(k[0].add(d.mul_scalar(2.0 / 3.0))),
            knots[1],
        )]);
    }

    // Tridiagonal system for the first inner control point of every segment.
    let mut lower = vec![1.0; n];
    let mut diag = vec![4.0; n];
    let mut upper = vec![1.0; n];
    let mut rhs: Vec<Vec3> = (0..n)
        .map(|i| k[i].mul_scalar(4.0).add(k[i + 1].mul_scalar(2.0)))
        .collect();

    lower[0] = 0.0;
    diag[0] = 2.0;
    rhs[0] = k[0].add(k[1].mul_scalar(2.0));
    lower[n - 1] = 2.0;
    diag[n - 1] = 7.0;
    upper[n - 1] = 0.0;
    rhs[n - 1] = k[n - 1].mul_scalar(8.0).add(k[n]);

    // Thomas algorithm.
    for i in 1..n {
        let m = lower[i] / diag[i - 1];
        diag[i] -= m * upper[i - 1];
        rhs[i] = rhs[i].sub(rhs[i - 1].mul_scalar(m));
    }
    let mut first = vec![Vec3::ZERO; n];
    first[n - 1] = rhs[n - 1].div_scalar(diag[n - 1]);
    for i in (0..n - 1).rev() {
        first[i] = rhs[i].sub(first[i + 1].mul_scalar(upper[i])).div_scalar(diag[i]);
    }

    let mut second = vec![Vec3::ZERO; n];
    for i in 0..n - 1 {
        second[i] = k[i + 1].mul_scalar(2.0).sub(first[i + 1]);
    }
    second[n - 1] = k[n].add(first[n - 1]).mul_scalar(0.5);

    Some(
        (0..n)
            .map(|i| {
                CubicBezier3::new(
                    knots[i],
                    Point3::from(first[i]),
                    Point3::from(second[i]),
                    knots[i + 1],
                )
            })
            .collect(),
    )
}

#[allow(clippy::too_many_arguments)]
fn point_weighted_sum4(
    p0: Point3,
    w0: f64,
    p1: Point3,
    w1: f64,
    p2: Point3,
    w2: f64,
    p3: Point3,
    w3: f64,
) -> Point3 {
    Point3::new(
        p0.x * w0 + p1.x * w1 + p2.x * w2 + p3.x * w3,
        p0.y * w0 + p1.y * w1 + p2.y * w2 + p3.y * w3,
        p0.z * w0 + p1.z * w1 + p2.z * w2 + p3.z * w3,
    )
}

fn second_difference(p0: Point3, p1: Point3, p2: Point3) -> Vec3 {
    Vec3::new(
        p0.x - 2.0 * p1.x + p2.x,
        p0.y - 2.0 * p1.y + p2.y,
        p0.z - 2.0 * p1.z + p2.z,
    )
}
