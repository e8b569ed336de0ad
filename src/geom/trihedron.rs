//! Frenet-Serret frames sampled along a curve, the backbone of every swept tube.

use log::debug;

use super::core::{Point3, Tolerance, Vec3};
use super::curve::Curve3;

/// Moving frame at one sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trihedron {
    pub position: Point3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

impl Trihedron {
    /// Largest deviation from an orthonormal basis.
    #[must_use]
    pub fn orthonormality_error(&self) -> f64 {
        let lengths = [self.tangent, self.normal, self.binormal]
            .iter()
            .map(|v| (v.length() - 1.0).abs())
            .fold(0.0_f64, f64::max);
        let dots = [
            self.tangent.dot(self.normal),
            self.tangent.dot(self.binormal),
            self.normal.dot(self.binormal),
        ]
        .iter()
        .map(|d| d.abs())
        .fold(0.0_f64, f64::max);
        lengths.max(dots)
    }

    /// `position + cos_u·N + sin_u·B`; `cos_u` and `sin_u` carry the tube radius.
    #[must_use]
    pub fn offset(&self, cos_u: f64, sin_u: f64) -> Point3 {
        self.position
            .add_vec(self.normal.mul_scalar(cos_u))
            .add_vec(self.binormal.mul_scalar(sin_u))
    }
}

/// Exact Frenet frame at `t`, or `None` where the tangent or the normal is
/// undefined (cusp, straight stretch, inflection).
#[must_use]
pub fn frame_at<C: Curve3 + ?Sized>(curve: &C, t: f64) -> Option<Trihedron> {
    let d1 = curve.derivative_at(t);
    let d2 = curve.second_derivative_at(t);
    let tangent = d1.normalized()?;
    let normal = normal_from_derivatives(d1, d2, tangent)?;
    Some(Trihedron {
        position: curve.point_at(t),
        tangent,
        normal,
        binormal: tangent.cross(normal),
    })
}

/// `T' = r''/|r'| − r'(r'·r'')/|r'|³`, made orthogonal to `T` and normalized.
fn normal_from_derivatives(d1: Vec3, d2: Vec3, tangent: Vec3) -> Option<Vec3> {
    let speed = d1.length();
    if speed <= Tolerance::ZERO_LENGTH.eps {
        return None;
    }
    let speed3 = speed * speed * speed;
    let t_prime = d2
        .div_scalar(speed)
        .sub(d1.mul_scalar(d1.dot(d2) / speed3));
    let t_prime = t_prime.sub(tangent.mul_scalar(tangent.dot(t_prime)));
    if t_prime.length() <= Tolerance::DERIVATIVE.eps * speed.max(1.0) {
        return None;
    }
    t_prime.normalized()
}

/// Cached frames at `subdivisions + 1` evenly spaced parameters of a curve.
#[derive(Debug, Clone)]
pub struct Trihedrons<C> {
    curve: C,
    frames: Vec<Trihedron>,
    arc: Vec<f64>,
    fallbacks: usize,
}

impl<C: Curve3> Trihedrons<C> {
    #[must_use]
    pub fn new(curve: C) -> Self {
        Self {
            curve,
            frames: Vec::new(),
            arc: Vec::new(),
            fallbacks: 0,
        }
    }

    /// Convenience for `new` followed by `calculate`.
    #[must_use]
    pub fn calculated(curve: C, subdivisions: usize) -> Self {
        let mut set = Self::new(curve);
        set.calculate(subdivisions);
        set
    }

    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// Rebuilds the cache. A `subdivisions` of 0 is treated as 1.
    pub fn calculate(&mut self, subdivisions: usize) {
        let subdivisions = subdivisions.max(1);
        let (t0, t1) = self.curve.domain();
        let span = t1 - t0;
        let h = Tolerance::DERIVATIVE.relative_to(span).max(f64::EPSILON);

        self.frames.clear();
        self.frames.reserve(subdivisions + 1);
        self.arc.clear();
        self.arc.reserve(subdivisions + 1);
        self.fallbacks = 0;

        let mut previous: Option<Trihedron> = None;
        let mut travelled = 0.0;

        for i in 0..=subdivisions {
            let t = t0 + span * (i as f64) / (subdivisions as f64);
            let position = self.curve.point_at(t);
            let d1 = self.curve.derivative_at(t);
            let d2 = self.curve.second_derivative_at(t);

            let tangent = match d1.normalized() {
                Some(tangent) => tangent,
                None => {
                    self.fallbacks += 1;
                    let ahead = if t + h <= t1 { t + h } else { t - h };
                    let chord = self.curve.point_at(ahead).sub_point(position);
                    let chord = if ahead < t { chord.neg() } else { chord };
                    chord
                        .normalized()
                        .or_else(|| previous.map(|f| f.tangent))
                        .unwrap_or(Vec3::Z)
                }
            };

            let normal = match normal_from_derivatives(d1, d2, tangent) {
                Some(normal) => normal,
                None => {
                    self.fallbacks += 1;
                    previous
                        .and_then(|f| {
                            f.normal
                                .sub(tangent.mul_scalar(tangent.dot(f.normal)))
                                .normalized()
                        })
                        .unwrap_or_else(|| tangent.any_perpendicular())
                }
            };

            if let Some(prev) = previous {
                travelled += position.distance_to(prev.position);
            }

            let frame = Trihedron {
                position,
                tangent,
                normal,
                binormal: tangent.cross(normal),
            };
            self.frames.push(frame);
            self.arc.push(travelled);
            previous = Some(frame);
        }

        if self.fallbacks > 0 {
            debug!(
                "trihedrons: {} fallback frame(s) over {} samples",
                self.fallbacks,
                subdivisions + 1
            );
        }
    }

    #[must_use]
    pub fn frames(&self) -> &[Trihedron] {
        &self.frames
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Trihedron> {
        self.frames.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Polyline length through the samples.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.arc.last().copied().unwrap_or(0.0)
    }

    /// Arc-length fraction in `[0, 1]` at a sample.
    #[must_use]
    pub fn arc_fraction(&self, index: usize) -> f64 {
        let total = self.length();
        match self.arc.get(index) {
            Some(&s) if total > 0.0 => s / total,
            _ => 0.0,
        }
    }

    /// Number of samples that needed a fallback tangent or normal.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// Swept-tube point at sample `index`, tagged with its arc-length fraction.
    #[must_use]
    pub fn sample(&self, index: usize, cos_u: f64, sin_u: f64) -> Option<Point3> {
        let frame = self.frames.get(index)?;
        Some(frame.offset(cos_u, sin_u).with_f(self.arc_fraction(index)))
    }

    #[must_use]
    pub fn curvature(&self, t: f64) -> f64 {
        self.curve.curvature_at(t)
    }

    #[must_use]
    pub fn torsion(&self, t: f64) -> f64 {
        self.curve.torsion_at(t)
    }
}
