use serde::{Deserialize, Serialize};

use crate::geom::{Tolerance, Vec3};

/// Point mass integrated with position Verlet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    pub position: Vec3,
    pub old_position: Vec3,
    pub force: Vec3,
    pub mass: f64,
    /// Pinned in place: never moved by forces or constraints.
    pub anchored: bool,
    /// Receives gravity.
    pub force_affected: bool,
}

impl WeightedPoint {
    #[must_use]
    pub fn new(position: Vec3, mass: f64) -> Self {
        Self {
            position,
            old_position: position,
            force: Vec3::ZERO,
            mass,
            anchored: false,
            force_affected: true,
        }
    }

    /// Inverse mass; anchored points behave as infinitely heavy.
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.anchored || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Sets the accumulated force to `mass · gravity`.
    pub fn apply_gravity(&mut self, gravity: Vec3) {
        if self.force_affected && !self.anchored {
            self.force = gravity.mul_scalar(self.mass);
        }
    }

    /// `new = pos + (pos − old)·damping + force/mass·dt²`, then clears the force.
    pub fn integrate(&mut self, damping: f64, dt2: f64) {
        if self.anchored {
            self.old_position = self.position;
            self.force = Vec3::ZERO;
            return;
        }
        let velocity = self.position.sub(self.old_position).mul_scalar(damping);
        let acceleration = self.force.mul_scalar(self.inverse_mass() * dt2);
        self.old_position = self.position;
        self.position = self.position.add(velocity).add(acceleration);
        self.force = Vec3::ZERO;
    }
}

/// Distance constraint between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLink {
    pub a: u32,
    pub b: u32,
    pub rest_length: f64,
    pub stiffness: f64,
}

/// Position corrections for both ends of one link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkCorrection {
    pub a: u32,
    pub delta_a: Vec3,
    pub b: u32,
    pub delta_b: Vec3,
}

impl PointLink {
    #[must_use]
    pub fn new(a: u32, b: u32, rest_length: f64, stiffness: f64) -> Self {
        Self {
            a,
            b,
            rest_length,
            stiffness,
        }
    }

    /// Correction pulling the ends towards `rest_length`, split by inverse
    /// mass. `None` when neither end can move or the ends coincide.
    #[must_use]
    pub fn correction(&self, points: &[WeightedPoint]) -> Option<LinkCorrection> {
        let p1 = &points[self.a as usize];
        let p2 = &points[self.b as usize];
        let im1 = p1.inverse_mass();
        let im2 = p2.inverse_mass();
        if im1 + im2 == 0.0 {
            return None;
        }

        let diff = p1.position.sub(p2.position);
        let d = diff.length();
        if d <= Tolerance::ZERO_LENGTH.eps {
            return None;
        }

        let k = (self.rest_length - d) / d;
        let s1 = self.stiffness * im1 / (im1 + im2);
        let s2 = self.stiffness - s1;
        Some(LinkCorrection {
            a: self.a,
            delta_a: diff.mul_scalar(s1 * k),
            b: self.b,
            delta_b: diff.mul_scalar(-s2 * k),
        })
    }
}

impl LinkCorrection {
    pub fn apply(&self, points: &mut [WeightedPoint]) {
        let a = &mut points[self.a as usize];
        a.position = a.position.add(self.delta_a);
        let b = &mut points[self.b as usize];
        b.position = b.position.add(self.delta_b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(anchor_first: bool) -> Vec<WeightedPoint> {
        let mut a = WeightedPoint::new(Vec3::ZERO, 1.0);
        a.anchored = anchor_first;
        vec![a, WeightedPoint::new(Vec3::new(2.0, 0.0, 0.0), 1.0)]
    }

    #[test]
    fn equal_masses_split_the_correction() {
        let mut points = pair(false);
        let link = PointLink::new(0, 1, 1.0, 1.0);
        link.correction(&points).unwrap().apply(&mut points);
        assert!((points[0].position.x - 0.5).abs() < 1e-12);
        assert!((points[1].position.x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn anchored_end_never_moves() {
        let mut points = pair(true);
        let link = PointLink::new(0, 1, 1.0, 1.0);
        link.correction(&points).unwrap().apply(&mut points);
        assert_eq!(points[0].position, Vec3::ZERO);
        assert!((points[1].position.x - 1.0).abs() < 1e-12);

        points[1].anchored = true;
        assert!(link.correction(&points).is_none());
    }

    #[test]
    fn verlet_keeps_velocity_and_adds_acceleration() {
        let mut p = WeightedPoint::new(Vec3::ZERO, 2.0);
        p.old_position = Vec3::new(-1.0, 0.0, 0.0);
        p.apply_gravity(Vec3::new(0.0, -10.0, 0.0));
        assert_eq!(p.force, Vec3::new(0.0, -20.0, 0.0));
        p.integrate(0.5, 0.01);
        assert!((p.position.x - 0.5).abs() < 1e-12);
        assert!((p.position.y + 0.1).abs() < 1e-12);
        assert_eq!(p.force, Vec3::ZERO);
    }
}
