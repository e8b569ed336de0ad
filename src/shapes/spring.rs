use serde::{Deserialize, Serialize};

use crate::geom::{Helix3, ShapeGeometry, SweepAxis};

use super::tube::TubeSweep;
use super::{Shape, ShapeError, check_positive};

/// Helical coil spring around Z, open at both wire ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spring {
    pub mean_radius: f64,
    pub wire_radius: f64,
    pub pitch: f64,
    pub length: f64,
    pub length_divisions: usize,
    pub wire_divisions: usize,
    pub crop_length: usize,
    pub crop_wire: usize,
    pub wire_start_angle: f64,
}

impl Default for Spring {
    fn default() -> Self {
        Self {
            mean_radius: 6.0,
            wire_radius: 1.0,
            pitch: 5.0,
            length: 25.0,
            length_divisions: 200,
            wire_divisions: 16,
            crop_length: 0,
            crop_wire: 0,
            wire_start_angle: 0.0,
        }
    }
}

impl Spring {
    #[must_use]
    pub fn curve(&self) -> Helix3 {
        Helix3::new(self.mean_radius, self.pitch, self.length)
    }

    /// Number of full turns.
    #[must_use]
    pub fn turns(&self) -> f64 {
        self.length / self.pitch
    }

    fn sweep(&self) -> Result<TubeSweep, ShapeError> {
        check_positive("mean radius", self.mean_radius)?;
        check_positive("pitch", self.pitch)?;
        check_positive("length", self.length)?;
        Ok(TubeSweep {
            wire_radius: self.wire_radius,
            wire_start_angle: self.wire_start_angle,
            length: SweepAxis::open(self.length_divisions, self.crop_length),
            wire: SweepAxis::periodic(self.wire_divisions, self.crop_wire),
        })
    }
}

impl Shape for Spring {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.sweep()?.sweep(self.curve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_spans_its_length() {
        let spring = Spring {
            length_divisions: 60,
            wire_divisions: 8,
            ..Spring::default()
        };
        let geometry = spring.build().unwrap();
        assert_eq!(geometry.vertex_count(), 61 * 8);

        let (lo, hi) = geometry
            .vertices
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.z), hi.max(p.z)));
        assert!((lo + spring.wire_radius).abs() < 0.2);
        assert!((hi - spring.length - spring.wire_radius).abs() < 0.2);
        assert!((spring.turns() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn ends_are_open_rings() {
        let spring = Spring {
            length_divisions: 30,
            wire_divisions: 6,
            ..Spring::default()
        };
        let diag = spring.diagnostics().unwrap();
        assert_eq!(diag.open_edge_count, 12);
        assert_eq!(diag.non_manifold_edge_count, 0);
        assert_eq!(diag.fallback_frame_count, 0);
    }

    #[test]
    fn zero_pitch_is_rejected() {
        let spring = Spring {
            pitch: 0.0,
            ..Spring::default()
        };
        assert!(matches!(
            spring.build(),
            Err(ShapeError::InvalidLength { name: "pitch", .. })
        ));
    }
}
