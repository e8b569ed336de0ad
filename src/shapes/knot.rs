use serde::{Deserialize, Serialize};

use crate::geom::{ShapeGeometry, SweepAxis, TorusKnot3};

use super::tube::TubeSweep;
use super::{Shape, ShapeError, check_finite, check_positive};

/// Tube swept along a `(p, q)` torus knot.
///
/// The length axis always wraps when uncropped, also for non-integer `p`
/// and `q`; the seam is then geometrically open but topologically closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Knot {
    pub major_radius: f64,
    pub minor_radius: f64,
    pub wire_radius: f64,
    pub p: f64,
    pub q: f64,
    pub length_divisions: usize,
    pub wire_divisions: usize,
    pub crop_length: usize,
    pub crop_wire: usize,
    pub wire_start_angle: f64,
}

impl Default for Knot {
    fn default() -> Self {
        Self {
            major_radius: 10.0,
            minor_radius: 4.0,
            wire_radius: 1.5,
            p: 2.0,
            q: 3.0,
            length_divisions: 200,
            wire_divisions: 24,
            crop_length: 0,
            crop_wire: 0,
            wire_start_angle: 0.0,
        }
    }
}

impl Knot {
    #[must_use]
    pub fn curve(&self) -> TorusKnot3 {
        TorusKnot3::new(self.major_radius, self.minor_radius, self.p, self.q)
    }

    fn sweep(&self) -> Result<TubeSweep, ShapeError> {
        check_positive("major radius", self.major_radius)?;
        check_positive("minor radius", self.minor_radius)?;
        check_finite("p", self.p)?;
        check_finite("q", self.q)?;
        Ok(TubeSweep {
            wire_radius: self.wire_radius,
            wire_start_angle: self.wire_start_angle,
            length: SweepAxis::periodic(self.length_divisions, self.crop_length),
            wire: SweepAxis::periodic(self.wire_divisions, self.crop_wire),
        })
    }
}

impl Shape for Knot {
    fn name(&self) -> &'static str {
        "knot"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.sweep()?.sweep(self.curve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Knot {
        Knot {
            length_divisions: 96,
            wire_divisions: 8,
            ..Knot::default()
        }
    }

    #[test]
    fn trefoil_is_closed() {
        let knot = small();
        let geometry = knot.build().unwrap();
        assert_eq!(geometry.vertex_count(), 96 * 8);
        assert_eq!(geometry.face_count(), 2 * 96 * 8);

        let diag = knot.diagnostics().unwrap();
        assert!(diag.is_closed_manifold());
        assert_eq!(diag.orphan_vertex_count, 0);
        assert!(diag.signed_volume > 0.0);
    }

    #[test]
    fn cropped_knot_is_open() {
        let knot = Knot {
            crop_length: 4,
            ..small()
        };
        let geometry = knot.build().unwrap();
        assert_eq!(geometry.vertex_count(), (96 + 1 - 8) * 8);
        let diag = knot.diagnostics().unwrap();
        assert_eq!(diag.open_edge_count, 2 * 8);
    }

    #[test]
    fn vertices_carry_arc_fraction() {
        let geometry = small().build().unwrap();
        assert!(geometry.vertices.iter().all(|p| (0.0..=1.0).contains(&p.f)));
        assert_eq!(geometry.vertices[0].f, 0.0);
    }

    #[test]
    fn rejects_non_finite_winding() {
        let knot = Knot {
            q: f64::INFINITY,
            ..small()
        };
        assert!(matches!(knot.build(), Err(ShapeError::NonFinite { name: "q", .. })));
    }
}
