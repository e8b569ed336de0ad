//! Circular cross-section swept along a curve's Frenet frames.

use std::f64::consts::TAU;

use log::debug;

use crate::geom::{Curve3, Point3, ShapeGeometry, SweepAxis, SweepGrid, Trihedrons};

use super::{ShapeError, check_axis, check_finite, check_positive};

/// Sweep parameters shared by knots, springs and Bezier tubes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TubeSweep {
    pub wire_radius: f64,
    pub wire_start_angle: f64,
    pub length: SweepAxis,
    pub wire: SweepAxis,
}

impl TubeSweep {
    pub(crate) fn validate(&self) -> Result<(), ShapeError> {
        check_positive("wire radius", self.wire_radius)?;
        check_finite("wire start angle", self.wire_start_angle)?;
        check_axis("length divisions", self.length)?;
        check_axis("wire divisions", self.wire)
    }

    /// Outer axis is the wire angle and inner axis the curve parameter, so
    /// `d_u × d_t` points away from the centerline.
    pub(crate) fn grid(&self) -> SweepGrid {
        SweepGrid::new(self.wire, self.length)
    }

    /// Sweeps `curve`; the geometry records how many centerline frames
    /// needed a fallback.
    pub(crate) fn sweep<C: Curve3>(&self, curve: C) -> Result<ShapeGeometry, ShapeError> {
        self.validate()?;

        let frames = Trihedrons::calculated(curve, self.length.divisions);
        let grid = self.grid();
        let n_wire = self.wire.samples();
        let n_length = self.length.samples();

        let mut vertices: Vec<Point3> = Vec::with_capacity(grid.vertex_count());
        for o in 0..n_wire {
            let angle = self.wire_start_angle + TAU * self.wire.fraction(o);
            let (sin_u, cos_u) = angle.sin_cos();
            for i in 0..n_length {
                let index = self.length.division_index(i);
                let point = frames
                    .sample(index, self.wire_radius * cos_u, self.wire_radius * sin_u)
                    .ok_or_else(|| {
                        ShapeError::InvalidParameter(format!(
                            "frame {index} missing from {} samples",
                            frames.len()
                        ))
                    })?;
                if !point.is_finite() {
                    return Err(ShapeError::NonFinite {
                        name: "tube vertex",
                        value: f64::NAN,
                    });
                }
                vertices.push(point);
            }
        }

        let fallbacks = frames.fallback_count();
        debug!(
            "tube: {}x{} grid over a centerline of length {:.4}, {} fallback frame(s)",
            n_wire,
            n_length,
            frames.length(),
            fallbacks
        );

        let mut geometry = ShapeGeometry::new(vertices, grid.faces())
            .with_texture(grid.tex_coords(), Some(grid.texture_faces()));
        geometry.fallback_frames = fallbacks;
        Ok(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Helix3, MeshDiagnostics};

    fn sweep(length: SweepAxis, wire: SweepAxis) -> TubeSweep {
        TubeSweep {
            wire_radius: 0.25,
            wire_start_angle: 0.0,
            length,
            wire,
        }
    }

    #[test]
    fn open_tube_counts() {
        let tube = sweep(SweepAxis::open(10, 0), SweepAxis::periodic(6, 0));
        let geometry = tube.sweep(Helix3::new(2.0, 1.0, 3.0)).unwrap();
        assert_eq!(geometry.vertex_count(), 6 * 11);
        assert_eq!(geometry.face_count(), 2 * 6 * 10);
        assert_eq!(geometry.fallback_frames, 0);

        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert_eq!(diag.open_edge_count, 2 * 6);
        assert_eq!(diag.non_manifold_edge_count, 0);
        assert_eq!(diag.inconsistent_edge_count, 0);
    }

    #[test]
    fn tube_points_sit_at_wire_radius() {
        let tube = sweep(SweepAxis::open(8, 0), SweepAxis::periodic(5, 0));
        let helix = Helix3::new(2.0, 1.0, 3.0);
        let frames = Trihedrons::calculated(helix, 8);
        let geometry = tube.sweep(helix).unwrap();
        for (k, p) in geometry.vertices.iter().enumerate() {
            let centre = frames.frames()[k % 9].position;
            assert!((p.distance_to(centre) - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn cropped_wire_leaves_slot() {
        let tube = sweep(SweepAxis::open(8, 1), SweepAxis::periodic(8, 2));
        let geometry = tube.sweep(Helix3::new(2.0, 1.0, 3.0)).unwrap();
        assert_eq!(geometry.vertex_count(), 5 * 7);
        assert_eq!(geometry.face_count(), 2 * 4 * 6);
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut tube = sweep(SweepAxis::open(2, 0), SweepAxis::periodic(6, 0));
        assert!(matches!(
            tube.validate(),
            Err(ShapeError::InvalidDivisions { value: 2, .. })
        ));
        tube.length = SweepAxis::open(6, 3);
        assert!(matches!(tube.validate(), Err(ShapeError::InvalidCrop { .. })));
        tube.length = SweepAxis::open(6, 0);
        tube.wire_radius = 0.0;
        assert!(matches!(tube.validate(), Err(ShapeError::InvalidLength { .. })));
    }
}
