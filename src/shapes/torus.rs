use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, ShapeGeometry, SweepAxis, SweepGrid};

use super::{Shape, ShapeError, check_axis, check_finite, check_positive};

/// Ring torus around Z with optional crops and axis offsets.
///
/// `x = (R + r cos θ)(cos φ + x_offset)`, `y = (R + r cos θ)(sin φ + y_offset)`,
/// `z = r sin θ · z_offset`, where `φ` runs around the main ring and `θ`
/// around the tube starting at `tube_start_angle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Torus {
    pub radius_divisions: usize,
    pub tube_divisions: usize,
    pub radius: f64,
    pub tube_radius: f64,
    pub tube_start_angle: f64,
    pub crop_radius: usize,
    pub crop_tube: usize,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
}

impl Default for Torus {
    fn default() -> Self {
        Self {
            radius_divisions: 64,
            tube_divisions: 64,
            radius: 12.5,
            tube_radius: 5.0,
            tube_start_angle: 0.0,
            crop_radius: 0,
            crop_tube: 0,
            x_offset: 0.0,
            y_offset: 0.0,
            z_offset: 1.0,
        }
    }
}

impl Torus {
    #[must_use]
    pub fn new(radius: f64, tube_radius: f64, radius_divisions: usize, tube_divisions: usize) -> Self {
        Self {
            radius,
            tube_radius,
            radius_divisions,
            tube_divisions,
            ..Self::default()
        }
    }

    fn grid(&self) -> SweepGrid {
        SweepGrid::new(
            SweepAxis::periodic(self.radius_divisions, self.crop_radius),
            SweepAxis::periodic(self.tube_divisions, self.crop_tube),
        )
    }

    fn validate(&self) -> Result<(), ShapeError> {
        let grid = self.grid();
        check_axis("radius divisions", grid.outer)?;
        check_axis("tube divisions", grid.inner)?;
        check_positive("radius", self.radius)?;
        check_positive("tube radius", self.tube_radius)?;
        check_finite("tube start angle", self.tube_start_angle)?;
        check_finite("x offset", self.x_offset)?;
        check_finite("y offset", self.y_offset)?;
        check_finite("z offset", self.z_offset)
    }
}

impl Shape for Torus {
    fn name(&self) -> &'static str {
        "torus"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.validate()?;
        let grid = self.grid();

        let mut vertices = Vec::with_capacity(grid.vertex_count());
        for o in 0..grid.outer.samples() {
            let fraction = grid.outer.fraction(o);
            let (sin_phi, cos_phi) = (TAU * fraction).sin_cos();
            for i in 0..grid.inner.samples() {
                let theta = self.tube_start_angle + TAU * grid.inner.fraction(i);
                let (sin_theta, cos_theta) = theta.sin_cos();
                let ring = self.radius + self.tube_radius * cos_theta;
                vertices.push(
                    Point3::new(
                        ring * (cos_phi + self.x_offset),
                        ring * (sin_phi + self.y_offset),
                        self.tube_radius * sin_theta * self.z_offset,
                    )
                    .with_f(fraction),
                );
            }
        }

        Ok(ShapeGeometry::new(vertices, grid.faces())
            .with_texture(grid.tex_coords(), Some(grid.texture_faces())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MeshDiagnostics;
    use std::f64::consts::PI;

    #[test]
    fn default_counts_and_volume() {
        let torus = Torus::default();
        let geometry = torus.build().unwrap();
        assert_eq!(geometry.vertex_count(), 4096);
        assert_eq!(geometry.face_count(), 8192);

        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert!(diag.is_closed_manifold());
        let exact = 2.0 * PI * PI * torus.radius * torus.tube_radius.powi(2);
        assert!(diag.signed_volume > 0.0);
        assert!((diag.signed_volume - exact).abs() / exact < 0.01);
    }

    #[test]
    fn cropped_torus_is_open() {
        let torus = Torus {
            crop_radius: 8,
            ..Torus::new(3.0, 1.0, 32, 16)
        };
        let geometry = torus.build().unwrap();
        assert_eq!(geometry.vertex_count(), (32 + 1 - 16) * 16);
        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert_eq!(diag.open_edge_count, 2 * 16);
        assert_eq!(diag.inconsistent_edge_count, 0);
    }

    #[test]
    fn offsets_flatten_or_shift() {
        let flat = Torus {
            z_offset: 0.0,
            ..Torus::new(3.0, 1.0, 8, 8)
        };
        assert!(flat.build().unwrap().vertices.iter().all(|p| p.z == 0.0));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            Torus::new(3.0, 1.0, 2, 8).build(),
            Err(ShapeError::InvalidDivisions { .. })
        ));
        assert!(matches!(
            Torus::new(-3.0, 1.0, 8, 8).build(),
            Err(ShapeError::InvalidLength { .. })
        ));
        let nan = Torus {
            tube_start_angle: f64::NAN,
            ..Torus::default()
        };
        assert!(matches!(nan.build(), Err(ShapeError::NonFinite { .. })));
    }
}
