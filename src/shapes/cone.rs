use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geom::{Face3, Point3, ShapeGeometry};

use super::{Shape, ShapeError, check_divisions, check_positive};

/// Right circular cone on the XY plane with its apex at `z = height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cone {
    pub divisions: usize,
    pub radius: f64,
    pub height: f64,
    pub capped: bool,
}

impl Default for Cone {
    fn default() -> Self {
        Self {
            divisions: 32,
            radius: 5.0,
            height: 10.0,
            capped: true,
        }
    }
}

impl Cone {
    #[must_use]
    pub fn new(divisions: usize, radius: f64, height: f64) -> Self {
        Self {
            divisions,
            radius,
            height,
            capped: true,
        }
    }
}

impl Shape for Cone {
    fn name(&self) -> &'static str {
        "cone"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        check_divisions("divisions", self.divisions)?;
        check_positive("radius", self.radius)?;
        check_positive("height", self.height)?;

        let n = self.divisions;
        let mut vertices: Vec<Point3> = (0..n)
            .map(|j| {
                let (s, c) = (TAU * j as f64 / n as f64).sin_cos();
                Point3::new(self.radius * c, self.radius * s, 0.0)
            })
            .collect();
        let tip = vertices.len() as u32;
        vertices.push(Point3::new(0.0, 0.0, self.height).with_f(1.0));

        let ring = |j: usize| (j % n) as u32;
        let mut faces: Vec<Face3> = (0..n).map(|j| Face3::new(tip, ring(j), ring(j + 1))).collect();

        if self.capped {
            let center = vertices.len() as u32;
            vertices.push(Point3::ORIGIN);
            faces.extend((0..n).map(|j| Face3::new(center, ring(j + 1), ring(j))));
        }

        // Planar projection onto the base disc.
        let scale = 0.5 / self.radius;
        let tex_coords = vertices
            .iter()
            .map(|p| [0.5 + p.x * scale, 0.5 + p.y * scale])
            .collect();

        Ok(ShapeGeometry::new(vertices, faces).with_texture(tex_coords, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MeshDiagnostics;

    #[test]
    fn capped_cone_is_closed() {
        let cone = Cone::new(24, 2.0, 3.0);
        let geometry = cone.build().unwrap();
        assert_eq!(geometry.vertex_count(), 26);
        assert_eq!(geometry.face_count(), 48);

        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert!(diag.is_closed_manifold());
        // Inscribed polygon base: area = n/2 · r² · sin(2π/n).
        let base = 12.0 * 4.0 * (TAU / 24.0).sin();
        assert!((diag.signed_volume - base * 3.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn open_cone_keeps_base_rim() {
        let cone = Cone {
            capped: false,
            ..Cone::new(8, 1.0, 1.0)
        };
        let diag = MeshDiagnostics::from_geometry(&cone.build().unwrap());
        assert_eq!(diag.open_edge_count, 8);
        assert_eq!(diag.orphan_vertex_count, 0);
    }

    #[test]
    fn rejects_degenerate_cone() {
        assert!(matches!(
            Cone::new(2, 1.0, 1.0).build(),
            Err(ShapeError::InvalidDivisions { .. })
        ));
        assert!(matches!(
            Cone::new(8, 1.0, f64::NAN).build(),
            Err(ShapeError::InvalidLength { name: "height", .. })
        ));
    }
}
