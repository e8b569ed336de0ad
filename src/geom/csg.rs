//! Polygon-soup to indexed-mesh conversion for solids coming out of a CSG
//! library.
//!
//! Shared corners are merged by exact value equality and every polygon is
//! fan-triangulated from its first vertex. Planarity and winding are taken as
//! given; a non-planar or inconsistently wound soup produces a mesh with the
//! same defects.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::core::Point3;
use super::face::Face3;
use super::mesh::ShapeGeometry;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CsgError {
    #[error("polygon {polygon} has {vertices} vertices, at least 3 are required")]
    ShortPolygon { polygon: usize, vertices: usize },
    #[error("polygon {polygon} has a non-finite vertex")]
    NonFiniteVertex { polygon: usize },
}

/// One boundary polygon, vertices in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsgPolygon {
    pub vertices: Vec<Point3>,
}

impl CsgPolygon {
    #[must_use]
    pub fn new(vertices: Vec<Point3>) -> Self {
        Self { vertices }
    }
}

impl From<Vec<[f64; 3]>> for CsgPolygon {
    fn from(points: Vec<[f64; 3]>) -> Self {
        Self::new(points.into_iter().map(Point3::from_array).collect())
    }
}

/// Bit-exact key with `-0.0` folded onto `0.0`.
fn position_key(p: Point3) -> [u64; 3] {
    p.to_array().map(|c| if c == 0.0 { 0.0_f64.to_bits() } else { c.to_bits() })
}

/// Converts polygons into a vertex/face list for the untextured mode.
pub fn csg_to_mesh(polygons: &[CsgPolygon]) -> Result<ShapeGeometry, CsgError> {
    let mut vertices: Vec<Point3> = Vec::new();
    let mut lookup: HashMap<[u64; 3], u32> = HashMap::new();
    let mut faces = Vec::new();
    let mut references = 0usize;

    for (polygon, poly) in polygons.iter().enumerate() {
        if poly.vertices.len() < 3 {
            return Err(CsgError::ShortPolygon {
                polygon,
                vertices: poly.vertices.len(),
            });
        }
        if poly.vertices.iter().any(|p| !p.is_finite()) {
            return Err(CsgError::NonFiniteVertex { polygon });
        }

        let indices: Vec<u32> = poly
            .vertices
            .iter()
            .map(|&p| {
                *lookup.entry(position_key(p)).or_insert_with(|| {
                    vertices.push(Point3::new(p.x, p.y, p.z));
                    (vertices.len() - 1) as u32
                })
            })
            .collect();
        references += indices.len();

        let pivot = indices[0];
        for pair in indices[1..].windows(2) {
            faces.push(Face3::new(pivot, pair[0], pair[1]));
        }
    }

    debug!(
        "csg: {} polygons, {} corner references merged into {} vertices",
        polygons.len(),
        references,
        vertices.len()
    );

    Ok(ShapeGeometry::new(vertices, faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MeshDiagnostics;

    fn cube_quads() -> Vec<CsgPolygon> {
        let c = |x: f64, y: f64, z: f64| [x, y, z];
        vec![
            vec![c(0., 0., 0.), c(0., 1., 0.), c(1., 1., 0.), c(1., 0., 0.)],
            vec![c(0., 0., 1.), c(1., 0., 1.), c(1., 1., 1.), c(0., 1., 1.)],
            vec![c(0., 0., 0.), c(1., 0., 0.), c(1., 0., 1.), c(0., 0., 1.)],
            vec![c(0., 1., 0.), c(0., 1., 1.), c(1., 1., 1.), c(1., 1., 0.)],
            vec![c(0., 0., 0.), c(0., 0., 1.), c(0., 1., 1.), c(0., 1., 0.)],
            vec![c(1., 0., 0.), c(1., 1., 0.), c(1., 1., 1.), c(1., 0., 1.)],
        ]
        .into_iter()
        .map(CsgPolygon::from)
        .collect()
    }

    #[test]
    fn cube_dedupes_to_eight_vertices() {
        let geometry = csg_to_mesh(&cube_quads()).unwrap();
        assert_eq!(geometry.vertex_count(), 8);
        assert_eq!(geometry.face_count(), 12);

        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert!(diag.is_closed_manifold());
        assert!((diag.signed_volume - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negative_zero_is_merged() {
        let polygons = vec![
            CsgPolygon::from(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            CsgPolygon::from(vec![[-0.0, 0.0, -0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
        ];
        let geometry = csg_to_mesh(&polygons).unwrap();
        assert_eq!(geometry.vertex_count(), 3);
    }

    #[test]
    fn fan_uses_first_vertex() {
        let pentagon = CsgPolygon::from(vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [-1.0, 1.0, 0.0],
        ]);
        let geometry = csg_to_mesh(&[pentagon]).unwrap();
        assert_eq!(
            geometry.faces,
            vec![Face3::new(0, 1, 2), Face3::new(0, 2, 3), Face3::new(0, 3, 4)]
        );
    }

    #[test]
    fn rejects_short_and_non_finite_polygons() {
        let short = CsgPolygon::from(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(
            csg_to_mesh(&[short]),
            Err(CsgError::ShortPolygon {
                polygon: 0,
                vertices: 2
            })
        );
        let nan = CsgPolygon::from(vec![[f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(csg_to_mesh(&[nan]), Err(CsgError::NonFiniteVertex { polygon: 0 }));
    }
}
