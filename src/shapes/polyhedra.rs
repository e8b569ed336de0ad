//! Subdivided platonic solids and cuboids.
//!
//! The tetrahedron subdivides Sierpinski-style: each level replaces every
//! tetrahedron by its four corner tetrahedra. Octahedra and icosahedra split
//! every triangle at its edge midpoints and push the new vertices onto the
//! circumscribed sphere; cuboids split the same way but stay flat.

use std::collections::HashMap;
use std::f64::consts::{PI, TAU};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geom::{Face3, Point3, ShapeGeometry, Vec3};

use super::{Shape, ShapeError, check_positive};

/// Highest accepted subdivision level.
pub const MAX_LEVEL: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolyhedronKind {
    Tetrahedron,
    Octahedron,
    #[default]
    Icosahedron,
    Cuboid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Polyhedron {
    pub kind: PolyhedronKind,
    pub level: usize,
    /// Circumradius for the platonic solids.
    pub radius: f64,
    /// Edge lengths along X, Y and Z for the cuboid.
    pub size: [f64; 3],
    pub center: Point3,
}

impl Default for Polyhedron {
    fn default() -> Self {
        Self {
            kind: PolyhedronKind::default(),
            level: 2,
            radius: 10.0,
            size: [10.0, 10.0, 10.0],
            center: Point3::ORIGIN,
        }
    }
}

impl Polyhedron {
    #[must_use]
    pub fn new(kind: PolyhedronKind, level: usize) -> Self {
        Self {
            kind,
            level,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ShapeError> {
        if self.level > MAX_LEVEL {
            return Err(ShapeError::LevelTooHigh {
                level: self.level,
                max: MAX_LEVEL,
            });
        }
        if !self.center.is_finite() {
            return Err(ShapeError::NonFinite {
                name: "center",
                value: f64::NAN,
            });
        }
        match self.kind {
            PolyhedronKind::Cuboid => {
                check_positive("size x", self.size[0])?;
                check_positive("size y", self.size[1])?;
                check_positive("size z", self.size[2])
            }
            _ => check_positive("radius", self.radius),
        }
    }

    /// Unit-scale base solid centred on the origin.
    fn base(&self) -> (Vec<Vec3>, Vec<Face3>) {
        match self.kind {
            PolyhedronKind::Tetrahedron => {
                let s = 1.0 / 3.0_f64.sqrt();
                let vertices = vec![
                    Vec3::new(s, s, s),
                    Vec3::new(s, -s, -s),
                    Vec3::new(-s, s, -s),
                    Vec3::new(-s, -s, s),
                ];
                let faces = tetra_faces([0, 1, 2, 3], &vertices);
                (vertices, faces)
            }
            PolyhedronKind::Octahedron => {
                let vertices = vec![Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
                let mut faces = [
                    [4, 0, 2],
                    [4, 2, 1],
                    [4, 1, 3],
                    [4, 3, 0],
                    [5, 2, 0],
                    [5, 1, 2],
                    [5, 3, 1],
                    [5, 0, 3],
                ]
                .map(Face3::from_array)
                .to_vec();
                orient_outward(&vertices, &mut faces, Vec3::ZERO);
                (vertices, faces)
            }
            PolyhedronKind::Icosahedron => {
                let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
                let vertices: Vec<Vec3> = [
                    [-1.0, t, 0.0],
                    [1.0, t, 0.0],
                    [-1.0, -t, 0.0],
                    [1.0, -t, 0.0],
                    [0.0, -1.0, t],
                    [0.0, 1.0, t],
                    [0.0, -1.0, -t],
                    [0.0, 1.0, -t],
                    [t, 0.0, -1.0],
                    [t, 0.0, 1.0],
                    [-t, 0.0, -1.0],
                    [-t, 0.0, 1.0],
                ]
                .iter()
                .map(|&v| Vec3::from(v).normalize_or_zero())
                .collect();
                let mut faces = [
                    [0, 11, 5],
                    [0, 5, 1],
                    [0, 1, 7],
                    [0, 7, 10],
                    [0, 10, 11],
                    [1, 5, 9],
                    [5, 11, 4],
                    [11, 10, 2],
                    [10, 7, 6],
                    [7, 1, 8],
                    [3, 9, 4],
                    [3, 4, 2],
                    [3, 2, 6],
                    [3, 6, 8],
                    [3, 8, 9],
                    [4, 9, 5],
                    [2, 4, 11],
                    [6, 2, 10],
                    [8, 6, 7],
                    [9, 8, 1],
                ]
                .map(Face3::from_array)
                .to_vec();
                orient_outward(&vertices, &mut faces, Vec3::ZERO);
                (vertices, faces)
            }
            PolyhedronKind::Cuboid => {
                let half = self.size.map(|s| 0.5 * s);
                let vertices: Vec<Vec3> = (0..8)
                    .map(|i| {
                        let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
                        Vec3::new(half[0] * sign(1), half[1] * sign(2), half[2] * sign(4))
                    })
                    .collect();
                let quads = [
                    [0, 2, 3, 1],
                    [4, 5, 7, 6],
                    [0, 1, 5, 4],
                    [2, 6, 7, 3],
                    [0, 4, 6, 2],
                    [1, 3, 7, 5],
                ];
                let mut faces = Vec::with_capacity(12);
                for [a, b, c, d] in quads {
                    faces.push(Face3::new(a, b, c));
                    faces.push(Face3::new(c, d, a));
                }
                orient_outward(&vertices, &mut faces, Vec3::ZERO);
                (vertices, faces)
            }
        }
    }
}

impl Shape for Polyhedron {
    fn name(&self) -> &'static str {
        match self.kind {
            PolyhedronKind::Tetrahedron => "tetrahedron",
            PolyhedronKind::Octahedron => "octahedron",
            PolyhedronKind::Icosahedron => "icosahedron",
            PolyhedronKind::Cuboid => "cuboid",
        }
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.validate()?;

        let (mut vertices, mut faces) = self.base();
        match self.kind {
            PolyhedronKind::Tetrahedron => {
                let (v, f) = sierpinski(vertices, self.level);
                vertices = v;
                faces = f;
            }
            PolyhedronKind::Octahedron | PolyhedronKind::Icosahedron => {
                for _ in 0..self.level {
                    midpoint_subdivide(&mut vertices, &mut faces);
                    for v in &mut vertices {
                        *v = v.normalize_or_zero();
                    }
                }
            }
            PolyhedronKind::Cuboid => {
                for _ in 0..self.level {
                    midpoint_subdivide(&mut vertices, &mut faces);
                }
            }
        }

        let scale = match self.kind {
            PolyhedronKind::Cuboid => 1.0,
            _ => self.radius,
        };
        let center = self.center.to_vec3();
        let tex_coords: Vec<[f64; 2]> = vertices.iter().map(|&v| spherical_uv(v)).collect();
        let points: Vec<Point3> = vertices
            .iter()
            .zip(&tex_coords)
            .map(|(&v, uv)| Point3::from(v.mul_scalar(scale).add(center)).with_f(uv[1]))
            .collect();

        debug!(
            "{} level {}: {} vertices, {} faces",
            self.name(),
            self.level,
            points.len(),
            faces.len()
        );

        Ok(ShapeGeometry::new(points, faces).with_texture(tex_coords, None))
    }
}

/// UV from longitude and colatitude of a direction.
fn spherical_uv(v: Vec3) -> [f64; 2] {
    let r = v.length();
    if r == 0.0 {
        return [0.5, 0.5];
    }
    let u = 0.5 + v.y.atan2(v.x) / TAU;
    let w = (v.z / r).clamp(-1.0, 1.0).acos() / PI;
    [u, w]
}

/// Flips every face whose normal points towards `center`. Only valid for
/// convex solids.
fn orient_outward(vertices: &[Vec3], faces: &mut [Face3], center: Vec3) {
    for face in faces.iter_mut() {
        let [a, b, c] = face.to_array().map(|i| vertices[i as usize]);
        let normal = b.sub(a).cross(c.sub(a));
        let centroid = a.add(b).add(c).div_scalar(3.0);
        if normal.dot(centroid.sub(center)) < 0.0 {
            *face = face.reversed();
        }
    }
}

/// The four outward faces of one tetrahedron.
fn tetra_faces(corners: [u32; 4], vertices: &[Vec3]) -> Vec<Face3> {
    let [a, b, c, d] = corners;
    let mut faces = vec![
        Face3::new(a, b, c),
        Face3::new(a, c, d),
        Face3::new(a, d, b),
        Face3::new(b, d, c),
    ];
    let centroid = corners
        .iter()
        .fold(Vec3::ZERO, |acc, &i| acc.add(vertices[i as usize]))
        .div_scalar(4.0);
    orient_outward(vertices, &mut faces, centroid);
    faces
}

/// Index of the midpoint of `(a, b)`, created once per edge.
fn midpoint(vertices: &mut Vec<Vec3>, cache: &mut HashMap<(u32, u32), u32>, a: u32, b: u32) -> u32 {
    let key = (a.min(b), a.max(b));
    *cache.entry(key).or_insert_with(|| {
        let m = vertices[a as usize].lerp(vertices[b as usize], 0.5);
        vertices.push(m);
        (vertices.len() - 1) as u32
    })
}

fn sierpinski(mut vertices: Vec<Vec3>, level: usize) -> (Vec<Vec3>, Vec<Face3>) {
    let mut tetras: Vec<[u32; 4]> = vec![[0, 1, 2, 3]];
    for _ in 0..level {
        let mut cache = HashMap::new();
        let mut next = Vec::with_capacity(tetras.len() * 4);
        for [a, b, c, d] in tetras {
            let ab = midpoint(&mut vertices, &mut cache, a, b);
            let ac = midpoint(&mut vertices, &mut cache, a, c);
            let ad = midpoint(&mut vertices, &mut cache, a, d);
            let bc = midpoint(&mut vertices, &mut cache, b, c);
            let bd = midpoint(&mut vertices, &mut cache, b, d);
            let cd = midpoint(&mut vertices, &mut cache, c, d);
            next.push([a, ab, ac, ad]);
            next.push([ab, b, bc, bd]);
            next.push([ac, bc, c, cd]);
            next.push([ad, bd, cd, d]);
        }
        tetras = next;
    }

    let faces = tetras
        .iter()
        .flat_map(|&corners| tetra_faces(corners, &vertices))
        .collect();
    (vertices, faces)
}

/// Splits every face into four at its edge midpoints, keeping winding.
fn midpoint_subdivide(vertices: &mut Vec<Vec3>, faces: &mut Vec<Face3>) {
    let mut cache = HashMap::new();
    let mut next = Vec::with_capacity(faces.len() * 4);
    for face in faces.iter() {
        let Face3 { a, b, c } = *face;
        let ab = midpoint(vertices, &mut cache, a, b);
        let bc = midpoint(vertices, &mut cache, b, c);
        let ca = midpoint(vertices, &mut cache, c, a);
        next.push(Face3::new(a, ab, ca));
        next.push(Face3::new(ab, b, bc));
        next.push(Face3::new(ca, bc, c));
        next.push(Face3::new(ab, bc, ca));
    }
    *faces = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::MeshDiagnostics;

    fn diag(kind: PolyhedronKind, level: usize) -> MeshDiagnostics {
        MeshDiagnostics::from_geometry(&Polyhedron::new(kind, level).build().unwrap())
    }

    #[test]
    fn face_counts_per_level() {
        assert_eq!(diag(PolyhedronKind::Tetrahedron, 0).triangle_count, 4);
        assert_eq!(diag(PolyhedronKind::Tetrahedron, 2).triangle_count, 4 * 16);
        assert_eq!(diag(PolyhedronKind::Octahedron, 1).triangle_count, 32);
        assert_eq!(diag(PolyhedronKind::Icosahedron, 0).vertex_count, 12);
        assert_eq!(diag(PolyhedronKind::Icosahedron, 1).vertex_count, 42);
        assert_eq!(diag(PolyhedronKind::Icosahedron, 2).triangle_count, 320);
        assert_eq!(diag(PolyhedronKind::Cuboid, 1).triangle_count, 48);
    }

    #[test]
    fn every_kind_is_closed_and_outward() {
        for kind in [
            PolyhedronKind::Tetrahedron,
            PolyhedronKind::Octahedron,
            PolyhedronKind::Icosahedron,
            PolyhedronKind::Cuboid,
        ] {
            for level in 0..=2 {
                let d = diag(kind, level);
                assert!(d.is_closed_manifold(), "{kind:?} level {level}: {}", d.summary());
                assert_eq!(d.orphan_vertex_count, 0);
                assert!(d.signed_volume > 0.0, "{kind:?} level {level}");
            }
        }
    }

    #[test]
    fn cuboid_volume_is_exact() {
        let cuboid = Polyhedron {
            kind: PolyhedronKind::Cuboid,
            size: [1.0, 2.0, 3.0],
            level: 1,
            ..Polyhedron::default()
        };
        let d = MeshDiagnostics::from_geometry(&cuboid.build().unwrap());
        assert!((d.signed_volume - 6.0).abs() < 1e-9);
    }

    #[test]
    fn geodesic_vertices_lie_on_sphere() {
        let ico = Polyhedron {
            center: Point3::new(1.0, -1.0, 2.0),
            radius: 3.0,
            ..Polyhedron::new(PolyhedronKind::Icosahedron, 3)
        };
        let geometry = ico.build().unwrap();
        for p in &geometry.vertices {
            assert!((p.distance_to(ico.center) - 3.0).abs() < 1e-9);
        }
        assert_eq!(geometry.tex_coords.len(), geometry.vertex_count());
    }

    #[test]
    fn level_above_six_is_rejected() {
        assert_eq!(
            Polyhedron::new(PolyhedronKind::Octahedron, 7).build(),
            Err(ShapeError::LevelTooHigh { level: 7, max: 6 })
        );
    }
}
