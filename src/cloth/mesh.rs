//! Cloth grid construction: point masses, links and the render buffers whose
//! topology stays fixed for the cloth's lifetime.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geom::{Face3, MeshBuffers, Point3, TextureMode, Vec3, assemble};

use super::ClothError;
use super::point::{PointLink, WeightedPoint};

/// Smallest number of points along either side of the grid.
pub const MIN_CLOTH_POINTS: usize = 2;

/// Which points start pinned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothAnchors {
    None,
    #[default]
    TopCorners,
    TopEdge,
    Points(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothParams {
    pub width: f64,
    pub height: f64,
    /// Points along X.
    pub divisions_x: usize,
    /// Points along Y.
    pub divisions_y: usize,
    pub point_mass: f64,
    pub stretch_strength: f64,
    pub shear_strength: f64,
    pub bend_strength: f64,
    pub damping: f64,
    /// Relaxation passes per step.
    pub accuracy: usize,
    pub gravity: [f64; 3],
    #[serde(with = "millis")]
    pub fixed_step: Duration,
    /// Steps per tick beyond which accumulated time is dropped.
    pub max_steps: usize,
    pub anchors: ClothAnchors,
}

impl Default for ClothParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
            divisions_x: 10,
            divisions_y: 10,
            point_mass: 1.0,
            stretch_strength: 0.98,
            shear_strength: 0.98,
            bend_strength: 0.5,
            damping: 0.99,
            accuracy: 4,
            gravity: [0.0, -9.81, 0.0],
            fixed_step: Duration::from_millis(16),
            max_steps: 5,
            anchors: ClothAnchors::default(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        let nanos = (ms * 1e6).round();
        if !(nanos.is_finite() && nanos >= 0.0 && nanos < u64::MAX as f64) {
            return Err(serde::de::Error::custom(format!("invalid step of {ms} ms")));
        }
        Ok(Duration::from_nanos(nanos as u64))
    }
}

impl ClothParams {
    #[must_use]
    pub fn new(width: f64, height: f64, divisions_x: usize, divisions_y: usize) -> Self {
        Self {
            width,
            height,
            divisions_x,
            divisions_y,
            ..Self::default()
        }
    }

    /// Same stiffness for every link family.
    #[must_use]
    pub fn with_stiffness(self, stiffness: f64) -> Self {
        Self {
            stretch_strength: stiffness,
            shear_strength: stiffness,
            bend_strength: stiffness,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ClothError> {
        for (name, value) in [("divisions x", self.divisions_x), ("divisions y", self.divisions_y)] {
            if value < MIN_CLOTH_POINTS {
                return Err(ClothError::InvalidDivisions {
                    name,
                    value,
                    min: MIN_CLOTH_POINTS,
                });
            }
        }
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("point mass", self.point_mass),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ClothError::InvalidParameter { name, value });
            }
        }
        for (name, value) in [
            ("stretch strength", self.stretch_strength),
            ("shear strength", self.shear_strength),
            ("bend strength", self.bend_strength),
            ("damping", self.damping),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ClothError::InvalidParameter { name, value });
            }
        }
        if let Some(&value) = self.gravity.iter().find(|g| !g.is_finite()) {
            return Err(ClothError::InvalidParameter {
                name: "gravity",
                value,
            });
        }
        if self.fixed_step.is_zero() {
            return Err(ClothError::InvalidParameter {
                name: "fixed step",
                value: 0.0,
            });
        }
        if self.accuracy == 0 || self.max_steps == 0 {
            return Err(ClothError::InvalidParameter {
                name: if self.accuracy == 0 { "accuracy" } else { "max steps" },
                value: 0.0,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.divisions_x * self.divisions_y
    }

    #[must_use]
    pub fn index(&self, i: usize, j: usize) -> usize {
        j * self.divisions_x + i
    }
}

/// Flat cloth in the XY plane, row 0 at the top (`y = height`).
#[derive(Debug, Clone)]
pub struct ClothMesh {
    params: ClothParams,
    points: Vec<WeightedPoint>,
    links: Vec<PointLink>,
    buffers: MeshBuffers,
}

impl ClothMesh {
    pub fn new(params: ClothParams) -> Result<Self, ClothError> {
        Self::with_texture(params, &TextureMode::Image)
    }

    pub fn with_texture(params: ClothParams, texture: &TextureMode) -> Result<Self, ClothError> {
        params.validate()?;
        let (nx, ny) = (params.divisions_x, params.divisions_y);

        let mut vertices = Vec::with_capacity(params.point_count());
        let mut tex_coords = Vec::with_capacity(params.point_count());
        for j in 0..ny {
            let v = j as f64 / (ny - 1) as f64;
            for i in 0..nx {
                let u = i as f64 / (nx - 1) as f64;
                vertices.push(Point3::new(params.width * u, params.height * (1.0 - v), 0.0).with_f(v));
                tex_coords.push([u, v]);
            }
        }

        let mut points: Vec<WeightedPoint> = vertices
            .iter()
            .map(|p| WeightedPoint::new(p.to_vec3(), params.point_mass))
            .collect();

        let anchored: Vec<usize> = match &params.anchors {
            ClothAnchors::None => Vec::new(),
            ClothAnchors::TopCorners => vec![0, nx - 1],
            ClothAnchors::TopEdge => (0..nx).collect(),
            ClothAnchors::Points(indices) => indices.clone(),
        };
        for index in anchored {
            let len = points.len();
            let point = points
                .get_mut(index)
                .ok_or(ClothError::AnchorOutOfRange { index, len })?;
            point.anchored = true;
        }

        let links = build_links(&params, &points);

        let mut faces = Vec::with_capacity(2 * (nx - 1) * (ny - 1));
        for j in 0..ny - 1 {
            for i in 0..nx - 1 {
                let a = params.index(i, j) as u32;
                let b = params.index(i + 1, j) as u32;
                let c = params.index(i + 1, j + 1) as u32;
                let d = params.index(i, j + 1) as u32;
                faces.push(Face3::new(a, d, c));
                faces.push(Face3::new(c, b, a));
            }
        }

        let buffers = assemble(&vertices, &faces, None, &tex_coords, texture)?;
        debug!(
            "cloth: {}x{} points, {} links",
            nx,
            ny,
            links.len()
        );

        Ok(Self {
            params,
            points,
            links,
            buffers,
        })
    }

    pub fn params(&self) -> &ClothParams {
        &self.params
    }

    pub fn points(&self) -> &[WeightedPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [WeightedPoint] {
        &mut self.points
    }

    pub fn links(&self) -> &[PointLink] {
        &self.links
    }

    pub fn buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    /// Pins or releases a point.
    pub fn set_anchored(&mut self, index: usize, anchored: bool) -> Result<(), ClothError> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(ClothError::AnchorOutOfRange { index, len })?;
        point.anchored = anchored;
        point.old_position = point.position;
        Ok(())
    }

    /// Copies point positions into the vertex buffer in place.
    pub fn write_vertices(&mut self) {
        for (i, point) in self.points.iter().enumerate() {
            let p = point.position;
            self.buffers.set_vertex(i, [p.x as f32, p.y as f32, p.z as f32]);
        }
    }

    #[must_use]
    pub fn vertex_snapshot(&self) -> Vec<[f32; 3]> {
        (0..self.buffers.vertex_count())
            .filter_map(|i| self.buffers.vertex(i))
            .collect()
    }
}

fn build_links(params: &ClothParams, points: &[WeightedPoint]) -> Vec<PointLink> {
    let (nx, ny) = (params.divisions_x, params.divisions_y);
    let mut links = Vec::new();
    let mut link = |i0: usize, j0: usize, i1: usize, j1: usize, stiffness: f64| {
        if i1 >= nx || j1 >= ny {
            return;
        }
        let a = params.index(i0, j0);
        let b = params.index(i1, j1);
        let rest = points[a].position.sub(points[b].position).length();
        links.push(PointLink::new(a as u32, b as u32, rest, stiffness));
    };

    for j in 0..ny {
        for i in 0..nx {
            link(i, j, i + 1, j, params.stretch_strength);
            link(i, j, i, j + 1, params.stretch_strength);
            link(i, j, i + 1, j + 1, params.shear_strength);
            if i + 1 < nx {
                link(i + 1, j, i, j + 1, params.shear_strength);
            }
            link(i, j, i + 2, j, params.bend_strength);
            link(i, j, i, j + 2, params.bend_strength);
        }
    }
    links
}

pub(crate) fn gravity_vector(params: &ClothParams) -> Vec3 {
    Vec3::from_array(params.gravity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts_and_links() {
        let cloth = ClothMesh::new(ClothParams::new(3.0, 2.0, 4, 3)).unwrap();
        assert_eq!(cloth.points().len(), 12);
        assert_eq!(cloth.buffers().face_count(), 2 * 3 * 2);

        // structural 3·3 + 4·2, shear 2·3·2, bend 2·3 + 4·1
        assert_eq!(cloth.links().len(), 17 + 12 + 10);
        assert!(cloth.links().iter().all(|l| l.rest_length > 0.0));
    }

    #[test]
    fn top_corners_are_pinned() {
        let cloth = ClothMesh::new(ClothParams::new(1.0, 1.0, 5, 5)).unwrap();
        let pinned: Vec<usize> = cloth
            .points()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.anchored)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(pinned, vec![0, 4]);
        assert_eq!(cloth.points()[0].position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn faces_face_plus_z() {
        let cloth = ClothMesh::new(ClothParams::new(1.0, 1.0, 3, 3)).unwrap();
        let buffers = cloth.buffers();
        for face in buffers.vertex_faces() {
            let [a, b, c] = face.to_array().map(|i| {
                let v = buffers.vertex(i as usize).unwrap();
                Vec3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]))
            });
            assert!(b.sub(a).cross(c.sub(a)).z > 0.0);
        }
    }

    #[test]
    fn rejects_bad_params() {
        assert!(matches!(
            ClothMesh::new(ClothParams::new(1.0, 1.0, 1, 4)),
            Err(ClothError::InvalidDivisions { .. })
        ));
        let params = ClothParams {
            anchors: ClothAnchors::Points(vec![99]),
            ..ClothParams::new(1.0, 1.0, 3, 3)
        };
        assert_eq!(
            ClothMesh::new(params).unwrap_err(),
            ClothError::AnchorOutOfRange { index: 99, len: 9 }
        );
        let params = ClothParams {
            fixed_step: Duration::ZERO,
            ..ClothParams::default()
        };
        assert!(matches!(params.validate(), Err(ClothError::InvalidParameter { .. })));
    }

    #[test]
    fn params_deserialize_partially() {
        let params: ClothParams =
            serde_json::from_str(r#"{"divisions_x": 6, "fixed_step": 8.0}"#).unwrap();
        assert_eq!(params.divisions_x, 6);
        assert_eq!(params.fixed_step, Duration::from_millis(8));
        assert_eq!(params.accuracy, 4);
    }
}
