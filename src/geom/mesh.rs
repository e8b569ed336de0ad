//! Triangle-mesh assembly: raw vertex/face lists plus a texture mode in,
//! flat renderer-ready buffers out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::core::Point3;
use super::density::{DensityFunction, DensityRange, ExpressionError, density_bucket};
use super::face::Face3;
use super::palette::Palette;

/// Smoothing group written for every face.
pub const SMOOTHING_GROUP: u32 = 1;

/// How texture coordinates and face texture indices are produced.
#[derive(Debug, Clone, Default)]
pub enum TextureMode {
    /// Single dummy coordinate.
    #[default]
    None,
    /// Supplied UV list, indexed by the texture faces (or by vertex index).
    Image,
    /// Palette lookup per vertex, bucketed by a density of the tag `f`.
    ColoredVertices1D {
        colors: usize,
        density: DensityFunction,
        range: DensityRange,
    },
    /// Palette lookup per vertex, bucketed by a density of the position.
    ColoredVertices3D {
        colors: usize,
        density: DensityFunction,
        range: DensityRange,
    },
    /// Palette lookup per face, bucketed by face ordinal.
    ColoredFaces { colors: usize },
}

impl TextureMode {
    /// Arc-length coloring with `colors` buckets.
    #[must_use]
    pub fn colored_by_arc_length(colors: usize) -> Self {
        Self::ColoredVertices1D {
            colors,
            density: DensityFunction::arc_fraction(),
            range: DensityRange::Auto,
        }
    }

    /// Distance-from-origin coloring with `colors` buckets.
    #[must_use]
    pub fn colored_by_radius(colors: usize) -> Self {
        Self::ColoredVertices3D {
            colors,
            density: DensityFunction::radial(),
            range: DensityRange::Auto,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Image => "image",
            Self::ColoredVertices1D { .. } => "colored_vertices_1d",
            Self::ColoredVertices3D { .. } => "colored_vertices_3d",
            Self::ColoredFaces { .. } => "colored_faces",
        }
    }

    /// Palette size of the colored modes.
    #[must_use]
    pub const fn colors(&self) -> Option<usize> {
        match self {
            Self::ColoredVertices1D { colors, .. }
            | Self::ColoredVertices3D { colors, .. }
            | Self::ColoredFaces { colors } => Some(*colors),
            Self::None | Self::Image => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("face {face} references vertex {index} but the mesh has {len} vertices")]
    FaceIndexOutOfBounds { face: usize, index: u32, len: usize },
    #[error("texture face {face} references coordinate {index} but only {len} exist")]
    TexCoordIndexOutOfBounds { face: usize, index: u32, len: usize },
    #[error("texture face list has {texture_faces} entries for {faces} faces")]
    TextureFacesTooShort { texture_faces: usize, faces: usize },
    #[error("image mode without texture faces needs a coordinate per vertex ({tex_coords} for {vertices} vertices)")]
    TexCoordsTooShort { tex_coords: usize, vertices: usize },
    #[error("palette must have at least one color")]
    EmptyPalette,
    #[error("vertex {index} has non-finite coordinates")]
    NonFiniteVertex { index: usize },
    #[error("density function failed: {0}")]
    Density(#[from] ExpressionError),
    #[error("{buffer} buffer length {len} is not a multiple of {stride}")]
    BufferLength {
        buffer: &'static str,
        len: usize,
        stride: usize,
    },
    #[error("smoothing group count {groups} does not match face count {faces}")]
    SmoothingGroups { groups: usize, faces: usize },
}

// ─── MeshBuffers ────────────────────────────────────────────────────────────

/// Flat, renderer-ready triangle mesh.
///
/// `faces` stores six indices per triangle, `v0, t0, v1, t1, v2, t2`, where
/// `v*` index `points` (three floats per vertex) and `t*` index `tex_coords`
/// (two floats per entry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub points: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub faces: Vec<u32>,
    pub face_smoothing_groups: Vec<u32>,
}

impl MeshBuffers {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len() / 3
    }

    #[must_use]
    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len() / 2
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len() / 6
    }

    #[must_use]
    pub fn vertex(&self, i: usize) -> Option<[f32; 3]> {
        let chunk = self.points.get(3 * i..3 * i + 3)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }

    #[must_use]
    pub fn tex_coord(&self, i: usize) -> Option<[f32; 2]> {
        let chunk = self.tex_coords.get(2 * i..2 * i + 2)?;
        Some([chunk[0], chunk[1]])
    }

    /// `[v0, t0, v1, t1, v2, t2]` of triangle `i`.
    #[must_use]
    pub fn face(&self, i: usize) -> Option<[u32; 6]> {
        let chunk = self.faces.get(6 * i..6 * i + 6)?;
        let mut face = [0; 6];
        face.copy_from_slice(chunk);
        Some(face)
    }

    /// Vertex indices of every triangle.
    pub fn vertex_faces(&self) -> impl Iterator<Item = Face3> + '_ {
        self.faces
            .chunks_exact(6)
            .map(|f| Face3::new(f[0], f[2], f[4]))
    }

    /// Overwrites vertex `i` in place.
    pub fn set_vertex(&mut self, i: usize, position: [f32; 3]) {
        if let Some(chunk) = self.points.get_mut(3 * i..3 * i + 3) {
            chunk.copy_from_slice(&position);
        }
    }

    pub fn validate(&self) -> Result<(), AssemblyError> {
        for (buffer, len, stride) in [
            ("points", self.points.len(), 3),
            ("tex_coords", self.tex_coords.len(), 2),
            ("faces", self.faces.len(), 6),
        ] {
            if len % stride != 0 {
                return Err(AssemblyError::BufferLength {
                    buffer,
                    len,
                    stride,
                });
            }
        }

        if self.face_smoothing_groups.len() != self.face_count() {
            return Err(AssemblyError::SmoothingGroups {
                groups: self.face_smoothing_groups.len(),
                faces: self.face_count(),
            });
        }

        if let Some(index) = self.points.chunks_exact(3).position(|p| p.iter().any(|c| !c.is_finite())) {
            return Err(AssemblyError::NonFiniteVertex { index });
        }

        let vertices = self.vertex_count();
        let tex_coords = self.tex_coord_count();
        for (face, chunk) in self.faces.chunks_exact(6).enumerate() {
            for corner in chunk.chunks_exact(2) {
                if corner[0] as usize >= vertices {
                    return Err(AssemblyError::FaceIndexOutOfBounds {
                        face,
                        index: corner[0],
                        len: vertices,
                    });
                }
                if corner[1] as usize >= tex_coords {
                    return Err(AssemblyError::TexCoordIndexOutOfBounds {
                        face,
                        index: corner[1],
                        len: tex_coords,
                    });
                }
            }
        }
        Ok(())
    }
}

// ─── Assembly ───────────────────────────────────────────────────────────────

/// Builds flat buffers from vertex/face lists under a texture mode.
///
/// `texture_faces`, when present, must be parallel to `faces` and index
/// `tex_coords`; it is only consulted in [`TextureMode::Image`].
pub fn assemble(
    vertices: &[Point3],
    faces: &[Face3],
    texture_faces: Option<&[Face3]>,
    tex_coords: &[[f64; 2]],
    mode: &TextureMode,
) -> Result<MeshBuffers, AssemblyError> {
    for (face, f) in faces.iter().enumerate() {
        if let Some(&index) = f.to_array().iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(AssemblyError::FaceIndexOutOfBounds {
                face,
                index,
                len: vertices.len(),
            });
        }
    }
    if let Some(index) = vertices.iter().position(|p| !p.is_finite()) {
        return Err(AssemblyError::NonFiniteVertex { index });
    }

    let points = vertices
        .iter()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect();

    let (uvs, face_tex): (Vec<[f64; 2]>, Vec<Face3>) = match mode {
        TextureMode::None => (vec![[0.0, 0.0]], vec![Face3::new(0, 0, 0); faces.len()]),
        TextureMode::Image => image_texture(vertices, faces, texture_faces, tex_coords)?,
        TextureMode::ColoredVertices1D {
            colors,
            density,
            range,
        }
        | TextureMode::ColoredVertices3D {
            colors,
            density,
            range,
        } => {
            let colors = non_empty_palette(*colors)?;
            let values = density.values(vertices)?;
            let (min, max) = range.extremes(&values);
            let buckets: Vec<u32> = values
                .iter()
                .map(|&d| density_bucket(d, min, max, colors) as u32)
                .collect();
            let face_tex = faces
                .iter()
                .map(|f| {
                    Face3::new(
                        buckets[f.a as usize],
                        buckets[f.b as usize],
                        buckets[f.c as usize],
                    )
                })
                .collect();
            (Palette::with_colors(colors).tex_coords(), face_tex)
        }
        TextureMode::ColoredFaces { colors } => {
            let colors = non_empty_palette(*colors)?;
            let count = faces.len() as u64;
            let face_tex = (0..faces.len())
                .map(|i| {
                    let bucket = (i as u64 * colors as u64 / count) as u32;
                    Face3::new(bucket, bucket, bucket)
                })
                .collect();
            (Palette::with_colors(colors).tex_coords(), face_tex)
        }
    };

    let mut flat_faces = Vec::with_capacity(faces.len() * 6);
    for (f, t) in faces.iter().zip(&face_tex) {
        flat_faces.extend_from_slice(&[f.a, t.a, f.b, t.b, f.c, t.c]);
    }

    Ok(MeshBuffers {
        points,
        tex_coords: uvs.iter().flat_map(|uv| [uv[0] as f32, uv[1] as f32]).collect(),
        faces: flat_faces,
        face_smoothing_groups: vec![SMOOTHING_GROUP; faces.len()],
    })
}

fn non_empty_palette(colors: usize) -> Result<usize, AssemblyError> {
    if colors == 0 {
        Err(AssemblyError::EmptyPalette)
    } else {
        Ok(colors)
    }
}

fn image_texture(
    vertices: &[Point3],
    faces: &[Face3],
    texture_faces: Option<&[Face3]>,
    tex_coords: &[[f64; 2]],
) -> Result<(Vec<[f64; 2]>, Vec<Face3>), AssemblyError> {
    let face_tex = match texture_faces {
        Some(texture_faces) => {
            if texture_faces.len() < faces.len() {
                return Err(AssemblyError::TextureFacesTooShort {
                    texture_faces: texture_faces.len(),
                    faces: faces.len(),
                });
            }
            let face_tex = &texture_faces[..faces.len()];
            for (face, t) in face_tex.iter().enumerate() {
                if let Some(&index) = t.to_array().iter().find(|&&i| i as usize >= tex_coords.len()) {
                    return Err(AssemblyError::TexCoordIndexOutOfBounds {
                        face,
                        index,
                        len: tex_coords.len(),
                    });
                }
            }
            face_tex.to_vec()
        }
        None => {
            if tex_coords.len() < vertices.len() {
                return Err(AssemblyError::TexCoordsTooShort {
                    tex_coords: tex_coords.len(),
                    vertices: vertices.len(),
                });
            }
            faces.to_vec()
        }
    };
    Ok((tex_coords.to_vec(), face_tex))
}

// ─── ShapeGeometry ──────────────────────────────────────────────────────────

/// Raw output of a generator, before texture-mode assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeGeometry {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Face3>,
    pub tex_coords: Vec<[f64; 2]>,
    /// Parallel to `faces`; `None` means texture coordinates are per vertex.
    pub texture_faces: Option<Vec<Face3>>,
    /// Frenet frames along swept centerlines that needed a fallback.
    pub fallback_frames: usize,
}

impl ShapeGeometry {
    #[must_use]
    pub fn new(vertices: Vec<Point3>, faces: Vec<Face3>) -> Self {
        Self {
            vertices,
            faces,
            tex_coords: Vec::new(),
            texture_faces: None,
            fallback_frames: 0,
        }
    }

    #[must_use]
    pub fn with_texture(mut self, tex_coords: Vec<[f64; 2]>, texture_faces: Option<Vec<Face3>>) -> Self {
        self.tex_coords = tex_coords;
        self.texture_faces = texture_faces;
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn assemble(&self, mode: &TextureMode) -> Result<MeshBuffers, AssemblyError> {
        assemble(
            &self.vertices,
            &self.faces,
            self.texture_faces.as_deref(),
            &self.tex_coords,
            mode,
        )
    }

    /// Appends another geometry, offsetting its vertex and texture indices.
    /// A part without texture faces contributes its vertex faces as texture
    /// faces, which keeps per-vertex UVs aligned.
    pub fn append(&mut self, other: ShapeGeometry) {
        if self.vertices.is_empty() && self.faces.is_empty() {
            *self = other;
            return;
        }

        let vertex_offset = self.vertices.len() as u32;
        let tex_offset = self.tex_coords.len() as u32;

        let own_tex = self.texture_faces.take().unwrap_or_else(|| self.faces.clone());
        let other_tex = other.texture_faces.unwrap_or_else(|| other.faces.clone());

        self.vertices.extend(other.vertices);
        self.faces
            .extend(other.faces.iter().map(|f| f.offset(vertex_offset)));
        self.tex_coords.extend(other.tex_coords);
        self.fallback_frames += other.fallback_frames;

        let mut texture_faces = own_tex;
        texture_faces.extend(other_tex.iter().map(|f| f.offset(tex_offset)));
        self.texture_faces = Some(texture_faces);
    }
}

// ─── Topology helpers ───────────────────────────────────────────────────────

/// `(open, non_manifold)` undirected edge counts. Degenerate faces are skipped.
#[must_use]
pub fn edge_topology(faces: &[Face3]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for face in faces.iter().filter(|f| !f.is_degenerate()) {
        for (ea, eb) in face.edges() {
            let key = if ea <= eb { (ea, eb) } else { (eb, ea) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    let mut open_edge_count = 0usize;
    let mut non_manifold_edge_count = 0usize;
    for count in edge_counts.into_values() {
        if count == 1 {
            open_edge_count += 1;
        } else if count > 2 {
            non_manifold_edge_count += 1;
        }
    }

    (open_edge_count, non_manifold_edge_count)
}

/// Directed edges used by more than one face. Zero on a consistently wound
/// closed surface.
#[must_use]
pub fn inconsistent_edge_count(faces: &[Face3]) -> usize {
    let mut directed: HashMap<(u32, u32), u32> = HashMap::new();
    for face in faces.iter().filter(|f| !f.is_degenerate()) {
        for edge in face.edges() {
            *directed.entry(edge).or_insert(0) += 1;
        }
    }
    directed.into_values().filter(|&c| c > 1).count()
}

/// Vertices no face references.
#[must_use]
pub fn orphan_vertex_count(vertex_count: usize, faces: &[Face3]) -> usize {
    let mut used = vec![false; vertex_count];
    for face in faces {
        for i in face.to_array() {
            if let Some(slot) = used.get_mut(i as usize) {
                *slot = true;
            }
        }
    }
    used.into_iter().filter(|u| !u).count()
}

/// Faces with repeated indices or (near) zero area.
#[must_use]
pub fn degenerate_face_count(vertices: &[Point3], faces: &[Face3], eps: f64) -> usize {
    faces
        .iter()
        .filter(|f| {
            if f.is_degenerate() {
                return true;
            }
            let (Some(a), Some(b), Some(c)) = (
                vertices.get(f.a as usize),
                vertices.get(f.b as usize),
                vertices.get(f.c as usize),
            ) else {
                return true;
            };
            b.sub_point(*a).cross(c.sub_point(*a)).length() <= eps
        })
        .count()
}

/// Signed enclosed volume; positive when faces wind CCW seen from outside.
#[must_use]
pub fn signed_volume(vertices: &[Point3], faces: &[Face3]) -> f64 {
    let mut volume = 0.0;
    for f in faces {
        let (Some(a), Some(b), Some(c)) = (
            vertices.get(f.a as usize),
            vertices.get(f.b as usize),
            vertices.get(f.c as usize),
        ) else {
            continue;
        };
        volume += a.to_vec3().dot(b.to_vec3().cross(c.to_vec3()));
    }
    volume / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (Vec<Point3>, Vec<Face3>) {
        (
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0).with_f(0.5),
                Point3::new(1.0, 1.0, 0.0).with_f(1.0),
                Point3::new(0.0, 1.0, 0.0).with_f(0.5),
            ],
            vec![Face3::new(0, 1, 2), Face3::new(2, 3, 0)],
        )
    }

    #[test]
    fn none_mode_uses_single_dummy_coordinate() {
        let (v, f) = quad();
        let mesh = assemble(&v, &f, None, &[], &TextureMode::None).unwrap();
        assert_eq!(mesh.tex_coords, vec![0.0, 0.0]);
        assert_eq!(mesh.faces, vec![0, 0, 1, 0, 2, 0, 2, 0, 3, 0, 0, 0]);
        assert_eq!(mesh.face_smoothing_groups, vec![1, 1]);
        mesh.validate().unwrap();
    }

    #[test]
    fn image_mode_falls_back_to_vertex_indices() {
        let (v, f) = quad();
        let uvs = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mesh = assemble(&v, &f, None, &uvs, &TextureMode::Image).unwrap();
        assert_eq!(mesh.face(1), Some([2, 2, 3, 3, 0, 0]));

        let short = assemble(&v, &f, None, &uvs[..2], &TextureMode::Image);
        assert!(matches!(short, Err(AssemblyError::TexCoordsTooShort { .. })));
    }

    #[test]
    fn short_texture_face_list_is_an_error() {
        let (v, f) = quad();
        let uvs = vec![[0.0, 0.0]];
        let tf = vec![Face3::new(0, 0, 0)];
        let result = assemble(&v, &f, Some(&tf), &uvs, &TextureMode::Image);
        assert_eq!(
            result,
            Err(AssemblyError::TextureFacesTooShort {
                texture_faces: 1,
                faces: 2
            })
        );
    }

    #[test]
    fn colored_vertices_bucket_by_density() {
        let (v, f) = quad();
        let mesh = assemble(&v, &f, None, &[], &TextureMode::colored_by_arc_length(4)).unwrap();
        assert_eq!(mesh.tex_coord_count(), 4);
        // f = 0, 0.5, 1.0 -> buckets 0, 2, 3
        assert_eq!(mesh.face(0), Some([0, 0, 1, 2, 2, 3]));
        mesh.validate().unwrap();
    }

    #[test]
    fn colored_faces_bucket_by_ordinal() {
        let (v, f) = quad();
        let mesh = assemble(&v, &f, None, &[], &TextureMode::ColoredFaces { colors: 8 }).unwrap();
        assert_eq!(mesh.face(0).unwrap()[1], 0);
        assert_eq!(mesh.face(1).unwrap()[1], 4);

        let empty = assemble(&v, &f, None, &[], &TextureMode::ColoredFaces { colors: 0 });
        assert_eq!(empty, Err(AssemblyError::EmptyPalette));
    }

    #[test]
    fn out_of_bounds_face_is_rejected() {
        let (v, _) = quad();
        let result = assemble(&v, &[Face3::new(0, 1, 9)], None, &[], &TextureMode::None);
        assert!(matches!(
            result,
            Err(AssemblyError::FaceIndexOutOfBounds { index: 9, .. })
        ));
    }

    #[test]
    fn append_offsets_indices() {
        let (v, f) = quad();
        let uvs = vec![[0.0, 0.0]; 4];
        let mut a = ShapeGeometry::new(v.clone(), f.clone()).with_texture(uvs.clone(), None);
        a.append(ShapeGeometry::new(v, f).with_texture(uvs, None));
        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.faces[2], Face3::new(4, 5, 6));
        assert_eq!(a.texture_faces.as_ref().unwrap()[3], Face3::new(6, 7, 4));
        a.assemble(&TextureMode::Image).unwrap().validate().unwrap();
    }

    #[test]
    fn tetrahedron_topology() {
        let v = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let f = vec![
            Face3::new(0, 2, 1),
            Face3::new(0, 1, 3),
            Face3::new(1, 2, 3),
            Face3::new(0, 3, 2),
        ];
        assert_eq!(edge_topology(&f), (0, 0));
        assert_eq!(inconsistent_edge_count(&f), 0);
        assert!((signed_volume(&v, &f) - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(orphan_vertex_count(5, &f), 1);
        assert_eq!(degenerate_face_count(&v, &f, 1e-12), 0);
    }
}
