//! Lazily regenerated mesh for a shape plus its presentation state.

use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::geom::{MeshBuffers, TextureMode};

use super::{Shape, ShapeError};

/// Surface appearance handed to the renderer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub diffuse: [u8; 3],
    pub specular: [u8; 3],
    pub specular_power: f64,
    /// Image used in [`TextureMode::Image`]; `None` for palette modes.
    pub image: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [200, 200, 200],
            specular: [255, 255, 255],
            specular_power: 32.0,
            image: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Light {
    Ambient { color: [u8; 3] },
    Point { color: [u8; 3], position: [f64; 3] },
}

/// A shape, its texture mode and the last mesh generated from them.
///
/// Parameter or texture changes only mark the mesh dirty; it is rebuilt on
/// the next [`TexturedMesh::mesh`] call. A failed rebuild keeps the last
/// good mesh and leaves the mesh dirty.
#[derive(Debug, Clone)]
pub struct TexturedMesh<S> {
    shape: S,
    texture: TextureMode,
    material: Material,
    lights: Vec<Light>,
    mesh: Option<Arc<MeshBuffers>>,
    dirty: bool,
    generation: u64,
}

impl<S: Shape> TexturedMesh<S> {
    pub fn new(shape: S) -> Self {
        Self::with_texture(shape, TextureMode::None)
    }

    pub fn with_texture(shape: S, texture: TextureMode) -> Self {
        Self {
            shape,
            texture,
            material: Material::default(),
            lights: Vec::new(),
            mesh: None,
            dirty: true,
            generation: 0,
        }
    }

    pub fn shape(&self) -> &S {
        &self.shape
    }

    /// Mutable access to the parameters; the mesh is considered stale.
    pub fn shape_mut(&mut self) -> &mut S {
        self.dirty = true;
        &mut self.shape
    }

    pub fn set_shape(&mut self, shape: S) {
        self.shape = shape;
        self.dirty = true;
    }

    pub fn texture_mode(&self) -> &TextureMode {
        &self.texture
    }

    pub fn set_texture_mode(&mut self, texture: TextureMode) {
        self.texture = texture;
        self.dirty = true;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Successful rebuilds so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Last successfully generated mesh, even if stale.
    #[must_use]
    pub fn last_mesh(&self) -> Option<Arc<MeshBuffers>> {
        self.mesh.clone()
    }

    /// Rebuilds unconditionally.
    pub fn regenerate(&mut self) -> Result<Arc<MeshBuffers>, ShapeError> {
        match self.shape.generate(&self.texture) {
            Ok(mesh) => {
                let mesh = Arc::new(mesh);
                self.mesh = Some(Arc::clone(&mesh));
                self.dirty = false;
                self.generation += 1;
                debug!(
                    "{} regenerated (generation {})",
                    self.shape.name(),
                    self.generation
                );
                Ok(mesh)
            }
            Err(error) => {
                warn!(
                    "{} regeneration failed, keeping previous mesh: {error}",
                    self.shape.name()
                );
                Err(error)
            }
        }
    }

    /// Current mesh, rebuilding first when stale.
    pub fn mesh(&mut self) -> Result<Arc<MeshBuffers>, ShapeError> {
        match &self.mesh {
            Some(mesh) if !self.dirty => Ok(Arc::clone(mesh)),
            _ => self.regenerate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Torus;

    #[test]
    fn mesh_is_cached_until_parameters_change() {
        let mut textured = TexturedMesh::new(Torus::new(3.0, 1.0, 8, 6));
        assert!(textured.is_dirty());

        let first = textured.mesh().unwrap();
        let again = textured.mesh().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(textured.generation(), 1);

        textured.shape_mut().radius_divisions = 10;
        let rebuilt = textured.mesh().unwrap();
        assert_eq!(rebuilt.vertex_count(), 60);
        assert_eq!(textured.generation(), 2);
    }

    #[test]
    fn texture_change_rebuilds() {
        let mut textured = TexturedMesh::new(Torus::new(3.0, 1.0, 8, 6));
        assert_eq!(textured.mesh().unwrap().tex_coord_count(), 1);
        textured.set_texture_mode(TextureMode::colored_by_arc_length(8));
        assert!(textured.is_dirty());
        assert_eq!(textured.mesh().unwrap().tex_coord_count(), 8);
    }

    #[test]
    fn failed_rebuild_keeps_last_mesh() {
        let mut textured = TexturedMesh::new(Torus::new(3.0, 1.0, 8, 6));
        let good = textured.mesh().unwrap();

        textured.shape_mut().tube_divisions = 1;
        assert!(textured.mesh().is_err());
        assert!(textured.is_dirty());
        let kept = textured.last_mesh().unwrap();
        assert!(Arc::ptr_eq(&good, &kept));
        assert_eq!(textured.generation(), 1);
    }

    #[test]
    fn material_does_not_dirty() {
        let mut textured = TexturedMesh::new(Torus::new(3.0, 1.0, 8, 6));
        textured.mesh().unwrap();
        textured.set_material(Material {
            diffuse: [255, 0, 0],
            ..Material::default()
        });
        textured.add_light(Light::Ambient { color: [40, 40, 40] });
        assert!(!textured.is_dirty());
        assert_eq!(textured.lights().len(), 1);
    }

    #[test]
    fn material_and_lights_survive_rebuilds() {
        let mut textured = TexturedMesh::new(Torus::new(3.0, 1.0, 8, 6));
        let material = Material {
            diffuse: [10, 20, 30],
            specular_power: 8.0,
            image: Some("marble.png".to_string()),
            ..Material::default()
        };
        let lights = [
            Light::Ambient { color: [40, 40, 40] },
            Light::Point {
                color: [255, 255, 200],
                position: [0.0, 5.0, 10.0],
            },
        ];
        textured.set_material(material.clone());
        for light in lights {
            textured.add_light(light);
        }

        textured.regenerate().unwrap();
        textured.shape_mut().radius_divisions = 12;
        textured.set_texture_mode(TextureMode::Image);
        textured.mesh().unwrap();
        assert_eq!(textured.generation(), 2);

        textured.shape_mut().tube_divisions = 2;
        assert!(textured.regenerate().is_err());

        assert_eq!(textured.material(), &material);
        assert_eq!(textured.lights(), &lights[..]);
    }
}
