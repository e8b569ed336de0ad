//! Parametric primitive generators.
//!
//! Every primitive is a plain parameter struct implementing [`Shape`]:
//! `build` produces raw vertices, faces and texture data, `generate` runs it
//! through texture-mode assembly. Parameters are validated up front; invalid
//! values are rejected, never clamped.

mod bezier;
mod cone;
mod knot;
mod polyhedra;
mod prism;
mod sphere;
mod spring;
mod surface_plot;
mod text;
mod textured;
mod torus;
mod tube;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{
    AssemblyError, ExpressionError, GeomMetrics, MIN_DIVISIONS, MeshBuffers, MeshDiagnostics,
    OutlineError, ShapeGeometry, SweepAxis, TextureMode, TimingBucket,
};

pub use bezier::{BezierPath, BezierTube};
pub use cone::Cone;
pub use knot::Knot;
pub use polyhedra::{MAX_LEVEL, Polyhedron, PolyhedronKind};
pub use prism::Prism;
pub use sphere::SphereSegment;
pub use spring::Spring;
pub use surface_plot::{PlotFunction, SurfacePlot};
pub use text::{ExtrudedText, GlyphOutline};
pub use textured::{Light, Material, TexturedMesh};
pub use torus::Torus;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("{name} must be at least {min}, got {value}")]
    InvalidDivisions {
        name: &'static str,
        value: usize,
        min: usize,
    },
    #[error("{name} crop {crop} leaves no cells out of {divisions} divisions")]
    InvalidCrop {
        name: &'static str,
        crop: usize,
        divisions: usize,
    },
    #[error("{name} must be finite and greater than zero, got {value}")]
    InvalidLength { name: &'static str, value: f64 },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("subdivision level {level} exceeds the maximum of {max}")]
    LevelTooHigh { level: usize, max: usize },
    #[error("glyph {glyph}: {source}")]
    InvalidOutline {
        glyph: usize,
        #[source]
        source: OutlineError,
    },
    #[error("{0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// A parametric primitive.
pub trait Shape {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Vertices, faces and texture data for the current parameters.
    fn build(&self) -> Result<ShapeGeometry, ShapeError>;

    /// Topology report of the built geometry, including fallback frames.
    fn diagnostics(&self) -> Result<MeshDiagnostics, ShapeError> {
        Ok(MeshDiagnostics::from_geometry(&self.build()?))
    }

    /// Flat buffers for a texture mode.
    fn generate(&self, mode: &TextureMode) -> Result<MeshBuffers, ShapeError> {
        let geometry = self.build()?;
        let mesh = geometry.assemble(mode)?;
        debug!(
            "{}: {} vertices, {} faces, {} texcoords ({})",
            self.name(),
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.tex_coord_count(),
            mode.name()
        );
        Ok(mesh)
    }

    /// Like [`Shape::generate`], with build, assembly and diagnostics timed
    /// into `metrics`. The geometry is built once and shared by assembly and
    /// diagnostics, which carry the timing report when metrics are enabled.
    fn generate_timed(
        &self,
        mode: &TextureMode,
        metrics: &mut GeomMetrics,
    ) -> Result<(MeshBuffers, MeshDiagnostics), ShapeError> {
        metrics.begin();
        let geometry = metrics.time(TimingBucket::Build, || self.build())?;
        let mesh = metrics.time(TimingBucket::Assembly, || geometry.assemble(mode))?;
        let mut diagnostics = metrics.time(TimingBucket::Diagnostics, || {
            MeshDiagnostics::from_geometry(&geometry)
        });
        diagnostics.timing = metrics.end();
        Ok((mesh, diagnostics))
    }
}

// ─── Parameter validation ───────────────────────────────────────────────────

pub(crate) fn check_divisions(name: &'static str, value: usize) -> Result<(), ShapeError> {
    if value < MIN_DIVISIONS {
        return Err(ShapeError::InvalidDivisions {
            name,
            value,
            min: MIN_DIVISIONS,
        });
    }
    Ok(())
}

pub(crate) fn check_axis(name: &'static str, axis: SweepAxis) -> Result<(), ShapeError> {
    check_divisions(name, axis.divisions)?;
    if 2 * axis.crop >= axis.divisions {
        return Err(ShapeError::InvalidCrop {
            name,
            crop: axis.crop,
            divisions: axis.divisions,
        });
    }
    Ok(())
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ShapeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ShapeError::InvalidLength { name, value });
    }
    Ok(())
}

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), ShapeError> {
    if !value.is_finite() {
        return Err(ShapeError::NonFinite { name, value });
    }
    Ok(())
}

// ─── Serializable parameter union ───────────────────────────────────────────

/// Any primitive's parameters, tagged by `shape` for JSON hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapeParams {
    Torus(Torus),
    Knot(Knot),
    Spring(Spring),
    BezierTube(BezierTube),
    BezierPath(BezierPath),
    Sphere(SphereSegment),
    Cone(Cone),
    Prism(Prism),
    Polyhedron(Polyhedron),
    SurfacePlot(SurfacePlot),
    Text(ExtrudedText),
}

impl ShapeParams {
    fn as_shape(&self) -> &dyn Shape {
        match self {
            Self::Torus(s) => s,
            Self::Knot(s) => s,
            Self::Spring(s) => s,
            Self::BezierTube(s) => s,
            Self::BezierPath(s) => s,
            Self::Sphere(s) => s,
            Self::Cone(s) => s,
            Self::Prism(s) => s,
            Self::Polyhedron(s) => s,
            Self::SurfacePlot(s) => s,
            Self::Text(s) => s,
        }
    }
}

impl Shape for ShapeParams {
    fn name(&self) -> &'static str {
        self.as_shape().name()
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.as_shape().build()
    }
}
