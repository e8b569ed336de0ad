#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cloth;
pub mod geom;
pub mod shapes;

use std::fmt;
use std::time::Duration;

use cloth::{ClothMesh, ClothParams, ClothSimulator};
use geom::{DensityFunction, DensityRange, ExpressionError, MeshDiagnostics, TextureMode};
use serde::{Deserialize, Serialize};
use shapes::{Shape, ShapeParams, TexturedMesh};
use wasm_bindgen::prelude::*;

pub use cloth::ClothError;
pub use geom::{AssemblyError, MeshBuffers};
pub use shapes::ShapeError;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

/// Texture mode as JSON hosts describe it.
///
/// `range`, when given, fixes the density extremes instead of taking them
/// from every rebuild's vertex set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TextureSpec {
    #[default]
    None,
    Image,
    ArcLength {
        colors: usize,
        #[serde(default)]
        range: Option<[f64; 2]>,
    },
    Radius {
        colors: usize,
        #[serde(default)]
        range: Option<[f64; 2]>,
    },
    /// Density from an expression in `f` (or `x`, `y`, `z` when `spatial`).
    Density {
        colors: usize,
        expression: String,
        #[serde(default)]
        spatial: bool,
        #[serde(default)]
        range: Option<[f64; 2]>,
    },
    Faces {
        colors: usize,
    },
}

impl TextureSpec {
    pub fn to_mode(&self) -> Result<TextureMode, ExpressionError> {
        let range = |range: &Option<[f64; 2]>| match *range {
            Some([min, max]) => DensityRange::Fixed { min, max },
            None => DensityRange::Auto,
        };
        Ok(match self {
            Self::None => TextureMode::None,
            Self::Image => TextureMode::Image,
            Self::ArcLength { colors, range: r } => TextureMode::ColoredVertices1D {
                colors: *colors,
                density: DensityFunction::arc_fraction(),
                range: range(r),
            },
            Self::Radius { colors, range: r } => TextureMode::ColoredVertices3D {
                colors: *colors,
                density: DensityFunction::radial(),
                range: range(r),
            },
            Self::Density {
                colors,
                expression,
                spatial: true,
                range: r,
            } => TextureMode::ColoredVertices3D {
                colors: *colors,
                density: DensityFunction::spatial_expression(expression)?,
                range: range(r),
            },
            Self::Density {
                colors,
                expression,
                spatial: false,
                range: r,
            } => TextureMode::ColoredVertices1D {
                colors: *colors,
                density: DensityFunction::parametric_expression(expression)?,
                range: range(r),
            },
            Self::Faces { colors } => TextureMode::ColoredFaces { colors: *colors },
        })
    }
}

#[derive(Debug, Serialize)]
struct DiagnosticsExport {
    summary: String,
    closed: bool,
    volume: f64,
    fallback_frames: usize,
    warnings: Vec<String>,
}

impl From<MeshDiagnostics> for DiagnosticsExport {
    fn from(diagnostics: MeshDiagnostics) -> Self {
        Self {
            summary: diagnostics.summary(),
            closed: diagnostics.is_closed(),
            volume: diagnostics.signed_volume,
            fallback_frames: diagnostics.fallback_frame_count,
            warnings: diagnostics.warnings,
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    shape: Option<TexturedMesh<ShapeParams>>,
    cloth: Option<ClothSimulator>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            shape: None,
            cloth: None,
        }
    }

    /// Whether the engine went through its minimal initialisation.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// One-shot generation: shape parameters and texture spec in, mesh
    /// buffers out. Does not touch the engine's current shape.
    #[wasm_bindgen]
    pub fn generate(&self, params: JsValue, texture: JsValue) -> Result<JsValue, JsValue> {
        let params: ShapeParams = serde_wasm_bindgen::from_value(params).map_err(to_js_error)?;
        let mode = texture_mode(texture)?;
        let mesh = params.generate(&mode).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&mesh).map_err(to_js_error)
    }

    /// Replaces the current shape's parameters; the mesh is rebuilt lazily.
    #[wasm_bindgen]
    pub fn set_shape(&mut self, params: JsValue) -> Result<(), JsValue> {
        let params: ShapeParams = serde_wasm_bindgen::from_value(params).map_err(to_js_error)?;
        match self.shape.as_mut() {
            Some(shape) => shape.set_shape(params),
            None => self.shape = Some(TexturedMesh::new(params)),
        }
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_texture(&mut self, texture: JsValue) -> Result<(), JsValue> {
        let mode = texture_mode(texture)?;
        let shape = self
            .shape
            .as_mut()
            .ok_or_else(|| js_error("no shape has been set"))?;
        shape.set_texture_mode(mode);
        Ok(())
    }

    /// Current mesh, regenerated if parameters changed since the last call.
    /// On failure the error is returned and the previous mesh is kept.
    #[wasm_bindgen]
    pub fn get_mesh(&mut self) -> Result<JsValue, JsValue> {
        let shape = self
            .shape
            .as_mut()
            .ok_or_else(|| js_error("no shape has been set"))?;
        let mesh = shape.mesh().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(mesh.as_ref()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let shape = self
            .shape
            .as_ref()
            .ok_or_else(|| js_error("no shape has been set"))?;
        let diagnostics = shape.shape().diagnostics().map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&DiagnosticsExport::from(diagnostics)).map_err(to_js_error)
    }

    /// Builds a new cloth, replacing any previous one. Returns its mesh
    /// buffers; only the vertex positions change afterwards.
    #[wasm_bindgen]
    pub fn create_cloth(&mut self, params: JsValue) -> Result<JsValue, JsValue> {
        let params: ClothParams = if params.is_undefined() || params.is_null() {
            ClothParams::default()
        } else {
            serde_wasm_bindgen::from_value(params).map_err(to_js_error)?
        };
        let cloth = ClothMesh::new(params).map_err(to_js_error)?;
        let buffers = serde_wasm_bindgen::to_value(cloth.buffers()).map_err(to_js_error)?;
        self.cloth = Some(ClothSimulator::new(cloth));
        Ok(buffers)
    }

    #[wasm_bindgen]
    pub fn cloth_start(&mut self, now_ms: f64) -> Result<(), JsValue> {
        let now = host_time(now_ms)?;
        self.cloth_simulator()?.start(now);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn cloth_pause(&mut self, now_ms: f64) -> Result<(), JsValue> {
        let now = host_time(now_ms)?;
        self.cloth_simulator()?.pause(now);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn cloth_stop(&mut self) -> Result<(), JsValue> {
        self.cloth_simulator()?.stop();
        Ok(())
    }

    /// Advances the cloth to `now_ms`; returns the number of fixed steps run.
    #[wasm_bindgen]
    pub fn cloth_tick(&mut self, now_ms: f64) -> Result<u32, JsValue> {
        let now = host_time(now_ms)?;
        let steps = self.cloth_simulator()?.tick(now);
        Ok(u32::try_from(steps).unwrap_or(u32::MAX))
    }

    /// Flat vertex positions of the cloth.
    #[wasm_bindgen]
    pub fn cloth_vertices(&self) -> Result<Vec<f32>, JsValue> {
        let cloth = self
            .cloth
            .as_ref()
            .ok_or_else(|| js_error("no cloth has been created"))?;
        Ok(cloth.cloth().buffers().points.clone())
    }
}

impl Engine {
    fn cloth_simulator(&mut self) -> Result<&mut ClothSimulator, JsValue> {
        self.cloth
            .as_mut()
            .ok_or_else(|| js_error("no cloth has been created"))
    }
}

fn texture_mode(texture: JsValue) -> Result<TextureMode, JsValue> {
    if texture.is_undefined() || texture.is_null() {
        return Ok(TextureMode::None);
    }
    let spec: TextureSpec = serde_wasm_bindgen::from_value(texture).map_err(to_js_error)?;
    spec.to_mode().map_err(to_js_error)
}

fn host_time(now_ms: f64) -> Result<Duration, JsValue> {
    millis_to_duration(now_ms).ok_or_else(|| js_error("host time must be a finite, non-negative number of milliseconds"))
}

fn millis_to_duration(ms: f64) -> Option<Duration> {
    let nanos = (ms * 1e6).round();
    (nanos.is_finite() && nanos >= 0.0 && nanos < u64::MAX as f64).then(|| Duration::from_nanos(nanos as u64))
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
