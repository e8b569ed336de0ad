//! Mass-spring cloth: a grid of point masses joined by distance links,
//! integrated with position Verlet and written straight into a mesh buffer.

mod mesh;
mod point;
mod simulator;
#[cfg(not(target_arch = "wasm32"))]
mod timer;

use thiserror::Error;

use crate::geom::AssemblyError;

pub use mesh::{ClothAnchors, ClothMesh, ClothParams, MIN_CLOTH_POINTS};
pub use point::{LinkCorrection, PointLink, WeightedPoint};
pub use simulator::{ClothSimulator, ClothState};
#[cfg(not(target_arch = "wasm32"))]
pub use timer::ClothTimer;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClothError {
    #[error("{name} must be at least {min} points, got {value}")]
    InvalidDivisions {
        name: &'static str,
        value: usize,
        min: usize,
    },
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("anchor index {index} is outside the {len} cloth points")]
    AnchorOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
