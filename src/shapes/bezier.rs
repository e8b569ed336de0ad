use log::debug;
use serde::{Deserialize, Serialize};

use crate::geom::{CubicBezier3, Point3, ShapeGeometry, SweepAxis, interpolate_bezier};

use super::tube::TubeSweep;
use super::{Shape, ShapeError};

/// Tube swept along one cubic Bezier segment. Straight stretches fall back
/// to a carried normal, so a collinear control polygon still sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BezierTube {
    pub curve: CubicBezier3,
    pub wire_radius: f64,
    pub wire_start_angle: f64,
    pub length_divisions: usize,
    pub wire_divisions: usize,
    pub crop_length: usize,
    pub crop_wire: usize,
}

impl Default for BezierTube {
    fn default() -> Self {
        Self {
            curve: CubicBezier3::default(),
            wire_radius: 0.5,
            wire_start_angle: 0.0,
            length_divisions: 100,
            wire_divisions: 16,
            crop_length: 0,
            crop_wire: 0,
        }
    }
}

impl BezierTube {
    #[must_use]
    pub fn new(curve: CubicBezier3, wire_radius: f64) -> Self {
        Self {
            curve,
            wire_radius,
            ..Self::default()
        }
    }

    fn sweep(&self) -> Result<TubeSweep, ShapeError> {
        if self.curve.control_points().iter().any(|p| !p.is_finite()) {
            return Err(ShapeError::NonFinite {
                name: "control point",
                value: f64::NAN,
            });
        }
        Ok(TubeSweep {
            wire_radius: self.wire_radius,
            wire_start_angle: self.wire_start_angle,
            length: SweepAxis::open(self.length_divisions, self.crop_length),
            wire: SweepAxis::periodic(self.wire_divisions, self.crop_wire),
        })
    }
}

impl Shape for BezierTube {
    fn name(&self) -> &'static str {
        "bezier"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.sweep()?.sweep(self.curve)
    }
}

/// Tube through a list of knots: a C2 Bezier interpolation with one swept
/// segment per consecutive pair, appended into one geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BezierPath {
    pub knots: Vec<Point3>,
    pub wire_radius: f64,
    pub wire_start_angle: f64,
    /// Length divisions per segment.
    pub segment_divisions: usize,
    pub wire_divisions: usize,
}

impl Default for BezierPath {
    fn default() -> Self {
        Self {
            knots: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 3.0, 0.0),
                Point3::new(8.0, 0.0, 2.0),
                Point3::new(12.0, -3.0, 0.0),
            ],
            wire_radius: 0.5,
            wire_start_angle: 0.0,
            segment_divisions: 32,
            wire_divisions: 12,
        }
    }
}

impl BezierPath {
    /// Interpolated segments through the knots.
    pub fn segments(&self) -> Result<Vec<CubicBezier3>, ShapeError> {
        interpolate_bezier(&self.knots).ok_or_else(|| {
            ShapeError::InvalidParameter(format!(
                "bezier path needs at least two finite knots, got {}",
                self.knots.len()
            ))
        })
    }

    fn tubes(&self) -> Result<Vec<BezierTube>, ShapeError> {
        Ok(self
            .segments()?
            .into_iter()
            .map(|curve| BezierTube {
                curve,
                wire_radius: self.wire_radius,
                wire_start_angle: self.wire_start_angle,
                length_divisions: self.segment_divisions,
                wire_divisions: self.wire_divisions,
                crop_length: 0,
                crop_wire: 0,
            })
            .collect())
    }
}

impl Shape for BezierPath {
    fn name(&self) -> &'static str {
        "bezier_path"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        let tubes = self.tubes()?;
        let mut geometry = ShapeGeometry::default();
        for tube in &tubes {
            geometry.append(tube.build()?);
        }
        debug!(
            "bezier path: {} segments, {} vertices",
            tubes.len(),
            geometry.vertex_count()
        );
        Ok(geometry)
    }
}
