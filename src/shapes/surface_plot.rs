use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geom::{
    Expression, ExpressionError, Point3, ShapeGeometry, SweepAxis, SweepGrid, Variables,
};

use super::{Shape, ShapeError, check_axis, check_finite, check_positive};

/// Host-supplied height function `z = f(x, y)`.
#[derive(Clone)]
pub struct PlotFunction(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>);

impl PlotFunction {
    pub fn new(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        (self.0)(x, y)
    }
}

impl fmt::Debug for PlotFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlotFunction(..)")
    }
}

/// Height field over a `width × depth` rectangle centred on the origin.
///
/// The height comes from `function` when set, otherwise from `expression`
/// in `x` and `y`. Vertices are tagged with their normalized height.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfacePlot {
    pub expression: String,
    #[serde(skip)]
    pub function: Option<PlotFunction>,
    pub width: f64,
    pub depth: f64,
    pub divisions_x: usize,
    pub divisions_y: usize,
    pub scale: f64,
}

impl Default for SurfacePlot {
    fn default() -> Self {
        Self {
            expression: "sin(x) * cos(y)".to_owned(),
            function: None,
            width: 20.0,
            depth: 20.0,
            divisions_x: 64,
            divisions_y: 64,
            scale: 1.0,
        }
    }
}

impl SurfacePlot {
    #[must_use]
    pub fn from_expression(expression: &str) -> Self {
        Self {
            expression: expression.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_function(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            function: Some(PlotFunction::new(f)),
            ..Self::default()
        }
    }

    /// Outer axis along X, inner along Y: faces point towards +Z.
    fn grid(&self) -> SweepGrid {
        SweepGrid::new(
            SweepAxis::open(self.divisions_x, 0),
            SweepAxis::open(self.divisions_y, 0),
        )
    }

    fn heights(&self, samples: &[(f64, f64)]) -> Result<Vec<f64>, ShapeError> {
        let raw: Vec<f64> = match &self.function {
            Some(function) => samples.iter().map(|&(x, y)| function.eval(x, y)).collect(),
            None => {
                let expression = Expression::parse(&self.expression)?;
                let evaluator = expression.evaluator();
                samples
                    .iter()
                    .map(|&(x, y)| evaluator.eval(&Variables::plane(x, y)))
                    .collect::<Result<_, _>>()?
            }
        };
        for (&z, &(x, y)) in raw.iter().zip(samples) {
            if !z.is_finite() {
                return Err(ExpressionError::NonFinite {
                    value: z,
                    at: format!("({x}, {y})"),
                }
                .into());
            }
        }
        Ok(raw.into_iter().map(|z| z * self.scale).collect())
    }
}

impl Shape for SurfacePlot {
    fn name(&self) -> &'static str {
        "surface_plot"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        check_positive("width", self.width)?;
        check_positive("depth", self.depth)?;
        check_finite("scale", self.scale)?;
        let grid = self.grid();
        check_axis("x divisions", grid.outer)?;
        check_axis("y divisions", grid.inner)?;

        let mut samples = Vec::with_capacity(grid.vertex_count());
        for o in 0..grid.outer.samples() {
            let x = self.width * (grid.outer.fraction(o) - 0.5);
            for i in 0..grid.inner.samples() {
                samples.push((x, self.depth * (grid.inner.fraction(i) - 0.5)));
            }
        }
        let heights = self.heights(&samples)?;

        let (lo, hi) = heights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &z| (lo.min(z), hi.max(z)));
        let span = hi - lo;
        let vertices = samples
            .iter()
            .zip(&heights)
            .map(|(&(x, y), &z)| {
                let f = if span > 0.0 { (z - lo) / span } else { 0.0 };
                Point3::new(x, y, z).with_f(f)
            })
            .collect();

        Ok(ShapeGeometry::new(vertices, grid.faces())
            .with_texture(grid.tex_coords(), Some(grid.texture_faces())))
    }
}
