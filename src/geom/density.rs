//! Density functions for the colored texture modes, and the `meval`
//! expressions they (and the surface plot) can be written in.

use std::fmt;
use std::sync::Arc;

use meval::{Context, ContextProvider, Expr};
use thiserror::Error;

use super::core::Point3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("expression could not be parsed: {0}")]
    Parse(String),
    #[error("expression could not be evaluated: {0}")]
    Evaluate(String),
    #[error("expression produced a non-finite value {value} at {at}")]
    NonFinite { value: f64, at: String },
}

// ─── Expressions ────────────────────────────────────────────────────────────

/// Parsed arithmetic expression. Free variables are bound at evaluation time;
/// the usual functions and constants (`sin`, `sqrt`, `pi`, ...) are built in,
/// plus `clamp(v, lo, hi)`, `lerp(a, b, t)` and `mod(a, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    expr: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(ExpressionError::Parse("empty expression".to_owned()));
        }
        let expr: Expr = trimmed
            .parse()
            .map_err(|error: meval::Error| ExpressionError::Parse(error.to_string()))?;
        Ok(Self {
            source: trimmed.to_owned(),
            expr,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluator with the function table built once, for evaluating the same
    /// expression over many points.
    #[must_use]
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator {
            expr: &self.expr,
            context: build_context(),
        }
    }

    pub fn eval(&self, vars: &Variables) -> Result<f64, ExpressionError> {
        self.evaluator().eval(vars)
    }
}

pub struct Evaluator<'a> {
    expr: &'a Expr,
    context: Context<'static>,
}

impl Evaluator<'_> {
    pub fn eval(&self, vars: &Variables) -> Result<f64, ExpressionError> {
        self.expr
            .eval_with_context((vars, &self.context))
            .map_err(|error| ExpressionError::Evaluate(error.to_string()))
    }
}

/// Variable bindings visible to an expression. Unset variables are unbound and
/// make evaluation fail.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Variables {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub f: Option<f64>,
}

impl Variables {
    /// `x, y` for plotting `z = f(x, y)`.
    #[must_use]
    pub const fn plane(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: None,
            f: None,
        }
    }

    /// Only the parametric tag, also reachable as `t`.
    #[must_use]
    pub const fn parametric(f: f64) -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            f: Some(f),
        }
    }

    /// Position and tag of a vertex.
    #[must_use]
    pub const fn spatial(p: &Point3) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            z: Some(p.z),
            f: Some(p.f),
        }
    }
}

impl ContextProvider for Variables {
    fn get_var(&self, name: &str) -> Option<f64> {
        match name {
            "x" | "X" => self.x,
            "y" | "Y" => self.y,
            "z" | "Z" => self.z,
            "f" | "t" => self.f,
            _ => None,
        }
    }
}

fn build_context() -> Context<'static> {
    let mut context = Context::new();
    context.func3("clamp", |v, lo, hi| v.max(lo).min(hi));
    context.func3("lerp", |a, b, t| a + (b - a) * t);
    context.func2("mod", f64::rem_euclid);
    context.func("sign", f64::signum);
    context.func("frac", f64::fract);
    context
}

// ─── Density functions ──────────────────────────────────────────────────────

/// Scalar field sampled per vertex by the colored-vertex texture modes.
#[derive(Clone)]
pub enum DensityFunction {
    /// Function of the vertex's parametric tag `f`.
    Parametric(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
    /// Function of the full vertex.
    Spatial(Arc<dyn Fn(&Point3) -> f64 + Send + Sync>),
    /// Expression in `f`/`t` (parametric) or `x, y, z, f` (spatial).
    Expression { expr: Expression, spatial: bool },
}

impl DensityFunction {
    pub fn parametric(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Parametric(Arc::new(f))
    }

    pub fn spatial(f: impl Fn(&Point3) -> f64 + Send + Sync + 'static) -> Self {
        Self::Spatial(Arc::new(f))
    }

    /// The tag itself: colors follow arc length along a tube.
    #[must_use]
    pub fn arc_fraction() -> Self {
        Self::parametric(|f| f)
    }

    /// Distance from the origin.
    #[must_use]
    pub fn radial() -> Self {
        Self::spatial(|p| p.to_vec3().length())
    }

    pub fn parametric_expression(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self::Expression {
            expr: Expression::parse(source)?,
            spatial: false,
        })
    }

    pub fn spatial_expression(source: &str) -> Result<Self, ExpressionError> {
        Ok(Self::Expression {
            expr: Expression::parse(source)?,
            spatial: true,
        })
    }

    /// Density of every vertex. Fails on evaluation errors and non-finite
    /// results.
    pub fn values(&self, vertices: &[Point3]) -> Result<Vec<f64>, ExpressionError> {
        let values = match self {
            Self::Parametric(func) => vertices.iter().map(|p| func(p.f)).collect(),
            Self::Spatial(func) => vertices.iter().map(|p| func(p)).collect(),
            Self::Expression { expr, spatial } => {
                let evaluator = expr.evaluator();
                vertices
                    .iter()
                    .map(|p| {
                        let vars = if *spatial {
                            Variables::spatial(p)
                        } else {
                            Variables::parametric(p.f)
                        };
                        evaluator.eval(&vars)
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        match values.iter().zip(vertices).find(|(v, _)| !v.is_finite()) {
            Some((&value, p)) => Err(ExpressionError::NonFinite {
                value,
                at: format!("({}, {}, {}; f = {})", p.x, p.y, p.z, p.f),
            }),
            None => Ok(values),
        }
    }
}

impl fmt::Debug for DensityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parametric(_) => f.write_str("DensityFunction::Parametric(..)"),
            Self::Spatial(_) => f.write_str("DensityFunction::Spatial(..)"),
            Self::Expression { expr, spatial } => f
                .debug_struct("DensityFunction::Expression")
                .field("source", &expr.source())
                .field("spatial", spatial)
                .finish(),
        }
    }
}

/// How density values map onto palette buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DensityRange {
    /// Extremes taken from the vertex set of every assembly.
    #[default]
    Auto,
    /// Absolute extremes, stable across parameter edits.
    Fixed { min: f64, max: f64 },
}

impl DensityRange {
    /// `(min, max)` to bucket `values` against.
    #[must_use]
    pub fn extremes(&self, values: &[f64]) -> (f64, f64) {
        match *self {
            Self::Fixed { min, max } => (min, max),
            Self::Auto => values
                .iter()
                .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                    None => Some((v, v)),
                    Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                })
                .unwrap_or((0.0, 0.0)),
        }
    }
}

/// `clamp(floor((d − min)/(max − min)·colors), 0, colors − 1)`; bucket 0
/// when the range is empty.
#[must_use]
pub fn density_bucket(value: f64, min: f64, max: f64, colors: usize) -> usize {
    let span = max - min;
    if colors == 0 || !(span > 0.0) || !span.is_finite() {
        return 0;
    }
    let scaled = ((value - min) / span * colors as f64).floor();
    if scaled <= 0.0 {
        0
    } else {
        (scaled as usize).min(colors - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_mapping_clamps() {
        assert_eq!(density_bucket(0.0, 0.0, 1.0, 4), 0);
        assert_eq!(density_bucket(0.26, 0.0, 1.0, 4), 1);
        assert_eq!(density_bucket(1.0, 0.0, 1.0, 4), 3);
        assert_eq!(density_bucket(5.0, 0.0, 1.0, 4), 3);
        assert_eq!(density_bucket(-5.0, 0.0, 1.0, 4), 0);
        assert_eq!(density_bucket(0.7, 2.0, 2.0, 4), 0);
    }

    #[test]
    fn auto_and_fixed_extremes() {
        let values = [3.0, -1.0, 2.0];
        assert_eq!(DensityRange::Auto.extremes(&values), (-1.0, 3.0));
        assert_eq!(DensityRange::Fixed { min: 0.0, max: 10.0 }.extremes(&values), (0.0, 10.0));
        assert_eq!(DensityRange::Auto.extremes(&[]), (0.0, 0.0));
    }

    #[test]
    fn expression_density_uses_bound_variables() {
        let spatial = DensityFunction::spatial_expression("x + 2*y + z*z").unwrap();
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(spatial.values(&[p]).unwrap(), vec![14.0]);

        let parametric = DensityFunction::parametric_expression("sin(pi * t) + f").unwrap();
        let v = parametric.values(&[Point3::ORIGIN.with_f(0.5)]).unwrap();
        assert!((v[0] - 1.5).abs() < 1e-12);

        // Position is not visible to a parametric expression.
        let err = DensityFunction::parametric_expression("x").unwrap().values(&[p]);
        assert!(matches!(err, Err(ExpressionError::Evaluate(_))));
    }

    #[test]
    fn non_finite_density_is_an_error() {
        let density = DensityFunction::parametric(|f| 1.0 / f);
        let result = density.values(&[Point3::ORIGIN]);
        assert!(matches!(result, Err(ExpressionError::NonFinite { .. })));
    }

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(Expression::parse("1 +"), Err(ExpressionError::Parse(_))));
        assert!(matches!(Expression::parse("  "), Err(ExpressionError::Parse(_))));
        let e = Expression::parse("clamp(x, 0, 1) + mod(y, 2)").unwrap();
        assert_eq!(e.eval(&Variables::plane(4.0, 5.0)).unwrap(), 2.0);
    }
}
