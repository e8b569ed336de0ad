use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geom::{Face3, Point3, ShapeGeometry, SweepAxis, SweepGrid, Transform};

use super::{Shape, ShapeError, check_divisions, check_positive};

/// Cylinder of `divisions`-gon cross-section between two points, split into
/// `level` stacked segments and optionally capped at both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prism {
    pub radius: f64,
    pub divisions: usize,
    pub level: usize,
    pub start: Point3,
    pub end: Point3,
    pub capped: bool,
}

impl Default for Prism {
    fn default() -> Self {
        Self {
            radius: 2.0,
            divisions: 16,
            level: 1,
            start: Point3::ORIGIN,
            end: Point3::new(0.0, 0.0, 10.0),
            capped: true,
        }
    }
}

impl Prism {
    #[must_use]
    pub fn between(start: Point3, end: Point3, radius: f64, divisions: usize) -> Self {
        Self {
            start,
            end,
            radius,
            divisions,
            ..Self::default()
        }
    }

    /// Outer axis runs around the section, inner axis along the height.
    fn grid(&self) -> SweepGrid {
        SweepGrid::new(
            SweepAxis::periodic(self.divisions, 0),
            SweepAxis::new(self.level, 0, false),
        )
    }
}

impl Shape for Prism {
    fn name(&self) -> &'static str {
        "prism"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        check_positive("radius", self.radius)?;
        check_divisions("divisions", self.divisions)?;
        if self.level == 0 {
            return Err(ShapeError::InvalidDivisions {
                name: "level",
                value: 0,
                min: 1,
            });
        }
        let frame = Transform::along_segment(self.start, self.end).ok_or_else(|| {
            ShapeError::InvalidLength {
                name: "axis length",
                value: self.start.distance_to(self.end),
            }
        })?;
        let height = self.start.distance_to(self.end);

        let grid = self.grid();
        let n = self.divisions;
        let levels = self.level;

        let mut vertices = Vec::with_capacity(grid.vertex_count() + 2);
        for j in 0..n {
            let (s, c) = (TAU * j as f64 / n as f64).sin_cos();
            for k in 0..=levels {
                let fraction = k as f64 / levels as f64;
                let local = Point3::new(self.radius * c, self.radius * s, height * fraction);
                vertices.push(frame.apply_point(local).with_f(fraction));
            }
        }
        let mut faces = grid.faces();

        let mut tex_coords = grid.tex_coords();
        let mut texture_faces = grid.texture_faces();

        if self.capped {
            let bottom = vertices.len() as u32;
            vertices.push(self.start.with_f(0.0));
            let top = vertices.len() as u32;
            vertices.push(self.end.with_f(1.0));

            let side = |j: usize, k: usize| grid.index(j % n, k) as u32;
            for j in 0..n {
                faces.push(Face3::new(bottom, side(j + 1, 0), side(j, 0)));
            }
            for j in 0..n {
                faces.push(Face3::new(top, side(j, levels), side(j + 1, levels)));
            }

            // Each cap gets its own disc of UVs: centre then rim.
            let bottom_uv = push_disc(&mut tex_coords, n);
            let top_uv = push_disc(&mut tex_coords, n);
            let rim = |base: u32, j: usize| base + 1 + (j % n) as u32;
            texture_faces.extend(
                (0..n).map(|j| Face3::new(bottom_uv, rim(bottom_uv, j + 1), rim(bottom_uv, j))),
            );
            texture_faces
                .extend((0..n).map(|j| Face3::new(top_uv, rim(top_uv, j), rim(top_uv, j + 1))));
        }

        Ok(ShapeGeometry::new(vertices, faces).with_texture(tex_coords, Some(texture_faces)))
    }
}

/// Appends a unit disc of `n` rim UVs around a centre and returns the
/// centre's index.
fn push_disc(tex_coords: &mut Vec<[f64; 2]>, n: usize) -> u32 {
    let base = tex_coords.len() as u32;
    tex_coords.push([0.5, 0.5]);
    for j in 0..n {
        let (s, c) = (TAU * j as f64 / n as f64).sin_cos();
        tex_coords.push([0.5 + 0.5 * c, 0.5 + 0.5 * s]);
    }
    base
}
