//! UV sphere with optional azimuth and polar crops.
//!
//! Uncropped in the polar direction, the poles are single vertices joined to
//! the first and last rings by triangle fans. A polar crop removes the caps
//! and leaves a band.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::geom::{Face3, Point3, ShapeGeometry, SweepAxis, SweepGrid};

use super::{Shape, ShapeError, check_axis, check_positive};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereSegment {
    pub radius: f64,
    pub center: Point3,
    pub azimuth_divisions: usize,
    pub polar_divisions: usize,
    pub crop_azimuth: usize,
    pub crop_polar: usize,
}

impl Default for SphereSegment {
    fn default() -> Self {
        Self {
            radius: 10.0,
            center: Point3::ORIGIN,
            azimuth_divisions: 48,
            polar_divisions: 24,
            crop_azimuth: 0,
            crop_polar: 0,
        }
    }
}

impl SphereSegment {
    #[must_use]
    pub fn new(radius: f64, azimuth_divisions: usize, polar_divisions: usize) -> Self {
        Self {
            radius,
            azimuth_divisions,
            polar_divisions,
            ..Self::default()
        }
    }

    fn azimuth(&self) -> SweepAxis {
        SweepAxis::periodic(self.azimuth_divisions, self.crop_azimuth)
    }

    fn polar(&self) -> SweepAxis {
        SweepAxis::open(self.polar_divisions, self.crop_polar)
    }

    fn has_poles(&self) -> bool {
        self.crop_polar == 0
    }

    /// Rings between the poles, or the cropped band.
    fn ring_axis(&self) -> SweepAxis {
        if self.has_poles() {
            SweepAxis::open(self.polar_divisions, 1)
        } else {
            self.polar()
        }
    }

    fn validate(&self) -> Result<(), ShapeError> {
        check_positive("radius", self.radius)?;
        if !self.center.is_finite() {
            return Err(ShapeError::NonFinite {
                name: "center",
                value: f64::NAN,
            });
        }
        check_axis("azimuth divisions", self.azimuth())?;
        check_axis("polar divisions", self.polar())
    }

    fn point(&self, polar_fraction: f64, azimuth_fraction: f64) -> Point3 {
        let (sin_theta, cos_theta) = (PI * polar_fraction).sin_cos();
        let (sin_phi, cos_phi) = (TAU * azimuth_fraction).sin_cos();
        Point3::new(
            self.center.x + self.radius * sin_theta * cos_phi,
            self.center.y + self.radius * sin_theta * sin_phi,
            self.center.z + self.radius * cos_theta,
        )
        .with_f(polar_fraction)
    }
}

impl Shape for SphereSegment {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        self.validate()?;

        let azimuth = self.azimuth();
        let rings = self.ring_axis();
        let band = SweepGrid::new(rings, azimuth);

        if !self.has_poles() {
            let mut vertices = Vec::with_capacity(band.vertex_count());
            for k in 0..rings.samples() {
                for j in 0..azimuth.samples() {
                    vertices.push(self.point(rings.fraction(k), azimuth.fraction(j)));
                }
            }
            return Ok(ShapeGeometry::new(vertices, band.faces())
                .with_texture(band.tex_coords(), Some(band.texture_faces())));
        }

        let n_az = azimuth.samples();
        let cells_az = azimuth.cells();
        let ring_count = rings.samples();

        let mut vertices = Vec::with_capacity(band.vertex_count() + 2);
        vertices.push(self.point(0.0, 0.0));
        for k in 0..ring_count {
            for j in 0..n_az {
                vertices.push(self.point(rings.fraction(k), azimuth.fraction(j)));
            }
        }
        vertices.push(self.point(1.0, 0.0));
        let south = (vertices.len() - 1) as u32;

        let mut faces: Vec<Face3> = band.faces().iter().map(|f| f.offset(1)).collect();
        let last_ring = (1 + (ring_count - 1) * n_az) as u32;
        for j in 0..cells_az {
            let next = if azimuth.wraps() && j + 1 == n_az { 0 } else { j + 1 };
            let (j, next) = (j as u32, next as u32);
            faces.push(Face3::new(0, 1 + j, 1 + next));
        }
        for j in 0..cells_az {
            let next = if azimuth.wraps() && j + 1 == n_az { 0 } else { j + 1 };
            let (j, next) = (j as u32, next as u32);
            faces.push(Face3::new(last_ring + j, south, last_ring + next));
        }

        // Unwrapped UV grid over every polar row, poles included.
        let rows = self.polar_divisions + 1;
        let stride = cells_az + 1;
        let mut tex_coords = Vec::with_capacity(rows * stride);
        for k in 0..rows {
            let v = k as f64 / self.polar_divisions as f64;
            for j in 0..stride {
                tex_coords.push([j as f64 / cells_az as f64, v]);
            }
        }
        let uv = |k: usize, j: usize| (k * stride + j) as u32;

        let mut texture_faces = Vec::with_capacity(faces.len());
        for k in 1..rows - 2 {
            for j in 0..cells_az {
                let (a, b, c, d) = (uv(k, j), uv(k + 1, j), uv(k + 1, j + 1), uv(k, j + 1));
                texture_faces.push(Face3::new(a, b, c));
                texture_faces.push(Face3::new(c, d, a));
            }
        }
        for j in 0..cells_az {
            texture_faces.push(Face3::new(uv(0, j), uv(1, j), uv(1, j + 1)));
        }
        for j in 0..cells_az {
            let k = rows - 2;
            texture_faces.push(Face3::new(uv(k, j), uv(k + 1, j), uv(k, j + 1)));
        }

        Ok(ShapeGeometry::new(vertices, faces).with_texture(tex_coords, Some(texture_faces)))
    }
}
