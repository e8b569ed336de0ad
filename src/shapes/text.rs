//! Extruded text from glyph outlines.
//!
//! Glyph shaping is the host's job: each glyph arrives as filled regions
//! (outer contour plus holes) in em-box units together with its advance
//! width. Glyphs are laid out left to right, each region is triangulated for
//! the caps, and side walls join the `z = 0` and `z = height` rings.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geom::{
    BBox, Face3, OutlineRegion, Point2, Point3, ShapeGeometry, Tolerance, prepare_region,
    triangulate_region,
};

use super::{Shape, ShapeError, check_finite, check_positive};

/// One glyph's filled regions and horizontal advance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlyphOutline {
    pub regions: Vec<OutlineRegion>,
    pub advance: f64,
}

impl GlyphOutline {
    #[must_use]
    pub fn new(regions: Vec<OutlineRegion>, advance: f64) -> Self {
        Self { regions, advance }
    }

    /// Solid `width × height` block, advancing by its width.
    #[must_use]
    pub fn block(width: f64, height: f64) -> Self {
        Self::new(vec![OutlineRegion::new(rectangle(0.0, 0.0, width, height), Vec::new())], width)
    }

    /// Rectangular frame with a `border`-wide rim, like a blocky "O".
    #[must_use]
    pub fn frame(width: f64, height: f64, border: f64) -> Self {
        let hole = rectangle(border, border, width - border, height - border);
        Self::new(
            vec![OutlineRegion::new(rectangle(0.0, 0.0, width, height), vec![hole])],
            width,
        )
    }
}

fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    vec![
        Point2::new(x0, y0),
        Point2::new(x1, y0),
        Point2::new(x1, y1),
        Point2::new(x0, y1),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrudedText {
    pub glyphs: Vec<GlyphOutline>,
    /// Extrusion depth along +Z.
    pub height: f64,
    /// Extra spacing added after each glyph's advance.
    pub letter_gap: f64,
}

impl Default for ExtrudedText {
    fn default() -> Self {
        Self {
            glyphs: Vec::new(),
            height: 1.0,
            letter_gap: 0.1,
        }
    }
}

impl ExtrudedText {
    #[must_use]
    pub fn new(glyphs: Vec<GlyphOutline>, height: f64) -> Self {
        Self {
            glyphs,
            height,
            ..Self::default()
        }
    }

    fn extrude_region(
        &self,
        glyph: usize,
        region: &OutlineRegion,
        x_offset: f64,
    ) -> Result<ShapeGeometry, ShapeError> {
        let tol = Tolerance::DEFAULT;
        let outline = |source| ShapeError::InvalidOutline { glyph, source };
        let prepared = prepare_region(region, tol).map_err(outline)?;
        let triangulation = triangulate_region(&prepared, tol).map_err(outline)?;

        let n = triangulation.vertices.len() as u32;
        let mut vertices = Vec::with_capacity(2 * n as usize);
        for z in [0.0, self.height] {
            let f = z / self.height;
            vertices.extend(
                triangulation
                    .vertices
                    .iter()
                    .map(|p| Point3::new(p.x + x_offset, p.y, z).with_f(f)),
            );
        }

        let mut faces = Vec::with_capacity(2 * triangulation.triangles.len() + 2 * n as usize);
        for &[a, b, c] in &triangulation.triangles {
            faces.push(Face3::new(a + n, b + n, c + n));
            faces.push(Face3::new(c, b, a));
        }

        // Outer rings run CCW and holes CW, so walking each ring forward keeps
        // the solid on the left and the wall normal on the right.
        let mut start = 0u32;
        for ring in prepared.rings() {
            let len = ring.len() as u32;
            for k in 0..len {
                let a0 = start + k;
                let b0 = start + (k + 1) % len;
                let (a1, b1) = (a0 + n, b0 + n);
                faces.push(Face3::new(a0, b0, b1));
                faces.push(Face3::new(a0, b1, a1));
            }
            start += len;
        }

        Ok(ShapeGeometry::new(vertices, faces))
    }
}

impl Shape for ExtrudedText {
    fn name(&self) -> &'static str {
        "text"
    }

    fn build(&self) -> Result<ShapeGeometry, ShapeError> {
        check_positive("height", self.height)?;
        check_finite("letter gap", self.letter_gap)?;
        if self.glyphs.is_empty() {
            return Err(ShapeError::InvalidParameter("text has no glyph outlines".to_owned()));
        }

        let mut geometry = ShapeGeometry::default();
        let mut cursor = 0.0;
        for (index, glyph) in self.glyphs.iter().enumerate() {
            check_finite("glyph advance", glyph.advance)?;
            for region in &glyph.regions {
                let part = self.extrude_region(index, region, cursor)?;
                let offset = geometry.vertices.len() as u32;
                geometry.vertices.extend(part.vertices);
                geometry
                    .faces
                    .extend(part.faces.iter().map(|f| f.offset(offset)));
            }
            cursor += glyph.advance + self.letter_gap;
        }

        // Planar UVs over the laid-out text.
        if let Some(bounds) = BBox::from_points(&geometry.vertices) {
            let size = bounds.size();
            let (w, h) = (size.x.max(f64::EPSILON), size.y.max(f64::EPSILON));
            geometry.tex_coords = geometry
                .vertices
                .iter()
                .map(|p| [(p.x - bounds.min.x) / w, (p.y - bounds.min.y) / h])
                .collect();
        }

        debug!(
            "text: {} glyphs, {} vertices, {} faces",
            self.glyphs.len(),
            geometry.vertex_count(),
            geometry.face_count()
        );
        Ok(geometry)
    }
}
