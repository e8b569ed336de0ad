//! Sweep-grid index arithmetic shared by every primitive built from two
//! parameter axes (tubes, tori, spheres, plots).

use serde::{Deserialize, Serialize};

use super::face::Face3;

/// Smallest division count any primitive accepts.
pub const MIN_DIVISIONS: usize = 3;

/// One parameter axis of a sweep grid.
///
/// A periodic axis with `crop == 0` closes on itself: it emits `divisions`
/// samples and the last cell wraps back to sample 0. Any other axis emits
/// `divisions + 1 − 2·crop` samples and stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub divisions: usize,
    pub crop: usize,
    pub periodic: bool,
}

impl SweepAxis {
    #[must_use]
    pub const fn new(divisions: usize, crop: usize, periodic: bool) -> Self {
        Self {
            divisions,
            crop,
            periodic,
        }
    }

    #[must_use]
    pub const fn periodic(divisions: usize, crop: usize) -> Self {
        Self::new(divisions, crop, true)
    }

    #[must_use]
    pub const fn open(divisions: usize, crop: usize) -> Self {
        Self::new(divisions, crop, false)
    }

    #[must_use]
    pub const fn wraps(&self) -> bool {
        self.periodic && self.crop == 0
    }

    /// True when the divisions and crop leave at least one cell.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.divisions >= MIN_DIVISIONS && 2 * self.crop < self.divisions
    }

    /// Number of vertex samples along the axis.
    #[must_use]
    pub const fn samples(&self) -> usize {
        if self.wraps() {
            self.divisions
        } else {
            self.divisions + 1 - 2 * self.crop
        }
    }

    /// Number of cells (quads) along the axis.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.divisions - 2 * self.crop
    }

    /// Division index of local sample `k`.
    #[must_use]
    pub const fn division_index(&self, k: usize) -> usize {
        self.crop + k
    }

    /// Fraction of the full parameter range at local sample `k`.
    #[must_use]
    pub fn fraction(&self, k: usize) -> f64 {
        self.division_index(k) as f64 / self.divisions as f64
    }
}

/// Two-axis grid. Vertex `(o, i)` lives at `o · inner.samples() + i`.
///
/// Primitives pick which parameter is `outer` so that `d_outer × d_inner`
/// points out of the surface; the faces emitted here are then CCW seen from
/// outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepGrid {
    pub outer: SweepAxis,
    pub inner: SweepAxis,
}

impl SweepGrid {
    #[must_use]
    pub const fn new(outer: SweepAxis, inner: SweepAxis) -> Self {
        Self { outer, inner }
    }

    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.outer.samples() * self.inner.samples()
    }

    #[must_use]
    pub const fn face_count(&self) -> usize {
        2 * self.outer.cells() * self.inner.cells()
    }

    #[must_use]
    pub const fn index(&self, o: usize, i: usize) -> usize {
        o * self.inner.samples() + i
    }

    /// Geometry faces, wrapping periodic uncropped axes.
    #[must_use]
    pub fn faces(&self) -> Vec<Face3> {
        let n_outer = self.outer.samples();
        let n_inner = self.inner.samples();
        let cells_o = self.outer.cells();
        let cells_i = self.inner.cells();
        let mut faces = Vec::with_capacity(self.face_count());

        for o in 0..cells_o {
            let wrap_o = self.outer.wraps() && o + 1 == cells_o;
            for i in 0..cells_i {
                let wrap_i = self.inner.wraps() && i + 1 == cells_i;

                let p00 = o * n_inner + i;
                let mut p01 = p00 + 1;
                let mut p10 = p00 + n_inner;
                let mut p11 = p10 + 1;
                if wrap_i {
                    p01 -= n_inner;
                    p11 -= n_inner;
                }
                if wrap_o {
                    p10 -= n_outer * n_inner;
                    p11 -= n_outer * n_inner;
                }

                push_cell(&mut faces, p00, p01, p10, p11);
            }
        }

        faces
    }

    /// Texture-coordinate count: one UV per grid corner, seams duplicated.
    #[must_use]
    pub const fn texture_vertex_count(&self) -> usize {
        (self.outer.cells() + 1) * (self.inner.cells() + 1)
    }

    /// Texture faces over the unwrapped `(cells_o + 1) × (cells_i + 1)` grid,
    /// parallel to [`SweepGrid::faces`].
    #[must_use]
    pub fn texture_faces(&self) -> Vec<Face3> {
        let cells_o = self.outer.cells();
        let cells_i = self.inner.cells();
        let stride = cells_i + 1;
        let mut faces = Vec::with_capacity(self.face_count());

        for o in 0..cells_o {
            for i in 0..cells_i {
                let p00 = o * stride + i;
                push_cell(&mut faces, p00, p00 + 1, p00 + stride, p00 + stride + 1);
            }
        }

        faces
    }

    /// UVs matching [`SweepGrid::texture_faces`]: `u` runs along the inner axis,
    /// `v` along the outer axis, both over `[0, 1]`.
    #[must_use]
    pub fn tex_coords(&self) -> Vec<[f64; 2]> {
        let cells_o = self.outer.cells();
        let cells_i = self.inner.cells();
        let mut uvs = Vec::with_capacity(self.texture_vertex_count());
        for o in 0..=cells_o {
            let v = o as f64 / cells_o as f64;
            for i in 0..=cells_i {
                uvs.push([i as f64 / cells_i as f64, v]);
            }
        }
        uvs
    }
}

fn push_cell(faces: &mut Vec<Face3>, p00: usize, p01: usize, p10: usize, p11: usize) {
    let [p00, p01, p10, p11] = [p00, p01, p10, p11].map(|p| p as u32);
    faces.push(Face3::new(p00, p10, p11));
    faces.push(Face3::new(p11, p01, p00));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_sample_counts() {
        assert_eq!(SweepAxis::periodic(8, 0).samples(), 8);
        assert_eq!(SweepAxis::periodic(8, 1).samples(), 7);
        assert_eq!(SweepAxis::open(8, 0).samples(), 9);
        assert_eq!(SweepAxis::open(8, 2).cells(), 4);
        assert!(!SweepAxis::open(2, 0).is_valid());
        assert!(!SweepAxis::periodic(6, 3).is_valid());
        assert!(SweepAxis::periodic(7, 3).is_valid());
    }

    #[test]
    fn wrapped_grid_closes_both_seams() {
        let grid = SweepGrid::new(SweepAxis::periodic(4, 0), SweepAxis::periodic(3, 0));
        let faces = grid.faces();
        assert_eq!(grid.vertex_count(), 12);
        assert_eq!(faces.len(), 24);
        assert!(faces.iter().all(|f| (f.max_index() as usize) < 12));

        // Last cell of the grid uses the very first vertex.
        let last = faces[faces.len() - 2];
        assert_eq!(last, Face3::new(11, 2, 0));
    }

    #[test]
    fn texture_grid_never_wraps() {
        let grid = SweepGrid::new(SweepAxis::periodic(4, 0), SweepAxis::open(3, 0));
        assert_eq!(grid.texture_vertex_count(), 5 * 4);
        assert_eq!(grid.tex_coords().len(), grid.texture_vertex_count());
        let tf = grid.texture_faces();
        assert_eq!(tf.len(), grid.faces().len());
        assert!(tf.iter().all(|f| (f.max_index() as usize) < 20));
    }
}
