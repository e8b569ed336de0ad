//! Mesh diagnostics for generated shapes.
//!
//! Diagnostics describe the topology and quality of a [`ShapeGeometry`] and
//! are used for:
//!
//! - Validating generator output (closed, manifold, no orphans or degenerates)
//! - Debugging seam and crop arithmetic (open edges where none are expected)
//! - Reporting numerical fallbacks (Frenet frames that needed a substitute)
//! - Performance profiling (timing buckets)
//!
//! # Example
//!
//! ```ignore
//! use procmesh_engine::geom::MeshDiagnostics;
//!
//! let geometry = torus.build()?;
//! let diagnostics = MeshDiagnostics::from_geometry(&geometry);
//!
//! if diagnostics.is_closed() {
//!     println!("closed surface with {} triangles", diagnostics.triangle_count);
//! } else {
//!     println!("{} open edges", diagnostics.open_edge_count);
//! }
//! ```

use std::fmt;

use super::core::Tolerance;
use super::mesh::{
    ShapeGeometry, degenerate_face_count, edge_topology, inconsistent_edge_count,
    orphan_vertex_count, signed_volume,
};

/// Topology and quality report for a generated mesh.
///
/// # Topology Metrics
///
/// - `open_edge_count`: Edges with only one adjacent triangle (boundary)
/// - `non_manifold_edge_count`: Edges with more than two adjacent triangles
/// - `inconsistent_edge_count`: Directed edges shared by two triangles, i.e.
///   neighbours with opposite winding
///
/// # Quality Metrics
///
/// - `orphan_vertex_count`: Vertices no triangle references
/// - `degenerate_triangle_count`: Zero-area or collapsed triangles
/// - `fallback_frame_count`: Frenet frames replaced by a fallback
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeshDiagnostics {
    /// Total number of vertices.
    pub vertex_count: usize,

    /// Total number of triangles.
    pub triangle_count: usize,

    /// Number of open (boundary) edges.
    ///
    /// A closed surface has zero open edges; cropped and uncapped shapes are
    /// expected to have some.
    pub open_edge_count: usize,

    /// Number of edges shared by more than two triangles.
    pub non_manifold_edge_count: usize,

    /// Number of directed edges used twice (inconsistent winding).
    pub inconsistent_edge_count: usize,

    /// Number of vertices not referenced by any triangle.
    pub orphan_vertex_count: usize,

    /// Number of zero-area or index-collapsed triangles.
    pub degenerate_triangle_count: usize,

    /// Number of Frenet frames that used a fallback tangent or normal.
    pub fallback_frame_count: usize,

    /// Number of duplicate vertices merged (CSG import).
    pub merged_vertex_count: usize,

    /// Signed enclosed volume; positive for outward winding. Only meaningful
    /// for closed surfaces.
    pub signed_volume: f64,

    /// Optional timing breakdown by operation category.
    ///
    /// Only populated when the `mesh_metrics` feature is enabled and the
    /// target is not WASM.
    pub timing: Option<super::metrics::GeomTimingReport>,

    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl MeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes topology and quality counts for a geometry.
    #[must_use]
    pub fn from_geometry(geometry: &ShapeGeometry) -> Self {
        let (open_edge_count, non_manifold_edge_count) = edge_topology(&geometry.faces);
        let mut diagnostics = Self {
            vertex_count: geometry.vertices.len(),
            triangle_count: geometry.faces.len(),
            open_edge_count,
            non_manifold_edge_count,
            inconsistent_edge_count: inconsistent_edge_count(&geometry.faces),
            orphan_vertex_count: orphan_vertex_count(geometry.vertices.len(), &geometry.faces),
            degenerate_triangle_count: degenerate_face_count(
                &geometry.vertices,
                &geometry.faces,
                Tolerance::ZERO_LENGTH.eps,
            ),
            signed_volume: signed_volume(&geometry.vertices, &geometry.faces),
            fallback_frame_count: geometry.fallback_frames,
            ..Self::default()
        };

        if diagnostics.orphan_vertex_count > 0 {
            diagnostics.add_warning("mesh has unreferenced vertices");
        }
        if diagnostics.non_manifold_edge_count > 0 {
            diagnostics.add_warning("mesh has non-manifold edges");
        }
        if diagnostics.inconsistent_edge_count > 0 {
            diagnostics.add_warning("mesh has inconsistently wound neighbours");
        }
        if geometry.fallback_frames > 0 {
            diagnostics.add_warning(format!(
                "{} frame(s) used a fallback orientation",
                geometry.fallback_frames
            ));
        }
        diagnostics
    }

    /// Returns `true` if the mesh has no open edges.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Closed, manifold and consistently wound: every edge is shared by
    /// exactly two triangles that traverse it in opposite directions.
    #[must_use]
    pub fn is_closed_manifold(&self) -> bool {
        self.is_closed() && self.is_manifold() && self.inconsistent_edge_count == 0
    }

    /// Returns `true` if no issue of any kind was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.is_manifold()
            && self.inconsistent_edge_count == 0
            && self.orphan_vertex_count == 0
            && self.degenerate_triangle_count == 0
            && self.fallback_frame_count == 0
            && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }
        if self.inconsistent_edge_count > 0 {
            parts.push(format!("flipped:{}", self.inconsistent_edge_count));
        }
        if self.orphan_vertex_count > 0 {
            parts.push(format!("orphans:{}", self.orphan_vertex_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.fallback_frame_count > 0 {
            parts.push(format!("fallback-frames:{}", self.fallback_frame_count));
        }
        if self.merged_vertex_count > 0 {
            parts.push(format!("merged:{}", self.merged_vertex_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for MeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.is_closed() {
            writeln!(f, "  Volume: {:.6}", self.signed_volume)?;
        }

        if self.open_edge_count > 0 || self.non_manifold_edge_count > 0 || self.inconsistent_edge_count > 0 {
            writeln!(f, "  Topology:")?;
            if self.open_edge_count > 0 {
                writeln!(f, "    - Open edges: {}", self.open_edge_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(f, "    - Non-manifold edges: {}", self.non_manifold_edge_count)?;
            }
            if self.inconsistent_edge_count > 0 {
                writeln!(f, "    - Inconsistent edges: {}", self.inconsistent_edge_count)?;
            }
        }

        if self.orphan_vertex_count > 0 || self.degenerate_triangle_count > 0 || self.fallback_frame_count > 0 {
            writeln!(f, "  Quality:")?;
            if self.orphan_vertex_count > 0 {
                writeln!(f, "    - Orphan vertices: {}", self.orphan_vertex_count)?;
            }
            if self.degenerate_triangle_count > 0 {
                writeln!(f, "    - Degenerate triangles: {}", self.degenerate_triangle_count)?;
            }
            if self.fallback_frame_count > 0 {
                writeln!(f, "    - Fallback frames: {}", self.fallback_frame_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() && self.is_closed() {
            "CLOSED"
        } else if self.is_clean() {
            "OPEN"
        } else {
            "ISSUES DETECTED"
        };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Face3, Point3};

    #[test]
    fn test_default_is_clean() {
        let diag = MeshDiagnostics::default();
        assert!(diag.is_clean());
        assert!(diag.is_closed());
        assert!(diag.is_closed_manifold());
        assert!(!diag.has_warnings());
    }

    #[test]
    fn test_open_edges_not_closed() {
        let diag = MeshDiagnostics {
            open_edge_count: 3,
            ..Default::default()
        };
        assert!(!diag.is_closed());
        assert!(diag.is_manifold());
        assert!(!diag.is_closed_manifold());
        assert!(diag.is_clean());
    }

    #[test]
    fn test_from_geometry_single_triangle() {
        let geometry = ShapeGeometry::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(5.0, 5.0, 5.0),
            ],
            vec![Face3::new(0, 1, 2)],
        );
        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert_eq!(diag.vertex_count, 4);
        assert_eq!(diag.triangle_count, 1);
        assert_eq!(diag.open_edge_count, 3);
        assert_eq!(diag.orphan_vertex_count, 1);
        assert!(diag.has_warnings());
        assert!(!diag.is_clean());
    }

    #[test]
    fn test_from_geometry_carries_fallback_frames() {
        let mut geometry = ShapeGeometry::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![Face3::new(0, 1, 2)],
        );
        geometry.fallback_frames = 2;
        let diag = MeshDiagnostics::from_geometry(&geometry);
        assert_eq!(diag.fallback_frame_count, 2);
        assert!(diag.warnings.iter().any(|w| w.contains("2 frame(s)")));
    }

    #[test]
    fn test_summary_and_display() {
        let diag = MeshDiagnostics {
            vertex_count: 100,
            triangle_count: 50,
            open_edge_count: 2,
            fallback_frame_count: 1,
            warnings: vec!["test warning".to_string()],
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("V:100"));
        assert!(summary.contains("open:2"));
        assert!(summary.contains("fallback-frames:1"));

        let output = format!("{}", diag);
        assert!(output.contains("Open edges: 2"));
        assert!(output.contains("test warning"));
        assert!(output.contains("ISSUES DETECTED"));
    }
}
