mod core;
mod csg;
mod curve;
mod density;
mod diagnostics;
mod face;
mod grid;
mod mesh;
mod metrics;
mod outline;
mod palette;
mod trihedron;

pub use core::{BBox, Point3, Spherical, Tolerance, Transform, Vec3};
pub use csg::{CsgError, CsgPolygon, csg_to_mesh};
pub use curve::{CubicBezier3, Curve3, Helix3, TorusKnot3, interpolate_bezier};
pub use density::{
    DensityFunction, DensityRange, Evaluator, Expression, ExpressionError, Variables,
    density_bucket,
};
pub use diagnostics::MeshDiagnostics;
pub use face::Face3;
pub use grid::{MIN_DIVISIONS, SweepAxis, SweepGrid};
pub use mesh::{
    AssemblyError, MeshBuffers, SMOOTHING_GROUP, ShapeGeometry, TextureMode, assemble,
    degenerate_face_count, edge_topology, inconsistent_edge_count, orphan_vertex_count,
    signed_volume,
};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use outline::{
    OutlineError, OutlineRegion, OutlineTriangulation, Point2, clean_ring, prepare_region,
    signed_area, triangulate_region,
};
pub use palette::{Palette, hsb_to_rgb};
pub use trihedron::{Trihedron, Trihedrons, frame_at};

#[cfg(test)]
mod tests;
