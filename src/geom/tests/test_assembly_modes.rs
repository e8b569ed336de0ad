use crate::geom::{
    AssemblyError, CsgPolygon, DensityFunction, DensityRange, ExpressionError, Point3,
    ShapeGeometry, SweepAxis, SweepGrid, TextureMode, csg_to_mesh,
};

/// Unit cylinder band with per-vertex tags running along its length.
fn band() -> ShapeGeometry {
    let grid = SweepGrid::new(SweepAxis::periodic(8, 0), SweepAxis::open(4, 0));
    let mut vertices = Vec::with_capacity(grid.vertex_count());
    for o in 0..grid.outer.samples() {
        let phi = std::f64::consts::TAU * grid.outer.fraction(o);
        for i in 0..grid.inner.samples() {
            let z = grid.inner.fraction(i);
            vertices.push(Point3::new(phi.cos(), phi.sin(), z).with_f(z));
        }
    }
    ShapeGeometry::new(vertices, grid.faces()).with_texture(grid.tex_coords(), Some(grid.texture_faces()))
}

#[test]
fn none_mode_is_byte_identical_across_runs() {
    let geometry = band();
    let a = geometry.assemble(&TextureMode::None).unwrap();
    let b = geometry.assemble(&TextureMode::None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.tex_coord_count(), 1);
    assert!(a.faces.chunks_exact(2).all(|corner| corner[1] == 0));
}

#[test]
fn every_mode_keeps_vertex_buffer_and_topology() {
    let geometry = band();
    let modes = [
        TextureMode::None,
        TextureMode::Image,
        TextureMode::colored_by_arc_length(5),
        TextureMode::colored_by_radius(3),
        TextureMode::ColoredFaces { colors: 7 },
    ];
    let reference = geometry.assemble(&TextureMode::None).unwrap();
    for mode in &modes {
        let mesh = geometry.assemble(mode).unwrap();
        mesh.validate().unwrap();
        assert_eq!(mesh.points, reference.points, "{}", mode.name());
        let vertex_faces: Vec<_> = mesh.vertex_faces().collect();
        let reference_faces: Vec<_> = reference.vertex_faces().collect();
        assert_eq!(vertex_faces, reference_faces, "{}", mode.name());
        if let Some(colors) = mode.colors() {
            assert_eq!(mesh.tex_coord_count(), colors);
        }
    }
}

#[test]
fn image_mode_uses_seam_duplicated_grid() {
    let mesh = band().assemble(&TextureMode::Image).unwrap();
    assert_eq!(mesh.vertex_count(), 8 * 5);
    assert_eq!(mesh.tex_coord_count(), 9 * 5);
}

#[test]
fn arc_length_buckets_follow_the_tag() {
    let mesh = band().assemble(&TextureMode::colored_by_arc_length(4)).unwrap();
    for corner in mesh.faces.chunks_exact(2) {
        let z = mesh.vertex(corner[0] as usize).unwrap()[2];
        let expected = ((f64::from(z) * 4.0).floor() as u32).min(3);
        assert_eq!(corner[1], expected);
    }
}

#[test]
fn fixed_range_ignores_data_extremes() {
    let mode = TextureMode::ColoredVertices1D {
        colors: 10,
        density: DensityFunction::arc_fraction(),
        range: DensityRange::Fixed { min: 0.0, max: 10.0 },
    };
    let mesh = band().assemble(&mode).unwrap();
    // Tags only span [0, 1], i.e. the first bucket of ten.
    assert!(mesh.faces.chunks_exact(2).all(|corner| corner[1] <= 1));
}

#[test]
fn density_expression_failures_surface() {
    let mode = TextureMode::ColoredVertices1D {
        colors: 4,
        density: DensityFunction::parametric_expression("1 / f").unwrap(),
        range: DensityRange::Auto,
    };
    assert!(matches!(
        band().assemble(&mode),
        Err(AssemblyError::Density(ExpressionError::NonFinite { .. }))
    ));
}

#[test]
fn csg_quads_feed_the_untextured_path() {
    let polygons: Vec<CsgPolygon> = vec![
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
    ]
    .into_iter()
    .map(CsgPolygon::from)
    .collect();
    let geometry = csg_to_mesh(&polygons).unwrap();
    assert_eq!(geometry.vertex_count(), 6);
    let mesh = geometry.assemble(&TextureMode::None).unwrap();
    assert_eq!(mesh.face_count(), 4);
    mesh.validate().unwrap();
}
