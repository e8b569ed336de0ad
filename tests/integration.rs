use std::time::Duration;

use procmesh_engine::Engine;
use procmesh_engine::cloth::{ClothAnchors, ClothMesh, ClothParams, ClothSimulator};
use procmesh_engine::geom::{
    CsgPolygon, CubicBezier3, MeshDiagnostics, Point3, TextureMode, Vec3, csg_to_mesh,
};
use procmesh_engine::shapes::{
    BezierTube, Cone, Knot, Prism, Shape, SphereSegment, Spring, SurfacePlot, Torus,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn engine_initializes() {
    let engine = Engine::new();
    assert!(engine.is_initialized());
}

#[test]
fn default_torus_counts() {
    let mesh = Torus::default().generate(&TextureMode::None).unwrap();
    assert_eq!(mesh.vertex_count(), 4096);
    assert_eq!(mesh.face_count(), 8192);
    assert_eq!(mesh.tex_coord_count(), 1);
    assert_eq!(mesh.face_smoothing_groups.len(), 8192);
}

#[test]
fn random_divisions_keep_periodic_shapes_closed() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..40 {
        let outer = rng.random_range(3..40);
        let inner = rng.random_range(3..24);

        let torus = Torus::new(rng.random_range(2.0..20.0), 1.0, outer, inner);
        let d = torus.diagnostics().unwrap();
        assert!(d.is_closed_manifold(), "torus {outer}x{inner}: {}", d.summary());
        assert_eq!(d.vertex_count, outer * inner);
        assert_eq!(d.triangle_count, 2 * outer * inner);

        let knot = Knot {
            length_divisions: outer * 4,
            wire_divisions: inner,
            ..Knot::default()
        };
        let d = knot.diagnostics().unwrap();
        assert!(d.is_closed_manifold(), "knot {}x{inner}: {}", outer * 4, d.summary());
    }
}

#[test]
fn random_crops_open_exactly_two_seams() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..30 {
        let divisions = rng.random_range(6..48);
        let crop = rng.random_range(1..divisions / 2);
        let tube = rng.random_range(3..16);
        let torus = Torus {
            crop_radius: crop,
            ..Torus::new(5.0, 1.0, divisions, tube)
        };
        let d = torus.diagnostics().unwrap();
        assert_eq!(d.open_edge_count, 2 * tube, "{divisions}/{crop}x{tube}");
        assert_eq!(d.vertex_count, (divisions + 1 - 2 * crop) * tube);
        assert_eq!(d.orphan_vertex_count, 0);
    }
}

fn random_modes(rng: &mut StdRng) -> Vec<TextureMode> {
    vec![
        TextureMode::None,
        TextureMode::Image,
        TextureMode::colored_by_arc_length(rng.random_range(2..16)),
        TextureMode::colored_by_radius(rng.random_range(2..16)),
        TextureMode::ColoredFaces {
            colors: rng.random_range(2..16),
        },
    ]
}

fn random_point(rng: &mut StdRng) -> Point3 {
    Point3::new(
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
        rng.random_range(-10.0..10.0),
    )
}

/// Assembles `shape` in every mode and returns its diagnostics after the
/// checks every generator must pass.
fn assemble_everywhere<S: Shape>(shape: &S, rng: &mut StdRng, label: &str) -> MeshDiagnostics {
    let d = shape.diagnostics().unwrap();
    for mode in random_modes(rng) {
        let mesh = shape
            .generate(&mode)
            .unwrap_or_else(|e| panic!("{label} in {}: {e}", mode.name()));
        mesh.validate()
            .unwrap_or_else(|e| panic!("{label} in {}: {e}", mode.name()));
        assert_eq!(mesh.vertex_count(), d.vertex_count, "{label}");
        assert_eq!(mesh.face_count(), d.triangle_count, "{label}");
    }
    assert!(d.is_manifold(), "{label}: {}", d.summary());
    assert_eq!(d.inconsistent_edge_count, 0, "{label}: {}", d.summary());
    assert_eq!(d.orphan_vertex_count, 0, "{label}: {}", d.summary());
    d
}

#[test]
fn random_spheres_in_every_crop() {
    let mut rng = StdRng::seed_from_u64(0x5_9e7e);
    for _ in 0..6 {
        let azimuth = rng.random_range(3..14);
        let polar = rng.random_range(3..10);
        let radius = rng.random_range(0.5..20.0);
        for crop_azimuth in 0..(azimuth + 1) / 2 {
            for crop_polar in 0..(polar + 1) / 2 {
                let sphere = SphereSegment {
                    crop_azimuth,
                    crop_polar,
                    center: random_point(&mut rng),
                    ..SphereSegment::new(radius, azimuth, polar)
                };
                let label = format!("sphere {azimuth}x{polar} crop {crop_azimuth}/{crop_polar}");
                let d = assemble_everywhere(&sphere, &mut rng, &label);

                let expected_open = match (crop_azimuth, crop_polar) {
                    (0, 0) => 0,
                    (_, 0) => 2 * polar,
                    (0, _) => 2 * azimuth,
                    (a, p) => 2 * (azimuth - 2 * a) + 2 * (polar - 2 * p),
                };
                assert_eq!(d.open_edge_count, expected_open, "{label}");
                if expected_open == 0 {
                    assert!(d.is_closed_manifold(), "{label}: {}", d.summary());
                    assert!(d.signed_volume > 0.0, "{label}");
                }
            }
        }
    }
}

#[test]
fn random_tubes_open_only_at_their_ends() {
    let mut rng = StdRng::seed_from_u64(0x7_0be5);
    for _ in 0..30 {
        let length = rng.random_range(3..14);
        let wire = rng.random_range(3..10);
        let crop_length = rng.random_range(0..(length + 1) / 2);
        let crop_wire = rng.random_range(0..(wire + 1) / 2);
        let expected_open = if crop_wire == 0 {
            2 * wire
        } else {
            2 * (wire - 2 * crop_wire) + 2 * (length - 2 * crop_length)
        };

        let spring = Spring {
            mean_radius: rng.random_range(2.0..10.0),
            wire_radius: rng.random_range(0.1..1.0),
            pitch: rng.random_range(1.0..6.0),
            length: rng.random_range(2.0..30.0),
            length_divisions: length,
            wire_divisions: wire,
            crop_length,
            crop_wire,
            wire_start_angle: rng.random_range(0.0..6.0),
        };
        let label = format!("spring {length}x{wire} crop {crop_length}/{crop_wire}");
        let d = assemble_everywhere(&spring, &mut rng, &label);
        assert_eq!(d.open_edge_count, expected_open, "{label}");

        let tube = BezierTube {
            curve: CubicBezier3::new(
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
            ),
            wire_radius: rng.random_range(0.1..2.0),
            wire_start_angle: rng.random_range(0.0..6.0),
            length_divisions: length,
            wire_divisions: wire,
            crop_length,
            crop_wire,
        };
        let label = format!("bezier tube {length}x{wire} crop {crop_length}/{crop_wire}");
        let d = assemble_everywhere(&tube, &mut rng, &label);
        assert_eq!(d.open_edge_count, expected_open, "{label}");
    }
}

#[test]
fn random_capped_solids_are_closed() {
    let mut rng = StdRng::seed_from_u64(0xc0_5e);
    for _ in 0..30 {
        let divisions = rng.random_range(3..14);
        let capped = rng.random_bool(0.5);

        let cone = Cone {
            capped,
            ..Cone::new(divisions, rng.random_range(0.5..10.0), rng.random_range(0.5..10.0))
        };
        let label = format!("cone {divisions} capped {capped}");
        let d = assemble_everywhere(&cone, &mut rng, &label);
        if capped {
            assert!(d.is_closed_manifold(), "{label}: {}", d.summary());
            assert!(d.signed_volume > 0.0, "{label}");
        } else {
            assert_eq!(d.open_edge_count, divisions, "{label}");
        }

        let start = random_point(&mut rng);
        let axis = random_point(&mut rng) - Point3::ORIGIN;
        let end = start + if axis.length() < 1.0 { Vec3::Z } else { axis };
        let level = rng.random_range(1..10);
        let prism = Prism {
            level,
            capped,
            ..Prism::between(start, end, rng.random_range(0.2..5.0), divisions)
        };
        let label = format!("prism {divisions}x{level} capped {capped}");
        let d = assemble_everywhere(&prism, &mut rng, &label);
        if capped {
            assert!(d.is_closed_manifold(), "{label}: {}", d.summary());
            assert!(d.signed_volume > 0.0, "{label}");
        } else {
            assert_eq!(d.open_edge_count, 2 * divisions, "{label}");
        }
    }
}

#[test]
fn random_surface_plots_keep_their_rim() {
    let mut rng = StdRng::seed_from_u64(0x9_107);
    for _ in 0..20 {
        let (a, b) = (rng.random_range(-3.0..3.0), rng.random_range(-3.0..3.0));
        let divisions_x = rng.random_range(3..14);
        let divisions_y = rng.random_range(3..10);
        let plot = SurfacePlot {
            divisions_x,
            divisions_y,
            width: rng.random_range(1.0..30.0),
            depth: rng.random_range(1.0..30.0),
            ..SurfacePlot::from_function(move |x, y| a * x.sin() + b * y.cos())
        };
        let label = format!("plot {divisions_x}x{divisions_y}");
        let d = assemble_everywhere(&plot, &mut rng, &label);
        assert_eq!(d.vertex_count, (divisions_x + 1) * (divisions_y + 1), "{label}");
        assert_eq!(d.open_edge_count, 2 * (divisions_x + divisions_y), "{label}");
    }
}

#[test]
fn sweeps_take_every_texture_mode() {
    let spring = Spring::default();
    let sphere = SphereSegment::new(3.0, 20, 10);
    for mode in [
        TextureMode::None,
        TextureMode::Image,
        TextureMode::colored_by_arc_length(12),
        TextureMode::colored_by_radius(12),
        TextureMode::ColoredFaces { colors: 12 },
    ] {
        for mesh in [spring.generate(&mode).unwrap(), sphere.generate(&mode).unwrap()] {
            mesh.validate().unwrap();
        }
    }
}

#[test]
fn untextured_assembly_is_deterministic() {
    let knot = Knot::default();
    let a = knot.generate(&TextureMode::None).unwrap();
    let b = knot.generate(&TextureMode::None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn csg_cube_welds_to_eight_vertices() {
    let corner = |i: usize| {
        [
            (i & 1) as f64,
            ((i >> 1) & 1) as f64,
            ((i >> 2) & 1) as f64,
        ]
    };
    let quads = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    let polygons: Vec<CsgPolygon> = quads
        .iter()
        .map(|q| CsgPolygon::from(q.iter().map(|&i| corner(i)).collect::<Vec<_>>()))
        .collect();
    let geometry = csg_to_mesh(&polygons).unwrap();
    assert_eq!(geometry.vertex_count(), 8);
    assert_eq!(geometry.face_count(), 12);
    let d = MeshDiagnostics::from_geometry(&geometry);
    assert!(d.is_closed_manifold(), "{}", d.summary());
    assert!((d.signed_volume.abs() - 1.0).abs() < 1e-9);
}

#[test]
fn pinned_cloth_hangs_and_settles() {
    let params = ClothParams {
        anchors: ClothAnchors::TopEdge,
        ..ClothParams::new(2.0, 1.0, 8, 6)
    };
    let cloth = ClothMesh::new(params).unwrap();
    let top: Vec<[f32; 3]> = cloth.vertex_snapshot()[..8].to_vec();
    let mut sim = ClothSimulator::new(cloth);

    sim.start(Duration::ZERO);
    let step = Duration::from_millis(16);
    for frame in 1..=600u32 {
        sim.tick(step * frame);
    }
    sim.pause(step * 600);

    let snapshot = sim.vertex_snapshot();
    assert_eq!(&snapshot[..8], &top[..]);
    assert!(snapshot.iter().flatten().all(|c| c.is_finite()));
    let lowest = snapshot.iter().map(|v| v[1]).fold(f32::INFINITY, f32::min);
    assert!(lowest < 0.0);
    assert!(lowest > -1.5);
}
