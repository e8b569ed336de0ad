use std::f64::consts::{PI, TAU};

use crate::geom::{CubicBezier3, Curve3, Helix3, Point3, TorusKnot3, Trihedrons, frame_at};

const FRAME_TOL: f64 = 1e-4;

fn s_curve() -> CubicBezier3 {
    CubicBezier3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 0.5),
        Point3::new(3.0, -1.0, 1.0),
        Point3::new(4.0, 1.0, 2.0),
    )
}

#[test]
fn sampled_frames_are_orthonormal() {
    let knot = Trihedrons::calculated(TorusKnot3::new(10.0, 4.0, 2.0, 3.0), 200);
    let helix = Trihedrons::calculated(Helix3::new(3.0, 2.0, 10.0), 200);
    let bezier = Trihedrons::calculated(s_curve(), 64);

    for frames in [knot.frames(), helix.frames(), bezier.frames()] {
        for (i, frame) in frames.iter().enumerate() {
            assert!(
                frame.orthonormality_error() < FRAME_TOL,
                "frame {i} off by {}",
                frame.orthonormality_error()
            );
        }
    }
    assert_eq!(knot.len(), 201);
    assert_eq!(helix.fallback_count(), 0);
    assert_eq!(knot.fallback_count(), 0);
}

#[test]
fn binormal_completes_right_handed_basis() {
    let frames = Trihedrons::calculated(TorusKnot3::new(10.0, 4.0, 2.0, 3.0), 50);
    for frame in frames.frames() {
        let b = frame.tangent.cross(frame.normal);
        assert!(b.sub(frame.binormal).length() < 1e-12);
    }
}

#[test]
fn helix_curvature_and_torsion_match_closed_form() {
    let (a, pitch) = (3.0, 2.0);
    let helix = Helix3::new(a, pitch, 10.0);
    let c = pitch / TAU;
    let expected_kappa = a / (a * a + c * c);
    let expected_tau = c / (a * a + c * c);

    for t in [0.3, 1.7, 4.0] {
        assert!((helix.curvature_at(t) - expected_kappa).abs() < 1e-6);
        assert!((helix.torsion_at(t) - expected_tau).abs() < 1e-6);
    }
}

#[test]
fn helix_arc_length_converges() {
    let (a, pitch, length) = (3.0, 2.0, 10.0);
    let frames = Trihedrons::calculated(Helix3::new(a, pitch, length), 800);
    let turns = length / pitch;
    let exact = turns * ((TAU * a).powi(2) + pitch * pitch).sqrt();
    assert!((frames.length() - exact).abs() / exact < 1e-3);
    assert_eq!(frames.arc_fraction(0), 0.0);
    assert!((frames.arc_fraction(800) - 1.0).abs() < 1e-12);
}

#[test]
fn sample_sweeps_circle_of_tube_radius() {
    let frames = Trihedrons::calculated(TorusKnot3::new(10.0, 4.0, 2.0, 3.0), 32);
    let r = 1.5;
    let centre = frames.frames()[5].position;
    for k in 0..8 {
        let u = PI * k as f64 / 4.0;
        let p = frames.sample(5, r * u.cos(), r * u.sin()).unwrap();
        assert!((p.distance_to(centre) - r).abs() < 1e-9);
        assert!((p.f - frames.arc_fraction(5)).abs() < 1e-15);
    }
    assert!(frames.sample(33, 1.0, 0.0).is_none());
}

#[test]
fn exact_frame_is_undefined_on_straight_curve() {
    let line = CubicBezier3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
    );
    assert!(frame_at(&line, 0.5).is_none());
    let frames = Trihedrons::calculated(line, 4);
    assert!(frames.fallback_count() > 0);
    for frame in frames.frames() {
        assert!(frame.orthonormality_error() < FRAME_TOL);
        assert!(frame.position.is_finite());
    }
}
