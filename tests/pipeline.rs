#![allow(clippy::unwrap_used)]

use std::f64::consts::{FRAC_PI_2, PI};

use approx::assert_relative_eq;
use dome_bricks::dome::{
    plan, select_open_faces, BatchPolicy, BuildDome, BuildShell, Decompose, DomeConfig,
    HollowParams, PieceRole,
};
use dome_bricks::error::{DomeError, Stage};
use dome_bricks::kernel::{GeometryKernel, PolarKernel};

fn example_config() -> DomeConfig {
    DomeConfig::default()
        .with_radius(2.0)
        .with_thickness_ratio(0.15)
        .with_bricks_gap(0.03)
        .with_vertical_brick_count(5)
        .with_radial_brick_count(6)
        .with_precision(64)
}

#[test]
fn example_dome_has_25_pieces() {
    let kernel = PolarKernel::new();
    let dome = BuildDome::new(example_config()).execute(&kernel).unwrap();

    assert_eq!(dome.plan.cap_angle(), 18.0);
    assert_eq!(dome.plan.polar_angles(), &[36.0, 54.0, 72.0]);
    assert_eq!(
        dome.plan.azimuth_angles(),
        &[0.0, 60.0, 120.0, 180.0, 240.0, 300.0]
    );
    assert_eq!(dome.pieces.len(), 25);
    assert_eq!(dome.pieces[0].role, PieceRole::Cap);
    let ids: Vec<usize> = dome.pieces.iter().map(|p| p.id).collect();
    assert_eq!(ids, (0..25).collect::<Vec<_>>());
    for ring in 0..4 {
        let wedges: Vec<_> = dome.ring(ring).collect();
        assert_eq!(wedges.len(), 6);
        for (wedge, piece) in wedges.iter().enumerate() {
            assert_eq!(piece.role, PieceRole::Wedge { ring, wedge });
        }
    }
    // The cap is the highest piece.
    let cap_z = dome.pieces[0].centroid.z;
    assert!(dome.pieces[1..].iter().all(|p| p.centroid.z < cap_z));
}

#[test]
fn repeated_runs_agree() {
    let kernel = PolarKernel::new();
    let config = example_config().with_precision(16);
    let first = BuildDome::new(config).execute(&kernel).unwrap();
    let second = BuildDome::new(config).execute(&kernel).unwrap();
    assert_eq!(first.pieces.len(), second.pieces.len());
    for (a, b) in first.pieces.iter().zip(&second.pieces) {
        assert_eq!((a.id, a.role), (b.id, b.role));
        assert!((a.centroid - b.centroid).norm() < 1e-9);
        assert_relative_eq!(kernel.volume(&a.solid), kernel.volume(&b.solid), epsilon = 1e-12);
    }
}

#[test]
fn minimum_vertical_count_is_cap_plus_one_ring() {
    let kernel = PolarKernel::new();
    let config = example_config()
        .with_vertical_brick_count(2)
        .with_precision(16);
    let dome = BuildDome::new(config).execute(&kernel).unwrap();
    assert_eq!(dome.pieces.len(), 1 + 6);
    assert!(dome.pieces[1..].iter().all(|p| p.role.ring() == Some(0)));
}

#[test]
fn minimum_radial_count_gives_two_wedges_per_ring() {
    let kernel = PolarKernel::new();
    let config = example_config()
        .with_radial_brick_count(2)
        .with_precision(16);
    let dome = BuildDome::new(config).execute(&kernel).unwrap();
    assert_eq!(dome.pieces.len(), 1 + 4 * 2);
    for ring in 0..4 {
        assert_eq!(dome.ring(ring).count(), 2);
    }
}

#[test]
fn invalid_counts_fail_before_geometry() {
    let kernel = PolarKernel::new();
    for config in [
        example_config().with_vertical_brick_count(7),
        example_config().with_radial_brick_count(7),
    ] {
        assert!(matches!(
            BuildDome::new(config).execute(&kernel),
            Err(DomeError::InvalidConfiguration(_))
        ));
    }
}

#[test]
fn removed_volume_matches_kerf_area() {
    let kernel = PolarKernel::new();
    let config = example_config().with_precision(32);
    let plan = plan(&config).unwrap();
    let shell = BuildShell::new(&config).execute(&kernel).unwrap();
    let shell_volume = kernel.volume(&shell);

    let cut = Decompose::new(&config, &plan).execute(&kernel, shell).unwrap();
    let pieces = kernel.separate_connected_components(cut.body).unwrap();
    let kept: f64 = kernel.volume(&cut.cap) + pieces.iter().map(|p| kernel.volume(p)).sum::<f64>();
    let removed = shell_volume - kept;

    let (outer, inner) = (config.radius, config.radius * (1.0 - config.thickness_ratio));
    let annulus = outer * outer - inner * inner;
    // Cone band between the two spheres: pi * sin(theta) * (R^2 - r^2).
    let cone_area: f64 = plan
        .cut_angles()
        .iter()
        .map(|a| PI * a.to_radians().sin() * annulus)
        .sum();
    // Each meridian half-plane crosses the rings between the cap cut and the base.
    let meridian_area =
        plan.azimuth_angles().len() as f64 * 0.5 * annulus * (FRAC_PI_2 - plan.cap_angle().to_radians());
    let gap = config.bricks_gap;
    let expected = 0.5 * gap * cone_area + gap * meridian_area;

    assert!(removed > 0.0);
    assert!(
        (removed - expected).abs() <= 0.1 * gap * (cone_area + meridian_area),
        "removed {removed}, expected {expected}"
    );
}

#[test]
fn every_piece_hollows_fail_fast() {
    let kernel = PolarKernel::new();
    let config = example_config().with_precision(24);
    let dome = BuildDome::new(config)
        .with_hollowing(HollowParams::default())
        .execute(&kernel)
        .unwrap();
    assert_eq!(dome.pieces.len(), 25);
    assert!(dome.failures.is_empty());
    for piece in &dome.pieces {
        assert!(piece.solid.is_closed(), "piece {} is not closed", piece.id);
        assert!(kernel.volume(&piece.solid) > 0.0);
        assert!((piece.solid.origin() - piece.centroid).norm() < 1e-12);
    }
}

#[test]
fn congruent_wedges_open_the_same_faces() {
    let kernel = PolarKernel::new();
    let config = example_config().with_vertical_brick_count(3);
    let dome = BuildDome::new(config).execute(&kernel).unwrap();
    for ring in 0..dome.plan.ring_count() {
        let openings: Vec<(f64, usize)> = dome
            .ring(ring)
            .map(|piece| {
                let selection =
                    select_open_faces(piece.role, &piece.centroid, &kernel.faces(&piece.solid));
                (selection.reference_normal_z.unwrap(), selection.faces.len())
            })
            .collect();
        assert_eq!(openings.len(), 6);
        let (reference, count) = openings[0];
        for (wedge, &(z, n)) in openings.iter().enumerate() {
            assert!((z - reference).abs() < 1e-9, "ring {ring} wedge {wedge}: {z} vs {reference}");
            assert_eq!(n, count, "ring {ring} wedge {wedge}");
        }
    }
}

#[test]
fn gap_wider_than_the_bricks_is_reported() {
    let kernel = PolarKernel::new();
    let rings = example_config()
        .with_vertical_brick_count(90)
        .with_bricks_gap(0.1)
        .with_precision(16);
    let wedges = example_config()
        .with_radial_brick_count(360)
        .with_precision(16);
    for config in [rings, wedges] {
        assert!(matches!(
            BuildDome::new(config).execute(&kernel),
            Err(DomeError::BooleanOperationFailed { .. })
        ));
    }
}

#[test]
fn fail_soft_reports_nothing_for_a_clean_dome() {
    let kernel = PolarKernel::new();
    let params = HollowParams::default().with_policy(BatchPolicy::FailSoft);
    let dome = BuildDome::new(example_config().with_precision(12))
        .with_hollowing(params)
        .execute(&kernel)
        .unwrap();
    assert_eq!(dome.pieces.len() + dome.failures.len(), 25);
    assert!(dome.failures.is_empty());
}

#[test]
fn thick_walls_fail_at_the_first_meridian_cut() {
    let kernel = PolarKernel::new();
    let config = example_config()
        .with_vertical_brick_count(2)
        .with_thickness_ratio(0.9)
        .with_precision(16);
    let err = BuildDome::new(config).execute(&kernel).unwrap_err();
    match err {
        DomeError::BooleanOperationFailed { stage, .. } => {
            assert_eq!(stage, Stage::AzimuthCut { angle_deg: 0.0 });
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn config_loads_from_json_with_defaults() {
    let config: DomeConfig =
        serde_json::from_str(r#"{ "radius": 3.5, "vertical_brick_count": 6 }"#).unwrap();
    assert_eq!(config.radius, 3.5);
    assert_eq!(config.vertical_brick_count, 6);
    assert_eq!(config.radial_brick_count, 6);
    assert_eq!(config.precision, 32);

    let params: HollowParams = serde_json::from_str(r#"{ "policy": "FailSoft" }"#).unwrap();
    assert_eq!(params.policy, BatchPolicy::FailSoft);
    assert_relative_eq!(params.wall_thickness, 0.02);
}
