use shape_regularization::angle::angular_difference_180;
use shape_regularization::segments::io::{parse_segments, write_segments_csv};
use shape_regularization::{regularize_segments, RegularizationParams, Segment};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Four segments from the reference scenario: three forming a noisy
/// rectangle corner, one far away and ungrouped.
fn scenario_segments() -> Vec<Segment> {
    vec![
        Segment::from_coords(0.0, 0.0, 10.0, 0.2),
        Segment::from_coords(10.0, 0.2, 10.1, 10.0),
        Segment::from_coords(0.0, 0.1, 10.0, 0.0),
        Segment::from_coords(100.0, 100.0, 110.0, 100.3),
    ]
}

fn scenario_params() -> RegularizationParams {
    RegularizationParams {
        maximum_angle_deg: 10.0,
        maximum_offset: 0.1,
    }
}

#[test]
fn scenario_snaps_angles_and_offsets() {
    init_logging();
    let mut segments = scenario_segments();
    let report = regularize_segments(&mut segments, &[vec![0, 1, 2]], &scenario_params());
    assert!(!report.angle_pass_failed);
    assert!(!report.offset_pass_failed);
    assert!(report.modified_angles >= 2, "report: {report:?}");

    // 0 and 2 exactly parallel, 1 exactly perpendicular to them.
    let theta0 = segments[0].orientation_deg();
    let theta1 = segments[1].orientation_deg();
    let theta2 = segments[2].orientation_deg();
    assert!(
        angular_difference_180(theta0, theta2) < 1e-9,
        "parallel residual {}",
        angular_difference_180(theta0, theta2)
    );
    assert!(
        (angular_difference_180(theta0, theta1) - 90.0).abs() < 1e-6,
        "perpendicular residual {}",
        (angular_difference_180(theta0, theta1) - 90.0).abs()
    );

    // 0 and 2 collinear after the offset pass.
    let normal = segments[0].normal();
    let offset_gap = (segments[0].offset_along(&normal) - segments[2].offset_along(&normal)).abs();
    assert!(offset_gap < 1e-9, "offset residual {offset_gap}");

    // Segment 3 was in no group and is bit-identical to its input.
    assert_eq!(segments[3], scenario_segments()[3]);
}

#[test]
fn deviations_respect_the_configured_bounds() {
    init_logging();
    let originals = scenario_segments();
    let mut segments = originals.clone();
    let params = scenario_params();
    regularize_segments(&mut segments, &[vec![0, 1, 2]], &params);

    for (before, after) in originals.iter().zip(&segments) {
        let rotation = angular_difference_180(before.orientation_deg(), after.orientation_deg());
        assert!(
            rotation <= params.maximum_angle_deg + 1e-6,
            "rotation {rotation} exceeds bound"
        );
        let normal = after.normal();
        let shift = (before.offset_along(&normal) - after.offset_along(&normal)).abs();
        assert!(
            shift <= params.maximum_offset + 1e-6,
            "shift {shift} exceeds bound"
        );
        assert!((before.length() - after.length()).abs() < 1e-9);
    }
}

#[test]
fn second_run_modifies_nothing() {
    init_logging();
    let mut segments = scenario_segments();
    let groups = vec![vec![0, 1, 2]];
    let params = scenario_params();
    let first = regularize_segments(&mut segments, &groups, &params);
    assert!(first.modified_angles > 0);

    let again = segments.clone();
    let second = regularize_segments(&mut segments, &groups, &params);
    assert_eq!(second.modified_angles, 0, "report: {second:?}");
    assert_eq!(second.modified_offsets, 0, "report: {second:?}");
    for (a, b) in again.iter().zip(&segments) {
        assert!(angular_difference_180(a.orientation_deg(), b.orientation_deg()) < 1e-9);
    }
}

#[test]
fn a_fan_of_near_parallel_segments_collapses_to_one_orientation() {
    init_logging();
    // Orientations 0..8 degrees, all pairwise within the 20-degree pair
    // tolerance implied by a 10-degree bound.
    let mut segments: Vec<Segment> = (0..5)
        .map(|k| {
            let theta = (k as f64).to_radians() * 2.0;
            let y0 = k as f64;
            Segment::from_coords(0.0, y0, 10.0 * theta.cos(), y0 + 10.0 * theta.sin())
        })
        .collect();
    let originals = segments.clone();
    let group: Vec<usize> = (0..segments.len()).collect();
    let params = RegularizationParams {
        maximum_angle_deg: 10.0,
        maximum_offset: 0.0,
    };
    let report = regularize_segments(&mut segments, &[group], &params);
    assert!(!report.angle_pass_failed);

    let reference = segments[0].orientation_deg();
    for (before, after) in originals.iter().zip(&segments) {
        assert!(
            angular_difference_180(after.orientation_deg(), reference) < 1e-9,
            "not collapsed: {} vs {}",
            after.orientation_deg(),
            reference
        );
        assert!(
            angular_difference_180(before.orientation_deg(), after.orientation_deg()) <= 10.0 + 1e-6
        );
    }
}

#[test]
fn zero_angle_bound_pins_every_orientation() {
    init_logging();
    let mut segments = scenario_segments();
    let originals = segments.clone();
    let params = RegularizationParams {
        maximum_angle_deg: 0.0,
        maximum_offset: 0.1,
    };
    let report = regularize_segments(&mut segments, &[vec![0, 1, 2]], &params);
    assert!(!report.angle_pass_failed, "zero bound must not fail");
    assert_eq!(report.modified_angles, 0);
    for (before, after) in originals.iter().zip(&segments) {
        assert!(
            angular_difference_180(before.orientation_deg(), after.orientation_deg()) < 1e-9
        );
    }
}

#[test]
fn ungrouped_segments_never_move() {
    init_logging();
    let mut segments = scenario_segments();
    let report = regularize_segments(&mut segments, &[vec![0, 2]], &scenario_params());
    assert!(report.modified_angles > 0);
    assert_eq!(segments[1], scenario_segments()[1]);
    assert_eq!(segments[3], scenario_segments()[3]);
}

#[test]
fn csv_round_trip_preserves_coordinates() {
    let segments = scenario_segments();
    let path = std::env::temp_dir().join("shape_regularization_roundtrip.csv");
    write_segments_csv(&path, &segments).unwrap();
    let data = std::fs::read_to_string(&path).unwrap();
    let restored = parse_segments(&data).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.len(), segments.len());
    for (a, b) in segments.iter().zip(&restored) {
        assert_eq!(a, b, "round trip drifted: {a:?} vs {b:?}");
    }
}
