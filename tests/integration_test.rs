//! Integration tests for the anchoring pipeline


use head_anchor::{
    app::AnchorApp,
    config::{Config, PlacementMode, Settings},
    constants::landmark_index,
    geometry::{midpoint, normalized_to_world},
    replay::{synthetic_session, write_recording, JsonLinesSink, PoseRecord, ReplayDetector, ReplaySource},
    scale::ScaleStrategy,
    synthetic::SyntheticFace,
    tracker::TrackingState,
};
use nalgebra::Vector3;
use std::io::Cursor;
use test_helpers::{assert_unit, observation, run_faces, tracker_with, FRAME};

#[test]
fn test_yaw_ramp_compensation() {
    let mut tracker = tracker_with(|s| {
        s.scale.strategy = ScaleStrategy::Combined;
        s.rotation_compensation.threshold = 0.1;
    })
    .unwrap();

    let faces: Vec<SyntheticFace> = (0..30)
        .map(|i| SyntheticFace {
            yaw: 1.2 * f64::from(i) / 29.0,
            ..SyntheticFace::default()
        })
        .collect();

    let mut factors = Vec::new();
    for face in &faces {
        let pose = tracker.process_frame(FRAME, Some(&observation(face, true)));
        assert_eq!(tracker.state(), TrackingState::Tracking);
        assert!(pose.scale >= 0.25 && pose.scale <= 4.0);
        factors.push(tracker.compensation_factor());
    }

    // |yaw| <= 0.1 for the first three frames
    assert_eq!(&factors[..3], &[1.0, 1.0, 1.0]);
    assert!(factors[3] > 1.0);
    for pair in factors.windows(2) {
        assert!(pair[1] >= pair[0], "compensation decreased: {pair:?}");
    }
    assert!(factors.iter().all(|f| (1.0..=2.0).contains(f)));
}

#[test]
fn test_held_frame_emits_previous_pose() {
    let mut tracker = tracker_with(|_| {}).unwrap();
    let poses = run_faces(&mut tracker, &[SyntheticFace::default(), SyntheticFace::default()], true);

    let tiny = SyntheticFace {
        interocular: 0.01,
        ..SyntheticFace::default()
    };
    let held = tracker.process_frame(FRAME, Some(&observation(&tiny, true)));
    assert_eq!(held, poses[1]);
    assert_eq!(tracker.state(), TrackingState::Held);

    // recovers on the next valid frame
    tracker.process_frame(FRAME, Some(&observation(&SyntheticFace::default(), true)));
    assert_eq!(tracker.state(), TrackingState::Tracking);
}

#[test]
fn test_pose_converges_after_jump() {
    let mut tracker = tracker_with(|_| {}).unwrap();
    tracker.process_frame(FRAME, Some(&observation(&SyntheticFace::default(), true)));

    let moved = SyntheticFace {
        center_x: 0.6,
        center_y: 0.45,
        interocular: 0.25,
        yaw: 0.4,
        ..SyntheticFace::default()
    };
    let target = normalized_to_world(&moved.landmarks()[landmark_index::NOSE_BRIDGE], FRAME);

    let poses = run_faces(&mut tracker, &vec![moved; 80], true);
    let final_pose = poses.last().unwrap();

    let mut previous = f64::INFINITY;
    for pose in &poses {
        let distance = (pose.position - target).norm();
        assert!(distance <= previous + 1e-9);
        previous = distance;

        let scale_gap = (pose.scale - final_pose.scale).abs();
        assert!(scale_gap.is_finite());
        assert_unit(&pose.orientation);
    }
    assert!(previous < 1e-6);

    let scale_gaps: Vec<f64> = poses.iter().map(|p| (p.scale - final_pose.scale).abs()).collect();
    assert!(scale_gaps.windows(2).all(|w| w[1] <= w[0] + 1e-12));
}

#[test]
fn test_roll_correction_lowers_anchor() {
    let mut tracker = tracker_with(|_| {}).unwrap();
    let tilted = SyntheticFace {
        roll: 0.3,
        ..SyntheticFace::default()
    };
    let bridge = normalized_to_world(&tilted.landmarks()[landmark_index::NOSE_BRIDGE], FRAME);

    let poses = run_faces(&mut tracker, &vec![tilted.clone(); 120], true);
    let settled = poses.last().unwrap();
    let drop = bridge.y - settled.position.y;
    assert!((drop - 0.3_f64.sin() * 30.0).abs() < 1e-6, "drop {drop}");

    // disabling smooths back toward zero instead of snapping
    let mut settings = Settings::default();
    settings.roll_compensation.enabled = false;
    tracker.update_settings(settings).unwrap();

    let after = run_faces(&mut tracker, &vec![tilted; 120], true);
    let first_drop = bridge.y - after[0].position.y;
    assert!(first_drop > 0.0 && first_drop < drop);
    assert!((bridge.y - after.last().unwrap().position.y).abs() < 1e-6);
}

#[test]
fn test_pivot_placement_pins_attachment_point() {
    let mut tracker = tracker_with(|s| s.placement.mode = PlacementMode::Pivot).unwrap();
    let face = SyntheticFace {
        yaw: 0.5,
        pitch: 0.2,
        ..SyntheticFace::default()
    };
    let points = face.landmarks();
    let pivot = normalized_to_world(
        &midpoint(&points[landmark_index::RIGHT_EAR], &points[landmark_index::LEFT_EAR]),
        FRAME,
    );

    let poses = run_faces(&mut tracker, &vec![face; 100], true);
    let pose = poses.last().unwrap();
    let attachment = pose.position + pose.orientation * (Vector3::new(0.0, 0.0, -60.0) * pose.scale);
    assert!((attachment - pivot).norm() < 1e-6);
}

#[test]
fn test_transform_and_landmark_paths_agree_on_tilted_head() {
    let face = SyntheticFace {
        yaw: 0.35,
        pitch: -0.15,
        roll: 0.25,
        ..SyntheticFace::default()
    };
    let faces = vec![face.clone(); 60];

    let mut with_transform = tracker_with(|_| {}).unwrap();
    let mut landmarks_only = tracker_with(|_| {}).unwrap();
    let a = run_faces(&mut with_transform, &faces, true).pop().unwrap();
    let b = run_faces(&mut landmarks_only, &faces, false).pop().unwrap();

    let gap = a.orientation.angle_to(&b.orientation);
    assert!(gap < 1e-6, "paths settled {gap} rad apart");

    // the glasses' lateral axis tilts the same way as the eye line on screen
    let points = face.landmarks();
    let right = normalized_to_world(&points[landmark_index::RIGHT_IRIS_CENTER], FRAME);
    let left = normalized_to_world(&points[landmark_index::LEFT_IRIS_CENTER], FRAME);
    let eye_slope = (left.y - right.y) / (left.x - right.x);
    assert!(eye_slope < 0.0);
    for pose in [&a, &b] {
        let lateral = pose.orientation * Vector3::x();
        let slope = lateral.y / lateral.x;
        assert!(slope < 0.0, "eye line {eye_slope}, glasses {slope}");
    }
}

#[test]
fn test_mirrored_input_flips_horizontal_placement() {
    let face = SyntheticFace {
        center_x: 0.55,
        yaw: 0.4,
        ..SyntheticFace::default()
    };

    let mut plain = tracker_with(|s| s.scale.strategy = ScaleStrategy::Combined).unwrap();
    let mut mirrored = tracker_with(|s| {
        s.scale.strategy = ScaleStrategy::Combined;
        s.placement.mirror_input = true;
    })
    .unwrap();

    let a = plain.process_frame(FRAME, Some(&observation(&face, false)));
    let b = mirrored.process_frame(FRAME, Some(&observation(&face, false)));

    assert!((a.position.x + b.position.x).abs() < 1e-9);
    assert!((a.position.y - b.position.y).abs() < 1e-9);
    assert!((plain.compensation_factor() - mirrored.compensation_factor()).abs() < 1e-12);
    assert!((a.scale - b.scale).abs() < 1e-12);
}

#[test]
fn test_replay_session_end_to_end() {
    let frames = synthetic_session(45, FRAME, 0.9, true);
    let mut recording = Vec::new();
    write_recording(&mut recording, &frames).unwrap();

    let source = ReplaySource::from_reader(Cursor::new(recording));
    let mut app = AnchorApp::new(Config::default(), source, ReplayDetector, JsonLinesSink::new(Vec::new())).unwrap();
    let summary = app.run().unwrap();
    assert_eq!(summary.frames, 45);
    assert_eq!(summary.tracked, 45);

    let output = String::from_utf8(app.into_sink().into_inner()).unwrap();
    let records: Vec<PoseRecord> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 45);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.frame, i as u64 + 1);
        assert!(record.pose.visible);
        assert!(record.pose.scale >= 0.25 && record.pose.scale <= 4.0);
    }
}

#[test]
fn test_config_file_round_trip() {
    let mut config = Config::default();
    config.scale.strategy = ScaleStrategy::InterocularDistance;
    config.placement.dynamic_depth = true;
    config.manual.rotation_y = 0.3;

    let path = std::env::temp_dir().join(format!("head_anchor_config_{}.yaml", std::process::id()));
    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_strategies_agree_on_neutral_face() {
    // a face at reference size and no yaw scales to base_multiplier under every strategy
    let face = SyntheticFace {
        interocular: 0.13,
        ..SyntheticFace::default()
    };

    for strategy in [
        ScaleStrategy::InterocularDistance,
        ScaleStrategy::BoundingBox,
        ScaleStrategy::Combined,
    ] {
        let mut tracker = tracker_with(|s| {
            s.scale.strategy = strategy;
            s.scale.reference_face_size = face.face_height();
        })
        .unwrap();
        let pose = tracker.process_frame(FRAME, Some(&observation(&face, true)));
        assert!((pose.scale - 1.3).abs() < 1e-9, "{strategy:?} gave {}", pose.scale);
    }
}
