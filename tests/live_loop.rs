use std::path::PathBuf;

use stereo_live::camera::{CameraOptions, CameraSession, CaptureError, DeviceSpec};
use stereo_live::pipeline::{AcquisitionLoop, LoopOptions, StopReason};
use stereo_live::tracker::{EngineConfig, StubTracker, Tracker, TrackerRegistry};

fn engine_config() -> EngineConfig {
    EngineConfig {
        vocabulary: PathBuf::from("ORBvoc.txt"),
        settings: PathBuf::from("zed.yaml"),
        viewer: false,
    }
}

fn stub_camera(url: &str, width: u32) -> CameraSession {
    let device: DeviceSpec = url.parse().expect("stub device spec");
    let mut camera = CameraSession::open(&device, CameraOptions::default()).expect("open camera");
    camera.configure(width).expect("configure camera");
    camera
}

#[test]
fn end_of_stream_shuts_down_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let trajectory = dir.path().join("CameraTrajectory.txt");
    let mut camera = stub_camera("stub://zed?frames=5", 1280);
    let mut tracker = StubTracker::new(engine_config());
    let mut seen = Vec::new();

    let report = AcquisitionLoop::new(
        &mut camera,
        &mut tracker,
        LoopOptions {
            trajectory_path: trajectory.clone(),
            max_frames: None,
        },
    )
    .run(|frame| seen.push(frame.index));

    assert_eq!(report.frames, 5);
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert!(matches!(
        report.stop,
        StopReason::CaptureFailed(CaptureError::EmptyFrame)
    ));
    assert_eq!(report.latencies.len(), 5);
    assert_eq!(report.latency.map(|s| s.count), Some(5));
    assert_eq!(report.trajectory.as_ref().ok(), Some(&trajectory));
    assert!(report.shutdown_error.is_none());

    assert_eq!(tracker.frames_tracked(), 5);
    let text = std::fs::read_to_string(&trajectory).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text
        .lines()
        .all(|line| line == "1.000000000 0.000000000 0.000000000 0.000000000 0.000000000 1.000000000 0.000000000 0.000000000 0.000000000 0.000000000 1.000000000 0.000000000"));
    assert_eq!(camera.stats().frames_captured, 5);
}

#[test]
fn frame_limit_on_hd_profile() {
    let dir = tempfile::tempdir().unwrap();
    let trajectory = dir.path().join("limited.txt");
    let camera = stub_camera("stub://zed", 2560);
    let tracker = TrackerRegistry::with_builtin()
        .build(Some("stub"), &engine_config())
        .unwrap();
    assert_eq!(tracker.name(), "stub");

    let report = AcquisitionLoop::new(
        camera,
        tracker,
        LoopOptions {
            trajectory_path: trajectory.clone(),
            max_frames: Some(3),
        },
    )
    .run(|frame| assert!(frame.pose.is_some()));

    assert!(report.is_success());
    assert!(matches!(report.stop, StopReason::FrameLimit(3)));
    assert_eq!(std::fs::read_to_string(&trajectory).unwrap().lines().count(), 3);
}

#[test]
fn warmup_frames_export_only_tracked_poses() {
    let dir = tempfile::tempdir().unwrap();
    let trajectory = dir.path().join("warmup.txt");
    let camera = stub_camera("stub://zed?frames=4", 1280);
    let tracker = StubTracker::new(engine_config()).with_warmup(3);
    let mut missing = 0;

    let report = AcquisitionLoop::new(
        camera,
        tracker,
        LoopOptions {
            trajectory_path: trajectory.clone(),
            max_frames: None,
        },
    )
    .run(|frame| {
        if frame.pose.is_none() {
            missing += 1;
        }
    });

    assert_eq!(report.frames, 4);
    assert_eq!(missing, 3);
    assert_eq!(std::fs::read_to_string(&trajectory).unwrap().lines().count(), 1);
}
