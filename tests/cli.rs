use std::path::Path;
use std::process::{Command, Output};

fn stereo_live(dir: &Path, args: &[&str]) -> Output {
    stereo_live_with_env(dir, args, &[])
}

fn stereo_live_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stereo_live"));
    cmd.current_dir(dir).args(args).env("RUST_LOG", "off");
    for key in [
        "STEREO_LIVE_CONFIG",
        "STEREO_LIVE_TRAJECTORY",
        "STEREO_LIVE_ENGINE",
        "STEREO_LIVE_MAX_FRAMES",
        "STEREO_LIVE_BUFFERS",
        "STEREO_LIVE_CAPTURE_TIMEOUT_MS",
    ] {
        cmd.env_remove(key);
    }
    cmd.envs(env.iter().copied());
    cmd.output().expect("run stereo_live")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn missing_arguments_print_usage_and_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live(dir.path(), &["ORBvoc.txt", "zed.yaml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Usage: ./stereo_live"));
}

#[test]
fn unsupported_width_exits_255() {
    let dir = tempfile::tempdir().unwrap();
    for width in ["1920", "wide"] {
        let output = stereo_live(
            dir.path(),
            &["ORBvoc.txt", "zed.yaml", "stub://zed", width, "0"],
        );
        assert_eq!(output.status.code(), Some(255));
        assert!(stdout(&output).contains("Not allowed resolution, set it to 1280 or 2560"));
    }
    assert!(!dir.path().join("CameraTrajectory.txt").exists());
}

#[test]
fn resolution_mismatch_exits_255() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live(
        dir.path(),
        &["ORBvoc.txt", "zed.yaml", "stub://zed?clamp=640", "1280", "0"],
    );
    assert_eq!(output.status.code(), Some(255));
    assert!(stdout(&output).contains("Couldn't set camera resolution 1280"));
    assert!(!dir.path().join("CameraTrajectory.txt").exists());
}

#[test]
fn end_of_stream_exports_default_trajectory_and_exits_255() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live(
        dir.path(),
        &["ORBvoc.txt", "zed.yaml", "stub://zed?frames=3", "1280", "1"],
    );
    assert_eq!(output.status.code(), Some(255));

    let out = stdout(&output);
    assert_eq!(out.matches("time step: ").count(), 3);
    assert!(out.contains("median tracking time: "));
    assert!(out.contains("mean tracking time: "));
    assert!(stderr(&output).contains("empty frame"));

    let trajectory = std::fs::read_to_string(dir.path().join("CameraTrajectory.txt")).unwrap();
    assert_eq!(trajectory.lines().count(), 3);
}

#[test]
fn frame_limit_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live(
        dir.path(),
        &[
            "ORBvoc.txt",
            "zed.yaml",
            "stub://zed",
            "2560",
            "0",
            "--max-frames",
            "2",
            "--trajectory",
            "limited.txt",
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    let trajectory = std::fs::read_to_string(dir.path().join("limited.txt")).unwrap();
    assert_eq!(trajectory.lines().count(), 2);
}

#[test]
fn unknown_engine_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live(
        dir.path(),
        &["ORBvoc.txt", "zed.yaml", "stub://zed", "1280", "0", "--engine", "orb-slam"],
    );
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("orb-slam"));
}

#[test]
fn flag_overrides_invalid_env_value() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live_with_env(
        dir.path(),
        &[
            "ORBvoc.txt",
            "zed.yaml",
            "stub://zed",
            "1280",
            "0",
            "--max-frames",
            "2",
        ],
        &[("STEREO_LIVE_MAX_FRAMES", "0")],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let trajectory = std::fs::read_to_string(dir.path().join("CameraTrajectory.txt")).unwrap();
    assert_eq!(trajectory.lines().count(), 2);
}

#[test]
fn invalid_env_value_without_override_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = stereo_live_with_env(
        dir.path(),
        &["ORBvoc.txt", "zed.yaml", "stub://zed", "1280", "0"],
        &[("STEREO_LIVE_MAX_FRAMES", "0")],
    );
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("max_frames must be greater than zero"));
}
