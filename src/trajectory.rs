//! Camera poses and KITTI trajectory files.
//!
//! A KITTI trajectory has one line per pose: the twelve entries of the 3x4
//! matrix `[R | t]` in row-major order, separated by single spaces.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::{Matrix3, Vector3};

/// Default trajectory output in the working directory.
pub const DEFAULT_TRAJECTORY_PATH: &str = "CameraTrajectory.txt";

/// Camera pose estimate: camera centre and orientation in the world frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub location: Vector3<f64>,
    pub rotation: Matrix3<f64>,
}

impl Pose {
    pub fn new(location: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        Self { location, rotation }
    }

    pub fn identity() -> Self {
        Self {
            location: Vector3::zeros(),
            rotation: Matrix3::identity(),
        }
    }

    /// Row-major `[R | t]`.
    pub fn kitti_row(&self) -> [f64; 12] {
        let r = &self.rotation;
        let t = &self.location;
        [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            t.x,
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            t.y,
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
            t.z,
        ]
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Write poses in KITTI format.
pub fn write_kitti<'a, W, I>(mut out: W, poses: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Pose>,
{
    for pose in poses {
        let row = pose.kitti_row();
        let line = row
            .iter()
            .map(|v| format!("{:.9}", v))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Create (or truncate) `path` and write the trajectory into it.
pub fn save_kitti<'a, I>(path: &Path, poses: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Pose>,
{
    let file = File::create(path)
        .with_context(|| format!("creating trajectory file {}", path.display()))?;
    write_kitti(BufWriter::new(file), poses)
        .with_context(|| format!("writing trajectory file {}", path.display()))
}
