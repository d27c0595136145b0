//! Acquisition-dispatch loop.
//!
//! The loop is a lock-step state machine `Init -> Running -> Shutdown`:
//! one combined frame is captured, split, timestamped and handed to the
//! tracker before the next capture begins.
//!
//! The loop is responsible for:
//! - Taking the loop-start instant once, before the first capture
//! - Timestamping each frame at capture start, relative to that instant
//! - Timing every `track` call and keeping the latency record
//! - Shutting the tracker down and exporting the trajectory on EVERY exit
//!   path (capture failure, clock error, tracker failure, cancellation,
//!   frame limit)
//!
//! The loop MUST NOT:
//! - Retry a failed capture or buffer frames ahead of the tracker
//! - Call the tracker on a zero-row frame
//! - Call `shutdown` or `export_trajectory` more than once

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::camera::{CaptureError, FrameSource};
use crate::clock::{Clock, ClockError, MonotonicClock, Timestamper};
use crate::stats::{LatencyLog, LatencySummary};
use crate::tracker::{StereoSample, Tracker};
use crate::trajectory::{Pose, DEFAULT_TRAJECTORY_PATH};

// ----------------------------------------------------------------------------
// Options and reports
// ----------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct LoopOptions {
    /// Where the tracker exports its trajectory at shutdown.
    pub trajectory_path: PathBuf,
    /// Stop after this many tracked frames.
    pub max_frames: Option<u64>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            trajectory_path: PathBuf::from(DEFAULT_TRAJECTORY_PATH),
            max_frames: None,
        }
    }
}

/// Why the loop left the running state.
#[derive(Debug)]
pub enum StopReason {
    CaptureFailed(CaptureError),
    ClockFailed(ClockError),
    TrackerFailed(anyhow::Error),
    /// The stop flag was raised.
    Cancelled,
    /// `max_frames` frames were tracked.
    FrameLimit(u64),
}

impl StopReason {
    /// Fatal stops make the process exit nonzero.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::CaptureFailed(_) | StopReason::ClockFailed(_) | StopReason::TrackerFailed(_)
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::CaptureFailed(err) => write!(f, "capture failed: {}", err),
            StopReason::ClockFailed(err) => write!(f, "clock error: {}", err),
            StopReason::TrackerFailed(err) => write!(f, "tracker failed: {:#}", err),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::FrameLimit(limit) => write!(f, "frame limit of {} reached", limit),
        }
    }
}

/// Outcome of one tracked frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Zero-based frame counter.
    pub index: u64,
    /// Seconds since loop start, taken at capture start.
    pub timestamp: f64,
    /// Wall time spent inside `Tracker::track`.
    pub latency: Duration,
    /// Latest pose, `None` while the tracker is not tracking.
    pub pose: Option<Pose>,
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunReport {
    /// Frames handed to the tracker successfully.
    pub frames: u64,
    pub stop: StopReason,
    pub latencies: LatencyLog,
    /// `None` when no frame was tracked.
    pub latency: Option<LatencySummary>,
    pub shutdown_error: Option<anyhow::Error>,
    /// Path written by the trajectory export, or why it failed.
    pub trajectory: anyhow::Result<PathBuf>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        !self.stop.is_failure() && self.shutdown_error.is_none() && self.trajectory.is_ok()
    }
}

// ----------------------------------------------------------------------------
// Loop
// ----------------------------------------------------------------------------

enum LoopState {
    Init,
    Running(Timestamper),
    Shutdown(StopReason),
}

/// Drives a frame source into a tracker until something stops it.
pub struct AcquisitionLoop<S, T, C = MonotonicClock> {
    source: S,
    tracker: T,
    clock: C,
    options: LoopOptions,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource, T: Tracker> AcquisitionLoop<S, T> {
    pub fn new(source: S, tracker: T, options: LoopOptions) -> Self {
        Self::with_clock(source, tracker, MonotonicClock, options)
    }
}

impl<S: FrameSource, T: Tracker, C: Clock> AcquisitionLoop<S, T, C> {
    pub fn with_clock(source: S, tracker: T, clock: C, options: LoopOptions) -> Self {
        Self {
            source,
            tracker,
            clock,
            options,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel through an existing flag, e.g. one a signal handler already
    /// holds.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Flag that cancels the run when set. Checked before every capture and
    /// again when a capture fails.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run to completion. `on_frame` sees every tracked frame.
    ///
    /// Consumes the loop so shutdown and export can only happen once.
    pub fn run<F>(mut self, mut on_frame: F) -> RunReport
    where
        F: FnMut(&FrameReport),
    {
        let mut latencies = LatencyLog::new();
        let mut frames = 0u64;
        let mut state = LoopState::Init;

        let stop = loop {
            state = match state {
                LoopState::Init => {
                    let t0 = self.clock.now();
                    log::info!("acquisition started (tracker '{}')", self.tracker.name());
                    LoopState::Running(Timestamper::start(t0))
                }
                LoopState::Running(mut stamper) => match self.step(&mut stamper, frames) {
                    Ok(report) => {
                        frames += 1;
                        latencies.push(report.latency);
                        on_frame(&report);
                        LoopState::Running(stamper)
                    }
                    Err(reason) => LoopState::Shutdown(reason),
                },
                LoopState::Shutdown(reason) => break reason,
            };
        };

        self.finish(stop, frames, latencies)
    }

    fn step(&mut self, stamper: &mut Timestamper, index: u64) -> Result<FrameReport, StopReason> {
        if self.stop.load(Ordering::SeqCst) {
            return Err(StopReason::Cancelled);
        }
        if let Some(limit) = self.options.max_frames {
            if index >= limit {
                return Err(StopReason::FrameLimit(limit));
            }
        }

        let capture_start = self.clock.now();
        let frame = match self.source.capture() {
            Ok(frame) => frame,
            // a signal that interrupts a blocked capture is a cancel, not a device fault
            Err(_) if self.stop.load(Ordering::SeqCst) => return Err(StopReason::Cancelled),
            Err(err) => return Err(StopReason::CaptureFailed(err)),
        };
        if frame.rows() == 0 {
            return Err(StopReason::CaptureFailed(CaptureError::EmptyFrame));
        }
        let pair = frame
            .split()
            .map_err(|err| StopReason::CaptureFailed(err.into()))?;
        let timestamp = stamper.stamp(capture_start).map_err(StopReason::ClockFailed)?;

        let sample = StereoSample {
            left: pair.left,
            right: pair.right,
            timestamp,
        };
        let track_start = self.clock.now();
        let tracked = self.tracker.track(sample);
        let latency = self.clock.now().saturating_duration_since(track_start);
        let pose = tracked.map_err(StopReason::TrackerFailed)?;

        match &pose {
            Some(pose) => log::debug!(
                "frame {} t={:.6}s tracked in {:?} at [{:.3}, {:.3}, {:.3}]",
                index,
                timestamp,
                latency,
                pose.location.x,
                pose.location.y,
                pose.location.z
            ),
            None => log::debug!(
                "frame {} t={:.6}s tracked in {:?}, no pose",
                index,
                timestamp,
                latency
            ),
        }

        Ok(FrameReport {
            index,
            timestamp,
            latency,
            pose,
        })
    }

    fn finish(mut self, stop: StopReason, frames: u64, latencies: LatencyLog) -> RunReport {
        if stop.is_failure() {
            log::error!("acquisition stopped after {} frames: {}", frames, stop);
        } else {
            log::info!("acquisition stopped after {} frames: {}", frames, stop);
        }

        let shutdown_error = match self.tracker.shutdown() {
            Ok(()) => None,
            Err(err) => {
                log::error!("tracker shutdown failed: {:#}", err);
                Some(err)
            }
        };

        let latency = latencies.summary();
        if latency.is_none() {
            log::warn!("no frames tracked, latency summary unavailable");
        }

        let path = self.options.trajectory_path.clone();
        let trajectory = match self.tracker.export_trajectory(&path) {
            Ok(()) => {
                log::info!("trajectory saved to {}", path.display());
                Ok(path)
            }
            Err(err) => {
                log::error!("trajectory export to {} failed: {:#}", path.display(), err);
                Err(err)
            }
        };

        RunReport {
            frames,
            stop,
            latencies,
            latency,
            shutdown_error,
            trajectory,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
