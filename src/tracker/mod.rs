//! Tracking engine boundary.
//!
//! The SLAM engine itself lives outside this crate. It is reached only
//! through the `Tracker` trait; concrete engines are registered by name in a
//! `TrackerRegistry` and built from an `EngineConfig`.

mod backend;
mod backends;
mod registry;

pub use backend::{EngineConfig, StereoSample, Tracker};
pub use backends::StubTracker;
pub use registry::{TrackerFactory, TrackerRegistry};
