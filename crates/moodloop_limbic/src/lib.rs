//! # Moodloop Limbic
//!
//! Runs a mood model in real time. The models themselves live in
//! `moodloop_core`; this crate supplies the heartbeat around them.
//!
//! ## Architecture
//!
//! A single task owns the [`AffectDriver`] and, on every heartbeat:
//! 1. Selects the scheduled bundle for the elapsed time
//! 2. Applies whatever inputs arrived since the last tick
//! 3. Steps the model and publishes the snapshot
//!
//! Everything else talks to that task through channels: an `mpsc` queue
//! for inputs and a `watch` slot for the latest snapshot. Sinks sample the
//! slot at their own pace.

mod driver;
mod heartbeat;
mod sink;
mod system;

pub use driver::{AffectDriver, PerturbationSource};
pub use heartbeat::HeartbeatConfig;
pub use sink::{spawn_publisher, JsonLinesSink, SnapshotSink, TelemetryRecord, TracingSink};
pub use system::{AffectLoop, LoopInput};
