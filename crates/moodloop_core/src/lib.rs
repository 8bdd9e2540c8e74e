//! # Moodloop Core
//!
//! The affect models behind the biofeedback loop. Everything in here is
//! synchronous, deterministic and free of I/O:
//!
//! - [`gate`]: the erf-based sigmoid response curve
//! - [`params`]: validated, immutable coefficient bundles
//! - [`simulator`]: the delayed nonlinear affect-balance integrator
//! - [`schedule`]: time-windowed bundles selected by elapsed time
//! - [`oscillator`]: the simpler damped-oscillator alternative
//! - [`command`]: discrete live reconfiguration
//!
//! Driving the models in real time lives in `moodloop_limbic`.

pub mod command;
pub mod config;
pub mod delay;
pub mod drive;
pub mod error;
pub mod gate;
pub mod model;
pub mod oscillator;
pub mod params;
pub mod schedule;
pub mod simulator;
pub mod snapshot;
pub mod treatment;

pub use command::{CommandEffect, ControlCommand};
pub use config::{DriverConfig, MoodloopConfig};
pub use delay::{DelayLine, Reservoirs};
pub use error::{ParameterError, ScheduleError};
pub use model::{ModelKind, MoodModel};
pub use oscillator::{DampedOscillator, OscillatorParameters};
pub use params::{AffectParameters, InjectionMode, ParameterSpec};
pub use schedule::{ActiveWindow, ConfigurationSchedule, ScheduleEntry, SharedSchedule};
pub use simulator::{DelayedAffectSimulator, StepOutcome};
pub use snapshot::MoodSnapshot;
pub use treatment::{Axes, ImuFrame, TiltTreatment};
