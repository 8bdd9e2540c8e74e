//! Affect Driver - the single-writer tick logic
//!
//! Every tick the driver:
//! 1. Looks up the bundle active at the elapsed time
//! 2. Swaps it into the model when the active window changed
//! 3. Resolves the current perturbation (raw value or tilt-mapped IMU frame)
//! 4. Steps the model and returns the new snapshot
//!
//! Commands and inputs are applied between ticks, so a step never observes a
//! half-applied change. A command edits the live bundle until the schedule
//! moves to another window or the schedule is replaced, which brings in the
//! active bundle wholesale.

use moodloop_core::{
    ActiveWindow, CommandEffect, ControlCommand, ImuFrame, MoodModel, MoodSnapshot,
    MoodloopConfig, ParameterError, SharedSchedule, TiltTreatment,
};

use crate::heartbeat::HeartbeatConfig;

/// Where the next perturbation comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerturbationSource {
    /// A scalar supplied as-is
    Direct(f64),
    /// The latest sensor frame, mapped through the treatment
    Imu(ImuFrame),
}

impl Default for PerturbationSource {
    fn default() -> Self {
        PerturbationSource::Direct(0.0)
    }
}

pub struct AffectDriver {
    model: MoodModel,
    schedule: SharedSchedule,
    treatment: TiltTreatment,
    source: PerturbationSource,
    /// Schedule generation and window applied on the previous tick; `None`
    /// before the first tick
    window: Option<(u64, ActiveWindow)>,
    step_dt: f64,
    ticks: u64,
}

impl AffectDriver {
    pub fn new(
        model: MoodModel,
        schedule: SharedSchedule,
        treatment: TiltTreatment,
        step_dt: f64,
    ) -> Self {
        Self {
            model,
            schedule,
            treatment,
            source: PerturbationSource::default(),
            window: None,
            step_dt,
            ticks: 0,
        }
    }

    /// Build model, schedule and treatment from a loaded config.
    pub fn from_config(cfg: &MoodloopConfig) -> anyhow::Result<Self> {
        let model = cfg.build_model()?;
        let schedule = cfg.build_schedule()?;
        let step_dt = HeartbeatConfig::from(&cfg.driver).step_dt();
        Ok(Self::new(model, schedule.into(), cfg.treatment, step_dt))
    }

    pub fn model(&self) -> &MoodModel {
        &self.model
    }

    /// Handle for appending windows while the driver runs.
    pub fn schedule(&self) -> &SharedSchedule {
        &self.schedule
    }

    pub fn treatment(&self) -> &TiltTreatment {
        &self.treatment
    }

    pub fn active_window(&self) -> Option<ActiveWindow> {
        self.window.map(|(_, window)| window)
    }

    pub fn step_dt(&self) -> f64 {
        self.step_dt
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn source(&self) -> PerturbationSource {
        self.source
    }

    pub fn set_perturbation(&mut self, value: f64) {
        self.source = PerturbationSource::Direct(value);
    }

    pub fn set_imu(&mut self, frame: ImuFrame) {
        self.source = PerturbationSource::Imu(frame);
    }

    /// Perturbation the next tick will apply.
    pub fn perturbation(&self) -> f64 {
        match &self.source {
            PerturbationSource::Direct(value) => *value,
            PerturbationSource::Imu(frame) => self.treatment.perturbation(frame),
        }
    }

    /// Advance the model by one step at `elapsed_secs` since start.
    pub fn tick(&mut self, elapsed_secs: f64) -> MoodSnapshot {
        self.sync_schedule(elapsed_secs);
        let perturbation = self.perturbation();
        let snapshot = self.model.step(perturbation, self.step_dt);
        self.ticks += 1;
        tracing::trace!(
            "tick {} t={:.3}s u={:.4} mood={:.4}",
            self.ticks,
            elapsed_secs,
            perturbation,
            snapshot.mood
        );
        snapshot
    }

    /// Bring in the bundle active at `elapsed_secs` if the window changed,
    /// or the schedule was replaced since it was applied.
    /// `tick` does this itself; calling it up front lets commands sent
    /// before the first tick edit the right bundle.
    pub fn sync_schedule(&mut self, elapsed_secs: f64) {
        let schedule = self.schedule.load();
        let (window, params) = schedule.lookup(elapsed_secs);
        let current = (schedule.generation(), window);
        if self.window == Some(current) {
            return;
        }

        let was_reset = self.model.apply_parameters(*params);
        match window {
            ActiveWindow::Entry(idx) => tracing::info!(
                "Schedule window #{} active at {:.2}s: {}",
                idx,
                elapsed_secs,
                params
            ),
            ActiveWindow::Default => {
                tracing::info!("Default bundle active at {:.2}s: {}", elapsed_secs, params)
            }
        }
        if was_reset {
            tracing::debug!("Delay length changed, model reset");
        }
        self.window = Some(current);
    }

    /// Apply a control command. Invalid results leave the model untouched.
    pub fn apply_command(&mut self, cmd: ControlCommand) -> Result<(), ParameterError> {
        let current = self.model.affect_parameters().copied().unwrap_or_default();
        let effect = match cmd.apply(&current, &self.treatment) {
            Ok(effect) => effect,
            Err(e) => {
                tracing::warn!("Rejected command '{}': {}", cmd.key(), e);
                return Err(e);
            }
        };

        match effect {
            CommandEffect::Parameters {
                params,
                force_reset,
            } => {
                if self.model.affect_parameters().is_none() {
                    tracing::debug!("Command '{}' ignored by {:?} model", cmd.key(), self.model.kind());
                    return Ok(());
                }
                let was_reset = self.model.apply_parameters(params);
                if force_reset && !was_reset {
                    self.model.reset();
                }
                tracing::info!("Command '{}': {}", cmd.key(), params);
            }
            CommandEffect::Reset => {
                self.model.reset();
                tracing::info!("Model reset");
            }
            CommandEffect::Treatment(treatment) => {
                self.treatment = treatment;
                tracing::info!("Treatment scale {:.4}", treatment.scale);
            }
        }
        Ok(())
    }
}
