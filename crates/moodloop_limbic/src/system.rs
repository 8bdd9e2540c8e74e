//! Affect Loop - the running heartbeat
//!
//! The AffectLoop owns the AffectDriver inside a single tokio task. It:
//! - Ticks the driver on a fixed interval
//! - Applies inputs (sensor frames, perturbations, commands) between ticks
//! - Publishes every new snapshot on a watch channel

use crate::driver::AffectDriver;
use crate::heartbeat::HeartbeatConfig;
use moodloop_core::{ControlCommand, ImuFrame, MoodSnapshot, SharedSchedule};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Input accepted by the running loop
#[derive(Debug, Clone, PartialEq)]
pub enum LoopInput {
    /// New sensor frame; becomes the perturbation source
    Imu(ImuFrame),
    /// Raw perturbation; becomes the perturbation source
    Perturbation(f64),
    Command(ControlCommand),
    Shutdown,
}

pub struct AffectLoop {
    input_tx: mpsc::Sender<LoopInput>,

    /// Receiver for snapshot updates (cloneable)
    snapshot_rx: watch::Receiver<MoodSnapshot>,

    schedule: SharedSchedule,

    /// Returns the driver once the loop stops
    handle: JoinHandle<AffectDriver>,
}

impl AffectLoop {
    /// Spawn the loop task. Must be called from within a tokio runtime.
    pub fn spawn(driver: AffectDriver, heartbeat: HeartbeatConfig) -> Self {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (snapshot_tx, snapshot_rx) = watch::channel(driver.model().snapshot());
        let schedule = driver.schedule().clone();

        tracing::info!(
            "Affect loop starting: {:?} model, tick {:?}, step dt {}s",
            driver.model().kind(),
            heartbeat.interval,
            driver.step_dt()
        );
        let handle = tokio::spawn(run(driver, heartbeat, input_rx, snapshot_tx));

        Self {
            input_tx,
            snapshot_rx,
            schedule,
            handle,
        }
    }

    /// Send an input to the loop
    pub async fn send(&self, input: LoopInput) -> anyhow::Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send loop input: {}", e))
    }

    pub async fn send_command(&self, cmd: ControlCommand) -> anyhow::Result<()> {
        self.send(LoopInput::Command(cmd)).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> MoodSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<MoodSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Schedule handle; appended windows take effect on the next tick.
    pub fn schedule(&self) -> &SharedSchedule {
        &self.schedule
    }

    /// Stop between ticks and hand back the driver.
    pub async fn shutdown(self) -> anyhow::Result<AffectDriver> {
        // The loop may already be gone; joining tells us either way.
        let _ = self.input_tx.send(LoopInput::Shutdown).await;
        let driver = self.handle.await?;
        Ok(driver)
    }
}

async fn run(
    mut driver: AffectDriver,
    heartbeat: HeartbeatConfig,
    mut input_rx: mpsc::Receiver<LoopInput>,
    snapshot_tx: watch::Sender<MoodSnapshot>,
) -> AffectDriver {
    let start = Instant::now();
    driver.sync_schedule(0.0);
    let mut interval = tokio::time::interval(heartbeat.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let elapsed = start.elapsed().as_secs_f64();
                let snapshot = driver.tick(elapsed);
                let _ = snapshot_tx.send(snapshot);
            }

            input = input_rx.recv() => match input {
                Some(LoopInput::Imu(frame)) => driver.set_imu(frame),
                Some(LoopInput::Perturbation(value)) => driver.set_perturbation(value),
                Some(LoopInput::Command(cmd)) => {
                    // Rejections are logged by the driver; the loop keeps going.
                    if driver.apply_command(cmd).is_ok() {
                        let _ = snapshot_tx.send(driver.model().snapshot());
                    }
                }
                Some(LoopInput::Shutdown) | None => break,
            },
        }
    }

    tracing::info!("Affect loop stopped after {} ticks", driver.tick_count());
    driver
}
