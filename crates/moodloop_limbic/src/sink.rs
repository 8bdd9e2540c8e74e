//! Snapshot sinks - where published mood goes
//!
//! The loop publishes a snapshot every tick; sinks only see the latest one
//! at their own (slower) publish interval.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moodloop_core::MoodSnapshot;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// One published sample, as written to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub mood: f64,
    pub velocity: f64,
    pub perturbation: f64,
}

impl TelemetryRecord {
    pub fn new(seq: u64, snapshot: &MoodSnapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            seq,
            mood: snapshot.mood,
            velocity: snapshot.velocity,
            perturbation: snapshot.perturbation,
        }
    }
}

#[async_trait]
pub trait SnapshotSink: Send {
    async fn publish(&mut self, record: &TelemetryRecord) -> Result<()>;

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Logs each sample at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl SnapshotSink for TracingSink {
    async fn publish(&mut self, record: &TelemetryRecord) -> Result<()> {
        tracing::info!(
            mood = record.mood,
            perturbation = record.perturbation,
            "mood {:+.3}",
            record.mood
        );
        Ok(())
    }
}

/// Appends one JSON object per line.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path.as_ref())
            .await
            .with_context(|| format!("Failed to create telemetry file: {}", path.as_ref().display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl SnapshotSink for JsonLinesSink {
    async fn publish(&mut self, record: &TelemetryRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// Feed the latest snapshot to every sink once per `interval` until the
/// snapshot channel closes, then flush.
pub fn spawn_publisher(
    mut snapshot_rx: watch::Receiver<MoodSnapshot>,
    mut sinks: Vec<Box<dyn SnapshotSink>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut seq = 0u64;

        loop {
            ticker.tick().await;
            let closed = snapshot_rx.has_changed().is_err();
            let record = TelemetryRecord::new(seq, &snapshot_rx.borrow_and_update());
            seq += 1;

            for sink in sinks.iter_mut() {
                if let Err(e) = sink.publish(&record).await {
                    tracing::warn!("Snapshot sink failed: {:#}", e);
                }
            }
            if closed {
                break;
            }
        }

        for sink in sinks.iter_mut() {
            if let Err(e) = sink.flush().await {
                tracing::warn!("Snapshot sink flush failed: {:#}", e);
            }
        }
        tracing::debug!("Publisher stopped after {} records", seq);
    })
}
