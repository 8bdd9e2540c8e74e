//! Configuration Schedule - parameter bundles selected by elapsed time
//!
//! Entries are scanned in insertion order and the first half-open window
//! `[start, end)` containing the query time wins. Overlaps are not rejected:
//! an earlier entry simply shadows a later one. Nothing matching means the
//! default bundle.

use crate::error::ScheduleError;
use crate::params::AffectParameters;
use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// A bundle active during `[start_secs, end_secs)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    start_secs: f64,
    end_secs: f64,
    params: AffectParameters,
}

impl ScheduleEntry {
    pub fn new(params: AffectParameters, start_secs: f64, end_secs: f64) -> Result<Self, ScheduleError> {
        if !start_secs.is_finite() || !end_secs.is_finite() {
            return Err(ScheduleError::NonFiniteWindow {
                start: start_secs,
                end: end_secs,
            });
        }
        if start_secs >= end_secs {
            return Err(ScheduleError::EmptyWindow {
                start: start_secs,
                end: end_secs,
            });
        }
        Ok(Self {
            start_secs,
            end_secs,
            params,
        })
    }

    pub fn start_secs(&self) -> f64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.end_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    pub fn params(&self) -> &AffectParameters {
        &self.params
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start_secs <= t && t < self.end_secs
    }
}

impl fmt::Display for ScheduleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start {}s end {}s duration {}s",
            self.start_secs,
            self.end_secs,
            self.duration_secs()
        )
    }
}

/// Which bundle a lookup landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveWindow {
    Default,
    /// Index into [`ConfigurationSchedule::entries`]
    Entry(usize),
}

#[derive(Debug, Clone, Default)]
pub struct ConfigurationSchedule {
    default: AffectParameters,
    entries: Vec<ScheduleEntry>,
    /// Bumped by [`SharedSchedule::replace`]; an [`ActiveWindow`] only
    /// identifies a bundle within one generation.
    generation: u64,
}

impl ConfigurationSchedule {
    pub fn new(default: AffectParameters) -> Self {
        Self {
            default,
            entries: Vec::new(),
            generation: 0,
        }
    }

    pub fn default_params(&self) -> &AffectParameters {
        &self.default
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a window. No ordering or overlap checks.
    pub fn add_entry(
        &mut self,
        params: AffectParameters,
        start_secs: f64,
        end_secs: f64,
    ) -> Result<(), ScheduleError> {
        self.entries.push(ScheduleEntry::new(params, start_secs, end_secs)?);
        Ok(())
    }

    pub fn push(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
    }

    /// Bundle active at `elapsed_secs`.
    pub fn active_config(&self, elapsed_secs: f64) -> &AffectParameters {
        self.lookup(elapsed_secs).1
    }

    /// Active bundle together with where it came from.
    pub fn lookup(&self, elapsed_secs: f64) -> (ActiveWindow, &AffectParameters) {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.contains(elapsed_secs))
            .map(|(idx, entry)| (ActiveWindow::Entry(idx), &entry.params))
            .unwrap_or((ActiveWindow::Default, &self.default))
    }

    /// One line per window, for startup logging.
    pub fn summary(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

/// A schedule that can be appended to while a driver keeps querying it.
///
/// Readers get a lock-free snapshot; appends copy the schedule and swap the
/// pointer, so a query never sees a half-written entry list.
#[derive(Debug, Clone)]
pub struct SharedSchedule {
    inner: Arc<ArcSwap<ConfigurationSchedule>>,
}

impl SharedSchedule {
    pub fn new(schedule: ConfigurationSchedule) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(schedule)),
        }
    }

    /// Current schedule snapshot.
    pub fn load(&self) -> Arc<ConfigurationSchedule> {
        self.inner.load_full()
    }

    pub fn add_entry(
        &self,
        params: AffectParameters,
        start_secs: f64,
        end_secs: f64,
    ) -> Result<(), ScheduleError> {
        let entry = ScheduleEntry::new(params, start_secs, end_secs)?;
        self.inner.rcu(|current| {
            let mut next = ConfigurationSchedule::clone(current);
            next.push(entry.clone());
            next
        });
        tracing::debug!("Appended schedule window {}", entry);
        Ok(())
    }

    /// Replace the whole schedule. The replacement gets a new generation, so
    /// a driver re-applies its bundle even when the window index is unchanged.
    pub fn replace(&self, schedule: ConfigurationSchedule) {
        let previous = self.inner.rcu(|current| {
            let mut next = schedule.clone();
            next.generation = current.generation + 1;
            next
        });
        tracing::debug!(
            "Replaced schedule ({} window(s), generation {})",
            schedule.len(),
            previous.generation + 1
        );
    }
}

impl From<ConfigurationSchedule> for SharedSchedule {
    fn from(schedule: ConfigurationSchedule) -> Self {
        Self::new(schedule)
    }
}
