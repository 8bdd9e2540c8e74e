use crate::model::{ModelKind, MoodModel};
use crate::oscillator::{DampedOscillator, OscillatorParameters};
use crate::params::{AffectParameters, InjectionMode, ParameterSpec};
use crate::schedule::ConfigurationSchedule;
use crate::simulator::DelayedAffectSimulator;
use crate::treatment::TiltTreatment;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoodloopConfig {
    pub model: ModelConfig,
    /// Default affect bundle, active outside every schedule window.
    pub parameters: ParameterSpec,
    pub schedule: Vec<ScheduleWindowConfig>,
    pub oscillator: OscillatorParameters,
    pub treatment: TiltTreatment,
    pub driver: DriverConfig,
}

impl MoodloopConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    /// Like [`load`](Self::load), but a file that does not exist yields the
    /// defaults (with env overrides). A file that exists but cannot be read
    /// or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .with_context(|| format!("Invalid config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                Ok(cfg)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display())),
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let mut config: MoodloopConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MOODLOOP_TICK_MS") {
            if let Ok(n) = v.parse() {
                self.driver.tick_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("MOODLOOP_PUBLISH_MS") {
            if let Ok(n) = v.parse() {
                self.driver.publish_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("MOODLOOP_INJECTION_MODE") {
            match v.parse::<InjectionMode>() {
                Ok(mode) => self.parameters.injection_mode = mode,
                Err(e) => tracing::warn!("Ignoring MOODLOOP_INJECTION_MODE: {}", e),
            }
        }
        if let Ok(v) = std::env::var("MOODLOOP_LAMBDA") {
            if let Ok(n) = v.parse() {
                self.parameters.lambda = n;
            }
        }
        if let Ok(v) = std::env::var("MOODLOOP_GAIN") {
            if let Ok(n) = v.parse() {
                self.parameters.gain = n;
            }
        }
    }

    /// Validated default bundle.
    pub fn default_parameters(&self) -> Result<AffectParameters> {
        self.parameters
            .validate()
            .context("Invalid [parameters] section")
    }

    /// Build the schedule. Every window's bundle is validated up front so an
    /// invalid one can never become active mid-run.
    pub fn build_schedule(&self) -> Result<ConfigurationSchedule> {
        let mut schedule = ConfigurationSchedule::new(self.default_parameters()?);
        for (idx, window) in self.schedule.iter().enumerate() {
            let params = window
                .overrides
                .apply_to(self.parameters)
                .validate()
                .with_context(|| format!("Invalid parameters in schedule window #{}", idx))?;
            schedule
                .add_entry(params, window.start_secs, window.end_secs)
                .with_context(|| format!("Invalid schedule window #{}", idx))?;
        }
        Ok(schedule)
    }

    /// Instantiate the configured model with the default bundle.
    pub fn build_model(&self) -> Result<MoodModel> {
        let model = match self.model.kind {
            ModelKind::DelayedBalance => MoodModel::from(DelayedAffectSimulator::with_initial(
                self.default_parameters()?,
                self.model.initial_p,
                self.model.initial_n,
            )),
            ModelKind::Oscillator => MoodModel::from(DampedOscillator::new(self.oscillator)),
        };
        Ok(model)
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub kind: ModelKind,
    pub initial_p: f64,
    pub initial_n: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::DelayedBalance,
            initial_p: DelayedAffectSimulator::DEFAULT_INITIAL_LEVEL,
            initial_n: DelayedAffectSimulator::DEFAULT_INITIAL_LEVEL,
        }
    }
}

/// One `[[schedule]]` table: a window plus the fields that differ from
/// the default bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleWindowConfig {
    pub start_secs: f64,
    pub end_secs: f64,
    #[serde(flatten)]
    pub overrides: ParameterOverrides,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParameterOverrides {
    pub gain_p: Option<f64>,
    pub gain_n: Option<f64>,
    pub q_p_min: Option<f64>,
    pub q_p_max: Option<f64>,
    pub q_n_min: Option<f64>,
    pub q_n_max: Option<f64>,
    pub tau_min: Option<f64>,
    pub tau_max: Option<f64>,
    pub lambda: Option<f64>,
    pub gain: Option<f64>,
    pub dt: Option<f64>,
    pub delay_seconds: Option<f64>,
    pub injection_mode: Option<InjectionMode>,
}

impl ParameterOverrides {
    pub fn apply_to(&self, base: ParameterSpec) -> ParameterSpec {
        ParameterSpec {
            gain_p: self.gain_p.unwrap_or(base.gain_p),
            gain_n: self.gain_n.unwrap_or(base.gain_n),
            q_p_min: self.q_p_min.unwrap_or(base.q_p_min),
            q_p_max: self.q_p_max.unwrap_or(base.q_p_max),
            q_n_min: self.q_n_min.unwrap_or(base.q_n_min),
            q_n_max: self.q_n_max.unwrap_or(base.q_n_max),
            tau_min: self.tau_min.unwrap_or(base.tau_min),
            tau_max: self.tau_max.unwrap_or(base.tau_max),
            lambda: self.lambda.unwrap_or(base.lambda),
            gain: self.gain.unwrap_or(base.gain),
            dt: self.dt.unwrap_or(base.dt),
            delay_seconds: self.delay_seconds.unwrap_or(base.delay_seconds),
            injection_mode: self.injection_mode.unwrap_or(base.injection_mode),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Simulation tick period
    pub tick_interval_ms: f64,
    /// How often snapshots are handed to sinks
    pub publish_interval_ms: f64,
    /// Fixed integration step per tick; `None` integrates over the tick period.
    pub step_dt: Option<f64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10.0,
            publish_interval_ms: 1000.0,
            step_dt: None,
        }
    }
}

impl DriverConfig {
    pub fn tick_interval(&self) -> Duration {
        millis(self.tick_interval_ms, 10.0)
    }

    pub fn publish_interval(&self) -> Duration {
        millis(self.publish_interval_ms, 1000.0)
    }
}

fn millis(ms: f64, fallback: f64) -> Duration {
    let ms = if ms.is_finite() && ms > 0.0 {
        ms
    } else {
        tracing::warn!("Invalid interval {}ms, using {}ms", ms, fallback);
        fallback
    };
    Duration::from_nanos((ms * 1e6).round() as u64)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = MoodloopConfig::default();
        assert_eq!(cfg.model.kind, ModelKind::DelayedBalance);
        assert_eq!(cfg.parameters, ParameterSpec::default());
        assert!(cfg.schedule.is_empty());
        assert_eq!(cfg.driver.tick_interval(), Duration::from_millis(10));
        assert_eq!(cfg.driver.publish_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[parameters]
lambda = 0.5
gain = 0.07
dt = 0.0015
"#;
        let cfg: MoodloopConfig = toml::from_str(toml_str).unwrap();
        let params = cfg.default_parameters().unwrap();
        assert_eq!(params.lambda(), 0.5);
        assert_eq!(params.delay_steps(), 13);
        // Defaults for unspecified fields
        assert_eq!(params.q_n_max(), 7.0);
        assert_eq!(params.injection_mode(), InjectionMode::TiltToPn);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[model]
kind = "delayed_balance"
initial_p = 80.0
initial_n = 120.0

[parameters]
lambda = 0.5
gain = 0.07
dt = 0.0015
injection_mode = "add_to_eb"

[[schedule]]
start_secs = 0.0
end_secs = 30.0
lambda = 1.0

[[schedule]]
start_secs = 30.0
end_secs = 60.0
gain = 0.01
injection_mode = "add_to_g"

[treatment]
scale = 0.02

[driver]
tick_interval_ms = 1.5
publish_interval_ms = 250
step_dt = 0.0015
"#;
        let cfg: MoodloopConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.model.initial_n, 120.0);
        assert_eq!(cfg.treatment.scale, 0.02);
        assert_eq!(cfg.treatment.angle_ratio, 0.5);
        assert_eq!(cfg.driver.step_dt, Some(0.0015));
        assert_eq!(cfg.driver.tick_interval(), Duration::from_micros(1500));

        let schedule = cfg.build_schedule().unwrap();
        assert_eq!(schedule.len(), 2);
        let first = schedule.active_config(10.0);
        assert_eq!(first.lambda(), 1.0);
        assert_eq!(first.gain(), 0.07);
        assert_eq!(first.injection_mode(), InjectionMode::AddToEb);
        let second = schedule.active_config(45.0);
        assert_eq!(second.gain(), 0.01);
        assert_eq!(second.lambda(), 0.5);
        assert_eq!(second.injection_mode(), InjectionMode::AddToGain);
        assert_eq!(schedule.active_config(90.0).lambda(), 0.5);

        let model = cfg.build_model().unwrap();
        assert_eq!(model.kind(), ModelKind::DelayedBalance);
    }

    #[test]
    fn test_invalid_window_parameters_rejected() {
        let toml_str = r#"
[[schedule]]
start_secs = 0.0
end_secs = 10.0
dt = 0.0
"#;
        let cfg: MoodloopConfig = toml::from_str(toml_str).unwrap();
        let err = cfg.build_schedule().unwrap_err();
        assert!(format!("{:#}", err).contains("schedule window #0"));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let toml_str = r#"
[[schedule]]
start_secs = 10.0
end_secs = 5.0
"#;
        let cfg: MoodloopConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.build_schedule().is_err());
    }

    #[test]
    fn test_oscillator_model() {
        let toml_str = r#"
[model]
kind = "oscillator"

[oscillator]
alpha = 0.2
"#;
        let cfg: MoodloopConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.oscillator.omega_sq, 1.0);
        let model = cfg.build_model().unwrap();
        assert_eq!(model.kind(), ModelKind::Oscillator);
    }

    #[test]
    fn test_bad_interval_falls_back() {
        let driver = DriverConfig {
            tick_interval_ms: -3.0,
            ..Default::default()
        };
        assert_eq!(driver.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("MOODLOOP_TICK_MS", "2.5");
        std::env::set_var("MOODLOOP_INJECTION_MODE", "add_to_p");

        let mut cfg = MoodloopConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.driver.tick_interval_ms, 2.5);
        assert_eq!(cfg.parameters.injection_mode, InjectionMode::AddToP);

        // Clean up env vars before testing defaults
        std::env::remove_var("MOODLOOP_TICK_MS");
        std::env::remove_var("MOODLOOP_INJECTION_MODE");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = MoodloopConfig::load_or_default("/nonexistent/path.toml").unwrap();
        assert_eq!(cfg.driver.tick_interval_ms, 10.0);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moodloop.toml");
        std::fs::write(
            &path,
            r#"
[parameters]
lambda = 0.5
injection_mode = "sideways"

[[schedule]]
start_sec = 0.0
end_secs = 10.0
"#,
        )
        .unwrap();

        let err = MoodloopConfig::load_or_default(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse TOML config"));
        assert!(MoodloopConfig::load(&path).is_err());
    }

    #[test]
    fn test_misspelled_window_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moodloop.toml");
        std::fs::write(&path, "[[schedule]]\nstart_sec = 0.0\nend_secs = 10.0\n").unwrap();
        assert!(MoodloopConfig::load_or_default(&path).is_err());

        std::fs::write(&path, "[parameters]\nlambda = \"fast\"\n").unwrap();
        assert!(MoodloopConfig::load_or_default(&path).is_err());
    }

    #[test]
    fn test_existing_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moodloop.toml");
        std::fs::write(&path, "[[schedule]]\nstart_secs = 0.0\nend_secs = 10.0\nlambda = 0.5\n")
            .unwrap();
        let cfg = MoodloopConfig::load_or_default(&path).unwrap();
        assert_eq!(cfg.build_schedule().unwrap().active_config(1.0).lambda(), 0.5);
    }
}
