//! Treatment mapping: sensor frame → scalar perturbation.

use serde::{Deserialize, Serialize};

/// Smallest step for interactive treatment-scale changes.
pub const SCALE_STEP: f64 = 0.0005;

/// Three-axis reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Latest IMU state as delivered by the sensor bridge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuFrame {
    pub angle: Axes,
    pub gyro: Axes,
    pub accel: Axes,
    pub accel_angle: Axes,
    pub temperature: f64,
}

/// Maps body tilt to a perturbation:
/// `scale · (angle.x · angle_ratio + accel_angle.x · angle_velocity_ratio)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltTreatment {
    pub scale: f64,
    pub angle_ratio: f64,
    pub angle_velocity_ratio: f64,
}

impl Default for TiltTreatment {
    fn default() -> Self {
        Self {
            scale: 0.01,
            angle_ratio: 0.5,
            angle_velocity_ratio: 0.0,
        }
    }
}

impl TiltTreatment {
    pub fn perturbation(&self, frame: &ImuFrame) -> f64 {
        self.scale
            * (frame.angle.x * self.angle_ratio + frame.accel_angle.x * self.angle_velocity_ratio)
    }

    pub fn with_scale(self, scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
            ..self
        }
    }
}
