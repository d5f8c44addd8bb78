use std::f32::consts::FRAC_PI_2;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::arcade_drive::camera::CameraConfig;
use crate::arcade_drive::dynamics::DynamicsConstants;
use crate::arcade_drive::feedback::FeedbackConfig;
use crate::arcade_drive::recovery::RecoveryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse `{}`: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("{0}")]
    Validation(String),
}

/// Upper bound on the tick rate; the tick period must stay representable.
pub const MAX_TICK_HZ: f32 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub tick_hz: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9001".to_string(),
            tick_hz: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub size: f32,    // m, side of the square ground
    pub gravity: f32, // m/s^2 along Y
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { size: 170.0, gravity: -9.81 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub spawn_position: [f32; 3],
    pub half_extents: [f32; 3], // [hx, hy, hz] meters
    pub mass: f32,              // kg
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub friction: f32,
    pub restitution: f32,
    pub visual_offset: [f32; 3], // body origin -> chassis visual centre (camera anchor)
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            spawn_position: [0.0, 1.0, 0.0],
            half_extents: [0.86, 0.38, 1.7],
            mass: 2.1,
            linear_damping: 0.32,
            angular_damping: 0.72,
            friction: 1.2,
            restitution: 0.08,
            visual_offset: [0.0, 0.55, 0.0],
        }
    }
}

impl ChassisConfig {
    pub fn spawn_position(&self) -> Vector3<f32> {
        Vector3::from(self.spawn_position)
    }

    pub fn visual_offset(&self) -> Vector3<f32> {
        Vector3::from(self.visual_offset)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub server: ServerConfig,
    pub world: WorldConfig,
    pub vehicle: DynamicsConstants,
    pub chassis: ChassisConfig,
    pub camera: CameraConfig,
    pub recovery: RecoveryConfig,
    pub feedback: FeedbackConfig,
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.vehicle.positive_fields() {
            if !positive(value) {
                return Err(invalid(format!("vehicle.{name} must be > 0 (got {value})")));
            }
        }
        if self.vehicle.steer_speed_falloff > 1.0 {
            return Err(invalid("vehicle.steer_speed_falloff must be <= 1".to_string()));
        }
        if self.vehicle.max_steer_angle >= FRAC_PI_2 {
            return Err(invalid("vehicle.max_steer_angle must be below pi/2".to_string()));
        }

        if !positive(self.camera.focus_damping) || !positive(self.camera.position_damping) {
            return Err(invalid("camera damping rates must be > 0".to_string()));
        }

        let r = &self.recovery;
        if !(r.fall_threshold < r.ground_epsilon && r.ground_epsilon < r.safe_ceiling) {
            return Err(invalid(
                "recovery thresholds must satisfy fall_threshold < ground_epsilon < safe_ceiling".to_string(),
            ));
        }

        if !positive(self.chassis.mass) || !self.chassis.half_extents.iter().all(|e| positive(*e)) {
            return Err(invalid("chassis mass and half_extents must be > 0".to_string()));
        }
        if !positive(self.server.tick_hz) || self.server.tick_hz > MAX_TICK_HZ {
            return Err(invalid(format!("server.tick_hz must be in (0, {MAX_TICK_HZ}]")));
        }
        if !positive(self.world.size) {
            return Err(invalid("world.size must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn log_summary(&self, source: &str) {
        info!(
            source,
            max_speed = self.vehicle.max_speed,
            max_steer_angle = self.vehicle.max_steer_angle,
            grip_front = self.vehicle.front_lateral_grip,
            grip_rear = self.vehicle.rear_lateral_grip,
            tick_hz = self.server.tick_hz,
            world_size = self.world.size,
            "session config loaded"
        );
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation(message)
}
