// ==============================================================================
// feedback.rs - COSMETIC FEEDBACK (BRAKE LIGHTS + FAKE CONTACT SHADOW)
// ------------------------------------------------------------------------------
// Neither value feeds back into the simulation.
//
// Brake light: intensity eased toward on/off with the usual exponential damping.
//
// Contact shadow: an ellipse on the ground pushed away from the sun. It slides
// farther and stretches as the car lifts off the ground or speeds up, and fades
// with height (floor at SHADOW_MIN_OPACITY).
// ==============================================================================

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::arcade_drive::math::damp;

pub const SHADOW_HEIGHT: f32 = 0.032;
pub const SHADOW_BASE_OFFSET: f32 = 0.36;
pub const SHADOW_LENGTH: f32 = 2.05;
pub const SHADOW_WIDTH: f32 = 1.38;
pub const SHADOW_MAX_OPACITY: f32 = 0.34;
pub const SHADOW_MIN_OPACITY: f32 = 0.08;

/// Chassis rest height; lift is measured from here.
const REST_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub brake_light_rate: f32,
    pub brake_light_on: f32,
    pub brake_light_off: f32,
    pub sun_position: [f32; 3],
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            brake_light_rate: 16.0,
            brake_light_on: 0.95,
            brake_light_off: 0.46,
            sun_position: [62.0, 18.0, -44.0],
        }
    }
}

impl FeedbackConfig {
    /// Ground-plane direction light travels in (unit, or zero for an overhead sun).
    pub fn sun_direction(&self) -> [f32; 2] {
        let x = -self.sun_position[0];
        let z = -self.sun_position[2];
        let len = x.hypot(z);
        if len > 1e-6 { [x / len, z / len] } else { [0.0, 0.0] }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrakeLight {
    intensity: f32,
}

impl BrakeLight {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self { intensity: config.brake_light_off }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn update(&mut self, config: &FeedbackConfig, braking: bool, dt: f32) -> f32 {
        let target = if braking { config.brake_light_on } else { config.brake_light_off };
        self.intensity = damp(self.intensity, target, config.brake_light_rate, dt);
        self.intensity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactShadow {
    pub position: [f32; 3],
    pub rotation: f32,   // radians about +Y in the ground plane
    pub scale: [f32; 2], // ground-plane footprint (along sun, across sun)
    pub opacity: f32,
}

pub fn project_shadow(
    translation: Vector3<f32>,
    forward_speed: f32,
    max_speed: f32,
    sun: [f32; 2],
) -> ContactShadow {
    let [sx, sz] = sun;
    let lift = (translation.y - REST_HEIGHT).max(0.0);

    let offset = SHADOW_BASE_OFFSET + lift * 0.82;
    let speed_stretch = (forward_speed.abs() / max_speed * 0.42).min(0.42);
    let lift_stretch = (lift * 0.24).min(0.5);
    let scale = 1.0 + speed_stretch + lift_stretch;

    ContactShadow {
        position: [translation.x + sx * offset, SHADOW_HEIGHT, translation.z + sz * offset],
        rotation: sz.atan2(sx),
        scale: [
            SHADOW_LENGTH * scale * (1.0 + sx.abs() * 0.16),
            SHADOW_WIDTH * scale * (1.0 + sz.abs() * 0.16),
        ],
        opacity: (SHADOW_MAX_OPACITY * (1.0 - (lift * 0.52).min(0.85))).max(SHADOW_MIN_OPACITY),
    }
}
