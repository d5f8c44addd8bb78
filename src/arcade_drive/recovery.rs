// ==============================================================================
// recovery.rs - OUT-OF-BOUNDS RECOVERY (ONE-TICK HARD RESET)
// ------------------------------------------------------------------------------
// Tracking:   while the car rests on the ground (ground_epsilon < y < safe_ceiling,
//             barely moving vertically, centre over the ground slab), remember
//             (x, safe_height, z)
// Recovering: y < fall_threshold (or a non-finite pose) -> teleport to the
//             remembered spot, zero linear + angular velocity, back to Tracking.
//             A non-finite orientation is also reset to identity.
//
// The reset is itself the retry: nothing is reported upward except the phase,
// which tells the caller to zero steering and skip the rest of the tick.
// ==============================================================================

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arcade_drive::body::ChassisBody;

/// Vertical speed (m/s) above which the car counts as airborne.
pub const GROUNDED_MAX_VERTICAL_SPEED: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    pub ground_epsilon: f32, // m, lower bound of the safe band
    pub safe_ceiling: f32,   // m, upper bound of the safe band (big jumps excluded)
    pub fall_threshold: f32, // m, below this the car has left the world
    pub safe_height: f32,    // m, respawn height
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            ground_epsilon: 0.15,
            safe_ceiling: 2.5,
            fall_threshold: -1.2,
            safe_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryPhase {
    Tracking,
    Recovering,
}

#[derive(Debug, Clone)]
pub struct RecoveryMonitor {
    config: RecoveryConfig,
    ground_half_extent: f32, // m, the slab spans [-e, e] on x and z
    last_safe_position: Vector3<f32>,
    recoveries: u32,
}

impl RecoveryMonitor {
    pub fn new(config: RecoveryConfig, spawn: Vector3<f32>, ground_half_extent: f32) -> Self {
        Self {
            last_safe_position: Vector3::new(spawn.x, config.safe_height, spawn.z),
            config,
            ground_half_extent,
            recoveries: 0,
        }
    }

    #[cfg(test)]
    pub fn last_safe_position(&self) -> Vector3<f32> {
        self.last_safe_position
    }

    pub fn observe<B: ChassisBody>(&mut self, body: &mut B) -> RecoveryPhase {
        let t = body.translation();
        let rotation = body.rotation();
        let rotation_finite = rotation.coords.iter().all(|c| c.is_finite());
        let finite = rotation_finite && t.iter().all(|c| c.is_finite());

        if finite && self.is_grounded(t, body.linvel()) {
            self.last_safe_position = Vector3::new(t.x, self.config.safe_height, t.z);
        }

        if finite && t.y >= self.config.fall_threshold {
            return RecoveryPhase::Tracking;
        }

        body.set_translation(self.last_safe_position);
        body.set_linvel(Vector3::zeros());
        body.set_angvel(Vector3::zeros());
        if !rotation_finite {
            body.set_rotation(UnitQuaternion::identity());
        }
        self.recoveries += 1;

        warn!(
            from = ?[t.x, t.y, t.z],
            to = ?[self.last_safe_position.x, self.last_safe_position.y, self.last_safe_position.z],
            count = self.recoveries,
            "vehicle left the playable volume, reset to last safe position"
        );

        RecoveryPhase::Recovering
    }

    /// Resting on the slab: inside the height band, not rising or falling,
    /// and with the centre over the ground (past the edge the box can still
    /// be sliding off while above ground_epsilon).
    fn is_grounded(&self, t: Vector3<f32>, linvel: Vector3<f32>) -> bool {
        t.y > self.config.ground_epsilon
            && t.y < self.config.safe_ceiling
            && linvel.y.abs() < GROUNDED_MAX_VERTICAL_SPEED
            && t.x.abs() <= self.ground_half_extent
            && t.z.abs() <= self.ground_half_extent
    }
}
