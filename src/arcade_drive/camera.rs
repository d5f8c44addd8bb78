// ==============================================================================
// camera.rs - CHASE CAMERA (EXPONENTIALLY DAMPED FOLLOW)
// ------------------------------------------------------------------------------
// Two chained smoothings per tick, both 1 - e^(-dt * rate):
//   smoothed_focus -> (anchor.x, look_y, anchor.z)   at focus_damping
//   position       -> smoothed_focus + offset        at position_damping
// The first update snaps both so the camera never slides in from the origin.
// ==============================================================================

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::arcade_drive::math::{damp_vec, to_array};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: [f32; 3],
    pub look_y: f32,
    pub focus_damping: f32,
    pub position_damping: f32,
    pub zoom: f32, // orthographic zoom, passed through to the renderer
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: [15.5, 14.2, 15.5],
            look_y: 1.0,
            focus_damping: 6.0,
            position_damping: 9.0,
            zoom: 43.0,
        }
    }
}

impl CameraConfig {
    pub fn offset(&self) -> Vector3<f32> {
        Vector3::from(self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraView {
    pub position: [f32; 3],
    pub look_at: [f32; 3],
    pub zoom: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ChaseCamera {
    initialized: bool,
    smoothed_focus: Vector3<f32>,
    position: Vector3<f32>,
}

impl ChaseCamera {
    #[cfg(test)]
    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    /// `anchor` is the chassis visual anchor in world space.
    pub fn update(&mut self, config: &CameraConfig, anchor: Vector3<f32>, dt: f32) -> CameraView {
        let focus = Vector3::new(anchor.x, config.look_y, anchor.z);
        let offset = config.offset();

        if !self.initialized {
            self.smoothed_focus = focus;
            self.position = focus + offset;
            self.initialized = true;
        } else {
            self.smoothed_focus = damp_vec(self.smoothed_focus, focus, config.focus_damping, dt);
            self.position = damp_vec(self.position, self.smoothed_focus + offset, config.position_damping, dt);
        }

        CameraView {
            position: to_array(&self.position),
            look_at: to_array(&self.smoothed_focus),
            zoom: config.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn first_update_snaps_to_goal() {
        let config = CameraConfig::default();
        let mut camera = ChaseCamera::default();
        let anchor = Vector3::new(10.0, 0.55, -4.0);

        let view = camera.update(&config, anchor, DT);

        assert!(camera.initialized);
        assert_eq!(view.look_at, [10.0, 1.0, -4.0]);
        assert_eq!(view.position, [10.0 + 15.5, 1.0 + 14.2, -4.0 + 15.5]);
    }

    #[test]
    fn follows_without_overshoot() {
        let config = CameraConfig::default();
        let mut camera = ChaseCamera::default();
        camera.update(&config, Vector3::zeros(), DT);

        let anchor = Vector3::new(20.0, 0.55, -12.0);
        let goal = Vector3::new(20.0, 1.0, -12.0) + config.offset();

        let mut last_gap = (goal - camera.position()).abs();
        for _ in 0..600 {
            camera.update(&config, anchor, DT);
            let gap = goal - camera.position();
            // never crosses the goal on any axis
            assert!(gap.x >= 0.0 && gap.z <= 0.0, "overshoot: {gap:?}");
            let gap = gap.abs();
            assert!(gap.x <= last_gap.x + 1e-5 && gap.z <= last_gap.z + 1e-5);
            last_gap = gap;
        }
        assert!(last_gap.norm() < 1e-2);
    }

    #[test]
    fn zero_dt_holds_position() {
        let config = CameraConfig::default();
        let mut camera = ChaseCamera::default();
        camera.update(&config, Vector3::zeros(), DT);
        let before = camera.position();
        camera.update(&config, Vector3::new(50.0, 0.0, 50.0), 0.0);
        assert_eq!(camera.position(), before);
    }
}
