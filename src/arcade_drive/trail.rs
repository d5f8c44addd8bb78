// ==============================================================================
// trail.rs - SKID TRAIL (TIME-GATED, DISTANCE-GATED RING BUFFER)
// ------------------------------------------------------------------------------
// Every TRAIL_SAMPLE_INTERVAL seconds the ground point under the car is
// considered. It is kept only if it is farther than TRAIL_MIN_SPACING from the
// previous sample, so a parked car does not pile up coincident points.
// Capacity is fixed; the oldest point drops out first.
//
// Visual only. `advance()` reports when the polyline needs redrawing.
// ==============================================================================

use std::collections::VecDeque;

use nalgebra::Vector3;

pub const TRAIL_CAPACITY: usize = 72;
pub const TRAIL_SAMPLE_INTERVAL: f32 = 0.08; // s
pub const TRAIL_MIN_SPACING: f32 = 0.3;      // m
pub const TRAIL_HEIGHT: f32 = 0.08;          // m above ground

#[derive(Debug, Clone)]
pub struct SkidTrail {
    timer: f32,
    points: VecDeque<[f32; 3]>,
}

impl Default for SkidTrail {
    fn default() -> Self {
        Self {
            timer: 0.0,
            points: VecDeque::with_capacity(TRAIL_CAPACITY + 1),
        }
    }
}

impl SkidTrail {
    /// Returns true when a point was recorded this tick.
    pub fn advance(&mut self, dt: f32, position: Vector3<f32>) -> bool {
        self.timer += dt;
        if self.timer < TRAIL_SAMPLE_INTERVAL {
            return false;
        }
        self.timer = 0.0;

        let moved_enough = match self.points.back() {
            Some(last) => (last[0] - position.x).hypot(last[2] - position.z) > TRAIL_MIN_SPACING,
            None => true,
        };
        if !moved_enough {
            return false;
        }

        self.points.push_back([position.x, TRAIL_HEIGHT, position.z]);
        if self.points.len() > TRAIL_CAPACITY {
            self.points.pop_front();
        }
        true
    }

    pub fn to_vec(&self) -> Vec<[f32; 3]> {
        self.points.iter().copied().collect()
    }
}
