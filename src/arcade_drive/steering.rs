// ==============================================================================
// steering.rs - STEERING ANGLE SMOOTHING + ACKERMANN WHEEL VISUALS
// ==============================================================================
// Responsibilities:
// - Speed-sensitive steering limit (authority shrinks toward top speed)
// - Asymmetric exponential smoothing of the centreline steering angle:
//   steer_in_rate while a key is held, steer_out_rate while self-centring
// - Ackermann split of the centreline angle into left/right wheel angles
//   (visual only, the force model steers the bicycle-model centreline)
//
// Sign convention: positive angle steers left (yaw about +Y). In a left turn
// the left wheel is the inner wheel and turns more sharply.
// ==============================================================================

use serde::Serialize;

use crate::arcade_drive::math::exp_alpha;

/// Below this the Ackermann trig is skipped (tan/atan singular at 0).
pub const ACKERMANN_EPSILON: f32 = 1e-4;

/// |steer input| above this counts as actively steering.
pub const STEER_INPUT_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelAngles {
    pub left: f32,  // radians about +Y
    pub right: f32, // radians about +Y
}

/// Steering authority at the current forward speed.
///
/// `max_steer_angle * (1 - min(1, |speed| / max_speed) * falloff)`
pub fn steer_limit(max_steer_angle: f32, forward_speed: f32, max_speed: f32, falloff: f32) -> f32 {
    let speed_ratio = (forward_speed.abs() / max_speed).min(1.0);
    max_steer_angle * (1.0 - speed_ratio * falloff)
}

/// One tick of steering smoothing toward `steer_input * limit`.
pub fn smooth_steering(
    current: f32,
    steer_input: f32,
    limit: f32,
    steer_in_rate: f32,
    steer_out_rate: f32,
    dt: f32,
) -> f32 {
    let target = steer_input * limit;
    let rate = if steer_input.abs() > STEER_INPUT_EPSILON {
        steer_in_rate
    } else {
        steer_out_rate
    };
    current + (target - current) * exp_alpha(rate, dt)
}

/// Splits the centreline angle into (left, right) wheel angles.
pub fn ackermann_angles(steer_angle: f32, wheelbase: f32, track: f32) -> WheelAngles {
    if steer_angle.abs() < ACKERMANN_EPSILON {
        return WheelAngles::default();
    }

    let sign = steer_angle.signum();
    let a = steer_angle.abs();

    // turning radius of the centreline bicycle model
    let r = wheelbase / a.tan();

    let inner = (wheelbase / (r - track * 0.5).max(0.01)).atan();
    let outer = (wheelbase / (r + track * 0.5)).atan();

    if sign > 0.0 {
        WheelAngles { left: inner, right: outer }
    } else {
        WheelAngles { left: -outer, right: -inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHEELBASE: f32 = 2.16;
    const TRACK: f32 = 1.72;

    #[test]
    fn zero_angle_gives_straight_wheels() {
        assert_eq!(ackermann_angles(0.0, WHEELBASE, TRACK), WheelAngles { left: 0.0, right: 0.0 });
        assert_eq!(ackermann_angles(5e-5, WHEELBASE, TRACK), WheelAngles::default());
    }

    #[test]
    fn left_turn_makes_left_wheel_inner() {
        let w = ackermann_angles(0.4, WHEELBASE, TRACK);
        assert!(w.left > 0.0 && w.right > 0.0);
        assert!(w.left > w.right, "inner wheel turns more: {w:?}");
        // centreline angle lies between the two
        assert!(w.right < 0.4 && 0.4 < w.left);
    }

    #[test]
    fn right_turn_mirrors_left_turn() {
        let l = ackermann_angles(0.4, WHEELBASE, TRACK);
        let r = ackermann_angles(-0.4, WHEELBASE, TRACK);
        assert!(r.left < 0.0 && r.right < 0.0);
        assert!(r.right.abs() > r.left.abs());
        assert!((l.left + r.right).abs() < 1e-6);
        assert!((l.right + r.left).abs() < 1e-6);
    }

    #[test]
    fn authority_shrinks_with_speed() {
        let max = 0.75;
        assert_eq!(steer_limit(max, 0.0, 22.0, 0.3), max);
        let fast = steer_limit(max, 22.0, 22.0, 0.3);
        assert!((fast - max * 0.7).abs() < 1e-6);
        // beyond top speed the ratio saturates
        assert_eq!(steer_limit(max, -40.0, 22.0, 0.3), fast);
    }

    #[test]
    fn smoothing_rate_follows_input_state() {
        // same rate in and out: symmetric
        let a = smooth_steering(0.0, 1.0, 0.7, 10.0, 10.0, 0.016);
        let b = smooth_steering(0.7, 0.0, 0.7, 10.0, 10.0, 0.016);
        assert!((a - (0.7 - b)).abs() < 1e-6);

        // released input uses the out rate only
        let slow = smooth_steering(0.7, 0.0, 0.7, 50.0, 1.0, 0.016);
        assert!(slow > 0.68);
    }
}
