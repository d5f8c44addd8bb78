// ==============================================================================
// dynamics.rs - ARCADE DRIVE STEP (IMPULSE-BASED, BICYCLE MODEL)
// ==============================================================================
// One call per tick. Reads the chassis pose, applies impulses, then rewrites
// angular velocity and clamps speed. Order matters: every impulse lands on the
// body velocity immediately, so the grip pass sees the drive + rolling result.
//
//  1) planar basis (forward/right) from chassis rotation
//  2) forward speed
//  3) throttle / steer from key state
//  4) speed-sensitive steer limit
//  5) asymmetric exponential steering smoothing
//  6) front wheel basis (forward rotated by steering angle)
//  7) front/rear contact points (± half wheelbase)
//  8) drive impulse (front, clamped)
//  9) rolling resistance (rear)
// 10) lateral grip at front and rear contact points
// 11) yaw-rate target from kinematic bicycle model, planar angvel write-back
// 12) horizontal top-speed clamp (vertical velocity untouched)
// 13) Ackermann wheel visuals
// ==============================================================================

use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::arcade_drive::body::ChassisBody;
use crate::arcade_drive::input::InputState;
use crate::arcade_drive::math::{clamp_dt, damp, horizontal_len, planar_basis, planar_right, yaw_rotate};
use crate::arcade_drive::steering::{ackermann_angles, smooth_steering, steer_limit, WheelAngles};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConstants {
    pub max_speed: f32,          // m/s, horizontal
    pub acceleration: f32,       // impulse per (m/s of speed error) per second
    pub brake_power: f32,        // replaces acceleration while braking
    pub rolling_resistance: f32, // 1/s
    pub front_lateral_grip: f32,
    pub rear_lateral_grip: f32,
    pub max_drive_impulse: f32,  // per tick
    pub half_wheel_base: f32,    // m
    pub front_track_width: f32,  // m
    pub max_steer_angle: f32,    // radians
    pub steer_in_rate: f32,      // 1/s
    pub steer_out_rate: f32,     // 1/s
    pub steer_yaw_response: f32, // 1/s
    pub steer_speed_falloff: f32, // 0..1, share of steering lost at top speed
}

impl Default for DynamicsConstants {
    fn default() -> Self {
        Self {
            max_speed: 22.0,
            acceleration: 10.0,
            brake_power: 20.0,
            rolling_resistance: 1.8,
            front_lateral_grip: 10.0,
            rear_lateral_grip: 16.0,
            max_drive_impulse: 2.4,
            half_wheel_base: 1.08,
            front_track_width: 1.72,
            max_steer_angle: PI / 4.2,
            steer_in_rate: 10.0,
            steer_out_rate: 14.0,
            steer_yaw_response: 13.0,
            steer_speed_falloff: 0.3,
        }
    }
}

impl DynamicsConstants {
    pub fn wheel_base(&self) -> f32 {
        self.half_wheel_base * 2.0
    }

    /// (name, value) pairs that must be strictly positive.
    pub fn positive_fields(&self) -> [(&'static str, f32); 14] {
        [
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("brake_power", self.brake_power),
            ("rolling_resistance", self.rolling_resistance),
            ("front_lateral_grip", self.front_lateral_grip),
            ("rear_lateral_grip", self.rear_lateral_grip),
            ("max_drive_impulse", self.max_drive_impulse),
            ("half_wheel_base", self.half_wheel_base),
            ("front_track_width", self.front_track_width),
            ("max_steer_angle", self.max_steer_angle),
            ("steer_in_rate", self.steer_in_rate),
            ("steer_out_rate", self.steer_out_rate),
            ("steer_yaw_response", self.steer_yaw_response),
            ("steer_speed_falloff", self.steer_speed_falloff),
        ]
    }
}

/// The only state the drive step carries between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DynamicsState {
    pub steering_angle: f32,
    pub wheel_angles: WheelAngles,
}

impl DynamicsState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// What the rest of the tick needs from the drive step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveFrame {
    pub dt: f32,
    pub forward: Vector3<f32>,
    pub forward_speed: f32,
    pub steering_angle: f32,
    pub wheel_angles: WheelAngles,
    pub braking: bool,
}

pub fn step<B: ChassisBody>(
    dt: f32,
    input: &InputState,
    constants: &DynamicsConstants,
    state: &mut DynamicsState,
    body: &mut B,
) -> DriveFrame {
    let dt = clamp_dt(dt);
    let c = constants;

    // ------------------------------------------------------------
    // 1-3) basis, forward speed, inputs
    // ------------------------------------------------------------
    let (forward, right) = planar_basis(&body.rotation());
    let linvel = body.linvel();
    let forward_speed = linvel.x * forward.x + linvel.z * forward.z;

    let throttle = input.throttle();
    let steer = input.steer();

    // ------------------------------------------------------------
    // 4-5) steering
    // ------------------------------------------------------------
    let limit = steer_limit(c.max_steer_angle, forward_speed, c.max_speed, c.steer_speed_falloff);
    let steering_angle = smooth_steering(
        state.steering_angle,
        steer,
        limit,
        c.steer_in_rate,
        c.steer_out_rate,
        dt,
    );
    state.steering_angle = steering_angle;

    // ------------------------------------------------------------
    // 6-7) front wheel basis + contact points
    // ------------------------------------------------------------
    let front_forward = yaw_rotate(forward, steering_angle).normalize();
    let front_right = planar_right(front_forward);

    let translation = body.translation();
    let front_point = Point3::from(translation + forward * c.half_wheel_base);
    let rear_point = Point3::from(translation - forward * c.half_wheel_base);

    // ------------------------------------------------------------
    // 8) drive / brake
    // ------------------------------------------------------------
    let target_speed = throttle * c.max_speed;
    let speed_delta = target_speed - forward_speed;
    let strength = if input.brake { c.brake_power } else { c.acceleration };
    let drive = (speed_delta * strength * dt).clamp(-c.max_drive_impulse, c.max_drive_impulse);
    body.apply_impulse_at_point(front_forward * drive, front_point);

    // ------------------------------------------------------------
    // 9) rolling resistance
    // ------------------------------------------------------------
    let rolling = -forward_speed * c.rolling_resistance * dt;
    body.apply_impulse_at_point(forward * rolling, rear_point);

    // ------------------------------------------------------------
    // 10) lateral grip (sampled at the contact points, not the COM)
    // ------------------------------------------------------------
    let front_vel = body.velocity_at_point(&front_point);
    let rear_vel = body.velocity_at_point(&rear_point);
    let front_slip = front_vel.x * front_right.x + front_vel.z * front_right.z;
    let rear_slip = rear_vel.x * right.x + rear_vel.z * right.z;

    body.apply_impulse_at_point(front_right * (-front_slip * c.front_lateral_grip * dt), front_point);
    body.apply_impulse_at_point(right * (-rear_slip * c.rear_lateral_grip * dt), rear_point);

    // ------------------------------------------------------------
    // 11) yaw rate (planar rotation only)
    // ------------------------------------------------------------
    let wheel_base = c.wheel_base();
    let target_yaw = forward_speed / wheel_base * steering_angle.tan();
    let yaw = damp(body.angvel().y, target_yaw, c.steer_yaw_response, dt);
    body.set_angvel(Vector3::new(0.0, yaw, 0.0));

    // ------------------------------------------------------------
    // 12) top speed
    // ------------------------------------------------------------
    let limited = body.linvel();
    let horizontal = horizontal_len(&limited);
    if horizontal > c.max_speed {
        let scale = c.max_speed / horizontal;
        body.set_linvel(Vector3::new(limited.x * scale, limited.y, limited.z * scale));
    }

    // ------------------------------------------------------------
    // 13) wheel visuals
    // ------------------------------------------------------------
    state.wheel_angles = ackermann_angles(steering_angle, wheel_base, c.front_track_width);

    DriveFrame {
        dt,
        forward,
        forward_speed,
        steering_angle,
        wheel_angles: state.wheel_angles,
        braking: input.brake,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade_drive::body::TestBody;
    use nalgebra::UnitQuaternion;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const DT: f32 = 1.0 / 60.0;

    fn forward_speed(body: &TestBody) -> f32 {
        let (forward, _) = planar_basis(&body.rotation);
        body.linvel.dot(&forward)
    }

    #[test]
    fn throttle_from_rest_accelerates_monotonically_below_top_speed() {
        let constants = DynamicsConstants::default();
        let input = InputState { forward: true, ..Default::default() };
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));

        let mut last = 0.0;
        for tick in 0..120 {
            step(DT, &input, &constants, &mut state, &mut body);
            body.integrate(DT);

            let speed = forward_speed(&body);
            assert!(speed > last, "tick {tick}: {speed} <= {last}");
            assert!(horizontal_len(&body.linvel) <= constants.max_speed + 1e-4);
            last = speed;
        }
        assert!(last > constants.max_speed * 0.5);
    }

    #[test]
    fn coasting_decays_without_reversing() {
        let constants = DynamicsConstants::default();
        let input = InputState::default();
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        body.linvel = Vector3::new(0.0, 0.0, -15.0);

        let mut last = forward_speed(&body);
        for _ in 0..300 {
            step(DT, &input, &constants, &mut state, &mut body);
            body.integrate(DT);

            let speed = forward_speed(&body);
            assert!(speed <= last);
            assert!(speed >= 0.0);
            last = speed;
        }
        assert!(last < 0.5);
    }

    #[test]
    fn steering_stays_within_limits_for_random_input() {
        let constants = DynamicsConstants::default();
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..5_000 {
            let input = InputState {
                forward: rng.gen_bool(0.6),
                backward: rng.gen_bool(0.2),
                left: rng.gen_bool(0.4),
                right: rng.gen_bool(0.4),
                brake: rng.gen_bool(0.1),
            };
            let dt = rng.gen_range(0.0..0.3);
            let frame = step(dt, &input, &constants, &mut state, &mut body);
            body.integrate(frame.dt);

            assert!(frame.dt <= 0.05);
            assert!(state.steering_angle.abs() <= constants.max_steer_angle + 1e-6);
            assert!(horizontal_len(&body.linvel) <= constants.max_speed + 1e-4);
        }
    }

    #[test]
    fn speed_clamp_preserves_vertical_velocity() {
        let constants = DynamicsConstants::default();
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 4.0, 0.0));
        body.linvel = Vector3::new(30.0, -7.5, -30.0);

        step(DT, &InputState::default(), &constants, &mut state, &mut body);

        assert!((horizontal_len(&body.linvel) - constants.max_speed).abs() < 1e-3);
        assert_eq!(body.linvel.y, -7.5);
    }

    #[test]
    fn yaw_write_back_is_planar() {
        let constants = DynamicsConstants::default();
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        body.angvel = Vector3::new(1.5, 0.2, -0.8);

        step(DT, &InputState::default(), &constants, &mut state, &mut body);

        assert_eq!(body.angvel.x, 0.0);
        assert_eq!(body.angvel.z, 0.0);
    }

    #[test]
    fn steering_left_while_moving_yaws_left() {
        let constants = DynamicsConstants::default();
        let input = InputState { forward: true, left: true, ..Default::default() };
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        body.linvel = Vector3::new(0.0, 0.0, -10.0);

        for _ in 0..30 {
            step(DT, &input, &constants, &mut state, &mut body);
            body.integrate(DT);
        }

        assert!(state.steering_angle > 0.0);
        assert!(body.angvel.y > 0.0);
        assert!(state.wheel_angles.left > state.wheel_angles.right);
    }

    #[test]
    fn rear_grip_cancels_sideways_slide() {
        let constants = DynamicsConstants::default();
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        body.linvel = Vector3::new(6.0, 0.0, 0.0); // pure sideways

        for _ in 0..240 {
            step(DT, &InputState::default(), &constants, &mut state, &mut body);
            body.integrate(DT);
        }

        let (_, right) = planar_basis(&body.rotation);
        assert!(body.linvel.dot(&right).abs() < 0.6);
    }

    #[test]
    fn degenerate_orientation_still_produces_finite_impulses() {
        let constants = DynamicsConstants::default();
        let input = InputState { forward: true, left: true, ..Default::default() };
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));
        body.rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::FRAC_PI_2);

        let frame = step(DT, &input, &constants, &mut state, &mut body);

        assert_eq!(frame.forward, Vector3::new(0.0, 0.0, -1.0));
        assert!(body.linvel.iter().all(|c| c.is_finite()));
        assert!(body.angvel.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn oversized_dt_is_clamped() {
        let constants = DynamicsConstants::default();
        let input = InputState { forward: true, ..Default::default() };
        let mut state = DynamicsState::default();
        let mut body = TestBody::at(Vector3::new(0.0, 1.0, 0.0));

        let frame = step(2.0, &input, &constants, &mut state, &mut body);
        assert_eq!(frame.dt, 0.05);
        // a single tick can never exceed the drive clamp
        assert!(body.linvel.norm() <= constants.max_drive_impulse * body.inv_mass + 1e-6);
    }
}
