// ==============================================================================
// math.rs - GROUND-PLANE BASIS + EXPONENTIAL DAMPING
// ------------------------------------------------------------------------------
// Small shared helpers used by every per-tick solver:
// - clamp_dt(): bounds the tick length so a stalled frame cannot apply an
//   unbounded impulse
// - exp_alpha() / damp(): frame-rate independent smoothing
//     value += (target - value) * (1 - e^(-dt * rate))
// - planar_basis(): chassis forward/right flattened onto the ground plane
//
// Conventions: +Y is up, the chassis looks down local -Z, positive yaw about
// +Y turns the nose to the left.
// ==============================================================================

use nalgebra::{UnitQuaternion, Vector3};

/// Upper bound on the tick length fed to the solvers (seconds).
pub const MAX_TICK_DT: f32 = 0.05;

/// Forward used when the chassis basis collapses (nose pointing straight up/down).
pub const FALLBACK_FORWARD: Vector3<f32> = Vector3::new(0.0, 0.0, -1.0);

#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, MAX_TICK_DT) } else { 0.0 }
}

/// Blend weight for one tick of exponential damping, always in [0, 1].
#[inline]
pub fn exp_alpha(rate: f32, dt: f32) -> f32 {
    if rate > 0.0 && dt > 0.0 {
        (1.0 - (-dt * rate).exp()).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[inline]
pub fn damp(value: f32, target: f32, rate: f32, dt: f32) -> f32 {
    value + (target - value) * exp_alpha(rate, dt)
}

#[inline]
pub fn damp_vec(value: Vector3<f32>, target: Vector3<f32>, rate: f32, dt: f32) -> Vector3<f32> {
    value + (target - value) * exp_alpha(rate, dt)
}

/// Ground-plane right for a ground-plane forward (right-handed, +Y up).
#[inline]
pub fn planar_right(forward: Vector3<f32>) -> Vector3<f32> {
    Vector3::new(-forward.z, 0.0, forward.x)
}

/// Returns (forward, right) of the chassis projected onto the ground plane.
pub fn planar_basis(rotation: &UnitQuaternion<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let mut forward = rotation * FALLBACK_FORWARD;
    forward.y = 0.0;

    // also catches a NaN basis from a corrupted orientation
    let forward = if !(forward.norm_squared() >= 1e-4) {
        FALLBACK_FORWARD
    } else {
        forward.normalize()
    };

    (forward, planar_right(forward))
}

/// Rotates a ground-plane vector about +Y.
#[inline]
pub fn yaw_rotate(v: Vector3<f32>, angle: f32) -> Vector3<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle) * v
}

#[inline]
pub fn horizontal_len(v: &Vector3<f32>) -> f32 {
    v.x.hypot(v.z)
}

#[inline]
pub fn to_array(v: &Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn clamp_dt_never_exceeds_bound() {
        for dt in [0.0, 0.016, 0.05, 0.051, 0.2, 3.0, f32::INFINITY, f32::NAN, -1.0] {
            let clamped = clamp_dt(dt);
            assert!((0.0..=MAX_TICK_DT).contains(&clamped), "dt {dt} -> {clamped}");
        }
        assert_eq!(clamp_dt(0.016), 0.016);
    }

    #[test]
    fn damping_moves_toward_target_without_overshoot() {
        let mut value = 0.0;
        for _ in 0..200 {
            let next = damp(value, 1.0, 9.0, 1.0 / 60.0);
            assert!(next >= value && next <= 1.0);
            value = next;
        }
        assert!((1.0 - value) < 1e-3);
        assert_eq!(exp_alpha(9.0, 0.0), 0.0);
    }

    #[test]
    fn identity_orientation_faces_negative_z() {
        let (forward, right) = planar_basis(&UnitQuaternion::identity());
        assert!((forward - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
        assert!((right - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-6);
        assert!(forward.dot(&right).abs() < 1e-6);
    }

    #[test]
    fn nose_up_orientation_falls_back() {
        // pitch the nose straight up: local -Z ends up along +Y
        let rot = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        let (forward, _) = planar_basis(&rot);
        assert_eq!(forward, FALLBACK_FORWARD);
        assert!(forward.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn non_finite_orientation_falls_back() {
        let rot = UnitQuaternion::new_unchecked(nalgebra::Quaternion::new(f32::NAN, 0.0, 0.0, 0.0));
        let (forward, right) = planar_basis(&rot);
        assert_eq!(forward, FALLBACK_FORWARD);
        assert!(right.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn positive_yaw_turns_left() {
        let turned = yaw_rotate(FALLBACK_FORWARD, 0.3);
        // left of -Z is -X
        assert!(turned.x < 0.0);
        assert!((turned.norm() - 1.0).abs() < 1e-6);
    }
}
