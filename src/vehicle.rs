use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::prelude::RigidBodyHandle;

use crate::arcade_drive::camera::{CameraView, ChaseCamera};
use crate::arcade_drive::feedback::{project_shadow, BrakeLight, ContactShadow};
use crate::arcade_drive::recovery::{RecoveryMonitor, RecoveryPhase};
use crate::arcade_drive::{self as drive, ChassisBody, DynamicsState, InputState};
use crate::arcade_drive::steering::WheelAngles;
use crate::arcade_drive::trail::SkidTrail;
use crate::config::SessionConfig;

pub struct Vehicle {
    pub body: RigidBodyHandle,        // the chassis body (owned by the physics world)
    pub dynamics: DynamicsState,      // steering angle + wheel visuals
    pub recovery: RecoveryMonitor,    // last safe position
    pub camera: ChaseCamera,          // smoothed focus + camera position
    pub trail: SkidTrail,             // skid polyline
    pub brake_light: BrakeLight,      // eased tail-light intensity
    pub shadow: Option<ContactShadow>, // last projected contact shadow
}

/// Everything the renderer needs from one tick.
#[derive(Debug, Clone)]
pub struct VehicleFrame {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub linvel: Vector3<f32>,
    pub forward: Vector3<f32>, // ground-plane heading
    pub forward_speed: f32,
    pub steering_angle: f32,
    pub wheel_angles: WheelAngles,
    pub braking: bool,
    pub brake_light: f32,
    pub camera: Option<CameraView>, // None on a recovery tick (camera untouched)
    pub shadow: Option<ContactShadow>,
    pub trail_changed: bool,
    pub recovered: bool,
}

impl Vehicle {
    pub fn new(body: RigidBodyHandle, config: &SessionConfig) -> Self {
        Self {
            body,
            dynamics: DynamicsState::default(),
            recovery: RecoveryMonitor::new(
                config.recovery,
                config.chassis.spawn_position(),
                config.world.size * 0.5,
            ),
            camera: ChaseCamera::default(),
            trail: SkidTrail::default(),
            brake_light: BrakeLight::new(&config.feedback),
            shadow: None,
        }
    }

    /// One simulation tick: drive step, recovery, then camera / trail / feedback.
    /// A recovery short-circuits everything after the reset.
    pub fn tick<B: ChassisBody>(
        &mut self,
        dt: f32,
        input: &InputState,
        config: &SessionConfig,
        body: &mut B,
    ) -> VehicleFrame {
        let frame = drive::step(dt, input, &config.vehicle, &mut self.dynamics, body);

        if self.recovery.observe(body) == RecoveryPhase::Recovering {
            self.dynamics.reset();
            return VehicleFrame {
                translation: body.translation(),
                rotation: body.rotation(),
                linvel: body.linvel(),
                forward: frame.forward,
                forward_speed: 0.0,
                steering_angle: 0.0,
                wheel_angles: WheelAngles::default(),
                braking: frame.braking,
                brake_light: self.brake_light.intensity(),
                camera: None,
                shadow: self.shadow,
                trail_changed: false,
                recovered: true,
            };
        }

        let translation = body.translation();
        let rotation = body.rotation();
        let anchor = translation + rotation * config.chassis.visual_offset();

        let camera = self.camera.update(&config.camera, anchor, frame.dt);
        let trail_changed = self.trail.advance(frame.dt, translation);
        let brake_light = self.brake_light.update(&config.feedback, frame.braking, frame.dt);
        let shadow = project_shadow(
            translation,
            frame.forward_speed,
            config.vehicle.max_speed,
            config.feedback.sun_direction(),
        );
        self.shadow = Some(shadow);

        VehicleFrame {
            translation,
            rotation,
            linvel: body.linvel(),
            forward: frame.forward,
            forward_speed: frame.forward_speed,
            steering_angle: frame.steering_angle,
            wheel_angles: frame.wheel_angles,
            braking: frame.braking,
            brake_light,
            camera: Some(camera),
            shadow: Some(shadow),
            trail_changed,
            recovered: false,
        }
    }
}
