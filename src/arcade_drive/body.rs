// ==============================================================================
// body.rs - CHASSIS BODY CONTRACT (PHYSICS ENGINE BOUNDARY)
// ------------------------------------------------------------------------------
// The drive model never owns the rigid body. It reads pose/velocity and pushes
// impulses through ChassisBody, which is implemented for rapier's RigidBody.
//
// All points and vectors are world space. Impulses are applied immediately to
// the body velocity (rapier semantics), so a velocity_at_point() call made
// after apply_impulse_at_point() observes the change.
// ==============================================================================

use nalgebra::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::RigidBody;

pub trait ChassisBody {
    fn translation(&self) -> Vector3<f32>;
    fn rotation(&self) -> UnitQuaternion<f32>;
    fn linvel(&self) -> Vector3<f32>;
    fn angvel(&self) -> Vector3<f32>;
    fn velocity_at_point(&self, point: &Point3<f32>) -> Vector3<f32>;

    fn apply_impulse_at_point(&mut self, impulse: Vector3<f32>, point: Point3<f32>);
    fn set_linvel(&mut self, linvel: Vector3<f32>);
    fn set_angvel(&mut self, angvel: Vector3<f32>);
    fn set_translation(&mut self, translation: Vector3<f32>);
    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>);
}

impl ChassisBody for RigidBody {
    fn translation(&self) -> Vector3<f32> {
        *RigidBody::translation(self)
    }

    fn rotation(&self) -> UnitQuaternion<f32> {
        *RigidBody::rotation(self)
    }

    fn linvel(&self) -> Vector3<f32> {
        *RigidBody::linvel(self)
    }

    fn angvel(&self) -> Vector3<f32> {
        *RigidBody::angvel(self)
    }

    fn velocity_at_point(&self, point: &Point3<f32>) -> Vector3<f32> {
        RigidBody::velocity_at_point(self, point)
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector3<f32>, point: Point3<f32>) {
        RigidBody::apply_impulse_at_point(self, impulse, point, true);
    }

    fn set_linvel(&mut self, linvel: Vector3<f32>) {
        RigidBody::set_linvel(self, linvel, true);
    }

    fn set_angvel(&mut self, angvel: Vector3<f32>) {
        RigidBody::set_angvel(self, angvel, true);
    }

    fn set_translation(&mut self, translation: Vector3<f32>) {
        RigidBody::set_translation(self, translation, true);
    }

    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        RigidBody::set_rotation(self, rotation, true);
    }
}

/// Point-mass chassis with planar yaw inertia, for solver tests without a
/// physics pipeline.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct TestBody {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub linvel: Vector3<f32>,
    pub angvel: Vector3<f32>,
    pub inv_mass: f32,
    pub inv_yaw_inertia: f32,
}

#[cfg(test)]
impl TestBody {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
            linvel: Vector3::zeros(),
            angvel: Vector3::zeros(),
            inv_mass: 1.0 / 2.1,
            inv_yaw_inertia: 1.0 / 2.5,
        }
    }

    /// Explicit Euler, yaw only. Stands in for the pipeline step.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.linvel * dt;
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.angvel.y * dt);
        self.rotation = yaw * self.rotation;
    }
}

#[cfg(test)]
impl ChassisBody for TestBody {
    fn translation(&self) -> Vector3<f32> {
        self.position
    }

    fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    fn linvel(&self) -> Vector3<f32> {
        self.linvel
    }

    fn angvel(&self) -> Vector3<f32> {
        self.angvel
    }

    fn velocity_at_point(&self, point: &Point3<f32>) -> Vector3<f32> {
        // v(p) = v_com + ω × (p - com)
        self.linvel + self.angvel.cross(&(point.coords - self.position))
    }

    fn apply_impulse_at_point(&mut self, impulse: Vector3<f32>, point: Point3<f32>) {
        let arm = point.coords - self.position;
        self.linvel += impulse * self.inv_mass;
        self.angvel.y += arm.cross(&impulse).y * self.inv_yaw_inertia;
    }

    fn set_linvel(&mut self, linvel: Vector3<f32>) {
        self.linvel = linvel;
    }

    fn set_angvel(&mut self, angvel: Vector3<f32>) {
        self.angvel = angvel;
    }

    fn set_translation(&mut self, translation: Vector3<f32>) {
        self.position = translation;
    }

    fn set_rotation(&mut self, rotation: UnitQuaternion<f32>) {
        self.rotation = rotation;
    }
}
