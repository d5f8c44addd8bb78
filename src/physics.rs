// src/physics.rs

use rapier3d::prelude::*;
use tracing::{debug, info};

use crate::arcade_drive::input::InputState;
use crate::arcade_drive::math::clamp_dt;
use crate::config::SessionConfig;
use crate::spawn::{build_chassis, build_ground};
use crate::vehicle::{Vehicle, VehicleFrame};

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,               // gravity vector
    pub pipeline: PhysicsPipeline,           // physics pipeline
    pub island_manager: IslandManager,       // manages islands of bodies
    pub broad_phase: DefaultBroadPhase,      // broad-phase collision detection
    pub narrow_phase: NarrowPhase,           // collision detection
    pub bodies: RigidBodySet,                // for rigid bodies
    pub colliders: ColliderSet,              // for collision shapes
    pub joints: ImpulseJointSet,             // for constraints
    pub multibody_joints: MultibodyJointSet, // for articulated bodies
    pub ccd: CCDSolver,                      // continuous collision detection
    pub vehicle: Option<Vehicle>,            // the one drivable car
}

impl PhysicsWorld {
    pub fn new(config: &SessionConfig) -> Self {
        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        let (ground_rb, ground_collider) = build_ground(&config.world);
        let ground_handle = bodies.insert(ground_rb);
        colliders.insert_with_parent(ground_collider, ground_handle, &mut bodies);

        info!(
            size = config.world.size,
            bodies = bodies.len(),
            colliders = colliders.len(),
            "ground inserted"
        );

        Self {
            gravity: vector![0.0, config.world.gravity, 0.0],
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies,
            colliders,
            joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            vehicle: None,
        }
    }

    /// Inserts the chassis and makes it the driven vehicle. Replaces any
    /// previous vehicle (its body is removed from the world).
    pub fn spawn_vehicle(&mut self, config: &SessionConfig) -> RigidBodyHandle {
        if let Some(old) = self.vehicle.take() {
            self.bodies.remove(
                old.body,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                true,
            );
        }

        let (rb, collider) = build_chassis(&config.chassis);
        let handle = self.bodies.insert(rb);
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.vehicle = Some(Vehicle::new(handle, config));

        info!(position = ?config.chassis.spawn_position, ?handle, "spawned vehicle");
        handle
    }

    /// One fixed tick: drive model against the chassis body, then the rapier
    /// step with the same (clamped) dt. Returns None when there is no car.
    pub fn step(&mut self, dt: Real, input: &InputState, config: &SessionConfig) -> Option<VehicleFrame> {
        let dt = clamp_dt(dt);

        let frame = match self.vehicle.as_mut() {
            Some(vehicle) => match self.bodies.get_mut(vehicle.body) {
                Some(body) => Some(vehicle.tick(dt, input, config, body)),
                None => {
                    debug!(handle = ?vehicle.body, "vehicle body missing, skipping drive step");
                    None
                }
            },
            None => None,
        };

        if dt > 0.0 {
            self.pipeline.step(
                &self.gravity,
                &IntegrationParameters {
                    dt,
                    ..IntegrationParameters::default()
                },
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.joints,
                &mut self.multibody_joints,
                &mut self.ccd,
                None,
                &(),
                &(),
            );
        }

        frame
    }

    pub fn trail_points(&self) -> Vec<[f32; 3]> {
        self.vehicle.as_ref().map(|v| v.trail.to_vec()).unwrap_or_default()
    }
}
