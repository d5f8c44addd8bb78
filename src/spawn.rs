// ---------------------------------------------
// SPAWN: GROUND SLAB + CHASSIS BUILDERS
// ---------------------------------------------
// The world is one flat slab whose top face sits at y = 0. Its edge is the
// edge of the world: past it the chassis falls and recovery takes over.
//
// The chassis is a single box. Pitch and roll are locked, so the only
// rotation the body ever has is yaw.

use rapier3d::prelude::*;

use crate::config::{ChassisConfig, WorldConfig};

pub const GROUP_GROUND: Group = Group::GROUP_1;
pub const GROUP_CHASSIS: Group = Group::GROUP_2;

const GROUND_HALF_THICKNESS: f32 = 1.0;
const GROUND_FRICTION: f32 = 1.2;

pub fn build_ground(world: &WorldConfig) -> (RigidBody, Collider) {
    let half = world.size * 0.5;

    // centred one half-thickness down so the top face is y = 0
    let body = RigidBodyBuilder::fixed()
        .translation(vector![0.0, -GROUND_HALF_THICKNESS, 0.0])
        .build();

    let collider = ColliderBuilder::cuboid(half, GROUND_HALF_THICKNESS, half)
        .collision_groups(InteractionGroups::new(GROUP_GROUND, GROUP_CHASSIS))
        .friction(GROUND_FRICTION)
        .restitution(0.0)
        .build();

    (body, collider)
}

pub fn build_chassis(chassis: &ChassisConfig) -> (RigidBody, Collider) {
    let body = RigidBodyBuilder::dynamic()
        .translation(chassis.spawn_position())
        .linear_damping(chassis.linear_damping)
        .angular_damping(chassis.angular_damping)
        .enabled_rotations(false, true, false) // yaw only
        .ccd_enabled(true)
        .can_sleep(false)
        .build();

    let [hx, hy, hz] = chassis.half_extents;
    let collider = ColliderBuilder::cuboid(hx, hy, hz)
        .collision_groups(InteractionGroups::new(GROUP_CHASSIS, GROUP_GROUND))
        .mass(chassis.mass)
        .friction(chassis.friction)
        .restitution(chassis.restitution)
        .build();

    (body, collider)
}
