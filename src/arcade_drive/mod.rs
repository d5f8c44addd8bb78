//! arcade_drive - engine-agnostic drive model (pure state + per-tick solvers)

pub mod math;
pub mod input;
pub mod body;
pub mod steering;
pub mod dynamics;
pub mod recovery;
pub mod camera;
pub mod trail;
pub mod feedback;

pub use body::ChassisBody;
pub use dynamics::{step, DynamicsState};
pub use input::InputState;
