use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveAction {
    Forward,
    Backward,
    Left,
    Right,
    Brake,
}

impl DriveAction {
    /// Maps a DOM-style `KeyboardEvent.code` to an action.
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Self::Forward),
            "KeyS" | "ArrowDown" => Some(Self::Backward),
            "KeyA" | "ArrowLeft" => Some(Self::Left),
            "KeyD" | "ArrowRight" => Some(Self::Right),
            "Space" => Some(Self::Brake),
            _ => None,
        }
    }
}

/// Latched key state. Written by the key-event collaborator, read once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub brake: bool,
}

impl InputState {
    pub fn set(&mut self, action: DriveAction, pressed: bool) {
        match action {
            DriveAction::Forward => self.forward = pressed,
            DriveAction::Backward => self.backward = pressed,
            DriveAction::Left => self.left = pressed,
            DriveAction::Right => self.right = pressed,
            DriveAction::Brake => self.brake = pressed,
        }
    }

    /// Returns false when the key has no binding (event not consumed).
    pub fn handle_key(&mut self, code: &str, pressed: bool) -> bool {
        match DriveAction::from_key_code(code) {
            Some(action) => {
                self.set(action, pressed);
                true
            }
            None => false,
        }
    }

    /// Focus lost: key-ups will never arrive, so drop everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// -1..1, positive drives forward.
    pub fn throttle(&self) -> f32 {
        f32::from(u8::from(self.forward)) - f32::from(u8::from(self.backward))
    }

    /// -1..1, positive steers left.
    pub fn steer(&self) -> f32 {
        f32::from(u8::from(self.left)) - f32::from(u8::from(self.right))
    }
}
