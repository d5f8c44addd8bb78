use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::arcade_drive::camera::CameraView;
use crate::arcade_drive::feedback::ContactShadow;
use crate::arcade_drive::input::InputState;
use crate::arcade_drive::math::to_array;
use crate::arcade_drive::steering::WheelAngles;
use crate::vehicle::VehicleFrame;

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub position: [f32; 3],
    pub rotation: [f32; 4], // quaternion x, y, z, w
    pub linvel: [f32; 3],
    pub forward: [f32; 3],
    pub forward_speed: f32,
    pub steering_angle: f32,
    pub wheel_angles: WheelAngles,
    pub braking: bool,
    pub brake_light: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub vehicle: VehicleSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ContactShadow>,
    pub recovered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail: Option<Vec<[f32; 3]>>,
}

impl FrameSnapshot {
    pub fn from_frame(tick: u64, frame: &VehicleFrame, trail: Option<Vec<[f32; 3]>>) -> Self {
        let q = frame.rotation.coords;
        Self {
            tick,
            vehicle: VehicleSnapshot {
                position: to_array(&frame.translation),
                rotation: [q.x, q.y, q.z, q.w],
                linvel: to_array(&frame.linvel),
                forward: to_array(&frame.forward),
                forward_speed: frame.forward_speed,
                steering_angle: frame.steering_angle,
                wheel_angles: frame.wheel_angles,
                braking: frame.braking,
                brake_light: frame.brake_light,
            },
            camera: frame.camera,
            shadow: frame.shadow,
            recovered: frame.recovered,
            trail,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Welcome { client_id: Uuid, zoom: f32 },
    Pong,
    Frame(FrameSnapshot),
}

impl ServerMessage {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(err) => {
                warn!(%err, "failed to serialize server message");
                None
            }
        }
    }
}

/// Everything the websocket tasks and the tick loop share.
pub struct SharedSessionState {
    pub tick: u64,
    pub clients: HashMap<Uuid, UnboundedSender<String>>,
    pub input: InputState,
    pub full_sync: bool, // a client joined: next frame carries the whole trail
}

impl SharedSessionState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            clients: HashMap::new(),
            input: InputState::default(),
            full_sync: false,
        }
    }

    pub fn register_client(&mut self, tx: UnboundedSender<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.insert(id, tx);
        self.full_sync = true;
        id
    }

    /// Drops the client and its held keys (their key-ups will never arrive).
    pub fn remove_client(&mut self, id: &Uuid) {
        self.clients.remove(id);
        self.input.clear();
    }

    pub fn send_to(&self, id: &Uuid, msg: &ServerMessage) {
        let (Some(tx), Some(json)) = (self.clients.get(id), msg.to_json()) else {
            return;
        };
        let _ = tx.send(json);
    }

    /// Sends to every client, pruning those whose send loop has gone away.
    pub fn broadcast(&mut self, msg: &ServerMessage) {
        let Some(json) = msg.to_json() else {
            return;
        };
        self.clients.retain(|id, tx| {
            let alive = tx.send(json.clone()).is_ok();
            if !alive {
                debug!(client = %id, "dropping closed client channel");
            }
            alive
        });
    }
}

impl Default for SharedSessionState {
    fn default() -> Self {
        Self::new()
    }
}
