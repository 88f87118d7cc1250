//! Message-bus contracts: addresses, the inbound control messages a model
//! component consumes and the notifications it produces.

use nalgebra::Vector4;
use rigmesh_api_core::NameHash;
use serde::{Deserialize, Serialize};

use crate::error::MessageError;
use crate::rig::RigPlayback;

/// Typed message address: socket (collection), path (node identifier),
/// fragment (component id).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub socket: NameHash,
    pub path: NameHash,
    pub fragment: NameHash,
}

impl Address {
    pub const EMPTY: Address = Address {
        socket: NameHash::EMPTY,
        path: NameHash::EMPTY,
        fragment: NameHash::EMPTY,
    };

    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.socket.is_empty()
    }
}

/// Scene-side playback modes carried by play-animation requests.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Playback {
    None,
    OnceForward,
    OnceBackward,
    OncePingPong,
    LoopForward,
    LoopBackward,
    LoopPingPong,
}

/// Control messages consumed by a model component, one variant per kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModelMessage {
    Enable,
    Disable,
    PlayAnimation {
        animation: NameHash,
        playback: Playback,
        blend_duration: f32,
        offset: f32,
        playback_rate: f32,
    },
    CancelAnimation,
    SetConstant {
        name: NameHash,
        value: Vector4<f32>,
        /// Write a single component instead of the whole vector.
        element: Option<usize>,
    },
    ResetConstant {
        name: NameHash,
    },
}

/// Notifications produced by a model component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ModelNotification {
    /// A play-animation request ran to completion (or was replaced).
    AnimationDone {
        animation: NameHash,
        playback: RigPlayback,
    },
    /// A keyframe event, forwarded verbatim from the rig.
    RigEvent {
        event_id: NameHash,
        animation: NameHash,
        blend_weight: f32,
        t: f32,
        integer: i32,
        float: f32,
        string: NameHash,
    },
    /// Forward-compatible escape hatch for host-defined payloads.
    Custom {
        kind: String,
        data: serde_json::Value,
    },
}

/// Message-bus seam for outbound notifications.
pub trait MessageSender {
    fn send(
        &mut self,
        sender: Address,
        receiver: Address,
        message: ModelNotification,
    ) -> Result<(), MessageError>;
}
