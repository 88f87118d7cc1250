//! Rig/animation engine collaborator seam.
//!
//! The rig engine owns pose solving, IK, animation playback and vertex
//! skinning. The world pulls its per-frame results (pose array, drained
//! events) once per frame, strictly before the transform/batch pass, and
//! applies them through the component.

use std::sync::Arc;

use nalgebra::{Matrix4, Vector3};
use rigmesh_api_core::{NameHash, Transform};
use serde::{Deserialize, Serialize};

use crate::error::RigError;
use crate::graphics::ModelVertex;
use crate::messages::Playback;
use crate::resources::{AnimationSetId, MeshSetId, Skeleton};

/// Opaque rig instance handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RigInstanceId(pub u32);

/// Playback modes understood by the rig engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RigPlayback {
    None,
    OnceForward,
    OnceBackward,
    OncePingPong,
    LoopForward,
    LoopBackward,
    LoopPingPong,
}

impl RigPlayback {
    /// Map a scene-side playback mode to the rig engine's. A pure total
    /// function; no process-wide translation table is needed.
    pub fn from_playback(playback: Playback) -> RigPlayback {
        match playback {
            Playback::None => RigPlayback::None,
            Playback::OnceForward => RigPlayback::OnceForward,
            Playback::OnceBackward => RigPlayback::OnceBackward,
            Playback::OncePingPong => RigPlayback::OncePingPong,
            Playback::LoopForward => RigPlayback::LoopForward,
            Playback::LoopBackward => RigPlayback::LoopBackward,
            Playback::LoopPingPong => RigPlayback::LoopPingPong,
        }
    }
}

/// Discrete events produced during rig evaluation, drained once per frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RigEvent {
    /// A playing animation reached its end or was replaced.
    Completed {
        animation: NameHash,
        playback: RigPlayback,
    },
    /// A named keyframe event was crossed during playback.
    Keyframe {
        event_id: NameHash,
        animation: NameHash,
        blend_weight: f32,
        /// Normalized playback time in [0, 1].
        t: f32,
        integer: i32,
        float: f32,
        string: NameHash,
    },
}

/// Where an IK constraint's target position comes from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IkSource {
    /// Follow another scene node, addressed by identifier.
    Node(NameHash),
    /// Fixed world-space position.
    Position(Vector3<f32>),
}

/// Everything the rig engine needs to create one instance.
#[derive(Clone, Debug)]
pub struct RigInstanceParams {
    pub skeleton: Arc<Skeleton>,
    pub bind_pose: Vec<Transform>,
    pub mesh_set: MeshSetId,
    pub animation_set: AnimationSetId,
    /// Default mesh selection (from the resource skin name).
    pub mesh: NameHash,
    pub default_animation: NameHash,
}

pub trait RigEngine {
    fn create_instance(&mut self, params: RigInstanceParams) -> Result<RigInstanceId, RigError>;
    fn destroy_instance(&mut self, instance: RigInstanceId);
    fn is_valid(&self, instance: RigInstanceId) -> bool;

    fn set_enabled(&mut self, instance: RigInstanceId, enabled: bool);

    fn play_animation(
        &mut self,
        instance: RigInstanceId,
        animation: NameHash,
        playback: RigPlayback,
        blend_duration: f32,
        offset: f32,
        playback_rate: f32,
    ) -> Result<(), RigError>;
    fn cancel_animation(&mut self, instance: RigInstanceId);

    fn mesh(&self, instance: RigInstanceId) -> NameHash;
    fn set_mesh(&mut self, instance: RigInstanceId, mesh: NameHash) -> Result<(), RigError>;
    fn animation(&self, instance: RigInstanceId) -> NameHash;
    fn cursor(&self, instance: RigInstanceId) -> f32;
    fn set_cursor(&mut self, instance: RigInstanceId, cursor: f32) -> Result<(), RigError>;
    fn playback_rate(&self, instance: RigInstanceId) -> f32;
    fn set_playback_rate(&mut self, instance: RigInstanceId, rate: f32) -> Result<(), RigError>;

    /// The most recently solved pose, one transform per bone. Empty until
    /// the first evaluation.
    fn pose(&self, instance: RigInstanceId) -> &[Transform];

    /// Events produced since the last drain, in firing order.
    fn drain_events(&mut self, instance: RigInstanceId) -> Vec<RigEvent>;

    fn vertex_count(&self, instance: RigInstanceId) -> usize;

    /// Append skinned vertices for this instance, with `world` baked into
    /// the emitted positions.
    fn generate_vertex_data(
        &self,
        instance: RigInstanceId,
        world: &Matrix4<f32>,
        out: &mut Vec<ModelVertex>,
    );

    /// Register or replace an IK target source; `false` when the rig has no
    /// constraint with this id.
    fn set_ik_target(
        &mut self,
        instance: RigInstanceId,
        constraint: NameHash,
        mix: f32,
        source: IkSource,
    ) -> bool;

    /// Currently registered IK target sources for an instance.
    fn ik_targets(&self, instance: RigInstanceId) -> Vec<(NameHash, IkSource)>;

    /// Feed a resolved rig-local target position back to a constraint.
    fn set_ik_position(&mut self, instance: RigInstanceId, constraint: NameHash, local: Vector3<f32>);

    /// Drop an IK target whose source vanished; zeroes its mix.
    fn clear_ik_target(&mut self, instance: RigInstanceId, constraint: NameHash);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_mapping_is_total_and_identity_shaped() {
        let modes = [
            Playback::None,
            Playback::OnceForward,
            Playback::OnceBackward,
            Playback::OncePingPong,
            Playback::LoopForward,
            Playback::LoopBackward,
            Playback::LoopPingPong,
        ];
        let mapped: Vec<RigPlayback> =
            modes.iter().map(|m| RigPlayback::from_playback(*m)).collect();
        assert_eq!(mapped[0], RigPlayback::None);
        assert_eq!(mapped[4], RigPlayback::LoopForward);
        // All distinct: the table is a bijection.
        for (i, a) in mapped.iter().enumerate() {
            for b in mapped.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
