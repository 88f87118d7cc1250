//! One model component instance: resource bindings, the mirrored bone-node
//! sequence, render-constant overrides and the batch-key hash.

use std::sync::Arc;

use nalgebra::Vector4;
use rigmesh_api_core::{Hash32, NameHash, Transform};

use crate::error::PropertyError;
use crate::messages::{Address, MessageSender, ModelNotification};
use crate::properties::PropertyValue;
use crate::resources::ModelResource;
use crate::rig::{RigEvent, RigInstanceId};
use crate::scene::{NodeId, SceneGraph};

/// A render-constant override: material constant name plus its current
/// 4-component value.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConstant {
    pub name: NameHash,
    pub value: Vector4<f32>,
}

/// Per-instance state. Owned by the world's pool; the rig instance handle
/// and the bone-node sequence are owned exclusively by this component and
/// torn down in a fixed order (nodes before rig instance).
#[derive(Debug)]
pub struct ModelComponent {
    /// Owning scene node.
    pub node: NodeId,
    /// Index of this component on its owning node.
    pub component_index: u8,
    /// Local offset relative to the owning node; unit scale.
    pub local: Transform,
    pub resource: Arc<ModelResource>,
    pub rig_instance: Option<RigInstanceId>,
    /// One scene node per skeleton bone, index-aligned with the bone array.
    pub node_instances: Vec<NodeId>,
    pub enabled: bool,
    pub added_to_update: bool,
    pub do_render: bool,
    /// World transform cache, recomputed each frame.
    pub world: Transform,
    /// Batch key: content hash over resource bindings and constants.
    pub mixed_hash: u32,
    constants: Vec<RenderConstant>,
    /// Shadow copy of each constant's value at the last rehash, for dirty
    /// detection.
    prev_constants: Vec<Vector4<f32>>,
    /// Pending animation-done listener; at most one at a time.
    pub listener: Address,
}

impl ModelComponent {
    pub fn new(
        node: NodeId,
        component_index: u8,
        local: Transform,
        resource: Arc<ModelResource>,
    ) -> Self {
        Self {
            node,
            component_index,
            local,
            resource,
            rig_instance: None,
            node_instances: Vec::new(),
            enabled: true,
            added_to_update: false,
            do_render: false,
            world: Transform::identity(),
            mixed_hash: 0,
            constants: Vec::new(),
            prev_constants: Vec::new(),
            listener: Address::EMPTY,
        }
    }

    #[inline]
    pub fn constants(&self) -> &[RenderConstant] {
        &self.constants
    }

    /// Recompute the batch key over texture-set identity, material
    /// identity, blend mode and every constant override (name + value) in
    /// current array order, refreshing all shadow values.
    ///
    /// Insertion order is part of the key: identical constant sets added
    /// in different orders may hash differently and land in separate
    /// batches. Known limitation, kept for stable grouping per authoring
    /// order.
    pub fn rehash(&mut self) {
        let resource = &self.resource;
        let mut state = Hash32::new();
        state.update(&resource.rig_scene.texture_set.0.to_le_bytes());
        state.update(&resource.material.id.0.to_le_bytes());
        state.update(&(resource.blend_mode as u32).to_le_bytes());
        for (i, c) in self.constants.iter().enumerate() {
            state.update(&c.name.0.to_le_bytes());
            for component in c.value.iter() {
                state.update(&component.to_le_bytes());
            }
            self.prev_constants[i] = c.value;
        }
        self.mixed_hash = state.finish();
    }

    /// Whether any constant's value drifted from its shadow copy since the
    /// last rehash. Compared as squared length of the difference.
    pub fn constants_dirty(&self) -> bool {
        self.constants
            .iter()
            .zip(self.prev_constants.iter())
            .any(|(c, prev)| (c.value - prev).norm_squared() > 0.0)
    }

    /// Current value of a constant: override if present, else the
    /// material's default.
    pub fn constant_value(&self, name: NameHash) -> Option<Vector4<f32>> {
        self.constants
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
            .or_else(|| self.resource.material.default_constant(name))
    }

    /// Write a constant override, creating the slot from the material's
    /// default when absent. `element` writes one component; otherwise the
    /// whole vector. Always recomputes the batch key.
    pub fn set_constant(
        &mut self,
        name: NameHash,
        value: &PropertyValue,
        element: Option<usize>,
    ) -> Result<(), PropertyError> {
        let slot = match self.constants.iter().position(|c| c.name == name) {
            Some(i) => i,
            None => {
                let default = self
                    .resource
                    .material
                    .default_constant(name)
                    .ok_or(PropertyError::NotFound { name })?;
                if self.constants.len() == self.constants.capacity() {
                    self.constants.reserve_exact(4);
                    self.prev_constants.reserve_exact(4);
                }
                self.constants.push(RenderConstant {
                    name,
                    value: default,
                });
                self.prev_constants.push(default);
                self.constants.len() - 1
            }
        };

        let target = &mut self.constants[slot].value;
        match element {
            None => match value {
                PropertyValue::Vector4(v) => *target = *v,
                _ => return Err(PropertyError::TypeMismatch { name }),
            },
            Some(e) => match value {
                PropertyValue::Number(n) => {
                    if e >= 4 {
                        return Err(PropertyError::UnsupportedValue { name });
                    }
                    target[e] = *n as f32;
                }
                _ => return Err(PropertyError::TypeMismatch { name }),
            },
        }
        self.rehash();
        Ok(())
    }

    /// Remove a constant override. Swap-removal: element order is not
    /// preserved. No-op when absent.
    pub fn reset_constant(&mut self, name: NameHash) {
        if let Some(i) = self.constants.iter().position(|c| c.name == name) {
            self.constants.swap_remove(i);
            self.prev_constants.swap_remove(i);
            self.rehash();
        }
    }

    /// Propagate a freshly solved pose to the mirrored bone hierarchy.
    /// Skipped entirely for an empty pose.
    pub fn apply_pose(&self, scene: &mut dyn SceneGraph, pose: &[Transform]) {
        if pose.is_empty() || self.node_instances.is_empty() {
            return;
        }
        scene.set_bone_transforms(self.node_instances[0], pose);
    }

    /// Route one rig event to its listener.
    ///
    /// Completion goes to the recorded listener, which is cleared
    /// afterwards; at most one completion is ever pending. Keyframe events
    /// go to the listener if set, otherwise back to the component's own
    /// address with no fragment. Delivery failures are logged and dropped.
    pub fn dispatch_event(
        &mut self,
        scene: &dyn SceneGraph,
        event: &RigEvent,
        bus: &mut dyn MessageSender,
    ) {
        match event {
            RigEvent::Completed {
                animation,
                playback,
            } => {
                let sender = match scene.resolve_address(self.node, self.component_index) {
                    Some(s) => s,
                    None => {
                        log::error!(
                            "could not send animation_done to listener because of incomplete component"
                        );
                        return;
                    }
                };
                let receiver = self.listener;
                let result = bus.send(
                    sender,
                    receiver,
                    ModelNotification::AnimationDone {
                        animation: *animation,
                        playback: *playback,
                    },
                );
                self.listener = Address::EMPTY;
                if result.is_err() {
                    log::error!("could not send animation_done to listener");
                }
            }
            RigEvent::Keyframe {
                event_id,
                animation,
                blend_weight,
                t,
                integer,
                float,
                string,
            } => {
                let sender = match scene.resolve_address(self.node, self.component_index) {
                    Some(s) => s,
                    None => return,
                };
                let mut receiver = self.listener;
                if !receiver.is_valid() {
                    receiver = sender;
                    receiver.fragment = NameHash::EMPTY;
                }
                let result = bus.send(
                    sender,
                    receiver,
                    ModelNotification::RigEvent {
                        event_id: *event_id,
                        animation: *animation,
                        blend_weight: *blend_weight,
                        t: *t,
                        integer: *integer,
                        float: *float,
                        string: *string,
                    },
                );
                if result.is_err() {
                    log::error!("could not send rig event to listener");
                }
            }
        }
    }
}
