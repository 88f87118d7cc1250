//! The model world: a fixed-capacity pool of component instances for one
//! scene partition, plus the shared vertex staging area and GPU buffer the
//! render batching pass reuses every frame.
//!
//! Hot-reload: the host's resource system is expected to route its
//! (old, new) reload notifications into
//! [`handle_resource_reload`](ModelWorld::handle_resource_reload); the
//! world re-resolves only instances whose rig scene matches.

use std::sync::Arc;

use rigmesh_api_core::{hash_name, NameHash, Transform};

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::component::ModelComponent;
use crate::config::WorldConfig;
use crate::error::{ModelError, PropertyError};
use crate::graphics::{vertex_layout, BufferId, BufferUsage, DeclarationId, Graphics, ModelVertex, RenderObject};
use crate::messages::{Address, MessageSender, ModelMessage};
use crate::properties::{
    prop_animation, prop_cursor, prop_playback_rate, prop_skin, PropertyValue,
};
use crate::render_list::{blend_factors, group_ranges, RenderEntry};
use crate::resources::{ModelResource, RigScene};
use crate::rig::{IkSource, RigEngine, RigInstanceParams, RigPlayback};
use crate::scene::{NodeId, SceneGraph};

/// Index of a component slot within its world.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InstanceIndex(pub u32);

pub struct ModelWorld {
    config: WorldConfig,
    slots: Vec<Option<ModelComponent>>,
    free: Vec<u32>,
    declaration: DeclarationId,
    vertex_buffer: BufferId,
    /// Shared staging area, cleared at the start of every batching pass and
    /// uploaded once at its end.
    vertex_data: Vec<ModelVertex>,
    render_objects: Vec<RenderObject>,
    scratch_nodes: Vec<NodeId>,
}

fn rig_params(resource: &ModelResource) -> RigInstanceParams {
    let rig_scene = &resource.rig_scene;
    RigInstanceParams {
        skeleton: rig_scene.skeleton.clone(),
        bind_pose: rig_scene.bind_pose.clone(),
        mesh_set: rig_scene.mesh_set,
        animation_set: rig_scene.animation_set,
        mesh: hash_name(&resource.skin),
        default_animation: hash_name(&resource.default_animation),
    }
}

impl ModelWorld {
    pub fn new(config: WorldConfig, graphics: &mut dyn Graphics) -> Self {
        let capacity = config.max_model_count;
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        let declaration = graphics.new_vertex_declaration(&vertex_layout());
        let vertex_buffer = graphics.new_vertex_buffer();
        Self {
            config,
            slots,
            free: (0..capacity as u32).rev().collect(),
            declaration,
            vertex_buffer,
            // Assume 4 vertices per mesh for the initial staging capacity.
            vertex_data: Vec::with_capacity(4 * capacity),
            render_objects: Vec::with_capacity(capacity),
            scratch_nodes: Vec::new(),
        }
    }

    /// Release the world's GPU-side objects. Component slots are implicitly
    /// invalid afterwards.
    pub fn destroy_world(&mut self, graphics: &mut dyn Graphics) {
        graphics.delete_vertex_declaration(self.declaration);
        graphics.delete_vertex_buffer(self.vertex_buffer);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.max_model_count
    }

    pub fn live_count(&self) -> usize {
        self.capacity() - self.free.len()
    }

    pub fn component(&self, index: InstanceIndex) -> Option<&ModelComponent> {
        self.slots.get(index.0 as usize).and_then(Option::as_ref)
    }

    pub fn component_mut(&mut self, index: InstanceIndex) -> Option<&mut ModelComponent> {
        self.slots.get_mut(index.0 as usize).and_then(Option::as_mut)
    }

    /// Attach a model component to `node`. Allocates a pool slot, creates
    /// the rig instance, computes the initial batch key and mirrors the
    /// skeleton as bone nodes. Any failure rolls the slot back completely.
    pub fn create(
        &mut self,
        node: NodeId,
        resource: Arc<ModelResource>,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        component_index: u8,
        scene: &mut dyn SceneGraph,
        rig: &mut dyn RigEngine,
    ) -> Result<InstanceIndex, ModelError> {
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                let capacity = self.capacity();
                log::error!(
                    "model could not be created since the component buffer is full ({capacity})"
                );
                return Err(ModelError::WorldFull { capacity });
            }
        };

        let mut component = ModelComponent::new(
            node,
            component_index,
            Transform::new(position, rotation),
            resource,
        );

        match rig.create_instance(rig_params(&component.resource)) {
            Ok(id) => component.rig_instance = Some(id),
            Err(err) => {
                self.free.push(index);
                log::error!("failed to create a rig instance needed by the model: {err}");
                return Err(err.into());
            }
        }

        component.rehash();
        self.slots[index as usize] = Some(component);

        if let Err(err) = self.synthesize_bones(index, scene) {
            log::error!("{err}");
            self.destroy(InstanceIndex(index), scene, rig);
            return Err(err);
        }

        Ok(InstanceIndex(index))
    }

    /// Mirror the component's skeleton as one bone node per bone.
    ///
    /// First pass creates nodes in skeleton order with fresh stable
    /// identifiers and bind-pose transforms (bone 0 pre-composed with the
    /// component's local offset). Second pass parents in reverse order:
    /// child insertion prepends into the parent's child list, so parenting
    /// leaves-first keeps enumeration order stable for traversal.
    fn synthesize_bones(
        &mut self,
        index: u32,
        scene: &mut dyn SceneGraph,
    ) -> Result<(), ModelError> {
        let mut scratch = std::mem::take(&mut self.scratch_nodes);
        let result = match self.slots[index as usize].as_mut() {
            Some(component) => Self::synthesize_bones_inner(component, &mut scratch, scene),
            None => Err(ModelError::InvalidIndex { index }),
        };
        self.scratch_nodes = scratch;
        result
    }

    fn synthesize_bones_inner(
        component: &mut ModelComponent,
        scratch: &mut Vec<NodeId>,
        scene: &mut dyn SceneGraph,
    ) -> Result<(), ModelError> {
        let rig_scene = component.resource.rig_scene.clone();
        let skeleton = &rig_scene.skeleton;
        let bind_pose = &rig_scene.bind_pose;
        let bone_count = skeleton.bone_count();

        component.node_instances.clear();
        component.node_instances.reserve(bone_count);
        scratch.clear();
        scratch.reserve(bone_count);

        for i in 0..bone_count {
            let node = match scene.new_node() {
                Some(n) => n,
                None => {
                    return Err(ModelError::BoneSynthesis {
                        created: i,
                        total: bone_count,
                    })
                }
            };
            let instance_index = match scene.acquire_instance_index() {
                Some(x) => x,
                None => {
                    scene.delete_node(node);
                    return Err(ModelError::BoneSynthesis {
                        created: i,
                        total: bone_count,
                    });
                }
            };
            let id = scene.construct_instance_id(instance_index);
            if scene.set_identifier(node, id).is_err() {
                scene.delete_node(node);
                return Err(ModelError::BoneSynthesis {
                    created: i,
                    total: bone_count,
                });
            }
            scene.set_bone(node, true);

            let mut transform = bind_pose[i];
            if i == 0 {
                transform = component.local.mul(&transform);
            }
            scene.set_position(node, transform.translation);
            scene.set_rotation(node, transform.rotation);
            scene.set_scale(node, transform.scale);

            component.node_instances.push(node);
            scratch.push(node);
        }

        // Parent in reverse to account for child-prepending insertion.
        for i in (0..bone_count).rev() {
            let parent = match skeleton.bones[i].parent {
                Some(p) if i > 0 => scratch[p],
                _ => component.node,
            };
            scene.set_parent(scratch[i], parent);
        }

        Ok(())
    }

    /// Detach and tear down a component: bone nodes first (delegated to
    /// the scene graph), then the rig instance, then the pool slot.
    pub fn destroy(
        &mut self,
        index: InstanceIndex,
        scene: &mut dyn SceneGraph,
        rig: &mut dyn RigEngine,
    ) {
        let taken = self
            .slots
            .get_mut(index.0 as usize)
            .and_then(|slot| slot.take());
        let Some(mut component) = taken else {
            return;
        };
        scene.delete_bones(component.node);
        // A failed synthesis leaves unparented nodes delete_bones cannot
        // reach; the component still lists them.
        for node in component.node_instances.drain(..) {
            scene.delete_node(node);
        }
        if let Some(rig_id) = component.rig_instance.take() {
            rig.destroy_instance(rig_id);
        }
        self.free.push(index.0);
    }

    /// Promote an attached instance into per-frame update/render. Until
    /// promoted an attached instance is inert.
    pub fn add_to_update(&mut self, index: InstanceIndex) {
        if let Some(component) = self.component_mut(index) {
            component.added_to_update = true;
        }
    }

    /// Per-frame update: refresh batch keys whose constants drifted and
    /// mark render eligibility.
    pub fn update(&mut self) {
        for component in self.slots.iter_mut().flatten() {
            component.do_render = false;
            if !component.enabled || !component.added_to_update {
                continue;
            }
            if component.constants_dirty() {
                component.rehash();
            }
            component.do_render = true;
        }
    }

    /// Apply poses and forward rig events for every live instance. Runs
    /// after rig evaluation and strictly before the transform/batch pass.
    pub fn post_update(
        &mut self,
        scene: &mut dyn SceneGraph,
        rig: &mut dyn RigEngine,
        bus: &mut dyn MessageSender,
    ) {
        for component in self.slots.iter_mut().flatten() {
            let Some(rig_id) = component.rig_instance else {
                continue;
            };
            if !component.enabled {
                continue;
            }
            component.apply_pose(scene, rig.pose(rig_id));
            for event in rig.drain_events(rig_id) {
                component.dispatch_event(scene, &event, bus);
            }
        }
    }

    /// Recompute every active, promoted instance's world transform from
    /// its owning node, suppressing forward-axis scale when the owner is
    /// configured that way.
    pub fn update_transforms(&mut self, scene: &dyn SceneGraph, rig: &dyn RigEngine) {
        for component in self.slots.iter_mut().flatten() {
            if !component.enabled || !component.added_to_update {
                continue;
            }
            let Some(rig_id) = component.rig_instance else {
                continue;
            };
            if !rig.is_valid(rig_id) {
                continue;
            }
            let owner = scene.world_transform(component.node);
            component.world = if scene.scale_along_z(component.node) {
                owner.mul(&component.local)
            } else {
                owner.mul_no_scale_z(&component.local)
            };
        }
    }

    /// Build this frame's render list: one entry per eligible instance,
    /// keyed by batch hash. Transforms are refreshed first.
    pub fn render(&mut self, scene: &dyn SceneGraph, rig: &dyn RigEngine) -> Vec<RenderEntry> {
        self.update_transforms(scene, rig);

        let mut entries = Vec::with_capacity(self.live_count());
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(component) = slot else {
                continue;
            };
            if !component.do_render || !component.enabled {
                continue;
            }
            entries.push(RenderEntry {
                world_position: component.world.translation,
                instance: InstanceIndex(i as u32),
                batch_key: component.mixed_hash,
                tag_mask: component.resource.material.tag_mask,
            });
        }
        entries
    }

    /// Batch pass over sorted render entries: clears the staging area,
    /// emits one draw call per contiguous batch-key group, then uploads
    /// the packed vertices once as a static transfer.
    pub fn dispatch(
        &mut self,
        entries: &[RenderEntry],
        rig: &dyn RigEngine,
        graphics: &mut dyn Graphics,
    ) -> &[RenderObject] {
        graphics.set_vertex_buffer_data(self.vertex_buffer, &[], BufferUsage::Dynamic);
        self.render_objects.clear();
        self.vertex_data.clear();

        for range in group_ranges(entries) {
            self.dispatch_batch(&entries[range], rig);
        }

        graphics.set_vertex_buffer_data(self.vertex_buffer, &self.vertex_data, BufferUsage::Static);
        &self.render_objects
    }

    fn dispatch_batch(&mut self, group: &[RenderEntry], rig: &dyn RigEngine) {
        let Some(first) = group
            .first()
            .and_then(|e| self.slots[e.instance.0 as usize].as_ref())
        else {
            return;
        };
        let resource = first.resource.clone();
        let first_world = first.world.to_matrix();
        let constants = first
            .constants()
            .iter()
            .map(|c| (c.name, c.value))
            .collect();

        let mut required = 0;
        for entry in group {
            if let Some(rig_id) = self.slots[entry.instance.0 as usize]
                .as_ref()
                .and_then(|c| c.rig_instance)
            {
                required += rig.vertex_count(rig_id);
            }
        }
        self.vertex_data.reserve(required);

        let vertex_start = self.vertex_data.len();
        for entry in group {
            let Some(component) = self.slots[entry.instance.0 as usize].as_ref() else {
                continue;
            };
            let Some(rig_id) = component.rig_instance else {
                continue;
            };
            let world = component.world.to_matrix();
            rig.generate_vertex_data(rig_id, &world, &mut self.vertex_data);
        }

        let (source_blend, dest_blend) = blend_factors(resource.blend_mode);
        self.render_objects.push(RenderObject {
            declaration: self.declaration,
            buffer: self.vertex_buffer,
            vertex_start,
            vertex_count: self.vertex_data.len() - vertex_start,
            material: resource.material.id,
            texture: resource.rig_scene.texture_set,
            source_blend,
            dest_blend,
            constants,
            world: first_world,
        });
    }

    /// Resolve registered IK targets into rig local space. A vanished
    /// target node logs and drops the constraint's influence.
    pub fn resolve_ik_targets(&self, scene: &dyn SceneGraph, rig: &mut dyn RigEngine) {
        for component in self.slots.iter().flatten() {
            let Some(rig_id) = component.rig_instance else {
                continue;
            };
            if !component.enabled {
                continue;
            }
            let targets = rig.ik_targets(rig_id);
            if targets.is_empty() {
                continue;
            }
            let to_local = scene
                .world_transform(component.node)
                .mul(&component.local)
                .inverse();
            for (constraint, source) in targets {
                let world_pos = match source {
                    IkSource::Node(ident) => match scene.node_from_identifier(ident) {
                        Some(n) => scene.world_position(n),
                        None => {
                            log::error!(
                                "could not get IK position for target {ident:?}, removed?"
                            );
                            rig.clear_ik_target(rig_id, constraint);
                            continue;
                        }
                    },
                    IkSource::Position(p) => p,
                };
                rig.set_ik_position(rig_id, constraint, to_local.apply_point(world_pos));
            }
        }
    }

    pub fn set_ik_target_node(
        &self,
        index: InstanceIndex,
        rig: &mut dyn RigEngine,
        constraint: NameHash,
        mix: f32,
        target: NameHash,
    ) -> bool {
        match self.component(index).and_then(|c| c.rig_instance) {
            Some(rig_id) => rig.set_ik_target(rig_id, constraint, mix, IkSource::Node(target)),
            None => false,
        }
    }

    pub fn set_ik_target_position(
        &self,
        index: InstanceIndex,
        rig: &mut dyn RigEngine,
        constraint: NameHash,
        mix: f32,
        position: Vector3<f32>,
    ) -> bool {
        match self.component(index).and_then(|c| c.rig_instance) {
            Some(rig_id) => rig.set_ik_target(rig_id, constraint, mix, IkSource::Position(position)),
            None => false,
        }
    }

    /// Handle one inbound control message. Failures on this path are
    /// logged and dropped; callers get no result back.
    pub fn on_message(
        &mut self,
        index: InstanceIndex,
        message: &ModelMessage,
        sender: Address,
        receiver: Address,
        rig: &mut dyn RigEngine,
    ) {
        let Some(component) = self
            .slots
            .get_mut(index.0 as usize)
            .and_then(Option::as_mut)
        else {
            return;
        };
        let Some(rig_id) = component.rig_instance else {
            return;
        };
        match message {
            ModelMessage::Enable => {
                component.enabled = true;
                rig.set_enabled(rig_id, true);
            }
            ModelMessage::Disable => {
                component.enabled = false;
                rig.set_enabled(rig_id, false);
            }
            ModelMessage::PlayAnimation {
                animation,
                playback,
                blend_duration,
                offset,
                playback_rate,
            } => {
                if rig
                    .play_animation(
                        rig_id,
                        *animation,
                        RigPlayback::from_playback(*playback),
                        *blend_duration,
                        *offset,
                        *playback_rate,
                    )
                    .is_ok()
                {
                    // Only one completion is ever owed; a previous listener
                    // is overwritten without being notified.
                    component.listener = sender;
                }
            }
            ModelMessage::CancelAnimation => rig.cancel_animation(rig_id),
            ModelMessage::SetConstant {
                name,
                value,
                element,
            } => {
                let result = match element {
                    None => component.set_constant(*name, &PropertyValue::Vector4(*value), None),
                    Some(e) if *e < 4 => component.set_constant(
                        *name,
                        &PropertyValue::Number(f64::from(value[*e])),
                        Some(*e),
                    ),
                    Some(_) => Err(PropertyError::UnsupportedValue { name: *name }),
                };
                match result {
                    Err(PropertyError::NotFound { .. }) => {
                        log::error!(
                            "'{:?}:{:?}#{:?}' has no constant named {:?}",
                            receiver.socket,
                            receiver.path,
                            receiver.fragment,
                            name
                        );
                    }
                    Err(err) => log::error!("set_constant failed: {err}"),
                    Ok(()) => {}
                }
            }
            ModelMessage::ResetConstant { name } => component.reset_constant(*name),
        }
    }

    /// Get one of the virtual properties (skin, animation, cursor,
    /// playback_rate) or fall through to the material-constant path.
    pub fn get_property(
        &self,
        index: InstanceIndex,
        property: NameHash,
        rig: &dyn RigEngine,
    ) -> Result<PropertyValue, PropertyError> {
        let component = self
            .component(index)
            .ok_or(PropertyError::NotFound { name: property })?;
        let rig_id = component
            .rig_instance
            .ok_or(PropertyError::NotFound { name: property })?;

        if property == prop_skin() {
            return Ok(PropertyValue::Hash(rig.mesh(rig_id)));
        }
        if property == prop_animation() {
            return Ok(PropertyValue::Hash(rig.animation(rig_id)));
        }
        if property == prop_cursor() {
            return Ok(PropertyValue::Number(f64::from(rig.cursor(rig_id))));
        }
        if property == prop_playback_rate() {
            return Ok(PropertyValue::Number(f64::from(rig.playback_rate(rig_id))));
        }
        component
            .constant_value(property)
            .map(PropertyValue::Vector4)
            .ok_or(PropertyError::NotFound { name: property })
    }

    /// Set a virtual property or fall through to the material-constant
    /// path. Rig rejections surface as `UnsupportedValue`.
    pub fn set_property(
        &mut self,
        index: InstanceIndex,
        property: NameHash,
        value: &PropertyValue,
        rig: &mut dyn RigEngine,
    ) -> Result<(), PropertyError> {
        let component = self
            .slots
            .get_mut(index.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(PropertyError::NotFound { name: property })?;
        let rig_id = component
            .rig_instance
            .ok_or(PropertyError::NotFound { name: property })?;

        if property == prop_skin() {
            let PropertyValue::Hash(skin) = value else {
                return Err(PropertyError::TypeMismatch { name: property });
            };
            return rig.set_mesh(rig_id, *skin).map_err(|_| {
                log::error!("could not find skin {skin:?} on the model");
                PropertyError::UnsupportedValue { name: property }
            });
        }
        if property == prop_cursor() {
            let PropertyValue::Number(cursor) = value else {
                return Err(PropertyError::TypeMismatch { name: property });
            };
            return rig.set_cursor(rig_id, *cursor as f32).map_err(|_| {
                log::error!("could not set cursor {cursor} on the model");
                PropertyError::UnsupportedValue { name: property }
            });
        }
        if property == prop_playback_rate() {
            let PropertyValue::Number(rate) = value else {
                return Err(PropertyError::TypeMismatch { name: property });
            };
            return rig.set_playback_rate(rig_id, *rate as f32).map_err(|_| {
                log::error!("could not set playback rate {rate} on the model");
                PropertyError::UnsupportedValue { name: property }
            });
        }
        component.set_constant(property, value, None)
    }

    /// Swap in a reloaded resource: atomically replace the rig instance
    /// and rebuild the bone hierarchy. Failure destroys the component
    /// rather than leaving a partial mirror.
    pub fn on_reload(
        &mut self,
        index: InstanceIndex,
        resource: Arc<ModelResource>,
        scene: &mut dyn SceneGraph,
        rig: &mut dyn RigEngine,
    ) -> Result<(), ModelError> {
        {
            let component = self
                .slots
                .get_mut(index.0 as usize)
                .and_then(Option::as_mut)
                .ok_or(ModelError::InvalidIndex { index: index.0 })?;
            component.resource = resource;

            if let Some(old) = component.rig_instance.take() {
                rig.destroy_instance(old);
            }
            match rig.create_instance(rig_params(&component.resource)) {
                Ok(id) => component.rig_instance = Some(id),
                Err(err) => {
                    log::error!("failed to create a rig instance needed by the model: {err}");
                    self.destroy(index, scene, rig);
                    return Err(err.into());
                }
            }
            component.rehash();

            scene.delete_bones(component.node);
            component.node_instances.clear();
        }

        if let Err(err) = self.synthesize_bones(index.0, scene) {
            log::error!("{err}");
            self.destroy(index, scene, rig);
            return Err(err);
        }
        Ok(())
    }

    /// Resource-system hot-reload entry point: re-resolve every instance
    /// whose rig scene identity matches the reloaded one.
    pub fn handle_resource_reload(
        &mut self,
        reloaded: &Arc<RigScene>,
        fresh: &Arc<ModelResource>,
        scene: &mut dyn SceneGraph,
        rig: &mut dyn RigEngine,
    ) {
        let matching: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()
                    .filter(|c| Arc::ptr_eq(&c.resource.rig_scene, reloaded))
                    .map(|_| i as u32)
            })
            .collect();
        for index in matching {
            let _ = self.on_reload(InstanceIndex(index), fresh.clone(), scene, rig);
        }
    }
}
