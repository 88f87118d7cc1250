//! In-memory scene graph with child-prepending insertion and failure knobs
//! for node/identifier exhaustion.

use hashbrown::HashMap;
use nalgebra::{UnitQuaternion, Vector3};
use rigmesh_api_core::{hash_name, NameHash, Transform};
use rigmesh_model_core::{Address, NodeId, SceneError, SceneGraph};

#[derive(Clone, Debug)]
struct NodeState {
    local: Transform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bone: bool,
    identifier: Option<NameHash>,
    scale_along_z: bool,
}

impl NodeState {
    fn new() -> Self {
        Self {
            local: Transform::identity(),
            parent: None,
            children: Vec::new(),
            bone: false,
            identifier: None,
            scale_along_z: true,
        }
    }
}

#[derive(Default)]
pub struct MockSceneGraph {
    nodes: HashMap<NodeId, NodeState>,
    identifiers: HashMap<NameHash, NodeId>,
    next_node: u64,
    next_instance_index: u32,
    socket: NameHash,
    /// Remaining successful node allocations; `None` means unlimited.
    pub node_budget: Option<usize>,
    /// Remaining successful instance-index acquisitions.
    pub index_budget: Option<usize>,
    /// When set, `resolve_address` fails (incomplete component path).
    pub fail_addresses: bool,
    /// Last pose handed to `set_bone_transforms`, by root node.
    pub applied_poses: HashMap<NodeId, Vec<Transform>>,
}

impl MockSceneGraph {
    pub fn new() -> Self {
        Self {
            socket: hash_name("main"),
            ..Default::default()
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn bone_node_count(&self) -> usize {
        self.nodes.values().filter(|n| n.bone).count()
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn local_transform(&self, node: NodeId) -> Transform {
        self.nodes
            .get(&node)
            .map(|n| n.local)
            .unwrap_or_else(Transform::identity)
    }

    pub fn set_local_transform(&mut self, node: NodeId, local: Transform) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.local = local;
        }
    }

    pub fn set_scale_along_z(&mut self, node: NodeId, value: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.scale_along_z = value;
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(state) = self.nodes.remove(&node) {
            if let Some(id) = state.identifier {
                self.identifiers.remove(&id);
            }
            if let Some(parent) = state.parent {
                if let Some(p) = self.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != node);
                }
            }
        }
    }

    fn collect_bone_descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if self.nodes.get(&child).map(|n| n.bone).unwrap_or(false) {
                out.push(child);
            }
            self.collect_bone_descendants(child, out);
        }
    }
}

impl SceneGraph for MockSceneGraph {
    fn new_node(&mut self) -> Option<NodeId> {
        if let Some(budget) = self.node_budget.as_mut() {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        self.next_node += 1;
        let node = NodeId(self.next_node);
        self.nodes.insert(node, NodeState::new());
        Some(node)
    }

    fn delete_node(&mut self, node: NodeId) {
        self.remove_node(node);
    }

    fn acquire_instance_index(&mut self) -> Option<u32> {
        if let Some(budget) = self.index_budget.as_mut() {
            if *budget == 0 {
                return None;
            }
            *budget -= 1;
        }
        self.next_instance_index += 1;
        Some(self.next_instance_index)
    }

    fn construct_instance_id(&self, index: u32) -> NameHash {
        hash_name(&format!("bone{index}"))
    }

    fn set_identifier(&mut self, node: NodeId, id: NameHash) -> Result<(), SceneError> {
        if self.identifiers.contains_key(&id) {
            return Err(SceneError::DuplicateIdentifier { id });
        }
        match self.nodes.get_mut(&node) {
            Some(state) => {
                state.identifier = Some(id);
                self.identifiers.insert(id, node);
                Ok(())
            }
            None => Err(SceneError::UnknownNode { node }),
        }
    }

    fn set_bone(&mut self, node: NodeId, bone: bool) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.bone = bone;
        }
    }

    fn set_position(&mut self, node: NodeId, position: Vector3<f32>) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.local.translation = position;
        }
    }

    fn set_rotation(&mut self, node: NodeId, rotation: UnitQuaternion<f32>) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.local.rotation = rotation;
        }
    }

    fn set_scale(&mut self, node: NodeId, scale: Vector3<f32>) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.local.scale = scale;
        }
    }

    fn set_parent(&mut self, node: NodeId, parent: NodeId) {
        if let Some(state) = self.nodes.get_mut(&node) {
            state.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            // Child insertion prepends.
            p.children.insert(0, node);
        }
    }

    fn world_transform(&self, node: NodeId) -> Transform {
        let Some(state) = self.nodes.get(&node) else {
            return Transform::identity();
        };
        match state.parent {
            Some(parent) => self.world_transform(parent).mul(&state.local),
            None => state.local,
        }
    }

    fn world_position(&self, node: NodeId) -> Vector3<f32> {
        self.world_transform(node).translation
    }

    fn scale_along_z(&self, node: NodeId) -> bool {
        self.nodes.get(&node).map(|n| n.scale_along_z).unwrap_or(true)
    }

    fn set_bone_transforms(&mut self, root: NodeId, pose: &[Transform]) {
        self.applied_poses.insert(root, pose.to_vec());
        if let Some(state) = self.nodes.get_mut(&root) {
            if let Some(first) = pose.first() {
                state.local = *first;
            }
        }
    }

    fn delete_bones(&mut self, owner: NodeId) {
        let mut bones = Vec::new();
        self.collect_bone_descendants(owner, &mut bones);
        for node in bones {
            self.remove_node(node);
        }
    }

    fn node_from_identifier(&self, id: NameHash) -> Option<NodeId> {
        self.identifiers.get(&id).copied()
    }

    fn resolve_address(&self, node: NodeId, component_index: u8) -> Option<Address> {
        if self.fail_addresses {
            return None;
        }
        let path = self
            .nodes
            .get(&node)
            .and_then(|n| n.identifier)
            .unwrap_or_else(|| hash_name(&format!("node{}", node.0)));
        Some(Address {
            socket: self.socket,
            path,
            fragment: hash_name(&format!("component{component_index}")),
        })
    }
}
