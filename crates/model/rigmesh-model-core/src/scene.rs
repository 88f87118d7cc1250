//! Scene-graph collaborator seam.
//!
//! The scene graph owns node storage, hierarchy and world transforms; this
//! core drives it through the trait below. Implementations live in the host
//! engine (a mock ships in rigmesh-test-fixtures).

use nalgebra::{UnitQuaternion, Vector3};
use rigmesh_api_core::{NameHash, Transform};
use serde::{Deserialize, Serialize};

use crate::messages::Address;

/// Opaque scene node handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SceneError {
    #[error("identifier already in use: {id:?}")]
    DuplicateIdentifier { id: NameHash },

    #[error("unknown node: {node:?}")]
    UnknownNode { node: NodeId },
}

pub trait SceneGraph {
    /// Create a new unparented node, `None` when the scene is out of nodes.
    fn new_node(&mut self) -> Option<NodeId>;

    /// Delete a node. Deleting an already-removed node is a no-op.
    fn delete_node(&mut self, node: NodeId);

    /// Reserve a stable instance index, `None` when exhausted.
    fn acquire_instance_index(&mut self) -> Option<u32>;

    /// Build the stable identifier corresponding to an acquired index.
    fn construct_instance_id(&self, index: u32) -> NameHash;

    fn set_identifier(&mut self, node: NodeId, id: NameHash) -> Result<(), SceneError>;

    /// Mark a node as a bone node. Bone nodes cannot be deleted by ordinary
    /// scene operations, only through [`delete_bones`](Self::delete_bones)
    /// or an explicit [`delete_node`](Self::delete_node) from this core.
    fn set_bone(&mut self, node: NodeId, bone: bool);

    fn set_position(&mut self, node: NodeId, position: Vector3<f32>);
    fn set_rotation(&mut self, node: NodeId, rotation: UnitQuaternion<f32>);
    fn set_scale(&mut self, node: NodeId, scale: Vector3<f32>);

    /// Attach `node` under `parent`. Insertion prepends into the parent's
    /// child list, which is why bone parenting runs in reverse bone order.
    fn set_parent(&mut self, node: NodeId, parent: NodeId);

    fn world_transform(&self, node: NodeId) -> Transform;
    fn world_position(&self, node: NodeId) -> Vector3<f32>;

    /// Whether this node's world composition scales along its forward axis.
    fn scale_along_z(&self, node: NodeId) -> bool;

    /// Apply a solved pose to the bone hierarchy rooted at `root`; entry
    /// *i* of `pose` lands on the node mirroring bone *i*.
    fn set_bone_transforms(&mut self, root: NodeId, pose: &[Transform]);

    /// Delete every bone node in the hierarchy under `owner`.
    fn delete_bones(&mut self, owner: NodeId);

    fn node_from_identifier(&self, id: NameHash) -> Option<NodeId>;

    /// Message address of a component on `node`, `None` when the node's
    /// collection socket or component id cannot be resolved.
    fn resolve_address(&self, node: NodeId, component_index: u8) -> Option<Address>;
}
