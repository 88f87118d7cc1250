//! Immutable resource descriptions shared by model components.
//!
//! Resources are owned by the external resource system and shared read-only
//! into this core via `Arc`. Identity (for batching and hot-reload matching)
//! is the id newtypes plus `Arc` pointer identity for the rig scene.

use std::sync::Arc;

use rigmesh_api_core::Transform;
use serde::{Deserialize, Serialize};

use rigmesh_api_core::NameHash;

use nalgebra::Vector4;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextureSetId(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MeshSetId(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimationSetId(pub u64);

/// One skeleton bone. Parent indices are strictly less than the bone's own
/// index, so the bone array is a topologically ordered tree.
#[derive(Clone, Debug)]
pub struct Bone {
    pub parent: Option<usize>,
    /// Rest-pose transform relative to the parent bone.
    pub local: Transform,
}

#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

/// Skeleton + mesh + animation bundle a rig instance is created against.
#[derive(Clone, Debug)]
pub struct RigScene {
    pub texture_set: TextureSetId,
    pub skeleton: Arc<Skeleton>,
    /// Rest-pose local-to-parent transform per bone, index-aligned with
    /// the skeleton's bone array.
    pub bind_pose: Vec<Transform>,
    pub mesh_set: MeshSetId,
    pub animation_set: AnimationSetId,
}

/// Material description: identity, render-tag mask and the default values
/// for its declared constants.
#[derive(Clone, Debug)]
pub struct Material {
    pub id: MaterialId,
    pub tag_mask: u32,
    constants: Vec<(NameHash, Vector4<f32>)>,
}

impl Material {
    pub fn new(id: MaterialId, tag_mask: u32, constants: Vec<(NameHash, Vector4<f32>)>) -> Self {
        Self {
            id,
            tag_mask,
            constants,
        }
    }

    /// Default value for a declared constant, `None` for unknown names.
    pub fn default_constant(&self, name: NameHash) -> Option<Vector4<f32>> {
        self.constants
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

/// How a batch blends into the target. `Unknown` models data corruption and
/// is a fatal configuration error when it reaches the render pass.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BlendMode {
    Alpha = 0,
    Add = 1,
    Mult = 2,
    Unknown = 3,
}

/// Complete immutable description of one model component's bindings.
#[derive(Clone, Debug)]
pub struct ModelResource {
    pub rig_scene: Arc<RigScene>,
    pub material: Arc<Material>,
    /// Default mesh selection within the mesh set.
    pub skin: String,
    pub default_animation: String,
    pub blend_mode: BlendMode,
}
