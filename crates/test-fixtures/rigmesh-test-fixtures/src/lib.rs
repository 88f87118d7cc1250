//! Builders and mock collaborators for rigmesh tests.
//!
//! The mocks implement the model core's collaborator seams (scene graph,
//! rig engine, graphics, message bus) with just enough behavior to drive
//! the component through attach/update/render/message flows, plus failure
//! knobs for the rollback paths.

mod bus;
mod graphics;
mod rig;
mod scene;

pub use bus::RecordingSender;
pub use graphics::MockGraphics;
pub use rig::MockRigEngine;
pub use scene::MockSceneGraph;

use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3, Vector4};
use rigmesh_api_core::{hash_name, Transform};
use rigmesh_model_core::{
    AnimationSetId, BlendMode, Bone, Material, MaterialId, MeshSetId, ModelResource, RigScene,
    Skeleton, TextureSetId,
};

/// A straight chain of `n` bones: bone i is the child of bone i-1, each
/// offset one unit along +X in rest pose.
pub fn skeleton_chain(n: usize) -> Arc<Skeleton> {
    let bones = (0..n)
        .map(|i| Bone {
            parent: if i == 0 { None } else { Some(i - 1) },
            local: Transform::new(
                if i == 0 {
                    Vector3::zeros()
                } else {
                    Vector3::new(1.0, 0.0, 0.0)
                },
                UnitQuaternion::identity(),
            ),
        })
        .collect();
    Arc::new(Skeleton { bones })
}

/// A small branching skeleton: root with two limbs of one bone each.
///
/// ```text
///       0
///      / \
///     1   2
///     |   |
///     3   4
/// ```
pub fn skeleton_tree() -> Arc<Skeleton> {
    let parents = [None, Some(0), Some(0), Some(1), Some(2)];
    let bones = parents
        .iter()
        .map(|p| Bone {
            parent: *p,
            local: Transform::new(Vector3::new(0.0, 1.0, 0.0), UnitQuaternion::identity()),
        })
        .collect();
    Arc::new(Skeleton { bones })
}

/// Rig scene over a skeleton; bind pose mirrors the bones' rest locals.
pub fn rig_scene(skeleton: Arc<Skeleton>) -> Arc<RigScene> {
    let bind_pose = skeleton.bones.iter().map(|b| b.local).collect();
    Arc::new(RigScene {
        texture_set: TextureSetId(100),
        skeleton,
        bind_pose,
        mesh_set: MeshSetId(200),
        animation_set: AnimationSetId(300),
    })
}

/// Material with a single declared constant `tint`, defaulting to white.
pub fn material() -> Arc<Material> {
    Arc::new(Material::new(
        MaterialId(7),
        0b1,
        vec![(hash_name("tint"), Vector4::new(1.0, 1.0, 1.0, 1.0))],
    ))
}

/// Complete model resource over a rig scene: skin `default`, default
/// animation `idle`, alpha blending.
pub fn model_resource(rig_scene: Arc<RigScene>) -> Arc<ModelResource> {
    model_resource_with_blend(rig_scene, BlendMode::Alpha)
}

pub fn model_resource_with_blend(
    rig_scene: Arc<RigScene>,
    blend_mode: BlendMode,
) -> Arc<ModelResource> {
    Arc::new(ModelResource {
        rig_scene,
        material: material(),
        skin: "default".to_string(),
        default_animation: "idle".to_string(),
        blend_mode,
    })
}
