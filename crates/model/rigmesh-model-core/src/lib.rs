//! rigmesh-model-core (engine-agnostic)
//!
//! A skeletal-animation scene component: binds a rig (skeleton + mesh +
//! animation set) to a scene-graph node, mirrors the skeleton as a
//! hierarchy of addressable bone nodes, applies per-frame poses, and packs
//! render-compatible instances into batched draw calls keyed by a content
//! hash. External collaborators (scene graph, rig engine, GPU, resource
//! system, message bus) are trait seams implemented by the host.

pub mod component;
pub mod config;
pub mod error;
pub mod graphics;
pub mod messages;
pub mod properties;
pub mod render_list;
pub mod resources;
pub mod rig;
pub mod scene;
pub mod world;

// Re-exports for consumers (adapters)
pub use component::{ModelComponent, RenderConstant};
pub use config::WorldConfig;
pub use error::{MessageError, ModelError, PropertyError, RigError};
pub use graphics::{
    vertex_layout, BlendFactor, BufferId, BufferUsage, DeclarationId, Graphics, ModelVertex,
    RenderObject, VertexElement,
};
pub use messages::{Address, MessageSender, ModelMessage, ModelNotification, Playback};
pub use properties::PropertyValue;
pub use render_list::{blend_factors, group_ranges, sort_entries, RenderEntry};
pub use resources::{
    AnimationSetId, BlendMode, Bone, Material, MaterialId, MeshSetId, ModelResource, RigScene,
    Skeleton, TextureSetId,
};
pub use rig::{
    IkSource, RigEngine, RigEvent, RigInstanceId, RigInstanceParams, RigPlayback,
};
pub use scene::{NodeId, SceneError, SceneGraph};
pub use world::{InstanceIndex, ModelWorld};
pub use rigmesh_api_core::{hash_name, Hash32, NameHash, Transform};
