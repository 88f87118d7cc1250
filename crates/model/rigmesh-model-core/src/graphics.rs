//! GPU collaborator seam: vertex buffers, declarations and the draw-call
//! descriptor the batch pass emits.

use nalgebra::{Matrix4, Vector4};
use rigmesh_api_core::NameHash;
use serde::{Deserialize, Serialize};

use crate::resources::{MaterialId, TextureSetId};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DeclarationId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BufferUsage {
    Static,
    Dynamic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
}

/// One element of the vertex layout.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VertexElement {
    pub name: &'static str,
    pub components: u8,
    pub normalized: bool,
}

/// Skinned model vertex: position, texture coordinate, vertex color.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [u8; 4],
}

/// Vertex layout shared by every model batch.
pub fn vertex_layout() -> [VertexElement; 3] {
    [
        VertexElement {
            name: "position",
            components: 3,
            normalized: false,
        },
        VertexElement {
            name: "texcoord0",
            components: 2,
            normalized: true,
        },
        VertexElement {
            name: "color",
            components: 4,
            normalized: true,
        },
    ]
}

/// One draw call covering a contiguous vertex range of the world's shared
/// buffer. Material, texture and blend state come from the first member of
/// the batch; every member shares them by construction of the batch key.
#[derive(Clone, Debug)]
pub struct RenderObject {
    pub declaration: DeclarationId,
    pub buffer: BufferId,
    pub vertex_start: usize,
    pub vertex_count: usize,
    pub material: MaterialId,
    pub texture: TextureSetId,
    pub source_blend: BlendFactor,
    pub dest_blend: BlendFactor,
    pub constants: Vec<(NameHash, Vector4<f32>)>,
    pub world: Matrix4<f32>,
}

pub trait Graphics {
    fn new_vertex_declaration(&mut self, elements: &[VertexElement]) -> DeclarationId;
    fn delete_vertex_declaration(&mut self, declaration: DeclarationId);

    fn new_vertex_buffer(&mut self) -> BufferId;
    fn delete_vertex_buffer(&mut self, buffer: BufferId);

    /// Replace the buffer's contents. An empty slice clears it.
    fn set_vertex_buffer_data(&mut self, buffer: BufferId, data: &[ModelVertex], usage: BufferUsage);
}
