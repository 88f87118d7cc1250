//! Recording GPU stub: tracks buffer contents and every upload.

use hashbrown::HashMap;
use rigmesh_model_core::{
    BufferId, BufferUsage, DeclarationId, Graphics, ModelVertex, VertexElement,
};

#[derive(Default)]
pub struct MockGraphics {
    next: u32,
    buffers: HashMap<BufferId, Vec<ModelVertex>>,
    declarations: Vec<DeclarationId>,
    /// Every `set_vertex_buffer_data` call: buffer, vertex count, usage.
    pub uploads: Vec<(BufferId, usize, BufferUsage)>,
}

impl MockGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self, buffer: BufferId) -> Option<&[ModelVertex]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn last_upload(&self) -> Option<&(BufferId, usize, BufferUsage)> {
        self.uploads.last()
    }
}

impl Graphics for MockGraphics {
    fn new_vertex_declaration(&mut self, _elements: &[VertexElement]) -> DeclarationId {
        self.next += 1;
        let id = DeclarationId(self.next);
        self.declarations.push(id);
        id
    }

    fn delete_vertex_declaration(&mut self, declaration: DeclarationId) {
        self.declarations.retain(|d| *d != declaration);
    }

    fn new_vertex_buffer(&mut self) -> BufferId {
        self.next += 1;
        let id = BufferId(self.next);
        self.buffers.insert(id, Vec::new());
        id
    }

    fn delete_vertex_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn set_vertex_buffer_data(&mut self, buffer: BufferId, data: &[ModelVertex], usage: BufferUsage) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            contents.clear();
            contents.extend_from_slice(data);
        }
        self.uploads.push((buffer, data.len(), usage));
    }
}
