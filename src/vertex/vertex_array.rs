use crate::buffer::Buffer;
use crate::runtime::state::clear_if_buffer;
use crate::vertex::ComponentType;

/// Describes how the data for a vertex attribute is read from its buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttributePointer {
    pub size: i32,
    pub component_type: ComponentType,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i64,
}

impl Default for AttributePointer {
    fn default() -> Self {
        AttributePointer {
            size: 4,
            component_type: ComponentType::Float,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

#[derive(Clone, Default, Debug)]
pub struct VertexAttribute {
    buffer: Option<Buffer>,
    enabled: bool,
    pointer: AttributePointer,
}

impl VertexAttribute {
    pub fn buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pointer(&self) -> &AttributePointer {
        &self.pointer
    }
}

/// The vertex attribute array state: one slot per vertex attribute plus the element array buffer.
pub struct VertexArray {
    attributes: Vec<VertexAttribute>,
    element_array_buffer: Option<Buffer>,
}

impl VertexArray {
    pub(crate) fn new(max_vertex_attribs: usize) -> Self {
        VertexArray {
            attributes: vec![VertexAttribute::default(); max_vertex_attribs],
            element_array_buffer: None,
        }
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: u32) -> Option<&VertexAttribute> {
        self.attributes.get(index as usize)
    }

    pub fn element_array_buffer(&self) -> Option<&Buffer> {
        self.element_array_buffer.as_ref()
    }

    pub(crate) fn element_array_buffer_mut(&mut self) -> &mut Option<Buffer> {
        &mut self.element_array_buffer
    }

    pub(crate) fn set_attribute_pointer(
        &mut self,
        index: u32,
        buffer: Option<Buffer>,
        pointer: AttributePointer,
    ) {
        let attribute = &mut self.attributes[index as usize];

        attribute.buffer = buffer;
        attribute.pointer = pointer;
    }

    pub(crate) fn set_attribute_enabled(&mut self, index: u32, enabled: bool) {
        self.attributes[index as usize].enabled = enabled;
    }

    /// Detaches `buffer` from the element array binding and from every attribute slot.
    pub(crate) fn clear_buffer(&mut self, buffer: &Buffer) {
        clear_if_buffer(&mut self.element_array_buffer, buffer);

        for attribute in self.attributes.iter_mut() {
            clear_if_buffer(&mut attribute.buffer, buffer);
        }
    }
}
