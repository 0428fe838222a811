//! The transform feedback recording state.

use web_sys::WebGl2RenderingContext as Gl;

use crate::buffer::Buffer;
use crate::driver::Driver;
use crate::error::GlError;
use crate::runtime::state::{clear_if_buffer, IndexedBufferBinding};

/// The kind of primitives recorded by an active transform feedback operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrimitiveMode {
    Points,
    Lines,
    Triangles,
}

impl PrimitiveMode {
    pub fn gl_id(&self) -> u32 {
        match self {
            PrimitiveMode::Points => Gl::POINTS,
            PrimitiveMode::Lines => Gl::LINES,
            PrimitiveMode::Triangles => Gl::TRIANGLES,
        }
    }

    pub fn from_gl_id(id: u32) -> Option<Self> {
        match id {
            Gl::POINTS => Some(PrimitiveMode::Points),
            Gl::LINES => Some(PrimitiveMode::Lines),
            Gl::TRIANGLES => Some(PrimitiveMode::Triangles),
            _ => None,
        }
    }
}

/// Captures the output of the vertex stage into the buffers attached to its indexed bindings.
///
/// While recording is active, the indexed bindings are frozen: they can not be rebound and
/// deleting a buffer does not detach it from them.
pub struct TransformFeedback {
    generic_binding: Option<Buffer>,
    indexed_bindings: Vec<IndexedBufferBinding>,
    is_active: bool,
}

impl TransformFeedback {
    pub(crate) fn new(max_separate_attribs: usize) -> Self {
        TransformFeedback {
            generic_binding: None,
            indexed_bindings: vec![IndexedBufferBinding::default(); max_separate_attribs],
            is_active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn generic_binding(&self) -> Option<&Buffer> {
        self.generic_binding.as_ref()
    }

    pub fn indexed_bindings(&self) -> &[IndexedBufferBinding] {
        &self.indexed_bindings
    }

    pub(crate) fn generic_binding_mut(&mut self) -> &mut Option<Buffer> {
        &mut self.generic_binding
    }

    pub(crate) fn indexed_bindings_mut(&mut self) -> &mut [IndexedBufferBinding] {
        &mut self.indexed_bindings
    }

    pub(crate) fn begin<D>(
        &mut self,
        func_name: &str,
        driver: &mut D,
        primitive_mode: u32,
    ) -> Result<(), GlError>
    where
        D: Driver,
    {
        if self.is_active {
            return Err(GlError::InvalidOperation(format!(
                "{}: Already active.",
                func_name
            )));
        }

        let primitive_mode = PrimitiveMode::from_gl_id(primitive_mode).ok_or_else(|| {
            GlError::InvalidEnum(format!(
                "{}: `primitiveMode` must be one of POINTS, LINES, or TRIANGLES.",
                func_name
            ))
        })?;

        driver.begin_transform_feedback(primitive_mode);

        self.is_active = true;

        for buffer in self.attached_buffers() {
            buffer.attach_transform_feedback();
        }

        Ok(())
    }

    pub(crate) fn end<D>(&mut self, func_name: &str, driver: &mut D) -> Result<(), GlError>
    where
        D: Driver,
    {
        if !self.is_active {
            return Err(GlError::InvalidOperation(format!(
                "{}: Not active.",
                func_name
            )));
        }

        driver.end_transform_feedback();

        self.is_active = false;

        for buffer in self.attached_buffers() {
            buffer.detach_transform_feedback();
        }

        Ok(())
    }

    /// Detaches `buffer` from the generic binding and, unless recording is active, from the
    /// indexed bindings.
    pub(crate) fn clear_buffer(&mut self, buffer: &Buffer) {
        clear_if_buffer(&mut self.generic_binding, buffer);

        if !self.is_active {
            for binding in self.indexed_bindings.iter_mut() {
                binding.clear_if_buffer(buffer);
            }
        }
    }

    fn attached_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.indexed_bindings
            .iter()
            .filter_map(|binding| binding.buffer())
    }
}
