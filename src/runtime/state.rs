use crate::buffer::{Buffer, BufferTarget};
use crate::error::GlError;
use crate::runtime::{CapabilityTier, ContextLimits};
use crate::transform_feedback::TransformFeedback;
use crate::vertex::VertexArray;

/// The indexed binding tables, one for each target that supports indexed binding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum IndexedTable {
    TransformFeedback,
    Uniform,
}

impl IndexedTable {
    fn max_index_name(&self) -> &'static str {
        match self {
            IndexedTable::TransformFeedback => "MAX_TRANSFORM_FEEDBACK_SEPARATE_ATTRIBS",
            IndexedTable::Uniform => "MAX_UNIFORM_BUFFER_BINDINGS",
        }
    }
}

/// Where the generic binding of a target is stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum GenericSlot {
    /// An index into the slots owned by the binding state itself.
    Owned(usize),
    ElementArray,
    TransformFeedback,
}

struct TargetDescriptor {
    target: BufferTarget,
    tier: CapabilityTier,
    slot: GenericSlot,
    indexed: Option<IndexedTable>,
}

const OWNED_SLOT_COUNT: usize = 6;

// Ordered like the `BufferTarget` variants.
static TARGETS: [TargetDescriptor; 8] = [
    TargetDescriptor {
        target: BufferTarget::Array,
        tier: CapabilityTier::Base,
        slot: GenericSlot::Owned(0),
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::ElementArray,
        tier: CapabilityTier::Base,
        slot: GenericSlot::ElementArray,
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::CopyRead,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::Owned(1),
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::CopyWrite,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::Owned(2),
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::PixelPack,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::Owned(3),
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::PixelUnpack,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::Owned(4),
        indexed: None,
    },
    TargetDescriptor {
        target: BufferTarget::TransformFeedback,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::TransformFeedback,
        indexed: Some(IndexedTable::TransformFeedback),
    },
    TargetDescriptor {
        target: BufferTarget::Uniform,
        tier: CapabilityTier::Extended,
        slot: GenericSlot::Owned(5),
        indexed: Some(IndexedTable::Uniform),
    },
];

fn target_descriptor(target: u32) -> Option<&'static TargetDescriptor> {
    TARGETS.iter().find(|d| d.target.gl_id() == target)
}

fn descriptor_for(target: BufferTarget) -> &'static TargetDescriptor {
    &TARGETS[target as usize]
}

fn bad_target(func_name: &str, target: u32) -> GlError {
    GlError::InvalidEnum(format!("{}: Bad `target`: 0x{:04x}", func_name, target))
}

/// A resolved slot in one of the indexed binding tables.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct IndexedSlot {
    pub(crate) target: BufferTarget,
    pub(crate) table: IndexedTable,
    pub(crate) index: usize,
}

/// A buffer binding for one index of an indexed binding table, together with the byte range of
/// the buffer that is bound.
///
/// A `start` and `size` of `0` mean that the whole buffer is bound.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct IndexedBufferBinding {
    buffer: Option<Buffer>,
    start: i64,
    size: i64,
}

impl IndexedBufferBinding {
    pub fn buffer(&self) -> Option<&Buffer> {
        self.buffer.as_ref()
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub(crate) fn set(&mut self, buffer: Option<Buffer>, start: i64, size: i64) {
        self.buffer = buffer;
        self.start = start;
        self.size = size;
    }

    pub(crate) fn clear_if_buffer(&mut self, buffer: &Buffer) {
        if self.buffer.as_ref() == Some(buffer) {
            *self = IndexedBufferBinding::default();
        }
    }
}

pub(crate) fn clear_if_buffer(slot: &mut Option<Buffer>, buffer: &Buffer) {
    if slot.as_ref() == Some(buffer) {
        *slot = None;
    }
}

/// All buffer binding points of a context.
pub struct BindingState {
    tier: CapabilityTier,
    owned_slots: [Option<Buffer>; OWNED_SLOT_COUNT],
    uniform_buffer_bindings: Vec<IndexedBufferBinding>,
    transform_feedback: TransformFeedback,
    vertex_array: VertexArray,
}

impl BindingState {
    pub(crate) fn initial(tier: CapabilityTier, limits: &ContextLimits) -> Self {
        BindingState {
            tier,
            owned_slots: Default::default(),
            uniform_buffer_bindings: vec![
                IndexedBufferBinding::default();
                limits.max_uniform_buffer_bindings as usize
            ],
            transform_feedback: TransformFeedback::new(
                limits.max_transform_feedback_separate_attribs as usize,
            ),
            vertex_array: VertexArray::new(limits.max_vertex_attribs as usize),
        }
    }

    pub fn transform_feedback(&self) -> &TransformFeedback {
        &self.transform_feedback
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }

    pub fn uniform_buffer_bindings(&self) -> &[IndexedBufferBinding] {
        &self.uniform_buffer_bindings
    }

    pub(crate) fn transform_feedback_mut(&mut self) -> &mut TransformFeedback {
        &mut self.transform_feedback
    }

    pub(crate) fn vertex_array_mut(&mut self) -> &mut VertexArray {
        &mut self.vertex_array
    }

    /// The buffer currently bound to the generic slot for `target`.
    pub fn generic_binding(&self, target: BufferTarget) -> Option<&Buffer> {
        match descriptor_for(target).slot {
            GenericSlot::Owned(index) => self.owned_slots[index].as_ref(),
            GenericSlot::ElementArray => self.vertex_array.element_array_buffer(),
            GenericSlot::TransformFeedback => self.transform_feedback.generic_binding(),
        }
    }

    pub(crate) fn generic_binding_mut(&mut self, target: BufferTarget) -> &mut Option<Buffer> {
        match descriptor_for(target).slot {
            GenericSlot::Owned(index) => &mut self.owned_slots[index],
            GenericSlot::ElementArray => self.vertex_array.element_array_buffer_mut(),
            GenericSlot::TransformFeedback => self.transform_feedback.generic_binding_mut(),
        }
    }

    fn indexed_table(&self, table: IndexedTable) -> &[IndexedBufferBinding] {
        match table {
            IndexedTable::TransformFeedback => self.transform_feedback.indexed_bindings(),
            IndexedTable::Uniform => &self.uniform_buffer_bindings,
        }
    }

    fn indexed_table_mut(&mut self, table: IndexedTable) -> &mut [IndexedBufferBinding] {
        match table {
            IndexedTable::TransformFeedback => self.transform_feedback.indexed_bindings_mut(),
            IndexedTable::Uniform => &mut self.uniform_buffer_bindings,
        }
    }

    pub(crate) fn indexed_binding(&self, slot: IndexedSlot) -> &IndexedBufferBinding {
        &self.indexed_table(slot.table)[slot.index]
    }

    /// Resolves `target` to its generic slot.
    ///
    /// Fails with `InvalidEnum` if `target` is not a buffer target or is not available in the
    /// context's capability tier.
    pub(crate) fn resolve_generic_slot(
        &self,
        func_name: &str,
        target: u32,
    ) -> Result<BufferTarget, GlError> {
        match target_descriptor(target) {
            Some(descriptor) if self.tier.supports(descriptor.tier) => Ok(descriptor.target),
            _ => Err(bad_target(func_name, target)),
        }
    }

    /// Resolves `target` and `index` to a slot in an indexed binding table.
    ///
    /// Fails with `InvalidEnum` if `target` does not support indexed binding and with
    /// `InvalidOperation` if `index` exceeds the size of the target's table.
    pub(crate) fn resolve_indexed_slot(
        &self,
        func_name: &str,
        target: u32,
        index: u32,
    ) -> Result<IndexedSlot, GlError> {
        let descriptor = target_descriptor(target).ok_or_else(|| bad_target(func_name, target))?;
        let table = descriptor
            .indexed
            .ok_or_else(|| bad_target(func_name, target))?;

        if index as usize >= self.indexed_table(table).len() {
            return Err(GlError::InvalidOperation(format!(
                "{}: `index` >= {}.",
                func_name,
                table.max_index_name()
            )));
        }

        Ok(IndexedSlot {
            target: descriptor.target,
            table,
            index: index as usize,
        })
    }

    /// Resolves the generic and indexed slot that an indexed bind of `target` at `index` updates.
    ///
    /// The indexed bindings of the transform feedback object can not be changed while it is
    /// active.
    pub(crate) fn resolve_indexed_binding(
        &self,
        func_name: &str,
        target: u32,
        index: u32,
    ) -> Result<IndexedSlot, GlError> {
        self.resolve_generic_slot(func_name, target)?;

        let slot = self.resolve_indexed_slot(func_name, target, index)?;

        if slot.table == IndexedTable::TransformFeedback && self.transform_feedback.is_active() {
            return Err(GlError::InvalidOperation(format!(
                "{}: Cannot update indexed buffer bindings on active transform feedback objects.",
                func_name
            )));
        }

        Ok(slot)
    }

    /// Resolves the buffer currently bound to `target`.
    ///
    /// Fails with `InvalidOperation` if no buffer is bound.
    pub(crate) fn resolve_bound_buffer(
        &self,
        func_name: &str,
        target: u32,
    ) -> Result<(BufferTarget, Buffer), GlError> {
        let target = self.resolve_generic_slot(func_name, target)?;

        match self.generic_binding(target) {
            Some(buffer) => Ok((target, buffer.clone())),
            None => Err(GlError::InvalidOperation(format!(
                "{}: Buffer for `target` is null.",
                func_name
            ))),
        }
    }

    pub(crate) fn set_generic_binding(&mut self, target: BufferTarget, buffer: Option<Buffer>) {
        *self.generic_binding_mut(target) = buffer;
    }

    /// Binds `buffer` to an indexed slot. Like in GL, this also binds `buffer` to the slot's
    /// generic binding.
    pub(crate) fn set_indexed_binding(
        &mut self,
        slot: IndexedSlot,
        buffer: Option<Buffer>,
        start: i64,
        size: i64,
    ) {
        *self.generic_binding_mut(slot.target) = buffer.clone();
        self.indexed_table_mut(slot.table)[slot.index].set(buffer, start, size);
    }

    /// Removes every reference to `buffer` from the binding points.
    ///
    /// Indexed bindings of an active transform feedback object are left untouched, they are
    /// released when recording ends and the object is rebound.
    pub(crate) fn clear_buffer(&mut self, buffer: &Buffer) {
        let tier = self.tier;

        for descriptor in TARGETS.iter().filter(|d| tier.supports(d.tier)) {
            if let GenericSlot::Owned(index) = descriptor.slot {
                clear_if_buffer(&mut self.owned_slots[index], buffer);
            }
        }

        if tier == CapabilityTier::Extended {
            self.transform_feedback.clear_buffer(buffer);
        }

        for binding in self.uniform_buffer_bindings.iter_mut() {
            binding.clear_if_buffer(buffer);
        }

        self.vertex_array.clear_buffer(buffer);
    }
}
