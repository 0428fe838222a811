//! A [Driver] for unit tests that records every call instead of talking to a GPU.

use std::cell::RefCell;
use std::rc::Rc;

use fnv::{FnvHashMap, FnvHashSet};

use web_sys::WebGl2RenderingContext as Gl;

use crate::buffer::{BufferTarget, BufferUsage};
use crate::driver::{Driver, DriverId};
use crate::transform_feedback::PrimitiveMode;
use crate::vertex::ComponentType;

#[derive(Clone, PartialEq, Debug)]
pub(crate) enum DriverCall {
    CreateBuffer(DriverId),
    DeleteBuffer(DriverId),
    BindBuffer(BufferTarget, Option<DriverId>),
    BindBufferBase(BufferTarget, u32, Option<DriverId>),
    BindBufferRange(BufferTarget, u32, Option<DriverId>, i64, i64),
    BufferData(BufferTarget, Vec<u8>, BufferUsage),
    BufferSubData(BufferTarget, i64, Vec<u8>),
    BeginTransformFeedback(PrimitiveMode),
    EndTransformFeedback,
    VertexAttribPointer(u32, i32, ComponentType, bool, i32, i64),
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
}

pub(crate) struct RecordingDriver {
    calls: Vec<DriverCall>,
    shared_log: Option<Rc<RefCell<Vec<DriverCall>>>>,
    parameters: FnvHashMap<u32, u32>,
    live_buffers: FnvHashSet<DriverId>,
    next_id: DriverId,
    context_lost: bool,
    init_before_range_bind: bool,
}

impl RecordingDriver {
    pub(crate) fn new() -> Self {
        let mut parameters = FnvHashMap::default();

        parameters.insert(Gl::MAX_VERTEX_ATTRIBS, 16);
        parameters.insert(Gl::MAX_UNIFORM_BUFFER_BINDINGS, 24);
        parameters.insert(Gl::MAX_TRANSFORM_FEEDBACK_SEPARATE_ATTRIBS, 4);
        parameters.insert(Gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT, 256);

        RecordingDriver {
            calls: Vec::new(),
            shared_log: None,
            parameters,
            live_buffers: FnvHashSet::default(),
            next_id: 1,
            context_lost: false,
            init_before_range_bind: false,
        }
    }

    pub(crate) fn with_parameter(mut self, parameter: u32, value: u32) -> Self {
        self.parameters.insert(parameter, value);

        self
    }

    pub(crate) fn with_init_before_range_bind(mut self) -> Self {
        self.init_before_range_bind = true;

        self
    }

    /// Also appends every call to `log`, which outlives the driver.
    pub(crate) fn with_shared_log(mut self, log: Rc<RefCell<Vec<DriverCall>>>) -> Self {
        self.shared_log = Some(log);

        self
    }

    pub(crate) fn with_next_id(mut self, next_id: DriverId) -> Self {
        self.next_id = next_id;

        self
    }

    pub(crate) fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub(crate) fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub(crate) fn set_context_lost(&mut self, context_lost: bool) {
        self.context_lost = context_lost;
    }

    fn record(&mut self, call: DriverCall) {
        if let Some(log) = &self.shared_log {
            log.borrow_mut().push(call.clone());
        }

        self.calls.push(call);
    }
}

impl Driver for RecordingDriver {
    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn get_parameter(&self, parameter: u32) -> u32 {
        self.parameters.get(&parameter).copied().unwrap_or(0)
    }

    fn create_buffer(&mut self) -> Option<DriverId> {
        let id = self.next_id;

        self.next_id = id.checked_add(1)?;
        self.live_buffers.insert(id);
        self.record(DriverCall::CreateBuffer(id));

        Some(id)
    }

    fn delete_buffer(&mut self, id: DriverId) {
        self.live_buffers.remove(&id);
        self.record(DriverCall::DeleteBuffer(id));
    }

    fn is_buffer(&self, id: DriverId) -> bool {
        self.live_buffers.contains(&id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<DriverId>) {
        self.record(DriverCall::BindBuffer(target, buffer));
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<DriverId>) {
        self.record(DriverCall::BindBufferBase(target, index, buffer));
    }

    fn bind_buffer_range(
        &mut self,
        target: BufferTarget,
        index: u32,
        buffer: Option<DriverId>,
        offset: i64,
        size: i64,
    ) {
        self.record(DriverCall::BindBufferRange(
            target, index, buffer, offset, size,
        ));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(DriverCall::BufferData(target, data.to_vec(), usage));
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, dst_offset: i64, data: &[u8]) {
        self.record(DriverCall::BufferSubData(target, dst_offset, data.to_vec()));
    }

    fn begin_transform_feedback(&mut self, primitive_mode: PrimitiveMode) {
        self.record(DriverCall::BeginTransformFeedback(primitive_mode));
    }

    fn end_transform_feedback(&mut self) {
        self.record(DriverCall::EndTransformFeedback);
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        component_type: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i64,
    ) {
        self.record(DriverCall::VertexAttribPointer(
            index,
            size,
            component_type,
            normalized,
            stride,
            offset,
        ));
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(DriverCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(DriverCall::DisableVertexAttribArray(index));
    }

    fn requires_init_before_range_bind(&self) -> bool {
        self.init_before_range_bind
    }
}
