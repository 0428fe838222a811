use fnv::FnvHashMap;

use wasm_bindgen::JsValue;
use web_sys::{WebGl2RenderingContext as Gl, WebGlBuffer};

use crate::buffer::{BufferTarget, BufferUsage};
use crate::driver::{Driver, DriverId};
use crate::transform_feedback::PrimitiveMode;
use crate::vertex::ComponentType;

/// A [Driver] that issues its commands to a WebGL 2.0 context.
pub struct WebGl2Driver {
    gl: Gl,
    buffers: FnvHashMap<DriverId, WebGlBuffer>,
    next_id: DriverId,
    init_before_range_bind: bool,
}

impl WebGl2Driver {
    pub fn new(gl: Gl) -> Self {
        WebGl2Driver {
            gl,
            buffers: FnvHashMap::default(),
            next_id: 1,
            init_before_range_bind: false,
        }
    }

    /// Enables binding buffers with undefined contents once before binding a range of them.
    ///
    /// Needed on platforms whose drivers reject ranged binds of uninitialized buffers.
    pub fn init_before_range_bind(mut self, enabled: bool) -> Self {
        self.init_before_range_bind = enabled;

        self
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    fn buffer_object(&self, id: Option<DriverId>) -> Option<&WebGlBuffer> {
        id.and_then(|id| self.buffers.get(&id))
    }
}

impl Driver for WebGl2Driver {
    fn is_context_lost(&self) -> bool {
        self.gl.is_context_lost()
    }

    fn get_parameter(&self, parameter: u32) -> u32 {
        self.gl
            .get_parameter(parameter)
            .ok()
            .and_then(|value: JsValue| value.as_f64())
            .map(|value| value as u32)
            .unwrap_or(0)
    }

    fn create_buffer(&mut self) -> Option<DriverId> {
        let id = self.next_id;
        let next_id = id.checked_add(1)?;
        let buffer = self.gl.create_buffer()?;

        self.next_id = next_id;
        self.buffers.insert(id, buffer);

        Some(id)
    }

    fn delete_buffer(&mut self, id: DriverId) {
        if let Some(buffer) = self.buffers.remove(&id) {
            self.gl.delete_buffer(Some(&buffer));
        }
    }

    fn is_buffer(&self, id: DriverId) -> bool {
        self.buffers
            .get(&id)
            .map(|buffer| self.gl.is_buffer(Some(buffer)))
            .unwrap_or(false)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<DriverId>) {
        self.gl
            .bind_buffer(target.gl_id(), self.buffer_object(buffer));
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<DriverId>) {
        self.gl
            .bind_buffer_base(target.gl_id(), index, self.buffer_object(buffer));
    }

    fn bind_buffer_range(
        &mut self,
        target: BufferTarget,
        index: u32,
        buffer: Option<DriverId>,
        offset: i64,
        size: i64,
    ) {
        self.gl.bind_buffer_range_with_f64_and_f64(
            target.gl_id(),
            index,
            self.buffer_object(buffer),
            offset as f64,
            size as f64,
        );
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.gl
            .buffer_data_with_u8_array(target.gl_id(), data, usage.gl_id());
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, dst_offset: i64, data: &[u8]) {
        self.gl
            .buffer_sub_data_with_f64_and_u8_array(target.gl_id(), dst_offset as f64, data);
    }

    fn begin_transform_feedback(&mut self, primitive_mode: PrimitiveMode) {
        self.gl.begin_transform_feedback(primitive_mode.gl_id());
    }

    fn end_transform_feedback(&mut self) {
        self.gl.end_transform_feedback();
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
        self.gl.vertex_attrib_pointer_with_f64(
            index,
            size,
            component_type.gl_id(),
            normalized,
            stride,
            offset as f64,
        );
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.gl.enable_vertex_attrib_array(index);
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.gl.disable_vertex_attrib_array(index);
    }

    fn requires_init_before_range_bind(&self) -> bool {
        self.init_before_range_bind
    }
}
