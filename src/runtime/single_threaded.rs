use std::convert::TryFrom;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;

use crate::buffer::{Buffer, BufferContent, BufferTarget, BufferUsage};
use crate::driver::{Driver, LazyBind};
use crate::error::{validate_non_negative, ErrorRecorder, GlError};
use crate::runtime::dropper::DropQueue;
use crate::runtime::state::{BindingState, IndexedBufferBinding};
use crate::runtime::{ContextLimits, ContextOptions};
use crate::vertex::{AttributePointer, ComponentType};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A rendering context that tracks the buffer bindings of a single-threaded [Driver].
///
/// Every entry point follows the WebGL error model: an invalid call is abandoned before it issues
/// a driver call or modifies any state, and the error is recorded so that it may be retrieved
/// with [get_error](SingleThreadedContext::get_error). Once the driver reports that the context
/// is lost, every operation is a silent no-op and every query returns an empty result.
pub struct SingleThreadedContext<D>
where
    D: Driver,
{
    id: u64,
    driver: D,
    options: ContextOptions,
    limits: ContextLimits,
    state: BindingState,
    errors: ErrorRecorder,
    drop_queue: Rc<DropQueue>,
}

impl<D> SingleThreadedContext<D>
where
    D: Driver,
{
    pub fn new(driver: D, options: ContextOptions) -> Self {
        let limits = ContextLimits::query(&driver, options.capability_tier());
        let state = BindingState::initial(options.capability_tier(), &limits);

        SingleThreadedContext {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            driver,
            options,
            limits,
            state,
            errors: ErrorRecorder::default(),
            drop_queue: Rc::new(DropQueue::default()),
        }
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn limits(&self) -> &ContextLimits {
        &self.limits
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The current state of all binding points.
    pub fn bindings(&self) -> &BindingState {
        &self.state
    }

    pub fn is_context_lost(&self) -> bool {
        self.driver.is_context_lost()
    }

    /// Returns and clears the first error recorded since the last call.
    pub fn get_error(&mut self) -> Option<GlError> {
        self.errors.take()
    }

    pub fn create_buffer(&mut self) -> Option<Buffer> {
        if !self.begin_call() {
            return None;
        }

        let id = self.driver.create_buffer()?;

        log::debug!("Created buffer {}", id);

        Some(Buffer::new(
            id,
            self.id,
            self.drop_queue.clone(),
            self.options.shadow_buffer_data(),
        ))
    }

    /// Detaches `buffer` from every binding point and marks it as deleted.
    ///
    /// The driver object is destroyed once the last handle to the buffer has been dropped.
    pub fn delete_buffer(&mut self, buffer: Option<&Buffer>) {
        if !self.begin_call() {
            return;
        }

        let buffer = match buffer {
            Some(buffer) => buffer,
            None => return,
        };

        if let Err(error) = self.validate_object("deleteBuffer", buffer) {
            return self.errors.report(error);
        }

        if buffer.is_delete_requested() {
            return;
        }

        self.state.clear_buffer(buffer);
        buffer.request_delete();

        log::debug!("Requested deletion of buffer {}", buffer.driver_id());
    }

    pub fn is_buffer(&mut self, buffer: Option<&Buffer>) -> bool {
        if !self.begin_call() {
            return false;
        }

        let buffer = match buffer {
            Some(buffer) => buffer,
            None => return false,
        };

        if let Err(error) = self.validate_object("isBuffer", buffer) {
            self.errors.report(error);

            return false;
        }

        !buffer.is_delete_requested() && self.driver.is_buffer(buffer.driver_id())
    }

    /// Binds `buffer` to the generic slot for `target`, or clears the slot if `buffer` is `None`.
    ///
    /// A buffer that has been deleted is silently ignored.
    pub fn bind_buffer(&mut self, target: u32, buffer: Option<&Buffer>) {
        if !self.begin_call() {
            return;
        }

        let result = self.try_bind_buffer("bindBuffer", target, buffer);

        self.record(result);
    }

    /// Binds `buffer` to `index` of the indexed binding table for `target`, and to the generic
    /// slot for `target`.
    pub fn bind_buffer_base(&mut self, target: u32, index: u32, buffer: Option<&Buffer>) {
        if !self.begin_call() {
            return;
        }

        let result = self.try_bind_buffer_base("bindBufferBase", target, index, buffer);

        self.record(result);
    }

    /// Binds the `size` bytes of `buffer` that start at `offset` to `index` of the indexed
    /// binding table for `target`, and binds `buffer` to the generic slot for `target`.
    pub fn bind_buffer_range(
        &mut self,
        target: u32,
        index: u32,
        buffer: Option<&Buffer>,
        offset: i64,
        size: i64,
    ) {
        if !self.begin_call() {
            return;
        }

        let result =
            self.try_bind_buffer_range("bindBufferRange", target, index, buffer, offset, size);

        self.record(result);
    }

    /// Replaces the data store of the buffer bound to `target` with a copy of `data`.
    pub fn buffer_data(&mut self, target: u32, data: &[u8], usage: u32) {
        if !self.begin_call() {
            return;
        }

        let result = self.try_buffer_data("bufferData", target, data, usage);

        self.record(result);
    }

    /// Replaces the data store of the buffer bound to `target` with `size` zeroed bytes.
    pub fn buffer_data_size(&mut self, target: u32, size: i64, usage: u32) {
        const FUNC_NAME: &str = "bufferData";

        if !self.begin_call() {
            return;
        }

        let result = validate_non_negative(FUNC_NAME, "size", size)
            .and_then(|_| zeroed(FUNC_NAME, size))
            .and_then(|zeros| self.try_buffer_data(FUNC_NAME, target, &zeros, usage));

        self.record(result);
    }

    /// Replaces the data store of the buffer bound to `target` with a copy of the elements of
    /// `view` that start at `src_elem_offset`.
    ///
    /// If `src_elem_count_override` is not `0`, only that many elements are copied.
    pub fn buffer_data_with_view<T>(
        &mut self,
        target: u32,
        view: &[T],
        usage: u32,
        src_elem_offset: u32,
        src_elem_count_override: u32,
    ) where
        T: Pod,
    {
        const FUNC_NAME: &str = "bufferData";

        if !self.begin_call() {
            return;
        }

        let result = view_bytes(FUNC_NAME, view, src_elem_offset, src_elem_count_override)
            .and_then(|bytes| self.try_buffer_data(FUNC_NAME, target, bytes, usage));

        self.record(result);
    }

    /// Overwrites part of the data store of the buffer bound to `target` with `data`, starting at
    /// byte `dst_offset`.
    pub fn buffer_sub_data(&mut self, target: u32, dst_offset: i64, data: &[u8]) {
        if !self.begin_call() {
            return;
        }

        let result = self.try_buffer_sub_data("bufferSubData", target, dst_offset, data);

        self.record(result);
    }

    pub fn buffer_sub_data_with_view<T>(
        &mut self,
        target: u32,
        dst_offset: i64,
        view: &[T],
        src_elem_offset: u32,
        src_elem_count_override: u32,
    ) where
        T: Pod,
    {
        const FUNC_NAME: &str = "bufferSubData";

        if !self.begin_call() {
            return;
        }

        let result = view_bytes(FUNC_NAME, view, src_elem_offset, src_elem_count_override)
            .and_then(|bytes| self.try_buffer_sub_data(FUNC_NAME, target, dst_offset, bytes));

        self.record(result);
    }

    /// The buffer bound to the generic slot for `target`.
    pub fn buffer_binding(&mut self, target: u32) -> Option<Buffer> {
        if !self.begin_call() {
            return None;
        }

        let result = self
            .state
            .resolve_generic_slot("getParameter", target)
            .map(|target| self.state.generic_binding(target).cloned());

        self.record(result).flatten()
    }

    /// The binding at `index` of the indexed binding table for `target`.
    pub fn indexed_buffer_binding(
        &mut self,
        target: u32,
        index: u32,
    ) -> Option<IndexedBufferBinding> {
        const FUNC_NAME: &str = "getIndexedParameter";

        if !self.begin_call() {
            return None;
        }

        let result = self
            .state
            .resolve_generic_slot(FUNC_NAME, target)
            .and_then(|_| self.state.resolve_indexed_slot(FUNC_NAME, target, index))
            .map(|slot| self.state.indexed_binding(slot).clone());

        self.record(result)
    }

    pub fn begin_transform_feedback(&mut self, primitive_mode: u32) {
        if !self.begin_call() {
            return;
        }

        let result = self.state.transform_feedback_mut().begin(
            "beginTransformFeedback",
            &mut self.driver,
            primitive_mode,
        );

        self.record(result);
    }

    pub fn end_transform_feedback(&mut self) {
        if !self.begin_call() {
            return;
        }

        let result = self
            .state
            .transform_feedback_mut()
            .end("endTransformFeedback", &mut self.driver);

        self.record(result);
    }

    /// Points vertex attribute `index` at the buffer currently bound to `ARRAY_BUFFER`.
    pub fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        component_type: u32,
        normalized: bool,
        stride: i32,
        offset: i64,
    ) {
        if !self.begin_call() {
            return;
        }

        let result = self.try_vertex_attrib_pointer(
            "vertexAttribPointer",
            index,
            size,
            component_type,
            normalized,
            stride,
            offset,
        );

        self.record(result);
    }

    pub fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.set_vertex_attrib_array_enabled("enableVertexAttribArray", index, true);
    }

    pub fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.set_vertex_attrib_array_enabled("disableVertexAttribArray", index, false);
    }

    /// The buffer vertex attribute `index` reads its data from.
    pub fn vertex_attrib_buffer(&mut self, index: u32) -> Option<Buffer> {
        if !self.begin_call() {
            return None;
        }

        let result = self
            .validate_attrib_index("getVertexAttrib", index)
            .map(|_| {
                self.state
                    .vertex_array()
                    .attribute(index)
                    .and_then(|attribute| attribute.buffer().cloned())
            });

        self.record(result).flatten()
    }

    /// Destroys the driver objects of dropped buffers and reports whether the call may proceed.
    fn begin_call(&mut self) -> bool {
        if self.driver.is_context_lost() {
            self.drop_queue.take();

            return false;
        }

        self.drop_queue.flush(&mut self.driver);

        true
    }

    fn record<T>(&mut self, result: Result<T, GlError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.errors.report(error);

                None
            }
        }
    }

    fn validate_object(&self, func_name: &str, buffer: &Buffer) -> Result<(), GlError> {
        if buffer.context_id() == self.id {
            Ok(())
        } else {
            Err(GlError::InvalidOperation(format!(
                "{}: Object from different context.",
                func_name
            )))
        }
    }

    /// Validates a buffer argument of a bind operation. Returns `false` if the buffer has been
    /// deleted and the bind should be skipped.
    fn validate_bind_argument(
        &self,
        func_name: &str,
        buffer: Option<&Buffer>,
    ) -> Result<bool, GlError> {
        match buffer {
            Some(buffer) => {
                self.validate_object(func_name, buffer)?;

                Ok(!buffer.is_delete_requested())
            }
            None => Ok(true),
        }
    }

    fn try_bind_buffer(
        &mut self,
        func_name: &str,
        target: u32,
        buffer: Option<&Buffer>,
    ) -> Result<(), GlError> {
        if !self.validate_bind_argument(func_name, buffer)? {
            return Ok(());
        }

        let target = self.state.resolve_generic_slot(func_name, target)?;

        if let Some(buffer) = buffer {
            buffer.can_bind_to_target(func_name, target)?;
        }

        self.driver
            .bind_buffer(target, buffer.map(|b| b.driver_id()));

        self.state.set_generic_binding(target, buffer.cloned());

        if let Some(buffer) = buffer {
            buffer.set_content_after_bind(target);
        }

        if target.is_pixel_transfer() {
            self.driver.bind_buffer(target, None);
        }

        log::trace!(
            "Bound buffer {:?} to {}",
            buffer.map(|b| b.driver_id()),
            target.name()
        );

        Ok(())
    }

    fn try_bind_buffer_base(
        &mut self,
        func_name: &str,
        target: u32,
        index: u32,
        buffer: Option<&Buffer>,
    ) -> Result<(), GlError> {
        if !self.validate_bind_argument(func_name, buffer)? {
            return Ok(());
        }

        let slot = self.state.resolve_indexed_binding(func_name, target, index)?;

        if let Some(buffer) = buffer {
            buffer.can_bind_to_target(func_name, slot.target)?;
        }

        self.driver
            .bind_buffer_base(slot.target, index, buffer.map(|b| b.driver_id()));

        self.state.set_indexed_binding(slot, buffer.cloned(), 0, 0);

        if let Some(buffer) = buffer {
            buffer.set_content_after_bind(slot.target);
        }

        log::trace!(
            "Bound buffer {:?} to {} index {}",
            buffer.map(|b| b.driver_id()),
            slot.target.name(),
            index
        );

        Ok(())
    }

    fn try_bind_buffer_range(
        &mut self,
        func_name: &str,
        target: u32,
        index: u32,
        buffer: Option<&Buffer>,
        offset: i64,
        size: i64,
    ) -> Result<(), GlError> {
        if !self.validate_bind_argument(func_name, buffer)? {
            return Ok(());
        }

        validate_non_negative(func_name, "offset", offset)?;
        validate_non_negative(func_name, "size", size)?;

        let slot = self.state.resolve_indexed_binding(func_name, target, index)?;

        if let Some(buffer) = buffer {
            buffer.can_bind_to_target(func_name, slot.target)?;
        }

        match slot.target {
            BufferTarget::TransformFeedback => {
                if offset % 4 != 0 || size % 4 != 0 {
                    return Err(GlError::InvalidValue(format!(
                        "{}: For {}, `offset` and `size` must be multiples of 4.",
                        func_name,
                        slot.target.name()
                    )));
                }
            }
            BufferTarget::Uniform => {
                let alignment = i64::from(self.limits.uniform_buffer_offset_alignment);

                // An alignment of 0 means the driver reported no requirement.
                if offset.checked_rem(alignment).unwrap_or(0) != 0 {
                    return Err(GlError::InvalidValue(format!(
                        "{}: For {}, `offset` must be a multiple of {}.",
                        func_name,
                        slot.target.name(),
                        "UNIFORM_BUFFER_OFFSET_ALIGNMENT"
                    )));
                }
            }
            _ => (),
        }

        let id = buffer.map(|b| b.driver_id());

        if let Some(buffer) = buffer {
            if buffer.content() == BufferContent::Undefined
                && self.driver.requires_init_before_range_bind()
            {
                self.driver.bind_buffer(slot.target, id);
            }
        }

        self.driver
            .bind_buffer_range(slot.target, index, id, offset, size);

        self.state
            .set_indexed_binding(slot, buffer.cloned(), offset, size);

        if let Some(buffer) = buffer {
            buffer.set_content_after_bind(slot.target);
        }

        log::trace!(
            "Bound {} bytes at offset {} of buffer {:?} to {} index {}",
            size,
            offset,
            id,
            slot.target.name(),
            index
        );

        Ok(())
    }

    fn try_buffer_data(
        &mut self,
        func_name: &str,
        target: u32,
        data: &[u8],
        usage: u32,
    ) -> Result<(), GlError> {
        let (target, buffer) = self.state.resolve_bound_buffer(func_name, target)?;
        let usage = BufferUsage::from_gl_id(usage, self.options.capability_tier()).ok_or_else(
            || GlError::InvalidEnum(format!("{}: Invalid `usage`: 0x{:04x}", func_name, usage)),
        )?;

        buffer.buffer_data(func_name, &mut self.driver, target, data, usage)
    }

    fn try_buffer_sub_data(
        &mut self,
        func_name: &str,
        target: u32,
        dst_offset: i64,
        data: &[u8],
    ) -> Result<(), GlError> {
        validate_non_negative(func_name, "byteOffset", dst_offset)?;

        let (target, buffer) = self.state.resolve_bound_buffer(func_name, target)?;

        if buffer.active_transform_feedback_count() > 0 {
            return Err(GlError::InvalidOperation(format!(
                "{}: Buffer is bound to an active transform feedback object.",
                func_name
            )));
        }

        let offset = usize::try_from(dst_offset).unwrap_or(usize::MAX);

        buffer.validate_range(func_name, offset, data.len())?;

        if i64::try_from(data.len()).is_err() {
            return Err(GlError::OutOfMemory(format!(
                "{}: Size too large.",
                func_name
            )));
        }

        LazyBind::new(&mut self.driver, target, buffer.driver_id())
            .buffer_sub_data(target, dst_offset, data);

        buffer.update_shadow(offset, data);

        Ok(())
    }

    fn validate_attrib_index(&self, func_name: &str, index: u32) -> Result<(), GlError> {
        if index < self.limits.max_vertex_attribs {
            Ok(())
        } else {
            Err(GlError::InvalidValue(format!(
                "{}: `index` must be < MAX_VERTEX_ATTRIBS.",
                func_name
            )))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn try_vertex_attrib_pointer(
        &mut self,
        func_name: &str,
        index: u32,
        size: i32,
        component_type: u32,
        normalized: bool,
        stride: i32,
        offset: i64,
    ) -> Result<(), GlError> {
        self.validate_attrib_index(func_name, index)?;

        if size < 1 || size > 4 {
            return Err(GlError::InvalidValue(format!(
                "{}: `size` must be 1, 2, 3 or 4.",
                func_name
            )));
        }

        let component_type =
            ComponentType::from_gl_id(component_type, self.options.capability_tier())
                .ok_or_else(|| {
                    GlError::InvalidEnum(format!(
                        "{}: Invalid `type`: 0x{:04x}",
                        func_name, component_type
                    ))
                })?;

        if component_type.is_packed() && size != 4 {
            return Err(GlError::InvalidOperation(format!(
                "{}: Packed types require `size` to be 4.",
                func_name
            )));
        }

        if stride < 0 || stride > 255 {
            return Err(GlError::InvalidValue(format!(
                "{}: `stride` must be between 0 and 255.",
                func_name
            )));
        }

        validate_non_negative(func_name, "offset", offset)?;

        let type_size = component_type.size_in_bytes();

        if offset % type_size != 0 || i64::from(stride) % type_size != 0 {
            return Err(GlError::InvalidOperation(format!(
                "{}: `offset` and `stride` must be multiples of the size of `type`.",
                func_name
            )));
        }

        let buffer = self.state.generic_binding(BufferTarget::Array).cloned();

        if buffer.is_none() && offset != 0 {
            return Err(GlError::InvalidOperation(format!(
                "{}: An ARRAY_BUFFER must be bound when `offset` is not 0.",
                func_name
            )));
        }

        self.driver.vertex_attrib_pointer(
            index,
            size,
            component_type,
            normalized,
            stride,
            offset,
        );

        self.state.vertex_array_mut().set_attribute_pointer(
            index,
            buffer,
            AttributePointer {
                size,
                component_type,
                normalized,
                stride,
                offset,
            },
        );

        Ok(())
    }

    fn set_vertex_attrib_array_enabled(&mut self, func_name: &str, index: u32, enabled: bool) {
        if !self.begin_call() {
            return;
        }

        if let Err(error) = self.validate_attrib_index(func_name, index) {
            return self.errors.report(error);
        }

        if enabled {
            self.driver.enable_vertex_attrib_array(index);
        } else {
            self.driver.disable_vertex_attrib_array(index);
        }

        self.state
            .vertex_array_mut()
            .set_attribute_enabled(index, enabled);
    }
}

impl<D> Drop for SingleThreadedContext<D>
where
    D: Driver,
{
    fn drop(&mut self) {
        let state = BindingState::initial(self.options.capability_tier(), &self.limits);

        drop(mem::replace(&mut self.state, state));

        if !self.driver.is_context_lost() {
            self.drop_queue.flush(&mut self.driver);
        }
    }
}

fn zeroed(func_name: &str, size: i64) -> Result<Vec<u8>, GlError> {
    let out_of_memory =
        || GlError::OutOfMemory(format!("{}: Failed to allocate zeros.", func_name));
    let len = usize::try_from(size).map_err(|_| out_of_memory())?;
    let mut zeros = Vec::new();

    zeros.try_reserve_exact(len).map_err(|_| out_of_memory())?;
    zeros.resize(len, 0);

    Ok(zeros)
}

fn view_bytes<'a, T>(
    func_name: &str,
    view: &'a [T],
    src_elem_offset: u32,
    src_elem_count_override: u32,
) -> Result<&'a [u8], GlError>
where
    T: Pod,
{
    let offset = src_elem_offset as usize;

    if offset > view.len() {
        return Err(GlError::InvalidValue(format!(
            "{}: Invalid offset into ArrayBufferView.",
            func_name
        )));
    }

    let remaining = &view[offset..];

    let elements = if src_elem_count_override != 0 {
        remaining
            .get(..src_elem_count_override as usize)
            .ok_or_else(|| {
                GlError::InvalidValue(format!(
                    "{}: Invalid sub-length for ArrayBufferView.",
                    func_name
                ))
            })?
    } else {
        remaining
    };

    Ok(bytemuck::cast_slice(elements))
}
