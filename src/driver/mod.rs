//! The boundary between the binding table and the graphics API that executes its commands.
//!
//! The binding table never talks to WebGL directly: every command it issues goes through the
//! [Driver] trait. [WebGl2Driver] implements it on top of a [web_sys::WebGl2RenderingContext].

use std::ops::{Deref, DerefMut};

use crate::buffer::{BufferTarget, BufferUsage};
use crate::transform_feedback::PrimitiveMode;
use crate::vertex::ComponentType;

mod webgl;
pub use self::webgl::WebGl2Driver;

#[cfg(test)]
pub(crate) mod recording;

/// Identifies a buffer object allocated by a [Driver].
pub type DriverId = u32;

/// The graphics API calls the binding table depends on.
///
/// Implementations are expected to treat their calls as infallible; a driver that fails a call
/// should report this as a context loss through [Driver::is_context_lost].
pub trait Driver {
    fn is_context_lost(&self) -> bool;

    /// Queries an integer context parameter, e.g. `MAX_UNIFORM_BUFFER_BINDINGS`.
    fn get_parameter(&self, parameter: u32) -> u32;

    fn create_buffer(&mut self) -> Option<DriverId>;

    fn delete_buffer(&mut self, id: DriverId);

    fn is_buffer(&self, id: DriverId) -> bool;

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<DriverId>);

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<DriverId>);

    fn bind_buffer_range(
        &mut self,
        target: BufferTarget,
        index: u32,
        buffer: Option<DriverId>,
        offset: i64,
        size: i64,
    );

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    fn buffer_sub_data(&mut self, target: BufferTarget, dst_offset: i64, data: &[u8]);

    fn begin_transform_feedback(&mut self, primitive_mode: PrimitiveMode);

    fn end_transform_feedback(&mut self);

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        component_type: ComponentType,
        normalized: bool,
        stride: i32,
        offset: i64,
    );

    fn enable_vertex_attrib_array(&mut self, index: u32);

    fn disable_vertex_attrib_array(&mut self, index: u32);

    /// Whether a buffer with undefined contents must be bound once with [Driver::bind_buffer]
    /// before it can be bound with [Driver::bind_buffer_range].
    ///
    /// Some drivers fail ranged binds of buffers they have not yet initialized.
    fn requires_init_before_range_bind(&self) -> bool {
        false
    }
}

/// Binds a buffer to a pixel transfer target for the lifetime of the guard.
///
/// The pixel pack and pixel unpack targets are never left bound at the driver level, so driver
/// calls that act on the buffer bound to one of these targets must bind it first. For every other
/// target the logical binding is also the live driver binding and the guard does nothing.
pub(crate) struct LazyBind<'a, D>
where
    D: Driver,
{
    driver: &'a mut D,
    target: Option<BufferTarget>,
}

impl<'a, D> LazyBind<'a, D>
where
    D: Driver,
{
    pub(crate) fn new(driver: &'a mut D, target: BufferTarget, buffer: DriverId) -> Self {
        let target = if target.is_pixel_transfer() {
            driver.bind_buffer(target, Some(buffer));

            Some(target)
        } else {
            None
        };

        LazyBind { driver, target }
    }
}

impl<'a, D> Deref for LazyBind<'a, D>
where
    D: Driver,
{
    type Target = D;

    fn deref(&self) -> &D {
        self.driver
    }
}

impl<'a, D> DerefMut for LazyBind<'a, D>
where
    D: Driver,
{
    fn deref_mut(&mut self) -> &mut D {
        self.driver
    }
}

impl<'a, D> Drop for LazyBind<'a, D>
where
    D: Driver,
{
    fn drop(&mut self) {
        if let Some(target) = self.target {
            self.driver.bind_buffer(target, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{DriverCall, RecordingDriver};
    use super::*;

    #[test]
    fn test_lazy_bind_pixel_unpack() {
        let mut driver = RecordingDriver::new();

        {
            let mut bound = LazyBind::new(&mut driver, BufferTarget::PixelUnpack, 7);

            bound.buffer_sub_data(BufferTarget::PixelUnpack, 0, &[1, 2]);
        }

        assert_eq!(
            driver.calls(),
            &[
                DriverCall::BindBuffer(BufferTarget::PixelUnpack, Some(7)),
                DriverCall::BufferSubData(BufferTarget::PixelUnpack, 0, vec![1, 2]),
                DriverCall::BindBuffer(BufferTarget::PixelUnpack, None),
            ]
        );
    }

    #[test]
    fn test_lazy_bind_array_is_noop() {
        let mut driver = RecordingDriver::new();

        {
            let mut bound = LazyBind::new(&mut driver, BufferTarget::Array, 7);

            bound.buffer_sub_data(BufferTarget::Array, 4, &[1]);
        }

        assert_eq!(
            driver.calls(),
            &[DriverCall::BufferSubData(BufferTarget::Array, 4, vec![1])]
        );
    }
}
