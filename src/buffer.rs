use std::cell::{Cell, RefCell};
use std::convert::TryFrom;
use std::fmt;
use std::rc::Rc;

use web_sys::WebGl2RenderingContext as Gl;

use crate::driver::{Driver, DriverId, LazyBind};
use crate::error::GlError;
use crate::runtime::dropper::{DropObject, Dropper};
use crate::runtime::CapabilityTier;

/// The binding points a [Buffer] may be attached to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BufferTarget {
    Array,
    ElementArray,
    CopyRead,
    CopyWrite,
    PixelPack,
    PixelUnpack,
    TransformFeedback,
    Uniform,
}

impl BufferTarget {
    pub fn gl_id(&self) -> u32 {
        match self {
            BufferTarget::Array => Gl::ARRAY_BUFFER,
            BufferTarget::ElementArray => Gl::ELEMENT_ARRAY_BUFFER,
            BufferTarget::CopyRead => Gl::COPY_READ_BUFFER,
            BufferTarget::CopyWrite => Gl::COPY_WRITE_BUFFER,
            BufferTarget::PixelPack => Gl::PIXEL_PACK_BUFFER,
            BufferTarget::PixelUnpack => Gl::PIXEL_UNPACK_BUFFER,
            BufferTarget::TransformFeedback => Gl::TRANSFORM_FEEDBACK_BUFFER,
            BufferTarget::Uniform => Gl::UNIFORM_BUFFER,
        }
    }

    pub fn from_gl_id(id: u32) -> Option<Self> {
        match id {
            Gl::ARRAY_BUFFER => Some(BufferTarget::Array),
            Gl::ELEMENT_ARRAY_BUFFER => Some(BufferTarget::ElementArray),
            Gl::COPY_READ_BUFFER => Some(BufferTarget::CopyRead),
            Gl::COPY_WRITE_BUFFER => Some(BufferTarget::CopyWrite),
            Gl::PIXEL_PACK_BUFFER => Some(BufferTarget::PixelPack),
            Gl::PIXEL_UNPACK_BUFFER => Some(BufferTarget::PixelUnpack),
            Gl::TRANSFORM_FEEDBACK_BUFFER => Some(BufferTarget::TransformFeedback),
            Gl::UNIFORM_BUFFER => Some(BufferTarget::Uniform),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BufferTarget::Array => "ARRAY_BUFFER",
            BufferTarget::ElementArray => "ELEMENT_ARRAY_BUFFER",
            BufferTarget::CopyRead => "COPY_READ_BUFFER",
            BufferTarget::CopyWrite => "COPY_WRITE_BUFFER",
            BufferTarget::PixelPack => "PIXEL_PACK_BUFFER",
            BufferTarget::PixelUnpack => "PIXEL_UNPACK_BUFFER",
            BufferTarget::TransformFeedback => "TRANSFORM_FEEDBACK_BUFFER",
            BufferTarget::Uniform => "UNIFORM_BUFFER",
        }
    }

    pub(crate) fn is_pixel_transfer(&self) -> bool {
        match self {
            BufferTarget::PixelPack | BufferTarget::PixelUnpack => true,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
    StaticRead,
    DynamicRead,
    StreamRead,
    StaticCopy,
    DynamicCopy,
    StreamCopy,
}

impl BufferUsage {
    pub fn gl_id(&self) -> u32 {
        match self {
            BufferUsage::StaticDraw => Gl::STATIC_DRAW,
            BufferUsage::DynamicDraw => Gl::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => Gl::STREAM_DRAW,
            BufferUsage::StaticRead => Gl::STATIC_READ,
            BufferUsage::DynamicRead => Gl::DYNAMIC_READ,
            BufferUsage::StreamRead => Gl::STREAM_READ,
            BufferUsage::StaticCopy => Gl::STATIC_COPY,
            BufferUsage::DynamicCopy => Gl::DYNAMIC_COPY,
            BufferUsage::StreamCopy => Gl::STREAM_COPY,
        }
    }

    /// Resolves a usage hint enumerant, taking into account that the `READ` and `COPY` hints
    /// are only available in the extended tier.
    pub fn from_gl_id(id: u32, tier: CapabilityTier) -> Option<Self> {
        let usage = match id {
            Gl::STATIC_DRAW => BufferUsage::StaticDraw,
            Gl::DYNAMIC_DRAW => BufferUsage::DynamicDraw,
            Gl::STREAM_DRAW => BufferUsage::StreamDraw,
            Gl::STATIC_READ => BufferUsage::StaticRead,
            Gl::DYNAMIC_READ => BufferUsage::DynamicRead,
            Gl::STREAM_READ => BufferUsage::StreamRead,
            Gl::STATIC_COPY => BufferUsage::StaticCopy,
            Gl::DYNAMIC_COPY => BufferUsage::DynamicCopy,
            Gl::STREAM_COPY => BufferUsage::StreamCopy,
            _ => return None,
        };

        let is_draw_usage = match usage {
            BufferUsage::StaticDraw | BufferUsage::DynamicDraw | BufferUsage::StreamDraw => true,
            _ => false,
        };

        if is_draw_usage || tier == CapabilityTier::Extended {
            Some(usage)
        } else {
            None
        }
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        BufferUsage::StaticDraw
    }
}

/// How the contents of a buffer are interpreted.
///
/// A buffer's content kind is decided by the first target it is bound to and can not change
/// afterwards: a buffer holding index data can not later be used for other data and vice versa.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BufferContent {
    Undefined,
    Indices,
    Generic,
}

/// The type of the indices in an index buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
    UnsignedInt,
}

impl IndexType {
    pub fn from_gl_id(id: u32) -> Option<Self> {
        match id {
            Gl::UNSIGNED_BYTE => Some(IndexType::UnsignedByte),
            Gl::UNSIGNED_SHORT => Some(IndexType::UnsignedShort),
            Gl::UNSIGNED_INT => Some(IndexType::UnsignedInt),
            _ => None,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
            IndexType::UnsignedInt => 4,
        }
    }
}

/// A shared handle to a buffer object.
///
/// Cloning a handle does not copy the buffer: all clones refer to the same buffer object and
/// compare equal. The driver object is destroyed once the last handle (including handles held by
/// binding points) has been dropped.
#[derive(Clone)]
pub struct Buffer {
    object: Rc<BufferObject>,
}

struct BufferObject {
    id: DriverId,
    context_id: u64,
    dropper: Rc<dyn Dropper>,
    delete_requested: Cell<bool>,
    content: Cell<BufferContent>,
    byte_length: Cell<usize>,
    usage: Cell<BufferUsage>,
    active_transform_feedbacks: Cell<u32>,
    // `None` if the owning context does not shadow buffer data.
    shadow: RefCell<Option<Vec<u8>>>,
}

impl Buffer {
    pub(crate) fn new(
        id: DriverId,
        context_id: u64,
        dropper: Rc<dyn Dropper>,
        shadow_data: bool,
    ) -> Self {
        Buffer {
            object: Rc::new(BufferObject {
                id,
                context_id,
                dropper,
                delete_requested: Cell::new(false),
                content: Cell::new(BufferContent::Undefined),
                byte_length: Cell::new(0),
                usage: Cell::new(BufferUsage::default()),
                active_transform_feedbacks: Cell::new(0),
                shadow: RefCell::new(if shadow_data { Some(Vec::new()) } else { None }),
            }),
        }
    }

    pub fn content(&self) -> BufferContent {
        self.object.content.get()
    }

    pub fn byte_length(&self) -> usize {
        self.object.byte_length.get()
    }

    pub fn usage(&self) -> BufferUsage {
        self.object.usage.get()
    }

    /// Whether [delete_buffer](crate::runtime::SingleThreadedContext::delete_buffer) has been
    /// called for this buffer.
    pub fn is_delete_requested(&self) -> bool {
        self.object.delete_requested.get()
    }

    /// The number of active transform feedback operations currently writing to this buffer.
    pub fn active_transform_feedback_count(&self) -> u32 {
        self.object.active_transform_feedbacks.get()
    }

    /// Calls `f` with the CPU-side copy of this buffer's data.
    ///
    /// Returns `None` if the context that created this buffer does not shadow buffer data.
    pub fn with_shadow<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        self.object.shadow.borrow().as_ref().map(|data| f(data))
    }

    /// Returns the largest index among the `count` indices of type `index_type` that start at
    /// `byte_offset`, read from the shadow copy of this buffer's data.
    ///
    /// Returns `None` if the buffer's data is not shadowed, if `count` is zero or if the range
    /// does not fit in the buffer.
    pub fn max_index(&self, index_type: IndexType, byte_offset: usize, count: usize) -> Option<u32> {
        let byte_count = count.checked_mul(index_type.size_in_bytes())?;
        let end = byte_offset.checked_add(byte_count)?;

        if count == 0 {
            return None;
        }

        let shadow = self.object.shadow.borrow();
        let data = shadow.as_ref()?.get(byte_offset..end)?;

        match index_type {
            IndexType::UnsignedByte => data.iter().map(|b| *b as u32).max(),
            IndexType::UnsignedShort => data
                .chunks_exact(2)
                .map(|c| u16::from_ne_bytes([c[0], c[1]]) as u32)
                .max(),
            IndexType::UnsignedInt => data
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .max(),
        }
    }

    pub(crate) fn driver_id(&self) -> DriverId {
        self.object.id
    }

    pub(crate) fn context_id(&self) -> u64 {
        self.object.context_id
    }

    pub(crate) fn request_delete(&self) {
        self.object.delete_requested.set(true);
    }

    pub(crate) fn can_bind_to_target(
        &self,
        func_name: &str,
        target: BufferTarget,
    ) -> Result<(), GlError> {
        let content = self.content();

        let compatible = match (content, target) {
            (BufferContent::Undefined, _) => true,
            (_, BufferTarget::CopyRead) | (_, BufferTarget::CopyWrite) => true,
            (BufferContent::Indices, BufferTarget::ElementArray) => true,
            (BufferContent::Generic, BufferTarget::ElementArray) => false,
            (BufferContent::Generic, _) => true,
            (BufferContent::Indices, _) => false,
        };

        if compatible {
            Ok(())
        } else {
            let data_type = if content == BufferContent::Generic {
                "other"
            } else {
                "element"
            };

            Err(GlError::InvalidOperation(format!(
                "{}: Buffer already contains {} data.",
                func_name, data_type
            )))
        }
    }

    pub(crate) fn set_content_after_bind(&self, target: BufferTarget) {
        if self.content() != BufferContent::Undefined {
            return;
        }

        match target {
            BufferTarget::ElementArray => self.object.content.set(BufferContent::Indices),
            BufferTarget::CopyRead | BufferTarget::CopyWrite => (),
            _ => self.object.content.set(BufferContent::Generic),
        }
    }

    /// Replaces the buffer's data store with a copy of `data`.
    ///
    /// `target` must be the target this buffer is currently bound to.
    pub(crate) fn buffer_data<D>(
        &self,
        func_name: &str,
        driver: &mut D,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<(), GlError>
    where
        D: Driver,
    {
        if i64::try_from(data.len()).is_err() {
            return Err(GlError::OutOfMemory(format!("{}: bad size", func_name)));
        }

        let new_shadow = if self.object.shadow.borrow().is_some() {
            let mut copy = Vec::new();

            copy.try_reserve_exact(data.len()).map_err(|_| {
                GlError::OutOfMemory(format!("{}: Failed to allocate shadow copy.", func_name))
            })?;
            copy.extend_from_slice(data);

            Some(copy)
        } else {
            None
        };

        LazyBind::new(driver, target, self.driver_id()).buffer_data(target, data, usage);

        self.object.usage.set(usage);
        self.object.byte_length.set(data.len());
        *self.object.shadow.borrow_mut() = new_shadow;

        Ok(())
    }

    pub(crate) fn validate_range(
        &self,
        func_name: &str,
        offset: usize,
        len: usize,
    ) -> Result<(), GlError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.byte_length() => Ok(()),
            _ => Err(GlError::InvalidOperation(format!(
                "{}: Invalid range: offset {} and length {} exceed the buffer's byte length {}.",
                func_name,
                offset,
                len,
                self.byte_length()
            ))),
        }
    }

    /// Keeps the shadow copy in sync with a sub-data upload that already passed
    /// [validate_range](Buffer::validate_range).
    pub(crate) fn update_shadow(&self, offset: usize, data: &[u8]) {
        if let Some(shadow) = self.object.shadow.borrow_mut().as_mut() {
            shadow[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    pub(crate) fn attach_transform_feedback(&self) {
        let count = self.object.active_transform_feedbacks.get();

        self.object.active_transform_feedbacks.set(count + 1);
    }

    pub(crate) fn detach_transform_feedback(&self) {
        let count = self.object.active_transform_feedbacks.get();

        self.object
            .active_transform_feedbacks
            .set(count.saturating_sub(1));
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }
}

impl Eq for Buffer {}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.object.id)
            .field("content", &self.content())
            .field("byte_length", &self.byte_length())
            .field("delete_requested", &self.is_delete_requested())
            .finish()
    }
}

impl Drop for BufferObject {
    fn drop(&mut self) {
        self.dropper.drop_gl_object(DropObject::Buffer(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::driver::recording::{DriverCall, RecordingDriver};
    use crate::runtime::dropper::DropQueue;

    fn buffer(shadow_data: bool) -> (Buffer, Rc<DropQueue>) {
        let queue = Rc::new(DropQueue::default());
        let buffer = Buffer::new(1, 0, queue.clone(), shadow_data);

        (buffer, queue)
    }

    #[test]
    fn test_target_gl_id_round_trip() {
        assert_eq!(
            BufferTarget::from_gl_id(Gl::UNIFORM_BUFFER),
            Some(BufferTarget::Uniform)
        );
        assert_eq!(BufferTarget::from_gl_id(Gl::TEXTURE_2D), None);
        assert_eq!(BufferTarget::PixelPack.gl_id(), Gl::PIXEL_PACK_BUFFER);
    }

    #[test]
    fn test_usage_tier_gating() {
        assert_eq!(
            BufferUsage::from_gl_id(Gl::STREAM_DRAW, CapabilityTier::Base),
            Some(BufferUsage::StreamDraw)
        );
        assert_eq!(
            BufferUsage::from_gl_id(Gl::STATIC_READ, CapabilityTier::Base),
            None
        );
        assert_eq!(
            BufferUsage::from_gl_id(Gl::STATIC_READ, CapabilityTier::Extended),
            Some(BufferUsage::StaticRead)
        );
        assert_eq!(
            BufferUsage::from_gl_id(Gl::ARRAY_BUFFER, CapabilityTier::Extended),
            None
        );
    }

    #[test]
    fn test_content_fixed_by_first_bind() {
        let (buffer, _queue) = buffer(true);

        buffer.set_content_after_bind(BufferTarget::CopyRead);
        assert_eq!(buffer.content(), BufferContent::Undefined);

        buffer.set_content_after_bind(BufferTarget::ElementArray);
        assert_eq!(buffer.content(), BufferContent::Indices);

        buffer.set_content_after_bind(BufferTarget::Array);
        assert_eq!(buffer.content(), BufferContent::Indices);
    }

    #[test]
    fn test_can_bind_to_target() {
        let (buffer, _queue) = buffer(true);

        assert!(buffer.can_bind_to_target("f", BufferTarget::Uniform).is_ok());

        buffer.set_content_after_bind(BufferTarget::ElementArray);

        assert!(buffer
            .can_bind_to_target("f", BufferTarget::ElementArray)
            .is_ok());
        assert!(buffer.can_bind_to_target("f", BufferTarget::CopyWrite).is_ok());
        assert_eq!(
            buffer.can_bind_to_target("f", BufferTarget::Uniform),
            Err(GlError::InvalidOperation(
                "f: Buffer already contains element data.".into()
            ))
        );

        let (other, _queue) = self::buffer(true);

        other.set_content_after_bind(BufferTarget::Array);

        assert!(other
            .can_bind_to_target("f", BufferTarget::ElementArray)
            .is_err());
        assert!(other
            .can_bind_to_target("f", BufferTarget::TransformFeedback)
            .is_ok());
    }

    #[test]
    fn test_buffer_data_and_range() {
        let (buffer, _queue) = buffer(true);
        let mut driver = RecordingDriver::new();

        buffer
            .buffer_data(
                "f",
                &mut driver,
                BufferTarget::Array,
                &[0; 8],
                BufferUsage::DynamicDraw,
            )
            .unwrap();

        assert_eq!(buffer.byte_length(), 8);
        assert_eq!(buffer.usage(), BufferUsage::DynamicDraw);
        assert_eq!(
            driver.calls(),
            &[DriverCall::BufferData(
                BufferTarget::Array,
                vec![0; 8],
                BufferUsage::DynamicDraw
            )]
        );

        assert!(buffer.validate_range("f", 4, 4).is_ok());
        assert!(buffer.validate_range("f", 8, 0).is_ok());
        assert!(buffer.validate_range("f", 5, 4).is_err());
        assert!(buffer.validate_range("f", usize::MAX, 2).is_err());

        buffer.update_shadow(2, &[9, 9]);

        assert_eq!(
            buffer.with_shadow(|data| data.to_vec()),
            Some(vec![0, 0, 9, 9, 0, 0, 0, 0])
        );
    }

    #[test]
    fn test_no_shadow() {
        let (buffer, _queue) = buffer(false);
        let mut driver = RecordingDriver::new();

        buffer
            .buffer_data(
                "f",
                &mut driver,
                BufferTarget::Array,
                &[1, 2, 3],
                BufferUsage::StaticDraw,
            )
            .unwrap();

        buffer.update_shadow(0, &[4]);

        assert_eq!(buffer.with_shadow(|data| data.len()), None);
        assert_eq!(buffer.max_index(IndexType::UnsignedByte, 0, 3), None);
    }

    #[test]
    fn test_max_index() {
        let (buffer, _queue) = buffer(true);
        let mut driver = RecordingDriver::new();
        let mut data = Vec::new();

        for index in &[3u16, 900, 12, 7] {
            data.extend_from_slice(&index.to_ne_bytes());
        }

        buffer
            .buffer_data(
                "f",
                &mut driver,
                BufferTarget::ElementArray,
                &data,
                BufferUsage::StaticDraw,
            )
            .unwrap();

        assert_eq!(buffer.max_index(IndexType::UnsignedShort, 0, 4), Some(900));
        assert_eq!(buffer.max_index(IndexType::UnsignedShort, 4, 2), Some(12));
        assert_eq!(buffer.max_index(IndexType::UnsignedShort, 4, 3), None);
        assert_eq!(buffer.max_index(IndexType::UnsignedShort, 0, 0), None);
    }

    #[test]
    fn test_transform_feedback_attachments() {
        let (buffer, _queue) = buffer(true);

        buffer.attach_transform_feedback();
        buffer.attach_transform_feedback();
        buffer.detach_transform_feedback();

        assert_eq!(buffer.active_transform_feedback_count(), 1);
    }

    #[test]
    fn test_drop_queues_driver_object() {
        let (buffer, queue) = buffer(true);
        let clone = buffer.clone();

        drop(buffer);
        assert!(queue.take().is_empty());

        drop(clone);
        assert_eq!(queue.take(), vec![DropObject::Buffer(1)]);
    }
}
