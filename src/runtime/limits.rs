use web_sys::WebGl2RenderingContext as Gl;

use crate::driver::Driver;
use crate::runtime::CapabilityTier;

/// Implementation limits reported by the driver when a context is created.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ContextLimits {
    pub max_vertex_attribs: u32,
    pub max_uniform_buffer_bindings: u32,
    pub max_transform_feedback_separate_attribs: u32,
    pub uniform_buffer_offset_alignment: u32,
}

impl ContextLimits {
    pub(crate) fn query<D>(driver: &D, tier: CapabilityTier) -> Self
    where
        D: Driver,
    {
        let max_vertex_attribs = driver.get_parameter(Gl::MAX_VERTEX_ATTRIBS);

        if tier == CapabilityTier::Extended {
            ContextLimits {
                max_vertex_attribs,
                max_uniform_buffer_bindings: driver.get_parameter(Gl::MAX_UNIFORM_BUFFER_BINDINGS),
                max_transform_feedback_separate_attribs: driver
                    .get_parameter(Gl::MAX_TRANSFORM_FEEDBACK_SEPARATE_ATTRIBS),
                uniform_buffer_offset_alignment: driver
                    .get_parameter(Gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT),
            }
        } else {
            ContextLimits {
                max_vertex_attribs,
                max_uniform_buffer_bindings: 0,
                max_transform_feedback_separate_attribs: 0,
                uniform_buffer_offset_alignment: 0,
            }
        }
    }
}
