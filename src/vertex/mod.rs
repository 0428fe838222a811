use web_sys::WebGl2RenderingContext as Gl;

use crate::runtime::CapabilityTier;

mod vertex_array;
pub use self::vertex_array::{AttributePointer, VertexArray, VertexAttribute};

/// The data type of the components of a vertex attribute, as stored in a buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Float,
    HalfFloat,
    Int,
    UnsignedInt,
    Int2101010Rev,
    UnsignedInt2101010Rev,
}

impl ComponentType {
    pub fn gl_id(&self) -> u32 {
        match self {
            ComponentType::Byte => Gl::BYTE,
            ComponentType::UnsignedByte => Gl::UNSIGNED_BYTE,
            ComponentType::Short => Gl::SHORT,
            ComponentType::UnsignedShort => Gl::UNSIGNED_SHORT,
            ComponentType::Float => Gl::FLOAT,
            ComponentType::HalfFloat => Gl::HALF_FLOAT,
            ComponentType::Int => Gl::INT,
            ComponentType::UnsignedInt => Gl::UNSIGNED_INT,
            ComponentType::Int2101010Rev => Gl::INT_2_10_10_10_REV,
            ComponentType::UnsignedInt2101010Rev => Gl::UNSIGNED_INT_2_10_10_10_REV,
        }
    }

    /// Resolves a component type enumerant. Half floats, 32-bit integers and the packed types
    /// are only available in the extended tier.
    pub fn from_gl_id(id: u32, tier: CapabilityTier) -> Option<Self> {
        let component_type = match id {
            Gl::BYTE => ComponentType::Byte,
            Gl::UNSIGNED_BYTE => ComponentType::UnsignedByte,
            Gl::SHORT => ComponentType::Short,
            Gl::UNSIGNED_SHORT => ComponentType::UnsignedShort,
            Gl::FLOAT => ComponentType::Float,
            Gl::HALF_FLOAT => ComponentType::HalfFloat,
            Gl::INT => ComponentType::Int,
            Gl::UNSIGNED_INT => ComponentType::UnsignedInt,
            Gl::INT_2_10_10_10_REV => ComponentType::Int2101010Rev,
            Gl::UNSIGNED_INT_2_10_10_10_REV => ComponentType::UnsignedInt2101010Rev,
            _ => return None,
        };

        let in_base_tier = match component_type {
            ComponentType::Byte
            | ComponentType::UnsignedByte
            | ComponentType::Short
            | ComponentType::UnsignedShort
            | ComponentType::Float => true,
            _ => false,
        };

        if in_base_tier || tier == CapabilityTier::Extended {
            Some(component_type)
        } else {
            None
        }
    }

    pub fn size_in_bytes(&self) -> i64 {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort | ComponentType::HalfFloat => 2,
            _ => 4,
        }
    }

    /// Whether all components are packed into a single 32 bit value.
    pub fn is_packed(&self) -> bool {
        match self {
            ComponentType::Int2101010Rev | ComponentType::UnsignedInt2101010Rev => true,
            _ => false,
        }
    }
}
