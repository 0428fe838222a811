//! Provides the rendering context that owns the buffer binding table.
//!
//! Only a single threaded runtime is provided, see [SingleThreadedContext]. Callers that issue
//! commands from more than one place must serialize their access to the context.

mod context_options;
pub use self::context_options::{CapabilityTier, ContextOptions, ContextOptionsBuilder};

mod limits;
pub use self::limits::ContextLimits;

mod single_threaded;
pub use self::single_threaded::SingleThreadedContext;

pub mod state;

pub(crate) mod dropper;
