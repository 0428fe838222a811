//! Tracks which buffers are bound to the binding points of a WebGL 2.0 rendering context.
//!
//! A [SingleThreadedContext](runtime::SingleThreadedContext) mirrors the buffer binding state of
//! its [Driver](driver::Driver): the generic binding for every buffer target, the indexed
//! binding tables for uniform and transform feedback buffers, and the buffers referenced by the
//! vertex attribute array. Every bind request is validated against the rules WebGL imposes on its
//! target before it reaches the driver, and deleting a buffer detaches it from every binding
//! point it was attached to.
//!
//! # Example
//!
//! ```no_run
//! use web_glitz_bindings::driver::WebGl2Driver;
//! use web_glitz_bindings::runtime::{ContextOptions, SingleThreadedContext};
//! use web_sys::WebGl2RenderingContext as Gl;
//!
//! # fn wrapper(gl: Gl) {
//! let mut context = SingleThreadedContext::new(WebGl2Driver::new(gl), ContextOptions::default());
//!
//! if let Some(buffer) = context.create_buffer() {
//!     context.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
//!     context.buffer_data(Gl::ARRAY_BUFFER, &[0; 64], Gl::STATIC_DRAW);
//!     context.delete_buffer(Some(&buffer));
//! }
//!
//! assert!(context.get_error().is_none());
//! # }
//! ```

pub mod buffer;
pub mod driver;
pub mod error;
pub mod runtime;
pub mod transform_feedback;
pub mod vertex;
