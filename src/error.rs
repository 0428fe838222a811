use thiserror::Error;

use web_sys::WebGl2RenderingContext as Gl;

/// An error recorded by a rendering context.
///
/// Errors never abort the program: the operation that produced the error is abandoned without
/// modifying any state and the error is recorded on the context, where it may be retrieved with
/// [SingleThreadedContext::get_error](crate::runtime::SingleThreadedContext::get_error).
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum GlError {
    #[error("INVALID_ENUM: {0}")]
    InvalidEnum(String),
    #[error("INVALID_OPERATION: {0}")]
    InvalidOperation(String),
    #[error("INVALID_VALUE: {0}")]
    InvalidValue(String),
    #[error("OUT_OF_MEMORY: {0}")]
    OutOfMemory(String),
}

impl GlError {
    /// The GL error constant that corresponds to this error.
    pub fn gl_id(&self) -> u32 {
        match self {
            GlError::InvalidEnum(_) => Gl::INVALID_ENUM,
            GlError::InvalidOperation(_) => Gl::INVALID_OPERATION,
            GlError::InvalidValue(_) => Gl::INVALID_VALUE,
            GlError::OutOfMemory(_) => Gl::OUT_OF_MEMORY,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GlError::InvalidEnum(message)
            | GlError::InvalidOperation(message)
            | GlError::InvalidValue(message)
            | GlError::OutOfMemory(message) => message,
        }
    }
}

pub(crate) fn validate_non_negative(
    func_name: &str,
    arg_name: &str,
    value: i64,
) -> Result<(), GlError> {
    if value < 0 {
        Err(GlError::InvalidValue(format!(
            "{}: `{}` must be non-negative.",
            func_name, arg_name
        )))
    } else {
        Ok(())
    }
}

/// Keeps the first error reported since it was last read, mirroring the GL error flag.
#[derive(Default)]
pub(crate) struct ErrorRecorder {
    first_unread: Option<GlError>,
}

impl ErrorRecorder {
    pub(crate) fn report(&mut self, error: GlError) {
        log::warn!("{}", error);

        if self.first_unread.is_none() {
            self.first_unread = Some(error);
        }
    }

    pub(crate) fn take(&mut self) -> Option<GlError> {
        self.first_unread.take()
    }
}
