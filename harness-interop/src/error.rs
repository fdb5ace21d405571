use ocl_harness::Error as OclError;

pub type InteropResult<T> = std::result::Result<T, InteropError>;

/// An error raised while bridging a graphics context and a compute context.
#[derive(Debug, thiserror::Error)]
pub enum InteropError {
    #[error("no graphics context is current on this thread")]
    NoCurrentContext,
    #[error("no device accepted a context sharing with the current graphics context")]
    NoSharingDevice,
    #[error("texture data is {found} bytes, {width}x{height} requires {expected}")]
    TextureSize { found: usize, expected: usize, width: usize, height: usize },
    #[error("buffer data is {found} bytes, the buffer holds {len}")]
    BufferSize { found: usize, len: usize },
    #[error("{0}")]
    Ocl(#[from] OclError),
}
