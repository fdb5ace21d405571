//! Standard error type for ocl-harness.
//!

use crate::core::{Error as OclCoreError, Status};
use crate::standard::{BufferCmdError, DeviceError, ImageCmdError, KernelError, PlatformError};

pub type Result<T> = std::result::Result<T, Error>;

/// An error from one of the standard types or the layer beneath them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] OclCoreError),
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),
    #[error("buffer command error: {0}")]
    BufferCmd(#[from] BufferCmdError),
    #[error("image command error: {0}")]
    ImageCmd(#[from] ImageCmdError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
    #[error("{0}")]
    String(String),
}

impl Error {
    /// Returns the status code associated with this error, if any.
    pub fn api_status(&self) -> Option<Status> {
        match *self {
            Error::Core(ref err) => err.api_status(),
            Error::BufferCmd(BufferCmdError::Core(ref err)) => err.api_status(),
            Error::ImageCmd(ImageCmdError::Core(ref err)) => err.api_status(),
            _ => None,
        }
    }

    /// Returns true if a command did not run because one of the events it
    /// waited on failed.
    pub fn is_propagated(&self) -> bool {
        match *self {
            Error::Core(ref err) => err.is_propagated(),
            _ => false,
        }
    }

    /// Returns the wrapped core error, if any.
    pub fn as_core(&self) -> Option<&OclCoreError> {
        match *self {
            Error::Core(ref err) => Some(err),
            Error::BufferCmd(BufferCmdError::Core(ref err)) => Some(err),
            Error::ImageCmd(ImageCmdError::Core(ref err)) => Some(err),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(desc: String) -> Error {
        Error::String(desc)
    }
}

impl<'a> From<&'a str> for Error {
    fn from(desc: &'a str) -> Error {
        Error::String(String::from(desc))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Core(OclCoreError::from(err))
    }
}
