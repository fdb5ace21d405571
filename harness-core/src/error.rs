//! Standard error type for harness-core.
//!

use crate::Status;
use std::fmt;

/// Harness-core error result type.
pub type Result<T> = ::std::result::Result<T, Error>;

/// An API error carrying a status code, the name of the function which
/// produced it, and a short description.
pub struct ApiError {
    status: Status,
    fn_name: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: Status, fn_name: &'static str, detail: S) -> ApiError {
        ApiError {
            status,
            fn_name,
            detail: detail.into(),
        }
    }

    /// Returns the error status code.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the name of the function which produced this error.
    pub fn fn_name(&self) -> &'static str {
        self.fn_name
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.detail.is_empty() {
            write!(f, "{}(): {:?}", self.fn_name, self.status)
        } else {
            write!(f, "{}(): {:?}: {}", self.fn_name, self.status, self.detail)
        }
    }
}

impl fmt::Debug for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An enum one of several error kinds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no compute platform is available")]
    NoPlatform,
    #[error("no compute device is available")]
    NoDevice,
    #[error("device '{device}' does not expose '{query}'")]
    UnsupportedQuery { device: String, query: String },
    #[error("program build failed:\n\n{log}")]
    BuildFailed { log: String },
    #[error("no kernel named '{0}' exists within the program")]
    UnknownEntryPoint(String),
    #[error("{0} belongs to a different context")]
    ForeignResource(&'static str),
    #[error(
        "sub-buffer origin ({origin} bytes) is not a multiple of the device base \
        address alignment ({align} bytes)"
    )]
    MisalignedSubBuffer { origin: usize, align: usize },
    #[error("requested size ({requested} bytes) exceeds the device maximum ({max} bytes)")]
    Oversize { requested: u64, max: u64 },
    #[error("invalid work-group configuration: {0}")]
    InvalidWorkGroup(String),
    #[error("command failed with status: {0:?}")]
    Submit(Status),
    #[error("command did not run, a prerequisite failed with status: {0:?}")]
    Propagated(Status),
    #[error("{0}")]
    Api(ApiError),
    #[error("{0}")]
    Io(#[from] ::std::io::Error),
    #[error("{0}")]
    String(String),
}

impl Error {
    /// Returns the status code associated with this error, if any.
    pub fn api_status(&self) -> Option<Status> {
        match *self {
            Error::Api(ref err) => Some(err.status()),
            Error::Submit(status) | Error::Propagated(status) => Some(status),
            Error::NoDevice => Some(Status::DeviceNotFound),
            Error::BuildFailed { .. } => Some(Status::BuildProgramFailure),
            Error::UnknownEntryPoint(_) => Some(Status::InvalidKernelName),
            Error::MisalignedSubBuffer { .. } => Some(Status::MisalignedSubBufferOffset),
            Error::Oversize { .. } => Some(Status::InvalidBufferSize),
            Error::InvalidWorkGroup(_) => Some(Status::InvalidWorkGroupSize),
            _ => None,
        }
    }

    /// Returns true if this error came from a failed prerequisite.
    pub fn is_propagated(&self) -> bool {
        match *self {
            Error::Propagated(_) => true,
            _ => false,
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

impl From<String> for Error {
    fn from(desc: String) -> Self {
        Error::String(desc)
    }
}

impl<'a> From<&'a str> for Error {
    fn from(desc: &'a str) -> Self {
        Error::String(String::from(desc))
    }
}

/// Shorthand for an `Error::Api`.
pub(crate) fn api_err<S: Into<String>>(status: Status, fn_name: &'static str, detail: S) -> Error {
    Error::Api(ApiError::new(status, fn_name, detail))
}
