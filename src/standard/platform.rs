//! A compute platform identifier.

use std::ops::Deref;
use std::str::SplitWhitespace;
use crate::core::{self, PlatformId as PlatformIdCore, PlatformInfo, PlatformInfoResult};
use crate::error::{Error as OclError, Result as OclResult};


#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("No platforms found.")]
    NoPlatforms,
}


/// Extensions of a platform or device.
#[derive(Debug, Clone, PartialEq)]
pub struct Extensions {
    inner: String,
}

impl Extensions {
    pub(crate) fn new(inner: String) -> Extensions {
        Extensions { inner }
    }

    /// Iterate over extensions, split at whitespace.
    pub fn iter(&self) -> SplitWhitespace {
        self.inner.split_whitespace()
    }

    /// Returns true if `ext` is one of the extension tokens.
    pub fn contains(&self, ext: &str) -> bool {
        self.iter().any(|e| e == ext)
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}


/// A platform identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Platform(PlatformIdCore);

impl Platform {
    /// Returns a list of all platforms registered with the runtime.
    pub fn list() -> OclResult<Vec<Platform>> {
        Ok(core::get_platform_ids()?.into_iter().map(Platform::new).collect())
    }

    /// Returns the first available platform or `PlatformError::NoPlatforms`.
    pub fn first() -> OclResult<Platform> {
        core::get_platform_ids()?
            .into_iter()
            .next()
            .map(Platform::new)
            .ok_or_else(|| PlatformError::NoPlatforms.into())
    }

    /// Creates a new `Platform` from a `PlatformIdCore`.
    pub fn new(id_core: PlatformIdCore) -> Platform {
        Platform(id_core)
    }

    /// Returns info about the platform.
    pub fn info(&self, info_kind: PlatformInfo) -> OclResult<PlatformInfoResult> {
        core::get_platform_info(&self.0, info_kind).map_err(OclError::from)
    }

    /// Returns the platform profile as a string.
    pub fn profile(&self) -> OclResult<String> {
        self.info(PlatformInfo::Profile).map(String::from)
    }

    /// Returns the version string of the platform.
    pub fn version(&self) -> OclResult<String> {
        self.info(PlatformInfo::Version).map(String::from)
    }

    /// Returns the platform name as a string.
    pub fn name(&self) -> OclResult<String> {
        self.info(PlatformInfo::Name).map(String::from)
    }

    /// Returns the platform vendor as a string.
    pub fn vendor(&self) -> OclResult<String> {
        self.info(PlatformInfo::Vendor).map(String::from)
    }

    /// Returns the list of platform extensions.
    pub fn extensions(&self) -> OclResult<Extensions> {
        self.info(PlatformInfo::Extensions).map(|e| Extensions::new(e.into()))
    }

    /// Returns a reference to the underlying `PlatformIdCore`.
    pub fn as_core(&self) -> &PlatformIdCore {
        &self.0
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("Profile", &self.info(PlatformInfo::Profile))
            .field("Version", &self.info(PlatformInfo::Version))
            .field("Name", &self.info(PlatformInfo::Name))
            .field("Vendor", &self.info(PlatformInfo::Vendor))
            .field("Extensions", &self.info(PlatformInfo::Extensions))
            .finish()
    }
}

impl From<PlatformIdCore> for Platform {
    fn from(core: PlatformIdCore) -> Platform {
        Platform(core)
    }
}

impl From<Platform> for PlatformIdCore {
    fn from(p: Platform) -> PlatformIdCore {
        p.0
    }
}

impl<'a> From<&'a Platform> for PlatformIdCore {
    fn from(p: &Platform) -> PlatformIdCore {
        p.0.clone()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl Deref for Platform {
    type Target = PlatformIdCore;

    fn deref(&self) -> &PlatformIdCore {
        &self.0
    }
}
