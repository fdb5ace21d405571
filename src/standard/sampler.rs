//! An image sampler.

use std::ops::Deref;
use crate::core::{self, AddressingMode, FilterMode, Sampler as SamplerCore, SamplerInfo,
    SamplerInfoResult};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::Context;


/// An image sampler used to read images from within kernels.
///
/// Sampler arguments are bound with `KernelBuilder::arg_sampler` or
/// `Kernel::set_arg_sampler`.
#[derive(Clone, Debug)]
pub struct Sampler(SamplerCore);

impl Sampler {
    /// Creates and returns a new sampler.
    ///
    /// ## Parameters
    ///
    /// * `normalize_coords`: whether image coordinates are normalized to
    ///   [0.0, 1.0] (`true`) or given in pixels (`false`).
    /// * `addressing_mode`: how out of range coordinates are handled.
    ///   `Repeat` and `MirroredRepeat` require normalized coordinates.
    /// * `filter_mode`: `Nearest` or `Linear`.
    pub fn new(context: &Context, normalize_coords: bool, addressing_mode: AddressingMode,
            filter_mode: FilterMode) -> OclResult<Sampler> {
        let sampler_core = core::create_sampler(context.as_core(), normalize_coords,
            addressing_mode, filter_mode)?;
        Ok(Sampler(sampler_core))
    }

    /// Creates a sampler with unnormalized coordinates, no addressing mode,
    /// and nearest filtering.
    pub fn with_defaults(context: &Context) -> OclResult<Sampler> {
        Sampler::new(context, false, AddressingMode::None, FilterMode::Nearest)
    }

    /// Returns various kinds of information about the sampler.
    pub fn info(&self, info_kind: SamplerInfo) -> OclResult<SamplerInfoResult> {
        core::get_sampler_info(&self.0, info_kind).map_err(OclError::from)
    }

    /// Returns a reference to the core pointer wrapper, usable by functions in
    /// the `core` module.
    #[inline]
    pub fn as_core(&self) -> &SamplerCore {
        &self.0
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("ReferenceCount", &self.info(SamplerInfo::ReferenceCount))
            .field("NormalizedCoords", &self.info(SamplerInfo::NormalizedCoords))
            .field("AddressingMode", &self.info(SamplerInfo::AddressingMode))
            .field("FilterMode", &self.info(SamplerInfo::FilterMode))
            .finish()
    }
}

impl std::fmt::Display for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl Deref for Sampler {
    type Target = SamplerCore;

    fn deref(&self) -> &SamplerCore {
        &self.0
    }
}
