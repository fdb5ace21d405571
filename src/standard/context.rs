//! A compute context.

use std::ops::Deref;
use crate::core::{self, Context as ContextCore, ContextInfo, ContextInfoResult, ContextProperties,
    ContextPropertyValue, DeviceInfo, DeviceInfoResult, PlatformInfo, PlatformInfoResult};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Device, DeviceSpecifier, Platform};


/// A context for a particular platform and set of devices.
///
/// Clone, store, and share between threads freely. Every resource created
/// within a context holds a reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context(ContextCore);

impl Context {
    /// Returns a [`ContextBuilder`](struct.ContextBuilder.html).
    ///
    /// This is the preferred way to create a Context.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Returns a newly created context.
    ///
    /// The platform property, if any, selects the platform devices are
    /// resolved on. Otherwise the first platform is used. All devices of
    /// that platform are used if `device_spec` is `None`.
    pub fn new(properties: Option<ContextProperties>, device_spec: Option<DeviceSpecifier>)
            -> OclResult<Context> {
        let platform: Option<Platform> = properties.as_ref()
            .and_then(|props| props.get_platform())
            .map(|p| Platform::new(p.clone()));

        let device_spec = device_spec.unwrap_or_default();
        let device_list: Vec<_> = device_spec.to_device_list(platform)?
            .into_iter()
            .map(|d| d.as_core().clone())
            .collect();

        let obj_core = core::create_context(properties.as_ref(), &device_list)?;
        Ok(Context(obj_core))
    }

    /// Resolves a list of zero-based device indices into a list of Devices.
    ///
    /// Out of bounds indices wrap around (`%`).
    pub fn resolve_wrapping_device_idxs(&self, idxs: &[usize]) -> Vec<Device> {
        Device::resolve_idxs_wrap(idxs, &self.devices())
    }

    /// Returns a device by its wrapping ordinal within this context.
    pub fn get_device_by_wrapping_index(&self, index: usize) -> Option<Device> {
        self.resolve_wrapping_device_idxs(&[index]).into_iter().next()
    }

    /// Returns info about the platform associated with the context.
    pub fn platform_info(&self, info_kind: PlatformInfo) -> OclResult<PlatformInfoResult> {
        self.platform().info(info_kind)
    }

    /// Returns info about the device indexed by `index` associated with this
    /// context.
    pub fn device_info(&self, index: usize, info_kind: DeviceInfo) -> OclResult<DeviceInfoResult> {
        match self.0.devices().get(index) {
            Some(d) => core::get_device_info(d, info_kind).map_err(OclError::from),
            None => Err(OclError::from("Context::device_info: Invalid device index")),
        }
    }

    /// Returns info about the context.
    pub fn info(&self, info_kind: ContextInfo) -> OclResult<ContextInfoResult> {
        core::get_context_info(&self.0, info_kind).map_err(OclError::from)
    }

    /// Returns the number of live handles to this context, including those
    /// held by its resources.
    pub fn ref_count(&self) -> u32 {
        self.0.ref_count()
    }

    /// Returns a reference to the core handle, usable by functions in the
    /// `core` module.
    #[inline]
    pub fn as_core(&self) -> &ContextCore {
        &self.0
    }

    /// Returns the list of devices associated with this context.
    pub fn devices(&self) -> Vec<Device> {
        self.0.devices().iter().cloned().map(Device::from).collect()
    }

    /// Returns the platform this context is associated with.
    pub fn platform(&self) -> Platform {
        Platform::new(self.0.platform().clone())
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("ReferenceCount", &self.info(ContextInfo::ReferenceCount))
            .field("Devices", &self.info(ContextInfo::Devices))
            .field("Properties", &self.info(ContextInfo::Properties))
            .field("NumDevices", &self.info(ContextInfo::NumDevices))
            .finish()
    }
}

impl From<ContextCore> for Context {
    fn from(c: ContextCore) -> Context {
        Context(c)
    }
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl Deref for Context {
    type Target = ContextCore;

    fn deref(&self) -> &ContextCore {
        &self.0
    }
}


/// A builder for `Context`.
#[must_use = "builders do nothing unless '::build' is called"]
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    properties: ContextProperties,
    device_spec: Option<DeviceSpecifier>,
}

impl ContextBuilder {
    /// Creates a new `ContextBuilder`
    ///
    /// Use `Context::builder().build()` for defaults.
    ///
    /// ## Defaults
    ///
    /// * The first available platform
    /// * All devices associated with that platform
    pub fn new() -> ContextBuilder {
        ContextBuilder {
            properties: ContextProperties::new(),
            device_spec: None,
        }
    }

    /// Specifies all context properties directly.
    ///
    /// Overwrites all previously specified properties.
    pub fn properties(&mut self, properties: ContextProperties) -> &mut ContextBuilder {
        self.properties = properties;
        self
    }

    /// Specifies a context property.
    pub fn property(&mut self, prop_val: ContextPropertyValue) -> &mut ContextBuilder {
        self.properties = self.properties.clone().and(prop_val);
        self
    }

    /// Specifies a platform.
    ///
    /// Overwrites any previously specified platform.
    pub fn platform(&mut self, platform: Platform) -> &mut ContextBuilder {
        self.properties = self.properties.clone().platform(platform.into());
        self
    }

    /// Specifies a graphics context handle to share objects with.
    pub fn gl_context(&mut self, gl_handle: usize) -> &mut ContextBuilder {
        self.properties = self.properties.clone().gl_context(gl_handle);
        self
    }

    /// Specifies a display handle for a GLX context.
    pub fn glx_display(&mut self, glx_display: usize) -> &mut ContextBuilder {
        self.properties = self.properties.clone().glx_display(glx_display);
        self
    }

    /// Specifies the devices with which to associate the context.
    ///
    /// Devices may be specified in any number of ways including simply
    /// passing a device or slice of devices. See the `From` impls of
    /// [`DeviceSpecifier`](enum.DeviceSpecifier.html).
    ///
    /// ## Panics
    ///
    /// Devices must not have already been specified.
    pub fn devices<D: Into<DeviceSpecifier>>(&mut self, device_spec: D) -> &mut ContextBuilder {
        assert!(self.device_spec.is_none(), "ContextBuilder::devices: Devices already specified");
        self.device_spec = Some(device_spec.into());
        self
    }

    /// Returns a new `Context` with the parameters specified so far.
    pub fn build(&self) -> OclResult<Context> {
        Context::new(Some(self.properties.clone()), self.device_spec.clone())
    }
}

impl Default for ContextBuilder {
    fn default() -> ContextBuilder {
        ContextBuilder::new()
    }
}
