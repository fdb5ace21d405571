//! A compute device identifier and related types.

use std::borrow::Borrow;
use std::ops::Deref;
use log::debug;
use crate::core::{self, DeviceId as DeviceIdCore, DeviceInfo, DeviceInfoResult, DeviceType,
    Error as OclCoreError};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Extensions, Platform};


#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device index out of range (index: {idx}, device count: {count}).")]
    IndexOutOfRange { idx: usize, count: usize },
    #[error("No devices found on the platform.")]
    NoDevices,
    #[error("Unexpected result for '{0:?}': {1}")]
    UnexpectedResult(DeviceInfo, DeviceInfoResult),
}


/// Specifies what boils down to a list of devices.
///
/// The `Indices` variant fails if an index is out of range for the
/// platform. `WrappingIndices` wraps around (`%`) instead.
///
/// `TypeFlags` selects devices by a `DeviceType` bitfield and is the most
/// portable. `PreferGpu` selects the first GPU, falling back to the first
/// CPU.
#[derive(Debug, Clone)]
pub enum DeviceSpecifier {
    All,
    First,
    Single(Device),
    List(Vec<Device>),
    Indices(Vec<usize>),
    WrappingIndices(Vec<usize>),
    TypeFlags(DeviceType),
    PreferGpu,
}

impl DeviceSpecifier {
    /// Returns a `DeviceSpecifier::All` variant which specifies all
    /// devices on a platform.
    pub fn all(self) -> DeviceSpecifier {
        DeviceSpecifier::All
    }

    /// Returns a `DeviceSpecifier::First` variant which specifies only
    /// the first device on a platform.
    pub fn first(self) -> DeviceSpecifier {
        DeviceSpecifier::First
    }

    /// Returns a `DeviceSpecifier::Single` variant which specifies a single
    /// device.
    pub fn single(self, device: Device) -> DeviceSpecifier {
        DeviceSpecifier::Single(device)
    }

    /// Returns a `DeviceSpecifier::List` variant which specifies a list of
    /// devices.
    pub fn list(self, list: Vec<Device>) -> DeviceSpecifier {
        DeviceSpecifier::List(list)
    }

    /// Returns a `DeviceSpecifier::Indices` variant which specifies a list of
    /// devices by index.
    pub fn indices(self, indices: Vec<usize>) -> DeviceSpecifier {
        DeviceSpecifier::Indices(indices)
    }

    /// Returns a `DeviceSpecifier::WrappingIndices` variant which specifies a
    /// list of devices by index, wrapping around out of range indices.
    pub fn wrapping_indices(self, windices: Vec<usize>) -> DeviceSpecifier {
        DeviceSpecifier::WrappingIndices(windices)
    }

    /// Returns a `DeviceSpecifier::TypeFlags` variant which specifies a list
    /// of devices using a bitfield.
    pub fn type_flags(self, flags: DeviceType) -> DeviceSpecifier {
        DeviceSpecifier::TypeFlags(flags)
    }

    /// Returns a `DeviceSpecifier::PreferGpu` variant.
    pub fn prefer_gpu(self) -> DeviceSpecifier {
        DeviceSpecifier::PreferGpu
    }

    /// Returns the list of devices matching the parameters specified by this
    /// `DeviceSpecifier`.
    ///
    /// The first platform is used if `platform` is `None`.
    pub fn to_device_list<P: Borrow<Platform>>(&self, platform: Option<P>)
            -> OclResult<Vec<Device>> {
        let platform = match platform {
            Some(p) => p.borrow().clone(),
            None => Platform::first()?,
        };

        match *self {
            DeviceSpecifier::All => Device::list_all(&platform),
            DeviceSpecifier::First => Device::list_select(&platform, None, &[0]),
            DeviceSpecifier::Single(ref device) => Ok(vec![device.clone()]),
            DeviceSpecifier::List(ref devices) => Ok(devices.clone()),
            DeviceSpecifier::Indices(ref idx_list) => {
                Device::list_select(&platform, None, idx_list)
            },
            DeviceSpecifier::WrappingIndices(ref idx_list) => {
                Device::list_select_wrap(&platform, None, idx_list)
            },
            DeviceSpecifier::TypeFlags(flags) => Device::list(&platform, Some(flags)),
            DeviceSpecifier::PreferGpu => Device::prefer_gpu(&platform).map(|d| vec![d]),
        }
    }
}

impl Default for DeviceSpecifier {
    fn default() -> DeviceSpecifier {
        DeviceSpecifier::All
    }
}

impl From<usize> for DeviceSpecifier {
    fn from(index: usize) -> DeviceSpecifier {
        DeviceSpecifier::WrappingIndices(vec![index])
    }
}

impl<'a> From<&'a [usize]> for DeviceSpecifier {
    fn from(indices: &'a [usize]) -> DeviceSpecifier {
        DeviceSpecifier::Indices(indices.to_owned())
    }
}

impl<'a> From<&'a Vec<usize>> for DeviceSpecifier {
    fn from(indices: &'a Vec<usize>) -> DeviceSpecifier {
        DeviceSpecifier::Indices(indices.clone())
    }
}

impl<'a> From<&'a [Device]> for DeviceSpecifier {
    fn from(devices: &'a [Device]) -> DeviceSpecifier {
        DeviceSpecifier::List(devices.to_owned())
    }
}

impl<'a> From<&'a Vec<Device>> for DeviceSpecifier {
    fn from(devices: &'a Vec<Device>) -> DeviceSpecifier {
        DeviceSpecifier::List(devices.clone())
    }
}

impl From<Device> for DeviceSpecifier {
    fn from(device: Device) -> DeviceSpecifier {
        DeviceSpecifier::Single(device)
    }
}

impl<'a> From<&'a Device> for DeviceSpecifier {
    fn from(device: &'a Device) -> DeviceSpecifier {
        DeviceSpecifier::Single(device.clone())
    }
}

impl From<DeviceIdCore> for DeviceSpecifier {
    fn from(device: DeviceIdCore) -> DeviceSpecifier {
        DeviceSpecifier::Single(device.into())
    }
}

impl<'a> From<&'a DeviceIdCore> for DeviceSpecifier {
    fn from(device: &'a DeviceIdCore) -> DeviceSpecifier {
        DeviceSpecifier::Single(device.clone().into())
    }
}

impl From<DeviceType> for DeviceSpecifier {
    fn from(flags: DeviceType) -> DeviceSpecifier {
        DeviceSpecifier::TypeFlags(flags)
    }
}


/// A device identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Device(DeviceIdCore);

impl Device {
    /// Returns the first available device on a platform.
    pub fn first<P: Borrow<Platform>>(platform: P) -> OclResult<Device> {
        Device::list_all(platform)?
            .into_iter()
            .next()
            .ok_or_else(|| DeviceError::NoDevices.into())
    }

    /// Returns a single device specified by a wrapping index.
    pub fn by_idx_wrap<P: Borrow<Platform>>(platform: P, device_idx_wrap: usize)
            -> OclResult<Device> {
        let devices = Device::list_all(platform)?;
        Device::resolve_idxs_wrap(&[device_idx_wrap], &devices)
            .into_iter()
            .next()
            .ok_or_else(|| DeviceError::NoDevices.into())
    }

    /// Returns a `DeviceSpecifier` useful for precisely specifying a set
    /// of devices.
    pub fn specifier() -> DeviceSpecifier {
        DeviceSpecifier::default()
    }

    /// Discovers the device most demos run on: the first GPU of the first
    /// platform, otherwise its first CPU.
    ///
    /// Fails with `NoPlatform` when no platform is registered and with
    /// `NoDevice` when the first platform offers neither.
    pub fn discover() -> OclResult<Device> {
        let platform = core::get_platform_ids()?
            .into_iter()
            .next()
            .map(Platform::new)
            .ok_or(OclCoreError::NoPlatform)?;
        Device::prefer_gpu(&platform)
    }

    /// Returns the first GPU of `platform`, or its first CPU if it has no
    /// GPU.
    pub fn prefer_gpu<P: Borrow<Platform>>(platform: P) -> OclResult<Device> {
        let platform = platform.borrow();
        for device_type in &[DeviceType::GPU, DeviceType::CPU] {
            match core::get_device_ids(platform.as_core(), Some(*device_type)) {
                Ok(ids) => {
                    if let Some(id) = ids.into_iter().next() {
                        debug!("Device::prefer_gpu: selected '{}' ({:?}).", id.name(),
                            device_type);
                        return Ok(Device(id));
                    }
                },
                Err(OclCoreError::NoDevice) => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(OclCoreError::NoDevice.into())
    }

    /// Resolves a list of indices into a list of valid devices.
    ///
    /// `devices` is the set of all indexable devices.
    ///
    /// ### Errors
    ///
    /// All indices in `idxs` must be valid. Use `resolve_idxs_wrap` for index
    /// lists which may contain out of bounds indices.
    pub fn resolve_idxs(idxs: &[usize], devices: &[Device]) -> OclResult<Vec<Device>> {
        let mut result = Vec::with_capacity(idxs.len());
        for &idx in idxs.iter() {
            match devices.get(idx) {
                Some(device) => result.push(device.clone()),
                None => return Err(DeviceError::IndexOutOfRange { idx, count: devices.len() }
                    .into()),
            }
        }
        Ok(result)
    }

    /// Resolves a list of indices into a list of valid devices.
    ///
    /// Wraps around (`%`) so that every index is valid. Returns an empty list
    /// if `devices` is empty.
    pub fn resolve_idxs_wrap(idxs: &[usize], devices: &[Device]) -> Vec<Device> {
        if devices.is_empty() { return Vec::new(); }
        idxs.iter().map(|&idx| devices[idx % devices.len()].clone()).collect()
    }

    /// Returns a list of all devices on a platform matching `device_types`.
    ///
    /// Returns an empty list rather than an error if nothing matches.
    pub fn list<P: Borrow<Platform>>(platform: P, device_types: Option<DeviceType>)
            -> OclResult<Vec<Device>> {
        match core::get_device_ids(platform.borrow().as_core(), device_types) {
            Ok(ids) => Ok(ids.into_iter().map(Device).collect()),
            Err(OclCoreError::NoDevice) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns a list of all devices on a platform.
    pub fn list_all<P: Borrow<Platform>>(platform: P) -> OclResult<Vec<Device>> {
        Device::list(platform, Some(DeviceType::ALL))
    }

    /// Returns a list of devices filtered by type then selected using a
    /// list of indices.
    ///
    /// ### Errors
    ///
    /// All indices in `idxs` must be valid.
    pub fn list_select<P: Borrow<Platform>>(platform: P, device_types: Option<DeviceType>,
            idxs: &[usize]) -> OclResult<Vec<Device>> {
        Device::resolve_idxs(idxs, &Device::list(platform, device_types)?)
    }

    /// Returns a list of devices filtered by type then selected using a
    /// wrapping list of indices.
    pub fn list_select_wrap<P: Borrow<Platform>>(platform: P, device_types: Option<DeviceType>,
            idxs: &[usize]) -> OclResult<Vec<Device>> {
        Ok(Device::resolve_idxs_wrap(idxs, &Device::list(platform, device_types)?))
    }

    /// Returns info about the device.
    pub fn info(&self, info_kind: DeviceInfo) -> OclResult<DeviceInfoResult> {
        core::get_device_info(&self.0, info_kind).map_err(OclError::from)
    }

    /// Returns the device name.
    pub fn name(&self) -> OclResult<String> {
        match self.info(DeviceInfo::Name)? {
            DeviceInfoResult::Name(name) => Ok(name),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::Name, other).into()),
        }
    }

    /// Returns the device vendor as a string.
    pub fn vendor(&self) -> OclResult<String> {
        match self.info(DeviceInfo::Vendor)? {
            DeviceInfoResult::Vendor(vendor) => Ok(vendor),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::Vendor, other).into()),
        }
    }

    /// Returns the device type.
    pub fn device_type(&self) -> OclResult<DeviceType> {
        match self.info(DeviceInfo::Type)? {
            DeviceInfoResult::Type(t) => Ok(t),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::Type, other).into()),
        }
    }

    /// Returns the maximum workgroup size.
    pub fn max_wg_size(&self) -> OclResult<usize> {
        match self.info(DeviceInfo::MaxWorkGroupSize)? {
            DeviceInfoResult::MaxWorkGroupSize(r) => Ok(r),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::MaxWorkGroupSize, other)
                .into()),
        }
    }

    /// Returns the memory base address alignment in bits.
    pub fn mem_base_addr_align(&self) -> OclResult<u32> {
        match self.info(DeviceInfo::MemBaseAddrAlign)? {
            DeviceInfoResult::MemBaseAddrAlign(r) => Ok(r),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::MemBaseAddrAlign, other)
                .into()),
        }
    }

    /// Returns whether or not the device is available for use.
    pub fn is_available(&self) -> OclResult<bool> {
        match self.info(DeviceInfo::Available)? {
            DeviceInfoResult::Available(r) => Ok(r),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::Available, other).into()),
        }
    }

    /// Returns the list of device extensions.
    pub fn extensions(&self) -> OclResult<Extensions> {
        match self.info(DeviceInfo::Extensions)? {
            DeviceInfoResult::Extensions(exts) => Ok(Extensions::new(exts)),
            other => Err(DeviceError::UnexpectedResult(DeviceInfo::Extensions, other).into()),
        }
    }

    /// Returns the platform this device belongs to.
    pub fn platform(&self) -> OclResult<Platform> {
        self.0.platform().map(Platform::new).map_err(OclError::from)
    }

    /// Returns the underlying `DeviceIdCore`.
    pub fn as_core(&self) -> &DeviceIdCore {
        &self.0
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("Type", &self.info(DeviceInfo::Type))
            .field("VendorId", &self.info(DeviceInfo::VendorId))
            .field("MaxComputeUnits", &self.info(DeviceInfo::MaxComputeUnits))
            .field("MaxWorkItemDimensions", &self.info(DeviceInfo::MaxWorkItemDimensions))
            .field("MaxWorkGroupSize", &self.info(DeviceInfo::MaxWorkGroupSize))
            .field("MaxWorkItemSizes", &self.info(DeviceInfo::MaxWorkItemSizes))
            .field("PreferredVectorWidthChar", &self.info(DeviceInfo::PreferredVectorWidthChar))
            .field("PreferredVectorWidthShort", &self.info(DeviceInfo::PreferredVectorWidthShort))
            .field("PreferredVectorWidthInt", &self.info(DeviceInfo::PreferredVectorWidthInt))
            .field("PreferredVectorWidthLong", &self.info(DeviceInfo::PreferredVectorWidthLong))
            .field("PreferredVectorWidthFloat", &self.info(DeviceInfo::PreferredVectorWidthFloat))
            .field("PreferredVectorWidthDouble", &self.info(DeviceInfo::PreferredVectorWidthDouble))
            .field("AddressBits", &self.info(DeviceInfo::AddressBits))
            .field("MaxMemAllocSize", &self.info(DeviceInfo::MaxMemAllocSize))
            .field("Image2dMaxWidth", &self.info(DeviceInfo::Image2dMaxWidth))
            .field("Image2dMaxHeight", &self.info(DeviceInfo::Image2dMaxHeight))
            .field("ImageSupport", &self.info(DeviceInfo::ImageSupport))
            .field("MemBaseAddrAlign", &self.info(DeviceInfo::MemBaseAddrAlign))
            .field("SingleFpConfig", &self.info(DeviceInfo::SingleFpConfig))
            .field("GlobalMemSize", &self.info(DeviceInfo::GlobalMemSize))
            .field("LocalMemSize", &self.info(DeviceInfo::LocalMemSize))
            .field("ProfilingTimerResolution", &self.info(DeviceInfo::ProfilingTimerResolution))
            .field("EndianLittle", &self.info(DeviceInfo::EndianLittle))
            .field("Available", &self.info(DeviceInfo::Available))
            .field("CompilerAvailable", &self.info(DeviceInfo::CompilerAvailable))
            .field("ExecutionCapabilities", &self.info(DeviceInfo::ExecutionCapabilities))
            .field("QueueProperties", &self.info(DeviceInfo::QueueProperties))
            .field("Name", &self.info(DeviceInfo::Name))
            .field("Vendor", &self.info(DeviceInfo::Vendor))
            .field("DriverVersion", &self.info(DeviceInfo::DriverVersion))
            .field("Profile", &self.info(DeviceInfo::Profile))
            .field("Version", &self.info(DeviceInfo::Version))
            .field("Extensions", &self.info(DeviceInfo::Extensions))
            .field("Platform", &self.info(DeviceInfo::Platform))
            .field("DoubleFpConfig", &self.info(DeviceInfo::DoubleFpConfig))
            .field("HalfFpConfig", &self.info(DeviceInfo::HalfFpConfig))
            .field("PreferredVectorWidthHalf", &self.info(DeviceInfo::PreferredVectorWidthHalf))
            .field("NativeVectorWidthChar", &self.info(DeviceInfo::NativeVectorWidthChar))
            .field("NativeVectorWidthShort", &self.info(DeviceInfo::NativeVectorWidthShort))
            .field("NativeVectorWidthInt", &self.info(DeviceInfo::NativeVectorWidthInt))
            .field("NativeVectorWidthLong", &self.info(DeviceInfo::NativeVectorWidthLong))
            .field("NativeVectorWidthFloat", &self.info(DeviceInfo::NativeVectorWidthFloat))
            .field("NativeVectorWidthDouble", &self.info(DeviceInfo::NativeVectorWidthDouble))
            .field("NativeVectorWidthHalf", &self.info(DeviceInfo::NativeVectorWidthHalf))
            .field("OpenclCVersion", &self.info(DeviceInfo::OpenclCVersion))
            .field("ReferenceCount", &self.info(DeviceInfo::ReferenceCount))
            .finish()
    }
}

impl From<DeviceIdCore> for Device {
    fn from(core: DeviceIdCore) -> Device {
        Device(core)
    }
}

impl From<Device> for DeviceIdCore {
    fn from(d: Device) -> DeviceIdCore {
        d.0
    }
}

impl<'a> From<&'a Device> for DeviceIdCore {
    fn from(d: &'a Device) -> DeviceIdCore {
        d.0.clone()
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl AsRef<Device> for Device {
    fn as_ref(&self) -> &Device {
        self
    }
}

impl Deref for Device {
    type Target = DeviceIdCore;

    fn deref(&self) -> &DeviceIdCore {
        &self.0
    }
}
