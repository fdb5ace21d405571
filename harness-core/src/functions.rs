//! All the functions.
//!
//! Object creation validates eagerly and fails with the most specific
//! error available. Enqueue functions validate everything which can be
//! known at enqueue time; anything which depends on the state of memory
//! when the command actually runs (graphics acquisition, for example) fails
//! the command's event instead.

use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::error::{api_err, Error, Result};
use crate::runtime::context::ContextObj;
use crate::runtime::image::SamplerObj;
use crate::runtime::kernel::{KernelObj, Launch};
use crate::runtime::memory::{GlShare, ImageLayout, MemKind, MemObj, Storage};
use crate::runtime::platform::{build_platform, registered_platforms};
use crate::runtime::program::ProgramObj;
use crate::runtime::queue::{QueueObj, Work};
use crate::runtime::{GlObject, HostMem, KernelLibrary, MappedRegion, PlatformConfig, SamplerDesc};
use crate::types::structs::ParamKind;
use crate::util::{self, RectPitch};
use crate::{
    AddressingMode, ArgVal, CommandExecutionStatus, CommandQueue, CommandQueueInfo,
    CommandQueueInfoResult, CommandQueueProperties, CommandType, Context, ContextInfo,
    ContextInfoResult, ContextProperties, DeviceId, DeviceInfo, DeviceInfoResult, DeviceType,
    Event, EventInfo, EventInfoResult, EventStatus, FilterMode, ImageDescriptor, ImageFormat,
    ImageInfo, ImageInfoResult, Kernel, KernelArgInfo, KernelArgInfoResult, KernelInfo,
    KernelInfoResult, KernelWorkGroupInfo, KernelWorkGroupInfoResult, MapFlags, Mem, MemFlags,
    MemInfo, MemInfoResult, MemObjectType, PlatformId, PlatformInfo, PlatformInfoResult,
    ProfilingInfo, ProfilingInfoResult, Program, ProgramBuildInfo, ProgramBuildInfoResult,
    ProgramBuildStatus, ProgramInfo, ProgramInfoResult, Sampler, SamplerInfo, SamplerInfoResult,
    Status,
};

const GL_SHARING_EXT: &str = "cl_khr_gl_sharing";

//=============================================================================
//================================= HELPERS ===================================
//=============================================================================

/// The initial contents of a new memory object.
pub enum MemInit<'a> {
    /// Zeroed device memory.
    Uninit,
    /// Device memory initialized with a copy of host data
    /// (`MemFlags::COPY_HOST_PTR`).
    Copy(&'a [u8]),
    /// Device memory which aliases host memory (`MemFlags::USE_HOST_PTR`).
    Alias(HostMem),
}

/// The destination of a read command.
pub enum HostDst<'a> {
    /// A host slice. Reads into a slice always block because the slice is
    /// borrowed only for the duration of the call.
    Slice(&'a mut [u8]),
    /// Host memory written when the command runs. Reads into shared host
    /// memory may be non-blocking.
    Shared { mem: HostMem, offset: usize, len: usize },
}

impl<'a> HostDst<'a> {
    fn len(&self) -> usize {
        match *self {
            HostDst::Slice(ref slice) => slice.len(),
            HostDst::Shared { len, .. } => len,
        }
    }
}

/// The source of a write command.
pub enum HostSrc<'a> {
    /// A host slice, copied before the enqueue function returns.
    Slice(&'a [u8]),
    /// Host memory read when the command runs.
    Shared { mem: HostMem, offset: usize, len: usize },
}

impl<'a> HostSrc<'a> {
    fn len(&self) -> usize {
        match *self {
            HostSrc::Slice(slice) => slice.len(),
            HostSrc::Shared { len, .. } => len,
        }
    }
}

fn check_context(expected: &Context, found: &Context, what: &'static str) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ForeignResource(what))
    }
}

fn check_range(offset: usize, len: usize, size: usize, fn_name: &'static str) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(api_err(Status::InvalidValue, fn_name, format!("range [{}..{}) is out of \
            bounds (size: {} bytes)", offset, offset.saturating_add(len), size))),
    }
}

fn check_buffer(queue: &CommandQueue, mem: &Mem, fn_name: &'static str) -> Result<()> {
    check_context(queue.context(), mem.context(), "memory object")?;
    if mem.is_image() {
        return Err(api_err(Status::InvalidMemObject, fn_name,
            format!("{:?} is an image, not a buffer", mem)));
    }
    Ok(())
}

fn check_host_readable(mem: &Mem, fn_name: &'static str) -> Result<()> {
    if mem.flags().intersects(MemFlags::HOST_WRITE_ONLY | MemFlags::HOST_NO_ACCESS) {
        return Err(api_err(Status::InvalidOperation, fn_name,
            format!("{:?} was created with {:?}", mem, mem.flags())));
    }
    Ok(())
}

fn check_host_writable(mem: &Mem, fn_name: &'static str) -> Result<()> {
    if mem.flags().intersects(MemFlags::HOST_READ_ONLY | MemFlags::HOST_NO_ACCESS) {
        return Err(api_err(Status::InvalidOperation, fn_name,
            format!("{:?} was created with {:?}", mem, mem.flags())));
    }
    Ok(())
}

/// Fails a running command if `mem` is shared with graphics and not
/// currently acquired.
fn check_acquired(mem: &Mem) -> std::result::Result<(), Status> {
    match mem.0.gl_share() {
        Some(gl) if !gl.is_acquired() => Err(Status::InvalidOperation),
        _ => Ok(()),
    }
}

fn block_on(event: Event, block: bool) -> Result<Event> {
    if block {
        event.wait()?;
    }
    Ok(event)
}

//=============================================================================
//============================ PLATFORM AND DEVICE ============================
//=============================================================================

/// Returns the platforms registered with the runtime.
pub fn get_platform_ids() -> Result<Vec<PlatformId>> {
    Ok(registered_platforms().to_vec())
}

/// Creates a standalone platform from a description.
///
/// Useful for exercising device selection against hardware
/// configurations other than the default.
pub fn create_platform(config: PlatformConfig) -> PlatformId {
    build_platform(config)
}

/// Returns platform information.
pub fn get_platform_info(platform: &PlatformId, request: PlatformInfo)
        -> Result<PlatformInfoResult> {
    let config = &platform.0.config;
    Ok(match request {
        PlatformInfo::Profile => PlatformInfoResult::Profile(config.profile.clone()),
        PlatformInfo::Version => PlatformInfoResult::Version(config.version.clone()),
        PlatformInfo::Name => PlatformInfoResult::Name(config.name.clone()),
        PlatformInfo::Vendor => PlatformInfoResult::Vendor(config.vendor.clone()),
        PlatformInfo::Extensions => PlatformInfoResult::Extensions(config.extensions.join(" ")),
    })
}

/// Returns the devices of `platform` matching `device_types` (all devices
/// if `None`).
///
/// `DeviceType::DEFAULT` matches the first device. Returns
/// `Error::NoDevice` if nothing matches.
pub fn get_device_ids(platform: &PlatformId, device_types: Option<DeviceType>)
        -> Result<Vec<DeviceId>> {
    let types = device_types.unwrap_or(DeviceType::ALL);
    let devices = platform.devices();

    let matching: Vec<DeviceId> = if types.contains(DeviceType::ALL) {
        devices.to_vec()
    } else {
        devices.iter()
            .enumerate()
            .filter(|&(i, d)| {
                types.intersects(d.0.config.device_type)
                    || (i == 0 && types.contains(DeviceType::DEFAULT))
            })
            .map(|(_, d)| d.clone())
            .collect()
    };

    if matching.is_empty() {
        debug!("get_device_ids: no {:?} device on '{}'", types, platform.0.config.name);
        Err(Error::NoDevice)
    } else {
        Ok(matching)
    }
}

/// Returns information about a device.
///
/// Queries for capabilities the device lacks (double or half precision,
/// image dimensions without image support) fail with
/// `Error::UnsupportedQuery`.
pub fn get_device_info(device: &DeviceId, request: DeviceInfo) -> Result<DeviceInfoResult> {
    let c = &device.0.config;
    let unsupported = || Error::UnsupportedQuery {
        device: c.name.clone(),
        query: format!("{:?}", request),
    };

    Ok(match request {
        DeviceInfo::Type => DeviceInfoResult::Type(c.device_type),
        DeviceInfo::VendorId => DeviceInfoResult::VendorId(c.vendor_id),
        DeviceInfo::MaxComputeUnits => DeviceInfoResult::MaxComputeUnits(c.max_compute_units),
        DeviceInfo::MaxWorkItemDimensions => DeviceInfoResult::MaxWorkItemDimensions(3),
        DeviceInfo::MaxWorkGroupSize => DeviceInfoResult::MaxWorkGroupSize(c.max_work_group_size),
        DeviceInfo::MaxWorkItemSizes => {
            DeviceInfoResult::MaxWorkItemSizes(c.max_work_item_sizes.to_vec())
        },
        DeviceInfo::PreferredVectorWidthChar => {
            DeviceInfoResult::PreferredVectorWidthChar(c.preferred_vector_widths.char)
        },
        DeviceInfo::PreferredVectorWidthShort => {
            DeviceInfoResult::PreferredVectorWidthShort(c.preferred_vector_widths.short)
        },
        DeviceInfo::PreferredVectorWidthInt => {
            DeviceInfoResult::PreferredVectorWidthInt(c.preferred_vector_widths.int)
        },
        DeviceInfo::PreferredVectorWidthLong => {
            DeviceInfoResult::PreferredVectorWidthLong(c.preferred_vector_widths.long)
        },
        DeviceInfo::PreferredVectorWidthFloat => {
            DeviceInfoResult::PreferredVectorWidthFloat(c.preferred_vector_widths.float)
        },
        DeviceInfo::PreferredVectorWidthDouble => {
            DeviceInfoResult::PreferredVectorWidthDouble(c.preferred_vector_widths.double)
        },
        DeviceInfo::AddressBits => DeviceInfoResult::AddressBits(c.address_bits),
        DeviceInfo::MaxMemAllocSize => DeviceInfoResult::MaxMemAllocSize(c.max_mem_alloc_size),
        DeviceInfo::Image2dMaxWidth if c.image_support => {
            DeviceInfoResult::Image2dMaxWidth(c.image2d_max_dims[0])
        },
        DeviceInfo::Image2dMaxHeight if c.image_support => {
            DeviceInfoResult::Image2dMaxHeight(c.image2d_max_dims[1])
        },
        DeviceInfo::Image2dMaxWidth | DeviceInfo::Image2dMaxHeight => return Err(unsupported()),
        DeviceInfo::ImageSupport => DeviceInfoResult::ImageSupport(c.image_support),
        DeviceInfo::MemBaseAddrAlign => DeviceInfoResult::MemBaseAddrAlign(c.mem_base_addr_align),
        DeviceInfo::SingleFpConfig => DeviceInfoResult::SingleFpConfig(c.single_fp_config),
        DeviceInfo::GlobalMemSize => DeviceInfoResult::GlobalMemSize(c.global_mem_size),
        DeviceInfo::LocalMemSize => DeviceInfoResult::LocalMemSize(c.local_mem_size),
        DeviceInfo::ProfilingTimerResolution => {
            DeviceInfoResult::ProfilingTimerResolution(c.profiling_timer_resolution)
        },
        DeviceInfo::EndianLittle => DeviceInfoResult::EndianLittle(cfg!(target_endian = "little")),
        DeviceInfo::Available => DeviceInfoResult::Available(true),
        DeviceInfo::CompilerAvailable => DeviceInfoResult::CompilerAvailable(true),
        DeviceInfo::ExecutionCapabilities => {
            DeviceInfoResult::ExecutionCapabilities(c.execution_capabilities())
        },
        DeviceInfo::QueueProperties => DeviceInfoResult::QueueProperties(c.queue_properties()),
        DeviceInfo::Name => DeviceInfoResult::Name(c.name.clone()),
        DeviceInfo::Vendor => DeviceInfoResult::Vendor(c.vendor.clone()),
        DeviceInfo::DriverVersion => DeviceInfoResult::DriverVersion(c.driver_version.clone()),
        DeviceInfo::Profile => DeviceInfoResult::Profile("FULL_PROFILE".to_owned()),
        DeviceInfo::Version => DeviceInfoResult::Version(c.version.clone()),
        DeviceInfo::Extensions => DeviceInfoResult::Extensions(c.extensions.join(" ")),
        DeviceInfo::Platform => DeviceInfoResult::Platform(device.platform()?),
        DeviceInfo::DoubleFpConfig => {
            DeviceInfoResult::DoubleFpConfig(c.double_fp_config.ok_or_else(unsupported)?)
        },
        DeviceInfo::HalfFpConfig => {
            DeviceInfoResult::HalfFpConfig(c.half_fp_config.ok_or_else(unsupported)?)
        },
        DeviceInfo::PreferredVectorWidthHalf => {
            DeviceInfoResult::PreferredVectorWidthHalf(c.preferred_vector_widths.half)
        },
        DeviceInfo::NativeVectorWidthChar => {
            DeviceInfoResult::NativeVectorWidthChar(c.native_vector_widths.char)
        },
        DeviceInfo::NativeVectorWidthShort => {
            DeviceInfoResult::NativeVectorWidthShort(c.native_vector_widths.short)
        },
        DeviceInfo::NativeVectorWidthInt => {
            DeviceInfoResult::NativeVectorWidthInt(c.native_vector_widths.int)
        },
        DeviceInfo::NativeVectorWidthLong => {
            DeviceInfoResult::NativeVectorWidthLong(c.native_vector_widths.long)
        },
        DeviceInfo::NativeVectorWidthFloat => {
            DeviceInfoResult::NativeVectorWidthFloat(c.native_vector_widths.float)
        },
        DeviceInfo::NativeVectorWidthDouble => {
            DeviceInfoResult::NativeVectorWidthDouble(c.native_vector_widths.double)
        },
        DeviceInfo::NativeVectorWidthHalf => {
            DeviceInfoResult::NativeVectorWidthHalf(c.native_vector_widths.half)
        },
        DeviceInfo::OpenclCVersion => DeviceInfoResult::OpenclCVersion(c.opencl_c_version.clone()),
        DeviceInfo::ReferenceCount => DeviceInfoResult::ReferenceCount(1),
    })
}

//=============================================================================
//================================== CONTEXT ==================================
//=============================================================================

/// Creates a new context for `device_ids`.
///
/// All devices must belong to the same platform, which must match the
/// platform property if one is given. Graphics sharing properties require
/// every device to support graphics sharing.
pub fn create_context(properties: Option<&ContextProperties>, device_ids: &[DeviceId])
        -> Result<Context> {
    if device_ids.is_empty() {
        return Err(Error::NoDevice);
    }

    let platform = device_ids[0].platform()?;
    if device_ids.iter().skip(1).any(|d| d.platform().ok().as_ref() != Some(&platform)) {
        return Err(api_err(Status::InvalidDevice, "create_context",
            "devices must all belong to the same platform"));
    }

    let properties = properties.cloned().unwrap_or_default();
    if let Some(plat) = properties.get_platform() {
        if plat != &platform {
            return Err(api_err(Status::InvalidPlatform, "create_context", format!("the \
                platform property ({:?}) does not match the devices' platform ({:?})", plat,
                platform)));
        }
    }

    if properties.contains_gl_context_or_sharegroup() {
        if let Some(d) = device_ids.iter().find(|d| !d.0.config.has_extension(GL_SHARING_EXT)) {
            return Err(api_err(Status::InvalidProperty, "create_context", format!("device '{}' \
                does not support {}", d.name(), GL_SHARING_EXT)));
        }
    }

    let mut devices: Vec<DeviceId> = Vec::with_capacity(device_ids.len());
    for d in device_ids {
        if !devices.contains(d) {
            devices.push(d.clone());
        }
    }

    let obj = ContextObj {
        id: crate::runtime::next_id(),
        platform,
        devices,
        properties,
    };

    info!("Context({}) created for {:?}", obj.id,
        obj.devices.iter().map(|d| d.name()).collect::<Vec<_>>());

    Ok(Context(Arc::new(obj)))
}

/// Returns information about a context.
pub fn get_context_info(context: &Context, request: ContextInfo) -> Result<ContextInfoResult> {
    Ok(match request {
        ContextInfo::ReferenceCount => ContextInfoResult::ReferenceCount(context.ref_count()),
        ContextInfo::Devices => ContextInfoResult::Devices(context.devices().to_vec()),
        ContextInfo::Properties => ContextInfoResult::Properties(context.properties().clone()),
        ContextInfo::NumDevices => ContextInfoResult::NumDevices(context.devices().len() as u32),
    })
}

//=============================================================================
//=============================== COMMAND QUEUE ===============================
//=============================================================================

/// Creates a command queue on `device`.
pub fn create_command_queue(context: &Context, device: &DeviceId,
        properties: Option<CommandQueueProperties>) -> Result<CommandQueue> {
    if !context.devices().contains(device) {
        return Err(api_err(Status::InvalidDevice, "create_command_queue",
            format!("device '{}' is not associated with {:?}", device.name(), context)));
    }

    let properties = properties.unwrap_or_default();
    if !device.0.config.queue_properties().contains(properties) {
        return Err(api_err(Status::InvalidQueueProperties, "create_command_queue",
            format!("{:?}", properties)));
    }

    Ok(CommandQueue(Arc::new(QueueObj::new(context, device, properties)?)))
}

/// Returns information about a command queue.
pub fn get_command_queue_info(queue: &CommandQueue, request: CommandQueueInfo)
        -> Result<CommandQueueInfoResult> {
    Ok(match request {
        CommandQueueInfo::Context => CommandQueueInfoResult::Context(queue.context().clone()),
        CommandQueueInfo::Device => CommandQueueInfoResult::Device(queue.device().clone()),
        CommandQueueInfo::ReferenceCount => CommandQueueInfoResult::ReferenceCount(queue.ref_count()),
        CommandQueueInfo::Properties => CommandQueueInfoResult::Properties(queue.properties()),
    })
}

/// Issues all previously enqueued commands. Commands are dispatched as
/// soon as they are ready so this has nothing to do.
pub fn flush(_queue: &CommandQueue) -> Result<()> {
    Ok(())
}

/// Blocks until every command enqueued so far has finished.
pub fn finish(queue: &CommandQueue) -> Result<()> {
    queue.0.finish()
}

/// Enqueues a marker which completes once every previously enqueued
/// command and every event in `wait_list` has finished.
pub fn enqueue_marker(queue: &CommandQueue, wait_list: Option<&[Event]>) -> Result<Event> {
    queue.0.marker(wait_list)
}

//=============================================================================
//========================== BUFFERS, IMAGES, SAMPLERS ========================
//=============================================================================

const ACCESS_FLAGS: MemFlags = MemFlags::from_bits_truncate(
    MemFlags::READ_WRITE.bits() | MemFlags::WRITE_ONLY.bits() | MemFlags::READ_ONLY.bits());
const HOST_ACCESS_FLAGS: MemFlags = MemFlags::from_bits_truncate(
    MemFlags::HOST_WRITE_ONLY.bits() | MemFlags::HOST_READ_ONLY.bits()
        | MemFlags::HOST_NO_ACCESS.bits());
const HOST_PTR_FLAGS: MemFlags = MemFlags::from_bits_truncate(
    MemFlags::USE_HOST_PTR.bits() | MemFlags::ALLOC_HOST_PTR.bits()
        | MemFlags::COPY_HOST_PTR.bits());

fn validate_flags(flags: MemFlags, fn_name: &'static str) -> Result<()> {
    let exclusive = |group: MemFlags| (flags & group).bits().count_ones() <= 1;
    if !exclusive(ACCESS_FLAGS) || !exclusive(HOST_ACCESS_FLAGS)
            || flags.contains(MemFlags::USE_HOST_PTR | MemFlags::ALLOC_HOST_PTR)
            || flags.contains(MemFlags::USE_HOST_PTR | MemFlags::COPY_HOST_PTR) {
        return Err(api_err(Status::InvalidValue, fn_name,
            format!("conflicting memory flags: {:?}", flags)));
    }
    Ok(())
}

fn new_mem(context: &Context, flags: MemFlags, storage: Storage, offset: usize, size: usize,
        kind: MemKind, parent: Option<Mem>, gl: Option<GlShare>) -> Mem {
    Mem(Arc::new(MemObj {
        id: crate::runtime::next_id(),
        context: context.clone(),
        flags,
        storage,
        offset,
        size,
        kind,
        parent,
        gl,
        map_count: AtomicU32::new(0),
    }))
}

/// Resolves the initial storage of a memory object of `len` bytes.
fn init_storage(flags: MemFlags, len: usize, init: MemInit, fn_name: &'static str)
        -> Result<(MemFlags, Storage)> {
    match init {
        MemInit::Uninit => {
            if flags.intersects(MemFlags::USE_HOST_PTR | MemFlags::COPY_HOST_PTR) {
                return Err(api_err(Status::InvalidHostPtr, fn_name,
                    format!("{:?} requires host data", flags)));
            }
            Ok((flags, HostMem::new(len).0))
        },
        MemInit::Copy(data) => {
            if flags.contains(MemFlags::USE_HOST_PTR) {
                return Err(api_err(Status::InvalidValue, fn_name,
                    "host data cannot be both copied and aliased"));
            }
            if data.len() < len {
                return Err(api_err(Status::InvalidHostPtr, fn_name, format!("host data ({} \
                    bytes) is shorter than the allocation ({} bytes)", data.len(), len)));
            }
            Ok((flags | MemFlags::COPY_HOST_PTR, HostMem::from_bytes(&data[..len]).0))
        },
        MemInit::Alias(host) => {
            if flags.contains(MemFlags::COPY_HOST_PTR) {
                return Err(api_err(Status::InvalidValue, fn_name,
                    "host data cannot be both copied and aliased"));
            }
            if host.len() < len {
                return Err(api_err(Status::InvalidHostPtr, fn_name, format!("host memory ({} \
                    bytes) is shorter than the allocation ({} bytes)", host.len(), len)));
            }
            Ok((flags | MemFlags::USE_HOST_PTR, host.0))
        },
    }
}

/// Creates a buffer of `len` bytes.
pub fn create_buffer(context: &Context, flags: MemFlags, len: usize, init: MemInit) -> Result<Mem> {
    validate_flags(flags, "create_buffer")?;

    if len == 0 {
        return Err(api_err(Status::InvalidBufferSize, "create_buffer",
            "buffer size must be non-zero"));
    }

    let max = context.0.max_mem_alloc_size();
    if len as u64 > max {
        return Err(Error::Oversize { requested: len as u64, max });
    }

    let (flags, storage) = init_storage(flags, len, init, "create_buffer")?;
    let mem = new_mem(context, flags, storage, 0, len, MemKind::Buffer, None, None);
    debug!("create_buffer: {:?} ({} bytes, {:?})", mem, len, flags);
    Ok(mem)
}

/// Creates a sub-buffer covering `size` bytes of `buffer` starting at
/// `origin`.
///
/// `origin` must be a multiple of the base address alignment of every
/// device in the context. Access flags not given are inherited.
pub fn create_sub_buffer(buffer: &Mem, flags: MemFlags, origin: usize, size: usize) -> Result<Mem> {
    validate_flags(flags, "create_sub_buffer")?;

    if buffer.parent().is_some() || buffer.is_image() {
        return Err(api_err(Status::InvalidMemObject, "create_sub_buffer",
            format!("{:?} is not a buffer created by create_buffer", buffer)));
    }
    if flags.intersects(HOST_PTR_FLAGS) {
        return Err(api_err(Status::InvalidValue, "create_sub_buffer",
            "host pointer flags are inherited and cannot be specified"));
    }
    if size == 0 {
        return Err(api_err(Status::InvalidBufferSize, "create_sub_buffer",
            "sub-buffer size must be non-zero"));
    }
    check_range(origin, size, buffer.size(), "create_sub_buffer")?;

    let align = buffer.context().0.mem_base_addr_align_bytes();
    if origin % align != 0 {
        return Err(Error::MisalignedSubBuffer { origin, align });
    }

    let parent_flags = buffer.flags();
    let access = if (flags & ACCESS_FLAGS).is_empty() {
        parent_flags & ACCESS_FLAGS
    } else {
        let requested = flags & ACCESS_FLAGS;
        let parent_access = parent_flags.access();
        let compatible = parent_access == MemFlags::READ_WRITE || parent_access == requested;
        if !compatible {
            return Err(api_err(Status::InvalidValue, "create_sub_buffer", format!("{:?} is \
                incompatible with the parent's {:?}", requested, parent_access)));
        }
        requested
    };
    let host_access = if (flags & HOST_ACCESS_FLAGS).is_empty() {
        parent_flags & HOST_ACCESS_FLAGS
    } else {
        flags & HOST_ACCESS_FLAGS
    };

    let sub_flags = access | host_access | (parent_flags & HOST_PTR_FLAGS);
    let mem = new_mem(buffer.context(), sub_flags, buffer.0.storage.clone(),
        buffer.offset() + origin, size, MemKind::Buffer, Some(buffer.clone()), None);
    debug!("create_sub_buffer: {:?} = {:?}[{}..{}]", mem, buffer, origin, origin + size);
    Ok(mem)
}

/// Creates a two dimensional image.
///
/// Device storage is tightly packed. `desc.image_row_pitch` describes host
/// data supplied through `init` (zero means tightly packed); aliased host
/// memory must be tightly packed.
pub fn create_image(context: &Context, flags: MemFlags, format: &ImageFormat,
        desc: &ImageDescriptor, init: MemInit) -> Result<Mem> {
    validate_flags(flags, "create_image")?;
    let pixel_size = format.pixel_size()?;

    let devices = context.devices();
    if !devices.iter().any(|d| d.0.config.image_support) {
        return Err(api_err(Status::InvalidOperation, "create_image",
            "no device in the context supports images"));
    }

    let max = devices.iter().filter(|d| d.0.config.image_support)
        .fold([usize::max_value(); 2], |m, d| {
            let dims = d.0.config.image2d_max_dims;
            [m[0].min(dims[0]), m[1].min(dims[1])]
        });

    let (width, height) = (desc.image_width, desc.image_height);
    if width == 0 || height == 0 || width > max[0] || height > max[1] {
        return Err(api_err(Status::InvalidImageSize, "create_image", format!("{}x{} \
            (maximum: {}x{})", width, height, max[0], max[1])));
    }

    let row_pitch = width * pixel_size;
    let len = row_pitch * height;
    if len as u64 > context.0.max_mem_alloc_size() {
        return Err(Error::Oversize { requested: len as u64, max: context.0.max_mem_alloc_size() });
    }

    let host_pitch = if desc.image_row_pitch == 0 { row_pitch } else { desc.image_row_pitch };
    if host_pitch < row_pitch {
        return Err(api_err(Status::InvalidImageDescriptor, "create_image", format!("row pitch \
            ({}) is less than width * pixel size ({})", host_pitch, row_pitch)));
    }

    let init = match init {
        MemInit::Copy(data) if host_pitch != row_pitch => {
            let needed = host_pitch * (height - 1) + row_pitch;
            if data.len() < needed {
                return Err(api_err(Status::InvalidHostPtr, "create_image", format!("host data \
                    ({} bytes) is shorter than the image ({} bytes)", data.len(), needed)));
            }
            let mut packed = Vec::with_capacity(len);
            for row in 0..height {
                packed.extend_from_slice(&data[row * host_pitch..row * host_pitch + row_pitch]);
            }
            let (flags, storage) = init_storage(flags, len, MemInit::Copy(&packed), "create_image")?;
            let layout = ImageLayout { format: *format, width, height, pixel_size, row_pitch };
            return Ok(new_mem(context, flags, storage, 0, len, MemKind::Image(layout), None, None));
        },
        MemInit::Alias(_) if host_pitch != row_pitch => {
            return Err(api_err(Status::InvalidImageDescriptor, "create_image",
                "aliased host memory must be tightly packed"));
        },
        other => other,
    };

    let (flags, storage) = init_storage(flags, len, init, "create_image")?;
    let layout = ImageLayout { format: *format, width, height, pixel_size, row_pitch };
    let mem = new_mem(context, flags, storage, 0, len, MemKind::Image(layout), None, None);
    debug!("create_image: {:?} ({}x{} {:?})", mem, width, height, format);
    Ok(mem)
}

/// Creates a sampler.
///
/// Repeating addressing modes require normalized coordinates.
pub fn create_sampler(context: &Context, normalize_coords: bool, addressing_mode: AddressingMode,
        filter_mode: FilterMode) -> Result<Sampler> {
    if !normalize_coords
            && (addressing_mode == AddressingMode::Repeat
                || addressing_mode == AddressingMode::MirroredRepeat) {
        return Err(api_err(Status::InvalidValue, "create_sampler",
            format!("{:?} requires normalized coordinates", addressing_mode)));
    }

    Ok(Sampler(Arc::new(SamplerObj {
        id: crate::runtime::next_id(),
        context: context.clone(),
        desc: SamplerDesc {
            normalized_coords: normalize_coords,
            addressing_mode,
            filter_mode,
        },
    })))
}

/// Returns information about a memory object.
pub fn get_mem_object_info(mem: &Mem, request: MemInfo) -> Result<MemInfoResult> {
    Ok(match request {
        MemInfo::Type => MemInfoResult::Type(if mem.is_image() {
            MemObjectType::Image2d
        } else {
            MemObjectType::Buffer
        }),
        MemInfo::Flags => MemInfoResult::Flags(mem.flags()),
        MemInfo::Size => MemInfoResult::Size(mem.size()),
        MemInfo::MapCount => MemInfoResult::MapCount(mem.0.map_count.load(Ordering::SeqCst)),
        MemInfo::ReferenceCount => MemInfoResult::ReferenceCount(mem.ref_count()),
        MemInfo::Context => MemInfoResult::Context(mem.context().clone()),
        MemInfo::AssociatedMemobject => MemInfoResult::AssociatedMemobject(mem.parent().cloned()),
        MemInfo::Offset => MemInfoResult::Offset(match mem.parent() {
            Some(parent) => mem.offset() - parent.offset(),
            None => 0,
        }),
    })
}

/// Returns information about an image.
pub fn get_image_info(image: &Mem, request: ImageInfo) -> Result<ImageInfoResult> {
    let layout = image.0.image_layout().ok_or_else(|| api_err(Status::InvalidMemObject,
        "get_image_info", format!("{:?} is not an image", image)))?;

    Ok(match request {
        ImageInfo::Format => ImageInfoResult::Format(layout.format),
        ImageInfo::ElementSize => ImageInfoResult::ElementSize(layout.pixel_size),
        ImageInfo::RowPitch => ImageInfoResult::RowPitch(layout.row_pitch),
        ImageInfo::Width => ImageInfoResult::Width(layout.width),
        ImageInfo::Height => ImageInfoResult::Height(layout.height),
    })
}

/// Returns information about a sampler.
pub fn get_sampler_info(sampler: &Sampler, request: SamplerInfo) -> Result<SamplerInfoResult> {
    let desc = sampler.desc();
    Ok(match request {
        SamplerInfo::ReferenceCount => SamplerInfoResult::ReferenceCount(sampler.ref_count()),
        SamplerInfo::Context => SamplerInfoResult::Context(sampler.context().clone()),
        SamplerInfo::NormalizedCoords => SamplerInfoResult::NormalizedCoords(desc.normalized_coords),
        SamplerInfo::AddressingMode => SamplerInfoResult::AddressingMode(desc.addressing_mode),
        SamplerInfo::FilterMode => SamplerInfoResult::FilterMode(desc.filter_mode),
    })
}

//=============================================================================
//================================ TRANSFERS ==================================
//=============================================================================

/// Enqueues a read of `dst.len()` bytes from `buffer` starting at `offset`.
pub fn enqueue_read_buffer(queue: &CommandQueue, buffer: &Mem, block: bool, offset: usize,
        dst: HostDst, wait_list: Option<&[Event]>) -> Result<Event> {
    check_buffer(queue, buffer, "enqueue_read_buffer")?;
    check_host_readable(buffer, "enqueue_read_buffer")?;
    let len = dst.len();
    check_range(offset, len, buffer.size(), "enqueue_read_buffer")?;

    let submit = |host: HostMem, host_offset: usize| {
        let mem = buffer.clone();
        let work: Work = Box::new(move || {
            check_acquired(&mem)?;
            let data = mem.0.copy_out(offset, len);
            host.write().as_mut_slice()[host_offset..host_offset + len].copy_from_slice(&data);
            Ok(())
        });
        queue.0.submit(CommandType::ReadBuffer, wait_list, work)
    };

    match dst {
        HostDst::Slice(slice) => {
            let staging = HostMem::new(len);
            let event = block_on(submit(staging.clone(), 0)?, true)?;
            slice.copy_from_slice(staging.read().as_slice());
            Ok(event)
        },
        HostDst::Shared { mem, offset: host_offset, len } => {
            check_range(host_offset, len, mem.len(), "enqueue_read_buffer")?;
            block_on(submit(mem, host_offset)?, block)
        },
    }
}

/// Enqueues a write of `src.len()` bytes into `buffer` starting at
/// `offset`.
pub fn enqueue_write_buffer(queue: &CommandQueue, buffer: &Mem, block: bool, offset: usize,
        src: HostSrc, wait_list: Option<&[Event]>) -> Result<Event> {
    check_buffer(queue, buffer, "enqueue_write_buffer")?;
    check_host_writable(buffer, "enqueue_write_buffer")?;
    let len = src.len();
    check_range(offset, len, buffer.size(), "enqueue_write_buffer")?;

    let mem = buffer.clone();
    let work: Work = match src {
        HostSrc::Slice(slice) => {
            let data = slice.to_vec();
            Box::new(move || {
                check_acquired(&mem)?;
                mem.0.copy_in(offset, &data);
                Ok(())
            })
        },
        HostSrc::Shared { mem: host, offset: host_offset, len } => {
            check_range(host_offset, len, host.len(), "enqueue_write_buffer")?;
            Box::new(move || {
                check_acquired(&mem)?;
                let data = host.read().as_slice()[host_offset..host_offset + len].to_vec();
                mem.0.copy_in(offset, &data);
                Ok(())
            })
        },
    };

    block_on(queue.0.submit(CommandType::WriteBuffer, wait_list, work)?, block)
}

/// Shared implementation of rectangular and image reads. Pitches are
/// resolved and extents checked by the caller.
fn enqueue_read_rect(queue: &CommandQueue, command_type: CommandType, mem: &Mem, block: bool,
        mem_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3], mem_pitch: RectPitch,
        host_pitch: RectPitch, dst: HostDst, wait_list: Option<&[Event]>, fn_name: &'static str)
        -> Result<Event> {
    let host_extent = util::rect_extent(host_origin, region, host_pitch);
    if host_extent > dst.len() {
        return Err(api_err(Status::InvalidValue, fn_name, format!("host region extends to \
            byte {} of a {} byte destination", host_extent, dst.len())));
    }

    let submit = |host: HostMem, host_offset: usize, host_len: usize| {
        let mem = mem.clone();
        let work: Work = Box::new(move || {
            check_acquired(&mem)?;
            let data = mem.0.copy_out(0, mem.size());
            let mut guard = host.write();
            let host_slice = &mut guard.as_mut_slice()[host_offset..host_offset + host_len];
            util::copy_rect(&data, mem_origin, mem_pitch, host_slice, host_origin, host_pitch,
                region);
            Ok(())
        });
        queue.0.submit(command_type, wait_list, work)
    };

    match dst {
        HostDst::Slice(slice) => {
            let staging = HostMem::from_bytes(slice);
            let event = block_on(submit(staging.clone(), 0, slice.len())?, true)?;
            slice.copy_from_slice(staging.read().as_slice());
            Ok(event)
        },
        HostDst::Shared { mem: host, offset, len } => {
            check_range(offset, len, host.len(), fn_name)?;
            block_on(submit(host, offset, len)?, block)
        },
    }
}

/// Shared implementation of rectangular and image writes.
fn enqueue_write_rect(queue: &CommandQueue, command_type: CommandType, mem: &Mem, block: bool,
        mem_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3], mem_pitch: RectPitch,
        host_pitch: RectPitch, src: HostSrc, wait_list: Option<&[Event]>, fn_name: &'static str)
        -> Result<Event> {
    let host_extent = util::rect_extent(host_origin, region, host_pitch);
    if host_extent > src.len() {
        return Err(api_err(Status::InvalidValue, fn_name, format!("host region extends to \
            byte {} of a {} byte source", host_extent, src.len())));
    }

    let write = move |mem: &Mem, data: &[u8]| {
        let mut guard = mem.0.storage.write();
        let start = mem.offset();
        let dst = &mut guard.as_mut_slice()[start..start + mem.size()];
        util::copy_rect(data, host_origin, host_pitch, dst, mem_origin, mem_pitch, region);
    };

    let mem = mem.clone();
    let work: Work = match src {
        HostSrc::Slice(slice) => {
            let data = slice[..host_extent].to_vec();
            Box::new(move || {
                check_acquired(&mem)?;
                write(&mem, &data);
                Ok(())
            })
        },
        HostSrc::Shared { mem: host, offset, len } => {
            check_range(offset, len, host.len(), fn_name)?;
            Box::new(move || {
                check_acquired(&mem)?;
                let data = host.read().as_slice()[offset..offset + host_extent].to_vec();
                write(&mem, &data);
                Ok(())
            })
        },
    };

    block_on(queue.0.submit(command_type, wait_list, work)?, block)
}

/// Enqueues a read of a rectangular region of a buffer into host memory.
///
/// Origins are `[bytes, rows, slices]`; `region[0]` is in bytes. A zero
/// pitch means tightly packed.
pub fn enqueue_read_buffer_rect(queue: &CommandQueue, buffer: &Mem, block: bool,
        buffer_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3],
        buffer_row_pitch: usize, buffer_slc_pitch: usize, host_row_pitch: usize,
        host_slc_pitch: usize, dst: HostDst, wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_read_buffer_rect";
    check_buffer(queue, buffer, FN)?;
    check_host_readable(buffer, FN)?;

    let buffer_pitch = util::rect_pitch(region, buffer_row_pitch, buffer_slc_pitch, FN)?;
    let host_pitch = util::rect_pitch(region, host_row_pitch, host_slc_pitch, FN)?;
    let extent = util::rect_extent(buffer_origin, region, buffer_pitch);
    if extent > buffer.size() {
        return Err(api_err(Status::InvalidValue, FN, format!("buffer region extends to byte \
            {} of a {} byte buffer", extent, buffer.size())));
    }

    enqueue_read_rect(queue, CommandType::ReadBufferRect, buffer, block, buffer_origin,
        host_origin, region, buffer_pitch, host_pitch, dst, wait_list, FN)
}

/// Enqueues a write of a rectangular region of host memory into a buffer.
pub fn enqueue_write_buffer_rect(queue: &CommandQueue, buffer: &Mem, block: bool,
        buffer_origin: [usize; 3], host_origin: [usize; 3], region: [usize; 3],
        buffer_row_pitch: usize, buffer_slc_pitch: usize, host_row_pitch: usize,
        host_slc_pitch: usize, src: HostSrc, wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_write_buffer_rect";
    check_buffer(queue, buffer, FN)?;
    check_host_writable(buffer, FN)?;

    let buffer_pitch = util::rect_pitch(region, buffer_row_pitch, buffer_slc_pitch, FN)?;
    let host_pitch = util::rect_pitch(region, host_row_pitch, host_slc_pitch, FN)?;
    let extent = util::rect_extent(buffer_origin, region, buffer_pitch);
    if extent > buffer.size() {
        return Err(api_err(Status::InvalidValue, FN, format!("buffer region extends to byte \
            {} of a {} byte buffer", extent, buffer.size())));
    }

    enqueue_write_rect(queue, CommandType::WriteBufferRect, buffer, block, buffer_origin,
        host_origin, region, buffer_pitch, host_pitch, src, wait_list, FN)
}

/// Enqueues a copy of `len` bytes between two buffers.
pub fn enqueue_copy_buffer(queue: &CommandQueue, src_buffer: &Mem, dst_buffer: &Mem,
        src_offset: usize, dst_offset: usize, len: usize, wait_list: Option<&[Event]>)
        -> Result<Event> {
    const FN: &str = "enqueue_copy_buffer";
    check_buffer(queue, src_buffer, FN)?;
    check_buffer(queue, dst_buffer, FN)?;
    if len == 0 {
        return Err(api_err(Status::InvalidValue, FN, "copy length must be non-zero"));
    }
    check_range(src_offset, len, src_buffer.size(), FN)?;
    check_range(dst_offset, len, dst_buffer.size(), FN)?;

    if Arc::ptr_eq(&src_buffer.0.storage, &dst_buffer.0.storage) {
        let s = src_buffer.offset() + src_offset;
        let d = dst_buffer.offset() + dst_offset;
        if s < d + len && d < s + len {
            return Err(api_err(Status::MemCopyOverlap, FN, format!("source [{}..{}) and \
                destination [{}..{}) overlap", s, s + len, d, d + len)));
        }
    }

    let (src, dst) = (src_buffer.clone(), dst_buffer.clone());
    queue.0.submit(CommandType::CopyBuffer, wait_list, Box::new(move || {
        check_acquired(&src)?;
        check_acquired(&dst)?;
        let data = src.0.copy_out(src_offset, len);
        dst.0.copy_in(dst_offset, &data);
        Ok(())
    }))
}

/// Enqueues a fill of `len` bytes of `buffer` with a repeated pattern.
///
/// The pattern length must be a power of two no greater than 128 and
/// `offset` and `len` must be multiples of it.
pub fn enqueue_fill_buffer(queue: &CommandQueue, buffer: &Mem, pattern: &[u8], offset: usize,
        len: usize, wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_fill_buffer";
    check_buffer(queue, buffer, FN)?;

    let plen = pattern.len();
    if plen == 0 || !plen.is_power_of_two() || plen > 128 {
        return Err(api_err(Status::InvalidValue, FN,
            format!("pattern length ({}) must be a power of two from 1 to 128", plen)));
    }
    if offset % plen != 0 || len % plen != 0 {
        return Err(api_err(Status::InvalidValue, FN, format!("offset ({}) and length ({}) \
            must be multiples of the pattern length ({})", offset, len, plen)));
    }
    check_range(offset, len, buffer.size(), FN)?;

    let mem = buffer.clone();
    let pattern = pattern.to_vec();
    queue.0.submit(CommandType::FillBuffer, wait_list, Box::new(move || {
        check_acquired(&mem)?;
        let mut guard = mem.0.storage.write();
        let start = mem.offset() + offset;
        for chunk in guard.as_mut_slice()[start..start + len].chunks_exact_mut(plen) {
            chunk.copy_from_slice(&pattern);
        }
        Ok(())
    }))
}

fn image_rect(image: &Mem, origin: [usize; 3], region: [usize; 3], fn_name: &'static str)
        -> Result<(ImageLayout, [usize; 3], [usize; 3])> {
    let layout = *image.0.image_layout().ok_or_else(|| api_err(Status::InvalidMemObject,
        fn_name, format!("{:?} is not an image", image)))?;

    if origin[2] != 0 || region[2] != 1 {
        return Err(api_err(Status::InvalidValue, fn_name,
            "two dimensional images require origin[2] == 0 and region[2] == 1"));
    }
    if region[0] == 0 || region[1] == 0
            || origin[0] + region[0] > layout.width
            || origin[1] + region[1] > layout.height {
        return Err(api_err(Status::InvalidValue, fn_name, format!("region {:?} at {:?} is \
            outside the {}x{} image", region, origin, layout.width, layout.height)));
    }

    let px = layout.pixel_size;
    Ok((layout, [origin[0] * px, origin[1], 0], [region[0] * px, region[1], 1]))
}

/// Enqueues a read of a region of an image. Origins and regions are in
/// pixels; `row_pitch` and `slc_pitch` describe the host layout in bytes.
pub fn enqueue_read_image(queue: &CommandQueue, image: &Mem, block: bool, origin: [usize; 3],
        region: [usize; 3], row_pitch: usize, slc_pitch: usize, dst: HostDst,
        wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_read_image";
    check_context(queue.context(), image.context(), "image")?;
    check_host_readable(image, FN)?;

    let (layout, mem_origin, byte_region) = image_rect(image, origin, region, FN)?;
    let mem_pitch = RectPitch { row: layout.row_pitch, slice: layout.row_pitch * layout.height };
    let host_pitch = util::rect_pitch(byte_region, row_pitch, slc_pitch, FN)?;

    enqueue_read_rect(queue, CommandType::ReadImage, image, block, mem_origin, [0, 0, 0],
        byte_region, mem_pitch, host_pitch, dst, wait_list, FN)
}

/// Enqueues a write to a region of an image.
pub fn enqueue_write_image(queue: &CommandQueue, image: &Mem, block: bool, origin: [usize; 3],
        region: [usize; 3], row_pitch: usize, slc_pitch: usize, src: HostSrc,
        wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_write_image";
    check_context(queue.context(), image.context(), "image")?;
    check_host_writable(image, FN)?;

    let (layout, mem_origin, byte_region) = image_rect(image, origin, region, FN)?;
    let mem_pitch = RectPitch { row: layout.row_pitch, slice: layout.row_pitch * layout.height };
    let host_pitch = util::rect_pitch(byte_region, row_pitch, slc_pitch, FN)?;

    enqueue_write_rect(queue, CommandType::WriteImage, image, block, mem_origin, [0, 0, 0],
        byte_region, mem_pitch, host_pitch, src, wait_list, FN)
}

/// Enqueues a map of `len` bytes of `buffer` into host memory.
///
/// Unless `MapFlags::WRITE_INVALIDATE_REGION` is given the mapped host
/// memory holds the buffer contents once the returned event completes.
pub fn enqueue_map_buffer(queue: &CommandQueue, buffer: &Mem, block: bool, flags: MapFlags,
        offset: usize, len: usize, wait_list: Option<&[Event]>) -> Result<(MappedRegion, Event)> {
    const FN: &str = "enqueue_map_buffer";
    check_buffer(queue, buffer, FN)?;
    if len == 0 {
        return Err(api_err(Status::InvalidValue, FN, "map length must be non-zero"));
    }
    check_range(offset, len, buffer.size(), FN)?;
    if flags.contains(MapFlags::WRITE_INVALIDATE_REGION)
            && flags.intersects(MapFlags::READ | MapFlags::WRITE) {
        return Err(api_err(Status::InvalidValue, FN,
            "WRITE_INVALIDATE_REGION cannot be combined with READ or WRITE"));
    }
    if flags.contains(MapFlags::READ) {
        check_host_readable(buffer, FN)?;
    }
    if flags.intersects(MapFlags::WRITE | MapFlags::WRITE_INVALIDATE_REGION) {
        check_host_writable(buffer, FN)?;
    }

    let host = HostMem::new(len);
    let (mem, map_host) = (buffer.clone(), host.clone());
    let event = queue.0.submit(CommandType::MapBuffer, wait_list, Box::new(move || {
        check_acquired(&mem)?;
        if !flags.contains(MapFlags::WRITE_INVALIDATE_REGION) {
            let data = mem.0.copy_out(offset, len);
            map_host.write().as_mut_slice().copy_from_slice(&data);
        }
        mem.0.map_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))?;

    let region = MappedRegion { mem: buffer.clone(), offset, len, flags, host };
    Ok((region, block_on(event, block)?))
}

/// Enqueues an unmap of a mapped region, writing the host contents back to
/// the buffer if it was mapped for writing.
pub fn enqueue_unmap_mem_object(queue: &CommandQueue, region: MappedRegion,
        wait_list: Option<&[Event]>) -> Result<Event> {
    check_context(queue.context(), region.mem.context(), "mapped memory object")?;

    let MappedRegion { mem, offset, flags, host, .. } = region;
    queue.0.submit(CommandType::UnmapMemObject, wait_list, Box::new(move || {
        if flags.intersects(MapFlags::WRITE | MapFlags::WRITE_INVALIDATE_REGION) {
            check_acquired(&mem)?;
            let data = host.read().as_slice().to_vec();
            mem.0.copy_in(offset, &data);
        }
        let _ = mem.0.map_count.fetch_update(Ordering::SeqCst, Ordering::SeqCst,
            |c| c.checked_sub(1));
        Ok(())
    }))
}

//=============================================================================
//============================= PROGRAMS AND KERNELS ==========================
//=============================================================================

/// Creates a program from source strings, which are concatenated with
/// newlines. Kernels declared by the source bind to the natives in
/// `library` when the program is built.
pub fn create_program_with_source(context: &Context, src_strings: &[String],
        library: &KernelLibrary) -> Result<Program> {
    if src_strings.iter().all(|s| s.trim().is_empty()) {
        return Err(api_err(Status::InvalidValue, "create_program_with_source",
            "no source provided"));
    }

    let program = Program(Arc::new(ProgramObj::new(context, src_strings.join("\n"),
        library.clone())));
    debug!("create_program_with_source: {:?} ({} source string(s))", program, src_strings.len());
    Ok(program)
}

/// Builds a program for `devices` (every device of its context if `None`).
///
/// On failure returns `Error::BuildFailed` holding the build log.
pub fn build_program(program: &Program, devices: Option<&[DeviceId]>, options: &str)
        -> Result<()> {
    let context_devices = program.context().devices();
    let devices = match devices {
        Some(devices) if !devices.is_empty() => devices,
        _ => context_devices,
    };

    if let Some(d) = devices.iter().find(|d| !context_devices.contains(d)) {
        return Err(api_err(Status::InvalidDevice, "build_program", format!("device '{}' is not \
            associated with the program's context", d.name())));
    }
    if program.0.state.lock().attached_kernels > 0 {
        return Err(api_err(Status::InvalidOperation, "build_program",
            "kernel objects are attached to the program"));
    }

    program.0.build(devices, options)
}

/// Returns information about a program.
pub fn get_program_info(program: &Program, request: ProgramInfo) -> Result<ProgramInfoResult> {
    let devices = program.context().devices();
    Ok(match request {
        ProgramInfo::ReferenceCount => ProgramInfoResult::ReferenceCount(program.ref_count()),
        ProgramInfo::Context => ProgramInfoResult::Context(program.context().clone()),
        ProgramInfo::NumDevices => ProgramInfoResult::NumDevices(devices.len() as u32),
        ProgramInfo::Devices => ProgramInfoResult::Devices(devices.to_vec()),
        ProgramInfo::Source => ProgramInfoResult::Source(program.0.source.clone()),
        ProgramInfo::NumKernels | ProgramInfo::KernelNames => {
            if !program.0.is_built() {
                return Err(api_err(Status::InvalidProgramExecutable, "get_program_info",
                    "the program has not been built successfully"));
            }
            let state = program.0.state.lock();
            if request == ProgramInfo::NumKernels {
                ProgramInfoResult::NumKernels(state.kernels.len())
            } else {
                ProgramInfoResult::KernelNames(state.kernels.iter()
                    .map(|k| k.name.as_str()).collect::<Vec<_>>().join(";"))
            }
        },
    })
}

/// Returns build information for one device.
pub fn get_program_build_info(program: &Program, device: &DeviceId, request: ProgramBuildInfo)
        -> Result<ProgramBuildInfoResult> {
    if !program.context().devices().contains(device) {
        return Err(api_err(Status::InvalidDevice, "get_program_build_info",
            format!("device '{}' is not associated with the program's context", device.name())));
    }

    let state = program.0.state.lock();
    let build = state.builds.iter().find(|b| &b.device == device);
    Ok(match request {
        ProgramBuildInfo::BuildStatus => ProgramBuildInfoResult::BuildStatus(
            build.map_or(ProgramBuildStatus::None, |b| b.status)),
        ProgramBuildInfo::BuildOptions => ProgramBuildInfoResult::BuildOptions(state.options.clone()),
        ProgramBuildInfo::BuildLog => ProgramBuildInfoResult::BuildLog(
            build.map(|b| b.log.clone()).unwrap_or_default()),
    })
}

/// Creates a kernel for the entry point `name`.
pub fn create_kernel<S: AsRef<str>>(program: &Program, name: S) -> Result<Kernel> {
    let name = name.as_ref();
    if !program.0.is_built() {
        return Err(api_err(Status::InvalidProgramExecutable, "create_kernel",
            "the program has not been built successfully"));
    }

    let sig = program.0.state.lock().kernels.iter().find(|k| k.name == name).cloned()
        .ok_or_else(|| Error::UnknownEntryPoint(name.to_owned()))?;
    let native = program.0.library.get(name)
        .ok_or_else(|| Error::UnknownEntryPoint(name.to_owned()))?;

    Ok(Kernel(Arc::new(KernelObj::new(program, sig, native))))
}

/// Creates a kernel for every entry point in the program, in declaration
/// order.
pub fn create_kernels_in_program(program: &Program) -> Result<Vec<Kernel>> {
    if !program.0.is_built() {
        return Err(api_err(Status::InvalidProgramExecutable, "create_kernels_in_program",
            "the program has not been built successfully"));
    }

    let names: Vec<String> = program.0.state.lock().kernels.iter().map(|k| k.name.clone())
        .collect();
    names.iter().map(|name| create_kernel(program, name)).collect()
}

fn describe_arg(arg: &ArgVal) -> &'static str {
    match *arg {
        ArgVal::Mem(ref mem) if mem.is_image() => "an image",
        ArgVal::Mem(_) => "a buffer",
        ArgVal::Sampler(_) => "a sampler",
        ArgVal::Scalar(_) => "a scalar",
        ArgVal::Local(_) => "a local memory size",
        ArgVal::Null => "a null pointer",
    }
}

/// Sets the argument at `arg_index`.
///
/// The value must suit the declared parameter: a buffer (or null) for a
/// global or constant pointer, a non-zero size for a local pointer, an
/// image, a sampler, or a scalar of the declared size.
pub fn set_kernel_arg(kernel: &Kernel, arg_index: u32, arg: ArgVal) -> Result<()> {
    const FN: &str = "set_kernel_arg";
    let idx = arg_index as usize;
    let param = kernel.0.sig.params.get(idx).ok_or_else(|| api_err(Status::InvalidArgIndex, FN,
        format!("kernel '{}' has {} argument(s), index {} is out of range", kernel.name(),
            kernel.0.sig.params.len(), idx)))?;
    let context = kernel.program().context();

    let mismatch = |status: Status| api_err(status, FN, format!("argument {} ('{}: {}') of \
        kernel '{}' cannot be {}", idx, param.name, param.type_name, kernel.name(),
        describe_arg(&arg)));

    match (param.kind, &arg) {
        (ParamKind::Pointer, &ArgVal::Mem(ref mem)) if !mem.is_image() => {
            check_context(context, mem.context(), "memory object")?
        },
        (ParamKind::Pointer, &ArgVal::Null) => (),
        (ParamKind::LocalPointer, &ArgVal::Local(len)) if len > 0 => (),
        (ParamKind::LocalPointer, &ArgVal::Local(_)) => return Err(mismatch(Status::InvalidArgSize)),
        (ParamKind::Image, &ArgVal::Mem(ref mem)) if mem.is_image() => {
            check_context(context, mem.context(), "image")?
        },
        (ParamKind::Sampler, &ArgVal::Sampler(ref sampler)) => {
            check_context(context, sampler.context(), "sampler")?
        },
        (ParamKind::Scalar { size }, &ArgVal::Scalar(ref bytes)) => {
            if let Some(size) = size {
                if bytes.len() != size {
                    return Err(api_err(Status::InvalidArgSize, FN, format!("argument {} ('{}: \
                        {}') of kernel '{}' is {} bytes, found {}", idx, param.name,
                        param.type_name, kernel.name(), size, bytes.len())));
                }
            }
        },
        (ParamKind::Image, &ArgVal::Mem(_)) | (ParamKind::Pointer, &ArgVal::Mem(_)) => {
            return Err(mismatch(Status::InvalidMemObject));
        },
        _ => return Err(mismatch(Status::InvalidArgValue)),
    }

    kernel.0.args.lock()[idx] = Some(arg);
    Ok(())
}

/// Returns information about a kernel.
pub fn get_kernel_info(kernel: &Kernel, request: KernelInfo) -> Result<KernelInfoResult> {
    Ok(match request {
        KernelInfo::FunctionName => KernelInfoResult::FunctionName(kernel.name().to_owned()),
        KernelInfo::NumArgs => KernelInfoResult::NumArgs(kernel.0.sig.params.len() as u32),
        KernelInfo::ReferenceCount => KernelInfoResult::ReferenceCount(kernel.ref_count()),
        KernelInfo::Context => KernelInfoResult::Context(kernel.program().context().clone()),
        KernelInfo::Program => KernelInfoResult::Program(kernel.program().clone()),
    })
}

/// Returns information about a declared kernel argument.
pub fn get_kernel_arg_info(kernel: &Kernel, arg_index: u32, request: KernelArgInfo)
        -> Result<KernelArgInfoResult> {
    let param = kernel.0.sig.params.get(arg_index as usize).ok_or_else(|| {
        api_err(Status::InvalidArgIndex, "get_kernel_arg_info", format!("kernel '{}' has no \
            argument {}", kernel.name(), arg_index))
    })?;

    Ok(match request {
        KernelArgInfo::AddressQualifier => KernelArgInfoResult::AddressQualifier(param.address),
        KernelArgInfo::AccessQualifier => KernelArgInfoResult::AccessQualifier(param.access),
        KernelArgInfo::TypeName => KernelArgInfoResult::TypeName(param.type_name.clone()),
        KernelArgInfo::Name => KernelArgInfoResult::Name(param.name.clone()),
    })
}

/// Returns work-group information about a kernel on a device.
pub fn get_kernel_work_group_info(kernel: &Kernel, device: &DeviceId,
        request: KernelWorkGroupInfo) -> Result<KernelWorkGroupInfoResult> {
    if !kernel.program().context().devices().contains(device) {
        return Err(api_err(Status::InvalidDevice, "get_kernel_work_group_info",
            format!("device '{}' is not associated with the kernel's context", device.name())));
    }

    let config = &device.0.config;
    Ok(match request {
        KernelWorkGroupInfo::WorkGroupSize => {
            KernelWorkGroupInfoResult::WorkGroupSize(config.max_work_group_size)
        },
        KernelWorkGroupInfo::CompileWorkGroupSize => {
            KernelWorkGroupInfoResult::CompileWorkGroupSize([0, 0, 0])
        },
        KernelWorkGroupInfo::LocalMemSize => {
            KernelWorkGroupInfoResult::LocalMemSize(kernel.0.local_mem_size())
        },
        KernelWorkGroupInfo::PreferredWorkGroupSizeMultiple => {
            KernelWorkGroupInfoResult::PreferredWorkGroupSizeMultiple(
                config.preferred_work_group_multiple)
        },
        KernelWorkGroupInfo::PrivateMemSize => {
            KernelWorkGroupInfoResult::PrivateMemSize(kernel.0.native.private_mem_size())
        },
    })
}

/// Picks, per dimension, the largest divisor of the global size which fits
/// the device limits.
fn choose_local_size(global: [usize; 3], max_items: [usize; 3], max_group: usize) -> [usize; 3] {
    let mut local = [1usize; 3];
    let mut budget = max_group.max(1);

    for d in 0..3 {
        let limit = max_items[d].min(budget).max(1);
        local[d] = (1..=limit.min(global[d])).rev().find(|l| global[d] % l == 0).unwrap_or(1);
        budget /= local[d];
    }

    local
}

fn enqueue_launch(queue: &CommandQueue, command_type: CommandType, kernel: &Kernel,
        work_dim: u32, global_work_offset: Option<[usize; 3]>, global_work_dims: &[usize; 3],
        local_work_dims: Option<[usize; 3]>, wait_list: Option<&[Event]>) -> Result<Event> {
    const FN: &str = "enqueue_kernel";
    check_context(queue.context(), kernel.program().context(), "kernel")?;

    if work_dim == 0 || work_dim > 3 {
        return Err(api_err(Status::InvalidWorkDimension, FN,
            format!("work dimensions must be 1, 2, or 3 (found: {})", work_dim)));
    }
    let dims = work_dim as usize;

    let mut global = [1usize; 3];
    let mut offset = [0usize; 3];
    global[..dims].copy_from_slice(&global_work_dims[..dims]);
    if let Some(o) = global_work_offset {
        offset[..dims].copy_from_slice(&o[..dims]);
    }
    if let Some(d) = (0..dims).find(|&d| global[d] == 0) {
        return Err(api_err(Status::InvalidGlobalWorkSize, FN,
            format!("global work size in dimension {} is zero: {:?}", d, global)));
    }

    let config = &queue.device().0.config;
    let local = match local_work_dims {
        Some(l) => {
            let mut local = [1usize; 3];
            local[..dims].copy_from_slice(&l[..dims]);
            for d in 0..dims {
                if local[d] == 0 || global[d] % local[d] != 0 {
                    return Err(Error::InvalidWorkGroup(format!("local size {:?} does not evenly \
                        divide global size {:?} in dimension {}", local, global, d)));
                }
                if local[d] > config.max_work_item_sizes[d] {
                    return Err(Error::InvalidWorkGroup(format!("local size {} exceeds the \
                        device maximum of {} in dimension {}", local[d],
                        config.max_work_item_sizes[d], d)));
                }
            }
            let total: usize = local.iter().product();
            if total > config.max_work_group_size {
                return Err(Error::InvalidWorkGroup(format!("work-group of {} items exceeds \
                    the device maximum of {}", total, config.max_work_group_size)));
            }
            local
        },
        None => choose_local_size(global, config.max_work_item_sizes, config.max_work_group_size),
    };

    let args: Vec<ArgVal> = {
        let args = kernel.0.args.lock();
        let mut snapshot = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match *arg {
                Some(ref arg) => snapshot.push(arg.clone()),
                None => {
                    return Err(api_err(Status::InvalidKernelArgs, FN, format!("argument {} \
                        ('{}') of kernel '{}' has not been set", i, kernel.0.sig.params[i].name,
                        kernel.name())));
                },
            }
        }
        snapshot
    };

    let local_mem: u64 = args.iter().filter_map(|a| match *a {
        ArgVal::Local(len) => Some(len as u64),
        _ => None,
    }).sum();
    if local_mem > config.local_mem_size {
        return Err(api_err(Status::OutOfResources, FN, format!("kernel '{}' requires {} bytes \
            of local memory, the device has {}", kernel.name(), local_mem,
            config.local_mem_size)));
    }

    debug!("{}: '{}' on {:?}: global {:?}, local {:?}, offset {:?}", FN, kernel.name(), queue,
        &global[..dims], &local[..dims], &offset[..dims]);

    let launch = Launch {
        name: kernel.name().to_owned(),
        native: kernel.0.native.clone(),
        params: kernel.0.sig.params.iter().map(|p| p.kind).collect(),
        args,
        defines: kernel.program().0.state.lock().defines.clone(),
        work_dim,
        global_offset: offset,
        global_size: global,
        local_size: local,
    };

    queue.0.submit(command_type, wait_list, Box::new(move || launch.execute()))
}

/// Enqueues an N-dimensional kernel launch.
///
/// Only the first `work_dim` entries of each size are used. If
/// `local_work_dims` is `None` a work-group size is chosen. Arguments are
/// captured when this function is called; changing them afterwards does
/// not affect the launch.
pub fn enqueue_kernel(queue: &CommandQueue, kernel: &Kernel, work_dim: u32,
        global_work_offset: Option<[usize; 3]>, global_work_dims: &[usize; 3],
        local_work_dims: Option<[usize; 3]>, wait_list: Option<&[Event]>) -> Result<Event> {
    enqueue_launch(queue, CommandType::NdrangeKernel, kernel, work_dim, global_work_offset,
        global_work_dims, local_work_dims, wait_list)
}

/// Enqueues a kernel as a single work-item.
pub fn enqueue_task(queue: &CommandQueue, kernel: &Kernel, wait_list: Option<&[Event]>)
        -> Result<Event> {
    enqueue_launch(queue, CommandType::Task, kernel, 1, None, &[1, 1, 1], Some([1, 1, 1]),
        wait_list)
}

//=============================================================================
//================================== EVENTS ===================================
//=============================================================================

/// Creates a user event, initially `EventStatus::Submitted`.
pub fn create_user_event(context: &Context) -> Result<Event> {
    Ok(Event::new_user(context))
}

/// Sets the status of a user event to `EventStatus::Complete` or an error.
/// May be called only once.
pub fn set_user_event_status(event: &Event, status: EventStatus) -> Result<()> {
    event.set_user_status(status)
}

/// Registers a callback run when `event` reaches `trigger` (or fails).
///
/// Callbacks run on the thread which advances the event, or immediately on
/// the calling thread if the status has already been reached. They must not
/// block on commands of the queue which runs them.
pub fn set_event_callback<F>(event: &Event, trigger: CommandExecutionStatus, callback: F)
        -> Result<()> where F: FnOnce(&Event, EventStatus) + Send + 'static {
    if trigger == CommandExecutionStatus::Queued {
        return Err(api_err(Status::InvalidValue, "set_event_callback",
            "callbacks may be registered for Submitted, Running, or Complete only"));
    }
    event.add_callback(trigger, Box::new(callback));
    Ok(())
}

/// Blocks until `event` finishes.
pub fn wait_for_event(event: &Event) -> Result<()> {
    event.wait()
}

/// Blocks until every event finishes, returning the first failure.
pub fn wait_for_events(events: &[Event]) -> Result<()> {
    let mut first_err = None;
    for event in events {
        if let Err(err) = event.wait() {
            first_err.get_or_insert(err);
        }
    }
    first_err.map_or(Ok(()), Err)
}

/// Returns the current status of an event.
pub fn get_event_status(event: &Event) -> Result<EventStatus> {
    Ok(event.status())
}

/// Returns information about an event.
pub fn get_event_info(event: &Event, request: EventInfo) -> Result<EventInfoResult> {
    Ok(match request {
        EventInfo::CommandType => EventInfoResult::CommandType(event.command_type()),
        EventInfo::ReferenceCount => EventInfoResult::ReferenceCount(event.ref_count()),
        EventInfo::CommandExecutionStatus => EventInfoResult::CommandExecutionStatus(event.status()),
        EventInfo::Context => EventInfoResult::Context(event.context().clone()),
    })
}

/// Returns a profiling timestamp of a completed command.
///
/// Fails with `Status::ProfilingInfoNotAvailable` unless the queue was
/// created with `CommandQueueProperties::PROFILING_ENABLE` and the command
/// has completed.
pub fn get_event_profiling_info(event: &Event, request: ProfilingInfo)
        -> Result<ProfilingInfoResult> {
    let time = event.0.profiling_time(request)?;
    Ok(match request {
        ProfilingInfo::Queued => ProfilingInfoResult::Queued(time),
        ProfilingInfo::Submit => ProfilingInfoResult::Submit(time),
        ProfilingInfo::Start => ProfilingInfoResult::Start(time),
        ProfilingInfo::End => ProfilingInfoResult::End(time),
    })
}

//=============================================================================
//=========================== GRAPHICS INTEROPERATION =========================
//=============================================================================

fn check_gl_context(context: &Context, fn_name: &'static str) -> Result<()> {
    if !context.0.is_gl_shared() {
        return Err(api_err(Status::InvalidGlSharegroupReferenceKhr, fn_name,
            format!("{:?} was not created with graphics sharing properties", context)));
    }
    Ok(())
}

fn gl_access_flags(flags: MemFlags, fn_name: &'static str) -> Result<MemFlags> {
    if !(flags - ACCESS_FLAGS).is_empty() {
        return Err(api_err(Status::InvalidValue, fn_name,
            format!("only access flags may be given for shared objects: {:?}", flags)));
    }
    validate_flags(flags, fn_name)?;
    Ok(flags.access())
}

/// Creates a buffer which shares the contents of a graphics buffer.
///
/// The buffer must be acquired with `enqueue_acquire_gl_objects` before
/// commands may use it.
pub fn create_from_gl_buffer(context: &Context, flags: MemFlags, object: Arc<dyn GlObject>)
        -> Result<Mem> {
    const FN: &str = "create_from_gl_buffer";
    check_gl_context(context, FN)?;
    let flags = gl_access_flags(flags, FN)?;

    let len = object.byte_len();
    if len == 0 {
        return Err(api_err(Status::InvalidGlObject, FN,
            format!("graphics buffer {} has no storage", object.gl_name())));
    }

    debug!("{}: graphics buffer {} ({} bytes)", FN, object.gl_name(), len);
    Ok(new_mem(context, flags, HostMem::new(len).0, 0, len, MemKind::Buffer, None,
        Some(GlShare { object, acquired: AtomicBool::new(false) })))
}

/// Creates a two dimensional image which shares the contents of a graphics
/// texture.
pub fn create_from_gl_texture_2d(context: &Context, flags: MemFlags, object: Arc<dyn GlObject>,
        format: &ImageFormat, width: usize, height: usize) -> Result<Mem> {
    const FN: &str = "create_from_gl_texture_2d";
    check_gl_context(context, FN)?;
    let flags = gl_access_flags(flags, FN)?;

    let pixel_size = format.pixel_size()?;
    let len = width * height * pixel_size;
    if len == 0 || object.byte_len() != len {
        return Err(api_err(Status::InvalidGlObject, FN, format!("texture {} holds {} bytes, \
            {}x{} {:?} requires {}", object.gl_name(), object.byte_len(), width, height, format,
            len)));
    }

    let layout = ImageLayout { format: *format, width, height, pixel_size,
        row_pitch: width * pixel_size };
    debug!("{}: texture {} ({}x{})", FN, object.gl_name(), width, height);
    Ok(new_mem(context, flags, HostMem::new(len).0, 0, len, MemKind::Image(layout), None,
        Some(GlShare { object, acquired: AtomicBool::new(false) })))
}

fn check_gl_mems(queue: &CommandQueue, mems: &[Mem], fn_name: &'static str) -> Result<Vec<Mem>> {
    for mem in mems {
        check_context(queue.context(), mem.context(), "shared memory object")?;
        if mem.0.gl.is_none() {
            return Err(api_err(Status::InvalidGlObject, fn_name,
                format!("{:?} was not created from a graphics object", mem)));
        }
    }
    Ok(mems.to_vec())
}

/// Enqueues acquisition of shared objects, copying in the current graphics
/// contents. Acquiring an object which is already acquired fails the
/// command.
pub fn enqueue_acquire_gl_objects(queue: &CommandQueue, mems: &[Mem],
        wait_list: Option<&[Event]>) -> Result<Event> {
    let mems = check_gl_mems(queue, mems, "enqueue_acquire_gl_objects")?;
    queue.0.submit(CommandType::AcquireGlObjects, wait_list, Box::new(move || {
        for mem in &mems {
            let gl = mem.0.gl.as_ref().ok_or(Status::InvalidGlObject)?;
            if gl.acquired.swap(true, Ordering::SeqCst) {
                return Err(Status::InvalidOperation);
            }
            let mut data = vec![0u8; mem.size()];
            gl.object.read_into(&mut data);
            mem.0.copy_in(0, &data);
        }
        Ok(())
    }))
}

/// Enqueues release of shared objects, copying their contents back to the
/// graphics side. Releasing an object which is not acquired fails the
/// command.
pub fn enqueue_release_gl_objects(queue: &CommandQueue, mems: &[Mem],
        wait_list: Option<&[Event]>) -> Result<Event> {
    let mems = check_gl_mems(queue, mems, "enqueue_release_gl_objects")?;
    queue.0.submit(CommandType::ReleaseGlObjects, wait_list, Box::new(move || {
        for mem in &mems {
            let gl = mem.0.gl.as_ref().ok_or(Status::InvalidGlObject)?;
            if !gl.acquired.swap(false, Ordering::SeqCst) {
                return Err(Status::InvalidOperation);
            }
            let data = mem.0.copy_out(0, mem.size());
            gl.object.write_from(&data);
        }
        Ok(())
    }))
}
