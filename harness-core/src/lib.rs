//! Low-level host API for the compute harness.
//!
//! Every object is a reference-counted handle into the software compute
//! runtime (see [`runtime`]). Free functions mirror the shape of a vendor
//! compute API: objects are created, queried with closed info enumerations,
//! and combined through command queues which hand out events.
//!
//! Most programs will want the higher level types in `ocl-harness` instead.
//!
//! ## Conventions
//!
//! * Offsets and lengths passed to free functions are in **bytes**.
//! * Functions that accept a wait list take `Option<&[Event]>` and return
//!   the new command's `Event`.
//! * Blocking variants wait on the new event before returning and convert a
//!   failed command into `Error::Submit` or `Error::Propagated`.

#![allow(clippy::too_many_arguments)]

use bitflags::bitflags;
use num_traits::{FromPrimitive, NumCast, One, ToPrimitive, Zero};
use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Sub};

mod error;
mod functions;
pub mod runtime;
pub mod types;
pub mod util;
#[cfg(test)]
mod tests;

pub use crate::error::{ApiError, Error, Result};
pub use crate::functions::{
    build_program, create_buffer, create_command_queue, create_context, create_from_gl_buffer,
    create_from_gl_texture_2d, create_image, create_kernel, create_kernels_in_program,
    create_platform, create_program_with_source, create_sampler, create_sub_buffer,
    create_user_event, enqueue_acquire_gl_objects, enqueue_copy_buffer, enqueue_fill_buffer,
    enqueue_kernel, enqueue_map_buffer, enqueue_marker, enqueue_read_buffer,
    enqueue_read_buffer_rect, enqueue_read_image, enqueue_release_gl_objects, enqueue_task,
    enqueue_unmap_mem_object, enqueue_write_buffer, enqueue_write_buffer_rect,
    enqueue_write_image, finish, flush, get_command_queue_info, get_context_info,
    get_device_ids, get_device_info, get_event_info, get_event_profiling_info,
    get_event_status, get_image_info, get_kernel_arg_info, get_kernel_info,
    get_kernel_work_group_info, get_mem_object_info, get_platform_ids, get_platform_info,
    get_program_build_info, get_program_info, get_sampler_info, set_event_callback,
    set_kernel_arg, set_user_event_status, wait_for_event, wait_for_events, HostDst, HostSrc,
    MemInit,
};
pub use crate::runtime::{
    Bytes, BytesReadGuard, BytesWriteGuard, DeviceConfig, GlObject, HostMem, ImageView,
    KernelLibrary, MappedRegion, NativeKernel, PlatformConfig, SamplerDesc, VectorWidths,
    WorkGroup, WorkItem,
};
pub use crate::types::abs::{
    CommandQueue, Context, DeviceId, Event, Kernel, Mem, PlatformId, Program, Sampler,
};
pub use crate::types::enums::{
    ArgVal, CommandQueueInfoResult, ContextInfoResult, DeviceInfoResult, EventInfoResult,
    EventStatus, ImageInfoResult, KernelArgInfoResult, KernelInfoResult,
    KernelWorkGroupInfoResult, MemInfoResult, PlatformInfoResult, ProfilingInfoResult,
    ProgramBuildInfoResult, ProgramInfoResult, SamplerInfoResult,
};
pub use crate::types::structs::{
    ContextProperties, ContextPropertyValue, ImageDescriptor, ImageFormat, KernelParam,
    KernelSignature, ParamKind,
};

//=============================================================================
//================================= TRAITS ====================================
//=============================================================================

/// A primitive type usable within buffers, images, and kernel arguments.
///
/// Anything plain-old-data (scalars and fixed size arrays of scalars) may be
/// transferred to and from device memory.
pub trait OclPrm: bytemuck::Pod + Debug + Default + PartialEq + Send + Sync + 'static {}

impl OclPrm for u8 {}
impl OclPrm for i8 {}
impl OclPrm for u16 {}
impl OclPrm for i16 {}
impl OclPrm for u32 {}
impl OclPrm for i32 {}
impl OclPrm for u64 {}
impl OclPrm for i64 {}
impl OclPrm for usize {}
impl OclPrm for isize {}
impl OclPrm for f32 {}
impl OclPrm for f64 {}
impl OclPrm for [u8; 4] {}
impl OclPrm for [u8; 16] {}
impl OclPrm for [u16; 8] {}
impl OclPrm for [i32; 2] {}
impl OclPrm for [i32; 4] {}
impl OclPrm for [u32; 2] {}
impl OclPrm for [u32; 4] {}
impl OclPrm for [f32; 2] {}
impl OclPrm for [f32; 4] {}

/// A scalar type usable for arithmetic on either side of a transfer.
pub trait OclScl:
    OclPrm
    + Copy
    + PartialOrd
    + NumCast
    + FromPrimitive
    + ToPrimitive
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Display
{
}

impl OclScl for u8 {}
impl OclScl for i8 {}
impl OclScl for u16 {}
impl OclScl for i16 {}
impl OclScl for u32 {}
impl OclScl for i32 {}
impl OclScl for u64 {}
impl OclScl for i64 {}
impl OclScl for usize {}
impl OclScl for isize {}
impl OclScl for f32 {}
impl OclScl for f64 {}

//=============================================================================
//================================ BITFIELDS ==================================
//=============================================================================

bitflags! {
    /// cl_device_type - bitfield
    #[derive(Default)]
    pub struct DeviceType: u64 {
        const DEFAULT = 1 << 0;
        const CPU = 1 << 1;
        const GPU = 1 << 2;
        const ACCELERATOR = 1 << 3;
        const CUSTOM = 1 << 4;
        const ALL = 0xFFFF_FFFF;
    }
}

impl DeviceType {
    pub fn new() -> DeviceType {
        DeviceType::empty()
    }
    pub fn system_default(self) -> DeviceType {
        self | DeviceType::DEFAULT
    }
    pub fn cpu(self) -> DeviceType {
        self | DeviceType::CPU
    }
    pub fn gpu(self) -> DeviceType {
        self | DeviceType::GPU
    }
    pub fn accelerator(self) -> DeviceType {
        self | DeviceType::ACCELERATOR
    }
    // `all()` is generated by `bitflags!` (union of all flags == `ALL`).
}

bitflags! {
    /// cl_device_fp_config - bitfield
    #[derive(Default)]
    pub struct DeviceFpConfig: u64 {
        const DENORM = 1 << 0;
        const INF_NAN = 1 << 1;
        const ROUND_TO_NEAREST = 1 << 2;
        const ROUND_TO_ZERO = 1 << 3;
        const ROUND_TO_INF = 1 << 4;
        const FMA = 1 << 5;
        const SOFT_FLOAT = 1 << 6;
        const CORRECTLY_ROUNDED_DIVIDE_SQRT = 1 << 7;
    }
}

bitflags! {
    /// cl_device_exec_capabilities - bitfield
    #[derive(Default)]
    pub struct DeviceExecCapabilities: u64 {
        const KERNEL = 1 << 0;
        const NATIVE_KERNEL = 1 << 1;
    }
}

bitflags! {
    /// cl_command_queue_properties - bitfield
    #[derive(Default)]
    pub struct CommandQueueProperties: u64 {
        const OUT_OF_ORDER_EXEC_MODE_ENABLE = 1 << 0;
        const PROFILING_ENABLE = 1 << 1;
    }
}

impl CommandQueueProperties {
    pub fn new() -> CommandQueueProperties {
        CommandQueueProperties::empty()
    }
    pub fn out_of_order(self) -> CommandQueueProperties {
        self | CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE
    }
    pub fn profiling(self) -> CommandQueueProperties {
        self | CommandQueueProperties::PROFILING_ENABLE
    }
}

bitflags! {
    /// cl_mem_flags - bitfield
    #[derive(Default)]
    pub struct MemFlags: u64 {
        const READ_WRITE = 1 << 0;
        const WRITE_ONLY = 1 << 1;
        const READ_ONLY = 1 << 2;
        const USE_HOST_PTR = 1 << 3;
        const ALLOC_HOST_PTR = 1 << 4;
        const COPY_HOST_PTR = 1 << 5;
        const HOST_WRITE_ONLY = 1 << 7;
        const HOST_READ_ONLY = 1 << 8;
        const HOST_NO_ACCESS = 1 << 9;
    }
}

impl MemFlags {
    pub fn new() -> MemFlags {
        MemFlags::empty()
    }
    pub fn read_write(self) -> MemFlags {
        self | MemFlags::READ_WRITE
    }
    pub fn write_only(self) -> MemFlags {
        self | MemFlags::WRITE_ONLY
    }
    pub fn read_only(self) -> MemFlags {
        self | MemFlags::READ_ONLY
    }
    pub fn use_host_ptr(self) -> MemFlags {
        self | MemFlags::USE_HOST_PTR
    }
    pub fn alloc_host_ptr(self) -> MemFlags {
        self | MemFlags::ALLOC_HOST_PTR
    }
    pub fn copy_host_ptr(self) -> MemFlags {
        self | MemFlags::COPY_HOST_PTR
    }
    pub fn host_write_only(self) -> MemFlags {
        self | MemFlags::HOST_WRITE_ONLY
    }
    pub fn host_read_only(self) -> MemFlags {
        self | MemFlags::HOST_READ_ONLY
    }
    pub fn host_no_access(self) -> MemFlags {
        self | MemFlags::HOST_NO_ACCESS
    }

    /// Returns the kernel access flags only, defaulting to read-write.
    pub fn access(self) -> MemFlags {
        let access = self & (MemFlags::READ_WRITE | MemFlags::WRITE_ONLY | MemFlags::READ_ONLY);
        if access.is_empty() {
            MemFlags::READ_WRITE
        } else {
            access
        }
    }
}

bitflags! {
    /// cl_map_flags - bitfield
    #[derive(Default)]
    pub struct MapFlags: u64 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const WRITE_INVALIDATE_REGION = 1 << 2;
    }
}

impl MapFlags {
    pub fn new() -> MapFlags {
        MapFlags::empty()
    }
    pub fn read(self) -> MapFlags {
        self | MapFlags::READ
    }
    pub fn write(self) -> MapFlags {
        self | MapFlags::WRITE
    }
    pub fn write_invalidate_region(self) -> MapFlags {
        self | MapFlags::WRITE_INVALIDATE_REGION
    }
}

//=============================================================================
//=============================== ENUMERATORS =================================
//=============================================================================

/// Generates an enum with explicit discriminants and a `from_i32`
/// conversion.
macro_rules! cl_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $value:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(C)]
        pub enum $name {
            $($variant = $value,)+
        }

        impl $name {
            /// Converts a raw value, returning `None` if it has no variant.
            pub fn from_i32(value: i32) -> Option<$name> {
                match value {
                    $(v if v == $value => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

cl_enum! {
    /// The status of an operation. Negative values are errors.
    pub enum Status {
        Success = 0,
        DeviceNotFound = -1,
        DeviceNotAvailable = -2,
        CompilerNotAvailable = -3,
        MemObjectAllocationFailure = -4,
        OutOfResources = -5,
        OutOfHostMemory = -6,
        ProfilingInfoNotAvailable = -7,
        MemCopyOverlap = -8,
        ImageFormatMismatch = -9,
        ImageFormatNotSupported = -10,
        BuildProgramFailure = -11,
        MapFailure = -12,
        MisalignedSubBufferOffset = -13,
        ExecStatusErrorForEventsInWaitList = -14,
        InvalidValue = -30,
        InvalidDeviceType = -31,
        InvalidPlatform = -32,
        InvalidDevice = -33,
        InvalidContext = -34,
        InvalidQueueProperties = -35,
        InvalidCommandQueue = -36,
        InvalidHostPtr = -37,
        InvalidMemObject = -38,
        InvalidImageFormatDescriptor = -39,
        InvalidImageSize = -40,
        InvalidSampler = -41,
        InvalidBinary = -42,
        InvalidBuildOptions = -43,
        InvalidProgram = -44,
        InvalidProgramExecutable = -45,
        InvalidKernelName = -46,
        InvalidKernelDefinition = -47,
        InvalidKernel = -48,
        InvalidArgIndex = -49,
        InvalidArgValue = -50,
        InvalidArgSize = -51,
        InvalidKernelArgs = -52,
        InvalidWorkDimension = -53,
        InvalidWorkGroupSize = -54,
        InvalidWorkItemSize = -55,
        InvalidGlobalOffset = -56,
        InvalidEventWaitList = -57,
        InvalidEvent = -58,
        InvalidOperation = -59,
        InvalidGlObject = -60,
        InvalidBufferSize = -61,
        InvalidGlobalWorkSize = -63,
        InvalidProperty = -64,
        InvalidImageDescriptor = -65,
        InvalidGlSharegroupReferenceKhr = -1000,
    }
}

cl_enum! {
    /// cl_platform_info
    pub enum PlatformInfo {
        Profile = 0x0900,
        Version = 0x0901,
        Name = 0x0902,
        Vendor = 0x0903,
        Extensions = 0x0904,
    }
}

cl_enum! {
    /// cl_device_info
    pub enum DeviceInfo {
        Type = 0x1000,
        VendorId = 0x1001,
        MaxComputeUnits = 0x1002,
        MaxWorkItemDimensions = 0x1003,
        MaxWorkGroupSize = 0x1004,
        MaxWorkItemSizes = 0x1005,
        PreferredVectorWidthChar = 0x1006,
        PreferredVectorWidthShort = 0x1007,
        PreferredVectorWidthInt = 0x1008,
        PreferredVectorWidthLong = 0x1009,
        PreferredVectorWidthFloat = 0x100A,
        PreferredVectorWidthDouble = 0x100B,
        AddressBits = 0x100D,
        MaxMemAllocSize = 0x1010,
        Image2dMaxWidth = 0x1011,
        Image2dMaxHeight = 0x1012,
        ImageSupport = 0x1016,
        MemBaseAddrAlign = 0x1019,
        SingleFpConfig = 0x101B,
        GlobalMemSize = 0x101F,
        LocalMemSize = 0x1023,
        ProfilingTimerResolution = 0x1025,
        EndianLittle = 0x1026,
        Available = 0x1027,
        CompilerAvailable = 0x1028,
        ExecutionCapabilities = 0x1029,
        QueueProperties = 0x102A,
        Name = 0x102B,
        Vendor = 0x102C,
        DriverVersion = 0x102D,
        Profile = 0x102E,
        Version = 0x102F,
        Extensions = 0x1030,
        Platform = 0x1031,
        DoubleFpConfig = 0x1032,
        HalfFpConfig = 0x1033,
        PreferredVectorWidthHalf = 0x1034,
        NativeVectorWidthChar = 0x1036,
        NativeVectorWidthShort = 0x1037,
        NativeVectorWidthInt = 0x1038,
        NativeVectorWidthLong = 0x1039,
        NativeVectorWidthFloat = 0x103A,
        NativeVectorWidthDouble = 0x103B,
        NativeVectorWidthHalf = 0x103C,
        OpenclCVersion = 0x103D,
        ReferenceCount = 0x1047,
    }
}

cl_enum! {
    /// cl_context_info
    pub enum ContextInfo {
        ReferenceCount = 0x1080,
        Devices = 0x1081,
        Properties = 0x1082,
        NumDevices = 0x1083,
    }
}

cl_enum! {
    /// cl_command_queue_info
    pub enum CommandQueueInfo {
        Context = 0x1090,
        Device = 0x1091,
        ReferenceCount = 0x1092,
        Properties = 0x1093,
    }
}

cl_enum! {
    /// cl_mem_object_type
    pub enum MemObjectType {
        Buffer = 0x10F0,
        Image2d = 0x10F1,
    }
}

cl_enum! {
    /// cl_mem_info
    pub enum MemInfo {
        Type = 0x1100,
        Flags = 0x1101,
        Size = 0x1102,
        MapCount = 0x1104,
        ReferenceCount = 0x1105,
        Context = 0x1106,
        AssociatedMemobject = 0x1107,
        Offset = 0x1108,
    }
}

cl_enum! {
    /// cl_image_info
    pub enum ImageInfo {
        Format = 0x1110,
        ElementSize = 0x1111,
        RowPitch = 0x1112,
        Width = 0x1114,
        Height = 0x1115,
    }
}

cl_enum! {
    /// cl_channel_order
    pub enum ImageChannelOrder {
        R = 0x10B0,
        A = 0x10B1,
        Rg = 0x10B2,
        Ra = 0x10B3,
        Rgb = 0x10B4,
        Rgba = 0x10B5,
        Bgra = 0x10B6,
        Argb = 0x10B7,
        Intensity = 0x10B8,
        Luminance = 0x10B9,
    }
}

cl_enum! {
    /// cl_channel_type
    pub enum ImageChannelDataType {
        SnormInt8 = 0x10D0,
        SnormInt16 = 0x10D1,
        UnormInt8 = 0x10D2,
        UnormInt16 = 0x10D3,
        UnormShort565 = 0x10D4,
        UnormShort555 = 0x10D5,
        SignedInt8 = 0x10D7,
        SignedInt16 = 0x10D8,
        SignedInt32 = 0x10D9,
        UnsignedInt8 = 0x10DA,
        UnsignedInt16 = 0x10DB,
        UnsignedInt32 = 0x10DC,
        HalfFloat = 0x10DD,
        Float = 0x10DE,
    }
}

cl_enum! {
    /// cl_addressing_mode
    pub enum AddressingMode {
        None = 0x1130,
        ClampToEdge = 0x1131,
        Clamp = 0x1132,
        Repeat = 0x1133,
        MirroredRepeat = 0x1134,
    }
}

cl_enum! {
    /// cl_filter_mode
    pub enum FilterMode {
        Nearest = 0x1140,
        Linear = 0x1141,
    }
}

cl_enum! {
    /// cl_sampler_info
    pub enum SamplerInfo {
        ReferenceCount = 0x1150,
        Context = 0x1151,
        NormalizedCoords = 0x1152,
        AddressingMode = 0x1153,
        FilterMode = 0x1154,
    }
}

cl_enum! {
    /// cl_program_info
    pub enum ProgramInfo {
        ReferenceCount = 0x1160,
        Context = 0x1161,
        NumDevices = 0x1162,
        Devices = 0x1163,
        Source = 0x1164,
        NumKernels = 0x1167,
        KernelNames = 0x1168,
    }
}

cl_enum! {
    /// cl_program_build_info
    pub enum ProgramBuildInfo {
        BuildStatus = 0x1181,
        BuildOptions = 0x1182,
        BuildLog = 0x1183,
    }
}

cl_enum! {
    /// cl_build_status
    pub enum ProgramBuildStatus {
        Success = 0,
        None = -1,
        Error = -2,
        InProgress = -3,
    }
}

cl_enum! {
    /// cl_kernel_info
    pub enum KernelInfo {
        FunctionName = 0x1190,
        NumArgs = 0x1191,
        ReferenceCount = 0x1192,
        Context = 0x1193,
        Program = 0x1194,
    }
}

cl_enum! {
    /// cl_kernel_arg_info
    pub enum KernelArgInfo {
        AddressQualifier = 0x1196,
        AccessQualifier = 0x1197,
        TypeName = 0x1198,
        Name = 0x119A,
    }
}

cl_enum! {
    /// cl_kernel_arg_address_qualifier
    pub enum KernelArgAddressQualifier {
        Global = 0x119B,
        Local = 0x119C,
        Constant = 0x119D,
        Private = 0x119E,
    }
}

cl_enum! {
    /// cl_kernel_arg_access_qualifier
    pub enum KernelArgAccessQualifier {
        ReadOnly = 0x11A0,
        WriteOnly = 0x11A1,
        ReadWrite = 0x11A2,
        None = 0x11A3,
    }
}

cl_enum! {
    /// cl_kernel_work_group_info
    pub enum KernelWorkGroupInfo {
        WorkGroupSize = 0x11B0,
        CompileWorkGroupSize = 0x11B1,
        LocalMemSize = 0x11B2,
        PreferredWorkGroupSizeMultiple = 0x11B3,
        PrivateMemSize = 0x11B4,
    }
}

cl_enum! {
    /// cl_event_info
    pub enum EventInfo {
        CommandType = 0x11D1,
        ReferenceCount = 0x11D2,
        CommandExecutionStatus = 0x11D3,
        Context = 0x11D4,
    }
}

cl_enum! {
    /// cl_command_type
    pub enum CommandType {
        NdrangeKernel = 0x11F0,
        Task = 0x11F1,
        ReadBuffer = 0x11F3,
        WriteBuffer = 0x11F4,
        CopyBuffer = 0x11F5,
        ReadImage = 0x11F6,
        WriteImage = 0x11F7,
        MapBuffer = 0x11FB,
        UnmapMemObject = 0x11FD,
        Marker = 0x11FE,
        AcquireGlObjects = 0x11FF,
        ReleaseGlObjects = 0x1200,
        ReadBufferRect = 0x1201,
        WriteBufferRect = 0x1202,
        User = 0x1204,
        FillBuffer = 0x1207,
    }
}

cl_enum! {
    /// Command execution status. Errors are reported through
    /// `EventStatus::Error` instead of negative values.
    pub enum CommandExecutionStatus {
        Complete = 0x0,
        Running = 0x1,
        Submitted = 0x2,
        Queued = 0x3,
    }
}

cl_enum! {
    /// cl_profiling_info
    pub enum ProfilingInfo {
        Queued = 0x1280,
        Submit = 0x1281,
        Start = 0x1282,
        End = 0x1283,
    }
}
