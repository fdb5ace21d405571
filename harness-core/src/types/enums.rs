//! Kernel argument values, event status, and the result types of every
//! `get_*_info` query.

use std::fmt;
use std::mem;

use crate::{
    AddressingMode, CommandExecutionStatus, CommandQueueProperties, CommandType, Context,
    ContextProperties, DeviceExecCapabilities, DeviceFpConfig, DeviceId, DeviceType, FilterMode,
    ImageFormat, KernelArgAccessQualifier, KernelArgAddressQualifier, Mem, MemFlags,
    MemObjectType, OclPrm, PlatformId, Program, ProgramBuildStatus, Sampler, Status,
};

/// Forwards `Debug` to `Display`.
macro_rules! debug_as_display {
    ($($name:ident),+) => {
        $(impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        })+
    };
}

//=============================================================================
//============================== KERNEL ARGUMENTS =============================
//=============================================================================

/// A kernel argument value.
///
/// Memory objects and samplers are retained by the kernel while set.
/// Scalars and vectors are copied.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgVal {
    Mem(Mem),
    Sampler(Sampler),
    Scalar(Vec<u8>),
    /// A local memory reservation in bytes.
    Local(usize),
    /// A null buffer pointer.
    Null,
}

impl ArgVal {
    /// Returns an `ArgVal` referring to a memory object (buffer or image).
    pub fn mem(mem: &Mem) -> ArgVal {
        ArgVal::Mem(mem.clone())
    }

    /// Returns an `ArgVal` corresponding to a null buffer pointer.
    pub fn mem_null() -> ArgVal {
        ArgVal::Null
    }

    /// Returns an `ArgVal` referring to a sampler.
    pub fn sampler(sampler: &Sampler) -> ArgVal {
        ArgVal::Sampler(sampler.clone())
    }

    /// Returns an `ArgVal` holding a copy of a scalar or vector value.
    pub fn scalar<T: OclPrm>(val: &T) -> ArgVal {
        ArgVal::Scalar(bytemuck::bytes_of(val).to_vec())
    }

    /// Returns an `ArgVal` reserving local memory for `len` elements of
    /// type `T`.
    pub fn local<T: OclPrm>(len: usize) -> ArgVal {
        ArgVal::Local(len * mem::size_of::<T>())
    }

    /// Returns true if this is a null buffer pointer.
    pub fn is_null(&self) -> bool {
        *self == ArgVal::Null
    }
}

//=============================================================================
//=============================== EVENT STATUS ================================
//=============================================================================

/// The execution status of an event.
///
/// Status only ever moves forward: `Queued`, `Submitted`, `Running`, then
/// exactly one of `Complete` or `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Queued,
    Submitted,
    Running,
    Complete,
    /// The command failed (or a prerequisite failed) with this status.
    Error(Status),
}

impl EventStatus {
    fn rank(&self) -> u8 {
        match *self {
            EventStatus::Queued => 0,
            EventStatus::Submitted => 1,
            EventStatus::Running => 2,
            EventStatus::Complete | EventStatus::Error(_) => 3,
        }
    }

    /// Returns true once the command has completed or failed.
    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }

    /// Returns true if this status is at or beyond `status`. A failed
    /// command has reached every status.
    pub fn has_reached(&self, status: CommandExecutionStatus) -> bool {
        self.rank() >= EventStatus::from(status).rank()
    }

    /// Returns the error status, if the command failed.
    pub fn error(&self) -> Option<Status> {
        match *self {
            EventStatus::Error(status) => Some(status),
            _ => None,
        }
    }

    /// Returns the equivalent execution status, or `None` for an error.
    pub fn as_execution_status(&self) -> Option<CommandExecutionStatus> {
        match *self {
            EventStatus::Queued => Some(CommandExecutionStatus::Queued),
            EventStatus::Submitted => Some(CommandExecutionStatus::Submitted),
            EventStatus::Running => Some(CommandExecutionStatus::Running),
            EventStatus::Complete => Some(CommandExecutionStatus::Complete),
            EventStatus::Error(_) => None,
        }
    }
}

impl From<CommandExecutionStatus> for EventStatus {
    fn from(status: CommandExecutionStatus) -> EventStatus {
        match status {
            CommandExecutionStatus::Queued => EventStatus::Queued,
            CommandExecutionStatus::Submitted => EventStatus::Submitted,
            CommandExecutionStatus::Running => EventStatus::Running,
            CommandExecutionStatus::Complete => EventStatus::Complete,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EventStatus::Error(status) => write!(f, "Error({:?})", status),
            ref other => write!(f, "{:?}", other),
        }
    }
}

//=============================================================================
//=============================== INFO RESULTS ================================
//=============================================================================

/// Platform info result.
#[derive(Clone, PartialEq)]
pub enum PlatformInfoResult {
    Profile(String),
    Version(String),
    Name(String),
    Vendor(String),
    Extensions(String),
}

impl fmt::Display for PlatformInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PlatformInfoResult::Profile(ref s) => write!(f, "{}", s),
            PlatformInfoResult::Version(ref s) => write!(f, "{}", s),
            PlatformInfoResult::Name(ref s) => write!(f, "{}", s),
            PlatformInfoResult::Vendor(ref s) => write!(f, "{}", s),
            PlatformInfoResult::Extensions(ref s) => write!(f, "{}", s),
        }
    }
}

impl From<PlatformInfoResult> for String {
    fn from(result: PlatformInfoResult) -> String {
        match result {
            PlatformInfoResult::Profile(s) | PlatformInfoResult::Version(s)
                | PlatformInfoResult::Name(s) | PlatformInfoResult::Vendor(s)
                | PlatformInfoResult::Extensions(s) => s,
        }
    }
}

/// A device info result.
#[derive(Clone, PartialEq)]
pub enum DeviceInfoResult {
    Type(DeviceType),
    VendorId(u32),
    MaxComputeUnits(u32),
    MaxWorkItemDimensions(u32),
    MaxWorkGroupSize(usize),
    MaxWorkItemSizes(Vec<usize>),
    PreferredVectorWidthChar(u32),
    PreferredVectorWidthShort(u32),
    PreferredVectorWidthInt(u32),
    PreferredVectorWidthLong(u32),
    PreferredVectorWidthFloat(u32),
    PreferredVectorWidthDouble(u32),
    AddressBits(u32),
    MaxMemAllocSize(u64),
    Image2dMaxWidth(usize),
    Image2dMaxHeight(usize),
    ImageSupport(bool),
    MemBaseAddrAlign(u32),
    SingleFpConfig(DeviceFpConfig),
    GlobalMemSize(u64),
    LocalMemSize(u64),
    ProfilingTimerResolution(usize),
    EndianLittle(bool),
    Available(bool),
    CompilerAvailable(bool),
    ExecutionCapabilities(DeviceExecCapabilities),
    QueueProperties(CommandQueueProperties),
    Name(String),
    Vendor(String),
    DriverVersion(String),
    Profile(String),
    Version(String),
    Extensions(String),
    Platform(PlatformId),
    DoubleFpConfig(DeviceFpConfig),
    HalfFpConfig(DeviceFpConfig),
    PreferredVectorWidthHalf(u32),
    NativeVectorWidthChar(u32),
    NativeVectorWidthShort(u32),
    NativeVectorWidthInt(u32),
    NativeVectorWidthLong(u32),
    NativeVectorWidthFloat(u32),
    NativeVectorWidthDouble(u32),
    NativeVectorWidthHalf(u32),
    OpenclCVersion(String),
    ReferenceCount(u32),
}

impl fmt::Display for DeviceInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeviceInfoResult::Type(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::VendorId(ref s) => write!(f, "{:#x}", s),
            DeviceInfoResult::MaxComputeUnits(ref s) => write!(f, "{}", s),
            DeviceInfoResult::MaxWorkItemDimensions(ref s) => write!(f, "{}", s),
            DeviceInfoResult::MaxWorkGroupSize(ref s) => write!(f, "{}", s),
            DeviceInfoResult::MaxWorkItemSizes(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::PreferredVectorWidthChar(ref s) => write!(f, "{}", s),
            DeviceInfoResult::PreferredVectorWidthShort(ref s) => write!(f, "{}", s),
            DeviceInfoResult::PreferredVectorWidthInt(ref s) => write!(f, "{}", s),
            DeviceInfoResult::PreferredVectorWidthLong(ref s) => write!(f, "{}", s),
            DeviceInfoResult::PreferredVectorWidthFloat(ref s) => write!(f, "{}", s),
            DeviceInfoResult::PreferredVectorWidthDouble(ref s) => write!(f, "{}", s),
            DeviceInfoResult::AddressBits(ref s) => write!(f, "{}", s),
            DeviceInfoResult::MaxMemAllocSize(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Image2dMaxWidth(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Image2dMaxHeight(ref s) => write!(f, "{}", s),
            DeviceInfoResult::ImageSupport(ref s) => write!(f, "{}", s),
            DeviceInfoResult::MemBaseAddrAlign(ref s) => write!(f, "{}", s),
            DeviceInfoResult::SingleFpConfig(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::GlobalMemSize(ref s) => write!(f, "{}", s),
            DeviceInfoResult::LocalMemSize(ref s) => write!(f, "{}", s),
            DeviceInfoResult::ProfilingTimerResolution(ref s) => write!(f, "{}", s),
            DeviceInfoResult::EndianLittle(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Available(ref s) => write!(f, "{}", s),
            DeviceInfoResult::CompilerAvailable(ref s) => write!(f, "{}", s),
            DeviceInfoResult::ExecutionCapabilities(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::QueueProperties(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::Name(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Vendor(ref s) => write!(f, "{}", s),
            DeviceInfoResult::DriverVersion(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Profile(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Version(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Extensions(ref s) => write!(f, "{}", s),
            DeviceInfoResult::Platform(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::DoubleFpConfig(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::HalfFpConfig(ref s) => write!(f, "{:?}", s),
            DeviceInfoResult::PreferredVectorWidthHalf(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthChar(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthShort(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthInt(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthLong(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthFloat(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthDouble(ref s) => write!(f, "{}", s),
            DeviceInfoResult::NativeVectorWidthHalf(ref s) => write!(f, "{}", s),
            DeviceInfoResult::OpenclCVersion(ref s) => write!(f, "{}", s),
            DeviceInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
        }
    }
}

/// A context info result.
#[derive(Clone, PartialEq)]
pub enum ContextInfoResult {
    ReferenceCount(u32),
    Devices(Vec<DeviceId>),
    Properties(ContextProperties),
    NumDevices(u32),
}

impl fmt::Display for ContextInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ContextInfoResult::ReferenceCount(ref count) => write!(f, "{}", count),
            ContextInfoResult::Devices(ref vec) => write!(f, "{:?}", vec),
            ContextInfoResult::Properties(ref props) => write!(f, "{:?}", props),
            ContextInfoResult::NumDevices(ref num) => write!(f, "{}", num),
        }
    }
}

/// A command queue info result.
#[derive(Clone, PartialEq)]
pub enum CommandQueueInfoResult {
    Context(Context),
    Device(DeviceId),
    ReferenceCount(u32),
    Properties(CommandQueueProperties),
}

impl fmt::Display for CommandQueueInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CommandQueueInfoResult::Context(ref s) => write!(f, "{:?}", s),
            CommandQueueInfoResult::Device(ref s) => write!(f, "{:?}", s),
            CommandQueueInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
            CommandQueueInfoResult::Properties(ref s) => write!(f, "{:?}", s),
        }
    }
}

/// A mem info result.
#[derive(Clone, PartialEq)]
pub enum MemInfoResult {
    Type(MemObjectType),
    Flags(MemFlags),
    Size(usize),
    MapCount(u32),
    ReferenceCount(u32),
    Context(Context),
    AssociatedMemobject(Option<Mem>),
    Offset(usize),
}

impl fmt::Display for MemInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MemInfoResult::Type(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Flags(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Size(ref s) => write!(f, "{}", s),
            MemInfoResult::MapCount(ref s) => write!(f, "{}", s),
            MemInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
            MemInfoResult::Context(ref s) => write!(f, "{:?}", s),
            MemInfoResult::AssociatedMemobject(ref s) => write!(f, "{:?}", s),
            MemInfoResult::Offset(ref s) => write!(f, "{}", s),
        }
    }
}

/// An image info result.
#[derive(Clone, PartialEq)]
pub enum ImageInfoResult {
    Format(ImageFormat),
    ElementSize(usize),
    RowPitch(usize),
    Width(usize),
    Height(usize),
}

impl fmt::Display for ImageInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageInfoResult::Format(ref s) => write!(f, "{:?}", s),
            ImageInfoResult::ElementSize(ref s) => write!(f, "{}", s),
            ImageInfoResult::RowPitch(ref s) => write!(f, "{}", s),
            ImageInfoResult::Width(ref s) => write!(f, "{}", s),
            ImageInfoResult::Height(ref s) => write!(f, "{}", s),
        }
    }
}

/// A sampler info result.
#[derive(Clone, PartialEq)]
pub enum SamplerInfoResult {
    ReferenceCount(u32),
    Context(Context),
    NormalizedCoords(bool),
    AddressingMode(AddressingMode),
    FilterMode(FilterMode),
}

impl fmt::Display for SamplerInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SamplerInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
            SamplerInfoResult::Context(ref s) => write!(f, "{:?}", s),
            SamplerInfoResult::NormalizedCoords(ref s) => write!(f, "{}", s),
            SamplerInfoResult::AddressingMode(ref s) => write!(f, "{:?}", s),
            SamplerInfoResult::FilterMode(ref s) => write!(f, "{:?}", s),
        }
    }
}

/// A program info result.
#[derive(Clone, PartialEq)]
pub enum ProgramInfoResult {
    ReferenceCount(u32),
    Context(Context),
    NumDevices(u32),
    Devices(Vec<DeviceId>),
    Source(String),
    NumKernels(usize),
    /// Kernel names separated by semicolons.
    KernelNames(String),
}

impl fmt::Display for ProgramInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ProgramInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
            ProgramInfoResult::Context(ref s) => write!(f, "{:?}", s),
            ProgramInfoResult::NumDevices(ref s) => write!(f, "{}", s),
            ProgramInfoResult::Devices(ref s) => write!(f, "{:?}", s),
            ProgramInfoResult::Source(ref s) => write!(f, "{}", s),
            ProgramInfoResult::NumKernels(ref s) => write!(f, "{}", s),
            ProgramInfoResult::KernelNames(ref s) => write!(f, "{}", s),
        }
    }
}

/// A program build info result.
#[derive(Clone, PartialEq)]
pub enum ProgramBuildInfoResult {
    BuildStatus(ProgramBuildStatus),
    BuildOptions(String),
    BuildLog(String),
}

impl fmt::Display for ProgramBuildInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ProgramBuildInfoResult::BuildStatus(ref s) => write!(f, "{:?}", s),
            ProgramBuildInfoResult::BuildOptions(ref s) => write!(f, "{}", s),
            ProgramBuildInfoResult::BuildLog(ref s) => write!(f, "{}", s),
        }
    }
}

/// A kernel info result.
#[derive(Clone, PartialEq)]
pub enum KernelInfoResult {
    FunctionName(String),
    NumArgs(u32),
    ReferenceCount(u32),
    Context(Context),
    Program(Program),
}

impl fmt::Display for KernelInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KernelInfoResult::FunctionName(ref s) => write!(f, "{}", s),
            KernelInfoResult::NumArgs(s) => write!(f, "{}", s),
            KernelInfoResult::ReferenceCount(s) => write!(f, "{}", s),
            KernelInfoResult::Context(ref s) => write!(f, "{:?}", s),
            KernelInfoResult::Program(ref s) => write!(f, "{:?}", s),
        }
    }
}

/// A kernel arg info result.
#[derive(Clone, PartialEq)]
pub enum KernelArgInfoResult {
    AddressQualifier(KernelArgAddressQualifier),
    AccessQualifier(KernelArgAccessQualifier),
    TypeName(String),
    Name(String),
}

impl fmt::Display for KernelArgInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KernelArgInfoResult::AddressQualifier(s) => write!(f, "{:?}", s),
            KernelArgInfoResult::AccessQualifier(s) => write!(f, "{:?}", s),
            KernelArgInfoResult::TypeName(ref s) => write!(f, "{}", s),
            KernelArgInfoResult::Name(ref s) => write!(f, "{}", s),
        }
    }
}

/// A kernel work group info result.
#[derive(Clone, PartialEq)]
pub enum KernelWorkGroupInfoResult {
    WorkGroupSize(usize),
    CompileWorkGroupSize([usize; 3]),
    LocalMemSize(u64),
    PreferredWorkGroupSizeMultiple(usize),
    PrivateMemSize(u64),
}

impl fmt::Display for KernelWorkGroupInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            KernelWorkGroupInfoResult::WorkGroupSize(s) => write!(f, "{}", s),
            KernelWorkGroupInfoResult::CompileWorkGroupSize(s) => write!(f, "{:?}", s),
            KernelWorkGroupInfoResult::LocalMemSize(s) => write!(f, "{}", s),
            KernelWorkGroupInfoResult::PreferredWorkGroupSizeMultiple(s) => write!(f, "{}", s),
            KernelWorkGroupInfoResult::PrivateMemSize(s) => write!(f, "{}", s),
        }
    }
}

/// An event info result.
#[derive(Clone, PartialEq)]
pub enum EventInfoResult {
    CommandType(CommandType),
    ReferenceCount(u32),
    CommandExecutionStatus(EventStatus),
    Context(Context),
}

impl fmt::Display for EventInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EventInfoResult::CommandType(ref s) => write!(f, "{:?}", s),
            EventInfoResult::ReferenceCount(ref s) => write!(f, "{}", s),
            EventInfoResult::CommandExecutionStatus(ref s) => write!(f, "{}", s),
            EventInfoResult::Context(ref s) => write!(f, "{:?}", s),
        }
    }
}

/// A profiling info result. Times are in nanoseconds on the runtime's
/// monotonic clock.
#[derive(Clone, Copy, PartialEq)]
pub enum ProfilingInfoResult {
    Queued(u64),
    Submit(u64),
    Start(u64),
    End(u64),
}

impl ProfilingInfoResult {
    /// Returns the timestamp regardless of which point it marks.
    pub fn time(self) -> u64 {
        match self {
            ProfilingInfoResult::Queued(t) | ProfilingInfoResult::Submit(t)
                | ProfilingInfoResult::Start(t) | ProfilingInfoResult::End(t) => t,
        }
    }
}

impl fmt::Display for ProfilingInfoResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ProfilingInfoResult::Queued(s) => write!(f, "{}", s),
            ProfilingInfoResult::Submit(s) => write!(f, "{}", s),
            ProfilingInfoResult::Start(s) => write!(f, "{}", s),
            ProfilingInfoResult::End(s) => write!(f, "{}", s),
        }
    }
}

debug_as_display!(PlatformInfoResult, DeviceInfoResult, ContextInfoResult,
    CommandQueueInfoResult, MemInfoResult, ImageInfoResult, SamplerInfoResult, ProgramInfoResult,
    ProgramBuildInfoResult, KernelInfoResult, KernelArgInfoResult, KernelWorkGroupInfoResult,
    EventInfoResult, ProfilingInfoResult);
