//! # ocl-harness
//!
//! A heterogeneous compute host harness.
//!
//! The standard types in this crate (`Platform`, `Device`, `Context`,
//! `Program`, `Kernel`, `Queue`, `Buffer`, `Image`, `Sampler`, `Event`) wrap
//! the reference-counted handles of [`harness-core`](core/index.html) and
//! take care of the bookkeeping a host program otherwise repeats: picking a
//! device, building a program and surfacing its log, sizing and typing
//! memory, binding kernel arguments by position or by name, and threading
//! events through commands.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let pro_que = ProQue::builder()
//!     .src(src)
//!     .kernels(library)
//!     .dims(1 << 20)
//!     .build()?;
//!
//! let buffer = pro_que.create_buffer::<f32>()?;
//! let kernel = pro_que.kernel_builder("add")
//!     .arg(&buffer)
//!     .arg(10.0f32)
//!     .build()?;
//!
//! kernel.enq()?;
//! let mut vec = vec![0.0f32; buffer.len()];
//! buffer.read(&mut vec).enq()?;
//! ```
//!
//! Most commands are created with a builder-style `cmd()` method and sent
//! to a queue with `enq()`. Commands which produce an event accept an
//! `enew` destination and commands which wait accept an `ewait` list.

pub use harness_core as core;

mod standard;
pub mod error;
pub mod r#async;
pub mod patterns;
#[cfg(test)]
mod tests;

pub use crate::standard::{
    Buffer, BufferCmdError, Context, Device, DeviceError, Event, EventList, Extensions, Image,
    ImageCmdError, Kernel, KernelError, Platform, PlatformError, ProQue, Program, Queue, Sampler,
    SpatialDims,
};
pub use crate::r#async::{FutureMemMap, MemMap, ReadGuard, RwVec, WriteGuard};
pub use crate::error::{Error, Result};
pub use crate::core::Error as OclCoreError;
#[doc(no_inline)]
pub use crate::core::util;
#[doc(no_inline)]
pub use crate::core::{
    CommandQueueProperties, DeviceType, KernelLibrary, MapFlags, MemFlags, OclPrm, OclScl,
    WorkGroup,
};

pub mod traits {
    //! Commonly used traits.

    pub use crate::core::{NativeKernel, OclPrm, OclScl};
    pub use crate::standard::{MemLen, WorkDims};
}

pub mod builders {
    //! Builders and associated settings-related types.

    pub use crate::core::{ContextProperties, ImageDescriptor, ImageFormat};
    pub use crate::standard::{
        ArgValConverter, BufferBuilder, BufferCmd, BufferCmdDataShape, BufferCmdKind,
        BufferMapCmd, BufferReadCmd, BufferWriteCmd, BuildOpt, ContextBuilder, DeviceSpecifier,
        EventSlot, ImageBuilder, ImageCmd, ImageCmdKind, KernelBuilder, KernelCmd, ProQueBuilder,
        ProgramBuilder, QueCtx, ReadDst, WriteSrc,
    };
    pub use crate::r#async::MemUnmapCmd;
}

pub mod flags {
    //! Bitflags for various parameter types.

    pub use crate::core::{
        CommandQueueProperties, DeviceExecCapabilities, DeviceFpConfig, DeviceType, MapFlags,
        MemFlags,
    };
}

pub mod enums {
    //! Enumerators for settings and information requests.

    pub use crate::core::{
        AddressingMode, ArgVal, CommandExecutionStatus, CommandQueueInfo, CommandQueueInfoResult,
        CommandType, ContextInfo, ContextInfoResult, ContextPropertyValue, DeviceInfo,
        DeviceInfoResult, EventInfo, EventInfoResult, EventStatus, FilterMode,
        ImageChannelDataType, ImageChannelOrder, ImageInfo, ImageInfoResult, KernelArgAccessQualifier,
        KernelArgAddressQualifier, KernelArgInfo, KernelArgInfoResult, KernelInfo,
        KernelInfoResult, KernelWorkGroupInfo, KernelWorkGroupInfoResult, MemInfo, MemInfoResult,
        MemObjectType, PlatformInfo, PlatformInfoResult, ProfilingInfo, ProfilingInfoResult,
        ProgramBuildInfo, ProgramBuildInfoResult, ProgramBuildStatus, ProgramInfo,
        ProgramInfoResult, SamplerInfo, SamplerInfoResult, Status,
    };
}
