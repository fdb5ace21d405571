//! Abstract data type wrappers.
//!
//! ### Reference
//!
//! The following abstract data types are exposed by the runtime:
//!
//! * PlatformId: The ID for a platform.
//! * DeviceId: The ID for a device.
//! * Context: A context.
//! * CommandQueue: A command queue.
//! * Mem: A memory object (buffer, sub-buffer, or image).
//! * Program: A program.
//! * Kernel: A kernel.
//! * Event: An event.
//! * Sampler: A sampler.
//!
//! Each is a reference counted handle. Cloning a handle retains the
//! underlying object and dropping it releases it; the object is destroyed
//! when the last handle goes away. Handles compare equal when they refer to
//! the same object.
//!
//! Objects keep alive only what they need to function: a command queue
//! retains its context and device, a kernel its program, and so on. Events
//! do not retain the queue they were enqueued on.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{api_err, Result};
use crate::runtime::context::ContextObj;
use crate::runtime::event::EventObj;
use crate::runtime::image::{SamplerDesc, SamplerObj};
use crate::runtime::kernel::KernelObj;
use crate::runtime::memory::MemObj;
use crate::runtime::platform::{DeviceObj, PlatformObj};
use crate::runtime::program::ProgramObj;
use crate::runtime::queue::QueueObj;
use crate::types::structs::KernelSignature;
use crate::{CommandQueueProperties, CommandType, ContextProperties, EventStatus, MemFlags, Status};

/// Implements reference counting, identity, and debug output for a handle.
macro_rules! impl_handle {
    ($name:ident, $label:expr) => {
        impl $name {
            /// Returns the number of handles referring to this object.
            pub fn ref_count(&self) -> u32 {
                Arc::strong_count(&self.0) as u32
            }

            /// Returns the process-unique id of this object.
            pub fn id(&self) -> u64 {
                self.0.id
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &$name) -> bool {
                Arc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (Arc::as_ptr(&self.0) as *const u8 as usize).hash(state)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({})", $label, self.0.id)
            }
        }
    };
}

//=============================================================================
//=================================== TYPES ===================================
//=============================================================================

/// A platform identifier.
#[derive(Clone)]
pub struct PlatformId(pub(crate) Arc<PlatformObj>);

impl_handle!(PlatformId, "PlatformId");

impl PlatformId {
    /// Returns the devices attached to this platform.
    pub fn devices(&self) -> &[DeviceId] {
        &self.0.devices
    }
}

/// A device identifier.
#[derive(Clone)]
pub struct DeviceId(pub(crate) Arc<DeviceObj>);

impl_handle!(DeviceId, "DeviceId");

impl DeviceId {
    /// Returns the platform this device belongs to.
    pub fn platform(&self) -> Result<PlatformId> {
        self.0.platform.upgrade().map(PlatformId).ok_or_else(|| {
            api_err(Status::InvalidPlatform, "DeviceId::platform",
                "the platform of this device has been released")
        })
    }

    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.0.config.name
    }
}

/// A context.
#[derive(Clone)]
pub struct Context(pub(crate) Arc<ContextObj>);

impl_handle!(Context, "Context");

impl Context {
    /// Returns the devices associated with this context.
    pub fn devices(&self) -> &[DeviceId] {
        &self.0.devices
    }

    /// Returns the platform associated with this context.
    pub fn platform(&self) -> &PlatformId {
        &self.0.platform
    }

    /// Returns the properties this context was created with.
    pub fn properties(&self) -> &ContextProperties {
        &self.0.properties
    }
}

/// A command queue.
#[derive(Clone)]
pub struct CommandQueue(pub(crate) Arc<QueueObj>);

impl_handle!(CommandQueue, "CommandQueue");

impl CommandQueue {
    pub fn context(&self) -> &Context {
        &self.0.context
    }

    pub fn device(&self) -> &DeviceId {
        &self.0.device
    }

    pub fn properties(&self) -> CommandQueueProperties {
        self.0.properties
    }
}

impl AsRef<CommandQueue> for CommandQueue {
    fn as_ref(&self) -> &CommandQueue {
        self
    }
}

/// A memory object: a buffer, sub-buffer, or image.
#[derive(Clone)]
pub struct Mem(pub(crate) Arc<MemObj>);

impl_handle!(Mem, "Mem");

impl Mem {
    pub fn context(&self) -> &Context {
        &self.0.context
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// Offset in bytes within the parent buffer (zero unless this is a
    /// sub-buffer).
    pub fn offset(&self) -> usize {
        self.0.offset
    }

    pub fn flags(&self) -> MemFlags {
        self.0.flags
    }

    pub fn is_image(&self) -> bool {
        self.0.image_layout().is_some()
    }

    /// Returns the buffer this sub-buffer was created from.
    pub fn parent(&self) -> Option<&Mem> {
        self.0.parent.as_ref()
    }
}

/// A program.
#[derive(Clone)]
pub struct Program(pub(crate) Arc<ProgramObj>);

impl_handle!(Program, "Program");

impl Program {
    pub fn context(&self) -> &Context {
        &self.0.context
    }
}

/// A kernel.
#[derive(Clone)]
pub struct Kernel(pub(crate) Arc<KernelObj>);

impl_handle!(Kernel, "Kernel");

impl Kernel {
    pub fn program(&self) -> &Program {
        &self.0.program
    }

    /// The kernel function name.
    pub fn name(&self) -> &str {
        &self.0.sig.name
    }

    /// The declared signature.
    pub fn signature(&self) -> &KernelSignature {
        &self.0.sig
    }
}

/// An event representing a command or a user event.
#[derive(Clone)]
pub struct Event(pub(crate) Arc<EventObj>);

impl_handle!(Event, "Event");

impl Event {
    pub fn context(&self) -> &Context {
        &self.0.context
    }

    pub fn command_type(&self) -> CommandType {
        self.0.command_type
    }

    /// Returns the current execution status.
    pub fn status(&self) -> EventStatus {
        self.0.status()
    }

    /// Returns true if the command has completed successfully.
    pub fn is_complete(&self) -> bool {
        self.status() == EventStatus::Complete
    }

    /// Blocks until the command finishes, returning an error if it failed.
    pub fn wait(&self) -> Result<()> {
        self.0.wait()
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

/// A sampler.
#[derive(Clone)]
pub struct Sampler(pub(crate) Arc<SamplerObj>);

impl_handle!(Sampler, "Sampler");

impl Sampler {
    pub fn context(&self) -> &Context {
        &self.0.context
    }

    pub fn desc(&self) -> SamplerDesc {
        self.0.desc
    }
}
