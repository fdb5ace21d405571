//! A command queue.

use std::ops::Deref;
use log::info;
use crate::core::{self, CommandQueue as CommandQueueCore, CommandQueueInfo,
    CommandQueueInfoResult, CommandQueueProperties};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{wait_list, Context, Device, Event, EventList};

/// A command queue which manages all actions taken on kernels, buffers, and
/// images.
///
/// Commands run in submission order unless the queue was created with
/// `CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE`, in which case
/// only event dependencies order them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Queue {
    obj_core: CommandQueueCore,
}

impl Queue {
    /// Returns a new Queue on the device specified by `device`.
    pub fn new(context: &Context, device: Device, properties: Option<CommandQueueProperties>)
            -> OclResult<Queue> {
        let obj_core = core::create_command_queue(context.as_core(), device.as_core(),
            properties)?;
        info!("Queue created on '{}' with {:?}.", device.as_core().name(),
            obj_core.properties());
        Ok(Queue { obj_core })
    }

    /// Issues all previously queued commands to the device.
    pub fn flush(&self) -> OclResult<()> {
        core::flush(&self.obj_core).map_err(OclError::from)
    }

    /// Blocks until all commands in this queue have completed before returning.
    pub fn finish(&self) -> OclResult<()> {
        core::finish(&self.obj_core).map_err(OclError::from)
    }

    /// Enqueues a marker command which completes once every event in
    /// `ewait` and every previously enqueued command has completed.
    pub fn enqueue_marker<Ewl>(&self, ewait: Option<Ewl>) -> OclResult<Event>
            where Ewl: Into<EventList> {
        let ewait = ewait.map(Into::into);
        let wait_events = wait_list(ewait.as_ref());
        core::enqueue_marker(&self.obj_core, wait_events.as_deref())
            .map(Event::from)
            .map_err(OclError::from)
    }

    /// Returns a reference to the core handle, usable by functions in the
    /// `core` module.
    #[inline]
    pub fn as_core(&self) -> &CommandQueueCore {
        &self.obj_core
    }

    /// Returns a copy of the Context associated with this queue.
    pub fn context(&self) -> Context {
        Context::from(self.obj_core.context().clone())
    }

    /// Returns the device associated with this queue.
    pub fn device(&self) -> Device {
        Device::from(self.obj_core.device().clone())
    }

    /// Returns the properties this queue was created with.
    pub fn properties(&self) -> CommandQueueProperties {
        self.obj_core.properties()
    }

    /// Returns info about this queue.
    pub fn info(&self, info_kind: CommandQueueInfo) -> OclResult<CommandQueueInfoResult> {
        core::get_command_queue_info(&self.obj_core, info_kind).map_err(OclError::from)
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("Context", &self.info(CommandQueueInfo::Context))
            .field("Device", &self.info(CommandQueueInfo::Device))
            .field("ReferenceCount", &self.info(CommandQueueInfo::ReferenceCount))
            .field("Properties", &self.info(CommandQueueInfo::Properties))
            .finish()
    }
}

impl From<CommandQueueCore> for Queue {
    fn from(obj_core: CommandQueueCore) -> Queue {
        Queue { obj_core }
    }
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl AsRef<Queue> for Queue {
    fn as_ref(&self) -> &Queue {
        self
    }
}

impl AsRef<CommandQueueCore> for Queue {
    fn as_ref(&self) -> &CommandQueueCore {
        &self.obj_core
    }
}

impl Deref for Queue {
    type Target = CommandQueueCore;

    fn deref(&self) -> &CommandQueueCore {
        &self.obj_core
    }
}
