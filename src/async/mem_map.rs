use std::mem;
use std::ops::{Deref, DerefMut};
use log::warn;
use crate::core::{self, CommandExecutionStatus, MapFlags, MappedRegion,
    Mem as MemCore, OclPrm};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{wait_list, Event, EventList, EventSlot, Queue};


/// An unmap command builder.
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct MemUnmapCmd<'c, T> where T: 'c + OclPrm {
    queue: Option<&'c Queue>,
    mem_map: &'c mut MemMap<T>,
    ewait: Option<EventList>,
    enew: Option<EventSlot<'c>>,
}

impl<'c, T> MemUnmapCmd<'c, T> where T: OclPrm {
    fn new(mem_map: &'c mut MemMap<T>) -> MemUnmapCmd<'c, T> {
        MemUnmapCmd {
            queue: None,
            mem_map,
            ewait: None,
            enew: None,
        }
    }

    /// Specifies a queue to use for this call only.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> MemUnmapCmd<'c, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.queue = Some(queue.as_ref());
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> MemUnmapCmd<'c, T>
            where Ewl: Into<EventList> {
        self.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new event associated with this
    /// command.
    pub fn enew<En>(mut self, enew: En) -> MemUnmapCmd<'c, T>
            where En: Into<EventSlot<'c>> {
        self.enew = Some(enew.into());
        self
    }

    /// Enqueues this command.
    pub fn enq(self) -> OclResult<()> {
        self.mem_map.enqueue_unmap(self.queue, self.ewait, self.enew)
    }
}


/// A view of a buffer region mapped into host memory.
///
/// Dereferences to a slice. Changes made through a map created with write
/// access are written back to the buffer when it is unmapped, either
/// explicitly with `::unmap` or when dropped.
#[derive(Debug)]
pub struct MemMap<T> where T: OclPrm {
    region: Option<MappedRegion>,
    data: Vec<T>,
    queue: Queue,
    unmap_wait_events: Option<EventList>,
    unmap_event: Option<Event>,
}

impl<T> MemMap<T> where T: OclPrm {
    /// Returns a new `MemMap` over `region`, whose map command must already
    /// have completed.
    pub(crate) fn new(region: MappedRegion, unmap_wait_events: Option<EventList>,
            unmap_event: Option<Event>, queue: Queue) -> MemMap<T> {
        let data = bytemuck::cast_slice::<u8, T>(region.host_mem().read().as_slice()).to_vec();

        MemMap {
            region: Some(region),
            data,
            queue,
            unmap_wait_events,
            unmap_event,
        }
    }

    /// Returns an unmap command builder.
    ///
    /// Call `::enq` on it to enqueue the unmap command.
    pub fn unmap(&mut self) -> MemUnmapCmd<T> {
        MemUnmapCmd::new(self)
    }

    /// Enqueues an unmap command for this memory object immediately.
    ///
    /// Prefer `::unmap` for a builder-style interface.
    pub fn enqueue_unmap(&mut self, queue: Option<&Queue>, ewait: Option<EventList>,
            enew: Option<EventSlot>) -> OclResult<()> {
        let region = self.region.take()
            .ok_or_else(|| OclError::from("MemMap::enqueue_unmap: Already unmapped."))?;

        assert!(!(ewait.is_some() && self.unmap_wait_events.is_some()),
            "MemMap::enqueue_unmap: Cannot set an event wait list for the unmap command \
            when the 'unmap_wait_events' has already been set.");

        if region.flags().intersects(MapFlags::WRITE | MapFlags::WRITE_INVALIDATE_REGION) {
            region.host_mem().write().as_mut_slice()
                .copy_from_slice(bytemuck::cast_slice(&self.data));
        }

        let ewait = ewait.or_else(|| self.unmap_wait_events.take());
        let wait_events = wait_list(ewait.as_ref());
        let unmap_event = core::enqueue_unmap_mem_object(queue.unwrap_or(&self.queue), region,
            wait_events.as_deref())?;

        if let Some(user_event) = self.unmap_event.take() {
            relay_completion(&unmap_event, user_event)?;
        }

        if let Some(slot) = enew {
            slot.fill(unmap_event);
        }

        Ok(())
    }

    /// Returns a reference to the unmap target event if it has been set.
    pub fn unmap_event(&self) -> Option<&Event> {
        self.unmap_event.as_ref()
    }

    /// Returns a reference to the unmap wait event list if it has been set.
    pub fn unmap_wait_events(&self) -> Option<&EventList> {
        self.unmap_wait_events.as_ref()
    }

    /// Returns true if an unmap command has already been enqueued.
    #[inline]
    pub fn is_unmapped(&self) -> bool {
        self.region.is_none()
    }

    /// Returns the mapped buffer, if still mapped.
    pub fn mem(&self) -> Option<&MemCore> {
        self.region.as_ref().map(|r| r.mem())
    }

    /// Returns the element offset of the mapped region within its buffer.
    pub fn offset(&self) -> Option<usize> {
        self.region.as_ref().map(|r| r.offset() / mem::size_of::<T>())
    }

    /// Returns a reference to the queue used for the unmap command.
    #[inline]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}

/// Completes `user_event` once `event` finishes, passing on any failure.
fn relay_completion(event: &core::Event, user_event: Event) -> OclResult<()> {
    core::set_event_callback(event, CommandExecutionStatus::Complete, move |_, status| {
        let result = match status.error() {
            Some(err) => user_event.set_error(err),
            None => user_event.set_complete(),
        };
        if let Err(err) = result {
            warn!("MemMap: unable to relay unmap completion: {}", err);
        }
    }).map_err(OclError::from)
}

impl<T> Deref for MemMap<T> where T: OclPrm {
    type Target = [T];

    fn deref(&self) -> &[T] {
        assert!(!self.is_unmapped(), "Mapped memory has been unmapped and cannot be accessed.");
        &self.data
    }
}

impl<T> DerefMut for MemMap<T> where T: OclPrm {
    fn deref_mut(&mut self) -> &mut [T] {
        assert!(!self.is_unmapped(), "Mapped memory has been unmapped and cannot be accessed.");
        &mut self.data
    }
}

impl<T: OclPrm> Drop for MemMap<T> {
    fn drop(&mut self) {
        if !self.is_unmapped() {
            if let Err(err) = self.enqueue_unmap(None, None, None) {
                warn!("MemMap::drop: unmap failed: {}", err);
            }
        }
    }
}

