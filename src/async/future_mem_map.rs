use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use crate::core::{MappedRegion, OclPrm};
use crate::r#async::MemMap;
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Event, EventList, EventSlot, Queue};


/// A future which resolves to a `MemMap` as soon as its map command
/// completes.
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct FutureMemMap<T: OclPrm> {
    region: Option<MappedRegion>,
    map_event: Event,
    unmap_wait_events: Option<EventList>,
    unmap_event: Option<Event>,
    queue: Option<Queue>,
    _ty: std::marker::PhantomData<T>,
}

impl<T: OclPrm> FutureMemMap<T> {
    /// Returns a new `FutureMemMap`.
    pub(crate) fn new(region: MappedRegion, map_event: Event, queue: Queue) -> FutureMemMap<T> {
        FutureMemMap {
            region: Some(region),
            map_event,
            unmap_wait_events: None,
            unmap_event: None,
            queue: Some(queue),
            _ty: std::marker::PhantomData,
        }
    }

    /// Set an event wait list for the unmap command.
    ///
    /// Setting a wait list here will disallow any wait list from being set
    /// later if/when calling unmap manually.
    pub fn set_unmap_wait_events<El>(&mut self, wait_events: El) where El: Into<EventList> {
        self.unmap_wait_events = Some(wait_events.into())
    }

    /// Set an event wait list for the unmap command.
    ///
    /// See `::set_unmap_wait_events`.
    pub fn ewait_unmap<L: Into<EventList>>(mut self, wait_events: L) -> FutureMemMap<T> {
        self.set_unmap_wait_events(wait_events);
        self
    }

    /// Creates a user event which is completed after this future resolves
    /// into a `MemMap` **and** that `MemMap` is dropped or unmapped.
    ///
    /// Commands which wait on the returned event run only once the host is
    /// finished with the mapped memory.
    pub fn create_unmap_event(&mut self) -> OclResult<&mut Event> {
        let queue = self.queue.as_ref()
            .ok_or_else(|| OclError::from("FutureMemMap::create_unmap_event: No queue found!"))?;
        let uev = Event::user(&queue.context())?;
        Ok(self.unmap_event.get_or_insert(uev))
    }

    /// Specifies a destination for the event created with
    /// `::create_unmap_event`.
    pub fn enew_unmap<'e, En>(mut self, enew: En) -> OclResult<FutureMemMap<T>>
            where En: Into<EventSlot<'e>> {
        let unmap_event = self.create_unmap_event()?;
        if let Some(core) = unmap_event.as_core() {
            enew.into().fill(core.clone());
        }
        Ok(self)
    }

    /// Specifies the queue to be used for the unmap command.
    pub fn set_unmap_queue(&mut self, queue: Queue) {
        self.queue = Some(queue)
    }

    /// Specifies the queue to be used for the unmap command.
    pub fn with_unmap_queue(mut self, queue: Queue) -> FutureMemMap<T> {
        self.set_unmap_queue(queue);
        self
    }

    /// Returns the unmap event if it has been created.
    #[inline]
    pub fn unmap_event(&self) -> Option<&Event> {
        self.unmap_event.as_ref()
    }

    /// Blocks the current thread until the map command is complete.
    pub fn wait(self) -> OclResult<MemMap<T>> {
        futures::executor::block_on(self)
    }

    /// Resolves this `FutureMemMap` into a `MemMap`.
    fn to_mapped_mem(&mut self) -> OclResult<MemMap<T>> {
        match (self.region.take(), self.queue.take()) {
            (Some(region), Some(queue)) => Ok(MemMap::new(region, self.unmap_wait_events.take(),
                self.unmap_event.take(), queue)),
            _ => Err("FutureMemMap::to_mapped_mem: Already resolved.".into()),
        }
    }
}

// No field is structurally pinned (`T` only appears in `PhantomData`).
impl<T: OclPrm> Unpin for FutureMemMap<T> {}

impl<T: OclPrm> Future for FutureMemMap<T> {
    type Output = OclResult<MemMap<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.map_event).poll(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(self.to_mapped_mem()),
            Poll::Ready(Err(err)) => Poll::Ready(Err(err)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T: OclPrm> Drop for FutureMemMap<T> {
    /// Unmaps the region if this future is dropped before resolving.
    fn drop(&mut self) {
        if let (Some(region), Some(queue)) = (self.region.take(), self.queue.as_ref()) {
            let wait_events: Vec<_> = self.map_event.as_core().cloned().into_iter().collect();
            if let Err(err) = crate::core::enqueue_unmap_mem_object(queue.as_core(), region,
                    Some(&wait_events)) {
                log::warn!("FutureMemMap::drop: unmap failed: {}", err);
            }
        }
    }
}
