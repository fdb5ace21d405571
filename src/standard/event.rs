//! An event and a list of events.

use std::fmt;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use log::trace;
use crate::core::{self, CommandExecutionStatus, Event as EventCore, EventInfo, EventInfoResult,
    EventStatus, ProfilingInfo, ProfilingInfoResult, Status};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Context, Queue};


/// An event representing a command or user created event.
///
/// An empty event is a placeholder which a command fills when it is
/// enqueued with this event as its `enew` destination.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
#[must_use = "futures do nothing unless polled"]
pub struct Event(Option<EventCore>);

impl Event {
    /// Creates a new, empty event which must be filled by a command,
    /// associating the event with it.
    pub fn empty() -> Event {
        Event(None)
    }

    /// Creates a new user event, initially `Submitted`.
    ///
    /// Commands waiting on a user event do not start until its status is
    /// set with `set_complete` or `set_error`.
    pub fn user(context: &Context) -> OclResult<Event> {
        core::create_user_event(context.as_core())
            .map(|ev| Event(Some(ev)))
            .map_err(OclError::from)
    }

    /// Returns true if this event is 'empty' and has not yet been associated
    /// with a command.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    fn core(&self) -> OclResult<&EventCore> {
        self.0.as_ref().ok_or_else(|| OclError::from("Event: this event is empty"))
    }

    /// Returns the current execution status.
    pub fn status(&self) -> OclResult<EventStatus> {
        core::get_event_status(self.core()?).map_err(OclError::from)
    }

    /// Returns true if the command has completed successfully.
    ///
    /// A failed command is terminal but not complete.
    pub fn is_complete(&self) -> OclResult<bool> {
        self.status().map(|s| s == EventStatus::Complete)
    }

    /// Waits for the event to finish. Returns the failure of the command (or
    /// of one of its prerequisites) as an error.
    ///
    /// Waiting on an empty event returns immediately.
    pub fn wait_for(&self) -> OclResult<()> {
        match self.0 {
            Some(ref ev) => core::wait_for_event(ev).map_err(OclError::from),
            None => Ok(()),
        }
    }

    /// Sets the status of a user event to `Complete`, releasing the
    /// commands which wait on it.
    pub fn set_complete(&self) -> OclResult<()> {
        core::set_user_event_status(self.core()?, EventStatus::Complete)
            .map_err(OclError::from)
    }

    /// Sets the status of a user event to an error. Commands waiting on it
    /// end with a propagated error instead of running.
    pub fn set_error(&self, status: Status) -> OclResult<()> {
        core::set_user_event_status(self.core()?, EventStatus::Error(status))
            .map_err(OclError::from)
    }

    /// Registers `callback` to run once this event reaches `trigger` or
    /// fails. The callback receives the status at the time it fires.
    ///
    /// Callbacks run on the thread which advanced the event. Any user data
    /// is captured by the closure.
    pub fn set_callback<F>(&self, trigger: CommandExecutionStatus, callback: F) -> OclResult<()>
            where F: FnOnce(&EventCore, EventStatus) + Send + 'static {
        core::set_event_callback(self.core()?, trigger, callback).map_err(OclError::from)
    }

    /// Returns info about the event.
    pub fn info(&self, info_kind: EventInfo) -> OclResult<EventInfoResult> {
        core::get_event_info(self.core()?, info_kind).map_err(OclError::from)
    }

    /// Returns profiling info about the event.
    ///
    /// Only available for commands enqueued on a profiling queue, once they
    /// have completed.
    pub fn profiling_info(&self, info_kind: ProfilingInfo) -> OclResult<ProfilingInfoResult> {
        core::get_event_profiling_info(self.core()?, info_kind).map_err(OclError::from)
    }

    /// Returns a reference to the core handle, if this event is not empty.
    #[inline]
    pub fn as_core(&self) -> Option<&EventCore> {
        self.0.as_ref()
    }

    fn fmt_info(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Event")
            .field("CommandType", &self.info(EventInfo::CommandType))
            .field("ReferenceCount", &self.info(EventInfo::ReferenceCount))
            .field("CommandExecutionStatus", &self.info(EventInfo::CommandExecutionStatus))
            .field("Context", &self.info(EventInfo::Context))
            .finish()
    }
}

impl From<EventCore> for Event {
    #[inline]
    fn from(ev: EventCore) -> Event {
        Event(Some(ev))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Event(empty)")
        } else {
            self.fmt_info(f)
        }
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

impl Future for Event {
    type Output = OclResult<()>;

    /// Resolves once the event is complete, or with its error if it failed.
    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let ev = match self.0 {
            Some(ref ev) => ev,
            None => return Poll::Ready(Ok(())),
        };

        if ev.status().is_terminal() {
            return Poll::Ready(ev.wait().map_err(OclError::from));
        }

        let waker = cx.waker().clone();
        trace!("Event::poll: registering wake-up callback for {:?}.", ev);
        if let Err(err) = core::set_event_callback(ev, CommandExecutionStatus::Complete,
                move |_, _| waker.wake()) {
            return Poll::Ready(Err(err.into()));
        }
        Poll::Pending
    }
}


/// A list of events, usable as the wait list of a command or as the
/// destination of the events commands create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "futures do nothing unless polled"]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    /// Returns a new, empty, `EventList`.
    pub fn new() -> EventList {
        EventList { events: Vec::new() }
    }

    /// Returns a new, empty, `EventList` with an initial capacity of `cap`.
    pub fn with_capacity(cap: usize) -> EventList {
        EventList { events: Vec::with_capacity(cap) }
    }

    /// Adds an event to the list. Empty events are ignored.
    pub fn push<E: Into<Event>>(&mut self, event: E) {
        let event = event.into();
        if !event.is_empty() {
            self.events.push(event);
        }
    }

    /// Removes the last event from the list and returns it.
    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop()
    }

    /// Clears the list.
    pub fn clear(&mut self) {
        self.events.clear()
    }

    /// Removes every event which has reached a terminal status.
    pub fn clear_completed(&mut self) -> OclResult<()> {
        let mut retained = Vec::with_capacity(self.events.len());
        for event in self.events.drain(..) {
            if !event.status()?.is_terminal() {
                retained.push(event);
            }
        }
        self.events = retained;
        Ok(())
    }

    /// Blocks until every event in the list has finished, returning the
    /// first failure.
    pub fn wait_for(&self) -> OclResult<()> {
        let cores: Vec<EventCore> = self.events.iter()
            .filter_map(|e| e.as_core().cloned())
            .collect();
        core::wait_for_events(&cores).map_err(OclError::from)
    }

    /// Enqueues a marker on `queue` which completes once every event in
    /// this list has completed.
    pub fn enqueue_marker(&self, queue: &Queue) -> OclResult<Event> {
        queue.enqueue_marker(Some(self))
    }

    /// Returns a reference to the last event in the list.
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Returns a slice of the contained events.
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }
}

impl<'a> From<&'a Event> for EventList {
    fn from(event: &'a Event) -> EventList {
        let mut list = EventList::with_capacity(1);
        list.push(event.clone());
        list
    }
}

impl From<Event> for EventList {
    fn from(event: Event) -> EventList {
        let mut list = EventList::with_capacity(1);
        list.push(event);
        list
    }
}

impl<'a> From<Option<&'a Event>> for EventList {
    fn from(event: Option<&'a Event>) -> EventList {
        event.map(EventList::from).unwrap_or_default()
    }
}

impl<'a> From<&'a EventList> for EventList {
    fn from(list: &'a EventList) -> EventList {
        list.clone()
    }
}

impl<'a> From<&'a [Event]> for EventList {
    fn from(events: &'a [Event]) -> EventList {
        events.iter().cloned().collect()
    }
}

impl From<Vec<Event>> for EventList {
    fn from(events: Vec<Event>) -> EventList {
        events.into_iter().collect()
    }
}

impl std::iter::FromIterator<Event> for EventList {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> EventList {
        let mut list = EventList::new();
        for event in iter {
            list.push(event);
        }
        list
    }
}

impl Deref for EventList {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.events
    }
}

impl DerefMut for EventList {
    fn deref_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }
}

impl Future for EventList {
    type Output = OclResult<()>;

    /// Resolves once every event has finished.
    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        for event in self.events.iter_mut() {
            match Pin::new(event).poll(cx) {
                Poll::Ready(Ok(())) => continue,
                Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }
}
