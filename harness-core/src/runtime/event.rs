//! Event state, status transitions, callbacks, and profiling timestamps.

use log::debug;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

use crate::error::{api_err, Error, Result};
use crate::{CommandExecutionStatus, CommandType, Context, Event, EventStatus, ProfilingInfo, Status};

/// A status callback. Receives the event and the status which triggered it.
pub(crate) type Callback = Box<dyn FnOnce(&Event, EventStatus) + Send>;

pub(crate) struct EventState {
    status: EventStatus,
    /// True if the failure was inherited from a prerequisite.
    propagated: bool,
    /// Queued, submit, start, and end timestamps.
    times: [Option<u64>; 4],
    callbacks: Vec<(CommandExecutionStatus, Callback)>,
}

pub(crate) struct EventObj {
    pub(crate) id: u64,
    pub(crate) context: Context,
    pub(crate) command_type: CommandType,
    pub(crate) profiling: bool,
    pub(crate) user: bool,
    state: Mutex<EventState>,
    cond: Condvar,
}

fn time_slot(status: EventStatus) -> usize {
    match status {
        EventStatus::Queued => 0,
        EventStatus::Submitted => 1,
        EventStatus::Running => 2,
        EventStatus::Complete | EventStatus::Error(_) => 3,
    }
}

impl EventObj {
    fn new(context: &Context, command_type: CommandType, profiling: bool, user: bool,
            status: EventStatus) -> EventObj {
        let mut times = [None; 4];
        if profiling {
            times[0] = Some(super::timestamp());
        }

        EventObj {
            id: super::next_id(),
            context: context.clone(),
            command_type,
            profiling,
            user,
            state: Mutex::new(EventState {
                status,
                propagated: false,
                times,
                callbacks: Vec::new(),
            }),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn status(&self) -> EventStatus {
        self.state.lock().status
    }

    /// Blocks until the event reaches a terminal status.
    pub(crate) fn wait(&self) -> Result<()> {
        let mut state = self.state.lock();
        while !state.status.is_terminal() {
            self.cond.wait(&mut state);
        }

        match state.status {
            EventStatus::Error(status) if state.propagated => Err(Error::Propagated(status)),
            EventStatus::Error(status) => Err(Error::Submit(status)),
            _ => Ok(()),
        }
    }

    /// Returns a profiling timestamp.
    pub(crate) fn profiling_time(&self, info: ProfilingInfo) -> Result<u64> {
        if !self.profiling {
            return Err(api_err(Status::ProfilingInfoNotAvailable, "get_event_profiling_info",
                "the queue was not created with profiling enabled"));
        }

        let state = self.state.lock();
        if state.status != EventStatus::Complete {
            return Err(api_err(Status::ProfilingInfoNotAvailable, "get_event_profiling_info",
                format!("the command has not completed (status: {})", state.status)));
        }

        let slot = match info {
            ProfilingInfo::Queued => 0,
            ProfilingInfo::Submit => 1,
            ProfilingInfo::Start => 2,
            ProfilingInfo::End => 3,
        };

        state.times[slot].ok_or_else(|| api_err(Status::ProfilingInfoNotAvailable,
            "get_event_profiling_info", format!("no {:?} timestamp was recorded", info)))
    }
}

impl Event {
    /// Creates the event for a newly enqueued command.
    pub(crate) fn new_command(context: &Context, command_type: CommandType, profiling: bool)
            -> Event {
        Event(Arc::new(EventObj::new(context, command_type, profiling, false,
            EventStatus::Queued)))
    }

    /// Creates a user event. User events start out submitted.
    pub(crate) fn new_user(context: &Context) -> Event {
        Event(Arc::new(EventObj::new(context, CommandType::User, false, true,
            EventStatus::Submitted)))
    }

    /// Advances the status and runs every callback whose trigger has been
    /// reached. Terminal statuses are final: returns false if the event had
    /// already completed or failed.
    pub(crate) fn transition(&self, status: EventStatus, propagated: bool) -> bool {
        let ready = {
            let mut state = self.0.state.lock();
            if state.status.is_terminal() {
                return false;
            }

            state.status = status;
            state.propagated = propagated;

            if self.0.profiling {
                let now = super::timestamp();
                let slot = time_slot(status);
                for t in state.times.iter_mut().take(slot + 1) {
                    if t.is_none() {
                        *t = Some(now);
                    }
                }
            }

            let (ready, pending): (Vec<_>, Vec<_>) = state.callbacks.drain(..)
                .partition(|(trigger, _)| status.has_reached(*trigger));
            state.callbacks = pending;

            if status.is_terminal() {
                self.0.cond.notify_all();
            }
            ready
        };

        #[cfg(feature = "event_debug_print")]
        debug!("{:?} ({:?}): {}", self, self.0.command_type, status);

        for (_, callback) in ready {
            callback(self, status);
        }
        true
    }

    /// Registers a callback, running it immediately if `trigger` has
    /// already been reached.
    pub(crate) fn add_callback(&self, trigger: CommandExecutionStatus, callback: Callback) {
        let status = {
            let mut state = self.0.state.lock();
            if !state.status.has_reached(trigger) {
                state.callbacks.push((trigger, callback));
                return;
            }
            state.status
        };

        callback(self, status);
    }

    /// Sets the status of a user event.
    pub(crate) fn set_user_status(&self, status: EventStatus) -> Result<()> {
        if !self.0.user {
            return Err(api_err(Status::InvalidEvent, "set_user_event_status",
                format!("{:?} is not a user event", self)));
        }
        if !status.is_terminal() {
            return Err(api_err(Status::InvalidValue, "set_user_event_status",
                format!("a user event may only be set to complete or an error, not {}", status)));
        }
        if !self.transition(status, false) {
            return Err(api_err(Status::InvalidOperation, "set_user_event_status",
                format!("the status of {:?} has already been set", self)));
        }

        debug!("{:?}: user status set to {}", self, status);
        Ok(())
    }
}
