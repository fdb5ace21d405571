//! Command queues and their executor threads.
//!
//! Every command becomes a job which is handed to the queue's worker pool
//! once all of its prerequisites have finished. In-order queues have a
//! single worker and make each command depend on the previous one.
//! Out-of-order queues have several workers and order commands only through
//! their wait lists.

use crossbeam_channel::{self as channel, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::{Error, Result};
use crate::{CommandExecutionStatus, CommandQueueProperties, CommandType, Context, DeviceId,
    Event, EventStatus, Status};

/// The body of a command, run on a worker thread.
pub(crate) type Work = Box<dyn FnOnce() -> std::result::Result<(), Status> + Send>;

type Job = Box<dyn FnOnce() + Send>;

pub(crate) struct QueueObj {
    pub(crate) id: u64,
    pub(crate) context: Context,
    pub(crate) device: DeviceId,
    pub(crate) properties: CommandQueueProperties,
    sender: Sender<Job>,
    last: Mutex<Option<Event>>,
    outstanding: Mutex<Vec<Event>>,
}

/// A command waiting on its prerequisites.
struct Pending {
    remaining: AtomicUsize,
    failure: Mutex<Option<Status>>,
    work: Mutex<Option<Work>>,
    event: Event,
    sender: Sender<Job>,
}

impl Pending {
    /// Counts one prerequisite as finished, dispatching the command after
    /// the last.
    fn release(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }

        let work = match self.work.lock().take() {
            Some(work) => work,
            None => return,
        };

        if let Some(status) = *self.failure.lock() {
            warn!("{:?} ({:?}) will not run: a prerequisite failed with {:?}",
                self.event, self.event.command_type(), status);
            self.event.transition(EventStatus::Error(status), true);
            return;
        }

        self.event.transition(EventStatus::Submitted, false);
        let event = self.event.clone();
        let job: Job = Box::new(move || execute(&event, work));

        if self.sender.send(job).is_err() {
            self.event.transition(EventStatus::Error(Status::OutOfResources), false);
        }
    }
}

fn execute(event: &Event, work: Work) {
    event.transition(EventStatus::Running, false);

    let status = match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(Ok(())) => EventStatus::Complete,
        Ok(Err(status)) => {
            debug!("{:?} ({:?}) failed: {:?}", event, event.command_type(), status);
            EventStatus::Error(status)
        },
        Err(_) => {
            warn!("{:?} ({:?}) panicked during execution", event, event.command_type());
            EventStatus::Error(Status::OutOfResources)
        },
    };

    event.transition(status, false);
}

impl QueueObj {
    pub(crate) fn new(context: &Context, device: &DeviceId, properties: CommandQueueProperties)
            -> Result<QueueObj> {
        let id = super::next_id();
        let out_of_order = properties.contains(CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE);
        let workers = if out_of_order {
            device.0.config.out_of_order_workers.max(1)
        } else {
            1
        };

        let (sender, receiver) = channel::unbounded::<Job>();
        for i in 0..workers {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("harness-queue-{}-{}", id, i))
                .spawn(move || {
                    for job in receiver.iter() {
                        job();
                    }
                })?;
        }

        info!("CommandQueue({}) created on '{}' ({:?}, {} worker(s))", id, device.0.config.name,
            properties, workers);

        Ok(QueueObj {
            id,
            context: context.clone(),
            device: device.clone(),
            properties,
            sender,
            last: Mutex::new(None),
            outstanding: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn is_out_of_order(&self) -> bool {
        self.properties.contains(CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE)
    }

    pub(crate) fn profiling(&self) -> bool {
        self.properties.contains(CommandQueueProperties::PROFILING_ENABLE)
    }

    /// Enqueues a command which runs `work` once every event in `wait_list`
    /// has completed. A failed wait list event fails the command without
    /// running it.
    pub(crate) fn submit(&self, command_type: CommandType, wait_list: Option<&[Event]>,
            work: Work) -> Result<Event> {
        self.submit_ordered(command_type, wait_list, Vec::new(), work)
    }

    /// Like `submit` but also waits on `order_only`, whose failures are not
    /// inherited.
    fn submit_ordered(&self, command_type: CommandType, wait_list: Option<&[Event]>,
            order_only: Vec<Event>, work: Work) -> Result<Event> {
        let wait_list = wait_list.unwrap_or(&[]);
        if wait_list.iter().any(|e| e.context() != &self.context) {
            return Err(Error::ForeignResource("an event in the wait list"));
        }

        let event = Event::new_command(&self.context, command_type, self.profiling());

        let mut deps: Vec<(Event, bool)> = wait_list.iter().map(|e| (e.clone(), true)).collect();
        deps.extend(order_only.into_iter().map(|e| (e, false)));

        if !self.is_out_of_order() {
            if let Some(prev) = self.last.lock().replace(event.clone()) {
                deps.push((prev, false));
            }
        }

        {
            let mut outstanding = self.outstanding.lock();
            outstanding.retain(|e| !e.status().is_terminal());
            outstanding.push(event.clone());
        }

        #[cfg(feature = "event_debug_print")]
        debug!("CommandQueue({}): {:?} ({:?}) enqueued after {} prerequisite(s)", self.id,
            event, command_type, deps.len());

        let pending = Arc::new(Pending {
            remaining: AtomicUsize::new(deps.len() + 1),
            failure: Mutex::new(None),
            work: Mutex::new(Some(work)),
            event: event.clone(),
            sender: self.sender.clone(),
        });

        for (dep, inherit_failure) in deps {
            let pending = pending.clone();
            dep.add_callback(CommandExecutionStatus::Complete, Box::new(move |_, status| {
                if inherit_failure {
                    if let Some(code) = status.error() {
                        pending.failure.lock().get_or_insert(code);
                    }
                }
                pending.release();
            }));
        }
        pending.release();

        Ok(event)
    }

    /// Enqueues a command which completes after every command enqueued
    /// before it and every event in `wait_list`.
    pub(crate) fn marker(&self, wait_list: Option<&[Event]>) -> Result<Event> {
        let previous = self.outstanding.lock().clone();
        self.submit_ordered(CommandType::Marker, wait_list, previous, Box::new(|| Ok(())))
    }

    /// Blocks until every command enqueued so far has finished. Failed
    /// commands do not make `finish` fail.
    pub(crate) fn finish(&self) -> Result<()> {
        let outstanding = self.outstanding.lock().clone();
        for event in &outstanding {
            if let Err(err) = event.wait() {
                debug!("CommandQueue({}): finish: {:?} failed: {}", self.id, event, err);
            }
        }
        self.outstanding.lock().retain(|e| !e.status().is_terminal());
        Ok(())
    }
}
