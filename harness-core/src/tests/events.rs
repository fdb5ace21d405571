use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::tests::default_queue;
use crate::{
    ArgVal, CommandExecutionStatus, CommandQueue, CommandQueueProperties, Context, Error, Event,
    EventStatus, HostDst, Kernel, KernelLibrary, Mem, MemFlags, MemInit, ProfilingInfo, Status,
    WorkGroup,
};

const STAMP_SRC: &str = r#"
    __kernel void stamp(__global uint* buffer, uint digit) {
        buffer[0] = buffer[0] * 10 + digit;
    }
"#;

/// Appends a decimal digit to `buffer[0]`, slowly enough that a command
/// which did not wait would overtake it.
fn stamp(group: &WorkGroup) -> Result<()> {
    thread::sleep(Duration::from_millis(20));
    let buffer = group.global::<u32>(0)?;
    let digit = group.scalar::<u32>(1)?;
    buffer[0].set(buffer[0].get() * 10 + digit);
    Ok(())
}

fn stamp_kernel(context: &Context) -> (Kernel, Mem) {
    let lib = KernelLibrary::new().with("stamp", stamp);
    let program = crate::create_program_with_source(context, &[STAMP_SRC.to_owned()], &lib)
        .unwrap();
    crate::build_program(&program, None, "").unwrap();

    let buffer = crate::create_buffer(context, MemFlags::new(), 4, MemInit::Uninit).unwrap();
    let kernel = crate::create_kernel(&program, "stamp").unwrap();
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
    (kernel, buffer)
}

fn enqueue_stamp(queue: &CommandQueue, kernel: &Kernel, digit: u32, wait_list: Option<&[Event]>)
        -> Event {
    crate::set_kernel_arg(kernel, 1, ArgVal::scalar(&digit)).unwrap();
    crate::enqueue_task(queue, kernel, wait_list).unwrap()
}

fn read_u32(queue: &CommandQueue, buffer: &Mem) -> u32 {
    let mut out = [0u32];
    crate::enqueue_read_buffer(queue, buffer, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut out)), None).unwrap();
    out[0]
}

#[test]
fn in_order_queue_runs_in_submission_order() {
    let (_device, context, queue) = default_queue(None);
    let (kernel, buffer) = stamp_kernel(&context);

    // Arguments are captured at enqueue time.
    for digit in 1..=3 {
        enqueue_stamp(&queue, &kernel, digit, None);
    }

    assert_eq!(read_u32(&queue, &buffer), 123);
}

#[test]
fn out_of_order_queue_follows_wait_lists() {
    let props = CommandQueueProperties::new().out_of_order();
    let (_device, context, queue) = default_queue(Some(props));
    let (kernel, buffer) = stamp_kernel(&context);

    let e1 = enqueue_stamp(&queue, &kernel, 1, None);
    let e2 = enqueue_stamp(&queue, &kernel, 2, Some(&[e1]));
    let e3 = enqueue_stamp(&queue, &kernel, 3, Some(&[e2]));
    crate::wait_for_event(&e3).unwrap();

    assert_eq!(read_u32(&queue, &buffer), 123);

    // A marker completes only after everything enqueued before it.
    let e4 = enqueue_stamp(&queue, &kernel, 4, None);
    let marker = crate::enqueue_marker(&queue, None).unwrap();
    crate::wait_for_event(&marker).unwrap();
    assert!(e4.is_complete());
}

#[test]
fn user_event_gates_commands() {
    let (_device, context, queue) = default_queue(None);
    let (kernel, buffer) = stamp_kernel(&context);
    let gate = crate::create_user_event(&context).unwrap();
    assert_eq!(crate::get_event_status(&gate).unwrap(), EventStatus::Submitted);

    let event = enqueue_stamp(&queue, &kernel, 7, Some(&[gate.clone()]));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(crate::get_event_status(&event).unwrap(), EventStatus::Queued);

    crate::set_user_event_status(&gate, EventStatus::Complete).unwrap();
    crate::wait_for_event(&event).unwrap();
    assert_eq!(read_u32(&queue, &buffer), 7);

    // The status of a user event may be set only once.
    let err = crate::set_user_event_status(&gate, EventStatus::Complete).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidOperation));
    let err = crate::set_user_event_status(&event, EventStatus::Complete).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidEvent));
}

#[test]
fn failures_propagate_through_wait_lists() {
    let (_device, context, queue) = default_queue(None);
    let (kernel, buffer) = stamp_kernel(&context);
    let gate = crate::create_user_event(&context).unwrap();

    let e1 = enqueue_stamp(&queue, &kernel, 1, Some(&[gate.clone()]));
    let e2 = enqueue_stamp(&queue, &kernel, 2, Some(&[e1.clone()]));
    // Not in any wait list: follows e2 only through queue order.
    let e3 = enqueue_stamp(&queue, &kernel, 3, None);

    crate::set_user_event_status(&gate, EventStatus::Error(Status::InvalidValue)).unwrap();

    match crate::wait_for_event(&e2) {
        Err(Error::Propagated(status)) => assert_eq!(status, Status::InvalidValue),
        other => panic!("expected a propagated failure, found: {:?}", other),
    }
    assert_eq!(e1.status(), EventStatus::Error(Status::InvalidValue));
    assert!(crate::wait_for_events(&[e1, e2]).unwrap_err().is_propagated());

    crate::wait_for_event(&e3).unwrap();
    assert_eq!(read_u32(&queue, &buffer), 3);
}

#[test]
fn kernel_failure_fails_the_event() {
    fn fail(_group: &WorkGroup) -> Result<()> {
        Err(crate::error::api_err(Status::InvalidArgValue, "fail", "always fails"))
    }

    let src = "__kernel void fail(__global uint* buffer) { }";
    let (_device, context, queue) = default_queue(None);
    let lib = KernelLibrary::new().with("fail", fail);
    let program = crate::create_program_with_source(&context, &[src.to_owned()], &lib).unwrap();
    crate::build_program(&program, None, "").unwrap();
    let kernel = crate::create_kernel(&program, "fail").unwrap();
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem_null()).unwrap();

    let event = crate::enqueue_task(&queue, &kernel, None).unwrap();
    match crate::wait_for_event(&event) {
        Err(Error::Submit(status)) => assert_eq!(status, Status::InvalidArgValue),
        other => panic!("expected a failed command, found: {:?}", other),
    }

    // The queue keeps working and `finish` does not report the failure.
    crate::finish(&queue).unwrap();
}

#[test]
fn callbacks_run_once_their_status_is_reached() {
    let (_device, context, _queue) = default_queue(None);
    let gate = crate::create_user_event(&context).unwrap();
    let (tx, rx) = mpsc::channel();

    crate::set_event_callback(&gate, CommandExecutionStatus::Complete, move |_, status| {
        tx.send(status).unwrap();
    }).unwrap();
    assert!(rx.try_recv().is_err());

    crate::set_user_event_status(&gate, EventStatus::Complete).unwrap();
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), EventStatus::Complete);

    // Registered after the fact: runs immediately.
    let count = Arc::new(AtomicUsize::new(0));
    let count_cb = count.clone();
    crate::set_event_callback(&gate, CommandExecutionStatus::Running, move |_, _| {
        count_cb.fetch_add(1, Ordering::SeqCst);
    }).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let err = crate::set_event_callback(&gate, CommandExecutionStatus::Queued, |_, _| ())
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
}

#[test]
fn profiling_timestamps_are_ordered() {
    let (_device, context, queue) = default_queue(Some(CommandQueueProperties::PROFILING_ENABLE));
    let (kernel, _buffer) = stamp_kernel(&context);

    let event = enqueue_stamp(&queue, &kernel, 1, None);
    let err = crate::get_event_profiling_info(&event, ProfilingInfo::End);
    if !event.is_complete() {
        assert_eq!(err.unwrap_err().api_status(), Some(Status::ProfilingInfoNotAvailable));
    }
    crate::wait_for_event(&event).unwrap();

    let times: Vec<u64> = [ProfilingInfo::Queued, ProfilingInfo::Submit, ProfilingInfo::Start,
            ProfilingInfo::End].iter()
        .map(|&info| crate::get_event_profiling_info(&event, info).unwrap().time())
        .collect();

    assert!(times.windows(2).all(|w| w[0] <= w[1]), "times: {:?}", times);
    // The kernel sleeps for 20ms.
    assert!(times[3] - times[2] >= 20_000_000, "times: {:?}", times);
}

#[test]
fn profiling_requires_a_profiling_queue() {
    let (_device, context, queue) = default_queue(None);
    let (kernel, _buffer) = stamp_kernel(&context);

    let event = enqueue_stamp(&queue, &kernel, 1, None);
    crate::wait_for_event(&event).unwrap();

    let err = crate::get_event_profiling_info(&event, ProfilingInfo::Start).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::ProfilingInfoNotAvailable));
}
