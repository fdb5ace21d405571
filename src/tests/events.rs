use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use harness_extras::kernels::{events, misc};
use crate::core::{EventStatus, Status};
use crate::enums::CommandExecutionStatus;
use crate::flags::CommandQueueProperties;
use crate::standard::{Buffer, Event, EventList, Kernel, ProQue};
use crate::r#async::RwVec;

const LOG_LEN: usize = 8;

fn pro_que(src: &str, library: crate::KernelLibrary, out_of_order: bool) -> ProQue {
    let mut props = CommandQueueProperties::new();
    if out_of_order {
        props = props.out_of_order();
    }
    ProQue::builder()
        .src(src)
        .kernels(library)
        .queue_properties(props)
        .build().unwrap()
}

/// Returns an `append_tag` kernel with its log and cursor.
fn tag_kernel(pro_que: &ProQue) -> (Kernel, Buffer<u32>, Buffer<u32>) {
    let log = pro_que.buffer_builder::<u32>().len(LOG_LEN).fill_val(u32::MAX).build().unwrap();
    let cursor = pro_que.buffer_builder::<u32>().len(1).fill_val(0).build().unwrap();
    let kernel = pro_que.kernel_builder("append_tag")
        .arg(&log)
        .arg(&cursor)
        .arg(0u32)
        .arg(0u32)
        .global_work_size(1)
        .build().unwrap();
    (kernel, log, cursor)
}

fn enqueue_tag(kernel: &Kernel, tag: u32, delay_ms: u32, ewait: Option<&Event>) -> Event {
    kernel.set_arg("tag", tag).unwrap();
    kernel.set_arg("delay_ms", delay_ms).unwrap();
    let mut event = Event::empty();
    kernel.cmd().ewait(ewait).enew(&mut event).enq().unwrap();
    event
}

fn read_log(log: &Buffer<u32>, cursor: &Buffer<u32>) -> Vec<u32> {
    let mut len = vec![0u32; 1];
    cursor.read(&mut len).enq().unwrap();
    let mut vec = vec![0u32; LOG_LEN];
    log.read(&mut vec).enq().unwrap();
    vec.truncate(len[0] as usize);
    vec
}

#[test]
fn user_event_gates_kernel_and_read() {
    let pro_que = pro_que(events::SRC, events::library(), true);
    let data: Vec<[f32; 4]> = (0..64).map(|i| [i as f32; 4]).collect();
    let buffer = pro_que.buffer_builder::<[f32; 4]>().copy_host_slice(&data).build().unwrap();

    let gate = Event::user(pro_que.context()).unwrap();

    let kernel = pro_que.kernel_builder("user_event")
        .arg(&buffer)
        .global_work_size(data.len())
        .build().unwrap();
    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(&gate).enew(&mut kernel_event).enq().unwrap();

    let result = RwVec::with_len(data.len());
    let mut read_event = Event::empty();
    buffer.read(&result).block(false).ewait(&kernel_event).enew(&mut read_event).enq().unwrap();

    let (tx, rx) = mpsc::channel();
    read_event.set_callback(CommandExecutionStatus::Complete, move |_, status| {
        tx.send(status).unwrap();
    }).unwrap();

    // Neither command may have been submitted, let alone started.
    thread::sleep(Duration::from_secs(1));
    assert_eq!(kernel_event.status().unwrap(), EventStatus::Queued);
    assert_eq!(read_event.status().unwrap(), EventStatus::Queued);
    assert!(rx.try_recv().is_err(), "callback fired before the gate opened");

    gate.set_complete().unwrap();
    read_event.wait_for().unwrap();
    assert!(kernel_event.is_complete().unwrap());

    let status = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(status, EventStatus::Complete);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err(), "callback fired twice");

    for (found, orig) in result.to_vec().iter().zip(data.iter()) {
        assert_eq!(*found, [-orig[0]; 4]);
    }
}

#[test]
fn in_order_queue_completes_in_submission_order() {
    let pro_que = pro_que(misc::SRC, misc::library(), false);
    let (kernel, log, cursor) = tag_kernel(&pro_que);

    // Later commands are faster. Only queue order can keep them in line.
    let mut events = EventList::new();
    for tag in 0..4u32 {
        events.push(enqueue_tag(&kernel, tag, (4 - tag) * 20, None));
    }
    events.wait_for().unwrap();

    assert_eq!(read_log(&log, &cursor), vec![0, 1, 2, 3]);
}

#[test]
fn out_of_order_queue_follows_wait_lists() {
    let pro_que = pro_que(misc::SRC, misc::library(), true);
    let (kernel, log, cursor) = tag_kernel(&pro_que);

    let first = enqueue_tag(&kernel, 1, 60, None);
    let second = enqueue_tag(&kernel, 2, 0, Some(&first));
    let third = enqueue_tag(&kernel, 3, 0, Some(&second));

    let marker = pro_que.queue().enqueue_marker(Some(&third)).unwrap();
    marker.wait_for().unwrap();
    assert!(first.is_complete().unwrap());

    assert_eq!(read_log(&log, &cursor), vec![1, 2, 3]);
}

#[test]
fn failed_user_event_propagates() {
    let pro_que = pro_que(misc::SRC, misc::library(), false);
    let buffer = pro_que.buffer_builder::<f32>().len(16).fill_val(1.0).build().unwrap();
    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(1.0f32)
        .global_work_size(16)
        .build().unwrap();

    let gate = Event::user(pro_que.context()).unwrap();
    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(&gate).enew(&mut kernel_event).enq().unwrap();

    let mut later_event = Event::empty();
    kernel.cmd().ewait(&kernel_event).enew(&mut later_event).enq().unwrap();

    gate.set_error(Status::InvalidValue).unwrap();

    for event in &[kernel_event.clone(), later_event.clone()] {
        let err = event.wait_for().unwrap_err();
        assert!(err.is_propagated(), "expected a propagated error, found: {}", err);
        assert_eq!(err.api_status(), Some(Status::InvalidValue));
        assert_eq!(event.status().unwrap(), EventStatus::Error(Status::InvalidValue));
    }

    // Neither launch ran.
    let mut vec = vec![0.0f32; 16];
    buffer.read(&mut vec).enq().unwrap();
    assert!(vec.iter().all(|&v| v == 1.0));

    // A user event status may be set only once.
    assert!(gate.set_complete().is_err());
}

#[test]
fn event_futures_resolve() {
    let pro_que = pro_que(misc::SRC, misc::library(), true);
    let (kernel, log, cursor) = tag_kernel(&pro_que);

    let events: EventList = (0..3u32)
        .scan(None, |prev: &mut Option<Event>, tag| {
            let event = enqueue_tag(&kernel, tag, 5, prev.as_ref());
            *prev = Some(event.clone());
            Some(event)
        })
        .collect();

    futures::executor::block_on(events).unwrap();
    assert_eq!(read_log(&log, &cursor), vec![0, 1, 2]);
}
