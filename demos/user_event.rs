//! Gates a kernel and a read on a user event.
//!
//! Neither command may start, and the read's completion callback may not
//! fire, until the user event is set. A second run sets the user event to
//! an error instead, which every dependent command inherits.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use find_folder::Search;
use ocl_harness::core::EventStatus;
use ocl_harness::enums::{CommandExecutionStatus, Status};
use ocl_harness::flags::CommandQueueProperties;
use ocl_harness::{Event, ProQue, Result, RwVec};
use harness_extras::kernels::events;

const WORK_SIZE: usize = 1 << 10;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

/// Enqueues the negating kernel and a non-blocking read, both waiting on
/// `gate`. Returns the read's event, the host vector, and a receiver for the
/// read's completion callback.
fn gated_commands(pro_que: &ProQue, gate: &Event, data: &[[f32; 4]])
        -> Result<(Event, RwVec<[f32; 4]>, mpsc::Receiver<EventStatus>)> {
    let buffer = pro_que.buffer_builder::<[f32; 4]>().copy_host_slice(data).build()?;
    let kernel = pro_que.kernel_builder("user_event")
        .arg(&buffer)
        .build()?;

    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(gate).enew(&mut kernel_event).enq()?;

    let result = RwVec::with_len(data.len());
    let mut read_event = Event::empty();
    buffer.read(&result).block(false).ewait(&kernel_event).enew(&mut read_event).enq()?;

    let (tx, rx) = mpsc::channel();
    read_event.set_callback(CommandExecutionStatus::Complete, move |_, status| {
        // The receiver may be gone if the demo has already failed.
        let _ = tx.send(status);
    })?;
    Ok((read_event, result, rx))
}

fn user_event() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("events.cl")?)
        .kernels(events::library())
        .queue_properties(CommandQueueProperties::new().out_of_order())
        .dims(WORK_SIZE)
        .build()?;
    let data: Vec<[f32; 4]> = (0..WORK_SIZE).map(|i| [i as f32; 4]).collect();

    let gate = Event::user(pro_que.context())?;
    let (read_event, result, rx) = gated_commands(&pro_que, &gate, &data)?;

    println!("Sleeping for one second with the gate closed...");
    thread::sleep(Duration::from_secs(1));
    if read_event.is_complete()? || rx.try_recv().is_ok() {
        return Err("the read completed before the gate opened".into());
    }

    gate.set_complete()?;
    read_event.wait_for()?;
    let status = rx.recv_timeout(Duration::from_secs(5))
        .map_err(|_| "the read's callback did not fire")?;
    println!("Gate opened. Read callback status: {}", status);

    let wrong = result.to_vec().iter().zip(data.iter())
        .filter(|&(found, orig)| *found != [-orig[0]; 4])
        .count();
    if wrong > 0 {
        return Err(format!("{} element(s) were not negated", wrong).into());
    }

    let gate = Event::user(pro_que.context())?;
    let (read_event, _result, rx) = gated_commands(&pro_que, &gate, &data)?;
    gate.set_error(Status::InvalidOperation)?;
    match read_event.wait_for() {
        Err(err) if err.is_propagated() => println!("Failure propagated to the read: {}", err),
        Err(err) => return Err(err),
        Ok(()) => return Err("the read succeeded after its gate failed".into()),
    }
    if let Ok(status) = rx.recv_timeout(Duration::from_secs(5)) {
        println!("Read callback status: {}", status);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = user_event() {
        println!("{}", err);
        std::process::exit(1);
    }
}
