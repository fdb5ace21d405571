//! Profiles a kernel at several global sizes and a buffer read.
//!
//! The queue is created with profiling enabled so every command's event
//! carries its queued, submit, start, and end timestamps.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::flags::CommandQueueProperties;
use ocl_harness::patterns::ProfileTimes;
use ocl_harness::{Event, ProQue, Result};
use harness_extras::kernels::events;

const NUM_INTS: usize = 1 << 20;
const NUM_BYTES: usize = 1 << 20;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

fn report(label: &str, event: &Event) -> Result<ProfileTimes> {
    let times = ProfileTimes::of(event)?;
    if !times.is_ordered() {
        return Err(format!("{}: timestamps are out of order: {}", label, times).into());
    }
    println!("{:>24}: {}", label, times);
    Ok(times)
}

fn profile() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("events.cl")?)
        .kernels(events::library())
        .queue_properties(CommandQueueProperties::new().profiling())
        .dims(NUM_INTS / 4)
        .build()?;

    let data: Vec<[i32; 4]> = (0..(NUM_INTS / 4) as i32).map(|i| [i; 4]).collect();
    let buffer = pro_que.buffer_builder::<[i32; 4]>().copy_host_slice(&data).build()?;
    let kernel = pro_que.kernel_builder("profile_items")
        .arg(&buffer)
        .arg(NUM_INTS as i32)
        .build()?;

    println!("Negating {} ints with each global size:", NUM_INTS);
    for &global_size in &[1usize, 4, 16, 64, 256, 1024] {
        let mut event = Event::empty();
        kernel.cmd().global_work_size(global_size).enew(&mut event).enq()?;
        event.wait_for()?;
        report(&format!("global size {}", global_size), &event)?;
    }

    let bytes = pro_que.buffer_builder::<[u8; 16]>().len(NUM_BYTES / 16).build()?;
    let fill = pro_que.kernel_builder("profile_read")
        .arg(&bytes)
        .arg((NUM_BYTES / 16) as i32)
        .global_work_size(1)
        .build()?;
    let mut fill_event = Event::empty();
    fill.cmd().enew(&mut fill_event).enq()?;

    let mut host = vec![[0u8; 16]; NUM_BYTES / 16];
    let mut read_event = Event::empty();
    bytes.read(&mut host).ewait(&fill_event).enew(&mut read_event).enq()?;
    report("fill", &fill_event)?;
    let read = report("read", &read_event)?;
    println!("Read {} bytes at {:.2} GB/s.", NUM_BYTES,
        NUM_BYTES as f64 / read.elapsed().max(1) as f64);

    if host.iter().any(|v| *v != [5u8; 16]) {
        return Err("the read returned unexpected bytes".into());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = profile() {
        println!("{}", err);
        std::process::exit(1);
    }
}
