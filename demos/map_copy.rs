//! Fills a buffer through a host mapping, copies part of it into a second
//! buffer, and awaits a mapping as a future.

use futures::executor::block_on;
use ocl_harness::{Event, ProQue, Queue, Result};
use harness_extras::kernels::misc;

const WORK_SIZE: usize = 1 << 16;
const COPY_OFFSET: usize = 1000;
const COPY_LEN: usize = 5000;

fn map_copy() -> Result<()> {
    let pro_que = ProQue::builder()
        .src(misc::SRC)
        .kernels(misc::library())
        .dims(WORK_SIZE)
        .build()?;

    let src_buffer = pro_que.create_buffer::<u32>()?;
    let dst_buffer = pro_que.buffer_builder::<u32>().fill_val(0).build()?;

    {
        let mut mem_map = src_buffer.map().write_invalidate().enq()?;
        for (i, val) in mem_map.iter_mut().enumerate() {
            *val = i as u32;
        }
        mem_map.unmap().enq()?;
    }

    src_buffer.cmd()
        .offset(COPY_OFFSET)
        .copy(&dst_buffer, Some(COPY_OFFSET), Some(COPY_LEN))
        .enq()?;

    let mem_map = dst_buffer.map().read().enq()?;
    let copied = mem_map.iter().enumerate()
        .filter(|&(i, &v)| (COPY_OFFSET..COPY_OFFSET + COPY_LEN).contains(&i) && v == i as u32)
        .count();
    let zeroed = mem_map.iter().filter(|&&v| v == 0).count();
    println!("Copied {} element(s), {} left at zero.", copied, zeroed);
    if copied != COPY_LEN || zeroed != WORK_SIZE - COPY_LEN {
        return Err("the copy touched the wrong range".into());
    }
    drop(mem_map);

    // The kernel holds the default queue until the unmap completes, so the
    // unmap needs a queue of its own.
    let unmap_queue = Queue::new(pro_que.context(), pro_que.device(), None)?;
    let mut future_map = dst_buffer.map().write_invalidate().enq_async()?
        .with_unmap_queue(unmap_queue);
    let unmap_event = future_map.create_unmap_event()?.clone();

    let kernel = pro_que.kernel_builder("add_u32")
        .arg(&dst_buffer)
        .arg(1u32)
        .build()?;
    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(&unmap_event).enew(&mut kernel_event).enq()?;

    let mut mem_map = block_on(future_map)?;
    for val in mem_map.iter_mut() {
        *val = 41;
    }
    mem_map.unmap().enq()?;
    block_on(kernel_event)?;

    let mut vec = vec![0u32; WORK_SIZE];
    dst_buffer.read(&mut vec).enq()?;
    if vec.iter().any(|&v| v != 42) {
        return Err("the kernel did not see the mapped writes".into());
    }
    println!("Mapped writes reached the kernel.");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = map_copy() {
        println!("{}", err);
        std::process::exit(1);
    }
}
