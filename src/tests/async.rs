//! Mapping, host vectors, and events as futures.

use std::thread;
use futures::executor::block_on;
use crate::standard::{Buffer, Event, Queue};
use crate::r#async::RwVec;
use crate::tests::misc_pro_que;

const WORK_SIZE: usize = 1 << 12;
const INIT_VAL: u32 = 50;
const SCALAR_ADDEND: u32 = 100;

#[test]
fn future_map_gates_the_kernel_on_unmap() {
    let pro_que = misc_pro_que(WORK_SIZE);
    let buffer = pro_que.create_buffer::<u32>().unwrap();

    // The kernel holds the default queue until the unmap completes, so the
    // unmap needs a queue of its own.
    let unmap_queue = Queue::new(pro_que.context(), pro_que.device(), None).unwrap();
    let mut future_map = buffer.map().write_invalidate().enq_async().unwrap()
        .with_unmap_queue(unmap_queue);
    let unmap_event = future_map.create_unmap_event().unwrap().clone();

    let kernel = pro_que.kernel_builder("add_u32")
        .arg(&buffer)
        .arg(SCALAR_ADDEND)
        .build().unwrap();

    // Enqueued before the host writes: waits on the unmap.
    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(&unmap_event).enew(&mut kernel_event).enq().unwrap();
    assert!(!kernel_event.is_complete().unwrap());

    let mut mem_map = block_on(future_map).unwrap();
    for val in mem_map.iter_mut() {
        *val = INIT_VAL;
    }
    mem_map.unmap().enq().unwrap();

    block_on(kernel_event).unwrap();

    let mut vec = vec![0u32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();
    assert!(vec.iter().all(|&v| v == INIT_VAL + SCALAR_ADDEND));
}

#[test]
fn blocking_map_reads_and_writes_back_on_drop() {
    let pro_que = misc_pro_que(256);
    let buffer = pro_que.buffer_builder::<u32>().fill_val(7).build().unwrap();

    {
        let mut mem_map = buffer.map().enq().unwrap();
        assert!(mem_map.iter().all(|&v| v == 7));
        mem_map[3] = 42;
    }

    let mut vec = vec![0u32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();
    assert_eq!(vec[3], 42);
    assert_eq!(vec.iter().filter(|&&v| v == 7).count(), 255);

    let mem_map = buffer.map().read().offset(3).len(2).enq().unwrap();
    assert_eq!(&mem_map[..], &[42, 7]);
}

#[test]
fn rw_vec_backs_a_buffer() {
    let pro_que = misc_pro_que(WORK_SIZE);
    let rw_vec = RwVec::from(vec![INIT_VAL; WORK_SIZE]);

    let buffer = Buffer::<u32>::builder()
        .queue(pro_que.queue().clone())
        .use_host_vec(&rw_vec)
        .build().unwrap();

    let kernel = pro_que.kernel_builder("add_u32")
        .arg(&buffer)
        .arg(SCALAR_ADDEND)
        .build().unwrap();
    kernel.enq().unwrap();
    pro_que.queue().finish().unwrap();

    assert!(rw_vec.read().iter().all(|&v| v == INIT_VAL + SCALAR_ADDEND));

    let out = RwVec::with_len(WORK_SIZE);
    buffer.read(&out).enq().unwrap();
    assert_eq!(out.to_vec(), rw_vec.to_vec());
}

#[test]
fn queues_on_separate_threads() {
    let pro_que = misc_pro_que(WORK_SIZE);
    let buffer = pro_que.buffer_builder::<u32>().fill_val(0).build().unwrap();
    let quarter = WORK_SIZE / 4;

    // Each thread owns a quarter of the buffer.
    let threads: Vec<_> = (0..4).map(|i| {
        let queue = Queue::new(pro_que.context(), pro_que.device(), None).unwrap();
        let kernel = pro_que.kernel_builder("add_u32")
            .queue(queue)
            .global_work_offset(i * quarter)
            .global_work_size(quarter)
            .arg(&buffer)
            .arg(i as u32 + 1)
            .build().unwrap();

        thread::spawn(move || {
            let mut event = Event::empty();
            kernel.cmd().enew(&mut event).enq().unwrap();
            event.wait_for().unwrap();
        })
    }).collect();

    for th in threads {
        th.join().unwrap();
    }

    let mut vec = vec![0u32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();
    for (i, &v) in vec.iter().enumerate() {
        assert_eq!(v, (i / quarter) as u32 + 1, "idx: {}", i);
    }
}
