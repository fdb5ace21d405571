//! Creates a sub-buffer over part of a larger buffer, reads through it, and
//! runs a kernel on just that window.

use ocl_harness::flags::MemFlags;
use ocl_harness::{ProQue, Result};
use harness_extras::kernels::misc;

const LEN: usize = 100;
const SUB_ORIGIN: usize = 30;
const SUB_LEN: usize = 20;

fn sub_buffer() -> Result<()> {
    let pro_que = ProQue::builder()
        .src(misc::SRC)
        .kernels(misc::library())
        .dims(LEN)
        .build()?;

    let data: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let buffer = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build()?;
    let sub_buffer = buffer.create_sub_buffer(Some(MemFlags::new().read_write()), SUB_ORIGIN,
        SUB_LEN)?;
    println!("Sub-buffer: {} elements at offset {:?}.", sub_buffer.len(), sub_buffer.offset());

    let mut window = vec![0.0f32; SUB_LEN];
    sub_buffer.read(&mut window).enq()?;
    println!("Window: {:?}", window);
    for (k, &v) in window.iter().enumerate() {
        if v != (SUB_ORIGIN + k) as f32 {
            return Err(format!("window[{}] is {}, expected {}", k, v, SUB_ORIGIN + k).into());
        }
    }

    let kernel = pro_que.kernel_builder("multiply")
        .arg(&sub_buffer)
        .arg(-1.0f32)
        .global_work_size(SUB_LEN)
        .build()?;
    kernel.enq()?;

    let mut all = vec![0.0f32; LEN];
    buffer.read(&mut all).enq()?;
    println!("Parent after negating the window: {:?}",
        &all[SUB_ORIGIN - 2..SUB_ORIGIN + SUB_LEN + 2]);

    let wrong = all.iter().enumerate()
        .filter(|&(i, &v)| (SUB_ORIGIN..SUB_ORIGIN + SUB_LEN).contains(&i) != (v < 0.0))
        .count();
    if wrong > 0 {
        return Err(format!("{} element(s) of the parent are wrong", wrong).into());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = sub_buffer() {
        println!("{}", err);
        std::process::exit(1);
    }
}
