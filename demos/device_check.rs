//! Checks every device of every platform by running a small kernel over
//! buffers created with each memory allocation flag, then validating the
//! results on the host.

use ocl_harness::flags::MemFlags;
use ocl_harness::{Device, Platform, ProQue, Result};
use harness_extras::kernels::misc;
use rand::Rng;

const WORK_SIZE: usize = 1 << 14;
const ITERS: usize = 8;

fn flag_sets() -> Vec<(&'static str, MemFlags)> {
    vec![
        ("read_write", MemFlags::new().read_write()),
        ("read_write | alloc_host_ptr", MemFlags::new().read_write().alloc_host_ptr()),
    ]
}

/// Adds a random value to a buffer `ITERS` times, checking after each add.
fn check(pro_que: &ProQue, flags: MemFlags) -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut expected: Vec<f32> = (0..WORK_SIZE).map(|_| rng.gen_range(-100.0..100.0)).collect();

    let buffer = pro_que.buffer_builder::<f32>()
        .flags(flags)
        .copy_host_slice(&expected)
        .build()?;
    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(0.0f32)
        .build()?;

    let mut found = vec![0.0f32; WORK_SIZE];
    for iter in 0..ITERS {
        let addend: f32 = rng.gen_range(-10.0..10.0);
        kernel.set_arg("addend", addend)?;
        kernel.enq()?;
        buffer.read(&mut found).enq()?;

        for (idx, (e, f)) in expected.iter_mut().zip(found.iter()).enumerate() {
            *e += addend;
            if *e != *f {
                return Err(format!("iteration {}: mismatch at [{}]: expected {}, found {}",
                    iter, idx, e, f).into());
            }
        }
    }
    Ok(())
}

fn device_check() -> Result<()> {
    let mut failures = 0;

    for platform in Platform::list()? {
        for device in Device::list_all(&platform)? {
            println!("Checking device: {} ({})", device.name()?, platform.name()?);

            let pro_que = ProQue::builder()
                .platform(platform.clone())
                .device(device.clone())
                .src(misc::SRC)
                .kernels(misc::library())
                .dims(WORK_SIZE)
                .build()?;

            for (label, flags) in flag_sets() {
                match check(&pro_que, flags) {
                    Ok(()) => println!("    {}: ok", label),
                    Err(err) => {
                        println!("    {}: FAILED: {}", label, err);
                        failures += 1;
                    },
                }
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} check(s) failed", failures).into());
    }
    println!("All devices passed.");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = device_check() {
        println!("{}", err);
        std::process::exit(1);
    }
}
