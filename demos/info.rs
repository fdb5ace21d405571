//! Prints information about every platform, device, and a small set of
//! objects created on each.
//!
//! `Display` is implemented for each of the standard types, so printing one
//! is as simple as `println!("{}", &obj)`.

use ocl_harness::{Buffer, Context, Device, Kernel, Platform, Program, Queue, Result};
use harness_extras::kernels::misc;

const DIMS: usize = 2048;

fn info() -> Result<()> {
    let platforms = Platform::list()?;
    println!("Looping through available platforms ({}):", platforms.len());

    for platform in platforms.iter() {
        let devices = Device::list_all(platform)?;
        if devices.is_empty() { continue; }

        println!("{}", harness_extras::platform_report(platform.as_core())?);

        let context = Context::builder()
            .platform(platform.clone())
            .devices(&devices)
            .build()?;
        println!("{}", context);

        for device in devices.iter() {
            println!("{}", harness_extras::device_report(device.as_core())?);

            let queue = Queue::new(&context, device.clone(), None)?;
            let program = Program::builder()
                .src(misc::SRC)
                .kernels(misc::library())
                .devices(device.clone())
                .build(&context)?;
            let buffer = Buffer::<f32>::builder()
                .queue(queue.clone())
                .len(DIMS)
                .fill_val(1.0)
                .build()?;
            let kernel = Kernel::builder()
                .program(&program)
                .name("multiply")
                .queue(queue.clone())
                .global_work_size(DIMS)
                .arg(&buffer)
                .arg(10.0f32)
                .build()?;

            println!("{}", queue);
            println!("{}", program);
            println!("{}", buffer);
            println!("{}", kernel);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = info() {
        println!("{}", err);
        std::process::exit(1);
    }
}
