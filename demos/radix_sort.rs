//! Sorts eight shuffled `ushort`s with a single-task radix sort.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::{ProQue, Result};
use harness_extras::kernels::radix;

const NUM_SHORTS: usize = 8;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

fn radix_sort() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("radix.cl")?)
        .kernels(radix::library())
        .build()?;

    let data: Vec<u16> = harness_extras::shuffled_vec((0, NUM_SHORTS as u16 - 1), NUM_SHORTS);
    println!("Input:");
    for (i, v) in data.iter().enumerate() {
        println!("data[{}]: {}", i, v);
    }

    let buffer = pro_que.buffer_builder::<u16>()
        .len(NUM_SHORTS)
        .copy_host_slice(&data)
        .build()?;
    let kernel = pro_que.kernel_builder("radix_sort8")
        .arg(&buffer)
        .build()?;
    kernel.cmd().task().enq()?;

    let mut sorted = vec![0u16; NUM_SHORTS];
    buffer.read(&mut sorted).enq()?;
    println!("Output:");
    for (i, v) in sorted.iter().enumerate() {
        println!("data[{}]: {}", i, v);
    }

    if sorted.iter().enumerate().any(|(i, &v)| v as usize != i) {
        return Err("the radix sort failed".into());
    }
    println!("The radix sort succeeded.");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = radix_sort() {
        println!("{}", err);
        std::process::exit(1);
    }
}
