//! Sorts 2^20 floats with a staged bitonic sort.
//!
//! Four kernels are reconfigured and relaunched by the host following
//! `StageSchedule::bitonic`: an initial per-block sort, two nested loops of
//! stage kernels, and a final merge.

use std::path::PathBuf;
use std::time::Instant;
use find_folder::Search;
use ocl_harness::patterns::{self, largest_pow2_at_most, Stage, StageSchedule};
use ocl_harness::{Kernel, ProQue, Result};
use harness_extras::kernels::bitonic::{self, ELEMENTS_PER_ITEM};

const NUM_FLOATS: usize = 1 << 20;
const ASCENDING: i32 = 0;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

fn sort() -> Result<()> {
    let global_size = NUM_FLOATS / ELEMENTS_PER_ITEM;

    let pro_que = ProQue::builder()
        .src_file(kernel_file("bitonic.cl")?)
        .kernels(bitonic::library())
        .dims(global_size)
        .build()?;

    let local_size = largest_pow2_at_most(pro_que.max_wg_size()?).min(global_size);
    let num_stages = (global_size / local_size) as u32;
    let local_len = ELEMENTS_PER_ITEM * local_size;
    println!("Sorting {} floats: local size {}, {} blocks.", NUM_FLOATS, local_size, num_stages);

    let data = harness_extras::scrambled_vec((-1.0e6f32, 1.0e6), NUM_FLOATS);
    let buffer = pro_que.buffer_builder::<f32>()
        .len(NUM_FLOATS)
        .copy_host_slice(&data)
        .build()?;

    let kernel = |name: &str, scalars: &[&'static str]| -> Result<Kernel> {
        let mut builder = pro_que.kernel_builder(name);
        builder.arg(&buffer)
            .arg_local::<f32>(local_len)
            .local_work_size(local_size);
        for &scalar in scalars {
            match scalar {
                "direction" => builder.arg_named(scalar, ASCENDING),
                _ => builder.arg_named(scalar, 0u32),
            };
        }
        builder.build()
    };
    let init = kernel("bsort_init", &[])?;
    let stage_n = kernel("bsort_stage_n", &["stage", "high_stage"])?;
    let stage_0 = kernel("bsort_stage_0", &["high_stage"])?;
    let merge = kernel("bsort_merge", &["stage", "direction"])?;
    let merge_last = kernel("bsort_merge_last", &["direction"])?;

    let start = Instant::now();
    init.enq()?;
    let launches = patterns::run_stages(StageSchedule::bitonic(num_stages)?, |stage| {
        match stage {
            Stage::Inner { stage, high_stage } => {
                stage_n.set_arg("stage", stage)?;
                stage_n.set_arg("high_stage", high_stage)?;
                stage_n.enq()
            },
            Stage::Outer { high_stage } => {
                stage_0.set_arg("high_stage", high_stage)?;
                stage_0.enq()
            },
            Stage::Merge { stage } => {
                merge.set_arg("stage", stage)?;
                merge.enq()
            },
            Stage::MergeLast => merge_last.enq(),
            other => Err(format!("not a sorting stage: {:?}", other).into()),
        }
    })?;

    let mut sorted = vec![0.0f32; NUM_FLOATS];
    buffer.read(&mut sorted).enq()?;
    println!("{} launches completed in {:?}.", launches + 1, start.elapsed());

    if let Some(i) = (1..NUM_FLOATS).find(|&i| sorted[i] < sorted[i - 1]) {
        return Err(format!("elements {} and {} are out of order: {} > {}", i - 1, i,
            sorted[i - 1], sorted[i]).into());
    }
    println!("Sorted.");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = sort() {
        println!("{}", err);
        std::process::exit(1);
    }
}
