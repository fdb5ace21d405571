//! Sums 2^20 floats with a work-group reduction, once with scalar and once
//! with four-wide vector elements, and compares both to the closed form.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::patterns::{self, largest_pow2_at_most};
use ocl_harness::{ProQue, Result};
use harness_extras::kernels::reduction;

const ARRAY_SIZE: usize = 1 << 20;
const TOLERANCE: f64 = 0.01;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

fn check(label: &str, sum: f64) -> Result<()> {
    let n = ARRAY_SIZE as f64;
    let expected = n * (n - 1.0) / 2.0;
    let error = (sum - expected).abs() / expected;
    println!("{}: sum = {}, expected = {}, relative error = {:.2e}", label, sum, expected, error);
    if error > TOLERANCE {
        return Err(format!("{}: sum is outside tolerance", label).into());
    }
    Ok(())
}

fn reduce() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("reduction.cl")?)
        .kernels(reduction::library())
        .dims(ARRAY_SIZE)
        .build()?;

    let local_size = largest_pow2_at_most(pro_que.max_wg_size()?);
    println!("Device: {}, local size: {}", pro_que.device().name()?, local_size);

    let data: Vec<f32> = (0..ARRAY_SIZE).map(|i| i as f32).collect();
    let input = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build()?;
    let sum = patterns::reduce(&pro_que, "reduction_scalar", &input, local_size, 0.0f32,
        |a, b| a + b)?;
    check("scalar", sum as f64)?;

    let vectors: Vec<[f32; 4]> = data.chunks(4).map(|c| [c[0], c[1], c[2], c[3]]).collect();
    let input = pro_que.buffer_builder::<[f32; 4]>()
        .len(vectors.len())
        .copy_host_slice(&vectors)
        .build()?;
    let local_size = local_size.min(vectors.len());
    let sum = patterns::reduce(&pro_que, "reduction_vector", &input, local_size, [0.0f32; 4],
        |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]])?;
    check("vector", sum.iter().map(|&s| s as f64).sum())?;

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = reduce() {
        println!("{}", err);
        std::process::exit(1);
    }
}
