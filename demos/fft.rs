//! A 65536-point FFT driven in stages by the host, checked against direct
//! evaluation of sampled bins and by the inverse transform. Follows with a
//! 256-point real-valued DFT of a rectangle.

use std::path::PathBuf;
use std::time::Instant;
use find_folder::Search;
use ocl_harness::enums::{DeviceInfo, DeviceInfoResult};
use ocl_harness::patterns::{self, largest_pow2_at_most, Stage, StageSchedule};
use ocl_harness::{Buffer, ProQue, Result};
use harness_extras::kernels::fft;

const NUM_POINTS: usize = 65536;
const RDFT_POINTS: usize = 256;
const SAMPLED_BINS: usize = 64;
const TOLERANCE: f64 = 1.0e-3;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

/// Transforms `input` into `output`, returning the number of launches.
fn transform(pro_que: &ProQue, input: &Buffer<[f32; 2]>, output: &Buffer<[f32; 2]>,
        points_per_group: usize, local_size: usize, direction: i32) -> Result<usize> {
    let num_groups = input.len() / points_per_group;
    let init = pro_que.kernel_builder("fft_init")
        .arg(input)
        .arg(output)
        .arg_local::<[f32; 2]>(points_per_group)
        .arg(points_per_group as u32)
        .arg(direction)
        .local_work_size(local_size)
        .build()?;
    let stage_kernel = pro_que.kernel_builder("fft_stage")
        .arg(output)
        .arg_named("stage", 0u32)
        .arg(points_per_group as u32)
        .arg(direction)
        .local_work_size(local_size)
        .build()?;

    init.enq()?;
    let stages = patterns::run_stages(StageSchedule::fft(num_groups as u32)?, |stage| {
        match stage {
            Stage::Butterfly { stage } => {
                stage_kernel.set_arg("stage", stage)?;
                stage_kernel.enq()
            },
            other => Err(format!("not an FFT stage: {:?}", other).into()),
        }
    })?;

    if direction == fft::INVERSE {
        pro_que.kernel_builder("fft_scale")
            .arg(output)
            .arg(points_per_group as u32)
            .arg(input.len() as u32)
            .local_work_size(local_size)
            .build()?
            .enq()?;
        return Ok(stages + 2);
    }
    Ok(stages + 1)
}

fn staged_fft(pro_que: &ProQue, points_per_group: usize, local_size: usize) -> Result<()> {
    let input = harness_extras::scrambled_vec((0.0f32, 1.0), NUM_POINTS * 2);
    let input: Vec<[f32; 2]> = input.chunks(2).map(|c| [c[0], c[1]]).collect();
    let points: Vec<[f64; 2]> = input.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();

    let input_buf = pro_que.buffer_builder::<[f32; 2]>()
        .len(NUM_POINTS)
        .copy_host_slice(&input)
        .build()?;
    let spectrum_buf = pro_que.buffer_builder::<[f32; 2]>().len(NUM_POINTS).build()?;
    let restored_buf = pro_que.buffer_builder::<[f32; 2]>().len(NUM_POINTS).build()?;

    let start = Instant::now();
    let launches = transform(pro_que, &input_buf, &spectrum_buf, points_per_group, local_size,
        fft::FORWARD)?;
    let mut spectrum = vec![[0.0f32; 2]; NUM_POINTS];
    spectrum_buf.read(&mut spectrum).enq()?;
    println!("{}-point FFT: {} launches in {:?}.", NUM_POINTS, launches, start.elapsed());

    let bins: Vec<usize> = (0..SAMPLED_BINS).map(|i| i * (NUM_POINTS / SAMPLED_BINS) + i)
        .collect();
    let found: Vec<[f32; 2]> = bins.iter().map(|&k| spectrum[k]).collect();
    let expected: Vec<[f64; 2]> = bins.iter()
        .map(|&k| fft::dft_bin(&points, k, fft::FORWARD))
        .collect();
    let error = fft::max_error(&found, &expected);
    println!("FFT completed with {:.2e} relative error over {} sampled bins.", error,
        SAMPLED_BINS);
    if error > TOLERANCE {
        return Err("the forward transform is outside tolerance".into());
    }

    transform(pro_que, &spectrum_buf, &restored_buf, points_per_group, local_size,
        fft::INVERSE)?;
    let mut restored = vec![[0.0f32; 2]; NUM_POINTS];
    restored_buf.read(&mut restored).enq()?;
    let error = fft::max_error(&restored, &points);
    println!("IFFT completed with {:.2e} relative error.", error);
    if error > TOLERANCE {
        return Err("the inverse transform does not restore the input".into());
    }
    Ok(())
}

fn real_dft(pro_que: &ProQue) -> Result<()> {
    let input: Vec<f32> = (0..RDFT_POINTS)
        .map(|i| if i < RDFT_POINTS / 4 { 1.0 } else { 0.0 })
        .collect();
    let buffer = pro_que.buffer_builder::<f32>()
        .len(RDFT_POINTS)
        .copy_host_slice(&input)
        .build()?;

    let work_items = RDFT_POINTS / 2 + 1;
    pro_que.kernel_builder("rdft")
        .arg(&buffer)
        .global_work_size(work_items)
        .local_work_size(work_items)
        .build()?
        .enq()?;

    let mut out = vec![0.0f32; RDFT_POINTS];
    buffer.read(&mut out).enq()?;

    let points: Vec<[f64; 2]> = input.iter().map(|&x| [x as f64, 0.0]).collect();
    let bin = |k| fft::dft_bin(&points, k, fft::FORWARD);
    let mut worst = (out[0] as f64 - bin(0)[0]).abs()
        .max((out[1] as f64 - bin(RDFT_POINTS / 2)[0]).abs());
    for k in 1..RDFT_POINTS / 2 {
        worst = worst.max((out[2 * k] as f64 - bin(k)[0]).abs())
            .max((out[2 * k + 1] as f64 - bin(k)[1]).abs());
    }
    if worst > TOLERANCE {
        return Err(format!("real-valued DFT check failed (error {:.2e})", worst).into());
    }
    println!("Real-valued DFT check succeeded.");
    Ok(())
}

fn fft_demo() -> Result<()> {
    let mut pro_que = ProQue::builder()
        .src_file(kernel_file("fft.cl")?)
        .kernels(fft::library())
        .build()?;

    let local_mem = match pro_que.device().info(DeviceInfo::LocalMemSize)? {
        DeviceInfoResult::LocalMemSize(size) => size as usize,
        other => return Err(format!("unexpected device info: {}", other).into()),
    };
    let points_per_group = largest_pow2_at_most(local_mem / 8).min(NUM_POINTS);
    let local_size = largest_pow2_at_most(pro_que.max_wg_size()?);
    let num_groups = NUM_POINTS / points_per_group;
    println!("Device: {}, {} points per group, {} groups of {} work-items.",
        pro_que.device().name()?, points_per_group, num_groups, local_size);

    pro_que.set_dims(num_groups * local_size);
    staged_fft(&pro_que, points_per_group, local_size)?;
    real_dft(&pro_que)
}

fn main() {
    env_logger::init();
    if let Err(err) = fft_demo() {
        println!("{}", err);
        std::process::exit(1);
    }
}
