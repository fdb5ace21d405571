//! Transposes a 64x64 matrix in place, then multiplies two 32x32 matrices
//! by transposing the second and taking dot products of rows.

use std::path::PathBuf;
use find_folder::Search;
use ocl_harness::flags::MemFlags;
use ocl_harness::{ProQue, Result};
use harness_extras::kernels::matrix;

const TRANSPOSE_DIM: usize = 64;
const MULT_DIM: usize = 32;
const TOLERANCE: f32 = 0.01;

fn kernel_file(name: &str) -> Result<PathBuf> {
    let demos = Search::ParentsThenKids(3, 3).for_folder("demos")
        .map_err(|err| format!("unable to locate the demos folder: {:?}", err))?;
    Ok(demos.join("kernels").join(name))
}

/// Number of work-items which cover the 4x4 blocks on and above the
/// diagonal of a `dim * dim` matrix.
fn transpose_items(dim: usize) -> usize {
    let size = dim / 4;
    size * (size + 1) / 2
}

fn transpose(pro_que: &ProQue) -> Result<()> {
    let dim = TRANSPOSE_DIM;
    let data: Vec<f32> = (0..dim * dim).map(|i| i as f32).collect();
    let buffer = pro_que.buffer_builder::<[f32; 4]>()
        .len(dim * dim / 4)
        .copy_host_slice(&matrix::to_vec4s(&data))
        .build()?;

    pro_que.kernel_builder("transpose")
        .arg(&buffer)
        .arg((dim / 4) as u32)
        .global_work_size(transpose_items(dim))
        .build()?
        .enq()?;

    let mut out = vec![[0.0f32; 4]; dim * dim / 4];
    buffer.read(&mut out).enq()?;
    let out: Vec<f32> = out.iter().flat_map(|v| v.iter().cloned()).collect();
    for i in 0..dim {
        for j in 0..dim {
            if out[i * dim + j] != (j * dim + i) as f32 {
                return Err(format!("transpose check failed at ({}, {})", i, j).into());
            }
        }
    }
    println!("Transpose check succeeded.");
    Ok(())
}

fn multiply(pro_que: &ProQue) -> Result<()> {
    let dim = MULT_DIM;
    let a = harness_extras::scrambled_vec((0.0f32, 1.0), dim * dim);
    let b = harness_extras::scrambled_vec((0.0f32, 1.0), dim * dim);

    let a_buf = pro_que.buffer_builder::<[f32; 4]>()
        .flags(MemFlags::new().read_only())
        .len(dim * dim / 4)
        .copy_host_slice(&matrix::to_vec4s(&a))
        .build()?;
    let b_buf = pro_que.buffer_builder::<[f32; 4]>()
        .len(dim * dim / 4)
        .copy_host_slice(&matrix::to_vec4s(&b))
        .build()?;
    let c_buf = pro_que.buffer_builder::<f32>()
        .flags(MemFlags::new().write_only())
        .len(dim * dim)
        .build()?;

    pro_que.kernel_builder("transpose")
        .arg(&b_buf)
        .arg((dim / 4) as u32)
        .global_work_size(transpose_items(dim))
        .build()?
        .enq()?;
    pro_que.kernel_builder("matrix_mult")
        .arg(&a_buf)
        .arg(&b_buf)
        .arg(&c_buf)
        .global_work_size(dim)
        .build()?
        .enq()?;

    let mut c = vec![0.0f32; dim * dim];
    c_buf.read(&mut c).enq()?;
    let expected = matrix::mult_on_host(&a, &b, dim);
    if let Some(i) = (0..dim * dim).find(|&i| (c[i] - expected[i]).abs() > TOLERANCE) {
        return Err(format!("multiplication check failed at ({}, {}): {} != {}", i / dim,
            i % dim, c[i], expected[i]).into());
    }
    println!("Multiplication check succeeded.");
    Ok(())
}

fn matrix_demo() -> Result<()> {
    let pro_que = ProQue::builder()
        .src_file(kernel_file("matrix.cl")?)
        .kernels(matrix::library())
        .build()?;
    transpose(&pro_que)?;
    multiply(&pro_que)
}

fn main() {
    env_logger::init();
    if let Err(err) = matrix_demo() {
        println!("{}", err);
        std::process::exit(1);
    }
}
