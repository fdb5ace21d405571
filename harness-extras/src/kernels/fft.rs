//! Radix-2 fast Fourier transforms of `float2` points (real, imaginary) and
//! a direct real-valued DFT.
//!
//! The host drives the staged transform in this order (see
//! `ocl_harness::patterns::StageSchedule::fft`):
//!
//! 1. `fft_init` reads the input in bit-reversed order and transforms each
//!    block of `points_per_group` points in local memory.
//! 2. One `fft_stage` per `stage` doubling from 2 to the number of blocks
//!    combines pairs of transforms `stage / 2` blocks apart.
//! 3. For an inverse transform, `fft_scale` divides every point by the
//!    number of points.
//!
//! A `direction` of 1 is a forward transform, -1 an inverse one.

use std::cell::Cell;
use std::f64::consts::PI;
use crate::core::{KernelLibrary, Result, WorkGroup};

pub const FORWARD: i32 = 1;
pub const INVERSE: i32 = -1;

pub const SRC: &str = r#"
    __kernel void fft_init(__global float2* input, __global float2* output,
            __local float2* l_data, uint points_per_group, int direction) {
        /* Loads one block in bit-reversed order and runs its butterflies. */
    }

    __kernel void fft_stage(__global float2* g_data, uint stage,
            uint points_per_group, int direction) {
        /* Combines transforms which lie (stage / 2) blocks apart. */
    }

    __kernel void fft_scale(__global float2* g_data, uint points_per_group,
            uint num_points) {
        /* Divides every point by 'num_points'. */
    }

    __kernel void rdft(__global float* data) {
        /* Work-item k computes bin k of a real-valued input and stores the
           result packed: data[0] holds bin 0, data[1] holds bin N/2 and
           data[2k], data[2k + 1] hold the real and imaginary parts of
           bin k. */
    }
"#;

fn bit_reverse(idx: usize, bits: u32) -> usize {
    match bits {
        0 => 0,
        bits => idx.reverse_bits() >> (usize::BITS - bits),
    }
}

/// The twiddle factor `exp(-direction * 2 pi i * k / n)`.
fn twiddle(k: usize, n: usize, direction: i32) -> [f64; 2] {
    let angle = -(direction as f64) * 2.0 * PI * k as f64 / n as f64;
    [angle.cos(), angle.sin()]
}

/// Combines `a` and `b` in place: `a + w * b` and `a - w * b`.
fn butterfly(a: &Cell<[f32; 2]>, b: &Cell<[f32; 2]>, w: [f64; 2]) {
    let (x, y) = (a.get(), b.get());
    let (yr, yi) = (y[0] as f64, y[1] as f64);
    let t = [w[0] * yr - w[1] * yi, w[0] * yi + w[1] * yr];
    a.set([(x[0] as f64 + t[0]) as f32, (x[1] as f64 + t[1]) as f32]);
    b.set([(x[0] as f64 - t[0]) as f32, (x[1] as f64 - t[1]) as f32]);
}

/// Runs every butterfly with a span of `span` over `data`.
fn butterflies(data: &[Cell<[f32; 2]>], span: usize, direction: i32) {
    for base in (0..data.len()).step_by(2 * span) {
        for k in 0..span {
            butterfly(&data[base + k], &data[base + k + span], twiddle(k, 2 * span, direction));
        }
    }
}

fn check_sizes(num_points: usize, points_per_group: usize) -> Result<()> {
    if !num_points.is_power_of_two() || !points_per_group.is_power_of_two()
            || points_per_group > num_points {
        return Err(format!("fft: {} points in blocks of {} are not powers of two which \
            divide evenly", num_points, points_per_group).into());
    }
    Ok(())
}

pub fn fft_init(group: &WorkGroup) -> Result<()> {
    let input = group.global::<[f32; 2]>(0)?;
    let output = group.global::<[f32; 2]>(1)?;
    let l_data = group.local::<[f32; 2]>(2)?;
    let points_per_group = group.scalar::<u32>(3)? as usize;
    let direction = group.scalar::<i32>(4)?;

    let num_points = input.len();
    check_sizes(num_points, points_per_group)?;
    if l_data.len() < points_per_group {
        return Err(format!("fft_init: local memory holds {} points, {} required",
            l_data.len(), points_per_group).into());
    }
    let start = group.group_id(0) * points_per_group;
    if start + points_per_group > output.len() {
        return Ok(());
    }

    let bits = num_points.trailing_zeros();
    let block = &l_data[..points_per_group];
    for (j, point) in block.iter().enumerate() {
        point.set(input[bit_reverse(start + j, bits)].get());
    }
    let mut span = 1;
    while span < points_per_group {
        butterflies(block, span, direction);
        span <<= 1;
    }
    for (j, point) in block.iter().enumerate() {
        output[start + j].set(point.get());
    }
    Ok(())
}

pub fn fft_stage(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<[f32; 2]>(0)?;
    let stage = group.scalar::<u32>(1)? as usize;
    let points_per_group = group.scalar::<u32>(2)? as usize;
    let direction = group.scalar::<i32>(3)?;

    let num_points = g_data.len();
    check_sizes(num_points, points_per_group)?;
    let span = (stage / 2) * points_per_group;
    if span == 0 || 2 * span > num_points {
        return Err(format!("fft_stage: stage {} is out of range for {} points", stage,
            num_points).into());
    }

    let global_size = group.global_size(0);
    for item in group.items() {
        for b in (item.global_id[0]..num_points / 2).step_by(global_size) {
            let k = b % span;
            let i = (b / span) * 2 * span + k;
            butterfly(&g_data[i], &g_data[i + span], twiddle(k, 2 * span, direction));
        }
    }
    Ok(())
}

pub fn fft_scale(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<[f32; 2]>(0)?;
    let num_points = group.scalar::<u32>(2)? as usize;
    if num_points == 0 {
        return Err("fft_scale: 'num_points' is zero".into());
    }
    let scale = 1.0 / num_points as f32;

    let global_size = group.global_size(0);
    for item in group.items() {
        for i in (item.global_id[0]..g_data.len().min(num_points)).step_by(global_size) {
            let p = g_data[i].get();
            g_data[i].set([p[0] * scale, p[1] * scale]);
        }
    }
    Ok(())
}

pub fn rdft(group: &WorkGroup) -> Result<()> {
    let data = group.global::<f32>(0)?;
    let n = data.len();
    if n < 2 || n % 2 != 0 {
        return Err(format!("rdft: {} points is not a positive even count", n).into());
    }
    let input: Vec<[f64; 2]> = data.iter().map(|c| [c.get() as f64, 0.0]).collect();

    for item in group.items() {
        let k = item.global_id[0];
        if k > n / 2 {
            continue;
        }
        let bin = dft_bin(&input, k, FORWARD);
        match k {
            0 => data[0].set(bin[0] as f32),
            k if k == n / 2 => data[1].set(bin[0] as f32),
            k => {
                data[2 * k].set(bin[0] as f32);
                data[2 * k + 1].set(bin[1] as f32);
            },
        }
    }
    Ok(())
}

/// Bin `k` of the discrete Fourier transform of `points`, computed
/// directly.
pub fn dft_bin(points: &[[f64; 2]], k: usize, direction: i32) -> [f64; 2] {
    let n = points.len();
    points.iter().enumerate().fold([0.0, 0.0], |acc, (j, p)| {
        let w = twiddle((j * k) % n, n, direction);
        [acc[0] + p[0] * w[0] - p[1] * w[1], acc[1] + p[0] * w[1] + p[1] * w[0]]
    })
}

/// Largest component error of `found` against `expected`, relative to the
/// largest expected magnitude.
pub fn max_error(found: &[[f32; 2]], expected: &[[f64; 2]]) -> f64 {
    let scale = expected.iter().flat_map(|e| e.iter()).fold(1.0e-12f64, |m, c| m.max(c.abs()));
    found.iter().zip(expected)
        .flat_map(|(f, e)| (0..2).map(move |c| (f[c] as f64 - e[c]).abs()))
        .fold(0.0, f64::max) / scale
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("fft_init", fft_init)
        .with("fft_stage", fft_stage)
        .with("fft_scale", fft_scale)
        .with("rdft", rdft)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_reversal() {
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(6, 3), 3);
        assert_eq!(bit_reverse(0, 0), 0);
    }

    #[test]
    fn dft_of_an_impulse_is_flat() {
        let mut points = vec![[0.0f64; 2]; 8];
        points[0] = [1.0, 0.0];
        for k in 0..8 {
            let bin = dft_bin(&points, k, FORWARD);
            assert!((bin[0] - 1.0).abs() < 1.0e-12 && bin[1].abs() < 1.0e-12);
        }
    }
}
