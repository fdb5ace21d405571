//! Image kernels: sampling at arbitrary coordinates and a box filter.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void image_sample(__read_only image2d_t src, sampler_t sampler,
            __global float2* coords, __global float4* out) {
        int i = get_global_id(0);
        out[i] = read_imagef(src, sampler, coords[i]);
    }

    __kernel void texture_filter(__read_only image2d_t src, sampler_t sampler,
            __write_only image2d_t dst) {
        int2 coord = (int2)(get_global_id(0), get_global_id(1));
        float4 sum = (float4)(0.0f);
        for(int dy = -1; dy <= 1; dy++) {
            for(int dx = -1; dx <= 1; dx++) {
                sum += read_imagef(src, sampler, coord + (int2)(dx, dy));
            }
        }
        write_imagef(dst, coord, sum / 9.0f);
    }
"#;

/// `out[i] = read_imagef(src, sampler, coords[i])`
pub fn image_sample(group: &WorkGroup) -> Result<()> {
    let src = group.image(0)?;
    let sampler = group.sampler(1)?;
    let coords = group.global::<[f32; 2]>(2)?;
    let out = group.global::<[f32; 4]>(3)?;

    for item in group.items() {
        let i = item.global_id[0];
        out[i].set(src.read_imagef(&sampler, coords[i].get()));
    }
    Ok(())
}

/// A 3x3 box filter sampled at texel centers.
pub fn texture_filter(group: &WorkGroup) -> Result<()> {
    let src = group.image(0)?;
    let sampler = group.sampler(1)?;
    let dst = group.image(2)?;

    for item in group.items() {
        let (x, y) = (item.global_id[0] as i32, item.global_id[1] as i32);
        let mut sum = [0.0f32; 4];
        for dy in -1..=1 {
            for dx in -1..=1 {
                let texel = src.read_imagef(&sampler, [(x + dx) as f32 + 0.5,
                    (y + dy) as f32 + 0.5]);
                for (s, t) in sum.iter_mut().zip(texel.iter()) {
                    *s += t;
                }
            }
        }
        dst.write_imagef([x, y], [sum[0] / 9.0, sum[1] / 9.0, sum[2] / 9.0, sum[3] / 9.0]);
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("image_sample", image_sample)
        .with("texture_filter", texture_filter)
}
