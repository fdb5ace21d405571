//! Tests of the free function API against the software runtime.
//!
//! Higher level behavior (the standard types, patterns, async mapping) is
//! tested in `ocl-harness`.

#![allow(dead_code)]

mod buffer_copy;
mod buffer_ops_rect;
mod build_error;
mod discovery;
mod events;
mod kernel_arg;
mod sub_buffer;

use crate::error::Result;
use crate::{
    CommandQueue, CommandQueueProperties, Context, ContextProperties, DeviceId, DeviceInfo,
    DeviceInfoResult, KernelLibrary, OclScl, Program, WorkGroup,
};

/// Returns one context for each available device on each platform.
pub fn get_available_contexts() -> Vec<(DeviceId, Context)> {
    let mut contexts = Vec::with_capacity(4);

    for platform in crate::get_platform_ids().unwrap() {
        for device in crate::get_device_ids(&platform, None).unwrap() {
            match crate::get_device_info(&device, DeviceInfo::Available).unwrap() {
                DeviceInfoResult::Available(r) => if !r { continue; },
                _ => unreachable!(),
            }

            let context_properties = ContextProperties::new().platform(platform.clone());
            let context = crate::create_context(Some(&context_properties), &[device.clone()])
                .unwrap();

            contexts.push((device, context));
        }
    }

    contexts
}

/// Returns a context and queue on the first device of the first platform.
pub fn default_queue(properties: Option<CommandQueueProperties>)
        -> (DeviceId, Context, CommandQueue) {
    let platform = crate::get_platform_ids().unwrap().remove(0);
    let device = crate::get_device_ids(&platform, None).unwrap().remove(0);
    let context_properties = ContextProperties::new().platform(platform);
    let context = crate::create_context(Some(&context_properties), &[device.clone()]).unwrap();
    let queue = crate::create_command_queue(&context, &device, properties).unwrap();
    (device, context, queue)
}

/// `buffer[i] += addend`
pub fn add(group: &WorkGroup) -> Result<()> {
    let buffer = group.global::<f32>(0)?;
    let addend = group.scalar::<f32>(1)?;
    for item in group.items() {
        let cell = &buffer[item.global_id[0]];
        cell.set(cell.get() + addend);
    }
    Ok(())
}

/// `dst[i] = src[i]`
pub fn copy_u32(group: &WorkGroup) -> Result<()> {
    let src = group.global::<u32>(0)?;
    let dst = group.global::<u32>(1)?;
    for item in group.items() {
        let i = item.global_id[0];
        dst[i].set(src[i].get());
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("add", add)
        .with("copy_u32", copy_u32)
}

pub const ADD_SRC: &str = r#"
    __kernel void add(__global float* buffer, float addend) {
        buffer[get_global_id(0)] += addend;
    }
"#;

pub const COPY_SRC: &str = r#"
    __kernel void copy_u32(__global const uint* src, __global uint* dst) {
        dst[get_global_id(0)] = src[get_global_id(0)];
    }
"#;

/// Creates and builds a program from one source string.
pub fn build(context: &Context, src: &str) -> Result<Program> {
    let program = crate::create_program_with_source(context, &[src.to_owned()], &library())?;
    crate::build_program(&program, None, "")?;
    Ok(program)
}

pub fn within_region(coords: [usize; 3], region_ofs: [usize; 3], region_size: [usize; 3])
        -> bool {
    (0..3).all(|i| coords[i] >= region_ofs[i] && coords[i] < region_ofs[i] + region_size[i])
}

/// Checks that every element inside the region holds `in_region_val` and
/// every element outside holds `out_region_val`.
pub fn verify_vec_rect<T: OclScl>(origin: [usize; 3], region: [usize; 3], in_region_val: T,
        out_region_val: T, vec_dims: [usize; 3], vec: &[T]) -> std::result::Result<(), String> {
    for z in 0..vec_dims[2] {
        for y in 0..vec_dims[1] {
            for x in 0..vec_dims[0] {
                let idx = (z * vec_dims[1] * vec_dims[0]) + (y * vec_dims[0]) + x;
                let expected = if within_region([x, y, z], origin, region) {
                    in_region_val
                } else {
                    out_region_val
                };
                if vec[idx] != expected {
                    return Err(format!("vec[{}] ({:?}) should be '{}' but is '{}'", idx,
                        [x, y, z], expected, vec[idx]));
                }
            }
        }
    }
    Ok(())
}
