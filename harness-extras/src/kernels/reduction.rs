//! Work-group reductions producing one partial sum per group.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void reduction_scalar(__global float* data,
            __local float* partial_sums, __global float* output) {

        int lid = get_local_id(0);
        int group_size = get_local_size(0);

        partial_sums[lid] = data[get_global_id(0)];
        barrier(CLK_LOCAL_MEM_FENCE);

        for(int i = group_size/2; i>0; i >>= 1) {
            if(lid < i) {
                partial_sums[lid] += partial_sums[lid + i];
            }
            barrier(CLK_LOCAL_MEM_FENCE);
        }

        if(lid == 0) {
            output[get_group_id(0)] = partial_sums[0];
        }
    }

    __kernel void reduction_vector(__global float4* data,
            __local float4* partial_sums, __global float4* output) {

        int lid = get_local_id(0);
        int group_size = get_local_size(0);

        partial_sums[lid] = data[get_global_id(0)];
        barrier(CLK_LOCAL_MEM_FENCE);

        for(int i = group_size/2; i>0; i >>= 1) {
            if(lid < i) {
                partial_sums[lid] += partial_sums[lid + i];
            }
            barrier(CLK_LOCAL_MEM_FENCE);
        }

        if(lid == 0) {
            output[get_group_id(0)] = partial_sums[0];
        }
    }
"#;

/// Tree reduction of one work-group in local memory.
///
/// The group size must be a power of two.
fn reduce_group<T, F>(group: &WorkGroup, add: F) -> Result<()>
        where T: crate::core::OclPrm, F: Fn(T, T) -> T {
    let data = group.global::<T>(0)?;
    let partial_sums = group.local::<T>(1)?;
    let output = group.global::<T>(2)?;

    for item in group.items() {
        partial_sums[item.local_linear].set(data[item.global_id[0]].get());
    }

    let mut stride = group.local_size(0) / 2;
    while stride > 0 {
        for item in group.items().take(stride) {
            let lid = item.local_linear;
            partial_sums[lid].set(add(partial_sums[lid].get(), partial_sums[lid + stride].get()));
        }
        stride >>= 1;
    }

    output[group.group_id(0)].set(partial_sums[0].get());
    Ok(())
}

pub fn reduction_scalar(group: &WorkGroup) -> Result<()> {
    reduce_group::<f32, _>(group, |a, b| a + b)
}

pub fn reduction_vector(group: &WorkGroup) -> Result<()> {
    reduce_group::<[f32; 4], _>(group, |a, b| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]])
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("reduction_scalar", reduction_scalar)
        .with("reduction_vector", reduction_vector)
}
