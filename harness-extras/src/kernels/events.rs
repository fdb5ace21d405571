//! Small kernels used to demonstrate events, callbacks, and profiling.

use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void user_event(__global float4* v) {
        v[get_global_id(0)] *= -1.0f;
    }

    __kernel void blank(__global float* a, __global float* b) {
    }

    __kernel void profile_items(__global int4* x, int num_ints) {
        int num_vectors = num_ints/(4 * get_global_size(0));
        x += get_global_id(0) * num_vectors;
        for(int i=0; i<num_vectors; i++) {
            x[i] *= -1;
        }
    }

    __kernel void profile_read(__global uchar16* c, int num) {
        for(int i=0; i<num; i++) {
            c[i] = (uchar16)(5);
        }
    }
"#;

/// Negates every lane of every vector.
pub fn user_event(group: &WorkGroup) -> Result<()> {
    let v = group.global::<[f32; 4]>(0)?;
    for item in group.items() {
        let cell = &v[item.global_id[0]];
        let x = cell.get();
        cell.set([-x[0], -x[1], -x[2], -x[3]]);
    }
    Ok(())
}

/// Does nothing. Used where only the command's events matter.
pub fn blank(_group: &WorkGroup) -> Result<()> {
    Ok(())
}

/// Each work-item negates its share of `num_ints` integers.
pub fn profile_items(group: &WorkGroup) -> Result<()> {
    let x = group.global::<[i32; 4]>(0)?;
    let num_ints = group.scalar::<i32>(1)?.max(0) as usize;
    let num_vectors = num_ints / (4 * group.global_size(0));

    for item in group.items() {
        let start = item.global_id[0] * num_vectors;
        for cell in x.iter().skip(start).take(num_vectors) {
            let v = cell.get();
            cell.set([-v[0], -v[1], -v[2], -v[3]]);
        }
    }
    Ok(())
}

/// Fills the first `num` vectors with fives.
pub fn profile_read(group: &WorkGroup) -> Result<()> {
    let c = group.global::<[u8; 16]>(0)?;
    let num = group.scalar::<i32>(1)?.max(0) as usize;
    for cell in c.iter().take(num) {
        cell.set([5u8; 16]);
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("user_event", user_event)
        .with("blank", blank)
        .with("profile_items", profile_items)
        .with("profile_read", profile_read)
}
