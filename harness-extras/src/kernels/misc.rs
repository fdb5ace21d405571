//! General purpose kernels: arithmetic, index stamping, and work-group
//! inspection.

use std::thread;
use std::time::Duration;
use crate::core::{KernelLibrary, Result, WorkGroup};

pub const SRC: &str = r#"
    __kernel void add(__global float* buffer, float addend) {
        buffer[get_global_id(0)] += addend;
    }

    __kernel void multiply(__global float* buffer, float coeff) {
        buffer[get_global_id(0)] *= coeff;
    }

    __kernel void add_u32(__global uint* buffer, uint addend) {
        buffer[get_global_id(0)] += addend;
    }

    __kernel void stamp_index(__global uint* out) {
        out[get_global_id(0)] = get_global_id(0);
    }

    __kernel void append_tag(__global uint* log, __global uint* cursor, uint tag,
            uint delay_ms) {
        /* Sleeps 'delay_ms', then appends 'tag' to 'log'. */
    }

    __kernel void wg_test(__global float* output) {
        int global_id = get_global_id(0) * get_global_size(1) + get_global_id(1);
        int local_id = get_local_id(0) * get_local_size(1) + get_local_id(1);
        int group_id = get_group_id(0) * get_num_groups(1) + get_group_id(1);
        output[global_id] = (float)(group_id * 100 + local_id);
    }
"#;

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

/// `buffer[i] *= coeff`
pub fn multiply(group: &WorkGroup) -> Result<()> {
    let buffer = group.global::<f32>(0)?;
    let coeff = group.scalar::<f32>(1)?;
    for item in group.items() {
        let cell = &buffer[item.global_id[0]];
        cell.set(cell.get() * coeff);
    }
    Ok(())
}

/// `buffer[i] += addend` over unsigned integers, wrapping.
pub fn add_u32(group: &WorkGroup) -> Result<()> {
    let buffer = group.global::<u32>(0)?;
    let addend = group.scalar::<u32>(1)?;
    for item in group.items() {
        let cell = &buffer[item.global_id[0]];
        cell.set(cell.get().wrapping_add(addend));
    }
    Ok(())
}

/// `out[i] = i`
pub fn stamp_index(group: &WorkGroup) -> Result<()> {
    let out = group.global::<u32>(0)?;
    for item in group.items() {
        out[item.global_id[0]].set(item.global_id[0] as u32);
    }
    Ok(())
}

/// Sleeps, then records `tag` at `log[cursor[0]]` and advances the cursor.
///
/// Launched as a single task, the order of the tags in `log` is the order
/// in which launches ran.
pub fn append_tag(group: &WorkGroup) -> Result<()> {
    let log = group.global::<u32>(0)?;
    let cursor = group.global::<u32>(1)?;
    let tag = group.scalar::<u32>(2)?;
    let delay_ms = group.scalar::<u32>(3)?;

    thread::sleep(Duration::from_millis(delay_ms as u64));
    let pos = cursor[0].get() as usize;
    match log.get(pos) {
        Some(slot) => slot.set(tag),
        None => return Err(format!("append_tag: log is full ({} entries)", log.len()).into()),
    }
    cursor[0].set(pos as u32 + 1);
    Ok(())
}

/// Writes `group_id * 100 + local_id` for each work-item of a two
/// dimensional launch.
pub fn wg_test(group: &WorkGroup) -> Result<()> {
    let output = group.global::<f32>(0)?;
    let group_id = group.group_id(0) * group.num_groups(1) + group.group_id(1);
    for item in group.items() {
        let global_id = item.global_id[0] * group.global_size(1) + item.global_id[1];
        let local_id = item.local_id[0] * group.local_size(1) + item.local_id[1];
        output[global_id].set((group_id * 100 + local_id) as f32);
    }
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("add", add)
        .with("multiply", multiply)
        .with("add_u32", add_u32)
        .with("stamp_index", stamp_index)
        .with("append_tag", append_tag)
        .with("wg_test", wg_test)
}
