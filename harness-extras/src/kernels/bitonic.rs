//! A staged bitonic sort of `float`s.
//!
//! Each work-item owns eight consecutive elements, so one work-group sorts a
//! block of `8 * local_size` elements in local memory. The host drives the
//! kernels in this order (see `ocl_harness::patterns::StageSchedule`):
//!
//! 1. `bsort_init` sorts every block, alternating direction by group.
//! 2. For each `high_stage` doubling from 2 below the group count, one
//!    `bsort_stage_n` per `stage` halving from `high_stage` to 2, then one
//!    `bsort_stage_0`.
//! 3. One `bsort_merge` per `stage` halving from the group count to 2, then
//!    `bsort_merge_last`.
//!
//! A `direction` of zero sorts ascending.

use std::cell::Cell;
use crate::core::{KernelLibrary, Result, WorkGroup};

/// Elements owned by each work-item.
pub const ELEMENTS_PER_ITEM: usize = 8;

pub const SRC: &str = r#"
    #define UP 0
    #define DOWN -1

    __kernel void bsort_init(__global float* g_data, __local float* l_data) {
        /* Sorts 8 * get_local_size(0) elements in local memory. */
    }

    __kernel void bsort_stage_n(__global float* g_data, __local float* l_data,
            uint stage, uint high_stage) {
        /* Compares elements which lie (stage / 2) blocks apart. */
    }

    __kernel void bsort_stage_0(__global float* g_data, __local float* l_data,
            uint high_stage) {
        /* Finishes a sorting phase within each block. */
    }

    __kernel void bsort_merge(__global float* g_data, __local float* l_data,
            uint stage, int direction) {
        /* Compares elements which lie (stage / 2) blocks apart. */
    }

    __kernel void bsort_merge_last(__global float* g_data, __local float* l_data,
            int direction) {
        /* Finishes the merge within each block. */
    }
"#;

/// Orders `a` and `b` so that they follow `ascending`.
fn compare_swap(a: &Cell<f32>, b: &Cell<f32>, ascending: bool) {
    let (x, y) = (a.get(), b.get());
    if (x > y) == ascending {
        a.set(y);
        b.set(x);
    }
}

/// The block of elements owned by the current work-group.
fn block_len(group: &WorkGroup) -> usize {
    group.local_size(0) * ELEMENTS_PER_ITEM
}

fn block_start(group: &WorkGroup) -> usize {
    group.group_id(0) * block_len(group)
}

fn load_block(group: &WorkGroup, g_data: &[Cell<f32>], l_data: &[Cell<f32>]) {
    let start = block_start(group);
    for item in group.items() {
        for e in 0..ELEMENTS_PER_ITEM {
            let i = item.local_linear * ELEMENTS_PER_ITEM + e;
            l_data[i].set(g_data[start + i].get());
        }
    }
}

fn store_block(group: &WorkGroup, g_data: &[Cell<f32>], l_data: &[Cell<f32>]) {
    let start = block_start(group);
    for item in group.items() {
        for e in 0..ELEMENTS_PER_ITEM {
            let i = item.local_linear * ELEMENTS_PER_ITEM + e;
            g_data[start + i].set(l_data[i].get());
        }
    }
}

/// Runs the half-cleaners of a bitonic merge from `block_len / 2` down to 1
/// over the block held in local memory.
fn merge_block(l_data: &[Cell<f32>], block_len: usize, ascending: bool) {
    let mut dist = block_len / 2;
    while dist > 0 {
        for i in 0..block_len {
            let partner = i ^ dist;
            if partner > i {
                compare_swap(&l_data[i], &l_data[partner], ascending);
            }
        }
        dist >>= 1;
    }
}

/// Compare-exchanges every element of this group's block with the element
/// `dist` positions away, when this block holds the lower of the pair.
fn merge_across(group: &WorkGroup, g_data: &[Cell<f32>], dist: usize, run_len: Option<usize>,
        ascending: bool) {
    let start = block_start(group);
    for i in start..start + block_len(group) {
        let partner = i ^ dist;
        if partner > i && partner < g_data.len() {
            let asc = match run_len {
                Some(run) => ((i / run) % 2 == 0) == ascending,
                None => ascending,
            };
            compare_swap(&g_data[i], &g_data[partner], asc);
        }
    }
}

fn check_local(group: &WorkGroup, l_data: &[Cell<f32>]) -> Result<()> {
    if l_data.len() < block_len(group) {
        return Err(format!("bitonic sort: local memory holds {} elements, {} required",
            l_data.len(), block_len(group)).into());
    }
    Ok(())
}

pub fn bsort_init(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<f32>(0)?;
    let l_data = group.local::<f32>(1)?;
    check_local(group, l_data)?;
    let len = block_len(group);

    load_block(group, g_data, l_data);
    let mut block: Vec<f32> = l_data[..len].iter().map(Cell::get).collect();
    block.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if group.group_id(0) % 2 == 1 {
        block.reverse();
    }
    for (cell, val) in l_data.iter().zip(block) {
        cell.set(val);
    }
    store_block(group, g_data, l_data);
    Ok(())
}

pub fn bsort_stage_n(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<f32>(0)?;
    let stage = group.scalar::<u32>(2)? as usize;
    let high_stage = group.scalar::<u32>(3)? as usize;
    let len = block_len(group);

    merge_across(group, g_data, (stage / 2) * len, Some(high_stage * len), true);
    Ok(())
}

pub fn bsort_stage_0(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<f32>(0)?;
    let l_data = group.local::<f32>(1)?;
    check_local(group, l_data)?;
    let high_stage = group.scalar::<u32>(2)? as usize;

    load_block(group, g_data, l_data);
    let ascending = (group.group_id(0) / high_stage) % 2 == 0;
    merge_block(l_data, block_len(group), ascending);
    store_block(group, g_data, l_data);
    Ok(())
}

pub fn bsort_merge(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<f32>(0)?;
    let stage = group.scalar::<u32>(2)? as usize;
    let direction = group.scalar::<i32>(3)?;

    merge_across(group, g_data, (stage / 2) * block_len(group), None, direction == 0);
    Ok(())
}

pub fn bsort_merge_last(group: &WorkGroup) -> Result<()> {
    let g_data = group.global::<f32>(0)?;
    let l_data = group.local::<f32>(1)?;
    check_local(group, l_data)?;
    let direction = group.scalar::<i32>(2)?;

    load_block(group, g_data, l_data);
    merge_block(l_data, block_len(group), direction == 0);
    store_block(group, g_data, l_data);
    Ok(())
}

pub fn library() -> KernelLibrary {
    KernelLibrary::new()
        .with("bsort_init", bsort_init)
        .with("bsort_stage_n", bsort_stage_n)
        .with("bsort_stage_0", bsort_stage_0)
        .with("bsort_merge", bsort_merge)
        .with("bsort_merge_last", bsort_merge_last)
}
