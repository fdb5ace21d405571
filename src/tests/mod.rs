//! Tests of the standard types against the software runtime.
//!
//! Kernel sources and their native implementations come from
//! `harness-extras` where a family already exists and are written inline
//! otherwise.

#![allow(dead_code)]

mod r#async;
mod buffer_copy;
mod buffer_fill;
mod buffer_rect;
mod clear_completed;
mod events;
mod image_ops;
mod kernel_arg;
mod patterns;
mod program;
mod sub_buffer;

use harness_extras::kernels::misc;
use crate::standard::ProQue;

/// Returns a `ProQue` over the general purpose kernels with a default
/// work size of `dims`.
pub fn misc_pro_que(dims: usize) -> ProQue {
    ProQue::builder()
        .src(misc::SRC)
        .kernels(misc::library())
        .dims(dims)
        .build().unwrap()
}

/// Asserts that two floats are within `tolerance` of each other, relative
/// to the larger magnitude.
pub fn assert_close(found: f64, expected: f64, tolerance: f64) {
    let scale = found.abs().max(expected.abs()).max(1.0);
    assert!((found - expected).abs() / scale <= tolerance,
        "found: {}, expected: {} (tolerance: {})", found, expected, tolerance);
}
