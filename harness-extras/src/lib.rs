//! Native kernels and helpers shared by the `ocl-harness` demos and tests.
//!
//! Every kernel family in [`kernels`] pairs an OpenCL C source string with a
//! `KernelLibrary` holding the native implementation of each kernel it
//! declares. The same sources are available as files under `demos/kernels/`.

pub extern crate harness_core as core;

pub mod kernels;
pub mod report;
mod vecs;
#[cfg(test)]
mod tests;

pub use self::vecs::{scrambled_vec, shuffle, shuffled_vec};
pub use self::report::{device_report, platform_report};
