//! The software compute runtime.
//!
//! Devices are simulated: a program's kernel entry points are parsed from
//! its source text and bound to *native kernels*, Rust implementations
//! registered by name in a [`KernelLibrary`]. A launch runs the native
//! kernel once per work-group on the queue's executor pool. Everything
//! host-facing (queues, events, transfers, profiling) behaves as it would
//! against a driver.

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub(crate) mod compiler;
pub(crate) mod context;
pub(crate) mod event;
pub(crate) mod image;
pub(crate) mod kernel;
pub(crate) mod memory;
pub(crate) mod platform;
pub(crate) mod program;
pub(crate) mod queue;

pub use self::image::{ImageView, SamplerDesc};
pub use self::kernel::{WorkGroup, WorkItem};
pub use self::memory::{Bytes, BytesReadGuard, BytesWriteGuard, GlObject, HostMem, MappedRegion};
pub use self::platform::{DeviceConfig, PlatformConfig, VectorWidths};
pub use self::program::{KernelLibrary, NativeKernel};

lazy_static! {
    static ref EPOCH: Instant = Instant::now();
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Returns nanoseconds elapsed since the runtime first took a timestamp.
///
/// Monotonic and shared by every device.
pub fn timestamp() -> u64 {
    EPOCH.elapsed().as_nanos() as u64
}

/// Returns a process-unique object id.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
