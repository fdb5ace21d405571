//! Kernel objects and launch execution.
//!
//! A launch snapshots the kernel's arguments at enqueue time. When it runs,
//! every distinct storage referenced by a memory argument is locked for the
//! duration of the launch and exposed to the native kernel as a slice of
//! `Cell`s, so aliasing arguments (a buffer and its sub-buffer, or the same
//! buffer passed twice) remain sound. Work-groups run one after another.

use log::warn;
use parking_lot::Mutex;
use std::cell::Cell;
use std::collections::HashMap;
use std::mem;
use std::slice;
use std::sync::Arc;

use super::image::{ImageView, SamplerDesc};
use super::memory::{Bytes, ImageLayout, Storage};
use super::program::NativeKernel;
use crate::error::{api_err, Error, Result};
use crate::types::structs::{KernelSignature, ParamKind};
use crate::{ArgVal, OclPrm, Program, Status};

pub(crate) struct KernelObj {
    pub(crate) id: u64,
    pub(crate) program: Program,
    pub(crate) sig: KernelSignature,
    pub(crate) native: Arc<dyn NativeKernel>,
    pub(crate) args: Mutex<Vec<Option<ArgVal>>>,
}

impl KernelObj {
    pub(crate) fn new(program: &Program, sig: KernelSignature, native: Arc<dyn NativeKernel>)
            -> KernelObj {
        program.0.state.lock().attached_kernels += 1;
        let arg_count = sig.params.len();

        KernelObj {
            id: super::next_id(),
            program: program.clone(),
            sig,
            native,
            args: Mutex::new(vec![None; arg_count]),
        }
    }

    /// Total bytes of local memory reserved by `__local` arguments.
    pub(crate) fn local_mem_size(&self) -> u64 {
        self.args.lock().iter()
            .filter_map(|arg| match *arg {
                Some(ArgVal::Local(len)) => Some(len as u64),
                _ => None,
            })
            .sum()
    }
}

impl Drop for KernelObj {
    fn drop(&mut self) {
        let mut state = self.program.0.state.lock();
        state.attached_kernels = state.attached_kernels.saturating_sub(1);
    }
}

//=============================================================================
//================================ WORK GROUPS ================================
//=============================================================================

/// A kernel argument as seen from inside a launch.
pub(crate) enum BoundArg<'a> {
    Global { cells: &'a [Cell<u8>] },
    Image { cells: &'a [Cell<u8>], layout: &'a ImageLayout },
    Local { cells: &'a [Cell<u8>] },
    Scalar(&'a [u8]),
    Sampler(SamplerDesc),
    Null,
}

/// Reinterprets byte cells as cells of `T`.
fn cast_cells<T: OclPrm>(cells: &[Cell<u8>]) -> Option<&[Cell<T>]> {
    let size = mem::size_of::<T>();
    if size == 0
        || cells.len() % size != 0
        || (cells.as_ptr() as usize) % mem::align_of::<T>() != 0
    {
        return None;
    }

    // SAFETY: `Cell<T>` has the same layout as `T`, any bit pattern is a
    // valid `T` (`Pod`), and the pointer is aligned for `T` with a length
    // that is a whole number of elements. `Cell` forbids references into
    // the data so overlapping views of the same bytes cannot alias.
    Some(unsafe { slice::from_raw_parts(cells.as_ptr() as *const Cell<T>, cells.len() / size) })
}

/// One work-item within a work-group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub local_id: [usize; 3],
    pub global_id: [usize; 3],
    /// Row-major index of `local_id` within the group.
    pub local_linear: usize,
}

/// The execution context of one work-group, handed to a native kernel.
///
/// Work-items are not run concurrently. A kernel which synchronizes with a
/// barrier is written as successive loops over `items()`.
pub struct WorkGroup<'a> {
    pub(crate) kernel_name: &'a str,
    pub(crate) work_dim: u32,
    pub(crate) group_id: [usize; 3],
    pub(crate) num_groups: [usize; 3],
    pub(crate) global_size: [usize; 3],
    pub(crate) local_size: [usize; 3],
    pub(crate) global_offset: [usize; 3],
    pub(crate) args: &'a [BoundArg<'a>],
    pub(crate) defines: &'a HashMap<String, String>,
}

impl<'a> WorkGroup<'a> {
    pub fn work_dim(&self) -> u32 {
        self.work_dim
    }

    pub fn group_id(&self, dim: usize) -> usize {
        self.group_id[dim]
    }

    pub fn num_groups(&self, dim: usize) -> usize {
        self.num_groups[dim]
    }

    pub fn local_size(&self, dim: usize) -> usize {
        self.local_size[dim]
    }

    pub fn global_size(&self, dim: usize) -> usize {
        self.global_size[dim]
    }

    pub fn global_offset(&self, dim: usize) -> usize {
        self.global_offset[dim]
    }

    /// Number of work-items in this group.
    pub fn local_len(&self) -> usize {
        self.local_size.iter().product()
    }

    /// Global id in `dim` of the work-item with local id `local_id`.
    pub fn global_id(&self, dim: usize, local_id: usize) -> usize {
        self.global_offset[dim] + self.group_id[dim] * self.local_size[dim] + local_id
    }

    /// Iterates the work-items of this group in row-major order.
    pub fn items(&self) -> impl Iterator<Item = WorkItem> + '_ {
        let [lx, ly, lz] = self.local_size;
        (0..lx * ly * lz).map(move |linear| {
            let local_id = [linear % lx, (linear / lx) % ly, linear / (lx * ly)];
            WorkItem {
                local_id,
                global_id: [
                    self.global_id(0, local_id[0]),
                    self.global_id(1, local_id[1]),
                    self.global_id(2, local_id[2]),
                ],
                local_linear: linear,
            }
        })
    }

    /// Returns the value of a preprocessor macro visible to the program.
    pub fn define(&self, name: &str) -> Option<&'a str> {
        let defines: &'a HashMap<String, String> = self.defines;
        defines.get(name).map(|s| s.as_str())
    }

    fn arg(&self, idx: usize, fn_name: &'static str) -> Result<&'a BoundArg<'a>> {
        let args: &'a [BoundArg<'a>] = self.args;
        args.get(idx).ok_or_else(|| api_err(Status::InvalidArgIndex, fn_name,
            format!("kernel '{}' has no argument {}", self.kernel_name, idx)))
    }

    fn arg_err(&self, idx: usize, fn_name: &'static str, msg: &str) -> Error {
        api_err(Status::InvalidArgValue, fn_name,
            format!("argument {} of kernel '{}' {}", idx, self.kernel_name, msg))
    }

    fn cells_as<T: OclPrm>(&self, idx: usize, fn_name: &'static str, cells: &'a [Cell<u8>])
            -> Result<&'a [Cell<T>]> {
        cast_cells(cells).ok_or_else(|| self.arg_err(idx, fn_name, &format!(
            "cannot be viewed as '{}' (length or alignment mismatch)", std::any::type_name::<T>())))
    }

    /// Returns a global or constant buffer argument.
    pub fn global<T: OclPrm>(&self, idx: usize) -> Result<&'a [Cell<T>]> {
        match *self.arg(idx, "WorkGroup::global")? {
            BoundArg::Global { cells } => self.cells_as(idx, "WorkGroup::global", cells),
            BoundArg::Null => Err(self.arg_err(idx, "WorkGroup::global", "is a null buffer")),
            _ => Err(self.arg_err(idx, "WorkGroup::global", "is not a buffer")),
        }
    }

    /// Returns a global buffer argument which may be null.
    pub fn global_opt<T: OclPrm>(&self, idx: usize) -> Result<Option<&'a [Cell<T>]>> {
        match *self.arg(idx, "WorkGroup::global_opt")? {
            BoundArg::Null => Ok(None),
            _ => self.global(idx).map(Some),
        }
    }

    /// Returns a local memory argument. Contents persist between loops over
    /// `items()` within one work-group only.
    pub fn local<T: OclPrm>(&self, idx: usize) -> Result<&'a [Cell<T>]> {
        match *self.arg(idx, "WorkGroup::local")? {
            BoundArg::Local { cells } => self.cells_as(idx, "WorkGroup::local", cells),
            _ => Err(self.arg_err(idx, "WorkGroup::local", "is not a local memory argument")),
        }
    }

    /// Returns a scalar or vector argument.
    pub fn scalar<T: OclPrm>(&self, idx: usize) -> Result<T> {
        match *self.arg(idx, "WorkGroup::scalar")? {
            BoundArg::Scalar(bytes) if bytes.len() == mem::size_of::<T>() => {
                Ok(bytemuck::pod_read_unaligned(bytes))
            },
            BoundArg::Scalar(bytes) => Err(self.arg_err(idx, "WorkGroup::scalar", &format!(
                "is {} bytes, '{}' is {}", bytes.len(), std::any::type_name::<T>(),
                mem::size_of::<T>()))),
            _ => Err(self.arg_err(idx, "WorkGroup::scalar", "is not a scalar")),
        }
    }

    /// Returns an image argument.
    pub fn image(&self, idx: usize) -> Result<ImageView<'a>> {
        match *self.arg(idx, "WorkGroup::image")? {
            BoundArg::Image { cells, layout } => Ok(ImageView { cells, layout }),
            _ => Err(self.arg_err(idx, "WorkGroup::image", "is not an image")),
        }
    }

    /// Returns a sampler argument.
    pub fn sampler(&self, idx: usize) -> Result<SamplerDesc> {
        match *self.arg(idx, "WorkGroup::sampler")? {
            BoundArg::Sampler(desc) => Ok(desc),
            _ => Err(self.arg_err(idx, "WorkGroup::sampler", "is not a sampler")),
        }
    }
}

//=============================================================================
//================================== LAUNCH ===================================
//=============================================================================

/// Everything needed to run a kernel, captured at enqueue time.
pub(crate) struct Launch {
    pub(crate) name: String,
    pub(crate) native: Arc<dyn NativeKernel>,
    pub(crate) params: Vec<ParamKind>,
    pub(crate) args: Vec<ArgVal>,
    pub(crate) defines: Arc<HashMap<String, String>>,
    pub(crate) work_dim: u32,
    pub(crate) global_offset: [usize; 3],
    pub(crate) global_size: [usize; 3],
    pub(crate) local_size: [usize; 3],
}

impl Launch {
    pub(crate) fn execute(self) -> std::result::Result<(), Status> {
        for arg in &self.args {
            if let ArgVal::Mem(ref mem) = *arg {
                if let Some(gl) = mem.0.gl_share() {
                    if !gl.is_acquired() {
                        warn!("kernel '{}': {:?} is shared with graphics and has not been \
                            acquired", self.name, mem);
                        return Err(Status::InvalidOperation);
                    }
                }
            }
        }

        // Distinct storages, locked in address order.
        let mut storages: Vec<Storage> = self.args.iter()
            .filter_map(|arg| match *arg {
                ArgVal::Mem(ref mem) => Some(mem.0.storage.clone()),
                _ => None,
            })
            .collect();
        storages.sort_by_key(|s| Arc::as_ptr(s) as usize);
        storages.dedup_by(|a, b| Arc::ptr_eq(a, b));

        let mut guards: Vec<_> = storages.iter().map(|s| s.write()).collect();
        let views: Vec<&[Cell<u8>]> = guards.iter_mut()
            .map(|g| Cell::from_mut(g.as_mut_slice()).as_slice_of_cells())
            .collect();

        let mut locals: Vec<Bytes> = self.args.iter()
            .filter_map(|arg| match *arg {
                ArgVal::Local(len) => Some(Bytes::zeroed(len)),
                _ => None,
            })
            .collect();
        let mut local_views = locals.iter_mut()
            .map(|b| Cell::from_mut(b.as_mut_slice()).as_slice_of_cells());

        let mut bound: Vec<BoundArg> = Vec::with_capacity(self.args.len());
        for (arg, kind) in self.args.iter().zip(self.params.iter()) {
            let arg = match *arg {
                ArgVal::Mem(ref mem) => {
                    let idx = storages.iter().position(|s| Arc::ptr_eq(s, &mem.0.storage))
                        .ok_or(Status::InvalidMemObject)?;
                    let cells = &views[idx][mem.0.offset..mem.0.offset + mem.0.size];
                    match (mem.0.image_layout(), *kind) {
                        (Some(layout), ParamKind::Image) => BoundArg::Image { cells, layout },
                        _ => BoundArg::Global { cells },
                    }
                },
                ArgVal::Local(_) => BoundArg::Local {
                    cells: local_views.next().ok_or(Status::OutOfResources)?,
                },
                ArgVal::Scalar(ref bytes) => BoundArg::Scalar(bytes),
                ArgVal::Sampler(ref sampler) => BoundArg::Sampler(sampler.0.desc),
                ArgVal::Null => BoundArg::Null,
            };
            bound.push(arg);
        }

        let num_groups = [
            self.global_size[0] / self.local_size[0],
            self.global_size[1] / self.local_size[1],
            self.global_size[2] / self.local_size[2],
        ];

        for gz in 0..num_groups[2] {
            for gy in 0..num_groups[1] {
                for gx in 0..num_groups[0] {
                    let group = WorkGroup {
                        kernel_name: &self.name,
                        work_dim: self.work_dim,
                        group_id: [gx, gy, gz],
                        num_groups,
                        global_size: self.global_size,
                        local_size: self.local_size,
                        global_offset: self.global_offset,
                        args: &bound,
                        defines: &self.defines,
                    };

                    if let Err(err) = self.native.run(&group) {
                        warn!("kernel '{}' failed in work-group {:?}: {}", self.name,
                            [gx, gy, gz], err);
                        return Err(err.api_status().unwrap_or(Status::OutOfResources));
                    }
                }
            }
        }

        #[cfg(feature = "kernel_debug_print")]
        log::debug!("kernel '{}': {:?} work-groups of {:?} complete", self.name, num_groups,
            self.local_size);

        Ok(())
    }
}
