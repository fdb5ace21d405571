//! Interfaces with a buffer.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, Range};
use std::sync::Arc;
use log::{debug, trace};
use crate::core::{self, Error as OclCoreError, GlObject, HostDst, HostSrc, MapFlags,
    Mem as MemCore, MemFlags, MemInfo, MemInfoResult, MemInit, OclPrm};
use crate::error::{Error as OclError, Result as OclResult};
use crate::r#async::{FutureMemMap, MemMap, RwVec};
use crate::standard::{wait_list, Context, Event, EventList, EventSlot, MemLen, Queue,
    SpatialDims};


/// An error related to a `Buffer` or a buffer command.
#[derive(Debug, thiserror::Error)]
pub enum BufferCmdError {
    #[error("A rectangular map is not a valid operation. Please use the default shape, linear.")]
    MapRect,
    #[error("A rectangular copy is not supported. Please use the default shape, linear.")]
    CopyRect,
    #[error("A rectangular fill is not a valid operation. Please use the default shape, linear.")]
    FillRect,
    #[error("No queue specified.")]
    NoQueue,
    #[error("Buffer offset out of range: offset ({offset}) >= buffer length ({mem_len}).")]
    OffsetOor { offset: usize, mem_len: usize },
    #[error("Data length ({data_len}) exceeds the buffer length remaining past offset \
        ({remaining}).")]
    DataLenOor { data_len: usize, remaining: usize },
    #[error("Host slice length ({data_len}) does not match the buffer length ({mem_len}).")]
    HostSliceLen { data_len: usize, mem_len: usize },
    #[error("Buffer length not specified.")]
    NoLen,
    #[error("Filling a buffer requires a queue.")]
    FillNoQueue,
    #[error("{0}")]
    Core(#[from] OclCoreError),
}

/// Ensures that `data_len` elements starting at `offset` fit in `mem_len`.
fn check_len(mem_len: usize, data_len: usize, offset: usize) -> OclResult<()> {
    if offset >= mem_len {
        Err(BufferCmdError::OffsetOor { offset, mem_len }.into())
    } else if data_len > (mem_len - offset) {
        Err(BufferCmdError::DataLenOor { data_len, remaining: mem_len - offset }.into())
    } else {
        Ok(())
    }
}


/// Either a queue or a context.
///
/// Used as a container for either a queue or context when creating buffers
/// and images. A buffer created with a queue keeps it as its default queue.
#[derive(Debug, Clone)]
pub enum QueCtx<'o> {
    Queue(Queue),
    Context(&'o Context),
}

impl<'o> QueCtx<'o> {
    /// Returns a clone of the context contained within.
    pub fn context_cloned(&self) -> Context {
        match *self {
            QueCtx::Queue(ref q) => q.context(),
            QueCtx::Context(c) => c.clone(),
        }
    }
}

impl<'o> From<Queue> for QueCtx<'o> {
    fn from(q: Queue) -> QueCtx<'o> {
        QueCtx::Queue(q)
    }
}

impl<'a, 'o> From<&'a Queue> for QueCtx<'o> {
    fn from(q: &'a Queue) -> QueCtx<'o> {
        QueCtx::Queue(q.clone())
    }
}

impl<'o> From<&'o Context> for QueCtx<'o> {
    fn from(c: &'o Context) -> QueCtx<'o> {
        QueCtx::Context(c)
    }
}

impl<'o> From<QueCtx<'o>> for Option<Queue> {
    fn from(qc: QueCtx<'o>) -> Option<Queue> {
        match qc {
            QueCtx::Queue(q) => Some(q),
            QueCtx::Context(_) => None,
        }
    }
}


/// The type of operation to be performed by a command.
#[derive(Debug)]
pub enum BufferCmdKind<'c, T> {
    Unspecified,
    Read,
    Write,
    Map,
    Copy { dst_buffer: &'c MemCore, dst_offset: Option<usize>, len: Option<usize> },
    Fill { pattern: T, len: Option<usize> },
    GLAcquire,
    GLRelease,
}

impl<'c, T> BufferCmdKind<'c, T> {
    fn is_unspec(&self) -> bool {
        matches!(*self, BufferCmdKind::Unspecified)
    }
}


/// The 'shape' of the data to be processed, whether one or multi-dimensional.
///
/// Origins and regions are in elements for the first dimension and in rows
/// and slices for the others. Pitches are always in bytes; a zero pitch
/// means tightly packed.
#[derive(Debug)]
pub enum BufferCmdDataShape {
    Lin { offset: usize },
    Rect {
        src_origin: [usize; 3],
        dst_origin: [usize; 3],
        region: [usize; 3],
        src_row_pitch_bytes: usize,
        src_slc_pitch_bytes: usize,
        dst_row_pitch_bytes: usize,
        dst_slc_pitch_bytes: usize,
    },
}

/// Converts the element count of the first dimension into bytes.
fn rect_bytes<T>(dims: [usize; 3]) -> [usize; 3] {
    [dims[0] * mem::size_of::<T>(), dims[1], dims[2]]
}


/// A buffer command builder used to enqueue reads, writes, fills, and
/// copies.
///
/// Create one with `Buffer::cmd` or one of the shortcuts such as
/// `Buffer::read`. Call `::enq` to enqueue it.
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct BufferCmd<'c, T> where T: 'c + OclPrm {
    buffer: &'c Buffer<T>,
    queue: Option<&'c Queue>,
    block: bool,
    kind: BufferCmdKind<'c, T>,
    shape: BufferCmdDataShape,
    ewait: Option<EventList>,
    enew: Option<EventSlot<'c>>,
    mem_len: usize,
}

impl<'c, T> BufferCmd<'c, T> where T: 'c + OclPrm {
    /// Returns a new buffer command builder associated with with the
    /// memory object `obj_core` along with a default `queue` and `mem_len`
    /// (the length of the device side buffer).
    fn new(buffer: &'c Buffer<T>, queue: Option<&'c Queue>, mem_len: usize)
            -> BufferCmd<'c, T> {
        BufferCmd {
            buffer,
            queue,
            block: true,
            kind: BufferCmdKind::Unspecified,
            shape: BufferCmdDataShape::Lin { offset: 0 },
            ewait: None,
            enew: None,
            mem_len,
        }
    }

    /// Specifies that this command will be a read operation.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified.
    ///
    pub fn read<'d, R>(mut self, dst_data: R) -> BufferReadCmd<'c, 'd, T>
            where R: Into<ReadDst<'d, T>> {
        assert!(self.kind.is_unspec(), "BufferCmd::read(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::Read;
        let dst = dst_data.into();
        let len = dst.len();

        BufferReadCmd { cmd: self, dst, range: 0..len }
    }

    /// Specifies that this command will be a write operation.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn write<'d, W>(mut self, src_data: W) -> BufferWriteCmd<'c, 'd, T>
            where W: Into<WriteSrc<'d, T>> {
        assert!(self.kind.is_unspec(), "BufferCmd::write(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::Write;
        let src = src_data.into();
        let len = src.len();

        BufferWriteCmd { cmd: self, src, range: 0..len }
    }

    /// Specifies that this command will be a map operation.
    ///
    /// Call `.read()` or `.write()` on the returned command to set the
    /// access of the mapping. Without either, the region is mapped for both
    /// reading and writing.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn map(mut self) -> BufferMapCmd<'c, T> {
        assert!(self.kind.is_unspec(), "BufferCmd::map(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::Map;

        BufferMapCmd { cmd: self, flags: None, len: None }
    }

    /// Specifies that this command will be a copy operation.
    ///
    /// If `.block(..)` has been set it will be ignored.
    ///
    /// `dst_offset` defaults to zero and `len` to the remainder of this
    /// buffer past its offset.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn copy(mut self, dst_buffer: &'c Buffer<T>, dst_offset: Option<usize>,
            len: Option<usize>) -> BufferCmd<'c, T> {
        assert!(self.kind.is_unspec(), "BufferCmd::copy(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::Copy { dst_buffer: &dst_buffer.obj_core, dst_offset, len };
        self
    }

    /// Specifies that this command will be a fill.
    ///
    /// If `.block(..)` has been set it will be ignored.
    ///
    /// `pattern` is the value to fill the buffer with and `len` the number
    /// of elements to fill, defaulting to the remainder of the buffer past
    /// the offset. The size of `T` must be a power of two no greater than
    /// 128 bytes.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn fill(mut self, pattern: T, len: Option<usize>) -> BufferCmd<'c, T> {
        assert!(self.kind.is_unspec(), "BufferCmd::fill(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::Fill { pattern, len };
        self
    }

    /// Specifies that this command will acquire a graphics interop buffer.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn gl_acquire(mut self) -> BufferCmd<'c, T> {
        assert!(self.kind.is_unspec(), "BufferCmd::gl_acquire(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::GLAcquire;
        self
    }

    /// Specifies that this command will release a graphics interop buffer.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    pub fn gl_release(mut self) -> BufferCmd<'c, T> {
        assert!(self.kind.is_unspec(), "BufferCmd::gl_release(): Operation kind \
            already set for this command.");
        self.kind = BufferCmdKind::GLRelease;
        self
    }

    /// Specifies a queue to use for this call only.
    ///
    /// Overrides the buffer's default queue if one is set. If no default
    /// queue is set, this method **must** be called before enqueuing the
    /// command.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> BufferCmd<'c, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.queue = Some(queue.as_ref());
        self
    }

    /// Specifies whether or not to block the current thread until completion.
    ///
    /// Ignored if this is not a read, write, or map operation. Reads into and
    /// writes from plain slices always block.
    pub fn block(mut self, block: bool) -> BufferCmd<'c, T> {
        self.block = block;
        self
    }

    /// Sets the linear offset for an operation.
    ///
    /// ## Panics
    ///
    /// The 'shape' may not have already been set to rectangular by the
    /// `::rect` function.
    pub fn offset(mut self, offset: usize) -> BufferCmd<'c, T> {
        if let BufferCmdDataShape::Rect { .. } = self.shape {
            panic!("BufferCmd::offset(): This command builder has already been set to \
                rectangular mode with '::rect`. You cannot call both '::offset' and '::rect'.");
        }

        self.shape = BufferCmdDataShape::Lin { offset };
        self
    }

    /// Specifies that this will be a rectangularly shaped operation
    /// (the default being linear).
    ///
    /// Only valid for 'read' and 'write' modes. Will error if used with any
    /// other mode.
    #[allow(clippy::too_many_arguments)]
    pub fn rect(mut self, src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
                src_row_pitch_bytes: usize, src_slc_pitch_bytes: usize,
                dst_row_pitch_bytes: usize, dst_slc_pitch_bytes: usize) -> BufferCmd<'c, T> {
        if let BufferCmdDataShape::Lin { offset } = self.shape {
            assert!(offset == 0, "BufferCmd::rect(): This command builder has already been \
                set to linear mode with '::offset`. You cannot call both '::offset' and \
                '::rect'.");
        }

        self.shape = BufferCmdDataShape::Rect { src_origin, dst_origin, region,
            src_row_pitch_bytes, src_slc_pitch_bytes, dst_row_pitch_bytes,
            dst_slc_pitch_bytes };
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> BufferCmd<'c, T> where Ewl: Into<EventList> {
        self.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new, optionally created event
    /// associated with this command.
    pub fn enew<En>(mut self, enew: En) -> BufferCmd<'c, T> where En: Into<EventSlot<'c>> {
        self.enew = Some(enew.into());
        self
    }

    /// Enqueues this command.
    ///
    /// Only copy, fill, and graphics acquire/release commands are enqueued
    /// here. Read, write, and map commands are enqueued through the builder
    /// returned by `::read`, `::write`, or `::map`.
    pub fn enq(self) -> OclResult<()> {
        let queue = self.queue.ok_or(BufferCmdError::NoQueue)?;
        let wait_events = wait_list(self.ewait.as_ref());
        let size = mem::size_of::<T>();

        let event = match self.kind {
            BufferCmdKind::Copy { dst_buffer, dst_offset, len } => {
                let offset = match self.shape {
                    BufferCmdDataShape::Lin { offset } => offset,
                    BufferCmdDataShape::Rect { .. } => return Err(BufferCmdError::CopyRect.into()),
                };
                let len = match len {
                    Some(l) => l,
                    None => self.mem_len.saturating_sub(offset),
                };
                check_len(self.mem_len, len, offset)?;
                let dst_offset = dst_offset.unwrap_or(0);
                check_len(dst_buffer.size() / size, len, dst_offset)?;
                debug!("Enqueuing copy of {} elements from offset {} to {}.", len, offset,
                    dst_offset);

                core::enqueue_copy_buffer(queue.as_core(), &self.buffer.obj_core, dst_buffer,
                    offset * size, dst_offset * size, len * size, wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdKind::Fill { pattern, len } => {
                let offset = match self.shape {
                    BufferCmdDataShape::Lin { offset } => offset,
                    BufferCmdDataShape::Rect { .. } => return Err(BufferCmdError::FillRect.into()),
                };
                let len = match len {
                    Some(l) => l,
                    None => self.mem_len.saturating_sub(offset),
                };
                check_len(self.mem_len, len, offset)?;
                debug!("Enqueuing fill of {} elements at offset {}.", len, offset);

                core::enqueue_fill_buffer(queue.as_core(), &self.buffer.obj_core,
                    bytemuck::bytes_of(&pattern), offset * size, len * size,
                    wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdKind::GLAcquire => {
                core::enqueue_acquire_gl_objects(queue.as_core(),
                    std::slice::from_ref(&self.buffer.obj_core), wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdKind::GLRelease => {
                core::enqueue_release_gl_objects(queue.as_core(),
                    std::slice::from_ref(&self.buffer.obj_core), wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdKind::Unspecified => return Err("BufferCmd::enq(): No operation \
                specified. Use '.read(...)', 'write(...)', etc. before calling '.enq()'.".into()),
            BufferCmdKind::Read | BufferCmdKind::Write | BufferCmdKind::Map => {
                return Err("BufferCmd::enq(): Read, write, and map commands are enqueued \
                    by the command builders returned from '::read', '::write', and '::map'."
                    .into())
            },
        };

        if let Some(enew) = self.enew {
            enew.fill(event);
        }
        Ok(())
    }
}


/// A destination for a read command.
#[derive(Debug)]
pub enum ReadDst<'d, T> where T: OclPrm {
    Slice(&'d mut [T]),
    RwVec(RwVec<T>),
}

impl<'d, T> ReadDst<'d, T> where T: OclPrm {
    fn len(&self) -> usize {
        match *self {
            ReadDst::Slice(ref s) => s.len(),
            ReadDst::RwVec(ref rwv) => rwv.len(),
        }
    }
}

impl<'d, T> From<&'d mut [T]> for ReadDst<'d, T> where T: OclPrm {
    fn from(slice: &'d mut [T]) -> ReadDst<'d, T> {
        ReadDst::Slice(slice)
    }
}

impl<'d, T> From<&'d mut Vec<T>> for ReadDst<'d, T> where T: OclPrm {
    fn from(vec: &'d mut Vec<T>) -> ReadDst<'d, T> {
        ReadDst::Slice(vec.as_mut_slice())
    }
}

impl<'a, 'd, T> From<&'a RwVec<T>> for ReadDst<'d, T> where T: OclPrm {
    fn from(rw_vec: &'a RwVec<T>) -> ReadDst<'d, T> {
        ReadDst::RwVec(rw_vec.clone())
    }
}

impl<'d, T> From<RwVec<T>> for ReadDst<'d, T> where T: OclPrm {
    fn from(rw_vec: RwVec<T>) -> ReadDst<'d, T> {
        ReadDst::RwVec(rw_vec)
    }
}


/// A buffer command builder used to enqueue reads.
///
/// See [SDK][read_buffer] docs for more details.
///
/// [read_buffer]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueReadBuffer.html
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct BufferReadCmd<'c, 'd, T> where T: 'c + 'd + OclPrm {
    cmd: BufferCmd<'c, T>,
    dst: ReadDst<'d, T>,
    range: Range<usize>,
}

impl<'c, 'd, T> BufferReadCmd<'c, 'd, T> where T: OclPrm {
    /// Specifies a queue to use for this call only.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> BufferReadCmd<'c, 'd, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.cmd.queue = Some(queue.as_ref());
        self
    }

    /// Specifies whether or not to block the current thread until
    /// completion.
    ///
    /// Only reads into a `RwVec` may be non-blocking; reads into a slice
    /// always block.
    pub fn block(mut self, block: bool) -> BufferReadCmd<'c, 'd, T> {
        self.cmd.block = block;
        self
    }

    /// Sets the linear offset (in elements) within the buffer to read from.
    ///
    /// ## Panics
    ///
    /// The 'shape' may not have already been set to rectangular by the
    /// `::rect` function.
    pub fn offset(mut self, offset: usize) -> BufferReadCmd<'c, 'd, T> {
        self.cmd = self.cmd.offset(offset);
        self
    }

    /// Sets the offset within the destination to begin reading into.
    pub fn dst_offset(mut self, dst_offset: usize) -> BufferReadCmd<'c, 'd, T> {
        self.range.start = dst_offset;
        self
    }

    /// Sets the number of elements to read.
    pub fn len(mut self, len: usize) -> BufferReadCmd<'c, 'd, T> {
        self.range.end = self.range.start + len;
        self
    }

    /// Specifies that this will be a rectangularly shaped operation.
    ///
    /// The source is the buffer and the destination is host memory.
    #[allow(clippy::too_many_arguments)]
    pub fn rect(mut self, src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
                src_row_pitch_bytes: usize, src_slc_pitch_bytes: usize,
                dst_row_pitch_bytes: usize, dst_slc_pitch_bytes: usize)
                -> BufferReadCmd<'c, 'd, T> {
        self.cmd = self.cmd.rect(src_origin, dst_origin, region, src_row_pitch_bytes,
            src_slc_pitch_bytes, dst_row_pitch_bytes, dst_slc_pitch_bytes);
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> BufferReadCmd<'c, 'd, T>
            where Ewl: Into<EventList> {
        self.cmd.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new, optionally created event
    /// associated with this command.
    pub fn enew<En>(mut self, enew: En) -> BufferReadCmd<'c, 'd, T>
            where En: Into<EventSlot<'c>> {
        self.cmd.enew = Some(enew.into());
        self
    }

    /// Enqueues this command.
    pub fn enq(self) -> OclResult<()> {
        let BufferReadCmd { cmd, dst, range } = self;
        let queue = cmd.queue.ok_or(BufferCmdError::NoQueue)?;
        if range.end > dst.len() || range.start > range.end {
            return Err(BufferCmdError::DataLenOor { data_len: range.end,
                remaining: dst.len() }.into());
        }
        let size = mem::size_of::<T>();
        let wait_events = wait_list(cmd.ewait.as_ref());

        let host_dst = match dst {
            ReadDst::Slice(slice) => HostDst::Slice(bytemuck::cast_slice_mut(&mut slice[range.clone()])),
            ReadDst::RwVec(ref rw_vec) => HostDst::Shared { mem: rw_vec.host_mem().clone(),
                offset: range.start * size, len: range.len() * size },
        };

        let event = match cmd.shape {
            BufferCmdDataShape::Lin { offset } => {
                check_len(cmd.mem_len, range.len(), offset)?;
                trace!("Enqueuing read of {} elements at offset {}.", range.len(), offset);
                core::enqueue_read_buffer(queue.as_core(), &cmd.buffer.obj_core, cmd.block,
                    offset * size, host_dst, wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdDataShape::Rect { src_origin, dst_origin, region, src_row_pitch_bytes,
                    src_slc_pitch_bytes, dst_row_pitch_bytes, dst_slc_pitch_bytes } => {
                trace!("Enqueuing rectangular read: src_origin: {:?}, dst_origin: {:?}, \
                    region: {:?}.", src_origin, dst_origin, region);
                core::enqueue_read_buffer_rect(queue.as_core(), &cmd.buffer.obj_core, cmd.block,
                    rect_bytes::<T>(src_origin), rect_bytes::<T>(dst_origin),
                    rect_bytes::<T>(region), src_row_pitch_bytes, src_slc_pitch_bytes,
                    dst_row_pitch_bytes, dst_slc_pitch_bytes, host_dst, wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
        };

        if let Some(enew) = cmd.enew {
            enew.fill(event);
        }
        Ok(())
    }
}


/// A source for a write command.
#[derive(Debug)]
pub enum WriteSrc<'d, T> where T: OclPrm {
    Slice(&'d [T]),
    RwVec(RwVec<T>),
}

impl<'d, T> WriteSrc<'d, T> where T: OclPrm {
    fn len(&self) -> usize {
        match *self {
            WriteSrc::Slice(s) => s.len(),
            WriteSrc::RwVec(ref rwv) => rwv.len(),
        }
    }
}

impl<'d, T> From<&'d [T]> for WriteSrc<'d, T> where T: OclPrm {
    fn from(slice: &'d [T]) -> WriteSrc<'d, T> {
        WriteSrc::Slice(slice)
    }
}

impl<'d, T> From<&'d Vec<T>> for WriteSrc<'d, T> where T: OclPrm {
    fn from(vec: &'d Vec<T>) -> WriteSrc<'d, T> {
        WriteSrc::Slice(vec.as_slice())
    }
}

impl<'a, 'd, T> From<&'a RwVec<T>> for WriteSrc<'d, T> where T: OclPrm {
    fn from(rw_vec: &'a RwVec<T>) -> WriteSrc<'d, T> {
        WriteSrc::RwVec(rw_vec.clone())
    }
}

impl<'d, T> From<RwVec<T>> for WriteSrc<'d, T> where T: OclPrm {
    fn from(rw_vec: RwVec<T>) -> WriteSrc<'d, T> {
        WriteSrc::RwVec(rw_vec)
    }
}


/// A buffer command builder used to enqueue writes.
///
/// See [SDK][write_buffer] docs for more details.
///
/// [write_buffer]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueWriteBuffer.html
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct BufferWriteCmd<'c, 'd, T> where T: 'c + 'd + OclPrm {
    cmd: BufferCmd<'c, T>,
    src: WriteSrc<'d, T>,
    range: Range<usize>,
}

impl<'c, 'd, T> BufferWriteCmd<'c, 'd, T> where T: OclPrm {
    /// Specifies a queue to use for this call only.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> BufferWriteCmd<'c, 'd, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.cmd.queue = Some(queue.as_ref());
        self
    }

    /// Specifies whether or not to block the current thread until
    /// completion.
    ///
    /// Only writes from a `RwVec` may be non-blocking.
    pub fn block(mut self, block: bool) -> BufferWriteCmd<'c, 'd, T> {
        self.cmd.block = block;
        self
    }

    /// Sets the linear offset (in elements) within the buffer to write to.
    ///
    /// ## Panics
    ///
    /// The 'shape' may not have already been set to rectangular by the
    /// `::rect` function.
    pub fn offset(mut self, offset: usize) -> BufferWriteCmd<'c, 'd, T> {
        self.cmd = self.cmd.offset(offset);
        self
    }

    /// Sets the offset within the source to begin writing from.
    pub fn src_offset(mut self, src_offset: usize) -> BufferWriteCmd<'c, 'd, T> {
        self.range.start = src_offset;
        self
    }

    /// Sets the number of elements to write.
    pub fn len(mut self, len: usize) -> BufferWriteCmd<'c, 'd, T> {
        self.range.end = self.range.start + len;
        self
    }

    /// Specifies that this will be a rectangularly shaped operation.
    ///
    /// The source is host memory and the destination is the buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn rect(mut self, src_origin: [usize; 3], dst_origin: [usize; 3], region: [usize; 3],
                src_row_pitch_bytes: usize, src_slc_pitch_bytes: usize,
                dst_row_pitch_bytes: usize, dst_slc_pitch_bytes: usize)
                -> BufferWriteCmd<'c, 'd, T> {
        self.cmd = self.cmd.rect(src_origin, dst_origin, region, src_row_pitch_bytes,
            src_slc_pitch_bytes, dst_row_pitch_bytes, dst_slc_pitch_bytes);
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> BufferWriteCmd<'c, 'd, T>
            where Ewl: Into<EventList> {
        self.cmd.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new, optionally created event
    /// associated with this command.
    pub fn enew<En>(mut self, enew: En) -> BufferWriteCmd<'c, 'd, T>
            where En: Into<EventSlot<'c>> {
        self.cmd.enew = Some(enew.into());
        self
    }

    /// Enqueues this command.
    pub fn enq(self) -> OclResult<()> {
        let BufferWriteCmd { cmd, src, range } = self;
        let queue = cmd.queue.ok_or(BufferCmdError::NoQueue)?;
        if range.end > src.len() || range.start > range.end {
            return Err(BufferCmdError::DataLenOor { data_len: range.end,
                remaining: src.len() }.into());
        }
        let size = mem::size_of::<T>();
        let wait_events = wait_list(cmd.ewait.as_ref());

        let host_src = match src {
            WriteSrc::Slice(slice) => HostSrc::Slice(bytemuck::cast_slice(&slice[range.clone()])),
            WriteSrc::RwVec(ref rw_vec) => HostSrc::Shared { mem: rw_vec.host_mem().clone(),
                offset: range.start * size, len: range.len() * size },
        };

        let event = match cmd.shape {
            BufferCmdDataShape::Lin { offset } => {
                check_len(cmd.mem_len, range.len(), offset)?;
                trace!("Enqueuing write of {} elements at offset {}.", range.len(), offset);
                core::enqueue_write_buffer(queue.as_core(), &cmd.buffer.obj_core, cmd.block,
                    offset * size, host_src, wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
            BufferCmdDataShape::Rect { src_origin, dst_origin, region, src_row_pitch_bytes,
                    src_slc_pitch_bytes, dst_row_pitch_bytes, dst_slc_pitch_bytes } => {
                trace!("Enqueuing rectangular write: src_origin: {:?}, dst_origin: {:?}, \
                    region: {:?}.", src_origin, dst_origin, region);
                core::enqueue_write_buffer_rect(queue.as_core(), &cmd.buffer.obj_core,
                    cmd.block, rect_bytes::<T>(dst_origin), rect_bytes::<T>(src_origin),
                    rect_bytes::<T>(region), dst_row_pitch_bytes, dst_slc_pitch_bytes,
                    src_row_pitch_bytes, src_slc_pitch_bytes, host_src, wait_events.as_deref())
                    .map_err(BufferCmdError::from)?
            },
        };

        if let Some(enew) = cmd.enew {
            enew.fill(event);
        }
        Ok(())
    }
}


/// A command builder used to enqueue a map command.
///
/// See [SDK][map_buffer] docs for more details.
///
/// [map_buffer]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueMapBuffer.html
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct BufferMapCmd<'c, T> where T: 'c + OclPrm {
    cmd: BufferCmd<'c, T>,
    flags: Option<MapFlags>,
    len: Option<usize>,
}

impl<'c, T> BufferMapCmd<'c, T> where T: OclPrm {
    /// Specifies the flags to be used with this map command.
    ///
    /// See [SDK] docs for more details.
    ///
    /// [SDK]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueMapBuffer.html
    pub fn flags(mut self, flags: MapFlags) -> BufferMapCmd<'c, T> {
        self.flags = Some(flags);
        self
    }

    /// Specifies that the memory object is being mapped for reading.
    pub fn read(mut self) -> BufferMapCmd<'c, T> {
        self.flags = Some(self.flags.unwrap_or_else(MapFlags::empty) | MapFlags::READ);
        self
    }

    /// Specifies that the memory object is being mapped for writing.
    ///
    /// Host changes are written back to the buffer on unmap.
    pub fn write(mut self) -> BufferMapCmd<'c, T> {
        self.flags = Some(self.flags.unwrap_or_else(MapFlags::empty) | MapFlags::WRITE);
        self
    }

    /// Specifies that the memory object is being mapped for writing and
    /// that the mapped contents need not be initialized from the buffer.
    ///
    /// The mapped data starts zeroed. Every element should be written
    /// before unmapping.
    pub fn write_invalidate(mut self) -> BufferMapCmd<'c, T> {
        self.flags = Some(MapFlags::WRITE_INVALIDATE_REGION);
        self
    }

    /// Specifies the length of the region to map, in elements.
    ///
    /// If unspecified the remainder of the buffer past the offset is used.
    pub fn len(mut self, len: usize) -> BufferMapCmd<'c, T> {
        self.len = Some(len);
        self
    }

    /// Specifies a queue to use for this call only.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> BufferMapCmd<'c, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.cmd.queue = Some(queue.as_ref());
        self
    }

    /// Sets the linear offset (in elements) of the region to map.
    pub fn offset(mut self, offset: usize) -> BufferMapCmd<'c, T> {
        self.cmd = self.cmd.offset(offset);
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> BufferMapCmd<'c, T> where Ewl: Into<EventList> {
        self.cmd.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new, optionally created event
    /// associated with this command.
    pub fn enew<En>(mut self, enew: En) -> BufferMapCmd<'c, T> where En: Into<EventSlot<'c>> {
        self.cmd.enew = Some(enew.into());
        self
    }

    /// Enqueues the map command with the given block setting.
    fn enq_map(self, block: bool) -> OclResult<(core::MappedRegion, core::Event, Queue)> {
        let BufferMapCmd { cmd, flags, len } = self;
        let queue = cmd.queue.ok_or(BufferCmdError::NoQueue)?;
        let offset = match cmd.shape {
            BufferCmdDataShape::Lin { offset } => offset,
            BufferCmdDataShape::Rect { .. } => return Err(BufferCmdError::MapRect.into()),
        };
        let len = len.unwrap_or_else(|| cmd.mem_len.saturating_sub(offset));
        check_len(cmd.mem_len, len, offset)?;
        let flags = flags.unwrap_or(MapFlags::READ | MapFlags::WRITE);
        let size = mem::size_of::<T>();
        let wait_events = wait_list(cmd.ewait.as_ref());
        debug!("Enqueuing map of {} elements at offset {} ({:?}).", len, offset, flags);

        let (region, event) = core::enqueue_map_buffer(queue.as_core(), &cmd.buffer.obj_core,
            block, flags, offset * size, len * size, wait_events.as_deref())
            .map_err(BufferCmdError::from)?;

        if let Some(enew) = cmd.enew {
            enew.fill(event.clone());
        }
        Ok((region, event, queue.clone()))
    }

    /// Enqueues a blocking map command and returns the mapped region.
    ///
    /// The region is unmapped when the returned `MemMap` is unmapped or
    /// dropped.
    pub fn enq(self) -> OclResult<MemMap<T>> {
        let (region, _, queue) = self.enq_map(true)?;
        Ok(MemMap::new(region, None, None, queue))
    }

    /// Enqueues a non-blocking map command and returns a future which
    /// resolves to the mapped region once the command completes.
    pub fn enq_async(self) -> OclResult<FutureMemMap<T>> {
        let (region, event, queue) = self.enq_map(false)?;
        Ok(FutureMemMap::new(region, Event::from(event), queue))
    }
}


/// A chunk of memory physically located on a device, such as a GPU.
///
/// Data is stored remotely in a memory buffer on the device associated with
/// `queue`.
#[derive(Debug, Clone)]
pub struct Buffer<T: OclPrm> {
    obj_core: MemCore,
    queue: Option<Queue>,
    len: usize,
    offset: Option<usize>,
    _data: PhantomData<T>,
}

impl<T: OclPrm> Buffer<T> {
    /// Returns a new buffer builder.
    ///
    /// This is the preferred (and forward compatible) way to create a
    /// buffer.
    pub fn builder<'a>() -> BufferBuilder<'a, T> {
        BufferBuilder::new()
    }

    /// Creates a new buffer of `len` elements, optionally copying the
    /// contents of `host_slice`.
    ///
    /// `host_slice`, when given, must be exactly `len` elements long.
    pub fn new<'o, Q, D>(que_ctx: Q, flags: Option<MemFlags>, len: D,
            host_slice: Option<&[T]>) -> OclResult<Buffer<T>>
            where Q: Into<QueCtx<'o>>, D: Into<SpatialDims> {
        let len = len.into().to_len();
        let init = match host_slice {
            Some(hs) => {
                if hs.len() != len {
                    return Err(BufferCmdError::HostSliceLen { data_len: hs.len(),
                        mem_len: len }.into());
                }
                MemInit::Copy(bytemuck::cast_slice(hs))
            },
            None => MemInit::Uninit,
        };
        Buffer::from_init(que_ctx.into(), flags.unwrap_or(MemFlags::READ_WRITE), len, init)
    }

    /// Creates the buffer from an initialization policy.
    fn from_init(que_ctx: QueCtx, flags: MemFlags, len: usize, init: MemInit)
            -> OclResult<Buffer<T>> {
        let ctx = que_ctx.context_cloned();
        let obj_core = core::create_buffer(ctx.as_core(), flags, len * mem::size_of::<T>(),
            init)?;
        debug!("Buffer created: {} elements of '{}' ({:?}).", len,
            std::any::type_name::<T>(), obj_core.flags());

        Ok(Buffer {
            obj_core,
            queue: que_ctx.into(),
            len,
            offset: None,
            _data: PhantomData,
        })
    }

    /// Creates a buffer which shares its storage with a graphics buffer.
    ///
    /// Only access flags (`READ_WRITE`, `READ_ONLY`, `WRITE_ONLY`) may be
    /// given. The context must have been created to share with a graphics
    /// context. The buffer must be acquired with `::cmd().gl_acquire()`
    /// before kernels use it and released afterwards.
    pub fn from_gl_buffer<'o, Q>(que_ctx: Q, flags: Option<MemFlags>, gl_object: Arc<dyn GlObject>)
            -> OclResult<Buffer<T>> where Q: Into<QueCtx<'o>> {
        let que_ctx = que_ctx.into();
        let ctx = que_ctx.context_cloned();
        let byte_len = gl_object.byte_len();
        let obj_core = core::create_from_gl_buffer(ctx.as_core(),
            flags.unwrap_or(MemFlags::READ_WRITE), gl_object)?;

        Ok(Buffer {
            obj_core,
            queue: que_ctx.into(),
            len: byte_len / mem::size_of::<T>(),
            offset: None,
            _data: PhantomData,
        })
    }

    /// Returns a command builder used to read, write, copy, etc.
    ///
    /// Call `.enq()` to enqueue the command.
    ///
    /// See the [command builder
    /// documentation](struct.BufferCmd.html) for more details.
    #[inline]
    pub fn cmd(&self) -> BufferCmd<T> {
        BufferCmd::new(self, self.queue.as_ref(), self.len)
    }

    /// Returns a command builder used to read data.
    ///
    /// Call `.enq()` to enqueue the command.
    #[inline]
    pub fn read<'c, 'd, R>(&'c self, data: R) -> BufferReadCmd<'c, 'd, T>
            where R: Into<ReadDst<'d, T>>, 'd: 'c {
        self.cmd().read(data)
    }

    /// Returns a command builder used to write data.
    ///
    /// Call `.enq()` to enqueue the command.
    #[inline]
    pub fn write<'c, 'd, W>(&'c self, data: W) -> BufferWriteCmd<'c, 'd, T>
            where W: Into<WriteSrc<'d, T>>, 'd: 'c {
        self.cmd().write(data)
    }

    /// Returns a command builder used to map data for reading or writing.
    ///
    /// Call `.enq()` to enqueue the command.
    #[inline]
    pub fn map(&self) -> BufferMapCmd<T> {
        self.cmd().map()
    }

    /// Returns a command builder used to copy data out of this buffer into
    /// `dst_buffer`.
    ///
    /// Call `.enq()` to enqueue the command.
    #[inline]
    pub fn copy<'c>(&'c self, dst_buffer: &'c Buffer<T>, dst_offset: Option<usize>,
            len: Option<usize>) -> BufferCmd<'c, T> {
        self.cmd().copy(dst_buffer, dst_offset, len)
    }

    /// Returns a command builder used to fill this buffer with `pattern`.
    ///
    /// Call `.enq()` to enqueue the command.
    #[inline]
    pub fn fill(&self, pattern: T, len: Option<usize>) -> BufferCmd<T> {
        self.cmd().fill(pattern, len)
    }

    /// Returns the offset of the sub-buffer within its buffer if this is a
    /// sub-buffer.
    #[inline]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// Returns the length of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the length is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if this is a sub-buffer.
    #[inline]
    pub fn is_sub_buffer(&self) -> bool {
        debug_assert!({
            let is_sub_buffer = matches!(self.mem_info(MemInfo::AssociatedMemobject),
                Ok(MemInfoResult::AssociatedMemobject(Some(_))));
            self.offset.is_some() == is_sub_buffer
        });
        self.offset.is_some()
    }

    /// Returns info about the underlying memory object.
    #[inline]
    pub fn mem_info(&self, info_kind: MemInfo) -> OclResult<MemInfoResult> {
        core::get_mem_object_info(&self.obj_core, info_kind).map_err(OclError::from)
    }

    /// Changes the default queue used by this buffer for all subsequent
    /// command enqueue operations (reads, writes, etc.).
    ///
    /// The queue must be associated with a device associated with the
    /// buffer's context.
    pub fn set_default_queue(&mut self, queue: Queue) -> &mut Buffer<T> {
        self.queue = Some(queue);
        self
    }

    /// Returns a reference to the default queue.
    #[inline]
    pub fn default_queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }

    /// Returns a reference to the core pointer wrapper, usable by functions
    /// in the `core` module.
    #[inline]
    pub fn as_core(&self) -> &MemCore {
        &self.obj_core
    }

    /// Returns the context this buffer was created in.
    pub fn context(&self) -> Context {
        Context::from(self.obj_core.context().clone())
    }

    /// Returns the memory flags used during the creation of this buffer.
    #[inline]
    pub fn flags(&self) -> MemFlags {
        self.obj_core.flags()
    }

    /// Creates a new sub-buffer from a region of this buffer.
    ///
    /// `origin` and `len` are in elements. The byte origin must be a
    /// multiple of the device base-address alignment. `flags` defaults to
    /// the access flags of this buffer.
    ///
    /// The sub-buffer shares storage with and keeps alive this buffer.
    pub fn create_sub_buffer<Do, Dl>(&self, flags: Option<MemFlags>, origin: Do, len: Dl)
            -> OclResult<Buffer<T>>
            where Do: Into<SpatialDims>, Dl: Into<SpatialDims> {
        let origin = origin.into().to_len();
        let len = len.into().to_len();
        if origin + len > self.len {
            return Err(BufferCmdError::DataLenOor { data_len: origin + len,
                remaining: self.len }.into());
        }
        let size = mem::size_of::<T>();
        let obj_core = core::create_sub_buffer(&self.obj_core,
            flags.unwrap_or_else(MemFlags::empty), origin * size, len * size)?;

        Ok(Buffer {
            obj_core,
            queue: self.queue.clone(),
            len,
            offset: Some(origin),
            _data: PhantomData,
        })
    }

    /// Formats memory info.
    #[inline]
    fn fmt_mem_info(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Buffer Mem")
            .field("Type", &core::get_mem_object_info(&self.obj_core, MemInfo::Type))
            .field("Flags", &core::get_mem_object_info(&self.obj_core, MemInfo::Flags))
            .field("Size", &core::get_mem_object_info(&self.obj_core, MemInfo::Size))
            .field("MapCount", &core::get_mem_object_info(&self.obj_core, MemInfo::MapCount))
            .field("ReferenceCount", &core::get_mem_object_info(&self.obj_core,
                MemInfo::ReferenceCount))
            .field("Offset", &core::get_mem_object_info(&self.obj_core, MemInfo::Offset))
            .finish()
    }
}

impl<T: OclPrm> Deref for Buffer<T> {
    type Target = MemCore;

    fn deref(&self) -> &MemCore {
        &self.obj_core
    }
}

impl<T: OclPrm> AsRef<MemCore> for Buffer<T> {
    fn as_ref(&self) -> &MemCore {
        &self.obj_core
    }
}

impl<T: OclPrm> fmt::Display for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_mem_info(f)
    }
}


/// The initial contents of a buffer.
#[derive(Debug, Clone)]
pub(crate) enum HostData<'a, T: OclPrm> {
    None,
    Copy(&'a [T]),
    Use(RwVec<T>),
}


/// A buffer builder.
///
/// Either `::queue` or `::context` must be set, along with a length or
/// host data to take the length from.
#[must_use = "builders do nothing unless '::build' is called"]
#[derive(Debug)]
pub struct BufferBuilder<'a, T> where T: 'a + OclPrm {
    queue_option: Option<QueCtx<'a>>,
    flags: Option<MemFlags>,
    host_data: HostData<'a, T>,
    len: usize,
    fill_val: Option<(T, Option<EventSlot<'a>>)>,
}

impl<'a, T> BufferBuilder<'a, T> where T: 'a + OclPrm {
    /// Returns a new buffer builder.
    pub fn new() -> BufferBuilder<'a, T> {
        BufferBuilder {
            queue_option: None,
            flags: None,
            host_data: HostData::None,
            len: 0,
            fill_val: None,
        }
    }

    /// Sets the context with which to associate the buffer.
    ///
    /// May not be used in combination with `::queue` (use one or the other).
    pub fn context(mut self, context: &'a Context) -> BufferBuilder<'a, T> {
        assert!(self.queue_option.is_none(), "BufferBuilder::context: Cannot set both a queue \
            and a context.");
        self.queue_option = Some(QueCtx::Context(context));
        self
    }

    /// Sets the default queue.
    ///
    /// If this is set, the context associated with the `default_queue` will
    /// be used when creating the buffer (use one or the other).
    pub fn queue(mut self, default_queue: Queue) -> BufferBuilder<'a, T> {
        assert!(self.queue_option.is_none(), "BufferBuilder::queue: Cannot set both a queue \
            and a context.");
        self.queue_option = Some(QueCtx::Queue(default_queue));
        self
    }

    /// Sets the flags used when creating the buffer.
    ///
    /// Defaults to `MemFlags::READ_WRITE` if not set. Host pointer flags
    /// are added automatically by `::copy_host_slice` and `::use_host_vec`.
    pub fn flags(mut self, flags: MemFlags) -> BufferBuilder<'a, T> {
        self.flags = Some(flags);
        self
    }

    /// Specifies a slice to copy into the new buffer.
    ///
    /// May not be used with `::use_host_vec`.
    pub fn copy_host_slice(mut self, host_slice: &'a [T]) -> BufferBuilder<'a, T> {
        assert!(matches!(self.host_data, HostData::None), "BufferBuilder::copy_host_slice: \
            Host data has already been specified.");
        self.host_data = HostData::Copy(host_slice);
        self
    }

    /// Specifies a host vector to use as the storage of the new buffer.
    ///
    /// The buffer and `rw_vec` share one allocation: commands on the buffer
    /// are visible through `rw_vec` once they complete.
    ///
    /// May not be used with `::copy_host_slice`.
    pub fn use_host_vec(mut self, rw_vec: &RwVec<T>) -> BufferBuilder<'a, T> {
        assert!(matches!(self.host_data, HostData::None), "BufferBuilder::use_host_vec: \
            Host data has already been specified.");
        self.host_data = HostData::Use(rw_vec.clone());
        self
    }

    /// Sets the length for the buffer, in elements.
    ///
    /// If host data is given, its length is used when this is not set.
    pub fn len<D>(mut self, len: D) -> BufferBuilder<'a, T> where D: Into<SpatialDims> {
        self.len = len.into().to_len();
        self
    }

    /// Allows the caller to automatically fill the buffer with a value (such
    /// as zero) immediately after creation.
    ///
    /// Use `::fill_event` to set an event associated with the completion of
    /// the fill command if you plan to use the buffer immediately.
    ///
    /// Requires a queue.
    pub fn fill_val(mut self, fill_val: T) -> BufferBuilder<'a, T> {
        self.fill_val = Some((fill_val, None));
        self
    }

    /// Specifies the (optional) event for the fill command.
    ///
    /// ## Panics
    ///
    /// `::fill_val` must be called before this method.
    pub fn fill_event<En>(mut self, fill_event: En) -> BufferBuilder<'a, T>
            where En: Into<EventSlot<'a>> {
        let fill_val = match self.fill_val.take() {
            Some(fv) => fv.0,
            None => panic!("BufferBuilder::fill_event: Fill value must be set first."),
        };
        self.fill_val = Some((fill_val, Some(fill_event.into())));
        self
    }

    /// Creates a buffer and returns it.
    ///
    /// Returns an error if neither a queue nor a context is set, if the
    /// length is unresolvable, or if creation fails.
    pub fn build(self) -> OclResult<Buffer<T>> {
        let BufferBuilder { queue_option, flags, host_data, len, fill_val } = self;
        let que_ctx = queue_option.ok_or_else(|| OclError::from("BufferBuilder::build: A \
            queue or context must be set."))?;
        let flags = flags.unwrap_or(MemFlags::READ_WRITE);

        let host_len = match host_data {
            HostData::None => None,
            HostData::Copy(hs) => Some(hs.len()),
            HostData::Use(ref rw_vec) => Some(rw_vec.len()),
        };
        let len = match (len, host_len) {
            (0, Some(hl)) => hl,
            (0, None) => return Err(BufferCmdError::NoLen.into()),
            (l, Some(hl)) if l != hl => {
                return Err(BufferCmdError::HostSliceLen { data_len: hl, mem_len: l }.into())
            },
            (l, _) => l,
        };

        let buf = match host_data {
            HostData::None => Buffer::from_init(que_ctx, flags, len, MemInit::Uninit)?,
            HostData::Copy(hs) => {
                Buffer::from_init(que_ctx, flags, len, MemInit::Copy(bytemuck::cast_slice(hs)))?
            },
            HostData::Use(rw_vec) => {
                Buffer::from_init(que_ctx, flags, len, MemInit::Alias(rw_vec.host_mem().clone()))?
            },
        };

        if let Some((val, fill_event)) = fill_val {
            if buf.default_queue().is_none() {
                return Err(BufferCmdError::FillNoQueue.into());
            }
            match fill_event {
                Some(enew) => buf.cmd().fill(val, None).enew(enew).enq()?,
                None => {
                    let mut ev = Event::empty();
                    buf.cmd().fill(val, None).enew(&mut ev).enq()?;
                    ev.wait_for()?;
                },
            }
        }

        Ok(buf)
    }
}

impl<'a, T> Default for BufferBuilder<'a, T> where T: 'a + OclPrm {
    fn default() -> BufferBuilder<'a, T> {
        BufferBuilder::new()
    }
}

impl<T: OclPrm> MemLen for Buffer<T> {
    fn to_len_padded(&self, incr: usize) -> usize {
        crate::core::util::padded_len(self.len, incr)
    }

    fn to_len(&self) -> usize {
        self.len
    }

    fn to_lens(&self) -> [usize; 3] {
        [self.len, 1, 1]
    }
}
