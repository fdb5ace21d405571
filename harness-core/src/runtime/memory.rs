//! Device memory backing store and host-shared memory.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::types::structs::ImageFormat;
use crate::{Context, MapFlags, Mem, MemFlags};

/// Word-aligned bytes.
///
/// Allocations are backed by `u64` words so that any primitive up to eight
/// bytes wide may be viewed in place.
pub struct Bytes {
    words: Vec<u64>,
    len: usize,
}

impl Bytes {
    /// Returns `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Bytes {
        Bytes {
            words: vec![0u64; (len + 7) / 8],
            len,
        }
    }

    /// Returns a copy of `src`.
    pub fn from_slice(src: &[u8]) -> Bytes {
        let mut bytes = Bytes::zeroed(src.len());
        bytes.as_mut_slice().copy_from_slice(src);
        bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.words)[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.words)[..len]
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Bytes").field("len", &self.len).finish()
    }
}

pub type BytesReadGuard<'a> = RwLockReadGuard<'a, Bytes>;
pub type BytesWriteGuard<'a> = RwLockWriteGuard<'a, Bytes>;

pub(crate) type Storage = Arc<RwLock<Bytes>>;

/// Host memory which device memory objects may alias.
///
/// A buffer created with `MemFlags::USE_HOST_PTR` shares this allocation:
/// kernel writes are visible through it once the command completes and host
/// writes are visible to commands which start afterwards.
#[derive(Clone)]
pub struct HostMem(pub(crate) Storage);

impl HostMem {
    /// Returns `len` zeroed bytes of host memory.
    pub fn new(len: usize) -> HostMem {
        HostMem(Arc::new(RwLock::new(Bytes::zeroed(len))))
    }

    /// Returns host memory initialized with a copy of `src`.
    pub fn from_bytes(src: &[u8]) -> HostMem {
        HostMem(Arc::new(RwLock::new(Bytes::from_slice(src))))
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks for reading, blocking while a command or the host is writing.
    pub fn read(&self) -> BytesReadGuard {
        self.0.read()
    }

    /// Locks for writing, blocking while any other access is in progress.
    pub fn write(&self) -> BytesWriteGuard {
        self.0.write()
    }

    /// Returns true if `other` refers to the same allocation.
    pub fn ptr_eq(&self, other: &HostMem) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HostMem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HostMem({:p})", Arc::as_ptr(&self.0))
    }
}

/// A graphics object (buffer or texture) which a memory object may share.
///
/// Implementations represent storage owned by the graphics side. Contents
/// returned by `read_into` must reflect only graphics work which has been
/// flushed.
pub trait GlObject: Send + Sync {
    /// The object name as used by the graphics API.
    fn gl_name(&self) -> u32;

    /// Size in bytes.
    fn byte_len(&self) -> usize;

    /// Copies the committed graphics contents into `dst`.
    fn read_into(&self, dst: &mut [u8]);

    /// Replaces the graphics contents with `src`.
    fn write_from(&self, src: &[u8]);
}

pub(crate) struct GlShare {
    pub(crate) object: Arc<dyn GlObject>,
    pub(crate) acquired: AtomicBool,
}

impl GlShare {
    pub(crate) fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }
}

/// Placement of a two dimensional image within its storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    pub format: ImageFormat,
    pub width: usize,
    pub height: usize,
    pub pixel_size: usize,
    pub row_pitch: usize,
}

pub(crate) enum MemKind {
    Buffer,
    Image(ImageLayout),
}

pub(crate) struct MemObj {
    pub(crate) id: u64,
    pub(crate) context: Context,
    pub(crate) flags: MemFlags,
    pub(crate) storage: Storage,
    /// Byte offset into `storage` (non-zero for sub-buffers).
    pub(crate) offset: usize,
    pub(crate) size: usize,
    pub(crate) kind: MemKind,
    pub(crate) parent: Option<Mem>,
    pub(crate) gl: Option<GlShare>,
    pub(crate) map_count: AtomicU32,
}

impl MemObj {
    /// The graphics share of this object or, for a sub-buffer, of the
    /// buffer it was created from.
    pub(crate) fn gl_share(&self) -> Option<&GlShare> {
        match (self.gl.as_ref(), self.parent.as_ref()) {
            (Some(gl), _) => Some(gl),
            (None, Some(parent)) => parent.0.gl_share(),
            (None, None) => None,
        }
    }

    pub(crate) fn image_layout(&self) -> Option<&ImageLayout> {
        match self.kind {
            MemKind::Image(ref layout) => Some(layout),
            MemKind::Buffer => None,
        }
    }

    /// Copies `len` bytes starting at `offset` (relative to this object) out
    /// of device memory.
    pub(crate) fn copy_out(&self, offset: usize, len: usize) -> Vec<u8> {
        let start = self.offset + offset;
        self.storage.read().as_slice()[start..start + len].to_vec()
    }

    /// Copies `src` into device memory at `offset` (relative to this
    /// object).
    pub(crate) fn copy_in(&self, offset: usize, src: &[u8]) {
        let start = self.offset + offset;
        self.storage.write().as_mut_slice()[start..start + src.len()].copy_from_slice(src);
    }
}

/// A region of a buffer mapped into host memory.
///
/// The host copy is written back to the buffer when the region is unmapped
/// with write access.
pub struct MappedRegion {
    pub(crate) mem: Mem,
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) flags: MapFlags,
    pub(crate) host: HostMem,
}

impl MappedRegion {
    /// The host memory holding the mapped bytes.
    pub fn host_mem(&self) -> &HostMem {
        &self.host
    }

    /// The mapped buffer.
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Byte offset of the region within the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn flags(&self) -> MapFlags {
        self.flags
    }
}

impl fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MappedRegion")
            .field("mem", &self.mem)
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("flags", &self.flags)
            .finish()
    }
}
