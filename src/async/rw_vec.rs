//! A host vector which buffers and commands may share.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use crate::core::{BytesReadGuard, BytesWriteGuard, HostMem, OclPrm};


/// A locking `Vec` which can be used as the destination of a non-blocking
/// read, the source of a non-blocking write, or the storage of a buffer
/// created with `BufferBuilder::use_host_vec`.
///
/// Clones share the same allocation. Commands lock it only while they run,
/// so reading or writing it from the host blocks until any in-flight
/// command touching it has finished copying.
pub struct RwVec<T: OclPrm> {
    mem: HostMem,
    len: usize,
    _ty: PhantomData<T>,
}

impl<T: OclPrm> RwVec<T> {
    /// Creates and returns a new, empty `RwVec`.
    pub fn new() -> RwVec<T> {
        RwVec::with_len(0)
    }

    /// Creates a `RwVec` of `len` default (zeroed) elements.
    pub fn with_len(len: usize) -> RwVec<T> {
        RwVec { mem: HostMem::new(len * mem::size_of::<T>()), len, _ty: PhantomData }
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Locks for reading, blocking the current thread while a command or
    /// another host thread is writing.
    pub fn read(&self) -> ReadGuard<T> {
        ReadGuard { guard: self.mem.read(), _ty: PhantomData }
    }

    /// Locks for writing, blocking the current thread while any other access
    /// is in progress.
    pub fn write(&self) -> WriteGuard<T> {
        WriteGuard { guard: self.mem.write(), _ty: PhantomData }
    }

    /// Returns a copy of the contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.read().to_vec()
    }

    /// Returns true if `other` shares this allocation.
    pub fn ptr_eq(&self, other: &RwVec<T>) -> bool {
        self.mem.ptr_eq(&other.mem)
    }

    /// Returns the shared host memory.
    pub(crate) fn host_mem(&self) -> &HostMem {
        &self.mem
    }
}

impl<T: OclPrm> Clone for RwVec<T> {
    fn clone(&self) -> RwVec<T> {
        RwVec { mem: self.mem.clone(), len: self.len, _ty: PhantomData }
    }
}

impl<T: OclPrm> Default for RwVec<T> {
    fn default() -> RwVec<T> {
        RwVec::new()
    }
}

impl<T: OclPrm> From<Vec<T>> for RwVec<T> {
    fn from(vec: Vec<T>) -> RwVec<T> {
        RwVec {
            mem: HostMem::from_bytes(bytemuck::cast_slice(&vec)),
            len: vec.len(),
            _ty: PhantomData,
        }
    }
}

impl<'a, T: OclPrm> From<&'a [T]> for RwVec<T> {
    fn from(slice: &'a [T]) -> RwVec<T> {
        RwVec {
            mem: HostMem::from_bytes(bytemuck::cast_slice(slice)),
            len: slice.len(),
            _ty: PhantomData,
        }
    }
}

impl<T: OclPrm> fmt::Debug for RwVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RwVec")
            .field("mem", &self.mem)
            .field("len", &self.len)
            .finish()
    }
}


/// Read access to the contents of a `RwVec`.
pub struct ReadGuard<'a, T: OclPrm> {
    guard: BytesReadGuard<'a>,
    _ty: PhantomData<T>,
}

impl<'a, T: OclPrm> Deref for ReadGuard<'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        bytemuck::cast_slice(self.guard.as_slice())
    }
}


/// Exclusive access to the contents of a `RwVec`.
pub struct WriteGuard<'a, T: OclPrm> {
    guard: BytesWriteGuard<'a>,
    _ty: PhantomData<T>,
}

impl<'a, T: OclPrm> Deref for WriteGuard<'a, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        bytemuck::cast_slice(self.guard.as_slice())
    }
}

impl<'a, T: OclPrm> DerefMut for WriteGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.guard.as_mut_slice())
    }
}
