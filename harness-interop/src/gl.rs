//! A software graphics context with buffer objects and textures.
//!
//! Writes made from the graphics side are queued and only become visible to
//! the compute side once `GlContext::finish` has run, mirroring the flush a
//! real graphics API requires before objects are acquired.

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use log::{debug, trace};
use parking_lot::Mutex;
use ocl_harness::builders::ImageFormat;
use ocl_harness::core::GlObject;
use ocl_harness::util::{from_bytes, to_bytes};
use ocl_harness::{Error as OclError, OclPrm};
use crate::error::{InteropError, InteropResult};

static NEXT_CONTEXT: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static CURRENT: Cell<Option<NativeHandles>> = Cell::new(None);
}

/// The window-system handles identifying a graphics context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeHandles {
    pub context: usize,
    pub display: usize,
    pub hdc: usize,
    pub sharegroup: usize,
}

impl NativeHandles {
    /// Returns the handles of the graphics context current on this thread.
    pub fn current() -> InteropResult<NativeHandles> {
        CURRENT.with(|c| c.get()).ok_or(InteropError::NoCurrentContext)
    }
}


/// Storage shared between a graphics object and its compute counterpart.
struct Storage {
    name: u32,
    committed: Mutex<Vec<u8>>,
    pending: Mutex<Option<Vec<u8>>>,
}

impl Storage {
    fn new(name: u32, len: usize) -> Storage {
        Storage {
            name,
            committed: Mutex::new(vec![0; len]),
            pending: Mutex::new(None),
        }
    }

    fn len(&self) -> usize {
        self.committed.lock().len()
    }

    fn queue_write(&self, data: &[u8]) {
        *self.pending.lock() = Some(data.to_vec());
    }

    /// Moves a queued write into the committed contents. Returns true if
    /// there was one.
    fn commit(&self) -> bool {
        match self.pending.lock().take() {
            Some(data) => {
                self.committed.lock().copy_from_slice(&data);
                true
            },
            None => false,
        }
    }
}


/// A graphics context.
///
/// Objects created from it share its name space. Make it current on a
/// thread before building a compute context which shares with it.
pub struct GlContext {
    handles: NativeHandles,
    next_name: AtomicU32,
    objects: Mutex<Vec<Weak<Storage>>>,
}

impl GlContext {
    pub fn new() -> GlContext {
        let id = NEXT_CONTEXT.fetch_add(1, Ordering::SeqCst);
        GlContext {
            handles: NativeHandles {
                context: 0x1000 * id,
                display: 0x1000 * id + 1,
                hdc: 0x1000 * id + 2,
                sharegroup: 0x1000 * id + 3,
            },
            next_name: AtomicU32::new(1),
            objects: Mutex::new(Vec::new()),
        }
    }

    pub fn handles(&self) -> NativeHandles {
        self.handles
    }

    /// Makes this context current on the calling thread.
    pub fn make_current(&self) {
        CURRENT.with(|c| c.set(Some(self.handles)));
        debug!("GlContext({:#x}): made current.", self.handles.context);
    }

    /// Clears the current context of the calling thread.
    pub fn release_current() {
        CURRENT.with(|c| c.set(None));
    }

    /// Returns true if this context is current on the calling thread.
    pub fn is_current(&self) -> bool {
        CURRENT.with(|c| c.get()) == Some(self.handles)
    }

    fn new_storage(&self, len: usize) -> Arc<Storage> {
        let name = self.next_name.fetch_add(1, Ordering::SeqCst);
        let storage = Arc::new(Storage::new(name, len));
        let mut objects = self.objects.lock();
        objects.retain(|o| o.strong_count() > 0);
        objects.push(Arc::downgrade(&storage));
        storage
    }

    /// Creates a buffer object of `len` bytes, zeroed.
    pub fn create_buffer(&self, len: usize) -> Arc<GlBuffer> {
        Arc::new(GlBuffer { storage: self.new_storage(len) })
    }

    /// Creates a two dimensional texture, zeroed.
    pub fn create_texture(&self, width: usize, height: usize, format: ImageFormat)
            -> InteropResult<Arc<GlTexture>> {
        let pixel_size = format.pixel_size().map_err(OclError::from)?;
        Ok(Arc::new(GlTexture {
            storage: self.new_storage(width * height * pixel_size),
            width,
            height,
            format,
        }))
    }

    /// Completes every queued graphics write.
    pub fn finish(&self) {
        let objects = self.objects.lock();
        let committed = objects.iter()
            .filter_map(Weak::upgrade)
            .filter(|s| s.commit())
            .count();
        debug!("GlContext({:#x}): finish committed {} write(s).", self.handles.context,
            committed);
    }
}

impl Default for GlContext {
    fn default() -> GlContext {
        GlContext::new()
    }
}


/// A graphics buffer object, such as a vertex buffer.
pub struct GlBuffer {
    storage: Arc<Storage>,
}

impl GlBuffer {
    pub fn name(&self) -> u32 {
        self.storage.name
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues a write of the whole buffer. Visible to compute after
    /// `GlContext::finish`.
    pub fn buffer_data<T: OclPrm>(&self, data: &[T]) -> InteropResult<()> {
        let bytes = to_bytes(data);
        if bytes.len() != self.len() {
            return Err(InteropError::BufferSize { found: bytes.len(), len: self.len() });
        }
        self.storage.queue_write(&bytes);
        Ok(())
    }

    /// Returns the committed contents.
    pub fn contents<T: OclPrm>(&self) -> Vec<T> {
        from_bytes(&self.storage.committed.lock())
    }
}

impl GlObject for GlBuffer {
    fn gl_name(&self) -> u32 {
        self.storage.name
    }

    fn byte_len(&self) -> usize {
        self.storage.len()
    }

    fn read_into(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.storage.committed.lock());
        trace!("GlBuffer({}): {} bytes read by compute.", self.storage.name, dst.len());
    }

    fn write_from(&self, src: &[u8]) {
        self.storage.committed.lock().copy_from_slice(src);
        trace!("GlBuffer({}): {} bytes written by compute.", self.storage.name, src.len());
    }
}


/// A two dimensional graphics texture.
pub struct GlTexture {
    storage: Arc<Storage>,
    width: usize,
    height: usize,
    format: ImageFormat,
}

impl GlTexture {
    pub fn name(&self) -> u32 {
        self.storage.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Queues a write of every texel. Visible to compute after
    /// `GlContext::finish`.
    pub fn tex_image<T: OclPrm>(&self, data: &[T]) -> InteropResult<()> {
        let bytes = to_bytes(data);
        let expected = self.storage.len();
        if bytes.len() != expected {
            return Err(InteropError::TextureSize { found: bytes.len(), expected,
                width: self.width, height: self.height });
        }
        self.storage.queue_write(&bytes);
        Ok(())
    }

    /// Returns the committed texels, row by row.
    pub fn read_pixels<T: OclPrm>(&self) -> Vec<T> {
        from_bytes(&self.storage.committed.lock())
    }
}

impl GlObject for GlTexture {
    fn gl_name(&self) -> u32 {
        self.storage.name
    }

    fn byte_len(&self) -> usize {
        self.storage.len()
    }

    fn read_into(&self, dst: &mut [u8]) {
        dst.copy_from_slice(&self.storage.committed.lock());
    }

    fn write_from(&self, src: &[u8]) {
        self.storage.committed.lock().copy_from_slice(src);
    }
}
