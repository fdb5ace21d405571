//! An image.

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::sync::Arc;
use log::debug;
use crate::core::{self, Error as OclCoreError, GlObject, HostDst, HostSrc,
    ImageChannelDataType, ImageChannelOrder, ImageDescriptor, ImageFormat, ImageInfo,
    ImageInfoResult, Mem as MemCore, MemFlags, MemInfo, MemInfoResult, MemInit, OclPrm};
use crate::error::{Error as OclError, Result as OclResult};
use crate::r#async::RwVec;
use crate::standard::{wait_list, Context, EventList, EventSlot, QueCtx, Queue, ReadDst,
    SpatialDims, WriteSrc};
use super::buffer::HostData;


/// An error related to an `Image` or an image command.
#[derive(Debug, thiserror::Error)]
pub enum ImageCmdError {
    #[error("No queue specified.")]
    NoQueue,
    #[error("No operation specified. Use '.read(...)', 'write(...)', etc. before calling \
        '.enq()'.")]
    Unspecified,
    #[error("Host data length ({data_len}) is too short for the region ({required} elements).")]
    DataLen { data_len: usize, required: usize },
    #[error("Image dimensions not specified.")]
    NoDims,
    #[error("{0}")]
    Core(#[from] OclCoreError),
}


/// The type of operation to be performed by a command.
#[derive(Debug)]
pub enum ImageCmdKind<'c, T: 'c + OclPrm> {
    Unspecified,
    Read { data: ReadDst<'c, T> },
    Write { data: WriteSrc<'c, T> },
    GLAcquire,
    GLRelease,
}

impl<'c, T: 'c + OclPrm> ImageCmdKind<'c, T> {
    fn is_unspec(&self) -> bool {
        matches!(*self, ImageCmdKind::Unspecified)
    }
}


/// An image command builder for enqueuing reads and writes.
///
/// Origins and regions are in pixels. Images are two dimensional, so the
/// third origin coordinate must be zero and the third region extent one.
#[must_use = "commands do nothing unless enqueued"]
#[derive(Debug)]
pub struct ImageCmd<'c, T: 'c + OclPrm> {
    queue: Option<&'c Queue>,
    obj_core: &'c MemCore,
    block: bool,
    origin: SpatialDims,
    region: SpatialDims,
    row_pitch_bytes: usize,
    slc_pitch_bytes: usize,
    kind: ImageCmdKind<'c, T>,
    ewait: Option<EventList>,
    enew: Option<EventSlot<'c>>,
    pixel_element_len: usize,
}

impl<'c, T: 'c + OclPrm> ImageCmd<'c, T> {
    /// Returns a new image command builder associated with with the
    /// memory object `obj_core` along with a default `queue` and the image
    /// dimensions.
    fn new(queue: Option<&'c Queue>, obj_core: &'c MemCore, dims: SpatialDims,
            pixel_element_len: usize) -> ImageCmd<'c, T> {
        ImageCmd {
            queue,
            obj_core,
            block: true,
            origin: SpatialDims::Three(0, 0, 0),
            region: dims,
            row_pitch_bytes: 0,
            slc_pitch_bytes: 0,
            kind: ImageCmdKind::Unspecified,
            ewait: None,
            enew: None,
            pixel_element_len,
        }
    }

    /// Specifies that this command will be a read operation.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified.
    ///
    /// ### More Information
    ///
    /// See [SDK][read_image] docs for more details.
    ///
    /// [read_image]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueReadImage.html
    pub fn read<R>(mut self, dst_data: R) -> ImageCmd<'c, T> where R: Into<ReadDst<'c, T>> {
        assert!(self.kind.is_unspec(), "ImageCmd::read(): Operation kind \
            already set for this command.");
        self.kind = ImageCmdKind::Read { data: dst_data.into() };
        self
    }

    /// Specifies that this command will be a write operation.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    ///
    /// ### More Information
    ///
    /// See [SDK][write_image] docs for more details.
    ///
    /// [write_image]: https://www.khronos.org/registry/OpenCL/sdk/1.2/docs/man/xhtml/clEnqueueWriteImage.html
    pub fn write<W>(mut self, src_data: W) -> ImageCmd<'c, T> where W: Into<WriteSrc<'c, T>> {
        assert!(self.kind.is_unspec(), "ImageCmd::write(): Operation kind \
            already set for this command.");
        self.kind = ImageCmdKind::Write { data: src_data.into() };
        self
    }

    /// Specifies that this command will acquire a graphics interop image.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    pub fn gl_acquire(mut self) -> ImageCmd<'c, T> {
        assert!(self.kind.is_unspec(), "ImageCmd::gl_acquire(): Operation kind \
            already set for this command.");
        self.kind = ImageCmdKind::GLAcquire;
        self
    }

    /// Specifies that this command will release a graphics interop image.
    ///
    /// ## Panics
    ///
    /// The command operation kind must not have already been specified
    pub fn gl_release(mut self) -> ImageCmd<'c, T> {
        assert!(self.kind.is_unspec(), "ImageCmd::gl_release(): Operation kind \
            already set for this command.");
        self.kind = ImageCmdKind::GLRelease;
        self
    }

    /// Specifies a queue to use for this call only.
    pub fn queue<'q, Q>(mut self, queue: &'q Q) -> ImageCmd<'c, T>
            where 'q: 'c, Q: 'q + AsRef<Queue> {
        self.queue = Some(queue.as_ref());
        self
    }

    /// Specifies whether or not to block the current thread until completion.
    ///
    /// Reads into and writes from plain slices always block.
    pub fn block(mut self, block: bool) -> ImageCmd<'c, T> {
        self.block = block;
        self
    }

    /// Sets the origin point for an operation.
    ///
    /// Defaults to [0, 0, 0] if not set.
    pub fn origin<D>(mut self, origin: D) -> ImageCmd<'c, T> where D: Into<SpatialDims> {
        self.origin = origin.into();
        self
    }

    /// Sets the region size for an operation.
    ///
    /// Defaults to the full size of the image as defined when first created.
    pub fn region<D>(mut self, region: D) -> ImageCmd<'c, T> where D: Into<SpatialDims> {
        self.region = region.into();
        self
    }

    /// Sets the host row and slice pitch for a read or write operation in
    /// bytes.
    ///
    /// Only needs to be set if the host data is not tightly packed.
    pub fn pitch_bytes(mut self, row_pitch_bytes: usize, slc_pitch_bytes: usize)
            -> ImageCmd<'c, T> {
        self.row_pitch_bytes = row_pitch_bytes;
        self.slc_pitch_bytes = slc_pitch_bytes;
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    pub fn ewait<Ewl>(mut self, ewait: Ewl) -> ImageCmd<'c, T> where Ewl: Into<EventList> {
        self.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination for a new, optionally created event
    /// associated with this command.
    pub fn enew<En>(mut self, enew: En) -> ImageCmd<'c, T> where En: Into<EventSlot<'c>> {
        self.enew = Some(enew.into());
        self
    }

    /// Returns the number of host elements a packed transfer of the region
    /// needs.
    fn required_len(&self, region: &[usize; 3]) -> usize {
        region[0] * region[1] * region[2] * self.pixel_element_len
    }

    /// Enqueues this command.
    pub fn enq(self) -> OclResult<()> {
        let queue = self.queue.ok_or(ImageCmdError::NoQueue)?;
        let origin = self.origin.to_offset()?;
        let region = self.region.to_lens()?;
        let required = self.required_len(&region);
        let packed = self.row_pitch_bytes == 0;
        let size = mem::size_of::<T>();
        let wait_events = wait_list(self.ewait.as_ref());

        let event = match self.kind {
            ImageCmdKind::Read { data } => {
                let dst = match data {
                    ReadDst::Slice(slice) => {
                        if packed && slice.len() < required {
                            return Err(ImageCmdError::DataLen { data_len: slice.len(),
                                required }.into());
                        }
                        HostDst::Slice(bytemuck::cast_slice_mut(slice))
                    },
                    ReadDst::RwVec(ref rw_vec) => HostDst::Shared { mem: rw_vec.host_mem().clone(),
                        offset: 0, len: rw_vec.len() * size },
                };
                core::enqueue_read_image(queue.as_core(), self.obj_core, self.block, origin,
                    region, self.row_pitch_bytes, self.slc_pitch_bytes, dst,
                    wait_events.as_deref()).map_err(ImageCmdError::from)?
            },
            ImageCmdKind::Write { data } => {
                let src = match data {
                    WriteSrc::Slice(slice) => {
                        if packed && slice.len() < required {
                            return Err(ImageCmdError::DataLen { data_len: slice.len(),
                                required }.into());
                        }
                        HostSrc::Slice(bytemuck::cast_slice(slice))
                    },
                    WriteSrc::RwVec(ref rw_vec) => HostSrc::Shared { mem: rw_vec.host_mem().clone(),
                        offset: 0, len: rw_vec.len() * size },
                };
                core::enqueue_write_image(queue.as_core(), self.obj_core, self.block, origin,
                    region, self.row_pitch_bytes, self.slc_pitch_bytes, src,
                    wait_events.as_deref()).map_err(ImageCmdError::from)?
            },
            ImageCmdKind::GLAcquire => {
                core::enqueue_acquire_gl_objects(queue.as_core(),
                    std::slice::from_ref(self.obj_core), wait_events.as_deref())
                    .map_err(ImageCmdError::from)?
            },
            ImageCmdKind::GLRelease => {
                core::enqueue_release_gl_objects(queue.as_core(),
                    std::slice::from_ref(self.obj_core), wait_events.as_deref())
                    .map_err(ImageCmdError::from)?
            },
            ImageCmdKind::Unspecified => return Err(ImageCmdError::Unspecified.into()),
        };

        if let Some(enew) = self.enew {
            enew.fill(event);
        }
        Ok(())
    }
}


/// A section of device memory which represents a two dimensional image.
///
/// `T` is the host element type. A pixel is made of `pixel_element_len`
/// elements, so an RGBA image of `UnormInt8` channels may be accessed as
/// `u8` (four per pixel) or `[u8; 4]` (one per pixel).
///
/// Use `::builder` for an easy way to create.
#[derive(Clone, Debug)]
pub struct Image<T: OclPrm> {
    obj_core: MemCore,
    queue: Option<Queue>,
    dims: SpatialDims,
    pixel_element_len: usize,
    _pixel: PhantomData<T>,
}

impl<T: OclPrm> Image<T> {
    /// Returns an `ImageBuilder`. This is the recommended method to create
    /// a new `Image`.
    pub fn builder<'a>() -> ImageBuilder<'a, T> {
        ImageBuilder::new()
    }

    /// Returns a new `Image`.
    ///
    /// Prefer `::builder` to create a new image.
    pub fn new<'o, Q>(que_ctx: Q, flags: MemFlags, image_format: ImageFormat,
            image_desc: ImageDescriptor, host_data: Option<&[T]>) -> OclResult<Image<T>>
            where Q: Into<QueCtx<'o>> {
        let init = match host_data {
            Some(hd) => MemInit::Copy(bytemuck::cast_slice(hd)),
            None => MemInit::Uninit,
        };
        Image::from_init(que_ctx.into(), flags, image_format, image_desc, init)
    }

    fn from_init(que_ctx: QueCtx, flags: MemFlags, image_format: ImageFormat,
            image_desc: ImageDescriptor, init: MemInit) -> OclResult<Image<T>> {
        let context = que_ctx.context_cloned();
        let obj_core = core::create_image(context.as_core(), flags, &image_format, &image_desc,
            init).map_err(ImageCmdError::from)?;
        Image::from_core(obj_core, que_ctx.into())
    }

    /// Wraps a core image, reading its dimensions and pixel size.
    fn from_core(obj_core: MemCore, queue: Option<Queue>) -> OclResult<Image<T>> {
        let pixel_element_len = match core::get_image_info(&obj_core, ImageInfo::ElementSize)? {
            ImageInfoResult::ElementSize(s) => s / mem::size_of::<T>(),
            _ => return Err("Image::from_core: Unexpected 'ImageInfoResult' variant.".into()),
        };
        let width = match core::get_image_info(&obj_core, ImageInfo::Width)? {
            ImageInfoResult::Width(w) => w,
            _ => return Err("Image::from_core: Unexpected 'ImageInfoResult' variant.".into()),
        };
        let height = match core::get_image_info(&obj_core, ImageInfo::Height)? {
            ImageInfoResult::Height(h) => h,
            _ => return Err("Image::from_core: Unexpected 'ImageInfoResult' variant.".into()),
        };
        debug!("Image created: {}x{} ({} elements of '{}' per pixel).", width, height,
            pixel_element_len, std::any::type_name::<T>());

        Ok(Image {
            obj_core,
            queue,
            dims: SpatialDims::Two(width, height),
            pixel_element_len,
            _pixel: PhantomData,
        })
    }

    /// Returns a new `Image` which shares its storage with a graphics
    /// texture.
    ///
    /// Only access flags may be given. The context must have been created
    /// to share with a graphics context.
    pub fn from_gl_texture_2d<'o, Q>(que_ctx: Q, flags: Option<MemFlags>,
            gl_object: Arc<dyn GlObject>, image_format: ImageFormat, width: usize,
            height: usize) -> OclResult<Image<T>>
            where Q: Into<QueCtx<'o>> {
        let que_ctx = que_ctx.into();
        let context = que_ctx.context_cloned();
        let obj_core = core::create_from_gl_texture_2d(context.as_core(),
            flags.unwrap_or(MemFlags::READ_WRITE), gl_object, &image_format, width, height)
            .map_err(ImageCmdError::from)?;
        Image::from_core(obj_core, que_ctx.into())
    }

    /// Returns an image command builder used to read, write, etc.
    ///
    /// Call `.enq()` to enqueue the command.
    pub fn cmd(&self) -> ImageCmd<T> {
        ImageCmd::new(self.queue.as_ref(), &self.obj_core, self.dims, self.pixel_element_len)
    }

    /// Returns an image command builder set to read.
    ///
    /// Call `.enq()` to enqueue the command.
    pub fn read<'c, R>(&'c self, data: R) -> ImageCmd<'c, T> where R: Into<ReadDst<'c, T>> {
        self.cmd().read(data)
    }

    /// Returns an image command builder set to write.
    ///
    /// Call `.enq()` to enqueue the command.
    pub fn write<'c, W>(&'c self, data: W) -> ImageCmd<'c, T> where W: Into<WriteSrc<'c, T>> {
        self.cmd().write(data)
    }

    /// Changes the default queue.
    ///
    /// The new queue must be associated with a device in this image's
    /// context.
    pub fn set_default_queue(&mut self, queue: Queue) -> &mut Image<T> {
        self.queue = Some(queue);
        self
    }

    /// Returns a reference to the default queue.
    pub fn default_queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }

    /// Returns this image's dimensions.
    pub fn dims(&self) -> &SpatialDims {
        &self.dims
    }

    /// Returns the total number of pixels in this image.
    pub fn pixel_count(&self) -> usize {
        self.dims.to_len()
    }

    /// Returns the number of elements making up each pixel.
    pub fn pixel_element_len(&self) -> usize {
        self.pixel_element_len
    }

    /// Returns the total number of pixel elements in this image. Equivalent to its length.
    pub fn element_count(&self) -> usize {
        self.pixel_count() * self.pixel_element_len()
    }

    /// Get information about this image.
    pub fn info(&self, info_kind: ImageInfo) -> OclResult<ImageInfoResult> {
        core::get_image_info(&self.obj_core, info_kind).map_err(OclError::from)
    }

    /// Returns info about this image's memory.
    pub fn mem_info(&self, info_kind: MemInfo) -> OclResult<MemInfoResult> {
        core::get_mem_object_info(&self.obj_core, info_kind).map_err(OclError::from)
    }

    /// Returns a reference to the core pointer wrapper, usable by functions in
    /// the `core` module.
    #[inline]
    pub fn as_core(&self) -> &MemCore {
        &self.obj_core
    }

    /// Format image info.
    fn fmt_info(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("Format", &self.info(ImageInfo::Format))
            .field("ElementSize", &self.info(ImageInfo::ElementSize))
            .field("RowPitch", &self.info(ImageInfo::RowPitch))
            .field("Width", &self.info(ImageInfo::Width))
            .field("Height", &self.info(ImageInfo::Height))
            .finish()
    }

    /// Format image mem info.
    fn fmt_mem_info(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Mem")
            .field("Type", &self.mem_info(MemInfo::Type))
            .field("Flags", &self.mem_info(MemInfo::Flags))
            .field("Size", &self.mem_info(MemInfo::Size))
            .field("MapCount", &self.mem_info(MemInfo::MapCount))
            .field("ReferenceCount", &self.mem_info(MemInfo::ReferenceCount))
            .finish()
    }
}

impl<T: OclPrm> fmt::Display for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_info(f)?;
        write!(f, " ")?;
        self.fmt_mem_info(f)
    }
}

impl<T: OclPrm> Deref for Image<T> {
    type Target = MemCore;

    fn deref(&self) -> &MemCore {
        &self.obj_core
    }
}

impl<T: OclPrm> AsRef<MemCore> for Image<T> {
    fn as_ref(&self) -> &MemCore {
        &self.obj_core
    }
}


/// A builder for `Image`.
#[must_use = "builders do nothing unless '::build' is called"]
#[derive(Debug)]
pub struct ImageBuilder<'a, T> where T: 'a + OclPrm {
    queue_option: Option<QueCtx<'a>>,
    flags: MemFlags,
    host_data: HostData<'a, T>,
    image_format: ImageFormat,
    dims: SpatialDims,
    row_pitch_bytes: usize,
}

impl<'a, T> ImageBuilder<'a, T> where T: 'a + OclPrm {
    /// Returns a new `ImageBuilder` with very basic defaults.
    ///
    /// ## Defaults
    ///
    /// * Flags: `MemFlags::READ_WRITE`
    /// * Image format: `Rgba` channels of `SnormInt8`
    /// * Dimensions: unspecified (must be set)
    pub fn new() -> ImageBuilder<'a, T> {
        ImageBuilder {
            queue_option: None,
            flags: MemFlags::READ_WRITE,
            host_data: HostData::None,
            image_format: ImageFormat::new_rgba(),
            dims: SpatialDims::Unspecified,
            row_pitch_bytes: 0,
        }
    }

    /// Sets the context with which to associate the image.
    ///
    /// May not be used in combination with `::queue` (use one or the other).
    pub fn context(mut self, context: &'a Context) -> ImageBuilder<'a, T> {
        assert!(self.queue_option.is_none());
        self.queue_option = Some(QueCtx::Context(context));
        self
    }

    /// Sets the default queue.
    ///
    /// If this is set, the context associated with the `default_queue` will
    /// be used when creating the image (use one or the other).
    pub fn queue(mut self, default_queue: Queue) -> ImageBuilder<'a, T> {
        assert!(self.queue_option.is_none());
        self.queue_option = Some(QueCtx::Queue(default_queue));
        self
    }

    /// Sets the flags used when creating the image.
    ///
    /// Defaults to `MemFlags::READ_WRITE`.
    pub fn flags(mut self, flags: MemFlags) -> ImageBuilder<'a, T> {
        self.flags = flags;
        self
    }

    /// Specifies host data to copy into the new image.
    ///
    /// Rows are `width * bytes per pixel` apart unless `::row_pitch_bytes`
    /// is set.
    pub fn copy_host_slice(mut self, host_slice: &'a [T]) -> ImageBuilder<'a, T> {
        assert!(matches!(self.host_data, HostData::None), "ImageBuilder::copy_host_slice: \
            Host data has already been specified.");
        self.host_data = HostData::Copy(host_slice);
        self
    }

    /// Specifies a host vector to use as the storage of the new image.
    ///
    /// The vector must be tightly packed.
    pub fn use_host_vec(mut self, rw_vec: &RwVec<T>) -> ImageBuilder<'a, T> {
        assert!(matches!(self.host_data, HostData::None), "ImageBuilder::use_host_vec: \
            Host data has already been specified.");
        self.host_data = HostData::Use(rw_vec.clone());
        self
    }

    /// Sets the channel order.
    pub fn channel_order(mut self, order: ImageChannelOrder) -> ImageBuilder<'a, T> {
        self.image_format.channel_order = order;
        self
    }

    /// Sets the channel data type.
    pub fn channel_data_type(mut self, data_type: ImageChannelDataType) -> ImageBuilder<'a, T> {
        self.image_format.channel_data_type = data_type;
        self
    }

    /// Sets the entire image format.
    pub fn image_format(mut self, image_format: ImageFormat) -> ImageBuilder<'a, T> {
        self.image_format = image_format;
        self
    }

    /// The width and height of the image in pixels.
    pub fn dims<D>(mut self, dims: D) -> ImageBuilder<'a, T> where D: Into<SpatialDims> {
        self.dims = dims.into();
        self
    }

    /// The row pitch of the host data in bytes.
    ///
    /// Zero (the default) means `width * bytes per pixel`.
    pub fn row_pitch_bytes(mut self, row_pitch: usize) -> ImageBuilder<'a, T> {
        self.row_pitch_bytes = row_pitch;
        self
    }

    /// Builds and returns a new `Image`.
    pub fn build(self) -> OclResult<Image<T>> {
        let ImageBuilder { queue_option, flags, host_data, image_format, dims,
            row_pitch_bytes } = self;
        let que_ctx = queue_option.ok_or_else(|| OclError::from("ImageBuilder::build: A \
            context or default queue must be set with '.context(...)' or '.queue(...)'."))?;
        let lens = dims.to_lens().map_err(|_| ImageCmdError::NoDims)?;
        let image_desc = ImageDescriptor::new_2d(lens[0], lens[1], row_pitch_bytes);

        let init = match host_data {
            HostData::None => MemInit::Uninit,
            HostData::Copy(hs) => MemInit::Copy(bytemuck::cast_slice(hs)),
            HostData::Use(ref rw_vec) => MemInit::Alias(rw_vec.host_mem().clone()),
        };
        Image::from_init(que_ctx, flags, image_format, image_desc, init)
    }
}

impl<'a, T> Default for ImageBuilder<'a, T> where T: 'a + OclPrm {
    fn default() -> ImageBuilder<'a, T> {
        ImageBuilder::new()
    }
}
