//! A convenience wrapper chimera of `Program`, `Queue`, and `Context`.

use std::ops::Deref;
use std::path::PathBuf;
use log::info;
use crate::core::{CommandQueueProperties, KernelLibrary, OclPrm};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Buffer, BufferBuilder, Context, Device, DeviceSpecifier, KernelBuilder,
    Platform, Program, ProgramBuilder, Queue, SpatialDims};


/// An all-in-one chimera of the `Program`, `Queue`, `Context` and
/// (optionally) `SpatialDims` types.
///
/// Handy when you only need a single context, program, and queue for your
/// project or when using a unique context and program on each device.
///
/// All `ProQue` functionality is also provided separately by the `Context`,
/// `Queue`, `Program`, and `SpatialDims` types.
#[derive(Clone, Debug)]
pub struct ProQue {
    context: Context,
    queue: Queue,
    program: Program,
    dims: Option<SpatialDims>,
}

impl ProQue {
    /// Returns a new `ProQueBuilder`.
    ///
    /// This is the recommended way to create a new `ProQue`.
    pub fn builder() -> ProQueBuilder {
        ProQueBuilder::new()
    }

    /// Creates a new `ProQue` from individual parts.
    ///
    /// Use `::builder` instead unless you know what you're doing. Creating
    /// from components associated with different devices or contexts will
    /// cause errors later on.
    pub fn new<D: Into<SpatialDims>>(context: Context, queue: Queue, program: Program,
            dims: Option<D>) -> ProQue {
        ProQue {
            context,
            queue,
            program,
            dims: dims.map(|d| d.into()),
        }
    }

    /// Returns a new `KernelBuilder` with the program and queue of this
    /// `ProQue` pre-configured, along with the global work size if
    /// dimensions are set.
    ///
    /// Use `::arg` on the builder to add arguments and `::build` to create
    /// the kernel.
    pub fn kernel_builder<S: Into<String>>(&self, name: S) -> KernelBuilder {
        let mut kb = KernelBuilder::new();
        kb.program(&self.program);
        kb.name(name);
        kb.queue(self.queue.clone());

        if let Some(d) = self.dims {
            kb.global_work_size(d);
        }

        kb
    }

    /// Returns the maximum workgroup size supported by the device associated
    /// with this `ProQue`.
    pub fn max_wg_size(&self) -> OclResult<usize> {
        self.queue.device().max_wg_size()
    }

    /// Returns a new `BufferBuilder` with the default queue and length
    /// (if dimensions are set) of this `ProQue`.
    pub fn buffer_builder<T: OclPrm>(&self) -> BufferBuilder<T> {
        let bb = Buffer::builder().queue(self.queue.clone());

        match self.dims {
            Some(d) => bb.len(d),
            None => bb,
        }
    }

    /// Returns a new buffer of the length of this `ProQue`'s dimensions,
    /// with unspecified contents.
    ///
    /// Fails if the dimensions have not been set.
    pub fn create_buffer<T: OclPrm>(&self) -> OclResult<Buffer<T>> {
        let dims = self.dims_result()?;
        Buffer::<T>::builder()
            .queue(self.queue.clone())
            .len(*dims)
            .build()
    }

    /// Sets the default dimensions used when creating buffers and kernels.
    pub fn set_dims<D: Into<SpatialDims>>(&mut self, dims: D) {
        self.dims = Some(dims.into());
    }

    /// Returns the queue created when building this `ProQue`.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Returns the context created when building this `ProQue`.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the program created when building this `ProQue`.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the device associated with the queue.
    pub fn device(&self) -> Device {
        self.queue.device()
    }

    /// Returns the current `dims` or panics.
    ///
    /// ## Panics
    ///
    /// The dimensions must have been set.
    pub fn dims(&self) -> &SpatialDims {
        match self.dims {
            Some(ref d) => d,
            None => panic!("ProQue::dims: Dimensions have not been set."),
        }
    }

    /// Returns the current `dims` or an error.
    pub fn dims_result(&self) -> OclResult<&SpatialDims> {
        self.dims.as_ref().ok_or_else(|| OclError::from("ProQue::dims_result: Dimensions have \
            not been set. Use '::set_dims' or 'ProQueBuilder::dims'."))
    }
}

impl Deref for ProQue {
    type Target = Queue;

    fn deref(&self) -> &Queue {
        &self.queue
    }
}


/// A builder for `ProQue`.
#[must_use = "builders do nothing unless '::build' is called"]
#[derive(Clone, Debug, Default)]
pub struct ProQueBuilder {
    platform: Option<Platform>,
    context: Option<Context>,
    device_spec: Option<DeviceSpecifier>,
    program_builder: Option<ProgramBuilder>,
    dims: Option<SpatialDims>,
    queue_properties: Option<CommandQueueProperties>,
}

impl ProQueBuilder {
    /// Returns a new `ProQueBuilder` with an empty / uninitialized
    /// configuration.
    ///
    /// Use `ProQue::builder` for a more convenient syntax.
    pub fn new() -> ProQueBuilder {
        ProQueBuilder::default()
    }

    /// Sets the platform to be used and returns the builder.
    ///
    /// Defaults to the first available platform.
    pub fn platform(&mut self, platform: Platform) -> &mut ProQueBuilder {
        self.platform = Some(platform);
        self
    }

    /// Sets the context and returns the `ProQueBuilder`.
    ///
    /// If a platform is also set, it is ignored.
    pub fn context(&mut self, context: Context) -> &mut ProQueBuilder {
        self.context = Some(context);
        self
    }

    /// Sets the device to be used.
    ///
    /// The specifier must resolve to exactly one device. Defaults to the
    /// first GPU of the platform, falling back to its first CPU.
    pub fn device<D: Into<DeviceSpecifier>>(&mut self, device_spec: D) -> &mut ProQueBuilder {
        assert!(self.device_spec.is_none(), "ProQueBuilder::device: Device already specified");
        self.device_spec = Some(device_spec.into());
        self
    }

    /// Adds a source string to the program.
    ///
    /// Creates a default program builder if one has not been set.
    pub fn src<S: Into<String>>(&mut self, src: S) -> &mut ProQueBuilder {
        self.program_builder.get_or_insert_with(ProgramBuilder::new).src(src);
        self
    }

    /// Adds a source file to the program, read when the program is built.
    ///
    /// Creates a default program builder if one has not been set.
    pub fn src_file<P: Into<PathBuf>>(&mut self, file_path: P) -> &mut ProQueBuilder {
        self.program_builder.get_or_insert_with(ProgramBuilder::new).src_file(file_path);
        self
    }

    /// Adds native kernel implementations to the program.
    ///
    /// Creates a default program builder if one has not been set.
    pub fn kernels(&mut self, library: KernelLibrary) -> &mut ProQueBuilder {
        self.program_builder.get_or_insert_with(ProgramBuilder::new).kernels(library);
        self
    }

    /// Sets the program builder, replacing any sources added so far.
    pub fn prog_bldr(&mut self, program_builder: ProgramBuilder) -> &mut ProQueBuilder {
        self.program_builder = Some(program_builder);
        self
    }

    /// Sets the built-in dimensions.
    ///
    /// This is optional. Dimensions are used as the default global work size
    /// of kernels and the length of buffers created through the `ProQue`.
    pub fn dims<D: Into<SpatialDims>>(&mut self, dims: D) -> &mut ProQueBuilder {
        self.dims = Some(dims.into());
        self
    }

    /// Sets the command queue properties.
    pub fn queue_properties(&mut self, props: CommandQueueProperties) -> &mut ProQueBuilder {
        self.queue_properties = Some(props);
        self
    }

    /// Returns a new `ProQue`.
    ///
    /// Fails if no program source or kernels have been added, if the device
    /// specifier does not resolve to exactly one device, or if any of the
    /// context, queue, or program fail to build.
    pub fn build(&self) -> OclResult<ProQue> {
        let program_builder = self.program_builder.as_ref().ok_or_else(|| {
            OclError::from("ProQueBuilder::build: No program builder or source specified. Use \
                '::src', '::src_file', or '::prog_bldr'.")
        })?;

        let platform = match self.context {
            Some(ref context) => context.platform(),
            None => match self.platform {
                Some(ref p) => p.clone(),
                None => Platform::first()?,
            },
        };

        let device = match self.device_spec {
            Some(ref ds) => {
                let device_list = ds.to_device_list(Some(&platform))?;
                if device_list.len() != 1 {
                    return Err(format!("ProQueBuilder::build: The device specifier ({:?}) must \
                        resolve to exactly one device (resolved to {}).", ds,
                        device_list.len()).into());
                }
                device_list[0].clone()
            },
            None => Device::prefer_gpu(&platform)?,
        };

        let context = match self.context {
            Some(ref c) => c.clone(),
            None => Context::builder()
                .platform(platform)
                .devices(device.clone())
                .build()?,
        };

        let queue = Queue::new(&context, device.clone(), self.queue_properties)?;

        let program = if program_builder.get_device_spec().is_some() {
            program_builder.build(&context)?
        } else {
            let mut program_builder = program_builder.clone();
            program_builder.devices(device.clone());
            program_builder.build(&context)?
        };

        info!("ProQue built on '{}'.", device.name().unwrap_or_default());

        Ok(ProQue {
            context,
            queue,
            program,
            dims: self.dims,
        })
    }
}
