//! A compute kernel.

use std::any::{self, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::ops::Deref;
use log::debug;
use crate::core::{self, ArgVal, Kernel as KernelCore, KernelArgInfo, KernelArgInfoResult,
    KernelInfo, KernelInfoResult, KernelWorkGroupInfo, KernelWorkGroupInfoResult, OclPrm,
    ParamKind};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{wait_list, Buffer, Device, EventList, EventSlot, Image, Program, Queue,
    Sampler, SpatialDims, WorkDims};
use self::arg_type::ArgType;


/// An error related to a `Kernel`, `KernelBuilder`, or `KernelCmd`.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("No queue specified.")]
    CmdNoQueue,
    #[error("Global Work Size cannot be left unspecified. Set a default for the kernel or \
        specify one when enqueuing command.")]
    CmdNoGws,
    #[error("Unable to resolve argument named: '{0}'. Ensure that an argument with that name \
        has been declared by the kernel or by the builder.")]
    NamedArgsInvalidArgName(String),
    #[error("Kernel arg index out of range. (kernel: {0}, index: {1})")]
    ArgIdxOor(String, u32),
    #[error("Kernel argument type mismatch. The argument named: '{arg_name}' at index: [{idx}] \
        should be a '{ty_name}' ({ty:?}), found: '{found}'.")]
    ArgTypeMismatch {
        idx: u32,
        arg_name: String,
        ty_name: String,
        ty: ArgType,
        found: &'static str,
    },
    #[error("No program specified.")]
    BuilderNoProgram,
    #[error("No kernel name specified.")]
    BuilderNoKernelName,
    #[error("The wrong number of kernel arguments have been specified (required: {required}, \
        specified: {specified}). Use named arguments with 'None' or zero values to declare \
        arguments you plan to assign a value to at a later time.")]
    BuilderWrongArgCount { required: u32, specified: u32 },
}


/// A kernel command builder used to enqueue a kernel with a mix of default
/// and optionally specified arguments.
#[must_use = "commands do nothing unless enqueued"]
pub struct KernelCmd<'k> {
    kernel: &'k KernelCore,
    queue: Option<&'k Queue>,
    gwo: SpatialDims,
    gws: SpatialDims,
    lws: SpatialDims,
    task: bool,
    ewait: Option<EventList>,
    enew: Option<EventSlot<'k>>,
}

impl<'k> KernelCmd<'k> {
    /// Specifies a queue to use for this call only.
    ///
    /// Overrides the kernel's default queue if one is set. If no default
    /// queue is set, this method **must** be called before enqueuing the
    /// kernel.
    pub fn queue(mut self, queue: &'k Queue) -> KernelCmd<'k> {
        self.queue = Some(queue);
        self
    }

    /// Specifies a global work offset for this call only.
    pub fn global_work_offset<D: Into<SpatialDims>>(mut self, gwo: D) -> KernelCmd<'k> {
        self.gwo = gwo.into();
        self
    }

    /// Specifies a global work size for this call only.
    pub fn global_work_size<D: Into<SpatialDims>>(mut self, gws: D) -> KernelCmd<'k> {
        self.gws = gws.into();
        self
    }

    /// Specifies a local work size for this call only.
    pub fn local_work_size<D: Into<SpatialDims>>(mut self, lws: D) -> KernelCmd<'k> {
        self.lws = lws.into();
        self
    }

    /// Enqueues the kernel as a single work-item task, ignoring any work
    /// sizes.
    pub fn task(mut self) -> KernelCmd<'k> {
        self.task = true;
        self
    }

    /// Specifies an event or list of events to wait on before the command
    /// will run.
    ///
    /// When events generated using the `::enew` method of **other**,
    /// previously enqueued commands are passed here (either individually or
    /// as part of an [`EventList`]), this command will not execute until
    /// those commands have completed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut event_list = EventList::new();
    /// kernel.cmd().queue(&queue_1).enew(&mut event_list).enq()?;
    /// buffer.read(&mut vec).queue(&queue_2).ewait(&event_list).enq()?;
    /// ```
    ///
    /// [`EventList`]: struct.EventList.html
    pub fn ewait<Ewl: Into<EventList>>(mut self, ewait: Ewl) -> KernelCmd<'k> {
        self.ewait = Some(ewait.into());
        self
    }

    /// Specifies the destination to store a new event associated with this
    /// command.
    ///
    /// The destination can be a mutable reference to an empty event (created
    /// using [`Event::empty`]) or a mutable reference to an event list.
    ///
    /// [`Event::empty`]: struct.Event.html#method.empty
    pub fn enew<En: Into<EventSlot<'k>>>(mut self, new_event_dest: En) -> KernelCmd<'k> {
        self.enew = Some(new_event_dest.into());
        self
    }

    /// Enqueues this kernel command.
    pub fn enq(self) -> OclResult<()> {
        let queue = self.queue.ok_or(KernelError::CmdNoQueue)?;
        let wait_events = wait_list(self.ewait.as_ref());

        if self.task {
            debug!("KernelCmd::enq: '{}' as a task.", self.kernel.name());
            let event = core::enqueue_task(queue.as_core(), self.kernel, wait_events.as_deref())?;
            if let Some(slot) = self.enew {
                slot.fill(event);
            }
            return Ok(());
        }

        let dim_count = self.gws.dim_count();
        let gws = self.gws.to_work_size().ok_or(KernelError::CmdNoGws)?;

        debug!("KernelCmd::enq: '{}' gws: {:?}, lws: {:?}.", self.kernel.name(), self.gws,
            self.lws);

        let event = core::enqueue_kernel(queue.as_core(), self.kernel, dim_count,
            self.gwo.to_work_offset(), &gws, self.lws.to_work_size(), wait_events.as_deref())?;

        if let Some(slot) = self.enew {
            slot.fill(event);
        }
        Ok(())
    }
}


/// Converts an argument index specifier to `u32`.
#[derive(Clone, Debug)]
pub enum ArgIdxSpecifier {
    Uint(u32),
    Str(Cow<'static, str>),
}

impl ArgIdxSpecifier {
    fn to_idx(&self, kernel: &Kernel) -> OclResult<u32> {
        match *self {
            ArgIdxSpecifier::Uint(idx) => Ok(idx),
            ArgIdxSpecifier::Str(ref name) => kernel.resolve_arg_name(name),
        }
    }
}

impl From<u32> for ArgIdxSpecifier {
    fn from(idx: u32) -> ArgIdxSpecifier {
        ArgIdxSpecifier::Uint(idx)
    }
}

impl From<i32> for ArgIdxSpecifier {
    fn from(idx: i32) -> ArgIdxSpecifier {
        ArgIdxSpecifier::Uint(idx.max(0) as u32)
    }
}

impl From<usize> for ArgIdxSpecifier {
    fn from(idx: usize) -> ArgIdxSpecifier {
        ArgIdxSpecifier::Uint(idx as u32)
    }
}

impl From<&'static str> for ArgIdxSpecifier {
    fn from(s: &'static str) -> ArgIdxSpecifier {
        ArgIdxSpecifier::Str(s.into())
    }
}

impl From<String> for ArgIdxSpecifier {
    fn from(s: String) -> ArgIdxSpecifier {
        ArgIdxSpecifier::Str(s.into())
    }
}


/// Wraps argument values of different types.
///
/// Buffers, images, scalars and vectors convert into this, carrying their
/// element type so it can be checked against the declared parameter.
pub struct ArgValConverter<T: OclPrm> {
    val: ArgVal,
    type_id: Option<TypeId>,
    _ty: PhantomData<T>,
}

impl<T: OclPrm> ArgValConverter<T> {
    fn new(val: ArgVal) -> ArgValConverter<T> {
        ArgValConverter { val, type_id: Some(TypeId::of::<T>()), _ty: PhantomData }
    }
}

impl<'b, T: OclPrm> From<Option<&'b Buffer<T>>> for ArgValConverter<T> {
    /// Converts from an Option<`Buffer`>. `None` is a null pointer.
    fn from(buf: Option<&'b Buffer<T>>) -> ArgValConverter<T> {
        ArgValConverter::new(buf.map_or(ArgVal::mem_null(), |b| ArgVal::mem(b.as_core())))
    }
}

impl<'b, T: OclPrm> From<&'b Buffer<T>> for ArgValConverter<T> {
    fn from(buf: &'b Buffer<T>) -> ArgValConverter<T> {
        ArgValConverter::new(ArgVal::mem(buf.as_core()))
    }
}

impl<'b, T: OclPrm> From<&'b mut Buffer<T>> for ArgValConverter<T> {
    fn from(buf: &'b mut Buffer<T>) -> ArgValConverter<T> {
        ArgValConverter::from(&*buf)
    }
}

impl<T: OclPrm> From<Buffer<T>> for ArgValConverter<T> {
    fn from(buf: Buffer<T>) -> ArgValConverter<T> {
        ArgValConverter::from(&buf)
    }
}

impl<'b, T: OclPrm> From<Option<&'b Image<T>>> for ArgValConverter<T> {
    fn from(img: Option<&'b Image<T>>) -> ArgValConverter<T> {
        ArgValConverter::new(img.map_or(ArgVal::mem_null(), |i| ArgVal::mem(i.as_core())))
    }
}

impl<'b, T: OclPrm> From<&'b Image<T>> for ArgValConverter<T> {
    fn from(img: &'b Image<T>) -> ArgValConverter<T> {
        ArgValConverter::new(ArgVal::mem(img.as_core()))
    }
}

impl<'b, T: OclPrm> From<&'b mut Image<T>> for ArgValConverter<T> {
    fn from(img: &'b mut Image<T>) -> ArgValConverter<T> {
        ArgValConverter::from(&*img)
    }
}

impl<T: OclPrm> From<Image<T>> for ArgValConverter<T> {
    fn from(img: Image<T>) -> ArgValConverter<T> {
        ArgValConverter::from(&img)
    }
}

impl<'b, T: OclPrm> From<&'b T> for ArgValConverter<T> {
    /// Converts from a scalar or vector value.
    fn from(prm: &'b T) -> ArgValConverter<T> {
        ArgValConverter::new(ArgVal::scalar(prm))
    }
}

impl<T: OclPrm> From<T> for ArgValConverter<T> {
    /// Converts from a scalar or vector value.
    fn from(prm: T) -> ArgValConverter<T> {
        ArgValConverter::new(ArgVal::scalar(&prm))
    }
}


/// An argument recorded by a `KernelBuilder`.
#[derive(Clone, Debug)]
struct BuilderArg {
    val: ArgVal,
    type_id: Option<TypeId>,
    type_name: &'static str,
}


/// A kernel which represents a 'procedure'.
///
/// Corresponds to code which must have already been compiled into a program.
///
/// `Kernel` includes features that a bare kernel handle does not:
///
/// 1. Arguments checked against the declared element type (not just the
///    declared kind and size)
/// 2. Arguments addressable by the name used in the source or by a name
///    declared with the builder
/// 3. Stored defaults for the queue, global work offset, global work size
///    and local work size
///
/// A `Kernel` may not be cloned but may be sent between threads. Use the
/// `KernelBuilder` (which is clonable and re-usable) to create multiple
/// identical kernels.
#[derive(Debug)]
pub struct Kernel {
    obj_core: KernelCore,
    named_args: HashMap<Cow<'static, str>, u32>,
    queue: Option<Queue>,
    gwo: SpatialDims,
    gws: SpatialDims,
    lws: SpatialDims,
    arg_types: Vec<ArgType>,
}

impl Kernel {
    /// Returns a new `KernelBuilder`.
    pub fn builder<'p>() -> KernelBuilder<'p> {
        KernelBuilder::new()
    }

    /// Verifies that `T` matches the declared type of argument `arg_idx`.
    fn verify_arg_type<T: OclPrm>(&self, arg_idx: u32) -> OclResult<()> {
        let arg_type = self.arg_types.get(arg_idx as usize)
            .ok_or_else(|| KernelError::ArgIdxOor(self.name(), arg_idx))?;

        if arg_type.matches(TypeId::of::<T>()) {
            Ok(())
        } else {
            Err(type_mismatch(&self.obj_core, arg_idx, arg_type, any::type_name::<T>()))
        }
    }

    fn resolve_arg_name(&self, name: &str) -> OclResult<u32> {
        self.named_args.get(name).cloned()
            .or_else(|| self.obj_core.signature().param_idx(name).map(|idx| idx as u32))
            .ok_or_else(|| KernelError::NamedArgsInvalidArgName(name.to_owned()).into())
    }

    /// Returns the index of an argument declared with the builder or in
    /// the kernel source under `name`.
    pub fn named_arg_idx(&self, name: &str) -> Option<u32> {
        self.resolve_arg_name(name).ok()
    }

    /// Sets a `Buffer`, `Image`, scalar, or vector argument by index or by
    /// name.
    ///
    /// ### Example
    /// ```rust,ignore
    /// let kern = pro_que.kernel_builder("multiply_by_scalar")
    ///     .arg(&0f32)
    ///     .arg(None::<&Buffer<f32>>)
    ///     .arg_named("result", None::<&Buffer<f32>>)
    ///     .build()?;
    ///
    /// kern.set_arg("result", &result_buffer)?;
    /// kern.set_arg(0, &COEFF)?;
    /// kern.set_arg(1, Some(&source_buffer))?;
    /// ```
    pub fn set_arg<T, Ai, Av>(&self, idx: Ai, arg: Av) -> OclResult<()>
            where T: OclPrm, Ai: Into<ArgIdxSpecifier>, Av: Into<ArgValConverter<T>> {
        let arg_idx = idx.into().to_idx(self)?;
        self.verify_arg_type::<T>(arg_idx)?;
        let arg: ArgValConverter<T> = arg.into();
        core::set_kernel_arg(&self.obj_core, arg_idx, arg.val).map_err(OclError::from)
    }

    /// Sets a sampler argument by index or by name.
    pub fn set_arg_sampler<Ai>(&self, idx: Ai, sampler: &Sampler) -> OclResult<()>
            where Ai: Into<ArgIdxSpecifier> {
        let arg_idx = idx.into().to_idx(self)?;
        core::set_kernel_arg(&self.obj_core, arg_idx, ArgVal::sampler(sampler.as_core()))
            .map_err(OclError::from)
    }

    /// Sets a local memory argument, reserving `length * size_of::<T>()`
    /// bytes per work-group.
    pub fn set_arg_local<T, Ai>(&self, idx: Ai, length: usize) -> OclResult<()>
            where T: OclPrm, Ai: Into<ArgIdxSpecifier> {
        let arg_idx = idx.into().to_idx(self)?;
        self.verify_arg_type::<T>(arg_idx)?;
        core::set_kernel_arg(&self.obj_core, arg_idx, ArgVal::local::<T>(length))
            .map_err(OclError::from)
    }

    /// Returns a command builder which is used to chain parameters of an
    /// 'enqueue' command together.
    pub fn cmd(&self) -> KernelCmd {
        KernelCmd {
            kernel: &self.obj_core,
            queue: self.queue.as_ref(),
            gwo: self.gwo,
            gws: self.gws,
            lws: self.lws,
            task: false,
            ewait: None,
            enew: None,
        }
    }

    /// Enqueues this kernel on the default queue using the default work
    /// sizes and offsets.
    ///
    /// Shorthand for `.cmd().enq()`
    pub fn enq(&self) -> OclResult<()> {
        self.cmd().enq()
    }

    /// Changes the default queue.
    ///
    /// The queue must be associated with a device of the kernel's context.
    pub fn set_default_queue(&mut self, queue: Queue) -> &mut Kernel {
        self.queue = Some(queue);
        self
    }

    /// Sets the default global work offset.
    pub fn set_default_global_work_offset(&mut self, gwo: SpatialDims) -> &mut Kernel {
        self.gwo = gwo;
        self
    }

    /// Sets the default global work size.
    pub fn set_default_global_work_size(&mut self, gws: SpatialDims) -> &mut Kernel {
        self.gws = gws;
        self
    }

    /// Sets the default local work size.
    pub fn set_default_local_work_size(&mut self, lws: SpatialDims) -> &mut Kernel {
        self.lws = lws;
        self
    }

    /// Returns the default queue for this kernel if one has been set.
    pub fn default_queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }

    /// Returns the default global work offset.
    pub fn default_global_work_offset(&self) -> SpatialDims {
        self.gwo
    }

    /// Returns the default global work size.
    pub fn default_global_work_size(&self) -> SpatialDims {
        self.gws
    }

    /// Returns the default local work size.
    pub fn default_local_work_size(&self) -> SpatialDims {
        self.lws
    }

    /// Returns a reference to the core handle, usable by functions in the
    /// `core` module.
    #[inline]
    pub fn as_core(&self) -> &KernelCore {
        &self.obj_core
    }

    /// Returns the program this kernel was created from.
    pub fn program(&self) -> Program {
        Program::from(self.obj_core.program().clone())
    }

    /// Returns information about this kernel.
    pub fn info(&self, info_kind: KernelInfo) -> OclResult<KernelInfoResult> {
        core::get_kernel_info(&self.obj_core, info_kind).map_err(OclError::from)
    }

    /// Returns work-group information for this kernel on `device`.
    pub fn wg_info(&self, device: &Device, info_kind: KernelWorkGroupInfo)
            -> OclResult<KernelWorkGroupInfoResult> {
        core::get_kernel_work_group_info(&self.obj_core, device.as_core(), info_kind)
            .map_err(OclError::from)
    }

    /// Returns argument information for this kernel.
    pub fn arg_info(&self, arg_index: u32, info_kind: KernelArgInfo)
            -> OclResult<KernelArgInfoResult> {
        core::get_kernel_arg_info(&self.obj_core, arg_index, info_kind).map_err(OclError::from)
    }

    /// Returns the name of this kernel.
    pub fn name(&self) -> String {
        self.obj_core.name().to_owned()
    }

    /// Returns the number of arguments this kernel has.
    pub fn num_args(&self) -> u32 {
        self.obj_core.signature().params.len() as u32
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("FunctionName", &self.info(KernelInfo::FunctionName))
            .field("ReferenceCount", &self.info(KernelInfo::ReferenceCount))
            .field("Context", &self.info(KernelInfo::Context))
            .field("Program", &self.info(KernelInfo::Program))
            .field("NumArgs", &self.info(KernelInfo::NumArgs))
            .finish()
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl Deref for Kernel {
    type Target = KernelCore;

    fn deref(&self) -> &KernelCore {
        &self.obj_core
    }
}


/// A kernel builder.
///
/// ### Examples
///
/// ```rust,ignore
/// let kernel = Kernel::builder()
///     .program(&program)
///     .name("add")
///     .queue(queue.clone())
///     .global_work_size(&dims)
///     .arg(&buffer)
///     .arg(&10.0f32)
///     .build()?;
/// ```
///
/// `KernelBuilder` is clonable and can be used to create multiple similar
/// kernels. Arguments cannot be modified through the builder once a kernel
/// is built; use `Kernel::set_arg` instead.
#[derive(Clone, Debug)]
pub struct KernelBuilder<'b> {
    program: Option<&'b Program>,
    name: Option<String>,
    named_args: HashMap<Cow<'static, str>, u32>,
    args: Vec<BuilderArg>,
    queue: Option<Queue>,
    gwo: SpatialDims,
    gws: SpatialDims,
    lws: SpatialDims,
}

impl<'b> KernelBuilder<'b> {
    /// Returns a new kernel builder.
    pub fn new() -> KernelBuilder<'b> {
        KernelBuilder {
            program: None,
            name: None,
            named_args: HashMap::new(),
            args: Vec::with_capacity(16),
            queue: None,
            gwo: SpatialDims::Unspecified,
            gws: SpatialDims::Unspecified,
            lws: SpatialDims::Unspecified,
        }
    }

    /// Specifies a program object with a successfully built executable.
    pub fn program(&mut self, program: &'b Program) -> &mut KernelBuilder<'b> {
        self.program = Some(program);
        self
    }

    /// Specifies a function name in the program declared with the `__kernel`
    /// qualifier (e.g. `__kernel void add_values(...`).
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut KernelBuilder<'b> {
        self.name = Some(name.into());
        self
    }

    /// Sets the default queue to be used by all subsequent enqueue commands
    /// unless otherwise changed (with `::set_default_queue`) or overridden
    /// (by `::cmd().queue(...)...`).
    pub fn queue(&mut self, queue: Queue) -> &mut KernelBuilder<'b> {
        self.queue = Some(queue);
        self
    }

    /// Sets the default global work offset.
    pub fn global_work_offset<D: Into<SpatialDims>>(&mut self, gwo: D) -> &mut KernelBuilder<'b> {
        self.gwo = gwo.into();
        self
    }

    /// Sets the default global work size.
    pub fn global_work_size<D: Into<SpatialDims>>(&mut self, gws: D) -> &mut KernelBuilder<'b> {
        self.gws = gws.into();
        self
    }

    /// Sets the default local work size.
    pub fn local_work_size<D: Into<SpatialDims>>(&mut self, lws: D) -> &mut KernelBuilder<'b> {
        self.lws = lws.into();
        self
    }

    fn new_arg(&mut self, val: ArgVal, type_id: Option<TypeId>, type_name: &'static str) -> u32 {
        self.args.push(BuilderArg { val, type_id, type_name });
        (self.args.len() - 1) as u32
    }

    /// Adds a new `Buffer`, `Image`, scalar, or vector argument to the
    /// kernel.
    ///
    /// The argument is added to the bottom of the argument order.
    ///
    /// ### Example
    ///
    /// ```rust,ignore
    /// let kern = pro_que.kernel_builder("multiply_by_scalar")
    ///     .arg(&100.0f32)
    ///     .arg(&source_buffer)
    ///     .arg(&result_buffer)
    ///     .build()?;
    /// ```
    pub fn arg<T, A>(&mut self, arg: A) -> &mut KernelBuilder<'b>
            where T: OclPrm, A: Into<ArgValConverter<T>> {
        let arg = arg.into();
        self.new_arg(arg.val, arg.type_id, any::type_name::<T>());
        self
    }

    /// Adds a new argument specifying the sampler object represented by
    /// 'sampler'. Argument is added to the bottom of the argument order.
    pub fn arg_sampler(&mut self, sampler: &'b Sampler) -> &mut KernelBuilder<'b> {
        self.new_arg(ArgVal::sampler(sampler.as_core()), None, "sampler");
        self
    }

    /// Adds a new argument specifying the allocation of a local variable of
    /// size `length * sizeof(T)` bytes.
    ///
    /// Local variables are used to share data between work items in the same
    /// workgroup.
    pub fn arg_local<T: OclPrm>(&mut self, length: usize) -> &mut KernelBuilder<'b> {
        self.new_arg(ArgVal::local::<T>(length), Some(TypeId::of::<T>()),
            any::type_name::<T>());
        self
    }

    /// Adds a new *named* `Buffer`, `Image`, scalar, or vector argument to the
    /// kernel.
    ///
    /// To set a `Buffer` or `Image` argument to `None` (null), you must use a
    /// type annotation (e.g. `None::<&Buffer<f32>>`). Scalar and vector
    /// arguments may not be null; use zero (e.g. `&0`) instead.
    ///
    /// Named arguments can be modified later using `::set_arg()`.
    pub fn arg_named<T, S, A>(&mut self, name: S, arg: A) -> &mut KernelBuilder<'b>
            where S: Into<Cow<'static, str>>, T: OclPrm, A: Into<ArgValConverter<T>> {
        let arg = arg.into();
        let arg_idx = self.new_arg(arg.val, arg.type_id, any::type_name::<T>());
        self.named_args.insert(name.into(), arg_idx);
        self
    }

    /// Adds a new *named* sampler argument.
    pub fn arg_sampler_named<S>(&mut self, name: S, sampler: Option<&'b Sampler>)
            -> &mut KernelBuilder<'b> where S: Into<Cow<'static, str>> {
        let val = sampler.map_or(ArgVal::Null, |s| ArgVal::sampler(s.as_core()));
        let arg_idx = self.new_arg(val, None, "sampler");
        self.named_args.insert(name.into(), arg_idx);
        self
    }

    /// Builds and returns a new `Kernel`.
    pub fn build(&self) -> OclResult<Kernel> {
        let program = self.program.ok_or(KernelError::BuilderNoProgram)?;
        let name = self.name.as_ref().ok_or(KernelError::BuilderNoKernelName)?;

        let obj_core = core::create_kernel(program.as_core(), name)?;
        let num_args = obj_core.signature().params.len() as u32;

        if self.args.len() as u32 != num_args {
            return Err(KernelError::BuilderWrongArgCount {
                required: num_args,
                specified: self.args.len() as u32,
            }.into());
        }

        let arg_types: Vec<ArgType> = obj_core.signature().params.iter()
            .map(|p| ArgType::from_param(&p.type_name, p.kind))
            .collect();

        for (arg_idx, arg) in self.args.iter().enumerate() {
            if let Some(type_id) = arg.type_id {
                if !arg_types[arg_idx].matches(type_id) {
                    return Err(type_mismatch(&obj_core, arg_idx as u32, &arg_types[arg_idx],
                        arg.type_name));
                }
            }

            // Null arguments are left unset until assigned with `set_arg`.
            if !arg.val.is_null() {
                core::set_kernel_arg(&obj_core, arg_idx as u32, arg.val.clone())?;
            }
        }

        Ok(Kernel {
            obj_core,
            named_args: self.named_args.clone(),
            queue: self.queue.clone(),
            gwo: self.gwo,
            gws: self.gws,
            lws: self.lws,
            arg_types,
        })
    }
}

impl<'b> Default for KernelBuilder<'b> {
    fn default() -> KernelBuilder<'b> {
        KernelBuilder::new()
    }
}

fn type_mismatch(core: &KernelCore, arg_idx: u32, ty: &ArgType, found: &'static str)
        -> OclError {
    let param = &core.signature().params[arg_idx as usize];
    KernelError::ArgTypeMismatch {
        idx: arg_idx,
        arg_name: param.name.clone(),
        ty_name: param.type_name.clone(),
        ty: ty.clone(),
        found,
    }.into()
}


pub mod arg_type {
    //! Kernel argument types as declared in source.

    use std::any::TypeId;
    use crate::core::ParamKind;

    /// The base type of a primitive.
    #[derive(Clone, Debug, Copy, PartialEq, Eq)]
    pub enum BaseType {
        Char,
        Uchar,
        Short,
        Ushort,
        Int,
        Uint,
        Long,
        Ulong,
        Float,
        Double,
        Sampler,
        Image,
        Unknown,
    }

    /// The type of a kernel argument derived from its declared type name.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ArgType {
        base_type: BaseType,
        cardinality: usize,
        is_ptr: bool,
    }

    impl ArgType {
        /// Returns an `ArgType` which matches every type.
        pub fn unknown() -> ArgType {
            ArgType { base_type: BaseType::Unknown, cardinality: 1, is_ptr: false }
        }

        /// Ascertains an `ArgType` from a declared type name such as
        /// `float4*` or `unsigned int`.
        pub fn from_type_name(type_name: &str) -> ArgType {
            let is_ptr = type_name.contains('*');
            let name = type_name.trim_end_matches('*').trim()
                .replace("unsigned ", "u")
                .replace("const ", "");
            let name = name.trim();

            let base_len = name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
            let (base, card) = name.split_at(base_len);
            let cardinality = card.parse::<usize>().unwrap_or(1);

            let base_type = match base {
                "char" => BaseType::Char,
                "uchar" => BaseType::Uchar,
                "short" => BaseType::Short,
                "ushort" => BaseType::Ushort,
                "int" => BaseType::Int,
                "uint" => BaseType::Uint,
                "long" => BaseType::Long,
                "ulong" => BaseType::Ulong,
                "float" => BaseType::Float,
                "double" => BaseType::Double,
                "sampler_t" => BaseType::Sampler,
                b if b.starts_with("image") => BaseType::Image,
                _ => BaseType::Unknown,
            };

            ArgType { base_type, cardinality, is_ptr }
        }

        /// Ascertains an `ArgType` from a declared parameter.
        pub fn from_param(type_name: &str, kind: ParamKind) -> ArgType {
            let mut ty = ArgType::from_type_name(type_name);
            if let ParamKind::Pointer | ParamKind::LocalPointer = kind {
                ty.is_ptr = true;
            }
            ty
        }

        /// Returns true if the base type and cardinality of `type_id` match.
        ///
        /// Pointers additionally accept their scalar element type.
        pub fn matches(&self, type_id: TypeId) -> bool {
            let (base, card) = match self.base_type {
                BaseType::Unknown | BaseType::Image | BaseType::Sampler => return true,
                base => (base, self.cardinality),
            };

            match prm_type(type_id) {
                Some((prm_base, prm_card)) => {
                    prm_base == base && (prm_card == card || (self.is_ptr && prm_card == 1))
                },
                None => false,
            }
        }

        pub fn is_ptr(&self) -> bool {
            self.is_ptr
        }

        pub fn is_unknown(&self) -> bool {
            self.base_type == BaseType::Unknown
        }
    }

    /// Returns the base type and cardinality of a primitive type.
    fn prm_type(type_id: TypeId) -> Option<(BaseType, usize)> {
        macro_rules! lookup {
            ($($ty:ty => $base:ident, $card:expr;)+) => {
                $(if type_id == TypeId::of::<$ty>() { return Some((BaseType::$base, $card)); })+
            };
        }

        lookup! {
            i8 => Char, 1;
            u8 => Uchar, 1;
            i16 => Short, 1;
            u16 => Ushort, 1;
            i32 => Int, 1;
            u32 => Uint, 1;
            i64 => Long, 1;
            u64 => Ulong, 1;
            isize => Long, 1;
            usize => Ulong, 1;
            f32 => Float, 1;
            f64 => Double, 1;
            [u8; 4] => Uchar, 4;
            [u8; 16] => Uchar, 16;
            [u16; 8] => Ushort, 8;
            [i32; 2] => Int, 2;
            [i32; 4] => Int, 4;
            [u32; 2] => Uint, 2;
            [u32; 4] => Uint, 4;
            [f32; 2] => Float, 2;
            [f32; 4] => Float, 4;
        }
        None
    }
}
