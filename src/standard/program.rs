//! A compute program.

use std::collections::HashSet;
use std::fs;
use std::ops::Deref;
use std::path::PathBuf;
use log::{debug, warn};
use crate::core::{self, Error as OclCoreError, KernelLibrary, Program as ProgramCore,
    ProgramBuildInfo, ProgramBuildInfoResult, ProgramInfo, ProgramInfoResult};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Context, Device, DeviceSpecifier};


/// A program from which kernels can be created.
///
/// Feel free to store, clone, and share among threads as you please.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Program(ProgramCore);

impl Program {
    /// Returns a new `ProgramBuilder`.
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::new()
    }

    /// Returns a new program built from source strings for `devices` (every
    /// device of the context if `None`).
    ///
    /// Prefer `::builder` to create a new `Program`.
    pub fn with_source(context: &Context, src_strings: &[String], library: &KernelLibrary,
            devices: Option<&[Device]>, cmplr_opts: &str) -> OclResult<Program> {
        let program = core::create_program_with_source(context.as_core(), src_strings, library)?;
        let device_ids: Option<Vec<_>> = devices
            .map(|ds| ds.iter().map(|d| d.as_core().clone()).collect());

        match core::build_program(&program, device_ids.as_deref(), cmplr_opts) {
            Ok(()) => {
                debug!("Program built with options: '{}'.", cmplr_opts);
                Ok(Program(program))
            },
            Err(err @ OclCoreError::BuildFailed { .. }) => {
                warn!("Program build failed with options: '{}'.", cmplr_opts);
                Err(err.into())
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Returns a reference to the core handle, usable by functions in the
    /// `core` module.
    #[inline]
    pub fn as_core(&self) -> &ProgramCore {
        &self.0
    }

    /// Returns the names of every kernel declared by this program, in
    /// declaration order.
    pub fn kernel_names(&self) -> OclResult<Vec<String>> {
        match self.info(ProgramInfo::KernelNames)? {
            ProgramInfoResult::KernelNames(names) => Ok(names.split(';')
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect()),
            other => Err(format!("Program::kernel_names: unexpected result: {}", other).into()),
        }
    }

    /// Returns info about this program.
    pub fn info(&self, info_kind: ProgramInfo) -> OclResult<ProgramInfoResult> {
        core::get_program_info(&self.0, info_kind).map_err(OclError::from)
    }

    /// Returns info about this program's build on `device`.
    pub fn build_info(&self, device: &Device, info_kind: ProgramBuildInfo)
            -> OclResult<ProgramBuildInfoResult> {
        core::get_program_build_info(&self.0, device.as_core(), info_kind)
            .map_err(OclError::from)
    }

    fn fmt_info(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("ReferenceCount", &self.info(ProgramInfo::ReferenceCount))
            .field("Context", &self.info(ProgramInfo::Context))
            .field("NumDevices", &self.info(ProgramInfo::NumDevices))
            .field("Devices", &self.info(ProgramInfo::Devices))
            .field("NumKernels", &self.info(ProgramInfo::NumKernels))
            .field("KernelNames", &self.info(ProgramInfo::KernelNames))
            .finish()
    }
}

impl From<ProgramCore> for Program {
    fn from(core: ProgramCore) -> Program {
        Program(core)
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.fmt_info(f)
    }
}

impl Deref for Program {
    type Target = ProgramCore;

    fn deref(&self) -> &ProgramCore {
        &self.0
    }
}


/// A build option used by ProgramBuilder.
///
/// Strings intended either for the compiler as a command line switch or for
/// inclusion in the final program source.
///
/// * `CmplrDefine`: `-D {ident}={val}`
/// * `CmplrInclDir`: `-I {path}`
/// * `CmplrOther`: passed through verbatim
/// * `IncludeDefine`: `#define {ident} {val}` ahead of the source
/// * `IncludeRaw`: text ahead of the source
/// * `IncludeRawEof`: text after the source
/// * `FastRelaxedMath`: `-cl-fast-relaxed-math`
/// * `OptDisable`: `-cl-opt-disable`
#[derive(Clone, Debug, PartialEq)]
pub enum BuildOpt {
    CmplrDefine { ident: String, val: String },
    CmplrInclDir { path: String },
    CmplrOther(String),
    IncludeDefine { ident: String, val: String },
    IncludeRaw(String),
    IncludeRawEof(String),
    FastRelaxedMath,
    OptDisable,
}

impl BuildOpt {
    /// Returns a `BuildOpt::CmplrDefine`.
    pub fn cmplr_def<S: Into<String>>(ident: S, val: i32) -> BuildOpt {
        BuildOpt::CmplrDefine {
            ident: ident.into(),
            val: val.to_string(),
        }
    }

    /// Returns a `BuildOpt::IncludeDefine`.
    pub fn include_def<S: Into<String>>(ident: S, val: String) -> BuildOpt {
        BuildOpt::IncludeDefine {
            ident: ident.into(),
            val,
        }
    }
}


/// A builder for `Program`.
#[must_use = "builders do nothing unless '::build' is called"]
#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    options: Vec<BuildOpt>,
    src_files: Vec<PathBuf>,
    device_spec: Option<DeviceSpecifier>,
    library: KernelLibraryHolder,
}

/// `KernelLibrary` is not `Debug`.
#[derive(Clone, Default)]
struct KernelLibraryHolder(KernelLibrary);

impl std::fmt::Debug for KernelLibraryHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list().entries(self.0.names()).finish()
    }
}

impl ProgramBuilder {
    /// Returns a new, empty, build configuration object.
    pub fn new() -> ProgramBuilder {
        ProgramBuilder {
            options: Vec::with_capacity(16),
            src_files: Vec::new(),
            device_spec: None,
            library: KernelLibraryHolder::default(),
        }
    }

    /// Adds a build option containing a compiler command line definition.
    /// Formatted as `-D {name}={val}`.
    ///
    /// ## Example
    ///
    /// `...cmplr_def("MAX_ITERS", 500)...`
    pub fn cmplr_def<S: Into<String>>(&mut self, name: S, val: i32) -> &mut ProgramBuilder {
        self.options.push(BuildOpt::cmplr_def(name, val));
        self
    }

    /// Adds a build option containing a raw compiler command line parameter.
    ///
    /// ## Example
    ///
    /// `...cmplr_opt("-cl-mad-enable")...`
    pub fn cmplr_opt<S: Into<String>>(&mut self, co: S) -> &mut ProgramBuilder {
        self.options.push(BuildOpt::CmplrOther(co.into()));
        self
    }

    /// Pushes a pre-created build option to the list of options.
    pub fn bo(&mut self, bo: BuildOpt) -> &mut ProgramBuilder {
        self.options.push(bo);
        self
    }

    /// Adds the contents of a file to the program source. The file is read
    /// when the program is built.
    pub fn src_file<P: Into<PathBuf>>(&mut self, file_path: P) -> &mut ProgramBuilder {
        self.src_files.push(file_path.into());
        self
    }

    /// Adds raw text to the program source.
    pub fn src<S: Into<String>>(&mut self, src: S) -> &mut ProgramBuilder {
        self.options.push(BuildOpt::IncludeRawEof(src.into()));
        self
    }

    /// Adds native kernel implementations. Every kernel the source declares
    /// must have one for the build to succeed.
    pub fn kernels(&mut self, library: KernelLibrary) -> &mut ProgramBuilder {
        self.library.0.extend(&library);
        self
    }

    /// Specifies a list of devices to build this program on. The devices must
    /// be associated with the context passed to `::build` later on.
    ///
    /// ## Panics
    ///
    /// Devices must not have already been specified.
    pub fn devices<D: Into<DeviceSpecifier>>(&mut self, device_spec: D) -> &mut ProgramBuilder {
        assert!(self.device_spec.is_none(), "ProgramBuilder::devices: Devices already specified");
        self.device_spec = Some(device_spec.into());
        self
    }

    /// Returns the devices specified to be associated the program.
    pub fn get_device_spec(&self) -> Option<&DeviceSpecifier> {
        self.device_spec.as_ref()
    }

    /// Returns a concatenated string of command line options to be passed to
    /// the compiler when building this program.
    pub fn get_compiler_options(&self) -> String {
        let mut opts: Vec<String> = Vec::with_capacity(self.options.len());

        for option in &self.options {
            match *option {
                BuildOpt::CmplrDefine { ref ident, ref val } => {
                    opts.push(format!("-D {}={}", ident, val))
                },
                BuildOpt::CmplrInclDir { ref path } => opts.push(format!("-I {}", path)),
                BuildOpt::CmplrOther(ref s) => opts.push(s.clone()),
                BuildOpt::FastRelaxedMath => opts.push("-cl-fast-relaxed-math".to_owned()),
                BuildOpt::OptDisable => opts.push("-cl-opt-disable".to_owned()),
                _ => (),
            }
        }

        opts.join(" ")
    }

    /// Returns options intended for inclusion at the beginning of the final
    /// program source.
    fn get_includes(&self) -> Vec<String> {
        let mut strings = Vec::with_capacity(8);

        for option in &self.options {
            match *option {
                BuildOpt::IncludeDefine { ref ident, ref val } => {
                    strings.push(format!("#define {}  {}\n", ident, val));
                },
                BuildOpt::IncludeRaw(ref text) => strings.push(text.clone()),
                _ => (),
            };
        }

        strings
    }

    /// Returns options intended for inclusion at the end of the final program
    /// source.
    fn get_includes_eof(&self) -> Vec<String> {
        self.options.iter()
            .filter_map(|option| match *option {
                BuildOpt::IncludeRawEof(ref text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the final program source code as a list of strings.
    ///
    /// ### Order of Inclusion
    ///
    /// 1. Macro definitions and code strings specified by a
    ///    `BuildOpt::IncludeDefine` or `BuildOpt::IncludeRaw` via `::bo`
    /// 2. Contents of files specified via `::src_file`
    /// 3. Contents of strings specified via `::src` or a
    ///    `BuildOpt::IncludeRawEof` via `::bo`
    pub fn get_src_strings(&self) -> OclResult<Vec<String>> {
        let mut src_strings = self.get_includes();
        let mut src_file_history: HashSet<&PathBuf> = HashSet::with_capacity(8);

        for src_path in &self.src_files {
            if !src_file_history.insert(src_path) { continue; }
            let src = fs::read_to_string(src_path).map_err(|err| {
                OclError::from(format!("ProgramBuilder: unable to read source file '{}': {}",
                    src_path.display(), err))
            })?;
            src_strings.push(src);
        }

        src_strings.extend(self.get_includes_eof());

        if src_strings.iter().all(|s| s.trim().is_empty()) {
            return Err("Unable to build program: no source has been specified".into());
        }
        Ok(src_strings)
    }

    /// Returns a newly built Program.
    pub fn build(&self, context: &Context) -> OclResult<Program> {
        let device_list = match self.device_spec {
            Some(ref ds) => ds.to_device_list(Some(context.platform()))?,
            None => context.devices(),
        };

        Program::with_source(
            context,
            &self.get_src_strings()?,
            &self.library.0,
            Some(&device_list[..]),
            &self.get_compiler_options(),
        )
    }
}
