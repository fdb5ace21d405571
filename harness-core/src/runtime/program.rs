//! Programs, build state, and the native kernel library.

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::compiler;
use super::kernel::WorkGroup;
use crate::error::{Error, Result};
use crate::types::structs::KernelSignature;
use crate::{Context, DeviceId, ProgramBuildStatus};

/// A kernel implementation executed once per work-group.
///
/// Implemented for every `Fn(&WorkGroup) -> Result<()>` which may be shared
/// between threads.
pub trait NativeKernel: Send + Sync {
    /// Runs every work-item of one work-group.
    fn run(&self, group: &WorkGroup<'_>) -> Result<()>;

    /// Private memory used per work-item, in bytes.
    fn private_mem_size(&self) -> u64 {
        0
    }
}

impl<F> NativeKernel for F where F: Fn(&WorkGroup<'_>) -> Result<()> + Send + Sync {
    fn run(&self, group: &WorkGroup<'_>) -> Result<()> {
        self(group)
    }
}

/// Native kernels available to programs, keyed by kernel function name.
///
/// A program builds only if every kernel it declares has an entry here.
#[derive(Clone, Default)]
pub struct KernelLibrary {
    kernels: HashMap<String, Arc<dyn NativeKernel>>,
}

impl KernelLibrary {
    /// Returns an empty library.
    pub fn new() -> KernelLibrary {
        KernelLibrary::default()
    }

    /// Registers `kernel` under `name`, replacing any previous entry.
    pub fn register<S, K>(&mut self, name: S, kernel: K) -> &mut KernelLibrary
            where S: Into<String>, K: NativeKernel + 'static {
        self.kernels.insert(name.into(), Arc::new(kernel));
        self
    }

    /// Registers `kernel` under `name` (builder-style).
    pub fn with<S, K>(mut self, name: S, kernel: K) -> KernelLibrary
            where S: Into<String>, K: NativeKernel + 'static {
        self.register(name, kernel);
        self
    }

    /// Adds every kernel from `other`, replacing entries with the same name.
    pub fn extend(&mut self, other: &KernelLibrary) {
        for (name, kernel) in &other.kernels {
            self.kernels.insert(name.clone(), kernel.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn NativeKernel>> {
        self.kernels.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kernels.contains_key(name)
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kernels.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}

impl fmt::Debug for KernelLibrary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KernelLibrary").field("kernels", &self.names()).finish()
    }
}

pub(crate) struct DeviceBuild {
    pub(crate) device: DeviceId,
    pub(crate) status: ProgramBuildStatus,
    pub(crate) log: String,
}

#[derive(Default)]
pub(crate) struct ProgramState {
    pub(crate) builds: Vec<DeviceBuild>,
    pub(crate) kernels: Vec<KernelSignature>,
    pub(crate) defines: Arc<HashMap<String, String>>,
    pub(crate) options: String,
    /// Kernel objects currently alive; a program with attached kernels
    /// cannot be rebuilt.
    pub(crate) attached_kernels: usize,
}

pub(crate) struct ProgramObj {
    pub(crate) id: u64,
    pub(crate) context: Context,
    pub(crate) source: String,
    pub(crate) library: KernelLibrary,
    pub(crate) state: Mutex<ProgramState>,
}

impl ProgramObj {
    pub(crate) fn new(context: &Context, source: String, library: KernelLibrary) -> ProgramObj {
        ProgramObj {
            id: super::next_id(),
            context: context.clone(),
            source,
            library,
            state: Mutex::new(ProgramState::default()),
        }
    }

    /// Compiles the program for each device, recording a build status and
    /// log for every one. Fails if any device fails, with that device's log.
    pub(crate) fn build(&self, devices: &[DeviceId], options: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.options = options.to_owned();
        state.builds.clear();
        state.kernels.clear();

        let mut failure: Option<String> = None;

        for device in devices {
            debug!("Program({}): building for '{}' with options '{}'", self.id,
                device.0.config.name, options);

            match compiler::compile(&self.source, options, &device.0.config, &self.library) {
                Ok(compiled) => {
                    state.kernels = compiled.kernels;
                    state.defines = Arc::new(compiled.defines);
                    state.builds.push(DeviceBuild {
                        device: device.clone(),
                        status: ProgramBuildStatus::Success,
                        log: compiled.log,
                    });
                },
                Err(log) => {
                    state.builds.push(DeviceBuild {
                        device: device.clone(),
                        status: ProgramBuildStatus::Error,
                        log: log.clone(),
                    });
                    failure.get_or_insert(log);
                },
            }
        }

        match failure {
            Some(log) => {
                state.kernels.clear();
                Err(Error::BuildFailed { log })
            },
            None => {
                info!("Program({}): built {} kernel(s) for {} device(s)", self.id,
                    state.kernels.len(), devices.len());
                Ok(())
            },
        }
    }

    /// Returns true if the most recent build succeeded for every device.
    pub(crate) fn is_built(&self) -> bool {
        let state = self.state.lock();
        !state.builds.is_empty()
            && state.builds.iter().all(|b| b.status == ProgramBuildStatus::Success)
    }
}
