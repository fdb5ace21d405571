//! Platform and device descriptions and the process-wide registry.

use lazy_static::lazy_static;
use std::sync::{Arc, Weak};

use crate::{CommandQueueProperties, DeviceExecCapabilities, DeviceFpConfig, DeviceId,
    DeviceType, PlatformId};

/// Preferred or native vector widths per scalar type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VectorWidths {
    pub char: u32,
    pub short: u32,
    pub int: u32,
    pub long: u32,
    pub float: u32,
    pub double: u32,
    pub half: u32,
}

/// Describes a simulated device.
#[derive(Clone, Debug)]
pub struct DeviceConfig {
    pub name: String,
    pub vendor: String,
    pub vendor_id: u32,
    pub device_type: DeviceType,
    pub version: String,
    pub driver_version: String,
    pub opencl_c_version: String,
    pub max_compute_units: u32,
    pub max_work_group_size: usize,
    pub max_work_item_sizes: [usize; 3],
    pub preferred_work_group_multiple: usize,
    pub address_bits: u32,
    pub global_mem_size: u64,
    pub max_mem_alloc_size: u64,
    pub local_mem_size: u64,
    /// Sub-buffer origin alignment in bits.
    pub mem_base_addr_align: u32,
    pub single_fp_config: DeviceFpConfig,
    /// `None` unless the device supports double precision.
    pub double_fp_config: Option<DeviceFpConfig>,
    /// `None` unless the device supports half precision.
    pub half_fp_config: Option<DeviceFpConfig>,
    pub preferred_vector_widths: VectorWidths,
    pub native_vector_widths: VectorWidths,
    pub image_support: bool,
    pub image2d_max_dims: [usize; 2],
    pub profiling_timer_resolution: usize,
    pub extensions: Vec<String>,
    /// Worker threads backing each out-of-order queue.
    pub out_of_order_workers: usize,
}

fn ext_list(exts: &[&str]) -> Vec<String> {
    exts.iter().map(|&e| e.to_owned()).collect()
}

impl DeviceConfig {
    /// A simulated parallel accelerator.
    pub fn gpu() -> DeviceConfig {
        let fp = DeviceFpConfig::DENORM | DeviceFpConfig::INF_NAN | DeviceFpConfig::ROUND_TO_NEAREST
            | DeviceFpConfig::ROUND_TO_ZERO | DeviceFpConfig::ROUND_TO_INF | DeviceFpConfig::FMA;

        DeviceConfig {
            name: "Harness Simulated Accelerator".to_owned(),
            vendor: "ocl-harness".to_owned(),
            vendor_id: 0x4F48,
            device_type: DeviceType::GPU,
            version: "OpenCL 1.2 harness".to_owned(),
            driver_version: env!("CARGO_PKG_VERSION").to_owned(),
            opencl_c_version: "OpenCL C 1.2".to_owned(),
            max_compute_units: 16,
            max_work_group_size: 256,
            max_work_item_sizes: [256, 256, 64],
            preferred_work_group_multiple: 32,
            address_bits: 64,
            global_mem_size: 1 << 31,
            max_mem_alloc_size: 1 << 29,
            local_mem_size: 1 << 15,
            mem_base_addr_align: 64,
            single_fp_config: fp,
            double_fp_config: Some(fp),
            half_fp_config: None,
            preferred_vector_widths: VectorWidths { char: 4, short: 2, int: 1, long: 1, float: 1,
                double: 1, half: 0 },
            native_vector_widths: VectorWidths { char: 4, short: 2, int: 1, long: 1, float: 1,
                double: 1, half: 0 },
            image_support: true,
            image2d_max_dims: [16384, 16384],
            profiling_timer_resolution: 1,
            extensions: ext_list(&["cl_khr_fp64", "cl_khr_global_int32_base_atomics",
                "cl_khr_global_int32_extended_atomics", "cl_khr_local_int32_base_atomics",
                "cl_khr_local_int32_extended_atomics", "cl_khr_byte_addressable_store",
                "cl_khr_gl_sharing", "cl_khr_icd"]),
            out_of_order_workers: 4,
        }
    }

    /// The host processor acting as a compute device.
    pub fn cpu() -> DeviceConfig {
        let fp = DeviceFpConfig::DENORM | DeviceFpConfig::INF_NAN | DeviceFpConfig::ROUND_TO_NEAREST;

        DeviceConfig {
            name: "Harness Host CPU".to_owned(),
            vendor: "ocl-harness".to_owned(),
            vendor_id: 0x4F48,
            device_type: DeviceType::CPU,
            version: "OpenCL 1.2 harness".to_owned(),
            driver_version: env!("CARGO_PKG_VERSION").to_owned(),
            opencl_c_version: "OpenCL C 1.2".to_owned(),
            max_compute_units: 4,
            max_work_group_size: 1024,
            max_work_item_sizes: [1024, 1024, 1024],
            preferred_work_group_multiple: 1,
            address_bits: 64,
            global_mem_size: 1 << 32,
            max_mem_alloc_size: 1 << 30,
            local_mem_size: 1 << 15,
            mem_base_addr_align: 64,
            single_fp_config: fp,
            double_fp_config: Some(fp),
            half_fp_config: None,
            preferred_vector_widths: VectorWidths { char: 16, short: 8, int: 4, long: 2, float: 4,
                double: 2, half: 0 },
            native_vector_widths: VectorWidths { char: 16, short: 8, int: 4, long: 2, float: 4,
                double: 2, half: 0 },
            image_support: true,
            image2d_max_dims: [8192, 8192],
            profiling_timer_resolution: 1,
            extensions: ext_list(&["cl_khr_fp64", "cl_khr_global_int32_base_atomics",
                "cl_khr_global_int32_extended_atomics", "cl_khr_byte_addressable_store",
                "cl_khr_icd"]),
            out_of_order_workers: 2,
        }
    }

    pub(crate) fn has_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    pub(crate) fn execution_capabilities(&self) -> DeviceExecCapabilities {
        DeviceExecCapabilities::KERNEL | DeviceExecCapabilities::NATIVE_KERNEL
    }

    pub(crate) fn queue_properties(&self) -> CommandQueueProperties {
        CommandQueueProperties::OUT_OF_ORDER_EXEC_MODE_ENABLE
            | CommandQueueProperties::PROFILING_ENABLE
    }
}

impl Default for DeviceConfig {
    fn default() -> DeviceConfig {
        DeviceConfig::gpu()
    }
}

/// Describes a simulated platform and the devices attached to it.
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub profile: String,
    pub extensions: Vec<String>,
    pub devices: Vec<DeviceConfig>,
}

impl PlatformConfig {
    /// A platform with no devices.
    pub fn empty() -> PlatformConfig {
        PlatformConfig {
            devices: Vec::new(),
            ..PlatformConfig::default()
        }
    }

    /// Adds a device (builder-style).
    pub fn device(mut self, device: DeviceConfig) -> PlatformConfig {
        self.devices.push(device);
        self
    }
}

impl Default for PlatformConfig {
    fn default() -> PlatformConfig {
        PlatformConfig {
            name: "Harness Software Platform".to_owned(),
            vendor: "ocl-harness".to_owned(),
            version: "OpenCL 1.2 harness".to_owned(),
            profile: "FULL_PROFILE".to_owned(),
            extensions: ext_list(&["cl_khr_icd", "cl_khr_gl_sharing",
                "cl_khr_global_int32_base_atomics", "cl_khr_byte_addressable_store"]),
            devices: vec![DeviceConfig::gpu(), DeviceConfig::cpu()],
        }
    }
}

pub(crate) struct PlatformObj {
    pub(crate) id: u64,
    pub(crate) config: PlatformConfig,
    pub(crate) devices: Vec<DeviceId>,
}

pub(crate) struct DeviceObj {
    pub(crate) id: u64,
    pub(crate) config: DeviceConfig,
    pub(crate) platform: Weak<PlatformObj>,
}

/// Builds a platform and its devices.
pub(crate) fn build_platform(config: PlatformConfig) -> PlatformId {
    let obj = Arc::new_cyclic(|weak: &Weak<PlatformObj>| {
        let devices = config.devices.iter()
            .map(|dc| DeviceId(Arc::new(DeviceObj {
                id: super::next_id(),
                config: dc.clone(),
                platform: weak.clone(),
            })))
            .collect();

        PlatformObj {
            id: super::next_id(),
            config,
            devices,
        }
    });

    PlatformId(obj)
}

lazy_static! {
    static ref PLATFORMS: Vec<PlatformId> = vec![build_platform(PlatformConfig::default())];
}

/// Returns the platforms registered with this process.
pub(crate) fn registered_platforms() -> &'static [PlatformId] {
    &PLATFORMS
}
