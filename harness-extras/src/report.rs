//! Human readable platform and device capability reports.

use std::fmt::Write;
use crate::core::{self, DeviceId, DeviceInfo, PlatformId, PlatformInfo, Result};

static TAB: &str = "    ";

/// Device attributes listed by `device_report`, in order.
const DEVICE_ATTRIBUTES: &[(&str, DeviceInfo)] = &[
    ("Type", DeviceInfo::Type),
    ("Vendor", DeviceInfo::Vendor),
    ("Version", DeviceInfo::Version),
    ("Driver Version", DeviceInfo::DriverVersion),
    ("OpenCL C Version", DeviceInfo::OpenclCVersion),
    ("Address Bits", DeviceInfo::AddressBits),
    ("Max Compute Units", DeviceInfo::MaxComputeUnits),
    ("Max Work Group Size", DeviceInfo::MaxWorkGroupSize),
    ("Max Work Item Sizes", DeviceInfo::MaxWorkItemSizes),
    ("Global Memory Size", DeviceInfo::GlobalMemSize),
    ("Local Memory Size", DeviceInfo::LocalMemSize),
    ("Max Allocation Size", DeviceInfo::MaxMemAllocSize),
    ("Base Address Alignment (bits)", DeviceInfo::MemBaseAddrAlign),
    ("Profiling Timer Resolution (ns)", DeviceInfo::ProfilingTimerResolution),
    ("Image Support", DeviceInfo::ImageSupport),
    ("Image 2D Max Width", DeviceInfo::Image2dMaxWidth),
    ("Image 2D Max Height", DeviceInfo::Image2dMaxHeight),
];

const FP_CONFIGS: &[(&str, DeviceInfo)] = &[
    ("Single", DeviceInfo::SingleFpConfig),
    ("Double", DeviceInfo::DoubleFpConfig),
    ("Half", DeviceInfo::HalfFpConfig),
];

/// `(type, preferred, native)` vector width queries.
const VECTOR_WIDTHS: &[(&str, DeviceInfo, DeviceInfo)] = &[
    ("char", DeviceInfo::PreferredVectorWidthChar, DeviceInfo::NativeVectorWidthChar),
    ("short", DeviceInfo::PreferredVectorWidthShort, DeviceInfo::NativeVectorWidthShort),
    ("int", DeviceInfo::PreferredVectorWidthInt, DeviceInfo::NativeVectorWidthInt),
    ("long", DeviceInfo::PreferredVectorWidthLong, DeviceInfo::NativeVectorWidthLong),
    ("float", DeviceInfo::PreferredVectorWidthFloat, DeviceInfo::NativeVectorWidthFloat),
    ("double", DeviceInfo::PreferredVectorWidthDouble, DeviceInfo::NativeVectorWidthDouble),
    ("half", DeviceInfo::PreferredVectorWidthHalf, DeviceInfo::NativeVectorWidthHalf),
];

/// Returns a report of the platform's name, vendor, version, profile and
/// extensions.
pub fn platform_report(platform: &PlatformId) -> Result<String> {
    let mut out = String::new();
    let attrs = [
        ("Name", PlatformInfo::Name),
        ("Vendor", PlatformInfo::Vendor),
        ("Version", PlatformInfo::Version),
        ("Profile", PlatformInfo::Profile),
    ];

    out.push_str("Platform {\n");
    for &(label, info) in attrs.iter() {
        let _ = writeln!(out, "{}{}: {}", TAB, label, core::get_platform_info(platform, info)?);
    }
    let extensions = core::get_platform_info(platform, PlatformInfo::Extensions)?.to_string();
    out.push_str(&format!("{}Extensions:\n", TAB));
    for ext in extensions.split_whitespace() {
        let _ = writeln!(out, "{t}{t}{}", ext, t = TAB);
    }
    out.push('}');
    Ok(out)
}

/// Returns a report of every capability a device exposes.
///
/// Floating point configurations the device does not support (double or
/// half precision without the matching extension) are listed as
/// unsupported rather than failing the report.
pub fn device_report(device: &DeviceId) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "Device '{}' {{", core::get_device_info(device, DeviceInfo::Name)?);

    for &(label, info) in DEVICE_ATTRIBUTES {
        match core::get_device_info(device, info) {
            Ok(val) => { let _ = writeln!(out, "{}{}: {}", TAB, label, val); },
            Err(core::Error::UnsupportedQuery { .. }) => {
                let _ = writeln!(out, "{}{}: (unsupported)", TAB, label);
            },
            Err(err) => return Err(err),
        }
    }

    let _ = writeln!(out, "{}Floating Point Configurations:", TAB);
    for &(label, info) in FP_CONFIGS {
        match core::get_device_info(device, info) {
            Ok(val) => { let _ = writeln!(out, "{t}{t}{}: {}", label, val, t = TAB); },
            Err(core::Error::UnsupportedQuery { .. }) => {
                let _ = writeln!(out, "{t}{t}{}: (unsupported)", label, t = TAB);
            },
            Err(err) => return Err(err),
        }
    }

    let _ = writeln!(out, "{}Vector Widths (preferred / native):", TAB);
    for &(label, preferred, native) in VECTOR_WIDTHS {
        let _ = writeln!(out, "{t}{t}{}: {} / {}", label, core::get_device_info(device, preferred)?,
            core::get_device_info(device, native)?, t = TAB);
    }

    let extensions = core::get_device_info(device, DeviceInfo::Extensions)?.to_string();
    let _ = writeln!(out, "{}Extensions:", TAB);
    for ext in extensions.split_whitespace() {
        let _ = writeln!(out, "{t}{t}{}", ext, t = TAB);
    }
    out.push('}');
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_cover_every_device() {
        for platform in core::get_platform_ids().unwrap() {
            let report = platform_report(&platform).unwrap();
            assert!(report.contains("cl_khr_icd"));

            for device in core::get_device_ids(&platform, None).unwrap() {
                let report = device_report(&device).unwrap();
                assert!(report.contains("Max Work Group Size"));
                assert!(report.contains("float: "));
            }
        }
    }

    #[test]
    fn missing_fp_extensions_are_reported_unsupported() {
        let mut config = core::DeviceConfig::cpu();
        config.half_fp_config = None;
        config.extensions.retain(|e| e != "cl_khr_fp16");
        let platform = core::create_platform(core::PlatformConfig::empty().device(config));
        let device = core::get_device_ids(&platform, None).unwrap().remove(0);

        let report = device_report(&device).unwrap();
        assert!(report.contains("Half: (unsupported)"));
    }
}
