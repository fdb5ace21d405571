use crate::tests::get_available_contexts;
use crate::{
    ContextInfo, ContextInfoResult, ContextProperties, DeviceConfig, DeviceInfo,
    DeviceInfoResult, DeviceType, Error, PlatformConfig, PlatformInfo, Status,
};

#[test]
fn default_platform_has_devices() {
    let platforms = crate::get_platform_ids().unwrap();
    assert!(!platforms.is_empty());

    let name: String = crate::get_platform_info(&platforms[0], PlatformInfo::Name).unwrap().into();
    assert!(!name.is_empty());

    let contexts = get_available_contexts();
    assert!(!contexts.is_empty());

    for (device, context) in contexts {
        assert_eq!(context.devices(), &[device.clone()]);
        match crate::get_device_info(&device, DeviceInfo::MaxWorkItemSizes).unwrap() {
            DeviceInfoResult::MaxWorkItemSizes(sizes) => assert_eq!(sizes.len(), 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

#[test]
fn device_type_filter_and_fallback() {
    let cpu_only = crate::create_platform(PlatformConfig::empty().device(DeviceConfig::cpu()));

    match crate::get_device_ids(&cpu_only, Some(DeviceType::GPU)) {
        Err(Error::NoDevice) => (),
        other => panic!("expected no GPU, found: {:?}", other),
    }

    let cpus = crate::get_device_ids(&cpu_only, Some(DeviceType::CPU)).unwrap();
    assert_eq!(cpus.len(), 1);

    // `DEFAULT` selects the first device whatever its type.
    let default = crate::get_device_ids(&cpu_only, Some(DeviceType::DEFAULT)).unwrap();
    assert_eq!(default, cpus);

    let empty = crate::create_platform(PlatformConfig::empty());
    assert!(crate::get_device_ids(&empty, None).is_err());
}

#[test]
fn unsupported_query_names_the_capability() {
    let mut config = DeviceConfig::gpu();
    config.double_fp_config = None;
    config.image_support = false;
    let platform = crate::create_platform(PlatformConfig::empty().device(config));
    let device = crate::get_device_ids(&platform, None).unwrap().remove(0);

    match crate::get_device_info(&device, DeviceInfo::DoubleFpConfig) {
        Err(Error::UnsupportedQuery { ref query, .. }) => assert_eq!(query, "DoubleFpConfig"),
        other => panic!("expected an unsupported query, found: {:?}", other),
    }
    assert!(crate::get_device_info(&device, DeviceInfo::Image2dMaxWidth).is_err());

    match crate::get_device_info(&device, DeviceInfo::ImageSupport).unwrap() {
        DeviceInfoResult::ImageSupport(supported) => assert!(!supported),
        other => panic!("unexpected result: {:?}", other),
    }

    // Devices remember their platform.
    match crate::get_device_info(&device, DeviceInfo::Platform).unwrap() {
        DeviceInfoResult::Platform(p) => assert_eq!(p, platform),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn context_creation_rules() {
    let platform = crate::get_platform_ids().unwrap().remove(0);
    let devices = crate::get_device_ids(&platform, None).unwrap();

    assert!(match crate::create_context(None, &[]) {
        Err(Error::NoDevice) => true,
        _ => false,
    });

    let other = crate::create_platform(PlatformConfig::default());
    let other_device = crate::get_device_ids(&other, None).unwrap().remove(0);
    let err = crate::create_context(None, &[devices[0].clone(), other_device.clone()])
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidDevice));

    let props = ContextProperties::new().platform(other.clone());
    let err = crate::create_context(Some(&props), &devices).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidPlatform));

    // Duplicate devices collapse.
    let context = crate::create_context(None, &[devices[0].clone(), devices[0].clone()]).unwrap();
    match crate::get_context_info(&context, ContextInfo::NumDevices).unwrap() {
        ContextInfoResult::NumDevices(n) => assert_eq!(n, 1),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn context_reference_count() {
    let platform = crate::get_platform_ids().unwrap().remove(0);
    let devices = crate::get_device_ids(&platform, None).unwrap();
    let context = crate::create_context(None, &devices).unwrap();

    let count = |c: &crate::Context| match crate::get_context_info(c, ContextInfo::ReferenceCount)
            .unwrap() {
        ContextInfoResult::ReferenceCount(n) => n,
        other => panic!("unexpected result: {:?}", other),
    };

    assert_eq!(count(&context), 1);
    let clone = context.clone();
    assert_eq!(count(&context), 2);
    drop(clone);
    assert_eq!(count(&context), 1);
}

#[test]
fn queue_requires_context_device() {
    let cpu_only = crate::create_platform(PlatformConfig::empty().device(DeviceConfig::cpu()));
    let cpu = crate::get_device_ids(&cpu_only, None).unwrap().remove(0);

    let platform = crate::get_platform_ids().unwrap().remove(0);
    let device = crate::get_device_ids(&platform, None).unwrap().remove(0);
    let context = crate::create_context(None, &[device]).unwrap();

    let err = crate::create_command_queue(&context, &cpu, None).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidDevice));
}
