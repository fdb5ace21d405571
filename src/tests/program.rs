use harness_extras::kernels::{misc, search};
use crate::core::{self, DeviceConfig, PlatformConfig};
use crate::enums::{ProgramBuildInfo, ProgramBuildInfoResult, ProgramBuildStatus, Status};
use crate::error::Error;
use crate::flags::DeviceType;
use crate::standard::{Context, Device, Platform, ProQue, Program, Queue};
use crate::tests::misc_pro_que;
use crate::OclCoreError;

#[test]
fn kernel_names_follow_declaration_order() {
    let pro_que = misc_pro_que(64);
    assert_eq!(pro_que.program().kernel_names().unwrap(),
        vec!["add", "multiply", "add_u32", "stamp_index", "append_tag", "wg_test"]);
}

#[test]
fn unknown_entry_point() {
    let pro_que = misc_pro_que(64);
    let err = pro_que.kernel_builder("subtract").build().unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidKernelName));
    match err.as_core() {
        Some(OclCoreError::UnknownEntryPoint(name)) => assert_eq!(name, "subtract"),
        other => panic!("expected an unknown entry point, found: {:?}", other),
    }
}

#[test]
fn build_failure_surfaces_the_log() {
    let src = format!("{}\n__kernel void subtract(__global float* buffer) {{ }}\n", misc::SRC);
    let context = Context::builder().build().unwrap();
    let device = context.devices()[0].clone();

    let log = match Program::builder().src(src.clone()).kernels(misc::library())
            .devices(device.clone()).build(&context) {
        Err(Error::Core(OclCoreError::BuildFailed { log })) => log,
        other => panic!("expected a build failure, found: {:?}", other.map(|p| p.as_core().id())),
    };
    assert!(log.contains("subtract"), "log: {}", log);

    // Failures and their logs are also recorded on the program.
    let program = core::create_program_with_source(context.as_core(), &[src],
        &misc::library()).unwrap();
    assert!(core::build_program(&program, None, "").is_err());
    let program = Program::from(program);
    match program.build_info(&device, ProgramBuildInfo::BuildStatus).unwrap() {
        ProgramBuildInfoResult::BuildStatus(s) => assert_eq!(s, ProgramBuildStatus::Error),
        other => panic!("unexpected result: {:?}", other),
    }
    match program.build_info(&device, ProgramBuildInfo::BuildLog).unwrap() {
        ProgramBuildInfoResult::BuildLog(l) => assert_eq!(l, log),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn build_options_reach_the_compiler() {
    let src = r#"
        #ifdef SCALE
        __kernel void add(__global float* buffer, float addend) {
            buffer[get_global_id(0)] += addend;
        }
        #endif
    "#;
    let context = Context::builder().build().unwrap();
    let library = misc::library();

    // Without the definition the program builds with no entry points.
    let program = Program::builder().src(src).kernels(library.clone()).build(&context).unwrap();
    assert!(program.kernel_names().unwrap().is_empty());
    match core::create_kernel(program.as_core(), "add") {
        Err(OclCoreError::UnknownEntryPoint(name)) => assert_eq!(name, "add"),
        other => panic!("expected an unknown entry point, found: {:?}", other.map(|_| ())),
    }

    let program = Program::builder()
        .src(src)
        .kernels(library)
        .cmplr_def("SCALE", 2)
        .build(&context).unwrap();
    assert_eq!(program.kernel_names().unwrap(), vec!["add"]);
}

#[test]
fn uneven_work_groups_are_refused() {
    let pro_que = misc_pro_que(100);
    let buffer = pro_que.create_buffer::<f32>().unwrap();
    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(1.0f32)
        .local_work_size(32)
        .build().unwrap();

    let err = kernel.enq().unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidWorkGroupSize));

    // The device maximum is enforced as well.
    let max = pro_que.max_wg_size().unwrap();
    let err = kernel.cmd().global_work_size(max * 2).local_work_size(max * 2).enq()
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidWorkGroupSize));

    kernel.cmd().local_work_size(25).enq().unwrap();
}

#[test]
fn context_handles_are_counted() {
    let context = Context::builder().build().unwrap();
    let count = context.ref_count();

    let clone = context.clone();
    assert_eq!(context.ref_count(), count + 1);
    drop(clone);
    assert_eq!(context.ref_count(), count);

    let _queue = Queue::new(&context, context.devices()[0].clone(), None).unwrap();
    assert!(context.ref_count() > count);
}

#[test]
fn device_falls_back_to_cpu() {
    let platform = Platform::new(core::create_platform(
        PlatformConfig::empty().device(DeviceConfig::cpu())));

    assert!(Device::list(&platform, Some(DeviceType::GPU)).unwrap().is_empty());
    let device = Device::prefer_gpu(&platform).unwrap();
    assert_eq!(device.device_type().unwrap(), DeviceType::CPU);

    let text = b"that which we have from that day with that hope, with a word from home";
    let pattern = search::pattern(["that", "with", "have", "from"]);

    let pro_que = ProQue::builder()
        .platform(platform)
        .src(search::SRC)
        .kernels(search::library())
        .dims(8)
        .build().unwrap();
    assert_eq!(pro_que.device(), device);
    assert_eq!(pro_que.max_wg_size().unwrap(), 1024);

    let text_buf = pro_que.buffer_builder::<u8>()
        .len(text.len())
        .copy_host_slice(&text[..])
        .build().unwrap();
    let result_buf = pro_que.buffer_builder::<i32>().len(4).fill_val(0).build().unwrap();
    let chars_per_item = (text.len() / 8 + 1) as i32;

    let kernel = pro_que.kernel_builder("string_search")
        .arg(pattern)
        .arg(&text_buf)
        .arg(chars_per_item)
        .arg_local::<i32>(4)
        .arg(&result_buf)
        .local_work_size(4)
        .build().unwrap();
    kernel.enq().unwrap();

    let mut counts = vec![0i32; 4];
    result_buf.read(&mut counts).enq().unwrap();
    assert_eq!(counts, search::count_on_host(&pattern, text).to_vec());
}

#[test]
fn empty_platform_has_no_device() {
    let platform = Platform::new(core::create_platform(PlatformConfig::empty()));
    let err = Device::prefer_gpu(&platform).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::DeviceNotFound));
}
