use crate::error::Result;
use crate::tests::{build, default_queue, ADD_SRC};
use crate::{
    ArgVal, Error, HostDst, ImageChannelDataType, ImageChannelOrder, ImageDescriptor,
    ImageFormat, KernelArgAddressQualifier, KernelArgInfo, KernelArgInfoResult, KernelLibrary,
    KernelWorkGroupInfo, KernelWorkGroupInfoResult, MemFlags, MemInit, Status, WorkGroup,
};

const ARGS_SRC: &str = r#"
    __kernel void group_sizes(
        __global uint* out,
        __local float* scratch,
        sampler_t sampler,
        __read_only image2d_t image,
        uint4 lanes)
    {
    }
"#;

/// Records each group's size and the sum of its local ids.
fn group_sizes(group: &WorkGroup) -> Result<()> {
    let out = group.global::<u32>(0)?;
    let scratch = group.local::<f32>(1)?;
    assert_eq!(scratch.len(), 16);

    for item in group.items() {
        scratch[item.local_linear % 16].set(item.local_id[0] as f32);
    }
    out[group.group_id(0)].set(group.local_size(0) as u32);
    Ok(())
}

fn args_program(context: &crate::Context) -> crate::Program {
    let lib = KernelLibrary::new().with("group_sizes", group_sizes);
    let program = crate::create_program_with_source(context, &[ARGS_SRC.to_owned()], &lib)
        .unwrap();
    crate::build_program(&program, None, "").unwrap();
    program
}

#[test]
fn argument_types_are_checked() {
    let (_device, context, _queue) = default_queue(None);
    let program = args_program(&context);
    let kernel = crate::create_kernel(&program, "group_sizes").unwrap();

    let buffer = crate::create_buffer(&context, MemFlags::new(), 64, MemInit::Uninit).unwrap();
    let format = ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt8);
    let image = crate::create_image(&context, MemFlags::new(), &format,
        &ImageDescriptor::new_2d(4, 4, 0), MemInit::Uninit).unwrap();

    let status = |idx: u32, arg: ArgVal| {
        crate::set_kernel_arg(&kernel, idx, arg).err().and_then(|e| e.api_status())
    };

    assert_eq!(status(0, ArgVal::mem(&buffer)), None);
    assert_eq!(status(0, ArgVal::mem_null()), None);
    assert_eq!(status(0, ArgVal::mem(&image)), Some(Status::InvalidMemObject));
    assert_eq!(status(0, ArgVal::scalar(&1u32)), Some(Status::InvalidArgValue));
    assert_eq!(status(1, ArgVal::local::<f32>(0)), Some(Status::InvalidArgSize));
    assert_eq!(status(1, ArgVal::local::<f32>(16)), None);
    assert_eq!(status(2, ArgVal::mem(&buffer)), Some(Status::InvalidArgValue));
    assert_eq!(status(3, ArgVal::mem(&buffer)), Some(Status::InvalidMemObject));
    assert_eq!(status(3, ArgVal::mem(&image)), None);
    assert_eq!(status(4, ArgVal::scalar(&1u32)), Some(Status::InvalidArgSize));
    assert_eq!(status(4, ArgVal::scalar(&[1u32, 2, 3, 4])), None);
    assert_eq!(status(5, ArgVal::scalar(&1u32)), Some(Status::InvalidArgIndex));

    match crate::get_kernel_arg_info(&kernel, 1, KernelArgInfo::AddressQualifier).unwrap() {
        KernelArgInfoResult::AddressQualifier(q) => assert_eq!(q, KernelArgAddressQualifier::Local),
        other => panic!("unexpected result: {:?}", other),
    }
    match crate::get_kernel_arg_info(&kernel, 4, KernelArgInfo::TypeName).unwrap() {
        KernelArgInfoResult::TypeName(t) => assert_eq!(t, "uint4"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn foreign_buffer_is_rejected() {
    let (_device, context, _queue) = default_queue(None);
    let (_other_device, other_context, _other_queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();
    let kernel = crate::create_kernel(&program, "add").unwrap();

    let foreign = crate::create_buffer(&other_context, MemFlags::new(), 16, MemInit::Uninit)
        .unwrap();
    match crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&foreign)) {
        Err(Error::ForeignResource(_)) => (),
        other => panic!("expected a foreign resource error, found: {:?}", other),
    }
}

#[test]
fn launch_validation() {
    let (device, context, queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();
    let kernel = crate::create_kernel(&program, "add").unwrap();
    let buffer = crate::create_buffer(&context, MemFlags::new(), 1024, MemInit::Uninit).unwrap();

    // Unset arguments.
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
    let err = crate::enqueue_kernel(&queue, &kernel, 1, None, &[256, 1, 1], None, None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidKernelArgs));
    crate::set_kernel_arg(&kernel, 1, ArgVal::scalar(&1.0f32)).unwrap();

    let err = crate::enqueue_kernel(&queue, &kernel, 0, None, &[256, 1, 1], None, None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidWorkDimension));

    let err = crate::enqueue_kernel(&queue, &kernel, 1, None, &[0, 1, 1], None, None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidGlobalWorkSize));

    match crate::enqueue_kernel(&queue, &kernel, 1, None, &[256, 1, 1], Some([3, 1, 1]), None) {
        Err(Error::InvalidWorkGroup(_)) => (),
        other => panic!("expected an invalid work-group, found: {:?}", other),
    }

    let max = match crate::get_kernel_work_group_info(&kernel, &device,
            KernelWorkGroupInfo::WorkGroupSize).unwrap() {
        KernelWorkGroupInfoResult::WorkGroupSize(max) => max,
        other => panic!("unexpected result: {:?}", other),
    };
    match crate::enqueue_kernel(&queue, &kernel, 1, None, &[max * 2, 1, 1],
            Some([max * 2, 1, 1]), None) {
        Err(Error::InvalidWorkGroup(_)) => (),
        other => panic!("expected an invalid work-group, found: {:?}", other),
    }

    crate::enqueue_kernel(&queue, &kernel, 1, None, &[256, 1, 1], Some([64, 1, 1]), None)
        .unwrap();
    crate::finish(&queue).unwrap();
}

#[test]
fn local_size_is_chosen_when_omitted() {
    let (_device, context, queue) = default_queue(None);
    let program = args_program(&context);
    let kernel = crate::create_kernel(&program, "group_sizes").unwrap();

    let out = crate::create_buffer(&context, MemFlags::new(), 64 * 4, MemInit::Uninit).unwrap();
    let format = ImageFormat::new(ImageChannelOrder::Rgba, ImageChannelDataType::UnormInt8);
    let image = crate::create_image(&context, MemFlags::new(), &format,
        &ImageDescriptor::new_2d(4, 4, 0), MemInit::Uninit).unwrap();
    let sampler = crate::create_sampler(&context, false, crate::AddressingMode::ClampToEdge,
        crate::FilterMode::Nearest).unwrap();

    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&out)).unwrap();
    crate::set_kernel_arg(&kernel, 1, ArgVal::local::<f32>(16)).unwrap();
    crate::set_kernel_arg(&kernel, 2, ArgVal::sampler(&sampler)).unwrap();
    crate::set_kernel_arg(&kernel, 3, ArgVal::mem(&image)).unwrap();
    crate::set_kernel_arg(&kernel, 4, ArgVal::scalar(&[0u32; 4])).unwrap();

    // 96 items: the largest divisor within the device limit of 256 is 96.
    crate::enqueue_kernel(&queue, &kernel, 1, None, &[96, 1, 1], None, None).unwrap();
    let mut sizes = [0u32; 64];
    crate::enqueue_read_buffer(&queue, &out, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut sizes)), None).unwrap();
    assert_eq!(sizes[0], 96);
    assert_eq!(sizes[1], 0);

    // 1000 items: 250 is the largest divisor no greater than 256.
    crate::enqueue_kernel(&queue, &kernel, 1, None, &[1000, 1, 1], None, None).unwrap();
    crate::enqueue_read_buffer(&queue, &out, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut sizes)), None).unwrap();
    assert_eq!(&sizes[..4], &[250, 250, 250, 250]);
}
