use crate::tests::{build, default_queue, ADD_SRC};
use crate::{
    ArgVal, Error, HostDst, MemFlags, MemInfo, MemInfoResult, MemInit, Status,
};

#[test]
fn sub_buffer_shares_parent_storage() {
    let (_device, context, queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();

    let parent = crate::create_buffer(&context, MemFlags::new().read_write(), 64 * 4,
        MemInit::Uninit).unwrap();
    let sub = crate::create_sub_buffer(&parent, MemFlags::new(), 16 * 4, 32 * 4).unwrap();

    assert_eq!(sub.size(), 32 * 4);
    assert_eq!(sub.flags().access(), MemFlags::READ_WRITE);
    match crate::get_mem_object_info(&sub, MemInfo::Offset).unwrap() {
        MemInfoResult::Offset(offset) => assert_eq!(offset, 16 * 4),
        other => panic!("unexpected result: {:?}", other),
    }
    match crate::get_mem_object_info(&sub, MemInfo::AssociatedMemobject).unwrap() {
        MemInfoResult::AssociatedMemobject(Some(p)) => assert_eq!(p, parent),
        other => panic!("unexpected result: {:?}", other),
    }

    let kernel = crate::create_kernel(&program, "add").unwrap();
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&sub)).unwrap();
    crate::set_kernel_arg(&kernel, 1, ArgVal::scalar(&1.0f32)).unwrap();
    crate::enqueue_kernel(&queue, &kernel, 1, None, &[32, 1, 1], None, None).unwrap();

    let mut all = vec![0.0f32; 64];
    crate::enqueue_read_buffer(&queue, &parent, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut all)), None).unwrap();

    for (i, &v) in all.iter().enumerate() {
        let expected = if i >= 16 && i < 48 { 1.0 } else { 0.0 };
        assert_eq!(v, expected, "idx: {}", i);
    }
}

#[test]
fn misaligned_origin_is_rejected() {
    let (_device, context, _queue) = default_queue(None);
    let parent = crate::create_buffer(&context, MemFlags::new(), 256, MemInit::Uninit).unwrap();

    match crate::create_sub_buffer(&parent, MemFlags::new(), 4, 16) {
        Err(Error::MisalignedSubBuffer { origin, align }) => {
            assert_eq!(origin, 4);
            assert!(align > 4);
        },
        other => panic!("expected a misaligned sub-buffer, found: {:?}", other),
    }
}

#[test]
fn sub_buffer_bounds_and_nesting() {
    let (_device, context, _queue) = default_queue(None);
    let parent = crate::create_buffer(&context, MemFlags::new(), 256, MemInit::Uninit).unwrap();

    let err = crate::create_sub_buffer(&parent, MemFlags::new(), 128, 256).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));

    let err = crate::create_sub_buffer(&parent, MemFlags::new(), 0, 0).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidBufferSize));

    let sub = crate::create_sub_buffer(&parent, MemFlags::new(), 0, 128).unwrap();
    let err = crate::create_sub_buffer(&sub, MemFlags::new(), 0, 64).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidMemObject));

    // A read-only parent cannot have a writable sub-buffer.
    let ro = crate::create_buffer(&context, MemFlags::new().read_only(), 256, MemInit::Uninit)
        .unwrap();
    let err = crate::create_sub_buffer(&ro, MemFlags::new().write_only(), 0, 64).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
    let inherited = crate::create_sub_buffer(&ro, MemFlags::new(), 0, 64).unwrap();
    assert_eq!(inherited.flags().access(), MemFlags::READ_ONLY);
}

#[test]
fn oversize_allocation_is_rejected() {
    let (_device, context, _queue) = default_queue(None);
    let max = context.devices()[0].0.config.max_mem_alloc_size;

    match crate::create_buffer(&context, MemFlags::new(), max as usize + 1, MemInit::Uninit) {
        Err(Error::Oversize { requested, max: reported }) => {
            assert_eq!(requested, max + 1);
            assert_eq!(reported, max);
        },
        other => panic!("expected an oversize error, found: {:?}", other),
    }

    let err = crate::create_buffer(&context, MemFlags::new(), 0, MemInit::Uninit).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidBufferSize));

    let err = crate::create_buffer(&context, MemFlags::new().read_only().write_only(), 16,
        MemInit::Uninit).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
}
