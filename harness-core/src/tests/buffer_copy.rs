use crate::tests::{build, default_queue, ADD_SRC};
use crate::{ArgVal, CommandQueueProperties, HostDst, HostSrc, MemFlags, MemInit, Status};

const ADDEND: f32 = 10.0;
const DATASET_SIZE: usize = 2 << 20;

#[test]
fn buffer_copy_core() {
    let (_device, context, queue) = default_queue(Some(CommandQueueProperties::PROFILING_ENABLE));
    let program = build(&context, ADD_SRC).unwrap();
    let len = DATASET_SIZE * 4;

    let mut src_buffer_vec = vec![0.0f32; DATASET_SIZE];
    let src_buffer = crate::create_buffer(&context, MemFlags::READ_WRITE, len,
        MemInit::Copy(bytemuck::cast_slice(&src_buffer_vec))).unwrap();

    let mut dst_buffer_vec = vec![0.0f32; DATASET_SIZE];
    let dst_buffer = crate::create_buffer(&context, MemFlags::READ_WRITE, len,
        MemInit::Uninit).unwrap();

    let kernel = crate::create_kernel(&program, "add").unwrap();
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&src_buffer)).unwrap();
    crate::set_kernel_arg(&kernel, 1, ArgVal::scalar(&ADDEND)).unwrap();

    crate::enqueue_kernel(&queue, &kernel, 1, None, &[DATASET_SIZE, 1, 1], None, None).unwrap();

    // Copy a range of src_buffer to dst_buffer (element offsets):
    let copy_range = (153, 150000);
    crate::enqueue_copy_buffer(&queue, &src_buffer, &dst_buffer, copy_range.0 * 4,
        copy_range.0 * 4, (copy_range.1 - copy_range.0) * 4, None).unwrap();

    crate::enqueue_read_buffer(&queue, &src_buffer, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut src_buffer_vec)), None).unwrap();
    crate::enqueue_read_buffer(&queue, &dst_buffer, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut dst_buffer_vec)), None).unwrap();

    for i in 0..DATASET_SIZE {
        assert_eq!(src_buffer_vec[i], ADDEND);

        if i >= copy_range.0 && i < copy_range.1 {
            assert_eq!(dst_buffer_vec[i], ADDEND);
        } else {
            assert!(dst_buffer_vec[i] == 0.0, "dst_vec: {}, idx: {}", dst_buffer_vec[i], i);
        }
    }
}

#[test]
fn copy_overlap_is_rejected() {
    let (_device, context, queue) = default_queue(None);
    let buffer = crate::create_buffer(&context, MemFlags::new(), 1024, MemInit::Uninit).unwrap();

    let err = crate::enqueue_copy_buffer(&queue, &buffer, &buffer, 0, 256, 512, None)
        .unwrap_err();
    assert_eq!(err.api_status(), Some(Status::MemCopyOverlap));

    // Disjoint ranges of the same buffer are fine.
    crate::enqueue_copy_buffer(&queue, &buffer, &buffer, 0, 512, 512, None).unwrap();
    crate::finish(&queue).unwrap();
}

#[test]
fn fill_and_partial_write() {
    let (_device, context, queue) = default_queue(None);
    let buffer = crate::create_buffer(&context, MemFlags::new(), 64, MemInit::Uninit).unwrap();

    crate::enqueue_fill_buffer(&queue, &buffer, &7u32.to_ne_bytes(), 0, 64, None).unwrap();
    crate::enqueue_write_buffer(&queue, &buffer, false, 8,
        HostSrc::Slice(bytemuck::cast_slice(&[1u32, 2])), None).unwrap();

    let mut out = vec![0u32; 16];
    crate::enqueue_read_buffer(&queue, &buffer, true, 0,
        HostDst::Slice(bytemuck::cast_slice_mut(&mut out)), None).unwrap();

    assert_eq!(&out[..4], &[7, 7, 1, 2]);
    assert!(out[4..].iter().all(|&v| v == 7));

    // Pattern length must divide the range.
    let err = crate::enqueue_fill_buffer(&queue, &buffer, &[0u8; 3], 0, 63, None).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
}

#[test]
fn out_of_bounds_read_is_rejected() {
    let (_device, context, queue) = default_queue(None);
    let buffer = crate::create_buffer(&context, MemFlags::new(), 16, MemInit::Uninit).unwrap();
    let mut out = [0u8; 16];

    let err = crate::enqueue_read_buffer(&queue, &buffer, true, 4, HostDst::Slice(&mut out),
        None).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
}

#[test]
fn aliased_host_memory_sees_kernel_writes() {
    let (_device, context, queue) = default_queue(None);
    let program = build(&context, ADD_SRC).unwrap();
    let host = crate::HostMem::from_bytes(bytemuck::cast_slice(&[1.0f32; 64]));
    let buffer = crate::create_buffer(&context, MemFlags::new(), 256, MemInit::Alias(host.clone()))
        .unwrap();
    assert!(buffer.flags().contains(MemFlags::USE_HOST_PTR));

    let kernel = crate::create_kernel(&program, "add").unwrap();
    crate::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
    crate::set_kernel_arg(&kernel, 1, ArgVal::scalar(&2.0f32)).unwrap();
    let event = crate::enqueue_kernel(&queue, &kernel, 1, None, &[64, 1, 1], None, None).unwrap();
    crate::wait_for_event(&event).unwrap();

    let values: Vec<f32> = crate::util::from_bytes(host.read().as_slice());
    assert!(values.iter().all(|&v| v == 3.0));
}
