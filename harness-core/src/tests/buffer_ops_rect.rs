use rand::Rng;

use crate::tests::{default_queue, verify_vec_rect};
use crate::{HostDst, HostSrc, MemFlags, MemInit, Status};

const TOTAL_ITERS: usize = 8;

fn gen_region_origin(dims: &[usize; 3]) -> ([usize; 3], [usize; 3]) {
    let mut rng = rand::thread_rng();

    let region = [
        rng.gen_range(1..dims[0] + 1),
        rng.gen_range(1..dims[1] + 1),
        rng.gen_range(1..dims[2] + 1),
    ];

    let origin = [
        rng.gen_range(0..(dims[0] - region[0]) + 1),
        rng.gen_range(0..(dims[1] - region[1]) + 1),
        rng.gen_range(0..(dims[2] - region[2]) + 1),
    ];

    (origin, region)
}

#[test]
fn buffer_ops_rect() {
    let (_device, context, queue) = default_queue(None);
    let dims = [16usize, 8, 4];
    let len = dims[0] * dims[1] * dims[2];
    let elem = std::mem::size_of::<i32>();

    let buffer = crate::create_buffer(&context, MemFlags::new(), len * elem, MemInit::Uninit)
        .unwrap();

    let row_pitch = dims[0] * elem;
    let slc_pitch = dims[0] * dims[1] * elem;

    for _ in 0..TOTAL_ITERS {
        let (origin, region) = gen_region_origin(&dims);
        let byte_origin = [origin[0] * elem, origin[1], origin[2]];
        let byte_region = [region[0] * elem, region[1], region[2]];

        // Reset the device side to zero, then write the region from a host
        // vector full of ones.
        crate::enqueue_fill_buffer(&queue, &buffer, &0i32.to_ne_bytes(), 0, len * elem, None)
            .unwrap();
        let ones = vec![1i32; len];
        crate::enqueue_write_buffer_rect(&queue, &buffer, false, byte_origin, byte_origin,
            byte_region, row_pitch, slc_pitch, row_pitch, slc_pitch,
            HostSrc::Slice(bytemuck::cast_slice(&ones)), None).unwrap();

        let mut all = vec![-1i32; len];
        crate::enqueue_read_buffer(&queue, &buffer, true, 0,
            HostDst::Slice(bytemuck::cast_slice_mut(&mut all)), None).unwrap();
        verify_vec_rect(origin, region, 1, 0, dims, &all).unwrap();

        // Read the same region back into a host vector of twos. Only the
        // region changes.
        let mut twos = vec![2i32; len];
        crate::enqueue_read_buffer_rect(&queue, &buffer, true, byte_origin, byte_origin,
            byte_region, row_pitch, slc_pitch, row_pitch, slc_pitch,
            HostDst::Slice(bytemuck::cast_slice_mut(&mut twos)), None).unwrap();
        verify_vec_rect(origin, region, 1, 2, dims, &twos).unwrap();
    }
}

#[test]
fn rect_read_into_packed_host() {
    let (_device, context, queue) = default_queue(None);

    // A 4x4 grid of bytes, 0..16, read as the 2x2 block at (1, 2).
    let data: Vec<u8> = (0..16).collect();
    let buffer = crate::create_buffer(&context, MemFlags::new(), 16, MemInit::Copy(&data))
        .unwrap();

    let mut block = [0u8; 4];
    crate::enqueue_read_buffer_rect(&queue, &buffer, true, [1, 2, 0], [0, 0, 0], [2, 2, 1], 4,
        0, 0, 0, HostDst::Slice(&mut block), None).unwrap();
    assert_eq!(block, [9, 10, 13, 14]);
}

#[test]
fn rect_validation() {
    let (_device, context, queue) = default_queue(None);
    let buffer = crate::create_buffer(&context, MemFlags::new(), 64, MemInit::Uninit).unwrap();
    let mut host = [0u8; 64];

    // Row pitch narrower than the region.
    let err = crate::enqueue_read_buffer_rect(&queue, &buffer, true, [0, 0, 0], [0, 0, 0],
        [8, 2, 1], 4, 0, 0, 0, HostDst::Slice(&mut host), None).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));

    // Region past the end of the buffer.
    let err = crate::enqueue_read_buffer_rect(&queue, &buffer, true, [0, 7, 0], [0, 0, 0],
        [8, 2, 1], 8, 0, 0, 0, HostDst::Slice(&mut host), None).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::InvalidValue));
}
