use crate::tests::misc_pro_que;

const IDX: usize = 20007;
const ADDEND: f32 = 10.0;
const DATASET_SIZE: usize = 1 << 16;

#[test]
fn buffer_copy_standard() {
    let pro_que = misc_pro_que(DATASET_SIZE);

    let src_buffer = pro_que.create_buffer::<f32>().unwrap();
    src_buffer.cmd().fill(0.0f32, None).enq().unwrap();
    let mut src_vec = vec![0.0f32; src_buffer.len()];

    let dst_buffer = pro_que.create_buffer::<f32>().unwrap();
    dst_buffer.cmd().fill(0.0f32, None).enq().unwrap();
    let mut dst_vec = vec![0.0f32; dst_buffer.len()];

    let kernel = pro_que.kernel_builder("add")
        .arg(&src_buffer)
        .arg(ADDEND)
        .build().unwrap();

    kernel.enq().unwrap();

    // Copy src to dst:
    let copy_range = (IDX, pro_que.dims()[0] - 100);
    src_buffer.cmd()
        .offset(copy_range.0)
        .copy(&dst_buffer, Some(copy_range.0), Some(copy_range.1 - copy_range.0))
        .enq().unwrap();

    // Read both buffers from device.
    src_buffer.read(&mut src_vec).enq().unwrap();
    dst_buffer.read(&mut dst_vec).enq().unwrap();

    for i in 0..pro_que.dims()[0] {
        assert!((src_vec[i] - ADDEND).abs() < 0.001);

        if i >= copy_range.0 && i < copy_range.1 {
            assert!((dst_vec[i] - ADDEND).abs() < 0.001);
        } else {
            assert!((dst_vec[i] - 0.0).abs() < 0.001, "dst_buf: {}, idx: {}", dst_vec[i], i);
        }
    }
}

#[test]
fn copy_past_the_end_is_rejected() {
    let pro_que = misc_pro_que(256);
    let src_buffer = pro_que.create_buffer::<f32>().unwrap();
    let short_buffer = pro_que.buffer_builder::<f32>().len(128).build().unwrap();

    let err = src_buffer.copy(&short_buffer, None, None).enq().unwrap_err();
    match err {
        crate::Error::BufferCmd(crate::BufferCmdError::DataLenOor { data_len, remaining }) => {
            assert_eq!((data_len, remaining), (256, 128));
        },
        other => panic!("expected an out of range copy, found: {:?}", other),
    }
}

#[test]
fn copy_host_slice_round_trips() {
    let pro_que = misc_pro_que(1000);
    let data: Vec<u32> = (0..1000).map(|i| i * 3).collect();
    let buffer = pro_que.buffer_builder::<u32>()
        .copy_host_slice(&data)
        .build().unwrap();

    let mut out = vec![0u32; buffer.len()];
    buffer.read(&mut out).enq().unwrap();
    assert_eq!(out, data);
}
