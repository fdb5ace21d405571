use crate::error::Error;
use crate::flags::MemFlags;
use crate::standard::BufferCmdError;
use crate::tests::misc_pro_que;
use crate::OclCoreError;

const LEN: usize = 100;
const SUB_ORIGIN: usize = 30;
const SUB_LEN: usize = 20;

fn indexed_buffer() -> (crate::ProQue, crate::Buffer<f32>) {
    let pro_que = misc_pro_que(LEN);
    let data: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let buffer = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build().unwrap();
    (pro_que, buffer)
}

#[test]
fn sub_buffer_reads_its_window() {
    let (_pro_que, buffer) = indexed_buffer();
    let sub_buffer = buffer.create_sub_buffer(None, SUB_ORIGIN, SUB_LEN).unwrap();

    assert_eq!(sub_buffer.len(), SUB_LEN);
    assert_eq!(sub_buffer.offset(), Some(SUB_ORIGIN));

    let mut vec = vec![0.0f32; SUB_LEN];
    sub_buffer.read(&mut vec).enq().unwrap();
    for (k, &v) in vec.iter().enumerate() {
        assert_eq!(v, (SUB_ORIGIN + k) as f32);
    }
}

#[test]
fn kernel_writes_through_a_sub_buffer() {
    let (pro_que, buffer) = indexed_buffer();
    let sub_buffer = buffer.create_sub_buffer(Some(MemFlags::new().read_write()), SUB_ORIGIN,
        SUB_LEN).unwrap();

    let kernel = pro_que.kernel_builder("add")
        .arg(&sub_buffer)
        .arg(1000.0f32)
        .global_work_size(SUB_LEN)
        .build().unwrap();
    kernel.enq().unwrap();

    let mut vec = vec![0.0f32; LEN];
    buffer.read(&mut vec).enq().unwrap();
    for (i, &v) in vec.iter().enumerate() {
        if (SUB_ORIGIN..SUB_ORIGIN + SUB_LEN).contains(&i) {
            assert_eq!(v, i as f32 + 1000.0, "idx: {}", i);
        } else {
            assert_eq!(v, i as f32, "idx: {}", i);
        }
    }
}

#[test]
fn misaligned_origin_is_rejected() {
    let (_pro_que, buffer) = indexed_buffer();

    // One `f32` is four bytes, short of the eight byte alignment.
    match buffer.create_sub_buffer(None, 1, SUB_LEN) {
        Err(Error::Core(OclCoreError::MisalignedSubBuffer { origin, align })) => {
            assert_eq!((origin, align), (4, 8));
        },
        other => panic!("expected a misaligned sub-buffer, found: {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn out_of_range_window_is_rejected() {
    let (_pro_que, buffer) = indexed_buffer();

    match buffer.create_sub_buffer(None, 90, SUB_LEN) {
        Err(Error::BufferCmd(BufferCmdError::DataLenOor { data_len, remaining })) => {
            assert_eq!((data_len, remaining), (110, LEN));
        },
        other => panic!("expected an out of range window, found: {:?}", other.map(|b| b.len())),
    }
}
