use crate::tests::misc_pro_que;

const ROW_LEN: usize = 10;
const LEN: usize = 80;

fn buffer_with_indices() -> (crate::ProQue, crate::Buffer<f32>) {
    let pro_que = misc_pro_que(LEN);
    let data: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let buffer = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build().unwrap();
    (pro_que, buffer)
}

#[test]
fn rect_read_copies_only_the_region() {
    let (_pro_que, buffer) = buffer_with_indices();
    let pitch = ROW_LEN * 4;

    let mut host = vec![0.0f32; LEN];
    buffer.read(&mut host)
        .rect([5, 3, 0], [1, 1, 0], [4, 4, 1], pitch, 0, pitch, 0)
        .enq().unwrap();

    for y in 0..(LEN / ROW_LEN) {
        for x in 0..ROW_LEN {
            let found = host[y * ROW_LEN + x];
            if (1..5).contains(&x) && (1..5).contains(&y) {
                let src_idx = (y - 1 + 3) * ROW_LEN + (x - 1 + 5);
                assert_eq!(found, src_idx as f32, "host ({}, {})", x, y);
            } else {
                assert_eq!(found, 0.0, "host ({}, {})", x, y);
            }
        }
    }

    // Rows of the rectangle start at 35, 45, 55, and 65.
    assert_eq!(&host[11..15], &[35.0, 36.0, 37.0, 38.0]);
    assert_eq!(&host[41..45], &[65.0, 66.0, 67.0, 68.0]);
}

#[test]
fn rect_write_then_linear_read() {
    let (_pro_que, buffer) = buffer_with_indices();
    let pitch = ROW_LEN * 4;

    let block = vec![-1.0f32; 2 * 3];
    buffer.write(&block)
        .rect([0, 0, 0], [2, 1, 0], [2, 3, 1], 2 * 4, 0, pitch, 0)
        .enq().unwrap();

    let mut host = vec![0.0f32; LEN];
    buffer.read(&mut host).enq().unwrap();

    for (i, &v) in host.iter().enumerate() {
        let (x, y) = (i % ROW_LEN, i / ROW_LEN);
        if (2..4).contains(&x) && (1..4).contains(&y) {
            assert_eq!(v, -1.0, "idx: {}", i);
        } else {
            assert_eq!(v, i as f32, "idx: {}", i);
        }
    }
}

#[test]
fn rect_region_past_the_end_is_rejected() {
    let (_pro_que, buffer) = buffer_with_indices();
    let pitch = ROW_LEN * 4;

    let mut host = vec![0.0f32; LEN];
    let result = buffer.read(&mut host)
        .rect([5, 6, 0], [0, 0, 0], [4, 4, 1], pitch, 0, pitch, 0)
        .enq();
    assert!(result.is_err());
}
