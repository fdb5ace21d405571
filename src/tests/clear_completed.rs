use crate::standard::EventList;
use crate::tests::misc_pro_que;

#[test]
fn clear_completed() {
    let pro_que = misc_pro_que(1 << 10);
    let buffer = pro_que.create_buffer::<f32>().unwrap();

    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(10.0f32)
        .build().unwrap();

    let mut event_list = EventList::new();

    let mut vec = vec![0.0f32; buffer.len()];

    for _ in 0..256 {
        kernel.cmd().enew(&mut event_list).enq().unwrap();

        buffer.read(&mut vec).enq().unwrap();

        event_list.clear_completed().unwrap();
    }

    assert!(event_list.is_empty());
    assert!(vec.iter().all(|&v| v == 2560.0));
}
