use crate::core::{KernelLibrary, Result as CoreResult, WorkGroup};
use crate::standard::{Buffer, Event, ProQue, Queue};
use crate::tests::misc_pro_que;

const DATASET_SIZE: usize = 1 << 16;

#[test]
fn fill() {
    let pro_que = misc_pro_que(DATASET_SIZE);
    let buffer = pro_que.create_buffer::<f32>().unwrap();

    buffer.cmd().fill(5.0f32, None).enq().unwrap();

    let mut vec = vec![0.0f32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, 5.0f32);
    }

    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(&10.0f32)
        .build().unwrap();

    kernel.enq().unwrap();

    let mut vec = vec![0.0f32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, 15.0f32);
    }
}

fn add_float4(group: &WorkGroup) -> CoreResult<()> {
    let buffer = group.global::<[f32; 4]>(0)?;
    let addend = group.scalar::<[f32; 4]>(1)?;
    for item in group.items() {
        let cell = &buffer[item.global_id[0]];
        let mut v = cell.get();
        for (x, a) in v.iter_mut().zip(addend.iter()) {
            *x += a;
        }
        cell.set(v);
    }
    Ok(())
}

#[test]
fn fill_with_float4() {
    let src = r#"
        __kernel void add_float4(__global float4* buffer, float4 addend) {
            buffer[get_global_id(0)] += addend;
        }
    "#;

    let start_val = [9.0f32, 11.0, 14.0, 18.0];
    let addend = [10.0f32; 4];
    let final_val = [19.0f32, 21.0, 24.0, 28.0];

    let pro_que = ProQue::builder()
        .src(src)
        .kernels(KernelLibrary::new().with("add_float4", add_float4))
        .dims(DATASET_SIZE)
        .build().unwrap();

    let buffer = pro_que.create_buffer::<[f32; 4]>().unwrap();

    buffer.cmd().fill(start_val, None).enq().unwrap();

    let mut vec = vec![[0.0f32; 4]; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, start_val);
    }

    let kernel = pro_que.kernel_builder("add_float4")
        .arg(&buffer)
        .arg(addend)
        .build().unwrap();

    kernel.enq().unwrap();

    buffer.read(&mut vec).enq().unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, final_val);
    }
}

#[test]
fn fill_with_event() {
    let pro_que = misc_pro_que(DATASET_SIZE);

    let one_queue = pro_que.queue();
    let other_queue = Queue::new(pro_que.context(), pro_que.device(), None).unwrap();

    let mut fill_event = Event::empty();

    let buffer = Buffer::builder()
        .queue(other_queue)
        .len(DATASET_SIZE)
        .fill_val(5.0f32)
        .fill_event(&mut fill_event)
        .build().unwrap();

    let mut read_event = Event::empty();
    let mut vec = vec![0.0f32; buffer.len()];
    buffer.read(&mut vec).queue(one_queue).ewait(&fill_event).enew(&mut read_event).enq()
        .unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, 5.0f32);
    }

    let kernel = pro_que.kernel_builder("add")
        .arg(&buffer)
        .arg(&10.0f32)
        .build().unwrap();

    let mut kernel_event = Event::empty();
    kernel.cmd().ewait(&read_event).enew(&mut kernel_event).enq().unwrap();

    let mut vec = vec![0.0f32; buffer.len()];
    buffer.read(&mut vec).ewait(&kernel_event).enq().unwrap();

    for &ele in vec.iter() {
        assert_eq!(ele, 15.0f32);
    }
}

#[test]
fn partial_fill_leaves_the_rest() {
    let pro_que = misc_pro_que(64);
    let buffer = pro_que.buffer_builder::<i32>().fill_val(-1).build().unwrap();
    buffer.cmd().offset(16).fill(7, Some(8)).enq().unwrap();

    let mut vec = vec![0i32; buffer.len()];
    buffer.read(&mut vec).enq().unwrap();

    for (i, &ele) in vec.iter().enumerate() {
        let expected = if (16..24).contains(&i) { 7 } else { -1 };
        assert_eq!(ele, expected, "idx: {}", i);
    }
}
