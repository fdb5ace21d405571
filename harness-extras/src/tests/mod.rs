//! Runs each kernel family against the software runtime through the core
//! API and checks it against a host computation.

use crate::core::{self, ArgVal, CommandQueue, Context, HostDst, Kernel, KernelLibrary, MemFlags,
    MemInit, Program};
use crate::kernels::{bitonic, fft, matrix, misc, radix, reduction, search};

fn default_queue() -> (Context, CommandQueue) {
    let platform = core::get_platform_ids().unwrap().remove(0);
    let device = core::get_device_ids(&platform, None).unwrap().remove(0);
    let context = core::create_context(None, &[device.clone()]).unwrap();
    let queue = core::create_command_queue(&context, &device, None).unwrap();
    (context, queue)
}

fn build(context: &Context, src: &str, library: KernelLibrary) -> Program {
    let program = core::create_program_with_source(context, &[src.to_owned()], &library)
        .unwrap();
    core::build_program(&program, None, "").unwrap();
    program
}

fn read_vec<T: core::OclPrm>(queue: &CommandQueue, mem: &core::Mem, len: usize) -> Vec<T> {
    let mut bytes = vec![0u8; len * std::mem::size_of::<T>()];
    core::enqueue_read_buffer(queue, mem, true, 0, HostDst::Slice(&mut bytes), None).unwrap();
    core::util::from_bytes(&bytes)
}

fn enqueue(queue: &CommandQueue, kernel: &Kernel, global: usize, local: usize) {
    core::enqueue_kernel(queue, kernel, 1, None, &[global, 1, 1], Some([local, 1, 1]), None)
        .unwrap();
}

#[test]
fn bitonic_stages_sort_ascending() {
    const NUM_FLOATS: usize = 1 << 12;
    const LOCAL_SIZE: usize = 16;
    let (context, queue) = default_queue();
    let program = build(&context, bitonic::SRC, bitonic::library());

    let data = crate::scrambled_vec((-1000.0f32, 1000.0), NUM_FLOATS);
    let buffer = core::create_buffer(&context, MemFlags::new(), NUM_FLOATS * 4,
        MemInit::Copy(&core::util::to_bytes(&data))).unwrap();

    let kernel = |name: &str| {
        let kernel = core::create_kernel(&program, name).unwrap();
        core::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
        core::set_kernel_arg(&kernel, 1,
            ArgVal::local::<f32>(bitonic::ELEMENTS_PER_ITEM * LOCAL_SIZE)).unwrap();
        kernel
    };
    let (init, stage_0, stage_n) = (kernel("bsort_init"), kernel("bsort_stage_0"),
        kernel("bsort_stage_n"));
    let (merge, merge_last) = (kernel("bsort_merge"), kernel("bsort_merge_last"));

    let global_size = NUM_FLOATS / bitonic::ELEMENTS_PER_ITEM;
    let num_stages = (global_size / LOCAL_SIZE) as u32;
    enqueue(&queue, &init, global_size, LOCAL_SIZE);

    let mut high_stage = 2u32;
    while high_stage < num_stages {
        core::set_kernel_arg(&stage_0, 2, ArgVal::scalar(&high_stage)).unwrap();
        core::set_kernel_arg(&stage_n, 3, ArgVal::scalar(&high_stage)).unwrap();
        let mut stage = high_stage;
        while stage > 1 {
            core::set_kernel_arg(&stage_n, 2, ArgVal::scalar(&stage)).unwrap();
            enqueue(&queue, &stage_n, global_size, LOCAL_SIZE);
            stage >>= 1;
        }
        enqueue(&queue, &stage_0, global_size, LOCAL_SIZE);
        high_stage <<= 1;
    }

    core::set_kernel_arg(&merge, 3, ArgVal::scalar(&0i32)).unwrap();
    core::set_kernel_arg(&merge_last, 2, ArgVal::scalar(&0i32)).unwrap();
    let mut stage = num_stages;
    while stage > 1 {
        core::set_kernel_arg(&merge, 2, ArgVal::scalar(&stage)).unwrap();
        enqueue(&queue, &merge, global_size, LOCAL_SIZE);
        stage >>= 1;
    }
    enqueue(&queue, &merge_last, global_size, LOCAL_SIZE);

    let sorted = read_vec::<f32>(&queue, &buffer, NUM_FLOATS);
    assert!(sorted.windows(2).all(|w| w[0] <= w[1]), "output is not sorted");

    let mut expected = data;
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(sorted, expected);
}

#[test]
fn reduction_partials_sum_to_total() {
    const LEN: usize = 1 << 12;
    const LOCAL_SIZE: usize = 64;
    let (context, queue) = default_queue();
    let program = build(&context, reduction::SRC, reduction::library());

    let data: Vec<f32> = (0..LEN).map(|i| (i % 7) as f32).collect();
    let input = core::create_buffer(&context, MemFlags::new(), LEN * 4,
        MemInit::Copy(&core::util::to_bytes(&data))).unwrap();
    let partials = core::create_buffer(&context, MemFlags::new(), LEN / LOCAL_SIZE * 4,
        MemInit::Uninit).unwrap();

    let kernel = core::create_kernel(&program, "reduction_scalar").unwrap();
    core::set_kernel_arg(&kernel, 0, ArgVal::mem(&input)).unwrap();
    core::set_kernel_arg(&kernel, 1, ArgVal::local::<f32>(LOCAL_SIZE)).unwrap();
    core::set_kernel_arg(&kernel, 2, ArgVal::mem(&partials)).unwrap();
    enqueue(&queue, &kernel, LEN, LOCAL_SIZE);

    let sums = read_vec::<f32>(&queue, &partials, LEN / LOCAL_SIZE);
    assert_eq!(sums.iter().sum::<f32>(), data.iter().sum::<f32>());
}

#[test]
fn string_search_matches_host_count() {
    let text = b"that which we have from that day with that hope, with a word from home"
        .to_vec();
    let pattern = search::pattern(["that", "with", "have", "from"]);
    let (context, queue) = default_queue();
    let program = build(&context, search::SRC, search::library());

    let text_buf = core::create_buffer(&context, MemFlags::new().read_only(), text.len(),
        MemInit::Copy(&text)).unwrap();
    let result_buf = core::create_buffer(&context, MemFlags::new(), 16,
        MemInit::Copy(&[0u8; 16])).unwrap();

    let global_size = 8;
    let chars_per_item = (text.len() / global_size + 1) as i32;
    let kernel = core::create_kernel(&program, "string_search").unwrap();
    core::set_kernel_arg(&kernel, 0, ArgVal::scalar(&pattern)).unwrap();
    core::set_kernel_arg(&kernel, 1, ArgVal::mem(&text_buf)).unwrap();
    core::set_kernel_arg(&kernel, 2, ArgVal::scalar(&chars_per_item)).unwrap();
    core::set_kernel_arg(&kernel, 3, ArgVal::local::<i32>(4)).unwrap();
    core::set_kernel_arg(&kernel, 4, ArgVal::mem(&result_buf)).unwrap();
    enqueue(&queue, &kernel, global_size, 4);

    let counts = read_vec::<i32>(&queue, &result_buf, 4);
    assert_eq!(counts, search::count_on_host(&pattern, &text).to_vec());
    assert_eq!(counts, vec![3, 2, 1, 2]);
}

#[test]
fn wg_test_encodes_group_and_local_ids() {
    let (context, queue) = default_queue();
    let program = build(&context, misc::SRC, misc::library());
    let output = core::create_buffer(&context, MemFlags::new(), 24 * 4, MemInit::Uninit)
        .unwrap();

    let kernel = core::create_kernel(&program, "wg_test").unwrap();
    core::set_kernel_arg(&kernel, 0, ArgVal::mem(&output)).unwrap();
    core::enqueue_kernel(&queue, &kernel, 2, None, &[6, 4, 1], Some([3, 2, 1]), None).unwrap();

    let out = read_vec::<f32>(&queue, &output, 24);
    // Item (4, 3): group (1, 1) of a 2 by 2 grid, local (1, 1) of 3 by 2.
    assert_eq!(out[4 * 4 + 3], (3 * 100 + 3) as f32);
    assert_eq!(out[0], 0.0);
}

#[test]
fn radix_task_sorts_eight_shorts() {
    let (context, queue) = default_queue();
    let program = build(&context, radix::SRC, radix::library());

    let data: Vec<u16> = crate::shuffled_vec((0u16, 7), 8);
    let buffer = core::create_buffer(&context, MemFlags::new(), 16,
        MemInit::Copy(&core::util::to_bytes(&data))).unwrap();

    let kernel = core::create_kernel(&program, "radix_sort8").unwrap();
    core::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
    core::enqueue_task(&queue, &kernel, None).unwrap();

    assert_eq!(read_vec::<u16>(&queue, &buffer, 8), (0..8).collect::<Vec<u16>>());
}

#[test]
fn transpose_then_multiply() {
    const DIM: usize = 16;
    const SIZE: usize = DIM / 4;
    let (context, queue) = default_queue();
    let program = build(&context, matrix::SRC, matrix::library());

    let a: Vec<f32> = (0..DIM * DIM).map(|i| (i % 13) as f32 * 0.5).collect();
    let b: Vec<f32> = (0..DIM * DIM).map(|i| (i % 7) as f32 - 3.0).collect();
    let a_buf = core::create_buffer(&context, MemFlags::new().read_only(), DIM * DIM * 4,
        MemInit::Copy(&core::util::to_bytes(&a))).unwrap();
    let b_buf = core::create_buffer(&context, MemFlags::new(), DIM * DIM * 4,
        MemInit::Copy(&core::util::to_bytes(&b))).unwrap();
    let c_buf = core::create_buffer(&context, MemFlags::new().write_only(), DIM * DIM * 4,
        MemInit::Uninit).unwrap();

    let transpose = core::create_kernel(&program, "transpose").unwrap();
    core::set_kernel_arg(&transpose, 0, ArgVal::mem(&b_buf)).unwrap();
    core::set_kernel_arg(&transpose, 1, ArgVal::scalar(&(SIZE as u32))).unwrap();
    enqueue(&queue, &transpose, SIZE * (SIZE + 1) / 2, 1);

    let b_t = read_vec::<f32>(&queue, &b_buf, DIM * DIM);
    for i in 0..DIM {
        for j in 0..DIM {
            assert_eq!(b_t[i * DIM + j], b[j * DIM + i], "({}, {})", i, j);
        }
    }

    let mult = core::create_kernel(&program, "matrix_mult").unwrap();
    core::set_kernel_arg(&mult, 0, ArgVal::mem(&a_buf)).unwrap();
    core::set_kernel_arg(&mult, 1, ArgVal::mem(&b_buf)).unwrap();
    core::set_kernel_arg(&mult, 2, ArgVal::mem(&c_buf)).unwrap();
    enqueue(&queue, &mult, DIM, 4);

    let c = read_vec::<f32>(&queue, &c_buf, DIM * DIM);
    for (found, expected) in c.iter().zip(matrix::mult_on_host(&a, &b, DIM)) {
        assert!((found - expected).abs() < 1.0e-3, "{} != {}", found, expected);
    }
}

#[test]
fn rdft_packs_a_rectangle_spectrum() {
    const NUM_POINTS: usize = 64;
    let (context, queue) = default_queue();
    let program = build(&context, fft::SRC, fft::library());

    let input: Vec<f32> = (0..NUM_POINTS).map(|i| if i < NUM_POINTS / 4 { 1.0 } else { 0.0 })
        .collect();
    let buffer = core::create_buffer(&context, MemFlags::new(), NUM_POINTS * 4,
        MemInit::Copy(&core::util::to_bytes(&input))).unwrap();

    let kernel = core::create_kernel(&program, "rdft").unwrap();
    core::set_kernel_arg(&kernel, 0, ArgVal::mem(&buffer)).unwrap();
    let work_items = NUM_POINTS / 2 + 1;
    enqueue(&queue, &kernel, work_items, work_items);

    let out = read_vec::<f32>(&queue, &buffer, NUM_POINTS);
    let points: Vec<[f64; 2]> = input.iter().map(|&x| [x as f64, 0.0]).collect();
    let bin = |k| fft::dft_bin(&points, k, fft::FORWARD);

    assert!((out[0] as f64 - bin(0)[0]).abs() < 1.0e-3);
    assert!((out[1] as f64 - bin(NUM_POINTS / 2)[0]).abs() < 1.0e-3);
    for k in 1..NUM_POINTS / 2 {
        assert!((out[2 * k] as f64 - bin(k)[0]).abs() < 1.0e-3, "bin {}", k);
        assert!((out[2 * k + 1] as f64 - bin(k)[1]).abs() < 1.0e-3, "bin {}", k);
    }
}
