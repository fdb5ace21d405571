use harness_extras::kernels::{bitonic, events, fft, reduction};
use crate::enums::Status;
use crate::flags::CommandQueueProperties;
use crate::patterns::{self, largest_pow2_at_most, ProfileTimes, Stage, StageSchedule};
use crate::standard::{Buffer, Event, ProQue};
use crate::tests::assert_close;

#[test]
fn largest_pow2() {
    assert_eq!(largest_pow2_at_most(0), 0);
    assert_eq!(largest_pow2_at_most(1), 1);
    assert_eq!(largest_pow2_at_most(256), 256);
    assert_eq!(largest_pow2_at_most(1000), 512);
}

#[test]
fn bitonic_schedule_order() {
    let stages: Vec<Stage> = StageSchedule::bitonic(8).unwrap().collect();
    assert_eq!(stages, vec![
        Stage::Inner { stage: 2, high_stage: 2 },
        Stage::Outer { high_stage: 2 },
        Stage::Inner { stage: 4, high_stage: 4 },
        Stage::Inner { stage: 2, high_stage: 4 },
        Stage::Outer { high_stage: 4 },
        Stage::Merge { stage: 8 },
        Stage::Merge { stage: 4 },
        Stage::Merge { stage: 2 },
        Stage::MergeLast,
    ]);

    assert_eq!(StageSchedule::bitonic(1).unwrap().collect::<Vec<_>>(), vec![Stage::MergeLast]);
    assert_eq!(StageSchedule::bitonic(512).unwrap().len(), 36 + 8 + 9 + 1);
}

#[test]
fn schedules_require_pow2() {
    assert!(StageSchedule::bitonic(12).is_err());
    assert!(StageSchedule::fft(0).is_err());
    assert!(StageSchedule::fft(6).is_err());
}

#[test]
fn fft_schedule_order() {
    assert_eq!(StageSchedule::fft(8).unwrap().collect::<Vec<_>>(), vec![
        Stage::Butterfly { stage: 2 },
        Stage::Butterfly { stage: 4 },
        Stage::Butterfly { stage: 8 },
    ]);
    assert_eq!(StageSchedule::fft(1).unwrap().len(), 0);
}

#[test]
fn run_stages_stops_at_first_error() {
    let mut seen = Vec::new();
    let result = patterns::run_stages(1..10, |i| {
        if i == 4 {
            return Err("stage four failed".into());
        }
        seen.push(i);
        Ok(())
    });
    assert!(result.is_err());
    assert_eq!(seen, vec![1, 2, 3]);

    assert_eq!(patterns::run_stages(StageSchedule::bitonic(4).unwrap(), |_| Ok(())).unwrap(), 5);
}

#[test]
fn reduction_sums_within_tolerance() {
    const LEN: usize = 1 << 20;
    let pro_que = ProQue::builder()
        .src(reduction::SRC)
        .kernels(reduction::library())
        .dims(LEN)
        .build().unwrap();

    let data: Vec<f32> = (0..LEN).map(|i| i as f32).collect();
    let input = pro_que.buffer_builder::<f32>().copy_host_slice(&data).build().unwrap();

    let local_size = largest_pow2_at_most(pro_que.max_wg_size().unwrap());
    let sum = patterns::reduce(&pro_que, "reduction_scalar", &input, local_size, 0.0f32,
        |a, b| a + b).unwrap();

    let expected = (LEN as f64) * (LEN as f64 - 1.0) / 2.0;
    assert_close(sum as f64, expected, 0.01);

    // A local size which leaves a partial work-group is refused.
    assert!(patterns::reduce(&pro_que, "reduction_scalar", &input, 3, 0.0f32, |a, b| a + b)
        .is_err());
}

#[test]
fn staged_bitonic_sort() {
    const NUM_FLOATS: usize = 1 << 20;
    const LOCAL_SIZE: usize = 256;
    let global_size = NUM_FLOATS / bitonic::ELEMENTS_PER_ITEM;
    let num_stages = (global_size / LOCAL_SIZE) as u32;

    let pro_que = ProQue::builder()
        .src(bitonic::SRC)
        .kernels(bitonic::library())
        .dims(global_size)
        .build().unwrap();

    let data = harness_extras::scrambled_vec((-1.0e6f32, 1.0e6), NUM_FLOATS);
    let buffer = pro_que.buffer_builder::<f32>()
        .len(NUM_FLOATS)
        .copy_host_slice(&data)
        .build().unwrap();

    let kernel = |name: &str, scalars: usize| {
        let mut builder = pro_que.kernel_builder(name);
        builder.arg(&buffer)
            .arg_local::<f32>(bitonic::ELEMENTS_PER_ITEM * LOCAL_SIZE)
            .local_work_size(LOCAL_SIZE);
        for _ in 0..scalars {
            builder.arg(0u32);
        }
        builder.build()
    };
    let init = kernel("bsort_init", 0).unwrap();
    let stage_n = kernel("bsort_stage_n", 2).unwrap();
    let stage_0 = kernel("bsort_stage_0", 1).unwrap();

    let direction = 0i32;
    let merge = pro_que.kernel_builder("bsort_merge")
        .arg(&buffer)
        .arg_local::<f32>(bitonic::ELEMENTS_PER_ITEM * LOCAL_SIZE)
        .arg(0u32)
        .arg(direction)
        .local_work_size(LOCAL_SIZE)
        .build().unwrap();
    let merge_last = pro_que.kernel_builder("bsort_merge_last")
        .arg(&buffer)
        .arg_local::<f32>(bitonic::ELEMENTS_PER_ITEM * LOCAL_SIZE)
        .arg(direction)
        .local_work_size(LOCAL_SIZE)
        .build().unwrap();

    init.enq().unwrap();
    let launches = patterns::run_stages(StageSchedule::bitonic(num_stages).unwrap(), |stage| {
        match stage {
            Stage::Inner { stage, high_stage } => {
                stage_n.set_arg("stage", stage)?;
                stage_n.set_arg("high_stage", high_stage)?;
                stage_n.enq()
            },
            Stage::Outer { high_stage } => {
                stage_0.set_arg("high_stage", high_stage)?;
                stage_0.enq()
            },
            Stage::Merge { stage } => {
                merge.set_arg("stage", stage)?;
                merge.enq()
            },
            Stage::MergeLast => merge_last.enq(),
            other => Err(format!("not a sorting stage: {:?}", other).into()),
        }
    }).unwrap();
    assert_eq!(launches, StageSchedule::bitonic(num_stages).unwrap().len());

    let mut sorted = vec![0.0f32; NUM_FLOATS];
    buffer.read(&mut sorted).enq().unwrap();
    assert!(sorted.windows(2).all(|w| w[0] <= w[1]), "output is not sorted");

    let mut expected = data;
    expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(sorted, expected);
}

/// Runs a staged FFT of `input` into `output` and returns the number of
/// stage launches.
fn run_fft(pro_que: &ProQue, input: &Buffer<[f32; 2]>, output: &Buffer<[f32; 2]>,
        points_per_group: usize, local_size: usize, direction: i32) -> usize {
    let num_groups = (input.len() / points_per_group) as u32;
    let init = pro_que.kernel_builder("fft_init")
        .arg(input)
        .arg(output)
        .arg_local::<[f32; 2]>(points_per_group)
        .arg(points_per_group as u32)
        .arg(direction)
        .local_work_size(local_size)
        .build().unwrap();
    let stage_kernel = pro_que.kernel_builder("fft_stage")
        .arg(output)
        .arg(0u32)
        .arg(points_per_group as u32)
        .arg(direction)
        .local_work_size(local_size)
        .build().unwrap();

    init.enq().unwrap();
    let launches = patterns::run_stages(StageSchedule::fft(num_groups).unwrap(), |stage| {
        match stage {
            Stage::Butterfly { stage } => {
                stage_kernel.set_arg("stage", stage)?;
                stage_kernel.enq()
            },
            other => Err(format!("not an FFT stage: {:?}", other).into()),
        }
    }).unwrap();

    if direction == fft::INVERSE {
        pro_que.kernel_builder("fft_scale")
            .arg(output)
            .arg(points_per_group as u32)
            .arg(input.len() as u32)
            .local_work_size(local_size)
            .build().unwrap()
            .enq().unwrap();
    }
    launches
}

#[test]
fn staged_fft_matches_direct_transform() {
    const NUM_POINTS: usize = 1 << 10;
    const POINTS_PER_GROUP: usize = 64;
    const LOCAL_SIZE: usize = 16;
    let global_size = NUM_POINTS / POINTS_PER_GROUP * LOCAL_SIZE;

    let pro_que = ProQue::builder()
        .src(fft::SRC)
        .kernels(fft::library())
        .dims(global_size)
        .build().unwrap();

    let input: Vec<[f32; 2]> = (0..NUM_POINTS)
        .map(|i| [(i as f32 * 0.05).sin() + 0.5, (i as f32 * 0.013).cos()])
        .collect();
    let input_buf = pro_que.buffer_builder::<[f32; 2]>()
        .len(NUM_POINTS)
        .copy_host_slice(&input)
        .build().unwrap();
    let spectrum_buf = pro_que.buffer_builder::<[f32; 2]>().len(NUM_POINTS).build().unwrap();
    let restored_buf = pro_que.buffer_builder::<[f32; 2]>().len(NUM_POINTS).build().unwrap();

    // Sixteen blocks take four butterfly stages after the initial launch.
    let launches = run_fft(&pro_que, &input_buf, &spectrum_buf, POINTS_PER_GROUP, LOCAL_SIZE,
        fft::FORWARD);
    assert_eq!(launches, 4);

    let mut spectrum = vec![[0.0f32; 2]; NUM_POINTS];
    spectrum_buf.read(&mut spectrum).enq().unwrap();
    let points: Vec<[f64; 2]> = input.iter().map(|p| [p[0] as f64, p[1] as f64]).collect();
    let expected: Vec<[f64; 2]> = (0..NUM_POINTS)
        .map(|k| fft::dft_bin(&points, k, fft::FORWARD))
        .collect();
    let err = fft::max_error(&spectrum, &expected);
    assert!(err < 1.0e-4, "forward error: {}", err);

    // The inverse transform restores the input.
    run_fft(&pro_que, &spectrum_buf, &restored_buf, POINTS_PER_GROUP, LOCAL_SIZE, fft::INVERSE);
    let mut restored = vec![[0.0f32; 2]; NUM_POINTS];
    restored_buf.read(&mut restored).enq().unwrap();
    let err = fft::max_error(&restored, &points);
    assert!(err < 1.0e-4, "inverse error: {}", err);
}

#[test]
fn profile_times_are_ordered() {
    const NUM_INTS: usize = 1 << 14;
    let pro_que = ProQue::builder()
        .src(events::SRC)
        .kernels(events::library())
        .queue_properties(CommandQueueProperties::new().profiling())
        .dims(NUM_INTS / 4)
        .build().unwrap();

    let data: Vec<[i32; 4]> = (0..NUM_INTS as i32 / 4).map(|i| [i; 4]).collect();
    let buffer = pro_que.buffer_builder::<[i32; 4]>().copy_host_slice(&data).build().unwrap();

    let kernel = pro_que.kernel_builder("profile_items")
        .arg(&buffer)
        .arg(NUM_INTS as i32)
        .global_work_size(64)
        .build().unwrap();

    let mut event = Event::empty();
    kernel.cmd().enew(&mut event).enq().unwrap();
    event.wait_for().unwrap();

    let times = ProfileTimes::of(&event).unwrap();
    assert!(times.is_ordered(), "{}", times);
    assert!(times.elapsed() <= times.end - times.queued);

    let mut out = vec![[0i32; 4]; data.len()];
    buffer.read(&mut out).enq().unwrap();
    assert_eq!(out[5], [-5; 4]);

    // Without profiling enabled there are no timestamps.
    let plain = ProQue::builder()
        .src(events::SRC)
        .kernels(events::library())
        .dims(NUM_INTS / 4)
        .build().unwrap();
    let buffer = plain.buffer_builder::<[i32; 4]>().copy_host_slice(&data).build().unwrap();
    let kernel = plain.kernel_builder("profile_items")
        .arg(&buffer)
        .arg(NUM_INTS as i32)
        .global_work_size(64)
        .build().unwrap();
    let mut event = Event::empty();
    kernel.cmd().enew(&mut event).enq().unwrap();
    event.wait_for().unwrap();
    let err = ProfileTimes::of(&event).unwrap_err();
    assert_eq!(err.api_status(), Some(Status::ProfilingInfoNotAvailable));
}
