//! Host-side shapes shared by the demos: profiled runs, staged launches
//! (sorts and FFTs), and work-group reductions.

use std::fmt;
use log::debug;
use crate::core::{OclPrm, ProfilingInfo};
use crate::error::{Error as OclError, Result as OclResult};
use crate::standard::{Buffer, Event, ProQue};


/// The four profiling timestamps of a completed command, in nanoseconds of
/// the device clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProfileTimes {
    pub queued: u64,
    pub submit: u64,
    pub start: u64,
    pub end: u64,
}

impl ProfileTimes {
    /// Reads the timestamps of `event`.
    ///
    /// The event's queue must have been created with profiling enabled and
    /// the command must have completed.
    pub fn of(event: &Event) -> OclResult<ProfileTimes> {
        Ok(ProfileTimes {
            queued: event.profiling_info(ProfilingInfo::Queued)?.time(),
            submit: event.profiling_info(ProfilingInfo::Submit)?.time(),
            start: event.profiling_info(ProfilingInfo::Start)?.time(),
            end: event.profiling_info(ProfilingInfo::End)?.time(),
        })
    }

    /// Execution time: `end - start`.
    pub fn elapsed(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Time spent waiting between being queued and starting.
    pub fn latency(&self) -> u64 {
        self.start.saturating_sub(self.queued)
    }

    /// Returns true if `queued <= submit <= start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.queued <= self.submit && self.submit <= self.start && self.start <= self.end
    }
}

impl fmt::Display for ProfileTimes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ns (queued: {}, submit: {}, start: {}, end: {})", self.elapsed(),
            self.queued, self.submit, self.start, self.end)
    }
}


/// Returns the largest power of two less than or equal to `n`, or zero if
/// `n` is zero.
pub fn largest_pow2_at_most(n: usize) -> usize {
    match n {
        0 => 0,
        n => 1 << (usize::BITS - 1 - n.leading_zeros()),
    }
}


/// One launch of a staged computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// An inner step of a bitonic sorting phase.
    Inner { stage: u32, high_stage: u32 },
    /// The closing step of each bitonic sorting phase.
    Outer { high_stage: u32 },
    /// A step of the final bitonic merge.
    Merge { stage: u32 },
    /// The last bitonic merge step, within work-groups.
    MergeLast,
    /// An FFT stage combining transforms `stage / 2` blocks apart.
    Butterfly { stage: u32 },
}

/// The launch order of a staged computation over `num_stages` work-groups.
#[derive(Clone, Debug)]
pub struct StageSchedule {
    stages: std::vec::IntoIter<Stage>,
}

impl StageSchedule {
    fn check_pow2(num_stages: u32, fn_name: &str) -> OclResult<()> {
        if !num_stages.is_power_of_two() {
            return Err(OclError::from(format!("StageSchedule::{}: 'num_stages' ({}) must be \
                a power of two.", fn_name, num_stages)));
        }
        Ok(())
    }

    /// Returns the bitonic sort schedule for `num_stages` work-groups, which
    /// must be a power of two.
    ///
    /// For every `high_stage` doubling from 2 below `num_stages`, the inner
    /// stages halve from `high_stage` down to 2 and are followed by one
    /// outer stage. The merge then halves from `num_stages` down to 2 and
    /// finishes with a last merge.
    pub fn bitonic(num_stages: u32) -> OclResult<StageSchedule> {
        Self::check_pow2(num_stages, "bitonic")?;
        let mut stages = Vec::new();

        for high_stage in doubling(2, num_stages).filter(|&hs| hs < num_stages) {
            for stage in halving(high_stage, 2) {
                stages.push(Stage::Inner { stage, high_stage });
            }
            stages.push(Stage::Outer { high_stage });
        }
        for stage in halving(num_stages, 2) {
            stages.push(Stage::Merge { stage });
        }
        stages.push(Stage::MergeLast);

        Ok(StageSchedule { stages: stages.into_iter() })
    }

    /// Returns the FFT schedule for `num_stages` blocks, which must be a
    /// power of two: one butterfly stage per `stage` doubling from 2 to
    /// `num_stages`. A single block needs none.
    pub fn fft(num_stages: u32) -> OclResult<StageSchedule> {
        Self::check_pow2(num_stages, "fft")?;
        let stages: Vec<Stage> = doubling(2, num_stages)
            .map(|stage| Stage::Butterfly { stage })
            .collect();
        Ok(StageSchedule { stages: stages.into_iter() })
    }
}

impl Iterator for StageSchedule {
    type Item = Stage;

    fn next(&mut self) -> Option<Stage> {
        self.stages.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stages.size_hint()
    }
}

impl ExactSizeIterator for StageSchedule {}

/// Yields `from`, `2 * from`, ... while not greater than `to`.
pub fn doubling(from: u32, to: u32) -> impl Iterator<Item = u32> {
    std::iter::successors(Some(from), |&s| s.checked_mul(2))
        .take_while(move |&s| s > 0 && s <= to)
}

/// Yields `from`, `from / 2`, ... while not less than `to`.
pub fn halving(from: u32, to: u32) -> impl Iterator<Item = u32> {
    std::iter::successors(Some(from), |&s| Some(s / 2))
        .take_while(move |&s| s > 0 && s >= to)
}

/// Runs `launch` once for every stage of `schedule`, stopping at the first
/// error. Returns the number of launches.
///
/// `launch` is expected to re-set only the scalar arguments which change
/// between stages and enqueue.
pub fn run_stages<I, S, F>(schedule: I, mut launch: F) -> OclResult<usize>
        where I: IntoIterator<Item = S>, F: FnMut(S) -> OclResult<()> {
    let mut count = 0;
    for stage in schedule {
        launch(stage)?;
        count += 1;
    }
    debug!("run_stages: {} launches enqueued.", count);
    Ok(count)
}


/// Runs a work-group reduction of `input` and finishes it on the host.
///
/// The kernel named `kernel_name` must take `(__global T* data, __local T*
/// scratch, __global T* partials)` and write one partial result per
/// work-group. It is launched with a global size of `input.len()` and a
/// local size of `local_size`, reserving `local_size` elements of local
/// scratch. The partials are read back and combined with `fold`, starting
/// from `init`.
pub fn reduce<T, F>(pro_que: &ProQue, kernel_name: &str, input: &Buffer<T>, local_size: usize,
        init: T, fold: F) -> OclResult<T>
        where T: OclPrm, F: Fn(T, T) -> T {
    let len = input.len();
    if local_size == 0 || len % local_size != 0 {
        return Err(OclError::from(format!("reduce: The local size ({}) must evenly divide the \
            input length ({}).", local_size, len)));
    }
    let num_groups = len / local_size;

    let partials = Buffer::<T>::builder()
        .queue(pro_que.queue().clone())
        .len(num_groups)
        .build()?;

    let kernel = pro_que.kernel_builder(kernel_name)
        .arg(input)
        .arg_local::<T>(local_size)
        .arg(&partials)
        .global_work_size(len)
        .local_work_size(local_size)
        .build()?;

    let mut event = Event::empty();
    kernel.cmd().enew(&mut event).enq()?;

    let mut host_partials = vec![T::default(); num_groups];
    partials.read(&mut host_partials).ewait(&event).enq()?;
    debug!("reduce: {} partials from '{}'.", num_groups, kernel_name);

    Ok(host_partials.into_iter().fold(init, fold))
}
