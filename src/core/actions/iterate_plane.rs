//! The incremental escape-time engine.
//!
//! A batch advances every not-yet-escaped point by up to `steps`
//! iterations. The live list is partitioned by striping: context `t` of
//! `W` owns live indices `t, t+W, t+2W, …`, which keeps worker load
//! balanced when the surviving points cluster. Each context writes the
//! indices that survived its stripe into its own output buffer; the
//! merge step concatenates them in stripe order, so the resulting live
//! list (and every per-pixel escape value) is identical for any worker
//! count.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::core::data::orbit::Orbit;
use crate::core::fractals::fractal_kinds::FractalKinds;
use crate::core::pool::ThreadPool;

pub(crate) struct BatchInput<'a> {
    pub points: &'a mut [Orbit],
    pub live: Vec<u32>,
    pub scratch: &'a mut Vec<Vec<u32>>,
    pub kind: FractalKinds,
    pub steps: u64,
    pub iteration_count: u64,
    pub num_threads: u32,
    pub pool: Option<&'a ThreadPool>,
}

pub(crate) struct BatchOutcome {
    pub live: Vec<u32>,
    pub newly_escaped: usize,
}

#[derive(Clone, Copy)]
struct SharedPoints {
    ptr: *mut Orbit,
    len: usize,
}

// SAFETY: a batch partitions the live list into disjoint stripes and every
// live index refers to a distinct point, so no two contexts ever touch the
// same Orbit, and the backing storage is never reallocated while a batch
// is in flight.
unsafe impl Send for SharedPoints {}
unsafe impl Sync for SharedPoints {}

impl SharedPoints {
    /// SAFETY: the caller must hold the only stripe visiting `index` in
    /// the current batch.
    #[allow(clippy::mut_from_ref)]
    unsafe fn orbit_mut(&self, index: usize) -> &mut Orbit {
        debug_assert!(index < self.len);
        &mut *self.ptr.add(index)
    }
}

struct StripeOutput {
    survivors: Vec<u32>,
    escaped: usize,
}

struct StripeContext {
    points: SharedPoints,
    live: Arc<Vec<u32>>,
    kind: FractalKinds,
    offset: usize,
    stride: usize,
    steps: u64,
    iteration_count: u64,
    output: Mutex<StripeOutput>,
    done: AtomicBool,
}

fn iterate_stripe(ctx: &StripeContext) {
    let mut survivors = std::mem::take(&mut ctx.output.lock().unwrap().survivors);
    let mut escaped = 0usize;

    let mut j = ctx.offset;
    while j < ctx.live.len() {
        let index = ctx.live[j] as usize;
        // SAFETY: index j ≡ offset (mod stride) belongs to this stripe only
        let orbit = unsafe { ctx.points.orbit_mut(index) };

        let mut i = 0;
        while i < ctx.steps && orbit.escaped == 0 {
            if ctx.kind.escaped(orbit.z) {
                orbit.escaped = ctx.iteration_count + i + 1;
            } else {
                ctx.kind.step(orbit);
            }
            i += 1;
        }

        if orbit.escaped != 0 {
            escaped += 1;
        } else {
            survivors.push(index as u32);
        }
        j += ctx.stride;
    }

    let mut output = ctx.output.lock().unwrap();
    output.survivors = survivors;
    output.escaped = escaped;
    drop(output);
    ctx.done.store(true, Ordering::Release);
}

/// Runs one iteration batch and returns the compacted live list together
/// with the number of points that escaped during the batch.
pub(crate) fn run_batch(input: BatchInput<'_>) -> BatchOutcome {
    let BatchInput {
        points,
        live,
        scratch,
        kind,
        steps,
        iteration_count,
        num_threads,
        pool,
    } = input;

    let workers = num_threads.max(1) as usize;
    let pool = pool.filter(|pool| workers >= 2 && pool.size() >= 2);
    let stride = if pool.is_some() { workers } else { 1 };

    let shared = SharedPoints {
        ptr: points.as_mut_ptr(),
        len: points.len(),
    };
    let live = Arc::new(live);

    let mut contexts = Vec::with_capacity(stride);
    for offset in 0..stride {
        let mut survivors = scratch.pop().unwrap_or_default();
        survivors.clear();
        survivors.reserve(live.len() / stride + 1);
        contexts.push(Arc::new(StripeContext {
            points: shared,
            live: Arc::clone(&live),
            kind,
            offset,
            stride,
            steps,
            iteration_count,
            output: Mutex::new(StripeOutput {
                survivors,
                escaped: 0,
            }),
            done: AtomicBool::new(false),
        }));
    }

    match pool {
        Some(pool) => {
            for ctx in &contexts {
                let job_ctx = Arc::clone(ctx);
                if pool.add(move || iterate_stripe(&job_ctx)).is_err() {
                    // pool is stopping; run the stripe here so the batch
                    // still completes
                    iterate_stripe(ctx);
                }
            }
            pool.wait();
            // belt and braces against spurious wake-ups
            for ctx in &contexts {
                while !ctx.done.load(Ordering::Acquire) {
                    thread::yield_now();
                }
            }
        }
        None => {
            for ctx in &contexts {
                iterate_stripe(ctx);
            }
        }
    }

    let mut newly_escaped = 0;
    let mut merged = Vec::with_capacity(contexts.len());
    for ctx in &contexts {
        let mut output = ctx.output.lock().unwrap();
        newly_escaped += output.escaped;
        merged.push(std::mem::take(&mut output.survivors));
    }
    drop(contexts);

    let mut live = Arc::try_unwrap(live).unwrap_or_default();
    live.clear();
    for survivors in &merged {
        live.extend_from_slice(survivors);
    }
    for mut survivors in merged {
        survivors.clear();
        scratch.push(survivors);
    }

    BatchOutcome {
        live,
        newly_escaped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::complex::Complex;

    fn julia_points(count: usize) -> (Vec<Orbit>, Vec<u32>) {
        let seed = Complex::new(-1.25643, -0.381086);
        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let xy = Complex::new(-2.0 + 4.0 * (i as f64) / (count as f64), 0.17);
            let mut orbit = Orbit::default();
            FractalKinds::Julia.init(&mut orbit, xy, seed);
            points.push(orbit);
        }
        let live = (0..count as u32).collect();
        (points, live)
    }

    fn run(
        points: &mut [Orbit],
        live: Vec<u32>,
        steps: u64,
        iteration_count: u64,
        num_threads: u32,
        pool: Option<&ThreadPool>,
    ) -> BatchOutcome {
        let mut scratch = Vec::new();
        run_batch(BatchInput {
            points,
            live,
            scratch: &mut scratch,
            kind: FractalKinds::Julia,
            steps,
            iteration_count,
            num_threads,
            pool,
        })
    }

    #[test]
    fn test_escape_indices_are_one_based_and_bounded_by_steps() {
        let (mut points, live) = julia_points(64);
        let outcome = run(&mut points, live, 10, 0, 1, None);

        for orbit in &points {
            assert!(orbit.escaped <= 10);
        }
        assert_eq!(
            outcome.newly_escaped,
            points.iter().filter(|p| p.escaped != 0).count()
        );
    }

    #[test]
    fn test_survivors_are_exactly_the_unescaped_points() {
        let (mut points, live) = julia_points(64);
        let outcome = run(&mut points, live, 25, 0, 1, None);

        for &index in &outcome.live {
            assert_eq!(points[index as usize].escaped, 0);
        }
        let unescaped = points.iter().filter(|p| p.escaped == 0).count();
        assert_eq!(outcome.live.len(), unescaped);
    }

    #[test]
    fn test_escape_offsets_start_from_the_running_iteration_count() {
        let (mut points, live) = julia_points(64);
        let first = run(&mut points, live, 5, 0, 1, None);
        let _second = run(&mut points, first.live, 5, 5, 1, None);

        for orbit in &points {
            assert!(orbit.escaped <= 10);
        }
        // anything that escaped during the second batch is past the first
        for orbit in points.iter().filter(|p| p.escaped > 5) {
            assert!(orbit.escaped >= 6);
        }
    }

    #[test]
    fn test_striped_batches_match_single_threaded_batches() {
        let (mut serial, live_serial) = julia_points(257);
        let (mut striped, live_striped) = julia_points(257);

        let pool = ThreadPool::new(4).unwrap();
        let serial_outcome = run(&mut serial, live_serial, 30, 0, 1, None);
        let striped_outcome = run(&mut striped, live_striped, 30, 0, 4, Some(&pool));

        assert_eq!(serial, striped);
        assert_eq!(serial_outcome.newly_escaped, striped_outcome.newly_escaped);

        let mut sorted_serial = serial_outcome.live.clone();
        let mut sorted_striped = striped_outcome.live.clone();
        sorted_serial.sort_unstable();
        sorted_striped.sort_unstable();
        assert_eq!(sorted_serial, sorted_striped);
    }

    #[test]
    fn test_merge_preserves_stripe_enumeration_order() {
        let (mut points, live) = julia_points(9);
        let pool = ThreadPool::new(3).unwrap();
        // zero steps: nothing escapes, so the merged live list is exactly
        // the stripe concatenation 0,3,6, 1,4,7, 2,5,8
        let outcome = run(&mut points, live, 0, 0, 3, Some(&pool));

        assert_eq!(outcome.live, vec![0, 3, 6, 1, 4, 7, 2, 5, 8]);
        assert_eq!(outcome.newly_escaped, 0);
    }

    #[test]
    fn test_scratch_buffers_are_returned_for_reuse() {
        let (mut points, live) = julia_points(32);
        let mut scratch = Vec::new();
        let outcome = run_batch(BatchInput {
            points: &mut points,
            live,
            scratch: &mut scratch,
            kind: FractalKinds::Julia,
            steps: 4,
            iteration_count: 0,
            num_threads: 1,
            pool: None,
        });

        assert_eq!(scratch.len(), 1);
        assert!(scratch[0].is_empty());
        drop(outcome);
    }
}
