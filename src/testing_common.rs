//! Shared infrastructure for end-to-end profiling tests: an in-memory
//! [`TimerQueue`] whose measurement durations, result latency, and failure
//! behavior are scripted up front.

use crate::queue::TimerQueue;
use crate::speedscope::{EventTag, ProfileDocument};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

pub struct ScriptedHandle(u32);

struct ScriptedResult {
    elapsed: u64,
    ready_at_tick: u64,
}

/// A queue whose n-th finished measurement reports the n-th scripted
/// duration (or `default_duration` once the script runs out). Results become
/// readable `latency_ticks` calls to `next_tick` after the measurement ends,
/// and the disjoint flag can be scripted to trip on a given result read.
///
/// Panics on misuse of the measurement primitive (overlapping measurements,
/// ending with nothing active, reading an unknown handle) so that tests
/// catch protocol violations at their source.
pub struct ScriptedQueue {
    extension_available: bool,
    device: String,
    durations: VecDeque<u64>,
    default_duration: u64,
    latency_ticks: u64,
    disjoint_on_read: Option<usize>,
    tick: u64,
    next_handle_id: u32,
    active: Option<u32>,
    results: FxHashMap<u32, ScriptedResult>,
    reads: usize,
    live_handles: usize,
}

impl ScriptedQueue {
    pub fn new() -> ScriptedQueue {
        ScriptedQueue {
            extension_available: true,
            device: "Scripted GPU".to_string(),
            durations: VecDeque::new(),
            default_duration: 10,
            latency_ticks: 1,
            disjoint_on_read: None,
            tick: 0,
            next_handle_id: 0,
            active: None,
            results: FxHashMap::default(),
            reads: 0,
            live_handles: 0,
        }
    }

    /// Elapsed durations reported by successive measurements, in nanoseconds.
    pub fn with_durations(mut self, durations: &[u64]) -> ScriptedQueue {
        self.durations = durations.iter().copied().collect();
        self
    }

    /// Number of `next_tick` calls before a finished measurement's result
    /// becomes readable.
    pub fn with_latency(mut self, ticks: u64) -> ScriptedQueue {
        self.latency_ticks = ticks;
        self
    }

    /// Trips the disjoint flag when the `n`-th result (1-based) is read.
    pub fn with_disjoint_on_read(mut self, n: usize) -> ScriptedQueue {
        self.disjoint_on_read = Some(n);
        self
    }

    pub fn with_device(mut self, device: &str) -> ScriptedQueue {
        self.device = device.to_string();
        self
    }

    /// A queue without the measurement extension.
    pub fn unavailable() -> ScriptedQueue {
        let mut queue = ScriptedQueue::new();
        queue.extension_available = false;
        queue
    }

    /// Handles created but not yet released. Zero once a profile has been
    /// fully exported or discarded.
    pub fn live_handles(&self) -> usize {
        self.live_handles
    }

    /// How many results have been read so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// How often the host yield was awaited.
    pub fn ticks(&self) -> u64 {
        self.tick
    }
}

#[async_trait(?Send)]
impl TimerQueue for ScriptedQueue {
    type Handle = ScriptedHandle;

    fn timer_extension_available(&self) -> bool {
        self.extension_available
    }

    fn device_identifier(&self) -> String {
        self.device.clone()
    }

    fn create_handle(&mut self) -> ScriptedHandle {
        let id = self.next_handle_id;
        self.next_handle_id += 1;
        self.live_handles += 1;
        ScriptedHandle(id)
    }

    fn begin_measurement(&mut self, handle: &ScriptedHandle) {
        assert!(
            self.active.is_none(),
            "the queue supports only one active measurement"
        );
        self.active = Some(handle.0);
    }

    fn end_measurement(&mut self) {
        let id = self
            .active
            .take()
            .expect("end_measurement with no active measurement");
        let elapsed = self
            .durations
            .pop_front()
            .unwrap_or(self.default_duration);
        self.results.insert(
            id,
            ScriptedResult {
                elapsed,
                ready_at_tick: self.tick + self.latency_ticks,
            },
        );
    }

    fn result_available(&self, handle: &ScriptedHandle) -> bool {
        match self.results.get(&handle.0) {
            Some(result) => self.tick >= result.ready_at_tick,
            None => false,
        }
    }

    fn result_nanos(&mut self, handle: &ScriptedHandle) -> u64 {
        self.reads += 1;
        self.results
            .get(&handle.0)
            .expect("result_nanos for a handle with no finished measurement")
            .elapsed
    }

    fn timing_disjoint(&mut self) -> bool {
        match self.disjoint_on_read {
            Some(n) => self.reads >= n,
            None => false,
        }
    }

    fn release_handle(&mut self, handle: ScriptedHandle) {
        assert!(self.live_handles > 0, "release of an unknown handle");
        self.live_handles -= 1;
        self.results.remove(&handle.0);
    }

    async fn next_tick(&mut self) {
        self.tick += 1;
    }
}

/// Asserts that `document`'s event list is balanced, LIFO-nested by frame
/// index, and non-decreasing in `at`, and that `endValue` matches the final
/// event.
pub fn assert_well_formed(document: &ProfileDocument) {
    let profile = &document.profiles[0];
    let mut open_frames: Vec<usize> = Vec::new();
    let mut previous_at = profile.start_value;

    for event in &profile.events {
        assert!(
            event.at >= previous_at,
            "event timestamps must be non-decreasing"
        );
        previous_at = event.at;
        assert!(
            event.frame < document.shared.frames.len(),
            "event references a frame outside the shared table"
        );
        match event.tag {
            EventTag::Open => open_frames.push(event.frame),
            EventTag::Close => {
                let opened = open_frames.pop().expect("close without a matching open");
                assert_eq!(opened, event.frame, "closes must nest LIFO");
            }
        }
    }

    assert!(open_frames.is_empty(), "every open needs a matching close");
    assert_eq!(profile.end_value, previous_at);
}
