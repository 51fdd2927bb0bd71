use crate::action::Action;
use crate::error::Error;
use crate::queue::TimerQueue;
use log::warn;
use std::collections::VecDeque;

/// A boundary whose measurement has been submitted but whose duration is not
/// yet known. Queue position encodes submission order, which must equal
/// result availability order (see [`TimerQueue`]).
pub(crate) struct PendingMeasurement<H> {
    pub(crate) action: Action,
    pub(crate) handle: H,
}

/// A boundary with its absolute timestamp reconstructed.
///
/// `timestamp` is the accumulated sum of every elapsed duration resolved so
/// far, in nanoseconds since profiling started. The resolved list is ordered
/// by non-decreasing timestamp by construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedEvent {
    pub action: Action,
    pub timestamp: u64,
}

/// Converts the stream of relative durations coming back from the queue into
/// an absolute-timestamp event timeline.
pub(crate) struct ResolveState<H> {
    pending: VecDeque<PendingMeasurement<H>>,
    resolved: Vec<ResolvedEvent>,
    last_timestamp: u64,
    poisoned: bool,
}

impl<H> ResolveState<H> {
    pub(crate) fn new() -> ResolveState<H> {
        ResolveState {
            pending: VecDeque::new(),
            resolved: Vec::new(),
            last_timestamp: 0,
            poisoned: false,
        }
    }

    pub(crate) fn enqueue(&mut self, action: Action, handle: H) {
        self.pending.push_back(PendingMeasurement { action, handle });
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    pub(crate) fn resolved(&self) -> &[ResolvedEvent] {
        &self.resolved
    }

    pub(crate) fn take_resolved(&mut self) -> Vec<ResolvedEvent> {
        std::mem::take(&mut self.resolved)
    }

    /// Resolves every measurement whose result is already available, walking
    /// the pending queue strictly from the front. Stops at the first entry
    /// that is not ready; entries are never resolved out of order, because
    /// timestamp accumulation is only valid when durations are summed in
    /// submission order.
    ///
    /// Idempotent and non-blocking: with nothing ready (or nothing pending)
    /// this is a no-op.
    pub(crate) fn drain_available<Q>(&mut self, queue: &mut Q) -> Result<(), Error>
    where
        Q: TimerQueue<Handle = H>,
    {
        if self.poisoned {
            return Err(Error::UnreliableTiming);
        }

        loop {
            match self.pending.front() {
                Some(front) if queue.result_available(&front.handle) => {}
                _ => return Ok(()),
            }
            let PendingMeasurement { action, handle } = match self.pending.pop_front() {
                Some(entry) => entry,
                None => return Ok(()),
            };

            let elapsed = queue.result_nanos(&handle);
            let disjoint = queue.timing_disjoint();
            queue.release_handle(handle);

            if disjoint {
                warn!(
                    "queue reported disjoint timing; discarding profile \
                     ({} resolved, {} still pending)",
                    self.resolved.len(),
                    self.pending.len()
                );
                self.poison(queue);
                return Err(Error::UnreliableTiming);
            }

            self.last_timestamp += elapsed;
            self.resolved.push(ResolvedEvent {
                action,
                timestamp: self.last_timestamp,
            });
        }
    }

    /// Resolves the whole pending queue, yielding to the host between polls.
    /// Measurement latency is not under our control, so the number of yields
    /// is unbounded; this returns exactly when the queue empties (or fails
    /// fatally on a disjoint condition).
    pub(crate) async fn drain_to_completion<Q>(&mut self, queue: &mut Q) -> Result<(), Error>
    where
        Q: TimerQueue<Handle = H>,
    {
        loop {
            self.drain_available(queue)?;
            if self.pending.is_empty() {
                return Ok(());
            }
            queue.next_tick().await;
        }
    }

    /// Drops all pipeline state, handing any still-held handles back to the
    /// queue so they do not occupy its resource budget.
    pub(crate) fn reset<Q>(&mut self, queue: &mut Q)
    where
        Q: TimerQueue<Handle = H>,
    {
        self.release_pending(queue);
        self.resolved.clear();
        self.last_timestamp = 0;
        self.poisoned = false;
    }

    /// Marks the in-flight profile as untrustworthy. Resolved data is
    /// discarded and every later drain or export fails with
    /// `UnreliableTiming` until a new session resets the pipeline.
    fn poison<Q>(&mut self, queue: &mut Q)
    where
        Q: TimerQueue<Handle = H>,
    {
        self.release_pending(queue);
        self.resolved.clear();
        self.poisoned = true;
    }

    fn release_pending<Q>(&mut self, queue: &mut Q)
    where
        Q: TimerQueue<Handle = H>,
    {
        for entry in self.pending.drain(..) {
            queue.release_handle(entry.handle);
        }
    }
}
