use async_trait::async_trait;

/// Binding to a serial command queue with an elapsed-time measurement
/// extension.
///
/// The underlying primitive allows at most **one** measurement to be
/// accumulating time at any instant, and it cannot report point-in-time
/// timestamps, only the elapsed duration between `begin_measurement` and
/// `end_measurement`.
///
/// Known assumption, relied on by the resolution pipeline: results become
/// available in the order the measurements were submitted to the queue. The
/// primitive's specification does not formally guarantee this, but every
/// implementation observed in practice behaves that way, and without a
/// timestamp primitive there is no way to re-order results after the fact.
/// Callers must be able to trust FIFO completion.
#[async_trait(?Send)]
pub trait TimerQueue {
    /// Opaque token for one elapsed-duration measurement. Owned by the
    /// profiler until passed back to [`TimerQueue::release_handle`].
    type Handle;

    /// Whether the measurement extension is present on this queue at all.
    fn timer_extension_available(&self) -> bool;

    /// Identifier string of the device behind the queue, used for the
    /// start-time hardware denylist check.
    fn device_identifier(&self) -> String;

    fn create_handle(&mut self) -> Self::Handle;

    /// Starts accumulating time into `handle`. No other measurement may be
    /// active.
    fn begin_measurement(&mut self, handle: &Self::Handle);

    /// Ends the currently active measurement.
    fn end_measurement(&mut self);

    /// Whether the result for `handle` can be read without blocking.
    fn result_available(&self, handle: &Self::Handle) -> bool;

    /// The measured elapsed time in nanoseconds. Only valid once
    /// [`TimerQueue::result_available`] has returned true for `handle`.
    fn result_nanos(&mut self, handle: &Self::Handle) -> u64;

    /// Whether the queue has hit a disjoint timing condition since the last
    /// call. Results read while this is set cannot be trusted.
    fn timing_disjoint(&mut self) -> bool;

    /// Releases the queue-side resources held by `handle`.
    fn release_handle(&mut self, handle: Self::Handle);

    /// Suspends until the next opportunity to poll for results. The host
    /// decides what "next opportunity" means; the profiler only requires
    /// that this eventually returns.
    async fn next_tick(&mut self);
}
