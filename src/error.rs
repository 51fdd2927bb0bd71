use thiserror::Error;

/// All errors raised by the profiler. Every error is raised synchronously to
/// the immediate caller of the offending operation; nothing is suppressed or
/// retried internally. There is no partial-success mode: an export either
/// yields a fully balanced, fully resolved profile or fails outright.
#[derive(Debug, Error)]
pub enum Error {
    /// The queue binding does not expose the elapsed-time measurement
    /// extension. Profiling cannot start on this queue.
    #[error("elapsed-time measurement is not supported on this queue")]
    Unsupported,

    /// The device behind the queue is on the hardware denylist: its
    /// measurement results are known to be unconditionally wrong, so we
    /// refuse to produce misleading data.
    #[error("device `{0}` reports unreliable timing and is denylisted")]
    UnsupportedHardware(String),

    /// Start-while-running or stop-while-stopped.
    #[error("invalid profiler state: {0}")]
    InvalidState(&'static str),

    /// Push/pop imbalance, or a boundary recorded outside a profiling
    /// session.
    #[error("context protocol violation: {0}")]
    Protocol(String),

    /// The queue reported a disjoint timing condition while results were
    /// being resolved. Everything measured in this profile is suspect and
    /// the profile is discarded; this is unrecoverable for the in-flight
    /// session.
    #[error("the queue reported disjoint timing; the profile is unreliable")]
    UnreliableTiming,

    /// Export was attempted with zero resolved events.
    #[error("no events were recorded in this profile")]
    EmptyProfile,
}
