//! Reconstructs a hierarchical timing profile of work submitted to a serial
//! GPU command queue whose only timing primitive is "measure the elapsed time
//! of the next stretch of queued work" -- one flat, non-overlapping
//! measurement at a time, no timestamps.
//!
//! Nesting is simulated by cutting a fresh flat measurement at every context
//! boundary and reconstructing the hierarchy from the open/close structure of
//! the boundary stream. Completed measurements are drained in strict FIFO
//! order and their durations accumulated into absolute timestamps, which are
//! then exported as a speedscope "evented" profile.

mod action;
mod denylist;
mod error;
mod profiler;
mod queue;
mod resolve;
mod speedscope;
mod stack;

pub mod testing_common;

pub use crate::action::{Action, ActionKind};
pub use crate::error::Error;
pub use crate::profiler::Profiler;
pub use crate::queue::TimerQueue;
pub use crate::resolve::ResolvedEvent;
pub use crate::speedscope::{
    EventTag, EventedProfile, Frame, ProfileDocument, ProfileEvent, SCHEMA_URI,
};
pub use crate::stack::ROOT_CONTEXT;
