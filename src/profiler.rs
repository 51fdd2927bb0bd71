use crate::action::Action;
use crate::denylist;
use crate::error::Error;
use crate::queue::TimerQueue;
use crate::resolve::{ResolveState, ResolvedEvent};
use crate::speedscope::{self, ProfileDocument};
use crate::stack::{ContextStack, ROOT_CONTEXT};
use log::debug;

/// Profiles work submitted to one serial command queue.
///
/// The queue's primitive allows exactly one measurement to accumulate time
/// at any instant, so nesting cannot be measured directly. Instead, every
/// context boundary atomically ends the current measurement and begins a
/// fresh one; each finished measurement's duration is "the time between this
/// boundary and the previous one", and the hierarchy is reconstructed later
/// purely from the open/close structure of the boundary stream.
///
/// One instance per queue binding. All state is owned exclusively by the
/// instance; nothing is shared across instances or threads.
pub struct Profiler<Q: TimerQueue> {
    queue: Q,
    active: Option<Q::Handle>,
    running: bool,
    stack: ContextStack,
    resolve: ResolveState<Q::Handle>,
}

impl<Q: TimerQueue> Profiler<Q> {
    pub fn new(queue: Q) -> Profiler<Q> {
        Profiler {
            queue,
            active: None,
            running: false,
            stack: ContextStack::new(),
            resolve: ResolveState::new(),
        }
    }

    /// Begins a profiling session: discards any state left over from a
    /// previous session, opens the first measurement, and pushes the root
    /// context.
    ///
    /// The hardware denylist is checked here, once, before anything is
    /// submitted to the queue.
    pub fn start(&mut self) -> Result<(), Error> {
        if !self.queue.timer_extension_available() {
            return Err(Error::Unsupported);
        }
        if self.running {
            return Err(Error::InvalidState("profiling is already running"));
        }
        let device = self.queue.device_identifier();
        if denylist::is_denylisted(&device) {
            return Err(Error::UnsupportedHardware(device));
        }
        debug!("starting GPU profile on `{}`", device);

        self.resolve.reset(&mut self.queue);
        self.stack = ContextStack::new();

        let handle = self.queue.create_handle();
        self.queue.begin_measurement(&handle);
        self.active = Some(handle);
        self.running = true;

        self.push_context(ROOT_CONTEXT)
    }

    /// Ends the session: pops the root context and ends the final
    /// measurement. Does not wait for results; resolution is decoupled and
    /// happens in [`Profiler::export_profile`] (or an explicit drain).
    pub fn stop(&mut self) -> Result<(), Error> {
        if !self.queue.timer_extension_available() {
            return Ok(());
        }
        if !self.running {
            return Err(Error::InvalidState("profiling is not running"));
        }

        // Forces the stack back to empty. If any user context is still open
        // the root is not on top and this reports the imbalance.
        self.pop_context(ROOT_CONTEXT)?;
        debug_assert!(self.stack.is_empty());

        // The measurement opened by that final boundary spans nothing we
        // attribute time to; end it and hand it straight back.
        self.queue.end_measurement();
        if let Some(handle) = self.active.take() {
            self.queue.release_handle(handle);
        }
        self.running = false;
        debug!(
            "stopped GPU profile ({} measurements pending)",
            self.resolve.pending_len()
        );
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The queue binding this profiler measures against.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Opens a named context. Fails with a protocol error if profiling is
    /// not active.
    pub fn push_context(&mut self, name: &str) -> Result<(), Error> {
        self.mark_action(Action::open(name))?;
        self.stack.push(name);
        Ok(())
    }

    /// Closes the innermost open context, which must be named exactly
    /// `name`. On a mismatch the stack is left unmodified.
    pub fn pop_context(&mut self, name: &str) -> Result<(), Error> {
        self.stack.pop(name)?;
        self.mark_action(Action::close(name))
    }

    /// Runs `body` inside a context named `name`, popping it afterwards.
    pub fn with_context<R>(
        &mut self,
        name: &str,
        body: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, Error> {
        self.push_context(name)?;
        let result = body(self);
        self.pop_context(name)?;
        Ok(result)
    }

    /// The multiplexing step: against the serial queue, ending the current
    /// measurement, beginning a fresh one, and enqueuing the finished handle
    /// with its boundary is one indivisible unit.
    fn mark_action(&mut self, action: Action) -> Result<(), Error> {
        let closed = match self.active.take() {
            Some(handle) => handle,
            None => {
                return Err(Error::Protocol(format!(
                    "cannot record a `{}` boundary: no measurement is active",
                    action.name
                )));
            }
        };
        self.queue.end_measurement();
        let fresh = self.queue.create_handle();
        self.queue.begin_measurement(&fresh);
        self.active = Some(fresh);
        self.resolve.enqueue(action, closed);
        Ok(())
    }

    /// Resolves whatever results are available right now, without blocking.
    pub fn drain_available(&mut self) -> Result<(), Error> {
        self.resolve.drain_available(&mut self.queue)
    }

    /// Resolves every pending measurement, yielding to the host between
    /// polls until the queue has delivered all results.
    pub async fn drain_to_completion(&mut self) -> Result<(), Error> {
        self.resolve.drain_to_completion(&mut self.queue).await
    }

    /// Drains to completion and serializes the finished timeline as a
    /// speedscope evented profile. Consumes the session's resolved state; a
    /// new [`Profiler::start`] is required before profiling again.
    pub async fn export_profile(&mut self) -> Result<ProfileDocument, Error> {
        self.resolve.drain_to_completion(&mut self.queue).await?;
        speedscope::build_document(self.resolve.take_resolved())
    }

    /// Number of measurements submitted but not yet resolved.
    pub fn pending_len(&self) -> usize {
        self.resolve.pending_len()
    }

    /// Number of boundaries already carrying an absolute timestamp.
    pub fn resolved_len(&self) -> usize {
        self.resolve.resolved_len()
    }

    /// The raw timeline resolved so far, for hosts that want the events
    /// before (or instead of) a speedscope export.
    pub fn resolved_events(&self) -> &[ResolvedEvent] {
        self.resolve.resolved()
    }

    /// Number of contexts currently open, the root included.
    pub fn context_depth(&self) -> usize {
        self.stack.depth()
    }
}
