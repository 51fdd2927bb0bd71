use crate::error::Error;
use smallvec::SmallVec;

/// Sentinel root context wrapping every profiling session. Pushed by
/// `start()` and popped by `stop()`, so even an otherwise empty session
/// exports one balanced open/close pair.
pub const ROOT_CONTEXT: &str = "profile";

/// The names of all currently open contexts, innermost last.
///
/// Pops are strict: the popped name must equal the innermost open name
/// exactly. A mismatch means the caller's push/pop calls are not properly
/// nested, and the stack is left untouched so the error is attributable.
#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    names: SmallVec<[String; 8]>,
}

impl ContextStack {
    pub(crate) fn new() -> ContextStack {
        ContextStack {
            names: SmallVec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub(crate) fn pop(&mut self, name: &str) -> Result<(), Error> {
        match self.names.last() {
            None => Err(Error::Protocol(format!(
                "popped `{}` but no context is open",
                name
            ))),
            Some(top) if top != name => Err(Error::Protocol(format!(
                "popped `{}` but the innermost open context is `{}`",
                name, top
            ))),
            Some(_) => {
                self.names.pop();
                Ok(())
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub(crate) fn depth(&self) -> usize {
        self.names.len()
    }
}
