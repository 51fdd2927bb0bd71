/// The two kinds of context boundary that can be recorded against the queue.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionKind {
    Open,
    Close,
}

/// A single recorded context boundary.
///
/// Names are opaque identifiers compared by plain string equality. The same
/// name may open and close any number of times within one profile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Action {
    pub kind: ActionKind,
    pub name: String,
}

impl Action {
    pub fn open(name: &str) -> Action {
        Action {
            kind: ActionKind::Open,
            name: name.to_string(),
        }
    }

    pub fn close(name: &str) -> Action {
        Action {
            kind: ActionKind::Close,
            name: name.to_string(),
        }
    }
}
