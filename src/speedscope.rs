//! Serialization of a resolved event timeline into the speedscope
//! "evented" profile format.

use crate::action::ActionKind;
use crate::error::Error;
use crate::resolve::ResolvedEvent;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub const SCHEMA_URI: &str = "https://www.speedscope.app/file-format-schema.json";

const PROFILE_NAME: &str = "GPU Profile";

/// Top-level speedscope document: an interned frame table shared by all
/// profiles, plus the profiles themselves (we always emit exactly one).
#[derive(Debug, Serialize)]
pub struct ProfileDocument {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub shared: SharedFrames,
    pub profiles: Vec<EventedProfile>,
}

#[derive(Debug, Serialize)]
pub struct SharedFrames {
    pub frames: Vec<Frame>,
}

/// One interned entry in the shared name table, referenced by index from
/// events.
#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct Frame {
    pub name: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
enum ProfileType {
    #[serde(rename = "evented")]
    Evented,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
enum ValueUnit {
    #[serde(rename = "nanoseconds")]
    Nanoseconds,
}

#[derive(Debug, Serialize)]
pub struct EventedProfile {
    #[serde(rename = "type")]
    profile_type: ProfileType,
    pub name: &'static str,
    unit: ValueUnit,
    #[serde(rename = "startValue")]
    pub start_value: u64,
    #[serde(rename = "endValue")]
    pub end_value: u64,
    pub events: Vec<ProfileEvent>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum EventTag {
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "C")]
    Close,
}

#[derive(Debug, Serialize)]
pub struct ProfileEvent {
    #[serde(rename = "type")]
    pub tag: EventTag,
    pub frame: usize,
    pub at: u64,
}

/// Builds the export document from a fully resolved timeline.
///
/// Frames are interned in first-seen order; identical names share one index.
/// Balance and LIFO nesting of the emitted events are inherited from the
/// context stack's push/pop discipline, and `at` monotonicity from the
/// pipeline's append-only accumulation, so neither is re-checked here.
pub(crate) fn build_document(events: Vec<ResolvedEvent>) -> Result<ProfileDocument, Error> {
    if events.is_empty() {
        return Err(Error::EmptyProfile);
    }

    let mut frames: Vec<Frame> = Vec::new();
    let mut frame_by_name: FxHashMap<String, usize> = FxHashMap::default();
    let mut out = Vec::with_capacity(events.len());

    for ResolvedEvent { action, timestamp } in events {
        let frame = match frame_by_name.get(&action.name) {
            Some(&index) => index,
            None => {
                let index = frames.len();
                frame_by_name.insert(action.name.clone(), index);
                frames.push(Frame { name: action.name });
                index
            }
        };
        let tag = match action.kind {
            ActionKind::Open => EventTag::Open,
            ActionKind::Close => EventTag::Close,
        };
        out.push(ProfileEvent {
            tag,
            frame,
            at: timestamp,
        });
    }

    let end_value = out.last().map(|event| event.at).unwrap_or(0);

    Ok(ProfileDocument {
        schema: SCHEMA_URI,
        shared: SharedFrames { frames },
        profiles: vec![EventedProfile {
            profile_type: ProfileType::Evented,
            name: PROFILE_NAME,
            unit: ValueUnit::Nanoseconds,
            start_value: 0,
            end_value,
            events: out,
        }],
    })
}
