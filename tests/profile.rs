use gputime::testing_common::{assert_well_formed, ScriptedQueue};
use gputime::{Error, EventTag, Profiler, ROOT_CONTEXT};

#[tokio::test]
async fn empty_session_exports_balanced_root_pair() {
    let queue = ScriptedQueue::new().with_durations(&[5, 7]);
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler.stop().unwrap();

    let doc = profiler.export_profile().await.unwrap();
    assert_well_formed(&doc);

    assert_eq!(doc.shared.frames.len(), 1);
    assert_eq!(doc.shared.frames[0].name, ROOT_CONTEXT);

    let profile = &doc.profiles[0];
    assert_eq!(profile.events.len(), 2);
    assert_eq!(profile.events[0].tag, EventTag::Open);
    assert_eq!(profile.events[0].at, 5);
    assert_eq!(profile.events[1].tag, EventTag::Close);
    assert_eq!(profile.events[1].at, 12);
    assert_eq!(profile.end_value, 12);

    // Every handle went back to the queue once its result was consumed.
    assert_eq!(profiler.queue().live_handles(), 0);
}

#[tokio::test]
async fn single_context_yields_two_frames_and_four_events() {
    let queue = ScriptedQueue::new().with_durations(&[1, 2, 3, 4]);
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler.push_context("a").unwrap();
    profiler.pop_context("a").unwrap();
    profiler.stop().unwrap();

    let doc = profiler.export_profile().await.unwrap();
    assert_well_formed(&doc);

    let names: Vec<_> = doc.shared.frames.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, [ROOT_CONTEXT, "a"]);

    let profile = &doc.profiles[0];
    let summary: Vec<_> = profile.events.iter().map(|e| (e.tag, e.frame, e.at)).collect();
    assert_eq!(
        summary,
        [
            (EventTag::Open, 0, 1),
            (EventTag::Open, 1, 3),
            (EventTag::Close, 1, 6),
            (EventTag::Close, 0, 10),
        ]
    );
    assert_eq!(profile.end_value, 10);
}

#[tokio::test]
async fn deep_nesting_stays_balanced() {
    let queue = ScriptedQueue::new();
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler
        .with_context("frame", |p| {
            p.with_context("shadow pass", |p| {
                p.push_context("cascade").unwrap();
                p.pop_context("cascade").unwrap();
            })
            .unwrap();
            p.with_context("main pass", |_| {}).unwrap();
        })
        .unwrap();
    profiler.stop().unwrap();

    let doc = profiler.export_profile().await.unwrap();
    assert_well_formed(&doc);
    assert_eq!(doc.shared.frames.len(), 5);
    assert_eq!(doc.profiles[0].events.len(), 10);
}

#[tokio::test]
async fn repeated_names_share_one_frame() {
    let queue = ScriptedQueue::new();
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    for _ in 0..2 {
        profiler.push_context("a").unwrap();
        profiler.pop_context("a").unwrap();
    }
    profiler.stop().unwrap();

    let doc = profiler.export_profile().await.unwrap();
    assert_well_formed(&doc);
    assert_eq!(doc.shared.frames.len(), 2);
    assert_eq!(doc.profiles[0].events.len(), 6);
    assert!(doc.profiles[0].events[1..5].iter().all(|e| e.frame == 1));
}

#[tokio::test]
async fn with_context_returns_the_body_value() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    profiler.start().unwrap();
    let answer = profiler.with_context("compute", |_| 42).unwrap();
    assert_eq!(answer, 42);
    profiler.stop().unwrap();
}

#[test]
fn start_twice_is_an_invalid_state() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    profiler.start().unwrap();
    match profiler.start() {
        Err(Error::InvalidState(_)) => {}
        other => panic!("expected invalid-state error, got {:?}", other),
    }
    assert!(profiler.is_running());
}

#[test]
fn stop_without_start_is_an_invalid_state() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    match profiler.stop() {
        Err(Error::InvalidState(_)) => {}
        other => panic!("expected invalid-state error, got {:?}", other),
    }
}

#[test]
fn push_before_start_is_a_protocol_error() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    match profiler.push_context("a") {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn pop_mismatch_fails_and_leaves_the_session_usable() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    profiler.start().unwrap();

    // Only the root is open, so popping anything else is an imbalance.
    match profiler.pop_context("x") {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }
    assert_eq!(profiler.context_depth(), 1);

    profiler.stop().unwrap();
    let doc = profiler.export_profile().await.unwrap();
    assert_well_formed(&doc);
    assert_eq!(doc.profiles[0].events.len(), 2);
}

#[test]
fn stop_with_an_open_context_reports_the_imbalance() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    profiler.start().unwrap();
    profiler.push_context("left open").unwrap();
    match profiler.stop() {
        Err(Error::Protocol(_)) => {}
        other => panic!("expected protocol error, got {:?}", other),
    }
}

#[test]
fn queue_without_the_extension_cannot_start_and_stop_is_a_noop() {
    let mut profiler = Profiler::new(ScriptedQueue::unavailable());
    match profiler.start() {
        Err(Error::Unsupported) => {}
        other => panic!("expected unsupported error, got {:?}", other),
    }
    profiler.stop().unwrap();
    assert!(!profiler.is_running());
}

#[test]
fn denylisted_device_is_refused_at_start() {
    let queue = ScriptedQueue::new().with_device("Mali-400 MP");
    let mut profiler = Profiler::new(queue);
    match profiler.start() {
        Err(Error::UnsupportedHardware(device)) => assert_eq!(device, "Mali-400 MP"),
        other => panic!("expected unsupported-hardware error, got {:?}", other),
    }
    assert!(!profiler.is_running());
}

#[test]
fn drain_available_on_an_empty_queue_is_a_noop() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    profiler.drain_available().unwrap();
    assert_eq!(profiler.resolved_len(), 0);

    profiler.start().unwrap();
    profiler.stop().unwrap();
    // Nothing is ready yet (one tick of latency), so nothing resolves.
    profiler.drain_available().unwrap();
    assert_eq!(profiler.resolved_len(), 0);
    assert_eq!(profiler.pending_len(), 2);
}

#[tokio::test]
async fn drain_tolerates_slow_results() {
    let queue = ScriptedQueue::new().with_latency(5);
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler.push_context("a").unwrap();
    profiler.pop_context("a").unwrap();
    profiler.stop().unwrap();

    profiler.drain_to_completion().await.unwrap();
    assert_eq!(profiler.pending_len(), 0);
    assert_eq!(profiler.resolved_len(), 4);

    // The drain had to yield to the host until the results came in.
    assert!(profiler.queue().ticks() >= 5);

    // Raw timeline: 10ns of default duration accumulated per boundary.
    let timestamps: Vec<_> = profiler
        .resolved_events()
        .iter()
        .map(|event| event.timestamp)
        .collect();
    assert_eq!(timestamps, [10, 20, 30, 40]);
}

#[tokio::test]
async fn disjoint_timing_discards_the_profile() {
    let queue = ScriptedQueue::new().with_disjoint_on_read(3);
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler.push_context("a").unwrap();
    profiler.push_context("b").unwrap();
    profiler.pop_context("b").unwrap();
    profiler.pop_context("a").unwrap();
    profiler.stop().unwrap();

    match profiler.drain_to_completion().await {
        Err(Error::UnreliableTiming) => {}
        other => panic!("expected unreliable-timing error, got {:?}", other),
    }

    // Nothing after the disjoint read is resolved, and the whole timeline is
    // discarded as untrustworthy.
    assert_eq!(profiler.pending_len(), 0);
    assert_eq!(profiler.resolved_len(), 0);
    assert_eq!(profiler.queue().reads(), 3);

    // The discarded measurements were still handed back to the queue.
    assert_eq!(profiler.queue().live_handles(), 0);

    // The export attempt fails the same way rather than producing a partial
    // profile.
    match profiler.export_profile().await {
        Err(Error::UnreliableTiming) => {}
        other => panic!("expected unreliable-timing error, got {:?}", other),
    }
}

#[tokio::test]
async fn export_without_a_session_is_an_empty_profile() {
    let mut profiler = Profiler::new(ScriptedQueue::new());
    match profiler.export_profile().await {
        Err(Error::EmptyProfile) => {}
        other => panic!("expected empty-profile error, got {:?}", other),
    }
}

#[tokio::test]
async fn restarting_builds_an_independent_profile() {
    let queue = ScriptedQueue::new().with_durations(&[5, 7, 10, 1, 2, 3]);
    let mut profiler = Profiler::new(queue);

    profiler.start().unwrap();
    profiler.stop().unwrap();
    let first = profiler.export_profile().await.unwrap();
    assert_eq!(first.profiles[0].end_value, 12);

    profiler.start().unwrap();
    profiler.stop().unwrap();
    let second = profiler.export_profile().await.unwrap();
    assert_well_formed(&second);

    // Timestamps restart from zero: 1ns to the root open, 2ns to the close.
    assert_eq!(second.profiles[0].events[0].at, 1);
    assert_eq!(second.profiles[0].end_value, 3);
}
