//! Property-based tests for presence reconciliation and dispatch.
//!
//! Arbitrary frame sequences are fed through a session and checked against a
//! plain `HashSet` model.

use discard_core::{Dispatch, Session};
use discard_protocol::{InboundFrame, PresenceStatus};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A small alphabet so deltas actually collide with the list.
fn user_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(String::from)
}

fn status_strategy() -> impl Strategy<Value = PresenceStatus> {
    prop_oneof![
        3 => Just(PresenceStatus::Online),
        3 => Just(PresenceStatus::Offline),
        1 => "[a-z]{1,8}".prop_map(PresenceStatus::from),
    ]
}

fn delta_strategy() -> impl Strategy<Value = (String, PresenceStatus)> {
    (user_strategy(), status_strategy())
}

/// Text that is never a usable frame.
fn garbage_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        ".{0,40}",
        "[a-z_]{1,12}".prop_map(|t| format!(r#"{{"type":"x_{t}","user_id":"a"}}"#)),
        Just(r#"{"type":"presence_update","user_id":"a"}"#.to_string()),
        Just(r#"{"type":"presence_list"}"#.to_string()),
        Just(r#"{"type":"message","message":{"content":"no channel"}}"#.to_string()),
        Just(r#"{"type":"message","message":{"channel_id":""}}"#.to_string()),
        Just(r#"{"type":"message_delete","channel_id":"","message_id":""}"#.to_string()),
        Just(r#"{"type":"presence_update","user_id":"","status":"online"}"#.to_string()),
        Just(r#"{"type":"presence_update","user_id":"a","status":""}"#.to_string()),
        Just(r#"{"type":"server_delete","server_id":""}"#.to_string()),
        Just(r#"{"user_ids":["z"]}"#.to_string()),
    ]
    .prop_filter("must not be a valid frame", |text| {
        discard_protocol::try_decode(text).is_err()
    })
}

fn encode(frame: &InboundFrame) -> String {
    serde_json::to_string(frame).unwrap()
}

proptest! {
    /// After a list and any deltas, membership is the net effect of applying
    /// them in order.
    #[test]
    fn prop_presence_matches_model(
        list in prop::collection::vec(user_strategy(), 0..6),
        deltas in prop::collection::vec(delta_strategy(), 0..30),
    ) {
        let mut session = Session::new();
        let mut model: HashSet<String> = list.iter().cloned().collect();

        session.handle_text(&encode(&InboundFrame::presence_list(list)));
        for (user, status) in deltas {
            if status.is_online() {
                model.insert(user.clone());
            } else {
                model.remove(&user);
            }
            session.handle_text(&encode(&InboundFrame::presence_update(user, status)));
        }

        prop_assert_eq!(session.snapshot(), model.clone());
        for user in ["a", "b", "c", "d", "e"] {
            prop_assert_eq!(session.is_online(user), model.contains(user));
        }
    }

    /// The same delta twice in a row is the same as once.
    #[test]
    fn prop_delta_is_idempotent(
        list in prop::collection::vec(user_strategy(), 0..6),
        (user, status) in delta_strategy(),
    ) {
        let mut once = Session::new();
        let mut twice = Session::new();
        let list_frame = encode(&InboundFrame::presence_list(list));
        let delta_frame = encode(&InboundFrame::presence_update(user, status));

        once.handle_text(&list_frame);
        once.handle_text(&delta_frame);
        twice.handle_text(&list_frame);
        twice.handle_text(&delta_frame);
        twice.handle_text(&delta_frame);

        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    /// Unusable input never mutates presence and never reaches an observer.
    #[test]
    fn prop_garbage_is_inert(
        list in prop::collection::vec(user_strategy(), 0..6),
        garbage in prop::collection::vec(garbage_strategy(), 1..10),
    ) {
        let mut session = Session::new();
        session.handle_text(&encode(&InboundFrame::presence_list(list)));
        let before = session.snapshot();

        let calls = Arc::new(AtomicUsize::new(0));
        {
            let c = Arc::clone(&calls);
            session.on_presence(move || { c.fetch_add(1, Ordering::SeqCst); });
            let c = Arc::clone(&calls);
            session.on_message(move |_| { c.fetch_add(1, Ordering::SeqCst); });
            let c = Arc::clone(&calls);
            session.on_unread(move |_| { c.fetch_add(1, Ordering::SeqCst); });
            let c = Arc::clone(&calls);
            session.on_server_event(move |_| { c.fetch_add(1, Ordering::SeqCst); });
        }

        for text in &garbage {
            prop_assert_eq!(session.handle_text(text), Dispatch::Dropped);
        }

        prop_assert_eq!(session.snapshot(), before);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
        prop_assert_eq!(session.stats().frames_dropped, garbage.len() as u64);
    }

    /// Every message frame reaches every message and unread observer once.
    #[test]
    fn prop_message_fans_out_once(
        channel in "[a-z0-9]{1,10}",
        message_observers in 0usize..4,
        unread_observers in 0usize..4,
    ) {
        let mut session = Session::new();
        let message_hits = Arc::new(AtomicUsize::new(0));
        let unread_hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..message_observers {
            let hits = Arc::clone(&message_hits);
            session.on_message(move |_| { hits.fetch_add(1, Ordering::SeqCst); });
        }
        for _ in 0..unread_observers {
            let hits = Arc::clone(&unread_hits);
            let expected = channel.clone();
            session.on_unread(move |got| {
                assert_eq!(got, expected);
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        let frame = format!(r#"{{"type":"message","message":{{"channel_id":"{channel}"}}}}"#);
        session.handle_text(&frame);

        prop_assert_eq!(message_hits.load(Ordering::SeqCst), message_observers);
        prop_assert_eq!(unread_hits.load(Ordering::SeqCst), unread_observers);
    }
}
