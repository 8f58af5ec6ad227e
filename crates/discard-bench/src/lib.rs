//! Shared fixtures for the Discard benchmarks.

use discard_core::Session;
use discard_protocol::{ChatMessage, InboundFrame, PresenceStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Encode an inbound frame the way the server would send it.
#[must_use]
pub fn wire(frame: &InboundFrame) -> String {
    serde_json::to_string(frame).unwrap_or_default()
}

/// A realistic mix of inbound traffic: mostly messages, some presence churn,
/// the odd edit and a little noise.
#[must_use]
pub fn mixed_traffic(frames: usize) -> Vec<String> {
    (0..frames)
        .map(|i| {
            let channel = format!("channel-{}", i % 8);
            match i % 10 {
                0 => wire(&InboundFrame::presence_update(
                    format!("user-{}", i % 50),
                    if i % 20 == 0 {
                        PresenceStatus::Online
                    } else {
                        PresenceStatus::Offline
                    },
                )),
                1 => wire(&InboundFrame::message_edit(
                    ChatMessage::new(channel, "edited").with_id(format!("m{i}")),
                )),
                2 => r#"{"type":"typing","user_id":"u1"}"#.to_string(),
                _ => wire(&InboundFrame::message(
                    ChatMessage::new(channel, "hello there")
                        .with_id(format!("m{i}"))
                        .with_author(format!("user-{}", i % 50)),
                )),
            }
        })
        .collect()
}

/// A presence list with `users` members.
#[must_use]
pub fn presence_list(users: usize) -> String {
    wire(&InboundFrame::presence_list(
        (0..users).map(|i| format!("user-{i}")),
    ))
}

/// A session with `per_group` counting observers in every registry.
///
/// Returns the session and the shared invocation counter.
#[must_use]
pub fn observed_session(per_group: usize) -> (Session, Arc<AtomicUsize>) {
    let session = Session::new();
    let hits = Arc::new(AtomicUsize::new(0));

    for _ in 0..per_group {
        let h = Arc::clone(&hits);
        session.on_presence(move || {
            h.fetch_add(1, Ordering::Relaxed);
        });
        let h = Arc::clone(&hits);
        session.on_message(move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });
        let h = Arc::clone(&hits);
        session.on_unread(move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });
        let h = Arc::clone(&hits);
        session.on_server_event(move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });
    }

    (session, hits)
}
