//! Inbound frame dispatch.
//!
//! Each text frame is decoded once and routed to the observer groups that
//! care about it:
//!
//! | frame             | effect                                              |
//! |-------------------|-----------------------------------------------------|
//! | `presence_list`   | replace presence set, notify presence observers     |
//! | `presence_update` | apply presence delta, notify presence observers     |
//! | `server_update`   | server observers get [`ServerEvent::Updated`]       |
//! | `server_delete`   | server observers get [`ServerEvent::Deleted`]       |
//! | `message`         | message observers, then unread observers (channel)  |
//! | `message_edit`    | message observers get [`MessageEvent::Edited`]      |
//! | `message_delete`  | message observers get [`MessageEvent::Deleted`]     |
//! | anything else     | dropped                                             |
//!
//! Dispatch is synchronous. Groups fire in the order above, observers within
//! a group in registration order.

use discard_protocol::{
    codec, ChannelId, ChatMessage, FrameKind, InboundFrame, MessageId, Server, ServerId,
};

use crate::observer::ObserverRegistry;
use crate::presence::{PresenceReconciler, PresenceView};

/// Event delivered to message observers.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEvent {
    /// A new message.
    Created(ChatMessage),
    /// An edited message, with its new content.
    Edited(ChatMessage),
    /// A deleted message.
    Deleted {
        channel_id: ChannelId,
        message_id: MessageId,
    },
}

impl MessageEvent {
    /// The channel the event belongs to.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        match self {
            MessageEvent::Created(message) | MessageEvent::Edited(message) => &message.channel_id,
            MessageEvent::Deleted { channel_id, .. } => channel_id,
        }
    }
}

/// Event delivered to server observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A server was created or changed.
    Updated(Server),
    /// A server was deleted.
    Deleted { server_id: ServerId },
}

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The frame was understood and routed.
    Routed(FrameKind),
    /// The frame was malformed or of an unknown type, and went nowhere.
    Dropped,
}

/// The four observer registries of a session.
///
/// Cloning yields handles to the same registries, which is how a callback
/// gets hold of a registry to deregister itself.
#[derive(Debug, Clone, Default)]
pub struct Observers {
    /// Called with no payload after every presence change; re-read the view.
    pub presence: ObserverRegistry<()>,
    /// Server updates and deletions.
    pub servers: ObserverRegistry<ServerEvent>,
    /// Called with the channel id of every new message.
    pub unread: ObserverRegistry<str>,
    /// New, edited and deleted messages.
    pub messages: ObserverRegistry<MessageEvent>,
}

/// Decodes inbound frames and routes them.
#[derive(Debug, Default)]
pub struct Dispatcher {
    presence: PresenceReconciler,
    observers: Observers,
}

impl Dispatcher {
    /// Create a dispatcher with an empty presence set and no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get handles to the observer registries.
    #[must_use]
    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Get a read handle to the presence set.
    #[must_use]
    pub fn presence(&self) -> PresenceView {
        self.presence.view()
    }

    /// Decode and route one text frame.
    pub fn dispatch_text(&mut self, text: &str) -> Dispatch {
        self.dispatch(codec::decode(text))
    }

    /// Route one decoded frame.
    pub fn dispatch(&mut self, frame: InboundFrame) -> Dispatch {
        let Some(kind) = frame.kind() else {
            return Dispatch::Dropped;
        };

        match frame {
            InboundFrame::PresenceList { user_ids } => {
                self.presence.replace_all(user_ids);
                self.observers.presence.notify(&());
            }
            InboundFrame::PresenceUpdate { user_id, status } => {
                self.presence.apply(&user_id, &status);
                self.observers.presence.notify(&());
            }
            InboundFrame::ServerUpdate { server } => {
                self.observers.servers.notify(&ServerEvent::Updated(server));
            }
            InboundFrame::ServerDelete { server_id } => {
                self.observers
                    .servers
                    .notify(&ServerEvent::Deleted { server_id });
            }
            InboundFrame::Message { message } => {
                let event = MessageEvent::Created(message);
                self.observers.messages.notify(&event);
                self.observers.unread.notify(event.channel_id());
            }
            InboundFrame::MessageEdit { message } => {
                self.observers.messages.notify(&MessageEvent::Edited(message));
            }
            InboundFrame::MessageDelete {
                channel_id,
                message_id,
            } => {
                self.observers.messages.notify(&MessageEvent::Deleted {
                    channel_id,
                    message_id,
                });
            }
            InboundFrame::Unrecognized => return Dispatch::Dropped,
        }

        Dispatch::Routed(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every callback invocation as a string.
    fn recorder(dispatcher: &Dispatcher) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let observers = dispatcher.observers();

        let l = Arc::clone(&log);
        observers.presence.register(move |_| l.lock().push("presence".into()));
        let l = Arc::clone(&log);
        observers.servers.register(move |event| l.lock().push(format!("server:{:?}", event)));
        let l = Arc::clone(&log);
        observers.unread.register(move |channel| l.lock().push(format!("unread:{channel}")));
        let l = Arc::clone(&log);
        observers
            .messages
            .register(move |event| l.lock().push(format!("message:{}", event.channel_id())));

        log
    }

    #[test]
    fn test_message_hits_messages_then_unread() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);

        let outcome = dispatcher.dispatch_text(
            r#"{"type":"message","message":{"id":"m1","channel_id":"c1","content":"hi"}}"#,
        );

        assert_eq!(outcome, Dispatch::Routed(FrameKind::Message));
        assert_eq!(*log.lock(), vec!["message:c1", "unread:c1"]);
    }

    #[test]
    fn test_edit_and_delete_do_not_touch_unread() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);

        dispatcher.dispatch(InboundFrame::message_edit(ChatMessage::new("c1", "fixed")));
        dispatcher.dispatch(InboundFrame::message_delete("c2", "m9"));

        assert_eq!(*log.lock(), vec!["message:c1", "message:c2"]);
    }

    #[test]
    fn test_message_event_payloads() {
        let mut dispatcher = Dispatcher::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = Arc::clone(&events);
        dispatcher
            .observers()
            .messages
            .register(move |event| e.lock().push(event.clone()));

        let message = ChatMessage::new("c1", "hello").with_id("m1");
        dispatcher.dispatch(InboundFrame::message(message.clone()));
        dispatcher.dispatch(InboundFrame::message_edit(message.clone()));
        dispatcher.dispatch(InboundFrame::message_delete("c1", "m1"));

        assert_eq!(
            *events.lock(),
            vec![
                MessageEvent::Created(message.clone()),
                MessageEvent::Edited(message),
                MessageEvent::Deleted {
                    channel_id: "c1".into(),
                    message_id: "m1".into()
                },
            ]
        );
    }

    #[test]
    fn test_server_events() {
        let mut dispatcher = Dispatcher::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = Arc::clone(&events);
        dispatcher
            .observers()
            .servers
            .register(move |event| e.lock().push(event.clone()));

        let server = Server::new("s1", "Home");
        assert_eq!(
            dispatcher.dispatch(InboundFrame::server_update(server.clone())),
            Dispatch::Routed(FrameKind::ServerUpdate)
        );
        assert_eq!(
            dispatcher.dispatch_text(r#"{"type":"server_delete","server_id":"s1"}"#),
            Dispatch::Routed(FrameKind::ServerDelete)
        );

        assert_eq!(
            *events.lock(),
            vec![
                ServerEvent::Updated(server),
                ServerEvent::Deleted {
                    server_id: "s1".into()
                },
            ]
        );
    }

    #[test]
    fn test_presence_frames() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);
        let view = dispatcher.presence();

        dispatcher.dispatch_text(r#"{"type":"presence_list","user_ids":["a","b"]}"#);
        dispatcher.dispatch_text(r#"{"type":"presence_update","user_id":"a","status":"offline"}"#);

        assert_eq!(view.snapshot(), ["b".to_string()].into_iter().collect());
        assert_eq!(*log.lock(), vec!["presence", "presence"]);
    }

    #[test]
    fn test_presence_observers_fire_on_no_op_delta() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);

        dispatcher.dispatch_text(r#"{"type":"presence_update","user_id":"a","status":"online"}"#);
        dispatcher.dispatch_text(r#"{"type":"presence_update","user_id":"a","status":"online"}"#);

        assert_eq!(log.lock().len(), 2);
        assert_eq!(dispatcher.presence().len(), 1);
    }

    #[test]
    fn test_garbage_is_dropped() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);
        let view = dispatcher.presence();
        dispatcher.dispatch_text(r#"{"type":"presence_list","user_ids":["a"]}"#);
        log.lock().clear();

        for text in [
            "{",
            r#"{"type":"typing","user_id":"a"}"#,
            r#"{"type":"presence_update","user_id":"a"}"#,
            r#"{"type":"presence_list","user_ids":null}"#,
            r#"{"type":"message","message":{}}"#,
            r#"{"type":"server_update"}"#,
        ] {
            assert_eq!(dispatcher.dispatch_text(text), Dispatch::Dropped, "input: {text}");
        }

        assert!(log.lock().is_empty());
        assert_eq!(view.snapshot(), ["a".to_string()].into_iter().collect());
    }

    #[test]
    fn test_empty_routing_keys_are_dropped() {
        let mut dispatcher = Dispatcher::new();
        let log = recorder(&dispatcher);
        let view = dispatcher.presence();
        dispatcher.dispatch_text(r#"{"type":"presence_list","user_ids":["a"]}"#);
        log.lock().clear();

        for text in [
            r#"{"type":"presence_update","user_id":"a","status":""}"#,
            r#"{"type":"presence_update","user_id":"","status":"online"}"#,
            r#"{"type":"message","message":{"channel_id":""}}"#,
            r#"{"type":"message_delete","channel_id":"c1","message_id":""}"#,
            r#"{"type":"server_delete","server_id":""}"#,
        ] {
            assert_eq!(dispatcher.dispatch_text(text), Dispatch::Dropped, "input: {text}");
        }

        assert!(log.lock().is_empty());
        assert_eq!(view.snapshot(), ["a".to_string()].into_iter().collect());
    }

    #[test]
    fn test_group_order_within_one_frame() {
        let mut dispatcher = Dispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let observers = dispatcher.observers().clone();

        // Registered unread-first; delivery is still messages-first.
        let o = Arc::clone(&order);
        observers.unread.register(move |_| o.lock().push("unread"));
        let o = Arc::clone(&order);
        observers.messages.register(move |_| o.lock().push("message"));

        dispatcher.dispatch(InboundFrame::message(ChatMessage::new("c1", "x")));
        assert_eq!(*order.lock(), vec!["message", "unread"]);
    }
}
