//! # discard-core
//!
//! The realtime event session of the Discard chat client.
//!
//! This crate provides the stateful part of the client:
//!
//! - **Session** - caller-owned object tying everything below together
//! - **Dispatcher** - decodes each inbound frame once and routes it
//! - **Presence** - the set of online users, rebuilt from server pushes
//! - **Observers** - independent callback registries per event category
//! - **Subscription** - channel subscribe/unsubscribe control frames
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Connection  │────▶│ Dispatcher  │────▶│  Observers  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲                   │
//!        │                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │Subscription │     │  Presence   │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! Nothing here is global: two sessions in one process never share state.
//! The core never reconnects, never retries and never raises on bad input;
//! an unusable frame is simply not delivered.

pub mod dispatcher;
pub mod observer;
pub mod presence;
pub mod session;
pub mod subscription;

pub use dispatcher::{Dispatch, Dispatcher, MessageEvent, Observers, ServerEvent};
pub use observer::{ObserverRegistry, ObserverToken};
pub use presence::{PresencePhase, PresenceReconciler, PresenceView};
pub use session::{Session, SessionStats};
pub use subscription::{send_message, subscribe, unsubscribe, SubscriptionSet};
