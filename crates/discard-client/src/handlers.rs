//! Connection handling for the Discard client.
//!
//! This module drives one connection at a time: it wires observers into a
//! fresh session, replays subscriptions when the connection opens, feeds
//! inbound frames to the session and executes user input. Reconnecting is
//! decided here too; the core never does it on its own.

use crate::commands::Command;
use crate::config::Config;
use crate::metrics;
use crate::reconnect::Backoff;
use crate::view::ChatView;
use anyhow::{Context, Result};
use discard_core::{send_message, Dispatch, MessageEvent, ServerEvent, Session, SubscriptionSet};
use discard_transport::{Connection, ConnectionState, Connector, WebSocketConnector};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The user asked to quit, or input ended.
    Quit,
    /// The connection closed.
    Closed,
}

/// State that outlives individual connections.
pub struct Client {
    subscriptions: SubscriptionSet,
    view: ChatView,
    backoff: Backoff,
}

impl Client {
    /// Create a client that will subscribe to `channels`; the first is active.
    #[must_use]
    pub fn new(channels: &[String], backoff: Backoff) -> Self {
        let subscriptions = SubscriptionSet::new();
        for channel in channels {
            subscriptions.insert(channel.as_str());
        }

        let view = ChatView::new();
        if let Some(first) = channels.first() {
            view.set_active(first);
        }

        Self {
            subscriptions,
            view,
            backoff,
        }
    }

    /// Register the client's observers on a new session.
    fn register_observers(&self, session: &Session) {
        let presence = session.presence();
        session.on_presence(move || {
            let online = presence.len();
            metrics::set_online_users(online);
            info!(online, "Presence changed");
        });

        session.on_message(|event| match event {
            MessageEvent::Created(message) => info!(
                channel = %message.channel_id,
                author = %message.author_label(),
                "{}",
                message.content
            ),
            MessageEvent::Edited(message) => info!(
                channel = %message.channel_id,
                message = %message.id,
                "(edited) {}",
                message.content
            ),
            MessageEvent::Deleted {
                channel_id,
                message_id,
            } => info!(channel = %channel_id, message = %message_id, "Message deleted"),
        });

        session.on_server_event(|event| match event {
            ServerEvent::Updated(server) => {
                info!(server = %server.id, name = %server.name, "Server updated");
            }
            ServerEvent::Deleted { server_id } => info!(server = %server_id, "Server deleted"),
        });

        let view = self.view.clone();
        session.on_unread(move |channel| view.mark_unread(channel));
    }

    /// Called once per connection when it reaches `Open`.
    fn on_open<C: Connection + ?Sized>(&mut self, conn: &C) {
        self.backoff.reset();
        let replayed = self.subscriptions.replay(conn);
        info!(connection = %conn.id(), channels = replayed, "Connected");
    }

    /// Drive one connection until it closes or the user quits.
    pub async fn run_connection<C: Connection + ?Sized>(
        &mut self,
        conn: &mut C,
        input: &mut mpsc::Receiver<String>,
    ) -> Exit {
        let mut session = Session::new();
        self.register_observers(&session);

        let mut states = conn.watch_state();
        let mut watching = true;
        let mut opened = false;
        if conn.state() == ConnectionState::Open {
            self.on_open(&*conn);
            opened = true;
        }

        loop {
            tokio::select! {
                biased;

                changed = states.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                        continue;
                    }
                    let state = *states.borrow_and_update();
                    if state == ConnectionState::Open && !opened {
                        self.on_open(&*conn);
                        opened = true;
                    }
                }

                text = conn.recv() => match text {
                    Some(text) => {
                        let outcome = session.handle_text(&text);
                        metrics::record_dispatch(outcome);
                        if outcome == Dispatch::Dropped {
                            debug!(connection = %conn.id(), bytes = text.len(), "Dropped unrecognized frame");
                        }
                    }
                    None => {
                        let stats = session.stats();
                        info!(
                            connection = %conn.id(),
                            routed = stats.frames_routed,
                            dropped = stats.frames_dropped,
                            "Disconnected"
                        );
                        return Exit::Closed;
                    }
                },

                line = input.recv() => {
                    let quit = match line {
                        Some(line) => self.handle_line(&session, &*conn, &line),
                        None => true,
                    };
                    if quit {
                        conn.close();
                        return Exit::Quit;
                    }
                }
            }
        }
    }

    /// Execute one input line. Returns `true` if the user wants to quit.
    fn handle_line<C: Connection + ?Sized>(&self, session: &Session, conn: &C, line: &str) -> bool {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return false,
            Err(e) => {
                warn!("{}", e);
                return false;
            }
        };

        match command {
            Command::Say(content) => match self.view.active() {
                Some(channel) => {
                    if !conn.is_open() {
                        warn!(channel = %channel, "Not connected, message not sent");
                    } else if !send_message(conn, &channel, &content) {
                        warn!(channel = %channel, "Message not sent");
                    }
                }
                None => warn!("No active channel, /join one first"),
            },
            Command::Join(channel) => {
                self.subscriptions.subscribe(conn, &channel);
                self.view.set_active(&channel);
                info!(channel = %channel, "Joined");
            }
            Command::Leave(channel) => {
                self.subscriptions.unsubscribe(conn, &channel);
                let fallback = self.subscriptions.channels().into_iter().next();
                self.view.leave(&channel, fallback.as_deref());
                info!(channel = %channel, "Left");
            }
            Command::Online => {
                let mut users: Vec<String> = session.snapshot().into_iter().collect();
                users.sort();
                println!("{} online: {}", users.len(), users.join(", "));
            }
            Command::Unread => {
                let counts = self.view.unread_counts();
                if counts.is_empty() {
                    println!("No unread messages");
                }
                for (channel, count) in counts {
                    println!("{channel}: {count}");
                }
            }
            Command::Quit => return true,
        }
        false
    }

    /// Wait out a reconnect delay. Input other than quitting is refused.
    async fn wait(&mut self, delay: Duration, input: &mut mpsc::Receiver<String>) -> Exit {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return Exit::Closed,
                line = input.recv() => match line.as_deref().map(Command::parse) {
                    None | Some(Ok(Some(Command::Quit))) => return Exit::Quit,
                    Some(_) => warn!("Not connected"),
                },
            }
        }
    }
}

/// Forward stdin lines to a channel. The channel closes at end of input.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Run the client until the user quits or, with reconnect disabled, the
/// connection closes.
///
/// # Errors
///
/// Returns an error if the configured origin is not usable.
pub async fn run_client(config: Config) -> Result<()> {
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            warn!("Failed to start metrics server: {}", e);
        }
    }

    let websocket = WebSocketConnector::from_origin(&config.origin)
        .with_context(|| format!("Invalid origin: {}", config.origin))?;
    info!(endpoint = %websocket.endpoint(), "Event stream endpoint");
    let connector: Box<dyn Connector> = Box::new(websocket);

    let (initial, max) = config.reconnect_delays();
    let mut client = Client::new(&config.channels, Backoff::new(initial, max));
    let mut input = spawn_stdin_reader();

    loop {
        let mut conn = connector.open();
        debug!(connection = %conn.id(), transport = connector.name(), "Opening connection");
        match client.run_connection(conn.as_mut(), &mut input).await {
            Exit::Quit => return Ok(()),
            Exit::Closed if !config.reconnect.enabled => {
                info!("Connection closed, reconnect disabled");
                return Ok(());
            }
            Exit::Closed => {}
        }

        let delay = client.backoff.next_delay();
        metrics::record_reconnect();
        info!(delay_ms = delay.as_millis() as u64, "Reconnecting");
        if client.wait(delay, &mut input).await == Exit::Quit {
            return Ok(());
        }
    }
}
