//! Socket wrapper around the client capability.
//!
//! The socket owns the session's event loop. It caches group metadata and
//! recently seen messages, normalizes incoming messages and republishes
//! everything handlers care about through the shared [`EventNotifier`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::client::{ClientEvent, ClientEvents, ConnectionState, ConnectionUpdate, GroupMetadata, WaClient};
use super::error::{WaError, WaResult};
use super::message::{Jid, Message, RawMessage};
use crate::cache::TtlCache;
use crate::config::{AppConfig, PairingMode};
use crate::notifier::EventNotifier;

/// Event names published by the socket.
pub mod events {
    pub const MESSAGE: &str = "message";
    pub const CONNECTION: &str = "connection";
    pub const QR: &str = "qr";
}

/// Payload of socket notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Message(Message),
    Connection(ConnectionUpdate),
    Qr(String),
}

pub type SocketNotifier = EventNotifier<SocketEvent>;

/// What the event loop does after one client event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Reconnect,
    Stop,
}

pub struct Socket {
    client: Arc<dyn WaClient>,
    config: Arc<AppConfig>,
    notifier: Arc<SocketNotifier>,
    groups: TtlCache<Jid, GroupMetadata>,
    messages: TtlCache<String, RawMessage>,
    events: Mutex<Option<ClientEvents>>,
    state: Mutex<ConnectionState>,
    pairing_requested: AtomicBool,
}

impl Socket {
    pub fn new(client: Arc<dyn WaClient>, config: Arc<AppConfig>, notifier: Arc<SocketNotifier>) -> Self {
        Self {
            groups: TtlCache::with_ttl(config.group_cache_ttl, 0),
            messages: TtlCache::with_ttl(config.message_cache_ttl, config.message_cache_capacity),
            client,
            config,
            notifier,
            events: Mutex::new(None),
            state: Mutex::new(ConnectionState::Connecting),
            pairing_requested: AtomicBool::new(false),
        }
    }

    /// Opens a client session and keeps its event channel for [`run`](Self::run).
    pub async fn connect(&self) -> WaResult<()> {
        *self.state.lock() = ConnectionState::Connecting;
        let events = self.client.connect().await?;
        *self.events.lock() = Some(events);
        tracing::debug!(mode = ?self.config.pairing_mode, "client session opened");
        Ok(())
    }

    /// Processes client events until the session ends.
    ///
    /// Returns `Ok` when the client logs out, closes its channel, or closes
    /// the connection with reconnecting disabled. Handler failures are logged
    /// and do not stop the loop.
    pub async fn run(&self) -> WaResult<()> {
        loop {
            let mut events = self.events.lock().take().ok_or(WaError::NotConnected)?;

            let flow = loop {
                let Some(event) = events.recv().await else {
                    tracing::debug!("client event channel closed");
                    break Flow::Stop;
                };
                match self.handle_event(event).await {
                    Ok(Flow::Continue) => {}
                    Ok(flow) => break flow,
                    Err(WaError::Handler(err)) => {
                        tracing::warn!(error = %format!("{err:#}"), "event handler failed");
                    }
                    Err(err) => return Err(err),
                }
            };

            match flow {
                Flow::Reconnect => {
                    tracing::info!("connection closed, reconnecting");
                    self.connect().await?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Applies one client event.
    pub async fn handle_event(&self, event: ClientEvent) -> WaResult<Flow> {
        match event {
            ClientEvent::Connection(update) => self.on_connection(update),
            ClientEvent::Qr(code) => self.on_qr(code).await,
            ClientEvent::Messages(batch) => self.on_messages(batch),
            ClientEvent::GroupsChanged(groups) => {
                for group in &groups {
                    self.groups.remove(group);
                }
                tracing::debug!(count = groups.len(), "group metadata invalidated");
                Ok(Flow::Continue)
            }
        }
    }

    fn on_connection(&self, update: ConnectionUpdate) -> WaResult<Flow> {
        *self.state.lock() = update.state;
        let flow = match update.state {
            ConnectionState::Open => {
                tracing::info!("connection open");
                Flow::Continue
            }
            ConnectionState::Connecting => Flow::Continue,
            ConnectionState::Close if update.is_logged_out() => {
                tracing::warn!("logged out, not reconnecting");
                Flow::Stop
            }
            ConnectionState::Close if self.config.reconnect => Flow::Reconnect,
            ConnectionState::Close => {
                tracing::info!(reason = ?update.reason, "connection closed");
                Flow::Stop
            }
        };

        self.publish(events::CONNECTION, SocketEvent::Connection(update))?;
        Ok(flow)
    }

    async fn on_qr(&self, code: String) -> WaResult<Flow> {
        match self.config.pairing_mode {
            PairingMode::Qr => self.publish(events::QR, SocketEvent::Qr(code))?,
            PairingMode::Code => {
                if !self.pairing_requested.swap(true, Ordering::SeqCst) {
                    let number = self.config.phone_number.as_deref().unwrap_or_default();
                    match self.client.request_pairing_code(number).await {
                        Ok(pairing_code) => tracing::info!(code = %pairing_code, "pairing code"),
                        Err(err) => {
                            self.pairing_requested.store(false, Ordering::SeqCst);
                            return Err(err.into());
                        }
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn on_messages(&self, batch: Vec<RawMessage>) -> WaResult<Flow> {
        let mut first_error = None;
        for raw in batch {
            self.messages.insert(raw.key.id.clone(), raw.clone());
            let Some(message) = Message::from_raw(&raw) else {
                tracing::trace!(id = %raw.key.id, "skipping message without content");
                continue;
            };
            if let Err(err) = self.publish(events::MESSAGE, SocketEvent::Message(message)) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(Flow::Continue),
        }
    }

    fn publish(&self, event: &str, payload: SocketEvent) -> WaResult<()> {
        self.notifier.publish(event, &payload).map_err(WaError::Handler)
    }

    /// Sends a text message and remembers it for retry lookups.
    pub async fn send_text(&self, to: &Jid, text: &str) -> WaResult<RawMessage> {
        let sent = self.client.send_text(to, text).await?;
        self.messages.insert(sent.key.id.clone(), sent.clone());
        Ok(sent)
    }

    /// Group metadata, served from the cache while fresh.
    pub async fn group_metadata(&self, group: &Jid) -> WaResult<GroupMetadata> {
        if let Some(metadata) = self.groups.get(group) {
            return Ok(metadata);
        }
        let metadata = self.client.group_metadata(group).await?;
        self.groups.insert(group.clone(), metadata.clone());
        Ok(metadata)
    }

    /// A recently sent or received message, for resending on a retry receipt.
    pub fn recent_message(&self, id: &str) -> Option<RawMessage> {
        self.messages.get(&id.to_string())
    }

    pub async fn disconnect(&self) -> WaResult<()> {
        self.events.lock().take();
        self.client.disconnect().await?;
        *self.state.lock() = ConnectionState::Close;
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn notifier(&self) -> &Arc<SocketNotifier> {
        &self.notifier
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn group_cache(&self) -> &TtlCache<Jid, GroupMetadata> {
        &self.groups
    }

    pub fn message_cache(&self) -> &TtlCache<String, RawMessage> {
        &self.messages
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("state", &self.state())
            .field("groups", &self.groups)
            .field("messages", &self.messages)
            .finish()
    }
}
