//! The WhatsApp client capability.
//!
//! The shell never speaks the protocol itself. An adapter around a real
//! client library implements [`WaClient`] and delivers [`ClientEvent`]s over a
//! channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use super::message::{Jid, MessageKey, RawMessage};

/// Errors reported by a client adapter.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Close,
}

/// Why the server closed the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// Credentials were revoked; reconnecting cannot succeed
    LoggedOut,
    ConnectionLost,
    ConnectionReplaced,
    TimedOut,
    RestartRequired,
    /// Any other status code
    Other(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionUpdate {
    pub state: ConnectionState,
    #[serde(default)]
    pub reason: Option<DisconnectReason>,
}

impl ConnectionUpdate {
    pub fn open() -> Self {
        Self {
            state: ConnectionState::Open,
            reason: None,
        }
    }

    pub fn closed(reason: DisconnectReason) -> Self {
        Self {
            state: ConnectionState::Close,
            reason: Some(reason),
        }
    }

    pub fn is_logged_out(&self) -> bool {
        self.reason == Some(DisconnectReason::LoggedOut)
    }
}

/// Group subject and membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadata {
    pub id: Jid,
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<Jid>,
}

/// Events delivered by a client adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connection(ConnectionUpdate),
    /// A QR payload to render for device linking
    Qr(String),
    Messages(Vec<RawMessage>),
    /// Groups whose metadata changed
    GroupsChanged(Vec<Jid>),
}

pub type ClientEvents = mpsc::UnboundedReceiver<ClientEvent>;

/// A connected WhatsApp session as seen by the shell.
#[async_trait]
pub trait WaClient: Send + Sync {
    /// Opens the session. Events for this session arrive on the returned
    /// channel, which closes when the session ends.
    async fn connect(&self) -> Result<ClientEvents, ClientError>;

    /// Requests an eight character pairing code for `phone_number`.
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, ClientError>;

    async fn send_text(&self, to: &Jid, text: &str) -> Result<RawMessage, ClientError>;

    async fn group_metadata(&self, group: &Jid) -> Result<GroupMetadata, ClientError>;

    async fn disconnect(&self) -> Result<(), ClientError>;
}

/// Message returned by [`WaClient::send_text`] implementations that do not
/// get an echo from the server.
pub fn outgoing_text(to: &Jid, id: impl Into<String>, text: &str) -> RawMessage {
    RawMessage {
        key: MessageKey {
            remote_jid: to.clone(),
            from_me: true,
            id: id.into(),
            participant: None,
        },
        push_name: None,
        timestamp: chrono::Utc::now().timestamp(),
        content: Some(super::message::MessageContent::Text { text: text.to_string() }),
    }
}
