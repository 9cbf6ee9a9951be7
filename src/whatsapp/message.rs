//! Message value objects.
//!
//! [`RawMessage`] is what the client delivers; [`Message`] is the normalized
//! view handed to event handlers, with the sender and receiver split out.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const GROUP_SUFFIX: &str = "@g.us";
const USER_SUFFIX: &str = "@s.whatsapp.net";

/// WhatsApp address: `<user>@<server>`, with an optional `:device` suffix on
/// the user part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jid(String);

impl Jid {
    pub fn new(raw: impl Into<String>) -> Self {
        Jid(raw.into())
    }

    /// Personal chat address for a phone number.
    pub fn user(phone_number: &str) -> Self {
        Jid(format!("{}{}", phone_number.trim_start_matches('+'), USER_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_group(&self) -> bool {
        self.0.ends_with(GROUP_SUFFIX)
    }

    /// User part without the device suffix.
    pub fn user_part(&self) -> &str {
        let user = self.0.split('@').next().unwrap_or_default();
        user.split(':').next().unwrap_or(user)
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Jid {
    fn from(raw: &str) -> Self {
        Jid::new(raw)
    }
}

/// Identity of one message within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    pub remote_jid: Jid,
    pub from_me: bool,
    pub id: String,
    /// Author within a group chat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Jid>,
}

/// Payload of a message, one variant per supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    ExtendedText {
        text: String,
        #[serde(default)]
        matched_text: Option<String>,
    },
    Image {
        #[serde(default)]
        caption: Option<String>,
        mimetype: String,
    },
    Video {
        #[serde(default)]
        caption: Option<String>,
        mimetype: String,
        #[serde(default)]
        seconds: u32,
    },
    Audio {
        mimetype: String,
        #[serde(default)]
        seconds: u32,
        #[serde(default)]
        voice_note: bool,
    },
    Document {
        #[serde(default)]
        caption: Option<String>,
        file_name: String,
        mimetype: String,
    },
    Sticker {
        mimetype: String,
    },
    Reaction {
        target: MessageKey,
        emoji: String,
    },
    /// A kind this shell does not interpret
    Unknown {
        kind: String,
    },
}

impl MessageContent {
    /// Text body, or the caption for media.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } | MessageContent::ExtendedText { text, .. } => Some(text),
            MessageContent::Image { caption, .. }
            | MessageContent::Video { caption, .. }
            | MessageContent::Document { caption, .. } => caption.as_deref(),
            _ => None,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &str {
        match self {
            MessageContent::Text { .. } => "text",
            MessageContent::ExtendedText { .. } => "extended_text",
            MessageContent::Image { .. } => "image",
            MessageContent::Video { .. } => "video",
            MessageContent::Audio { .. } => "audio",
            MessageContent::Document { .. } => "document",
            MessageContent::Sticker { .. } => "sticker",
            MessageContent::Reaction { .. } => "reaction",
            MessageContent::Unknown { kind } => kind,
        }
    }
}

/// A message as delivered by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub key: MessageKey,
    #[serde(default)]
    pub push_name: Option<String>,
    /// Unix seconds
    pub timestamp: i64,
    /// Absent for protocol-only messages (receipts, key distribution)
    #[serde(default)]
    pub content: Option<MessageContent>,
}

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub jid: Jid,
    pub push_name: Option<String>,
    pub from_me: bool,
}

/// The chat a message was posted to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receiver {
    pub jid: Jid,
    pub is_group: bool,
}

/// Normalized incoming message.
///
/// # Examples
///
/// ```
/// use wa_shell::whatsapp::{Jid, Message, MessageContent, MessageKey, RawMessage};
///
/// let raw = RawMessage {
///     key: MessageKey {
///         remote_jid: Jid::new("1203630@g.us"),
///         from_me: false,
///         id: "3EB0".into(),
///         participant: Some(Jid::new("15551234567@s.whatsapp.net")),
///     },
///     push_name: Some("Ana".into()),
///     timestamp: 1_700_000_000,
///     content: Some(MessageContent::Text { text: "hi".into() }),
/// };
///
/// let message = Message::from_raw(&raw).unwrap();
/// assert!(message.receiver.is_group);
/// assert_eq!(message.sender.jid.user_part(), "15551234567");
/// assert_eq!(message.text(), Some("hi"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub receiver: Receiver,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Normalizes a raw message. Returns `None` for messages without content.
    pub fn from_raw(raw: &RawMessage) -> Option<Self> {
        let content = raw.content.clone()?;
        let chat = raw.key.remote_jid.clone();
        let author = raw.key.participant.clone().unwrap_or_else(|| chat.clone());

        Some(Message {
            id: raw.key.id.clone(),
            sender: Sender {
                jid: author,
                push_name: raw.push_name.clone(),
                from_me: raw.key.from_me,
            },
            receiver: Receiver {
                is_group: chat.is_group(),
                jid: chat,
            },
            content,
            timestamp: Utc.timestamp_opt(raw.timestamp, 0).single().unwrap_or_default(),
        })
    }

    /// Text body or media caption.
    pub fn text(&self) -> Option<&str> {
        self.content.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(remote: &str, content: Option<MessageContent>) -> RawMessage {
        RawMessage {
            key: MessageKey {
                remote_jid: Jid::new(remote),
                from_me: false,
                id: "ABC".into(),
                participant: None,
            },
            push_name: None,
            timestamp: 1_700_000_000,
            content,
        }
    }

    #[test]
    fn test_jid_parts() {
        let jid = Jid::new("15551234567:12@s.whatsapp.net");
        assert_eq!(jid.user_part(), "15551234567");
        assert!(!jid.is_group());
        assert!(Jid::new("1203630-99@g.us").is_group());
        assert_eq!(Jid::user("+4912345").as_str(), "4912345@s.whatsapp.net");
    }

    #[test]
    fn test_direct_message_sender_is_chat() {
        let message = Message::from_raw(&raw("4912345@s.whatsapp.net", Some(MessageContent::Text { text: "yo".into() })))
            .unwrap();
        assert_eq!(message.sender.jid, message.receiver.jid);
        assert!(!message.receiver.is_group);
        assert_eq!(message.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_caption_and_missing_text() {
        let image = MessageContent::Image {
            caption: Some("look".into()),
            mimetype: "image/jpeg".into(),
        };
        assert_eq!(image.text(), Some("look"));
        assert_eq!(MessageContent::Sticker { mimetype: "image/webp".into() }.text(), None);
        assert_eq!(MessageContent::Unknown { kind: "poll".into() }.kind(), "poll");
    }

    #[test]
    fn test_protocol_message_is_skipped() {
        assert!(Message::from_raw(&raw("4912345@s.whatsapp.net", None)).is_none());
    }

    #[test]
    fn test_raw_message_from_json() {
        let raw: RawMessage = serde_json::from_str(
            r#"{
                "key": {"remote_jid": "4912345@s.whatsapp.net", "from_me": true, "id": "X1"},
                "timestamp": 1700000000,
                "content": {"type": "extended_text", "text": "see https://example.org"}
            }"#,
        )
        .unwrap();
        assert!(raw.key.from_me);
        assert_eq!(raw.content.unwrap().text(), Some("see https://example.org"));
    }
}
