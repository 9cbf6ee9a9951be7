//! Console bot: drives the shell with a fake client fed from stdin.
//!
//! Every line typed becomes an incoming text message. A line starting with
//! `group:` arrives in a group chat, `/qr` emits a QR payload and `/quit`
//! logs the session out.
//!
//! ```text
//! WA_LOG=debug cargo run --example console_bot
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use wa_shell::whatsapp::client::outgoing_text;
use wa_shell::whatsapp::socket::events;
use wa_shell::whatsapp::{
    bootstrap, services, App, ClientError, ClientEvent, ClientEvents, ConnectionUpdate, DisconnectReason,
    GroupMetadata, Jid, MessageContent, MessageKey, RawMessage, SocketEvent, WaClient,
};
use wa_shell::{AppConfig, ConfigProvider};

const SELF_CHAT: &str = "15550000000@s.whatsapp.net";
const GROUP_CHAT: &str = "120363000000000000@g.us";

struct ConsoleClient {
    next_id: AtomicU64,
}

impl ConsoleClient {
    fn message(&self, chat: &str, text: &str) -> RawMessage {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        RawMessage {
            key: MessageKey {
                remote_jid: Jid::new(chat),
                from_me: false,
                id: format!("CONSOLE{}", id),
                participant: Jid::new(chat).is_group().then(|| Jid::new(SELF_CHAT)),
            },
            push_name: Some("console".to_string()),
            timestamp: chrono::Utc::now().timestamp(),
            content: Some(MessageContent::Text { text: text.to_string() }),
        }
    }
}

#[async_trait]
impl WaClient for ConsoleClient {
    async fn connect(&self) -> Result<ClientEvents, ClientError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(ClientEvent::Connection(ConnectionUpdate::open()));

        let client = ConsoleClient {
            next_id: AtomicU64::new(self.next_id.load(Ordering::Relaxed)),
        };
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                let event = match line {
                    "" => continue,
                    "/quit" => ClientEvent::Connection(ConnectionUpdate::closed(DisconnectReason::LoggedOut)),
                    "/qr" => ClientEvent::Qr("2@console-demo".to_string()),
                    _ => match line.strip_prefix("group:") {
                        Some(text) => ClientEvent::Messages(vec![client.message(GROUP_CHAT, text.trim())]),
                        None => ClientEvent::Messages(vec![client.message(SELF_CHAT, line)]),
                    },
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn request_pairing_code(&self, _phone_number: &str) -> Result<String, ClientError> {
        Ok("CNSL-DEMO".to_string())
    }

    async fn send_text(&self, to: &Jid, text: &str) -> Result<RawMessage, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(outgoing_text(to, format!("CONSOLE{}", id), text))
    }

    async fn group_metadata(&self, group: &Jid) -> Result<GroupMetadata, ClientError> {
        Ok(GroupMetadata {
            id: group.clone(),
            subject: "Console group".to_string(),
            participants: vec![Jid::new(SELF_CHAT)],
        })
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_provider(&ConfigProvider::from_env())?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log)?)
        .init();

    let client = Arc::new(ConsoleClient {
        next_id: AtomicU64::new(1),
    });
    let registry = bootstrap::build_application(config, client).await?;
    let app = registry.resolve_required::<App>(services::APP)?;

    app.socket().notifier().subscribe(events::QR, |event: &SocketEvent| {
        if let SocketEvent::Qr(code) = event {
            println!("scan this QR payload: {}", code);
        }
        Ok(())
    });

    let group = app.socket().group_metadata(&Jid::new(GROUP_CHAT)).await?;
    tracing::info!(subject = %group.subject, "joined");
    println!("type a message, `group: <text>`, `/qr` or `/quit`");

    app.run().await?;
    tracing::info!(handled = app.handled(), "session ended");
    Ok(())
}
