//! WhatsApp application shell.
//!
//! Everything protocol related sits behind [`WaClient`]; this module only
//! wires a session into the registry, caches what the session reports and
//! hands normalized messages to the app's handler.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wa_shell::whatsapp::{bootstrap, services, App, WaClient};
//!
//! # async fn run(client: Arc<dyn WaClient>) -> Result<(), wa_shell::whatsapp::WaError> {
//! let registry = bootstrap::build_from_env(client).await?;
//! let app = registry.resolve_required::<App>(services::APP)?;
//! app.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod bootstrap;
pub mod client;
pub mod error;
pub mod message;
pub mod socket;

pub use app::App;
pub use client::{
    ClientError, ClientEvent, ClientEvents, ConnectionState, ConnectionUpdate, DisconnectReason, GroupMetadata,
    WaClient,
};
pub use error::{WaError, WaResult};
pub use message::{Jid, Message, MessageContent, MessageKey, RawMessage, Receiver, Sender};
pub use socket::{Flow, Socket, SocketEvent, SocketNotifier};

/// Registry names of the shell's services.
pub mod services {
    /// [`AppConfig`](crate::AppConfig)
    pub const CONFIG: &str = "config";
    /// `Arc<dyn WaClient>`
    pub const CLIENT: &str = "client";
    /// [`SocketNotifier`](super::SocketNotifier)
    pub const NOTIFIER: &str = "notifier";
    /// [`Socket`](super::Socket)
    pub const SOCKET: &str = "socket";
    /// [`App`](super::App)
    pub const APP: &str = "app";
}
