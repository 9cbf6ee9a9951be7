//! The application service: a single logging handler for incoming messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::WaResult;
use super::message::Message;
use super::socket::{events, Socket, SocketEvent};
use crate::notifier::SubscriptionId;

pub struct App {
    socket: Arc<Socket>,
    subscription: Mutex<Option<SubscriptionId>>,
    handled: Arc<AtomicU64>,
}

impl App {
    /// Creates the app and subscribes its handler to `"message"`.
    pub fn new(socket: Arc<Socket>) -> Self {
        let app = Self {
            socket,
            subscription: Mutex::new(None),
            handled: Arc::new(AtomicU64::new(0)),
        };
        app.start();
        app
    }

    /// Subscribes the message handler unless it already is.
    pub fn start(&self) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return;
        }

        let handled = self.handled.clone();
        let id = self.socket.notifier().subscribe(events::MESSAGE, move |event: &SocketEvent| {
            if let SocketEvent::Message(message) = event {
                log_message(message);
                handled.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        });
        *subscription = Some(id);
    }

    /// Runs the socket's event loop until the session ends.
    pub async fn run(&self) -> WaResult<()> {
        self.start();
        self.socket.run().await
    }

    /// Unsubscribes the handler. Returns false if it was not subscribed.
    pub fn stop(&self) -> bool {
        match self.subscription.lock().take() {
            Some(id) => self.socket.notifier().unsubscribe(events::MESSAGE, id),
            None => false,
        }
    }

    /// Number of messages the handler has seen.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn socket(&self) -> &Arc<Socket> {
        &self.socket
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop();
    }
}

fn log_message(message: &Message) {
    tracing::info!(
        id = %message.id,
        from = %message.sender.jid,
        name = message.sender.push_name.as_deref().unwrap_or("-"),
        chat = %message.receiver.jid,
        group = message.receiver.is_group,
        kind = message.content.kind(),
        text = message.text().unwrap_or_default(),
        "message received"
    );
}
