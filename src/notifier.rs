//! Named publish/subscribe register.
//!
//! Handlers are grouped by event name and run synchronously, in subscription
//! order, on the publishing thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

type Handler<A> = Arc<dyn Fn(&A) -> anyhow::Result<()> + Send + Sync>;

/// Identifies one subscription for [`EventNotifier::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event register keyed by event name.
///
/// A handler error stops dispatch: later handlers for the same publish do not
/// run and the error is returned to the publisher. Handler panics unwind to the
/// publisher as well.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use wa_shell::EventNotifier;
///
/// let notifier = EventNotifier::<String>::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let s = seen.clone();
/// let id = notifier.subscribe("message", move |text: &String| {
///     s.lock().push(text.clone());
///     Ok(())
/// });
///
/// notifier.publish("message", &"hello".to_string()).unwrap();
/// notifier.unsubscribe("message", id);
/// notifier.publish("message", &"ignored".to_string()).unwrap();
///
/// assert_eq!(*seen.lock(), ["hello"]);
/// ```
pub struct EventNotifier<A> {
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, Handler<A>)>>>,
    next_id: AtomicU64,
}

impl<A> EventNotifier<A> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adds a handler for `event`, after any existing ones.
    pub fn subscribe<F>(&self, event: impl Into<String>, handler: F) -> SubscriptionId
    where
        F: Fn(&A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let event = event.into();
        tracing::trace!(event = %event, id = id.0, "subscribed");
        self.handlers
            .write()
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a subscription. Returns false if it was not registered under
    /// `event`.
    pub fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(event);
        }
        removed
    }

    /// Invokes the current handlers for `event` with `payload`.
    ///
    /// The handler list is copied before dispatch, so handlers may subscribe
    /// or unsubscribe without deadlocking; such changes apply to the next
    /// publish.
    pub fn publish(&self, event: &str, payload: &A) -> anyhow::Result<()> {
        let current: Vec<Handler<A>> = match self.handlers.read().get(event) {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return Ok(()),
        };

        for handler in current {
            handler(payload)?;
        }
        Ok(())
    }

    /// Number of handlers subscribed to `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Drops every subscription.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl<A> Default for EventNotifier<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventNotifier<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut events: Vec<_> = handlers.iter().map(|(name, list)| (name.clone(), list.len())).collect();
        events.sort();
        f.debug_struct("EventNotifier").field("events", &events).finish()
    }
}
