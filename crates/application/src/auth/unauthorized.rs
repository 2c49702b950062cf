//! Process-wide "session is gone" notification.
//!
//! Fired when a request hits 401 and the session cannot be renewed. There is
//! no payload and no replay: a listener registered after an emission never
//! sees it. Listeners come in two flavours, synchronous callbacks
//! ([`UnauthorizedChannel::subscribe`]) and async receivers
//! ([`UnauthorizedChannel::listen`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// The notification itself. Carries nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnauthorizedSignal;

type Callback = Arc<dyn Fn() + Send + Sync>;

const BROADCAST_CAPACITY: usize = 16;

struct ChannelInner {
    callbacks: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<UnauthorizedSignal>,
}

impl ChannelInner {
    fn unregister(&self, id: u64) {
        self.callbacks.lock().retain(|(entry, _)| *entry != id);
    }
}

/// Broadcast channel for the unauthorized signal.
///
/// Clones share the same listener set.
#[derive(Clone)]
pub struct UnauthorizedChannel {
    inner: Arc<ChannelInner>,
}

impl fmt::Debug for UnauthorizedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnauthorizedChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Default for UnauthorizedChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl UnauthorizedChannel {
    /// Creates a channel with no listeners.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(ChannelInner {
                callbacks: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                sender,
            }),
        }
    }

    /// Registers a callback invoked synchronously on every emission.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// removed or dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            channel: Arc::downgrade(&self.inner),
        }
    }

    /// Returns an async receiver for future emissions.
    #[must_use]
    pub fn listen(&self) -> UnauthorizedListener {
        UnauthorizedListener {
            receiver: self.inner.sender.subscribe(),
        }
    }

    /// Notifies every current listener.
    ///
    /// Callbacks run on the emitting task, outside the registry lock, so a
    /// callback may subscribe or unsubscribe without deadlocking.
    pub fn emit(&self) {
        let callbacks: Vec<Callback> = self
            .inner
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        tracing::info!(listeners = callbacks.len(), "session unauthorized");
        for callback in callbacks {
            callback();
        }
        // No receivers is fine.
        let _ = self.inner.sender.send(UnauthorizedSignal);
    }

    /// Number of registered listeners of both kinds.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.callbacks.lock().len() + self.inner.sender.receiver_count()
    }
}

/// Handle to a registered callback.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription {
    id: u64,
    channel: Weak<ChannelInner>,
}

impl Subscription {
    /// Unregisters the callback.
    pub fn remove(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.unregister(self.id);
        }
    }
}

/// Async receiver of unauthorized signals.
#[derive(Debug)]
pub struct UnauthorizedListener {
    receiver: broadcast::Receiver<UnauthorizedSignal>,
}

impl UnauthorizedListener {
    /// Waits for the next emission.
    ///
    /// Returns `None` once the channel is gone. Signals missed while the
    /// listener lagged collapse into one, since the signal carries nothing.
    pub async fn recv(&mut self) -> Option<UnauthorizedSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Some(signal),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
