//! The remote call surface
//!
//! Pulls are plain async request/response calls. Pushes arrive on a
//! [`Subscription`], which releases itself on the remote side when dropped.
//! Delivery is at-least-once and unordered relative to in-flight pulls.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

use crate::domain::{BannedClient, Coalition, Roster, ServerStatus, Settings};
use crate::error::RemoteError;
use crate::protocol::{Command, Topic};

#[async_trait]
pub trait RemoteFacade: Send + Sync {
    async fn fetch_status(&self) -> Result<ServerStatus, RemoteError>;

    async fn fetch_settings(&self) -> Result<Settings, RemoteError>;

    async fn fetch_roster(&self) -> Result<Roster, RemoteError>;

    async fn fetch_coalitions(&self) -> Result<Vec<Coalition>, RemoteError>;

    async fn fetch_bans(&self) -> Result<Vec<BannedClient>, RemoteError>;

    /// Registers a push handler for `topic`. Payloads are delivered raw; see
    /// [`crate::envelope::decode_payload`].
    fn subscribe(&self, topic: Topic) -> Result<Subscription, RemoteError>;

    async fn execute(&self, command: Command) -> Result<(), RemoteError>;
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Receiving end of one push subscription
///
/// The release hook runs exactly once, either on [`Subscription::unsubscribe`]
/// or when the guard is dropped, so every exit path of the owner releases
/// the registration.
pub struct Subscription {
    topic: Topic,
    receiver: mpsc::UnboundedReceiver<Value>,
    release: Option<ReleaseHook>,
}

impl Subscription {
    pub fn new(
        topic: Topic,
        receiver: mpsc::UnboundedReceiver<Value>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            topic,
            receiver,
            release: Some(Box::new(release)),
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Next raw payload, or `None` once the remote side closed the stream
    pub async fn recv(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("released", &self.release.is_none())
            .finish()
    }
}
