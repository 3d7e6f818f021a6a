//! Transient alert queue with set semantics on the notification id
//!
//! The first arrival of an id wins and later redeliveries are dropped, which
//! makes `enqueue` commutative and idempotent. `dismiss` and `expire_due`
//! remove by id and are no-ops for absent entries, so any interleaving of the
//! three is safe. Display order is computed on read, never stored.

use log::debug;
use srs_shared::Notification;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Lifetime of a notification measured from its arrival
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(8000);

#[derive(Debug, Clone, PartialEq)]
pub struct QueuedNotification {
    pub notification: Notification,
    pub received_at: Instant,
    /// Position in arrival order within the owning queue
    seq: u64,
}

impl QueuedNotification {
    pub fn id(&self) -> &str {
        &self.notification.id
    }
}

#[derive(Debug)]
pub struct NotificationQueue {
    entries: HashMap<String, QueuedNotification>,
    ttl: Duration,
    next_seq: u64,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            next_seq: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Inserts unless an entry with the same id is present. Returns whether
    /// the notification was inserted.
    pub fn enqueue(&mut self, notification: Notification, received_at: Instant) -> bool {
        if self.entries.contains_key(&notification.id) {
            debug!("Dropping duplicate notification {}", notification.id);
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            notification.id.clone(),
            QueuedNotification {
                notification,
                received_at,
                seq,
            },
        );
        true
    }

    /// Removes the entry with `id`. Returns false if there was none.
    pub fn dismiss(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Removes every entry with `received_at + ttl <= now`, returning their ids
    pub fn expire_due(&mut self, now: Instant) -> Vec<String> {
        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.received_at + ttl <= now)
            .map(|entry| entry.notification.id.clone())
            .collect();

        for id in &expired {
            self.entries.remove(id);
        }
        expired
    }

    /// Earliest instant at which `expire_due` will remove something
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .values()
            .map(|entry| entry.received_at + self.ttl)
            .min()
    }

    /// Entries most recent first. Equal arrival times put the later enqueue
    /// first.
    pub fn display_order(&self) -> Vec<&QueuedNotification> {
        let mut entries: Vec<&QueuedNotification> = self.entries.values().collect();
        entries.sort_by(|a, b| {
            b.received_at
                .cmp(&a.received_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        entries
    }

    pub fn get(&self, id: &str) -> Option<&QueuedNotification> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}
