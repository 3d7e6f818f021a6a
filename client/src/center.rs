//! Notification center: the task that owns the [`NotificationQueue`]
//!
//! Notifications reach it from three places: the remote `notification`
//! topic, local [`Notifier`] handles (failed pulls and commands, field
//! validation), and dismiss clicks. The task wakes at the earliest expiry
//! deadline, so each entry disappears `ttl` after it arrived unless it was
//! dismissed first.

use log::{debug, info, warn};
use srs_shared::{decode_payload, Notification, RemoteFacade, Subscription, Topic};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::notifications::{NotificationQueue, QueuedNotification};

/// Messages accepted by the notification center
#[derive(Debug, Clone, PartialEq)]
pub enum CenterMessage {
    Enqueue(Notification),
    Dismiss(String),
    Shutdown,
}

/// Cloneable handle for raising local notifications
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<CenterMessage>,
}

impl Notifier {
    /// A notifier and the receiving end it feeds
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CenterMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, notification: Notification) {
        if self.tx.send(CenterMessage::Enqueue(notification)).is_err() {
            debug!("Notification center is gone, dropping notification");
        }
    }

    pub fn dismiss(&self, id: impl Into<String>) {
        let _ = self.tx.send(CenterMessage::Dismiss(id.into()));
    }

    fn shutdown(&self) {
        let _ = self.tx.send(CenterMessage::Shutdown);
    }
}

struct NotificationCenter {
    queue: NotificationQueue,
    subscription: Subscription,
    inbox: mpsc::UnboundedReceiver<CenterMessage>,
    display_tx: watch::Sender<Vec<QueuedNotification>>,
}

impl NotificationCenter {
    async fn run(mut self) {
        let mut push_open = true;

        loop {
            let deadline = self.queue.next_deadline();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                biased;

                message = self.inbox.recv() => match message {
                    Some(CenterMessage::Enqueue(notification)) => self.enqueue(notification),
                    Some(CenterMessage::Dismiss(id)) => {
                        if self.queue.dismiss(&id) {
                            self.publish();
                        }
                    }
                    Some(CenterMessage::Shutdown) | None => break,
                },

                payload = self.subscription.recv(), if push_open => match payload {
                    Some(payload) => match decode_payload::<Notification>(Topic::Notification, payload) {
                        Ok(notification) => self.enqueue(notification),
                        Err(e) => warn!("Ignoring notification push: {}", e),
                    },
                    None => {
                        warn!("Notification push stream closed");
                        push_open = false;
                    }
                },

                _ = sleep_until(wake_at), if deadline.is_some() => {
                    let expired = self.queue.expire_due(Instant::now());
                    if !expired.is_empty() {
                        debug!("Expired {} notification(s)", expired.len());
                        self.publish();
                    }
                },
            }
        }

        info!("Notification center stopped");
    }

    fn enqueue(&mut self, notification: Notification) {
        if self.queue.enqueue(notification, Instant::now()) {
            self.publish();
        }
    }

    fn publish(&self) {
        let entries = self.queue.display_order().into_iter().cloned().collect();
        self.display_tx.send_replace(entries);
    }
}

/// Subscribes to the notification topic and starts the center
pub fn mount_notifications(
    facade: Arc<dyn RemoteFacade>,
    config: &SyncConfig,
) -> Result<NotificationView, SyncError> {
    let subscription = facade
        .subscribe(Topic::Notification)
        .map_err(|source| SyncError::Subscribe {
            topic: Topic::Notification,
            source,
        })?;

    let (notifier, inbox) = Notifier::channel();
    let (display_tx, display_rx) = watch::channel(Vec::new());

    let center = NotificationCenter {
        queue: NotificationQueue::with_ttl(config.notification_ttl),
        subscription,
        inbox,
        display_tx,
    };
    let task = tokio::spawn(center.run());
    info!("Mounted notification center");

    Ok(NotificationView {
        notifier,
        display_rx,
        task: Some(task),
    })
}

/// The view side of the notification center
pub struct NotificationView {
    notifier: Notifier,
    display_rx: watch::Receiver<Vec<QueuedNotification>>,
    task: Option<JoinHandle<()>>,
}

impl NotificationView {
    /// Pending notifications, most recent first
    pub fn current(&self) -> Vec<QueuedNotification> {
        self.display_rx.borrow().clone()
    }

    pub async fn changed(&mut self) -> Result<(), SyncError> {
        self.display_rx
            .changed()
            .await
            .map_err(|_| SyncError::SessionClosed("notification"))
    }

    pub fn dismiss(&self, id: impl Into<String>) {
        self.notifier.dismiss(id);
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub async fn unmount(mut self) {
        self.notifier.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for NotificationView {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
