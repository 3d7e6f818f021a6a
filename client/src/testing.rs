//! Scriptable in-memory facade for unit tests

use async_trait::async_trait;
use serde_json::Value;
use srs_shared::{
    BannedClient, Coalition, Command, RemoteError, RemoteFacade, Roster, ServerStatus, Settings,
    Subscription, Topic,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

type Registry = Arc<Mutex<HashMap<Topic, Vec<(u64, mpsc::UnboundedSender<Value>)>>>>;

pub struct FakeFacade {
    subscribers: Registry,
    next_subscriber: AtomicU64,
    status: Mutex<Result<ServerStatus, RemoteError>>,
    roster: Mutex<Roster>,
    fetch_delay: Mutex<Duration>,
    status_fetches: AtomicUsize,
    executed: Mutex<Vec<Command>>,
    execute_error: Mutex<Option<RemoteError>>,
    refused_topic: Mutex<Option<Topic>>,
}

impl Default for FakeFacade {
    fn default() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber: AtomicU64::new(0),
            status: Mutex::new(Ok(ServerStatus::default())),
            roster: Mutex::new(Roster::new()),
            fetch_delay: Mutex::new(Duration::ZERO),
            status_fetches: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
            execute_error: Mutex::new(None),
            refused_topic: Mutex::new(None),
        }
    }
}

impl FakeFacade {
    pub fn push(&self, topic: Topic, payload: Value) {
        let subscribers = self.subscribers.lock().unwrap();
        for (_, tx) in subscribers.get(&topic).into_iter().flatten() {
            let _ = tx.send(payload.clone());
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .get(&topic)
            .map_or(0, |entries| entries.len())
    }

    pub fn set_status(&self, status: Result<ServerStatus, RemoteError>) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_roster(&self, roster: Roster) {
        *self.roster.lock().unwrap() = roster;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn status_fetches(&self) -> usize {
        self.status_fetches.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<Command> {
        self.executed.lock().unwrap().clone()
    }

    pub fn fail_execute(&self, error: RemoteError) {
        *self.execute_error.lock().unwrap() = Some(error);
    }

    pub fn refuse_subscribe(&self, topic: Topic) {
        *self.refused_topic.lock().unwrap() = Some(topic);
    }

    async fn delay(&self) {
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl RemoteFacade for FakeFacade {
    async fn fetch_status(&self) -> Result<ServerStatus, RemoteError> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        let result = self.status.lock().unwrap().clone();
        self.delay().await;
        result
    }

    async fn fetch_settings(&self) -> Result<Settings, RemoteError> {
        self.delay().await;
        Ok(Settings::default())
    }

    async fn fetch_roster(&self) -> Result<Roster, RemoteError> {
        let roster = self.roster.lock().unwrap().clone();
        self.delay().await;
        Ok(roster)
    }

    async fn fetch_coalitions(&self) -> Result<Vec<Coalition>, RemoteError> {
        self.delay().await;
        Ok(Vec::new())
    }

    async fn fetch_bans(&self) -> Result<Vec<BannedClient>, RemoteError> {
        self.delay().await;
        Ok(Vec::new())
    }

    fn subscribe(&self, topic: Topic) -> Result<Subscription, RemoteError> {
        if *self.refused_topic.lock().unwrap() == Some(topic) {
            return Err(RemoteError::Unavailable(format!("{} refused", topic)));
        }

        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .entry(topic)
            .or_default()
            .push((id, tx));

        let registry = Arc::clone(&self.subscribers);
        Ok(Subscription::new(topic, rx, move || {
            if let Ok(mut subscribers) = registry.lock() {
                if let Some(entries) = subscribers.get_mut(&topic) {
                    entries.retain(|(entry, _)| *entry != id);
                }
            }
        }))
    }

    async fn execute(&self, command: Command) -> Result<(), RemoteError> {
        self.executed.lock().unwrap().push(command);
        let error = self.execute_error.lock().unwrap().clone();
        match error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
