//! In-process admin service backing the console and the integration tests

use async_trait::async_trait;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use srs_shared::{
    BannedClient, ClientState, Coalition, Command, Notification, RemoteError, RemoteFacade,
    Roster, ServerStatus, Settings, Subscription, Topic,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::state::{AdminState, DEFAULT_MAX_CLIENTS};

/// Shape of emitted push payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeStyle {
    /// The bare domain value
    #[default]
    Raw,
    /// `{ "data": value }`
    Data,
    /// `[value]`
    Array,
}

impl EnvelopeStyle {
    pub fn wrap(self, value: Value) -> Value {
        match self {
            EnvelopeStyle::Raw => value,
            EnvelopeStyle::Data => serde_json::json!({ "data": value }),
            EnvelopeStyle::Array => Value::Array(vec![value]),
        }
    }
}

impl FromStr for EnvelopeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(EnvelopeStyle::Raw),
            "data" => Ok(EnvelopeStyle::Data),
            "array" => Ok(EnvelopeStyle::Array),
            other => Err(format!("unknown envelope style: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub max_clients: usize,
    /// Delay applied to every fetch and command
    pub fake_latency: Duration,
    pub envelope: EnvelopeStyle,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            fake_latency: Duration::ZERO,
            envelope: EnvelopeStyle::Raw,
        }
    }
}

type Registry = Arc<Mutex<HashMap<Topic, Vec<(u64, mpsc::UnboundedSender<Value>)>>>>;

/// Reference implementation of the remote admin side
///
/// Fetches snapshot the state when they are issued and return it after the
/// configured latency, the way a response already on the wire would.
pub struct AdminServer {
    state: RwLock<AdminState>,
    subscribers: Registry,
    next_subscriber: AtomicU64,
    fake_latency: Mutex<Duration>,
    envelope: Mutex<EnvelopeStyle>,
    available: AtomicBool,
}

impl AdminServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_state(AdminState::new(config.max_clients), config)
    }

    pub fn with_state(state: AdminState, config: ServerConfig) -> Self {
        info!(
            "Admin service ready (latency {:?}, envelope {:?})",
            config.fake_latency, config.envelope
        );
        Self {
            state: RwLock::new(state),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber: AtomicU64::new(1),
            fake_latency: Mutex::new(config.fake_latency),
            envelope: Mutex::new(config.envelope),
            available: AtomicBool::new(true),
        }
    }

    /// While unavailable, fetches, commands and new subscriptions fail.
    /// Existing subscriptions stay registered.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        info!("Admin service {}", if available { "available" } else { "unavailable" });
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn set_fake_latency(&self, latency: Duration) {
        *self.fake_latency.lock() = latency;
    }

    pub fn set_envelope(&self, envelope: EnvelopeStyle) {
        *self.envelope.lock() = envelope;
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers.lock().get(&topic).map_or(0, Vec::len)
    }

    /// Closes every push stream on `topic`
    pub fn drop_subscribers(&self, topic: Topic) {
        if let Some(entries) = self.subscribers.lock().remove(&topic) {
            warn!("Closed {} subscription(s) on {}", entries.len(), topic);
        }
    }

    /// Attaches a voice client and announces the new roster
    pub async fn connect_client(&self, client: ClientState) -> Option<String> {
        let mut state = self.state.write().await;
        let client_id = state.clients.add_client(client)?;
        self.emit(Topic::Roster, &state.clients.snapshot());
        Some(client_id)
    }

    /// Overrides the status, e.g. to report a component error
    pub async fn set_status(&self, status: ServerStatus) {
        let mut state = self.state.write().await;
        state.status = status;
        self.emit(Topic::Status, &state.status);
    }

    /// Reads the state without going through the facade
    pub async fn inspect<R>(&self, f: impl FnOnce(&AdminState) -> R) -> R {
        let state = self.state.read().await;
        f(&state)
    }

    /// Publishes `value` to every subscriber of `topic`, pruning closed streams
    pub fn emit<T: Serialize>(&self, topic: Topic, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => self.envelope.lock().wrap(payload),
            Err(e) => {
                error!("Failed to serialize {} payload: {}", topic, e);
                return;
            }
        };

        let mut subscribers = self.subscribers.lock();
        if let Some(entries) = subscribers.get_mut(&topic) {
            entries.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
            debug!("Emitted {} to {} subscriber(s)", topic, entries.len());
        }
    }

    pub fn announce(&self, notification: Notification) {
        self.emit(Topic::Notification, &notification);
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("admin service is unavailable".to_string()))
        }
    }

    async fn simulate_latency(&self) {
        let latency = *self.fake_latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    async fn snapshot<T>(&self, read: impl FnOnce(&AdminState) -> T) -> Result<T, RemoteError> {
        self.check_available()?;
        let value = {
            let state = self.state.read().await;
            read(&state)
        };
        self.simulate_latency().await;
        Ok(value)
    }

    fn apply(&self, state: &mut AdminState, command: Command) {
        match command {
            Command::StartServer => {
                state.set_all_services(true);
                self.emit(Topic::Status, &state.status);
                self.announce(Notification::success("Server started", "All services are running"));
            }
            Command::StopServer => {
                state.set_all_services(false);
                self.emit(Topic::Status, &state.status);
                self.announce(Notification::success("Server stopped", "All services are stopped"));
            }
            Command::Kick { client_id, reason } => match state.clients.remove_client(&client_id) {
                Some(_) => {
                    info!("Client {} kicked: {}", client_id, reason);
                    self.emit(Topic::Roster, &state.clients.snapshot());
                    self.announce(Notification::success("Kick succeeded", "Client kicked successfully"));
                }
                None => self.client_not_found("Kick failed", &client_id),
            },
            Command::Ban { client_id, reason } => match state.clients.remove_client(&client_id) {
                Some(client) => {
                    info!("Client {} banned: {}", client_id, reason);
                    state.bans.push(BannedClient {
                        id: client_id,
                        name: client.state.name,
                        ip_address: "0.0.0.0".to_string(),
                        reason,
                    });
                    self.emit(Topic::Roster, &state.clients.snapshot());
                    self.emit(Topic::Bans, &state.bans);
                    self.announce(Notification::success("Ban succeeded", "Client banned successfully"));
                }
                None => self.client_not_found("Ban failed", &client_id),
            },
            Command::Unban { id } => match state.remove_ban(&id) {
                Some(_) => {
                    info!("Client {} unbanned", id);
                    self.emit(Topic::Bans, &state.bans);
                    self.announce(Notification::success("Unban succeeded", "Client successfully unbanned"));
                }
                None => self.client_not_found("Unban failed", &id),
            },
            Command::Mute { client_id } => {
                if state.clients.set_muted(&client_id, true) {
                    info!("Client {} muted", client_id);
                    self.emit(Topic::Roster, &state.clients.snapshot());
                    self.announce(Notification::success("Mute succeeded", "Client muted successfully"));
                } else {
                    self.client_not_found("Mute failed", &client_id);
                }
            }
            Command::Unmute { client_id } => {
                if state.clients.set_muted(&client_id, false) {
                    info!("Client {} unmuted", client_id);
                    self.emit(Topic::Roster, &state.clients.snapshot());
                    self.announce(Notification::success("Unmute succeeded", "Client unmuted successfully"));
                } else {
                    self.client_not_found("Unmute failed", &client_id);
                }
            }
            Command::AddCoalition(coalition) => {
                let message = format!("Coalition {} added", coalition.name);
                state.coalitions.push(coalition);
                self.coalitions_changed(state, "Coalition added", message);
            }
            Command::UpdateCoalition(coalition) => {
                let name = coalition.name.clone();
                if state.update_coalition(coalition) {
                    self.coalitions_changed(state, "Coalition updated", format!("Coalition {} updated", name));
                } else {
                    warn!("No coalition named {}", name);
                    self.announce(Notification::error(
                        "Coalition update failed",
                        format!("Coalition {} not found", name),
                    ));
                }
            }
            Command::RemoveCoalition(coalition) => {
                if state.remove_coalition(&coalition) {
                    self.coalitions_changed(
                        state,
                        "Coalition removed",
                        format!("Coalition {} removed", coalition.name),
                    );
                }
            }
            Command::SaveSettings(servers) => {
                state.settings.servers = servers;
                self.emit(Topic::Settings, &state.settings);
                self.announce(Notification::info("Settings saved", "Server settings saved"));
            }
            Command::SaveFrequencies(frequencies) => {
                state.settings.frequencies = frequencies;
                self.emit(Topic::Settings, &state.settings);
                self.announce(Notification::info("Frequencies saved", "Frequency lists saved"));
            }
            Command::Notify(notification) => self.announce(notification),
        }
    }

    fn coalitions_changed(&self, state: &AdminState, title: &str, message: String) {
        self.emit(Topic::Coalitions, &state.coalitions);
        self.announce(Notification::info(title, message));
    }

    fn client_not_found(&self, title: &str, client_id: &str) {
        error!("{}: no client {}", title, client_id);
        self.announce(Notification::error(title, "Client not found"));
    }
}

impl Default for AdminServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

#[async_trait]
impl RemoteFacade for AdminServer {
    async fn fetch_status(&self) -> Result<ServerStatus, RemoteError> {
        self.snapshot(|state| state.status.clone()).await
    }

    async fn fetch_settings(&self) -> Result<Settings, RemoteError> {
        self.snapshot(|state| state.settings.clone()).await
    }

    async fn fetch_roster(&self) -> Result<Roster, RemoteError> {
        self.snapshot(|state| state.clients.snapshot()).await
    }

    async fn fetch_coalitions(&self) -> Result<Vec<Coalition>, RemoteError> {
        self.snapshot(|state| state.coalitions.clone()).await
    }

    async fn fetch_bans(&self) -> Result<Vec<BannedClient>, RemoteError> {
        self.snapshot(|state| state.bans.clone()).await
    }

    fn subscribe(&self, topic: Topic) -> Result<Subscription, RemoteError> {
        self.check_available()?;

        let id = self.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().entry(topic).or_default().push((id, tx));
        debug!("Subscriber {} registered on {}", id, topic);

        let registry = Arc::clone(&self.subscribers);
        Ok(Subscription::new(topic, rx, move || {
            if let Some(entries) = registry.lock().get_mut(&topic) {
                entries.retain(|(entry, _)| *entry != id);
            }
            debug!("Subscriber {} released {}", id, topic);
        }))
    }

    async fn execute(&self, command: Command) -> Result<(), RemoteError> {
        self.check_available()?;
        self.simulate_latency().await;

        debug!("Executing: {}", command.describe());
        let mut state = self.state.write().await;
        self.apply(&mut state, command);
        Ok(())
    }
}
