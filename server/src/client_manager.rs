//! Connected voice client management for the reference admin service
//!
//! This module tracks the voice clients currently attached to the server:
//! - Client connection lifecycle (connect, kick, ban)
//! - Client capacity management and id assignment
//! - Per-client mute state as shown in the admin roster
//!
//! The roster handed to the admin surface is always a full snapshot built
//! from this manager, never a delta.

use log::info;
use srs_shared::{ClientState, Roster};
use std::collections::HashMap;

/// A connected voice client
#[derive(Debug, Clone)]
pub struct VoiceClient {
    /// Unique client identifier assigned by the server
    pub id: String,
    /// What the admin roster shows for this client
    pub state: ClientState,
}

impl VoiceClient {
    pub fn new(id: String, state: ClientState) -> Self {
        Self { id, state }
    }
}

/// Manages all connected voice clients
///
/// Enforces the capacity limit and hands out ids that are never reused
/// within the lifetime of the manager, so a kicked or banned client that
/// reconnects shows up as a new roster entry.
#[derive(Debug)]
pub struct ClientManager {
    clients: HashMap<String, VoiceClient>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty roster with the given capacity. Ids start from 1.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to attach a new client
    ///
    /// Returns the assigned id, or `None` if the server is at capacity.
    pub fn add_client(&mut self, state: ClientState) -> Option<String> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id.to_string();
        self.next_client_id += 1;

        info!("Client {} ({}) connected", client_id, state.name);
        self.clients
            .insert(client_id.clone(), VoiceClient::new(client_id.clone(), state));
        Some(client_id)
    }

    /// Detaches a client, returning it if it was connected
    pub fn remove_client(&mut self, client_id: &str) -> Option<VoiceClient> {
        let client = self.clients.remove(client_id)?;
        info!("Client {} disconnected", client.id);
        Some(client)
    }

    pub fn get(&self, client_id: &str) -> Option<&VoiceClient> {
        self.clients.get(client_id)
    }

    /// Sets the mute flag. Returns false if the client is unknown.
    pub fn set_muted(&mut self, client_id: &str, muted: bool) -> bool {
        match self.clients.get_mut(client_id) {
            Some(client) => {
                client.state.muted = muted;
                true
            }
            None => false,
        }
    }

    /// Full roster as delivered to the admin surface
    pub fn snapshot(&self) -> Roster {
        self.clients
            .iter()
            .map(|(id, client)| (id.clone(), client.state.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
