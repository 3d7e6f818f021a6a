//! Authoritative admin state held by the reference service

use srs_shared::{BannedClient, Coalition, FrequencySettings, ServerStatus, ServiceStatus, Settings};

use crate::client_manager::ClientManager;

/// Default number of voice clients the service accepts
pub const DEFAULT_MAX_CLIENTS: usize = 64;

#[derive(Debug)]
pub struct AdminState {
    pub status: ServerStatus,
    pub settings: Settings,
    pub coalitions: Vec<Coalition>,
    pub bans: Vec<BannedClient>,
    pub clients: ClientManager,
}

impl AdminState {
    pub fn new(max_clients: usize) -> Self {
        Self {
            status: ServerStatus::default(),
            settings: Settings::default(),
            coalitions: Vec::new(),
            bans: Vec::new(),
            clients: ClientManager::new(max_clients),
        }
    }

    /// A state with two coalitions and the usual radio frequencies, handy for
    /// demos and tests
    pub fn seeded(max_clients: usize) -> Self {
        let mut state = Self::new(max_clients);
        state.coalitions = vec![
            Coalition {
                name: "Blue".to_string(),
                description: "Blue coalition".to_string(),
                color: "#0000ff".to_string(),
                password: "blue".to_string(),
            },
            Coalition {
                name: "Red".to_string(),
                description: "Red coalition".to_string(),
                color: "#ff0000".to_string(),
                password: "red".to_string(),
            },
        ];
        state.settings.frequencies = FrequencySettings {
            global_frequencies: vec![243.0, 121.5],
            test_frequencies: vec![100.0],
        };
        state
    }

    pub fn set_all_services(&mut self, running: bool) {
        let service = if running {
            ServiceStatus::running()
        } else {
            ServiceStatus::stopped()
        };
        self.status = ServerStatus {
            http: service.clone(),
            voice: service.clone(),
            control: service,
        };
    }

    /// Removes the ban with `id`, returning it if there was one
    pub fn remove_ban(&mut self, id: &str) -> Option<BannedClient> {
        let index = self.bans.iter().position(|ban| ban.id == id)?;
        Some(self.bans.remove(index))
    }

    /// Replaces the coalition with the same name. Returns false if none matched.
    pub fn update_coalition(&mut self, coalition: Coalition) -> bool {
        match self.coalitions.iter_mut().find(|c| c.name == coalition.name) {
            Some(existing) => {
                *existing = coalition;
                true
            }
            None => false,
        }
    }

    pub fn remove_coalition(&mut self, coalition: &Coalition) -> bool {
        let before = self.coalitions.len();
        self.coalitions.retain(|c| c != coalition);
        self.coalitions.len() != before
    }
}

impl Default for AdminState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CLIENTS)
    }
}
