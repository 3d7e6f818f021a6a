use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Coalition, FrequencySettings, Notification, ServerSettings};

/// Push topics, one per domain plus the generic notification topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    Status,
    Settings,
    Roster,
    Coalitions,
    Bans,
    Notification,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Status,
        Topic::Settings,
        Topic::Roster,
        Topic::Coalitions,
        Topic::Bans,
        Topic::Notification,
    ];

    /// Event name used by the remote side
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Status => "admin/changed",
            Topic::Settings => "settings/changed",
            Topic::Roster => "clients/changed",
            Topic::Coalitions => "settings/coalitions/changed",
            Topic::Bans => "clients/banned/changed",
            Topic::Notification => "notification",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands issued from the admin surface. Results are never returned
/// directly; they show up later as push events or on the next pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    StartServer,
    StopServer,
    Kick { client_id: String, reason: String },
    Ban { client_id: String, reason: String },
    Unban { id: String },
    Mute { client_id: String },
    Unmute { client_id: String },
    AddCoalition(Coalition),
    UpdateCoalition(Coalition),
    RemoveCoalition(Coalition),
    SaveSettings(ServerSettings),
    SaveFrequencies(FrequencySettings),
    Notify(Notification),
}

impl Command {
    /// Short label used when reporting a failed command
    pub fn describe(&self) -> String {
        match self {
            Command::StartServer => "Start server".to_string(),
            Command::StopServer => "Stop server".to_string(),
            Command::Kick { client_id, .. } => format!("Kick client {}", client_id),
            Command::Ban { client_id, .. } => format!("Ban client {}", client_id),
            Command::Unban { id } => format!("Unban client {}", id),
            Command::Mute { client_id } => format!("Mute client {}", client_id),
            Command::Unmute { client_id } => format!("Unmute client {}", client_id),
            Command::AddCoalition(c) => format!("Add coalition {}", c.name),
            Command::UpdateCoalition(c) => format!("Update coalition {}", c.name),
            Command::RemoveCoalition(c) => format!("Remove coalition {}", c.name),
            Command::SaveSettings(_) => "Save server settings".to_string(),
            Command::SaveFrequencies(_) => "Save frequencies".to_string(),
            Command::Notify(_) => "Send notification".to_string(),
        }
    }
}
