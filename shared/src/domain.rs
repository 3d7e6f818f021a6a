//! Snapshot types for each synchronized domain
//!
//! Every push and every pull delivers one of these as a whole value. There
//! are no deltas: a roster update carries the full roster, a coalition update
//! the full coalition list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// Run state of a single server component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceStatus {
    pub is_running: bool,
    pub error: String,
}

impl ServiceStatus {
    pub fn running() -> Self {
        Self {
            is_running: true,
            error: String::new(),
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_running: false,
            error: error.into(),
        }
    }
}

/// Status domain: the three components of the voice server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub http: ServiceStatus,
    pub voice: ServiceStatus,
    pub control: ServiceStatus,
}

impl ServerStatus {
    /// True if at least one component is running
    pub fn any_running(&self) -> bool {
        self.http.is_running || self.voice.is_running || self.control.is_running
    }

    /// Components reporting an error, as `(component, message)` pairs
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        [
            ("http", &self.http),
            ("voice", &self.voice),
            ("control", &self.control),
        ]
        .into_iter()
        .filter(|(_, status)| !status.error.is_empty())
        .map(|(name, status)| (name, status.error.as_str()))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSetting {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub http: ServerSetting,
    pub voice: ServerSetting,
    pub control: ServerSetting,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let local = |port| ServerSetting {
            host: "0.0.0.0".to_string(),
            port,
        };
        Self {
            http: local(8080),
            voice: local(5002),
            control: local(5003),
        }
    }
}

/// Which frequency list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyKind {
    Global,
    Test,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrequencySettings {
    pub global_frequencies: Vec<f64>,
    pub test_frequencies: Vec<f64>,
}

impl FrequencySettings {
    pub fn list(&self, kind: FrequencyKind) -> &[f64] {
        match kind {
            FrequencyKind::Global => &self.global_frequencies,
            FrequencyKind::Test => &self.test_frequencies,
        }
    }

    pub fn list_mut(&mut self, kind: FrequencyKind) -> &mut Vec<f64> {
        match kind {
            FrequencyKind::Global => &mut self.global_frequencies,
            FrequencyKind::Test => &mut self.test_frequencies,
        }
    }
}

/// Settings domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub servers: ServerSettings,
    pub frequencies: FrequencySettings,
}

/// A voice client as shown in the roster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientState {
    pub name: String,
    pub unit_id: String,
    pub coalition: String,
    pub muted: bool,
}

/// Roster domain, keyed by client id
pub type Roster = BTreeMap<String, ClientState>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coalition {
    pub name: String,
    pub description: String,
    pub color: String,
    pub password: String,
}

impl Coalition {
    /// Every field is mandatory; reports the first empty one
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("Name", &self.name),
            ("Description", &self.description),
            ("Color", &self.color),
            ("Password", &self.password),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannedClient {
    pub id: String,
    pub name: String,
    pub ip_address: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient alert. `id` identifies one alert instance; redeliveries of
/// the same alert carry the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub level: Level,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, level: Level) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            level,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Level::Info)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Level::Success)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Level::Warning)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, Level::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_running() {
        let mut status = ServerStatus::default();
        assert!(!status.any_running());

        status.voice = ServiceStatus::running();
        assert!(status.any_running());
    }

    #[test]
    fn test_status_errors() {
        let status = ServerStatus {
            http: ServiceStatus::running(),
            voice: ServiceStatus::failed("port in use"),
            control: ServiceStatus::stopped(),
        };

        assert_eq!(status.errors(), vec![("voice", "port in use")]);
    }

    #[test]
    fn test_service_status_wire_names() {
        let json = serde_json::to_value(ServiceStatus::failed("boom")).unwrap();
        assert_eq!(json["IsRunning"], false);
        assert_eq!(json["Error"], "boom");
    }

    #[test]
    fn test_coalition_validation() {
        let mut coalition = Coalition {
            name: "Blue".to_string(),
            description: "NATO".to_string(),
            color: "#0000ff".to_string(),
            password: "blue".to_string(),
        };
        assert!(coalition.validate().is_ok());

        coalition.color = "  ".to_string();
        assert_eq!(
            coalition.validate(),
            Err(ValidationError::MissingField("Color"))
        );
    }

    #[test]
    fn test_notification_ids_are_unique() {
        let first = Notification::info("Saved", "Settings saved");
        let second = Notification::info("Saved", "Settings saved");
        assert_ne!(first.id, second.id);
        assert_eq!(first.level, Level::Info);
    }

    #[test]
    fn test_level_wire_names() {
        let json = serde_json::to_value(Level::Warning).unwrap();
        assert_eq!(json, "warning");
    }

    #[test]
    fn test_frequency_lists_by_kind() {
        let mut settings = FrequencySettings::default();
        settings.list_mut(FrequencyKind::Test).push(251.0);

        assert!(settings.list(FrequencyKind::Global).is_empty());
        assert_eq!(settings.list(FrequencyKind::Test), &[251.0]);
    }
}
