//! Fire-and-forget command dispatch
//!
//! Commands never touch a cache. Their effects come back as push events or
//! on the next pull; the only thing reported here is failure.

use log::{debug, warn};
use srs_shared::{
    Coalition, Command, FrequencySettings, Notification, RemoteFacade, ServerSettings,
    ServerStatus,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::center::Notifier;

#[derive(Clone)]
pub struct CommandDispatcher {
    facade: Arc<dyn RemoteFacade>,
    notifier: Notifier,
}

impl CommandDispatcher {
    pub fn new(facade: Arc<dyn RemoteFacade>, notifier: Notifier) -> Self {
        Self { facade, notifier }
    }

    /// Executes `command` on a spawned task. A failure raises an error
    /// notification titled after the command.
    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        let facade = Arc::clone(&self.facade);
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let label = command.describe();
            debug!("Dispatching: {}", label);
            if let Err(e) = facade.execute(command).await {
                warn!("{} failed: {}", label, e);
                notifier.notify(Notification::error(format!("{} failed", label), e.to_string()));
            }
        })
    }

    pub fn start_server(&self) -> JoinHandle<()> {
        self.dispatch(Command::StartServer)
    }

    pub fn stop_server(&self) -> JoinHandle<()> {
        self.dispatch(Command::StopServer)
    }

    /// Stops the server if any component is running, otherwise starts it
    pub fn toggle_server(&self, status: &ServerStatus) -> JoinHandle<()> {
        if status.any_running() {
            self.stop_server()
        } else {
            self.start_server()
        }
    }

    pub fn kick(&self, client_id: &str, reason: &str) -> Option<JoinHandle<()>> {
        self.require_client(client_id)?;
        self.require_reason(reason)?;
        Some(self.dispatch(Command::Kick {
            client_id: client_id.to_string(),
            reason: reason.trim().to_string(),
        }))
    }

    pub fn ban(&self, client_id: &str, reason: &str) -> Option<JoinHandle<()>> {
        self.require_client(client_id)?;
        self.require_reason(reason)?;
        Some(self.dispatch(Command::Ban {
            client_id: client_id.to_string(),
            reason: reason.trim().to_string(),
        }))
    }

    pub fn unban(&self, id: &str) -> Option<JoinHandle<()>> {
        self.require_client(id)?;
        Some(self.dispatch(Command::Unban { id: id.to_string() }))
    }

    pub fn mute(&self, client_id: &str) -> Option<JoinHandle<()>> {
        self.require_client(client_id)?;
        Some(self.dispatch(Command::Mute {
            client_id: client_id.to_string(),
        }))
    }

    pub fn unmute(&self, client_id: &str) -> Option<JoinHandle<()>> {
        self.require_client(client_id)?;
        Some(self.dispatch(Command::Unmute {
            client_id: client_id.to_string(),
        }))
    }

    pub fn add_coalition(&self, coalition: Coalition) -> Option<JoinHandle<()>> {
        self.require_valid(&coalition)?;
        Some(self.dispatch(Command::AddCoalition(coalition)))
    }

    pub fn update_coalition(&self, coalition: Coalition) -> Option<JoinHandle<()>> {
        self.require_valid(&coalition)?;
        Some(self.dispatch(Command::UpdateCoalition(coalition)))
    }

    pub fn remove_coalition(&self, coalition: Coalition) -> JoinHandle<()> {
        self.dispatch(Command::RemoveCoalition(coalition))
    }

    pub fn save_settings(&self, servers: ServerSettings) -> JoinHandle<()> {
        self.dispatch(Command::SaveSettings(servers))
    }

    pub fn save_frequencies(&self, frequencies: FrequencySettings) -> JoinHandle<()> {
        self.dispatch(Command::SaveFrequencies(frequencies))
    }

    /// Broadcasts a notification through the remote side
    pub fn notify(&self, notification: Notification) -> JoinHandle<()> {
        self.dispatch(Command::Notify(notification))
    }

    fn require_client(&self, client_id: &str) -> Option<()> {
        if client_id.trim().is_empty() {
            self.reject("No client selected", "Select a client first");
            return None;
        }
        Some(())
    }

    fn require_reason(&self, reason: &str) -> Option<()> {
        if reason.trim().is_empty() {
            self.reject("Reason required", "Enter a reason");
            return None;
        }
        Some(())
    }

    fn require_valid(&self, coalition: &Coalition) -> Option<()> {
        match coalition.validate() {
            Ok(()) => Some(()),
            Err(e) => {
                self.reject("Invalid coalition", &e.to_string());
                None
            }
        }
    }

    fn reject(&self, title: &str, message: &str) {
        debug!("Rejected locally: {} ({})", title, message);
        self.notifier.notify(Notification::error(title, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::center::CenterMessage;
    use crate::testing::FakeFacade;
    use srs_shared::{Level, RemoteError, ServiceStatus};
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio_test::assert_ok;

    fn dispatcher() -> (Arc<FakeFacade>, CommandDispatcher, UnboundedReceiver<CenterMessage>) {
        let facade = Arc::new(FakeFacade::default());
        let (notifier, inbox) = Notifier::channel();
        let dispatcher = CommandDispatcher::new(facade.clone(), notifier);
        (facade, dispatcher, inbox)
    }

    fn expect_error(inbox: &mut UnboundedReceiver<CenterMessage>, title: &str) {
        match inbox.try_recv() {
            Ok(CenterMessage::Enqueue(notification)) => {
                assert_eq!(notification.level, Level::Error);
                assert_eq!(notification.title, title);
            }
            other => panic!("expected {:?} notification, got {:?}", title, other),
        }
    }

    #[tokio::test]
    async fn test_kick_dispatches_trimmed_reason() {
        let (facade, dispatcher, mut inbox) = dispatcher();

        assert_ok!(dispatcher.kick("42", "  afk ").unwrap().await);

        assert_eq!(
            facade.executed(),
            vec![Command::Kick {
                client_id: "42".to_string(),
                reason: "afk".to_string(),
            }]
        );
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_missing_client_rejected_locally() {
        let (facade, dispatcher, mut inbox) = dispatcher();

        assert!(dispatcher.mute("").is_none());
        assert!(dispatcher.ban(" ", "griefing").is_none());

        expect_error(&mut inbox, "No client selected");
        expect_error(&mut inbox, "No client selected");
        assert!(facade.executed().is_empty());
    }

    #[tokio::test]
    async fn test_missing_reason_rejected_locally() {
        let (facade, dispatcher, mut inbox) = dispatcher();

        assert!(dispatcher.ban("42", "   ").is_none());

        expect_error(&mut inbox, "Reason required");
        assert!(facade.executed().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_coalition_rejected_locally() {
        let (facade, dispatcher, mut inbox) = dispatcher();
        let coalition = Coalition {
            name: "Blue".to_string(),
            description: "NATO".to_string(),
            color: String::new(),
            password: "secret".to_string(),
        };

        assert!(dispatcher.add_coalition(coalition).is_none());

        match inbox.try_recv() {
            Ok(CenterMessage::Enqueue(notification)) => {
                assert_eq!(notification.message, "Color is required");
            }
            other => panic!("expected a validation notification, got {:?}", other),
        }
        assert!(facade.executed().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_raises_notification() {
        let (facade, dispatcher, mut inbox) = dispatcher();
        facade.fail_execute(RemoteError::Rejected("Client not found".to_string()));

        assert_ok!(dispatcher.unban("7").unwrap().await);

        expect_error(&mut inbox, "Unban client 7 failed");
    }

    #[tokio::test]
    async fn test_toggle_server() {
        let (facade, dispatcher, _inbox) = dispatcher();

        dispatcher.toggle_server(&ServerStatus::default()).await.unwrap();

        let running = ServerStatus {
            voice: ServiceStatus::running(),
            ..ServerStatus::default()
        };
        dispatcher.toggle_server(&running).await.unwrap();

        assert_eq!(facade.executed(), vec![Command::StartServer, Command::StopServer]);
    }
}
