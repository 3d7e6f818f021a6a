use log::info;
use srs_shared::{BannedClient, Coalition, RemoteFacade, Roster, ServerStatus, Settings};
use std::sync::Arc;

use crate::center::{mount_notifications, NotificationView};
use crate::commands::CommandDispatcher;
use crate::config::SyncConfig;
use crate::domain::{BansDomain, CoalitionsDomain, RosterDomain, SettingsDomain, StatusDomain};
use crate::error::SyncError;
use crate::session::{mount, DomainView};

/// Every view of the admin surface, mounted together
///
/// If any mount fails, the views mounted before it are dropped, which aborts
/// their sessions and releases their subscriptions.
pub struct AdminConsole {
    pub notifications: NotificationView,
    pub status: DomainView<ServerStatus>,
    pub settings: DomainView<Settings>,
    pub roster: DomainView<Roster>,
    pub coalitions: DomainView<Vec<Coalition>>,
    pub bans: DomainView<Vec<BannedClient>>,
    pub commands: CommandDispatcher,
}

impl AdminConsole {
    pub fn mount(facade: Arc<dyn RemoteFacade>, config: &SyncConfig) -> Result<Self, SyncError> {
        if config.poll_interval.is_zero() {
            return Err(SyncError::ZeroPollInterval);
        }

        let notifications = mount_notifications(Arc::clone(&facade), config)?;
        let notifier = notifications.notifier();

        let status = mount(StatusDomain, Arc::clone(&facade), notifier.clone(), config)?;
        let settings = mount(SettingsDomain, Arc::clone(&facade), notifier.clone(), config)?;
        let roster = mount(RosterDomain, Arc::clone(&facade), notifier.clone(), config)?;
        let coalitions = mount(CoalitionsDomain, Arc::clone(&facade), notifier.clone(), config)?;
        let bans = mount(BansDomain, Arc::clone(&facade), notifier.clone(), config)?;

        info!("Admin console mounted");
        Ok(Self {
            notifications,
            status,
            settings,
            roster,
            coalitions,
            bans,
            commands: CommandDispatcher::new(facade, notifier),
        })
    }

    pub async fn unmount(self) {
        self.status.unmount().await;
        self.settings.unmount().await;
        self.roster.unmount().await;
        self.coalitions.unmount().await;
        self.bans.unmount().await;
        self.notifications.unmount().await;
        info!("Admin console unmounted");
    }
}
