//! Binding of each synchronized domain to its value type, push topic and
//! pull call

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use srs_shared::{
    BannedClient, Coalition, RemoteError, RemoteFacade, Roster, ServerStatus, Settings, Topic,
};
use std::fmt::Debug;

#[async_trait]
pub trait Domain: Send + Sync + 'static {
    type Value: Clone + PartialEq + Debug + DeserializeOwned + Send + Sync + 'static;

    const NAME: &'static str;
    const TOPIC: Topic;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<Self::Value, RemoteError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatusDomain;

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsDomain;

#[derive(Debug, Clone, Copy, Default)]
pub struct RosterDomain;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoalitionsDomain;

#[derive(Debug, Clone, Copy, Default)]
pub struct BansDomain;

#[async_trait]
impl Domain for StatusDomain {
    type Value = ServerStatus;
    const NAME: &'static str = "status";
    const TOPIC: Topic = Topic::Status;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<ServerStatus, RemoteError> {
        facade.fetch_status().await
    }
}

#[async_trait]
impl Domain for SettingsDomain {
    type Value = Settings;
    const NAME: &'static str = "settings";
    const TOPIC: Topic = Topic::Settings;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<Settings, RemoteError> {
        facade.fetch_settings().await
    }
}

#[async_trait]
impl Domain for RosterDomain {
    type Value = Roster;
    const NAME: &'static str = "roster";
    const TOPIC: Topic = Topic::Roster;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<Roster, RemoteError> {
        facade.fetch_roster().await
    }
}

#[async_trait]
impl Domain for CoalitionsDomain {
    type Value = Vec<Coalition>;
    const NAME: &'static str = "coalitions";
    const TOPIC: Topic = Topic::Coalitions;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<Vec<Coalition>, RemoteError> {
        facade.fetch_coalitions().await
    }
}

#[async_trait]
impl Domain for BansDomain {
    type Value = Vec<BannedClient>;
    const NAME: &'static str = "bans";
    const TOPIC: Topic = Topic::Bans;

    async fn fetch(&self, facade: &dyn RemoteFacade) -> Result<Vec<BannedClient>, RemoteError> {
        facade.fetch_bans().await
    }
}
