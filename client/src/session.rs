//! Sync session for one mounted domain view
//!
//! A session owns its [`DomainCache`] and is the only writer to it. Four
//! event sources are multiplexed in one `select!` loop, in priority order:
//!
//! 1. **Control**: on-demand refresh and unmount from the view handle
//! 2. **Push**: payloads from the domain's topic subscription
//! 3. **Pull completions**: results of fetches spawned into a `JoinSet`
//! 4. **Poll timer**: periodic pull, skipped while one is already in flight
//!
//! All cache transitions happen on the session task, so pull completions and
//! pushes can never interleave inside a transition. Unmounting drops the
//! subscription guard and aborts every outstanding pull, so nothing can reach
//! the view after it is gone.

use log::{debug, error, info, warn};
use serde_json::Value;
use srs_shared::{decode_payload, Notification, RemoteError, RemoteFacade, Subscription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};

use crate::cache::{Applied, DomainCache, PullTicket};
use crate::center::Notifier;
use crate::config::SyncConfig;
use crate::domain::Domain;
use crate::error::SyncError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionControl {
    Refresh,
    Unmount,
}

struct PullCompleted<T> {
    ticket: PullTicket,
    result: Result<T, RemoteError>,
}

struct DomainSession<D: Domain> {
    domain: Arc<D>,
    facade: Arc<dyn RemoteFacade>,
    notifier: Notifier,
    subscription: Subscription,
    cache: DomainCache<D::Value>,
    value_tx: watch::Sender<Option<D::Value>>,
    control_rx: mpsc::UnboundedReceiver<SessionControl>,
    poll_interval: Duration,
    pulls: JoinSet<PullCompleted<D::Value>>,
    failing: bool,
}

/// Mounts a view of `domain`
///
/// The subscription is registered before the session starts, and the first
/// poll tick fires immediately, so the initial pull and the push stream
/// start together. Must be called from within a tokio runtime.
///
/// Fails without subscribing if `config` has a zero poll interval.
pub fn mount<D: Domain>(
    domain: D,
    facade: Arc<dyn RemoteFacade>,
    notifier: Notifier,
    config: &SyncConfig,
) -> Result<DomainView<D::Value>, SyncError> {
    if config.poll_interval.is_zero() {
        return Err(SyncError::ZeroPollInterval);
    }

    let subscription = facade
        .subscribe(D::TOPIC)
        .map_err(|source| SyncError::Subscribe {
            topic: D::TOPIC,
            source,
        })?;

    let (value_tx, value_rx) = watch::channel(None);
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let session = DomainSession {
        domain: Arc::new(domain),
        facade,
        notifier,
        subscription,
        cache: DomainCache::new(),
        value_tx,
        control_rx,
        poll_interval: config.poll_interval,
        pulls: JoinSet::new(),
        failing: false,
    };
    let task = tokio::spawn(session.run());
    info!("Mounted {} view (topic {})", D::NAME, D::TOPIC);

    Ok(DomainView {
        name: D::NAME,
        value_rx,
        control_tx,
        task: Some(task),
    })
}

impl<D: Domain> DomainSession<D> {
    async fn run(mut self) {
        let mut poll = interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut push_open = true;

        loop {
            tokio::select! {
                biased;

                control = self.control_rx.recv() => match control {
                    Some(SessionControl::Refresh) => {
                        if self.pulls.is_empty() {
                            self.issue_pull();
                        } else {
                            debug!("Coalescing {} refresh into the pull in flight", D::NAME);
                        }
                    }
                    Some(SessionControl::Unmount) | None => break,
                },

                payload = self.subscription.recv(), if push_open => match payload {
                    Some(payload) => self.handle_push(payload),
                    None => {
                        warn!("{} push stream closed, continuing with polls only", D::NAME);
                        push_open = false;
                    }
                },

                Some(joined) = self.pulls.join_next() => self.handle_pull(joined),

                _ = poll.tick() => {
                    if self.pulls.is_empty() {
                        self.issue_pull();
                    } else {
                        debug!("Skipping {} poll, previous pull still in flight", D::NAME);
                    }
                },
            }
        }

        self.pulls.abort_all();
        info!("Unmounted {} view", D::NAME);
    }

    fn issue_pull(&mut self) {
        let ticket = self.cache.begin_pull();
        let domain = Arc::clone(&self.domain);
        let facade = Arc::clone(&self.facade);

        self.pulls.spawn(async move {
            let result = domain.fetch(facade.as_ref()).await;
            PullCompleted { ticket, result }
        });
    }

    fn handle_pull(&mut self, joined: Result<PullCompleted<D::Value>, JoinError>) {
        let completed = match joined {
            Ok(completed) => completed,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                error!("{} pull task panicked: {}", D::NAME, e);
                return;
            }
        };

        match completed.result {
            Ok(value) => {
                if self.failing {
                    info!("{} pull recovered", D::NAME);
                    self.failing = false;
                }
                match self.cache.on_pull_result(completed.ticket, value) {
                    Applied::Replaced => self.publish(),
                    Applied::Unchanged => {}
                    Applied::Stale => debug!("Ignored stale {} pull", D::NAME),
                }
            }
            Err(e) => {
                self.cache.on_pull_failed(completed.ticket, &e);
                warn!("Failed to fetch {}: {}", D::NAME, e);
                if !self.failing {
                    self.failing = true;
                    self.notifier.notify(Notification::error(
                        format!("Failed to fetch {}", D::NAME),
                        e.to_string(),
                    ));
                }
            }
        }
    }

    fn handle_push(&mut self, payload: Value) {
        match decode_payload::<D::Value>(D::TOPIC, payload) {
            Ok(value) => {
                if self.cache.on_push_event(value) == Applied::Replaced {
                    self.publish();
                }
            }
            Err(e) => {
                warn!("Ignoring {} push: {}", D::NAME, e);
                self.notifier.notify(Notification::warning(
                    format!("Ignored malformed {} update", D::NAME),
                    e.to_string(),
                ));
            }
        }
    }

    fn publish(&self) {
        self.value_tx.send_replace(self.cache.value().cloned());
    }
}

/// Handle held by a mounted view
///
/// Dropping the handle aborts the session, which releases the subscription
/// and cancels outstanding pulls. [`DomainView::unmount`] does the same but
/// waits for the session to finish.
pub struct DomainView<T> {
    name: &'static str,
    value_rx: watch::Receiver<Option<T>>,
    control_tx: mpsc::UnboundedSender<SessionControl>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> DomainView<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last known good value, `None` until the first accepted update
    pub fn current(&self) -> Option<T> {
        self.value_rx.borrow().clone()
    }

    /// Waits until the observable value changes
    pub async fn changed(&mut self) -> Result<(), SyncError> {
        self.value_rx
            .changed()
            .await
            .map_err(|_| SyncError::SessionClosed(self.name))
    }

    /// Additional receiver for renderers that outlive a borrow of the view
    pub fn watch(&self) -> watch::Receiver<Option<T>> {
        self.value_rx.clone()
    }

    /// Issues an on-demand pull. It goes through the same staleness check as
    /// a poll, and is folded into the pull already in flight if there is one.
    pub fn refresh(&self) -> Result<(), SyncError> {
        self.control_tx
            .send(SessionControl::Refresh)
            .map_err(|_| SyncError::SessionClosed(self.name))
    }

    pub async fn unmount(mut self) {
        let _ = self.control_tx.send(SessionControl::Unmount);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    error!("{} session ended abnormally: {}", self.name, e);
                }
            }
        }
    }
}

impl<T> Drop for DomainView<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::center::CenterMessage;
    use crate::domain::{RosterDomain, StatusDomain};
    use crate::testing::FakeFacade;
    use serde_json::json;
    use srs_shared::{ClientState, Level, Roster, ServerStatus, ServiceStatus, Topic};
    use tokio::time::{advance, sleep};

    fn running() -> ServerStatus {
        ServerStatus {
            http: ServiceStatus::running(),
            voice: ServiceStatus::running(),
            control: ServiceStatus::running(),
        }
    }

    fn roster_with(id: &str, name: &str) -> Roster {
        let mut roster = Roster::new();
        roster.insert(
            id.to_string(),
            ClientState {
                name: name.to_string(),
                ..ClientState::default()
            },
        );
        roster
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_pull_populates_view() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_status(Ok(running()));
        let (notifier, _inbox) = Notifier::channel();

        let mut view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        assert_eq!(view.current(), None);

        view.changed().await.unwrap();
        assert_eq!(view.current(), Some(running()));
        assert_eq!(facade.subscriber_count(Topic::Status), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_wins_over_slower_pull() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_roster(roster_with("1", "A"));
        facade.set_fetch_delay(Duration::from_millis(3000));
        let (notifier, _inbox) = Notifier::channel();

        let mut view = mount(RosterDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();

        // Pull issued at t=0, push at t=1, pull resolves with A at t=3
        sleep(Duration::from_millis(1000)).await;
        facade.push(Topic::Roster, serde_json::to_value(roster_with("1", "B")).unwrap());
        view.changed().await.unwrap();
        assert_eq!(view.current(), Some(roster_with("1", "B")));

        sleep(Duration::from_millis(2500)).await;
        assert_eq!(view.current(), Some(roster_with("1", "B")));
        assert!(!view.value_rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_skipped_while_pull_in_flight() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_fetch_delay(Duration::from_millis(7000));
        let (notifier, _inbox) = Notifier::channel();

        let _view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();

        sleep(Duration::from_millis(6500)).await;
        assert_eq!(facade.status_fetches(), 1);

        // First pull resolves at t=7, the next tick at t=9 issues a new one
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(facade.status_fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pull_keeps_value_and_notifies_once() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_status(Ok(running()));
        let (notifier, mut inbox) = Notifier::channel();

        let mut view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        view.changed().await.unwrap();

        facade.set_status(Err(RemoteError::Transport("connection reset".to_string())));
        sleep(Duration::from_millis(6500)).await;

        assert_eq!(view.current(), Some(running()));
        match inbox.try_recv() {
            Ok(CenterMessage::Enqueue(notification)) => {
                assert_eq!(notification.level, Level::Error);
                assert_eq!(notification.title, "Failed to fetch status");
            }
            other => panic!("expected an error notification, got {:?}", other),
        }
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_push_retains_value() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_status(Ok(running()));
        let (notifier, mut inbox) = Notifier::channel();

        let mut view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        view.changed().await.unwrap();

        facade.push(Topic::Status, json!("not a status"));
        advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        assert_eq!(view.current(), Some(running()));
        assert!(matches!(
            inbox.recv().await,
            Some(CenterMessage::Enqueue(Notification { level: Level::Warning, .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_enveloped_push_accepted() {
        let facade = Arc::new(FakeFacade::default());
        let (notifier, _inbox) = Notifier::channel();

        let mut view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        view.changed().await.unwrap();

        facade.push(Topic::Status, json!({ "data": running() }));
        view.changed().await.unwrap();
        assert_eq!(view.current(), Some(running()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_issues_pull() {
        let facade = Arc::new(FakeFacade::default());
        let (notifier, _inbox) = Notifier::channel();

        let mut view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        view.changed().await.unwrap();
        assert_eq!(facade.status_fetches(), 1);

        facade.set_status(Ok(running()));
        view.refresh().unwrap();
        view.changed().await.unwrap();
        assert_eq!(facade.status_fetches(), 2);
        assert_eq!(view.current(), Some(running()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_releases_subscription_and_stops_polling() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_fetch_delay(Duration::from_millis(500));
        let (notifier, _inbox) = Notifier::channel();

        let view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        tokio::task::yield_now().await;
        let fetches = facade.status_fetches();

        view.unmount().await;
        assert_eq!(facade.subscriber_count(Topic::Status), 0);

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(facade.status_fetches(), fetches);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_subscription_fails_mount() {
        let facade = Arc::new(FakeFacade::default());
        facade.refuse_subscribe(Topic::Status);
        let (notifier, _inbox) = Notifier::channel();

        let result = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default());
        assert!(matches!(
            result,
            Err(SyncError::Subscribe { topic: Topic::Status, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_wins_when_pull_resolves_same_instant() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_roster(roster_with("1", "A"));
        facade.set_fetch_delay(Duration::from_millis(1000));
        let (notifier, _inbox) = Notifier::channel();
        let start = tokio::time::Instant::now();

        let mut view = mount(RosterDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(facade.subscriber_count(Topic::Roster), 1);

        // Pull issued at t=0 resolves with A at t=1, push B lands at t=1 too
        let pusher = Arc::clone(&facade);
        tokio::spawn(async move {
            tokio::time::sleep_until(start + Duration::from_millis(1000)).await;
            pusher.push(Topic::Roster, serde_json::to_value(roster_with("1", "B")).unwrap());
        });

        view.changed().await.unwrap();
        assert_eq!(view.current(), Some(roster_with("1", "B")));

        // Next poll is due at t=3
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(view.current(), Some(roster_with("1", "B")));
        assert!(!view.value_rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_folded_into_pull_in_flight() {
        let facade = Arc::new(FakeFacade::default());
        facade.set_fetch_delay(Duration::from_millis(1000));
        let (notifier, _inbox) = Notifier::channel();

        let view = mount(StatusDomain, facade.clone(), notifier, &SyncConfig::default()).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(facade.status_fetches(), 1);

        view.refresh().unwrap();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(facade.status_fetches(), 1);

        // The first pull resolved at t=1, well before the next poll
        sleep(Duration::from_millis(1000)).await;
        view.refresh().unwrap();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(facade.status_fetches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_poll_interval_fails_mount() {
        let facade = Arc::new(FakeFacade::default());
        let (notifier, _inbox) = Notifier::channel();
        let config = SyncConfig::default().with_poll_interval(Duration::ZERO);

        let result = mount(StatusDomain, facade.clone(), notifier, &config);
        assert!(matches!(result, Err(SyncError::ZeroPollInterval)));
        assert_eq!(facade.subscriber_count(Topic::Status), 0);
        assert_eq!(facade.status_fetches(), 0);
    }
}
