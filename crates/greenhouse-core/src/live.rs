//! Live data coordination.
//!
//! The [`LiveDataCoordinator`] merges the latest sensor snapshot and
//! the active threshold configuration into a single consistent
//! [`LiveView`]. The two fetches are issued concurrently and applied
//! atomically: the status map is never derived from a snapshot and a
//! configuration drawn from two different refresh cycles, and a
//! failure of either fetch leaves the previous view untouched.
//!
//! Refreshes are triggered by session changes and by saved settings,
//! never by periodic polling.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use greenhouse_types::{SensorSnapshot, StatusMap, ThresholdConfig};

use crate::api::SensorApi;
use crate::error::Result;
use crate::events::{AppEvent, EventDispatcher, FaultContext};
use crate::session::SessionStore;
use crate::thresholds::evaluate;

/// A consistent view of the greenhouse: one snapshot, the settings it
/// was evaluated against, and the resulting status map.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveView {
    /// Most recent snapshot, or `None` when the backend has no
    /// readings yet.
    pub snapshot: Option<SensorSnapshot>,
    /// The threshold configuration the snapshot was evaluated against.
    pub settings: ThresholdConfig,
    /// Per-metric classification of the snapshot.
    pub status: StatusMap,
}

/// Fetches and publishes the merged live view.
pub struct LiveDataCoordinator {
    api: Arc<dyn SensorApi>,
    session: Arc<SessionStore>,
    events: EventDispatcher,
    state: RwLock<Option<LiveView>>,
}

impl LiveDataCoordinator {
    /// Create a coordinator over the given backend and session.
    pub fn new(
        api: Arc<dyn SensorApi>,
        session: Arc<SessionStore>,
        events: EventDispatcher,
    ) -> Self {
        Self {
            api,
            session,
            events,
            state: RwLock::new(None),
        }
    }

    /// The current live view, if one has been fetched this session.
    pub async fn view(&self) -> Option<LiveView> {
        self.state.read().await.clone()
    }

    /// Fetch the latest snapshot and the active settings concurrently,
    /// evaluate, and replace the view.
    ///
    /// With no session token the view is cleared and nothing is
    /// fetched. A fetch completed under a stale session epoch (the
    /// user logged out or re-logged in mid-flight) is discarded
    /// silently. Either fetch failing surfaces a
    /// [`AppEvent::Fault`] and returns the error with the prior view
    /// intact.
    pub async fn refresh(&self) -> Result<()> {
        // Epoch strictly before token: a logout interleaved between
        // the two reads then either clears the token (fetch skipped)
        // or bumps the epoch (apply check fails). The reverse order
        // would let a revoked-token fetch pass the staleness check.
        let epoch = self.session.epoch();
        let Some(token) = self.session.token() else {
            *self.state.write().await = None;
            return Ok(());
        };

        let fetched = tokio::try_join!(
            self.api.latest_snapshot(&token),
            self.api.settings(&token)
        );
        let (snapshot, settings) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                self.events.fault(FaultContext::LiveData, e.to_string());
                return Err(e);
            }
        };

        let status = evaluate(snapshot.as_ref(), Some(&settings));
        {
            let mut state = self.state.write().await;
            // The session may have changed while the fetches were in
            // flight; a stale result must never repopulate the view.
            if self.session.epoch() != epoch {
                debug!("Discarding live data fetched under a stale session");
                return Ok(());
            }
            *state = Some(LiveView {
                snapshot,
                settings,
                status,
            });
        }
        self.events.send(AppEvent::LiveUpdated);
        Ok(())
    }

    /// Drive refreshes from session changes and saved settings until
    /// cancelled.
    ///
    /// Each trigger awaits its refresh before the next is processed,
    /// so at most one fetch pair is in flight at a time. Refresh
    /// errors are already surfaced as events and do not stop the loop.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut session_rx = self.session.subscribe();
        session_rx.mark_unchanged();
        let mut events_rx = self.events.subscribe();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let _ = self.refresh().await;
                }
                event = events_rx.recv() => {
                    match event {
                        Ok(AppEvent::SettingsSaved) => {
                            let _ = self.refresh().await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_types::{Metric, Status};

    use crate::mock::MockApi;
    use crate::session::MemoryTokenStore;

    fn setup(api: &Arc<MockApi>) -> LiveDataCoordinator {
        let session = Arc::new(SessionStore::new(MemoryTokenStore::with_token("tok")));
        session.hydrate();
        LiveDataCoordinator::new(api.clone(), session, EventDispatcher::new(16))
    }

    #[tokio::test]
    async fn test_refresh_merges_snapshot_and_settings() {
        let api = Arc::new(MockApi::new());
        api.set_snapshot(SensorSnapshot {
            temp: Some(35.0),
            motion: Some(true),
            ..Default::default()
        })
        .await;
        api.set_settings(ThresholdConfig {
            name: Some("test".into()),
            temp_max: Some(30.0),
            ..Default::default()
        })
        .await;

        let coordinator = setup(&api);
        coordinator.refresh().await.unwrap();

        let view = coordinator.view().await.unwrap();
        assert_eq!(view.snapshot.unwrap().temp, Some(35.0));
        assert_eq!(view.status[&Metric::Temp], Status::Danger);
        assert_eq!(view.status[&Metric::Motion], Status::Alert);
    }

    #[tokio::test]
    async fn test_refresh_without_token_clears_view() {
        let api = Arc::new(MockApi::new());
        let coordinator = setup(&api);
        coordinator.refresh().await.unwrap();
        assert!(coordinator.view().await.is_some());

        coordinator.session.logout();
        coordinator.refresh().await.unwrap();
        assert!(coordinator.view().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_prior_view_and_emits_fault() {
        let api = Arc::new(MockApi::new());
        let coordinator = setup(&api);
        let mut events = coordinator.events.subscribe();

        coordinator.refresh().await.unwrap();
        let before = coordinator.view().await;
        assert!(before.is_some());
        // Drain the LiveUpdated from the first refresh.
        let _ = events.recv().await;

        api.set_fail_settings(true);
        assert!(coordinator.refresh().await.is_err());
        assert_eq!(coordinator.view().await, before);
        assert!(matches!(
            events.recv().await,
            Ok(AppEvent::Fault {
                context: FaultContext::LiveData,
                ..
            })
        ));
    }
}
