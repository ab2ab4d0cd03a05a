//! Integration tests for the orchestration engine.
//!
//! These drive the coordinator, history engine, and settings sync
//! against the programmable mock backend, focusing on the async
//! coordination guarantees: stale responses never win, logout
//! discards in-flight work, and saved settings re-evaluate the live
//! view.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use greenhouse_core::events::{AppEvent, EventDispatcher};
use greenhouse_core::history::{HistoryQueryEngine, QueryOutcome};
use greenhouse_core::live::LiveDataCoordinator;
use greenhouse_core::mock::MockApi;
use greenhouse_core::session::{MemoryTokenStore, SessionStore, sign_out};
use greenhouse_core::settings::SettingsSync;
use greenhouse_core::types::{
    HistoryPoint, Metric, SensorSnapshot, Status, ThresholdConfig, TimeRange,
};
use time::macros::datetime;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn authed_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::new(MemoryTokenStore::with_token("tok")));
    session.hydrate();
    session
}

fn complete_config() -> ThresholdConfig {
    ThresholdConfig {
        name: Some("Tomatoes".to_string()),
        temp_min: Some(10.0),
        temp_max: Some(30.0),
        hum_min: Some(40.0),
        hum_max: Some(80.0),
        light_min: Some(200.0),
        light_max: Some(10_000.0),
        soil_min: Some(300.0),
        ..Default::default()
    }
}

fn point(timestamp: time::OffsetDateTime, temp: f64) -> HistoryPoint {
    HistoryPoint {
        timestamp,
        values: SensorSnapshot {
            temp: Some(temp),
            ..Default::default()
        },
    }
}

/// Waits for a specific event, skipping unrelated ones.
async fn wait_for(
    rx: &mut greenhouse_core::events::EventReceiver,
    want: fn(&AppEvent) -> bool,
) -> AppEvent {
    timeout(EVENT_TIMEOUT, async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if want(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test(start_paused = true)]
async fn test_history_last_write_wins() {
    let api = Arc::new(MockApi::new());
    let day1 = datetime!(2025-06-01 12:00 UTC);
    let day2 = datetime!(2025-06-02 12:00 UTC);
    api.set_history(vec![point(day1, 1.0), point(day2, 2.0)]).await;

    let engine = Arc::new(HistoryQueryEngine::new(
        api.clone(),
        authed_session(),
        EventDispatcher::new(16),
    ));

    let range_a = TimeRange::new(datetime!(2025-06-01 00:00 UTC), datetime!(2025-06-02 00:00 UTC));
    let range_b = TimeRange::new(datetime!(2025-06-02 00:00 UTC), datetime!(2025-06-03 00:00 UTC));

    // Query A is slow; B is issued while A is still in flight and
    // resolves first.
    api.set_history_latency(Duration::from_millis(500));
    let slow = tokio::spawn({
        let engine = engine.clone();
        async move { engine.query(range_a).await }
    });
    tokio::task::yield_now().await;

    api.set_history_latency(Duration::ZERO);
    let fast = engine.query(range_b).await.unwrap();
    assert_eq!(fast, QueryOutcome::Applied);

    // A's late response must not overwrite B's.
    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale, QueryOutcome::Superseded);

    let series = engine.series().await.unwrap();
    assert_eq!(series.timestamps, vec![day2]);
    assert_eq!(series.temp, vec![Some(2.0)]);
    assert_eq!(api.history_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_logout_discards_in_flight_live_fetch() {
    let api = Arc::new(MockApi::new());
    api.set_live_latency(Duration::from_millis(300));

    let session = authed_session();
    let coordinator = Arc::new(LiveDataCoordinator::new(
        api.clone(),
        session.clone(),
        EventDispatcher::new(16),
    ));

    let in_flight = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    tokio::task::yield_now().await;

    // The user logs out while the joint fetch is still in flight.
    session.logout();
    in_flight.await.unwrap().unwrap();

    // The late response must not repopulate post-logout state.
    assert!(coordinator.view().await.is_none());
    assert_eq!(session.token(), None);
}

#[tokio::test(start_paused = true)]
async fn test_relogin_discards_fetch_from_previous_session() {
    let api = Arc::new(MockApi::new());
    api.set_live_latency(Duration::from_millis(300));

    let session = authed_session();
    let coordinator = Arc::new(LiveDataCoordinator::new(
        api.clone(),
        session.clone(),
        EventDispatcher::new(16),
    ));

    let in_flight = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.refresh().await }
    });
    tokio::task::yield_now().await;

    // Logout and immediate re-login: the old fetch belongs to a dead
    // session even though a token is present again.
    session.logout();
    session.login("tok-2");
    in_flight.await.unwrap().unwrap();

    assert!(coordinator.view().await.is_none());
}

#[tokio::test]
async fn test_run_loop_refreshes_on_login_and_settings_save() {
    let api = Arc::new(MockApi::new());
    api.set_snapshot(SensorSnapshot {
        temp: Some(25.0),
        ..Default::default()
    })
    .await;
    api.set_settings(complete_config()).await;

    let session = Arc::new(SessionStore::new(MemoryTokenStore::new()));
    session.hydrate();

    let events = EventDispatcher::new(16);
    let coordinator = Arc::new(LiveDataCoordinator::new(
        api.clone(),
        session.clone(),
        events.clone(),
    ));

    let cancel = CancellationToken::new();
    let loop_handle = tokio::spawn(coordinator.clone().run(cancel.clone()));
    tokio::task::yield_now().await;

    let mut rx = events.subscribe();

    // Logging in triggers the first refresh.
    session.login("tok");
    wait_for(&mut rx, |e| matches!(e, AppEvent::LiveUpdated)).await;
    let view = coordinator.view().await.unwrap();
    assert_eq!(view.status[&Metric::Temp], Status::Ok);

    // Saving tighter thresholds re-evaluates the same snapshot.
    let sync = SettingsSync::new(api.clone(), session.clone(), events.clone());
    let mut config = complete_config();
    config.temp_max = Some(20.0);
    sync.save(&config).await.unwrap();
    wait_for(&mut rx, |e| matches!(e, AppEvent::LiveUpdated)).await;

    let view = coordinator.view().await.unwrap();
    assert_eq!(view.settings.temp_max, Some(20.0));
    assert_eq!(view.status[&Metric::Temp], Status::Danger);

    cancel.cancel();
    loop_handle.await.unwrap();
}

#[tokio::test]
async fn test_sign_out_clears_session_even_when_backend_fails() {
    let api = Arc::new(MockApi::new());
    api.set_fail_logout(true);

    let session = authed_session();
    sign_out(api.as_ref(), &session).await;

    assert_eq!(api.logout_calls(), 1);
    assert_eq!(session.token(), None);
}

#[tokio::test]
async fn test_joint_fetch_applies_all_or_nothing() {
    let api = Arc::new(MockApi::new());
    let session = authed_session();
    let coordinator =
        LiveDataCoordinator::new(api.clone(), session, EventDispatcher::new(16));

    // Snapshot succeeds but settings fail: nothing may be applied.
    api.set_fail_settings(true);
    assert!(coordinator.refresh().await.is_err());
    assert!(coordinator.view().await.is_none());

    api.set_fail_settings(false);
    coordinator.refresh().await.unwrap();
    assert!(coordinator.view().await.is_some());
}

#[tokio::test]
async fn test_settings_round_trip_through_backend() {
    let api = Arc::new(MockApi::new());
    let session = authed_session();
    let sync = SettingsSync::new(api.clone(), session, EventDispatcher::new(16));

    let config = complete_config();
    sync.save(&config).await.unwrap();
    let loaded = sync.load(None).await.unwrap();
    assert_eq!(loaded, config);
}
