//! End-to-end coordinator behavior against a scripted status source.

use kyc_source::{MockStatusSource, StatusSource};
use kyc_sync::{RefreshOptions, SyncConfig, SyncCoordinator, SyncError};
use kyc_types::{KycStatus, StatusReport, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn report(status: KycStatus) -> StatusReport {
    StatusReport::new(status, true, None)
}

fn coordinator_with(source: MockStatusSource) -> (Arc<SyncCoordinator>, Arc<MockStatusSource>) {
    init_tracing();
    let source = Arc::new(source);
    let coordinator = Arc::new(SyncCoordinator::new(
        Arc::clone(&source) as Arc<dyn StatusSource>
    ));
    (coordinator, source)
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_fetch() {
    let source = MockStatusSource::always(report(KycStatus::Verified));
    source.set_delay(Duration::from_millis(200));
    let (coordinator, source) = coordinator_with(source);

    let user = UserId::new("u-dedup");
    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .ensure_fresh(&user, RefreshOptions::default())
                .await
        }));
    }

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(record.kyc_status, KycStatus::Verified);
    }
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn fresh_record_short_circuits_second_call() {
    let (coordinator, source) =
        coordinator_with(MockStatusSource::always(report(KycStatus::Pending)));
    let user = UserId::new("u-fresh");

    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();

    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn force_refresh_bypasses_freshness() {
    let (coordinator, source) =
        coordinator_with(MockStatusSource::always(report(KycStatus::Pending)));
    let user = UserId::new("u-force");

    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    coordinator
        .ensure_fresh(&user, RefreshOptions::forced())
        .await
        .unwrap();

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn transition_notifies_exactly_once() {
    let source = MockStatusSource::new();
    source.push_report(report(KycStatus::Pending));
    source.push_report(report(KycStatus::Verified));
    source.push_report(report(KycStatus::Verified));
    let (coordinator, _source) = coordinator_with(source);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    coordinator.on_status_change(move |change| {
        sink.lock().unwrap().push(change.clone());
    });

    let user = UserId::new("u-notify");
    for _ in 0..3 {
        coordinator
            .ensure_fresh(&user, RefreshOptions::forced())
            .await
            .unwrap();
    }

    let events = events.lock().unwrap();
    // First resolution is silent; pending -> verified fires once;
    // verified -> verified fires nothing.
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].previous, Some(KycStatus::Pending));
    assert_eq!(events[0].new, KycStatus::Verified);
}

#[tokio::test]
async fn panicking_subscriber_does_not_fail_resolution() {
    let source = MockStatusSource::new();
    source.push_report(report(KycStatus::Pending));
    source.push_report(report(KycStatus::Verified));
    let (coordinator, _source) = coordinator_with(source);

    let delivered = Arc::new(AtomicUsize::new(0));
    coordinator.on_status_change(|_| panic!("toast surface crashed"));
    let sink = Arc::clone(&delivered);
    coordinator.on_status_change(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    // The transition fires the broken subscriber, but the resolution and
    // the cache update go through untouched, and later subscribers still
    // hear about the change.
    let user = UserId::new("u-crash");
    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    let record = coordinator
        .ensure_fresh(&user, RefreshOptions::forced())
        .await
        .unwrap();

    assert_eq!(record.kyc_status, KycStatus::Verified);
    assert_eq!(
        coordinator.get_cached(&user).unwrap().kyc_status,
        KycStatus::Verified
    );
    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_fetch_keeps_last_known_record() {
    let source = MockStatusSource::new();
    source.push_report(report(KycStatus::Verified));
    source.push_error("backend unreachable");
    let (coordinator, _source) = coordinator_with(source);

    let user = UserId::new("u-fail");
    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();

    let err = coordinator
        .ensure_fresh(&user, RefreshOptions::forced())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Fetch { .. }));

    let cached = coordinator.get_cached(&user).unwrap();
    assert_eq!(cached.kyc_status, KycStatus::Verified);
    assert!(coordinator
        .last_error(&user)
        .unwrap()
        .contains("backend unreachable"));
}

#[tokio::test]
async fn failure_does_not_notify() {
    let source = MockStatusSource::new();
    source.push_report(report(KycStatus::Verified));
    source.push_error("flaky");
    let (coordinator, _source) = coordinator_with(source);

    let notified = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&notified);
    coordinator.on_status_change(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    let user = UserId::new("u-silent");
    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    let _ = coordinator
        .ensure_fresh(&user, RefreshOptions::forced())
        .await;

    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn waiters_observe_the_same_failure() {
    let source = MockStatusSource::new();
    source.push_error("single shared failure");
    source.set_delay(Duration::from_millis(100));
    let (coordinator, source) = coordinator_with(source);

    let user = UserId::new("u-shared-err");
    let mut handles = Vec::new();
    for _ in 0..4 {
        let coordinator = Arc::clone(&coordinator);
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            coordinator
                .ensure_fresh(&user, RefreshOptions::default())
                .await
        }));
    }

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        match err {
            SyncError::Fetch { message, .. } => assert!(message.contains("single shared failure")),
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_clears_in_flight_and_allows_retry() {
    init_tracing();
    let source = MockStatusSource::new();
    source.push_hang();
    source.push_report(report(KycStatus::Verified));
    let source = Arc::new(source);
    let coordinator = SyncCoordinator::with_config(
        Arc::clone(&source) as Arc<dyn StatusSource>,
        SyncConfig {
            max_age: Duration::from_secs(30),
            fetch_timeout: Duration::from_millis(250),
        },
    );

    let user = UserId::new("u-timeout");
    let err = coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Timeout { timeout_ms: 250, .. }));

    // The in-flight marker was force-cleared: a new fetch starts instead
    // of hanging on the dead one.
    let record = coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    assert_eq!(record.kyc_status, KycStatus::Verified);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn reset_all_isolates_identities() {
    let (coordinator, _source) =
        coordinator_with(MockStatusSource::always(report(KycStatus::Verified)));

    let users: Vec<UserId> = (0..3).map(|i| UserId::new(format!("u-{i}"))).collect();
    for user in &users {
        coordinator
            .ensure_fresh(user, RefreshOptions::default())
            .await
            .unwrap();
        assert!(coordinator.get_cached(user).is_some());
    }

    coordinator.reset_all().unwrap();

    for user in &users {
        assert!(coordinator.get_cached(user).is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn fetch_completing_after_reset_is_discarded() {
    let source = MockStatusSource::always(report(KycStatus::Verified));
    source.set_delay(Duration::from_millis(200));
    let (coordinator, _source) = coordinator_with(source);

    let user = UserId::new("u-signout");
    let pending = {
        let coordinator = Arc::clone(&coordinator);
        let user = user.clone();
        tokio::spawn(
            async move { coordinator.ensure_fresh(&user, RefreshOptions::default()).await },
        )
    };

    // Let the fetch start, then sign out underneath it.
    tokio::task::yield_now().await;
    coordinator.reset_all().unwrap();

    // The caller still gets the fetched record back...
    pending.await.unwrap().unwrap();
    // ...but the cache stays empty for the next identity.
    assert!(coordinator.get_cached(&user).is_none());
}

#[tokio::test]
async fn unknown_status_resolves_as_unverified() {
    let source = MockStatusSource::new();
    source.push_report(
        kyc_source::RawStatusReport {
            kyc_status: "tier2-escalation".to_string(),
            email_verified: true,
            rejection_reason: None,
        }
        .normalize(),
    );
    let (coordinator, _source) = coordinator_with(source);

    let record = coordinator
        .ensure_fresh(&UserId::new("u-odd"), RefreshOptions::default())
        .await
        .unwrap();
    assert_eq!(record.kyc_status, KycStatus::Unverified);
    assert!(!record.has_full_access());
}

#[tokio::test]
async fn per_call_max_age_override_forces_refetch() {
    let (coordinator, source) =
        coordinator_with(MockStatusSource::always(report(KycStatus::Verified)));
    let user = UserId::new("u-tight");

    coordinator
        .ensure_fresh(&user, RefreshOptions::default())
        .await
        .unwrap();
    coordinator
        .ensure_fresh(
            &user,
            RefreshOptions {
                force_refresh: false,
                max_age: Some(Duration::ZERO),
            },
        )
        .await
        .unwrap();

    assert_eq!(source.calls(), 2);
}
