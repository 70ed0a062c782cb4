// SPDX-FileCopyrightText: 2026 Signalbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue drain convergence, reconnect triggers, and live mirror recovery.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use signalbox_core::{Credential, FeedEvent, Signal, SignalId, SystemClock};
use signalbox_storage::{MemoryStore, PersistedQueue, SessionKeys, SessionStore};
use signalbox_sync::{
    ConnectivityMonitor, DrainReport, LiveMirror, LocalSignals, Reconciler, SkipReason,
    merge_signals,
};
use signalbox_test_utils::{
    FailingStore, ManualClock, MockOutcome, MockTransport, RecordingObserver, ScriptedFeed,
    StaticConnectivity, Subscription,
};
use tokio_util::sync::CancellationToken;

const QUEUE_KEY: &str = "signalbox.queue";

fn queue() -> Arc<PersistedQueue> {
    Arc::new(PersistedQueue::new(
        Arc::new(MemoryStore::new()),
        QUEUE_KEY,
        Arc::new(SystemClock),
        RecordingObserver::new(),
    ))
}

fn credential() -> Credential {
    Credential::new("tok", Utc::now())
}

fn signal(title: &str) -> Signal {
    Signal::capture(title, Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
}

fn named(id: &str, title: &str) -> Signal {
    let mut signal = signal(title);
    signal.id = SignalId::from(id);
    signal
}

async fn queued_ids(queue: &PersistedQueue) -> Vec<SignalId> {
    queue
        .read_all()
        .await
        .into_iter()
        .map(|entry| entry.signal.id)
        .collect()
}

fn session_at(clock: Arc<ManualClock>) -> Arc<SessionStore> {
    Arc::new(SessionStore::new(
        Arc::new(MemoryStore::new()),
        SessionKeys {
            token: "signalbox.credential".into(),
            stored_at: "signalbox.credential.stored_at".into(),
            identity: "signalbox.identity".into(),
        },
        TimeDelta::minutes(55),
        clock,
        RecordingObserver::new(),
    ))
}

#[tokio::test]
async fn drain_keeps_only_the_failed_entry() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new());
    let (one, two, three) = (signal("one"), signal("two"), signal("three"));
    for s in [&one, &two, &three] {
        queue.enqueue(s.clone()).await;
    }
    transport
        .set_outcome_for(&two.id, MockOutcome::TransportFailure)
        .await;

    let reconciler = Reconciler::new(queue.clone(), transport.clone(), StaticConnectivity::online());
    let report = reconciler.drain(&credential()).await;

    assert_eq!(
        report,
        DrainReport {
            attempted: 3,
            delivered: 2,
            retained: 1,
            rejected: 0,
            remaining: 1,
            skipped: None,
        }
    );
    assert_eq!(queued_ids(&queue).await, vec![two.id.clone()]);

    let ids: Vec<_> = transport.submitted().await.into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![one.id, two.id.clone(), three.id]);
}

#[tokio::test]
async fn repeated_drains_converge_and_stay_stable() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new());
    let stuck: Vec<Signal> = (0..2).map(|i| signal(&format!("stuck {i}"))).collect();
    for i in 0..5 {
        queue.enqueue(signal(&format!("ok {i}"))).await;
    }
    for s in &stuck {
        queue.enqueue(s.clone()).await;
        transport
            .set_outcome_for(&s.id, MockOutcome::TransportFailure)
            .await;
    }

    let reconciler = Reconciler::new(queue.clone(), transport.clone(), StaticConnectivity::online());
    let first = reconciler.drain(&credential()).await;
    assert_eq!(first.remaining, 2);

    for _ in 0..3 {
        let again = reconciler.drain(&credential()).await;
        assert_eq!(again.attempted, 2);
        assert_eq!(again.remaining, 2);
    }
    let stuck_ids: Vec<_> = stuck.into_iter().map(|s| s.id).collect();
    assert_eq!(queued_ids(&queue).await, stuck_ids);
}

#[tokio::test]
async fn drain_is_a_noop_when_offline() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new());
    queue.enqueue(signal("waiting")).await;

    let reconciler = Reconciler::new(queue.clone(), transport.clone(), StaticConnectivity::offline());
    let report = reconciler.drain(&credential()).await;

    assert_eq!(report.skipped, Some(SkipReason::Offline));
    assert_eq!(transport.submit_count().await, 0);
    assert_eq!(queue.len().await, 1);
}

#[tokio::test]
async fn permanent_rejections_are_dropped_retryable_ones_kept() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new());
    let poison = signal("poison");
    let outage = signal("outage");
    queue.enqueue(poison.clone()).await;
    queue.enqueue(outage.clone()).await;
    transport
        .set_outcome_for(&poison.id, MockOutcome::reject(422, "title too long"))
        .await;
    transport
        .set_outcome_for(&outage.id, MockOutcome::reject(503, "maintenance"))
        .await;

    let reconciler = Reconciler::new(queue.clone(), transport.clone(), StaticConnectivity::online());
    let report = reconciler.drain(&credential()).await;

    assert_eq!(report.rejected, 1);
    assert_eq!(report.retained, 1);
    assert_eq!(queued_ids(&queue).await, vec![outage.id]);
}

#[tokio::test]
async fn full_delivery_clears_the_queue_key() {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(PersistedQueue::new(
        store.clone(),
        QUEUE_KEY,
        Arc::new(SystemClock),
        RecordingObserver::new(),
    ));
    queue.enqueue(signal("a")).await;

    let reconciler = Reconciler::new(
        queue.clone(),
        Arc::new(MockTransport::new()),
        StaticConnectivity::online(),
    );
    reconciler.drain(&credential()).await;

    use signalbox_core::KeyValueStore;
    assert_eq!(store.get(QUEUE_KEY).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn enqueue_during_drain_is_not_lost() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new().with_latency(Duration::from_millis(500)));
    let early = signal("early");
    queue.enqueue(early.clone()).await;

    let reconciler = Arc::new(Reconciler::new(
        queue.clone(),
        transport.clone(),
        StaticConnectivity::online(),
    ));
    let drain = {
        let reconciler = Arc::clone(&reconciler);
        tokio::spawn(async move { reconciler.drain(&credential()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let late = signal("late");
    queue.enqueue(late.clone()).await;

    let report = drain.await.unwrap();
    assert_eq!(report.delivered, 1);
    assert_eq!(report.remaining, 1);
    assert_eq!(queued_ids(&queue).await, vec![late.id]);
}

#[tokio::test(start_paused = true)]
async fn unreadable_queue_at_settle_keeps_retained_entries() {
    let store = FailingStore::read_only();
    store.set_fail_writes(false);
    let queue = Arc::new(PersistedQueue::new(
        store.clone(),
        QUEUE_KEY,
        Arc::new(SystemClock),
        RecordingObserver::new(),
    ));
    let transport = Arc::new(MockTransport::new().with_latency(Duration::from_millis(500)));
    let stuck = signal("stuck");
    queue.enqueue(stuck.clone()).await;
    transport
        .set_outcome_for(&stuck.id, MockOutcome::TransportFailure)
        .await;

    let reconciler = Arc::new(Reconciler::new(
        queue.clone(),
        transport.clone(),
        StaticConnectivity::online(),
    ));
    let drain = {
        let reconciler = Arc::clone(&reconciler);
        tokio::spawn(async move { reconciler.drain(&credential()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.set_fail_reads(true);

    let report = drain.await.unwrap();
    assert_eq!(report.retained, 1);
    assert_eq!(report.remaining, 1);

    store.set_fail_reads(false);
    assert_eq!(queued_ids(&queue).await, vec![stuck.id]);
}

#[tokio::test]
async fn resolved_entries_leave_the_local_view() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new());
    let (delivered, rejected, stuck) = (signal("delivered"), signal("rejected"), signal("stuck"));
    let local = Arc::new(LocalSignals::new());
    for s in [&delivered, &rejected, &stuck] {
        queue.enqueue(s.clone()).await;
        local.upsert(s.clone());
    }
    transport
        .set_outcome_for(&rejected.id, MockOutcome::reject(400, "bad payload"))
        .await;
    transport
        .set_outcome_for(&stuck.id, MockOutcome::TransportFailure)
        .await;

    let reconciler = Reconciler::new(queue.clone(), transport.clone(), StaticConnectivity::online())
        .with_local(local.clone());
    reconciler.drain(&credential()).await;

    let ids: Vec<_> = local.snapshot().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![stuck.id]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_drain_is_skipped() {
    let queue = queue();
    let transport = Arc::new(MockTransport::new().with_latency(Duration::from_secs(1)));
    queue.enqueue(signal("slow")).await;

    let reconciler = Arc::new(Reconciler::new(
        queue.clone(),
        transport.clone(),
        StaticConnectivity::online(),
    ));
    let first = {
        let reconciler = Arc::clone(&reconciler);
        tokio::spawn(async move { reconciler.drain(&credential()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = reconciler.drain(&credential()).await;
    assert_eq!(second.skipped, Some(SkipReason::InProgress));

    assert_eq!(first.await.unwrap().delivered, 1);
    assert_eq!(transport.submit_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn reconnect_triggers_drain() {
    let clock = ManualClock::new(Utc::now());
    let session = session_at(clock);
    session.store("tok").await;

    let queue = queue();
    let waiting = signal("Lístek objednávek chybí");
    queue.enqueue(waiting.clone()).await;

    let monitor = Arc::new(ConnectivityMonitor::new(false));
    let transport = Arc::new(MockTransport::new());
    let reconciler = Arc::new(Reconciler::new(queue.clone(), transport.clone(), monitor.clone()));
    let cancel = CancellationToken::new();

    let task = {
        let reconciler = Arc::clone(&reconciler);
        let session = Arc::clone(&session);
        let online = monitor.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move { reconciler.run_on_reconnect(session, online, cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.submit_count().await, 0, "offline start must not send");
    assert_eq!(queue.len().await, 1);

    monitor.set_online(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(queue.is_empty().await);
    assert_eq!(transport.server_records().await, vec![waiting]);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn expired_session_defers_drain() {
    let clock = ManualClock::new(Utc::now());
    let session = session_at(clock.clone());
    session.store("tok").await;
    clock.advance(TimeDelta::minutes(56));

    let queue = queue();
    queue.enqueue(signal("held")).await;
    let reconciler = Reconciler::new(
        queue.clone(),
        Arc::new(MockTransport::new()),
        StaticConnectivity::online(),
    );

    assert_eq!(reconciler.drain_with_session(&session).await, None);
    assert_eq!(queue.len().await, 1);
}

#[tokio::test(start_paused = true)]
async fn mirror_retries_baseline_and_resubscribes() {
    let clock = ManualClock::new(Utc::now());
    let session = session_at(clock);
    session.store("tok").await;

    let feed = ScriptedFeed::new();
    feed.push_baseline_failure(MockOutcome::TransportFailure).await;
    feed.push_baseline(vec![named("a", "a")]).await;
    feed.push_subscription(Subscription::Finite(Vec::new())).await;
    feed.push_subscription(Subscription::Finite(vec![
        FeedEvent::Insert(named("b", "b")),
        FeedEvent::Update(named("a", "a2")),
    ]))
    .await;
    let live = feed.push_live().await;
    feed.push_baseline(vec![named("a", "a2"), named("b", "b")]).await;

    let mirror = Arc::new(LiveMirror::new());
    let cancel = CancellationToken::new();
    let task = {
        let mirror = Arc::clone(&mirror);
        let feed = feed.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            mirror
                .run(feed, session, Duration::from_secs(5), cancel)
                .await
        })
    };

    // Cycle 1 fails its baseline, cycle 2 replays a finite stream that ends,
    // cycle 3 stays on the live subscription.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(feed.subscribe_calls(), 3);
    assert_eq!(feed.baseline_calls(), 3);

    live.unbounded_send(FeedEvent::Delete(SignalId::from("b")))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let titles: Vec<_> = mirror.snapshot().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["a2"]);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn mirror_retries_after_subscribe_failure() {
    let clock = ManualClock::new(Utc::now());
    let session = session_at(clock);
    session.store("tok").await;

    let feed = ScriptedFeed::new();
    feed.push_subscription(Subscription::Fail(MockOutcome::TransportFailure))
        .await;
    let _live = feed.push_live().await;
    feed.push_baseline(vec![named("a", "a")]).await;

    let mirror = Arc::new(LiveMirror::new());
    let cancel = CancellationToken::new();
    let task = {
        let mirror = Arc::clone(&mirror);
        let feed = feed.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            mirror
                .run(feed, session, Duration::from_secs(5), cancel)
                .await
        })
    };

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(feed.subscribe_calls(), 1);
    assert_eq!(feed.baseline_calls(), 0, "no baseline without a subscription");
    assert!(mirror.snapshot().is_empty());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(feed.subscribe_calls(), 2);
    assert_eq!(feed.baseline_calls(), 1);
    let titles: Vec<_> = mirror.snapshot().into_iter().map(|s| s.title).collect();
    assert_eq!(titles, vec!["a"]);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn merged_view_prefers_optimistic_local_edit() {
    let mirror = LiveMirror::new();
    let local = LocalSignals::new();

    let mut live_version = named("abc", "A-old");
    live_version.status = signalbox_core::SignalStatus::Inbox;
    mirror.replace_all(vec![live_version]);

    let mut local_version = named("abc", "A");
    local_version.status = signalbox_core::SignalStatus::Triaged;
    local.upsert(local_version.clone());

    let merged = merge_signals(&mirror.snapshot(), &local.snapshot());
    assert_eq!(merged, vec![local_version]);
}
