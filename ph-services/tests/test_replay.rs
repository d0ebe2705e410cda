//! Pending queue persistence and in-order replay.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ph_models::{RecordId, Story, StoryStatus};
use ph_services::event_bus::AppEvent;
use ph_services::queue::PendingQueue;

use common::ScriptedDelivery;

#[tokio::test]
async fn replay_delivers_each_story_once_in_order() {
    let (store, _dir) = common::create_test_store();
    let delivery = Arc::new(ScriptedDelivery::new());
    let h = common::replay_harness(&store, delivery.clone());
    let mut rx = h.bus.subscribe();

    for id in ["offline_1", "offline_2", "offline_3"] {
        let story = common::queued_story(id);
        store.put(&story).unwrap();
        h.queue.enqueue(story).await.unwrap();
    }

    let report = h.coordinator.run_now("test").await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.delivered, 3);
    assert_eq!(report.remaining, 0);
    assert!(report.is_complete());
    assert_eq!(delivery.delivered_ids(), vec!["offline_1", "offline_2", "offline_3"]);
    assert!(h.queue.is_empty().await);

    let stored: Story = store.get(&RecordId::from("offline_2")).unwrap().unwrap();
    assert_eq!(stored.status, StoryStatus::Published);
    assert_eq!(h.state.read().await.stories.len(), 3);

    // Nothing left: a second pass delivers nothing.
    let again = h.coordinator.run_now("test").await.unwrap();
    assert_eq!(again.attempted, 0);
    assert_eq!(delivery.attempts.load(Ordering::SeqCst), 3);

    let mut published = 0;
    while let Ok(event) = rx.try_recv() {
        if let AppEvent::StoryPublished { .. } = event {
            published += 1;
        }
    }
    assert_eq!(published, 3);
}

#[tokio::test]
async fn first_failure_stops_the_pass() {
    let (store, _dir) = common::create_test_store();
    let delivery = Arc::new(ScriptedDelivery::new());
    delivery.fail_on("offline_2");
    let h = common::replay_harness(&store, delivery.clone());
    let mut rx = h.bus.subscribe();

    for id in ["offline_1", "offline_2", "offline_3"] {
        h.queue.enqueue(common::queued_story(id)).await.unwrap();
    }

    let report = h.coordinator.run_now("test").await.unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.remaining, 2);
    assert_eq!(report.failure.as_ref().unwrap().story_id, "offline_2");
    assert_eq!(delivery.attempts.load(Ordering::SeqCst), 2);

    let left: Vec<String> = h
        .queue
        .snapshot()
        .await
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(left, vec!["offline_2", "offline_3"]);

    let stopped = std::iter::from_fn(|| rx.try_recv().ok())
        .any(|e| matches!(e, AppEvent::ReplayStopped { remaining: 2, .. }));
    assert!(stopped);

    // Next trigger picks up where the last one stopped.
    delivery.fail_ids.lock().unwrap().clear();
    let report = h.coordinator.run_now("test").await.unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(delivery.delivered_ids(), vec!["offline_1", "offline_2", "offline_3"]);
}

#[tokio::test]
async fn queue_survives_restart() {
    let (store, dir) = common::create_test_store();
    let queue = PendingQueue::new(store.clone());
    queue.enqueue(common::queued_story("offline_a")).await.unwrap();
    queue.enqueue(common::queued_story("offline_b")).await.unwrap();
    assert!(queue.is_durable());
    drop(queue);
    drop(store);

    let reopened = PendingQueue::new(common::open_store_at(&dir));
    let ids: Vec<String> = reopened
        .snapshot()
        .await
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    assert_eq!(ids, vec!["offline_a", "offline_b"]);
}

#[tokio::test]
async fn concurrent_triggers_run_one_pass() {
    let (store, _dir) = common::create_test_store();
    let delivery = Arc::new(ScriptedDelivery::gated());
    let h = common::replay_harness(&store, delivery.clone());
    h.queue.enqueue(common::queued_story("offline_1")).await.unwrap();

    let first = h.coordinator.trigger("first");
    assert!(first.is_started());
    delivery.entered.notified().await;
    assert!(h.coordinator.is_running());

    let second = h.coordinator.trigger("second");
    assert!(!second.is_started());
    assert!(second.finished().await.is_none());

    delivery.release(1);
    let report = first.finished().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(!h.coordinator.is_running());
    assert_eq!(delivery.attempts.load(Ordering::SeqCst), 1);
}
