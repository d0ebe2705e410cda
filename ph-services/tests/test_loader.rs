//! Content loader: network path, mirroring and local fallback.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use ph_models::{Benefit, LocalStore, Story, TimelineEvent};
use ph_services::event_bus::{AppEvent, LoadSource};
use ph_services::loader::ContentLoader;
use ph_services::state::new_shared_state;

use common::FakeSource;

fn loader(source: Arc<FakeSource>, store: &LocalStore) -> ContentLoader {
    ContentLoader::new(
        source,
        store.clone(),
        new_shared_state(),
        common::create_test_event_bus(),
    )
}

#[tokio::test]
async fn network_load_fills_state_and_mirrors() {
    let (store, _dir) = common::create_test_store();
    let source = Arc::new(FakeSource::with_content());
    let state = new_shared_state();
    let bus = common::create_test_event_bus();
    let mut rx = bus.subscribe();
    let loader = ContentLoader::new(source, store.clone(), state.clone(), bus);

    let report = loader.load().await;
    assert_eq!(report.source, LoadSource::Network);
    assert_eq!(report.counts.timeline, 2);
    assert_eq!(report.counts.benefits, 3);
    assert!(report.network_error.is_none());
    assert_eq!(state.read().await.stories.len(), 1);

    let mirrored = loader.wait_for_mirror().await.unwrap().unwrap();
    assert_eq!(mirrored, report.counts);
    assert_eq!(store.load_all::<TimelineEvent>().unwrap().len(), 2);
    assert_eq!(store.load_all::<Benefit>().unwrap().len(), 3);

    let mut saw_loaded = false;
    let mut saw_mirror = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            AppEvent::ContentLoaded { source, .. } => {
                assert_eq!(source, LoadSource::Network);
                saw_loaded = true;
            }
            AppEvent::MirrorCompleted { .. } => saw_mirror = true,
            _ => {}
        }
    }
    assert!(saw_loaded && saw_mirror);
}

#[tokio::test]
async fn first_run_offline_yields_empty_collections() {
    let (store, _dir) = common::create_test_store();
    let loader = loader(Arc::new(FakeSource::failing()), &store);

    let report = loader.load().await;
    assert_eq!(report.source, LoadSource::LocalStore);
    assert_eq!(report.counts.timeline, 0);
    assert_eq!(report.counts.stories, 0);
    assert_eq!(report.counts.benefits, 0);
    assert!(report.network_error.is_some());
    assert!(loader.wait_for_mirror().await.unwrap().is_none());
}

#[tokio::test]
async fn partial_failure_discards_network_result() {
    let (store, _dir) = common::create_test_store();
    let source = Arc::new(FakeSource::with_content());

    let first = loader(source.clone(), &store);
    first.load().await;
    first.wait_for_mirror().await.unwrap();

    // The server now has more stories, but benefits fail.
    let mut changed = FakeSource::with_content();
    changed.stories.push(common::published_story("s2", "2024-01-01"));
    changed.fail_benefits.store(true, Ordering::SeqCst);
    let state = new_shared_state();
    let second = ContentLoader::new(
        Arc::new(changed),
        store.clone(),
        state.clone(),
        common::create_test_event_bus(),
    );

    let report = second.load().await;
    assert_eq!(report.source, LoadSource::LocalStore);
    assert_eq!(report.counts.stories, 1);
    assert_eq!(report.counts.benefits, 3);
    assert_eq!(state.read().await.timeline.len(), 2);
}

#[tokio::test]
async fn reload_overwrites_by_id() {
    let (store, _dir) = common::create_test_store();
    let first = loader(Arc::new(FakeSource::with_content()), &store);
    first.load().await;
    first.wait_for_mirror().await.unwrap();

    let mut updated = FakeSource::with_content();
    updated.timeline = vec![common::event(2, 1962, "New building (corrected)")];
    let second = loader(Arc::new(updated), &store);
    second.load().await;
    second.wait_for_mirror().await.unwrap();

    let mut events: Vec<TimelineEvent> = store.load_all().unwrap();
    events.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].year, 1962);
}

#[tokio::test]
async fn unavailable_store_still_loads() {
    let store = LocalStore::unavailable("permission denied");

    let online = loader(Arc::new(FakeSource::with_content()), &store);
    let report = online.load().await;
    assert_eq!(report.source, LoadSource::Network);
    assert!(online.wait_for_mirror().await.unwrap_err().is_storage());

    let offline = loader(Arc::new(FakeSource::failing()), &store);
    let report = offline.load().await;
    assert_eq!(report.counts.stories, 0);
    assert!(store.load_all::<Story>().is_err());
}
