//! Submission paths and the application lifecycle.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::watch;

use ph_core::config::{AppConfig, SubmissionMode};
use ph_core::constants::SYNC_STORIES_TAG;
use ph_core::error::PhError;
use ph_models::{LocalStore, Story, StoryDraft, StoryStatus};
use ph_services::event_bus::LoadSource;
use ph_services::lifecycle::{Application, LifecyclePhase};
use ph_services::pages::{Page, PageView};
use ph_services::submission::{StoryForm, SubmissionOutcome};

use common::{FakeSource, ScriptedDelivery};

struct TestApp {
    app: Application,
    source: Arc<FakeSource>,
    delivery: Arc<ScriptedDelivery>,
    online: watch::Sender<bool>,
    store: LocalStore,
    _dir: tempfile::TempDir,
}

async fn start_app(mode: SubmissionMode, online: bool) -> TestApp {
    let (store, dir) = common::create_test_store();
    let source = Arc::new(FakeSource::with_content());
    let delivery = Arc::new(ScriptedDelivery::new());
    let (tx, rx) = watch::channel(online);
    let mut config = AppConfig::default();
    config.submission.mode = mode;

    let mut app = Application::with_store(
        config,
        store.clone(),
        source.clone(),
        delivery.clone(),
        rx,
    );
    app.start().await;
    TestApp {
        app,
        source,
        delivery,
        online: tx,
        store,
        _dir: dir,
    }
}

#[tokio::test]
async fn offline_submission_is_queued_and_stored() {
    let t = start_app(SubmissionMode::Local, false).await;

    let outcome = t.app.submit(common::valid_form()).await.unwrap();
    let story = match outcome {
        SubmissionOutcome::Queued { story, queue_len } => {
            assert_eq!(queue_len, 1);
            story
        }
        other => panic!("expected queued, got {other:?}"),
    };
    assert!(story.id.as_str().starts_with("offline_"));
    assert_eq!(story.status, StoryStatus::Offline);
    assert_eq!(story.year, Some(1987));

    let stored: Vec<Story> = t.store.load_all().unwrap();
    let local = stored.iter().find(|s| s.id == story.id).unwrap();
    assert_eq!(local.status, StoryStatus::Offline);

    assert_eq!(t.app.queue().len().await, 1);
    assert!(t.app.background().is_registered(SYNC_STORIES_TAG).await);
    assert_eq!(t.delivery.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reconnect_publishes_offline_submission() {
    let mut t = start_app(SubmissionMode::Local, false).await;
    t.app.start_monitor();
    let mut rx = t.app.event_bus().subscribe();

    let outcome = t.app.submit(common::valid_form()).await.unwrap();
    let id = outcome.story().id.clone();

    t.online.send(true).unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            if let Ok(ph_services::AppEvent::ReplayFinished { .. }) = rx.recv().await {
                break;
            }
        }
    })
    .await
    .expect("replay after reconnect");

    assert!(t.app.queue().is_empty().await);
    let stored: Story = t.store.get(&id).unwrap().unwrap();
    assert_eq!(stored.status, StoryStatus::Published);
    t.app.shutdown().await;
    assert_eq!(t.app.phase(), LifecyclePhase::Stopped);
}

#[tokio::test]
async fn online_local_mode_publishes_without_network() {
    let t = start_app(SubmissionMode::Local, true).await;

    let outcome = t.app.submit(common::valid_form()).await.unwrap();
    let story = outcome.story().clone();
    assert!(matches!(outcome, SubmissionOutcome::Published(_)));
    assert!(story.id.as_str().starts_with("story_"));
    assert_eq!(story.status, StoryStatus::Published);

    assert!(t.app.queue().is_empty().await);
    assert_eq!(t.delivery.attempts.load(Ordering::SeqCst), 0);
    match t.app.view(Page::Stories).await.unwrap() {
        PageView::Stories { stories } => assert!(stories.iter().any(|s| s.id == story.id)),
        other => panic!("unexpected view {other:?}"),
    }
}

async fn listed_story_ids(app: &Application) -> Vec<String> {
    match app.view(Page::Stories).await.unwrap() {
        PageView::Stories { stories } => stories.iter().map(|s| s.id.to_string()).collect(),
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn published_submission_survives_reload() {
    let mut t = start_app(SubmissionMode::Local, true).await;
    t.app.loader().wait_for_mirror().await.unwrap();

    let id = t.app.submit(common::valid_form()).await.unwrap().story().id.to_string();
    assert!(listed_story_ids(&t.app).await.contains(&id));

    // Network reload: the server list does not have the story yet.
    t.app.reload().await.unwrap();
    let ids = listed_story_ids(&t.app).await;
    assert!(ids.contains(&id), "missing {id} after reload: {ids:?}");
    assert!(ids.contains(&"s1".to_string()));

    // Reloading again does not duplicate it.
    t.app.reload().await.unwrap();
    let ids = listed_story_ids(&t.app).await;
    assert_eq!(ids.iter().filter(|s| **s == id).count(), 1);
}

#[tokio::test]
async fn replayed_story_survives_reconnect_reload() {
    let mut t = start_app(SubmissionMode::Local, false).await;
    t.app.loader().wait_for_mirror().await.unwrap();

    let id = t.app.submit(common::valid_form()).await.unwrap().story().id.to_string();
    t.online.send(true).unwrap();
    let report = t.app.replay_now().await.unwrap();
    assert_eq!(report.delivered, 1);

    t.app.reload().await.unwrap();
    assert!(listed_story_ids(&t.app).await.contains(&id));
}

#[tokio::test]
async fn store_fallback_hides_queued_stories() {
    let mut t = start_app(SubmissionMode::Local, false).await;
    t.app.loader().wait_for_mirror().await.unwrap();

    let id = t.app.submit(common::valid_form()).await.unwrap().story().id.to_string();
    assert!(!listed_story_ids(&t.app).await.contains(&id));

    t.source.fail_all(true);
    let report = t.app.reload().await.unwrap();
    assert_eq!(report.source, LoadSource::LocalStore);

    let ids = listed_story_ids(&t.app).await;
    assert_eq!(ids, vec!["s1".to_string()]);
    assert_eq!(t.app.queue().len().await, 1);
}

#[tokio::test]
async fn online_remote_mode_delivers_or_queues() {
    let t = start_app(SubmissionMode::Remote, true).await;

    let outcome = t.app.submit(common::valid_form()).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Published(_)));
    assert_eq!(t.delivery.delivered_ids().len(), 1);

    t.delivery.fail_all.store(true, Ordering::SeqCst);
    let outcome = t.app.submit(common::valid_form()).await.unwrap();
    match outcome {
        SubmissionOutcome::Queued { story, .. } => assert_eq!(story.status, StoryStatus::Pending),
        other => panic!("expected queued, got {other:?}"),
    }
    assert_eq!(t.app.queue().len().await, 1);
}

#[tokio::test]
async fn invalid_form_creates_nothing() {
    let t = start_app(SubmissionMode::Local, false).await;
    let before = t.store.load_all::<Story>().unwrap().len();

    let form = StoryForm {
        year: Some("1900".into()),
        privacy: false,
        ..common::valid_form()
    };
    let err = t.app.submit(form).await.unwrap_err();
    match err {
        PhError::Validation(issues) => assert_eq!(issues.len(), 2),
        other => panic!("expected validation error, got {other}"),
    }

    assert_eq!(t.store.load_all::<Story>().unwrap().len(), before);
    assert!(t.app.queue().is_empty().await);
    assert!(!t.app.background().is_registered(SYNC_STORIES_TAG).await);
}

#[tokio::test]
async fn successful_submission_clears_draft() {
    let t = start_app(SubmissionMode::Local, true).await;
    t.app
        .drafts()
        .save(StoryDraft {
            author: "Maria".into(),
            text: "half written".into(),
            ..Default::default()
        })
        .unwrap();

    match t.app.view(Page::AddStory).await.unwrap() {
        PageView::AddStory { draft, .. } => {
            let draft = draft.unwrap();
            assert_eq!(draft.text, "half written");
            assert!(draft.saved_at.is_some());
        }
        other => panic!("unexpected view {other:?}"),
    }

    t.app.submit(common::valid_form()).await.unwrap();
    assert!(t.app.drafts().load().unwrap().is_none());
}

#[tokio::test]
async fn views_require_ready_and_track_first_visit() {
    let (store, _dir) = common::create_test_store();
    let (_tx, rx) = watch::channel(true);
    let mut app = Application::with_store(
        AppConfig::default(),
        store,
        Arc::new(FakeSource::with_content()),
        Arc::new(ScriptedDelivery::new()),
        rx,
    );

    assert_eq!(app.phase(), LifecyclePhase::Starting);
    assert!(matches!(
        app.view(Page::Home).await.unwrap_err(),
        PhError::ServiceNotInitialized(_)
    ));

    app.start().await;
    assert_eq!(app.phase(), LifecyclePhase::Ready);

    match app.view(Page::Home).await.unwrap() {
        PageView::Home { first_visit, counts, .. } => {
            assert!(first_visit);
            assert_eq!(counts.timeline, 2);
        }
        other => panic!("unexpected view {other:?}"),
    }
    match app.view(Page::Home).await.unwrap() {
        PageView::Home { first_visit, .. } => assert!(!first_visit),
        other => panic!("unexpected view {other:?}"),
    }

    match app.view(Page::History).await.unwrap() {
        PageView::History { timeline } => {
            let years: Vec<i32> = timeline.iter().map(|e| e.year).collect();
            assert_eq!(years, vec![1934, 1961]);
        }
        other => panic!("unexpected view {other:?}"),
    }
    assert!(matches!(app.view(Page::About).await.unwrap(), PageView::About));
}

#[tokio::test]
async fn unavailable_store_degrades_but_works() {
    let (_tx, rx) = watch::channel(false);
    let mut app = Application::with_store(
        AppConfig::default(),
        LocalStore::unavailable("quota exceeded"),
        Arc::new(FakeSource::failing()),
        Arc::new(ScriptedDelivery::new()),
        rx,
    );
    let report = app.start().await;
    assert_eq!(report.counts.timeline, 0);

    let outcome = app.submit(common::valid_form()).await.unwrap();
    assert!(matches!(outcome, SubmissionOutcome::Queued { .. }));
    assert_eq!(app.queue().len().await, 1);
    assert!(!app.queue().is_durable());

    let report = app.replay_now().await.unwrap();
    assert_eq!(report.delivered, 1);
}
