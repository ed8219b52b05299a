//! Commit failures and races, injected through `FlakyStore`.

use std::sync::Arc;

use serial_press::{
    ChapterChanges, ConsistencyManager, DocumentStore, Fields, PressConfig, PressError, Status,
    StoreError, WriteBatch,
};

use crate::support::{chapter, in_memory, live_chapters, new_chapter, story, FlakyStore};

fn flaky() -> (ConsistencyManager, Arc<FlakyStore>) {
    flaky_with(PressConfig::default(), in_memory())
}

fn flaky_with(
    config: PressConfig,
    inner: serial_press::InMemoryDocumentStore,
) -> (ConsistencyManager, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::new(inner));
    (ConsistencyManager::new(store.clone(), config), store)
}

fn touch_story(story_id: &str) -> WriteBatch {
    let mut batch = WriteBatch::new();
    batch.update(
        "stories",
        story_id,
        Fields::new().set("description", "edited elsewhere"),
    );
    batch
}

#[tokio::test]
async fn concurrent_story_write_aborts_chapter_creation() {
    let (manager, store) = flaky();
    let story = story(&manager, "Contended").await;

    store.race_next_commit(touch_story(&story.id));
    let err = manager
        .create_chapter(new_chapter(&story.id, 1, Status::Published))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PressError::TransactionAborted(StoreError::Conflict { .. })
    ));
    assert_eq!(live_chapters(store.inner(), &story.id).await, 0);
    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.chapter_count, 0);
    assert_eq!(after.description, "edited elsewhere");
}

#[tokio::test]
async fn concurrent_chapter_write_aborts_update_and_its_edit_log() {
    let (manager, store) = flaky();
    let story = story(&manager, "Contended").await;
    let target = chapter(&manager, &story.id, 1, Status::Draft).await;

    let mut rival = WriteBatch::new();
    rival.update(
        "chapters",
        &target.id,
        Fields::new().set("title", "Rival title"),
    );
    store.race_next_commit(rival);

    let err = manager
        .update_chapter(
            &target.id,
            ChapterChanges {
                content: Some("<p>Mine.</p>".into()),
                status: Some(Status::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PressError::TransactionAborted(_)));
    assert_eq!(err.status_code(), 409);
    assert_eq!(store.inner().document_count("edit_logs").unwrap(), 0);
    let current = manager.get_chapter(&target.id).await.unwrap();
    assert_eq!(current.title, "Rival title");
    assert_eq!(current.status, Status::Draft);
    let parent = manager.get_story(&story.id).await.unwrap();
    assert_eq!(parent.updated_at, story.updated_at);
}

#[tokio::test]
async fn failed_recount_is_reported_not_raised() {
    let (manager, store) = flaky();
    let story = story(&manager, "Degraded").await;

    store.fail_commits(1, 1);
    let outcome = manager
        .create_chapter(new_chapter(&story.id, 1, Status::Draft))
        .await
        .unwrap();

    assert!(!outcome.is_clean());
    assert_eq!(outcome.warnings[0].effect, "chapter_count");
    assert_eq!(outcome.warnings[0].story_id, story.id);
    assert_eq!(live_chapters(store.inner(), &story.id).await, 1);
    assert_eq!(manager.get_story(&story.id).await.unwrap().chapter_count, 0);

    assert_eq!(manager.recount_chapters(&story.id).await.unwrap(), 1);
    assert_eq!(manager.get_story(&story.id).await.unwrap().chapter_count, 1);
}

#[tokio::test]
async fn failed_recount_after_delete_is_reported() {
    let (manager, store) = flaky();
    let story = story(&manager, "Degraded").await;
    let doomed = chapter(&manager, &story.id, 1, Status::Draft).await;

    store.fail_commits(1, 1);
    let outcome = manager.delete_chapter(&doomed.id).await.unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(live_chapters(store.inner(), &story.id).await, 0);
    assert_eq!(manager.get_story(&story.id).await.unwrap().chapter_count, 1);
}

#[tokio::test]
async fn failed_primary_commit_writes_nothing() {
    let (manager, store) = flaky();
    let story = story(&manager, "Unlucky").await;

    store.fail_commits(0, 1);
    let err = manager
        .create_chapter(new_chapter(&story.id, 1, Status::Published))
        .await
        .unwrap_err();

    assert!(matches!(err, PressError::Store(StoreError::Storage(_))));
    assert_eq!(err.status_code(), 500);
    assert_eq!(live_chapters(store.inner(), &story.id).await, 0);
    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, story.updated_at);
}

fn small_batches() -> (ConsistencyManager, Arc<FlakyStore>) {
    flaky_with(
        PressConfig::default(),
        in_memory().with_max_batch_writes(2),
    )
}

#[tokio::test]
async fn cascade_in_small_batches_deletes_everything() {
    let (manager, store) = small_batches();
    let story = story(&manager, "Long Serial").await;
    for number in 1..=5 {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    manager.delete_story(&story.id).await.unwrap();

    assert_eq!(live_chapters(store.inner(), &story.id).await, 0);
    assert_eq!(store.inner().document_count("stories").unwrap(), 0);
}

#[tokio::test]
async fn interrupted_cascade_reports_progress_and_resumes() {
    let (manager, store) = small_batches();
    let story = story(&manager, "Interrupted").await;
    for number in 1..=3 {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    store.fail_commits(1, 1);
    let err = manager.delete_story(&story.id).await.unwrap_err();

    match err {
        PressError::PartialCascadeFailure {
            deleted, remaining, ..
        } => {
            assert_eq!(deleted, 2);
            assert_eq!(remaining, 1);
        }
        other => panic!("expected a partial cascade failure, got {other:?}"),
    }
    assert_eq!(live_chapters(store.inner(), &story.id).await, 1);
    assert!(manager.get_story(&story.id).await.is_ok());

    manager.delete_story(&story.id).await.unwrap();
    assert_eq!(live_chapters(store.inner(), &story.id).await, 0);
    assert!(matches!(
        manager.get_story(&story.id).await,
        Err(PressError::NotFound { .. })
    ));
}

#[tokio::test]
async fn cascade_failing_on_first_batch_writes_nothing() {
    let (manager, store) = small_batches();
    let story = story(&manager, "Untouched").await;
    for number in 1..=3 {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    store.fail_commits(0, 1);
    let err = manager.delete_story(&story.id).await.unwrap_err();

    assert!(matches!(err, PressError::Store(StoreError::Storage(_))));
    assert_eq!(live_chapters(store.inner(), &story.id).await, 3);
}

#[tokio::test]
async fn configured_batch_limit_caps_cascade_batches() {
    let mut config = PressConfig::default();
    config.max_batch_writes = 2;
    let (manager, store) = flaky_with(config, in_memory());
    let story = story(&manager, "Configured").await;
    for number in 1..=3 {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    store.fail_commits(1, 1);
    let err = manager.delete_story(&story.id).await.unwrap_err();

    assert!(matches!(err, PressError::PartialCascadeFailure { deleted: 2, .. }));
    assert_eq!(store.max_batch_writes(), serial_press::DEFAULT_MAX_BATCH_WRITES);
}

#[tokio::test]
async fn recount_of_unknown_story_is_not_found() {
    let (manager, store) = flaky();

    let err = manager.recount_chapters("no-such-story").await.unwrap_err();

    assert!(matches!(err, PressError::NotFound { kind: "story", .. }));
    assert_eq!(err.status_code(), 404);
    assert_eq!(store.inner().document_count("stories").unwrap(), 0);
}

#[tokio::test]
async fn story_removed_mid_update_aborts_the_edit() {
    let (manager, store) = flaky();
    let story = story(&manager, "Vanishing").await;

    let mut removal = WriteBatch::new();
    removal.delete("stories", &story.id);
    store.race_next_commit(removal);
    let err = manager
        .set_story_cover(&story.id, Some("https://img.example/c.png".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, PressError::TransactionAborted(StoreError::Conflict { .. })));
    assert_eq!(manager.recount_chapters(&story.id).await.unwrap_err().status_code(), 404);
}
