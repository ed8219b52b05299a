//! The story/chapter rules, one test per rule.

use serial_press::{ChapterChanges, DocumentsExt, EditLogEntry, Filter, PressError, Status};

use crate::support::{chapter, fresh, live_chapters, new_chapter, story};

#[tokio::test]
async fn draft_chapter_creation_leaves_story_updated_at_alone() {
    let (manager, _) = fresh();
    let story = story(&manager, "Quiet Drafts").await;

    chapter(&manager, &story.id, 1, Status::Draft).await;
    chapter(&manager, &story.id, 2, Status::Draft).await;

    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, story.updated_at);
    assert_eq!(after.chapter_count, 2);
}

#[tokio::test]
async fn published_chapter_creation_moves_story_updated_at_to_commit_time() {
    let (manager, _) = fresh();
    let story = story(&manager, "Loud Launch").await;

    let created = chapter(&manager, &story.id, 1, Status::Published).await;

    let after = manager.get_story(&story.id).await.unwrap();
    assert!(after.updated_at > story.updated_at);
    assert_eq!(after.updated_at, created.created_at);
}

#[tokio::test]
async fn publish_transition_moves_story_updated_at_to_commit_time() {
    let (manager, _) = fresh();
    let story = story(&manager, "Slow Burn").await;
    let draft = chapter(&manager, &story.id, 1, Status::Draft).await;
    let before = manager.get_story(&story.id).await.unwrap();

    let published = manager
        .update_chapter(&draft.id, ChapterChanges::status(Status::Published))
        .await
        .unwrap()
        .into_value();

    let after = manager.get_story(&story.id).await.unwrap();
    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.updated_at, published.updated_at);
    assert_eq!(published.status, Status::Published);
}

#[tokio::test]
async fn edits_to_an_already_published_chapter_leave_story_updated_at_alone() {
    let (manager, _) = fresh();
    let story = story(&manager, "Steady State").await;
    let live = chapter(&manager, &story.id, 1, Status::Published).await;
    let before = manager.get_story(&story.id).await.unwrap();

    manager
        .update_chapter(
            &live.id,
            ChapterChanges {
                title: Some("Renamed".into()),
                status: Some(Status::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    manager
        .update_chapter(&live.id, ChapterChanges::content("<p>Polished prose.</p>"))
        .await
        .unwrap();

    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, before.updated_at);
}

#[tokio::test]
async fn unpublishing_a_chapter_leaves_story_updated_at_alone() {
    let (manager, _) = fresh();
    let story = story(&manager, "Withdrawn").await;
    let live = chapter(&manager, &story.id, 1, Status::Published).await;
    let before = manager.get_story(&story.id).await.unwrap();

    let withdrawn = manager
        .update_chapter(&live.id, ChapterChanges::status(Status::Draft))
        .await
        .unwrap()
        .into_value();

    assert_eq!(withdrawn.status, Status::Draft);
    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, before.updated_at);
}

#[tokio::test]
async fn editing_a_draft_chapter_leaves_story_updated_at_alone() {
    let (manager, _) = fresh();
    let story = story(&manager, "Work in Progress").await;
    let draft = chapter(&manager, &story.id, 1, Status::Draft).await;

    manager
        .update_chapter(&draft.id, ChapterChanges::content("<p>Rewritten opening.</p>"))
        .await
        .unwrap();
    manager
        .update_chapter(
            &draft.id,
            ChapterChanges {
                title: Some("New name".into()),
                status: Some(Status::Draft),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, story.updated_at);
}

#[tokio::test]
async fn chapter_count_tracks_live_chapters() {
    let (manager, store) = fresh();
    let story = story(&manager, "Counting").await;

    let one = chapter(&manager, &story.id, 1, Status::Draft).await;
    let two = chapter(&manager, &story.id, 2, Status::Published).await;
    chapter(&manager, &story.id, 3, Status::Draft).await;
    manager.delete_chapter(&two.id).await.unwrap();
    chapter(&manager, &story.id, 4, Status::Draft).await;
    manager.delete_chapter(&one.id).await.unwrap();

    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.chapter_count, 2);
    assert_eq!(live_chapters(&store, &story.id).await, 2);
}

#[tokio::test]
async fn next_chapter_number_is_one_past_the_highest() {
    let (manager, _) = fresh();
    let story = story(&manager, "Gaps").await;
    assert_eq!(manager.next_chapter_number(&story.id).await.unwrap(), 1);

    for number in [1, 2, 4] {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    assert_eq!(manager.next_chapter_number(&story.id).await.unwrap(), 5);
}

#[tokio::test]
async fn content_updates_append_exactly_one_edit_log_entry() {
    let (manager, store) = fresh();
    let story = story(&manager, "Audited").await;
    let target = chapter(&manager, &story.id, 1, Status::Draft).await;
    let edits = store.collection::<EditLogEntry>();

    let updated = manager
        .update_chapter(&target.id, ChapterChanges::content("<p>Second draft.</p>"))
        .await
        .unwrap()
        .into_value();

    let entries = edits.all().await.unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0].data;
    assert_eq!(entry.story_id.as_str(), story.id);
    assert_eq!(entry.chapter_id, target.id);
    assert_eq!(entry.edited_at, updated.updated_at);

    manager
        .update_chapter(&target.id, ChapterChanges::title("Retitled"))
        .await
        .unwrap();
    manager
        .update_chapter(&target.id, ChapterChanges::content(""))
        .await
        .unwrap();

    let for_chapter = edits
        .find(&Filter::eq("chapterId", target.id.as_str()))
        .await
        .unwrap();
    assert_eq!(for_chapter.len(), 1);
}

#[tokio::test]
async fn deleting_a_story_removes_it_and_its_chapters() {
    let (manager, store) = fresh();
    let story = story(&manager, "Ephemeral").await;
    for number in 1..=3 {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }

    manager.delete_story(&story.id).await.unwrap();

    assert_eq!(live_chapters(&store, &story.id).await, 0);
    assert!(manager.list_chapters(&story.id).await.unwrap().is_empty());
    let err = manager.get_story(&story.id).await.unwrap_err();
    assert!(matches!(err, PressError::NotFound { kind: "story", .. }));
}

#[tokio::test]
async fn publishing_chapter_two_bumps_story_but_retitling_chapter_one_does_not() {
    let (manager, _) = fresh();
    let story = story(&manager, "Mixed").await;
    let first = manager
        .create_chapter(new_chapter(&story.id, 1, Status::Published))
        .await
        .unwrap()
        .into_value();
    let second = chapter(&manager, &story.id, 2, Status::Draft).await;
    let start = manager.get_story(&story.id).await.unwrap();
    assert_eq!(start.updated_at, first.created_at);

    let published = manager
        .update_chapter(&second.id, ChapterChanges::status(Status::Published))
        .await
        .unwrap()
        .into_value();
    let bumped = manager.get_story(&story.id).await.unwrap();
    assert!(bumped.updated_at > start.updated_at);
    assert_eq!(bumped.updated_at, published.updated_at);

    manager
        .update_chapter(&first.id, ChapterChanges::title("x"))
        .await
        .unwrap();
    let settled = manager.get_story(&story.id).await.unwrap();
    assert_eq!(settled.updated_at, bumped.updated_at);
}
