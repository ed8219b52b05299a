use serial_press::{ChapterChanges, NewChapter, PressError, Status, StoryId};

use crate::support::{chapter, fresh, live_chapters, new_chapter, story};

#[tokio::test]
async fn create_derives_word_count_and_timestamps() {
    let (manager, _) = fresh();
    let story = story(&manager, "Counted").await;

    let outcome = manager
        .create_chapter(NewChapter {
            story_id: StoryId::from(story.id.as_str()),
            chapter_number: 1,
            title: "  Opening  ".into(),
            content: "<p>It was&nbsp;a <em>dark</em> night.</p>".into(),
            status: Status::Draft,
        })
        .await
        .unwrap();

    assert!(outcome.is_clean());
    let created = outcome.into_value();
    assert_eq!(created.title, "Opening");
    assert_eq!(created.word_count, 5);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(created.story_id.as_str(), story.id);
}

#[tokio::test]
async fn duplicate_chapter_number_is_rejected() {
    let (manager, store) = fresh();
    let story = story(&manager, "Unique").await;
    chapter(&manager, &story.id, 1, Status::Draft).await;

    let err = manager
        .create_chapter(new_chapter(&story.id, 1, Status::Published))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PressError::DuplicateChapterNumber { chapter_number: 1, .. }
    ));
    assert_eq!(err.status_code(), 409);
    assert_eq!(live_chapters(&store, &story.id).await, 1);
}

#[tokio::test]
async fn concurrent_creates_with_the_same_number_admit_one() {
    let (manager, store) = fresh();
    let story = story(&manager, "Race").await;

    let (left, right) = tokio::join!(
        manager.create_chapter(new_chapter(&story.id, 1, Status::Draft)),
        manager.create_chapter(new_chapter(&story.id, 1, Status::Draft)),
    );

    let failures: Vec<PressError> = [left, right].into_iter().filter_map(Result::err).collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        PressError::DuplicateChapterNumber { .. }
    ));
    assert_eq!(live_chapters(&store, &story.id).await, 1);
    assert_eq!(manager.get_story(&story.id).await.unwrap().chapter_count, 1);
}

#[tokio::test]
async fn renumbering_checks_other_chapters_only() {
    let (manager, _) = fresh();
    let story = story(&manager, "Reordered").await;
    let first = chapter(&manager, &story.id, 1, Status::Draft).await;
    chapter(&manager, &story.id, 2, Status::Draft).await;

    let err = manager
        .update_chapter(
            &first.id,
            ChapterChanges {
                chapter_number: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PressError::DuplicateChapterNumber { .. }));

    let same = manager
        .update_chapter(
            &first.id,
            ChapterChanges {
                chapter_number: Some(1),
                title: Some("Still first".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_value();
    assert_eq!(same.chapter_number, 1);

    let moved = manager
        .update_chapter(
            &first.id,
            ChapterChanges {
                chapter_number: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_value();
    assert_eq!(moved.chapter_number, 3);
    assert_eq!(manager.next_chapter_number(&story.id).await.unwrap(), 4);
}

#[tokio::test]
async fn chapter_for_a_missing_story_is_not_written() {
    let (manager, store) = fresh();

    let err = manager
        .create_chapter(new_chapter("no-such-story", 1, Status::Draft))
        .await
        .unwrap_err();

    assert!(matches!(err, PressError::NotFound { kind: "story", .. }));
    assert_eq!(store.document_count("chapters").unwrap(), 0);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let (manager, store) = fresh();
    let story = story(&manager, "Strict").await;

    let mut untitled = new_chapter(&story.id, 1, Status::Draft);
    untitled.title = "   ".into();
    let err = manager.create_chapter(untitled).await.unwrap_err();
    assert!(matches!(err, PressError::Validation(_)));

    let err = manager
        .create_chapter(new_chapter(&story.id, 0, Status::Draft))
        .await
        .unwrap_err();
    assert!(matches!(err, PressError::Validation(_)));
    assert_eq!(err.status_code(), 422);

    assert_eq!(store.document_count("chapters").unwrap(), 0);
}

#[tokio::test]
async fn content_update_recounts_words() {
    let (manager, _) = fresh();
    let story = story(&manager, "Wordy").await;
    let target = chapter(&manager, &story.id, 1, Status::Draft).await;

    let updated = manager
        .update_chapter(
            &target.id,
            ChapterChanges::content("<h1>Title</h1><p>one two three</p>"),
        )
        .await
        .unwrap()
        .into_value();

    assert_eq!(updated.word_count, 4);
    assert!(updated.updated_at > target.updated_at);
}

#[tokio::test]
async fn update_and_delete_of_unknown_chapter_are_not_found() {
    let (manager, _) = fresh();

    let err = manager
        .update_chapter("ghost", ChapterChanges::title("Boo"))
        .await
        .unwrap_err();
    assert!(matches!(err, PressError::NotFound { kind: "chapter", .. }));

    let err = manager.delete_chapter("ghost").await.unwrap_err();
    assert!(matches!(err, PressError::NotFound { kind: "chapter", .. }));

    let err = manager.get_chapter("ghost").await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn deleting_a_published_chapter_leaves_story_updated_at_alone() {
    let (manager, _) = fresh();
    let story = story(&manager, "Trimmed").await;
    let doomed = chapter(&manager, &story.id, 1, Status::Published).await;
    let before = manager.get_story(&story.id).await.unwrap();
    assert_eq!(before.chapter_count, 1);

    let outcome = manager.delete_chapter(&doomed.id).await.unwrap();
    assert!(outcome.is_clean());

    let after = manager.get_story(&story.id).await.unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.chapter_count, 0);
}

#[tokio::test]
async fn chapters_are_listed_in_reading_order() {
    let (manager, _) = fresh();
    let story = story(&manager, "Shuffled").await;
    for number in [3, 1, 2] {
        chapter(&manager, &story.id, number, Status::Draft).await;
    }
    let other = crate::support::story(&manager, "Elsewhere").await;
    chapter(&manager, &other.id, 1, Status::Draft).await;

    let numbers: Vec<u32> = manager
        .list_chapters(&story.id)
        .await
        .unwrap()
        .iter()
        .map(|chapter| chapter.chapter_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn recent_edits_are_newest_first_and_limited() {
    let (manager, _) = fresh();
    let story = story(&manager, "Busy").await;
    let one = chapter(&manager, &story.id, 1, Status::Draft).await;
    let two = chapter(&manager, &story.id, 2, Status::Draft).await;

    for (target, text) in [(&one, "a"), (&two, "b"), (&one, "c")] {
        manager
            .update_chapter(&target.id, ChapterChanges::content(text))
            .await
            .unwrap();
    }

    let recent = manager.recent_edits(Some(2)).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].chapter_id, one.id);
    assert_eq!(recent[1].chapter_id, two.id);
    assert!(recent[0].edited_at > recent[1].edited_at);

    assert_eq!(manager.recent_edits(None).await.unwrap().len(), 3);
    assert_eq!(manager.chapter_edits(&one.id).await.unwrap().len(), 2);
}
