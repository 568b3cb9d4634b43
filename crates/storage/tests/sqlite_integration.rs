use lesson_core::model::{
    Lesson, LessonId, StepContent, StepId, Unit, UnitId, UserId,
};
use lesson_core::time::fixed_now;
use serde_json::json;
use storage::repository::{ContentRepository, ProgressStore, StepRecord, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn step_record(id: u64, lesson: u64, order_index: u32, kind: &str) -> StepRecord {
    StepRecord {
        id: StepId::new(id),
        lesson_id: LessonId::new(lesson),
        order_index,
        kind: kind.to_string(),
        title: None,
        content: None,
        metadata: None,
    }
}

async fn seed_course(repo: &SqliteRepository) {
    let unit = Unit::new(UnitId::new(1), "Unit", None, 0).unwrap();
    repo.insert_unit(&unit).await.unwrap();
    let lesson = Lesson::new(LessonId::new(1), unit.id(), "Lesson", None, 0).unwrap();
    repo.insert_lesson(&lesson).await.unwrap();
}

#[tokio::test]
async fn sqlite_lists_content_in_traversal_order() {
    let repo = connect("memdb_order").await;

    let unit_b = Unit::new(UnitId::new(2), "Second", None, 1).unwrap();
    let unit_a = Unit::new(UnitId::new(1), "First", None, 0).unwrap();
    repo.insert_unit(&unit_b).await.unwrap();
    repo.insert_unit(&unit_a).await.unwrap();

    // two lessons sharing an order index: the id must break the tie
    let lesson_late = Lesson::new(LessonId::new(12), UnitId::new(1), "Late", None, 3).unwrap();
    let lesson_tie = Lesson::new(LessonId::new(11), UnitId::new(1), "Tie", None, 3).unwrap();
    repo.insert_lesson(&lesson_late).await.unwrap();
    repo.insert_lesson(&lesson_tie).await.unwrap();

    let units = repo.list_units().await.unwrap();
    assert_eq!(units[0].id(), UnitId::new(1));
    assert_eq!(units[1].id(), UnitId::new(2));

    let lessons = repo.list_lessons(UnitId::new(1)).await.unwrap();
    assert_eq!(lessons[0].id(), LessonId::new(11));
    assert_eq!(lessons[1].id(), LessonId::new(12));
}

#[tokio::test]
async fn sqlite_normalizes_legacy_quiz_metadata() {
    let repo = connect("memdb_quiz").await;
    seed_course(&repo).await;

    let mut record = step_record(1, 1, 0, "quiz");
    record.content = Some("Pick one".into());
    record.metadata = Some(json!({"options": ["Left", "Right"], "correctAnswer": 1}));
    repo.insert_step_record(&record).await.unwrap();

    let steps = repo.list_steps(LessonId::new(1)).await.unwrap();
    assert_eq!(steps.len(), 1);
    let StepContent::Quiz(quiz) = steps[0].content() else {
        panic!("expected quiz");
    };
    assert_eq!(quiz.question, "Pick one");
    assert_eq!(quiz.options[1].id, "opt-1");
    assert_eq!(quiz.correct_option_id.as_deref(), Some("opt-1"));
}

#[tokio::test]
async fn sqlite_tolerates_unparseable_metadata_text() {
    let repo = connect("memdb_badmeta").await;
    seed_course(&repo).await;

    // not JSON at all; the step must still load, just without metadata
    sqlx::query(
        "INSERT INTO lesson_steps (id, lesson_id, order_index, kind, title, content, metadata)
         VALUES (1, 1, 0, 'read', NULL, 'body text', '{not json')",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let steps = repo.list_steps(LessonId::new(1)).await.unwrap();
    let StepContent::Read(read) = steps[0].content() else {
        panic!("expected read");
    };
    assert_eq!(read.body, "body text");
}

#[tokio::test]
async fn sqlite_rejects_unknown_step_kind() {
    let repo = connect("memdb_badkind").await;
    seed_course(&repo).await;

    repo.insert_step_record(&step_record(1, 1, 0, "video"))
        .await
        .unwrap();

    let err = repo.list_steps(LessonId::new(1)).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn sqlite_completion_upsert_is_idempotent() {
    let repo = connect("memdb_progress").await;
    seed_course(&repo).await;

    let user = UserId::random();
    let lesson = LessonId::new(1);

    repo.upsert_completion(user, lesson, fixed_now())
        .await
        .unwrap();
    repo.upsert_completion(user, lesson, fixed_now())
        .await
        .unwrap();

    let completed = repo.completed_lesson_ids(user).await.unwrap();
    assert_eq!(completed.len(), 1);
    assert!(completed.contains(&lesson));

    // one logical row for the pair
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_progress")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn sqlite_completions_are_scoped_per_user() {
    let repo = connect("memdb_scoped").await;
    seed_course(&repo).await;

    let alice = UserId::random();
    let bob = UserId::random();
    repo.upsert_completion(alice, LessonId::new(1), fixed_now())
        .await
        .unwrap();

    assert!(repo.completed_lesson_ids(bob).await.unwrap().is_empty());
    assert_eq!(repo.completed_lesson_ids(alice).await.unwrap().len(), 1);
}
