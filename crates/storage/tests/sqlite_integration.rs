use std::collections::HashMap;

use chrono::Duration;
use exam_core::model::{Attempt, AttemptId, AttemptMode, Essays, Question, QuestionId, QuestionType};
use exam_core::time::fixed_now;
use storage::repository::{
    AttemptRepository, DraftStore, EssayDraftRecord, InMemoryRepository, Storage,
};
use storage::sqlite::SqliteRepository;

fn draft(attempt: &str, text: &str) -> EssayDraftRecord {
    let mut essays = Essays::new();
    essays.set("1", text);
    essays.set("2", "Deuxième tâche");
    EssayDraftRecord {
        attempt_id: AttemptId::new(attempt),
        essays,
        saved_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_draft_slot_round_trips() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_draft_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.load_draft().await.unwrap().is_none());

    let saved = draft("A1", "Bonjour");
    repo.save_draft(&saved).await.unwrap();

    let loaded = repo.load_draft().await.unwrap().expect("draft present");
    assert_eq!(loaded, saved);
    assert_eq!(loaded.essays.word_count("2"), 2);
}

#[tokio::test]
async fn sqlite_slot_is_shared_across_attempts() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_draft_shared?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.save_draft(&draft("A1", "premier")).await.unwrap();
    let mut later = draft("A2", "second");
    later.saved_at = fixed_now() + Duration::minutes(5);
    repo.save_draft(&later).await.unwrap();

    let loaded = repo.load_draft().await.unwrap().expect("draft present");
    assert_eq!(loaded.attempt_id, AttemptId::new("A2"));
    assert_eq!(loaded.essays.get("1"), Some("second"));
    assert_eq!(loaded.saved_at, later.saved_at);
}

#[tokio::test]
async fn sqlite_clear_removes_slot_and_migrate_is_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_draft_clear?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo.migrate().await.expect("migrate twice");

    repo.save_draft(&draft("A1", "texte")).await.unwrap();
    repo.clear_draft().await.unwrap();
    assert!(repo.load_draft().await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_drafts_keep_the_seeded_attempt_backend() {
    let backend = InMemoryRepository::new();
    let attempt = Attempt::new(AttemptId::new("A9"), AttemptMode::Exam, 1, fixed_now(), Some(600))
        .unwrap();
    let question = Question::new(QuestionId::new("q1"), 1, QuestionType::Writing, "Décrivez.")
        .unwrap();
    backend
        .seed_attempt(attempt, vec![question], HashMap::new())
        .unwrap();

    let storage = Storage::from_in_memory(&backend)
        .with_sqlite_drafts("sqlite:file:memdb_storage_wiring?mode=memory&cache=shared")
        .await
        .expect("storage");

    let snapshot = storage.attempts.load_attempt(&AttemptId::new("A9")).await.unwrap();
    assert_eq!(snapshot.questions.len(), 1);

    storage.drafts.save_draft(&draft("A9", "salut")).await.unwrap();
    let loaded = storage.drafts.load_draft().await.unwrap().expect("draft present");
    assert_eq!(loaded.attempt_id, AttemptId::new("A9"));
    assert!(backend.load_draft().await.unwrap().is_none());
}
