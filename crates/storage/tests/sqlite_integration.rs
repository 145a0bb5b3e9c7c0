use chrono::Duration;
use drill_core::model::{
    AnswerRecord, Difficulty, LearnerId, Operation, Problem, ProblemId, ProgressRecord, Session,
    SessionId,
};
use drill_core::time::fixed_now;
use storage::kv::Slot;
use storage::repository::{
    KeyValueStore, ProgressRepository, SessionHistoryRepository, Storage, StorageError,
};
use storage::sqlite::SqliteStore;

fn build_session(seed: u32) -> Session {
    let problems: Vec<Problem> = (1..=4)
        .map(|i| {
            Problem::new(
                ProblemId::new(format!("q_{seed}_{i}")),
                Operation::Multiplication,
                Difficulty::Basic,
                i,
                seed % 9 + 1,
                fixed_now(),
            )
            .unwrap()
        })
        .collect();
    let answers = problems
        .iter()
        .map(|p| AnswerRecord::new(p, i64::from(p.correct_answer()), 2_000, fixed_now()))
        .collect();
    Session::complete(
        SessionId::new(uuid::Uuid::from_u128(u128::from(seed))),
        fixed_now(),
        fixed_now() + Duration::minutes(2),
        Difficulty::Basic,
        vec![Operation::Multiplication],
        problems,
        answers,
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_store_cas_and_remove() {
    let store = SqliteStore::connect("sqlite:file:memdb_kv_cas?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    store.migrate().await.expect("migrations are idempotent");

    assert!(store.compare_and_swap("a", None, "1").await.unwrap());
    assert!(!store.compare_and_swap("a", None, "2").await.unwrap());
    assert!(!store.compare_and_swap("a", Some("0"), "2").await.unwrap());
    assert!(store.compare_and_swap("a", Some("1"), "2").await.unwrap());
    assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

    store.set("a", "3").await.unwrap();
    assert_eq!(store.get("a").await.unwrap().as_deref(), Some("3"));
    store.remove("a").await.unwrap();
    assert_eq!(store.get("a").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_storage_persists_progress_and_history() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("open");
    let learner = LearnerId::new(4);

    let mut record = ProgressRecord::new(fixed_now());
    record.version = 1;
    record.total_sessions = 1;
    storage
        .progress
        .save_progress(learner, &record, 0)
        .await
        .unwrap();
    let loaded = storage.progress.load_progress(learner).await.unwrap();
    assert_eq!(loaded, Some(record.clone()));

    let stale = storage.progress.save_progress(learner, &record, 0).await;
    assert!(matches!(stale, Err(StorageError::Conflict)));

    storage
        .sessions
        .append_session(learner, &build_session(1))
        .await
        .unwrap();
    storage
        .sessions
        .append_session(learner, &build_session(2))
        .await
        .unwrap();
    let sessions = storage.sessions.list_sessions(learner).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0], build_session(2));
}

#[tokio::test]
async fn sqlite_corrupt_rows_read_as_empty() {
    let store = SqliteStore::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    store.migrate().await.expect("migrate");
    let learner = LearnerId::default();
    store
        .set(&Slot::Sessions.key(learner), "[{\"id\":")
        .await
        .unwrap();

    let storage = Storage::over(store);
    assert!(storage.sessions.list_sessions(learner).await.unwrap().is_empty());
}

#[tokio::test]
async fn reopening_skips_applied_migrations_and_keeps_rows() {
    let url = "sqlite:file:memdb_reopen?mode=memory&cache=shared";
    let first = SqliteStore::open(url).await.unwrap();
    first.set("math_learn/1/settings", "{}").await.unwrap();

    let second = SqliteStore::open(url).await.unwrap();
    assert_eq!(
        second.get("math_learn/1/settings").await.unwrap().as_deref(),
        Some("{}")
    );
    let (applied,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(second.pool())
        .await
        .unwrap();
    assert_eq!(applied, 1);
    drop(first);
}
