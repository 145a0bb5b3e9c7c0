use drill_core::model::{Difficulty, LearnerId, Operation, Session, UserSettingsDraft};
use drill_core::time::fixed_now;
use services::{AppServices, Clock, DataError, PracticeService};

fn finished_session(practice: &mut PracticeService) -> Session {
    let mut run = practice
        .start(Difficulty::Beginner, &[Operation::Addition, Operation::Subtraction], 4)
        .unwrap();
    while let Some(problem) = run.current() {
        let value = i64::from(problem.correct_answer());
        run.submit(value).unwrap();
    }
    run.finish().unwrap()
}

async fn seeded_learner(app: &mut AppServices, learner: LearnerId, sessions: usize) {
    let draft = UserSettingsDraft {
        name: Some("Sam".into()),
        problems_per_session: Some(15),
        ..UserSettingsDraft::default()
    };
    app.settings.save(learner, draft).await.unwrap();
    for _ in 0..sessions {
        let session = finished_session(&mut app.practice);
        app.progress.record_session(learner, &session).await.unwrap();
    }
}

#[tokio::test]
async fn export_then_import_restores_every_section() {
    let mut app = AppServices::in_memory(Clock::fixed(fixed_now()), Some(21));
    let source = LearnerId::new(1);
    let target = LearnerId::new(2);
    seeded_learner(&mut app, source, 2).await;

    let json = app.data.export(source).await.unwrap();
    assert!(json.contains("\"exportDate\""));

    let summary = app.data.import(target, &json).await.unwrap();
    assert!(summary.progress);
    assert!(summary.settings);
    assert_eq!(summary.sessions, Some(2));
    assert_eq!(summary.assessments, Some(2));

    let before = app.data.snapshot(source).await.unwrap();
    let after = app.data.snapshot(target).await.unwrap();
    assert_eq!(after.sessions, before.sessions);
    assert_eq!(after.assessments, before.assessments);
    assert_eq!(after.settings.as_ref().map(|s| s.name()), Some("Sam"));

    let (source_progress, target_progress) = (before.progress.unwrap(), after.progress.unwrap());
    assert_eq!(target_progress.total_sessions, source_progress.total_sessions);
    assert_eq!(target_progress.version, 1);
}

#[tokio::test]
async fn imported_progress_moves_past_the_stored_version() {
    let mut app = AppServices::in_memory(Clock::fixed(fixed_now()), Some(4));
    let learner = LearnerId::new(8);
    seeded_learner(&mut app, learner, 2).await;

    let json = app.data.export(learner).await.unwrap();
    app.data.import(learner, &json).await.unwrap();
    let stored = app.progress.progress(learner).await.unwrap().unwrap();
    assert_eq!(stored.version, 3);

    // Recording still works against the bumped version.
    let session = finished_session(&mut app.practice);
    let recorded = app.progress.record_session(learner, &session).await.unwrap();
    assert_eq!(recorded.progress.version, 4);
}

#[tokio::test]
async fn malformed_import_writes_nothing() {
    let mut app = AppServices::in_memory(Clock::fixed(fixed_now()), Some(6));
    let learner = LearnerId::new(5);
    seeded_learner(&mut app, learner, 1).await;
    let before = app.data.snapshot(learner).await.unwrap();

    let err = app
        .data
        .import(learner, r#"{"sessions": [], "settings": {"grade": 40}}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Import(_)));

    let err = app.data.import(learner, "{not json").await.unwrap_err();
    assert!(matches!(err, DataError::Import(_)));

    let after = app.data.snapshot(learner).await.unwrap();
    assert_eq!(after.sessions, before.sessions);
    assert_eq!(after.progress, before.progress);
}

#[tokio::test]
async fn partial_import_leaves_other_sections_alone() {
    let mut app = AppServices::in_memory(Clock::fixed(fixed_now()), Some(13));
    let learner = LearnerId::new(6);
    seeded_learner(&mut app, learner, 1).await;

    let summary = app
        .data
        .import(learner, r#"{"settings": {"name": "Kim", "theme": "dark"}}"#)
        .await
        .unwrap();
    assert!(summary.settings);
    assert!(!summary.progress);
    assert_eq!(summary.sessions, None);

    assert_eq!(app.settings.load(learner).await.unwrap().name(), "Kim");
    assert_eq!(app.reports.recent_sessions(learner, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn clear_removes_everything_including_settings() {
    let mut app = AppServices::in_memory(Clock::fixed(fixed_now()), Some(17));
    let learner = LearnerId::new(7);
    seeded_learner(&mut app, learner, 1).await;

    app.data.clear(learner).await.unwrap();

    let snapshot = app.data.snapshot(learner).await.unwrap();
    assert!(snapshot.progress.is_none());
    assert!(snapshot.settings.is_none());
    assert!(snapshot.sessions.is_empty());
    assert!(snapshot.assessments.is_empty());
    assert_eq!(app.settings.load(learner).await.unwrap().problems_per_session(), 10);
}
