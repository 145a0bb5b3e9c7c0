//! Bodies of the `mathdrill` subcommands.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use drill_core::analysis::SessionAnalysis;
use drill_core::model::{LearnerId, Operation, Session, UserSettings, WorksheetConfigDraft};
use services::{AppServices, PlainTextRenderer};
use tracing::debug;

use crate::{CliError, PracticeArgs, SettingsArgs, WorksheetArgs};

type CmdResult = Result<(), Box<dyn Error>>;

pub async fn practice(
    app: &mut AppServices,
    learner: LearnerId,
    args: PracticeArgs,
) -> CmdResult {
    let settings = app.settings.load(learner).await?;
    let (recommended, focus) = app.progress.recommendation(learner).await?;
    let difficulty = args.difficulty.unwrap_or(recommended);
    let operations = if args.ops.is_empty() { focus } else { args.ops };
    let count = args.count.unwrap_or(settings.problems_per_session());
    let count = usize::try_from(count).unwrap_or(usize::MAX);

    let mut run = app.practice.start(difficulty, &operations, count)?;
    println!(
        "Hi {}! {} problems, {}.",
        settings.name(),
        run.problems().len(),
        difficulty.description()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let Some((prompt, expected)) = run
            .current()
            .map(|problem| (problem.prompt(), problem.correct_answer()))
        else {
            break;
        };
        let step = run.progress();
        print!("[{}/{}] {prompt}", step.answered + 1, step.total);
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Err(CliError::Aborted.into());
        };
        let line = line?;
        let Ok(value) = line.trim().parse::<i64>() else {
            println!("Please type a whole number.");
            continue;
        };
        if run.submit(value)?.is_correct {
            println!("Correct!");
        } else {
            println!("Not quite, the answer is {expected}.");
        }
    }

    let session = run.finish()?;
    let recorded = app.progress.record_session(learner, &session).await?;
    print_results(&session, &settings);
    println!(
        "Next session: {} on {}.",
        recorded.progress.recommended_difficulty.description(),
        join_names(&recorded.progress.recommended_operations),
    );
    Ok(())
}

fn print_results(session: &Session, settings: &UserSettings) {
    let analysis = SessionAnalysis::of(session);
    println!();
    println!(
        "Score {} ({}), {}/{} correct, {:.0}% accuracy, {:.1}s per answer",
        session.score(),
        analysis.grade.label(),
        session.correct_count(),
        session.problems().len(),
        session.accuracy(),
        session.average_time_seconds()
    );
    for (op, tally) in &analysis.by_operation {
        println!("  {op}: {}/{} ({:.0}%)", tally.correct, tally.total, tally.accuracy());
    }
    if let Some(duration) = session.duration() {
        let limit = i64::from(settings.time_limit_seconds());
        if duration.num_seconds() > limit {
            println!("Took {}s, over the {limit}s time limit.", duration.num_seconds());
        }
    }
    for hint in &analysis.feedback {
        println!("- {}", hint.message());
    }
}

pub async fn report(app: &AppServices, learner: LearnerId, limit: usize) -> CmdResult {
    let report = app.reports.learning_report_in(learner, &Local).await?;
    println!("Practice time: {} min", report.total_practice_time.num_minutes());
    println!("Most practiced: {}", report.most_practiced_operation);
    println!("Trend: {}", report.trend.label());
    println!("Streak: {} day(s)", report.streak_days);

    let recent = app.reports.recent_sessions(learner, limit).await?;
    if !recent.is_empty() {
        println!();
        println!("Recent sessions:");
        for session in &recent {
            println!(
                "  {}  {:<12} score {:>3}  {}/{}",
                session.start_time().format("%Y-%m-%d %H:%M"),
                session.difficulty().description(),
                session.score(),
                session.correct_count(),
                session.problems().len()
            );
        }
    }

    if let Some(latest) = app.reports.assessments(learner).await?.first() {
        println!();
        println!("Overall score: {}", latest.overall_score);
        for rec in &latest.recommendations {
            println!("  [{}] {}", rec.priority, rec.reason);
        }
    }
    Ok(())
}

pub fn worksheet(app: &mut AppServices, args: WorksheetArgs) -> CmdResult {
    let mut draft = args
        .preset
        .map_or_else(WorksheetConfigDraft::default, |preset| preset.draft());
    if let Some(title) = args.title {
        draft.title = title;
    }
    if let Some(difficulty) = args.difficulty {
        draft.difficulty = difficulty;
    }
    if !args.ops.is_empty() {
        draft.operations = args.ops;
    }
    if let Some(count) = args.count {
        draft.problem_count = count;
    }
    if let Some(layout) = args.layout {
        draft.layout = layout;
    }
    if let Some(size) = args.font_size {
        draft.font_size = size;
    }
    if let Some(margin) = args.margin_mm {
        draft.margin_mm = margin;
    }
    draft.student_name = args.student_name.or(draft.student_name);
    draft.class_name = args.class_name.or(draft.class_name);
    draft.date = args.date.or(draft.date);
    draft.show_answers |= args.show_answers;
    if args.no_answer_sheet {
        draft.include_answer_sheet = false;
    }

    let config = draft.validate()?;
    let text = app
        .worksheets
        .render(config, &PlainTextRenderer::new())?
        .to_text();
    write_output(args.out.as_deref(), &text)
}

pub async fn settings(app: &AppServices, learner: LearnerId, args: SettingsArgs) -> CmdResult {
    let changed = args.name.is_some()
        || args.grade.is_some()
        || args.problems_per_session.is_some()
        || args.time_limit.is_some()
        || args.sound.is_some()
        || args.animation.is_some()
        || args.theme.is_some();

    let mut current = app.settings.load(learner).await?;
    if changed {
        let mut draft = current.to_draft();
        draft.name = args.name.or(draft.name);
        draft.grade = args.grade.or(draft.grade);
        draft.problems_per_session = args.problems_per_session.or(draft.problems_per_session);
        draft.time_limit_seconds = args.time_limit.or(draft.time_limit_seconds);
        draft.enable_sound = args.sound.or(draft.enable_sound);
        draft.enable_animation = args.animation.or(draft.enable_animation);
        draft.theme = args.theme.map(Into::into).or(draft.theme);
        current = app.settings.save(learner, draft).await?;
    }

    println!("name:                 {}", current.name());
    println!("grade:                {}", current.grade());
    println!("problems per session: {}", current.problems_per_session());
    println!("time limit:           {}s", current.time_limit_seconds());
    println!("sound:                {}", current.enable_sound());
    println!("animation:            {}", current.enable_animation());
    println!("theme:                {:?}", current.theme());
    Ok(())
}

pub async fn export(app: &AppServices, learner: LearnerId, out: Option<PathBuf>) -> CmdResult {
    let json = app.data.export(learner).await?;
    write_output(out.as_deref(), &json)
}

pub async fn import(app: &AppServices, learner: LearnerId, file: &Path) -> CmdResult {
    let json = std::fs::read_to_string(file)?;
    let summary = app.data.import(learner, &json).await?;
    debug!(?summary, "import finished");

    let mut restored = Vec::new();
    if summary.progress {
        restored.push("progress".to_string());
    }
    if summary.settings {
        restored.push("settings".to_string());
    }
    if let Some(n) = summary.sessions {
        restored.push(format!("{n} session(s)"));
    }
    if let Some(n) = summary.assessments {
        restored.push(format!("{n} assessment(s)"));
    }
    if restored.is_empty() {
        println!("Nothing to import.");
    } else {
        println!("Imported {}.", restored.join(", "));
    }
    Ok(())
}

fn write_output(out: Option<&Path>, text: &str) -> CmdResult {
    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn join_names(operations: &[Operation]) -> String {
    operations
        .iter()
        .map(|op| op.name())
        .collect::<Vec<_>>()
        .join(", ")
}
