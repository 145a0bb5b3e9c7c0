mod commands;

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use drill_core::model::{Difficulty, Layout, LearnerId, Operation, Theme, WorksheetPreset};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    InvalidDbUrl { raw: String },
    Aborted,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            CliError::Aborted => write!(f, "practice aborted before the last problem"),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Parser)]
#[command(name = "mathdrill")]
#[command(about = "Adaptive arithmetic practice and printable worksheets", long_about = None)]
struct Cli {
    /// SQLite database holding learner data
    #[arg(
        long = "db",
        env = "MATHDRILL_DB_URL",
        default_value = "sqlite://mathdrill.sqlite3"
    )]
    db_url: String,

    /// Learner whose records are read and written
    #[arg(long, env = "MATHDRILL_LEARNER", default_value = "1")]
    learner: LearnerId,

    /// Seed both problem generators for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a session of problems on the terminal
    Practice(PracticeArgs),

    /// Show the learning report and latest assessment
    Report {
        /// Number of recent sessions to list
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Generate a printable worksheet
    Worksheet(WorksheetArgs),

    /// Show or change learner settings
    Settings(SettingsArgs),

    /// Forget progress, history and assessments (settings are kept)
    Reset,

    /// Print a JSON backup of everything stored for the learner
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Restore a JSON backup produced by `export`
    Import { file: PathBuf },

    /// Remove every stored record for the learner, settings included
    Clear,
}

#[derive(Args)]
struct PracticeArgs {
    /// Tier 1 to 5; defaults to the recommended tier
    #[arg(long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    /// Comma separated operations; defaults to the recommended focus
    #[arg(long, value_delimiter = ',')]
    ops: Vec<Operation>,

    /// Problems in the session; defaults to the learner's setting
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Args)]
struct WorksheetArgs {
    /// Start from a named preset
    #[arg(long)]
    preset: Option<WorksheetPreset>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long, value_parser = parse_difficulty)]
    difficulty: Option<Difficulty>,

    #[arg(long, value_delimiter = ',')]
    ops: Vec<Operation>,

    #[arg(long)]
    count: Option<u32>,

    /// single, double or triple
    #[arg(long)]
    layout: Option<Layout>,

    /// Print a name line in the header
    #[arg(long)]
    student_name: Option<String>,

    #[arg(long = "class")]
    class_name: Option<String>,

    #[arg(long)]
    date: Option<chrono::NaiveDate>,

    #[arg(long)]
    font_size: Option<u8>,

    #[arg(long)]
    margin_mm: Option<u32>,

    /// Print answers next to the problems
    #[arg(long)]
    show_answers: bool,

    #[arg(long)]
    no_answer_sheet: bool,

    /// Write to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    grade: Option<u8>,

    #[arg(long)]
    problems_per_session: Option<u32>,

    #[arg(long)]
    time_limit: Option<u32>,

    #[arg(long)]
    sound: Option<bool>,

    #[arg(long)]
    animation: Option<bool>,

    #[arg(long, value_enum)]
    theme: Option<ThemeArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Colorful,
}

impl From<ThemeArg> for Theme {
    fn from(value: ThemeArg) -> Self {
        match value {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Colorful => Theme::Colorful,
        }
    }
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, String> {
    let level: u8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("difficulty must be a level from 1 to 5, got {raw}"))?;
    Difficulty::from_level(level).map_err(|e| e.to_string())
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(CliError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.db_url.trim().is_empty() {
        return Err(CliError::InvalidDbUrl { raw: cli.db_url }.into());
    }
    let db_url = normalize_sqlite_url(cli.db_url);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&db_url)?;
    let mut app = AppServices::new_sqlite(&db_url, Clock::system(), cli.seed).await?;
    let learner = cli.learner;

    match cli.command {
        Command::Practice(args) => commands::practice(&mut app, learner, args).await,
        Command::Report { limit } => commands::report(&app, learner, limit).await,
        Command::Worksheet(args) => commands::worksheet(&mut app, args),
        Command::Settings(args) => commands::settings(&app, learner, args).await,
        Command::Reset => {
            app.progress.reset(learner).await?;
            println!("Progress for learner {learner} has been reset.");
            Ok(())
        }
        Command::Export { out } => commands::export(&app, learner, out).await,
        Command::Import { file } => commands::import(&app, learner, &file).await,
        Command::Clear => {
            app.data.clear(learner).await?;
            println!("All data for learner {learner} has been removed.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
