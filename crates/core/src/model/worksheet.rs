use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::operation::{Difficulty, Operation};
use crate::model::problem::Problem;

pub const MIN_FONT_SIZE: u8 = 8;
pub const MAX_FONT_SIZE: u8 = 32;
pub const MIN_MARGIN_MM: u32 = 5;
pub const MAX_MARGIN_MM: u32 = 50;
pub const MAX_WORKSHEET_PROBLEMS: u32 = 200;
pub const DEFAULT_WORKSHEET_TITLE: &str = "Math Practice";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WorksheetError {
    #[error("worksheet needs at least one operation")]
    NoOperations,

    #[error("problem count must be between 1 and {MAX_WORKSHEET_PROBLEMS}, got {0}")]
    InvalidProblemCount(u32),

    #[error("font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}, got {0}")]
    InvalidFontSize(u8),

    #[error("margin must be between {MIN_MARGIN_MM} and {MAX_MARGIN_MM} mm, got {0}")]
    InvalidMargin(u32),

    #[error("unknown layout: {0}")]
    UnknownLayout(String),

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

//
// ─── LAYOUT ────────────────────────────────────────────────────────────────────
//

/// Problems per printed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    Single,
    #[default]
    Double,
    Triple,
}

impl Layout {
    #[must_use]
    pub fn per_row(self) -> usize {
        match self {
            Layout::Single => 1,
            Layout::Double => 2,
            Layout::Triple => 3,
        }
    }
}

impl FromStr for Layout {
    type Err = WorksheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "1" => Ok(Layout::Single),
            "double" | "2" => Ok(Layout::Double),
            "triple" | "3" => Ok(Layout::Triple),
            other => Err(WorksheetError::UnknownLayout(other.to_string())),
        }
    }
}

//
// ─── PRESETS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetPreset {
    Elementary,
    Intermediate,
    Advanced,
}

impl WorksheetPreset {
    pub const ALL: [WorksheetPreset; 3] = [
        WorksheetPreset::Elementary,
        WorksheetPreset::Intermediate,
        WorksheetPreset::Advanced,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            WorksheetPreset::Elementary => "elementary",
            WorksheetPreset::Intermediate => "intermediate",
            WorksheetPreset::Advanced => "advanced",
        }
    }

    /// Draft pre-filled with this preset; callers may tweak fields before
    /// validating.
    #[must_use]
    pub fn draft(self) -> WorksheetConfigDraft {
        let (title, difficulty, operations, problem_count, layout, font_size) = match self {
            WorksheetPreset::Elementary => (
                "Math Practice",
                Difficulty::Beginner,
                vec![Operation::Addition, Operation::Subtraction],
                20,
                Layout::Double,
                14,
            ),
            WorksheetPreset::Intermediate => (
                "Math Practice (Intermediate)",
                Difficulty::Intermediate,
                vec![
                    Operation::Addition,
                    Operation::Subtraction,
                    Operation::Multiplication,
                ],
                25,
                Layout::Double,
                13,
            ),
            WorksheetPreset::Advanced => (
                "Math Practice (Advanced)",
                Difficulty::Advanced,
                Operation::ALL.to_vec(),
                30,
                Layout::Triple,
                12,
            ),
        };

        WorksheetConfigDraft {
            title: title.to_string(),
            difficulty,
            operations,
            problem_count,
            layout,
            font_size,
            ..WorksheetConfigDraft::default()
        }
    }
}

impl fmt::Display for WorksheetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorksheetPreset {
    type Err = WorksheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        WorksheetPreset::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or(WorksheetError::UnknownPreset(key))
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Unvalidated worksheet options.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct WorksheetConfigDraft {
    pub title: String,
    pub student_name: Option<String>,
    pub class_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub difficulty: Difficulty,
    pub operations: Vec<Operation>,
    pub problem_count: u32,
    pub layout: Layout,
    pub show_answers: bool,
    pub include_answer_sheet: bool,
    pub font_size: u8,
    pub margin_mm: u32,
}

impl Default for WorksheetConfigDraft {
    fn default() -> Self {
        Self {
            title: DEFAULT_WORKSHEET_TITLE.to_string(),
            student_name: None,
            class_name: None,
            date: None,
            difficulty: Difficulty::Beginner,
            operations: vec![Operation::Addition],
            problem_count: 20,
            layout: Layout::Double,
            show_answers: false,
            include_answer_sheet: true,
            font_size: 14,
            margin_mm: 20,
        }
    }
}

impl WorksheetConfigDraft {
    /// Validate and normalize the draft.
    ///
    /// Duplicate operations are dropped, keeping first occurrence order.
    ///
    /// # Errors
    ///
    /// Returns `WorksheetError` if the operation list is empty or a numeric
    /// option is out of range.
    pub fn validate(self) -> Result<WorksheetConfig, WorksheetError> {
        let mut operations: Vec<Operation> = Vec::with_capacity(self.operations.len());
        for op in self.operations {
            if !operations.contains(&op) {
                operations.push(op);
            }
        }
        if operations.is_empty() {
            return Err(WorksheetError::NoOperations);
        }
        if !(1..=MAX_WORKSHEET_PROBLEMS).contains(&self.problem_count) {
            return Err(WorksheetError::InvalidProblemCount(self.problem_count));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            return Err(WorksheetError::InvalidFontSize(self.font_size));
        }
        if !(MIN_MARGIN_MM..=MAX_MARGIN_MM).contains(&self.margin_mm) {
            return Err(WorksheetError::InvalidMargin(self.margin_mm));
        }

        let title = self.title.trim();
        let title = if title.is_empty() {
            DEFAULT_WORKSHEET_TITLE.to_string()
        } else {
            title.to_string()
        };

        Ok(WorksheetConfig {
            title,
            student_name: normalize_optional(self.student_name),
            class_name: normalize_optional(self.class_name),
            date: self.date,
            difficulty: self.difficulty,
            operations,
            problem_count: self.problem_count,
            layout: self.layout,
            show_answers: self.show_answers,
            include_answer_sheet: self.include_answer_sheet,
            font_size: self.font_size,
            margin_mm: self.margin_mm,
        })
    }
}

/// Validated layout and content options for a printable worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct WorksheetConfig {
    title: String,
    student_name: Option<String>,
    class_name: Option<String>,
    date: Option<NaiveDate>,
    difficulty: Difficulty,
    operations: Vec<Operation>,
    problem_count: u32,
    layout: Layout,
    show_answers: bool,
    include_answer_sheet: bool,
    font_size: u8,
    margin_mm: u32,
}

impl WorksheetConfig {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn student_name(&self) -> Option<&str> {
        self.student_name.as_deref()
    }

    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn problem_count(&self) -> u32 {
        self.problem_count
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn show_answers(&self) -> bool {
        self.show_answers
    }

    /// An answer sheet is only produced when answers are not already inline.
    #[must_use]
    pub fn wants_answer_sheet(&self) -> bool {
        self.include_answer_sheet && !self.show_answers
    }

    #[must_use]
    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    #[must_use]
    pub fn margin_mm(&self) -> u32 {
        self.margin_mm
    }
}

//
// ─── WORKSHEET ─────────────────────────────────────────────────────────────────
//

/// A generated worksheet: the config plus its ordered problems.
#[derive(Debug, Clone)]
pub struct Worksheet {
    config: WorksheetConfig,
    problems: Vec<Problem>,
}

impl Worksheet {
    #[must_use]
    pub fn new(config: WorksheetConfig, problems: Vec<Problem>) -> Self {
        Self { config, problems }
    }

    #[must_use]
    pub fn config(&self) -> &WorksheetConfig {
        &self.config
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Problems grouped into printed rows, numbered from 1.
    pub fn rows(&self) -> impl Iterator<Item = Vec<(usize, &Problem)>> {
        let per_row = self.config.layout.per_row();
        self.problems
            .chunks(per_row)
            .enumerate()
            .map(move |(row, chunk)| {
                chunk
                    .iter()
                    .enumerate()
                    .map(|(col, p)| (row * per_row + col + 1, p))
                    .collect()
            })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
