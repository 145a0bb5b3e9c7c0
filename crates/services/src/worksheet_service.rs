use std::fmt::Write as _;

use drill_core::Clock;
use drill_core::generator::ProblemGenerator;
use drill_core::model::{Problem, Worksheet, WorksheetConfig};
use tracing::debug;

use crate::error::WorksheetServiceError;

/// Height of an A4 page in millimetres.
pub const PAGE_HEIGHT_MM: u32 = 297;
/// Extra vertical space each problem row takes beyond the font size.
pub const ROW_GAP_MM: u32 = 15;
/// Answers printed per row on the answer sheet.
pub const ANSWERS_PER_ROW: usize = 5;

/// Turns a generated worksheet into some printable form.
pub trait WorksheetRenderer {
    type Output;

    /// # Errors
    ///
    /// Returns `WorksheetServiceError::Render` if output cannot be produced.
    fn render(&self, worksheet: &Worksheet) -> Result<Self::Output, WorksheetServiceError>;
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

pub struct WorksheetService {
    generator: ProblemGenerator,
}

impl WorksheetService {
    #[must_use]
    pub fn new(generator: ProblemGenerator) -> Self {
        Self { generator }
    }

    #[must_use]
    pub fn seeded(seed: u64, clock: Clock) -> Self {
        Self::new(ProblemGenerator::seeded(seed, clock))
    }

    #[must_use]
    pub fn from_entropy(clock: Clock) -> Self {
        Self::new(ProblemGenerator::from_entropy(clock))
    }

    /// Generate the problems for `config` as one mixed, shuffled set.
    ///
    /// # Errors
    ///
    /// Returns `WorksheetServiceError::Generator` if generation fails.
    pub fn build(&mut self, config: WorksheetConfig) -> Result<Worksheet, WorksheetServiceError> {
        let count = usize::try_from(config.problem_count()).unwrap_or(usize::MAX);
        let problems = self
            .generator
            .generate_mixed(config.difficulty(), count, config.operations())?;
        debug!(count = problems.len(), title = config.title(), "worksheet built");
        Ok(Worksheet::new(config, problems))
    }

    /// Build a worksheet and hand it straight to `renderer`.
    ///
    /// # Errors
    ///
    /// Returns `WorksheetServiceError` if generation or rendering fails.
    pub fn render<R: WorksheetRenderer>(
        &mut self,
        config: WorksheetConfig,
        renderer: &R,
    ) -> Result<R::Output, WorksheetServiceError> {
        let worksheet = self.build(config)?;
        renderer.render(&worksheet)
    }
}

//
// ─── PLAIN TEXT ────────────────────────────────────────────────────────────────
//

/// Paginated plain-text rendering of a worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWorksheet {
    pub pages: Vec<String>,
    pub answer_sheet: Option<String>,
}

impl TextWorksheet {
    /// All pages joined with form feeds, answer sheet last.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut pages: Vec<&str> = self.pages.iter().map(String::as_str).collect();
        if let Some(sheet) = &self.answer_sheet {
            pages.push(sheet);
        }
        pages.join("\x0c\n")
    }
}

/// Lays problems out in rows of 1 to 3 and breaks pages by the row height
/// a printed sheet would use for the configured font and margins.
#[derive(Debug, Clone, Default)]
pub struct PlainTextRenderer {
    rows_per_page: Option<usize>,
}

impl PlainTextRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the number of problem rows per page instead of deriving it.
    #[must_use]
    pub fn with_rows_per_page(rows: usize) -> Self {
        Self {
            rows_per_page: Some(rows.max(1)),
        }
    }

    #[must_use]
    pub fn rows_per_page(&self, config: &WorksheetConfig) -> usize {
        self.rows_per_page.unwrap_or_else(|| {
            let usable = PAGE_HEIGHT_MM.saturating_sub(2 * config.margin_mm());
            let row = u32::from(config.font_size()) + ROW_GAP_MM;
            usize::try_from(usable / row).unwrap_or(1).max(1)
        })
    }

    fn header(config: &WorksheetConfig, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{}", config.title())?;
        if config.student_name().is_some() {
            writeln!(out, "Name: {}", "_".repeat(20))?;
        }
        if let Some(class) = config.class_name() {
            writeln!(out, "Class: {class}")?;
        }
        if let Some(date) = config.date() {
            writeln!(out, "Date: {date}")?;
        }
        writeln!(out, "Difficulty: {}", config.difficulty().description())?;
        let names: Vec<&str> = config.operations().iter().map(|op| op.name()).collect();
        writeln!(out, "Operations: {}", names.join(", "))?;
        writeln!(out, "Problems: {}", config.problem_count())?;
        writeln!(out, "{}", "-".repeat(60))
    }

    fn cell(number: usize, problem: &Problem, show_answers: bool) -> String {
        let blank = "_".repeat(problem.correct_answer().to_string().len().max(4));
        if show_answers {
            format!("{number}. {}{}", problem.prompt(), problem.correct_answer())
        } else {
            format!("{number}. {}{blank}", problem.prompt())
        }
    }

    fn answer_sheet(worksheet: &Worksheet) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Answer Key")?;
        for (row, chunk) in worksheet.problems().chunks(ANSWERS_PER_ROW).enumerate() {
            let cells: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(col, p)| {
                    format!("{}. {}", row * ANSWERS_PER_ROW + col + 1, p.correct_answer())
                })
                .collect();
            writeln!(out, "{}", pad_row(&cells, 12))?;
        }
        Ok(out)
    }
}

impl WorksheetRenderer for PlainTextRenderer {
    type Output = TextWorksheet;

    fn render(&self, worksheet: &Worksheet) -> Result<TextWorksheet, WorksheetServiceError> {
        let config = worksheet.config();
        let rows: Vec<Vec<String>> = worksheet
            .rows()
            .map(|row| {
                row.into_iter()
                    .map(|(n, p)| Self::cell(n, p, config.show_answers()))
                    .collect()
            })
            .collect();
        let width = rows.iter().flatten().map(String::len).max().unwrap_or(0) + 4;

        let mut pages = Vec::new();
        let mut chunks = rows.chunks(self.rows_per_page(config)).peekable();
        let mut first = true;
        loop {
            let mut page = String::new();
            if first {
                Self::header(config, &mut page)?;
                first = false;
            }
            if let Some(chunk) = chunks.next() {
                for row in chunk {
                    writeln!(page, "{}", pad_row(row, width))?;
                    writeln!(page)?;
                }
            }
            pages.push(page);
            if chunks.peek().is_none() {
                break;
            }
        }

        let answer_sheet = if config.wants_answer_sheet() {
            Some(Self::answer_sheet(worksheet)?)
        } else {
            None
        };

        Ok(TextWorksheet {
            pages,
            answer_sheet,
        })
    }
}

fn pad_row(cells: &[String], width: usize) -> String {
    let mut line = String::new();
    for cell in cells {
        let _ = write!(line, "{cell:<width$}");
    }
    line.trim_end().to_string()
}
