use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationError {
    #[error("unsupported operation: {0}")]
    InvalidOperation(String),

    #[error("difficulty level must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

//
// ─── OPERATION ─────────────────────────────────────────────────────────────────
//

/// One of the four arithmetic operations a learner can practice.
///
/// Ordering follows declaration order and is used as the tie-breaker whenever
/// operations are ranked.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Addition,
        Operation::Subtraction,
        Operation::Multiplication,
        Operation::Division,
    ];

    /// Symbol printed between the operands.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Addition => "+",
            Operation::Subtraction => "-",
            Operation::Multiplication => "×",
            Operation::Division => "÷",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Division => "division",
        }
    }

    /// Parses a comma separated list such as `"addition,subtraction"`.
    ///
    /// Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidOperation` for the first unknown entry.
    pub fn parse_list(raw: &str) -> Result<Vec<Operation>, OperationError> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "addition" | "add" | "+" => Ok(Operation::Addition),
            "subtraction" | "sub" | "-" => Ok(Operation::Subtraction),
            "multiplication" | "mul" | "×" | "x" | "*" => Ok(Operation::Multiplication),
            "division" | "div" | "÷" | "/" => Ok(Operation::Division),
            _ => Err(OperationError::InvalidOperation(s.to_string())),
        }
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Five ordered difficulty tiers, from "within 10" to four-digit problems.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Beginner,
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Beginner,
        Difficulty::Basic,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    pub const LOWEST: Difficulty = Difficulty::Beginner;
    pub const HIGHEST: Difficulty = Difficulty::Expert;

    /// Converts a 1-based level into a tier.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidDifficulty` outside `1..=5`.
    pub fn from_level(level: u8) -> Result<Self, OperationError> {
        match level {
            1 => Ok(Self::Beginner),
            2 => Ok(Self::Basic),
            3 => Ok(Self::Intermediate),
            4 => Ok(Self::Advanced),
            5 => Ok(Self::Expert),
            _ => Err(OperationError::InvalidDifficulty(level)),
        }
    }

    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Basic => 2,
            Self::Intermediate => 3,
            Self::Advanced => 4,
            Self::Expert => 5,
        }
    }

    /// The tier one step up, or `None` at the top.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_level(self.level() + 1).ok()
    }

    /// The tier one step down, or `None` at the bottom.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        self.level()
            .checked_sub(1)
            .and_then(|level| Self::from_level(level).ok())
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Beginner => "beginner - within 10",
            Self::Basic => "basic - within 20",
            Self::Intermediate => "intermediate - within 100",
            Self::Advanced => "advanced - large numbers",
            Self::Expert => "expert - four-digit / complex",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = OperationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_level(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.level()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

//
// ─── OPERAND RANGES ────────────────────────────────────────────────────────────
//

/// Inclusive `[min, max]` bounds for operand draws.
///
/// For division the range bounds the quotient, not the dividend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandRange {
    pub min: u32,
    pub max: u32,
}

impl OperandRange {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Looks up the bounds for a tier and operation.
    #[must_use]
    pub const fn for_tier(difficulty: Difficulty, operation: Operation) -> Self {
        use Difficulty as D;
        use Operation as O;

        match (difficulty, operation) {
            (D::Beginner, O::Addition | O::Subtraction) => Self::new(1, 10),
            (D::Beginner, O::Multiplication) => Self::new(1, 5),
            (D::Beginner, O::Division) => Self::new(2, 10),

            (D::Basic, O::Addition | O::Subtraction) => Self::new(1, 20),
            (D::Basic, O::Multiplication) => Self::new(1, 10),
            (D::Basic, O::Division) => Self::new(2, 20),

            (D::Intermediate, O::Addition | O::Subtraction) => Self::new(10, 100),
            (D::Intermediate, O::Multiplication) => Self::new(2, 12),
            (D::Intermediate, O::Division) => Self::new(2, 100),

            (D::Advanced, O::Addition | O::Subtraction) => Self::new(100, 1000),
            (D::Advanced, O::Multiplication) => Self::new(10, 99),
            (D::Advanced, O::Division) => Self::new(10, 1000),

            (D::Expert, O::Addition | O::Subtraction) => Self::new(100, 9999),
            (D::Expert, O::Multiplication) => Self::new(10, 999),
            (D::Expert, O::Division) => Self::new(10, 9999),
        }
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
