use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    Difficulty, OperandRange, Operation, OperationError, Problem, ProblemError, ProblemId,
};
use crate::time::Clock;

/// Largest divisor ever drawn for division problems.
pub const MAX_DIVISOR: u32 = 12;
/// Smallest divisor ever drawn for division problems.
pub const MIN_DIVISOR: u32 = 2;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("unsupported operation: {0}")]
    InvalidOperation(String),

    #[error("invalid generator configuration: {0}")]
    InvalidConfiguration(&'static str),

    #[error(transparent)]
    Problem(#[from] ProblemError),
}

impl From<OperationError> for GeneratorError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::InvalidOperation(name) => Self::InvalidOperation(name),
            OperationError::InvalidDifficulty(_) => {
                Self::InvalidConfiguration("difficulty level must be between 1 and 5")
            }
        }
    }
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// Draws arithmetic problems within the operand table for each tier.
///
/// The random source and clock are injected: seed a `StdRng` and use a fixed
/// clock for reproducible sets, or [`ProblemGenerator::from_entropy`] in
/// production. Every problem costs a constant number of draws; there is no
/// rejection sampling.
///
/// # Examples
///
/// ```
/// # use drill_core::generator::ProblemGenerator;
/// # use drill_core::model::{Difficulty, Operation};
/// # use drill_core::time::fixed_clock;
/// let mut generator = ProblemGenerator::seeded(42, fixed_clock());
/// let problems = generator.generate(Operation::Division, Difficulty::Basic, 5);
/// assert_eq!(problems.len(), 5);
/// for p in &problems {
///     assert_eq!(p.operand1(), p.operand2() * p.correct_answer());
/// }
/// ```
pub struct ProblemGenerator<R = StdRng> {
    rng: R,
    clock: Clock,
}

impl ProblemGenerator<StdRng> {
    /// Deterministic generator for tests and reproducible worksheets.
    #[must_use]
    pub fn seeded(seed: u64, clock: Clock) -> Self {
        Self::new(StdRng::seed_from_u64(seed), clock)
    }

    /// Generator seeded from the thread-local entropy source.
    #[must_use]
    pub fn from_entropy(clock: Clock) -> Self {
        Self::new(StdRng::from_rng(&mut rand::rng()), clock)
    }
}

impl<R: Rng> ProblemGenerator<R> {
    #[must_use]
    pub fn new(rng: R, clock: Clock) -> Self {
        Self { rng, clock }
    }

    /// Mutable access to the random source, for ids drawn alongside problems.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Draw a single problem.
    pub fn generate_one(&mut self, operation: Operation, difficulty: Difficulty) -> Problem {
        let range = OperandRange::for_tier(difficulty, operation);

        let (operands, answer) = match operation {
            Operation::Addition => {
                let a = self.draw(range.min, range.max);
                let b = self.draw(range.min, range.max);
                ((a, b), a + b)
            }
            Operation::Multiplication => {
                let a = self.draw(range.min, range.max);
                let b = self.draw(range.min, range.max);
                ((a, b), a * b)
            }
            Operation::Subtraction => {
                let a = self.draw(range.min, range.max);
                // Upper bound depends on the first draw so the result stays >= 0.
                let b = self.draw(range.min, a.min(range.max));
                ((a, b), a - b)
            }
            Operation::Division => {
                let quotient = self.draw(range.min, range.max);
                let divisor = self.draw(MIN_DIVISOR, range.max.min(MAX_DIVISOR));
                ((quotient * divisor, divisor), quotient)
            }
        };

        let created_at = self.clock.now();
        let id = ProblemId::generate(created_at.timestamp_millis(), &mut self.rng);
        Problem::from_generated(id, operation, difficulty, operands, answer, created_at)
    }

    /// Draw exactly `count` problems of one operation.
    pub fn generate(
        &mut self,
        operation: Operation,
        difficulty: Difficulty,
        count: usize,
    ) -> Vec<Problem> {
        debug!(%operation, level = difficulty.level(), count, "generating problems");
        (0..count)
            .map(|_| self.generate_one(operation, difficulty))
            .collect()
    }

    /// Like [`generate`](Self::generate) but takes the operation by name.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidOperation` if the name is not one of
    /// the four operations.
    pub fn generate_named(
        &mut self,
        operation: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Problem>, GeneratorError> {
        let operation: Operation = operation.parse()?;
        Ok(self.generate(operation, difficulty, count))
    }

    /// Draw exactly `count` problems, each operation picked uniformly from
    /// `operations`, then shuffle the set so operation types interleave.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidConfiguration` if `operations` is empty.
    pub fn generate_mixed(
        &mut self,
        difficulty: Difficulty,
        count: usize,
        operations: &[Operation],
    ) -> Result<Vec<Problem>, GeneratorError> {
        if operations.is_empty() {
            return Err(GeneratorError::InvalidConfiguration(
                "mixed generation needs at least one operation",
            ));
        }
        debug!(
            operations = operations.len(),
            level = difficulty.level(),
            count,
            "generating mixed problems"
        );

        let mut problems = Vec::with_capacity(count);
        for _ in 0..count {
            let Some(&operation) = operations.choose(&mut self.rng) else {
                return Err(GeneratorError::InvalidConfiguration(
                    "mixed generation needs at least one operation",
                ));
            };
            problems.push(self.generate_one(operation, difficulty));
        }
        problems.shuffle(&mut self.rng);
        Ok(problems)
    }

    fn draw(&mut self, min: u32, max: u32) -> u32 {
        self.rng.random_range(min..=max)
    }
}

/// Build a problem from explicit draws instead of the random source.
///
/// For addition, subtraction, and multiplication `first` and `second` are the
/// operands. For division `first` is the quotient and `second` the divisor,
/// so the dividend is `first * second`. Draws must respect the tier's range,
/// subtraction needs `second <= first`, and the divisor must be in
/// `2..=min(max, 12)`.
///
/// # Errors
///
/// Returns `GeneratorError::InvalidConfiguration` when a draw is outside the
/// range the generator could have produced.
pub fn compose(
    operation: Operation,
    difficulty: Difficulty,
    first: u32,
    second: u32,
    id: ProblemId,
    clock: &Clock,
) -> Result<Problem, GeneratorError> {
    let range = OperandRange::for_tier(difficulty, operation);
    if !range.contains(first) {
        return Err(GeneratorError::InvalidConfiguration(
            "first draw is outside the tier range",
        ));
    }

    let (lhs, rhs) = match operation {
        Operation::Addition | Operation::Multiplication => {
            if !range.contains(second) {
                return Err(GeneratorError::InvalidConfiguration(
                    "second draw is outside the tier range",
                ));
            }
            (first, second)
        }
        Operation::Subtraction => {
            if second < range.min || second > first.min(range.max) {
                return Err(GeneratorError::InvalidConfiguration(
                    "subtrahend must not exceed the minuend",
                ));
            }
            (first, second)
        }
        Operation::Division => {
            if !(MIN_DIVISOR..=range.max.min(MAX_DIVISOR)).contains(&second) {
                return Err(GeneratorError::InvalidConfiguration(
                    "divisor is outside 2..=min(max, 12)",
                ));
            }
            (first * second, second)
        }
    };

    Ok(Problem::new(id, operation, difficulty, lhs, rhs, clock.now())?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_clock;
    use std::collections::HashSet;

    fn generator(seed: u64) -> ProblemGenerator {
        ProblemGenerator::seeded(seed, fixed_clock())
    }

    #[test]
    fn beginner_addition_scenario() {
        let p = compose(
            Operation::Addition,
            Difficulty::Beginner,
            7,
            4,
            ProblemId::new("q_1"),
            &fixed_clock(),
        )
        .unwrap();
        assert_eq!(p.correct_answer(), 11);
        assert_eq!(p.operator_symbol(), "+");
    }

    #[test]
    fn beginner_division_scenario() {
        let p = compose(
            Operation::Division,
            Difficulty::Beginner,
            5,
            3,
            ProblemId::new("q_2"),
            &fixed_clock(),
        )
        .unwrap();
        assert_eq!(p.operand1(), 15);
        assert_eq!(p.operand2(), 3);
        assert_eq!(p.correct_answer(), 5);
        assert_eq!(p.operand1(), p.operand2() * p.correct_answer());
    }

    #[test]
    fn compose_rejects_impossible_draws() {
        let clock = fixed_clock();
        let id = || ProblemId::new("q");
        assert!(compose(Operation::Addition, Difficulty::Beginner, 11, 1, id(), &clock).is_err());
        assert!(compose(Operation::Subtraction, Difficulty::Beginner, 3, 4, id(), &clock).is_err());
        assert!(compose(Operation::Division, Difficulty::Beginner, 5, 1, id(), &clock).is_err());
        assert!(compose(Operation::Division, Difficulty::Basic, 5, 13, id(), &clock).is_err());
    }

    #[test]
    fn generate_returns_exact_count() {
        let mut g = generator(1);
        for count in [0, 1, 7, 50] {
            assert_eq!(g.generate(Operation::Addition, Difficulty::Basic, count).len(), count);
        }
    }

    #[test]
    fn addition_and_multiplication_operands_stay_in_range() {
        let mut g = generator(2);
        for tier in Difficulty::ALL {
            for op in [Operation::Addition, Operation::Multiplication] {
                let range = OperandRange::for_tier(tier, op);
                for p in g.generate(op, tier, 200) {
                    assert!(range.contains(p.operand1()));
                    assert!(range.contains(p.operand2()));
                }
            }
        }
    }

    #[test]
    fn subtraction_never_goes_negative() {
        let mut g = generator(3);
        for tier in Difficulty::ALL {
            let range = OperandRange::for_tier(tier, Operation::Subtraction);
            for p in g.generate(Operation::Subtraction, tier, 500) {
                assert!(p.operand1() >= p.operand2());
                assert_eq!(p.correct_answer(), p.operand1() - p.operand2());
                assert!(range.contains(p.operand1()));
                assert!(p.operand2() >= range.min);
            }
        }
    }

    #[test]
    fn division_is_always_exact() {
        let mut g = generator(4);
        for tier in Difficulty::ALL {
            let range = OperandRange::for_tier(tier, Operation::Division);
            for p in g.generate(Operation::Division, tier, 500) {
                assert_eq!(p.operand1(), p.operand2() * p.correct_answer());
                assert!(p.operand2() >= MIN_DIVISOR);
                assert!(p.operand2() <= range.max.min(MAX_DIVISOR));
                assert!(range.contains(p.correct_answer()));
            }
        }
    }

    #[test]
    fn mixed_generation_uses_only_requested_operations() {
        let mut g = generator(5);
        let requested = [Operation::Subtraction, Operation::Division];
        for _ in 0..50 {
            let problems = g
                .generate_mixed(Difficulty::Intermediate, 10, &requested)
                .unwrap();
            assert_eq!(problems.len(), 10);
            assert!(problems.iter().all(|p| requested.contains(&p.operation())));
        }
    }

    #[test]
    fn mixed_generation_rejects_empty_operation_set() {
        let mut g = generator(6);
        let err = g.generate_mixed(Difficulty::Beginner, 10, &[]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfiguration(_)));
    }

    #[test]
    fn mixed_generation_never_substitutes_addition() {
        let mut g = generator(7);
        let problems = g
            .generate_mixed(Difficulty::Basic, 40, &[Operation::Division])
            .unwrap();
        assert!(problems.iter().all(|p| p.operation() == Operation::Division));
        let err = g.generate_mixed(Difficulty::Basic, 0, &[]).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidConfiguration(_)));
    }

    #[test]
    fn mixed_generation_interleaves_operations() {
        let mut g = generator(7);
        let problems = g
            .generate_mixed(Difficulty::Basic, 200, &Operation::ALL)
            .unwrap();
        let used: HashSet<Operation> = problems.iter().map(Problem::operation).collect();
        assert_eq!(used.len(), 4);
        let switches = problems
            .windows(2)
            .filter(|w| w[0].operation() != w[1].operation())
            .count();
        assert!(switches > 50);
    }

    #[test]
    fn unknown_operation_name_fails_fast() {
        let mut g = generator(8);
        let err = g
            .generate_named("exponent", Difficulty::Beginner, 3)
            .unwrap_err();
        assert_eq!(err, GeneratorError::InvalidOperation("exponent".into()));
        assert_eq!(
            g.generate_named("division", Difficulty::Beginner, 3)
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn same_seed_reproduces_the_same_set() {
        let a = generator(9).generate_mixed(Difficulty::Expert, 20, &Operation::ALL).unwrap();
        let b = generator(9).generate_mixed(Difficulty::Expert, 20, &Operation::ALL).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn ids_are_unique_within_a_set() {
        let problems = generator(10)
            .generate_mixed(Difficulty::Beginner, 100, &Operation::ALL)
            .unwrap();
        let ids: HashSet<&ProblemId> = problems.iter().map(Problem::id).collect();
        assert_eq!(ids.len(), problems.len());
    }
}
