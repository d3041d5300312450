//! Short-circuit helpers for linear validation pipelines.
//!
//! ```rust,ignore
//! fn run(&self, ctx: &mut ValidationContext) -> Result<(), ValidationResult> {
//!     check(self.first(ctx))?;
//!     check(self.second(ctx))?;
//!     Ok(())
//! }
//! ```

use super::ValidationResult;

/// Converts a non-valid result into an early return value.
///
/// # Errors
///
/// Returns the result itself when it is not [`ValidationResult::Valid`].
pub fn check(result: ValidationResult) -> Result<(), ValidationResult> {
    match result {
        ValidationResult::Valid => Ok(()),
        other => Err(other),
    }
}

/// Collapses a pipeline outcome back into a result.
#[must_use]
pub fn finish(outcome: Result<(), ValidationResult>) -> ValidationResult {
    match outcome {
        Ok(()) => ValidationResult::Valid,
        Err(result) => result,
    }
}

/// Runs `checks` in order and returns the first non-valid result.
pub fn first_failure<I>(checks: I) -> ValidationResult
where
    I: IntoIterator,
    I::Item: FnOnce() -> ValidationResult,
{
    finish(checks.into_iter().try_for_each(|run| check(run())))
}
