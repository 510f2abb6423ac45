#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that validates and resolves grade promotion of two units.
//!
//! The resolver owns no state. Callers destroy both inputs and place the
//! returned unit on the target cell.

use merge_defence_core::{Grade, MergeError, UnitKind, UnitSnapshot};
use rand::Rng;

/// Reports whether two units of the provided grades may merge.
///
/// True iff the grades match and are below the top of the ladder.
#[must_use]
pub fn can_merge_grades(first: Grade, second: Grade) -> bool {
    first == second && !first.is_max()
}

/// Validates that two placed units may merge.
///
/// A unit never merges with itself, even though its grade trivially matches.
pub fn can_merge(first: &UnitSnapshot, second: &UnitSnapshot) -> Result<(), MergeError> {
    if first.id == second.id {
        return Err(MergeError::SameUnit);
    }
    if first.grade != second.grade {
        return Err(MergeError::GradeMismatch);
    }
    if first.grade.is_max() {
        return Err(MergeError::MaxGrade);
    }
    Ok(())
}

/// Stateless merge resolver.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeResolver;

impl MergeResolver {
    /// Creates a new resolver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Promotes the grade and picks a uniformly random archetype.
    ///
    /// Returns `None` at the top of the ladder without consuming randomness.
    pub fn merge<R>(&self, grade: Grade, rng: &mut R) -> Option<(UnitKind, Grade)>
    where
        R: Rng + ?Sized,
    {
        let next = grade.next()?;
        let kind = UnitKind::ALL[rng.gen_range(0..UnitKind::ALL.len())];
        Some((kind, next))
    }
}
