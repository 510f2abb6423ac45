#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that rolls the archetype and grade of summoned units.

use merge_defence_config::GradeWeights;
use merge_defence_core::{Grade, UnitKind};
use rand::Rng;

/// Weighted generator of `(archetype, grade)` pairs.
///
/// Archetypes are uniform. Grades follow cumulative-probability sampling over
/// the configured weight table in ladder order.
#[derive(Clone, Debug)]
pub struct SummonRoller {
    cumulative: [f64; Grade::ALL.len()],
}

impl SummonRoller {
    /// Creates a roller sampling grades from the provided weights.
    #[must_use]
    pub fn new(weights: GradeWeights) -> Self {
        let mut cumulative = [0.0; Grade::ALL.len()];
        let mut running = 0.0;
        for grade in Grade::ALL {
            running += weights.weight(grade);
            cumulative[grade.index()] = running;
        }
        Self { cumulative }
    }

    /// Rolls a uniformly chosen archetype and a weighted grade.
    pub fn roll<R>(&self, rng: &mut R) -> (UnitKind, Grade)
    where
        R: Rng + ?Sized,
    {
        let kind = UnitKind::ALL[rng.gen_range(0..UnitKind::ALL.len())];
        let grade = self.grade_for_sample(rng.gen::<f64>());
        (kind, grade)
    }

    /// Maps a uniform sample in `[0, 1)` to the first grade whose cumulative
    /// weight covers it.
    ///
    /// Falls back to [`Grade::Common`] when rounding leaves the sample above
    /// every cumulative weight.
    #[must_use]
    pub fn grade_for_sample(&self, sample: f64) -> Grade {
        Grade::ALL
            .into_iter()
            .find(|grade| sample <= self.cumulative[grade.index()])
            .unwrap_or(Grade::Common)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> GradeWeights {
        GradeWeights {
            common: 0.6,
            rare: 0.25,
            epic: 0.1,
            legend: 0.04,
            mythic: 0.01,
        }
    }

    #[test]
    fn samples_map_onto_cumulative_bands() {
        let roller = SummonRoller::new(weights());

        assert_eq!(roller.grade_for_sample(0.0), Grade::Common);
        assert_eq!(roller.grade_for_sample(0.59), Grade::Common);
        assert_eq!(roller.grade_for_sample(0.7), Grade::Rare);
        assert_eq!(roller.grade_for_sample(0.9), Grade::Epic);
        assert_eq!(roller.grade_for_sample(0.97), Grade::Legend);
        assert_eq!(roller.grade_for_sample(0.995), Grade::Mythic);
    }

    #[test]
    fn exhausted_table_falls_back_to_common() {
        let roller = SummonRoller::new(GradeWeights {
            common: 0.2,
            rare: 0.2,
            epic: 0.2,
            legend: 0.2,
            mythic: 0.19,
        });

        assert_eq!(roller.grade_for_sample(0.995), Grade::Common);
    }

    #[test]
    fn zero_weight_grades_are_never_selected() {
        let roller = SummonRoller::new(GradeWeights {
            common: 0.0,
            rare: 1.0,
            epic: 0.0,
            legend: 0.0,
            mythic: 0.0,
        });

        assert_eq!(roller.grade_for_sample(0.3), Grade::Rare);
        assert_eq!(roller.grade_for_sample(0.99), Grade::Rare);
    }
}
