#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic unit targets from world snapshots.

use std::cmp::Ordering;

use merge_defence_core::{EnemyId, EnemyView, UnitTarget, UnitView, Vec2};

/// Unit targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct UnitTargeting {
    candidates: Vec<EnemyCandidate>,
    in_range: Vec<EnemyCandidate>,
}

impl UnitTargeting {
    /// Creates a new unit targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the ordered target list of every unit.
    ///
    /// The output buffer is cleared first. Units without any enemy in range
    /// produce no entry. Targets are ordered by path progress, furthest along
    /// first, with ties broken by the smaller enemy identifier.
    pub fn handle(&mut self, units: &UnitView, enemies: &EnemyView, out: &mut Vec<UnitTarget>) {
        out.clear();

        if units.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_candidates(enemies);
        if self.candidates.is_empty() {
            return;
        }

        for unit in units.iter() {
            let range_sq = unit.range * unit.range;
            let melee = unit.kind.is_melee();

            self.in_range.clear();
            self.in_range.extend(self.candidates.iter().copied().filter(|candidate| {
                !(melee && candidate.flying)
                    && candidate.position.distance_squared(unit.position) <= range_sq
            }));
            if self.in_range.is_empty() {
                continue;
            }

            self.in_range.sort_by(EnemyCandidate::priority);
            out.push(UnitTarget {
                unit: unit.id,
                enemies: self.in_range.iter().map(|candidate| candidate.id).collect(),
            });
        }
    }

    fn prepare_candidates(&mut self, enemies: &EnemyView) {
        self.candidates.clear();
        self.candidates.reserve(enemies.len());
        self.candidates.extend(
            enemies
                .iter()
                .filter(|snapshot| snapshot.targetable)
                .map(|snapshot| EnemyCandidate {
                    id: snapshot.id,
                    position: snapshot.position,
                    progress: snapshot.progress,
                    flying: snapshot.flying,
                }),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
    progress: f32,
    flying: bool,
}

impl EnemyCandidate {
    fn priority(first: &Self, second: &Self) -> Ordering {
        second
            .progress
            .total_cmp(&first.progress)
            .then_with(|| first.id.cmp(&second.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_defence_core::{
        AbilitySet, Buff, CellCoord, EnemyKind, EnemySnapshot, Grade, UnitId, UnitKind,
        UnitSnapshot,
    };
    use std::time::Duration;

    fn unit(id: u32, kind: UnitKind, position: Vec2, range: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind,
            grade: Grade::Common,
            cell: CellCoord::new(0, 0),
            position,
            attack: 10,
            attack_interval: Duration::from_secs(1),
            range,
            buff: Buff::ZERO,
            abilities: AbilitySet::default(),
            ready: true,
            freeze_charge: Duration::ZERO,
        }
    }

    fn enemy(id: u32, kind: EnemyKind, position: Vec2, progress: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind,
            position,
            progress,
            health: 10,
            max_health: 10,
            armor: 0,
            flying: kind.is_flying(),
            targetable: true,
        }
    }

    #[test]
    fn furthest_along_enemy_is_primary() {
        let mut system = UnitTargeting::new();
        let units = UnitView::from_snapshots(vec![unit(1, UnitKind::Archer, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, EnemyKind::Normal, Vec2::new(10.0, 0.0), 0.3),
            enemy(2, EnemyKind::Normal, Vec2::new(90.0, 0.0), 0.9),
        ]);
        let mut out = Vec::new();

        system.handle(&units, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].enemies, vec![EnemyId::new(2), EnemyId::new(1)]);
    }

    #[test]
    fn equal_progress_prefers_smaller_identifier() {
        let mut system = UnitTargeting::new();
        let units = UnitView::from_snapshots(vec![unit(1, UnitKind::Mage, Vec2::ZERO, 100.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, EnemyKind::Normal, Vec2::new(10.0, 0.0), 0.5),
            enemy(3, EnemyKind::Fast, Vec2::new(20.0, 0.0), 0.5),
        ]);
        let mut out = Vec::new();

        system.handle(&units, &enemies, &mut out);

        assert_eq!(out[0].enemies, vec![EnemyId::new(3), EnemyId::new(7)]);
    }

    #[test]
    fn range_is_euclidean_and_inclusive() {
        let mut system = UnitTargeting::new();
        let units = UnitView::from_snapshots(vec![unit(1, UnitKind::Archer, Vec2::ZERO, 50.0)]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, EnemyKind::Normal, Vec2::new(30.0, 40.0), 0.2),
            enemy(2, EnemyKind::Normal, Vec2::new(40.0, 40.0), 0.8),
        ]);
        let mut out = Vec::new();

        system.handle(&units, &enemies, &mut out);

        assert_eq!(out[0].enemies, vec![EnemyId::new(1)]);
    }

    #[test]
    fn melee_units_ignore_flyers() {
        let mut system = UnitTargeting::new();
        let units = UnitView::from_snapshots(vec![
            unit(1, UnitKind::Warrior, Vec2::ZERO, 100.0),
            unit(2, UnitKind::Archer, Vec2::ZERO, 100.0),
        ]);
        let enemies = EnemyView::from_snapshots(vec![enemy(
            1,
            EnemyKind::Flying,
            Vec2::new(10.0, 0.0),
            0.5,
        )]);
        let mut out = Vec::new();

        system.handle(&units, &enemies, &mut out);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].unit, UnitId::new(2));
    }

    #[test]
    fn untargetable_enemies_are_skipped() {
        let mut system = UnitTargeting::new();
        let units = UnitView::from_snapshots(vec![unit(1, UnitKind::Archer, Vec2::ZERO, 100.0)]);
        let mut dead = enemy(1, EnemyKind::Normal, Vec2::new(10.0, 0.0), 0.9);
        dead.targetable = false;
        let enemies = EnemyView::from_snapshots(vec![dead]);
        let mut out = vec![UnitTarget {
            unit: UnitId::new(9),
            enemies: vec![EnemyId::new(9)],
        }];

        system.handle(&units, &enemies, &mut out);

        assert!(out.is_empty());
    }
}
