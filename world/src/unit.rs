//! Placed combat units and their transient attack state.

use std::time::Duration;

use merge_defence_core::{
    Buff, CellCoord, Grade, QueuedShot, UnitId, UnitKind, UnitSnapshot, UnitStats, Vec2,
};

/// Authoritative state of a unit placed on the grid.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    pub(crate) kind: UnitKind,
    pub(crate) grade: Grade,
    pub(crate) cell: CellCoord,
    pub(crate) stats: UnitStats,
    pub(crate) cooldown: Duration,
    pub(crate) buff: Buff,
    pub(crate) pending: Vec<QueuedShot>,
    pub(crate) freeze_charge: Duration,
}

impl Unit {
    /// Creates a unit that is ready to attack.
    pub(crate) fn new(
        id: UnitId,
        kind: UnitKind,
        grade: Grade,
        cell: CellCoord,
        stats: UnitStats,
    ) -> Self {
        Self {
            id,
            kind,
            grade,
            cell,
            stats,
            cooldown: Duration::ZERO,
            buff: Buff::ZERO,
            pending: Vec::new(),
            freeze_charge: Duration::ZERO,
        }
    }

    /// Counts the attack cooldown and queued shot delays down.
    ///
    /// Returns the queued shots whose delay elapsed, in queue order.
    pub(crate) fn tick(&mut self, dt: Duration) -> Vec<QueuedShot> {
        self.cooldown = self.cooldown.saturating_sub(dt);

        let mut released = Vec::new();
        self.pending.retain_mut(|shot| {
            shot.delay = shot.delay.saturating_sub(dt);
            if shot.delay.is_zero() {
                released.push(*shot);
                false
            } else {
                true
            }
        });
        released
    }

    /// Restarts the cooldown from the buffed attack interval.
    pub(crate) fn restart_cooldown(&mut self) {
        self.cooldown = self.stats.effective_interval(&self.buff);
    }

    /// Captures a read-only snapshot of the unit positioned at `position`.
    pub(crate) fn snapshot(&self, position: Vec2) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            grade: self.grade,
            cell: self.cell,
            position,
            attack: self.stats.effective_attack(&self.buff),
            attack_interval: self.stats.effective_interval(&self.buff),
            range: self.stats.effective_range(&self.buff),
            buff: self.buff,
            abilities: self.stats.abilities.clone(),
            ready: self.cooldown.is_zero(),
            freeze_charge: self.freeze_charge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_defence_core::{AbilitySet, EnemyId};

    fn archer() -> Unit {
        Unit::new(
            UnitId::new(1),
            UnitKind::Archer,
            Grade::Rare,
            CellCoord::new(0, 0),
            UnitStats {
                attack: 10,
                attack_interval: Duration::from_secs(1),
                range: 100.0,
                abilities: AbilitySet::default(),
            },
        )
    }

    #[test]
    fn cooldown_restarts_from_buffed_interval() {
        let mut unit = archer();
        assert!(unit.snapshot(Vec2::ZERO).ready);

        unit.buff = Buff {
            speed_percent: 0.5,
            ..Buff::ZERO
        };
        unit.restart_cooldown();
        assert_eq!(unit.cooldown, Duration::from_millis(500));
        assert!(!unit.snapshot(Vec2::ZERO).ready);

        let _ = unit.tick(Duration::from_millis(500));
        assert!(unit.snapshot(Vec2::ZERO).ready);
    }

    #[test]
    fn queued_shots_release_after_their_delay() {
        let mut unit = archer();
        unit.pending = vec![
            QueuedShot {
                delay: Duration::from_millis(100),
                target: EnemyId::new(1),
                damage: 5,
            },
            QueuedShot {
                delay: Duration::from_millis(200),
                target: EnemyId::new(2),
                damage: 5,
            },
        ];

        let released = unit.tick(Duration::from_millis(150));
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].target, EnemyId::new(1));
        assert_eq!(unit.pending.len(), 1);

        let released = unit.tick(Duration::from_millis(50));
        assert_eq!(released[0].target, EnemyId::new(2));
        assert!(unit.pending.is_empty());
    }
}
