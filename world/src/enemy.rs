//! Per-enemy health, armour, path progress and timed debuffs.

use std::time::Duration;

use merge_defence_core::{
    ArmorReduceSpec, DotSpec, EnemyId, EnemyKind, EnemySnapshot, SlowSpec, StatusEffect, Vec2,
};

use crate::path::Path;

/// Percentage debuff with a countdown.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TimedPercent {
    percent: f32,
    remaining: Duration,
}

impl TimedPercent {
    /// Adopts the stronger magnitude, or the new one when expired, and keeps the longer timer.
    fn refresh(&mut self, percent: f32, duration: Duration) {
        if self.remaining.is_zero() || percent > self.percent {
            self.percent = percent;
        }
        self.remaining = self.remaining.max(duration);
    }

    fn update(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.percent = 0.0;
        }
    }

    fn active(&self) -> f32 {
        if self.remaining.is_zero() {
            0.0
        } else {
            self.percent
        }
    }
}

/// Damage-over-time state with a phase-locked accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct DotState {
    damage: u32,
    interval: Duration,
    remaining: Duration,
    accumulator: Duration,
}

/// Hostile traversing the path.
#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    max_health: u32,
    health: u32,
    base_armor: u32,
    base_speed: f32,
    speed_multiplier: f32,
    flying: bool,
    progress: f32,
    position: Vec2,
    dead: bool,
    reached_end: bool,
    slow: TimedPercent,
    armor_reduce: TimedPercent,
    dot: DotState,
    stun: Duration,
    freeze: Duration,
}

impl Enemy {
    /// Creates a healthy enemy at the start of the path.
    #[must_use]
    pub fn new(
        id: EnemyId,
        kind: EnemyKind,
        health: u32,
        armor: u32,
        base_speed: f32,
        speed_multiplier: f32,
        origin: Vec2,
    ) -> Self {
        Self {
            id,
            kind,
            max_health: health,
            health,
            base_armor: armor,
            base_speed,
            speed_multiplier,
            flying: kind.is_flying(),
            progress: 0.0,
            position: origin,
            dead: false,
            reached_end: false,
            slow: TimedPercent::default(),
            armor_reduce: TimedPercent::default(),
            dot: DotState::default(),
            stun: Duration::ZERO,
            freeze: Duration::ZERO,
        }
    }

    /// Identifier of the enemy.
    #[must_use]
    pub fn id(&self) -> EnemyId {
        self.id
    }

    /// Archetype of the enemy.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Normalised path progress.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Reports whether the enemy has died.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Reports whether the enemy reached the end of the path.
    #[must_use]
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    /// Reports whether the enemy may still be attacked.
    #[must_use]
    pub fn is_targetable(&self) -> bool {
        !self.dead && !self.reached_end
    }

    /// Reports whether a stun or freeze currently prevents movement.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        !self.stun.is_zero() || !self.freeze.is_zero()
    }

    /// Reports whether the enemy is frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        !self.freeze.is_zero()
    }

    /// Active slow fraction.
    #[must_use]
    pub fn slow_percent(&self) -> f32 {
        self.slow.active()
    }

    /// Armour after the active reduction: `round(base × (1 − reduction))`, never negative.
    #[must_use]
    pub fn effective_armor(&self) -> u32 {
        let reduced = self.base_armor as f32 * (1.0 - self.armor_reduce.active());
        reduced.round().max(0.0) as u32
    }

    /// Damage that a raw hit would deal after armour, never less than one.
    #[must_use]
    pub fn mitigate(&self, raw: u32) -> u32 {
        raw.saturating_sub(self.effective_armor()).max(1)
    }

    /// Applies a hit and reports whether it killed the enemy.
    ///
    /// Dead enemies ignore further damage.
    pub fn take_damage(&mut self, raw: u32) -> bool {
        if self.dead {
            return false;
        }
        self.health = self.health.saturating_sub(self.mitigate(raw));
        if self.health == 0 {
            self.dead = true;
        }
        self.dead
    }

    /// Applies a movement slow.
    pub fn apply_slow(&mut self, percent: f32, duration: Duration) {
        self.slow.refresh(percent.clamp(0.0, 1.0), duration);
    }

    /// Applies an armour reduction.
    pub fn apply_armor_reduce(&mut self, percent: f32, duration: Duration) {
        self.armor_reduce.refresh(percent.clamp(0.0, 1.0), duration);
    }

    /// Applies damage-over-time.
    ///
    /// A fresh application restarts the tick phase. A refresh keeps the
    /// phase: a stronger one replaces the damage, a weaker one only extends
    /// the timer.
    pub fn apply_dot(&mut self, damage: u32, interval: Duration, duration: Duration) {
        if interval.is_zero() {
            return;
        }
        let expired = self.dot.remaining.is_zero();
        if expired || damage > self.dot.damage {
            self.dot.damage = damage;
            self.dot.interval = interval;
        }
        if expired {
            self.dot.accumulator = Duration::ZERO;
        }
        self.dot.remaining = self.dot.remaining.max(duration);
    }

    /// Stuns the enemy for at least `duration`.
    pub fn apply_stun(&mut self, duration: Duration) {
        self.stun = self.stun.max(duration);
    }

    /// Freezes the enemy for at least `duration`, which also stuns it.
    pub fn apply_freeze(&mut self, duration: Duration) {
        self.freeze = self.freeze.max(duration);
        self.apply_stun(duration);
    }

    /// Applies a status effect from an impact.
    pub fn apply_status(&mut self, effect: &StatusEffect) {
        match *effect {
            StatusEffect::Slow(SlowSpec { percent, duration }) => self.apply_slow(percent, duration),
            StatusEffect::ArmorReduce(ArmorReduceSpec { percent, duration }) => {
                self.apply_armor_reduce(percent, duration)
            }
            StatusEffect::Dot(DotSpec {
                damage,
                interval,
                duration,
            }) => self.apply_dot(damage, interval, duration),
            StatusEffect::Stun(duration) => self.apply_stun(duration),
            StatusEffect::Freeze(duration) => self.apply_freeze(duration),
        }
    }

    /// Counts every debuff timer down and fires due damage-over-time ticks.
    ///
    /// Returns the damage dealt by damage-over-time during the update.
    pub fn update_debuffs(&mut self, dt: Duration) -> u32 {
        self.slow.update(dt);
        self.armor_reduce.update(dt);
        self.stun = self.stun.saturating_sub(dt);
        self.freeze = self.freeze.saturating_sub(dt);

        let mut dealt = 0;
        if !self.dot.remaining.is_zero() {
            let elapsed = dt.min(self.dot.remaining);
            self.dot.remaining -= elapsed;
            self.dot.accumulator += elapsed;
            while self.dot.accumulator >= self.dot.interval {
                self.dot.accumulator -= self.dot.interval;
                if !self.dead {
                    dealt += self.mitigate(self.dot.damage).min(self.health);
                    let _ = self.take_damage(self.dot.damage);
                }
            }
            if self.dot.remaining.is_zero() {
                self.dot = DotState::default();
            }
        }
        dealt
    }

    /// Advances along the path unless dead, finished or stunned.
    pub fn move_along_path(&mut self, path: &dyn Path, dt: Duration) {
        if self.dead || self.reached_end || self.is_stunned() {
            return;
        }
        let length = path.length();
        if length <= 0.0 {
            self.progress = 1.0;
            self.reached_end = true;
            return;
        }

        let speed = self.base_speed * self.speed_multiplier * (1.0 - self.slow.active());
        self.progress += speed * dt.as_secs_f32() / length;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.reached_end = true;
        }
        self.position = path.point_at(self.progress);
    }

    /// Runs one simulation step: debuffs first, then the stun check, then movement.
    ///
    /// A stun that runs out during this step no longer blocks this step's
    /// movement. Returns the damage dealt by damage-over-time.
    pub fn advance(&mut self, path: &dyn Path, dt: Duration) -> u32 {
        let dot = self.update_debuffs(dt);
        self.move_along_path(path, dt);
        dot
    }

    /// Captures a read-only snapshot of the enemy.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            progress: self.progress,
            health: self.health,
            max_health: self.max_health,
            armor: self.effective_armor(),
            flying: self.flying,
            targetable: self.is_targetable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PolylinePath;

    fn enemy(health: u32, armor: u32) -> Enemy {
        Enemy::new(
            EnemyId::new(0),
            EnemyKind::Normal,
            health,
            armor,
            60.0,
            1.0,
            Vec2::ZERO,
        )
    }

    fn straight_path() -> PolylinePath {
        PolylinePath::new(vec![Vec2::ZERO, Vec2::new(600.0, 0.0)])
    }

    #[test]
    fn damage_never_drops_below_one() {
        let mut tank = enemy(10, 50);
        assert!(!tank.take_damage(3));
        assert_eq!(tank.health(), 9);
        assert!(!tank.take_damage(0));
        assert_eq!(tank.health(), 8);
    }

    #[test]
    fn killing_blow_marks_dead_once() {
        let mut target = enemy(5, 0);
        assert!(target.take_damage(5));
        assert!(target.is_dead());
        assert!(!target.take_damage(5));
        assert_eq!(target.health(), 0);
    }

    #[test]
    fn armor_reduction_rounds_and_clamps() {
        let mut target = enemy(100, 10);
        target.apply_armor_reduce(0.25, Duration::from_secs(1));
        assert_eq!(target.effective_armor(), 8);
        target.apply_armor_reduce(2.0, Duration::from_secs(1));
        assert_eq!(target.effective_armor(), 0);
    }

    #[test]
    fn weaker_slow_does_not_replace_stronger_active_slow() {
        let mut target = enemy(100, 0);
        target.apply_slow(0.5, Duration::from_secs(2));
        target.apply_slow(0.2, Duration::from_secs(5));
        assert_eq!(target.slow_percent(), 0.5);

        let _ = target.update_debuffs(Duration::from_secs(3));
        assert_eq!(target.slow_percent(), 0.5);
        let _ = target.update_debuffs(Duration::from_secs(2));
        assert_eq!(target.slow_percent(), 0.0);

        target.apply_slow(0.1, Duration::from_secs(1));
        assert_eq!(target.slow_percent(), 0.1);
    }

    #[test]
    fn weaker_armor_reduction_keeps_the_stronger_active_one() {
        let mut target = enemy(100, 10);
        target.apply_armor_reduce(0.5, Duration::from_secs(2));
        target.apply_armor_reduce(0.1, Duration::from_secs(4));
        assert_eq!(target.effective_armor(), 5);

        let _ = target.update_debuffs(Duration::from_secs(4));
        assert_eq!(target.effective_armor(), 10);

        target.apply_armor_reduce(0.1, Duration::from_secs(1));
        assert_eq!(target.effective_armor(), 9);
    }

    #[test]
    fn weaker_dot_keeps_the_stronger_damage_until_expiry() {
        let mut target = enemy(100, 0);
        target.apply_dot(10, Duration::from_secs(1), Duration::from_secs(2));
        target.apply_dot(2, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(target.update_debuffs(Duration::from_secs(1)), 10);

        assert_eq!(target.update_debuffs(Duration::from_secs(4)), 40);
        assert_eq!(target.health(), 50);

        target.apply_dot(2, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(target.update_debuffs(Duration::from_secs(1)), 2);
    }

    #[test]
    fn stronger_dot_refresh_keeps_the_tick_phase() {
        let mut target = enemy(100, 0);
        target.apply_dot(5, Duration::from_secs(1), Duration::from_secs(3));
        assert_eq!(target.update_debuffs(Duration::from_millis(600)), 0);

        target.apply_dot(10, Duration::from_secs(1), Duration::from_secs(3));
        assert_eq!(target.update_debuffs(Duration::from_millis(400)), 10);
    }

    #[test]
    fn durations_extend_to_the_longer_timer_without_summing() {
        let mut target = enemy(100, 0);
        target.apply_stun(Duration::from_millis(500));
        target.apply_stun(Duration::from_millis(300));
        let _ = target.update_debuffs(Duration::from_millis(400));
        assert!(target.is_stunned());
        let _ = target.update_debuffs(Duration::from_millis(100));
        assert!(!target.is_stunned());
    }

    #[test]
    fn dot_ticks_stay_phase_locked_under_variable_frames() {
        let mut target = enemy(100, 0);
        target.apply_dot(5, Duration::from_secs(1), Duration::from_secs(3));

        let mut ticks = 0;
        let mut total = 0;
        for _ in 0..10 {
            let dealt = target.update_debuffs(Duration::from_millis(400));
            if dealt > 0 {
                ticks += 1;
                total += dealt;
            }
        }

        assert_eq!(ticks, 3);
        assert_eq!(total, 15);
        assert_eq!(target.health(), 85);
    }

    #[test]
    fn dot_respects_armor_floor() {
        let mut target = enemy(10, 20);
        target.apply_dot(5, Duration::from_secs(1), Duration::from_secs(2));
        assert_eq!(target.update_debuffs(Duration::from_secs(2)), 2);
        assert_eq!(target.health(), 8);
    }

    #[test]
    fn movement_follows_speed_and_slow() {
        let path = straight_path();
        let mut walker = enemy(10, 0);
        walker.move_along_path(&path, Duration::from_secs(1));
        assert!((walker.progress() - 0.1).abs() < 1e-6);

        walker.apply_slow(0.5, Duration::from_secs(10));
        walker.move_along_path(&path, Duration::from_secs(1));
        assert!((walker.progress() - 0.15).abs() < 1e-6);
        assert!((walker.position().x - 90.0).abs() < 1e-3);
    }

    #[test]
    fn frozen_enemy_does_not_move_and_is_stunned() {
        let path = straight_path();
        let mut walker = enemy(10, 0);
        walker.apply_freeze(Duration::from_secs(1));
        assert!(walker.is_frozen());
        assert!(walker.is_stunned());

        let _ = walker.advance(&path, Duration::from_millis(500));
        assert_eq!(walker.progress(), 0.0);
    }

    #[test]
    fn stun_expiring_this_step_no_longer_blocks_movement() {
        let path = straight_path();
        let mut walker = enemy(10, 0);
        walker.apply_stun(Duration::from_millis(500));

        let _ = walker.advance(&path, Duration::from_millis(500));
        assert!(walker.progress() > 0.0);
    }

    #[test]
    fn reaching_the_end_clamps_progress() {
        let path = straight_path();
        let mut walker = enemy(10, 0);
        walker.move_along_path(&path, Duration::from_secs(60));
        assert_eq!(walker.progress(), 1.0);
        assert!(walker.reached_end());
        assert!(!walker.is_targetable());

        walker.move_along_path(&path, Duration::from_secs(1));
        assert_eq!(walker.progress(), 1.0);
    }

    #[test]
    fn dead_enemy_does_not_move() {
        let path = straight_path();
        let mut walker = enemy(1, 0);
        assert!(walker.take_damage(1));
        walker.move_along_path(&path, Duration::from_secs(1));
        assert_eq!(walker.progress(), 0.0);
    }
}
