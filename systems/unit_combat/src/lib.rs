#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that plans archetype attacks for ready units and resolves
//! projectile hits into impacts.
//!
//! Neither half mutates the world. Attack plans are emitted as
//! `Command::ExecuteAttack` and hit resolutions as lists of [`Impact`]s for
//! the caller to submit through `Command::ApplyImpacts`.

mod hits;

pub use hits::resolve_hit;

use merge_defence_config::CombatConstants;
use merge_defence_core::{
    AttackPlan, Command, EnemyId, EnemyView, Impact, QueuedShot, ShotPlan, StatusEffect,
    UnitKind, UnitSnapshot, UnitTarget, UnitView,
};
use rand::Rng;

/// Unit combat system that queues attack plans for ready units.
#[derive(Debug, Default)]
pub struct UnitCombat {
    scratch: Vec<Command>,
}

impl UnitCombat {
    /// Creates a new unit combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::ExecuteAttack` entries for ready units with targets.
    ///
    /// Units that are cooling down or have no target produce nothing and keep
    /// their cooldown untouched. Randomness is only drawn for critical rolls.
    pub fn handle<R>(
        &mut self,
        units: &UnitView,
        enemies: &EnemyView,
        targets: &[UnitTarget],
        constants: &CombatConstants,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        if targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in targets {
            let Some(unit) = units.get(target.unit) else {
                continue;
            };
            if !unit.ready || target.enemies.is_empty() {
                continue;
            }

            let plan = match unit.kind {
                UnitKind::Warrior => melee(unit, &target.enemies, enemies, constants, rng),
                UnitKind::Archer => volley(unit, &target.enemies, constants),
                UnitKind::Mage | UnitKind::Supporter => single_shot(unit, &target.enemies),
                UnitKind::Special => special(unit, &target.enemies),
            };
            self.scratch.push(Command::ExecuteAttack { plan });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

fn empty_plan(unit: &UnitSnapshot) -> AttackPlan {
    AttackPlan {
        unit: unit.id,
        strikes: Vec::new(),
        shots: Vec::new(),
        queued: Vec::new(),
        freeze_charge: unit.freeze_charge,
    }
}

fn melee<R>(
    unit: &UnitSnapshot,
    targets: &[EnemyId],
    enemies: &EnemyView,
    constants: &CombatConstants,
    rng: &mut R,
) -> AttackPlan
where
    R: Rng + ?Sized,
{
    let mut plan = empty_plan(unit);
    let primary = targets[0];

    let crit = unit
        .abilities
        .crit()
        .filter(|crit| rng.gen::<f32>() < crit.chance);
    let Some(crit) = crit else {
        plan.strikes.push(Impact::damage(primary, unit.attack));
        return plan;
    };

    let damage = scale(unit.attack, crit.multiplier);
    let mut effects = Vec::new();
    if let Some(duration) = unit.abilities.stun() {
        effects.push(StatusEffect::Stun(duration));
    }
    plan.strikes.push(Impact {
        enemy: primary,
        damage,
        critical: true,
        effects,
    });

    if let (Some(radius), Some(centre)) = (
        unit.abilities.splash_radius(),
        enemies.get(primary).map(|enemy| enemy.position),
    ) {
        let splash = scale(damage, constants.melee_splash_ratio);
        let radius_sq = radius * radius;
        for other in &targets[1..] {
            let within = enemies
                .get(*other)
                .map_or(false, |enemy| enemy.position.distance_squared(centre) <= radius_sq);
            if within {
                plan.strikes.push(Impact::damage(*other, splash));
            }
        }
    }
    plan
}

fn volley(unit: &UnitSnapshot, targets: &[EnemyId], constants: &CombatConstants) -> AttackPlan {
    let mut plan = single_shot(unit, targets);
    let Some(extra) = unit.abilities.multishot() else {
        return plan;
    };

    let damage = scale(unit.attack, constants.multishot_damage_ratio);
    for shot in 1..=extra {
        plan.queued.push(QueuedShot {
            delay: constants.multishot_spacing * shot,
            target: targets[shot as usize % targets.len()],
            damage,
        });
    }
    plan
}

fn single_shot(unit: &UnitSnapshot, targets: &[EnemyId]) -> AttackPlan {
    let mut plan = empty_plan(unit);
    plan.shots.push(ShotPlan {
        target: targets[0],
        damage: unit.attack,
        freeze_shot: false,
    });
    plan
}

fn special(unit: &UnitSnapshot, targets: &[EnemyId]) -> AttackPlan {
    let mut plan = single_shot(unit, targets);
    let Some(freeze) = unit.abilities.freeze() else {
        return plan;
    };

    let mut charge = unit.freeze_charge + unit.attack_interval;
    if !freeze.interval.is_zero() && charge >= freeze.interval {
        charge -= freeze.interval;
        plan.shots.push(ShotPlan {
            target: targets[0],
            damage: unit.attack,
            freeze_shot: true,
        });
    }
    plan.freeze_charge = charge;
    plan
}

pub(crate) fn scale(damage: u32, ratio: f32) -> u32 {
    (damage as f32 * ratio).round().max(0.0) as u32
}
