//! Secondary effects of projectile hits.

use merge_defence_config::CombatConstants;
use merge_defence_core::{
    EnemyId, EnemyView, HitEvent, Impact, StatusEffect, UnitKind, UnitView,
};

use crate::scale;

/// Expands a projectile hit into the impacts it causes.
///
/// The output buffer is cleared first. The primary target always comes
/// first; secondary targets follow in ascending distance from the hit point,
/// ties broken by the smaller enemy identifier. Enemies that are no longer
/// targetable never receive secondary impacts. Pierce only reaches enemies
/// inside the firing unit's current range.
pub fn resolve_hit(
    hit: &HitEvent,
    units: &UnitView,
    enemies: &EnemyView,
    constants: &CombatConstants,
    out: &mut Vec<Impact>,
) {
    out.clear();

    match hit.source_kind {
        UnitKind::Archer => {
            out.push(Impact::damage(hit.target, hit.damage));
            let (Some(pierce), Some(source)) = (hit.abilities.pierce(), units.get(hit.source)) else {
                return;
            };
            let range_sq = source.range * source.range;
            for enemy in nearby(hit, enemies, constants.pierce_radius)
                .into_iter()
                .filter(|id| {
                    enemies.get(*id).map_or(false, |enemy| {
                        enemy.position.distance_squared(source.position) <= range_sq
                    })
                })
                .take(pierce as usize)
            {
                out.push(Impact::damage(enemy, hit.damage));
            }
        }
        UnitKind::Mage => {
            let effects = hit.abilities.on_hit_effects();
            out.push(Impact {
                enemy: hit.target,
                damage: hit.damage,
                critical: false,
                effects: effects.clone(),
            });
            let splash = scale(hit.damage, constants.mage_splash_ratio);
            for enemy in nearby(hit, enemies, constants.mage_splash_radius) {
                out.push(Impact {
                    enemy,
                    damage: splash,
                    critical: false,
                    effects: effects.clone(),
                });
            }
        }
        UnitKind::Special => {
            let mut effects = hit.abilities.on_hit_effects();
            if hit.freeze_shot {
                if let Some(freeze) = hit.abilities.freeze() {
                    effects.push(StatusEffect::Freeze(freeze.duration));
                }
            }
            out.push(Impact {
                enemy: hit.target,
                damage: hit.damage,
                critical: false,
                effects,
            });
        }
        UnitKind::Warrior | UnitKind::Supporter => {
            out.push(Impact::damage(hit.target, hit.damage));
        }
    }
}

/// Targetable enemies other than the primary within `radius` of the hit point.
fn nearby(hit: &HitEvent, enemies: &EnemyView, radius: f32) -> Vec<EnemyId> {
    let radius_sq = radius * radius;
    let mut found: Vec<(f32, EnemyId)> = enemies
        .iter()
        .filter(|enemy| enemy.targetable && enemy.id != hit.target)
        .map(|enemy| (enemy.position.distance_squared(hit.position), enemy.id))
        .filter(|(distance, _)| *distance <= radius_sq)
        .collect();
    found.sort_by(|first, second| first.0.total_cmp(&second.0).then(first.1.cmp(&second.1)));
    found.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::constants;
    use merge_defence_core::{
        Ability, AbilitySet, Buff, CellCoord, DotSpec, EnemyKind, EnemySnapshot, FreezeSpec,
        Grade, ProjectileId, SlowSpec, UnitId, UnitSnapshot, Vec2,
    };
    use std::time::Duration;

    fn enemy(id: u32, x: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Normal,
            position: Vec2::new(x, 0.0),
            progress: 0.5,
            health: 100,
            max_health: 100,
            armor: 0,
            flying: false,
            targetable: true,
        }
    }

    fn hit(source_kind: UnitKind, damage: u32, abilities: Vec<Ability>) -> HitEvent {
        HitEvent {
            projectile: ProjectileId::new(0),
            source: UnitId::new(1),
            source_kind,
            target: EnemyId::new(1),
            position: Vec2::ZERO,
            damage,
            abilities: AbilitySet::new(abilities),
            freeze_shot: false,
        }
    }

    fn shooter(range: f32) -> UnitView {
        UnitView::from_snapshots(vec![UnitSnapshot {
            id: UnitId::new(1),
            kind: UnitKind::Archer,
            grade: Grade::Mythic,
            cell: CellCoord::new(0, 0),
            position: Vec2::ZERO,
            attack: 30,
            attack_interval: Duration::from_secs(1),
            range,
            buff: Buff::ZERO,
            abilities: AbilitySet::default(),
            ready: true,
            freeze_charge: Duration::ZERO,
        }])
    }

    fn roster() -> EnemyView {
        EnemyView::from_snapshots(vec![
            enemy(1, 0.0),
            enemy(2, 40.0),
            enemy(3, 20.0),
            enemy(4, 55.0),
            enemy(5, 200.0),
        ])
    }

    #[test]
    fn pierce_hits_at_most_count_plus_one_nearest_enemies() {
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Archer, 30, vec![Ability::Pierce { count: 2 }]),
            &shooter(200.0),
            &roster(),
            &constants(),
            &mut out,
        );

        let struck: Vec<EnemyId> = out.iter().map(|impact| impact.enemy).collect();
        assert_eq!(struck, vec![EnemyId::new(1), EnemyId::new(3), EnemyId::new(2)]);
        assert!(out.iter().all(|impact| impact.damage == 30));
    }

    #[test]
    fn pierce_skips_enemies_beyond_the_archer_range() {
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Archer, 30, vec![Ability::Pierce { count: 3 }]),
            &shooter(30.0),
            &roster(),
            &constants(),
            &mut out,
        );

        let struck: Vec<EnemyId> = out.iter().map(|impact| impact.enemy).collect();
        assert_eq!(struck, vec![EnemyId::new(1), EnemyId::new(3)]);
    }

    #[test]
    fn pierce_needs_a_placed_source() {
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Archer, 30, vec![Ability::Pierce { count: 3 }]),
            &UnitView::default(),
            &roster(),
            &constants(),
            &mut out,
        );

        assert_eq!(out, vec![Impact::damage(EnemyId::new(1), 30)]);
    }

    #[test]
    fn arrows_without_pierce_hit_only_their_target() {
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Archer, 30, Vec::new()),
            &shooter(200.0),
            &roster(),
            &constants(),
            &mut out,
        );

        assert_eq!(out, vec![Impact::damage(EnemyId::new(1), 30)]);
    }

    #[test]
    fn mage_splash_carries_debuffs_to_every_enemy_in_radius() {
        let slow = SlowSpec {
            percent: 0.3,
            duration: Duration::from_secs(2),
        };
        let dot = DotSpec {
            damage: 5,
            interval: Duration::from_millis(500),
            duration: Duration::from_secs(2),
        };
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Mage, 50, vec![Ability::Slow(slow), Ability::Dot(dot)]),
            &shooter(200.0),
            &roster(),
            &constants(),
            &mut out,
        );

        let expected_effects = vec![StatusEffect::Slow(slow), StatusEffect::Dot(dot)];
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].enemy, EnemyId::new(1));
        assert_eq!(out[0].damage, 50);
        assert_eq!(out[1].enemy, EnemyId::new(3));
        assert_eq!(out[2].enemy, EnemyId::new(2));
        for splash in &out[1..] {
            assert_eq!(splash.damage, 30);
        }
        assert!(out.iter().all(|impact| impact.effects == expected_effects));
    }

    #[test]
    fn untargetable_enemies_receive_no_splash() {
        let mut dying = enemy(3, 20.0);
        dying.targetable = false;
        let enemies = EnemyView::from_snapshots(vec![enemy(1, 0.0), dying]);
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Mage, 50, Vec::new()),
            &shooter(200.0),
            &enemies,
            &constants(),
            &mut out,
        );

        assert_eq!(out.len(), 1);
    }

    #[test]
    fn freeze_shot_adds_freeze_to_special_debuffs() {
        let freeze = FreezeSpec {
            duration: Duration::from_millis(1_500),
            interval: Duration::from_secs(5),
        };
        let slow = SlowSpec {
            percent: 0.35,
            duration: Duration::from_secs(2),
        };
        let mut shot = hit(
            UnitKind::Special,
            96,
            vec![Ability::Slow(slow), Ability::Freeze(freeze)],
        );

        let mut out = Vec::new();
        resolve_hit(&shot, &shooter(200.0), &roster(), &constants(), &mut out);
        assert_eq!(out[0].effects, vec![StatusEffect::Slow(slow)]);

        shot.freeze_shot = true;
        resolve_hit(&shot, &shooter(200.0), &roster(), &constants(), &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].effects,
            vec![
                StatusEffect::Slow(slow),
                StatusEffect::Freeze(Duration::from_millis(1_500))
            ]
        );
    }

    #[test]
    fn supporter_bolts_deal_plain_damage() {
        let mut out = Vec::new();
        resolve_hit(
            &hit(UnitKind::Supporter, 4, vec![Ability::BuffAtk { value: 0.1 }]),
            &shooter(200.0),
            &roster(),
            &constants(),
            &mut out,
        );
        assert_eq!(out, vec![Impact::damage(EnemyId::new(1), 4)]);
    }
}
