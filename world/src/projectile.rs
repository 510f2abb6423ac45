//! Homing projectiles resolved against a single target.

use std::time::Duration;

use merge_defence_core::{AbilitySet, EnemyId, HitEvent, ProjectileId, UnitId, UnitKind, Vec2};

/// Result of advancing a projectile by one step.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ProjectileStep {
    /// Still travelling toward its target.
    InFlight,
    /// Reached its target; the hit awaits resolution.
    Hit(HitEvent),
    /// Target vanished; the projectile resolved without a hit.
    Cancelled,
    /// Already resolved earlier; nothing changed.
    Spent,
}

/// Constant-speed shot homing onto one enemy.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    id: ProjectileId,
    source: UnitId,
    source_kind: UnitKind,
    target: EnemyId,
    position: Vec2,
    speed: f32,
    damage: u32,
    abilities: AbilitySet,
    freeze_shot: bool,
    done: bool,
}

impl Projectile {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ProjectileId,
        source: UnitId,
        source_kind: UnitKind,
        target: EnemyId,
        origin: Vec2,
        speed: f32,
        damage: u32,
        abilities: AbilitySet,
        freeze_shot: bool,
    ) -> Self {
        Self {
            id,
            source,
            source_kind,
            target,
            position: origin,
            speed,
            damage,
            abilities,
            freeze_shot,
            done: false,
        }
    }

    pub(crate) fn id(&self) -> ProjectileId {
        self.id
    }

    pub(crate) fn source(&self) -> UnitId {
        self.source
    }

    pub(crate) fn target(&self) -> EnemyId {
        self.target
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    /// Marks the projectile resolved without a hit.
    pub(crate) fn cancel(&mut self) {
        self.done = true;
    }

    /// Moves toward the target's current position.
    ///
    /// `target` is `None` when the enemy died, leaked or was removed. A
    /// projectile resolves exactly once: later calls return
    /// [`ProjectileStep::Spent`] without touching any state.
    pub(crate) fn advance(
        &mut self,
        dt: Duration,
        target: Option<Vec2>,
        hit_radius: f32,
    ) -> ProjectileStep {
        if self.done {
            return ProjectileStep::Spent;
        }
        let Some(destination) = target else {
            self.done = true;
            return ProjectileStep::Cancelled;
        };

        let offset = destination - self.position;
        let distance = offset.length();
        let step = self.speed * dt.as_secs_f32();
        if distance <= hit_radius + step {
            self.position = destination;
            self.done = true;
            return ProjectileStep::Hit(HitEvent {
                projectile: self.id,
                source: self.source,
                source_kind: self.source_kind,
                target: self.target,
                position: destination,
                damage: self.damage,
                abilities: self.abilities.clone(),
                freeze_shot: self.freeze_shot,
            });
        }

        self.position += offset / distance * step;
        ProjectileStep::InFlight
    }
}
