#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Merge Defence.
//!
//! The world owns every mutable piece of the simulation: the wave director
//! and its live enemies, the placement grid, placed units, projectiles in
//! flight, the economy and score ledgers and the player's lives. All changes
//! flow through [`apply`]; read access goes through the [`query`] module.

pub mod economy;
pub mod enemy;
pub mod grid;
pub mod path;
mod projectile;
pub mod score;
mod unit;
pub mod waves;

use std::{collections::BTreeMap, time::Duration};

use merge_defence_config::GameConfig;
use merge_defence_core::{
    Buff, CellCoord, Command, EnemyId, EnemyKind, Event, Grade, Impact, MergeError, Outcome,
    PlacementError, ProjectileId, ShotPlan, SkipError, SummonError, UnitBuff, UnitId, UnitKind,
    WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    economy::EconomyLedger,
    enemy::Enemy,
    grid::PlacementGrid,
    path::PolylinePath,
    projectile::{Projectile, ProjectileStep},
    score::ScoreLedger,
    unit::Unit,
    waves::{WaveDirector, WaveReport},
};

/// Stream selector mixed into the seed of the world's wave shuffling generator.
const WAVE_STREAM: u64 = 0x5eed_0f_a7e5;

/// Represents the authoritative Merge Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    path: PolylinePath,
    grid: PlacementGrid,
    director: WaveDirector,
    units: BTreeMap<UnitId, Unit>,
    next_unit_id: u32,
    projectiles: Vec<Projectile>,
    next_projectile_id: u32,
    economy: EconomyLedger,
    score: ScoreLedger,
    lives: u32,
    outcome: Option<Outcome>,
    highest_grade: Option<Grade>,
    elapsed: Duration,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a new idle world from a validated configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let path = PolylinePath::serpentine(&config.map);
        let grid = PlacementGrid::from_map(&config.map, &path);
        Self {
            banner: WELCOME_BANNER,
            config: config.clone(),
            path,
            grid,
            director: WaveDirector::new(config),
            units: BTreeMap::new(),
            next_unit_id: 0,
            projectiles: Vec::new(),
            next_projectile_id: 0,
            economy: EconomyLedger::new(config.economy.starting_gold),
            score: ScoreLedger::new(),
            lives: config.player.starting_lives,
            outcome: None,
            highest_grade: None,
            elapsed: Duration::ZERO,
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ WAVE_STREAM),
        }
    }

    fn settle(&mut self, report: WaveReport, out_events: &mut Vec<Event>) {
        for kind in report.killed {
            let reward = self.config.economy.kill_reward(kind);
            let gold = self.economy.earn(reward);
            out_events.push(Event::GoldChanged { gold });
            let score = self.score.record_kill();
            out_events.push(Event::ScoreChanged { score });
        }

        for kind in report.leaked {
            let damage = if kind == EnemyKind::Boss {
                self.config.player.boss_life_damage
            } else {
                1
            };
            self.lives = self.lives.saturating_sub(damage);
            out_events.push(Event::LivesChanged { lives: self.lives });
            if self.lives == 0 {
                self.end(Outcome::Defeat, out_events);
            }
        }

        if let Some(clear) = report.cleared {
            let gold = self.economy.earn(clear.reward);
            out_events.push(Event::GoldChanged { gold });
            let score = self.score.record_wave_clear(clear.wave);
            out_events.push(Event::ScoreChanged { score });

            if clear.final_wave && self.outcome.is_none() {
                let score = self.score.record_victory(clear.wave);
                out_events.push(Event::ScoreChanged { score });
                self.end(Outcome::Victory, out_events);
            }
        }
    }

    fn end(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        info!(
            ?outcome,
            wave = self.director.current_wave(),
            score = self.score.score(),
            "session ended"
        );
        out_events.push(Event::SessionEnded { outcome });
    }

    fn tick_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut released = Vec::new();
        for unit in self.units.values_mut() {
            for shot in unit.tick(dt) {
                released.push((
                    unit.id,
                    ShotPlan {
                        target: shot.target,
                        damage: shot.damage,
                        freeze_shot: false,
                    },
                ));
            }
        }
        for (unit, shot) in released {
            self.launch(unit, shot, out_events);
        }
    }

    fn launch(&mut self, unit: UnitId, shot: ShotPlan, out_events: &mut Vec<Event>) {
        let Some(source) = self.units.get(&unit) else {
            return;
        };
        let Some(speed) = self.config.combat.projectile_speed.get(source.kind) else {
            return;
        };
        if !self.is_live_target(shot.target) {
            return;
        }
        let kind = source.kind;
        let origin = self.grid.cell_center(source.cell);
        let abilities = source.stats.abilities.clone();

        let id = ProjectileId::new(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile::new(
            id,
            unit,
            kind,
            shot.target,
            origin,
            speed,
            shot.damage,
            abilities,
            shot.freeze_shot,
        ));
        out_events.push(Event::ProjectileLaunched {
            projectile: id,
            unit,
            target: shot.target,
        });
    }

    fn is_live_target(&self, enemy: EnemyId) -> bool {
        self.director
            .enemies()
            .iter()
            .any(|candidate| candidate.id() == enemy && candidate.is_targetable())
    }

    fn apply_impacts(&mut self, impacts: &[Impact], out_events: &mut Vec<Event>) {
        for impact in impacts {
            let Some(enemy) = self.director.enemy_mut(impact.enemy) else {
                continue;
            };
            if !enemy.is_targetable() {
                continue;
            }
            let amount = enemy.mitigate(impact.damage).min(enemy.health());
            let killed = enemy.take_damage(impact.damage);
            out_events.push(Event::DamageDealt {
                position: enemy.position(),
                amount,
                critical: impact.critical,
            });
            if !killed {
                for effect in &impact.effects {
                    enemy.apply_status(effect);
                }
            }
        }
    }

    fn advance_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let hit_radius = self.config.combat.hit_radius;
        for projectile in &mut self.projectiles {
            let target = self
                .director
                .enemies()
                .iter()
                .find(|enemy| enemy.id() == projectile.target() && enemy.is_targetable())
                .map(Enemy::position);
            match projectile.advance(dt, target, hit_radius) {
                ProjectileStep::Hit(hit) => out_events.push(Event::ProjectileHit { hit }),
                ProjectileStep::Cancelled => out_events.push(Event::ProjectileCancelled {
                    projectile: projectile.id(),
                }),
                ProjectileStep::InFlight | ProjectileStep::Spent => {}
            }
        }
        self.projectiles.retain(|projectile| !projectile.is_done());
    }

    fn place_unit(
        &mut self,
        kind: UnitKind,
        grade: Grade,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        let id = UnitId::new(self.next_unit_id);
        if let Err(reason) = self.grid.place(cell, id) {
            out_events.push(Event::PlacementRejected { reason });
            return None;
        }
        self.next_unit_id += 1;
        let stats = self.config.units.stats(kind, grade).clone();
        let _ = self.units.insert(id, Unit::new(id, kind, grade, cell, stats));
        if self.highest_grade.map_or(true, |highest| grade > highest) {
            self.highest_grade = Some(grade);
        }
        out_events.push(Event::UnitPlaced {
            unit: id,
            kind,
            grade,
            cell,
        });
        Some(id)
    }

    fn remove_unit(
        &mut self,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<UnitId, PlacementError> {
        let id = self.grid.remove(cell)?;
        let _ = self.units.remove(&id);
        for projectile in &mut self.projectiles {
            if projectile.source() == id && !projectile.is_done() {
                projectile.cancel();
                out_events.push(Event::ProjectileCancelled {
                    projectile: projectile.id(),
                });
            }
        }
        self.projectiles.retain(|projectile| !projectile.is_done());
        out_events.push(Event::UnitRemoved { unit: id, cell });
        Ok(id)
    }

    fn summon(&mut self, kind: UnitKind, grade: Grade, out_events: &mut Vec<Event>) {
        let cost = self.config.economy.summon_cost;
        if !self.economy.can_afford(cost) {
            debug!(gold = self.economy.gold(), cost, "summon rejected");
            out_events.push(Event::SummonRejected {
                reason: SummonError::InsufficientFunds,
            });
            return;
        }
        let Some(cell) = self.grid.first_empty() else {
            debug!("summon rejected: grid full");
            out_events.push(Event::SummonRejected {
                reason: SummonError::GridFull,
            });
            return;
        };
        if !self.economy.spend(cost) {
            return;
        }
        out_events.push(Event::GoldChanged {
            gold: self.economy.gold(),
        });
        if let Some(unit) = self.place_unit(kind, grade, cell, out_events) {
            debug!(unit = unit.get(), ?kind, ?grade, "unit summoned");
        }
    }

    fn merge(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        kind: UnitKind,
        grade: Grade,
        out_events: &mut Vec<Event>,
    ) {
        if let Err(reason) = self.validate_merge(from, to, grade) {
            debug!(?reason, "merge rejected");
            out_events.push(Event::MergeRejected { reason });
            return;
        }

        let consumed_from = self.remove_unit(from, out_events);
        let consumed_to = self.remove_unit(to, out_events);
        let (Ok(first), Ok(second)) = (consumed_from, consumed_to) else {
            return;
        };
        let Some(result) = self.place_unit(kind, grade, to, out_events) else {
            return;
        };
        let score = self.score.record_merge();
        out_events.push(Event::ScoreChanged { score });
        info!(result = result.get(), ?kind, ?grade, "units merged");
        out_events.push(Event::UnitsMerged {
            consumed: [first, second],
            result,
            grade,
        });
    }

    fn validate_merge(
        &self,
        from: CellCoord,
        to: CellCoord,
        result: Grade,
    ) -> Result<(), MergeError> {
        if from == to {
            return Err(MergeError::SameUnit);
        }
        let (Some(first), Some(second)) = (self.grid.unit_at(from), self.grid.unit_at(to)) else {
            return Err(MergeError::MissingUnit);
        };
        if first == second {
            return Err(MergeError::SameUnit);
        }
        let (Some(first), Some(second)) = (self.units.get(&first), self.units.get(&second)) else {
            return Err(MergeError::MissingUnit);
        };
        if first.grade != second.grade {
            return Err(MergeError::GradeMismatch);
        }
        match first.grade.next() {
            None => Err(MergeError::MaxGrade),
            Some(next) if next == result => Ok(()),
            Some(_) => Err(MergeError::GradeMismatch),
        }
    }

    fn move_unit(&mut self, from: CellCoord, to: CellCoord, out_events: &mut Vec<Event>) {
        match self.grid.move_unit(from, to) {
            Ok(displaced) => {
                if let Some(moved) = self.grid.unit_at(to) {
                    if let Some(unit) = self.units.get_mut(&moved) {
                        unit.cell = to;
                    }
                    out_events.push(Event::UnitMoved {
                        unit: moved,
                        from,
                        to,
                    });
                }
                if let Some(swapped) = displaced {
                    if let Some(unit) = self.units.get_mut(&swapped) {
                        unit.cell = from;
                    }
                    out_events.push(Event::UnitMoved {
                        unit: swapped,
                        from: to,
                        to: from,
                    });
                }
            }
            Err(reason) => out_events.push(Event::PlacementRejected { reason }),
        }
    }

    fn sell(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        match self.remove_unit(cell, out_events) {
            Ok(unit) => {
                let refund = self.config.economy.sell_return;
                let gold = self.economy.earn(refund);
                debug!(unit = unit.get(), refund, "unit sold");
                out_events.push(Event::UnitSold { unit, refund });
                out_events.push(Event::GoldChanged { gold });
            }
            Err(reason) => out_events.push(Event::PlacementRejected { reason }),
        }
    }

    fn apply_buffs(&mut self, buffs: Vec<UnitBuff>) {
        for unit in self.units.values_mut() {
            unit.buff = Buff::ZERO;
        }
        for entry in buffs {
            if let Some(unit) = self.units.get_mut(&entry.unit) {
                unit.buff += entry.buff;
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Once the session has ended every command is ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if world.outcome.is_some() {
        return;
    }

    match command {
        Command::StartGame => {
            if world.director.current_wave() == 0 {
                let _ = world
                    .director
                    .start_next_wave(&mut world.rng, &world.path, out_events);
            }
        }
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            let report = world
                .director
                .update(dt, &mut world.rng, &world.path, out_events);
            world.settle(report, out_events);
            if world.outcome.is_none() {
                world.tick_units(dt, out_events);
            }
        }
        Command::SkipPrepare => {
            if world
                .director
                .skip_prepare(&mut world.rng, &world.path, out_events)
            {
                let bonus = world.config.economy.wave_skip_bonus;
                let gold = world.economy.earn(bonus);
                out_events.push(Event::PreparationSkipped { bonus });
                out_events.push(Event::GoldChanged { gold });
            } else {
                debug!("skip rejected: not preparing");
                out_events.push(Event::SkipRejected {
                    reason: SkipError::NotPreparing,
                });
            }
        }
        Command::SummonUnit { kind, grade } => world.summon(kind, grade, out_events),
        Command::MergeUnits {
            from,
            to,
            kind,
            grade,
        } => world.merge(from, to, kind, grade, out_events),
        Command::MoveUnit { from, to } => world.move_unit(from, to, out_events),
        Command::SellUnit { cell } => world.sell(cell, out_events),
        Command::ApplyBuffs { buffs } => world.apply_buffs(buffs),
        Command::ExecuteAttack { plan } => {
            let Some(unit) = world.units.get_mut(&plan.unit) else {
                return;
            };
            unit.restart_cooldown();
            unit.freeze_charge = plan.freeze_charge;
            unit.pending.extend(plan.queued.iter().copied());
            let kind = unit.kind;
            out_events.push(Event::UnitAttacked {
                unit: plan.unit,
                kind,
            });

            world.apply_impacts(&plan.strikes, out_events);
            for shot in plan.shots {
                world.launch(plan.unit, shot, out_events);
            }
        }
        Command::AdvanceProjectiles { dt } => world.advance_projectiles(dt, out_events),
        Command::ApplyImpacts { impacts } => world.apply_impacts(&impacts, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use merge_defence_config::GameConfig;
    use merge_defence_core::{
        EnemyView, Grade, GridView, Outcome, SessionSummary, UnitView, WavePhase,
    };

    use super::World;
    use crate::{grid::PlacementGrid, path::PolylinePath};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Route followed by every enemy.
    #[must_use]
    pub fn path(world: &World) -> &PolylinePath {
        &world.path
    }

    /// Provides read-only access to the placement grid.
    #[must_use]
    pub fn placement_grid(world: &World) -> &PlacementGrid {
        &world.grid
    }

    /// Exposes a read-only view of the dense placement grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .director
                .enemies()
                .iter()
                .map(|enemy| enemy.snapshot())
                .collect(),
        )
    }

    /// Captures a read-only view of the placed units with their buffed stats.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(
            world
                .units
                .values()
                .map(|unit| unit.snapshot(world.grid.cell_center(unit.cell)))
                .collect(),
        )
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Current gold balance.
    #[must_use]
    pub fn gold(world: &World) -> u32 {
        world.economy.gold()
    }

    /// Reports whether the balance covers the cost.
    #[must_use]
    pub fn can_afford(world: &World, cost: u32) -> bool {
        world.economy.can_afford(cost)
    }

    /// Remaining lives.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.lives
    }

    /// Current score.
    #[must_use]
    pub fn score(world: &World) -> u64 {
        world.score.score()
    }

    /// One-based number of the most recently started wave, or zero.
    #[must_use]
    pub fn current_wave(world: &World) -> u32 {
        world.director.current_wave()
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(world: &World) -> u32 {
        world.director.total_waves()
    }

    /// Reports whether the final wave was cleared.
    #[must_use]
    pub fn is_all_waves_cleared(world: &World) -> bool {
        world.director.is_all_waves_cleared()
    }

    /// Observable phase of the wave director.
    #[must_use]
    pub fn wave_phase(world: &World) -> WavePhase {
        world.director.phase()
    }

    /// Time left before the next wave starts automatically.
    #[must_use]
    pub fn prepare_remaining(world: &World) -> Duration {
        world.director.prepare_remaining()
    }

    /// Final result of the session, if it ended.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Highest grade reached by summon or merge.
    #[must_use]
    pub fn highest_grade(world: &World) -> Option<Grade> {
        world.highest_grade
    }

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Totals exposed to external score persistence.
    #[must_use]
    pub fn summary(world: &World) -> SessionSummary {
        SessionSummary {
            wave: world.director.current_wave(),
            total_waves: world.director.total_waves(),
            kills: world.score.kills(),
            merges: world.score.merges(),
            score: world.score.score(),
            gold: world.economy.gold(),
            lives: world.lives,
            highest_grade: world.highest_grade,
            outcome: world.outcome,
        }
    }
}
