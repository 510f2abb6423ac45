#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestrator that wires the world and the pure systems together.
//!
//! Each tick runs the same fixed sequence:
//!
//! 1. the wave director spawns, advances enemies and detects kills, leaks
//!    and clears (`Command::Tick`), which also counts unit cooldowns down;
//! 2. buff propagation recomputes every unit's buff from scratch;
//! 3. targeting and combat plan attacks for ready units;
//! 4. projectiles advance and every hit is resolved into impacts.
//!
//! Player actions are validated, forwarded to the world as commands and
//! answered with a `Result` carrying the rejection reason.

use std::time::Duration;

use merge_defence_config::{ConfigError, GameConfig};
use merge_defence_core::{
    Action, CellCoord, Command, Event, Grade, Impact, MergeError, PlacementError,
    SessionSummary, SkipError, SummonError, UnitBuff, UnitId, UnitTarget,
};
use merge_defence_system_buffs::BuffPropagation;
use merge_defence_system_merge::{can_merge, MergeResolver};
use merge_defence_system_summon::SummonRoller;
use merge_defence_system_unit_combat::{resolve_hit, UnitCombat};
use merge_defence_system_unit_targeting::UnitTargeting;
use merge_defence_world::{self as world, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Reasons a player action may be rejected by the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ActionError {
    /// The summon was rejected.
    #[error(transparent)]
    Summon(#[from] SummonError),
    /// The merge was rejected.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// The move, swap or sell was rejected.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// The preparation skip was rejected.
    #[error(transparent)]
    Skip(#[from] SkipError),
    /// The first wave already started.
    #[error("the game has already started")]
    AlreadyStarted,
    /// The session already ended.
    #[error("the session has ended")]
    SessionEnded,
    /// The requested time multiplier is not a positive finite number.
    #[error("time scale {scale} must be positive")]
    InvalidTimeScale {
        /// Rejected multiplier.
        scale: f32,
    },
}

/// Owns the world, the systems and the random stream driving a session.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    roller: SummonRoller,
    resolver: MergeResolver,
    buffs: BuffPropagation,
    targeting: UnitTargeting,
    combat: UnitCombat,
    rng: ChaCha8Rng,
    time_scale: f32,
    unit_buffs: Vec<UnitBuff>,
    targets: Vec<UnitTarget>,
    commands: Vec<Command>,
    impacts: Vec<Impact>,
}

impl Simulation {
    /// Validates the configuration and builds an idle session from it.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            seed = config.seed,
            waves = config.total_waves(),
            "simulation ready"
        );
        Ok(Self {
            world: World::new(&config),
            roller: SummonRoller::new(config.summon.grade_weights),
            resolver: MergeResolver::new(),
            buffs: BuffPropagation::new(),
            targeting: UnitTargeting::new(),
            combat: UnitCombat::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            time_scale: 1.0,
            unit_buffs: Vec::new(),
            targets: Vec::new(),
            commands: Vec::new(),
            impacts: Vec::new(),
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Multiplier applied to incoming frame time.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Reports whether the session reached victory or defeat.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        query::outcome(&self.world).is_some()
    }

    /// Totals exposed to external score persistence.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        query::summary(&self.world)
    }

    /// Advances the session by one frame of `dt` real time.
    ///
    /// The frame time is scaled by the current time multiplier. Events
    /// produced during the tick are appended to `out` in order.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if self.is_finished() {
            return;
        }
        let dt = dt.mul_f64(f64::from(self.time_scale));

        world::apply(&mut self.world, Command::Tick { dt }, out);
        if self.is_finished() {
            return;
        }

        self.buffs.handle(
            &query::unit_view(&self.world),
            query::grid_view(&self.world),
            &mut self.unit_buffs,
        );
        let buffs = self.unit_buffs.clone();
        world::apply(&mut self.world, Command::ApplyBuffs { buffs }, out);

        let units = query::unit_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&units, &enemies, &mut self.targets);
        self.combat.handle(
            &units,
            &enemies,
            &self.targets,
            &query::config(&self.world).combat,
            &mut self.rng,
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out);
        }

        let start = out.len();
        world::apply(&mut self.world, Command::AdvanceProjectiles { dt }, out);
        let hits: Vec<_> = out[start..]
            .iter()
            .filter_map(|event| match event {
                Event::ProjectileHit { hit } => Some(hit.clone()),
                _ => None,
            })
            .collect();
        let units = query::unit_view(&self.world);
        for hit in hits {
            let enemies = query::enemy_view(&self.world);
            resolve_hit(
                &hit,
                &units,
                &enemies,
                &query::config(&self.world).combat,
                &mut self.impacts,
            );
            let impacts = self.impacts.clone();
            world::apply(&mut self.world, Command::ApplyImpacts { impacts }, out);
        }
    }

    /// Launches the first wave.
    pub fn start(&mut self, out: &mut Vec<Event>) -> Result<(), ActionError> {
        let events = self.submit(Command::StartGame, out)?;
        if events
            .iter()
            .any(|event| matches!(event, Event::WaveStarted { .. }))
        {
            Ok(())
        } else {
            Err(ActionError::AlreadyStarted)
        }
    }

    /// Pays for a randomly rolled unit and places it in the first empty cell.
    pub fn summon(&mut self, out: &mut Vec<Event>) -> Result<UnitId, ActionError> {
        self.ensure_running()?;
        let cost = query::config(&self.world).economy.summon_cost;
        if !query::can_afford(&self.world, cost) {
            return Err(self.reject_summon(SummonError::InsufficientFunds, out));
        }
        if query::placement_grid(&self.world).is_full() {
            return Err(self.reject_summon(SummonError::GridFull, out));
        }

        let (kind, grade) = self.roller.roll(&mut self.rng);
        let events = self.submit(Command::SummonUnit { kind, grade }, out)?;
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitPlaced { unit, .. } => Some(Ok(*unit)),
                Event::SummonRejected { reason } => Some(Err(ActionError::from(*reason))),
                _ => None,
            })
            .unwrap_or(Err(ActionError::SessionEnded))
    }

    /// Merges the unit at `from` into the unit at `to`.
    ///
    /// Both inputs are destroyed; the promoted unit, of a uniformly random
    /// archetype, is placed on `to`.
    pub fn merge(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<UnitId, ActionError> {
        self.ensure_running()?;
        let grade = match self.merge_inputs(from, to) {
            Ok(grade) => grade,
            Err(reason) => {
                debug!(?reason, "merge rejected");
                out.push(Event::MergeRejected { reason });
                return Err(reason.into());
            }
        };

        let Some((kind, grade)) = self.resolver.merge(grade, &mut self.rng) else {
            out.push(Event::MergeRejected {
                reason: MergeError::MaxGrade,
            });
            return Err(MergeError::MaxGrade.into());
        };
        let events = self.submit(
            Command::MergeUnits {
                from,
                to,
                kind,
                grade,
            },
            out,
        )?;
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitsMerged { result, .. } => Some(Ok(*result)),
                Event::MergeRejected { reason } => Some(Err(ActionError::from(*reason))),
                _ => None,
            })
            .unwrap_or(Err(ActionError::SessionEnded))
    }

    /// Drops the unit at `from` onto `to`.
    ///
    /// Onto an empty cell the unit moves; onto a unit it can merge with the
    /// two merge; onto any other unit the two swap.
    pub fn drop_unit(
        &mut self,
        from: CellCoord,
        to: CellCoord,
        out: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        self.ensure_running()?;
        if from != to && self.merge_inputs(from, to).is_ok() {
            return self.merge(from, to, out).map(|_| ());
        }

        let events = self.submit(Command::MoveUnit { from, to }, out)?;
        match events.iter().find_map(|event| match event {
            Event::PlacementRejected { reason } => Some(*reason),
            _ => None,
        }) {
            Some(reason) => Err(reason.into()),
            None => Ok(()),
        }
    }

    /// Sells the unit at `cell`, returning the refund.
    pub fn sell(&mut self, cell: CellCoord, out: &mut Vec<Event>) -> Result<u32, ActionError> {
        let events = self.submit(Command::SellUnit { cell }, out)?;
        events
            .iter()
            .find_map(|event| match event {
                Event::UnitSold { refund, .. } => Some(Ok(*refund)),
                Event::PlacementRejected { reason } => Some(Err(ActionError::from(*reason))),
                _ => None,
            })
            .unwrap_or(Err(ActionError::SessionEnded))
    }

    /// Skips the preparation delay, returning the bonus earned.
    pub fn skip_prepare(&mut self, out: &mut Vec<Event>) -> Result<u32, ActionError> {
        let events = self.submit(Command::SkipPrepare, out)?;
        events
            .iter()
            .find_map(|event| match event {
                Event::PreparationSkipped { bonus } => Some(Ok(*bonus)),
                Event::SkipRejected { reason } => Some(Err(ActionError::from(*reason))),
                _ => None,
            })
            .unwrap_or(Err(ActionError::SessionEnded))
    }

    /// Changes the multiplier applied to incoming frame time.
    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), ActionError> {
        if !scale.is_finite() || scale <= 0.0 {
            debug!(scale, "time scale rejected");
            return Err(ActionError::InvalidTimeScale { scale });
        }
        debug!(scale, "time scale changed");
        self.time_scale = scale;
        Ok(())
    }

    /// Dispatches a player intent to the matching action.
    pub fn perform(&mut self, action: Action, out: &mut Vec<Event>) -> Result<(), ActionError> {
        match action {
            Action::Start => self.start(out),
            Action::Summon => self.summon(out).map(|_| ()),
            Action::Sell { cell } => self.sell(cell, out).map(|_| ()),
            Action::Drop { from, to } => self.drop_unit(from, to, out),
            Action::Merge { from, to } => self.merge(from, to, out).map(|_| ()),
            Action::SkipPrepare => self.skip_prepare(out).map(|_| ()),
            Action::SetTimeScale { scale } => self.set_time_scale(scale),
        }
    }

    fn ensure_running(&self) -> Result<(), ActionError> {
        if self.is_finished() {
            Err(ActionError::SessionEnded)
        } else {
            Ok(())
        }
    }

    fn submit<'a>(
        &mut self,
        command: Command,
        out: &'a mut Vec<Event>,
    ) -> Result<&'a [Event], ActionError> {
        self.ensure_running()?;
        let start = out.len();
        world::apply(&mut self.world, command, out);
        Ok(&out[start..])
    }

    fn reject_summon(&self, reason: SummonError, out: &mut Vec<Event>) -> ActionError {
        debug!(?reason, "summon rejected");
        out.push(Event::SummonRejected { reason });
        reason.into()
    }

    fn merge_inputs(&self, from: CellCoord, to: CellCoord) -> Result<Grade, MergeError> {
        let units = query::unit_view(&self.world);
        let grid = query::grid_view(&self.world);
        let lookup = |cell| {
            grid.unit_at(cell)
                .and_then(|id| units.get(id).cloned())
                .ok_or(MergeError::MissingUnit)
        };
        let first = lookup(from)?;
        let second = lookup(to)?;
        can_merge(&first, &second)?;
        Ok(first.grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_defence_config::GradeWeights;
    use merge_defence_core::{Outcome, WavePhase};

    fn config() -> GameConfig {
        let mut config = GameConfig::builtin().expect("builtin config");
        config.summon.grade_weights = GradeWeights {
            common: 1.0,
            rare: 0.0,
            epic: 0.0,
            legend: 0.0,
            mythic: 0.0,
        };
        config
    }

    fn cells(simulation: &Simulation) -> Vec<CellCoord> {
        query::unit_view(simulation.world())
            .iter()
            .map(|unit| unit.cell)
            .collect()
    }

    #[test]
    fn configs_without_waves_are_rejected() {
        let mut config = config();
        config.waves.clear();
        assert!(matches!(Simulation::new(config), Err(ConfigError::NoWaves)));
    }

    #[test]
    fn summon_without_gold_leaves_balance_untouched() {
        let mut config = config();
        config.economy.starting_gold = 5;
        let mut simulation = Simulation::new(config).expect("simulation");
        let mut events = Vec::new();

        assert_eq!(
            simulation.summon(&mut events),
            Err(ActionError::Summon(SummonError::InsufficientFunds))
        );
        assert_eq!(query::gold(simulation.world()), 5);
        assert!(query::unit_view(simulation.world()).is_empty());
        assert_eq!(
            events,
            vec![Event::SummonRejected {
                reason: SummonError::InsufficientFunds
            }]
        );
    }

    #[test]
    fn time_scale_must_be_positive_and_finite() {
        let mut simulation = Simulation::new(config()).expect("simulation");

        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                simulation.set_time_scale(scale),
                Err(ActionError::InvalidTimeScale { .. })
            ));
        }
        assert_eq!(simulation.time_scale(), 1.0);
        assert_eq!(simulation.set_time_scale(2.0), Ok(()));
        assert_eq!(simulation.time_scale(), 2.0);
    }

    #[test]
    fn dropping_onto_same_grade_unit_merges_into_higher_grade() {
        let mut simulation = Simulation::new(config()).expect("simulation");
        let mut events = Vec::new();
        let _ = simulation.summon(&mut events).expect("first summon");
        let _ = simulation.summon(&mut events).expect("second summon");
        let occupied = cells(&simulation);

        simulation
            .drop_unit(occupied[0], occupied[1], &mut events)
            .expect("merge");

        let units = query::unit_view(simulation.world()).into_vec();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].grade, Grade::Rare);
        assert_eq!(units[0].cell, occupied[1]);
        assert_eq!(simulation.summary().merges, 1);
    }

    #[test]
    fn dropping_onto_empty_cell_moves_the_unit() {
        let mut simulation = Simulation::new(config()).expect("simulation");
        let mut events = Vec::new();
        let _ = simulation.summon(&mut events).expect("summon");
        let from = cells(&simulation)[0];
        let to = query::placement_grid(simulation.world())
            .first_empty()
            .expect("empty cell");

        simulation.drop_unit(from, to, &mut events).expect("move");

        assert_eq!(cells(&simulation), vec![to]);
    }

    #[test]
    fn merge_rejects_missing_inputs() {
        let mut simulation = Simulation::new(config()).expect("simulation");
        let mut events = Vec::new();
        let _ = simulation.summon(&mut events).expect("summon");
        let from = cells(&simulation)[0];
        let empty = query::placement_grid(simulation.world())
            .first_empty()
            .expect("empty cell");

        assert_eq!(
            simulation.merge(from, empty, &mut events),
            Err(ActionError::Merge(MergeError::MissingUnit))
        );
        assert_eq!(
            events.last(),
            Some(&Event::MergeRejected {
                reason: MergeError::MissingUnit
            })
        );
    }

    #[test]
    fn start_is_accepted_once() {
        let mut simulation = Simulation::new(config()).expect("simulation");
        let mut events = Vec::new();

        assert_eq!(simulation.start(&mut events), Ok(()));
        assert_eq!(
            simulation.start(&mut events),
            Err(ActionError::AlreadyStarted)
        );
        assert_eq!(query::current_wave(simulation.world()), 1);
    }

    #[test]
    fn skip_is_rejected_outside_preparation() {
        let mut simulation = Simulation::new(config()).expect("simulation");
        let mut events = Vec::new();

        assert_eq!(
            simulation.skip_prepare(&mut events),
            Err(ActionError::Skip(SkipError::NotPreparing))
        );
        assert_eq!(query::wave_phase(simulation.world()), WavePhase::Idle);
    }

    #[test]
    fn actions_after_defeat_report_session_ended() {
        let mut config = config();
        config.player.starting_lives = 1;
        let mut simulation = Simulation::new(config).expect("simulation");
        let mut events = Vec::new();
        simulation.start(&mut events).expect("start");

        for _ in 0..5_000 {
            simulation.tick(Duration::from_millis(50), &mut events);
            if simulation.is_finished() {
                break;
            }
        }

        assert_eq!(query::outcome(simulation.world()), Some(Outcome::Defeat));
        assert_eq!(
            simulation.summon(&mut events),
            Err(ActionError::SessionEnded)
        );
        assert_eq!(
            simulation.perform(Action::SkipPrepare, &mut events),
            Err(ActionError::SessionEnded)
        );
    }
}
