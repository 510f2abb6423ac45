//! Greedy policy that plays a session without human input.

use merge_defence_core::{Action, CellCoord, WavePhase};
use merge_defence_world::{query, World};

/// Chooses player actions from the current world state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Autoplay {
    skip_preparation: bool,
}

impl Autoplay {
    /// Creates a policy; `skip_preparation` enables the skip bonus.
    pub(crate) fn new(skip_preparation: bool) -> Self {
        Self { skip_preparation }
    }

    /// Appends the actions to perform this frame, in order.
    ///
    /// At most one merge and one summon are proposed per frame. Nothing is
    /// proposed once the session ended.
    pub(crate) fn plan(&self, world: &World, out: &mut Vec<Action>) {
        out.clear();
        if query::outcome(world).is_some() {
            return;
        }

        if let Some((from, to)) = merge_pair(world) {
            out.push(Action::Merge { from, to });
        }

        let cost = query::config(world).economy.summon_cost;
        if query::can_afford(world, cost) && !query::placement_grid(world).is_full() {
            out.push(Action::Summon);
        }

        match query::wave_phase(world) {
            WavePhase::Idle => out.push(Action::Start),
            WavePhase::Preparing if self.skip_preparation => out.push(Action::SkipPrepare),
            _ => {}
        }
    }
}

/// First pair of same-grade units below the top grade, in unit id order.
fn merge_pair(world: &World) -> Option<(CellCoord, CellCoord)> {
    let units = query::unit_view(world).into_vec();
    units.iter().enumerate().find_map(|(index, first)| {
        if first.grade.is_max() {
            return None;
        }
        units[index + 1..]
            .iter()
            .find(|second| second.grade == first.grade)
            .map(|second| (first.cell, second.cell))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_defence_config::GameConfig;
    use merge_defence_core::{Command, Grade, UnitKind};
    use merge_defence_world as world;

    fn world() -> World {
        World::new(&GameConfig::builtin().expect("builtin config"))
    }

    fn summon(world: &mut World, kind: UnitKind, grade: Grade) {
        let mut events = Vec::new();
        world::apply(world, Command::SummonUnit { kind, grade }, &mut events);
    }

    #[test]
    fn idle_world_summons_and_starts() {
        let mut actions = Vec::new();
        Autoplay::new(true).plan(&world(), &mut actions);

        assert_eq!(actions, vec![Action::Summon, Action::Start]);
    }

    #[test]
    fn same_grade_pair_is_merged_first() {
        let mut world = world();
        summon(&mut world, UnitKind::Archer, Grade::Rare);
        summon(&mut world, UnitKind::Mage, Grade::Common);
        summon(&mut world, UnitKind::Warrior, Grade::Rare);
        let cells: Vec<CellCoord> = query::unit_view(&world)
            .iter()
            .map(|unit| unit.cell)
            .collect();

        let mut actions = Vec::new();
        Autoplay::new(false).plan(&world, &mut actions);

        assert_eq!(
            actions[0],
            Action::Merge {
                from: cells[0],
                to: cells[2],
            }
        );
    }

    #[test]
    fn mythic_units_are_never_paired() {
        let mut world = world();
        summon(&mut world, UnitKind::Special, Grade::Mythic);
        summon(&mut world, UnitKind::Special, Grade::Mythic);

        let mut actions = Vec::new();
        Autoplay::new(false).plan(&world, &mut actions);

        assert!(!actions
            .iter()
            .any(|action| matches!(action, Action::Merge { .. })));
    }

    #[test]
    fn broke_players_do_not_summon() {
        let mut config = GameConfig::builtin().expect("builtin config");
        config.economy.starting_gold = 0;
        let world = World::new(&config);

        let mut actions = Vec::new();
        Autoplay::new(false).plan(&world, &mut actions);

        assert_eq!(actions, vec![Action::Start]);
    }
}
