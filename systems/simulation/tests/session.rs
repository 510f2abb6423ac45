use std::time::Duration;

use merge_defence_config::{GameConfig, GradeTable, SpawnGroup, WaveDefinition};
use merge_defence_core::{EnemyKind, Event, Outcome};
use merge_defence_system_simulation::Simulation;
use merge_defence_world::query;

const FRAME: Duration = Duration::from_millis(16);

fn stretch_ranges(table: &mut GradeTable) {
    for stats in [
        &mut table.common,
        &mut table.rare,
        &mut table.epic,
        &mut table.legend,
        &mut table.mythic,
    ] {
        stats.range = 10_000.0;
    }
}

fn run_until_finished(simulation: &mut Simulation, events: &mut Vec<Event>) {
    for _ in 0..20_000 {
        simulation.tick(FRAME, events);
        if simulation.is_finished() {
            return;
        }
    }
}

#[test]
fn long_range_squad_clears_single_wave_for_victory() {
    let mut config = GameConfig::builtin().expect("builtin config");
    config.waves = vec![WaveDefinition {
        reward: 25,
        groups: vec![SpawnGroup {
            kind: EnemyKind::Normal,
            count: 3,
            hp: 5,
        }],
    }];
    for table in [
        &mut config.units.warrior,
        &mut config.units.archer,
        &mut config.units.mage,
        &mut config.units.supporter,
        &mut config.units.special,
    ] {
        stretch_ranges(table);
    }
    let lives = config.player.starting_lives;

    let mut simulation = Simulation::new(config).expect("valid config");
    let mut events = Vec::new();
    let mut summoned = 0;
    while summoned < 5 && simulation.summon(&mut events).is_ok() {
        summoned += 1;
    }
    assert!(summoned > 0, "starting gold must afford a summon");

    simulation.start(&mut events).expect("first start");
    run_until_finished(&mut simulation, &mut events);

    let summary = simulation.summary();
    assert_eq!(summary.outcome, Some(Outcome::Victory));
    assert_eq!(summary.kills, 3);
    assert_eq!(summary.lives, lives);
    assert!(summary.score > 0);
    assert!(events.contains(&Event::SessionEnded {
        outcome: Outcome::Victory
    }));
    assert!(query::enemy_view(simulation.world()).is_empty());
}

#[test]
fn undefended_path_ends_in_defeat() {
    let mut config = GameConfig::builtin().expect("builtin config");
    config.player.starting_lives = 3;

    let mut simulation = Simulation::new(config).expect("valid config");
    let mut events = Vec::new();
    simulation.start(&mut events).expect("first start");
    run_until_finished(&mut simulation, &mut events);

    let summary = simulation.summary();
    assert_eq!(summary.outcome, Some(Outcome::Defeat));
    assert_eq!(summary.lives, 0);
    assert_eq!(summary.kills, 0);

    let ended = events
        .iter()
        .filter(|event| matches!(event, Event::SessionEnded { .. }))
        .count();
    assert_eq!(ended, 1);

    let before = events.len();
    simulation.tick(FRAME, &mut events);
    assert_eq!(events.len(), before, "finished sessions stay frozen");
}

#[test]
fn time_scale_multiplies_simulated_time() {
    let config = GameConfig::builtin().expect("builtin config");
    let mut simulation = Simulation::new(config).expect("valid config");
    let mut events = Vec::new();

    simulation.set_time_scale(2.0).expect("valid scale");
    simulation.tick(Duration::from_millis(100), &mut events);

    assert_eq!(
        query::elapsed(simulation.world()),
        Duration::from_millis(200)
    );
}
