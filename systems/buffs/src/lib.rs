#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that re-derives every unit's buff from supporter placement.
//!
//! Buffs are non-persistent: each call computes the complete buff of every
//! unit from scratch, so a removed or moved supporter stops contributing on
//! the very next tick.

use merge_defence_core::{Buff, GridView, UnitBuff, UnitId, UnitKind, UnitView};

/// Buff propagation system that reuses its accumulator between ticks.
#[derive(Debug, Default)]
pub struct BuffPropagation {
    totals: Vec<(UnitId, Buff)>,
}

impl BuffPropagation {
    /// Creates a new buff propagation system with an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the buff of every unit in the view.
    ///
    /// The output buffer is cleared and then receives exactly one entry per
    /// unit, in identifier order, including units whose buff is zero.
    pub fn handle(&mut self, units: &UnitView, grid: GridView<'_>, out: &mut Vec<UnitBuff>) {
        out.clear();
        self.totals.clear();
        self.totals
            .extend(units.iter().map(|unit| (unit.id, Buff::ZERO)));
        if self.totals.is_empty() {
            return;
        }

        let global: f32 = units
            .iter()
            .filter(|unit| unit.kind == UnitKind::Supporter)
            .map(|unit| unit.abilities.global_attack_buff())
            .sum();
        if global != 0.0 {
            for (_, buff) in &mut self.totals {
                buff.attack_percent += global;
            }
        }

        for supporter in units.iter().filter(|unit| unit.kind == UnitKind::Supporter) {
            let Some(local) = supporter.abilities.local_buff() else {
                continue;
            };
            for cell in grid.adjacent(supporter.cell) {
                let Some(neighbour) = grid.unit_at(cell) else {
                    continue;
                };
                if neighbour == supporter.id {
                    continue;
                }
                if let Ok(index) = self.totals.binary_search_by_key(&neighbour, |entry| entry.0) {
                    self.totals[index].1 += local;
                }
            }
        }

        out.reserve(self.totals.len());
        out.extend(
            self.totals
                .iter()
                .map(|(unit, buff)| UnitBuff { unit: *unit, buff: *buff }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merge_defence_core::{
        Ability, AbilitySet, CellCoord, Grade, GridCell, UnitSnapshot, Vec2,
    };
    use std::time::Duration;

    fn snapshot(id: u32, kind: UnitKind, cell: CellCoord, abilities: Vec<Ability>) -> UnitSnapshot {
        UnitSnapshot {
            id: UnitId::new(id),
            kind,
            grade: Grade::Common,
            cell,
            position: Vec2::ZERO,
            attack: 10,
            attack_interval: Duration::from_secs(1),
            range: 100.0,
            buff: Buff::ZERO,
            abilities: AbilitySet::new(abilities),
            ready: true,
            freeze_charge: Duration::ZERO,
        }
    }

    fn cells(columns: u32, rows: u32, units: &[&UnitSnapshot]) -> Vec<GridCell> {
        let mut cells = vec![GridCell::default(); (columns * rows) as usize];
        for unit in units {
            cells[(unit.cell.row() * columns + unit.cell.column()) as usize].unit = Some(unit.id);
        }
        cells
    }

    fn buff_of(out: &[UnitBuff], id: u32) -> Buff {
        out.iter()
            .find(|entry| entry.unit == UnitId::new(id))
            .map(|entry| entry.buff)
            .expect("unit present")
    }

    #[test]
    fn empty_view_produces_nothing() {
        let mut system = BuffPropagation::new();
        let grid_cells = cells(2, 2, &[]);
        let mut out = vec![UnitBuff {
            unit: UnitId::new(9),
            buff: Buff::attack(1.0),
        }];

        system.handle(
            &UnitView::default(),
            GridView::new(&grid_cells, 2, 2),
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn global_attack_buff_reaches_every_unit_including_supporters() {
        let supporter = snapshot(
            1,
            UnitKind::Supporter,
            CellCoord::new(0, 0),
            vec![Ability::BuffAtkGlobal { value: 0.1 }],
        );
        let far = snapshot(2, UnitKind::Archer, CellCoord::new(3, 3), Vec::new());
        let grid_cells = cells(4, 4, &[&supporter, &far]);
        let view = UnitView::from_snapshots(vec![supporter, far]);
        let mut system = BuffPropagation::new();
        let mut out = Vec::new();

        system.handle(&view, GridView::new(&grid_cells, 4, 4), &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(buff_of(&out, 1), Buff::attack(0.1));
        assert_eq!(buff_of(&out, 2), Buff::attack(0.1));
    }

    #[test]
    fn local_buffs_stack_additively_from_several_supporters() {
        let left = snapshot(
            1,
            UnitKind::Supporter,
            CellCoord::new(0, 1),
            vec![
                Ability::BuffAtk { value: 0.2 },
                Ability::BuffSpeed { value: 0.1 },
            ],
        );
        let right = snapshot(
            2,
            UnitKind::Supporter,
            CellCoord::new(2, 1),
            vec![Ability::BuffRange { value: 0.25 }],
        );
        let middle = snapshot(3, UnitKind::Mage, CellCoord::new(1, 1), Vec::new());
        let grid_cells = cells(3, 3, &[&left, &right, &middle]);
        let view = UnitView::from_snapshots(vec![left, right, middle]);
        let mut system = BuffPropagation::new();
        let mut out = Vec::new();

        system.handle(&view, GridView::new(&grid_cells, 3, 3), &mut out);

        assert_eq!(
            buff_of(&out, 3),
            Buff {
                attack_percent: 0.2,
                speed_percent: 0.1,
                range_percent: 0.25,
            }
        );
        assert!(buff_of(&out, 1).is_zero());
        assert!(buff_of(&out, 2).is_zero());
    }

    #[test]
    fn diagonal_neighbours_are_not_buffed() {
        let supporter = snapshot(
            1,
            UnitKind::Supporter,
            CellCoord::new(1, 1),
            vec![Ability::BuffAtk { value: 0.3 }],
        );
        let diagonal = snapshot(2, UnitKind::Warrior, CellCoord::new(0, 0), Vec::new());
        let grid_cells = cells(3, 3, &[&supporter, &diagonal]);
        let view = UnitView::from_snapshots(vec![supporter, diagonal]);
        let mut system = BuffPropagation::new();
        let mut out = Vec::new();

        system.handle(&view, GridView::new(&grid_cells, 3, 3), &mut out);

        assert!(buff_of(&out, 2).is_zero());
    }

    #[test]
    fn abilities_of_non_supporters_are_ignored() {
        let impostor = snapshot(
            1,
            UnitKind::Warrior,
            CellCoord::new(0, 0),
            vec![
                Ability::BuffAtk { value: 0.5 },
                Ability::BuffAtkGlobal { value: 0.5 },
            ],
        );
        let neighbour = snapshot(2, UnitKind::Archer, CellCoord::new(1, 0), Vec::new());
        let grid_cells = cells(2, 1, &[&impostor, &neighbour]);
        let view = UnitView::from_snapshots(vec![impostor, neighbour]);
        let mut system = BuffPropagation::new();
        let mut out = Vec::new();

        system.handle(&view, GridView::new(&grid_cells, 2, 1), &mut out);

        assert!(out.iter().all(|entry| entry.buff.is_zero()));
    }
}
