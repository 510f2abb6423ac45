//! Placement grid mapping cells to units.

use merge_defence_config::MapConfig;
use merge_defence_core::{CellCoord, GridCell, GridView, PlacementError, UnitId, Vec2};

use crate::path::PolylinePath;

/// Number of segments sampled along the path when blocking cells.
const PATH_SAMPLES: u32 = 500;

/// Dense row-major grid of placement cells laid over the map.
#[derive(Clone, Debug)]
pub struct PlacementGrid {
    cells: Vec<GridCell>,
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec2,
    available: usize,
}

impl PlacementGrid {
    /// Builds an empty grid with no blocked cells.
    #[must_use]
    pub fn new(columns: u32, rows: u32, cell_size: f32, origin: Vec2) -> Self {
        let capacity = columns as usize * rows as usize;
        Self {
            cells: vec![GridCell::default(); capacity],
            columns,
            rows,
            cell_size,
            origin,
            available: capacity,
        }
    }

    /// Lays a grid over the map and blocks every cell the path crosses.
    ///
    /// The grid is centred inside the map. A cell is blocked when any sampled
    /// path point lies within half a cell plus the path's half width of the
    /// cell centre on both axes.
    #[must_use]
    pub fn from_map(map: &MapConfig, path: &PolylinePath) -> Self {
        let columns = (map.width / map.cell_size).floor().max(0.0) as u32;
        let rows = (map.height / map.cell_size).floor().max(0.0) as u32;
        let origin = Vec2::new(
            map.x + (map.width - columns as f32 * map.cell_size) / 2.0,
            map.y + (map.height - rows as f32 * map.cell_size) / 2.0,
        );
        let mut grid = Self::new(columns, rows, map.cell_size, origin);

        let samples = path.sample(PATH_SAMPLES);
        let reach = map.cell_size / 2.0 + map.path_half_width;
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                let centre = grid.cell_center(cell);
                let crossed = samples.iter().any(|point| {
                    (point.x - centre.x).abs() < reach && (point.y - centre.y).abs() < reach
                });
                if crossed {
                    grid.block(cell);
                }
            }
        }
        grid
    }

    /// Marks a cell as unavailable for placement.
    pub fn block(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if !self.cells[index].blocked {
                self.cells[index].blocked = true;
                self.available -= 1;
            }
        }
    }

    /// Provides the dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Number of cells that are not blocked by the path.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.available
    }

    /// World position of the cell centre.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.origin
            + Vec2::new(
                (cell.column() as f32 + 0.5) * self.cell_size,
                (cell.row() as f32 + 0.5) * self.cell_size,
            )
    }

    /// Unit occupying the cell, if any.
    #[must_use]
    pub fn unit_at(&self, cell: CellCoord) -> Option<UnitId> {
        self.index(cell).and_then(|index| self.cells[index].unit)
    }

    /// Orthogonal, in-bounds, non-blocked neighbours of the cell.
    #[must_use]
    pub fn adjacent(&self, cell: CellCoord) -> Vec<CellCoord> {
        self.view().adjacent(cell)
    }

    /// First empty, non-blocked cell in row-major order.
    #[must_use]
    pub fn first_empty(&self) -> Option<CellCoord> {
        let width = self.columns as usize;
        self.cells
            .iter()
            .position(|cell| !cell.blocked && cell.unit.is_none())
            .map(|index| CellCoord::new((index % width) as u32, (index / width) as u32))
    }

    /// Reports whether every non-blocked cell is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    /// Places a unit on an empty, non-blocked cell.
    pub fn place(&mut self, cell: CellCoord, unit: UnitId) -> Result<(), PlacementError> {
        let index = self.placeable(cell)?;
        if self.cells[index].unit.is_some() {
            return Err(PlacementError::Occupied);
        }
        self.cells[index].unit = Some(unit);
        Ok(())
    }

    /// Removes and returns the unit occupying the cell.
    pub fn remove(&mut self, cell: CellCoord) -> Result<UnitId, PlacementError> {
        let index = self.placeable(cell)?;
        self.cells[index].unit.take().ok_or(PlacementError::Empty)
    }

    /// Moves the unit at `from` onto `to`, swapping with any occupant.
    ///
    /// Returns the unit that was displaced onto `from`, if any.
    pub fn move_unit(
        &mut self,
        from: CellCoord,
        to: CellCoord,
    ) -> Result<Option<UnitId>, PlacementError> {
        if from == to {
            return Err(PlacementError::SameCell);
        }
        let source = self.placeable(from)?;
        let destination = self.placeable(to)?;
        let moving = self.cells[source].unit.ok_or(PlacementError::Empty)?;
        let displaced = self.cells[destination].unit.replace(moving);
        self.cells[source].unit = displaced;
        Ok(displaced)
    }

    /// Captures a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows)
    }

    fn placeable(&self, cell: CellCoord) -> Result<usize, PlacementError> {
        let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
        if self.cells[index].blocked {
            return Err(PlacementError::Blocked);
        }
        Ok(index)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }
}
