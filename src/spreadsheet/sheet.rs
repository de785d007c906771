use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use std::collections::BTreeMap;

/// A worksheet held in memory as a sparse grid of cells.
///
/// Public accessors take 1-based row and column numbers, matching spreadsheet
/// coordinates. Cells are kept in row-major order, which is also the order they
/// are written back in.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    /// Sheet name
    name: String,
    /// Cells keyed by 0-based (row, col)
    cells: BTreeMap<(usize, usize), Cell>,
}

impl Sheet {
    /// Creates an empty sheet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: BTreeMap::new(),
        }
    }

    /// Returns the sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the sheet.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    /// Returns the cell at the 1-based position, or None when nothing is stored there.
    pub fn read_cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.cells
            .get(&(row - 1, col - 1))
            .filter(|cell| cell.kind != CellType::Empty)
    }

    /// Writes a text value at the 1-based position, replacing any previous cell.
    ///
    /// # Panics
    /// Panics if `row` or `col` is 0.
    pub fn write_cell(&mut self, row: usize, col: usize, value: &str) {
        assert!(row > 0 && col > 0, "cell positions are 1-based");
        self.push(Cell::text(row - 1, col - 1, value));
    }

    /// Stores a cell at its own 0-based position.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.cells.insert((cell.row, cell.col), cell);
    }

    /// Iterates cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the 1-based (last row, last column) that holds a cell.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        let last_row = self.cells.keys().map(|(row, _)| row + 1).max()?;
        let last_col = self.cells.keys().map(|(_, col)| col + 1).max()?;
        Some((last_row, last_col))
    }
}
