// src/pool/grid.rs
// =============================================================================
// Tiles worker browser windows over the screen.
//
// With the default 3x2 grid over 1440x875, six workers each get a
// 480x437 window, so you can watch every crawl at once. Slot numbers wrap
// around if there are more workers than cells.
// =============================================================================

use crate::browser::WindowRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGrid {
    pub area_width: u32,
    pub area_height: u32,
    pub columns: u32,
    pub rows: u32,
    /// Extra space between cells, room for window decorations
    pub gap_x: u32,
    pub gap_y: u32,
}

impl Default for WindowGrid {
    fn default() -> Self {
        Self {
            area_width: 1440,
            area_height: 875,
            columns: 3,
            rows: 2,
            gap_x: 2,
            gap_y: 6,
        }
    }
}

impl WindowGrid {
    /// Window placement for a worker slot
    pub fn rect(&self, slot: usize) -> WindowRect {
        let columns = self.columns.max(1);
        let rows = self.rows.max(1);
        let cell = (slot % (columns * rows) as usize) as u32;

        let width = self.area_width / columns;
        let height = self.area_height / rows;
        let (row, column) = (cell / columns, cell % columns);

        WindowRect {
            x: (column * (width + self.gap_x)) as i32,
            y: (row * (height + self.gap_y)) as i32,
            width,
            height,
        }
    }
}
