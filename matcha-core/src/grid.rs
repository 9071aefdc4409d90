//! Terminal grid: the visible cell matrix plus its dirty-row bitmap

use serde::{Deserialize, Serialize};

use crate::cell::CellAttributes;
use crate::line::Line;
use crate::Dimensions;

/// A rectangular array of styled cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    lines: Vec<Line>,
    /// Rows mutated since the last repaint
    dirty: Vec<bool>,
    cols: usize,
    rows: usize,
}

impl Grid {
    pub fn new(dims: Dimensions) -> Self {
        Self {
            lines: (0..dims.rows).map(|_| Line::new(dims.cols)).collect(),
            dirty: vec![true; dims.rows],
            cols: dims.cols,
            rows: dims.rows,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn line(&self, row: usize) -> &Line {
        &self.lines[row]
    }

    /// Mutable access to a row; the caller is responsible for marking it
    /// dirty when it actually changes.
    pub fn line_mut(&mut self, row: usize) -> &mut Line {
        &mut self.lines[row]
    }

    pub fn mark_dirty(&mut self, row: usize) {
        if let Some(flag) = self.dirty.get_mut(row) {
            *flag = true;
        }
    }

    /// Mark the inclusive row range dirty, clamped to the grid
    pub fn mark_dirty_range(&mut self, top: usize, bot: usize) {
        let last = self.rows.saturating_sub(1);
        for row in top.min(last)..=bot.min(last) {
            self.dirty[row] = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for flag in &mut self.dirty {
            *flag = true;
        }
    }

    pub fn is_dirty(&self, row: usize) -> bool {
        self.dirty.get(row).copied().unwrap_or(false)
    }

    /// Return the dirty rows and clear the bitmap
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let rows = (0..self.rows).filter(|&r| self.dirty[r]).collect();
        for flag in &mut self.dirty {
            *flag = false;
        }
        rows
    }

    /// Clear a rectangular region (inclusive corners, swapped and clamped)
    pub fn clear_region(
        &mut self,
        mut x1: usize,
        mut y1: usize,
        mut x2: usize,
        mut y2: usize,
        attrs: CellAttributes,
    ) {
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
        }
        if y1 > y2 {
            std::mem::swap(&mut y1, &mut y2);
        }
        let last_row = self.rows.saturating_sub(1);
        y1 = y1.min(last_row);
        y2 = y2.min(last_row);

        for y in y1..=y2 {
            self.dirty[y] = true;
            self.lines[y].clear_range(x1, x2, attrs);
        }
    }

    /// Rotate rows up within `[orig, bot]`, clearing the revealed band at
    /// the bottom.
    pub fn scroll_up(&mut self, orig: usize, bot: usize, n: usize, attrs: CellAttributes) {
        if orig > bot || bot >= self.rows {
            return;
        }
        let n = n.min(bot - orig + 1);
        if n == 0 {
            return;
        }

        self.clear_region(0, orig, self.cols - 1, orig + n - 1, attrs);
        for row in orig..=bot - n {
            self.lines.swap(row, row + n);
        }
        self.mark_dirty_range(orig, bot);
    }

    /// Rotate rows down within `[orig, bot]`, clearing the revealed band at
    /// the top.
    pub fn scroll_down(&mut self, orig: usize, bot: usize, n: usize, attrs: CellAttributes) {
        if orig > bot || bot >= self.rows {
            return;
        }
        let n = n.min(bot - orig + 1);
        if n == 0 {
            return;
        }

        self.clear_region(0, bot - n + 1, self.cols - 1, bot, attrs);
        for row in (orig + n..=bot).rev() {
            self.lines.swap(row, row - n);
        }
        self.mark_dirty_range(orig, bot);
    }

    /// Drop the first `n` rows, appending blank rows at the bottom.
    /// Used by resize to keep the cursor on screen.
    pub fn rotate_up(&mut self, n: usize) {
        let n = n.min(self.rows);
        if n == 0 {
            return;
        }
        self.lines.rotate_left(n);
        for line in &mut self.lines[self.rows - n..] {
            line.clear(CellAttributes::default());
        }
        self.mark_all_dirty();
    }

    /// Resize to new dimensions, zero-padding revealed cells
    pub fn resize(&mut self, dims: Dimensions) {
        for line in &mut self.lines {
            line.resize(dims.cols);
        }
        self.lines.resize_with(dims.rows, || Line::new(dims.cols));
        self.dirty.resize(dims.rows, true);
        self.cols = dims.cols;
        self.rows = dims.rows;
        self.mark_all_dirty();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with_rows(rows: usize) -> Grid {
        let mut grid = Grid::new(Dimensions::new(10, rows));
        for row in 0..rows {
            grid.line_mut(row).cell_mut(0).set_char((b'A' + row as u8) as char);
        }
        grid
    }

    #[test]
    fn test_grid_new_all_dirty() {
        let mut grid = Grid::new(Dimensions::new(10, 3));
        assert_eq!(grid.take_dirty(), vec![0, 1, 2]);
        assert!(grid.take_dirty().is_empty());
    }

    #[test]
    fn test_scroll_up() {
        let mut grid = grid_with_rows(5);
        grid.scroll_up(0, 4, 2, CellAttributes::default());
        // C, D, E, _, _
        assert_eq!(grid.line(0).cell(0).content(), 'C');
        assert_eq!(grid.line(1).cell(0).content(), 'D');
        assert_eq!(grid.line(2).cell(0).content(), 'E');
        assert!(grid.line(3).cell(0).is_blank());
        assert!(grid.line(4).cell(0).is_blank());
    }

    #[test]
    fn test_scroll_down() {
        let mut grid = grid_with_rows(5);
        grid.scroll_down(0, 4, 2, CellAttributes::default());
        // _, _, A, B, C
        assert!(grid.line(0).cell(0).is_blank());
        assert!(grid.line(1).cell(0).is_blank());
        assert_eq!(grid.line(2).cell(0).content(), 'A');
        assert_eq!(grid.line(3).cell(0).content(), 'B');
        assert_eq!(grid.line(4).cell(0).content(), 'C');
    }

    #[test]
    fn test_scroll_region_only() {
        let mut grid = grid_with_rows(5);
        grid.scroll_up(1, 3, 1, CellAttributes::default());
        // A, C, D, _, E
        assert_eq!(grid.line(0).cell(0).content(), 'A');
        assert_eq!(grid.line(1).cell(0).content(), 'C');
        assert_eq!(grid.line(2).cell(0).content(), 'D');
        assert!(grid.line(3).cell(0).is_blank());
        assert_eq!(grid.line(4).cell(0).content(), 'E');
    }

    #[test]
    fn test_scroll_marks_dirty() {
        let mut grid = grid_with_rows(5);
        grid.take_dirty();
        grid.scroll_up(1, 3, 1, CellAttributes::default());
        assert_eq!(grid.take_dirty(), vec![1, 2, 3]);
    }

    #[test]
    fn test_clear_region_swaps_corners() {
        let mut grid = grid_with_rows(3);
        grid.clear_region(9, 2, 0, 0, CellAttributes::default());
        for row in 0..3 {
            assert!(grid.line(row).cell(0).is_blank());
        }
    }

    #[test]
    fn test_rotate_up() {
        let mut grid = grid_with_rows(5);
        grid.rotate_up(2);
        assert_eq!(grid.line(0).cell(0).content(), 'C');
        assert!(grid.line(3).cell(0).is_blank());
        assert!(grid.line(4).cell(0).is_blank());
    }

    #[test]
    fn test_resize_preserves_content() {
        let mut grid = grid_with_rows(3);
        grid.resize(Dimensions::new(20, 5));
        assert_eq!(grid.cols(), 20);
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.line(0).cell(0).content(), 'A');
        assert!(grid.line(4).cell(0).is_blank());
    }
}
