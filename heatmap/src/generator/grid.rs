use std::ops::Range;

/// Per-cell motion event counts over a `rows x cols` division of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionGrid {
    rows: u32,
    cols: u32,
    counts: Vec<u32>,
}

impl DivisionGrid {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            counts: vec![0; rows as usize * cols as usize],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn get(&self, row: u32, col: u32) -> u32 {
        self.counts[self.offset(row, col)]
    }

    pub fn increment(&mut self, row: u32, col: u32) {
        let i = self.offset(row, col);
        self.counts[i] += 1;
    }

    /// Count of the busiest cell.
    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Pixel rows covered by grid row `row` in a frame `height` pixels tall.
    /// Remainder pixels are spread so every row of pixels belongs to one cell.
    pub fn row_span(&self, row: u32, height: u32) -> Range<u32> {
        span(row, self.rows, height)
    }

    pub fn col_span(&self, col: u32, width: u32) -> Range<u32> {
        span(col, self.cols, width)
    }

    /// Grid cell containing pixel `(x, y)`.
    pub fn cell_of(&self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        let row = (y as u64 * self.rows as u64 / height as u64) as u32;
        let col = (x as u64 * self.cols as u64 / width as u64) as u32;
        (row.min(self.rows - 1), col.min(self.cols - 1))
    }

    fn offset(&self, row: u32, col: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }
}

fn span(i: u32, divisions: u32, len: u32) -> Range<u32> {
    let boundary = |i: u64| ((i * len as u64).div_ceil(divisions as u64)) as u32;
    boundary(i as u64)..boundary(i as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_cover_every_pixel_once() {
        let grid = DivisionGrid::new(36, 64);
        let mut next = 0;
        for row in 0..36 {
            let span = grid.row_span(row, 100);
            assert_eq!(span.start, next);
            assert!(!span.is_empty());
            next = span.end;
        }
        assert_eq!(next, 100);
    }

    #[test]
    fn cell_of_agrees_with_spans() {
        let grid = DivisionGrid::new(3, 4);
        let (width, height) = (10, 7);
        for y in 0..height {
            for x in 0..width {
                let (row, col) = grid.cell_of(x, y, width, height);
                assert!(grid.row_span(row, height).contains(&y), "y={y} row={row}");
                assert!(grid.col_span(col, width).contains(&x), "x={x} col={col}");
            }
        }
    }

    #[test]
    fn counts_and_max() {
        let mut grid = DivisionGrid::new(2, 2);
        assert_eq!(grid.max(), 0);
        grid.increment(1, 0);
        grid.increment(1, 0);
        grid.increment(0, 1);
        assert_eq!(grid.get(1, 0), 2);
        assert_eq!(grid.get(0, 1), 1);
        assert_eq!(grid.get(0, 0), 0);
        assert_eq!(grid.max(), 2);
    }
}
