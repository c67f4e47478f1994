//! Static terrain occupancy

use std::path::Path;

use super::error::{GameError, Result};

/// Boolean occupancy grid stretched over the world rectangle.
///
/// Built once before a match and never mutated afterwards. Anything outside
/// the world rectangle counts as an obstacle.
#[derive(Debug, Clone)]
pub struct ObstacleField {
    width: f32,
    height: f32,
    cols: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl ObstacleField {
    /// A field with no interior obstacles; only the bounds block.
    pub fn open(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            cols: 1,
            rows: 1,
            cells: vec![false],
        }
    }

    /// Per-pixel grid from a raw RGBA buffer; near-black pixels are solid.
    pub fn from_rgba(
        pixels_wide: usize,
        pixels_high: usize,
        rgba: &[u8],
        width: f32,
        height: f32,
    ) -> Result<Self> {
        if pixels_wide == 0 || pixels_high == 0 {
            return Err(GameError::InvalidMap("image has no pixels".to_string()));
        }
        if rgba.len() != pixels_wide * pixels_high * 4 {
            return Err(GameError::InvalidMap(format!(
                "expected {} bytes of RGBA, got {}",
                pixels_wide * pixels_high * 4,
                rgba.len()
            )));
        }

        let cells = rgba
            .chunks_exact(4)
            .map(|px| px[0] < 10 && px[1] < 10 && px[2] < 10)
            .collect();

        Ok(Self {
            width,
            height,
            cols: pixels_wide,
            rows: pixels_high,
            cells,
        })
    }

    /// Grid from text rows where `#` marks a solid cell. Short and blank
    /// rows are padded with free cells; only trailing blank lines are dropped.
    pub fn from_ascii(text: &str, width: f32, height: f32) -> Result<Self> {
        let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        let cols = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if cols == 0 {
            return Err(GameError::InvalidMap("map has no cells".to_string()));
        }

        let rows = lines.len();
        let mut cells = vec![false; cols * rows];
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                cells[row * cols + col] = ch == '#';
            }
        }

        Ok(Self {
            width,
            height,
            cols,
            rows,
            cells,
        })
    }

    /// Read an ASCII map from disk.
    pub fn load(path: impl AsRef<Path>, width: f32, height: f32) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ascii(&text, width, height)
    }

    /// Mark a world-space rectangle as solid. Only usable before the field
    /// is handed to a world.
    pub fn with_rect(mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        if self.cols == 1 && self.rows == 1 {
            // Open fields get a unit-resolution grid so rectangles are exact.
            self.cols = self.width.ceil().max(1.0) as usize;
            self.rows = self.height.ceil().max(1.0) as usize;
            self.cells = vec![self.cells[0]; self.cols * self.rows];
        }

        let (c0, r0) = self.cell_of(x0.min(x1), y0.min(y1));
        let (c1, r1) = self.cell_of(x0.max(x1), y0.max(y1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.cells[row * self.cols + col] = true;
            }
        }
        self
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn solid_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_obstacle(&self, x: f32, y: f32) -> bool {
        if !(x >= 0.0 && x < self.width && y >= 0.0 && y < self.height) {
            return true;
        }
        let (col, row) = self.cell_of(x, y);
        self.cells[row * self.cols + col]
    }

    fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let fx = (x / self.width).clamp(0.0, 1.0);
        let fy = (y / self.height).clamp(0.0, 1.0);
        let col = ((fx * self.cols as f32) as usize).min(self.cols - 1);
        let row = ((fy * self.rows as f32) as usize).min(self.rows - 1);
        (col, row)
    }
}
