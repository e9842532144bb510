use rayon::prelude::*;

use crate::kernel::Matrix3;

/// Trail concentration per grid cell.
///
/// Every cell stays within `[0, tao * max_strength]`. The field is only ever
/// written by `reinforce_and_decay`, once per epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneField {
    pub width: usize,
    pub height: usize,
    cells: Vec<u32>,
    tao: u32,
    max_strength: u32,
}

impl PheromoneField {
    pub fn new(width: usize, height: usize, tao: u32, max_strength: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
            tao,
            max_strength,
        }
    }

    /// Highest concentration a cell can hold.
    pub fn cap(&self) -> u32 {
        self.tao.saturating_mul(self.max_strength)
    }

    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// 3x3 block centred on (x, y). Cells off the grid read as zero.
    pub fn neighbourhood(&self, x: i32, y: i32) -> Matrix3 {
        let mut block = [[0.0; 3]; 3];
        for (row, dy) in (-1..=1).enumerate() {
            for (col, dx) in (-1..=1).enumerate() {
                if let Some(value) = self.get(x + dx, y + dy) {
                    block[row][col] = value as f64;
                }
            }
        }
        block
    }

    /// Adds `tao` to every visited cell (once per visit, capped), then lowers
    /// the whole field by one, floored at zero.
    pub fn reinforce_and_decay<I>(&mut self, visited: I)
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let cap = self.cap();
        for (x, y) in visited {
            if let Some(idx) = self.index(x, y) {
                let cell = &mut self.cells[idx];
                *cell = if *cell >= cap {
                    cap
                } else {
                    cell.saturating_add(self.tao).min(cap)
                };
            }
        }

        self.cells.par_iter_mut().for_each(|val| *val = val.saturating_sub(1));
    }

    pub fn max(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(|&v| v == 0)
    }

    /// Concentrations mapped onto `[0, display_max]` for heat maps.
    pub fn scaled_to(&self, display_max: u32) -> Vec<u32> {
        let cap = self.cap().max(1) as u64;
        self.cells
            .iter()
            .map(|&v| ((v as u64 * display_max as u64) / cap) as u32)
            .collect()
    }
}
