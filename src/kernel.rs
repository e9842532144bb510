use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// 3x3 block of weights or concentrations centred on an agent.
/// `m[row][col]`, row 0 is the row above the agent, col 0 the column to its left.
pub type Matrix3 = [[f64; 3]; 3];

/// Perimeter cells in counter-clockwise order, starting straight up.
/// Entry `k` is the cell a heading of `k * 45` degrees points at.
const RING: [(usize, usize); 8] = [
    (0, 1), // 0
    (0, 0), // 45
    (1, 0), // 90
    (2, 0), // 135
    (2, 1), // 180
    (2, 2), // 225
    (1, 2), // 270
    (0, 2), // 315
];

/// One of the 8 grid directions, stored in degrees (a multiple of 45 below 360).
///
/// Angles grow counter-clockwise, the same sense `TurningKernel::orient`
/// rotates in, so the forward cell of an oriented kernel is always the cell
/// of the heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Heading(u16);

impl Heading {
    pub const ALL: [Heading; 8] = [
        Heading(0),
        Heading(45),
        Heading(90),
        Heading(135),
        Heading(180),
        Heading(225),
        Heading(270),
        Heading(315),
    ];

    /// Wraps to [0, 360) and rounds down to the nearest multiple of 45.
    pub fn from_degrees(degrees: u32) -> Self {
        Heading(((degrees % 360) / 45 * 45) as u16)
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    fn ring_index(self) -> usize {
        (self.0 / 45) as usize
    }

    /// Matrix cell (row, col) this heading points at.
    pub fn cell(self) -> (usize, usize) {
        RING[self.ring_index()]
    }

    /// Heading pointing at a perimeter cell; `None` for the centre.
    #[cfg(test)]
    pub(crate) fn from_cell(row: usize, col: usize) -> Option<Self> {
        RING.iter()
            .position(|&cell| cell == (row, col))
            .map(|k| Heading((k * 45) as u16))
    }

    /// Grid step (dx, dy) taken when moving along this heading.
    pub fn offset(self) -> (i32, i32) {
        let (row, col) = self.cell();
        (col as i32 - 1, row as i32 - 1)
    }
}

/// Named kernel presets selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelVariant {
    #[default]
    Default,
    Flat,
    Narrow,
    Wide,
    Custom,
}

impl KernelVariant {
    pub fn name(self) -> &'static str {
        match self {
            KernelVariant::Default => "default",
            KernelVariant::Flat => "flat",
            KernelVariant::Narrow => "narrow",
            KernelVariant::Wide => "wide",
            KernelVariant::Custom => "custom",
        }
    }
}

const FORWARD_BIASED: Matrix3 = [
    [0.1, 0.3, 0.1],
    [0.1, 0.0, 0.1],
    [0.1, 0.1, 0.1],
];

const NARROW: Matrix3 = [
    [0.25, 0.3, 0.25],
    [0.1, 0.0, 0.1],
    [0.0, 0.0, 0.0],
];

const WIDE: Matrix3 = [
    [0.18, 0.18, 0.18],
    [0.18, 0.0, 0.18],
    [0.05, 0.0, 0.05],
];

/// Directional weight template over the 8 neighbours, written for an agent
/// heading straight up (heading 0). Shared read-only between agents.
#[derive(Debug, Clone, PartialEq)]
pub struct TurningKernel {
    weights: Matrix3,
}

impl Default for TurningKernel {
    fn default() -> Self {
        Self {
            weights: FORWARD_BIASED,
        }
    }
}

impl TurningKernel {
    /// Builds a kernel, rejecting negative or non-finite weights.
    /// The centre weight is forced to zero: staying put is never a move.
    pub fn new(mut weights: Matrix3) -> Result<Self> {
        if let Some(&bad) = weights
            .iter()
            .flatten()
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(SimError::InvalidWeight(bad));
        }
        weights[1][1] = 0.0;
        Ok(Self { weights })
    }

    /// Builds a kernel from rows of arbitrary length, as read from configuration.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != size) {
            return Err(SimError::NotSquare {
                rows: size,
                cols: row.len(),
            });
        }
        if size != 3 {
            return Err(SimError::KernelShape { size });
        }

        let mut weights = [[0.0; 3]; 3];
        for (target, row) in weights.iter_mut().zip(rows) {
            target.copy_from_slice(row);
        }
        Self::new(weights)
    }

    /// Preset for a named variant. `Custom` has no preset and falls back to
    /// the default kernel; custom weights go through `from_rows`.
    pub fn preset(variant: KernelVariant) -> Self {
        let weights = match variant {
            KernelVariant::Narrow => NARROW,
            KernelVariant::Wide => WIDE,
            KernelVariant::Default | KernelVariant::Flat | KernelVariant::Custom => FORWARD_BIASED,
        };
        Self { weights }
    }

    pub fn weights(&self) -> &Matrix3 {
        &self.weights
    }

    /// Weights rotated so that "forward" is the cell `heading` points at.
    ///
    /// Whole quarter turns are exact rotations; an odd multiple of 45 adds one
    /// step of the perimeter ring.
    pub fn orient(&self, heading: Heading) -> Matrix3 {
        let quarter_turns = heading.degrees() / 90;
        let mut oriented = self.weights;
        for _ in 0..quarter_turns {
            oriented = rotate_quarter(&oriented);
        }
        if heading.degrees() % 90 != 0 {
            oriented = shift_ring(&oriented);
        }
        oriented
    }
}

/// Rotates a quarter turn counter-clockwise.
pub fn rotate_quarter(m: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = m[j][2 - i];
        }
    }
    out
}

/// Moves every perimeter cell one place counter-clockwise around the ring.
/// The centre is left alone.
pub fn shift_ring(m: &Matrix3) -> Matrix3 {
    let mut out = *m;
    for k in 0..RING.len() {
        let (from_row, from_col) = RING[k];
        let (to_row, to_col) = RING[(k + 1) % RING.len()];
        out[to_row][to_col] = m[from_row][from_col];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_moves_forward_weight_left() {
        let kernel = TurningKernel::default();
        let expected = [
            [0.1, 0.1, 0.1],
            [0.3, 0.0, 0.1],
            [0.1, 0.1, 0.1],
        ];
        assert_eq!(kernel.orient(Heading::from_degrees(90)), expected);
    }

    #[test]
    fn full_turn_is_identity() {
        let kernel = TurningKernel::preset(KernelVariant::Narrow);
        let base = *kernel.weights();

        let mut quarter = base;
        for _ in 0..4 {
            quarter = rotate_quarter(&quarter);
        }
        assert_eq!(quarter, base);

        let mut ring = base;
        for _ in 0..8 {
            ring = shift_ring(&ring);
        }
        assert_eq!(ring, base);

        assert_eq!(kernel.orient(Heading::from_degrees(360)), base);
    }

    #[test]
    fn two_ring_steps_equal_one_quarter_turn() {
        let base = *TurningKernel::preset(KernelVariant::Wide).weights();
        assert_eq!(shift_ring(&shift_ring(&base)), rotate_quarter(&base));
    }

    #[test]
    fn forward_weight_follows_every_heading() {
        let kernel = TurningKernel::default();
        for heading in Heading::ALL {
            let oriented = kernel.orient(heading);
            let (row, col) = heading.cell();
            assert_eq!(oriented[row][col], 0.3, "heading {}", heading.degrees());
            assert_eq!(oriented[1][1], 0.0);
        }
    }

    #[test]
    fn heading_cells_round_trip_through_offsets() {
        assert_eq!(Heading::from_degrees(0).offset(), (0, -1));
        assert_eq!(Heading::from_degrees(90).offset(), (-1, 0));
        assert_eq!(Heading::from_degrees(180).offset(), (0, 1));
        assert_eq!(Heading::from_degrees(270).offset(), (1, 0));
        for heading in Heading::ALL {
            let (row, col) = heading.cell();
            assert_eq!(Heading::from_cell(row, col), Some(heading));
        }
        assert_eq!(Heading::from_cell(1, 1), None);
    }

    #[test]
    fn rejects_malformed_kernels() {
        let ragged = vec![vec![0.1, 0.1, 0.1], vec![0.1, 0.0], vec![0.1, 0.1, 0.1]];
        assert!(matches!(
            TurningKernel::from_rows(&ragged),
            Err(SimError::NotSquare { rows: 3, cols: 2 })
        ));

        let too_big = vec![vec![0.0; 4]; 4];
        assert!(matches!(
            TurningKernel::from_rows(&too_big),
            Err(SimError::KernelShape { size: 4 })
        ));

        let negative = vec![vec![0.1, -0.3, 0.1], vec![0.1, 0.0, 0.1], vec![0.1, 0.1, 0.1]];
        assert!(matches!(
            TurningKernel::from_rows(&negative),
            Err(SimError::InvalidWeight(_))
        ));
    }

    #[test]
    fn custom_rows_zero_the_centre() {
        let rows = vec![vec![0.2, 0.4, 0.2], vec![0.1, 9.0, 0.1], vec![0.0, 0.0, 0.0]];
        let kernel = TurningKernel::from_rows(&rows).unwrap();
        assert_eq!(kernel.weights()[1][1], 0.0);
        assert_eq!(kernel.weights()[0][1], 0.4);
    }
}
