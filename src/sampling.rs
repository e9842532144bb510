use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Result, SimError};
use crate::kernel::{Heading, Matrix3};

/// Bernoulli draw. A probability outside [0, 1] (or NaN) is a caller bug.
pub fn flip<R: Rng + ?Sized>(rng: &mut R, p_true: f64) -> Result<bool> {
    if !(0.0..=1.0).contains(&p_true) {
        return Err(SimError::ProbabilityOutOfRange(p_true));
    }
    Ok(rng.gen::<f64>() < p_true)
}

/// Element-wise product of two 3x3 blocks.
pub fn weigh(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            out[row][col] = a[row][col] * b[row][col];
        }
    }
    out
}

pub fn total(m: &Matrix3) -> f64 {
    m.iter().flatten().sum()
}

/// Scales `m` to sum to 1. Cells that come out NaN or infinite (a zero-sum
/// block) are written as 0, so an all-zero block stays all-zero.
pub fn normalize(m: &Matrix3) -> Matrix3 {
    let sum = total(m);
    let mut out = [[0.0; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            let value = m[row][col] / sum;
            out[row][col] = if value.is_finite() { value } else { 0.0 };
        }
    }
    out
}

/// Mass of each of the 8 neighbours, in heading order.
pub fn neighbour_masses(m: &Matrix3) -> [(Heading, f64); 8] {
    Heading::ALL.map(|heading| {
        let (row, col) = heading.cell();
        (heading, m[row][col])
    })
}

/// Probability vector over the 8 neighbours. NaN and negative entries count
/// as 0; if nothing is left the draw is uniform.
fn probabilities(m: &Matrix3) -> [f64; 8] {
    let mut weights = neighbour_masses(m).map(|(_, w)| if w.is_finite() && w > 0.0 { w } else { 0.0 });
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        weights.iter_mut().for_each(|w| *w /= sum);
    } else {
        weights = [1.0 / weights.len() as f64; 8];
    }
    weights
}

/// Draws a neighbour with probability proportional to its weight in `m`.
pub fn sample_heading<R: Rng + ?Sized>(rng: &mut R, m: &Matrix3) -> Result<Heading> {
    let dist = WeightedIndex::new(probabilities(m))?;
    Ok(Heading::ALL[dist.sample(rng)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn flip_rejects_bad_probabilities() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(flip(&mut rng, 1.5), Err(SimError::ProbabilityOutOfRange(_))));
        assert!(matches!(flip(&mut rng, -0.1), Err(SimError::ProbabilityOutOfRange(_))));
        assert!(flip(&mut rng, f64::NAN).is_err());
    }

    #[test]
    fn flip_extremes_are_certain() {
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..1000 {
            assert!(flip(&mut rng, 1.0).unwrap());
            assert!(!flip(&mut rng, 0.0).unwrap());
        }
    }

    #[test]
    fn normalize_zero_block_stays_zero() {
        let out = normalize(&[[0.0; 3]; 3]);
        assert!(out.iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn normalize_sums_to_one() {
        let m = [[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [0.0, 4.0, 0.0]];
        let out = normalize(&m);
        assert!((total(&out) - 1.0).abs() < 1e-12);
        assert_eq!(out[2][1], 0.5);
    }

    #[test]
    fn sampling_never_picks_zero_weight_cells() {
        let mut rng = SmallRng::seed_from_u64(3);
        let m = [[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 3.0]];
        for _ in 0..500 {
            let heading = sample_heading(&mut rng, &m).unwrap();
            assert!(heading.degrees() == 0 || heading.degrees() == 225);
        }
    }

    #[test]
    fn degenerate_weights_fall_back_to_uniform() {
        let mut rng = SmallRng::seed_from_u64(4);
        let m = [[f64::NAN, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 0.0]];
        let mut seen = [false; 8];
        for _ in 0..2000 {
            let heading = sample_heading(&mut rng, &m).unwrap();
            seen[(heading.degrees() / 45) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
