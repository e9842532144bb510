use std::cmp::Ordering;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::error::Result;
use crate::kernel::{Heading, Matrix3, TurningKernel};
use crate::pheromones::PheromoneField;
use crate::sampling::{flip, neighbour_masses, normalize, sample_heading, total, weigh};

/// Which branch of the decision produced the last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    /// Heading drawn from the turning kernel alone.
    Exploring,
    /// A trail decision was taken.
    Following,
}

/// Saturation-to-fidelity mapping and forking tolerance, shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParams {
    pub max_saturation: u32,
    pub min_fidelity: f64,
    pub max_fidelity: f64,
    pub ambiguity_threshold: f64,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            max_saturation: 20,
            min_fidelity: 80.0,
            max_fidelity: 100.0,
            ambiguity_threshold: 0.10,
        }
    }
}

impl AgentParams {
    /// Linear map of saturation from [0, max_saturation] onto
    /// [min_fidelity, max_fidelity], clamped at the top.
    pub fn fidelity(&self, saturation: u32) -> f64 {
        if self.max_saturation == 0 {
            return self.max_fidelity;
        }
        let share = saturation as f64 / self.max_saturation as f64;
        let mapped = self.min_fidelity + share * (self.max_fidelity - self.min_fidelity);
        mapped.min(self.max_fidelity)
    }
}

/// Result of one `Agent::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: (i32, i32),
    pub to: (i32, i32),
    pub heading: Heading,
    pub mode: AgentMode,
}

/// One ant. Owns its random stream, so its draws do not depend on which
/// worker runs it.
#[derive(Debug, Clone)]
pub struct Agent {
    id: u64,
    x: i32,
    y: i32,
    heading: Heading,
    saturation: u32,
    lost: bool,
    home: (i32, i32),
    kernel: Arc<TurningKernel>,
    params: AgentParams,
    rng: SmallRng,
}

impl Agent {
    /// New agent at `home` with an empty saturation and a random heading
    /// drawn from its own stream.
    pub fn new(id: u64, home: (i32, i32), kernel: Arc<TurningKernel>, params: AgentParams, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let heading = Heading::random(&mut rng);
        Self {
            id,
            x: home.0,
            y: home.1,
            heading,
            saturation: 0,
            lost: true,
            home,
            kernel,
            params,
            rng,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn saturation(&self) -> u32 {
        self.saturation
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn fidelity(&self) -> f64 {
        self.params.fidelity(self.saturation)
    }

    /// Back to the starting state with a fresh heading.
    pub fn reset(&mut self) {
        self.x = self.home.0;
        self.y = self.home.1;
        self.heading = Heading::random(&mut self.rng);
        self.saturation = 0;
        self.lost = true;
    }

    /// True when the agent sits inside the `width` x `height` grid with a
    /// one-cell margin all round.
    pub fn is_inside(&self, width: usize, height: usize) -> bool {
        self.x >= 1 && self.y >= 1 && (self.x as i64) <= width as i64 - 2 && (self.y as i64) <= height as i64 - 2
    }

    /// One decision and one move against the epoch's field snapshot.
    pub fn update(&mut self, field: &PheromoneField) -> Result<Move> {
        let mut around = field.neighbourhood(self.x, self.y);
        self.update_saturation(around[1][1] > 0.0);
        // staying put is not an option
        around[1][1] = 0.0;

        let oriented = self.kernel.orient(self.heading);
        let trust = self.fidelity() / self.params.max_fidelity;
        let decision = if flip(&mut self.rng, trust)? {
            let weighted = normalize(&weigh(&around, &oriented));
            self.fork(&weighted)?
        } else {
            None
        };

        let mv = match decision {
            Some(heading) => self.step(heading, AgentMode::Following),
            None => {
                let heading = sample_heading(&mut self.rng, &oriented)?;
                self.step(heading, AgentMode::Exploring)
            }
        };
        Ok(mv)
    }

    fn update_saturation(&mut self, on_trail: bool) {
        self.saturation = if on_trail {
            (self.saturation + 1).min(self.params.max_saturation)
        } else {
            self.saturation.saturating_sub(1)
        };
    }

    /// Forking decision over a normalized, kernel-weighted neighbourhood.
    /// `None` means the signal does not settle the choice and the agent explores.
    fn fork(&mut self, weighted: &Matrix3) -> Result<Option<Heading>> {
        if total(weighted) <= 0.0 {
            return Ok(None);
        }

        let (ahead_row, ahead_col) = self.heading.cell();
        if weighted[ahead_row][ahead_col] > 0.0 {
            return Ok(Some(self.heading));
        }

        let mut ranked = neighbour_masses(weighted);
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let spread = ranked[0].1 - ranked[2].1;
        if spread <= self.params.ambiguity_threshold {
            return Ok(None);
        }

        let (best, best_mass) = ranked[0];
        let (runner_up, runner_up_mass) = ranked[1];
        let p_runner_up = runner_up_mass / (best_mass + runner_up_mass);
        if flip(&mut self.rng, p_runner_up)? {
            Ok(Some(runner_up))
        } else {
            Ok(Some(best))
        }
    }

    fn step(&mut self, heading: Heading, mode: AgentMode) -> Move {
        let from = (self.x, self.y);
        let (dx, dy) = heading.offset();
        self.x += dx;
        self.y += dy;
        self.heading = heading;
        self.lost = mode == AgentMode::Exploring;
        Move {
            from,
            to: (self.x, self.y),
            heading,
            mode,
        }
    }
}

#[cfg(test)]
impl Agent {
    pub(crate) fn place_at(&mut self, (x, y): (i32, i32)) {
        self.x = x;
        self.y = y;
    }

    pub(crate) fn saturate(&mut self, saturation: u32) {
        self.saturation = saturation.min(self.params.max_saturation);
    }
}
