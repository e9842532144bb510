use std::sync::Arc;

use bevy::log::{debug, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::agent::{Agent, AgentParams};
use crate::config::SimConfig;
use crate::error::Result;
use crate::kernel::TurningKernel;
use crate::pheromones::PheromoneField;

/// Which grid cells hold at least one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyMask {
    pub width: usize,
    pub height: usize,
    cells: Vec<bool>,
}

impl OccupancyMask {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub(crate) fn mark(&mut self, (x, y): (i32, i32)) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = true;
        }
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// What the rest of the world gets to see after an epoch.
#[derive(Debug, Clone)]
pub struct EpochReport {
    /// Index of the epoch that produced this report, from 0.
    pub epoch: u64,
    pub occupancy: OccupancyMask,
    pub lost_count: usize,
    pub population: usize,
}

/// Per-agent result of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outcome {
    /// Cell the agent sensed from; it gets the deposit.
    visited: (i32, i32),
    lost: bool,
}

/// Advances the whole population one epoch at a time.
pub struct EpochScheduler {
    target_population: usize,
    home: (i32, i32),
    kernel: Arc<TurningKernel>,
    params: AgentParams,
    parallel_threshold: usize,
    workers: usize,
    pool: Option<ThreadPool>,
    rng: SmallRng,
    epoch: u64,
    next_id: u64,
}

impl EpochScheduler {
    /// Validates `config` before anything is built from it.
    pub fn new(config: &SimConfig) -> Result<Self> {
        let config = config.clone().validate()?;
        let pool = if config.parallel {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(config.workers)
                    .thread_name(|i| format!("antsim-worker-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Ok(Self {
            target_population: config.agent_count,
            home: config.home(),
            kernel: Arc::new(config.turning_kernel()?),
            params: config.agent_params(),
            parallel_threshold: config.parallel_threshold,
            workers: config.workers,
            pool,
            rng,
            epoch: 0,
            next_id: 0,
        })
    }

    /// Number of epochs stepped so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    fn spawn_agent(&mut self) -> Agent {
        let id = self.next_id;
        self.next_id += 1;
        let seed = self.rng.gen();
        Agent::new(id, self.home, Arc::clone(&self.kernel), self.params, seed)
    }

    /// Runs one epoch: grow the population by at most one, move every agent
    /// against the current field, then lay and decay trail.
    ///
    /// `agents` and `field` are updated in place. Workers only ever see
    /// `&PheromoneField`; it is written once, here, after they have all
    /// finished.
    pub fn step(&mut self, agents: &mut Vec<Agent>, field: &mut PheromoneField) -> Result<EpochReport> {
        if agents.len() < self.target_population {
            agents.push(self.spawn_agent());
        }

        let bounds = (field.width, field.height);
        let snapshot: &PheromoneField = field;
        let outcomes = match &self.pool {
            Some(pool) if agents.len() > self.parallel_threshold => {
                let chunk_len = agents.len().div_ceil(self.workers);
                let chunks = pool.install(|| {
                    agents
                        .par_chunks_mut(chunk_len)
                        .map(|chunk| run_chunk(chunk, snapshot, bounds))
                        .collect::<Result<Vec<_>>>()
                })?;
                chunks.into_iter().flatten().collect()
            }
            _ => run_chunk(agents, snapshot, bounds)?,
        };

        let mut occupancy = OccupancyMask::empty(field.width, field.height);
        let mut lost_count = 0;
        for outcome in &outcomes {
            occupancy.mark(outcome.visited);
            lost_count += outcome.lost as usize;
        }
        field.reinforce_and_decay(outcomes.iter().map(|o| o.visited));

        let report = EpochReport {
            epoch: self.epoch,
            occupancy,
            lost_count,
            population: agents.len(),
        };
        debug!(
            "epoch {}: {} agents, {} lost, field max {}",
            report.epoch,
            report.population,
            report.lost_count,
            field.max()
        );
        self.epoch += 1;
        Ok(report)
    }
}

/// Moves every agent of one partition. Agents outside the interior are
/// reset before they read the field.
fn run_chunk(agents: &mut [Agent], field: &PheromoneField, (width, height): (usize, usize)) -> Result<Vec<Outcome>> {
    agents
        .iter_mut()
        .map(|agent| {
            if !agent.is_inside(width, height) {
                trace!("agent {} left the grid at {:?}, resetting", agent.id(), agent.position());
                agent.reset();
            }
            let mv = agent.update(field)?;
            Ok(Outcome {
                visited: mv.from,
                lost: agent.is_lost(),
            })
        })
        .collect()
}
