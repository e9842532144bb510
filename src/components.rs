use bevy::prelude::*;

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::Result;
use crate::pheromones::PheromoneField;
use crate::scheduler::{EpochReport, EpochScheduler, OccupancyMask};

/// The population, its field and the scheduler that advances them.
#[derive(Resource)]
pub struct Colony {
    pub agents: Vec<Agent>,
    pub field: PheromoneField,
    scheduler: EpochScheduler,
    max_epochs: u64,
    last_report: Option<EpochReport>,
}

impl Colony {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Ok(Self {
            agents: Vec::with_capacity(config.agent_count),
            field: PheromoneField::new(
                config.grid_size,
                config.grid_size,
                config.tao,
                config.max_pheromone_strength,
            ),
            scheduler: EpochScheduler::new(config)?,
            max_epochs: config.max_epochs,
            last_report: None,
        })
    }

    /// Epochs completed so far.
    pub fn epoch(&self) -> u64 {
        self.scheduler.epoch()
    }

    pub fn is_finished(&self) -> bool {
        self.epoch() >= self.max_epochs
    }

    pub fn is_parallel(&self) -> bool {
        self.scheduler.is_parallel()
    }

    pub fn advance(&mut self) -> Result<&EpochReport> {
        let report = self.scheduler.step(&mut self.agents, &mut self.field)?;
        Ok(&*self.last_report.insert(report))
    }

    pub fn last_report(&self) -> Option<&EpochReport> {
        self.last_report.as_ref()
    }

    /// Occupancy of the last epoch, empty before the first one.
    pub fn occupancy(&self) -> OccupancyMask {
        match &self.last_report {
            Some(report) => report.occupancy.clone(),
            None => OccupancyMask::empty(self.field.width, self.field.height),
        }
    }

    pub fn lost_count(&self) -> usize {
        self.last_report.as_ref().map_or(0, |r| r.lost_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_epochs_zero_agents_leaves_everything_empty() {
        let config = SimConfig {
            agent_count: 0,
            max_epochs: 0,
            seed: Some(1),
            ..SimConfig::default()
        };
        let colony = Colony::new(&config).unwrap();
        assert!(colony.is_finished());
        assert!(colony.field.is_clear());
        assert_eq!(colony.occupancy().count(), 0);
        assert_eq!(colony.lost_count(), 0);
        assert!(colony.agents.is_empty());
    }

    #[test]
    fn advances_until_max_epochs() {
        let config = SimConfig {
            agent_count: 4,
            max_epochs: 3,
            grid_size: 15,
            seed: Some(3),
            ..SimConfig::default()
        };
        let mut colony = Colony::new(&config).unwrap();
        while !colony.is_finished() {
            colony.advance().unwrap();
        }
        assert_eq!(colony.epoch(), 3);
        assert_eq!(colony.agents.len(), 3);
        assert_eq!(colony.last_report().unwrap().epoch, 2);
        assert!(!colony.field.is_clear());
    }
}
