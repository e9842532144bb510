use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::AgentParams;
use crate::error::{Result, SimError};
use crate::kernel::{KernelVariant, TurningKernel};

/// Largest side length accepted; keeps frame buffers and PNG sizes in range.
pub const MAX_GRID_SIZE: usize = 4096;

/// Run parameters. Built once (defaults, optionally overridden by a JSON
/// file), validated, then only read.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Target population; one agent is added per epoch until reached.
    pub agent_count: usize,
    pub max_epochs: u64,
    /// Side of the square grid.
    pub grid_size: usize,

    // Pheromone parameters
    pub tao: u32,
    pub max_pheromone_strength: u32,

    // Agent behavior parameters
    pub kernel: KernelVariant,
    pub custom_kernel: Option<Vec<Vec<f64>>>,
    pub max_saturation: u32,
    pub min_fidelity: f64,
    pub max_fidelity: f64,
    /// Top-three spread at or below which a fork counts as unresolved.
    pub ambiguity_threshold: f64,

    // Scheduling
    pub parallel: bool,
    pub workers: usize,
    pub parallel_threshold: usize,
    pub seed: Option<u64>,

    // Output
    pub frame_interval: u64,
    pub output_dir: String,
    pub display_max: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agent_count: 100,
            max_epochs: 1000,
            grid_size: 255,

            tao: 10,
            max_pheromone_strength: 4,

            kernel: KernelVariant::Default,
            custom_kernel: None,
            max_saturation: 20,
            min_fidelity: 80.0,
            max_fidelity: 100.0,
            ambiguity_threshold: 0.10,

            parallel: true,
            workers: 6,
            parallel_threshold: 6,
            seed: None,

            frame_interval: 0, // final frame only
            output_dir: "simulation_output".to_string(),
            display_max: 255,
        }
    }
}

impl SimConfig {
    /// Reads overrides from a JSON file. A missing file means defaults;
    /// a file that exists but does not parse is an error.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn validate(self) -> Result<Self> {
        if !(3..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(SimError::Config(format!(
                "grid_size must lie in [3, {}], got {}",
                MAX_GRID_SIZE, self.grid_size
            )));
        }
        if self.tao == 0 || self.max_pheromone_strength == 0 {
            return Err(SimError::Config(
                "tao and max_pheromone_strength must be positive".to_string(),
            ));
        }
        if !(self.max_fidelity.is_finite() && self.max_fidelity > 0.0) {
            return Err(SimError::Config(format!(
                "max_fidelity must be positive, got {}",
                self.max_fidelity
            )));
        }
        if !(0.0..=self.max_fidelity).contains(&self.min_fidelity) {
            return Err(SimError::Config(format!(
                "min_fidelity must lie in [0, {}], got {}",
                self.max_fidelity, self.min_fidelity
            )));
        }
        if !(self.ambiguity_threshold.is_finite() && self.ambiguity_threshold >= 0.0) {
            return Err(SimError::Config(format!(
                "ambiguity_threshold must be non-negative, got {}",
                self.ambiguity_threshold
            )));
        }
        if self.workers == 0 {
            return Err(SimError::Config("workers must be at least 1".to_string()));
        }
        if self.kernel == KernelVariant::Custom && self.custom_kernel.is_none() {
            return Err(SimError::Config(
                "kernel \"custom\" needs custom_kernel weights".to_string(),
            ));
        }
        self.turning_kernel()?;
        Ok(self)
    }

    pub fn turning_kernel(&self) -> Result<TurningKernel> {
        match (&self.kernel, &self.custom_kernel) {
            (KernelVariant::Custom, Some(rows)) => TurningKernel::from_rows(rows),
            (variant, _) => Ok(TurningKernel::preset(*variant)),
        }
    }

    pub fn agent_params(&self) -> AgentParams {
        AgentParams {
            max_saturation: self.max_saturation,
            min_fidelity: self.min_fidelity,
            max_fidelity: self.max_fidelity,
            ambiguity_threshold: self.ambiguity_threshold,
        }
    }

    /// Where new and reset agents start.
    pub fn home(&self) -> (i32, i32) {
        let centre = (self.grid_size / 2) as i32;
        (centre, centre)
    }

    /// Short run description used for output names: kernel-agents-epochs-tao.
    pub fn run_label(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.kernel.name(),
            self.agent_count,
            self.max_epochs,
            self.tao
        )
    }
}
