//! Ants on a grid laying and following a decaying pheromone trail.
//!
//! The core is plain data: [`TurningKernel`], [`Agent`], [`PheromoneField`]
//! and the [`EpochScheduler`] that moves the whole population one epoch at a
//! time. The bevy side ([`Colony`] and the systems) only drives epochs and
//! hands snapshots to the frame exporter.

pub mod agent;
pub mod colors;
pub mod components;
pub mod config;
pub mod error;
pub mod frames;
pub mod kernel;
pub mod pheromones;
pub mod sampling;
pub mod scheduler;
pub mod stats;
pub mod systems;

pub use agent::{Agent, AgentMode, AgentParams, Move};
pub use components::Colony;
pub use config::SimConfig;
pub use error::{Result, SimError};
pub use kernel::{Heading, KernelVariant, Matrix3, TurningKernel};
pub use pheromones::PheromoneField;
pub use scheduler::{EpochReport, EpochScheduler, OccupancyMask};
pub use stats::{RunStats, Summary};
