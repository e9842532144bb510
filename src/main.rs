use std::time::Duration;

use anyhow::{bail, Context};
use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use antsim_trails::config::SimConfig;
use antsim_trails::systems::build_app;

const CONFIG_PATH: &str = "antsim.json";

fn main() -> anyhow::Result<()> {
    let config = SimConfig::from_json_file(CONFIG_PATH)
        .with_context(|| format!("failed to load {}", CONFIG_PATH))?;

    let mut app = build_app(config, chrono::Local::now()).context("invalid simulation setup")?;
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
        LogPlugin::default(),
    ));

    match app.run() {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => bail!("simulation aborted with exit code {}", code),
    }
}
