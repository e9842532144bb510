use bevy::prelude::*;
use chrono::{DateTime, Local};

use crate::colors::ColorConfig;
use crate::components::Colony;
use crate::config::SimConfig;
use crate::error::Result;
use crate::frames::FrameRecorder;
use crate::stats::RunStats;

const PROGRESS_INTERVAL: u64 = 100;

/// Inserts the simulation resources and the per-update system chain.
/// Runner and log plugins are left to the caller.
pub fn build_app(config: SimConfig, started: DateTime<Local>) -> Result<App> {
    let config = config.validate()?;
    let colony = Colony::new(&config)?;
    let recorder = FrameRecorder::new(&config, started);

    let mut app = App::new();
    app.insert_resource(colony)
        .insert_resource(recorder)
        .insert_resource(RunStats::default())
        .insert_resource(ColorConfig::default())
        .insert_resource(config)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (epoch_system, frame_capture_system, progress_system, exit_system).chain(),
        );
    Ok(app)
}

fn setup(config: Res<SimConfig>, colony: Res<Colony>, recorder: Res<FrameRecorder>) {
    info!(
        "starting run {}: {} agents, {} epochs, {}x{} grid, tao {}, {}",
        config.run_label(),
        config.agent_count,
        config.max_epochs,
        config.grid_size,
        config.grid_size,
        config.tao,
        if colony.is_parallel() {
            format!("{} workers", config.workers)
        } else {
            "sequential".to_string()
        }
    );
    info!("output goes to {}", recorder.run_dir.display());
}

pub fn epoch_system(mut colony: ResMut<Colony>, mut stats: ResMut<RunStats>, mut exit: EventWriter<AppExit>) {
    if colony.is_finished() {
        return;
    }
    let epoch = colony.epoch();
    match colony.advance() {
        Ok(report) => stats.record(report),
        Err(err) => {
            error!("epoch {} failed: {}", epoch, err);
            exit.send(AppExit::error());
        }
    }
}

pub fn frame_capture_system(
    colony: Res<Colony>,
    colors: Res<ColorConfig>,
    mut recorder: ResMut<FrameRecorder>,
) {
    let epoch = colony.epoch();
    if recorder.finished || colony.last_report().is_none() || !recorder.should_capture(epoch) {
        return;
    }
    if let Err(err) = recorder.capture(epoch, &colony.field, &colony.occupancy(), &colors) {
        warn!("could not write frame for epoch {}: {}", epoch, err);
    }
}

pub fn progress_system(colony: Res<Colony>, config: Res<SimConfig>, stats: Res<RunStats>) {
    if !colony.is_changed() {
        return;
    }
    let epoch = colony.epoch();
    if epoch == 0 || epoch % PROGRESS_INTERVAL != 0 {
        return;
    }
    info!(
        "epoch {}/{}: {} agents, {} lost, trail max {}",
        epoch,
        config.max_epochs,
        stats.last_population,
        stats.last_lost().unwrap_or(0),
        colony.field.max()
    );
}

/// Writes the final frame and summary once the run is over, then stops the app.
pub fn exit_system(
    colony: Res<Colony>,
    config: Res<SimConfig>,
    stats: Res<RunStats>,
    colors: Res<ColorConfig>,
    mut recorder: ResMut<FrameRecorder>,
    mut exit: EventWriter<AppExit>,
) {
    if !colony.is_finished() || recorder.finished {
        return;
    }

    let epoch = colony.epoch();
    // the capture system already took this one
    let already_captured = colony.last_report().is_some() && recorder.should_capture(epoch);
    if !already_captured {
        match recorder.capture(epoch, &colony.field, &colony.occupancy(), &colors) {
            Ok(path) => info!("final frame written to {}", path.display()),
            Err(err) => warn!("could not write final frame: {}", err),
        }
    }

    let lost = stats.lost_summary();
    match recorder.write_summary(&config, epoch, lost.clone()) {
        Ok(path) => info!("summary written to {}", path.display()),
        Err(err) => warn!("could not write summary: {}", err),
    }
    match lost {
        Some(lost) => info!(
            "run finished after {} epochs: lost agents mean {:.2}, median {:.1}, max {}",
            epoch, lost.mean, lost.median, lost.max
        ),
        None => info!("run finished without any epochs"),
    }

    recorder.finished = true;
    exit.send(AppExit::Success);
}
