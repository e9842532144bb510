use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use chrono::{DateTime, Local};
use png::ColorType;
use serde::Serialize;

use crate::colors::ColorConfig;
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::pheromones::PheromoneField;
use crate::scheduler::OccupancyMask;
use crate::stats::Summary;

/// Writes heat-map frames and the end-of-run summary into one directory per run.
#[derive(Resource, Debug)]
pub struct FrameRecorder {
    pub run_dir: PathBuf,
    /// Capture every `interval` epochs; 0 keeps only the final frame.
    pub interval: u64,
    pub display_max: u32,
    pub frames_written: usize,
    pub finished: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    finished_at: String,
    epochs: u64,
    frames_written: usize,
    lost: Option<Summary>,
    config: &'a SimConfig,
}

impl FrameRecorder {
    /// Run directory is `<output_dir>/<start time>-<run label>`; it is created
    /// on the first write.
    pub fn new(config: &SimConfig, started: DateTime<Local>) -> Self {
        let name = format!("{}-{}", started.format("%b-%d-%H%M%S"), config.run_label());
        Self {
            run_dir: Path::new(&config.output_dir).join(name),
            interval: config.frame_interval,
            display_max: config.display_max,
            frames_written: 0,
            finished: false,
        }
    }

    pub fn should_capture(&self, epoch: u64) -> bool {
        self.interval > 0 && epoch % self.interval == 0
    }

    pub fn capture(
        &mut self,
        epoch: u64,
        field: &PheromoneField,
        occupancy: &OccupancyMask,
        colors: &ColorConfig,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.run_dir)?;
        let frame = render_frame(field, occupancy, colors, self.display_max);
        let path = self.run_dir.join(format!("frame_{:05}.png", epoch));
        save_png(&path, &frame, field.width as u32, field.height as u32)?;
        self.frames_written += 1;
        Ok(path)
    }

    pub fn write_summary(&self, config: &SimConfig, epochs: u64, lost: Option<Summary>) -> Result<PathBuf> {
        fs::create_dir_all(&self.run_dir)?;
        let summary = RunSummary {
            finished_at: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            epochs,
            frames_written: self.frames_written,
            lost,
            config,
        };
        let path = self.run_dir.join("summary.json");
        fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        Ok(path)
    }
}

/// One RGBA pixel per cell: agents on top, trail below, background elsewhere.
/// `occupancy` must cover the same grid as `field`.
pub fn render_frame(
    field: &PheromoneField,
    occupancy: &OccupancyMask,
    colors: &ColorConfig,
    display_max: u32,
) -> Vec<u8> {
    let levels = field.scaled_to(display_max);
    let mut frame = Vec::with_capacity(levels.len() * 4);

    for (&occupied, &level) in occupancy.cells().iter().zip(&levels) {
        let (r, g, b) = if occupied {
            colors.ant_rgb()
        } else if level == 0 {
            colors.background_rgb()
        } else {
            colors.trail_rgb(level.min(255) as u8)
        };
        frame.extend_from_slice(&[r, g, b, 255]);
    }
    frame
}

pub fn save_png(path: &Path, frame_data: &[u8], width: u32, height: u32) -> Result<()> {
    let expected_size = width as usize * height as usize * 4;
    if frame_data.len() != expected_size {
        return Err(SimError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "frame data size mismatch: expected {}, got {}",
                expected_size,
                frame_data.len()
            ),
        )));
    }

    let file = File::create(path)?;
    let w = BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(frame_data)?;
    Ok(())
}
