use bevy::prelude::*;

/// Palette for exported frames.
#[derive(Resource, Clone, Debug)]
pub struct ColorConfig {
    pub background: (u8, u8, u8),
    /// Trail colour at full display strength.
    pub trail: (u8, u8, u8),
    pub ant: (u8, u8, u8),
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: (0, 0, 0), // Black
            trail: (255, 0, 0),    // Red
            ant: (255, 255, 255),  // White
        }
    }
}

impl ColorConfig {
    /// Trail colour blended over the background at `level` out of 255.
    pub fn trail_rgb(&self, level: u8) -> (u8, u8, u8) {
        let t = level as f32 / 255.0;
        let mix = |bg: u8, fg: u8| (bg as f32 + (fg as f32 - bg as f32) * t).round() as u8;
        (
            mix(self.background.0, self.trail.0),
            mix(self.background.1, self.trail.1),
            mix(self.background.2, self.trail.2),
        )
    }

    pub fn ant_rgb(&self) -> (u8, u8, u8) {
        self.ant
    }

    pub fn background_rgb(&self) -> (u8, u8, u8) {
        self.background
    }
}
