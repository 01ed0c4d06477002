use std::{fmt, str::FromStr};

use glam::Vec3;

use crate::{
    flat::fraction,
    spatial::{
        geometry::{angles, box_faces, centred, ring_point},
        DepthBatch, Shape, View,
    },
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const MIN_HEIGHT: f32 = 1.0;
const ROW_GAP: f32 = 1.5;

/// How the equalizer bands are arranged on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EqualizerLayout {
    #[default]
    Circular,
    Grid,
    Linear,
}

impl EqualizerLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            EqualizerLayout::Circular => "circular",
            EqualizerLayout::Grid => "grid",
            EqualizerLayout::Linear => "linear",
        }
    }
}

impl fmt::Display for EqualizerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EqualizerLayout {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "circular" => Ok(EqualizerLayout::Circular),
            "grid" => Ok(EqualizerLayout::Grid),
            "linear" => Ok(EqualizerLayout::Linear),
            other => Err(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct EqualizerParams {
    layout: EqualizerLayout,
    bands: usize,
    bar_size: f32,
    height_scale: f32,
    radius: f32,
    smoothing: f32,
    amplification: f32,
}

impl EqualizerParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        let layout = settings.string("layout", "circular");
        let layout = layout.parse().unwrap_or_else(|unknown: String| {
            tracing::warn!(layout = unknown.as_str(), "unknown equalizer layout; using circular");
            EqualizerLayout::Circular
        });
        Self {
            layout,
            bands: settings.count("bandCount", 32),
            bar_size: settings.float("barSize", 18.0).max(1.0),
            height_scale: settings.float("heightScale", 220.0),
            radius: settings.float("radius", 220.0).max(1.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Band boxes laid out as a ring, a square grid or a single row.
#[derive(Debug, Clone)]
pub struct Equalizer {
    params: EqualizerParams,
    levels: Vec<f32>,
}

impl Equalizer {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = EqualizerParams::from_settings(settings);
        Self {
            levels: vec![0.0; params.bands],
            params,
        }
    }

    pub fn layout(&self) -> EqualizerLayout {
        self.params.layout
    }

    /// Floor positions of every band, at `y = 0`.
    pub fn positions(&self) -> Vec<Vec3> {
        let count = self.levels.len();
        let pitch = self.params.bar_size * ROW_GAP;
        match self.params.layout {
            EqualizerLayout::Circular => angles(count)
                .map(|angle| ring_point(self.params.radius, angle, 0.0))
                .collect(),
            EqualizerLayout::Grid => {
                let side = (count as f32).sqrt().ceil() as usize;
                (0..count)
                    .map(|i| Vec3::new(centred(i % side, side, pitch), 0.0, centred(i / side, side, pitch)))
                    .collect()
            }
            EqualizerLayout::Linear => (0..count)
                .map(|i| Vec3::new(centred(i, count, pitch), 0.0, 0.0))
                .collect(),
        }
    }
}

impl Shape for Equalizer {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = EqualizerParams::from_settings(settings);
        self.levels.resize(self.params.bands, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.levels.len();
        for (i, level) in self.levels.iter_mut().enumerate() {
            let target = input.frequency.at_fraction(fraction(i, count)) * self.params.amplification;
            *level = smooth(*level, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let floor = -self.params.height_scale / 3.0;
        let count = self.levels.len();
        for (i, (position, level)) in self.positions().into_iter().zip(&self.levels).enumerate() {
            let extent = (level * self.params.height_scale).max(MIN_HEIGHT);
            let color = palette.gradient(fraction(i, count));
            let base = position + Vec3::Y * floor;
            for (quad, shade) in box_faces(base, self.params.bar_size, extent).iter().take(5) {
                batch.polygon(view, quad, Some(color.shade(*shade)), None);
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.levels.clone()
    }
}
