use glam::Vec3;

use crate::{
    spatial::{
        geometry::{box_faces, centred},
        DepthBatch, Shape, View,
    },
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

const MIN_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
struct Bars3dParams {
    grid: usize,
    bar_size: f32,
    spacing: f32,
    height_scale: f32,
    smoothing: f32,
    amplification: f32,
}

impl Bars3dParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            grid: settings.count("gridSize", 8),
            bar_size: settings.float("barSize", 30.0).max(1.0),
            spacing: settings.float("spacing", 45.0).max(1.0),
            height_scale: settings.float("heightScale", 200.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// A square field of boxes; bar `i` follows bin `i` of the linear spread.
#[derive(Debug, Clone)]
pub struct Bars3d {
    params: Bars3dParams,
    heights: Vec<f32>,
}

impl Bars3d {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = Bars3dParams::from_settings(settings);
        Self {
            heights: vec![0.0; params.grid * params.grid],
            params,
        }
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl Shape for Bars3d {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = Bars3dParams::from_settings(settings);
        self.heights.resize(self.params.grid * self.params.grid, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.heights.len();
        for (i, height) in self.heights.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *height = smooth(*height, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let grid = self.params.grid;
        let floor = -self.params.height_scale / 3.0;
        for (i, height) in self.heights.iter().enumerate() {
            let (row, column) = (i / grid, i % grid);
            let base = Vec3::new(
                centred(column, grid, self.params.spacing),
                floor,
                centred(row, grid, self.params.spacing),
            );
            let extent = (height * self.params.height_scale).max(MIN_HEIGHT);
            let color = palette.gradient(height.clamp(0.0, 1.0));
            // the bottom face is never seen from above
            for (quad, shade) in box_faces(base, self.params.bar_size, extent).iter().take(5) {
                batch.polygon(view, quad, Some(color.shade(*shade)), None);
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.heights.clone()
    }
}
