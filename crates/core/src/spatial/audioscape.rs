use std::collections::VecDeque;

use glam::Vec3;

use crate::{
    spatial::{geometry::centred, DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

#[derive(Debug, Clone, PartialEq)]
struct AudioscapeParams {
    rows: usize,
    columns: usize,
    cell: f32,
    height_scale: f32,
    smoothing: f32,
    amplification: f32,
}

impl AudioscapeParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            rows: settings.count("rows", 24).max(2),
            columns: settings.count("columns", 40).max(2),
            cell: settings.float("cellSize", 18.0).max(1.0),
            height_scale: settings.float("heightScale", 160.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// Scrolling landscape: the smoothed spectrum forms the front row and older
/// rows recede into the distance one tick at a time.
#[derive(Debug, Clone)]
pub struct Audioscape {
    params: AudioscapeParams,
    front: Vec<f32>,
    history: VecDeque<Vec<f32>>,
}

impl Audioscape {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = AudioscapeParams::from_settings(settings);
        Self {
            front: vec![0.0; params.columns],
            history: VecDeque::with_capacity(params.rows),
            params,
        }
    }

    pub fn rows(&self) -> usize {
        self.history.len()
    }

    fn vertex(&self, row: usize, column: usize, value: f32) -> Vec3 {
        let depth = self.params.rows as f32 * self.params.cell;
        Vec3::new(
            centred(column, self.params.columns, self.params.cell),
            value * self.params.height_scale - self.params.height_scale / 4.0,
            row as f32 * self.params.cell - depth / 2.0,
        )
    }
}

impl Shape for Audioscape {
    fn configure(&mut self, settings: &VisualizerSettings) {
        let params = AudioscapeParams::from_settings(settings);
        if params.columns != self.params.columns {
            self.front = vec![0.0; params.columns];
            self.history.clear();
        }
        self.history.truncate(params.rows);
        self.params = params;
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.front.len();
        for (i, value) in self.front.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
        self.history.push_front(self.front.clone());
        self.history.truncate(self.params.rows);
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        for (row, values) in self.history.iter().enumerate() {
            let fade = 1.0 - row as f32 / self.params.rows as f32;
            for (column, value) in values.iter().enumerate() {
                let here = self.vertex(row, column, *value);
                let color = palette.gradient(value.clamp(0.0, 1.0)).with_alpha(0.3 + 0.7 * fade);
                if let Some(next) = values.get(column + 1) {
                    batch.line(view, here, self.vertex(row, column + 1, *next), 1.5, color);
                }
                if let Some(behind) = self.history.get(row + 1) {
                    batch.line(view, here, self.vertex(row + 1, column, behind[column]), 1.0, color.with_alpha(0.5));
                }
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.front.clone()
    }
}
