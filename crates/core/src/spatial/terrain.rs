use glam::Vec3;

use crate::{
    spatial::{geometry::centred, DepthBatch, Shape, View},
    visualizer::{smooth, FrameInput},
    ColorPalette, VisualizerSettings,
};

/// Share of a column's height kept at the front and back edges.
const EDGE_FLOOR: f32 = 0.3;

#[derive(Debug, Clone, PartialEq)]
struct TerrainParams {
    rows: usize,
    columns: usize,
    cell: f32,
    height_scale: f32,
    smoothing: f32,
    amplification: f32,
}

impl TerrainParams {
    fn from_settings(settings: &VisualizerSettings) -> Self {
        Self {
            rows: settings.count("rows", 32).max(2),
            columns: settings.count("columns", 48).max(2),
            cell: settings.float("cellSize", 14.0).max(1.0),
            height_scale: settings.float("heightScale", 120.0),
            smoothing: settings.smoothing(),
            amplification: settings.amplification(),
        }
    }
}

/// A wireframe heightfield: each column follows one band and rows taper it
/// toward the front and back edges.
#[derive(Debug, Clone)]
pub struct Terrain {
    params: TerrainParams,
    columns: Vec<f32>,
}

impl Terrain {
    pub fn new(settings: &VisualizerSettings) -> Self {
        let params = TerrainParams::from_settings(settings);
        Self {
            columns: vec![0.0; params.columns],
            params,
        }
    }

    /// Height in `[0, 1]`-ish units of cell `(row, column)`.
    pub fn height(&self, row: usize, column: usize) -> f32 {
        let rows = self.params.rows as f32;
        let middle = (rows - 1.0) / 2.0;
        let taper = 1.0 - (row as f32 - middle).abs() / middle.max(1.0);
        self.columns[column] * (EDGE_FLOOR + (1.0 - EDGE_FLOOR) * taper)
    }

    fn vertex(&self, row: usize, column: usize) -> Vec3 {
        Vec3::new(
            centred(column, self.params.columns, self.params.cell),
            self.height(row, column) * self.params.height_scale - self.params.height_scale / 4.0,
            centred(row, self.params.rows, self.params.cell),
        )
    }
}

impl Shape for Terrain {
    fn configure(&mut self, settings: &VisualizerSettings) {
        self.params = TerrainParams::from_settings(settings);
        self.columns.resize(self.params.columns, 0.0);
    }

    fn update(&mut self, input: &FrameInput<'_>) {
        let count = self.columns.len();
        for (i, value) in self.columns.iter_mut().enumerate() {
            let target = input.frequency.linear_sample(i, count) * self.params.amplification;
            *value = smooth(*value, target, self.params.smoothing);
        }
    }

    fn build(&self, view: &View, batch: &mut DepthBatch, palette: &ColorPalette) {
        let (rows, columns) = (self.params.rows, self.params.columns);
        for row in 0..rows {
            for column in 0..columns {
                let here = self.vertex(row, column);
                let color = palette.gradient(self.height(row, column).clamp(0.0, 1.0));
                if column + 1 < columns {
                    batch.line(view, here, self.vertex(row, column + 1), 1.0, color);
                }
                if row + 1 < rows {
                    batch.line(view, here, self.vertex(row + 1, column), 1.0, color.with_alpha(0.6));
                }
            }
        }
    }

    fn tracked_values(&self) -> Vec<f32> {
        self.columns.clone()
    }
}
